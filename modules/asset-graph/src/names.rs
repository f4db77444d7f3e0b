//! Word lists and the run-wide name registry.

use fixturegen_core::{AssetKind, Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::debug;

pub const OPINIONS: &[&str] = &[
    "awesome", "terrible", "fantastic", "mediocre", "excellent", "poor", "great", "bad", "superb", "awful",
];

pub const SIZES: &[&str] = &[
    "big", "small", "tiny", "huge", "massive", "mini", "gigantic", "colossal", "petite", "enormous",
];

pub const NOUNS: &[&str] = &[
    "eagle", "tiger", "lion", "shark", "wolf", "panther", "dragon", "phoenix", "griffin", "unicorn",
    "falcon", "bear", "leopard", "cougar", "jaguar", "crocodile", "alligator", "rhino", "hippo", "buffalo",
];

pub const REGISTRARS: &[&str] = &[
    "GoDaddy", "Namecheap", "Bluehost", "HostGator", "DreamHost", "1&1 IONOS", "Google Domains",
    "AWS Route 53", "Hover", "Dynadot",
];

pub const TLDS: &[&str] = &["com", "net", "org", "io"];

pub const SUBDOMAIN_LABELS: &[&str] = &[
    "www", "api", "mail", "vpn", "dev", "staging", "admin", "portal", "cdn", "auth", "shop", "status",
];

pub const LOCATIONS: &[&str] = &[
    "Ashburn, US", "Frankfurt, DE", "Dublin, IE", "Singapore, SG", "Tokyo, JP", "Sao Paulo, BR",
    "Sydney, AU", "Toronto, CA",
];

pub const FLAT_PROTOCOLS: &[&str] = &["http", "https", "ftp", "ssh", "smtp"];

pub const WEB_PATHS: &[&str] = &["/", "/login", "/api", "/status", "/admin"];

pub const DEFAULT_TAGS: &[&str] = &[
    "production", "staging", "external", "internal", "critical", "pci", "legacy", "monitored",
];

/// Ports hosts get opened on, most common first.
pub const COMMON_PORTS: &[u16] = &[
    21, 22, 23, 25, 53, 80, 110, 143, 443, 445, 587, 993, 1433, 3000, 3306, 3389, 5432, 5900, 6379,
    8000, 8080, 8443, 9200, 27017,
];

/// Protocol a service on this port speaks, if the port is one we model services for.
pub fn service_protocol(port: u16) -> Option<&'static str> {
    match port {
        21 => Some("ftp"),
        22 => Some("ssh"),
        25 | 587 => Some("smtp"),
        80 | 3000 | 8000 | 8080 => Some("http"),
        443 | 8443 => Some("https"),
        3306 => Some("mysql"),
        5432 => Some("postgres"),
        6379 => Some("redis"),
        _ => None,
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, list: &[&'static str]) -> &'static str {
    list.choose(rng).copied().unwrap_or_default()
}

/// `<opinion><size><noun>`, e.g. `awesomebigeagle`.
pub fn base_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{}{}{}", pick(rng, OPINIONS), pick(rng, SIZES), pick(rng, NOUNS))
}

/// Number of distinct [`base_name`] values.
pub fn base_name_capacity() -> usize {
    OPINIONS.len() * SIZES.len() * NOUNS.len()
}

pub fn domain_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{}.{}", base_name(rng), pick(rng, TLDS))
}

/// A subdomain label, numbered half of the time (`api`, `api3`).
pub fn subdomain_label<R: Rng + ?Sized>(rng: &mut R) -> String {
    let label = pick(rng, SUBDOMAIN_LABELS);
    if rng.gen_bool(0.5) {
        format!("{}{}", label, rng.gen_range(1..=9))
    } else {
        label.to_string()
    }
}

pub fn registrar<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(rng, REGISTRARS)
}

pub fn location<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(rng, LOCATIONS)
}

/// Set of names already handed out in this run.
#[derive(Debug, Default)]
pub struct NameRegistry {
    claimed: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the name was already taken.
    pub fn claim(&mut self, name: &str) -> bool {
        if self.claimed.contains(name) {
            return false;
        }
        self.claimed.insert(name.to_string())
    }

    /// Claims `name` or fails with [`Error::DuplicateName`].
    pub fn claim_exact(&mut self, name: &str) -> Result<()> {
        if self.claim(name) {
            Ok(())
        } else {
            Err(Error::DuplicateName(name.to_string()))
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.claimed.contains(name)
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    /// Draws candidates from `candidate` until one is unclaimed, claims and returns it.
    pub fn unique<F>(&mut self, kind: AssetKind, max_attempts: u32, mut candidate: F) -> Result<String>
    where
        F: FnMut() -> String,
    {
        for attempt in 1..=max_attempts {
            let name = candidate();
            if self.claim(&name) {
                return Ok(name);
            }
            debug!(%kind, %name, attempt, "name already taken, retrying");
        }
        Err(Error::NameSpaceExhausted { kind, attempts: max_attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn base_name_is_three_words() {
        let mut rng = StdRng::seed_from_u64(1);
        let n = base_name(&mut rng);
        assert!(OPINIONS.iter().any(|w| n.starts_with(w)));
        assert!(NOUNS.iter().any(|w| n.ends_with(w)));
    }

    #[test]
    fn claim_is_first_come() {
        let mut reg = NameRegistry::new();
        assert!(reg.claim("a.com"));
        assert!(!reg.claim("a.com"));
        assert!(reg.claim_exact("a.com").is_err());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unique_retries_until_free() {
        let mut reg = NameRegistry::new();
        reg.claim("x");
        let mut seq = vec!["y", "x", "x"];
        let got = reg.unique(AssetKind::Domain, 5, || seq.pop().unwrap().to_string()).unwrap();
        assert_eq!(got, "y");
        assert!(reg.contains("y"));
    }

    #[test]
    fn unique_gives_up_after_bound() {
        let mut reg = NameRegistry::new();
        reg.claim("same");
        let err = reg.unique(AssetKind::Subdomain, 3, || "same".to_string()).unwrap_err();
        assert!(matches!(err, Error::NameSpaceExhausted { kind: AssetKind::Subdomain, attempts: 3 }));
    }

    #[test]
    fn only_modelled_ports_have_protocols() {
        assert_eq!(service_protocol(443), Some("https"));
        assert_eq!(service_protocol(3389), None);
        assert!(COMMON_PORTS.iter().any(|&p| service_protocol(p).is_some()));
    }
}
