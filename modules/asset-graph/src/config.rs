use fixturegen_core::{default_organizations, Error, Organization, Result};
use ipnet::Ipv4Net;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::names::{self, COMMON_PORTS, DEFAULT_TAGS};

pub(crate) const WEEK_SECS: i64 = 7 * 24 * 3600;
/// Domains expire between one and this many weeks after `now`.
pub(crate) const MAX_EXPIRY_WEEKS: i64 = 20;

/// Which schema variant a fixture is generated for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Unparented `domain` and `service` rows.
    Flat,
    /// Parented hierarchy without tags.
    Graph,
    /// Parented hierarchy, tags on every row.
    #[default]
    Tagged,
}

impl Layout {
    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Flat => "flat",
            Layout::Graph => "graph",
            Layout::Tagged => "tagged",
        }
    }

    pub fn has_parents(self) -> bool {
        !matches!(self, Layout::Flat)
    }

    pub fn has_tags(self) -> bool {
        matches!(self, Layout::Tagged)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "flat" => Ok(Layout::Flat),
            "graph" => Ok(Layout::Graph),
            "tagged" => Ok(Layout::Tagged),
            other => Err(Error::UnknownLayout(other.to_string())),
        }
    }
}

/// Inclusive count range, e.g. `{ min: 1, max: 3 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl CountRange {
    pub const fn new(min: u32, max: u32) -> Self {
        CountRange { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.min..=self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub layout: Layout,
    pub seed: Option<u64>,
    /// Reference unix time for expiry dates; current time when unset.
    pub now: Option<i64>,
    pub organizations: Vec<Organization>,
    pub flat_assets: u32,
    pub domains_per_org: CountRange,
    pub subdomains_per_domain: CountRange,
    pub records_per_subdomain: CountRange,
    pub ports_per_ip: CountRange,
    pub service_probability: f64,
    pub tag_pool: Vec<String>,
    pub max_tags: u32,
    pub ip_ranges: Vec<String>,
    pub max_name_attempts: u32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            layout: Layout::default(),
            seed: None,
            now: None,
            organizations: default_organizations(),
            flat_assets: 500,
            domains_per_org: CountRange::new(1, 3),
            subdomains_per_domain: CountRange::new(1, 4),
            records_per_subdomain: CountRange::new(1, 3),
            ports_per_ip: CountRange::new(0, 4),
            service_probability: 0.5,
            tag_pool: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
            max_tags: 3,
            ip_ranges: vec!["198.18.0.0/15".to_string()],
            max_name_attempts: 64,
        }
    }
}

impl GraphConfig {
    pub fn validate(&self) -> Result<()> {
        if self.organizations.is_empty() {
            return Err(Error::InvalidConfig("at least one organization is required".into()));
        }
        for (name, r) in [
            ("domains_per_org", self.domains_per_org),
            ("subdomains_per_domain", self.subdomains_per_domain),
            ("records_per_subdomain", self.records_per_subdomain),
            ("ports_per_ip", self.ports_per_ip),
        ] {
            if r.min > r.max {
                return Err(Error::InvalidConfig(format!("{name}: min {} > max {}", r.min, r.max)));
            }
        }
        if self.ports_per_ip.max as usize > COMMON_PORTS.len() {
            return Err(Error::InvalidConfig(format!(
                "ports_per_ip: max {} exceeds the {} known ports",
                self.ports_per_ip.max,
                COMMON_PORTS.len()
            )));
        }
        if self.layout == Layout::Flat && self.flat_assets as usize > names::base_name_capacity() {
            return Err(Error::InvalidConfig(format!(
                "flat_assets {} exceeds the {} distinct flat domain names",
                self.flat_assets,
                names::base_name_capacity()
            )));
        }
        if let Some(now) = self.now {
            if now.checked_add(MAX_EXPIRY_WEEKS * WEEK_SECS).is_none() {
                return Err(Error::InvalidConfig(format!("now {now} is too large for expiry dates")));
            }
        }
        if !(0.0..=1.0).contains(&self.service_probability) {
            return Err(Error::InvalidConfig(format!(
                "service_probability must be within [0, 1], got {}",
                self.service_probability
            )));
        }
        if self.max_tags as usize > self.tag_pool.len() {
            return Err(Error::InvalidConfig(format!(
                "max_tags {} exceeds tag pool of {}",
                self.max_tags,
                self.tag_pool.len()
            )));
        }
        if self.tag_pool.iter().collect::<HashSet<_>>().len() != self.tag_pool.len() {
            return Err(Error::InvalidConfig("tag_pool has duplicate entries".into()));
        }
        if self.max_name_attempts == 0 {
            return Err(Error::InvalidConfig("max_name_attempts must be > 0".into()));
        }
        if self.layout.has_parents() {
            self.parsed_ip_ranges()?;
        }
        Ok(())
    }

    pub fn parsed_ip_ranges(&self) -> Result<Vec<Ipv4Net>> {
        if self.ip_ranges.is_empty() {
            return Err(Error::InvalidConfig("ip_ranges is empty".into()));
        }
        self.ip_ranges
            .iter()
            .map(|s| {
                s.trim()
                    .parse::<Ipv4Net>()
                    .map_err(|e| Error::InvalidConfig(format!("ip range {s}: {e}")))
            })
            .collect()
    }
}
