use crate::{AssetId, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Asset type as stored in the `type` / `parent_type` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Domain,
    Subdomain,
    DnsRecord,
    Ip,
    Port,
    Service,
}

impl AssetKind {
    pub const ALL: [AssetKind; 6] = [
        AssetKind::Domain,
        AssetKind::Subdomain,
        AssetKind::DnsRecord,
        AssetKind::Ip,
        AssetKind::Port,
        AssetKind::Service,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Domain => "domain",
            AssetKind::Subdomain => "subdomain",
            AssetKind::DnsRecord => "dns_record",
            AssetKind::Ip => "ip",
            AssetKind::Port => "port",
            AssetKind::Service => "service",
        }
    }

    /// Kinds a child of this kind may hang off. Empty for roots.
    pub fn allowed_parents(self) -> &'static [AssetKind] {
        match self {
            AssetKind::Domain => &[],
            AssetKind::Subdomain => &[AssetKind::Domain],
            AssetKind::DnsRecord => &[AssetKind::Subdomain],
            AssetKind::Ip => &[AssetKind::DnsRecord],
            AssetKind::Port => &[AssetKind::Ip],
            AssetKind::Service => &[AssetKind::Subdomain, AssetKind::Ip],
        }
    }

    pub fn is_root(self) -> bool {
        self.allowed_parents().is_empty()
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| Error::UnknownAssetKind(s.to_string()))
    }
}

/// Reference from a child row to its single parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    pub id: AssetId,
    pub kind: AssetKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_strings_round_trip() {
        for k in AssetKind::ALL {
            assert_eq!(k.as_str().parse::<AssetKind>().unwrap(), k);
        }
        assert!("network".parse::<AssetKind>().is_err());
    }

    #[test]
    fn only_domain_is_root() {
        let roots: Vec<_> = AssetKind::ALL.into_iter().filter(|k| k.is_root()).collect();
        assert_eq!(roots, vec![AssetKind::Domain]);
        assert!(AssetKind::Service.allowed_parents().contains(&AssetKind::Ip));
        assert!(!AssetKind::Port.allowed_parents().contains(&AssetKind::Subdomain));
    }
}
