//! Core identifiers and shared types for the fixture generator.

pub mod error;
pub mod kind;

pub use error::{Error, Result};
pub use kind::{AssetKind, ParentRef};

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Owning organization of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(pub Uuid);

/// Identifier of a generated asset row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub Uuid);

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<[u8; 16]> for AssetId {
    /// Builds a v4 id from caller-supplied random bytes so seeded runs stay reproducible.
    fn from(bytes: [u8; 16]) -> Self {
        AssetId(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrgId,
    pub name: String,
}

impl Organization {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Organization { id: OrgId(id), name: name.into() }
    }
}

/// The five tenants every fixture database is seeded with.
pub fn default_organizations() -> Vec<Organization> {
    const ORGS: &[(u128, &str)] = &[
        (0x11111111_1111_1111_1111_111111111111, "Alpha Corp"),
        (0x22222222_2222_2222_2222_222222222222, "Beta LLC"),
        (0x33333333_3333_3333_3333_333333333333, "Gamma Inc"),
        (0x44444444_4444_4444_4444_444444444444, "Delta Ltd"),
        (0x55555555_5555_5555_5555_555555555555, "Epsilon GmbH"),
    ];
    ORGS.iter().map(|&(id, name)| Organization::new(Uuid::from_u128(id), name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!version().is_empty());
    }

    #[test]
    fn default_orgs_render_as_repeated_digits() {
        let orgs = default_organizations();
        assert_eq!(orgs.len(), 5);
        assert_eq!(orgs[0].id.to_string(), "11111111-1111-1111-1111-111111111111");
        assert_eq!(orgs[4].name, "Epsilon GmbH");
    }

    #[test]
    fn asset_id_from_bytes_is_v4() {
        let id = AssetId::from([7u8; 16]);
        assert_eq!(id.0.get_version_num(), 4);
        assert_eq!(id, AssetId::from([7u8; 16]));
    }
}
