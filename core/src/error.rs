use crate::{AssetId, AssetKind};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no unused {kind} name after {attempts} attempts")]
    NameSpaceExhausted { kind: AssetKind, attempts: u32 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("asset {child} references missing parent {parent}")]
    DanglingParent { child: AssetId, parent: AssetId },

    #[error("asset {child} declares parent type {expected} but parent is {found}")]
    ParentKindMismatch { child: AssetId, expected: AssetKind, found: AssetKind },

    #[error("asset {child} of type {kind} cannot have a parent of type {parent}")]
    ParentNotAllowed { child: AssetId, kind: AssetKind, parent: AssetKind },

    #[error("ip {child} must hang off an A record, parent is {record_type}")]
    IpParentNotAddressRecord { child: AssetId, record_type: String },

    #[error("asset {child} belongs to a different organization than its parent")]
    CrossOrgParent { child: AssetId },

    #[error("duplicate asset id: {0}")]
    DuplicateId(AssetId),

    #[error("duplicate name: {0}")]
    DuplicateName(String),

    #[error("unknown asset type: {0}")]
    UnknownAssetKind(String),

    #[error("unknown layout: {0}")]
    UnknownLayout(String),

    #[error("unknown dialect: {0}")]
    UnknownDialect(String),
}
