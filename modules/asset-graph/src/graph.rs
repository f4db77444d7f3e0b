use fixturegen_core::{AssetId, AssetKind, Error, OrgId, Result};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::Layout;
use crate::model::{Asset, RecordType};

/// A finished generation run, in insertion order.
#[derive(Debug, Clone)]
pub struct AssetGraph {
    layout: Layout,
    assets: Vec<Asset>,
}

impl AssetGraph {
    pub fn new(layout: Layout, assets: Vec<Asset>) -> Self {
        AssetGraph { layout, assets }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Asset> {
        self.assets.iter()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id() == id)
    }

    pub fn children(&self, id: AssetId) -> Vec<&Asset> {
        self.assets.iter().filter(|a| a.parent().map(|p| p.id) == Some(id)).collect()
    }

    pub fn count_by_kind(&self) -> BTreeMap<AssetKind, usize> {
        let mut out = BTreeMap::new();
        for a in &self.assets {
            *out.entry(a.kind()).or_insert(0) += 1;
        }
        out
    }

    pub fn count_by_org_and_kind(&self) -> BTreeMap<(OrgId, AssetKind), usize> {
        let mut out = BTreeMap::new();
        for a in &self.assets {
            *out.entry((a.org_id(), a.kind())).or_insert(0) += 1;
        }
        out
    }

    /// Checks referential integrity and id/name uniqueness.
    ///
    /// Parents must appear before their children, exist with the declared type, be an
    /// allowed parent type for the child, and belong to the same organization. IPs
    /// only hang off `A` records.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashMap<AssetId, (AssetKind, OrgId, Option<RecordType>)> =
            HashMap::with_capacity(self.assets.len());
        let mut names: HashSet<String> = HashSet::new();
        for a in &self.assets {
            if let Some(parent) = a.parent() {
                let Some(&(found, org, record_type)) = seen.get(&parent.id) else {
                    return Err(Error::DanglingParent { child: a.id(), parent: parent.id });
                };
                if found != parent.kind {
                    return Err(Error::ParentKindMismatch { child: a.id(), expected: parent.kind, found });
                }
                if !a.kind().allowed_parents().contains(&found) {
                    return Err(Error::ParentNotAllowed { child: a.id(), kind: a.kind(), parent: found });
                }
                if org != a.org_id() {
                    return Err(Error::CrossOrgParent { child: a.id() });
                }
                if let (AssetKind::Ip, Some(rt)) = (a.kind(), record_type) {
                    if rt != RecordType::A {
                        let record_type = rt.as_str().to_string();
                        return Err(Error::IpParentNotAddressRecord { child: a.id(), record_type });
                    }
                }
            } else if self.layout.has_parents() && !a.kind().is_root() {
                return Err(Error::ParentNotAllowed { child: a.id(), kind: a.kind(), parent: a.kind() });
            }
            if let Some(name) = a.name() {
                if !names.insert(name.clone()) {
                    return Err(Error::DuplicateName(name));
                }
            }
            let record_type = match a {
                Asset::DnsRecord(r) => Some(r.record_type),
                _ => None,
            };
            if seen.insert(a.id(), (a.kind(), a.org_id(), record_type)).is_some() {
                return Err(Error::DuplicateId(a.id()));
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a AssetGraph {
    type Item = &'a Asset;
    type IntoIter = std::slice::Iter<'a, Asset>;

    fn into_iter(self) -> Self::IntoIter {
        self.assets.iter()
    }
}
