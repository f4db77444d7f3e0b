//! Asset entities. One struct per asset type, unified by [`Asset`].

use fixturegen_core::{AssetId, AssetKind, OrgId, ParentRef};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::net::Ipv4Addr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: AssetId,
    pub org_id: OrgId,
    pub name: String,
    pub registrar: String,
    pub registrant_organization: String,
    /// Unix seconds.
    pub expiry: i64,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subdomain {
    pub id: AssetId,
    pub org_id: OrgId,
    pub parent: ParentRef,
    pub name: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Cname,
    Mx,
    Txt,
}

impl RecordType {
    pub const ALL: [RecordType; 4] = [RecordType::A, RecordType::Cname, RecordType::Mx, RecordType::Txt];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Txt => "TXT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub id: AssetId,
    pub org_id: OrgId,
    pub parent: ParentRef,
    pub record_type: RecordType,
    pub value: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddress {
    pub id: AssetId,
    pub org_id: OrgId,
    pub parent: ParentRef,
    pub address: Ipv4Addr,
    pub location: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub id: AssetId,
    pub org_id: OrgId,
    pub parent: ParentRef,
    pub port: u16,
    pub reachable: bool,
    pub tags: Vec<String>,
}

/// What a service is addressed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceHost {
    Hostname(String),
    Ip(Ipv4Addr),
}

impl std::fmt::Display for ServiceHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceHost::Hostname(h) => f.write_str(h),
            ServiceHost::Ip(ip) => ip.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: AssetId,
    pub org_id: OrgId,
    /// `None` only in the flat layout.
    pub parent: Option<ParentRef>,
    pub host: ServiceHost,
    pub protocol: String,
    pub port: u16,
    pub path: String,
    pub ips: Vec<Ipv4Addr>,
    pub tags: Vec<String>,
}

impl Service {
    pub fn url(&self) -> String {
        service_url(&self.protocol, &self.host, self.port, &self.path)
    }
}

pub fn service_url(protocol: &str, host: &ServiceHost, port: u16, path: &str) -> String {
    format!("{}://{}:{}{}", protocol, host, port, path)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Asset {
    Domain(Domain),
    Subdomain(Subdomain),
    DnsRecord(DnsRecord),
    Ip(IpAddress),
    Port(Port),
    Service(Service),
}

impl Asset {
    pub fn id(&self) -> AssetId {
        match self {
            Asset::Domain(a) => a.id,
            Asset::Subdomain(a) => a.id,
            Asset::DnsRecord(a) => a.id,
            Asset::Ip(a) => a.id,
            Asset::Port(a) => a.id,
            Asset::Service(a) => a.id,
        }
    }

    pub fn org_id(&self) -> OrgId {
        match self {
            Asset::Domain(a) => a.org_id,
            Asset::Subdomain(a) => a.org_id,
            Asset::DnsRecord(a) => a.org_id,
            Asset::Ip(a) => a.org_id,
            Asset::Port(a) => a.org_id,
            Asset::Service(a) => a.org_id,
        }
    }

    pub fn kind(&self) -> AssetKind {
        match self {
            Asset::Domain(_) => AssetKind::Domain,
            Asset::Subdomain(_) => AssetKind::Subdomain,
            Asset::DnsRecord(_) => AssetKind::DnsRecord,
            Asset::Ip(_) => AssetKind::Ip,
            Asset::Port(_) => AssetKind::Port,
            Asset::Service(_) => AssetKind::Service,
        }
    }

    pub fn parent(&self) -> Option<ParentRef> {
        match self {
            Asset::Domain(_) => None,
            Asset::Subdomain(a) => Some(a.parent),
            Asset::DnsRecord(a) => Some(a.parent),
            Asset::Ip(a) => Some(a.parent),
            Asset::Port(a) => Some(a.parent),
            Asset::Service(a) => a.parent,
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            Asset::Domain(a) => &a.tags,
            Asset::Subdomain(a) => &a.tags,
            Asset::DnsRecord(a) => &a.tags,
            Asset::Ip(a) => &a.tags,
            Asset::Port(a) => &a.tags,
            Asset::Service(a) => &a.tags,
        }
    }

    /// The run-wide unique name, for kinds that carry one.
    pub fn name(&self) -> Option<String> {
        match self {
            Asset::Domain(a) => Some(a.name.clone()),
            Asset::Subdomain(a) => Some(a.name.clone()),
            Asset::Ip(a) => Some(a.address.to_string()),
            Asset::Service(a) => Some(a.url()),
            Asset::DnsRecord(_) | Asset::Port(_) => None,
        }
    }

    /// Kind-specific attributes, as stored in the `details` column.
    pub fn details(&self) -> Value {
        match self {
            Asset::Domain(d) => json!({
                "domain": d.name,
                "registrar": d.registrar,
                "registrant_organization": d.registrant_organization,
                "expiry": d.expiry,
            }),
            Asset::Subdomain(s) => json!({ "subdomain": s.name }),
            Asset::DnsRecord(r) => json!({ "type": r.record_type.as_str(), "value": r.value }),
            Asset::Ip(ip) => json!({ "ip": ip.address.to_string(), "location": ip.location }),
            Asset::Port(p) => json!({ "port": p.port, "reachable": p.reachable }),
            Asset::Service(s) => {
                let mut m = Map::new();
                match &s.host {
                    ServiceHost::Hostname(h) => m.insert("hostname".into(), json!(h)),
                    ServiceHost::Ip(ip) => m.insert("ip".into(), json!(ip.to_string())),
                };
                m.insert("port".into(), json!(s.port));
                m.insert("protocol".into(), json!(s.protocol));
                m.insert("path".into(), json!(s.path));
                // flat services keep the bare four-field shape
                if s.parent.is_some() {
                    let ips: Vec<String> = s.ips.iter().map(|ip| ip.to_string()).collect();
                    m.insert("ips".into(), json!(ips));
                    m.insert("url".into(), json!(s.url()));
                }
                Value::Object(m)
            }
        }
    }
}
