//! Builds an [`AssetGraph`] from a [`GraphConfig`].
//!
//! Generation is depth first: every parent row is pushed before its children, so the
//! rendered inserts can be replayed in order against a table with a foreign key on
//! `parent_id`. With a fixed `seed` and `now` the output is identical across runs.

use fixturegen_core::{AssetId, AssetKind, Error, OrgId, Organization, ParentRef, Result};
use ipnet::Ipv4Net;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::net::Ipv4Addr;
use time::OffsetDateTime;
use tracing::info;

use crate::config::{GraphConfig, Layout, MAX_EXPIRY_WEEKS, WEEK_SECS};
use crate::graph::AssetGraph;
use crate::model::*;
use crate::names::{self, NameRegistry};

pub struct Generator {
    config: GraphConfig,
    rng: StdRng,
    names: NameRegistry,
    ranges: Vec<Ipv4Net>,
    now: i64,
    assets: Vec<Asset>,
}

/// Validates `config` and generates one graph.
pub fn generate(config: GraphConfig) -> Result<AssetGraph> {
    Generator::new(config)?.generate()
}

impl Generator {
    pub fn new(config: GraphConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let ranges = if config.layout.has_parents() { config.parsed_ip_ranges()? } else { Vec::new() };
        let now = config.now.unwrap_or_else(|| OffsetDateTime::now_utc().unix_timestamp());
        Ok(Generator { config, rng, names: NameRegistry::new(), ranges, now, assets: Vec::new() })
    }

    pub fn generate(mut self) -> Result<AssetGraph> {
        let layout = self.config.layout;
        match layout {
            Layout::Flat => self.flat()?,
            Layout::Graph | Layout::Tagged => {
                let orgs = self.config.organizations.clone();
                for org in &orgs {
                    let n = self.config.domains_per_org.sample(&mut self.rng);
                    for _ in 0..n {
                        self.domain_tree(org)?;
                    }
                }
            }
        }
        info!(layout = %layout, assets = self.assets.len(), names = self.names.len(), "generated asset graph");
        Ok(AssetGraph::new(layout, self.assets))
    }

    fn next_id(&mut self) -> AssetId {
        AssetId::from(self.rng.gen::<[u8; 16]>())
    }

    fn tags(&mut self) -> Vec<String> {
        if !self.config.layout.has_tags() {
            return Vec::new();
        }
        let n = self.rng.gen_range(0..=self.config.max_tags) as usize;
        let mut tags: Vec<String> = self.config.tag_pool.choose_multiple(&mut self.rng, n).cloned().collect();
        tags.sort();
        tags
    }

    fn expiry(&mut self) -> i64 {
        let weeks = self.rng.gen_range(1..=MAX_EXPIRY_WEEKS);
        self.now.saturating_add(weeks * WEEK_SECS)
    }

    fn unique_name<F>(&mut self, kind: AssetKind, mut candidate: F) -> Result<String>
    where
        F: FnMut(&mut StdRng) -> String,
    {
        let Generator { names, rng, config, .. } = self;
        names.unique(kind, config.max_name_attempts, || candidate(rng))
    }

    fn flat(&mut self) -> Result<()> {
        let orgs = self.config.organizations.clone();
        for _ in 0..self.config.flat_assets {
            let org = orgs.choose(&mut self.rng).ok_or_else(|| Error::InvalidConfig("no organizations".into()))?;
            let asset = if self.rng.gen_bool(0.5) {
                let name = self.unique_name(AssetKind::Domain, |rng| format!("www.{}.com", names::base_name(rng)))?;
                Asset::Domain(Domain {
                    id: self.next_id(),
                    org_id: org.id,
                    name,
                    registrar: names::registrar(&mut self.rng).to_string(),
                    registrant_organization: org.name.clone(),
                    expiry: self.expiry(),
                    tags: Vec::new(),
                })
            } else {
                let mut parts = None;
                self.unique_name(AssetKind::Service, |rng| {
                    let host = ServiceHost::Hostname(format!("www.{}.com", names::base_name(rng)));
                    let port: u16 = rng.gen_range(1..=65535);
                    let protocol = names::FLAT_PROTOCOLS.choose(rng).copied().unwrap_or("http");
                    let url = service_url(protocol, &host, port, "/");
                    parts = Some((host, port, protocol));
                    url
                })?;
                let (host, port, protocol) = parts.ok_or_else(|| Error::InvalidConfig("no service drawn".into()))?;
                Asset::Service(Service {
                    id: self.next_id(),
                    org_id: org.id,
                    parent: None,
                    host,
                    protocol: protocol.to_string(),
                    port,
                    path: "/".to_string(),
                    ips: Vec::new(),
                    tags: Vec::new(),
                })
            };
            self.assets.push(asset);
        }
        Ok(())
    }

    fn domain_tree(&mut self, org: &Organization) -> Result<()> {
        let name = self.unique_name(AssetKind::Domain, |rng| names::domain_name(rng))?;
        let id = self.next_id();
        let domain = Domain {
            id,
            org_id: org.id,
            name: name.clone(),
            registrar: names::registrar(&mut self.rng).to_string(),
            registrant_organization: org.name.clone(),
            expiry: self.expiry(),
            tags: self.tags(),
        };
        self.assets.push(Asset::Domain(domain));

        let parent = ParentRef { id, kind: AssetKind::Domain };
        let n = self.config.subdomains_per_domain.sample(&mut self.rng);
        for _ in 0..n {
            self.subdomain_tree(org.id, parent, &name)?;
        }
        Ok(())
    }

    fn subdomain_tree(&mut self, org_id: OrgId, parent: ParentRef, domain: &str) -> Result<()> {
        let name = self.unique_name(AssetKind::Subdomain, |rng| {
            format!("{}.{}", names::subdomain_label(rng), domain)
        })?;
        let id = self.next_id();
        let tags = self.tags();
        self.assets.push(Asset::Subdomain(Subdomain { id, org_id, parent, name: name.clone(), tags }));

        let sub = ParentRef { id, kind: AssetKind::Subdomain };
        let mut resolved = Vec::new();
        let n = self.config.records_per_subdomain.sample(&mut self.rng);
        for i in 0..n {
            // first record always resolves the name
            let record_type = if i == 0 { RecordType::A } else { *RecordType::ALL.choose(&mut self.rng).unwrap_or(&RecordType::A) };
            if let Some(ip) = self.dns_record(org_id, sub, record_type, domain)? {
                resolved.push(ip);
            }
        }

        if self.rng.gen_bool(self.config.service_probability) {
            self.hostname_service(org_id, sub, &name, resolved)?;
        }
        Ok(())
    }

    /// Pushes a DNS record (and for `A` records, its IP subtree). Returns the IP if one was made.
    fn dns_record(
        &mut self,
        org_id: OrgId,
        parent: ParentRef,
        record_type: RecordType,
        domain: &str,
    ) -> Result<Option<Ipv4Addr>> {
        let id = self.next_id();
        let address = match record_type {
            RecordType::A => Some(self.ip_address()?),
            _ => None,
        };
        let value = match record_type {
            RecordType::A => address.map(|a| a.to_string()).unwrap_or_default(),
            RecordType::Cname => format!("{}.{}", names::subdomain_label(&mut self.rng), domain),
            RecordType::Mx => format!("10 mail.{}", domain),
            RecordType::Txt => format!("v=spf1 include:_spf.{} ~all", domain),
        };
        let tags = self.tags();
        self.assets.push(Asset::DnsRecord(DnsRecord { id, org_id, parent, record_type, value, tags }));

        if let Some(address) = address {
            self.ip_tree(org_id, ParentRef { id, kind: AssetKind::DnsRecord }, address)?;
        }
        Ok(address)
    }

    fn ip_address(&mut self) -> Result<Ipv4Addr> {
        let Generator { names, rng, config, ranges, .. } = self;
        let addr = names.unique(AssetKind::Ip, config.max_name_attempts, || random_host(rng, ranges.as_slice()).to_string())?;
        addr.parse().map_err(|_| Error::InvalidConfig(format!("generated bad address {addr}")))
    }

    fn ip_tree(&mut self, org_id: OrgId, parent: ParentRef, address: Ipv4Addr) -> Result<()> {
        let id = self.next_id();
        let location = names::location(&mut self.rng).to_string();
        let tags = self.tags();
        self.assets.push(Asset::Ip(IpAddress { id, org_id, parent, address, location, tags }));

        let ip = ParentRef { id, kind: AssetKind::Ip };
        let n = self.config.ports_per_ip.sample(&mut self.rng) as usize;
        let ports: Vec<u16> = names::COMMON_PORTS.choose_multiple(&mut self.rng, n).copied().collect();
        for port in ports {
            let reachable = self.rng.gen_bool(0.7);
            let pid = self.next_id();
            let tags = self.tags();
            self.assets.push(Asset::Port(Port { id: pid, org_id, parent: ip, port, reachable, tags }));

            let Some(protocol) = names::service_protocol(port) else { continue };
            if reachable && self.rng.gen_bool(self.config.service_probability) {
                let host = ServiceHost::Ip(address);
                let path = if protocol.starts_with("http") { "/" } else { "" };
                self.names.claim_exact(&service_url(protocol, &host, port, path))?;
                let sid = self.next_id();
                let tags = self.tags();
                self.assets.push(Asset::Service(Service {
                    id: sid,
                    org_id,
                    parent: Some(ip),
                    host,
                    protocol: protocol.to_string(),
                    port,
                    path: path.to_string(),
                    ips: vec![address],
                    tags,
                }));
            }
        }
        Ok(())
    }

    fn hostname_service(&mut self, org_id: OrgId, parent: ParentRef, hostname: &str, ips: Vec<Ipv4Addr>) -> Result<()> {
        let host = ServiceHost::Hostname(hostname.to_string());
        let mut drawn = None;
        self.unique_name(AssetKind::Service, |rng| {
            let (protocol, port) = *[("http", 80u16), ("https", 443), ("http", 8080), ("https", 8443)]
                .choose(rng)
                .unwrap_or(&("https", 443));
            let path = names::WEB_PATHS.choose(rng).copied().unwrap_or("/");
            drawn = Some((protocol, port, path));
            service_url(protocol, &host, port, path)
        })?;
        let (protocol, port, path) = drawn.ok_or_else(|| Error::InvalidConfig("no service drawn".into()))?;
        let id = self.next_id();
        let tags = self.tags();
        self.assets.push(Asset::Service(Service {
            id,
            org_id,
            parent: Some(parent),
            host,
            protocol: protocol.to_string(),
            port,
            path: path.to_string(),
            ips,
            tags,
        }));
        Ok(())
    }
}

/// Uniform host address from one of `ranges`, skipping network and broadcast where they exist.
fn random_host<R: Rng + ?Sized>(rng: &mut R, ranges: &[Ipv4Net]) -> Ipv4Addr {
    let Some(net) = ranges.choose(rng) else { return Ipv4Addr::UNSPECIFIED };
    let base = u32::from(net.network());
    let size: u64 = 1u64 << (32 - u32::from(net.prefix_len()));
    let offset = if size > 2 { rng.gen_range(1..size - 1) } else { rng.gen_range(0..size) };
    Ipv4Addr::from(base.wrapping_add(offset as u32))
}
