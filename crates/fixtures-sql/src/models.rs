use asset_graph::Layout;
use fixturegen_core::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    Sqlite,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::Sqlite),
            other => Err(Error::UnknownDialect(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub dialect: Dialect,
    /// Emit `CREATE TABLE` before the inserts.
    pub with_schema: bool,
    /// Wrap the inserts in `BEGIN;` / `COMMIT;`.
    pub transaction: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions { dialect: Dialect::Postgres, with_schema: false, transaction: false }
    }
}

/// The `-- key: value` comment block at the top of a fixture file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureHeader {
    pub layout: Option<Layout>,
    /// Raw `dialect` value, kept even when it names no known dialect.
    pub dialect: Option<String>,
    pub assets: Option<usize>,
}

impl FixtureHeader {
    pub fn parse(sql: &str) -> Self {
        let mut h = FixtureHeader::default();
        for line in sql.lines().take_while(|l| l.starts_with("--")) {
            let Some((key, value)) = line.trim_start_matches('-').split_once(':') else { continue };
            let value = value.trim();
            match key.trim() {
                "layout" => h.layout = value.parse().ok(),
                "dialect" => h.dialect = Some(value.to_string()),
                "assets" => h.assets = value.parse().ok(),
                _ => {}
            }
        }
        h
    }

    pub fn dialect(&self) -> Option<Result<Dialect, Error>> {
        self.dialect.as_deref().map(str::parse)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub total: i64,
    pub by_kind: BTreeMap<String, i64>,
    pub orphans: i64,
    pub parent_kind_mismatches: i64,
    pub duplicate_names: i64,
}

impl LoadReport {
    pub fn is_consistent(&self) -> bool {
        self.orphans == 0 && self.parent_kind_mismatches == 0 && self.duplicate_names == 0
    }
}
