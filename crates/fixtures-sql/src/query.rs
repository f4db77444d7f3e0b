use crate::{Db, Dialect, FixtureHeader, LoadReport};
use anyhow::{bail, Result};
use std::collections::BTreeMap;
use tracing::{debug, info};

const ORPHANS: &str = "SELECT COUNT(1) FROM assets a
 WHERE a.parent_id IS NOT NULL
   AND NOT EXISTS (SELECT 1 FROM assets p WHERE p.id = a.parent_id)";

const KIND_MISMATCHES: &str = "SELECT COUNT(1) FROM assets a
 JOIN assets p ON p.id = a.parent_id
 WHERE p.type <> a.parent_type";

const DUPLICATE_NAMES: &str = "SELECT COUNT(1) FROM (
  SELECT name FROM (
    SELECT CASE type
      WHEN 'domain' THEN json_extract(details, '$.domain')
      WHEN 'subdomain' THEN json_extract(details, '$.subdomain')
      WHEN 'ip' THEN json_extract(details, '$.ip')
      WHEN 'service' THEN json_extract(details, '$.url')
    END AS name
    FROM assets
  )
  WHERE name IS NOT NULL
  GROUP BY name
  HAVING COUNT(1) > 1
)";

impl Db {
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let cnt: i64 = self.conn.query_row(
            "SELECT COUNT(1) FROM sqlite_master WHERE type='table' AND name=?",
            [name],
            |r| r.get(0),
        )?;
        Ok(cnt > 0)
    }

    /// Replays a SQLite-dialect fixture. Fixtures without a dialect header are accepted.
    pub fn load_fixture(&self, sql: &str) -> Result<()> {
        let header = FixtureHeader::parse(sql);
        match header.dialect() {
            None | Some(Ok(Dialect::Sqlite)) => {}
            Some(Ok(d)) => bail!("fixture was generated for {d}, only sqlite fixtures can be verified"),
            Some(Err(e)) => bail!("fixture header: {e}, only sqlite fixtures can be verified"),
        }
        self.conn.execute_batch(sql)?;
        debug!(declared = ?header.assets, "fixture loaded");
        Ok(())
    }

    pub fn report(&self) -> Result<LoadReport> {
        let count = |sql: &str| -> Result<i64> { Ok(self.conn.query_row(sql, [], |r| r.get(0))?) };

        let mut by_kind = BTreeMap::new();
        let mut stmt = self.conn.prepare("SELECT type, COUNT(1) FROM assets GROUP BY type")?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?;
        for row in rows {
            let (kind, n) = row?;
            by_kind.insert(kind, n);
        }

        let report = LoadReport {
            total: count("SELECT COUNT(1) FROM assets")?,
            by_kind,
            orphans: count(ORPHANS)?,
            parent_kind_mismatches: count(KIND_MISMATCHES)?,
            duplicate_names: count(DUPLICATE_NAMES)?,
        };
        info!(total = report.total, consistent = report.is_consistent(), "fixture report");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{write_fixture, WriteOptions};
    use asset_graph::{generate, GraphConfig, Layout};

    fn fixture(layout: Layout, with_schema: bool) -> (usize, String) {
        let g = generate(GraphConfig { layout, seed: Some(11), now: Some(1_700_000_000), flat_assets: 40, ..Default::default() })
            .unwrap();
        let mut buf = Vec::new();
        write_fixture(&mut buf, &g, WriteOptions { dialect: Dialect::Sqlite, with_schema, transaction: true }).unwrap();
        (g.len(), String::from_utf8(buf).unwrap())
    }

    #[test]
    fn schema_is_created_on_open() {
        let db = Db::open_in_memory().unwrap();
        assert!(db.table_exists("assets").unwrap());
        assert!(!db.table_exists("runs").unwrap());
    }

    #[test]
    fn tagged_fixture_loads_consistently() {
        let (n, sql) = fixture(Layout::Tagged, true);
        let db = Db::open_in_memory().unwrap();
        db.load_fixture(&sql).unwrap();
        let report = db.report().unwrap();
        assert_eq!(report.total as usize, n);
        assert!(report.is_consistent(), "{report:?}");
        assert!(report.by_kind["domain"] >= 5);
        let tags: String = db.conn.query_row("SELECT tags FROM assets LIMIT 1", [], |r| r.get(0)).unwrap();
        assert!(tags.starts_with('['));
    }

    #[test]
    fn flat_fixture_loads_without_parents() {
        let (n, sql) = fixture(Layout::Flat, false);
        let db = Db::open_in_memory().unwrap();
        db.load_fixture(&sql).unwrap();
        let report = db.report().unwrap();
        assert_eq!(report.total as usize, n);
        assert_eq!(report.orphans, 0);
        let with_parent: i64 =
            db.conn.query_row("SELECT COUNT(1) FROM assets WHERE parent_id IS NOT NULL", [], |r| r.get(0)).unwrap();
        assert_eq!(with_parent, 0);
    }

    #[test]
    fn foreign_keys_reject_orphans() {
        let db = Db::open_in_memory().unwrap();
        let sql = "INSERT INTO assets (id, org_id, type, parent_id, parent_type, details) \
                   VALUES ('c', 'o', 'subdomain', 'missing', 'domain', '{}');";
        assert!(db.load_fixture(sql).is_err());
    }

    #[test]
    fn report_counts_kind_mismatches() {
        let db = Db::open_in_memory().unwrap();
        db.load_fixture(
            "INSERT INTO assets (id, org_id, type, details) VALUES ('d', 'o', 'domain', '{\"domain\":\"a.com\"}');
             INSERT INTO assets (id, org_id, type, parent_id, parent_type, details) VALUES ('s', 'o', 'subdomain', 'd', 'ip', '{\"subdomain\":\"a.com\"}');",
        )
        .unwrap();
        let report = db.report().unwrap();
        assert_eq!(report.parent_kind_mismatches, 1);
        assert_eq!(report.duplicate_names, 1);
        assert!(!report.is_consistent());
    }

    #[test]
    fn postgres_fixture_is_refused() {
        let db = Db::open_in_memory().unwrap();
        let err = db.load_fixture("-- generated assets --\n-- dialect: postgres\n").unwrap_err();
        assert!(err.to_string().contains("postgres"));
    }

    #[test]
    fn unknown_dialect_fixture_is_refused() {
        let db = Db::open_in_memory().unwrap();
        let sql = "-- generated assets --\n-- dialect: mysql\n\
                   INSERT INTO assets (id, org_id, type, details) VALUES ('d', 'o', 'domain', '{}');\n";
        let err = db.load_fixture(sql).unwrap_err();
        assert!(err.to_string().contains("mysql"));
        assert_eq!(db.report().unwrap().total, 0);
    }
}
