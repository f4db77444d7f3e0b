use crate::Dialect;

pub const PG_ASSETS: &str = r#"
CREATE TABLE IF NOT EXISTS assets (
  id              UUID PRIMARY KEY DEFAULT gen_random_uuid(),
  org_id          UUID NOT NULL,
  type            TEXT NOT NULL CHECK (type IN ('domain','subdomain','dns_record','ip','port','service')),
  parent_id       UUID REFERENCES assets(id) ON DELETE CASCADE,
  parent_type     TEXT,
  details         JSONB NOT NULL,
  tags            TEXT[] NOT NULL DEFAULT '{}',
  CHECK ((parent_id IS NULL) = (parent_type IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_assets_org ON assets(org_id);
CREATE INDEX IF NOT EXISTS idx_assets_parent ON assets(parent_id);
"#;

pub const SQLITE_ASSETS: &str = r#"
CREATE TABLE IF NOT EXISTS assets (
  id              TEXT PRIMARY KEY NOT NULL,
  org_id          TEXT NOT NULL,
  type            TEXT NOT NULL CHECK (type IN ('domain','subdomain','dns_record','ip','port','service')),
  parent_id       TEXT REFERENCES assets(id) ON DELETE CASCADE,
  parent_type     TEXT,
  details         TEXT NOT NULL,
  tags            TEXT NOT NULL DEFAULT '[]',
  CHECK ((parent_id IS NULL) = (parent_type IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_assets_org ON assets(org_id);
CREATE INDEX IF NOT EXISTS idx_assets_parent ON assets(parent_id);
"#;

pub fn schema_ddl(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Postgres => PG_ASSETS,
        Dialect::Sqlite => SQLITE_ASSETS,
    }
}
