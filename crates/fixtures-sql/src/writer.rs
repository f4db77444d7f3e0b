use anyhow::{Context, Result};
use asset_graph::AssetGraph;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::insert::render_insert;
use crate::schema::schema_ddl;
use crate::WriteOptions;

/// Writes the header block, optional DDL, and one insert per asset in graph order.
pub fn write_fixture<W: Write>(w: &mut W, graph: &AssetGraph, opts: WriteOptions) -> Result<()> {
    writeln!(w, "-- generated assets --")?;
    writeln!(w, "-- generator: fixturegen {}", fixturegen_core::version())?;
    writeln!(w, "-- layout: {}", graph.layout())?;
    writeln!(w, "-- dialect: {}", opts.dialect)?;
    writeln!(w, "-- assets: {}", graph.len())?;
    if opts.with_schema {
        writeln!(w, "{}", schema_ddl(opts.dialect).trim())?;
        writeln!(w)?;
    }
    if opts.transaction {
        writeln!(w, "BEGIN;")?;
    }
    for asset in graph {
        writeln!(w, "{}", render_insert(asset, graph.layout(), opts.dialect)?)?;
    }
    if opts.transaction {
        writeln!(w, "COMMIT;")?;
    }
    w.flush()?;
    Ok(())
}

/// Same as [`write_fixture`], to a freshly truncated file.
pub fn write_fixture_file(path: &Path, graph: &AssetGraph, opts: WriteOptions) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut w = BufWriter::new(file);
    write_fixture(&mut w, graph, opts)?;
    info!(path = %path.display(), assets = graph.len(), dialect = %opts.dialect, "wrote fixture");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dialect, FixtureHeader};
    use asset_graph::{generate, GraphConfig, Layout};

    fn graph(layout: Layout) -> AssetGraph {
        generate(GraphConfig { layout, seed: Some(3), now: Some(1_700_000_000), flat_assets: 20, ..Default::default() }).unwrap()
    }

    fn render(g: &AssetGraph, opts: WriteOptions) -> String {
        let mut buf = Vec::new();
        write_fixture(&mut buf, g, opts).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn one_insert_per_asset_after_header() {
        let g = graph(Layout::Flat);
        let sql = render(&g, WriteOptions::default());
        assert!(sql.starts_with("-- generated assets --\n"));
        assert_eq!(sql.lines().filter(|l| l.starts_with("INSERT INTO assets")).count(), g.len());
        let h = FixtureHeader::parse(&sql);
        assert_eq!(h.layout, Some(Layout::Flat));
        assert!(matches!(h.dialect(), Some(Ok(Dialect::Postgres))));
        assert_eq!(h.assets, Some(20));
    }

    #[test]
    fn schema_and_transaction_wrap_inserts() {
        let g = graph(Layout::Graph);
        let sql = render(&g, WriteOptions { dialect: Dialect::Sqlite, with_schema: true, transaction: true });
        let create = sql.find("CREATE TABLE IF NOT EXISTS assets").unwrap();
        let begin = sql.find("BEGIN;").unwrap();
        let first_insert = sql.find("INSERT INTO").unwrap();
        assert!(create < begin && begin < first_insert);
        assert!(sql.trim_end().ends_with("COMMIT;"));
    }

    #[test]
    fn seeded_output_is_byte_identical() {
        let a = render(&graph(Layout::Tagged), WriteOptions::default());
        let b = render(&graph(Layout::Tagged), WriteOptions::default());
        assert_eq!(a, b);
    }

    #[test]
    fn file_is_truncated_on_rewrite() {
        let path = std::env::temp_dir().join(format!("fixtures-sql-{}.sql", std::process::id()));
        std::fs::write(&path, "x".repeat(1 << 20)).unwrap();
        let g = graph(Layout::Flat);
        write_fixture_file(&path, &g, WriteOptions::default()).unwrap();
        let sql = std::fs::read_to_string(&path).unwrap();
        assert!(sql.starts_with("-- generated assets --"));
        assert!(!sql.contains("xxxx"));
        std::fs::remove_file(&path).unwrap();
    }
}
