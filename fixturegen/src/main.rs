use anyhow::{anyhow, bail, Result};
use asset_graph::{AssetGraph, GraphConfig, Layout};
use clap::{Parser, Subcommand, ValueEnum};
use fixturegen_core::Organization;
use fixtures_sql::{Dialect, WriteOptions};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat { Sql, Jsonl }

impl OutputFormat {
    fn default_out(self) -> PathBuf {
        match self {
            OutputFormat::Sql => PathBuf::from("fixtures.sql"),
            OutputFormat::Jsonl => PathBuf::from("fixtures.jsonl"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "fixturegen", version, about = "Synthetic asset-graph fixtures for test databases")]
struct Cli {
    /// Optional config file (YAML). If omitted, loads ./fixturegen.yaml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset (e.g. info, debug, asset_graph=debug)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Default, clap::Args)]
struct GenerateArgs {
    /// Schema variant: flat, graph or tagged
    #[arg(long)]
    layout: Option<Layout>,
    /// RNG seed; output is reproducible for a fixed seed and --now
    #[arg(long)]
    seed: Option<u64>,
    /// Reference unix time for domain expiry dates (default: current time)
    #[arg(long)]
    now: Option<i64>,
    /// Use only the first N organizations
    #[arg(long)]
    orgs: Option<usize>,
    /// Number of assets in the flat layout (at most 2000, one per distinct flat domain name)
    #[arg(long)]
    flat_assets: Option<u32>,
    /// SQL dialect: postgres or sqlite
    #[arg(long)]
    dialect: Option<Dialect>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// Generate an asset graph and write it as SQL inserts (or JSON lines)
    Generate {
        #[command(flatten)]
        args: GenerateArgs,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Sql)]
        format: OutputFormat,
        /// Emit CREATE TABLE before the inserts
        #[arg(long, default_value_t = false)]
        schema: bool,
        /// Wrap the inserts in a single transaction
        #[arg(long, default_value_t = false)]
        transaction: bool,
        /// Output file (overwrites). Default: fixtures.sql, or fixtures.jsonl with --format jsonl
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Also write per-organization, per-type counts as CSV
        #[arg(long, value_name = "FILE")]
        summary: Option<PathBuf>,
    },
    /// Load a sqlite-dialect fixture into SQLite and check referential integrity
    #[cfg(feature = "verify")]
    Verify {
        /// Fixture file produced by `generate --dialect sqlite`
        file: PathBuf,
        /// Database file to load into (default: in-memory)
        #[arg(long, value_name = "FILE")]
        db: Option<PathBuf>,
    },
    /// Split numbered markdown docs into knowledge-base documents (JSON lines)
    #[cfg(feature = "kb")]
    KbSplit {
        /// Directory whose subfolders hold numbered markdown files
        dir: PathBuf,
        /// Output file (JSONL). Stdout if omitted.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Also write batched ingest payloads as a JSON array of batches
        #[arg(long, value_name = "FILE")]
        payload: Option<PathBuf>,
        /// Documents per ingest batch
        #[arg(long)]
        batch_size: Option<usize>,
    },
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// CLI flags over the `generate:` config section over defaults.
fn build_graph_config(args: &GenerateArgs, base: GraphConfig) -> Result<GraphConfig> {
    let mut cfg = base;
    if let Some(l) = args.layout { cfg.layout = l; }
    if args.seed.is_some() { cfg.seed = args.seed; }
    if args.now.is_some() { cfg.now = args.now; }
    if let Some(n) = args.flat_assets { cfg.flat_assets = n; }
    if let Some(n) = args.orgs {
        if n == 0 || n > cfg.organizations.len() {
            bail!("--orgs must be between 1 and {}", cfg.organizations.len());
        }
        cfg.organizations.truncate(n);
    }
    cfg.validate()?;
    Ok(cfg)
}

fn create_truncated(path: &Path) -> Result<BufWriter<std::fs::File>> {
    let file = OpenOptions::new().create(true).truncate(true).write(true).open(path)?;
    Ok(BufWriter::new(file))
}

fn write_jsonl(path: &Path, graph: &AssetGraph) -> Result<()> {
    let mut w = create_truncated(path)?;
    for asset in graph {
        writeln!(w, "{}", serde_json::to_string(asset)?)?;
    }
    w.flush()?;
    Ok(())
}

fn write_summary<W: Write>(w: W, graph: &AssetGraph, orgs: &[Organization]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(w);
    wtr.write_record(["org_id", "org_name", "type", "count"])?;
    for ((org_id, kind), count) in graph.count_by_org_and_kind() {
        let name = orgs.iter().find(|o| o.id == org_id).map(|o| o.name.as_str()).unwrap_or_default();
        wtr.write_record([org_id.to_string().as_str(), name, kind.as_str(), count.to_string().as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    let loaded_cfg = config::load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Version => {
            println!("fixturegen {} (core {})", env!("CARGO_PKG_VERSION"), fixturegen_core::version());
        }
        Commands::Generate { args, format, schema, transaction, out, summary } => {
            let gen_cfg = loaded_cfg.as_ref().and_then(|c| c.generate.clone()).unwrap_or_default();
            let graph_cfg = build_graph_config(&args, gen_cfg.graph)?;
            let dialect = args.dialect.or(gen_cfg.dialect).unwrap_or_default();
            let out = out.or(gen_cfg.out).unwrap_or_else(|| format.default_out());

            let started = Instant::now();
            let graph = asset_graph::generate(graph_cfg.clone())?;
            graph.validate()?;
            match format {
                OutputFormat::Sql => {
                    let opts = WriteOptions { dialect, with_schema: schema, transaction };
                    fixtures_sql::write_fixture_file(&out, &graph, opts)?;
                }
                OutputFormat::Jsonl => write_jsonl(&out, &graph)?,
            }
            if let Some(path) = summary {
                write_summary(create_truncated(&path)?, &graph, &graph_cfg.organizations)?;
                info!(path = %path.display(), "wrote summary");
            }
            let duration_ms = started.elapsed().as_millis();
            let counts = graph
                .count_by_kind()
                .into_iter()
                .map(|(k, n)| format!("{}={}", k, n))
                .collect::<Vec<_>>()
                .join(",");
            println!(
                "{}: {} assets [{}] ({} layout, {} ms)",
                out.display(),
                graph.len(),
                counts,
                graph.layout(),
                duration_ms
            );
        }
        #[cfg(feature = "verify")]
        Commands::Verify { file, db } => {
            let sql = std::fs::read_to_string(&file)?;
            let fresh = db.is_none();
            let db = match db {
                Some(p) => fixtures_sql::Db::open_or_create(p)?,
                None => fixtures_sql::Db::open_in_memory()?,
            };
            db.load_fixture(&sql)?;
            let report = db.report()?;
            println!("{}", serde_json::to_string(&report)?);
            if !report.is_consistent() {
                return Err(anyhow!(
                    "{}: {} orphans, {} parent type mismatches, {} duplicate names",
                    file.display(),
                    report.orphans,
                    report.parent_kind_mismatches,
                    report.duplicate_names
                ));
            }
            let declared = fixtures_sql::FixtureHeader::parse(&sql).assets;
            if let (true, Some(n)) = (fresh, declared) {
                if n as i64 != report.total {
                    bail!("{}: header declares {} assets but {} were loaded", file.display(), n, report.total);
                }
            }
        }
        #[cfg(feature = "kb")]
        Commands::KbSplit { dir, out, payload, batch_size } => {
            let batch_size = batch_size
                .or_else(|| loaded_cfg.as_ref().and_then(|c| c.kb.as_ref()).and_then(|k| k.batch_size))
                .unwrap_or(kb_docs::DEFAULT_BATCH_SIZE);
            if batch_size == 0 { bail!("--batch-size must be > 0"); }
            let docs = kb_docs::Splitter::new()?.scan_docs(&dir)?;
            if let Some(path) = out {
                let mut w = create_truncated(&path)?;
                for d in &docs { writeln!(w, "{}", serde_json::to_string(d)?)?; }
                w.flush()?;
            } else {
                for d in &docs { println!("{}", serde_json::to_string(d)?); }
            }
            if let Some(path) = payload {
                let batches = kb_docs::ingest_batches(&docs, batch_size);
                let mut w = create_truncated(&path)?;
                serde_json::to_writer_pretty(&mut w, &batches)?;
                w.flush()?;
                info!(path = %path.display(), batches = batches.len(), "wrote ingest payloads");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_config() {
        let base = GraphConfig { layout: Layout::Flat, seed: Some(1), ..Default::default() };
        let args = GenerateArgs { layout: Some(Layout::Graph), orgs: Some(2), ..Default::default() };
        let cfg = build_graph_config(&args, base).unwrap();
        assert_eq!(cfg.layout, Layout::Graph);
        assert_eq!(cfg.seed, Some(1));
        assert_eq!(cfg.organizations.len(), 2);
    }

    #[test]
    fn org_count_is_bounded() {
        let args = GenerateArgs { orgs: Some(9), ..Default::default() };
        assert!(build_graph_config(&args, GraphConfig::default()).is_err());
        let args = GenerateArgs { orgs: Some(0), ..Default::default() };
        assert!(build_graph_config(&args, GraphConfig::default()).is_err());
    }

    #[test]
    fn summary_has_a_row_per_org_and_type() {
        let cfg = GraphConfig { seed: Some(5), now: Some(0), ..Default::default() };
        let orgs = cfg.organizations.clone();
        let graph = asset_graph::generate(cfg).unwrap();
        let mut buf = Vec::new();
        write_summary(&mut buf, &graph, &orgs).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("org_id,org_name,type,count"));
        let rows: Vec<_> = lines.collect();
        assert_eq!(rows.len(), graph.count_by_org_and_kind().len());
        assert!(rows.iter().any(|r| r.starts_with("11111111-1111-1111-1111-111111111111,Alpha Corp,domain,")));
    }

    #[test]
    fn default_output_follows_format() {
        assert_eq!(OutputFormat::Sql.default_out(), PathBuf::from("fixtures.sql"));
        assert_eq!(OutputFormat::Jsonl.default_out(), PathBuf::from("fixtures.jsonl"));
    }

    #[test]
    fn cli_parses_generate_flags() {
        let cli = Cli::try_parse_from([
            "fixturegen", "generate", "--layout", "tagged", "--seed", "7", "--dialect", "sqlite", "--schema",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate { args, schema, .. } => {
                assert_eq!(args.layout, Some(Layout::Tagged));
                assert_eq!(args.dialect, Some(Dialect::Sqlite));
                assert!(schema);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["fixturegen", "generate", "--layout", "tree"]).is_err());
    }
}
