use anyhow::{Context, Result};
use asset_graph::GraphConfig;
use fixtures_sql::Dialect;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize, Clone)]
pub struct GenerateConfig {
    #[serde(flatten)]
    pub graph: GraphConfig,
    pub dialect: Option<Dialect>,
    pub out: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct KbConfig {
    pub batch_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    pub generate: Option<GenerateConfig>,
    pub kb: Option<KbConfig>,
}

pub const DEFAULT_CONFIG: &str = "fixturegen.yaml";

/// Loads `path`, or `./fixturegen.yaml` when no path is given and it exists.
pub fn load_config(path: Option<&Path>) -> Result<Option<Config>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new(DEFAULT_CONFIG);
            if p.exists() { p.to_path_buf() } else { return Ok(None); }
        }
    };
    let s = fs::read_to_string(&path).with_context(|| format!("reading config {}", path.display()))?;
    parse_config(&s).with_context(|| format!("parsing config {}", path.display())).map(Some)
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(serde_yaml::from_str(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset_graph::Layout;

    #[test]
    fn generate_section_flattens_graph_fields() {
        let cfg = parse_config(
            "generate:\n  layout: graph\n  seed: 9\n  dialect: sqlite\n  out: seed.sql\n  ports_per_ip: { min: 1, max: 2 }\nkb:\n  batch_size: 5\n",
        )
        .unwrap();
        let g = cfg.generate.unwrap();
        assert_eq!(g.graph.layout, Layout::Graph);
        assert_eq!(g.graph.seed, Some(9));
        assert_eq!(g.graph.ports_per_ip.max, 2);
        assert_eq!(g.graph.flat_assets, 500);
        assert_eq!(g.dialect, Some(Dialect::Sqlite));
        assert_eq!(g.out, Some(PathBuf::from("seed.sql")));
        assert_eq!(cfg.kb.unwrap().batch_size, Some(5));
    }

    #[test]
    fn custom_organizations() {
        let cfg = parse_config(
            "generate:\n  organizations:\n    - id: 66666666-6666-6666-6666-666666666666\n      name: Zeta AG\n",
        )
        .unwrap();
        let orgs = cfg.generate.unwrap().graph.organizations;
        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].name, "Zeta AG");
    }

    #[test]
    fn bad_yaml_is_an_error() {
        assert!(parse_config("generate: [not, a, map]").is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(load_config(Some(Path::new("/nonexistent/fixturegen.yaml"))).is_err());
    }
}
