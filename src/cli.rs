//! Command Line Interface.
//!
//! Output of `--help`:
//! ```
//! Minimum-crossing linear ordering for NodeTrix-style two-page book embeddings
//!
//!     Usage: nodetrix-order [OPTIONS] --method <METHOD> [GRAPH_FILE]
//!
//!     Arguments:
//!         [GRAPH_FILE]
//!             Path to the input graph JSON file, or `-` for stdin
//!
//!     Options:
//!         -m, --method <METHOD>
//!             Ordering method to use [possible values: input, ilp, heuristic, hybrid]
//!         -i, --instance <INSTANCE>
//!             Instance id used for caching (defaults to the file stem)
//!         -t, --time-limit-secs <TIME_LIMIT_SECS>
//!             Wall-clock budget for ilp/hybrid, in seconds
//!         -c, --config <CONFIG>
//!             Path to a TOML config file
//!         --cache-dir <CACHE_DIR>
//!             Directory for the on-disk order cache
//!         -v, --verbose...
//!             More output per occurrence
//!         -q, --quiet...
//!             Less output per occurrence
//!         -h, --help
//!             Print help
//!         -V, --version
//!             Print version
//! ```

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use clap::{command, Parser, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use patharg::InputArg;

use crate::config::AppConfig;
use crate::graph::Graph;
use crate::orchestrator::{Method, Orchestrator, OrchestratorConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the input graph JSON file, or `-` for stdin.
    #[arg(default_value = "-")]
    pub graph_file: InputArg,

    /// Ordering method to use.
    #[arg(short, long, value_enum)]
    pub method: MethodArg,

    /// Instance id used for caching (defaults to the file stem, or `stdin`
    /// when reading from standard input).
    #[arg(short, long)]
    pub instance: Option<String>,

    /// Wall-clock budget for ilp/hybrid, in seconds.
    #[arg(short, long)]
    pub time_limit_secs: Option<u64>,

    /// Path to a TOML config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for the on-disk order cache.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[clap(rename_all = "kebab-case")]
pub enum MethodArg {
    Input,
    Ilp,
    Heuristic,
    Hybrid,
}

impl From<MethodArg> for Method {
    fn from(m: MethodArg) -> Method {
        match m {
            MethodArg::Input => Method::Input,
            MethodArg::Ilp => Method::Ilp,
            MethodArg::Heuristic => Method::Heuristic,
            MethodArg::Hybrid => Method::Hybrid,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("failed to read the graph file")]
    ReadGraph(#[source] std::io::Error),
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    #[error(transparent)]
    Solve(#[from] crate::errors::SolveError),
}

/// Run the CLI end to end: load the graph, dispatch through the
/// orchestrator, and return the resulting order's whitespace-joined string
/// (what callers should print to stdout).
pub fn run(cli: Cli) -> Result<String, CliError> {
    let mut orchestrator_config = match &cli.config {
        Some(path) => AppConfig::deserialize(path.clone())?.into_orchestrator_config(),
        None => OrchestratorConfig::default(),
    };
    if let Some(cache_dir) = &cli.cache_dir {
        orchestrator_config.cache_dir = cache_dir.clone();
    }

    let instance = cli.instance.clone().unwrap_or_else(|| default_instance(&cli.graph_file));
    let time_limit = cli.time_limit_secs.map(Duration::from_secs);

    let mut contents = String::new();
    cli.graph_file
        .open()
        .and_then(|mut reader| reader.read_to_string(&mut contents))
        .map_err(CliError::ReadGraph)?;
    let graph = Graph::from_json_str(&contents).map_err(crate::errors::SolveError::from)?;

    let mut orchestrator = Orchestrator::new(orchestrator_config);
    let order = orchestrator.solve(&instance, &graph, cli.method.into(), time_limit)?;

    Ok(order.to_space_separated())
}

fn default_instance(graph_file: &InputArg) -> String {
    match graph_file {
        InputArg::Stdin => "stdin".to_string(),
        InputArg::Path(path) => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "instance".to_string()),
    }
}
