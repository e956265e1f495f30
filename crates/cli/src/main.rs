use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use amgraph_core::{GraphOptions, RendererConfig};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// amgraph - Render the revision graph of migration scripts
#[derive(Parser, Debug)]
#[command(name = "amgraph")]
#[command(version)] // Auto-pull version from Cargo.toml
#[command(
    about = "Draw the dependency graph of versioned migration scripts",
    long_about = None
)]
struct Cli {
    /// Directories containing migration scripts
    #[arg(value_name = "VERSIONS-DIRECTORY", required = true, num_args = 1..)]
    version_dirs: Vec<PathBuf>,

    /// Label nodes with revision identifiers instead of file names
    #[arg(long)]
    short_node_labels: bool,

    /// One label per versions directory, shown under each node
    #[arg(long, value_name = "LABEL", num_args = 1..)]
    dir_labels: Option<Vec<String>>,

    /// Output file; the extension selects the format (png, svg, pdf, dot, json, ...)
    #[arg(long, value_name = "PATH", default_value = "output.png")]
    output: PathBuf,

    /// Point edges from older to newer revisions, keeping the initial revision at the bottom
    #[arg(long)]
    reverse: bool,

    /// Graphviz executable used for image formats
    #[arg(long, value_name = "PATH", env = "AMGRAPH_DOT", default_value = "dot")]
    dot_binary: OsString,

    /// Log progress to stderr (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_options(self) -> GraphOptions {
        GraphOptions {
            version_dirs: self.version_dirs,
            dir_labels: self.dir_labels,
            output: self.output,
            short_node_labels: self.short_node_labels,
            reverse: self.reverse,
            renderer: RendererConfig {
                dot_binary: self.dot_binary,
            },
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) if verbose => EnvFilter::new("info"),
        Err(_) => return,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<PathBuf> {
    let options = cli.into_options();
    let written = amgraph_core::generate(&options)?;
    Ok(written)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
