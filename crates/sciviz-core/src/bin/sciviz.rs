//! sciviz: visualize decoded data containers from the command line.
//!
//! Reads a JSON-encoded container, writes SVG artifacts and prints the
//! result records as JSON on stdout. Logs go to stderr.
//!
//! Built with the `cli` feature: `cargo run --features cli -- inspect data.json`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use _sciviz_core::config::SciVizConfig;
use _sciviz_core::container::adapter::Container;
use _sciviz_core::events::{self, EventSchema};
use _sciviz_core::introspect;
use _sciviz_core::models::ResultRecord;
use _sciviz_core::render::svg::SvgSink;

// ── CLI ─────────────────────────────────────────────────────────────

/// Automatic visualization of scientific data containers and event recordings.
#[derive(Parser, Debug)]
#[command(name = "sciviz", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Directory artifacts are written to.
    #[arg(long, global = true, env = "SCIVIZ_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Public URL prefix for artifact references.
    #[arg(long, global = true, env = "SCIVIZ_PUBLIC_BASE")]
    public_base: Option<String>,

    /// Write artifacts directly into the output directory.
    #[arg(long, global = true)]
    flat: bool,

    /// Pretty-print the result records.
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk every entry of a container and chart what can be charted.
    Inspect {
        /// JSON-encoded container.
        container: PathBuf,
    },
    /// Run the five-chart event pipeline over an event recording.
    Events {
        /// JSON-encoded container.
        container: PathBuf,

        /// Event layout; defaults to the container's format.
        #[arg(long, value_enum)]
        schema: Option<SchemaArg>,

        /// Recording name used in chart titles; defaults to the file name.
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SchemaArg {
    Struct,
    Flat,
}

impl From<SchemaArg> for EventSchema {
    fn from(arg: SchemaArg) -> Self {
        match arg {
            SchemaArg::Struct => EventSchema::Struct,
            SchemaArg::Flat => EventSchema::FlatTable,
        }
    }
}

fn config_from(args: &OutputArgs) -> SciVizConfig {
    let mut config = SciVizConfig::from_env();
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(base) = &args.public_base {
        config.public_base = base.clone();
    }
    if args.flat {
        config.request_scoped = false;
    }
    config
}

fn load(path: &Path) -> anyhow::Result<Container> {
    Container::from_path(path).with_context(|| format!("failed to load {}", path.display()))
}

fn print_records(records: &[ResultRecord], pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(records)?
    } else {
        serde_json::to_string(records)?
    };
    println!("{out}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config_from(&cli.output);
    let sink = SvgSink::from_config(&config);
    info!(dir = %sink.directory().display(), "writing artifacts");

    let records = match &cli.command {
        Command::Inspect { container } => {
            let root = load(container)?;
            introspect::analyze_container(&root, &sink, config.limits)
                .context("container analysis failed")?
        }
        Command::Events {
            container,
            schema,
            name,
        } => {
            let root = load(container)?;
            let schema = schema
                .map(EventSchema::from)
                .unwrap_or_else(|| EventSchema::for_format(root.format()));
            let name = name.clone().unwrap_or_else(|| {
                container
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| container.display().to_string())
            });
            events::visualize_events(&name, &root, schema, &sink)
                .context("event visualization failed")?
        }
    };

    print_records(&records, cli.output.pretty)
}
