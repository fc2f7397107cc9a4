//! QCraft Command-Line Interface
//!
//! Runs the fault-tolerant compilation workflow on JSON circuits and device
//! profiles, and exposes the patch discoverer and cost model on their own.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use qcraft_export::ExportPolicy;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{compile, discover, estimate, families, version};

/// QCraft - fault-tolerant quantum compilation
#[derive(Parser)]
#[command(name = "qcraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Orchestrator configuration file (YAML)
    #[arg(short, long, global = true, env = "QCRAFT_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full workflow for a circuit on a device
    Compile {
        /// Circuit file (JSON)
        #[arg(short, long)]
        input: String,

        /// Device profile file (JSON)
        #[arg(short, long)]
        device: String,

        /// Write the workflow outcome to this file (JSON)
        #[arg(short, long)]
        output: Option<String>,

        /// Surface code layout (planar, rotated, color)
        #[arg(long)]
        layout: Option<String>,

        /// Code distance
        #[arg(long)]
        distance: Option<u32>,

        /// Export policy (none, obfuscate, strict-local)
        #[arg(long)]
        export_policy: Option<ExportPolicy>,

        /// Comments attached to the job package
        #[arg(long)]
        comments: Option<String>,
    },

    /// Rank code patch candidates for a circuit on a device
    Discover {
        /// Circuit file (JSON)
        #[arg(short, long)]
        input: String,

        /// Device profile file (JSON)
        #[arg(short, long)]
        device: String,

        /// Print the discovery as JSON
        #[arg(long)]
        json: bool,
    },

    /// Estimate both compilation strategies for a circuit on a device
    Estimate {
        /// Circuit file (JSON)
        #[arg(short, long)]
        input: String,

        /// Device profile file (JSON)
        #[arg(short, long)]
        device: String,

        /// Print the estimates as JSON
        #[arg(long)]
        json: bool,
    },

    /// List configured code families
    Families {
        /// Device profile file (JSON) to list feasible distances for
        #[arg(short, long)]
        device: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Compile {
            input,
            device,
            output,
            layout,
            distance,
            export_policy,
            comments,
        } => compile::execute(&compile::CompileArgs {
            input: &input,
            device: &device,
            output: output.as_deref(),
            config,
            layout,
            distance,
            export_policy,
            comments,
        }),

        Commands::Discover {
            input,
            device,
            json,
        } => discover::execute(&input, &device, config, json),

        Commands::Estimate {
            input,
            device,
            json,
        } => estimate::execute(&input, &device, config, json),

        Commands::Families { device } => families::execute(config, device.as_deref()),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
