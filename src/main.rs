use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use bundlesnap::cli;

#[derive(Parser)]
#[command(
    name = "bundlesnap",
    about = "Bundlesnap — pull a site's framework build bundles into a ZIP",
    version,
    after_help = "Run 'bundlesnap <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a page's bundle files and package them into a ZIP
    Extract {
        /// Page URL to extract from
        url: String,
        /// Also request .map sourcemap companions for every bundle file
        #[arg(long)]
        sourcemaps: bool,
        /// Window-state JSON dump to aid detection (captured from the console)
        #[arg(long)]
        state_file: Option<PathBuf>,
        /// Directory to save the archive into
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Per-request timeout in milliseconds
        #[arg(long, default_value = "15000")]
        timeout: u64,
    },
    /// Detect the page's front-end framework and routing metadata
    Detect {
        /// Page URL to inspect
        url: String,
        /// Window-state JSON dump to aid detection
        #[arg(long)]
        state_file: Option<PathBuf>,
        /// Per-request timeout in milliseconds
        #[arg(long, default_value = "15000")]
        timeout: u64,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Export global flags via environment variables so all modules can
    // check them without plumbing.
    if cli.json {
        std::env::set_var("BUNDLESNAP_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("BUNDLESNAP_QUIET", "1");
    }

    let default_filter = if cli.verbose {
        "bundlesnap=debug,info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Extract {
            url,
            sourcemaps,
            state_file,
            out,
            timeout,
        } => cli::extract_cmd::run(&url, sourcemaps, state_file.as_deref(), &out, timeout).await,
        Commands::Detect {
            url,
            state_file,
            timeout,
        } => cli::detect_cmd::run(&url, state_file.as_deref(), timeout).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "bundlesnap", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error.
    if let Err(e) = &result {
        if !cli::output::is_quiet() && !cli::output::is_json() {
            eprintln!("  Error: {e:#}");
        }
        if cli::output::is_json() {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        }
        std::process::exit(1);
    }

    result
}
