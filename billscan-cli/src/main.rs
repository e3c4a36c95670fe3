use anyhow::{Context, Result};
use billscan_analysis::{ExtractMode, analyze_bill_with, classify_all, extract_candidates};
use billscan_ingest::{FileTextExtractor, TextExtractor, parse_tables};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::fmt::time::ChronoLocal;

mod config;
mod report;
mod state;

#[derive(Parser, Debug)]
#[command(
    name = "billscan",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BILLSCAN_BUILD_SHA"), ")"),
    about = "Carrier bill charge extraction and classification"
)]
struct Cli {
    /// Log analysis decisions to stderr (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze an extracted bill (plain text, plus its markdown table rendering)
    Analyze {
        /// Plain-text rendering of the bill
        plain: PathBuf,

        /// Markdown table rendering (defaults to a sibling <stem>.md if present)
        #[arg(long)]
        tables: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Also write every charge to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Run the extraction passes on the thread pool
        #[arg(long)]
        parallel: bool,
    },

    /// List the money tables found in a markdown rendering
    Tables {
        markdown: PathBuf,
    },

    /// Show the classified charge candidates of one text pass
    Extract {
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = Mode::Raw)]
        mode: Mode,
    },

    /// Config file commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default ~/.billscan/config.toml
    Init,

    /// Print the effective configuration
    Show,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Raw,
    Markdown,
}

impl From<Mode> for ExtractMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::Raw => ExtractMode::RawText,
            Mode::Markdown => ExtractMode::MarkdownText,
        }
    }
}

fn init_logging(verbose: u8, configured: &str) {
    let level = match verbose {
        0 => configured.parse().unwrap_or(Level::WARN),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;
    init_logging(cli.verbose, &cfg.output.log_level);

    match cli.command {
        Command::Analyze {
            plain,
            tables,
            json,
            csv,
            parallel,
        } => {
            let extractor = match tables {
                Some(p) => FileTextExtractor::with_table_path(p),
                None => FileTextExtractor::new(),
            };
            let doc = extractor.extract(&plain)?;

            let mut analysis = cfg.analysis.clone();
            analysis.parallel_passes |= parallel;
            let result = analyze_bill_with(&doc, &analysis);

            if json || cfg.output.wants_json() {
                report::print_json(&result)?;
            } else {
                report::print_text(&result);
            }

            if let Some(out) = csv {
                report::export_csv(&result, &out)?;
                info!(path = %out.display(), charges = result.charge_count(), "csv written");
            }
        }

        Command::Tables { markdown } => {
            let text = fs::read_to_string(&markdown)
                .with_context(|| format!("read {}", markdown.display()))?;
            report::print_tables(&parse_tables(&text));
        }

        Command::Extract { file, mode } => {
            let text =
                fs::read_to_string(&file).with_context(|| format!("read {}", file.display()))?;
            let candidates = classify_all(extract_candidates(&text, mode.into()), &cfg.analysis);
            report::print_candidates(&candidates);
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                println!("# {}", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}
