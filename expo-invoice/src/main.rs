use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use expo_invoice::{generate_invoices, Config, OutputMode};

#[derive(Parser)]
#[command(name = "expo-invoice")]
#[command(about = "Render one PDF invoice per billing recipient from a booking export", long_about = None)]
struct Cli {
    /// Booking export (.csv or .xlsx)
    input: PathBuf,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory the invoices are written to
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Write every recipient into a single document named after today's date
    #[arg(long)]
    combined: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(dir) = cli.output_dir {
        config.output.directory = dir;
    }
    if cli.combined {
        config.output.mode = OutputMode::Combined;
    }

    let today = chrono::Local::now().date_naive();
    let written = generate_invoices(&cli.input, &config, today)
        .with_context(|| format!("generating invoices from {}", cli.input.display()))?;

    for doc in &written {
        for group in &doc.groups {
            println!("{}: {}", group.recipient, doc.path.display());
        }
    }
    Ok(())
}
