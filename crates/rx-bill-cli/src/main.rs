//! rx-bill: price free-text prescriptions from the command line.
//!
//! ```text
//! rx-bill --prices Medicine.csv parse "Paracetamol twice a day for 5 days"
//! echo "Aspirin once daily" | rx-bill bill --format csv
//! rx-bill suggest paracetmol
//! ```

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rx_bill_core::{BillExport, ParserOptions, PrescriptionParser, PriceTable};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rx-bill", version, about = "Extract dosages from prescriptions and price them")]
struct Cli {
    /// CSV price source with `drug` and `unit_price` columns
    #[arg(long, env = "RX_BILL_PRICES", default_value = "Medicine.csv")]
    prices: PathBuf,

    /// Skip the regex recovery pass for missing frequency/duration
    #[arg(long)]
    no_fallback: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a prescription and print the priced entries as JSON
    Parse {
        /// Prescription text (read from stdin when omitted)
        text: Option<String>,
    },
    /// Parse a prescription and print a bill export
    Bill {
        /// Prescription text (read from stdin when omitted)
        text: Option<String>,

        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// List price-table drugs closest to a name
    Suggest {
        name: String,

        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Json,
    Csv,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let prices = PriceTable::from_csv_path(&cli.prices)
        .with_context(|| format!("failed to load price source {}", cli.prices.display()))?;

    tracing::debug!(drugs = prices.len(), "price table ready");

    let options = ParserOptions {
        fallback: !cli.no_fallback,
    };
    let parser = PrescriptionParser::with_options(&prices, options);

    match cli.command {
        Command::Parse { text } => {
            let text = read_prescription(text)?;
            let result = parser.parse(&text);
            println!("{}", result.to_json()?);
        }
        Command::Bill { text, format } => {
            let text = read_prescription(text)?;
            let result = parser.parse(&text);
            let export = BillExport::new(&text, &result);
            match format {
                Format::Json => println!("{}", export.to_json()?),
                Format::Csv => print!("{}", export.to_csv()),
            }
        }
        Command::Suggest { name, limit } => {
            let suggestions = prices.closest(&name, limit);
            println!("{}", serde_json::to_string_pretty(&suggestions)?);
        }
    }

    Ok(())
}

/// Prescription from the argument, or all of stdin.
fn read_prescription(text: Option<String>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("failed to read prescription from stdin")?;

    if buffer.trim().is_empty() {
        bail!("no prescription text given");
    }
    Ok(buffer)
}
