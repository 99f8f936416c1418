//! CLI tool to print the fields of a fixed-length file.
//!
//! Usage:
//!   fixed-read <layout.json> <input.txt>
//!   fixed-read <layout.json> <input.txt> --encoding shift_jis -v
//!
//! Each record is printed as one `name: value` line per column, followed by
//! a blank line.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use fixed_length_rs::{
    Charset, ColumnLayout, DEFAULT_BUFFER_SIZE, FixedLengthDataReader, FixedLengthReader,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Print the fields of every record in a fixed-length file.
#[derive(Parser)]
#[command(name = "fixed-read")]
struct Cli {
    /// Column layout file (.json)
    layout: String,

    /// Input data file (fixed-length records)
    input: String,

    /// Encoding label of the input, e.g. utf-8, shift_jis, windows-1252
    #[arg(short, long, default_value = "utf-8")]
    encoding: String,

    /// Initial line buffer size in bytes
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Keep a leading byte-order mark as record data
    #[arg(long)]
    no_bom: bool,

    /// Log layout, buffer and record details on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> fixed_length_rs::Result<()> {
    let layout = ColumnLayout::from_json_file(&cli.layout)?;
    let mut charset = Charset::for_label(&cli.encoding)?;
    if cli.no_bom {
        charset = charset.without_preamble();
    }
    info!(
        layout = %cli.layout,
        input = %cli.input,
        encoding = charset.name(),
        columns = layout.len(),
        "reading fixed-length file"
    );

    let file = tokio::fs::File::open(&cli.input).await?;
    let reader = FixedLengthReader::with_buffer_size_async(file, charset, cli.buffer_size)?;
    let mut rows = FixedLengthDataReader::new(reader, layout);

    let names: Vec<String> = rows
        .layout()
        .iter()
        .map(|column| match column.name() {
            Some(name) => name.to_string(),
            None => format!("#{}", column.ordinal()),
        })
        .collect();
    let width = names.iter().map(String::len).max().unwrap_or(0);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut count = 0usize;
    while rows.read_async().await? {
        count += 1;
        debug!(record = count, "record read");
        for (ordinal, name) in names.iter().enumerate() {
            let value = rows.value(ordinal)?;
            writeln!(
                out,
                "{name:<width$}: {}",
                value.as_deref().unwrap_or("<null>")
            )?;
        }
        writeln!(out)?;
    }
    rows.close();

    eprintln!("Processed {count} records");
    Ok(())
}
