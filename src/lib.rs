pub mod cli;
pub mod error;
pub mod format;
pub mod io_utils;
pub mod load;
pub mod row;
pub mod table;

use std::{env, io::Write, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::cli::{Cli, ColumnArgs, Commands, DumpArgs, FormatArgs, InputArgs};

pub use crate::{
    error::FormatError,
    format::{Quoting, RowFormat, format_row, normalize_cell},
    load::LoadOptions,
    row::{Cell, Key, Row},
    table::Table,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_table", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Format(args) => handle_format(&args),
        Commands::Column(args) => handle_column(&args),
        Commands::Dump(args) => handle_dump(&args),
    }
}

fn load_input(args: &InputArgs) -> Result<Table> {
    let options = LoadOptions {
        has_header: args.header,
        max_line_bytes: args.max_line_bytes,
        ..LoadOptions::default()
    };
    Table::try_from_file(&args.input, &options)
        .with_context(|| format!("Loading table from {:?}", args.input))
}

fn handle_format(args: &FormatArgs) -> Result<()> {
    info!(
        "Formatting '{}' with delimiter '{}'",
        args.source.input.display(),
        io_utils::printable_delimiter(args.delimiter)
    );
    let table = load_input(&args.source)?;
    let quoting = if args.quote_all {
        Quoting::Always
    } else {
        Quoting::Necessary
    };
    let format = RowFormat::default()
        .delimiter(args.delimiter)
        .enclosure(args.enclosure)
        .eol(args.eol.as_str())
        .quoting(quoting);
    let text = table.to_csv(&format)?;

    let encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
    let mut writer = io_utils::open_output(args.output.as_deref(), encoding)?;
    writer
        .write_all(text.as_bytes())
        .context("Writing formatted CSV")?;
    writer.flush().context("Flushing formatted CSV")?;
    info!("Wrote {} row(s)", table.len());
    Ok(())
}

fn handle_column(args: &ColumnArgs) -> Result<()> {
    let table = load_input(&args.source)?;
    let key = if args.source.header {
        Key::Name(args.key.clone())
    } else {
        let index = args.key.trim().parse::<usize>().map_err(|_| {
            anyhow!(
                "Column key '{}' must be a zero-based index when no header is used",
                args.key
            )
        })?;
        Key::Index(index)
    };
    debug!("Extracting column {key} from {} row(s)", table.len());

    let column = table.get_column(key, args.default.as_deref());
    let mut stdout = std::io::stdout().lock();
    for cell in &column {
        writeln!(stdout, "{}", cell.as_deref().unwrap_or_default())
            .context("Writing column value")?;
    }
    Ok(())
}

fn handle_dump(args: &DumpArgs) -> Result<()> {
    let table = load_input(&args.source)?;
    let json =
        serde_json::to_string_pretty(table.to_array()).context("Serializing rows as JSON")?;
    println!("{json}");
    Ok(())
}
