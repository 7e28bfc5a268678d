use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::io_utils::{DEFAULT_MAX_LINE_BYTES, parse_delimiter, parse_enclosure};

#[derive(Debug, Parser)]
#[command(author, version, about = "Load CSV files into a table and write them back out", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Re-serialize a CSV file with normalized whitespace and the chosen dialect
    Format(FormatArgs),
    /// Print a single column, one value per line
    Column(ColumnArgs),
    /// Print the loaded rows as JSON
    Dump(DumpArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input CSV file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Treat the first row as a header and key rows by header name
    #[arg(long = "header")]
    pub header: bool,
    /// Longest line to keep, in bytes; longer lines are truncated
    #[arg(long = "max-line-bytes", default_value_t = DEFAULT_MAX_LINE_BYTES)]
    pub max_line_bytes: usize,
}

#[derive(Debug, Args)]
pub struct FormatArgs {
    #[command(flatten)]
    pub source: InputArgs,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Output field delimiter (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter, default_value = ",")]
    pub delimiter: u8,
    /// Output enclosure character ('double', 'single', or any ASCII character)
    #[arg(long, value_parser = parse_enclosure, default_value = "double")]
    pub enclosure: u8,
    /// Line ending written after every row
    #[arg(long, default_value = "lf")]
    pub eol: LineEnding,
    /// Enclose every field, not only those that need it
    #[arg(long = "quote-all")]
    pub quote_all: bool,
    /// Character encoding for the output file/stdout (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ColumnArgs {
    #[command(flatten)]
    pub source: InputArgs,
    /// Column to extract: a header name with --header, otherwise a zero-based index
    #[arg(short = 'k', long = "key")]
    pub key: String,
    /// Value printed for rows that lack the column
    #[arg(long)]
    pub default: Option<String>,
}

#[derive(Debug, Args)]
pub struct DumpArgs {
    #[command(flatten)]
    pub source: InputArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum LineEnding {
    Lf,
    Crlf,
    Cr,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
            LineEnding::Cr => "\r",
        }
    }
}
