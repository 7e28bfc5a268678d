//! Loading CSV files into a [`Table`].
//!
//! Lines come from a [`LineReader`] configured per call, so the line-ending
//! policy and byte budget never leak into process-wide state. A blank line
//! is kept as a row holding one null field.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use anyhow::{Context, Result};
use encoding_rs::UTF_8;
use log::{debug, warn};

use crate::{
    io_utils::{self, DEFAULT_MAX_LINE_BYTES, LineEndings, LineReader},
    row::Cell,
    table::Table,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Consume the first record as the header instead of a data row.
    pub has_header: bool,
    /// Longest line kept, in bytes; longer lines are cut at this boundary.
    pub max_line_bytes: usize,
    pub line_endings: LineEndings,
    /// Stored for header columns a row does not reach.
    pub default_cell: Cell,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            has_header: false,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            line_endings: LineEndings::Auto,
            default_cell: None,
        }
    }
}

impl LoadOptions {
    pub fn with_header(has_header: bool) -> Self {
        Self {
            has_header,
            ..Self::default()
        }
    }
}

impl Table {
    /// Loads `path`, returning an empty table when the file cannot be read.
    ///
    /// Use [`Table::try_from_file`] to tell a missing file apart from an empty one.
    pub fn from_file(path: impl AsRef<Path>, has_header: bool) -> Table {
        let path = path.as_ref();
        match Table::try_from_file(path, &LoadOptions::with_header(has_header)) {
            Ok(table) => table,
            Err(err) => {
                warn!("Returning empty table for {path:?}: {err:#}");
                Table::new()
            }
        }
    }

    pub fn try_from_file(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Table> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
        let table = Table::from_reader(BufReader::new(file), options)
            .with_context(|| format!("Reading CSV from {path:?}"))?;
        debug!(
            "Loaded {} row(s) from {:?} (header: {})",
            table.len(),
            path,
            table.header().is_some()
        );
        Ok(table)
    }

    pub fn from_reader<R>(reader: R, options: &LoadOptions) -> Result<Table>
    where
        R: BufRead,
    {
        let lines = LineReader::new(reader, options.max_line_bytes, options.line_endings);
        let mut table = Table::new().with_default_cell(options.default_cell.clone());
        let mut awaiting_header = options.has_header;

        for (idx, line) in lines.enumerate() {
            let line_number = idx + 1;
            let line = line.with_context(|| format!("Reading line {line_number}"))?;
            if line.len() == options.max_line_bytes {
                debug!(
                    "Line {line_number} reached the {} byte limit and may be truncated",
                    options.max_line_bytes
                );
            }
            let record = io_utils::split_line(&line)
                .with_context(|| format!("Parsing line {line_number}"))?;

            match (record, awaiting_header) {
                (Some(record), true) => {
                    awaiting_header = false;
                    table.set_header(record.iter().map(|field| {
                        let (text, _) = UTF_8.decode_without_bom_handling(field);
                        text.into_owned()
                    }));
                }
                (None, true) => {
                    awaiting_header = false;
                    table.set_header([String::new()]);
                }
                (Some(record), false) => {
                    table.add_row(record.iter());
                }
                (None, false) => {
                    table.add_blank_row();
                }
            }
        }
        Ok(table)
    }
}
