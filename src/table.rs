//! The in-memory row store.
//!
//! A [`Table`] owns its rows in append order. Re-keying happens once, when a
//! row is added: rows added before [`Table::set_header`] keep their
//! positional keys, rows added after it are keyed by header name.

use std::fmt;

use crate::{
    error::FormatError,
    format::{RowFormat, format_row},
    row::{Cell, Key, Row, rekey},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Row>,
    header: Option<Vec<String>>,
    default_cell: Cell,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value stored for header columns missing from a source row.
    pub fn with_default_cell(mut self, default_cell: Cell) -> Self {
        self.default_cell = default_cell;
        self
    }

    /// Appends one record.
    ///
    /// With a header set, the record is keyed by header name (padded with the
    /// default cell, extra fields dropped) and each present field is widened
    /// from Latin-1. Without a header it is stored positionally.
    pub fn add_row<I, F>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = F>,
        F: AsRef<[u8]>,
    {
        let raw: Vec<F> = fields.into_iter().collect();
        let row = rekey(self.header.as_deref(), &raw, &self.default_cell);
        self.rows.push(row);
        self
    }

    /// Appends the record a blank source line stands for: one null field.
    ///
    /// Under a header the first column holds an empty string and the rest
    /// take the default cell.
    pub fn add_blank_row(&mut self) -> &mut Self {
        let row = match self.header.as_deref() {
            Some(names) => rekey(Some(names), &[b""], &self.default_cell),
            None => Row::positional([None]),
        };
        self.rows.push(row);
        self
    }

    /// Replaces the header used for rows added from now on. Stored rows are left untouched.
    pub fn set_header<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    pub fn default_cell(&self) -> &Cell {
        &self.default_cell
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_array(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Collects the cell at `key` from every row, substituting `default` where the key is absent.
    pub fn get_column<K>(&self, key: K, default: Option<&str>) -> Vec<Cell>
    where
        K: Into<Key>,
    {
        let key = key.into();
        self.rows
            .iter()
            .map(|row| match row.get(&key) {
                Some(cell) => cell.clone(),
                None => default.map(str::to_string),
            })
            .collect()
    }

    /// Formats every row, in order, without the header.
    ///
    /// Stops at the first row that cannot be encoded; no partial text is returned.
    pub fn to_csv(&self, format: &RowFormat) -> Result<String, FormatError> {
        let mut output = String::new();
        for (index, row) in self.rows.iter().enumerate() {
            let line = format_row(row.values().map(|cell| cell.as_deref()), format).map_err(
                |source| FormatError::Row {
                    index,
                    source: Box::new(source),
                },
            )?;
            output.push_str(&line);
        }
        Ok(output)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_csv(&RowFormat::default()).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
