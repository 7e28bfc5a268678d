//! CSV text output for rows.
//!
//! Every cell is normalized by [`normalize_cell()`] before encoding, so a
//! formatted row never spans more than one line. Fully enclosed rows go
//! through a `csv::Writer` built per call; minimally quoted rows are joined
//! here, since whitespace alone has to trigger quoting. Both end in `\n`,
//! which is swapped for [`RowFormat::eol`] when that differs.

use std::{borrow::Cow, sync::LazyLock};

use csv::{QuoteStyle, Terminator};
use regex::Regex;

use crate::error::FormatError;

pub const DEFAULT_DELIMITER: u8 = b',';
pub const DEFAULT_ENCLOSURE: u8 = b'"';
pub const LINE_TERMINATOR: &str = "\n";

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u:\s)+").expect("whitespace pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quoting {
    /// Wrap every field in the enclosure.
    Always,
    /// Wrap fields holding the delimiter, the enclosure, a backslash, or whitespace.
    #[default]
    Necessary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFormat {
    pub delimiter: u8,
    pub enclosure: u8,
    pub eol: String,
    pub quoting: Quoting,
}

impl Default for RowFormat {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            enclosure: DEFAULT_ENCLOSURE,
            eol: LINE_TERMINATOR.to_string(),
            quoting: Quoting::default(),
        }
    }
}

impl RowFormat {
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn enclosure(mut self, enclosure: u8) -> Self {
        self.enclosure = enclosure;
        self
    }

    pub fn eol(mut self, eol: impl Into<String>) -> Self {
        self.eol = eol.into();
        self
    }

    pub fn quoting(mut self, quoting: Quoting) -> Self {
        self.quoting = quoting;
        self
    }

    pub fn validate(&self) -> Result<(), FormatError> {
        for (role, byte) in [("delimiter", self.delimiter), ("enclosure", self.enclosure)] {
            if !byte.is_ascii() {
                return Err(FormatError::Dialect(format!(
                    "{role} must be a single ASCII character, got byte 0x{byte:02x}"
                )));
            }
            if byte == b'\n' || byte == b'\r' {
                return Err(FormatError::Dialect(format!(
                    "{role} cannot be a line break"
                )));
            }
        }
        if self.delimiter == self.enclosure {
            return Err(FormatError::Dialect(format!(
                "delimiter and enclosure are both '{}'",
                char::from(self.delimiter)
            )));
        }
        Ok(())
    }

    fn needs_enclosure(&self, value: &str) -> bool {
        match self.quoting {
            Quoting::Always => true,
            Quoting::Necessary => value.bytes().any(|byte| {
                byte == self.delimiter
                    || byte == self.enclosure
                    || matches!(byte, b'\\' | b' ' | b'\t' | b'\r' | b'\n')
            }),
        }
    }
}

/// Collapses runs of ASCII whitespace to a single space and trims the ends.
pub fn normalize_cell(value: &str) -> Cow<'_, str> {
    let collapsed = WHITESPACE_RUN.replace_all(value, " ");
    match collapsed {
        Cow::Borrowed(original) => {
            let trimmed = original.trim_matches(is_trimmed);
            Cow::Borrowed(trimmed)
        }
        Cow::Owned(owned) => {
            let trimmed = owned.trim_matches(is_trimmed);
            if trimmed.len() == owned.len() {
                Cow::Owned(owned)
            } else {
                Cow::Owned(trimmed.to_string())
            }
        }
    }
}

fn is_trimmed(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\0' | '\x0B')
}

/// Encodes one row as a single CSV line terminated by `format.eol`.
///
/// Null cells are written as empty fields. A row made of one empty field is
/// written as an enclosed empty string so it never reads back as a blank line.
pub fn format_row<'a, I>(cells: I, format: &RowFormat) -> Result<String, FormatError>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    format.validate()?;
    let values: Vec<Cow<'a, str>> = cells
        .into_iter()
        .map(|cell| normalize_cell(cell.unwrap_or_default()))
        .collect();

    let mut line = match format.quoting {
        Quoting::Always => write_enclosed_record(&values, format)?,
        Quoting::Necessary => write_minimal_record(&values, format),
    };

    if format.eol != LINE_TERMINATOR {
        if !line.ends_with(LINE_TERMINATOR) {
            return Err(FormatError::Encode(
                "line writer did not terminate the record".to_string(),
            ));
        }
        line.truncate(line.len() - LINE_TERMINATOR.len());
        line.push_str(&format.eol);
    }
    Ok(line)
}

fn write_enclosed_record(
    values: &[Cow<'_, str>],
    format: &RowFormat,
) -> Result<String, FormatError> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .has_headers(false)
        .delimiter(format.delimiter)
        .quote(format.enclosure)
        .quote_style(QuoteStyle::Always)
        .double_quote(true)
        .terminator(Terminator::Any(b'\n'));
    let mut writer = builder.from_writer(Vec::new());
    writer
        .write_record(values.iter().map(|value| value.as_bytes()))
        .map_err(|err| FormatError::Encode(err.to_string()))?;
    let bytes = writer
        .into_inner()
        .map_err(|err| FormatError::Encode(err.error().to_string()))?;
    String::from_utf8(bytes).map_err(|err| FormatError::Encode(err.to_string()))
}

fn write_minimal_record(values: &[Cow<'_, str>], format: &RowFormat) -> String {
    let delimiter = char::from(format.delimiter);
    let enclosure = char::from(format.enclosure);
    let lone_empty = matches!(values, [only] if only.is_empty());

    let mut line = String::new();
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            line.push(delimiter);
        }
        if lone_empty || format.needs_enclosure(value) {
            line.push(enclosure);
            for ch in value.chars() {
                if ch == enclosure {
                    line.push(enclosure);
                }
                line.push(ch);
            }
            line.push(enclosure);
        } else {
            line.push_str(value);
        }
    }
    line.push_str(LINE_TERMINATOR);
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells<'a>(values: &[&'a str]) -> Vec<Option<&'a str>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn normalize_cell_collapses_and_trims() {
        assert_eq!(normalize_cell("  a \t\n b  "), "a b");
        assert_eq!(normalize_cell("line1\r\nline2"), "line1 line2");
        assert_eq!(normalize_cell(" \n "), "");
    }

    #[test]
    fn normalize_cell_borrows_clean_values() {
        assert!(matches!(normalize_cell("Candy Man"), Cow::Borrowed(_)));
    }

    #[test]
    fn normalize_cell_leaves_unicode_spaces_alone() {
        assert_eq!(normalize_cell("a\u{a0}b"), "a\u{a0}b");
    }

    #[test]
    fn necessary_quoting_wraps_only_fields_that_need_it() {
        let line = format_row(cells(&["column_1", "Candy Man", "a,b"]), &RowFormat::default())
            .expect("format row");
        assert_eq!(line, "column_1,\"Candy Man\",\"a,b\"\n");
    }

    #[test]
    fn always_quoting_wraps_every_field() {
        let format = RowFormat::default().quoting(Quoting::Always);
        let line = format_row(cells(&["a", "", "c"]), &format).expect("format row");
        assert_eq!(line, "\"a\",\"\",\"c\"\n");
    }

    #[test]
    fn enclosure_inside_value_is_doubled() {
        let line = format_row(cells(&["say \"hi\""]), &RowFormat::default()).expect("format row");
        assert_eq!(line, "\"say \"\"hi\"\"\"\n");

        let format = RowFormat::default().enclosure(b'\'').quoting(Quoting::Always);
        let line = format_row(cells(&["it's"]), &format).expect("format row");
        assert_eq!(line, "'it''s'\n");
    }

    #[test]
    fn custom_delimiter_and_eol_are_applied() {
        let format = RowFormat::default().delimiter(b';').eol("\r\n");
        let line = format_row(cells(&["a", "b;c"]), &format).expect("format row");
        assert_eq!(line, "a;\"b;c\"\r\n");

        let format = RowFormat::default().eol("");
        let line = format_row(cells(&["a"]), &format).expect("format row");
        assert_eq!(line, "a");
    }

    #[test]
    fn null_cells_become_empty_fields() {
        let line = format_row([Some("a"), None, Some("c")], &RowFormat::default())
            .expect("format row");
        assert_eq!(line, "a,,c\n");
    }

    #[test]
    fn multiline_cells_stay_on_one_line() {
        let line = format_row(cells(&["first\nsecond", "x"]), &RowFormat::default())
            .expect("format row");
        assert_eq!(line, "\"first second\",x\n");
    }

    #[test]
    fn lone_empty_field_is_enclosed() {
        let format = RowFormat::default();
        assert_eq!(format_row(cells(&[""]), &format), Ok("\"\"\n".to_string()));
        assert_eq!(format_row(cells(&[" \t "]), &format), Ok("\"\"\n".to_string()));
        assert_eq!(format_row([None], &format), Ok("\"\"\n".to_string()));

        let format = RowFormat::default().quoting(Quoting::Always);
        assert_eq!(format_row(cells(&[""]), &format), Ok("\"\"\n".to_string()));
    }

    #[test]
    fn empty_fields_alongside_others_stay_bare() {
        let line = format_row(cells(&["", ""]), &RowFormat::default()).expect("format row");
        assert_eq!(line, ",\n");
    }

    #[test]
    fn always_quoting_applies_custom_delimiter_and_eol() {
        let format = RowFormat::default()
            .quoting(Quoting::Always)
            .delimiter(b'\t')
            .eol("\r\n");
        let line = format_row(cells(&["a \"b\"", "c"]), &format).expect("format row");
        assert_eq!(line, "\"a \"\"b\"\"\"\t\"c\"\r\n");
    }

    #[test]
    fn conflicting_dialect_is_rejected() {
        let format = RowFormat::default().delimiter(b'"');
        let err = format_row(cells(&["a"]), &format).expect_err("dialect must be rejected");
        assert!(matches!(err, FormatError::Dialect(_)));

        let format = RowFormat::default().enclosure(b'\n');
        assert!(format.validate().is_err());

        let format = RowFormat::default().delimiter(0xE9);
        assert!(format.validate().is_err());
    }
}
