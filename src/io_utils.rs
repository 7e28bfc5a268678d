//! I/O helpers: bounded line reading, CSV field splitting, and output sinks.
//!
//! Input is always read as comma-delimited UTF-8 text. [`LineReader`] splits
//! the raw byte stream into lines under an explicit [`LineEndings`] policy and
//! caps every line at a byte budget; [`split_line()`] then applies standard
//! CSV field rules to that single line. On the output side an encoding can be
//! chosen, with transcoding handled by `encoding_rs`.

use std::{
    fs::File,
    io::{self, BufRead, BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEndings {
    /// `\n`, `\r\n` and a lone `\r` all end a line.
    #[default]
    Auto,
    /// Only `\n` ends a line; a trailing `\r` is dropped.
    Lf,
}

/// Reads raw lines from `inner`, keeping at most `max_line_bytes` of each.
///
/// Bytes past the budget are consumed and discarded, so the next call starts
/// at the following line.
pub struct LineReader<R> {
    inner: R,
    max_line_bytes: usize,
    line_endings: LineEndings,
    skip_lf: bool,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R, max_line_bytes: usize, line_endings: LineEndings) -> Self {
        Self {
            inner,
            max_line_bytes,
            line_endings,
            skip_lf: false,
        }
    }

    /// Fills `line` with the next line (terminator excluded). Returns `false` at end of input.
    pub fn read_line(&mut self, line: &mut Vec<u8>) -> io::Result<bool> {
        line.clear();
        let mut saw_bytes = false;
        loop {
            let available = match self.inner.fill_buf() {
                Ok(bytes) => bytes,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            if available.is_empty() {
                return Ok(saw_bytes);
            }
            if self.skip_lf {
                self.skip_lf = false;
                if available[0] == b'\n' {
                    self.inner.consume(1);
                    continue;
                }
            }

            let terminator = match self.line_endings {
                LineEndings::Auto => available.iter().position(|&b| b == b'\n' || b == b'\r'),
                LineEndings::Lf => available.iter().position(|&b| b == b'\n'),
            };
            match terminator {
                Some(pos) => {
                    push_bounded(line, &available[..pos], self.max_line_bytes);
                    let ended_with_cr = available[pos] == b'\r';
                    self.inner.consume(pos + 1);
                    self.skip_lf = ended_with_cr;
                    if self.line_endings == LineEndings::Lf && line.last() == Some(&b'\r') {
                        line.pop();
                    }
                    return Ok(true);
                }
                None => {
                    let len = available.len();
                    push_bounded(line, available, self.max_line_bytes);
                    self.inner.consume(len);
                    saw_bytes = true;
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = Vec::new();
        match self.read_line(&mut line) {
            Ok(true) => Some(Ok(line)),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

fn push_bounded(line: &mut Vec<u8>, bytes: &[u8], max_line_bytes: usize) {
    let room = max_line_bytes.saturating_sub(line.len());
    line.extend_from_slice(&bytes[..bytes.len().min(room)]);
}

pub fn open_csv_reader<R>(reader: R) -> csv::Reader<R>
where
    R: io::Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(DEFAULT_CSV_DELIMITER)
        .double_quote(true)
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'));
    builder.from_reader(reader)
}

/// Splits a single line into CSV fields. A blank line yields `None`.
pub fn split_line(line: &[u8]) -> Result<Option<csv::ByteRecord>> {
    let mut reader = open_csv_reader(line);
    let mut record = csv::ByteRecord::new();
    if reader
        .read_byte_record(&mut record)
        .context("Splitting CSV line into fields")?
    {
        Ok(Some(record))
    } else {
        Ok(None)
    }
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'")),
        None => Ok(UTF_8),
    }
}

/// Opens a file (or stdout for `-`/`None`) for CSV output in `encoding`.
pub fn open_output(path: Option<&Path>, encoding: &'static Encoding) -> Result<Box<dyn Write>> {
    let base: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(io::stdout()),
    };
    if encoding == UTF_8 {
        Ok(base)
    } else {
        Ok(Box::new(TranscodingWriter::new(base, encoding)))
    }
}

/// Re-encodes UTF-8 output into another encoding, holding back incomplete sequences.
struct TranscodingWriter<W: Write> {
    inner: W,
    encoding: &'static Encoding,
    pending: Vec<u8>,
}

impl<W: Write> TranscodingWriter<W> {
    fn new(inner: W, encoding: &'static Encoding) -> Self {
        Self {
            inner,
            encoding,
            pending: Vec::new(),
        }
    }

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        let (encoded, _, had_errors) = self.encoding.encode(text);
        if had_errors {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Text cannot be represented in {}", self.encoding.name()),
            ));
        }
        self.inner.write_all(&encoded)
    }

    fn drain_complete(&mut self) -> io::Result<()> {
        let valid_up_to = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(err) => return Err(io::Error::new(io::ErrorKind::InvalidData, err)),
        };
        if valid_up_to == 0 {
            return Ok(());
        }
        let complete: Vec<u8> = self.pending.drain(..valid_up_to).collect();
        let text = String::from_utf8(complete)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        self.write_text(&text)
    }
}

impl<W: Write> Write for TranscodingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        self.drain_complete()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.drain_complete()?;
        if !self.pending.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Incomplete UTF-8 sequence at end of output stream",
            ));
        }
        self.inner.flush()
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => parse_ascii_char(other, "Delimiter"),
    }
}

pub fn parse_enclosure(value: &str) -> Result<u8, String> {
    match value {
        "double" => Ok(b'"'),
        "single" => Ok(b'\''),
        other => parse_ascii_char(other, "Enclosure"),
    }
}

fn parse_ascii_char(value: &str, role: &str) -> Result<u8, String> {
    let mut chars = value.chars();
    let first = chars
        .next()
        .ok_or_else(|| format!("{role} cannot be empty"))?;
    if chars.next().is_some() {
        return Err(format!("{role} must be a single character"));
    }
    if !first.is_ascii() {
        return Err(format!("{role} must be ASCII"));
    }
    Ok(first as u8)
}

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
