//! Row model: column keys, nullable cells, and header re-keying.
//!
//! A [`Row`] keeps its entries in insertion order. Rows loaded without a
//! header are keyed by position (`0..k-1`); once a header is set, new rows are
//! keyed by header name through [`rekey()`].

use std::fmt;

use encoding_rs::UTF_8;
use serde::{Serialize, Serializer, ser::SerializeMap};

/// A nullable cell value.
pub type Cell = Option<String>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Key {
    Index(usize),
    Name(String),
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(index) => write!(f, "{index}"),
            Key::Name(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    entries: Vec<(Key, Cell)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a row keyed `0..k-1` in the given order.
    pub fn positional<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = Cell>,
    {
        Self {
            entries: cells
                .into_iter()
                .enumerate()
                .map(|(idx, cell)| (Key::Index(idx), cell))
                .collect(),
        }
    }

    /// Stores `cell` under `key`. An existing key keeps its position and takes the new value.
    pub fn insert(&mut self, key: Key, cell: Cell) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = cell,
            None => self.entries.push((key, cell)),
        }
    }

    /// Returns `None` when the key is absent, `Some(&None)` for a stored null cell.
    pub fn get(&self, key: &Key) -> Option<&Cell> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, cell)| cell)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &Cell> {
        self.entries.iter().map(|(_, cell)| cell)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Cell)> {
        self.entries.iter().map(|(key, cell)| (key, cell))
    }
}

impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, cell) in &self.entries {
            map.serialize_entry(key, cell)?;
        }
        map.end()
    }
}

/// Widens every byte to the code point of the same value (ISO-8859-1 to UTF-8).
///
/// Input that is already UTF-8 is widened byte by byte as well, so multibyte
/// sequences come out as their Latin-1 reading.
pub fn widen_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| char::from(byte)).collect()
}

/// Shapes one raw record into a stored row.
///
/// Without a header the fields are decoded as UTF-8 and keyed by position.
/// With a header the row has one entry per header name, in header order:
/// present fields are widened from Latin-1, missing ones take `default`, and
/// fields beyond the header length are dropped.
pub fn rekey<F>(header: Option<&[String]>, raw: &[F], default: &Cell) -> Row
where
    F: AsRef<[u8]>,
{
    match header {
        None => Row::positional(raw.iter().map(|field| {
            let (text, _) = UTF_8.decode_without_bom_handling(field.as_ref());
            Some(text.into_owned())
        })),
        Some(names) => {
            let mut row = Row::new();
            for (idx, name) in names.iter().enumerate() {
                let cell = match raw.get(idx) {
                    Some(field) => Some(widen_latin1(field.as_ref())),
                    None => default.clone(),
                };
                row.insert(Key::Name(name.clone()), cell);
            }
            row
        }
    }
}
