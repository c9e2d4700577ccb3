//! Dataset load and the cyclic cursor.
//!
//! The dataset is an ordered, immutable sequence of triples parsed
//! once at startup. [`DatasetCursor`] owns the only mutable piece of
//! state: a read position that advances by exactly the number of
//! triples consumed per fetch, wrapping modulo the dataset length.
//! Fetches serialize on the position lock, so every triple belongs to
//! exactly one fetch in program order even under concurrent dispatch.

use num_bigint::BigUint;
use parking_lot::Mutex;
use std::path::Path;
use triplecast_core::error::{Error, Result};
use triplecast_core::types::{Triple, VALUE_WIDTH};

/// Parses one base-10 field, enforcing the 256-bit wire bound up
/// front: a stored value that could never be encoded is a data error
/// at load time, not at dispatch time.
fn parse_value(line: usize, field: &str) -> Result<BigUint> {
    let value: BigUint = field.parse().map_err(|_| Error::MalformedRow {
        line,
        value: field.to_string(),
    })?;

    if value.bits() > (VALUE_WIDTH as u64) * 8 {
        return Err(Error::EncodingOverflow { bits: value.bits() });
    }

    Ok(value)
}

/// An ordered, non-empty, immutable sequence of triples.
#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Vec<Triple>,
}

impl Dataset {
    /// Parses already-split rows of `(scalar, x, y)` base-10 fields.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedRow`] on a non-numeric field (line numbers are
    /// 1-based row ordinals), [`Error::EmptyDataset`] when no rows were
    /// supplied, and [`Error::EncodingOverflow`] for a value wider than
    /// 256 bits.
    pub fn from_rows<'a, I>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    {
        let mut parsed = Vec::new();
        for (idx, (scalar, x, y)) in rows.into_iter().enumerate() {
            let line = idx + 1;
            parsed.push(Triple::new(
                parse_value(line, scalar)?,
                parse_value(line, x)?,
                parse_value(line, y)?,
            ));
        }

        if parsed.is_empty() {
            return Err(Error::EmptyDataset);
        }

        Ok(Self { rows: parsed })
    }

    /// Reads a CSV file of `scalar,x,y` rows. Fields are trimmed and
    /// blank lines skipped; anything other than exactly three fields
    /// per line is a malformed row. Errors report the 1-based line in
    /// the file, blank lines included.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;

        let mut rows = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }

            let mut fields = trimmed.split(',').map(str::trim);
            match (fields.next(), fields.next(), fields.next(), fields.next()) {
                (Some(scalar), Some(x), Some(y), None) => {
                    rows.push(Triple::new(
                        parse_value(line, scalar)?,
                        parse_value(line, x)?,
                        parse_value(line, y)?,
                    ));
                }
                _ => {
                    return Err(Error::MalformedRow {
                        line,
                        value: trimmed.to_string(),
                    });
                }
            }
        }

        if rows.is_empty() {
            return Err(Error::EmptyDataset);
        }

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Triple> {
        self.rows.get(index)
    }
}

/// The cyclic read pointer into a fixed [`Dataset`].
///
/// The position is read-modify-written under one mutex acquisition per
/// fetch; it is always a valid index and advancing never leaves the
/// dataset.
#[derive(Debug)]
pub struct DatasetCursor {
    dataset: Dataset,
    position: Mutex<usize>,
}

impl DatasetCursor {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            position: Mutex::new(0),
        }
    }

    /// Reads `count` triples starting at the current position,
    /// advancing (and wrapping) by one per triple. `count` may be zero
    /// or exceed the dataset length; triples repeat on wrap-around.
    ///
    /// The cursor advances regardless of what the caller does with the
    /// result: consumption is exactly-once per fetch even when the
    /// subsequent delivery is dropped.
    pub fn fetch(&self, count: usize) -> Vec<Triple> {
        let mut out = Vec::with_capacity(count);
        let mut position = self.position.lock();
        for _ in 0..count {
            out.push(self.dataset.rows[*position].clone());
            *position = (*position + 1) % self.dataset.len();
        }
        out
    }

    /// Current read position, in `[0, dataset.len())`.
    pub fn position(&self) -> usize {
        *self.position.lock()
    }
}
