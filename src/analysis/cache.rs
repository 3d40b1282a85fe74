//! Memo table for normalized batches.
//!
//! Normalization is the only step with a real cost, so its output is kept
//! per source fingerprint. Entries never go stale on their own: a changed
//! source has a different fingerprint. Tests and callers that need a fresh
//! run call [`MemoTable::invalidate`] or [`MemoTable::clear`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};

use super::normalize::{NormalizeReport, Normalizer};
use crate::data::loader::RawSource;
use crate::data::model::{ExpeditionBatch, RawRow, RawValue};

// ---------------------------------------------------------------------------
// SourceKey – identity of unprocessed content
// ---------------------------------------------------------------------------

/// SHA-256 of the raw source, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey(String);

impl SourceKey {
    /// Fingerprint of a file's bytes.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self::from_digest(Sha256::digest(bytes).as_slice())
    }

    /// Fingerprint of an in-memory row batch. Every cell is fed with a type
    /// tag so `"1"` and `1` hash differently.
    pub fn of_rows(rows: &[RawRow]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((rows.len() as u64).to_le_bytes());
        for row in rows {
            hasher.update((row.len() as u64).to_le_bytes());
            for (column, value) in row {
                hasher.update((column.len() as u64).to_le_bytes());
                hasher.update(column.as_bytes());
                match value {
                    RawValue::String(s) => {
                        hasher.update([b's']);
                        hasher.update((s.len() as u64).to_le_bytes());
                        hasher.update(s.as_bytes());
                    }
                    RawValue::Integer(i) => {
                        hasher.update([b'i']);
                        hasher.update(i.to_le_bytes());
                    }
                    RawValue::Float(f) => {
                        hasher.update([b'f']);
                        hasher.update(f.to_bits().to_le_bytes());
                    }
                    RawValue::Bool(b) => hasher.update([b'b', u8::from(*b)]),
                    RawValue::Null => hasher.update([b'n']),
                }
            }
        }
        Self::from_digest(hasher.finalize().as_slice())
    }

    fn from_digest(digest: &[u8]) -> Self {
        SourceKey(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough for log lines.
        f.write_str(&self.0[..12.min(self.0.len())])
    }
}

// ---------------------------------------------------------------------------
// MemoTable
// ---------------------------------------------------------------------------

/// A normalized batch is a function of the source and the year cut-off.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoKey {
    pub source: SourceKey,
    pub min_year: i32,
}

#[derive(Debug, Clone)]
pub struct MemoEntry {
    pub batch: Arc<ExpeditionBatch>,
    pub report: NormalizeReport,
}

#[derive(Debug, Default)]
pub struct MemoTable {
    entries: HashMap<MemoKey, MemoEntry>,
    hits: u64,
    misses: u64,
}

impl MemoTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the memoized batch for `source`, normalizing on a miss.
    pub fn normalized(&mut self, source: &RawSource, normalizer: &Normalizer) -> MemoEntry {
        let key = MemoKey {
            source: source.key.clone(),
            min_year: normalizer.min_year,
        };
        if let Some(entry) = self.entries.get(&key) {
            self.hits += 1;
            log::debug!("Normalized batch cache hit for {}", key.source);
            return entry.clone();
        }

        self.misses += 1;
        log::debug!("Normalized batch cache miss for {}", key.source);
        let (batch, report) = normalizer.normalize(&source.rows);
        let entry = MemoEntry {
            batch: Arc::new(batch),
            report,
        };
        self.entries.insert(key, entry.clone());
        entry
    }

    /// Drop every entry derived from `source`. Returns whether any existed.
    pub fn invalidate(&mut self, source: &SourceKey) -> bool {
        let before = self.entries.len();
        self.entries.retain(|key, _| &key.source != source);
        before != self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses) since the table was created.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

static SHARED: Lazy<Mutex<MemoTable>> = Lazy::new(|| Mutex::new(MemoTable::new()));

/// The process-wide table.
pub fn shared() -> &'static Mutex<MemoTable> {
    &SHARED
}

/// Normalize through the process-wide table.
pub fn normalized(source: &RawSource, normalizer: &Normalizer) -> MemoEntry {
    shared()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .normalized(source, normalizer)
}
