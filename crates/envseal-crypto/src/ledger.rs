//! Append-only digest ledger.
//!
//! Records `id,digestBase64` lines so that anyone can later re-check a
//! payload against the digest recorded when its envelope was built, without
//! holding any private key.
//!
//! Writers take an exclusive advisory lock for the duration of a single
//! `write_all` of a whole line; readers take a shared lock while scanning.
//! A reader therefore never observes a torn line, and concurrent builder
//! processes never interleave bytes. Existing lines are never rewritten.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::CryptoError;

/// One `id,digest` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: String,
    /// Unencrypted base64 SHA-1 of the canonical content.
    pub digest: String,
}

impl LedgerEntry {
    pub fn new(id: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            digest: digest.into(),
        }
    }

    fn validate(&self) -> Result<(), CryptoError> {
        let bad = |s: &str| s.is_empty() || s.chars().any(|c| c == ',' || c.is_whitespace());
        if bad(&self.id) {
            return Err(CryptoError::InvalidLedgerEntry(format!(
                "id {:?} must be non-empty without commas or whitespace",
                self.id
            )));
        }
        if bad(&self.digest) {
            return Err(CryptoError::InvalidLedgerEntry(format!(
                "digest {:?} must be non-empty without commas or whitespace",
                self.digest
            )));
        }
        Ok(())
    }

    fn parse_line(line: &str) -> Option<Self> {
        let (id, rest) = line.trim().split_once(',')?;
        let digest = rest.split(',').next().unwrap_or_default().trim();
        Some(Self::new(id.trim(), digest))
    }
}

/// Line-oriented ledger file.
#[derive(Debug, Clone)]
pub struct DigestLedger {
    path: PathBuf,
}

impl DigestLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn store_error(&self, source: std::io::Error) -> CryptoError {
        CryptoError::Store {
            path: self.path.clone(),
            source,
        }
    }

    /// Append one entry, creating the ledger file if needed.
    pub fn append(&self, entry: &LedgerEntry) -> Result<(), CryptoError> {
        entry.validate()?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| self.store_error(e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.store_error(e))?;

        file.lock().map_err(|e| self.store_error(e))?;
        let written = write_line(&mut file, &format!("{},{}\n", entry.id, entry.digest));
        let unlocked = file.unlock();
        written.map_err(|e| self.store_error(e))?;
        unlocked.map_err(|e| self.store_error(e))?;

        debug!(id = %entry.id, path = %self.path.display(), "Appended ledger entry");
        Ok(())
    }

    /// Digest recorded for `id`, scanning from the start; first match wins.
    ///
    /// A ledger that does not exist yet has no entries.
    pub fn lookup(&self, id: &str) -> Result<Option<String>, CryptoError> {
        let id = id.trim();
        let mut found = None;
        self.scan(|entry| {
            if entry.id == id {
                found = Some(entry.digest);
                false
            } else {
                true
            }
        })?;
        Ok(found)
    }

    /// All well-formed entries in file order.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>, CryptoError> {
        let mut entries = Vec::new();
        self.scan(|entry| {
            entries.push(entry);
            true
        })?;
        Ok(entries)
    }

    /// Feed entries to `visit` until it returns `false`.
    fn scan(&self, mut visit: impl FnMut(LedgerEntry) -> bool) -> Result<(), CryptoError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(self.store_error(e)),
        };
        // The shared lock is released when `file` drops.
        file.lock_shared().map_err(|e| self.store_error(e))?;

        for (index, raw) in BufReader::new(&file).split(b'\n').enumerate() {
            let raw = raw.map_err(|e| self.store_error(e))?;
            let Ok(line) = std::str::from_utf8(&raw) else {
                warn!(line = index + 1, path = %self.path.display(), "Skipping non-UTF-8 ledger line");
                continue;
            };
            if line.trim().is_empty() {
                continue;
            }
            let Some(entry) = LedgerEntry::parse_line(line) else {
                warn!(line = index + 1, path = %self.path.display(), "Skipping malformed ledger line");
                continue;
            };
            if !visit(entry) {
                break;
            }
        }
        Ok(())
    }
}

/// Write `line`, first terminating a previous line that lacks a newline.
fn write_line(file: &mut File, line: &str) -> std::io::Result<()> {
    let mut buf = String::with_capacity(line.len() + 1);
    if file.metadata()?.len() > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))?;
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            buf.push('\n');
        }
    }
    buf.push_str(line);
    file.write_all(buf.as_bytes())?;
    file.sync_data()
}
