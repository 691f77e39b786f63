//! File-backed ledger: verified and pending CSV stores plus the blacklist.
//!
//! Verified rows and blacklist lines are append-only. The pending store is
//! the one exception: each verification run replaces it wholesale through a
//! temp file in the same directory, so a crash mid-write leaves the previous
//! contents intact.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use byline_common::{name_key, Edition, JournalistRecord, BLACKLIST_FILE};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger I/O failed on {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("ledger CSV error in {}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },
}

impl LedgerError {
    fn io(path: &Path, source: io::Error) -> Self {
        LedgerError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv(path: &Path, source: csv::Error) -> Self {
        LedgerError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Verified,
    Pending,
}

/// In-memory view used for dedup during one monitor run.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    pub known_names: HashSet<String>,
    pub blacklist: HashSet<String>,
}

impl LedgerSnapshot {
    pub fn is_known(&self, key: &str) -> bool {
        self.known_names.contains(key)
    }

    pub fn mark_known(&mut self, key: String) {
        self.known_names.insert(key);
    }

    pub fn is_blacklisted(&self, email: &str) -> bool {
        self.blacklist.contains(&email.trim().to_lowercase())
    }
}

/// A pending-store row as read back. Rows without an email cannot be
/// verified but are written back unchanged on every rewrite.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingRow {
    Record(JournalistRecord),
    Passthrough(Vec<String>),
}

impl PendingRow {
    fn to_row(&self) -> Vec<String> {
        match self {
            PendingRow::Record(record) => record.to_row(),
            PendingRow::Passthrough(fields) => fields.clone(),
        }
    }
}

impl From<JournalistRecord> for PendingRow {
    fn from(record: JournalistRecord) -> Self {
        PendingRow::Record(record)
    }
}

pub struct Ledger {
    verified_path: PathBuf,
    pending_path: PathBuf,
    blacklist_path: PathBuf,
}

impl Ledger {
    /// Edition ledger under `data_dir`. The blacklist is shared by editions.
    pub fn new(data_dir: &Path, edition: Edition) -> Self {
        Self::with_paths(
            data_dir.join(edition.verified_file()),
            data_dir.join(edition.pending_file()),
            data_dir.join(BLACKLIST_FILE),
        )
    }

    pub fn with_paths(verified: PathBuf, pending: PathBuf, blacklist: PathBuf) -> Self {
        Self {
            verified_path: verified,
            pending_path: pending,
            blacklist_path: blacklist,
        }
    }

    pub fn path(&self, destination: Destination) -> &Path {
        match destination {
            Destination::Verified => &self.verified_path,
            Destination::Pending => &self.pending_path,
        }
    }

    pub fn blacklist_path(&self) -> &Path {
        &self.blacklist_path
    }

    /// Known names and blacklist, loaded together at the start of a run.
    pub fn snapshot(&self) -> Result<LedgerSnapshot> {
        let snapshot = LedgerSnapshot {
            known_names: self.load_known_names()?,
            blacklist: self.load_blacklist()?,
        };
        info!(
            known = snapshot.known_names.len(),
            blacklisted = snapshot.blacklist.len(),
            "Ledger loaded"
        );
        Ok(snapshot)
    }

    /// Name keys from every verified and pending row.
    pub fn load_known_names(&self) -> Result<HashSet<String>> {
        let mut names = HashSet::new();
        for path in [&self.verified_path, &self.pending_path] {
            for row in read_rows(path)? {
                if row.len() < 2 {
                    continue;
                }
                let key = name_key(&format!("{} {}", &row[0], &row[1]));
                if !key.is_empty() {
                    names.insert(key);
                }
            }
        }
        Ok(names)
    }

    pub fn load_blacklist(&self) -> Result<HashSet<String>> {
        let contents = match fs::read_to_string(&self.blacklist_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(LedgerError::io(&self.blacklist_path, e)),
        };
        Ok(contents
            .lines()
            .map(|line| line.trim().to_lowercase())
            .filter(|line| !line.is_empty())
            .collect())
    }

    pub fn load_pending(&self) -> Result<Vec<JournalistRecord>> {
        self.load_records(&self.pending_path)
    }

    /// Every pending row in file order, readable or not.
    pub fn load_pending_rows(&self) -> Result<Vec<PendingRow>> {
        Ok(read_rows(&self.pending_path)?
            .iter()
            .map(|row| match JournalistRecord::from_row(row.iter()) {
                Some(record) => PendingRow::Record(record),
                None => PendingRow::Passthrough(row.iter().map(String::from).collect()),
            })
            .collect())
    }

    pub fn load_verified(&self) -> Result<Vec<JournalistRecord>> {
        self.load_records(&self.verified_path)
    }

    fn load_records(&self, path: &Path) -> Result<Vec<JournalistRecord>> {
        let mut records = Vec::new();
        for (i, row) in read_rows(path)?.iter().enumerate() {
            match JournalistRecord::from_row(row.iter()) {
                Some(record) => records.push(record),
                None => warn!(path = %path.display(), row = i + 2, "Skipping row without email"),
            }
        }
        Ok(records)
    }

    /// Append a batch to `destination`, writing the header only into an
    /// empty or absent file.
    pub fn append(&self, records: &[JournalistRecord], destination: Destination) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let path = self.path(destination);
        ensure_parent(path)?;

        let needs_header = match fs::metadata(path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => return Err(LedgerError::io(path, e)),
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| LedgerError::io(path, e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer
                .write_record(JournalistRecord::COLUMNS)
                .map_err(|e| LedgerError::csv(path, e))?;
        }
        for record in records {
            writer
                .write_record(record.to_row())
                .map_err(|e| LedgerError::csv(path, e))?;
        }
        writer.flush().map_err(|e| LedgerError::io(path, e))?;

        info!(path = %path.display(), count = records.len(), ?destination, "Appended records");
        Ok(())
    }

    pub fn append_blacklist(&self, email: &str) -> Result<()> {
        let path = &self.blacklist_path;
        ensure_parent(path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| LedgerError::io(path, e))?;
        writeln!(file, "{}", email.trim().to_lowercase()).map_err(|e| LedgerError::io(path, e))?;
        debug!(email, "Blacklisted");
        Ok(())
    }

    /// Atomically replace the pending store. The header is always written.
    pub fn replace_pending(&self, rows: &[PendingRow]) -> Result<()> {
        let path = &self.pending_path;
        ensure_parent(path)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| LedgerError::io(&dir, e))?;
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_writer(&mut tmp);
            writer
                .write_record(JournalistRecord::COLUMNS)
                .map_err(|e| LedgerError::csv(path, e))?;
            for row in rows {
                writer
                    .write_record(row.to_row())
                    .map_err(|e| LedgerError::csv(path, e))?;
            }
            writer.flush().map_err(|e| LedgerError::io(path, e))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| LedgerError::io(path, e))?;
        tmp.persist(path)
            .map_err(|e| LedgerError::io(path, e.error))?;

        info!(path = %path.display(), count = rows.len(), "Pending store rewritten");
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| LedgerError::io(parent, e))
        }
        _ => Ok(()),
    }
}

/// Data rows of a headered CSV file; an absent file has none.
fn read_rows(path: &Path) -> Result<Vec<csv::StringRecord>> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(LedgerError::io(path, e)),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);
    reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| LedgerError::csv(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(first: &str, last: &str, email: &str) -> JournalistRecord {
        JournalistRecord {
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            country: "Canada".into(),
            ..Default::default()
        }
    }

    #[test]
    fn missing_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path(), Edition::Canada);

        assert!(ledger.load_known_names().unwrap().is_empty());
        assert!(ledger.load_blacklist().unwrap().is_empty());
        assert!(ledger.load_pending().unwrap().is_empty());
    }

    #[test]
    fn header_is_written_once_across_appends() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path(), Edition::Canada);

        ledger
            .append(&[record("Jane", "Doe", "j.doe@x.com")], Destination::Pending)
            .unwrap();
        ledger
            .append(&[record("John", "Smith", "j.smith@x.com")], Destination::Pending)
            .unwrap();

        let contents = fs::read_to_string(ledger.path(Destination::Pending)).unwrap();
        assert_eq!(contents.matches("First_Name").count(), 1);
        assert!(contents.starts_with(
            "First_Name,Last_Name,Email,City,State,Country,phone,publications,title,topics,twitter,source_url\n"
        ));
        assert_eq!(ledger.load_pending().unwrap().len(), 2);
    }

    #[test]
    fn empty_batch_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path(), Edition::Canada);
        ledger.append(&[], Destination::Verified).unwrap();
        assert!(!ledger.path(Destination::Verified).exists());
    }

    #[test]
    fn known_names_union_both_stores_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path(), Edition::Canada);
        ledger
            .append(&[record("Jane", "DOE", "jane@x.com")], Destination::Verified)
            .unwrap();
        ledger
            .append(&[record("John", "Smith", "j.smith@x.com")], Destination::Pending)
            .unwrap();

        let known = ledger.load_known_names().unwrap();
        assert!(known.contains("jane doe"));
        assert!(known.contains("john smith"));
        assert_eq!(known.len(), 2);
    }

    #[test]
    fn blacklist_is_lowercased() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path(), Edition::Canada);
        ledger.append_blacklist("X@Y.com").unwrap();
        ledger.append_blacklist("z@y.com").unwrap();

        let contents = fs::read_to_string(ledger.blacklist_path()).unwrap();
        assert_eq!(contents, "x@y.com\nz@y.com\n");
        let snapshot = ledger.snapshot().unwrap();
        assert!(snapshot.is_blacklisted("x@Y.COM"));
    }

    #[test]
    fn editions_share_the_blacklist_but_not_the_stores() {
        let dir = tempfile::tempdir().unwrap();
        let ca = Ledger::new(dir.path(), Edition::Canada);
        let uk = Ledger::new(dir.path(), Edition::UnitedKingdom);

        ca.append_blacklist("x@y.com").unwrap();
        ca.append(&[record("Jane", "Doe", "j.doe@x.com")], Destination::Pending)
            .unwrap();

        assert!(uk.load_blacklist().unwrap().contains("x@y.com"));
        assert!(uk.load_pending().unwrap().is_empty());
    }

    #[test]
    fn lenient_reads_pad_short_rows_and_skip_rows_without_email() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path(), Edition::Canada);
        fs::write(
            ledger.path(Destination::Pending),
            "First_Name,Last_Name,Email\nJane,Doe,j.doe@x.com\nNo,Email\n",
        )
        .unwrap();

        let pending = ledger.load_pending().unwrap();
        assert_eq!(pending, vec![JournalistRecord {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "j.doe@x.com".into(),
            ..Default::default()
        }]);
        // The email-less row still names a known person.
        assert!(ledger.load_known_names().unwrap().contains("no email"));
    }

    #[test]
    fn replace_pending_overwrites_and_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path(), Edition::Canada);
        ledger
            .append(
                &[
                    record("Jane", "Doe", "j.doe@x.com"),
                    record("John", "Smith", "j.smith@x.com"),
                ],
                Destination::Pending,
            )
            .unwrap();

        ledger
            .replace_pending(&[record("John", "Smith", "j.smith@x.com").into()])
            .unwrap();
        let pending = ledger.load_pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].email, "j.smith@x.com");

        ledger.replace_pending(&[]).unwrap();
        let contents = fs::read_to_string(ledger.path(Destination::Pending)).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(ledger.load_pending().unwrap().is_empty());

        // No temp files left behind.
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn appending_after_replace_does_not_duplicate_header() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path(), Edition::Canada);
        ledger.replace_pending(&[]).unwrap();
        ledger
            .append(&[record("Jane", "Doe", "j.doe@x.com")], Destination::Pending)
            .unwrap();

        let contents = fs::read_to_string(ledger.path(Destination::Pending)).unwrap();
        assert_eq!(contents.matches("First_Name").count(), 1);
        assert_eq!(ledger.load_pending().unwrap().len(), 1);
    }

    #[test]
    fn rows_without_email_survive_a_pending_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::new(dir.path(), Edition::Canada);
        fs::write(
            ledger.path(Destination::Pending),
            "First_Name,Last_Name,Email\nJane,Doe,j.doe@x.com\nNo,Email\n",
        )
        .unwrap();

        let rows = ledger.load_pending_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], PendingRow::Passthrough(vec!["No".into(), "Email".into()]));

        ledger.replace_pending(&rows).unwrap();
        assert_eq!(ledger.load_pending_rows().unwrap(), rows);
        assert!(ledger.load_known_names().unwrap().contains("no email"));
    }
}
