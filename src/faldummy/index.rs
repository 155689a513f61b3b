//! # File Index
//!
//! The host keeps metadata for every file it has seen: dimensions, type-kind,
//! sha1, modification time. The placeholder logic only needs to look records
//! up, keyed by `(storage, identifier)`.
//!
//! Resolving a record into a file object is allowed to probe the driver for
//! existence (the host does this to flag missing files). That probe is how a
//! lookup can re-enter the driver that asked for it, see
//! [`crate::driver::DummyDriver`] for how the recursion is cut short.

use crate::error::{DriverError, Result};
use crate::model::IndexedFileRecord;
use crate::store::FileProbe;
use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Lookup capability over indexed file records.
pub trait FileIndex {
    /// Find the record for an identifier. `Ok(None)` means "never indexed".
    fn find(
        &self,
        storage: u32,
        identifier: &str,
        probe: &dyn FileProbe,
    ) -> Result<Option<IndexedFileRecord>>;
}

type RecordMap = HashMap<(u32, String), IndexedFileRecord>;

fn resolve(
    records: &RecordMap,
    storage: u32,
    identifier: &str,
    probe: &dyn FileProbe,
) -> Option<IndexedFileRecord> {
    let mut record = records.get(&(storage, identifier.to_string()))?.clone();
    record.missing = !probe.probe(identifier);
    Some(record)
}

/// Index loaded from a JSON array of records.
pub struct JsonFileIndex {
    records: RecordMap,
}

impl JsonFileIndex {
    /// Load the index file, or an empty index if the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self {
                records: HashMap::new(),
            });
        }
        let content = fs::read_to_string(path).map_err(DriverError::Io)?;
        let list: Vec<IndexedFileRecord> =
            serde_json::from_str(&content).map_err(DriverError::Serialization)?;
        Ok(Self::from_records(list))
    }

    pub fn from_records(list: Vec<IndexedFileRecord>) -> Self {
        let records = list
            .into_iter()
            .map(|r| ((r.storage, r.identifier.clone()), r))
            .collect();
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FileIndex for JsonFileIndex {
    fn find(
        &self,
        storage: u32,
        identifier: &str,
        probe: &dyn FileProbe,
    ) -> Result<Option<IndexedFileRecord>> {
        Ok(resolve(&self.records, storage, identifier, probe))
    }
}

/// In-memory index for testing.
///
/// Probing on lookup mirrors what the host does and is on by default. A
/// failure can be injected to exercise error paths.
pub struct InMemoryIndex {
    records: RecordMap,
    probe_on_lookup: bool,
    fail_lookups: bool,
    lookups: Cell<usize>,
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            probe_on_lookup: true,
            fail_lookups: false,
            lookups: Cell::new(0),
        }
    }
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, record: IndexedFileRecord) -> Self {
        self.insert(record);
        self
    }

    pub fn without_probing(mut self) -> Self {
        self.probe_on_lookup = false;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    pub fn insert(&mut self, record: IndexedFileRecord) {
        self.records
            .insert((record.storage, record.identifier.clone()), record);
    }

    /// Number of `find` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.get()
    }
}

impl FileIndex for InMemoryIndex {
    fn find(
        &self,
        storage: u32,
        identifier: &str,
        probe: &dyn FileProbe,
    ) -> Result<Option<IndexedFileRecord>> {
        self.lookups.set(self.lookups.get() + 1);
        if self.fail_lookups {
            // The probe still runs so callers see the re-entrant path before the failure.
            probe.probe(identifier);
            return Err(DriverError::Index("index unavailable".to_string()));
        }
        if self.probe_on_lookup {
            Ok(resolve(&self.records, storage, identifier, probe))
        } else {
            Ok(self.records.get(&(storage, identifier.to_string())).cloned())
        }
    }
}
