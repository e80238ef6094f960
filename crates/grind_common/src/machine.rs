//! Mode state machine
//!
//! Owns the single persisted `ConfigRecord` and is the only code allowed to
//! read or write it. Every top-level operation runs its whole
//! load → mutate → persist sequence under one lock, so concurrent callers
//! cannot lose each other's updates.
//!
//! Transitions:
//! - chill → grind: `admin_update` or `client_enable_grind`
//! - grind → chill: `admin_update` with `mode = chill`, or expiry seen on read
//! - grind → grind: `admin_update` only (refreshes `until`, clears the client flag)
//!
//! Expiry is lazy. Nothing runs in the background; an elapsed grind period is
//! reverted the next time the record is read.

use crate::clock::{Clock, SystemClock};
use crate::error::{StateError, PRECONDITION_CHILL_REQUIRED};
use crate::patch::{grind_deadline, ClientGrindRequest, ConfigPatch};
use crate::record::{parse_timestamp, ConfigRecord, Mode};
use crate::store::{ConfigStore, FileStore};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

pub struct ModeStateMachine {
    store: Mutex<Box<dyn ConfigStore>>,
    clock: Arc<dyn Clock>,
    seed_whitelist: Vec<String>,
}

impl ModeStateMachine {
    pub fn new(store: impl ConfigStore + 'static, seed_whitelist: Vec<String>) -> Self {
        Self::with_clock(store, seed_whitelist, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: impl ConfigStore + 'static,
        seed_whitelist: Vec<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store: Mutex::new(Box::new(store)),
            clock,
            seed_whitelist,
        }
    }

    /// File-backed machine using the wall clock
    pub fn open(path: impl Into<PathBuf>, seed_whitelist: Vec<String>) -> Self {
        Self::new(FileStore::new(path), seed_whitelist)
    }

    /// Record used when nothing readable is stored
    pub fn default_record(&self) -> ConfigRecord {
        ConfigRecord::with_whitelist(self.seed_whitelist.clone())
    }

    /// Read the stored record, falling back to the default when it is
    /// missing or unreadable
    pub fn load(&self) -> Result<ConfigRecord, StateError> {
        let store = self.lock();
        self.load_from(&**store)
    }

    /// Overwrite the stored record
    pub fn persist(&self, record: &ConfigRecord) -> Result<(), StateError> {
        let mut store = self.lock();
        persist_to(&mut **store, record)
    }

    /// Current record, reverting an elapsed grind period first
    pub fn read_with_lazy_expiry(&self) -> Result<ConfigRecord, StateError> {
        let mut store = self.lock();
        let record = self.expire(&mut **store, self.clock.now())?;
        debug!("Read config: mode={}", record.mode);
        Ok(record)
    }

    /// Apply an authorized admin patch
    pub fn admin_update(&self, patch: &ConfigPatch) -> Result<ConfigRecord, StateError> {
        let mut store = self.lock();
        let now = self.clock.now();
        let mut record = self.expire(&mut **store, now)?;

        if let Some(whitelist) = &patch.whitelist {
            info!("Admin replaced whitelist ({} domains)", whitelist.len());
            record.whitelist = whitelist.clone();
        }

        match patch.mode {
            Some(Mode::Grind) => {
                let until = grind_deadline(now, patch.grind_hours);
                if record.client_initiated {
                    info!("Admin override of client-initiated grind");
                }
                record.enter_grind(until, false);
                info!("Admin set grind mode until {}", describe_until(until));
            }
            Some(Mode::Chill) => {
                record.enter_chill();
                info!("Admin set chill mode");
            }
            None => {}
        }

        persist_to(&mut **store, &record)?;
        Ok(record)
    }

    /// Let an unauthenticated client start a grind period.
    ///
    /// Only allowed from chill mode, so a client can never end, shorten or
    /// extend a running period. An elapsed period is expired first and does
    /// not block the request.
    pub fn client_enable_grind(
        &self,
        request: &ClientGrindRequest,
    ) -> Result<ConfigRecord, StateError> {
        let mut store = self.lock();
        let now = self.clock.now();
        let mut record = self.expire(&mut **store, now)?;

        if record.mode != Mode::Chill {
            warn!("Client grind rejected: already in {} mode", record.mode);
            return Err(StateError::precondition(PRECONDITION_CHILL_REQUIRED));
        }

        let until = grind_deadline(now, request.grind_hours);
        record.enter_grind(until, true);
        info!("Client started grind mode until {}", describe_until(until));

        persist_to(&mut **store, &record)?;
        Ok(record)
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn ConfigStore>> {
        // The guarded store keeps no half-applied state, so a poisoned lock is safe to reuse
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load_from(&self, store: &dyn ConfigStore) -> Result<ConfigRecord, StateError> {
        let bytes = match store.read() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(self.default_record()),
            Err(e) => {
                error!("Failed to read config from {}: {}", store.describe(), e);
                return Err(e.into());
            }
        };

        match ConfigRecord::from_slice(&bytes) {
            Ok(record) => Ok(record),
            Err(e) => {
                warn!(
                    "Config at {} is unreadable ({}), resetting to default",
                    store.describe(),
                    e
                );
                Ok(self.default_record())
            }
        }
    }

    /// Load and apply the lazy-expiry rules, persisting any repair
    fn expire(
        &self,
        store: &mut dyn ConfigStore,
        now: DateTime<Utc>,
    ) -> Result<ConfigRecord, StateError> {
        let mut record = self.load_from(store)?;

        if record.mode != Mode::Grind {
            return Ok(record);
        }
        let Some(raw) = record.until.as_deref() else {
            return Ok(record);
        };

        match parse_timestamp(raw) {
            None => {
                warn!("Invalid grind deadline {:?}, clearing it", raw);
                record.until = None;
                persist_to(store, &record)?;
            }
            Some(until) if now >= until => {
                info!("Grind period ended at {}, back to chill", raw);
                record.enter_chill();
                persist_to(store, &record)?;
            }
            Some(_) => {}
        }

        Ok(record)
    }
}

fn persist_to(store: &mut dyn ConfigStore, record: &ConfigRecord) -> Result<(), StateError> {
    let bytes = record.to_vec()?;
    store.write(&bytes).map_err(|e| {
        error!("Failed to persist config to {}: {}", store.describe(), e);
        StateError::from(e)
    })
}

fn describe_until(until: Option<DateTime<Utc>>) -> String {
    until
        .map(|u| u.to_rfc3339())
        .unwrap_or_else(|| "indefinite".to_string())
}
