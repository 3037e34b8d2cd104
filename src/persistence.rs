#![warn(clippy::all, clippy::pedantic)]

//! Reward persistence: user records on disk plus a background worker that
//! applies round summaries fire-and-forget.

use crossbeam_channel::{Sender, unbounded};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crate::auth::PlayerIdentity;
use crate::components::RoundSummary;

/// The durable per-player record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub external_id: i64,
    pub display_name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub coins: u64,
    #[serde(default)]
    pub boosts: Vec<String>,
    #[serde(default)]
    pub collected_minerals: BTreeMap<String, u32>,
}

/// The persistence boundary the game core talks to. Every call may fail;
/// failures never roll back an in-memory round summary.
pub trait RewardStore: Send {
    fn find_or_create_user(&mut self, identity: &PlayerIdentity) -> Result<UserRecord, StoreError>;
    fn increment_coins(&mut self, external_id: i64, amount: u32) -> Result<u64, StoreError>;
    fn record_collected_mineral(
        &mut self,
        external_id: i64,
        symbol: &str,
        count: u32,
    ) -> Result<(), StoreError>;
}

/// JSON-file-backed store with an explicit handle: opened once at startup,
/// saved after every mutation, no module-level connection state.
pub struct FileRewardStore {
    path: PathBuf,
    users: BTreeMap<i64, UserRecord>,
}

impl FileRewardStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let users = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, users })
    }

    #[must_use]
    pub fn default_path() -> PathBuf {
        if let Some(data_dir) = dirs::data_dir() {
            data_dir.join("mineralfall").join("users.json")
        } else {
            PathBuf::from("mineralfall_users.json")
        }
    }

    #[must_use]
    pub fn user(&self, external_id: i64) -> Option<&UserRecord> {
        self.users.get(&external_id)
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(&self.users)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl RewardStore for FileRewardStore {
    fn find_or_create_user(&mut self, identity: &PlayerIdentity) -> Result<UserRecord, StoreError> {
        if let Some(existing) = self.users.get_mut(&identity.external_id) {
            // Refresh display fields on every launch
            existing.display_name = identity.display_name.clone();
            existing.username = identity.username.clone();
            let record = existing.clone();
            self.save()?;
            return Ok(record);
        }
        let record = UserRecord {
            external_id: identity.external_id,
            display_name: identity.display_name.clone(),
            username: identity.username.clone(),
            coins: 0,
            boosts: Vec::new(),
            collected_minerals: BTreeMap::new(),
        };
        self.users.insert(identity.external_id, record.clone());
        self.save()?;
        Ok(record)
    }

    fn increment_coins(&mut self, external_id: i64, amount: u32) -> Result<u64, StoreError> {
        let record = self
            .users
            .get_mut(&external_id)
            .ok_or(StoreError::UnknownUser(external_id))?;
        record.coins += u64::from(amount);
        let balance = record.coins;
        self.save()?;
        Ok(balance)
    }

    fn record_collected_mineral(
        &mut self,
        external_id: i64,
        symbol: &str,
        count: u32,
    ) -> Result<(), StoreError> {
        let record = self
            .users
            .get_mut(&external_id)
            .ok_or(StoreError::UnknownUser(external_id))?;
        *record.collected_minerals.entry(symbol.to_string()).or_insert(0) += count;
        self.save()?;
        Ok(())
    }
}

/// Applies one round summary to the store and returns the new balance.
pub fn apply_summary(
    store: &mut dyn RewardStore,
    identity: &PlayerIdentity,
    summary: &RoundSummary,
) -> Result<u64, StoreError> {
    store.find_or_create_user(identity)?;
    for (symbol, entry) in &summary.collected {
        store.record_collected_mineral(identity.external_id, symbol, entry.count)?;
    }
    store.increment_coins(identity.external_id, summary.final_score)
}

/// Background thread that drains posted summaries. The game loop never
/// waits on it; a store failure only raises the `save_failed` flag the UI
/// turns into a "could not save this round's rewards" notice.
pub struct RewardWorker {
    sender: Option<Sender<(PlayerIdentity, RoundSummary)>>,
    handle: Option<JoinHandle<()>>,
    save_failed: Arc<AtomicBool>,
}

impl RewardWorker {
    #[must_use]
    pub fn spawn(mut store: Box<dyn RewardStore>) -> Self {
        let (sender, receiver) = unbounded::<(PlayerIdentity, RoundSummary)>();
        let save_failed = Arc::new(AtomicBool::new(false));
        let failed_flag = Arc::clone(&save_failed);

        let handle = thread::spawn(move || {
            for (identity, summary) in receiver {
                match apply_summary(store.as_mut(), &identity, &summary) {
                    Ok(balance) => {
                        info!(
                            "saved {} coins for {}, balance now {balance}",
                            summary.final_score, identity.external_id
                        );
                    }
                    Err(err) => {
                        error!("failed to save round rewards: {err}");
                        failed_flag.store(true, Ordering::Relaxed);
                    }
                }
            }
        });

        Self {
            sender: Some(sender),
            handle: Some(handle),
            save_failed,
        }
    }

    /// Fire-and-forget: queues the summary and returns immediately.
    pub fn post(&self, identity: PlayerIdentity, summary: RoundSummary) {
        if let Some(sender) = &self.sender {
            if sender.send((identity, summary)).is_err() {
                warn!("reward worker is gone, dropping round summary");
            }
        }
    }

    #[must_use]
    pub fn save_failed(&self) -> bool {
        self.save_failed.load(Ordering::Relaxed)
    }

    /// Closes the channel and waits for queued summaries to be applied.
    pub fn shutdown(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("reward worker thread panicked");
            }
        }
    }
}

impl Drop for RewardWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    Serialize(serde_json::Error),
    UnknownUser(i64),
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialize(err)
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "store io error: {err}"),
            StoreError::Serialize(err) => write!(f, "store serialization error: {err}"),
            StoreError::UnknownUser(id) => write!(f, "no user record for {id}"),
        }
    }
}

impl std::error::Error for StoreError {}
