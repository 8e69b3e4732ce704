use crate::{
    history::Outcome,
    ledger::AccountId,
};
use chrono::Utc;
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use serde::{
    Deserialize,
    Serialize,
    de::DeserializeOwned,
};
use std::{
    collections::{
        HashMap,
        HashSet,
    },
    fs,
    path::{
        Path,
        PathBuf,
    },
    sync::Mutex,
};
use tracing::warn;

const BALANCES_FILE: &str = "balances.json";
const HISTORY_FILE: &str = "history.json";
const ADMINS_FILE: &str = "admins.json";

/// Everything the process restores at startup.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PersistedState {
    pub balances: HashMap<AccountId, u64>,
    pub history: Vec<Outcome>,
    pub admins: HashSet<AccountId>,
}

/// Durable mapping of balances, history and the admin set to three
/// independently rewritable documents. Loading never fails: a missing
/// or unreadable document falls back to its default and is logged.
/// Save failures are surfaced so callers can log and swallow them;
/// the in-memory state stays authoritative either way.
pub trait SnapshotStore: Send + Sync {
    fn load(&self, bootstrap_admin: AccountId) -> PersistedState;

    fn save_balances(&self, balances: &HashMap<AccountId, u64>) -> Result<()>;

    fn save_history(&self, history: &[Outcome]) -> Result<()>;

    fn save_admins(&self, admins: &HashSet<AccountId>) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct Document<T> {
    saved_at: String,
    value: T,
}

impl<T> Document<T> {
    fn now(value: T) -> Self {
        Self {
            saved_at: Utc::now().to_rfc3339(),
            value,
        }
    }
}

/// JSON-file-backed store. Each save writes a temporary sibling and
/// renames it over the target so an interrupted write cannot corrupt
/// the last good document.
#[derive(Debug)]
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).wrap_err_with(|| {
            format!("Failed to create snapshot directory {}", dir.display())
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load_document<T: DeserializeOwned>(&self, file: &str) -> Option<T> {
        let path = self.dir.join(file);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read snapshot document, using default"
                );
                return None;
            }
        };
        match serde_json::from_slice::<Document<T>>(&data) {
            Ok(document) => Some(document.value),
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to parse snapshot document, using default"
                );
                None
            }
        }
    }

    fn write_document<T: Serialize>(&self, file: &str, value: T) -> Result<()> {
        let path = self.dir.join(file);
        let tmp_path = self.dir.join(format!("{file}.tmp"));
        let json = serde_json::to_vec_pretty(&Document::now(value))
            .wrap_err_with(|| format!("Failed to serialize {file}"))?;
        fs::write(&tmp_path, json)
            .wrap_err_with(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path).wrap_err_with(|| {
            format!("Failed to move {} into place", path.display())
        })?;
        Ok(())
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self, bootstrap_admin: AccountId) -> PersistedState {
        let balances = self
            .load_document::<HashMap<AccountId, u64>>(BALANCES_FILE)
            .unwrap_or_default();
        let history = self
            .load_document::<Vec<Outcome>>(HISTORY_FILE)
            .unwrap_or_default();
        let admins = match self.load_document::<Vec<AccountId>>(ADMINS_FILE) {
            Some(admins) if !admins.is_empty() => admins.into_iter().collect(),
            _ => {
                warn!(
                    bootstrap_admin,
                    "no usable admin document, seeding bootstrap admin"
                );
                HashSet::from([bootstrap_admin])
            }
        };
        PersistedState {
            balances,
            history,
            admins,
        }
    }

    fn save_balances(&self, balances: &HashMap<AccountId, u64>) -> Result<()> {
        self.write_document(BALANCES_FILE, balances)
    }

    fn save_history(&self, history: &[Outcome]) -> Result<()> {
        self.write_document(HISTORY_FILE, history)
    }

    fn save_admins(&self, admins: &HashSet<AccountId>) -> Result<()> {
        // Stable order keeps the document diffable.
        let mut admins: Vec<AccountId> = admins.iter().copied().collect();
        admins.sort_unstable();
        self.write_document(ADMINS_FILE, admins)
    }
}

/// Store used by tests and local experiments; keeps the "documents" in
/// memory so assertions can inspect what would have been written.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    state: Mutex<PersistedState>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn persisted(&self) -> PersistedState {
        self.state.lock().unwrap().clone()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn load(&self, bootstrap_admin: AccountId) -> PersistedState {
        let mut state = self.state.lock().unwrap().clone();
        if state.admins.is_empty() {
            state.admins.insert(bootstrap_admin);
        }
        state
    }

    fn save_balances(&self, balances: &HashMap<AccountId, u64>) -> Result<()> {
        self.state.lock().unwrap().balances = balances.clone();
        Ok(())
    }

    fn save_history(&self, history: &[Outcome]) -> Result<()> {
        self.state.lock().unwrap().history = history.to_vec();
        Ok(())
    }

    fn save_admins(&self, admins: &HashSet<AccountId>) -> Result<()> {
        self.state.lock().unwrap().admins = admins.clone();
        Ok(())
    }
}
