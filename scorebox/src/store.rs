//! Persistence for live match state and finished summaries.
//!
//! The engine only sees the [`MatchStore`] trait. [`MemoryStore`] keeps
//! everything in maps and [`FileStore`] writes one JSON document per match
//! under a data directory.

use cricket_common::{match_state::MatchId, match_state::MatchState, summary::MatchSummary};
use log::*;
use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::BTreeMap,
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;

const MATCHES_DIR: &str = "matches";
const SUMMARIES_DIR: &str = "summaries";

pub trait MatchStore {
    fn load_match(&self, id: &MatchId) -> Result<Option<MatchState>>;
    fn save_match(&mut self, state: &MatchState) -> Result<()>;
    fn load_summary(&self, id: &MatchId) -> Result<Option<MatchSummary>>;
    fn save_summary(&mut self, summary: &MatchSummary) -> Result<()>;
    fn list_matches(&self) -> Result<Vec<MatchId>>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    matches: BTreeMap<MatchId, MatchState>,
    summaries: BTreeMap<MatchId, MatchSummary>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MatchStore for MemoryStore {
    fn load_match(&self, id: &MatchId) -> Result<Option<MatchState>> {
        Ok(self.matches.get(id).cloned())
    }

    fn save_match(&mut self, state: &MatchState) -> Result<()> {
        self.matches.insert(state.id.clone(), state.clone());
        Ok(())
    }

    fn load_summary(&self, id: &MatchId) -> Result<Option<MatchSummary>> {
        Ok(self.summaries.get(id).cloned())
    }

    fn save_summary(&mut self, summary: &MatchSummary) -> Result<()> {
        self.summaries
            .insert(summary.match_id.clone(), summary.clone());
        Ok(())
    }

    fn list_matches(&self) -> Result<Vec<MatchId>> {
        Ok(self.matches.keys().cloned().collect())
    }
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `root`, creating the directory layout if needed.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(MATCHES_DIR))?;
        fs::create_dir_all(root.join(SUMMARIES_DIR))?;
        info!("Using match store at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, dir: &str, id: &MatchId) -> Result<PathBuf> {
        let valid = !id.as_str().is_empty()
            && id
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidId(id.clone()));
        }
        Ok(self.root.join(dir).join(format!("{id}.json")))
    }

    fn read<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                error!("Failed to read {}: {e}", path.display());
                Err(e.into())
            }
        }
    }

    // Write to a sibling file first so a crash never leaves a half-written document
    fn write<T: Serialize>(path: &Path, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl MatchStore for FileStore {
    fn load_match(&self, id: &MatchId) -> Result<Option<MatchState>> {
        Self::read(&self.path_for(MATCHES_DIR, id)?)
    }

    fn save_match(&mut self, state: &MatchState) -> Result<()> {
        Self::write(&self.path_for(MATCHES_DIR, &state.id)?, state)
    }

    fn load_summary(&self, id: &MatchId) -> Result<Option<MatchSummary>> {
        Self::read(&self.path_for(SUMMARIES_DIR, id)?)
    }

    fn save_summary(&mut self, summary: &MatchSummary) -> Result<()> {
        Self::write(&self.path_for(SUMMARIES_DIR, &summary.match_id)?, summary)
    }

    fn list_matches(&self) -> Result<Vec<MatchId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(self.root.join(MATCHES_DIR))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(MatchId::new(stem));
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Match id {0} can't be used as a storage key")]
    InvalidId(MatchId),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod test {
    use super::*;
    use crate::match_manager::{MatchManager, NewMatch};
    use cricket_common::ball::Ball;
    use time::OffsetDateTime;

    fn sample_state(id: &str) -> MatchState {
        let request = NewMatch {
            team_a: "Rovers".to_string(),
            team_b: "Wanderers".to_string(),
            overs_limit: 1,
            toss_winner: "Rovers".to_string(),
            toss_decision: "bat".to_string(),
            ..Default::default()
        };
        let mut mm =
            MatchManager::new_match(request, MatchId::new(id), OffsetDateTime::UNIX_EPOCH)
                .unwrap();
        mm.add_ball(Ball::new("R1", "W1", 4)).unwrap();
        mm.into_state()
    }

    fn finished_summary(id: &str) -> MatchSummary {
        let mut mm = MatchManager::from_state(sample_state(id));
        mm.end_match().unwrap();
        mm.last_summary().unwrap().clone()
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        let id = MatchId::new("abc");
        assert_eq!(store.load_match(&id).unwrap(), None);

        let state = sample_state("abc");
        store.save_match(&state).unwrap();
        assert_eq!(store.load_match(&id).unwrap(), Some(state));
        assert_eq!(store.list_matches().unwrap(), vec![id.clone()]);

        assert_eq!(store.load_summary(&id).unwrap(), None);
        let summary = finished_summary("abc");
        store.save_summary(&summary).unwrap();
        assert_eq!(store.load_summary(&id).unwrap(), Some(summary));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();

        let state = sample_state("m1");
        store.save_match(&state).unwrap();
        store.save_match(&sample_state("m0")).unwrap();
        assert_eq!(store.load_match(&MatchId::new("m1")).unwrap(), Some(state));
        assert_eq!(
            store.list_matches().unwrap(),
            vec![MatchId::new("m0"), MatchId::new("m1")]
        );

        let summary = finished_summary("m1");
        store.save_summary(&summary).unwrap();
        assert_eq!(
            store.load_summary(&MatchId::new("m1")).unwrap(),
            Some(summary)
        );

        // Reopening sees the same data
        let reopened = FileStore::open(dir.path()).unwrap();
        assert!(reopened.load_match(&MatchId::new("m0")).unwrap().is_some());
        assert_eq!(reopened.load_match(&MatchId::new("nope")).unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_path_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.load_match(&MatchId::new("../etc/passwd")),
            Err(StoreError::InvalidId(_))
        ));
        assert!(matches!(
            store.load_summary(&MatchId::new("")),
            Err(StoreError::InvalidId(_))
        ));
    }

    #[test]
    fn test_file_store_corrupt_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        fs::write(dir.path().join(MATCHES_DIR).join("bad.json"), b"{not json").unwrap();
        assert!(matches!(
            store.load_match(&MatchId::new("bad")),
            Err(StoreError::Json(_))
        ));
    }
}
