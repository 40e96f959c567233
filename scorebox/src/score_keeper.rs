//! The request/response boundary for live scoring.
//!
//! Every operation loads the match by id, runs it through a
//! [`MatchManager`], and saves the result before returning. Writes take
//! `&mut self`, so a single keeper never interleaves two updates; share one
//! across threads behind a `Mutex`.

use crate::{
    match_manager::{BallOutcome, MatchManager, MatchManagerError, NewMatch},
    mirror::RealtimeMirror,
    store::{MatchStore, StoreError},
};
use cricket_common::{
    ball::Ball,
    match_state::{MatchId, MatchState},
    summary::MatchSummary,
};
use log::*;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

/// State after a ball, with the signals the scorer needs to react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BallUpdate {
    pub state: MatchState,
    pub over_complete: bool,
    pub innings_complete: bool,
}

pub struct ScoreKeeper<S> {
    store: S,
    mirror: Option<Box<dyn RealtimeMirror + Send>>,
}

impl<S: MatchStore> ScoreKeeper<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            mirror: None,
        }
    }

    pub fn with_mirror<M: RealtimeMirror + Send + 'static>(mut self, mirror: M) -> Self {
        self.mirror = Some(Box::new(mirror));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn create_match(&mut self, request: NewMatch) -> Result<MatchState> {
        let manager =
            MatchManager::new_match(request, MatchId::generate(), OffsetDateTime::now_utc())?;
        self.commit(&manager)?;
        Ok(manager.into_state())
    }

    pub fn submit_ball(&mut self, id: &MatchId, ball: Ball) -> Result<BallUpdate> {
        let mut manager = self.load(id)?;
        let BallOutcome {
            over_complete,
            innings_complete,
            ..
        } = manager.add_ball(ball)?;
        self.commit(&manager)?;
        Ok(BallUpdate {
            state: manager.into_state(),
            over_complete,
            innings_complete,
        })
    }

    pub fn end_innings_now(&mut self, id: &MatchId) -> Result<MatchState> {
        let mut manager = self.load(id)?;
        manager.end_innings()?;
        self.commit(&manager)?;
        Ok(manager.into_state())
    }

    pub fn end_match_now(&mut self, id: &MatchId) -> Result<MatchState> {
        let mut manager = self.load(id)?;
        manager.end_match()?;
        self.commit(&manager)?;
        Ok(manager.into_state())
    }

    pub fn get_summary(&self, id: &MatchId) -> Result<MatchSummary> {
        let state = self.load(id)?.into_state();
        if !state.is_finished {
            return Err(ScoreError::InvalidState(format!(
                "Match {id} has not finished yet"
            )));
        }
        self.store
            .load_summary(id)?
            .ok_or_else(|| ScoreError::NotFound(id.clone()))
    }

    pub fn get_match(&self, id: &MatchId) -> Result<MatchState> {
        Ok(self.load(id)?.into_state())
    }

    pub fn list_matches(&self) -> Result<Vec<MatchId>> {
        Ok(self.store.list_matches()?)
    }

    fn load(&self, id: &MatchId) -> Result<MatchManager> {
        self.store
            .load_match(id)?
            .map(MatchManager::from_state)
            .ok_or_else(|| ScoreError::NotFound(id.clone()))
    }

    fn commit(&mut self, manager: &MatchManager) -> Result<()> {
        let state = manager.state();

        // A stored summary is final only once the stored state says the match
        // finished. Anything else was left by a commit whose state save failed.
        if let Some(summary) = manager.last_summary() {
            let committed = self
                .store
                .load_match(&summary.match_id)?
                .is_some_and(|stored| stored.is_finished);
            if committed && self.store.load_summary(&summary.match_id)?.is_some() {
                warn!(
                    "{} A summary already exists, keeping the original",
                    state.status_string()
                );
            } else {
                self.store.save_summary(summary)?;
                info!("{} Summary written", state.status_string());
            }
        }

        self.store.save_match(state)?;

        if let Some(mirror) = &self.mirror {
            if let Err(e) = mirror.push(state) {
                warn!("{} Live mirror update failed: {e}", state.status_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("No match with id {0}")]
    NotFound(MatchId),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    ValidationFailed(String),
    #[error("Storage failure: {0}")]
    Store(#[from] StoreError),
}

impl From<MatchManagerError> for ScoreError {
    fn from(e: MatchManagerError) -> Self {
        match e {
            MatchManagerError::MissingField(_) | MatchManagerError::SameTeamNames(_) => {
                ScoreError::ValidationFailed(e.to_string())
            }
            MatchManagerError::MatchFinished
            | MatchManagerError::UnknownTossWinner(_)
            | MatchManagerError::UnknownTossDecision(_) => ScoreError::InvalidState(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScoreError>;

#[cfg(test)]
mod test {
    use super::*;
    use crate::{mirror::MirrorError, store::MemoryStore};
    use cricket_common::ball::OutType;
    use std::{
        cell::Cell,
        io,
        sync::{Arc, Mutex, Once},
    };

    static INIT: Once = Once::new();

    pub fn initialize() {
        INIT.call_once(|| {
            let _ = env_logger::builder().is_test(true).try_init();
        });
    }

    fn request() -> NewMatch {
        NewMatch {
            team_a: "Rovers".to_string(),
            team_b: "Wanderers".to_string(),
            overs_limit: 1,
            toss_winner: "Rovers".to_string(),
            toss_decision: "bat".to_string(),
            ..Default::default()
        }
    }

    #[derive(Clone, Default)]
    struct RecordingMirror {
        pushed: Arc<Mutex<Vec<MatchState>>>,
        fail: bool,
    }

    impl RealtimeMirror for RecordingMirror {
        fn push(&self, state: &MatchState) -> std::result::Result<(), MirrorError> {
            if self.fail {
                return Err(MirrorError::Closed);
            }
            self.pushed.lock().unwrap().push(state.clone());
            Ok(())
        }
    }

    /// Reads from an inner store but refuses to save match state
    struct ReadOnlyStore(MemoryStore);

    impl MatchStore for ReadOnlyStore {
        fn load_match(&self, id: &MatchId) -> crate::store::Result<Option<MatchState>> {
            self.0.load_match(id)
        }
        fn save_match(&mut self, _: &MatchState) -> crate::store::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read only").into())
        }
        fn load_summary(&self, id: &MatchId) -> crate::store::Result<Option<MatchSummary>> {
            self.0.load_summary(id)
        }
        fn save_summary(&mut self, summary: &MatchSummary) -> crate::store::Result<()> {
            self.0.save_summary(summary)
        }
        fn list_matches(&self) -> crate::store::Result<Vec<MatchId>> {
            self.0.list_matches()
        }
    }

    /// Fails the next `save_match` after `fail_next_save` is set
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_next_save: Cell<bool>,
    }

    impl MatchStore for FlakyStore {
        fn load_match(&self, id: &MatchId) -> crate::store::Result<Option<MatchState>> {
            self.inner.load_match(id)
        }
        fn save_match(&mut self, state: &MatchState) -> crate::store::Result<()> {
            if self.fail_next_save.replace(false) {
                return Err(io::Error::other("disk full").into());
            }
            self.inner.save_match(state)
        }
        fn load_summary(&self, id: &MatchId) -> crate::store::Result<Option<MatchSummary>> {
            self.inner.load_summary(id)
        }
        fn save_summary(&mut self, summary: &MatchSummary) -> crate::store::Result<()> {
            self.inner.save_summary(summary)
        }
        fn list_matches(&self) -> crate::store::Result<Vec<MatchId>> {
            self.inner.list_matches()
        }
    }

    #[test]
    fn test_failed_finish_does_not_fix_the_summary() {
        initialize();
        let mut keeper = ScoreKeeper::new(FlakyStore::default());
        let id = keeper.create_match(request()).unwrap().id;
        keeper.submit_ball(&id, Ball::new("R1", "W1", 4)).unwrap();
        keeper.end_innings_now(&id).unwrap();

        keeper.store().fail_next_save.set(true);
        assert!(matches!(
            keeper.end_match_now(&id),
            Err(ScoreError::Store(_))
        ));
        let state = keeper.get_match(&id).unwrap();
        assert!(!state.is_finished);
        assert!(matches!(
            keeper.get_summary(&id),
            Err(ScoreError::InvalidState(_))
        ));

        let update = keeper.submit_ball(&id, Ball::new("W1", "R1", 6)).unwrap();
        assert!(update.innings_complete);
        let state = update.state;
        assert!(state.is_finished);

        let summary = keeper.get_summary(&id).unwrap();
        assert_eq!(state.result.as_deref(), Some(summary.result.as_str()));
        assert_eq!(summary.result, "Wanderers won by 10 wickets");
        assert_eq!(summary.innings2.runs, 6);
    }

    #[test]
    fn test_create_and_get() {
        initialize();
        let mut keeper = ScoreKeeper::new(MemoryStore::new());
        let state = keeper.create_match(request()).unwrap();
        assert_eq!(keeper.get_match(&state.id).unwrap(), state);
        assert_eq!(keeper.list_matches().unwrap(), vec![state.id.clone()]);
    }

    #[test]
    fn test_create_errors() {
        initialize();
        let mut keeper = ScoreKeeper::new(MemoryStore::new());

        let mut req = request();
        req.team_a = String::new();
        assert!(matches!(
            keeper.create_match(req),
            Err(ScoreError::ValidationFailed(_))
        ));

        let mut req = request();
        req.toss_winner = "Someone".to_string();
        assert!(matches!(
            keeper.create_match(req),
            Err(ScoreError::InvalidState(_))
        ));

        let mut req = request();
        req.toss_decision = "chase".to_string();
        assert!(matches!(
            keeper.create_match(req),
            Err(ScoreError::InvalidState(_))
        ));

        assert!(keeper.list_matches().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_match() {
        initialize();
        let mut keeper = ScoreKeeper::new(MemoryStore::new());
        let id = MatchId::new("missing");
        assert!(matches!(
            keeper.submit_ball(&id, Ball::new("a", "b", 1)),
            Err(ScoreError::NotFound(_))
        ));
        assert!(matches!(
            keeper.end_innings_now(&id),
            Err(ScoreError::NotFound(_))
        ));
        assert!(matches!(
            keeper.end_match_now(&id),
            Err(ScoreError::NotFound(_))
        ));
        assert!(matches!(
            keeper.get_summary(&id),
            Err(ScoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_summary_only_after_finish() {
        initialize();
        let mut keeper = ScoreKeeper::new(MemoryStore::new());
        let id = keeper.create_match(request()).unwrap().id;
        keeper.submit_ball(&id, Ball::new("R1", "W1", 2)).unwrap();
        assert!(matches!(
            keeper.get_summary(&id),
            Err(ScoreError::InvalidState(_))
        ));

        keeper.end_innings_now(&id).unwrap();
        keeper
            .submit_ball(&id, Ball::new("W1", "R1", 0).with_dismissal(OutType::Bowled))
            .unwrap();
        let state = keeper.end_match_now(&id).unwrap();
        assert!(state.is_finished);

        let summary = keeper.get_summary(&id).unwrap();
        assert_eq!(summary.result, "Rovers won by 2 runs");
        assert_eq!(Some(summary.result.clone()), state.result);
        assert_eq!(summary.teams.team_a, "Rovers");
        assert_eq!(summary.batters.len(), 2);
        assert_eq!(summary.bowlers.len(), 2);

        assert!(matches!(
            keeper.end_match_now(&id),
            Err(ScoreError::InvalidState(_))
        ));
        assert!(matches!(
            keeper.submit_ball(&id, Ball::new("W2", "R1", 6)),
            Err(ScoreError::InvalidState(_))
        ));
        assert_eq!(keeper.get_match(&id).unwrap(), state);
    }

    #[test]
    fn test_mirror_gets_every_commit() {
        initialize();
        let mirror = RecordingMirror::default();
        let mut keeper = ScoreKeeper::new(MemoryStore::new()).with_mirror(mirror.clone());
        let id = keeper.create_match(request()).unwrap().id;
        keeper.submit_ball(&id, Ball::new("R1", "W1", 1)).unwrap();
        keeper.end_innings_now(&id).unwrap();

        let pushed = mirror.pushed.lock().unwrap();
        assert_eq!(pushed.len(), 3);
        assert_eq!(pushed[1].score.runs, 1);
        assert_eq!(pushed[2].current_innings, 2);
    }

    #[test]
    fn test_failing_mirror_is_ignored() {
        initialize();
        let mirror = RecordingMirror {
            fail: true,
            ..Default::default()
        };
        let mut keeper = ScoreKeeper::new(MemoryStore::new()).with_mirror(mirror);
        let id = keeper.create_match(request()).unwrap().id;
        let update = keeper.submit_ball(&id, Ball::new("R1", "W1", 4)).unwrap();
        assert_eq!(update.state.score.runs, 4);
        assert_eq!(keeper.get_match(&id).unwrap().score.runs, 4);
    }

    #[test]
    fn test_store_failure_leaves_state_uncommitted() {
        initialize();
        let mut keeper = ScoreKeeper::new(MemoryStore::new());
        let before = keeper.create_match(request()).unwrap();
        let id = before.id.clone();
        let store = keeper.store().clone();

        let mirror = RecordingMirror::default();
        let mut keeper = ScoreKeeper::new(ReadOnlyStore(store)).with_mirror(mirror.clone());
        assert!(matches!(
            keeper.submit_ball(&id, Ball::new("R1", "W1", 6)),
            Err(ScoreError::Store(_))
        ));
        assert_eq!(keeper.get_match(&id).unwrap(), before);
        assert!(mirror.pushed.lock().unwrap().is_empty());
    }
}
