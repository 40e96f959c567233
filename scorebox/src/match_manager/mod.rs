use cricket_common::{
    ball::{Ball, deser_lenient_u32},
    bundles::TeamBundle,
    innings::InningsState,
    match_state::{MatchId, MatchPhase, MatchState, Team, Toss, TossDecision, UnknownTossDecision},
    side::Side,
    summary::MatchSummary,
};
use log::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;
use time::OffsetDateTime;

pub mod delivery;
use delivery::*;

pub mod over_counter;
use over_counter::*;

pub mod stats;
use stats::*;

pub mod summary;
use summary::*;

const NO_RESULT: &str = "No result";
const TIED: &str = "Match tied";

/// Everything needed to start a match, as sent by the scorer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewMatch {
    pub team_a: String,
    pub team_b: String,
    pub team_a_players: Vec<String>,
    pub team_b_players: Vec<String>,
    #[serde(deserialize_with = "deser_lenient_u32")]
    pub overs_limit: u32,
    pub toss_winner: String,
    pub toss_decision: String,
}

/// Signals raised by a single delivery, for the scorer to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BallOutcome {
    /// A new bowler is due and the batters change ends
    pub over_complete: bool,
    pub innings_complete: bool,
    pub match_finished: bool,
}

#[derive(Debug)]
pub struct MatchManager {
    state: MatchState,
    last_summary: Option<MatchSummary>,
}

impl MatchManager {
    pub fn new_match(request: NewMatch, id: MatchId, now: OffsetDateTime) -> Result<Self> {
        let team_a = request.team_a.trim();
        let team_b = request.team_b.trim();
        if team_a.is_empty() || team_b.is_empty() {
            return Err(MatchManagerError::MissingField("team name"));
        }
        if team_a.eq_ignore_ascii_case(team_b) {
            return Err(MatchManagerError::SameTeamNames(team_a.to_string()));
        }
        if request.overs_limit == 0 {
            return Err(MatchManagerError::MissingField("overs limit"));
        }

        let winner = request.toss_winner.trim();
        let winner = if winner.eq_ignore_ascii_case(team_a) {
            Side::TeamA
        } else if winner.eq_ignore_ascii_case(team_b) {
            Side::TeamB
        } else {
            return Err(MatchManagerError::UnknownTossWinner(winner.to_string()));
        };
        let decision: TossDecision = request.toss_decision.parse()?;
        let toss = Toss { winner, decision };

        let squad = |players: Vec<String>| -> Vec<String> {
            players
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        };
        let teams = TeamBundle::new(
            Team {
                name: team_a.to_string(),
                players: squad(request.team_a_players),
            },
            Team {
                name: team_b.to_string(),
                players: squad(request.team_b_players),
            },
        );

        let state = MatchState {
            id,
            overs_limit: request.overs_limit,
            toss,
            created_at: now,
            current_innings: 1,
            current_over: 0,
            current_ball: 0,
            target: 0,
            is_finished: false,
            result: None,
            score: InningsState::new(toss.first_batting_side()),
            innings1: None,
            innings2: None,
            teams,
        };

        info!(
            "{} New match: {} v {}. {} won the toss and chose to {}, {} overs",
            state.status_string(),
            state.team_name(Side::TeamA),
            state.team_name(Side::TeamB),
            state.team_name(winner),
            decision,
            state.overs_limit,
        );

        Ok(Self::from_state(state))
    }

    pub fn from_state(state: MatchState) -> Self {
        Self {
            state,
            last_summary: None,
        }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn into_state(self) -> MatchState {
        self.state
    }

    pub fn phase(&self) -> MatchPhase {
        self.state.phase()
    }

    /// The summary produced when the match finished during this manager's lifetime
    pub fn last_summary(&self) -> Option<&MatchSummary> {
        self.last_summary.as_ref()
    }

    pub fn add_ball(&mut self, ball: Ball) -> Result<BallOutcome> {
        if self.state.is_finished {
            return Err(MatchManagerError::MatchFinished);
        }

        let ball = normalise(ball);
        let delivery = Delivery::from(&ball);
        debug!(
            "{} Ball from {} to {}: {} off the bat, {} total, legal: {}",
            self.state.status_string(),
            ball.bowler,
            ball.batter,
            ball.runs_off_bat,
            delivery.total_runs,
            delivery.is_legal,
        );

        let score = &mut self.state.score;
        score.runs = score.runs.saturating_add(delivery.total_runs);
        if ball.is_out {
            score.wickets += 1;
        }
        score.balls.push(ball);

        let mut counter = OverCounter::new(self.state.current_over, self.state.current_ball);
        let over_complete = counter.advance(delivery);
        self.state.current_over = counter.over;
        self.state.current_ball = counter.ball;
        self.state.score.overs = counter.to_string();

        let (batter_stats, bowler_stats) = aggregate(&self.state.score.balls);
        self.state.score.batter_stats = batter_stats;
        self.state.score.bowler_stats = bowler_stats;

        if over_complete {
            info!("{} Over complete", self.state.status_string());
        }

        let mut outcome = BallOutcome {
            over_complete,
            ..Default::default()
        };

        match self.phase() {
            MatchPhase::InInnings1 => {
                if self.innings_over() {
                    self.start_second_innings();
                    outcome.innings_complete = true;
                }
            }
            MatchPhase::InInnings2 => {
                if self.target_reached() || self.innings_over() {
                    self.finish();
                    outcome.innings_complete = true;
                    outcome.match_finished = true;
                }
            }
            MatchPhase::Finished => {}
        }

        Ok(outcome)
    }

    /// Close the innings in progress with whatever has been scored so far.
    /// Ending the second innings ends the match.
    pub fn end_innings(&mut self) -> Result<()> {
        match self.phase() {
            MatchPhase::InInnings1 => {
                info!("{} Ending first innings early", self.state.status_string());
                self.start_second_innings();
                Ok(())
            }
            MatchPhase::InInnings2 => {
                info!("{} Ending second innings early", self.state.status_string());
                self.finish();
                Ok(())
            }
            MatchPhase::Finished => Err(MatchManagerError::MatchFinished),
        }
    }

    /// Finish the match with the score as it stands. Ending during the first
    /// innings seals it, leaves `innings2` empty and records "No result".
    pub fn end_match(&mut self) -> Result<()> {
        if self.state.is_finished {
            return Err(MatchManagerError::MatchFinished);
        }
        info!("{} Ending match early", self.state.status_string());
        self.finish();
        Ok(())
    }

    fn innings_over(&self) -> bool {
        let state = &self.state;
        state.score.wickets >= state.team_size(state.batting_side())
            || state.current_over >= state.overs_limit
    }

    fn target_reached(&self) -> bool {
        self.state.score.runs >= self.state.target
    }

    fn start_second_innings(&mut self) {
        let state = &mut self.state;
        let next_side = state.batting_side().other();
        let first = std::mem::replace(&mut state.score, InningsState::new(next_side));

        state.target = first.runs.saturating_add(1);
        state.innings1 = Some(first);
        state.current_over = 0;
        state.current_ball = 0;
        state.current_innings = 2;

        info!(
            "{} Second innings begins, {} need {} to win",
            state.status_string(),
            state.team_name(next_side),
            state.target,
        );
    }

    fn finish(&mut self) {
        let result = self.result_string();
        let state = &mut self.state;
        match state.current_innings {
            1 => state.innings1 = Some(state.score.clone()),
            _ => state.innings2 = Some(state.score.clone()),
        }
        state.is_finished = true;
        state.result = Some(result.clone());

        info!("{} Match finished: {result}", state.status_string());
        self.last_summary = Some(build_summary(&self.state, &result));
    }

    fn result_string(&self) -> String {
        let state = &self.state;
        if state.current_innings < 2 {
            return NO_RESULT.to_string();
        }

        let chasing = state.batting_side();
        let runs = state.score.runs;
        let first_innings_runs = state.target.saturating_sub(1);
        match runs.cmp(&first_innings_runs) {
            Ordering::Greater => format!(
                "{} won by {} wickets",
                state.team_name(chasing),
                state
                    .team_size(chasing)
                    .saturating_sub(1)
                    .saturating_sub(state.score.wickets)
            ),
            Ordering::Less => format!(
                "{} won by {} runs",
                state.team_name(chasing.other()),
                first_innings_runs - runs
            ),
            Ordering::Equal => TIED.to_string(),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum MatchManagerError {
    #[error("The match has already finished")]
    MatchFinished,
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Both teams are called {0}")]
    SameTeamNames(String),
    #[error("Toss winner {0} is not one of the teams in this match")]
    UnknownTossWinner(String),
    #[error(transparent)]
    UnknownTossDecision(#[from] UnknownTossDecision),
}

pub type Result<T> = std::result::Result<T, MatchManagerError>;
