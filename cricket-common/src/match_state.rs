use crate::{
    bundles::TeamBundle,
    config::DEFAULT_TEAM_SIZE,
    innings::InningsState,
    side::Side,
};
use derivative::Derivative;
use enum_derive_2018::EnumDisplay;
use macro_attr_2018::macro_attr;
use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};
use time::OffsetDateTime;

const MATCH_ID_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(
            rand::rng()
                .sample_iter(&Alphanumeric)
                .take(MATCH_ID_LEN)
                .map(char::from)
                .collect(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MatchId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Team {
    pub name: String,
    pub players: Vec<String>,
}

macro_attr! {
    #[derive(Debug, Clone, Copy, Derivative, PartialEq, Eq, Serialize, Deserialize, EnumDisplay!)]
    #[derivative(Default)]
    #[serde(rename_all = "camelCase")]
    pub enum TossDecision {
        #[derivative(Default)]
        Bat,
        Bowl,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTossDecision(pub String);

impl Display for UnknownTossDecision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "toss decision must be `bat` or `bowl`, got `{}`", self.0)
    }
}

impl std::error::Error for UnknownTossDecision {}

impl FromStr for TossDecision {
    type Err = UnknownTossDecision;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bat" => Ok(Self::Bat),
            "bowl" => Ok(Self::Bowl),
            _ => Err(UnknownTossDecision(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Toss {
    pub winner: Side,
    pub decision: TossDecision,
}

impl Toss {
    pub fn first_batting_side(&self) -> Side {
        match self.decision {
            TossDecision::Bat => self.winner,
            TossDecision::Bowl => self.winner.other(),
        }
    }
}

macro_attr! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, EnumDisplay!)]
    pub enum MatchPhase {
        InInnings1,
        InInnings2,
        Finished,
    }
}

/// The live state of a match. `score` is the innings in progress; the sealed
/// innings live in `innings1` and `innings2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    pub id: MatchId,
    pub teams: TeamBundle<Team>,
    pub overs_limit: u32,
    pub toss: Toss,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub current_innings: u8,
    pub current_over: u32,
    pub current_ball: u8,
    pub target: u32,
    pub is_finished: bool,
    pub result: Option<String>,
    pub score: InningsState,
    pub innings1: Option<InningsState>,
    pub innings2: Option<InningsState>,
}

impl MatchState {
    pub fn phase(&self) -> MatchPhase {
        if self.is_finished {
            MatchPhase::Finished
        } else if self.current_innings >= 2 {
            MatchPhase::InInnings2
        } else {
            MatchPhase::InInnings1
        }
    }

    pub fn batting_side(&self) -> Side {
        self.score.batting_team
    }

    pub fn team_name(&self, side: Side) -> &str {
        &self.teams[side].name
    }

    /// Wickets needed to bowl a side out. Sides without a named squad use the
    /// usual eleven.
    pub fn team_size(&self, side: Side) -> u32 {
        match self.teams[side].players.len() {
            0 => DEFAULT_TEAM_SIZE,
            n => n as u32,
        }
    }

    pub fn status_string(&self) -> String {
        format!(
            "[{} {} {}/{} ({})]",
            self.id,
            self.team_name(self.batting_side()),
            self.score.runs,
            self.score.wickets,
            self.score.overs
        )
    }
}
