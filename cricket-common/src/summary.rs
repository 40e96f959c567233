use crate::{
    ball::OutType, bundles::TeamBundle, innings::InningsState, match_state::MatchId,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattingCard {
    pub name: String,
    pub runs: u32,
    pub balls_faced: u32,
    pub fours: u32,
    pub sixes: u32,
    pub strike_rate: f64,
    pub is_out: bool,
    pub out_type: Option<OutType>,
    pub out_bowler: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BowlingCard {
    pub name: String,
    pub balls: u32,
    pub overs: String,
    pub maidens: u32,
    pub runs: u32,
    pub wickets: u32,
    pub economy: f64,
}

/// Record written once when a match finishes. Nothing in it changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub match_id: MatchId,
    pub teams: TeamBundle<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub batters: Vec<BattingCard>,
    pub bowlers: Vec<BowlingCard>,
    pub result: String,
    pub innings1: InningsState,
    pub innings2: InningsState,
}
