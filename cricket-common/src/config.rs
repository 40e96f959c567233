use serde::{Deserialize, Serialize};

pub const BALLS_PER_OVER: u8 = 6;
pub const DEFAULT_TEAM_SIZE: u32 = 11;

/// Defaults applied to new matches when the request leaves them out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchRules {
    pub overs_limit: u32,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            overs_limit: 20,
        }
    }
}
