use crate::{ball::Ball, ball::OutType, side::Side};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatterStats {
    pub runs: u32,
    pub balls_faced: u32,
    pub fours: u32,
    pub sixes: u32,
    pub is_out: bool,
    pub out_type: Option<OutType>,
    pub out_bowler: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BowlerStats {
    /// Legal deliveries bowled
    pub balls: u32,
    pub runs: u32,
    pub wickets: u32,
}

pub type BatterCard = IndexMap<String, BatterStats>;
pub type BowlerCard = IndexMap<String, BowlerStats>;

/// One side's batting innings. While live, `balls` only grows; once the
/// innings is sealed into a match's snapshot it is never touched again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InningsState {
    pub batting_team: Side,
    pub runs: u32,
    pub wickets: u32,
    pub overs: String,
    pub balls: Vec<Ball>,
    pub batter_stats: BatterCard,
    pub bowler_stats: BowlerCard,
}

impl InningsState {
    pub fn new(batting_team: Side) -> Self {
        Self {
            batting_team,
            runs: 0,
            wickets: 0,
            overs: "0.0".to_string(),
            balls: Vec::new(),
            batter_stats: IndexMap::new(),
            bowler_stats: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.balls.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_innings_is_empty() {
        let innings = InningsState::new(Side::TeamB);
        assert!(innings.is_empty());
        assert_eq!(innings.batting_team, Side::TeamB);
        assert_eq!(innings.overs, "0.0");
        assert_eq!(innings.runs, 0);
        assert_eq!(innings.wickets, 0);
    }

    #[test]
    fn test_stats_keep_insertion_order() {
        let mut innings = InningsState::new(Side::TeamA);
        innings
            .batter_stats
            .insert("Zed".to_string(), BatterStats::default());
        innings
            .batter_stats
            .insert("Amy".to_string(), BatterStats::default());

        let json = serde_json::to_string(&innings).unwrap();
        let zed = json.find("Zed").unwrap();
        let amy = json.find("Amy").unwrap();
        assert!(zed < amy);

        let deser: InningsState = serde_json::from_str(&json).unwrap();
        assert_eq!(deser, innings);
    }
}
