use super::{over_counter::OverCounter, stats::aggregate};
use cricket_common::{
    ball::Ball,
    config::BALLS_PER_OVER,
    innings::InningsState,
    match_state::MatchState,
    summary::{BattingCard, BowlingCard, MatchSummary},
};

fn round2(val: f64) -> f64 {
    (val * 100.0).round() / 100.0
}

/// The innings as it should be reported: the sealed copy when there is one,
/// otherwise whatever the live innings holds if it is the one being asked for.
fn reported_innings(state: &MatchState, number: u8) -> InningsState {
    let sealed = match number {
        1 => &state.innings1,
        _ => &state.innings2,
    };
    if let Some(innings) = sealed {
        return innings.clone();
    }
    if state.current_innings == number {
        return state.score.clone();
    }
    let first_side = state.toss.first_batting_side();
    InningsState::new(if number == 1 {
        first_side
    } else {
        first_side.other()
    })
}

pub fn build_summary(state: &MatchState, result: &str) -> MatchSummary {
    let innings1 = reported_innings(state, 1);
    let innings2 = reported_innings(state, 2);

    let all_balls: Vec<Ball> = innings1
        .balls
        .iter()
        .chain(innings2.balls.iter())
        .cloned()
        .collect();
    let (batters, bowlers) = aggregate(&all_balls);

    let batters = batters
        .into_iter()
        .map(|(name, stats)| BattingCard {
            name,
            strike_rate: if stats.balls_faced > 0 {
                round2(stats.runs as f64 * 100.0 / stats.balls_faced as f64)
            } else {
                0.0
            },
            runs: stats.runs,
            balls_faced: stats.balls_faced,
            fours: stats.fours,
            sixes: stats.sixes,
            is_out: stats.is_out,
            out_type: stats.out_type,
            out_bowler: stats.out_bowler,
        })
        .collect();

    let bowlers = bowlers
        .into_iter()
        .map(|(name, stats)| {
            let overs_bowled = stats.balls / BALLS_PER_OVER as u32;
            let spell = OverCounter::new(overs_bowled, (stats.balls % BALLS_PER_OVER as u32) as u8);
            // One maiden at most, and only for a spell that conceded nothing at all
            let maidens = if stats.runs == 0 && overs_bowled > 0 {
                1
            } else {
                0
            };
            BowlingCard {
                name,
                balls: stats.balls,
                overs: spell.to_string(),
                maidens,
                runs: stats.runs,
                wickets: stats.wickets,
                economy: if stats.balls > 0 {
                    round2(stats.runs as f64 * BALLS_PER_OVER as f64 / stats.balls as f64)
                } else {
                    0.0
                },
            }
        })
        .collect();

    MatchSummary {
        match_id: state.id.clone(),
        teams: state.teams.clone().map(|team| team.name),
        date: state.created_at,
        batters,
        bowlers,
        result: result.to_string(),
        innings1,
        innings2,
    }
}
