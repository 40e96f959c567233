use super::delivery::Delivery;
use cricket_common::{
    ball::{Ball, OutType},
    innings::{BatterCard, BowlerCard},
};

/// Build batting and bowling figures from scratch for an ordered run of
/// deliveries. Calling it twice on the same balls gives the same cards.
pub fn aggregate(balls: &[Ball]) -> (BatterCard, BowlerCard) {
    let mut batters = BatterCard::new();
    let mut bowlers = BowlerCard::new();

    for ball in balls {
        let delivery = Delivery::from(ball);

        let batter = batters.entry(ball.batter.clone()).or_default();
        batter.runs = batter.runs.saturating_add(ball.runs_off_bat);
        if !ball.is_wide() {
            batter.balls_faced += 1;
        }
        match ball.runs_off_bat {
            4 => batter.fours += 1,
            6 => batter.sixes += 1,
            _ => {}
        }
        if ball.is_out {
            batter.is_out = true;
            batter.out_type = ball.out_type.clone();
            batter.out_bowler = Some(ball.bowler.clone());
        }

        // Every extra, byes included, goes against the bowler
        let bowler = bowlers.entry(ball.bowler.clone()).or_default();
        if delivery.is_legal {
            bowler.balls += 1;
        }
        bowler.runs = bowler.runs.saturating_add(delivery.total_runs);
        if ball.is_out && ball.out_type != Some(OutType::RunOut) {
            bowler.wickets += 1;
        }
    }

    (batters, bowlers)
}
