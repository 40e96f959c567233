use cricket_common::ball::{Ball, ExtraType};

/// What a delivery is worth to the batting side and whether it counts
/// towards the over. Both the over counter and the stat cards read this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub total_runs: u32,
    pub is_legal: bool,
}

pub fn classify(
    runs_off_bat: u32,
    is_extra: bool,
    extra_type: Option<&ExtraType>,
    extra_runs: u32,
) -> Delivery {
    let total_runs = runs_off_bat.saturating_add(if is_extra { extra_runs } else { 0 });
    let is_legal = !(is_extra && matches!(extra_type, Some(ExtraType::Wide | ExtraType::NoBall)));
    Delivery {
        total_runs,
        is_legal,
    }
}

impl From<&Ball> for Delivery {
    fn from(ball: &Ball) -> Self {
        classify(
            ball.runs_off_bat,
            ball.is_extra,
            ball.extra_type.as_ref(),
            ball.extra_runs,
        )
    }
}

/// Drop the detail fields that the flags say don't apply.
pub fn normalise(mut ball: Ball) -> Ball {
    if !ball.is_out {
        ball.out_type = None;
    }
    if !ball.is_extra {
        ball.extra_type = None;
        ball.extra_runs = 0;
    }
    ball
}
