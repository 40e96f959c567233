use super::delivery::Delivery;
use cricket_common::config::BALLS_PER_OVER;
use std::fmt::{Display, Formatter};

/// Legal-delivery position within an innings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverCounter {
    pub over: u32,
    pub ball: u8,
}

impl OverCounter {
    pub fn new(over: u32, ball: u8) -> Self {
        Self { over, ball }
    }

    /// Returns `true` when this delivery completed an over.
    pub fn advance(&mut self, delivery: Delivery) -> bool {
        if !delivery.is_legal {
            return false;
        }
        self.ball += 1;
        if self.ball >= BALLS_PER_OVER {
            self.ball = 0;
            self.over += 1;
            true
        } else {
            false
        }
    }
}

impl Display for OverCounter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.over, self.ball)
    }
}
