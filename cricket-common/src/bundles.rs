use crate::side::Side;
use core::ops::Index;
use derivative::Derivative;
use serde::{Deserialize, Serialize};

/// One value per team, looked up by [`Side`].
#[derive(Derivative, Serialize, Deserialize)]
#[derivative(Default, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeamBundle<T> {
    pub team_a: T,
    pub team_b: T,
}

impl<T> TeamBundle<T> {
    pub fn new(team_a: T, team_b: T) -> Self {
        Self { team_a, team_b }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> TeamBundle<U> {
        TeamBundle {
            team_a: f(self.team_a),
            team_b: f(self.team_b),
        }
    }
}

impl<T> Index<Side> for TeamBundle<T> {
    type Output = T;

    fn index(&self, side: Side) -> &Self::Output {
        match side {
            Side::TeamA => &self.team_a,
            Side::TeamB => &self.team_b,
        }
    }
}
