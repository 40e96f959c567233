use derivative::Derivative;
use serde::{Deserialize, Serialize};

/// One of the two teams in a match, in the order they were named at creation.
#[derive(Derivative, Serialize, Deserialize, Hash)]
#[derivative(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    #[derivative(Default)]
    TeamA,
    TeamB,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Self::TeamA => Self::TeamB,
            Self::TeamB => Self::TeamA,
        }
    }
}

impl core::fmt::Display for Side {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            Self::TeamA => write!(f, "Team A"),
            Self::TeamB => write!(f, "Team B"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_other() {
        assert_eq!(Side::TeamA.other(), Side::TeamB);
        assert_eq!(Side::TeamB.other(), Side::TeamA);
        assert_eq!(Side::default().other().other(), Side::TeamA);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&Side::TeamA).unwrap(), "\"teamA\"");
        assert_eq!(
            serde_json::from_str::<Side>("\"teamB\"").unwrap(),
            Side::TeamB
        );
    }
}
