use serde::{Deserialize, Deserializer, Serialize, de::IgnoredAny};
use std::fmt::{Display, Formatter};

/// Kind of extra awarded on a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExtraType {
    Wide,
    NoBall,
    Bye,
    LegBye,
    Penalty,
    Other(String),
}

impl ExtraType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Wide => "wide",
            Self::NoBall => "noBall",
            Self::Bye => "bye",
            Self::LegBye => "legBye",
            Self::Penalty => "penalty",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for ExtraType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "wide" => Self::Wide,
            "noBall" => Self::NoBall,
            "bye" => Self::Bye,
            "legBye" => Self::LegBye,
            "penalty" => Self::Penalty,
            _ => Self::Other(s),
        }
    }
}

impl From<ExtraType> for String {
    fn from(extra: ExtraType) -> Self {
        match extra {
            ExtraType::Other(s) => s,
            e => e.as_str().to_string(),
        }
    }
}

impl Display for ExtraType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a batter was dismissed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OutType {
    Bowled,
    Caught,
    Lbw,
    RunOut,
    Stumped,
    HitWicket,
    RetiredHurt,
    Other(String),
}

impl OutType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Bowled => "bowled",
            Self::Caught => "caught",
            Self::Lbw => "lbw",
            Self::RunOut => "runOut",
            Self::Stumped => "stumped",
            Self::HitWicket => "hitWicket",
            Self::RetiredHurt => "retiredHurt",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for OutType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "bowled" => Self::Bowled,
            "caught" => Self::Caught,
            "lbw" => Self::Lbw,
            "runOut" => Self::RunOut,
            "stumped" => Self::Stumped,
            "hitWicket" => Self::HitWicket,
            "retiredHurt" => Self::RetiredHurt,
            _ => Self::Other(s),
        }
    }
}

impl From<OutType> for String {
    fn from(out: OutType) -> Self {
        match out {
            OutType::Other(s) => s,
            o => o.as_str().to_string(),
        }
    }
}

impl Display for OutType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single delivery as submitted by the scorer.
///
/// Numeric fields are parsed permissively: anything that isn't a usable
/// non-negative number becomes `0` instead of failing the whole event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ball {
    #[serde(deserialize_with = "deser_lenient_u32")]
    pub runs_off_bat: u32,
    pub ball_type: String,
    pub batter: String,
    pub bowler: String,
    pub is_out: bool,
    #[serde(deserialize_with = "deser_blank_as_none")]
    pub out_type: Option<OutType>,
    pub is_extra: bool,
    #[serde(deserialize_with = "deser_blank_as_none")]
    pub extra_type: Option<ExtraType>,
    #[serde(deserialize_with = "deser_lenient_u32")]
    pub extra_runs: u32,
}

impl Ball {
    pub fn new(batter: &str, bowler: &str, runs_off_bat: u32) -> Self {
        Self {
            runs_off_bat,
            batter: batter.to_string(),
            bowler: bowler.to_string(),
            ..Default::default()
        }
    }

    pub fn with_extra(mut self, extra_type: ExtraType, extra_runs: u32) -> Self {
        self.is_extra = true;
        self.extra_type = Some(extra_type);
        self.extra_runs = extra_runs;
        self
    }

    pub fn with_dismissal(mut self, out_type: OutType) -> Self {
        self.is_out = true;
        self.out_type = Some(out_type);
        self
    }

    pub fn is_wide(&self) -> bool {
        self.is_extra && self.extra_type == Some(ExtraType::Wide)
    }

    pub fn is_no_ball(&self) -> bool {
        self.is_extra && self.extra_type == Some(ExtraType::NoBall)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Int(u64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

impl LenientNumber {
    fn into_u32(self) -> u32 {
        match self {
            Self::Int(n) => u32::try_from(n).unwrap_or(0),
            Self::Float(f) if (0.0..=u32::MAX as f64).contains(&f) => f.trunc() as u32,
            Self::Float(_) => 0,
            Self::Text(s) => {
                let digits: String = s
                    .trim_start()
                    .chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect();
                digits.parse().unwrap_or(0)
            }
            Self::Other(_) => 0,
        }
    }
}

// Deserialize a count, falling back to `0` for anything that can't be read as one
pub fn deser_lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    LenientNumber::deserialize(deserializer).map(LenientNumber::into_u32)
}

// Treat `null` and empty strings as "not set"
fn deser_blank_as_none<'de, D, T: From<String>>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
        .map(|val| val.filter(|s| !s.trim().is_empty()).map(T::from))
}
