use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Fixed topic literals of the scoring pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    Features,
    YTrue,
    YPred,
}

impl Topic {
    pub const FEATURES: &'static str = "features";
    pub const Y_TRUE: &'static str = "y_true";
    pub const Y_PRED: &'static str = "y_pred";

    pub fn name(&self) -> &'static str {
        match self {
            Topic::Features => Self::FEATURES,
            Topic::YTrue => Self::Y_TRUE,
            Topic::YPred => Self::Y_PRED,
        }
    }

    pub fn from_name(name: &str) -> Option<Topic> {
        match name {
            Self::FEATURES => Some(Topic::Features),
            Self::Y_TRUE => Some(Topic::YTrue),
            Self::Y_PRED => Some(Topic::YPred),
            _ => None,
        }
    }
}

/// Which side of a join an event fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Truth,
    Prediction,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Truth => Topic::Y_TRUE,
            Field::Prediction => Topic::Y_PRED,
        }
    }

    pub fn topic(&self) -> Topic {
        match self {
            Field::Truth => Topic::YTrue,
            Field::Prediction => Topic::YPred,
        }
    }

    pub fn from_topic(topic: Topic) -> Option<Field> {
        match topic {
            Topic::YTrue => Some(Field::Truth),
            Topic::YPred => Some(Field::Prediction),
            Topic::Features => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Topic::from_name(name).and_then(Field::from_topic)
    }
}

/// Correlation identifier shared by a ground truth and its prediction.
///
/// Originates as a float timestamp. Ordering follows the IEEE total order and
/// equality is bit equality, so a key parsed back from its `Display` form is
/// the same key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationKey(f64);

impl CorrelationKey {
    pub fn new(ts: f64) -> Self {
        Self(ts)
    }

    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

impl PartialEq for CorrelationKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for CorrelationKey {}

impl PartialOrd for CorrelationKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CorrelationKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::hash::Hash for CorrelationKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_decimal(self.0))
    }
}

impl FromStr for CorrelationKey {
    type Err = std::num::ParseFloatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<f64>().map(CorrelationKey)
    }
}

/// Shortest round-trip decimal form, always with a fractional part (`2.0`, `1.4142135623730951`).
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Zero-based position of an event in the durable event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LogPosition(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldEvent {
    pub key: CorrelationKey,
    pub field: Field,
    pub value: f64,
    pub arrival_seq: u64,
}

/// One computed value of the running error statistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub value: f64,
    pub seq: u64,
}
