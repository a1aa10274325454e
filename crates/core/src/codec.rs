//! JSON payloads carried on the pipeline topics.

use serde::{Deserialize, Serialize};

use crate::{
    error::DecodeError,
    types::{CorrelationKey, Field, Topic},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruthMessage {
    pub ts: f64,
    pub y_true: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionMessage {
    pub ts: f64,
    pub y_pred: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureMessage {
    pub ts: f64,
    pub features: Vec<f64>,
}

/// A decoded `y_true` / `y_pred` payload, not yet sequenced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedField {
    pub key: CorrelationKey,
    pub field: Field,
    pub value: f64,
}

/// Decode a label payload; the field is chosen by the topic it arrived on.
pub fn decode_field(topic: Topic, payload: &[u8]) -> Result<DecodedField, DecodeError> {
    let name = topic.name();
    let (ts, field, value) = match topic {
        Topic::YTrue => {
            let msg: TruthMessage = serde_json::from_slice(payload)
                .map_err(|source| DecodeError::InvalidJson { topic: name, source })?;
            (msg.ts, Field::Truth, msg.y_true)
        }
        Topic::YPred => {
            let msg: PredictionMessage = serde_json::from_slice(payload)
                .map_err(|source| DecodeError::InvalidJson { topic: name, source })?;
            (msg.ts, Field::Prediction, msg.y_pred)
        }
        Topic::Features => {
            return Err(DecodeError::UnjoinableTopic {
                topic: name.to_string(),
            });
        }
    };

    if !ts.is_finite() {
        return Err(DecodeError::NonFinite {
            topic: name,
            what: "ts",
        });
    }
    if !value.is_finite() {
        return Err(DecodeError::NonFinite {
            topic: name,
            what: field.name(),
        });
    }

    Ok(DecodedField {
        key: CorrelationKey::new(ts),
        field,
        value,
    })
}

pub fn decode_features(payload: &[u8]) -> Result<FeatureMessage, DecodeError> {
    let msg: FeatureMessage =
        serde_json::from_slice(payload).map_err(|source| DecodeError::InvalidJson {
            topic: Topic::FEATURES,
            source,
        })?;

    if !msg.ts.is_finite() {
        return Err(DecodeError::NonFinite {
            topic: Topic::FEATURES,
            what: "ts",
        });
    }
    if msg.features.iter().any(|x| !x.is_finite()) {
        return Err(DecodeError::NonFinite {
            topic: Topic::FEATURES,
            what: "features",
        });
    }
    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truth_payload_decodes_to_truth_field() {
        let decoded = decode_field(Topic::YTrue, br#"{"ts": 100.0, "y_true": 5.0}"#).unwrap();
        assert_eq!(decoded.key, CorrelationKey::new(100.0));
        assert_eq!(decoded.field, Field::Truth);
        assert_eq!(decoded.value, 5.0);
    }

    #[test]
    fn prediction_payload_ignores_extra_keys() {
        let decoded =
            decode_field(Topic::YPred, br#"{"ts": 1.5, "y_pred": 3.25, "model": "lr"}"#).unwrap();
        assert_eq!(decoded.field, Field::Prediction);
        assert_eq!(decoded.value, 3.25);
    }

    #[test]
    fn payload_for_the_other_topic_is_rejected() {
        let err = decode_field(Topic::YPred, br#"{"ts": 1.0, "y_true": 2.0}"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidJson { topic: "y_pred", .. }));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode_field(Topic::YTrue, b"not json").is_err());
        assert!(decode_field(Topic::YTrue, br#"{"ts": "100", "y_true": 1}"#).is_err());
    }

    #[test]
    fn features_topic_is_not_joinable() {
        let err = decode_field(Topic::Features, br#"{"ts": 1.0, "features": []}"#).unwrap_err();
        assert!(matches!(err, DecodeError::UnjoinableTopic { .. }));
    }

    #[test]
    fn feature_vector_decodes() {
        let msg = decode_features(br#"{"ts": 7.0, "features": [0.1, -0.2, 0.3]}"#).unwrap();
        assert_eq!(msg.ts, 7.0);
        assert_eq!(msg.features, vec![0.1, -0.2, 0.3]);
    }
}
