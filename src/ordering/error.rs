use super::features::Feature;
use thiserror::Error;

/// Input contract violations detected by the ordering core
#[derive(Debug, Error, PartialEq)]
pub enum OrderingError {
    #[error("No tracks to order")]
    EmptyInput,

    #[error("Track '{track}' has no value for feature '{feature}'")]
    MissingFeature { track: String, feature: Feature },

    #[error("Track '{track}' has a non-finite value ({value}) for feature '{feature}'")]
    NonFiniteFeature {
        track: String,
        feature: Feature,
        value: f64,
    },

    #[error("Unknown audio feature '{0}'")]
    UnknownFeature(String),

    #[error("Invalid feature schema: {0}")]
    InvalidSchema(String),
}
