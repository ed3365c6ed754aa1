use super::error::OrderingError;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Audio features used as the dimensions of a track's similarity vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Acousticness,
    Danceability,
    Energy,
    Instrumentalness,
    Liveness,
    Loudness,
    Mode,
    Speechiness,
    Valence,
}

impl Feature {
    /// Every feature, in vector order
    pub const ALL: [Feature; 9] = [
        Feature::Acousticness,
        Feature::Danceability,
        Feature::Energy,
        Feature::Instrumentalness,
        Feature::Liveness,
        Feature::Loudness,
        Feature::Mode,
        Feature::Speechiness,
        Feature::Valence,
    ];

    /// Field name used by the catalog's audio-features payload
    pub fn name(self) -> &'static str {
        match self {
            Feature::Acousticness => "acousticness",
            Feature::Danceability => "danceability",
            Feature::Energy => "energy",
            Feature::Instrumentalness => "instrumentalness",
            Feature::Liveness => "liveness",
            Feature::Loudness => "loudness",
            Feature::Mode => "mode",
            Feature::Speechiness => "speechiness",
            Feature::Valence => "valence",
        }
    }
}

impl FromStr for Feature {
    type Err = OrderingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Feature::ALL
            .into_iter()
            .find(|feature| feature.name() == wanted)
            .ok_or_else(|| OrderingError::UnknownFeature(s.trim().to_string()))
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Ordered list of features; position `k` in every normalized vector is `features()[k]`
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    features: Vec<Feature>,
}

impl FeatureSchema {
    /// Build a schema, rejecting empty or duplicated feature lists
    pub fn new(features: Vec<Feature>) -> Result<Self, OrderingError> {
        if features.is_empty() {
            return Err(OrderingError::InvalidSchema(
                "at least one feature is required".to_string(),
            ));
        }
        for (i, feature) in features.iter().enumerate() {
            if features[..i].contains(feature) {
                return Err(OrderingError::InvalidSchema(format!(
                    "feature '{feature}' listed more than once"
                )));
            }
        }
        Ok(Self { features })
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self {
            features: Feature::ALL.to_vec(),
        }
    }
}

/// Raw feature values for one track, as supplied by the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub track: String,
    values: HashMap<Feature, f64>,
}

impl FeatureRecord {
    pub fn new(track: impl Into<String>) -> Self {
        Self {
            track: track.into(),
            values: HashMap::new(),
        }
    }

    /// Builder-style setter, handy when assembling records by hand
    pub fn with(mut self, feature: Feature, value: f64) -> Self {
        self.values.insert(feature, value);
        self
    }

    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.values.get(&feature).copied()
    }

    /// Look up a feature, failing when it is absent or not a finite number
    pub fn require(&self, feature: Feature) -> Result<f64, OrderingError> {
        match self.get(feature) {
            None => Err(OrderingError::MissingFeature {
                track: self.track.clone(),
                feature,
            }),
            Some(value) if !value.is_finite() => Err(OrderingError::NonFiniteFeature {
                track: self.track.clone(),
                feature,
                value,
            }),
            Some(value) => Ok(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema_order() {
        let schema = FeatureSchema::default();
        assert_eq!(schema.len(), 9);
        assert_eq!(schema.features()[0], Feature::Acousticness);
        assert_eq!(schema.features()[8], Feature::Valence);
    }

    #[test]
    fn test_schema_rejects_empty_and_duplicates() {
        assert!(matches!(
            FeatureSchema::new(vec![]),
            Err(OrderingError::InvalidSchema(_))
        ));
        assert!(matches!(
            FeatureSchema::new(vec![Feature::Energy, Feature::Mode, Feature::Energy]),
            Err(OrderingError::InvalidSchema(_))
        ));
        assert!(FeatureSchema::new(vec![Feature::Energy, Feature::Mode]).is_ok());
    }

    #[test]
    fn test_require_reports_track_and_feature() {
        let record = FeatureRecord::new("track-7")
            .with(Feature::Energy, 0.4)
            .with(Feature::Loudness, f64::NAN);

        assert_eq!(record.require(Feature::Energy).unwrap(), 0.4);

        match record.require(Feature::Valence) {
            Err(OrderingError::MissingFeature { track, feature }) => {
                assert_eq!(track, "track-7");
                assert_eq!(feature, Feature::Valence);
            }
            other => panic!("unexpected result: {other:?}"),
        }

        assert!(matches!(
            record.require(Feature::Loudness),
            Err(OrderingError::NonFiniteFeature { feature: Feature::Loudness, .. })
        ));
    }

    #[test]
    fn test_parse_feature_names() {
        assert_eq!("energy".parse::<Feature>(), Ok(Feature::Energy));
        assert_eq!(" Valence ".parse::<Feature>(), Ok(Feature::Valence));
        assert_eq!(
            "tempo".parse::<Feature>(),
            Err(OrderingError::UnknownFeature("tempo".to_string()))
        );
    }

    #[test]
    fn test_feature_names_match_payload_fields() {
        let names: Vec<&str> = Feature::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec![
                "acousticness",
                "danceability",
                "energy",
                "instrumentalness",
                "liveness",
                "loudness",
                "mode",
                "speechiness",
                "valence"
            ]
        );
    }
}
