use super::error::OrderingError;
use super::features::{Feature, FeatureRecord, FeatureSchema};
use log::debug;

/// A track's features rescaled into the unit interval, in schema order
pub type NormalizedVector = Vec<f64>;

/// Observed bounds of one feature across the whole track set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureRange {
    pub feature: Feature,
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    /// True when every track shares the same value for this feature
    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }

    /// Min-max rescale `value`; a degenerate range maps everything to 0.0
    pub fn normalize(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        (value - self.min) / (self.max - self.min)
    }
}

/// Min-max feature normalization over a fixed track set
pub struct FeatureNormalizer;

impl FeatureNormalizer {
    /// Compute one range per schema feature in a single pass over the records
    pub fn compute_ranges(
        records: &[FeatureRecord],
        schema: &FeatureSchema,
    ) -> Result<Vec<FeatureRange>, OrderingError> {
        if records.is_empty() {
            return Err(OrderingError::EmptyInput);
        }

        let mut ranges: Vec<FeatureRange> = schema
            .features()
            .iter()
            .map(|&feature| FeatureRange {
                feature,
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            })
            .collect();

        for record in records {
            for range in ranges.iter_mut() {
                let value = record.require(range.feature)?;
                range.min = range.min.min(value);
                range.max = range.max.max(value);
            }
        }

        for range in &ranges {
            if range.is_degenerate() {
                debug!(
                    "Feature '{}' is constant ({}) across all tracks, normalizing to 0.0",
                    range.feature, range.min
                );
            } else {
                debug!(
                    "Feature '{}' range: {:.4} - {:.4}",
                    range.feature, range.min, range.max
                );
            }
        }

        Ok(ranges)
    }

    /// Map every record onto a unit-interval vector using precomputed ranges
    pub fn normalize(
        records: &[FeatureRecord],
        ranges: &[FeatureRange],
    ) -> Result<Vec<NormalizedVector>, OrderingError> {
        records
            .iter()
            .map(|record| {
                ranges
                    .iter()
                    .map(|range| {
                        record
                            .require(range.feature)
                            .map(|value| range.normalize(value))
                    })
                    .collect::<Result<NormalizedVector, OrderingError>>()
            })
            .collect()
    }

    /// Ranges and vectors in one call
    pub fn normalize_all(
        records: &[FeatureRecord],
        schema: &FeatureSchema,
    ) -> Result<Vec<NormalizedVector>, OrderingError> {
        let ranges = Self::compute_ranges(records, schema)?;
        Self::normalize(records, &ranges)
    }
}
