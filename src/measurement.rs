use crate::error::MeasurementError;
use tracing::debug;

/// Result of a successful measurement computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasurementOutcome {
    /// Weight recorded without a volume; density is not computable. This is
    /// a valid outcome, not an error.
    WeightOnly { weight: f64 },
    /// Weight and volume recorded; density is weight / volume.
    Density {
        weight: f64,
        volume: f64,
        density: f64,
    },
}

impl MeasurementOutcome {
    pub fn density(&self) -> Option<f64> {
        match self {
            MeasurementOutcome::WeightOnly { .. } => None,
            MeasurementOutcome::Density { density, .. } => Some(*density),
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            MeasurementOutcome::WeightOnly { weight } => *weight,
            MeasurementOutcome::Density { weight, .. } => *weight,
        }
    }
}

/// Compute density from raw weight and volume text fields.
///
/// Pure function: parses, validates, and divides; no state is touched.
/// The weight field is required and must parse as a finite decimal number.
/// The volume field may be empty (weight-only outcome); when present it
/// must parse as a finite number greater than zero.
pub fn compute(
    weight_text: &str,
    volume_text: &str,
) -> std::result::Result<MeasurementOutcome, MeasurementError> {
    let weight = parse_finite(weight_text)
        .ok_or_else(|| MeasurementError::invalid(format!("weight {:?} is not a number", weight_text)))?;

    let volume_text = volume_text.trim();
    if volume_text.is_empty() {
        debug!("Measurement without volume: weight {}", weight);
        return Ok(MeasurementOutcome::WeightOnly { weight });
    }

    let volume = parse_finite(volume_text)
        .ok_or_else(|| MeasurementError::invalid(format!("volume {:?} is not a number", volume_text)))?;
    if volume <= 0.0 {
        return Err(MeasurementError::invalid(format!(
            "volume must be positive, got {}",
            volume
        )));
    }

    let density = weight / volume;
    debug!(
        "Computed density {} from weight {} / volume {}",
        density, weight, volume
    );
    Ok(MeasurementOutcome::Density {
        weight,
        volume,
        density,
    })
}

fn parse_finite(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Raw measurement input scoped to the currently active entry.
///
/// Holds the text fields as typed plus the last computed outcome. Reset
/// whenever a different entry becomes active; never persisted.
#[derive(Debug, Clone, Default)]
pub struct MeasurementInput {
    pub weight_text: String,
    pub volume_text: String,
    outcome: Option<MeasurementOutcome>,
}

impl MeasurementInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the current text fields and remember the outcome.
    ///
    /// On error the previous outcome is kept; nothing is mutated.
    pub fn compute(&mut self) -> std::result::Result<MeasurementOutcome, MeasurementError> {
        let outcome = compute(&self.weight_text, &self.volume_text)?;
        self.outcome = Some(outcome);
        Ok(outcome)
    }

    pub fn outcome(&self) -> Option<MeasurementOutcome> {
        self.outcome
    }

    /// Clear all fields, for when the active entry changes.
    pub fn reset(&mut self) {
        self.weight_text.clear();
        self.volume_text.clear();
        self.outcome = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_only() {
        let outcome = compute("150", "").unwrap();
        assert_eq!(outcome, MeasurementOutcome::WeightOnly { weight: 150.0 });
        assert!(outcome.density().is_none());
    }

    #[test]
    fn test_density() {
        let outcome = compute("150", "50").unwrap();
        assert_eq!(outcome.density(), Some(3.0));
        assert_eq!(outcome.weight(), 150.0);
    }

    #[test]
    fn test_non_numeric_weight_fails() {
        assert!(compute("abc", "50").is_err());
        assert!(compute("", "50").is_err());
        assert!(compute("", "").is_err());
    }

    #[test]
    fn test_bad_volume_fails() {
        assert!(compute("150", "-5").is_err());
        assert!(compute("150", "0").is_err());
        assert!(compute("150", "fifty").is_err());
    }

    #[test]
    fn test_non_finite_values_fail() {
        // f64 parsing accepts these spellings; the calculator does not
        assert!(compute("NaN", "").is_err());
        assert!(compute("inf", "10").is_err());
        assert!(compute("150", "NaN").is_err());
    }

    #[test]
    fn test_whitespace_is_tolerated() {
        let outcome = compute(" 150 ", " 50 ").unwrap();
        assert_eq!(outcome.density(), Some(3.0));
    }

    #[test]
    fn test_decimal_values() {
        let outcome = compute("7.5", "2.5").unwrap();
        assert_eq!(outcome.density(), Some(3.0));
    }

    #[test]
    fn test_input_reset() {
        let mut input = MeasurementInput::new();
        input.weight_text = "150".to_string();
        input.volume_text = "50".to_string();
        input.compute().unwrap();
        assert!(input.outcome().is_some());

        input.reset();
        assert!(input.outcome().is_none());
        assert!(input.weight_text.is_empty());
        assert!(input.volume_text.is_empty());
    }

    #[test]
    fn test_failed_compute_keeps_previous_outcome() {
        let mut input = MeasurementInput::new();
        input.weight_text = "150".to_string();
        input.compute().unwrap();

        input.weight_text = "abc".to_string();
        assert!(input.compute().is_err());
        assert_eq!(
            input.outcome(),
            Some(MeasurementOutcome::WeightOnly { weight: 150.0 })
        );
    }
}
