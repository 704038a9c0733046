//! Evolver configuration.
//!
//! Loaded from JSON, with defaults for everything but the labels:
//!
//! ```rust
//! use bgm_dynamics::config::EvolverConfig;
//!
//! let config = EvolverConfig::from_json(
//!     r#"{ "labels": { "funding": "USD.SOFR", "forward": "USD.LIBOR3M" }, "tenor_count": 8 }"#,
//! )
//! .unwrap();
//! assert_eq!(config.forward_tenor.to_string(), "3M");
//! assert!(config.spline.calibrate);
//! ```

use bgm_core::{DayCountConvention, EvolutionLabels, Tenor};
use bgm_math::finite_difference::{DifferenceScheme, FiniteDifference, DEFAULT_STEP};
use bgm_math::spline::{BoundaryCondition, SegmentBasis, SplineFitRequest};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult, ValidationError};

/// Largest ladder the evolver accepts.
pub const MAX_TENOR_COUNT: usize = 1200;

/// Trait for validatable configurations.
pub trait Validate {
    /// Validates the configuration.
    ///
    /// Returns a list of validation errors, or an empty vector if valid.
    fn validate(&self) -> Vec<ValidationError>;

    /// Returns true if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Validates and returns an error if invalid.
    fn validate_or_error(&self) -> ConfigResult<()> {
        let mut errors = self.validate();
        match errors.len() {
            0 => Ok(()),
            1 => {
                let err = errors.remove(0);
                Err(ConfigError::Validation {
                    field: err.field,
                    message: err.message,
                })
            }
            _ => Err(ConfigError::MultipleValidationErrors(errors)),
        }
    }
}

// =============================================================================
// EVOLVER CONFIGURATION
// =============================================================================

/// Configuration of [`CurveStateEvolver`](crate::evolver::CurveStateEvolver)
/// and the point evolvers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolverConfig {
    /// Funding and forward curve labels of the evolved curve.
    pub labels: EvolutionLabels,

    /// Spacing of the ladder nodes.
    #[serde(default = "default_forward_tenor")]
    pub forward_tenor: Tenor,

    /// Number of ladder nodes.
    #[serde(default = "default_tenor_count")]
    pub tenor_count: usize,

    /// Refit controls.
    #[serde(default)]
    pub spline: SplineConfig,

    /// Differentiation controls.
    #[serde(default)]
    pub finite_difference: DifferenceConfig,

    /// Day count for accruals and spot-rate year fractions.
    #[serde(default = "default_day_count")]
    pub day_count: DayCountConvention,
}

fn default_forward_tenor() -> Tenor {
    Tenor::THREE_MONTHS
}

fn default_tenor_count() -> usize {
    40
}

fn default_day_count() -> DayCountConvention {
    DayCountConvention::Act360
}

fn default_true() -> bool {
    true
}

fn default_step() -> f64 {
    DEFAULT_STEP
}

impl EvolverConfig {
    /// Creates a configuration with default controls.
    pub fn new(labels: EvolutionLabels) -> Self {
        Self {
            labels,
            forward_tenor: default_forward_tenor(),
            tenor_count: default_tenor_count(),
            spline: SplineConfig::default(),
            finite_difference: DifferenceConfig::default(),
            day_count: default_day_count(),
        }
    }

    /// Sets the ladder spacing.
    #[must_use]
    pub fn with_forward_tenor(mut self, tenor: Tenor) -> Self {
        self.forward_tenor = tenor;
        self
    }

    /// Sets the number of ladder nodes.
    #[must_use]
    pub fn with_tenor_count(mut self, count: usize) -> Self {
        self.tenor_count = count;
        self
    }

    /// Sets the refit controls.
    #[must_use]
    pub fn with_spline(mut self, spline: SplineConfig) -> Self {
        self.spline = spline;
        self
    }

    /// Sets the differentiation controls.
    #[must_use]
    pub fn with_finite_difference(mut self, finite_difference: DifferenceConfig) -> Self {
        self.finite_difference = finite_difference;
        self
    }

    /// Sets the day count.
    #[must_use]
    pub fn with_day_count(mut self, day_count: DayCountConvention) -> Self {
        self.day_count = day_count;
        self
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate_or_error()?;
        Ok(config)
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Validate for EvolverConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.tenor_count == 0 || self.tenor_count > MAX_TENOR_COUNT {
            errors.push(ValidationError::with_rule(
                "tenor_count",
                format!("Tenor count must be between 1 and {MAX_TENOR_COUNT}"),
                "valid_tenor_count",
            ));
        }

        for error in self.spline.validate() {
            errors.push(ValidationError::new(
                format!("spline.{}", error.field),
                error.message,
            ));
        }

        for error in self.finite_difference.validate() {
            errors.push(ValidationError::new(
                format!("finite_difference.{}", error.field),
                error.message,
            ));
        }

        errors
    }
}

// =============================================================================
// SPLINE CONFIGURATION
// =============================================================================

/// Controls passed to every refit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplineConfig {
    /// End conditions.
    #[serde(default)]
    pub boundary: BoundaryCondition,

    /// Global C2 solve (`true`) or local C1 fit (`false`).
    #[serde(default = "default_true")]
    pub calibrate: bool,

    /// Segment basis used for every segment.
    #[serde(default)]
    pub basis: SegmentBasis,
}

impl Default for SplineConfig {
    fn default() -> Self {
        Self {
            boundary: BoundaryCondition::Natural,
            calibrate: true,
            basis: SegmentBasis::Cubic,
        }
    }
}

impl SplineConfig {
    /// Builds a fit request for one quantity.
    pub fn request(
        &self,
        name: impl Into<String>,
        xs: Vec<f64>,
        values: Vec<f64>,
    ) -> SplineFitRequest {
        SplineFitRequest::new(name, xs, values)
            .with_basis(self.basis)
            .with_boundary(self.boundary)
            .with_calibration(self.calibrate)
    }
}

impl Validate for SplineConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if let BoundaryCondition::Clamped {
            start_slope,
            end_slope,
        } = self.boundary
        {
            if !(start_slope.is_finite() && end_slope.is_finite()) {
                errors.push(ValidationError::with_rule(
                    "boundary",
                    "Clamped end slopes must be finite",
                    "finite_slopes",
                ));
            }
        }
        errors
    }
}

// =============================================================================
// FINITE-DIFFERENCE CONFIGURATION
// =============================================================================

/// Scheme and step for every time derivative taken by the evolvers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifferenceConfig {
    /// Difference scheme.
    #[serde(default)]
    pub scheme: DifferenceScheme,

    /// Step in years.
    #[serde(default = "default_step")]
    pub step: f64,
}

impl Default for DifferenceConfig {
    fn default() -> Self {
        Self {
            scheme: DifferenceScheme::Central,
            step: DEFAULT_STEP,
        }
    }
}

impl DifferenceConfig {
    /// The differentiator these controls describe.
    pub fn differentiator(&self) -> FiniteDifference {
        FiniteDifference::new(self.scheme, self.step)
    }
}

impl Validate for DifferenceConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        // 0.02y is roughly one week
        if !(self.step.is_finite() && self.step > 0.0 && self.step < 0.02) {
            errors.push(ValidationError::with_rule(
                "step",
                "Step must be positive and below 0.02 years",
                "valid_step",
            ));
        }
        errors
    }
}
