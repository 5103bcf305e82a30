//! Numeric tolerances.
//!
//! [`ComparisonSettings`] is the on-disk model; [`ToleranceSpec`] is the
//! validated, immutable form shared read-only by every comparison. Override
//! patterns are parsed once here, so a malformed pattern fails at startup and
//! never at diff time.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::path::{split_path, PathPattern, Specificity};

/// Two numbers further apart than this are different unless overridden.
pub const DEFAULT_NUMERIC_TOLERANCE: f64 = 1.0e-6;

fn default_numeric_tolerance() -> f64 {
    DEFAULT_NUMERIC_TOLERANCE
}

/// Settings file for comparisons.
///
/// Overrides keep their declaration order, which breaks specificity ties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComparisonSettings {
    /// Absolute tolerance applied where no override matches.
    #[serde(default = "default_numeric_tolerance")]
    pub default_numeric_tolerance: f64,

    /// Path pattern -> absolute tolerance.
    #[serde(default)]
    pub numeric_tolerance_overrides: IndexMap<String, f64>,
}

impl Default for ComparisonSettings {
    fn default() -> Self {
        Self {
            default_numeric_tolerance: DEFAULT_NUMERIC_TOLERANCE,
            numeric_tolerance_overrides: IndexMap::new(),
        }
    }
}

/// One validated override.
#[derive(Clone, Debug, PartialEq)]
pub struct ToleranceOverride {
    pub pattern: PathPattern,
    pub tolerance: f64,
}

/// Validated tolerance configuration.
///
/// Resolution picks the most specific matching override (see
/// [`Specificity`]); among equally specific matches the one declared first
/// wins; with no match the default applies. Values are equal when
/// `|a - b| <= tolerance`, so the boundary itself counts as equal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ComparisonSettings", into = "ComparisonSettings")]
pub struct ToleranceSpec {
    default_tolerance: f64,
    overrides: Vec<ToleranceOverride>,
}

fn check_tolerance(scope: &str, value: f64) -> ConfigResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidTolerance {
            scope: scope.to_string(),
            value,
        })
    }
}

impl ToleranceSpec {
    pub fn new(default_tolerance: f64) -> ConfigResult<Self> {
        Ok(Self {
            default_tolerance: check_tolerance("default", default_tolerance)?,
            overrides: Vec::new(),
        })
    }

    /// Append an override; later overrides lose specificity ties.
    pub fn with_override(mut self, pattern: &str, tolerance: f64) -> ConfigResult<Self> {
        let pattern = PathPattern::parse(pattern)?;
        let tolerance = check_tolerance(pattern.as_str(), tolerance)?;
        self.overrides.push(ToleranceOverride { pattern, tolerance });
        Ok(self)
    }

    pub fn from_settings(settings: &ComparisonSettings) -> ConfigResult<Self> {
        let mut spec = Self::new(settings.default_numeric_tolerance)?;
        for (pattern, tolerance) in &settings.numeric_tolerance_overrides {
            spec = spec.with_override(pattern, *tolerance)?;
        }
        Ok(spec)
    }

    pub fn to_settings(&self) -> ComparisonSettings {
        ComparisonSettings {
            default_numeric_tolerance: self.default_tolerance,
            numeric_tolerance_overrides: self
                .overrides
                .iter()
                .map(|o| (o.pattern.as_str().to_string(), o.tolerance))
                .collect(),
        }
    }

    pub fn default_tolerance(&self) -> f64 {
        self.default_tolerance
    }

    pub fn overrides(&self) -> &[ToleranceOverride] {
        &self.overrides
    }

    /// Effective tolerance for a concrete path given as segments.
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> f64 {
        let mut best: Option<(Specificity, f64)> = None;
        for candidate in &self.overrides {
            if !candidate.pattern.matches(path) {
                continue;
            }
            let specificity = candidate.pattern.specificity();
            match best {
                Some((current, _)) if current >= specificity => {}
                _ => best = Some((specificity, candidate.tolerance)),
            }
        }
        best.map_or(self.default_tolerance, |(_, tolerance)| tolerance)
    }

    /// Effective tolerance for a concrete path string.
    pub fn resolve_path(&self, path: &str) -> f64 {
        self.resolve(&split_path(path))
    }

    /// Whether two numbers at `path` are equal under this spec.
    pub fn within<S: AsRef<str>>(&self, path: &[S], a: f64, b: f64) -> bool {
        (a - b).abs() <= self.resolve(path)
    }
}

impl Default for ToleranceSpec {
    fn default() -> Self {
        Self {
            default_tolerance: DEFAULT_NUMERIC_TOLERANCE,
            overrides: Vec::new(),
        }
    }
}

impl TryFrom<ComparisonSettings> for ToleranceSpec {
    type Error = ConfigError;

    fn try_from(settings: ComparisonSettings) -> Result<Self, Self::Error> {
        Self::from_settings(&settings)
    }
}

impl From<ToleranceSpec> for ComparisonSettings {
    fn from(spec: ToleranceSpec) -> Self {
        spec.to_settings()
    }
}
