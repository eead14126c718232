use serde::Deserialize;

use crate::error::ScrubError;

/// Options for scrubbing a GPX document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrubOptions {
    /// Largest allowed distance between a point and the last kept point, in meters.
    pub max_dist: f64,
}

impl ScrubOptions {
    pub fn new(max_dist: f64) -> Self {
        Self { max_dist }
    }

    /// Parse the threshold as given on the command line.
    pub fn from_arg(max_dist: &str) -> Result<Self, ScrubError> {
        let value = max_dist
            .trim()
            .parse::<f64>()
            .map_err(|_| ScrubError::InvalidThreshold(max_dist.to_string()))?;
        let opts = Self::new(value);
        opts.validate()?;
        Ok(opts)
    }

    /// The threshold must be a finite, non-negative number of meters.
    pub fn validate(&self) -> Result<(), ScrubError> {
        if self.max_dist.is_finite() && self.max_dist >= 0.0 {
            Ok(())
        } else {
            Err(ScrubError::InvalidThreshold(self.max_dist.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_arg() {
        assert_eq!(ScrubOptions::from_arg("50").unwrap().max_dist, 50.0);
        assert_eq!(ScrubOptions::from_arg(" 12.5 ").unwrap().max_dist, 12.5);
        assert_eq!(ScrubOptions::from_arg("0").unwrap().max_dist, 0.0);
    }

    #[test]
    fn test_from_arg_rejects_bad_thresholds() {
        for arg in ["-1", "fifty", "", "NaN", "inf", "-0.001"] {
            assert!(
                matches!(
                    ScrubOptions::from_arg(arg),
                    Err(ScrubError::InvalidThreshold(_))
                ),
                "accepted {arg:?}"
            );
        }
    }

    #[test]
    fn test_deserialize_camel_case() {
        let opts: ScrubOptions = serde_json::from_str(r#"{"maxDist": 25.0}"#).unwrap();
        assert_eq!(opts, ScrubOptions::new(25.0));
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_deserialize_requires_max_dist() {
        assert!(serde_json::from_str::<ScrubOptions>("{}").is_err());
    }

    #[test]
    fn test_validate_negative() {
        assert!(ScrubOptions::new(-3.0).validate().is_err());
        assert!(ScrubOptions::new(f64::NAN).validate().is_err());
    }
}
