//! Engine configuration.

use crate::error::{Error, Result};
use crate::formant::{FormantLimits, FormantMethod, PeakPicking};
use crate::response::ResponseScale;

/// Largest LPC order accepted by the engine.
pub const MAX_LPC_ORDER: usize = 64;

/// Analysis configuration for [`FormantEngine`](crate::FormantEngine).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    // LPC
    /// LPC order (default: 14)
    pub lpc_order: usize,

    /// Integer decimation before LPC; 1 disables it (default: 4)
    pub downsample_factor: usize,

    /// Pre-emphasis corner frequency in Hz, applied after decimation
    /// (default: None = off)
    pub pre_emphasis_hz: Option<f64>,

    // Response
    /// Number of response points (default: 1024)
    pub num_points: usize,

    /// Magnitude or power response (default: Magnitude)
    pub scale: ResponseScale,

    // Formants
    /// Formant extraction strategy (default: PoleAngle)
    pub method: FormantMethod,

    /// Acceptance policy for the pole-angle method
    pub limits: FormantLimits,

    /// Policy for the peak-picking method
    pub peak_picking: PeakPicking,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lpc_order: 14,
            downsample_factor: 4,
            pre_emphasis_hz: None,
            num_points: 1024,
            scale: ResponseScale::Magnitude,
            method: FormantMethod::PoleAngle,
            limits: FormantLimits::default(),
            peak_picking: PeakPicking::default(),
        }
    }
}

impl EngineConfig {
    /// Check every parameter that does not depend on the buffer.
    ///
    /// Order versus buffer length is checked per call.
    pub fn validate(&self) -> Result<()> {
        if self.lpc_order == 0 || self.lpc_order > MAX_LPC_ORDER {
            return Err(Error::InvalidParameter(format!(
                "lpc_order must be in 1..={}, got {}",
                MAX_LPC_ORDER, self.lpc_order
            )));
        }
        if self.downsample_factor == 0 {
            return Err(Error::InvalidParameter(
                "downsample_factor must be at least 1".to_string(),
            ));
        }
        if self.num_points == 0 {
            return Err(Error::InvalidParameter(
                "num_points must be at least 1".to_string(),
            ));
        }
        if let Some(hz) = self.pre_emphasis_hz {
            if !(hz.is_finite() && hz > 0.0) {
                return Err(Error::InvalidParameter(format!(
                    "pre_emphasis_hz must be positive, got {}",
                    hz
                )));
            }
        }
        self.limits.validate()?;
        self.peak_picking.validate()
    }

    /// Set the LPC order.
    pub fn with_lpc_order(mut self, order: usize) -> Self {
        self.lpc_order = order;
        self
    }

    /// Set the decimation factor (1 disables it).
    pub fn with_downsample_factor(mut self, factor: usize) -> Self {
        self.downsample_factor = factor;
        self
    }

    /// Set the pre-emphasis corner frequency, or None to disable it.
    pub fn with_pre_emphasis(mut self, from_hz: Option<f64>) -> Self {
        self.pre_emphasis_hz = from_hz;
        self
    }

    /// Set the number of response points.
    pub fn with_num_points(mut self, num_points: usize) -> Self {
        self.num_points = num_points;
        self
    }

    /// Set the response scale.
    pub fn with_scale(mut self, scale: ResponseScale) -> Self {
        self.scale = scale;
        self
    }

    /// Set the formant extraction method.
    pub fn with_method(mut self, method: FormantMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the pole-angle acceptance policy.
    pub fn with_limits(mut self, limits: FormantLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the peak-picking policy.
    pub fn with_peak_picking(mut self, peak_picking: PeakPicking) -> Self {
        self.peak_picking = peak_picking;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.lpc_order, 14);
        assert_eq!(config.downsample_factor, 4);
        assert_eq!(config.num_points, 1024);
        assert_eq!(config.method, FormantMethod::PoleAngle);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::default()
            .with_lpc_order(16)
            .with_downsample_factor(1)
            .with_num_points(512)
            .with_scale(ResponseScale::Power)
            .with_method(FormantMethod::PeakPicking)
            .with_pre_emphasis(Some(50.0));
        assert_eq!(config.lpc_order, 16);
        assert_eq!(config.downsample_factor, 1);
        assert_eq!(config.num_points, 512);
        assert_eq!(config.scale, ResponseScale::Power);
        assert_eq!(config.pre_emphasis_hz, Some(50.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        let bad = [
            EngineConfig::default().with_lpc_order(0),
            EngineConfig::default().with_lpc_order(MAX_LPC_ORDER + 1),
            EngineConfig::default().with_downsample_factor(0),
            EngineConfig::default().with_num_points(0),
            EngineConfig::default().with_pre_emphasis(Some(-1.0)),
            EngineConfig::default().with_limits(FormantLimits {
                max_bandwidth_hz: 0.0,
                ..FormantLimits::default()
            }),
            EngineConfig::default().with_peak_picking(PeakPicking {
                max_formants: 0,
                ..PeakPicking::default()
            }),
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(Error::InvalidParameter(_))),
                "{config:?}"
            );
        }
    }
}
