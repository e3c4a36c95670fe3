//! Tunables for one analysis run. Defaults reproduce the stock heuristics.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Max character gap between a device or charge and the phone number it
    /// is attached to by proximity
    pub proximity_window: usize,
    /// How far before a device mention to look for a plan name
    pub plan_scan_before: usize,
    /// How far after a device mention to look for a plan name
    pub plan_scan_after: usize,
    /// Largest |declared - calculated| still reported as a match
    pub subtotal_tolerance: f64,
    /// Installment correction only fires above this amount
    pub installment_correction_threshold: f64,
    /// Run the three extraction passes on the rayon pool
    pub parallel_passes: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            proximity_window: 200,
            plan_scan_before: 100,
            plan_scan_after: 200,
            subtotal_tolerance: 0.01,
            installment_correction_threshold: 100.0,
            parallel_passes: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg: AnalysisConfig = serde_json::from_str(r#"{"proximity_window": 120}"#).unwrap();
        assert_eq!(cfg.proximity_window, 120);
        assert_eq!(cfg.subtotal_tolerance, 0.01);
        assert!(!cfg.parallel_passes);
    }
}
