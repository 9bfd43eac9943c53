//! Built-in rule sets for the supported products.

use crate::engine::QualityFilterEngine;
use crate::rules::QualityRule;

/// MOD13A1 VI Quality policy: good or checked VI, usable, low or average
/// aerosol, no adjacent or mixed clouds, no shadow.
pub fn vegetation_index_rules() -> Vec<QualityRule> {
    vec![
        QualityRule::one_of(
            "MODLAND",
            &["VI produced with good quality", "VI produced, but check other QA"],
        ),
        QualityRule::none_of(
            "VI Usefulness",
            &[
                "Lowest quality",
                "Quality so low that it is not useful",
                "L1B data faulty",
                "Not useful for any other reason/not processed",
            ],
        ),
        QualityRule::one_of("Aerosol Quantity", &["Low", "Average"]),
        QualityRule::equals("Adjacent cloud detected", "No"),
        QualityRule::equals("Mixed Clouds", "No"),
        QualityRule::equals("Possible shadow", "No"),
    ]
}

/// MCD64A1 QA policy: valid data over a full mapping period, relabeled by
/// the grid cell algorithm, and not unburned for lack of observations.
pub fn burn_area_rules() -> Vec<QualityRule> {
    vec![
        QualityRule::is_true("Valid data"),
        QualityRule::is_false("Shortened mapping period"),
        QualityRule::none_of(
            "Special circumstances unburned",
            &[
                "Too few training observations or insufficient spectral separability between burned and unburned classes",
                "Valid observations spaced too sparsely in time",
            ],
        ),
        QualityRule::is_true("Grid cell relabeled algorithm"),
    ]
}

impl QualityFilterEngine {
    pub fn vegetation_index() -> Self {
        Self::new(vegetation_index_rules())
    }

    pub fn burn_area() -> Self {
        Self::new(burn_area_rules())
    }
}
