//! Suite identity.

use sha2::{Digest, Sha256};
use simcheck_core::{AutotestSuite, EngineConfig};

/// Deterministic digest of the ordered case definitions and tolerances.
///
/// Two reports with the same digest were produced from the same definitions
/// under the same configuration.
pub fn suite_digest(suite: &AutotestSuite, config: &EngineConfig) -> String {
    let mut hasher = Sha256::new();

    for case in &suite.qualitative {
        hasher.update(b"qual\0");
        hasher.update(case.experiment_id.as_bytes());
        hasher.update(b"\0");
        for condition in &case.conditions {
            hasher.update(condition.to_string().as_bytes());
        }
        hasher.update(b"\0");
        if let Some(linkage) = &case.linkage {
            hasher.update(linkage.to_string().as_bytes());
        }
        hasher.update(b"\0");
    }

    for case in &suite.quantitative {
        hasher.update(b"quant\0");
        hasher.update(case.experiment_id.as_bytes());
        hasher.update(b"\0");
        for (year, effect) in &case.expected_effects {
            hasher.update(year.to_le_bytes());
            hasher.update(effect.to_le_bytes());
        }
        hasher.update(b"\0");
    }

    hasher.update(config.trend_permissible_error.to_le_bytes());
    hasher.update(config.relative_error.to_le_bytes());
    for year in &config.years_of_interest {
        hasher.update(year.to_le_bytes());
    }

    hex::encode(hasher.finalize())
}
