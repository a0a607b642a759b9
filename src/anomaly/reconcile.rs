use super::{AnomalyFlag, FlagTarget};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which detectors agreed on a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    BothMethods,
    ZScoreOnly,
    ModelOnly,
}

/// One reconciled anomaly, carrying each method's own score through
/// unchanged. Reconciliation is presentation-layer merging, not re-scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedFlag {
    pub target: FlagTarget,
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zscore: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_score: Option<f64>,
}

/// Union of the anomalous flags from both detectors, keyed by target
/// identity and ordered by target key. Neither method's findings are ever
/// dropped.
pub fn reconcile(zscore_flags: &[AnomalyFlag], model_flags: &[AnomalyFlag]) -> Vec<CombinedFlag> {
    let mut merged: BTreeMap<FlagTarget, CombinedFlag> = BTreeMap::new();

    for flag in zscore_flags.iter().filter(|flag| flag.is_anomalous) {
        merged
            .entry(flag.target)
            .or_insert_with(|| CombinedFlag {
                target: flag.target,
                provenance: Provenance::ZScoreOnly,
                zscore: None,
                model_score: None,
            })
            .zscore = Some(flag.score);
    }

    for flag in model_flags.iter().filter(|flag| flag.is_anomalous) {
        let entry = merged.entry(flag.target).or_insert_with(|| CombinedFlag {
            target: flag.target,
            provenance: Provenance::ModelOnly,
            zscore: None,
            model_score: None,
        });
        entry.model_score = Some(flag.score);
        if entry.zscore.is_some() {
            entry.provenance = Provenance::BothMethods;
        }
    }

    merged.into_values().collect()
}
