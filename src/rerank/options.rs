//! Settings for reproducible KwikSort runs.

use serde::{Deserialize, Serialize};

use crate::pivot::PivotSpec;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RerankOptions {
    /// Pivot strategy; seeded random by default.
    #[serde(default)]
    pub pivot: PivotSpec,
    /// Evaluate the full preference matrix once and partition by lookup.
    #[serde(default)]
    pub precompute_matrix: bool,
}

impl RerankOptions {
    pub fn with_pivot(pivot: PivotSpec) -> Self {
        Self {
            pivot,
            ..Self::default()
        }
    }

    pub fn precomputed(mut self) -> Self {
        self.precompute_matrix = true;
        self
    }
}
