use serde::{Deserialize, Serialize};

use crate::policy::NormalizePolicy;
use crate::types::GenParams;

fn default_n_samples() -> u32 {
    1
}

fn default_concurrency() -> usize {
    8
}

fn default_compile_check() -> bool {
    true
}

/// One evaluation run over a set of benchmark records.
///
/// The normalize policy lives here so it is chosen once per run and then
/// threaded explicitly through every call; concurrent fan-out never touches
/// shared policy state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvalConfig {
    pub model_id: String,
    #[serde(default)]
    pub policy: NormalizePolicy,
    /// Independent completions sampled per task before reduction.
    #[serde(default = "default_n_samples")]
    pub n_samples: u32,
    #[serde(default)]
    pub gen: GenParams,
    /// In-flight completion requests per task.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// One self-repair round when the reduced winner does not compile.
    #[serde(default)]
    pub repair: bool,
    /// Compile-check each candidate body (requires python3 on PATH).
    #[serde(default = "default_compile_check")]
    pub compile_check: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            model_id: String::new(),
            policy: NormalizePolicy::default(),
            n_samples: default_n_samples(),
            gen: GenParams::default(),
            concurrency: default_concurrency(),
            repair: false,
            compile_check: default_compile_check(),
        }
    }
}
