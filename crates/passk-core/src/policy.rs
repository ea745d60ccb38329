use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PasskError;

/// Normalization fallback-chain variant applied to raw model output.
///
/// Passed explicitly to every `normalize` call; there is no process-wide
/// current version. Callers that want "set once per run" keep the policy in
/// their [`EvalConfig`](crate::EvalConfig).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizePolicy {
    /// Minimal: strip code fences only.
    V1,
    /// Standard: `<sol>` tags, else last fenced block, else fence stripping.
    #[default]
    V2,
    /// Aggressive: like v2, but a tag/fence miss keeps the full raw text and
    /// runs the v2 chain over it once more.
    V3,
}

impl NormalizePolicy {
    pub fn label(&self) -> &'static str {
        match self {
            NormalizePolicy::V1 => "v1",
            NormalizePolicy::V2 => "v2",
            NormalizePolicy::V3 => "v3",
        }
    }

    pub fn all() -> &'static [NormalizePolicy] {
        &[NormalizePolicy::V1, NormalizePolicy::V2, NormalizePolicy::V3]
    }
}

impl fmt::Display for NormalizePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NormalizePolicy {
    type Err = PasskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" => Ok(NormalizePolicy::V1),
            "v2" => Ok(NormalizePolicy::V2),
            "v3" => Ok(NormalizePolicy::V3),
            other => Err(PasskError::Config(format!(
                "Unsupported normalize policy: {other} (expected v1, v2 or v3)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_versions() {
        assert_eq!("v1".parse::<NormalizePolicy>().unwrap(), NormalizePolicy::V1);
        assert_eq!("v2".parse::<NormalizePolicy>().unwrap(), NormalizePolicy::V2);
        assert_eq!("v3".parse::<NormalizePolicy>().unwrap(), NormalizePolicy::V3);
    }

    #[test]
    fn unknown_version_is_a_config_error() {
        let err = "v4".parse::<NormalizePolicy>().unwrap_err();
        assert!(matches!(err, PasskError::Config(_)));
    }

    #[test]
    fn default_is_v2() {
        assert_eq!(NormalizePolicy::default(), NormalizePolicy::V2);
    }
}
