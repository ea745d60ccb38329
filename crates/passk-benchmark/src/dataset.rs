use std::io::{BufRead, BufReader};
use std::path::Path;

use passk_core::{HumanEvalRecord, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Down-sampling plan for a benchmark run. `frac` takes precedence over `n`;
/// with neither set the full record set is kept.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SamplePlan {
    #[serde(default)]
    pub n: Option<usize>,
    #[serde(default)]
    pub frac: Option<f64>,
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_shuffle() -> bool {
    true
}

fn default_seed() -> u64 {
    42
}

impl Default for SamplePlan {
    fn default() -> Self {
        Self {
            n: None,
            frac: None,
            shuffle: default_shuffle(),
            seed: default_seed(),
        }
    }
}

/// Load HumanEval records from a line-delimited JSON file. Blank lines are
/// skipped; a malformed line is a hard error.
pub fn load_records(path: &Path) -> Result<Vec<HumanEvalRecord>> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

/// Apply a [`SamplePlan`]: seeded shuffle, then truncate to the requested
/// count or fraction (at least one record when a fraction is given).
pub fn sample_records(
    mut records: Vec<HumanEvalRecord>,
    plan: &SamplePlan,
) -> Vec<HumanEvalRecord> {
    if plan.shuffle {
        let mut rng = StdRng::seed_from_u64(plan.seed);
        records.shuffle(&mut rng);
    }

    let keep = match (plan.frac, plan.n) {
        (Some(frac), _) => ((frac * records.len() as f64) as usize).max(1),
        (None, Some(n)) => n,
        (None, None) => records.len(),
    };
    records.truncate(keep.min(records.len()));
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record(task_id: &str) -> HumanEvalRecord {
        HumanEvalRecord {
            task_id: task_id.to_string(),
            prompt: format!("def f_{task_id}():\n    pass\n"),
            entry_point: format!("f_{task_id}"),
            canonical_solution: "    return None\n".to_string(),
            test: "def check(candidate): pass".to_string(),
        }
    }

    #[test]
    fn loads_jsonl_and_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", serde_json::to_string(&record("0")).unwrap()).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{}", serde_json::to_string(&record("1")).unwrap()).unwrap();

        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].task_id, "1");
    }

    #[test]
    fn seeded_shuffle_is_deterministic() {
        let records: Vec<_> = (0..20).map(|i| record(&i.to_string())).collect();
        let plan = SamplePlan {
            n: Some(5),
            ..SamplePlan::default()
        };
        let a = sample_records(records.clone(), &plan);
        let b = sample_records(records, &plan);
        let ids = |rs: &[HumanEvalRecord]| rs.iter().map(|r| r.task_id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn frac_takes_precedence_and_keeps_at_least_one() {
        let records: Vec<_> = (0..10).map(|i| record(&i.to_string())).collect();
        let plan = SamplePlan {
            n: Some(9),
            frac: Some(0.01),
            shuffle: false,
            seed: 42,
        };
        assert_eq!(sample_records(records, &plan).len(), 1);
    }

    #[test]
    fn no_plan_keeps_everything_in_order() {
        let records: Vec<_> = (0..4).map(|i| record(&i.to_string())).collect();
        let plan = SamplePlan {
            shuffle: false,
            ..SamplePlan::default()
        };
        let kept = sample_records(records, &plan);
        assert_eq!(kept.len(), 4);
        assert_eq!(kept[0].task_id, "0");
    }
}
