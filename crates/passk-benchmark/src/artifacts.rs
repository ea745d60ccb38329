use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use passk_core::{CompletionRecord, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Paths and summary stats of a samples/problems split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitArtifacts {
    pub samples_path: PathBuf,
    pub problems_path: PathBuf,
    pub attempted: u32,
    pub compile_rate: f64,
    pub avg_len: f64,
    pub median_len: u64,
}

/// Write the combined run artifact: one JSON object per task carrying the
/// source record plus `raw_text` and `completion`.
pub fn write_combined(records: &[CompletionRecord], out_path: &Path) -> Result<()> {
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(fs::File::create(out_path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a combined artifact back.
pub fn read_combined(path: &Path) -> Result<Vec<CompletionRecord>> {
    let reader = BufReader::new(fs::File::open(path)?);
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

/// Split a combined artifact into the two files the external
/// functional-correctness scorer consumes: `samples_<tag>.jsonl` with
/// `(task_id, completion)` pairs and `problems_<tag>.jsonl` with the task
/// definitions. Returns the paths plus compile-rate and body-length stats.
pub fn split_combined(combined_path: &Path, out_dir: &Path, tag: &str) -> Result<SplitArtifacts> {
    fs::create_dir_all(out_dir)?;
    let samples_path = out_dir.join(format!("samples_{tag}.jsonl"));
    let problems_path = out_dir.join(format!("problems_{tag}.jsonl"));

    let records = read_combined(combined_path)?;

    let mut samples = BufWriter::new(fs::File::create(&samples_path)?);
    let mut problems = BufWriter::new(fs::File::create(&problems_path)?);
    let mut lengths: Vec<u64> = Vec::with_capacity(records.len());
    let mut compiled = 0u32;

    for record in &records {
        lengths.push(record.completion.trim().len() as u64);
        if record.compiled {
            compiled += 1;
        }

        serde_json::to_writer(
            &mut samples,
            &json!({
                "task_id": record.task_id,
                "completion": record.completion,
            }),
        )?;
        samples.write_all(b"\n")?;

        serde_json::to_writer(
            &mut problems,
            &json!({
                "task_id": record.task_id,
                "prompt": record.prompt,
                "entry_point": record.entry_point,
                "canonical_solution": record.canonical_solution,
                "test": record.test,
            }),
        )?;
        problems.write_all(b"\n")?;
    }
    samples.flush()?;
    problems.flush()?;

    let attempted = records.len() as u32;
    lengths.sort_unstable();
    Ok(SplitArtifacts {
        samples_path,
        problems_path,
        attempted,
        compile_rate: match attempted {
            0 => 0.0,
            _ => compiled as f64 / attempted as f64,
        },
        avg_len: match lengths.is_empty() {
            true => 0.0,
            false => lengths.iter().sum::<u64>() as f64 / lengths.len() as f64,
        },
        median_len: match lengths.is_empty() {
            true => 0,
            false => lengths[lengths.len() / 2],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(task_id: &str, completion: &str, compiled: bool) -> CompletionRecord {
        CompletionRecord {
            task_id: task_id.to_string(),
            prompt: "def f():\n".to_string(),
            entry_point: "f".to_string(),
            canonical_solution: "    return None\n".to_string(),
            test: "def check(candidate): pass".to_string(),
            raw_text: format!("<sol>\n{completion}\n</sol>"),
            completion: completion.to_string(),
            compiled,
        }
    }

    #[test]
    fn combined_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/combined.jsonl");
        let records = [record("t/0", "    return 1", true)];

        write_combined(&records, &path).unwrap();
        let back = read_combined(&path).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].task_id, "t/0");
        assert_eq!(back[0].completion, "    return 1");
        assert!(back[0].compiled);
    }

    #[test]
    fn split_writes_both_files_and_stats() {
        let dir = tempfile::tempdir().unwrap();
        let combined = dir.path().join("combined.jsonl");
        let records = [
            record("t/0", "    return 1", true),
            record("t/1", "    return 22", false),
        ];
        write_combined(&records, &combined).unwrap();

        let split = split_combined(&combined, dir.path(), "test").unwrap();
        assert_eq!(split.attempted, 2);
        assert!((split.compile_rate - 0.5).abs() < f64::EPSILON);

        let samples = fs::read_to_string(&split.samples_path).unwrap();
        assert_eq!(samples.lines().count(), 2);
        let first: serde_json::Value = serde_json::from_str(samples.lines().next().unwrap()).unwrap();
        assert_eq!(first["task_id"], "t/0");
        assert_eq!(first["completion"], "    return 1");
        assert!(first.get("prompt").is_none());

        let problems = fs::read_to_string(&split.problems_path).unwrap();
        let first: serde_json::Value =
            serde_json::from_str(problems.lines().next().unwrap()).unwrap();
        assert_eq!(first["prompt"], "def f():\n");
        assert!(first.get("completion").is_none());
    }

    #[test]
    fn empty_combined_yields_zeroed_stats() {
        let dir = tempfile::tempdir().unwrap();
        let combined = dir.path().join("combined.jsonl");
        write_combined(&[], &combined).unwrap();

        let split = split_combined(&combined, dir.path(), "empty").unwrap();
        assert_eq!(split.attempted, 0);
        assert_eq!(split.compile_rate, 0.0);
        assert_eq!(split.median_len, 0);
    }
}
