use futures::stream::{self, StreamExt};
use passk_client::TextCompleter;
use passk_core::{
    Candidate, CompletionRecord, EvalConfig, HumanEvalRecord, Result, PLACEHOLDER_BODY,
};
use passk_postprocess::{attempt_repair, extract_stub, normalize, reduce};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::compile::CompileChecker;
use crate::instruction::{build_instruction, DEFAULT_HEADER};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvalEvent {
    Task {
        current: u32,
        total: u32,
        task_id: String,
    },
    Sampling {
        total: u32,
    },
    TaskComplete {
        outcome: TaskOutcome,
    },
    Done {
        summary: EvalSummary,
    },
    Cancelled,
    Error {
        message: String,
    },
}

/// What one task produced: the persisted record plus run bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub record: CompletionRecord,
    pub pool_size: u32,
    pub repaired: bool,
    pub extraction_failed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvalSummary {
    pub attempted: u32,
    pub extraction_failures: u32,
    pub compile_rate: f64,
    pub repaired: u32,
    pub avg_body_len: f64,
    pub median_body_len: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvalResult {
    pub config: EvalConfig,
    pub outcomes: Vec<TaskOutcome>,
    pub summary: EvalSummary,
}

/// Drives one evaluation sweep: per task, extract the stub, build the
/// instruction, fan out completions, normalize, compile-check, reduce, and
/// optionally run one self-repair round on a non-compiling winner.
pub struct EvalRunner<C: TextCompleter> {
    client: C,
    checker: CompileChecker,
    header: String,
}

impl<C: TextCompleter> EvalRunner<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            checker: CompileChecker::default(),
            header: DEFAULT_HEADER.to_string(),
        }
    }

    pub fn with_header(mut self, header: &str) -> Self {
        self.header = header.to_string();
        self
    }

    /// Run every task and collect the outcomes.
    pub async fn run(&self, config: &EvalConfig, records: &[HumanEvalRecord]) -> Result<EvalResult> {
        tracing::info!(model = %config.model_id, tasks = records.len(), "starting evaluation run");

        let mut outcomes = Vec::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            tracing::info!(task_id = %record.task_id, "task {}/{}", idx + 1, records.len());
            outcomes.push(self.run_task(config, record).await);
        }

        let summary = Self::calculate_summary(&outcomes);
        Ok(EvalResult {
            config: config.clone(),
            outcomes,
            summary,
        })
    }

    /// Event-streaming variant for interactive consumers; cancellation is
    /// checked between tasks.
    pub async fn run_streaming(
        &self,
        config: &EvalConfig,
        records: &[HumanEvalRecord],
        cancel_token: CancellationToken,
        tx: mpsc::Sender<EvalEvent>,
    ) {
        let total = records.len() as u32;
        let mut outcomes = Vec::with_capacity(records.len());

        for (idx, record) in records.iter().enumerate() {
            if cancel_token.is_cancelled() {
                let _ = tx.send(EvalEvent::Cancelled).await;
                return;
            }

            let _ = tx
                .send(EvalEvent::Task {
                    current: idx as u32 + 1,
                    total,
                    task_id: record.task_id.clone(),
                })
                .await;
            let _ = tx
                .send(EvalEvent::Sampling {
                    total: config.n_samples.max(1),
                })
                .await;

            let outcome = self.run_task(config, record).await;
            if outcome.extraction_failed {
                let _ = tx
                    .send(EvalEvent::Error {
                        message: format!("Task '{}': stub extraction failed", record.task_id),
                    })
                    .await;
            }
            let _ = tx
                .send(EvalEvent::TaskComplete {
                    outcome: outcome.clone(),
                })
                .await;
            outcomes.push(outcome);
        }

        let summary = Self::calculate_summary(&outcomes);
        let _ = tx.send(EvalEvent::Done { summary }).await;
    }

    /// One task, end to end. Never fails the batch: extraction errors become
    /// a failure-marker outcome and transport errors count as empty
    /// completions, which normalize to the placeholder body.
    async fn run_task(&self, config: &EvalConfig, record: &HumanEvalRecord) -> TaskOutcome {
        let stub = match extract_stub(&record.prompt, Some(&record.entry_point)) {
            Ok(stub) => stub,
            Err(e) => {
                tracing::warn!(task_id = %record.task_id, error = %e, "stub extraction failed");
                return Self::failure_marker(record);
            }
        };
        let instruction = build_instruction(&self.header, &stub);

        let n_samples = config.n_samples.max(1);
        let raw_texts: Vec<String> = stream::iter(0..n_samples)
            .map(|_| async {
                match self.client.complete_text(&instruction, &config.gen).await {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(task_id = %record.task_id, error = %e, "completion failed");
                        String::new()
                    }
                }
            })
            .buffer_unordered(config.concurrency.max(1))
            .collect()
            .await;

        let mut candidates = Vec::with_capacity(raw_texts.len());
        for raw_text in raw_texts {
            let body = normalize(&raw_text, config.policy);
            let compiled = if config.compile_check {
                self.checker.check(&record.prompt, body.as_str()).await
            } else {
                false
            };
            candidates.push(Candidate::new(body, raw_text, compiled));
        }
        let pool_size = candidates.len() as u32;

        let mut winner = match reduce(&candidates) {
            Ok(winner) => winner,
            Err(e) => {
                tracing::warn!(task_id = %record.task_id, error = %e, "reduction failed");
                return Self::failure_marker(record);
            }
        };

        let mut repaired = false;
        if config.repair && !winner.compiled {
            if let Some(fixed) = self.try_repair(config, record, &winner).await {
                winner = fixed;
                repaired = true;
            }
        }

        TaskOutcome {
            record: CompletionRecord {
                task_id: record.task_id.clone(),
                prompt: record.prompt.clone(),
                entry_point: record.entry_point.clone(),
                canonical_solution: record.canonical_solution.clone(),
                test: record.test.clone(),
                raw_text: winner.raw_text.clone(),
                completion: winner.body.as_str().to_string(),
                compiled: winner.compiled,
            },
            pool_size,
            repaired,
            extraction_failed: false,
        }
    }

    /// One repair round: re-normalize the repaired text and adopt it only
    /// when it checks out (compiles, or is at least a real body when compile
    /// checking is off).
    async fn try_repair(
        &self,
        config: &EvalConfig,
        record: &HumanEvalRecord,
        winner: &Candidate,
    ) -> Option<Candidate> {
        let raw = attempt_repair(&record.prompt, winner.body.as_str(), |instruction| async move {
            self.client
                .complete_text(&instruction, &config.gen)
                .await
                .ok()
        })
        .await?;

        let body = normalize(&raw, config.policy);
        let compiled = if config.compile_check {
            self.checker.check(&record.prompt, body.as_str()).await
        } else {
            false
        };
        if compiled || (!config.compile_check && !body.is_placeholder()) {
            Some(Candidate::new(body, raw, compiled))
        } else {
            tracing::debug!(task_id = %record.task_id, "repair attempt did not produce a usable body");
            None
        }
    }

    fn failure_marker(record: &HumanEvalRecord) -> TaskOutcome {
        TaskOutcome {
            record: CompletionRecord {
                task_id: record.task_id.clone(),
                prompt: record.prompt.clone(),
                entry_point: record.entry_point.clone(),
                canonical_solution: record.canonical_solution.clone(),
                test: record.test.clone(),
                raw_text: String::new(),
                completion: PLACEHOLDER_BODY.to_string(),
                compiled: false,
            },
            pool_size: 0,
            repaired: false,
            extraction_failed: true,
        }
    }

    fn calculate_summary(outcomes: &[TaskOutcome]) -> EvalSummary {
        let attempted = outcomes.len() as u32;
        let extraction_failures = outcomes.iter().filter(|o| o.extraction_failed).count() as u32;
        let compiled = outcomes.iter().filter(|o| o.record.compiled).count() as u32;
        let repaired = outcomes.iter().filter(|o| o.repaired).count() as u32;

        let mut lengths: Vec<u64> = outcomes
            .iter()
            .map(|o| o.record.completion.trim().len() as u64)
            .collect();
        lengths.sort_unstable();

        let compile_rate = match attempted {
            0 => 0.0,
            _ => compiled as f64 / attempted as f64,
        };
        let avg_body_len = match lengths.is_empty() {
            true => 0.0,
            false => lengths.iter().sum::<u64>() as f64 / lengths.len() as f64,
        };
        let median_body_len = match lengths.is_empty() {
            true => 0,
            false => lengths[lengths.len() / 2],
        };

        EvalSummary {
            attempted,
            extraction_failures,
            compile_rate,
            repaired,
            avg_body_len,
            median_body_len,
        }
    }
}
