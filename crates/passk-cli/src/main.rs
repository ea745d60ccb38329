use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use passk_benchmark::{
    dataset, split_combined, write_combined, EvalEvent, EvalRunner, EvalSummary, SamplePlan,
};
use passk_client::OpenAiClient;
use passk_core::{EvalConfig, GenParams, NormalizePolicy};
use passk_postprocess::normalize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "passk")]
#[command(about = "HumanEval pass@1 evaluation harness", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an evaluation sweep and write the JSONL artifacts
    Run {
        /// HumanEval problems file (line-delimited JSON)
        #[arg(short, long)]
        problems: PathBuf,

        /// Model ID to evaluate
        #[arg(short, long)]
        model: String,

        /// OpenAI-compatible API base, e.g. http://localhost:8000/v1
        #[arg(long, default_value = "http://localhost:8000/v1")]
        api_base: String,

        /// Use /chat/completions instead of /completions
        #[arg(long)]
        chat: bool,

        /// Normalization policy (v1, v2, v3)
        #[arg(long, default_value = "v2")]
        policy: String,

        /// Completions sampled per task before reduction
        #[arg(short = 'n', long, default_value = "1")]
        samples: u32,

        /// Temperature for generation
        #[arg(short, long, default_value = "0.2")]
        temperature: f32,

        /// Nucleus sampling threshold
        #[arg(long, default_value = "1.0")]
        top_p: f32,

        /// Max tokens to generate
        #[arg(long, default_value = "512")]
        max_tokens: u32,

        /// Stop sequence (repeatable)
        #[arg(long)]
        stop: Vec<String>,

        /// Evaluate only this many tasks
        #[arg(long)]
        take: Option<usize>,

        /// Evaluate this fraction of the dataset (overrides --take)
        #[arg(long)]
        frac: Option<f64>,

        /// Sampling seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Keep dataset order instead of shuffling
        #[arg(long)]
        no_shuffle: bool,

        /// One self-repair round for non-compiling winners
        #[arg(long)]
        repair: bool,

        /// Skip the python3 compile check
        #[arg(long)]
        no_compile_check: bool,

        /// In-flight requests per task
        #[arg(long, default_value = "8")]
        concurrency: usize,

        /// Output directory for artifacts
        #[arg(short, long, default_value = "runs")]
        out_dir: PathBuf,

        /// Artifact tag (defaults to a fresh short id)
        #[arg(long)]
        tag: Option<String>,
    },

    /// Split a combined artifact into samples/problems files for the scorer
    Split {
        /// Combined JSONL artifact
        #[arg(short, long)]
        combined: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "runs")]
        out_dir: PathBuf,

        /// Artifact tag
        #[arg(long)]
        tag: String,
    },

    /// Normalize raw model output from a file (or stdin with '-')
    Normalize {
        /// Input file, or '-' for stdin
        input: String,

        /// Normalization policy (v1, v2, v3)
        #[arg(long, default_value = "v2")]
        policy: String,
    },

    /// Probe the completion endpoint
    Status {
        /// OpenAI-compatible API base
        #[arg(long, default_value = "http://localhost:8000/v1")]
        api_base: String,
    },
}

fn api_key() -> String {
    std::env::var("PASSK_API_KEY")
        .or_else(|_| std::env::var("OPENAI_API_KEY"))
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            problems,
            model,
            api_base,
            chat,
            policy,
            samples,
            temperature,
            top_p,
            max_tokens,
            stop,
            take,
            frac,
            seed,
            no_shuffle,
            repair,
            no_compile_check,
            concurrency,
            out_dir,
            tag,
        } => {
            let policy: NormalizePolicy = policy.parse()?;
            let config = EvalConfig {
                model_id: model.clone(),
                policy,
                n_samples: samples,
                gen: GenParams {
                    temperature,
                    top_p,
                    max_tokens,
                    stop: if stop.is_empty() { None } else { Some(stop) },
                },
                concurrency,
                repair,
                compile_check: !no_compile_check,
            };
            let plan = SamplePlan {
                n: take,
                frac,
                shuffle: !no_shuffle,
                seed,
            };
            let tag = tag.unwrap_or_else(|| {
                uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
            });
            cmd_run(&problems, &api_base, chat, config, plan, &out_dir, &tag).await?
        }
        Commands::Split {
            combined,
            out_dir,
            tag,
        } => cmd_split(&combined, &out_dir, &tag)?,
        Commands::Normalize { input, policy } => cmd_normalize(&input, &policy)?,
        Commands::Status { api_base } => cmd_status(&api_base).await?,
    }

    Ok(())
}

async fn cmd_run(
    problems: &PathBuf,
    api_base: &str,
    chat: bool,
    config: EvalConfig,
    plan: SamplePlan,
    out_dir: &PathBuf,
    tag: &str,
) -> Result<()> {
    let records = dataset::load_records(problems)
        .with_context(|| format!("loading problems from {}", problems.display()))?;
    let records = dataset::sample_records(records, &plan);

    println!();
    println!("Running evaluation...");
    println!("  Model:    {}", config.model_id);
    println!("  Policy:   {}", config.policy);
    println!("  Tasks:    {}", records.len());
    println!("  Samples:  {} per task", config.n_samples);
    println!("  Tag:      {}", tag);
    println!();

    let client = OpenAiClient::new(api_base, &api_key(), &config.model_id, chat);
    let runner = EvalRunner::new(client);

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let (tx, mut rx) = mpsc::channel(64);
    let run_fut = runner.run_streaming(&config, &records, cancel, tx);
    let consume_fut = async {
        let mut outcomes = Vec::new();
        let mut summary: Option<EvalSummary> = None;
        while let Some(event) = rx.recv().await {
            match event {
                EvalEvent::Task {
                    current,
                    total,
                    task_id,
                } => println!("  [{current}/{total}] {task_id}"),
                EvalEvent::Error { message } => eprintln!("  warning: {message}"),
                EvalEvent::TaskComplete { outcome } => outcomes.push(outcome),
                EvalEvent::Done { summary: s } => summary = Some(s),
                EvalEvent::Cancelled => println!("  cancelled"),
                EvalEvent::Sampling { .. } => {}
            }
        }
        (outcomes, summary)
    };
    let ((), (outcomes, summary)) = tokio::join!(run_fut, consume_fut);

    let completions: Vec<_> = outcomes.into_iter().map(|o| o.record).collect();
    let combined_path = out_dir.join(format!("combined_{tag}.jsonl"));
    write_combined(&completions, &combined_path)?;
    let split = split_combined(&combined_path, out_dir, tag)?;

    if let Some(summary) = summary {
        print_summary(&summary);
    }
    println!("Artifacts:");
    println!("  Combined: {}", combined_path.display());
    println!("  Samples:  {}", split.samples_path.display());
    println!("  Problems: {}", split.problems_path.display());
    println!();
    println!("Score pass@1 with the external HumanEval harness over the samples/problems pair.");
    println!();

    Ok(())
}

fn print_summary(summary: &EvalSummary) {
    println!();
    println!("Results:");
    println!("{:-<40}", "");
    println!("  Attempted:           {}", summary.attempted);
    println!("  Extraction failures: {}", summary.extraction_failures);
    println!("  Compile rate:        {:.1}%", summary.compile_rate * 100.0);
    println!("  Repaired:            {}", summary.repaired);
    println!("  Avg body length:     {:.1}", summary.avg_body_len);
    println!("  Median body length:  {}", summary.median_body_len);
    println!();
}

fn cmd_split(combined: &PathBuf, out_dir: &PathBuf, tag: &str) -> Result<()> {
    let split = split_combined(combined, out_dir, tag)?;
    println!("{}", serde_json::to_string_pretty(&split)?);
    Ok(())
}

fn cmd_normalize(input: &str, policy: &str) -> Result<()> {
    let policy: NormalizePolicy = policy.parse()?;
    let raw = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(input)?
    };
    print!("{}", normalize(&raw, policy).as_str());
    Ok(())
}

async fn cmd_status(api_base: &str) -> Result<()> {
    let client = OpenAiClient::new(api_base, &api_key(), "", false);
    println!("Endpoint status:");
    println!("{:-<40}", "");
    println!("  API base: {}", api_base);
    match client.health().await {
        Ok(status) => println!("  /models: HTTP {}", status),
        Err(e) => println!("  /models: unreachable ({})", e),
    }
    Ok(())
}
