//! Evaluation CLI: score recommendation cases and compare pipelines.

use clap::Parser;
use graphrag_eval::{
    eval::{
        registry::{NDCG, PRECISION_RECALL},
        EvalCase, EvalReport, MetricValue,
    },
    Config, MetricRegistry,
};
use std::path::PathBuf;

/// Evaluation framework: score cases and report metrics per pipeline.
#[derive(Parser, Debug)]
#[command(name = "eval")]
struct Args {
    /// Path to eval cases JSON (default: eval_cases.json).
    #[arg(long, default_value = "eval_cases.json")]
    cases: PathBuf,

    /// Print metric descriptions and exit.
    #[arg(long)]
    describe: bool,

    /// Print per-case outcomes as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", config.eval.log_level.as_str()),
    )
    .init();

    log::debug!("Loaded config: {:?}", config.eval);

    let registry = MetricRegistry::from_config(&config.eval);
    log::debug!("Registered metrics: {}", registry.names().collect::<Vec<_>>().join(", "));

    if args.describe {
        for (name, description) in registry.describe_all() {
            println!("{:<18} {}", name, description);
        }
        return Ok(());
    }

    let cases = EvalCase::load_all(&args.cases)
        .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", args.cases.display(), e))?;

    let evaluations: Vec<_> = cases
        .iter()
        .map(|case| registry.evaluate(&case.result, &case.ground_truth))
        .collect();

    let report = EvalReport::new(&cases, &evaluations);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Evaluating {} cases (P/R@{}, NDCG@{})\n",
        cases.len(),
        config.eval.precision_k,
        config.eval.ndcg_k
    );

    for case in &report.cases {
        let outcomes = case.outcomes;
        let pr = outcomes
            .get(PRECISION_RECALL)
            .and_then(|o| o.value())
            .and_then(MetricValue::as_precision_recall);
        let ndcg = outcomes
            .get(NDCG)
            .and_then(|o| o.value())
            .and_then(MetricValue::as_scalar);
        println!(
            "  [{}] {} (P: {}, R: {}, NDCG: {})",
            case.pipeline,
            case.name,
            percent(pr.map(|s| s.precision)),
            percent(pr.map(|s| s.recall)),
            ndcg.map(|v| format!("{:.3}", v)).unwrap_or_else(|| "n/a".to_string()),
        );
    }

    println!("\n=== Summary by pipeline ===");
    for (pipeline, summary) in &report.summaries {
        println!("{} ({} cases)", pipeline, summary.cases);
        println!("  Precision:     {}", percent(summary.mean_precision));
        println!("  Recall:        {}", percent(summary.mean_recall));
        println!("  F1:            {}", percent(summary.mean_f1));
        println!("  NDCG:          {}", decimal(summary.mean_ndcg));
        println!("  Satisfaction:  {}", decimal(summary.mean_satisfaction));
        println!("  Response time: {}", seconds(summary.mean_response_time));
        println!("  Fast (<200ms): {}", percent(summary.fast_ratio));
        println!("  Acceptable:    {}", percent(summary.acceptable_ratio));
        println!("  Total cost:    {}", summary.total_cost.map(|c| format!("${:.4}", c)).unwrap_or_else(|| "unknown".to_string()));
    }

    Ok(())
}

fn percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}%", v * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}

fn seconds(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.3}s", v))
        .unwrap_or_else(|| "n/a".to_string())
}

fn decimal(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.3}", v))
        .unwrap_or_else(|| "n/a".to_string())
}
