//! `chorus run`: process a content file through the configured cast.

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;
use tracing::{Instrument, info_span};

use chorus_core::engine::{EngineContext, Orchestrator, OrchestrationState};
use chorus_core::generation::BoxResponseGenerator;
use chorus_infra::config::load_config;
use chorus_infra::content::load_content_file;
use chorus_infra::filesystem::resolve_data_dir;
use chorus_infra::generator::TemplateGenerator;
use chorus_infra::persona::build_registry;
use chorus_observe::attrs::SPAN_RUN;
use chorus_types::report::CycleReport;
use chorus_types::workflow::{EngagementDecision, WorkflowResult};

pub struct RunOptions {
    pub content: PathBuf,
    pub cycles: Option<usize>,
    pub reply_rounds: Option<u32>,
}

/// Totals across every report of a run.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: usize,
    pub reply_rounds: usize,
    pub reactions: usize,
    pub ignored: usize,
    pub deferred: usize,
    pub failures: usize,
    pub threads_created: usize,
    pub processed_count: u64,
    pub queue_remaining: usize,
}

impl RunSummary {
    fn from_reports(reports: &[CycleReport], queue_remaining: usize) -> Self {
        let mut summary = Self {
            queue_remaining,
            ..Self::default()
        };
        for report in reports {
            if report.thread_id.is_some() {
                summary.reply_rounds += 1;
            } else {
                summary.cycles += 1;
            }
            summary.reactions += report.reaction_count();
            summary.ignored += report.count_decision(EngagementDecision::Ignore);
            summary.deferred += report.count_decision(EngagementDecision::Defer);
            summary.failures += report.failure_count();
            summary.threads_created += report.threads_created.len();
            summary.processed_count = summary.processed_count.max(report.processed_count);
        }
        summary
    }
}

#[derive(Serialize)]
struct RunOutput<'a> {
    summary: &'a RunSummary,
    reports: &'a [CycleReport],
    fault: Option<String>,
}

/// Load config and content, run the orchestrator, and print the reports.
///
/// When a cycle fails, the reports gathered before it are still printed and
/// the fault is returned afterwards.
pub async fn run(options: RunOptions, json: bool, quiet: bool) -> Result<()> {
    let data_dir = resolve_data_dir();
    let mut config = load_config(&data_dir).await;
    if let Some(rounds) = options.reply_rounds {
        config.reply_rounds = rounds;
    }

    let registry = build_registry(&config).context("failed to register characters")?;
    let items = load_content_file(&options.content).await?;

    let mut state = OrchestrationState::new(&config);
    state.enqueue_all(items);

    let ctx = EngineContext::init(
        registry,
        BoxResponseGenerator::new(TemplateGenerator::new()),
        config,
    );

    let token = ctx.cancellation.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current cycle");
            token.cancel();
        }
    });

    let span = info_span!(SPAN_RUN, engine_id = %ctx.engine_id);
    let outcome = Orchestrator::new()
        .run(&ctx, &mut state, options.cycles)
        .instrument(span)
        .await;
    interrupt.abort();
    ctx.shutdown(state.processed_count());

    let summary = RunSummary::from_reports(&outcome.reports, state.queue_depth());

    if json {
        let output = RunOutput {
            summary: &summary,
            reports: &outcome.reports,
            fault: outcome.fault.as_ref().map(ToString::to_string),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !quiet {
        println!();
        for report in &outcome.reports {
            print_report(report);
        }
        print_summary(&summary, state.budget().calls_used(), state.budget().total_budget());
    }

    match outcome.fault {
        Some(fault) => Err(anyhow::Error::new(fault).context(format!(
            "orchestration aborted after {} report(s)",
            outcome.reports.len()
        ))),
        None => Ok(()),
    }
}

fn print_report(report: &CycleReport) {
    let heading = match (&report.content_id, report.thread_id) {
        (_, Some(thread)) => format!("Reply round on thread {thread}"),
        (Some(content), None) => format!("Cycle on {content}"),
        (None, None) => "Idle cycle".to_string(),
    };
    println!(
        "  {} {}  {}",
        style("▸").cyan(),
        style(heading).bold(),
        style(format!("{}ms", report.elapsed_ms)).dim()
    );

    for result in &report.results {
        println!("    {}", render_result(result));
    }
    for thread in &report.threads_created {
        println!("    {} thread {} opened", style("✚").green(), style(thread).dim());
    }
    for warning in &report.warnings {
        println!("    {} {}", style("!").yellow().bold(), style(warning).yellow());
    }
    println!();
}

fn render_result(result: &WorkflowResult) -> String {
    let who = style(&result.character_id).cyan();
    if let Some(error) = &result.error {
        if result.used_fallback {
            let text = result.generated_text.as_deref().unwrap_or_default();
            return format!("{} {who}: {text} {}", style("~").yellow(), style(format!("({error})")).dim());
        }
        return format!("{} {who}: {}", style("✗").red(), style(error).red());
    }
    match result.decision {
        EngagementDecision::Engage => {
            let text = result.generated_text.as_deref().unwrap_or_default();
            format!("{} {who}: {text}", style("✓").green())
        }
        EngagementDecision::Defer => {
            let reason = result
                .defer_reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "deferred".to_string());
            format!("{} {who} {}", style("…").yellow(), style(reason).dim())
        }
        EngagementDecision::Ignore => format!("{} {who} {}", style("·").dim(), style("passed").dim()),
    }
}

fn print_summary(summary: &RunSummary, calls_used: u32, total_budget: u32) {
    println!("  {}", style("── Summary ──").dim());
    println!("  Cycles:        {}", style(summary.cycles).bold());
    println!("  Reply rounds:  {}", summary.reply_rounds);
    println!("  Reactions:     {}", style(summary.reactions).green());
    println!("  Ignored:       {}", summary.ignored);
    println!("  Deferred:      {}", summary.deferred);
    if summary.failures > 0 {
        println!("  Failures:      {}", style(summary.failures).red());
    }
    println!("  Threads:       {}", summary.threads_created);
    println!("  Budget:        {calls_used}/{total_budget} calls this hour");
    if summary.queue_remaining > 0 {
        println!(
            "  Queue:         {}",
            style(format!("{} item(s) still pending", summary.queue_remaining)).yellow()
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_types::workflow::WorkflowStep;
    use uuid::Uuid;

    fn result(id: &str, decision: EngagementDecision, text: Option<&str>) -> WorkflowResult {
        WorkflowResult {
            character_id: id.to_string(),
            content_id: "n1".to_string(),
            thread_id: None,
            success: true,
            decision,
            generated_text: text.map(str::to_string),
            error: None,
            defer_reason: None,
            step_reached: WorkflowStep::Done,
            generation_attempts: u32::from(text.is_some()),
            used_fallback: false,
            elapsed_ms: 1,
        }
    }

    #[test]
    fn summary_splits_cycles_and_reply_rounds() {
        let mut cycle = CycleReport::empty(Uuid::now_v7());
        cycle.content_id = Some("n1".to_string());
        cycle.results = vec![
            result("ada", EngagementDecision::Engage, Some("hi")),
            result("rex", EngagementDecision::Engage, Some("no")),
            result("sunny", EngagementDecision::Ignore, None),
        ];
        let thread = Uuid::now_v7();
        cycle.threads_created = vec![thread];
        cycle.processed_count = 1;

        let mut round = CycleReport::empty(Uuid::now_v7());
        round.thread_id = Some(thread);
        round.results = vec![result("sunny", EngagementDecision::Defer, None)];
        round.processed_count = 1;

        let summary = RunSummary::from_reports(&[cycle, round], 2);
        assert_eq!(
            summary,
            RunSummary {
                cycles: 1,
                reply_rounds: 1,
                reactions: 2,
                ignored: 1,
                deferred: 1,
                failures: 0,
                threads_created: 1,
                processed_count: 1,
                queue_remaining: 2,
            }
        );
    }

    #[test]
    fn rendered_reaction_contains_text() {
        let line = render_result(&result("ada", EngagementDecision::Engage, Some("By the numbers")));
        assert!(line.contains("ada"));
        assert!(line.contains("By the numbers"));
    }
}
