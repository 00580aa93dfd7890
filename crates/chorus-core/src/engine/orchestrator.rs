//! Multi-character orchestrator.
//!
//! `Orchestrator` drains the content queue one item per cycle, offers the
//! item to every eligible character concurrently, turns joint reactions into
//! a discussion thread, and keeps the aggregate metrics in
//! `OrchestrationState` up to date. Every lifecycle step is published on the
//! context's `EventBus`.
//!
//! Per-character failures (generator errors, validation exhaustion, panics)
//! are recorded in the `CycleReport` and never abort a cycle. Only a broken
//! `OrchestrationState` invariant fails a cycle, in which case the queue pop
//! is rolled back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use chorus_types::character::CharacterState;
use chorus_types::content::ContentItem;
use chorus_types::event::ChorusEvent;
use chorus_types::report::{CharacterFailure, CycleReport};
use chorus_types::workflow::{
    EngagementDecision, FailureKind, WorkflowFailure, WorkflowResult, WorkflowStep,
};

use crate::personality::PersonalityProfile;
use crate::thread::ThreadEngagementState;
use crate::workflow::{CharacterWorkflow, EngagementTarget, WorkflowSettings};

use super::budget::BudgetStatus;
use super::context::EngineContext;
use super::eligibility::{eligible_characters, eligible_repliers};
use super::state::{OrchestrationState, ThreadEntry};

/// Errors that fail a whole cycle.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// The orchestration state broke one of its invariants.
    #[error("orchestration state invariant violated: {0}")]
    InvariantViolation(String),

    /// A reply round targeted a thread that is not active.
    #[error("thread not found: {0}")]
    ThreadNotFound(Uuid),
}

/// Everything `Orchestrator::run` produced before it stopped.
///
/// `fault` is set when a cycle failed; `reports` still holds every cycle
/// that completed before it.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub reports: Vec<CycleReport>,
    pub fault: Option<OrchestratorError>,
}

impl RunOutcome {
    pub fn is_clean(&self) -> bool {
        self.fault.is_none()
    }
}

/// Stateless coordinator for orchestration cycles.
///
/// All mutable state lives in `OrchestrationState`; all shared collaborators
/// live in `EngineContext`.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator;

/// What a cycle's fan-out targets.
struct FanOut {
    cycle_id: Uuid,
    target: EngagementTarget,
    participants: Vec<Arc<dyn PersonalityProfile>>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self
    }

    /// Process at most one content item.
    ///
    /// 1. Sync character states with the registry, roll the budget window,
    ///    verify invariants.
    /// 2. Pop one item (unless the hourly budget is exhausted).
    /// 3. Select eligible characters.
    /// 4. Run every eligible workflow concurrently.
    /// 5. Create a thread when two or more characters reacted.
    /// 6. Update processed count and budget, prune idle threads.
    pub async fn process_cycle(
        &self,
        ctx: &EngineContext,
        state: &mut OrchestrationState,
    ) -> Result<CycleReport, OrchestratorError> {
        let cycle_id = Uuid::now_v7();
        let span = info_span!(
            "chorus.cycle",
            engine_id = %ctx.engine_id,
            cycle_id = %cycle_id,
        );
        self.cycle_inner(ctx, state, cycle_id).instrument(span).await
    }

    async fn cycle_inner(
        &self,
        ctx: &EngineContext,
        state: &mut OrchestrationState,
        cycle_id: Uuid,
    ) -> Result<CycleReport, OrchestratorError> {
        let start = Instant::now();
        let now = Utc::now();
        prepare(ctx, state, now).await?;

        ctx.event_bus.publish(ChorusEvent::CycleStarted {
            cycle_id,
            queue_depth: state.queue_depth(),
        });
        let mut report = CycleReport::empty(cycle_id);

        if state.queue_depth() > 0 && state.budget().is_exhausted() {
            report.warnings.push(exhausted_warning(state));
            publish_exhausted(ctx, state);
        } else if let Some(item) = state.pop_next() {
            let content = Arc::new(item);
            let eligible = eligible_characters(
                &ctx.registry,
                &content,
                ctx.config.eligibility_threshold,
            );
            debug!(
                content_id = %content.id,
                eligible = eligible.len(),
                "Content dequeued"
            );
            ctx.event_bus.publish(ChorusEvent::ContentDequeued {
                cycle_id,
                content_id: content.id.clone(),
                eligible: eligible.len(),
            });
            report.content_id = Some(content.id.clone());

            let snapshot = state.snapshot_characters();
            let fan_out = FanOut {
                cycle_id,
                target: EngagementTarget::Content(content.clone()),
                participants: eligible,
            };
            let mut results = self.fan_out(ctx, state, fan_out).await;
            charge_budget(ctx, state, &results, &mut report);

            let created = create_thread(ctx, state, &content, &mut results);

            if let Err(violation) = state.check_invariants().await {
                warn!(error = %violation, "Invariant violated, rolling back cycle");
                state.restore_characters(snapshot);
                if let Some(thread_id) = created {
                    state.remove_thread(&thread_id);
                }
                state.push_front(Arc::unwrap_or_clone(content));
                return Err(OrchestratorError::InvariantViolation(violation));
            }

            if let Some(thread_id) = created {
                report.threads_created.push(thread_id);
            }
            state.mark_processed();
            record_results(ctx, state, cycle_id, &results, &mut report);
            report.results = results;
        }

        let retention = Duration::hours(i64::from(ctx.config.thread_retention_hours));
        let pruned = state.prune_threads(now, retention).await;
        if !pruned.is_empty() {
            debug!(count = pruned.len(), "Pruned inactive threads");
            ctx.event_bus
                .publish(ChorusEvent::ThreadsPruned { thread_ids: pruned });
        }

        Ok(complete(ctx, state, report, start))
    }

    /// Offer every eligible character except the last speaker a reply on an
    /// active thread.
    pub async fn process_reply_round(
        &self,
        ctx: &EngineContext,
        state: &mut OrchestrationState,
        thread_id: Uuid,
    ) -> Result<CycleReport, OrchestratorError> {
        let cycle_id = Uuid::now_v7();
        let span = info_span!(
            "chorus.reply_round",
            engine_id = %ctx.engine_id,
            cycle_id = %cycle_id,
            thread_id = %thread_id,
        );
        self.reply_round_inner(ctx, state, cycle_id, thread_id)
            .instrument(span)
            .await
    }

    async fn reply_round_inner(
        &self,
        ctx: &EngineContext,
        state: &mut OrchestrationState,
        cycle_id: Uuid,
        thread_id: Uuid,
    ) -> Result<CycleReport, OrchestratorError> {
        let start = Instant::now();
        prepare(ctx, state, Utc::now()).await?;

        let ThreadEntry { thread, content } = state
            .thread(&thread_id)
            .cloned()
            .ok_or(OrchestratorError::ThreadNotFound(thread_id))?;

        ctx.event_bus.publish(ChorusEvent::CycleStarted {
            cycle_id,
            queue_depth: state.queue_depth(),
        });
        let mut report = CycleReport::empty(cycle_id);
        report.thread_id = Some(thread_id);

        if state.budget().is_exhausted() {
            report.warnings.push(exhausted_warning(state));
            publish_exhausted(ctx, state);
            return Ok(complete(ctx, state, report, start));
        }

        let last_speaker = thread.lock().await.last_speaker().map(str::to_string);
        let repliers = eligible_repliers(
            &ctx.registry,
            &content,
            ctx.config.eligibility_threshold,
            last_speaker.as_deref(),
        );
        debug!(
            repliers = repliers.len(),
            last_speaker = last_speaker.as_deref().unwrap_or("-"),
            "Starting reply round"
        );

        let snapshot = state.snapshot_characters();
        let fan_out = FanOut {
            cycle_id,
            target: EngagementTarget::ThreadReply { thread, content },
            participants: repliers,
        };
        let results = self.fan_out(ctx, state, fan_out).await;
        charge_budget(ctx, state, &results, &mut report);

        if let Err(violation) = state.check_invariants().await {
            warn!(error = %violation, "Invariant violated, rolling back reply round");
            state.restore_characters(snapshot);
            return Err(OrchestratorError::InvariantViolation(violation));
        }

        record_results(ctx, state, cycle_id, &results, &mut report);
        report.results = results;
        Ok(complete(ctx, state, report, start))
    }

    /// Run cycles until the queue is empty, `max_cycles` is reached, the
    /// budget stalls the queue, a cycle fails, or the context is cancelled.
    ///
    /// After each cycle that creates a thread, `config.reply_rounds` reply
    /// rounds are run on it. Cancellation is only observed between cycles.
    /// A failed cycle stops the run; reports from earlier cycles are kept.
    pub async fn run(
        &self,
        ctx: &EngineContext,
        state: &mut OrchestrationState,
        max_cycles: Option<usize>,
    ) -> RunOutcome {
        let mut reports = Vec::new();
        let mut cycles = 0usize;

        loop {
            if ctx.is_cancelled() {
                info!(cycles, "Run cancelled");
                break;
            }
            if max_cycles.is_some_and(|max| cycles >= max) || state.queue_depth() == 0 {
                break;
            }

            let report = match self.process_cycle(ctx, state).await {
                Ok(report) => report,
                Err(fault) => {
                    warn!(error = %fault, cycles, "Cycle failed, stopping run");
                    return RunOutcome {
                        reports,
                        fault: Some(fault),
                    };
                }
            };
            cycles += 1;
            let stalled = report.content_id.is_none();
            let new_threads = report.threads_created.clone();
            reports.push(report);

            if stalled {
                info!(queue_depth = state.queue_depth(), "Queue stalled on budget, stopping run");
                break;
            }

            for thread_id in new_threads {
                for _ in 0..ctx.config.reply_rounds {
                    if ctx.is_cancelled() {
                        break;
                    }
                    let round = match self.process_reply_round(ctx, state, thread_id).await {
                        Ok(round) => round,
                        Err(fault) => {
                            warn!(error = %fault, %thread_id, "Reply round failed, stopping run");
                            return RunOutcome {
                                reports,
                                fault: Some(fault),
                            };
                        }
                    };
                    let quiet = round.reaction_count() == 0;
                    reports.push(round);
                    if quiet {
                        break;
                    }
                }
            }
        }

        RunOutcome {
            reports,
            fault: None,
        }
    }

    /// Run one workflow per participant concurrently and collect the results,
    /// sorted by character id.
    ///
    /// Each task owns a clone of its character's state and hands it back on
    /// completion. A panicking task keeps the character's prior state.
    async fn fan_out(
        &self,
        ctx: &EngineContext,
        state: &mut OrchestrationState,
        fan_out: FanOut,
    ) -> Vec<WorkflowResult> {
        let FanOut {
            cycle_id,
            target,
            participants,
        } = fan_out;
        let workflow = CharacterWorkflow::new(
            ctx.generator.clone(),
            WorkflowSettings::from(&ctx.config),
        );

        let mut set: JoinSet<(WorkflowResult, CharacterState)> = JoinSet::new();
        let mut in_flight: HashMap<tokio::task::Id, CharacterState> = HashMap::new();

        for personality in participants {
            let character_id = personality.id().to_string();
            let Some(prior) = state.character(&character_id).cloned() else {
                warn!(character_id = %character_id, "No state for eligible character, skipping");
                continue;
            };
            let history = state.history_for(&character_id);
            let workflow = workflow.clone();
            let target = target.clone();
            let mut own = prior.clone();
            let span = info_span!(
                "chorus.workflow",
                cycle_id = %cycle_id,
                character_id = %character_id,
            );

            let handle = set.spawn(
                async move {
                    let result = workflow
                        .run(personality.as_ref(), &mut own, &target, &history)
                        .await;
                    (result, own)
                }
                .instrument(span),
            );
            in_flight.insert(handle.id(), prior);
        }

        let mut results = Vec::new();
        while let Some(joined) = set.join_next_with_id().await {
            match joined {
                Ok((task_id, (result, own))) => {
                    in_flight.remove(&task_id);
                    if let Some(text) = result.generated_text.as_deref() {
                        state.record_output(&result.character_id, text);
                    }
                    state.put_character(own);
                    results.push(result);
                }
                Err(join_error) => {
                    let Some(prior) = in_flight.remove(&join_error.id()) else {
                        warn!(error = %join_error, "Unknown workflow task failed");
                        continue;
                    };
                    warn!(
                        character_id = %prior.character_id,
                        error = %join_error,
                        "Workflow task panicked"
                    );
                    results.push(panicked_result(&prior, &target, &join_error));
                    state.put_character(prior);
                }
            }
        }

        results.sort_by(|a, b| a.character_id.cmp(&b.character_id));
        results
    }
}

/// Sync characters with the registry, roll the budget and verify invariants.
async fn prepare(
    ctx: &EngineContext,
    state: &mut OrchestrationState,
    now: DateTime<Utc>,
) -> Result<(), OrchestratorError> {
    let (added, removed) = state.sync_characters(&ctx.registry.ids());
    if !added.is_empty() || !removed.is_empty() {
        debug!(?added, ?removed, "Character set changed");
    }
    if state.budget_mut().roll(now) {
        debug!(reset_time = %state.budget().reset_time(), "Hourly call budget window rolled");
    }
    state
        .check_invariants()
        .await
        .map_err(OrchestratorError::InvariantViolation)
}

/// Seed a thread from two or more reactions. Returns the new thread id.
fn create_thread(
    ctx: &EngineContext,
    state: &mut OrchestrationState,
    content: &Arc<ContentItem>,
    results: &mut [WorkflowResult],
) -> Option<Uuid> {
    let reacted: Vec<usize> = results
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_reaction())
        .map(|(i, _)| i)
        .collect();
    if reacted.len() < 2 {
        return None;
    }

    let cap = reacted
        .iter()
        .filter_map(|&i| ctx.registry.get(&results[i].character_id))
        .map(|p| p.max_replies_per_thread())
        .min()
        .unwrap_or(ctx.config.default_max_replies_per_character)
        .max(1);

    let mut thread = ThreadEngagementState::new(content.id.clone(), content.text(), cap);
    let thread_id = thread.thread_id();
    let mut participants = Vec::with_capacity(reacted.len());
    for &i in &reacted {
        let result = &mut results[i];
        if let Some(text) = result.generated_text.clone() {
            thread.add_character_reply(&result.character_id, text);
        }
        result.thread_id = Some(thread_id);
        participants.push(result.character_id.clone());
    }

    info!(
        thread_id = %thread_id,
        content_id = %content.id,
        participants = participants.len(),
        cap,
        "Thread created"
    );
    state.insert_thread(
        thread_id,
        ThreadEntry {
            thread: thread.into_shared(),
            content: content.clone(),
        },
    );
    ctx.event_bus.publish(ChorusEvent::ThreadCreated {
        thread_id,
        content_id: content.id.clone(),
        participants,
    });
    Some(thread_id)
}

/// Count generate attempts against the hourly budget.
fn charge_budget(
    ctx: &EngineContext,
    state: &mut OrchestrationState,
    results: &[WorkflowResult],
    report: &mut CycleReport,
) {
    let calls: u32 = results.iter().map(|r| r.generation_attempts).sum();
    if calls == 0 {
        return;
    }
    match state.budget_mut().record_calls(calls) {
        BudgetStatus::Ok => {}
        BudgetStatus::Warning => {
            let budget = state.budget();
            warn!(
                calls_used = budget.calls_used(),
                budget_total = budget.total_budget(),
                "Hourly call budget warning"
            );
            report.warnings.push(format!(
                "hourly budget at {:.0}% ({}/{})",
                budget.percentage(),
                budget.calls_used(),
                budget.total_budget()
            ));
            ctx.event_bus.publish(ChorusEvent::BudgetWarning {
                calls_used: budget.calls_used(),
                budget_total: budget.total_budget(),
            });
        }
        BudgetStatus::Exhausted => {
            report.warnings.push(exhausted_warning(state));
            publish_exhausted(ctx, state);
        }
    }
}

fn exhausted_warning(state: &OrchestrationState) -> String {
    let budget = state.budget();
    format!(
        "hourly budget exhausted ({}/{}), content deferred until {}",
        budget.calls_used(),
        budget.total_budget(),
        budget.reset_time().format("%H:%M:%S UTC")
    )
}

fn publish_exhausted(ctx: &EngineContext, state: &OrchestrationState) {
    let budget = state.budget();
    warn!(
        calls_used = budget.calls_used(),
        budget_total = budget.total_budget(),
        "Hourly call budget exhausted"
    );
    ctx.event_bus.publish(ChorusEvent::BudgetExhausted {
        calls_used: budget.calls_used(),
        budget_total: budget.total_budget(),
    });
}

/// Publish one event per result and collect failures into the report.
fn record_results(
    ctx: &EngineContext,
    state: &OrchestrationState,
    cycle_id: Uuid,
    results: &[WorkflowResult],
    report: &mut CycleReport,
) {
    for result in results {
        let character_id = result.character_id.clone();
        if !result.success {
            let (kind, detail) = match &result.error {
                Some(failure) => (failure.kind, failure.message.clone()),
                None => (FailureKind::Internal, "unknown failure".to_string()),
            };
            report.failures.push(CharacterFailure {
                character_id: character_id.clone(),
                kind,
                detail: detail.clone(),
            });
            ctx.event_bus.publish(ChorusEvent::CharacterFailed {
                cycle_id,
                character_id,
                kind,
                error: detail,
            });
            continue;
        }
        let event = match result.decision {
            EngagementDecision::Engage => ChorusEvent::CharacterEngaged {
                cycle_id,
                character_id,
                content_id: result.content_id.clone(),
                thread_id: result.thread_id,
                used_fallback: result.used_fallback,
            },
            EngagementDecision::Ignore => ChorusEvent::CharacterIgnored {
                cycle_id,
                confidence: state
                    .character(&character_id)
                    .map(CharacterState::decision_confidence)
                    .unwrap_or(0.0),
                character_id,
            },
            EngagementDecision::Defer => match result.defer_reason {
                Some(reason) => ChorusEvent::CharacterDeferred {
                    cycle_id,
                    character_id,
                    reason,
                },
                None => continue,
            },
        };
        ctx.event_bus.publish(event);
    }
}

fn complete(
    ctx: &EngineContext,
    state: &OrchestrationState,
    mut report: CycleReport,
    start: Instant,
) -> CycleReport {
    report.processed_count = state.processed_count();
    report.calls_this_hour = state.budget().calls_used();
    report.elapsed_ms = start.elapsed().as_millis() as u64;

    info!(
        content_id = report.content_id.as_deref().unwrap_or("-"),
        reactions = report.reaction_count(),
        failures = report.failure_count(),
        threads_created = report.threads_created.len(),
        calls_this_hour = report.calls_this_hour,
        duration_ms = report.elapsed_ms,
        "Cycle completed"
    );
    ctx.event_bus.publish(ChorusEvent::CycleCompleted {
        cycle_id: report.cycle_id,
        reactions: report.reaction_count(),
        failures: report.failure_count(),
        threads_created: report.threads_created.len(),
        duration_ms: report.elapsed_ms,
    });
    report
}

fn panicked_result(
    prior: &CharacterState,
    target: &EngagementTarget,
    join_error: &tokio::task::JoinError,
) -> WorkflowResult {
    let thread_id = target
        .thread()
        .and_then(|t| t.try_lock().ok().map(|guard| guard.thread_id()));
    WorkflowResult {
        character_id: prior.character_id.clone(),
        content_id: target.content().id.clone(),
        thread_id,
        success: false,
        decision: EngagementDecision::Ignore,
        generated_text: None,
        error: Some(WorkflowFailure::new(
            FailureKind::Internal,
            format!("workflow task failed: {join_error}"),
        )),
        defer_reason: None,
        step_reached: WorkflowStep::Error,
        generation_attempts: 0,
        used_fallback: false,
        elapsed_ms: 0,
    }
}
