//! Character workflow: one engagement attempt for one character.
//!
//! `CharacterWorkflow::run` walks the state machine
//!
//! ```text
//! Init -> AnalyzeRelevance -> Decide -> Generate -> Validate -> FormatOutput -> Done
//!                               |          ^            |
//!                               |          +-- retry ---+   (bounded)
//!                               +-> Done (Ignore / Defer)
//! ```
//!
//! Any step may end in the terminal `Error` step instead. The only retry is
//! the bounded Generate/Validate loop; generator failures and timeouts are
//! never retried here.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use chorus_types::character::CharacterState;
use chorus_types::config::{ChorusConfig, MAX_VALIDATION_RETRIES};
use chorus_types::content::ContentItem;
use chorus_types::generation::{GenerationError, GenerationRequest};
use chorus_types::workflow::{
    DeferReason, EngagementDecision, FailureKind, WorkflowFailure, WorkflowResult, WorkflowStep,
};

use crate::generation::BoxResponseGenerator;
use crate::personality::{EngagementContext, PersonalityProfile};
use crate::thread::SharedThread;

use super::rate_limit::check_rate_limit;
use super::validate::{format_output, validate_response};

/// What the character is being asked to react to.
#[derive(Clone)]
pub enum EngagementTarget {
    /// A fresh content item.
    Content(Arc<ContentItem>),
    /// A reply opportunity inside an existing thread about `content`.
    ThreadReply {
        thread: SharedThread,
        content: Arc<ContentItem>,
    },
}

impl EngagementTarget {
    pub fn content(&self) -> &ContentItem {
        match self {
            EngagementTarget::Content(content) => content,
            EngagementTarget::ThreadReply { content, .. } => content,
        }
    }

    pub fn thread(&self) -> Option<&SharedThread> {
        match self {
            EngagementTarget::Content(_) => None,
            EngagementTarget::ThreadReply { thread, .. } => Some(thread),
        }
    }

    pub fn is_thread_reply(&self) -> bool {
        matches!(self, EngagementTarget::ThreadReply { .. })
    }
}

/// Tunables for a workflow run, derived from [`ChorusConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSettings {
    /// Timeout wrapped around every generator call.
    pub generation_timeout: Duration,
    /// Extra generation attempts after a failed validation.
    pub max_validation_retries: u32,
    /// Replies from other characters included in a thread context.
    pub max_context_replies: usize,
    /// Map generator failures to a canned fallback line.
    pub always_respond: bool,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self::from(&ChorusConfig::default())
    }
}

impl From<&ChorusConfig> for WorkflowSettings {
    fn from(config: &ChorusConfig) -> Self {
        Self {
            generation_timeout: Duration::from_secs(config.generation_timeout_secs.max(1)),
            max_validation_retries: config.max_validation_retries.min(MAX_VALIDATION_RETRIES),
            max_context_replies: config.max_context_replies,
            always_respond: config.always_respond,
        }
    }
}

/// Runs engagement attempts against a shared generator.
///
/// Cheap to clone: the generator is reference counted.
#[derive(Debug, Clone)]
pub struct CharacterWorkflow {
    generator: BoxResponseGenerator,
    settings: WorkflowSettings,
}

/// Thread details captured during AnalyzeRelevance for the reply path.
struct ThreadView {
    thread_id: Uuid,
    context: String,
    excerpt: Option<String>,
}

impl CharacterWorkflow {
    pub fn new(generator: BoxResponseGenerator, settings: WorkflowSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Run one engagement attempt.
    ///
    /// `state` must be the character's own state; it is updated in place
    /// (confidence, step, error, and interaction bookkeeping on Engage).
    /// `history` holds the character's recent outputs, newest last.
    pub async fn run(
        &self,
        personality: &dyn PersonalityProfile,
        state: &mut CharacterState,
        target: &EngagementTarget,
        history: &[String],
    ) -> WorkflowResult {
        let start = Instant::now();
        let now = Utc::now();
        let character_id = personality.id().to_string();
        let content = target.content();

        state.begin_run();
        let mut result = WorkflowResult {
            character_id: character_id.clone(),
            content_id: content.id.clone(),
            thread_id: None,
            success: true,
            decision: EngagementDecision::Ignore,
            generated_text: None,
            error: None,
            defer_reason: None,
            step_reached: WorkflowStep::Init,
            generation_attempts: 0,
            used_fallback: false,
            elapsed_ms: 0,
        };

        // AnalyzeRelevance
        enter(state, &mut result, WorkflowStep::AnalyzeRelevance);
        let (engagement_ctx, thread_view) = match target.thread() {
            Some(thread) => {
                let guard = thread.lock().await;
                let view = ThreadView {
                    thread_id: guard.thread_id(),
                    context: guard
                        .thread_context_with_limit(&character_id, self.settings.max_context_replies),
                    excerpt: guard.latest_excerpt_for(&character_id),
                };
                let ctx = EngagementContext::thread_reply(
                    view.context.clone(),
                    guard.reply_count(&character_id),
                    now,
                );
                (ctx, Some(view))
            }
            None => (EngagementContext::content(now), None),
        };
        result.thread_id = thread_view.as_ref().map(|v| v.thread_id);

        let confidence = personality.engagement_probability(&engagement_ctx, history, content);
        state.set_decision_confidence(confidence);

        // Decide
        enter(state, &mut result, WorkflowStep::Decide);
        let decision = self.decide(personality, state, target, now).await;
        match decision {
            Decision::Ignore => {
                debug!(
                    character_id = %character_id,
                    confidence = state.decision_confidence(),
                    threshold = personality.engagement_threshold(),
                    "Below engagement threshold, ignoring"
                );
                result.decision = EngagementDecision::Ignore;
                return finish(state, result, start);
            }
            Decision::Defer(reason) => {
                debug!(character_id = %character_id, %reason, "Deferring engagement");
                result.decision = EngagementDecision::Defer;
                result.defer_reason = Some(reason);
                return finish(state, result, start);
            }
            Decision::Engage => {
                result.decision = EngagementDecision::Engage;
            }
        }

        // Generate -> Validate (bounded retry)
        let generated = self
            .generate_validated(personality, state, &mut result, content, thread_view.as_ref())
            .await;

        let text = match generated {
            Ok(text) => text,
            Err(failure) => {
                let fallback = (self.settings.always_respond
                    && failure.kind == FailureKind::ExternalServiceFailure)
                    .then(|| pick_fallback(personality, state))
                    .flatten();
                match fallback {
                    Some(line) => {
                        warn!(
                            character_id = %character_id,
                            error = %failure,
                            "Generator failed, using fallback response"
                        );
                        result.used_fallback = true;
                        result.error = Some(failure);
                        line
                    }
                    None => {
                        warn!(character_id = %character_id, error = %failure, "Workflow failed");
                        return fail(state, result, failure, start);
                    }
                }
            }
        };

        // FormatOutput
        enter(state, &mut result, WorkflowStep::FormatOutput);
        let message = format_output(&text);
        if let Some(thread) = target.thread() {
            let stored = thread.lock().await.add_character_reply_at(&character_id, message.clone(), now);
            if !stored {
                debug!(character_id = %character_id, "Thread cap reached before reply was stored");
                result.decision = EngagementDecision::Defer;
                result.defer_reason = Some(DeferReason::ThreadCap);
                result.used_fallback = false;
                result.error = None;
                return finish(state, result, start);
            }
        }
        state.record_interaction(now, personality.cooldown_minutes());
        result.generated_text = Some(message);

        finish(state, result, start)
    }

    async fn decide(
        &self,
        personality: &dyn PersonalityProfile,
        state: &CharacterState,
        target: &EngagementTarget,
        now: DateTime<Utc>,
    ) -> Decision {
        if let Some(thread) = target.thread() {
            if !thread.lock().await.can_character_reply(personality.id()) {
                return Decision::Defer(DeferReason::ThreadCap);
            }
        }
        if state.decision_confidence() < personality.engagement_threshold() {
            return Decision::Ignore;
        }
        match check_rate_limit(state, personality, now) {
            Some(reason) => Decision::Defer(reason),
            None => Decision::Engage,
        }
    }

    /// Call the generator until a response validates or attempts run out.
    async fn generate_validated(
        &self,
        personality: &dyn PersonalityProfile,
        state: &mut CharacterState,
        result: &mut WorkflowResult,
        content: &ContentItem,
        thread: Option<&ThreadView>,
    ) -> Result<String, WorkflowFailure> {
        let max_attempts = self
            .settings
            .max_validation_retries
            .min(MAX_VALIDATION_RETRIES)
            .saturating_add(1);
        let snapshot = personality.snapshot();
        let context_text = match thread {
            Some(view) => view.context.clone(),
            None => content.text(),
        };

        for attempt in 1..=max_attempts {
            enter(state, result, WorkflowStep::Generate);
            result.generation_attempts = attempt;

            let request = GenerationRequest {
                personality: snapshot.clone(),
                context_text: context_text.clone(),
                prior_thread_excerpt: thread.and_then(|v| v.excerpt.clone()),
                target_topic: content.primary_topic().map(str::to_string),
                attempt,
            };

            let response = match tokio::time::timeout(
                self.settings.generation_timeout,
                self.generator.generate(&request),
            )
            .await
            {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    return Err(WorkflowFailure::new(
                        FailureKind::ExternalServiceFailure,
                        e.to_string(),
                    ));
                }
                Err(_) => {
                    let e = GenerationError::Timeout {
                        timeout_ms: self.settings.generation_timeout.as_millis() as u64,
                    };
                    return Err(WorkflowFailure::new(
                        FailureKind::ExternalServiceFailure,
                        e.to_string(),
                    ));
                }
            };

            enter(state, result, WorkflowStep::Validate);
            match validate_response(&response, personality.signature_phrases()) {
                Ok(()) => return Ok(response.text),
                Err(rejection) => {
                    debug!(
                        character_id = personality.id(),
                        attempt,
                        max_attempts,
                        reason = %rejection,
                        "Generated response failed validation"
                    );
                }
            }
        }

        Err(WorkflowFailure::new(
            FailureKind::ValidationFailure,
            format!("no in-character response after {max_attempts} attempts"),
        ))
    }
}

enum Decision {
    Engage,
    Ignore,
    Defer(DeferReason),
}

fn enter(state: &mut CharacterState, result: &mut WorkflowResult, step: WorkflowStep) {
    state.current_step = step;
    result.step_reached = step;
}

fn finish(state: &mut CharacterState, mut result: WorkflowResult, start: Instant) -> WorkflowResult {
    state.current_step = WorkflowStep::Done;
    if result.step_reached == WorkflowStep::FormatOutput {
        result.step_reached = WorkflowStep::Done;
    }
    result.elapsed_ms = start.elapsed().as_millis() as u64;
    result
}

fn fail(
    state: &mut CharacterState,
    mut result: WorkflowResult,
    failure: WorkflowFailure,
    start: Instant,
) -> WorkflowResult {
    state.current_step = WorkflowStep::Error;
    state.last_error = Some(failure.to_string());
    result.success = false;
    result.step_reached = WorkflowStep::Error;
    result.generated_text = None;
    result.error = Some(failure);
    result.elapsed_ms = start.elapsed().as_millis() as u64;
    result
}

/// Rotate through the fallback lines by interaction count.
fn pick_fallback(personality: &dyn PersonalityProfile, state: &CharacterState) -> Option<String> {
    let lines = personality.fallback_responses();
    if lines.is_empty() {
        return None;
    }
    let index = (state.interaction_count % lines.len() as u64) as usize;
    lines.into_iter().nth(index)
}
