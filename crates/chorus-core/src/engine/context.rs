//! Explicit engine context.
//!
//! `EngineContext` bundles everything a cycle needs besides the mutable
//! orchestration state: the character registry, the response generator, the
//! configuration, the event bus and a cancellation token. It is created once
//! by `init` and handed to every orchestrator call.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use chorus_types::config::ChorusConfig;
use chorus_types::event::ChorusEvent;

use crate::event::EventBus;
use crate::generation::BoxResponseGenerator;
use crate::personality::registry::PersonalityRegistry;

/// Shared, read-only context for the orchestration engine.
///
/// Cloning shares the registry, generator, bus and cancellation token.
#[derive(Debug, Clone)]
pub struct EngineContext {
    /// Identifier for this engine instance, used in log spans.
    pub engine_id: Uuid,
    pub registry: Arc<PersonalityRegistry>,
    pub generator: BoxResponseGenerator,
    pub config: ChorusConfig,
    pub event_bus: EventBus,
    pub cancellation: CancellationToken,
}

impl EngineContext {
    /// Build a context with a fresh event bus and cancellation token.
    pub fn init(
        registry: PersonalityRegistry,
        generator: BoxResponseGenerator,
        config: ChorusConfig,
    ) -> Self {
        let ctx = Self {
            engine_id: Uuid::now_v7(),
            registry: Arc::new(registry),
            generator,
            config,
            event_bus: EventBus::default(),
            cancellation: CancellationToken::new(),
        };
        info!(
            engine_id = %ctx.engine_id,
            characters = ctx.registry.len(),
            generator = ctx.generator.name(),
            "Engine context initialized"
        );
        ctx
    }

    /// Cancel outstanding work and announce shutdown on the event bus.
    pub fn shutdown(&self, processed_count: u64) {
        self.cancellation.cancel();
        self.event_bus
            .publish(ChorusEvent::EngineShutdown { processed_count });
        info!(engine_id = %self.engine_id, processed_count, "Engine shut down");
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }
}
