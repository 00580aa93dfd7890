//! ResponseGenerator trait definition.
//!
//! This is the boundary to whatever produces character text (an LLM client,
//! a template engine, a test double). Uses native async fn in traits (RPITIT)
//! like the rest of the crate's ports; `BoxResponseGenerator` provides the
//! object-safe wrapper.

use chorus_types::generation::{GeneratedResponse, GenerationError, GenerationRequest};

/// Trait for text generation backends.
///
/// Implementations live outside the core (e.g. the offline template
/// generator in chorus-infra).
pub trait ResponseGenerator: Send + Sync {
    /// Human-readable backend name (e.g. "template").
    fn name(&self) -> &str;

    /// Produce one candidate reply for the request.
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl std::future::Future<Output = Result<GeneratedResponse, GenerationError>> + Send;
}
