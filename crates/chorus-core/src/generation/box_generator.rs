//! BoxResponseGenerator -- object-safe dynamic dispatch wrapper for ResponseGenerator.
//!
//! 1. Define an object-safe `ResponseGeneratorDyn` trait with boxed futures
//! 2. Blanket-impl `ResponseGeneratorDyn` for all `T: ResponseGenerator`
//! 3. `BoxResponseGenerator` wraps `Arc<dyn ResponseGeneratorDyn>` and delegates
//!
//! The inner value is reference counted so the wrapper can be cloned into
//! every spawned character workflow task.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chorus_types::generation::{GeneratedResponse, GenerationError, GenerationRequest};

use super::generator::ResponseGenerator;

/// Object-safe version of [`ResponseGenerator`] with boxed futures.
pub trait ResponseGeneratorDyn: Send + Sync {
    fn name(&self) -> &str;

    fn generate_boxed<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<GeneratedResponse, GenerationError>> + Send + 'a>>;
}

/// Blanket implementation: any `ResponseGenerator` automatically implements `ResponseGeneratorDyn`.
impl<T: ResponseGenerator> ResponseGeneratorDyn for T {
    fn name(&self) -> &str {
        ResponseGenerator::name(self)
    }

    fn generate_boxed<'a>(
        &'a self,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<GeneratedResponse, GenerationError>> + Send + 'a>> {
        Box::pin(self.generate(request))
    }
}

/// Type-erased, cheaply cloneable response generator.
#[derive(Clone)]
pub struct BoxResponseGenerator {
    inner: Arc<dyn ResponseGeneratorDyn>,
}

impl BoxResponseGenerator {
    /// Wrap a concrete `ResponseGenerator` in a type-erased handle.
    pub fn new<T: ResponseGenerator + 'static>(generator: T) -> Self {
        Self {
            inner: Arc::new(generator),
        }
    }

    /// Human-readable backend name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Produce one candidate reply for the request.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedResponse, GenerationError> {
        self.inner.generate_boxed(request).await
    }
}

impl std::fmt::Debug for BoxResponseGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxResponseGenerator")
            .field("name", &self.inner.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_types::generation::PersonalitySnapshot;

    struct EchoGenerator;

    impl ResponseGenerator for EchoGenerator {
        fn name(&self) -> &str {
            "echo"
        }

        fn generate(
            &self,
            request: &GenerationRequest,
        ) -> impl Future<Output = Result<GeneratedResponse, GenerationError>> + Send {
            let text = format!("echo: {}", request.context_text);
            async move {
                Ok(GeneratedResponse {
                    text,
                    confidence: 1.0,
                    consistency_flag: true,
                    latency_ms: 0,
                })
            }
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            personality: PersonalitySnapshot {
                character_id: "ada".to_string(),
                display_name: "Ada".to_string(),
                voice: "dry".to_string(),
                interests: vec![],
                signature_phrases: vec![],
            },
            context_text: "hello".to_string(),
            prior_thread_excerpt: None,
            target_topic: None,
            attempt: 1,
        }
    }

    #[tokio::test]
    async fn boxed_generator_delegates() {
        let generator = BoxResponseGenerator::new(EchoGenerator);
        assert_eq!(generator.name(), "echo");
        let response = generator.generate(&request()).await.unwrap();
        assert_eq!(response.text, "echo: hello");
    }

    #[tokio::test]
    async fn clones_share_the_same_backend() {
        let generator = BoxResponseGenerator::new(EchoGenerator);
        let clone = generator.clone();
        let handle = tokio::spawn(async move { clone.generate(&request()).await });
        let response = handle.await.unwrap().unwrap();
        assert!(response.consistency_flag);
        assert_eq!(format!("{generator:?}"), "BoxResponseGenerator { name: \"echo\" }");
    }
}
