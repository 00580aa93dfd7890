//! Concrete `ResponseGenerator` implementations.

pub mod template;

pub use template::TemplateGenerator;
