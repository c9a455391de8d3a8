pub mod client;
pub mod inference;
pub mod interpreter;
pub mod prompt;

use anyhow::Result;
use futures::future::BoxFuture;

pub use client::GeminiClient;
pub use interpreter::{interpret, Interpretation};
pub use prompt::build_prompt;

/// A text-in, text-out model endpoint.
pub trait CompletionService: Send + Sync {
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String>>;
}
