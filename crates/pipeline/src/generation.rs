//! Port trait for the external generative-text capability.
//!
//! Infrastructure crates implement [`GenerativeTextClient`]; the orchestration
//! layer only ever sees this trait, so every pipeline behaviour can be driven
//! by a deterministic test double.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{GenerationError, StageId};

/// A single prompt sent to the generative-text capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The stage this request belongs to. Used for logging and routing only;
    /// providers must not depend on it for output shape.
    pub stage: StageId,
    /// Stage-specific instructions.
    pub prompt: String,
    /// Findings accumulated by earlier stages, rendered as text.
    pub context: Option<String>,
}

/// External capability that turns a prompt into generated text.
///
/// The call is the pipeline's sole suspension point. Implementations may
/// block for a long time; the orchestrator bounds the wait.
#[async_trait]
pub trait GenerativeTextClient: Send + Sync {
    /// Generates text for `request`.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
