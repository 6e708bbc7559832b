//! Asynchronous abstractions for the moderator's external collaborators.
//!
//! The orchestrator only ever talks to these traits, so clients can plug in
//! a real LLM client and TTS engine, scripted fixtures, or silent doubles.
use async_trait::async_trait;
use serde_json::Value;

use super::ActivityStatus;
use super::errors::Result;

/// Upstream generator that turns a transcript plus a state snapshot into an
/// ordered batch of raw primitive actions.
///
/// The generator is treated as adversarial: its output is raw JSON and goes
/// through full validation before anything executes. A thrown error or an
/// empty batch is a failed transcript.
#[async_trait]
pub trait ActionGenerator: Send + Sync {
    async fn get_actions(&self, transcript: &str, snapshot: &Value) -> Result<Vec<Value>>;
}

/// Spoken output channel.
#[async_trait]
pub trait Narrator: Send + Sync {
    /// Speaks the text to completion. No cancellation exists: an in-flight
    /// narration cannot be interrupted by a new transcript.
    async fn speak(&self, text: &str) -> Result<()>;

    /// Fire-and-forget sound cue.
    fn play_sound(&self, _effect: &str) {}
}

/// Observability-only activity reporting.
pub trait StatusSink: Send + Sync {
    fn set_status(&self, status: ActivityStatus);
}

/// Narrator that logs instead of speaking. Useful for tests and headless runs.
pub struct NullNarrator;

#[async_trait]
impl Narrator for NullNarrator {
    async fn speak(&self, text: &str) -> Result<()> {
        tracing::debug!(text, "narration suppressed");
        Ok(())
    }
}

/// Status sink that discards every update.
pub struct NullStatusSink;

impl StatusSink for NullStatusSink {
    fn set_status(&self, _status: ActivityStatus) {}
}
