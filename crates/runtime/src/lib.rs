//! Async orchestration for the voice-driven game moderator.
//!
//! This crate wires the collaborator abstractions (generator, narrator,
//! status sink, state store) into the transcript-processing pipeline.
//! Consumers build an [`Orchestrator`] and feed it transcripts; everything
//! else (validation, board mechanics, recursive generator exchanges, turn
//! advancement) happens behind [`Orchestrator::handle_transcript`].
//!
//! Modules are organized by responsibility:
//! - [`api`] exposes the traits and types downstream clients interact with
//! - [`orchestrator`] hosts the pipeline and builder
//! - [`store`] provides the shared dot-path state store
//! - [`turns`] is the sole authority for turn advancement and ownership
//! - board effects and decision enforcement stay internal to the crate
pub mod api;
pub mod orchestrator;
pub mod store;
pub mod turns;

mod decisions;
mod effects;

pub use api::{
    ActionGenerator, ActivityStatus, ExecutionContext, Narrator, NullNarrator, NullStatusSink,
    Result, RuntimeError, StatusSink,
};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, OrchestratorConfig};
pub use store::{InMemoryStateStore, StateStore};
pub use turns::{NextTurn, TurnManager};
