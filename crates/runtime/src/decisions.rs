//! Decision-point enforcement.
//!
//! Runs once per top-level batch, after execution: if the active player is
//! sitting on a decision square whose required field is still unresolved,
//! the orchestrator synthesizes a system transcript and re-engages the
//! generator. Missing or malformed state degrades to a no-op; enforcement
//! never fails an otherwise-successful batch.
use tracing::{debug, warn};

use tabletalk_core::state::StateView;

use crate::api::ExecutionContext;
use crate::orchestrator::Orchestrator;

impl Orchestrator {
    pub(crate) async fn enforce_decision_points(&self, ctx: ExecutionContext) {
        let snapshot = self.store.snapshot().await;
        let view = StateView::new(&snapshot);

        let Some(player) = view.turn() else {
            return;
        };
        let Some(position) = view.player_position(player) else {
            return;
        };
        let Some(decision) = view.pending_decision(player) else {
            return;
        };
        if !ctx.can_escalate() {
            warn!(
                depth = ctx.depth(),
                player, "decision prompt skipped: recursion budget exhausted"
            );
            return;
        }

        let name = view.player_name(player).unwrap_or(player);
        let transcript = format!(
            "System: {name} (id '{player}') is at position {position} and must decide \
             '{field}' before moving. Ask them: {prompt}",
            field = decision.required_field,
            prompt = decision.prompt,
        );

        debug!(player, position, field = %decision.required_field, "enforcing decision point");
        if !self.process_transcript(transcript, ctx.deeper()).await {
            warn!(player, "decision prompt exchange did not complete");
        }
    }
}
