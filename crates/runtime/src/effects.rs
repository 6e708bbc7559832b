//! Automatic board mechanics triggered by position writes.
//!
//! Both checks run after every successful write to `players.<id>.position`:
//! first the deterministic move remap, then the square-effect escalation.
//! The generator neither observes nor can prevent either.
use std::sync::atomic::Ordering;

use serde_json::json;
use tracing::{debug, warn};

use tabletalk_core::state::StateView;

use crate::api::ExecutionContext;
use crate::orchestrator::Orchestrator;

impl Orchestrator {
    /// Applies the configured board move for the player's current square, if
    /// any. Single hop only: the destination's own move entry is not chased.
    pub(crate) async fn check_and_apply_board_moves(&self, player: &str) {
        let snapshot = self.store.snapshot().await;
        let view = StateView::new(&snapshot);

        let Some(position) = view.player_position(player) else {
            return;
        };
        let Some(destination) = view.board_move(position) else {
            return;
        };
        if destination == position {
            return;
        }

        // Classification is log-only; both kinds apply identically.
        let kind = if destination > position { "ladder" } else { "snake" };
        debug!(player, position, destination, kind, "board move applied");
        self.store
            .set(&format!("players.{player}.position"), json!(destination))
            .await;
    }

    /// Hands control back to the generator when the player landed on a square
    /// with a non-empty effect descriptor. While the recursive pass runs, the
    /// observable resolving flag is set; it is cleared on every exit path and
    /// is exactly the predicate behind the validator's roll block.
    pub(crate) async fn check_and_apply_square_effects(
        &self,
        player: &str,
        ctx: ExecutionContext,
    ) {
        let snapshot = self.store.snapshot().await;
        let view = StateView::new(&snapshot);

        let Some(position) = view.player_position(player) else {
            return;
        };
        let Some(descriptor) = view.square_effect(position) else {
            return;
        };
        if !ctx.can_escalate() {
            warn!(
                depth = ctx.depth(),
                player, position, "square effect skipped: recursion budget exhausted"
            );
            return;
        }

        let transcript = format!(
            "System: player '{player}' landed on square {position} which has an effect: \
             {descriptor}. Apply the effect now."
        );

        debug!(player, position, "resolving square effect");
        let _guard = self.begin_effect();
        if !self.process_transcript(transcript, ctx.deeper()).await {
            debug!(player, position, "square effect pass did not complete");
        }
    }

    fn begin_effect(&self) -> EffectGuard<'_> {
        let was_resolving = self.resolving_effect.swap(true, Ordering::AcqRel);
        EffectGuard {
            orchestrator: self,
            was_resolving,
        }
    }
}

/// Restores the prior flag value on every exit path, so a nested effect
/// pass does not clear the flag out from under the pass that spawned it.
struct EffectGuard<'a> {
    orchestrator: &'a Orchestrator,
    was_resolving: bool,
}

impl Drop for EffectGuard<'_> {
    fn drop(&mut self) {
        self.orchestrator
            .resolving_effect
            .store(self.was_resolving, Ordering::Release);
    }
}
