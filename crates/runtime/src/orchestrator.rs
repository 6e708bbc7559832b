//! Transcript-processing orchestrator.
//!
//! Owns the single-flight lock, drives the generator, validates proposed
//! batches against a snapshot, and executes committed actions with automatic
//! board side effects. Any action that must hand control back to the
//! generator (square-effect landing, pending decision) re-enters the same
//! pipeline one depth level down; the depth budget in [`ExecutionContext`]
//! bounds those chains.
//!
//! Failure policy is deliberately asymmetric: validation is fail-fast and
//! all-or-nothing, while execution of a validated batch is best-effort per
//! action. Do not "fix" this into symmetry.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use tabletalk_core::state::{self, StateView, player_target};
use tabletalk_core::{Action, paths, validate_actions};

use crate::api::{
    ActionGenerator, ActivityStatus, ExecutionContext, Narrator, NullNarrator, NullStatusSink,
    Result, RuntimeError, StatusSink,
};
use crate::store::{InMemoryStateStore, StateStore};
use crate::turns::TurnManager;

/// Fixed, non-diagnostic phrase spoken on any failed transcript.
/// Diagnostic detail goes to logs only.
const FAILURE_NOTICE: &str = "Sorry, I couldn't act on that. Please try again.";

/// Orchestrator configuration.
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Maximum recursion depth for chained generator exchanges, fixed per
    /// top-level call.
    pub max_depth: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { max_depth: 5 }
    }
}

/// Composes the validator, executor, board effects, decision enforcement,
/// and turn management behind a single transcript entry point.
pub struct Orchestrator {
    pub(crate) config: OrchestratorConfig,
    pub(crate) template: Value,
    pub(crate) store: Arc<dyn StateStore>,
    pub(crate) generator: Arc<dyn ActionGenerator>,
    pub(crate) narrator: Arc<dyn Narrator>,
    pub(crate) status: Arc<dyn StatusSink>,
    pub(crate) turns: TurnManager,
    busy: AtomicBool,
    pub(crate) resolving_effect: AtomicBool,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Top-level pipeline entry. Returns whether the transcript was fully
    /// processed.
    ///
    /// The lock is a single-flight gate, not a queue: a call arriving while
    /// another transcript is in flight is dropped (and logged) and must be
    /// retried by the caller.
    pub async fn handle_transcript(&self, transcript: &str) -> bool {
        let Some(_guard) = self.try_acquire() else {
            warn!("transcript dropped: another transcript is already being processed");
            return false;
        };
        self.status.set_status(ActivityStatus::Processing);

        let ctx = ExecutionContext::root(self.config.max_depth);
        self.process_transcript(transcript.to_string(), ctx).await
    }

    /// Drives the pipeline with a pre-built raw batch, bypassing the
    /// generator call. Takes the same lock and runs the same top-level
    /// epilogue; intended for tests and scripted sessions.
    pub async fn handle_actions(&self, batch: Vec<Value>) -> bool {
        let Some(_guard) = self.try_acquire() else {
            warn!("action batch dropped: another transcript is already being processed");
            return false;
        };
        self.status.set_status(ActivityStatus::Processing);

        let ctx = ExecutionContext::root(self.config.max_depth);
        let snapshot = self.store.snapshot().await;
        self.run_batch(batch, &snapshot, ctx).await
    }

    /// Observable square-effect flag; exactly the predicate the validator's
    /// contextual roll block reads.
    pub fn is_resolving_effect(&self) -> bool {
        self.resolving_effect.load(Ordering::Acquire)
    }

    fn try_acquire(&self) -> Option<FlightGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .ok()?;
        Some(FlightGuard { orchestrator: self })
    }

    /// Recursive pipeline body. Boxed by hand so square effects and decision
    /// prompts can re-enter it from within action execution.
    pub(crate) fn process_transcript<'a>(
        &'a self,
        transcript: String,
        ctx: ExecutionContext,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async move {
            if ctx.at_ceiling() {
                warn!(depth = ctx.depth(), "recursion ceiling reached; transcript ignored");
                return false;
            }

            let snapshot = self.store.snapshot().await;
            let raw = match self.generator.get_actions(&transcript, &snapshot).await {
                Ok(raw) => raw,
                Err(err) => {
                    error!(%err, "generator call failed");
                    self.speak_failure().await;
                    return false;
                }
            };
            if raw.is_empty() {
                warn!("generator returned an empty batch");
                self.speak_failure().await;
                return false;
            }

            self.run_batch(raw, &snapshot, ctx).await
        })
    }

    /// Validates the raw batch against the snapshot and executes it.
    async fn run_batch(&self, raw: Vec<Value>, snapshot: &Value, ctx: ExecutionContext) -> bool {
        let actions = match validate_actions(&raw, snapshot, self.is_resolving_effect()) {
            Ok(actions) => actions,
            Err(err) => {
                warn!(%err, index = err.index(), "batch rejected");
                self.speak_failure().await;
                return false;
            }
        };

        debug!(count = actions.len(), depth = ctx.depth(), "executing validated batch");
        for action in &actions {
            // Best-effort: a failing action is logged and the rest of the
            // batch still runs.
            if let Err(err) = self.execute_action(action, ctx).await {
                match &err {
                    RuntimeError::OwnershipViolation { .. } | RuntimeError::ProtectedWrite(_) => {
                        error!(%err, "engine invariant violated; this is a validator bug")
                    }
                    _ => warn!(%err, kind = action.kind(), "action failed during execution"),
                }
            }
        }

        if ctx.is_top_level() {
            self.enforce_decision_points(ctx).await;
            if let Some(next) = self.turns.advance_turn(self.is_resolving_effect()).await {
                info!(player = %next.player_id, name = %next.name, "turn advanced");
            }
        }

        true
    }

    async fn execute_action(&self, action: &Action, ctx: ExecutionContext) -> Result<()> {
        debug!(kind = action.kind(), depth = ctx.depth(), "executing action");
        match action {
            Action::Narrate { text, sound_effect } => {
                if let Some(effect) = sound_effect {
                    self.narrator.play_sound(effect);
                }
                self.status.set_status(ActivityStatus::Speaking);
                let spoken = self.narrator.speak(text).await;
                self.status.set_status(ActivityStatus::Processing);
                spoken
            }
            Action::SetState { path, value } => {
                if state::is_protected_write(path) {
                    return Err(RuntimeError::ProtectedWrite(path.clone()));
                }
                if let Some((player, _)) = player_target(path) {
                    self.turns.assert_ownership(player).await?;
                }
                self.store.set(path, value.clone()).await;

                // A successful position write triggers the automatic board
                // mechanics: deterministic move remap, then square effects.
                if let Some((player, "position")) = player_target(path) {
                    let player = player.to_string();
                    self.check_and_apply_board_moves(&player).await;
                    self.check_and_apply_square_effects(&player, ctx).await;
                }
                Ok(())
            }
            Action::PlayerRolled { value } => {
                self.store.set(state::GAME_LAST_ROLL, json!(value)).await;
                Ok(())
            }
            Action::PlayerAnswered { answer } => {
                self.store
                    .set(state::GAME_LAST_ANSWER, json!(answer.trim()))
                    .await;
                Ok(())
            }
            Action::ResetGame { keep_player_names } => {
                self.reset_game(*keep_player_names).await;
                Ok(())
            }
        }
    }

    /// Replaces the whole state with the session template, optionally
    /// re-applying the captured player display names.
    async fn reset_game(&self, keep_player_names: bool) {
        info!(keep_player_names, "resetting game state from template");

        let captured: Vec<(String, String)> = if keep_player_names {
            let snapshot = self.store.snapshot().await;
            let view = StateView::new(&snapshot);
            view.player_ids()
                .into_iter()
                .filter_map(|id| {
                    view.player_name(id)
                        .map(|name| (id.to_string(), name.to_string()))
                })
                .collect()
        } else {
            Vec::new()
        };

        self.store.reset(self.template.clone()).await;

        if captured.is_empty() {
            return;
        }
        let fresh = self.store.snapshot().await;
        for (id, name) in captured {
            // Ids absent from the fresh template are silently skipped.
            if paths::path_exists(&fresh, &format!("players.{id}")) {
                self.store
                    .set(&format!("players.{id}.name"), json!(name))
                    .await;
            }
        }
    }

    pub(crate) async fn speak_failure(&self) {
        self.status.set_status(ActivityStatus::Speaking);
        if let Err(err) = self.narrator.speak(FAILURE_NOTICE).await {
            warn!(%err, "failure notice could not be spoken");
        }
        self.status.set_status(ActivityStatus::Processing);
    }
}

/// Releases the single-flight lock and resets status on every exit path,
/// including panics inside the pipeline.
struct FlightGuard<'a> {
    orchestrator: &'a Orchestrator,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.orchestrator.busy.store(false, Ordering::Release);
        self.orchestrator
            .status
            .set_status(ActivityStatus::Idle);
    }
}

/// Builder for [`Orchestrator`] with flexible collaborator wiring.
pub struct OrchestratorBuilder {
    config: OrchestratorConfig,
    template: Option<Value>,
    store: Option<Arc<dyn StateStore>>,
    generator: Option<Arc<dyn ActionGenerator>>,
    narrator: Option<Arc<dyn Narrator>>,
    status: Option<Arc<dyn StatusSink>>,
}

impl OrchestratorBuilder {
    fn new() -> Self {
        Self {
            config: OrchestratorConfig::default(),
            template: None,
            store: None,
            generator: None,
            narrator: None,
            status: None,
        }
    }

    /// Override orchestrator configuration.
    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Shorthand for overriding just the recursion budget.
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Game-definition template the session state is seeded from and that
    /// `RESET_GAME` restores.
    pub fn template(mut self, template: Value) -> Self {
        self.template = Some(template);
        self
    }

    /// Custom state store. If omitted, an [`InMemoryStateStore`] seeded with
    /// the template is used. A provided store is reset to the template at
    /// build time (session start).
    pub fn store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Required upstream generator.
    pub fn generator(mut self, generator: Arc<dyn ActionGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Spoken-output collaborator (defaults to [`NullNarrator`]).
    pub fn narrator(mut self, narrator: Arc<dyn Narrator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    /// Activity reporting collaborator (defaults to [`NullStatusSink`]).
    pub fn status(mut self, status: Arc<dyn StatusSink>) -> Self {
        self.status = Some(status);
        self
    }

    /// Build the orchestrator, seeding the store from the template.
    pub async fn build(self) -> Result<Orchestrator> {
        let template = self
            .template
            .ok_or(RuntimeError::MissingCollaborator("template"))?;
        if !template.is_object() {
            return Err(RuntimeError::InvalidTemplate);
        }
        let generator = self
            .generator
            .ok_or(RuntimeError::MissingCollaborator("generator"))?;
        let narrator = self.narrator.unwrap_or_else(|| Arc::new(NullNarrator));
        let status = self.status.unwrap_or_else(|| Arc::new(NullStatusSink));

        let store: Arc<dyn StateStore> = match self.store {
            Some(store) => {
                store.reset(template.clone()).await;
                store
            }
            None => Arc::new(InMemoryStateStore::new(template.clone())),
        };
        let turns = TurnManager::new(Arc::clone(&store));

        Ok(Orchestrator {
            config: self.config,
            template,
            store,
            generator,
            narrator,
            status,
            turns,
            busy: AtomicBool::new(false),
            resolving_effect: AtomicBool::new(false),
        })
    }
}
