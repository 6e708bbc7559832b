//! Public API surface: collaborator traits and shared pipeline types.
mod errors;
mod providers;

pub use errors::{Result, RuntimeError};
pub use providers::{ActionGenerator, Narrator, NullNarrator, NullStatusSink, StatusSink};

/// Coarse activity indicator for observability surfaces (UI, status lights).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityStatus {
    Idle,
    Processing,
    Speaking,
}

/// Recursion bookkeeping threaded through every re-entrant pipeline call.
///
/// The depth budget is the only defense against unbounded recursive chains
/// (a square effect landing on another effect square, and so on). Two
/// thresholds apply: at `max_depth - 1` no *new* generator exchange may be
/// started, and at `max_depth` nothing executes at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutionContext {
    depth: u32,
    max_depth: u32,
}

impl ExecutionContext {
    /// Context for a fresh top-level call. `max_depth` is fixed for the
    /// whole call tree.
    pub fn root(max_depth: u32) -> Self {
        Self {
            depth: 0,
            max_depth,
        }
    }

    /// Context for one recursive re-entry below this one.
    pub fn deeper(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn is_top_level(&self) -> bool {
        self.depth == 0
    }

    /// No further actions may execute at this depth.
    pub fn at_ceiling(&self) -> bool {
        self.depth >= self.max_depth
    }

    /// Whether another recursive generator exchange may still be started.
    pub fn can_escalate(&self) -> bool {
        self.depth + 1 < self.max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::ExecutionContext;

    #[test]
    fn depth_thresholds() {
        let root = ExecutionContext::root(2);
        assert!(root.is_top_level());
        assert!(root.can_escalate());
        assert!(!root.at_ceiling());

        let one = root.deeper();
        assert!(!one.can_escalate());
        assert!(!one.at_ceiling());

        let two = one.deeper();
        assert!(two.at_ceiling());
    }
}
