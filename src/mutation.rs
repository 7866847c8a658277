/// Lifecycle of a single mutating action against the server.
///
/// `Applied` and `Failed` are terminal for the attempt; the next user
/// action starts a fresh cycle from `Idle`. A poll tick may later overwrite
/// an applied result with the authoritative server snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MutationState {
    #[default]
    Idle,
    InFlight {
        action: &'static str,
    },
    Applied {
        action: &'static str,
    },
    Failed {
        action: &'static str,
        reason: String,
    },
}

/// Tracks the most recent mutation attempt and enforces its transitions.
#[derive(Debug, Default)]
pub struct MutationTracker {
    state: MutationState,
}

impl MutationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &MutationState {
        &self.state
    }

    pub fn in_flight(&self) -> bool {
        matches!(self.state, MutationState::InFlight { .. })
    }

    /// Start a new attempt. Refused while another is in flight.
    pub fn begin(&mut self, action: &'static str) -> bool {
        if self.in_flight() {
            return false;
        }
        self.state = MutationState::InFlight { action };
        true
    }

    pub fn complete(&mut self) {
        if let MutationState::InFlight { action } = self.state {
            self.state = MutationState::Applied { action };
        }
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        if let MutationState::InFlight { action } = self.state {
            self.state = MutationState::Failed {
                action,
                reason: reason.into(),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_cycle() {
        let mut tracker = MutationTracker::new();
        assert_eq!(*tracker.state(), MutationState::Idle);
        assert!(tracker.begin("send message"));
        assert!(tracker.in_flight());
        tracker.complete();
        assert_eq!(
            *tracker.state(),
            MutationState::Applied {
                action: "send message"
            }
        );
    }

    #[test]
    fn test_failed_cycle_keeps_reason() {
        let mut tracker = MutationTracker::new();
        assert!(tracker.begin("create channel"));
        tracker.fail("Channel name already exists");
        assert_eq!(
            *tracker.state(),
            MutationState::Failed {
                action: "create channel",
                reason: "Channel name already exists".to_string()
            }
        );
    }

    #[test]
    fn test_terminal_states_allow_new_attempt() {
        let mut tracker = MutationTracker::new();
        assert!(tracker.begin("add reaction"));
        tracker.complete();
        assert!(tracker.begin("remove reaction"));
        tracker.fail("nope");
        assert!(tracker.begin("add reaction"));
    }

    #[test]
    fn test_in_flight_blocks_second_attempt() {
        let mut tracker = MutationTracker::new();
        assert!(tracker.begin("send message"));
        assert!(!tracker.begin("send message"));
        // complete/fail only act on an in-flight attempt
        tracker.complete();
        tracker.fail("ignored");
        assert_eq!(
            *tracker.state(),
            MutationState::Applied {
                action: "send message"
            }
        );
    }
}
