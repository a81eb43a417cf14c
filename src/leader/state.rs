use std::fmt;

/// Lifecycle position of a [`LeaderCoordinator`](crate::LeaderCoordinator),
/// observable through [`subscribe`](crate::LeaderCoordinator::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatorState {
    /// Never started.
    #[default]
    Idle,
    /// Running, trying to take the lease.
    Acquiring,
    /// Holding the lease; the candidate's work task is active.
    Leading { fencing_token: Option<u64> },
    /// Giving the lease up after a yield or shutdown.
    Relinquishing,
    /// Control loop has exited.
    Stopped,
}

impl CoordinatorState {
    pub fn is_leading(&self) -> bool {
        matches!(self, CoordinatorState::Leading { .. })
    }
}

impl fmt::Display for CoordinatorState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            CoordinatorState::Idle => write!(f, "idle"),
            CoordinatorState::Acquiring => write!(f, "acquiring"),
            CoordinatorState::Leading {
                fencing_token: Some(token),
            } => write!(f, "leading(token={token})"),
            CoordinatorState::Leading { fencing_token: None } => write!(f, "leading"),
            CoordinatorState::Relinquishing => write!(f, "relinquishing"),
            CoordinatorState::Stopped => write!(f, "stopped"),
        }
    }
}
