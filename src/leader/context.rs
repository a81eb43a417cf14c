use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::debug;

/// Tokens issued by backends start at 1; 0 encodes "no token".
const NO_FENCING_TOKEN: u64 = 0;

struct ContextState {
    role: String,
    candidate_id: String,
    is_leader: AtomicBool,
    relinquish_requested: AtomicBool,
    fencing_token: AtomicU64,
}

/// Handle given to a [`Candidate`](crate::Candidate) for the duration of its
/// leadership.
///
/// A thin view over the coordinator's leadership flags: cloning is cheap and
/// every clone observes the same state. Reads may lag the backend by up to
/// one heartbeat interval; callers that need strict exclusion should pass
/// [`fencing_token`](Self::fencing_token) to the resource they protect.
#[derive(Clone)]
pub struct LeadershipContext {
    inner: Arc<ContextState>,
}

impl LeadershipContext {
    pub(crate) fn new(
        role: impl Into<String>,
        candidate_id: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(ContextState {
                role: role.into(),
                candidate_id: candidate_id.into(),
                is_leader: AtomicBool::new(false),
                relinquish_requested: AtomicBool::new(false),
                fencing_token: AtomicU64::new(NO_FENCING_TOKEN),
            }),
        }
    }

    pub fn is_leader(&self) -> bool {
        self.inner.is_leader.load(Ordering::SeqCst)
    }

    /// Requests voluntary resignation.
    ///
    /// No-op unless currently leader. Never blocks: the lease is released on
    /// the next control loop tick. Returns whether a request was registered.
    pub fn yield_leadership(&self) -> bool {
        if !self.is_leader() {
            return false;
        }
        debug!(role = %self.inner.role, id = %self.inner.candidate_id, "leadership yield requested");
        self.inner.relinquish_requested.store(true, Ordering::SeqCst);
        true
    }

    pub fn role(&self) -> &str {
        &self.inner.role
    }

    pub fn candidate_id(&self) -> &str {
        &self.inner.candidate_id
    }

    /// Fencing token of the current leadership term, if the backend issues one
    pub fn fencing_token(&self) -> Option<u64> {
        match self.inner.fencing_token.load(Ordering::SeqCst) {
            NO_FENCING_TOKEN => None,
            token => Some(token),
        }
    }

    pub(crate) fn set_leader(
        &self,
        is_leader: bool,
    ) {
        self.inner.is_leader.store(is_leader, Ordering::SeqCst);
    }

    pub(crate) fn set_fencing_token(
        &self,
        token: Option<u64>,
    ) {
        self.inner
            .fencing_token
            .store(token.unwrap_or(NO_FENCING_TOKEN), Ordering::SeqCst);
    }

    /// Unconditional request, used by the work task when `on_granted` fails
    pub(crate) fn request_relinquish(&self) {
        self.inner.relinquish_requested.store(true, Ordering::SeqCst);
    }

    /// Consumes a pending request
    pub(crate) fn take_relinquish_request(&self) -> bool {
        self.inner.relinquish_requested.swap(false, Ordering::SeqCst)
    }

    pub(crate) fn clear_relinquish_request(&self) {
        self.inner.relinquish_requested.store(false, Ordering::SeqCst);
    }
}

impl fmt::Display for LeadershipContext {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "LeadershipContext{{role={}, id={}, is_leader={}}}",
            self.role(),
            self.candidate_id(),
            self.is_leader()
        )
    }
}

impl fmt::Debug for LeadershipContext {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("LeadershipContext")
            .field("role", &self.role())
            .field("candidate_id", &self.candidate_id())
            .field("is_leader", &self.is_leader())
            .field("fencing_token", &self.fencing_token())
            .finish()
    }
}
