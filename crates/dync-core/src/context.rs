//! Per-request caller context.
//!
//! The authentication layer in front of the daemon resolves the caller
//! and attaches this context to every operation; the core never inspects
//! credentials itself.

/// Identity and authorization flags for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// The caller's identity, compared against cluster creator/owner.
    pub user: String,
    /// Administrative override: disables the creator-visibility filter
    /// and the owner check on teardown.
    pub ignore_ownership: bool,
}

impl RequestContext {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ignore_ownership: false,
        }
    }

    pub fn with_ignore_ownership(mut self, ignore: bool) -> Self {
        self.ignore_ownership = ignore;
        self
    }
}
