//! Application state shared across HTTP handlers.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::Sessions;
use crate::config::Config;
use crate::email::Mailer;
use crate::hub::CheckinHub;
use crate::store::EntryStore;

/// Application state cloned into every handler.
///
/// Holds the immutable configuration plus the collaborator handles behind
/// trait objects so tests can substitute mocks. `hub` is `None` when the
/// check-in hub triple is not configured; the pipeline then skips
/// enrichment entirely.
#[derive(Clone)]
pub struct AppState {
    /// Admin credential validation and session issue/verify.
    pub sessions: Sessions,
    /// Entry persistence.
    pub store: Arc<dyn EntryStore>,
    /// Check-in hub collaborator; `None` disables enrichment.
    pub hub: Option<Arc<dyn CheckinHub>>,
    /// Confirmation email collaborator.
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Assemble state from the loaded configuration and collaborators.
    #[must_use]
    pub fn new(
        config: &Config,
        store: Arc<dyn EntryStore>,
        hub: Option<Arc<dyn CheckinHub>>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            sessions: Sessions::new(&config.admin),
            store,
            hub,
            mailer,
        }
    }
}

impl FromRef<AppState> for Sessions {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
