//! Event RSVP microsite backend.
//!
//! A public form posts RSVPs to `/api/rsvp`; each one is validated,
//! persisted, best-effort registered with an external check-in hub, and
//! confirmed by email (with a QR code when the hub minted one). A
//! password-gated admin surface lists and exports the collected entries.
//!
//! The submission pipeline's contract: once the durable insert succeeds the
//! request succeeds, no matter what the optional collaborators do.

pub mod api;
pub mod auth;
pub mod config;
pub mod csv;
pub mod email;
pub mod error;
pub mod hub;
pub mod qr;
pub mod server;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;
