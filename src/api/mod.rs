//! HTTP API handlers: public RSVP intake and the admin surface.

pub mod admin;
pub mod rsvp;
