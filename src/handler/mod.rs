//! Request handler module
//!
//! Request routing dispatch and the Meetup widget. Unmatched requests are
//! handed to the proxy fallback.

pub mod router;
pub mod widget;

// Re-export main entry point
pub use router::handle_request;
