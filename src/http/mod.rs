//! HTTP protocol layer module
//!
//! Response builders and the pooled outbound client, shared by the widget
//! handlers and the proxy fallback.

pub mod client;
pub mod response;

// Re-export commonly used types
pub use response::{
    build_400_response, build_404_response, build_405_response, build_413_response, build_500_response,
    build_502_response, build_cors_response, build_redirect_response,
};
