//! Web server for the San Diego Python community site.
//!
//! Serves a few local routes (short-link redirects and a Meetup events
//! widget) and proxies everything else to the statically hosted site. Also
//! provides the static-asset collection step used at deploy time.

pub mod assets;
pub mod config;
pub mod error;
pub mod events;
pub mod handler;
pub mod http;
pub mod logger;
pub mod proxy;
pub mod server;

pub use error::{Error, Result};
