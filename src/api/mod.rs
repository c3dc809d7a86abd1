//! API module for HTTP endpoints
//!
//! REST endpoints used by the jukebox web client, plus static file serving.

pub mod http;
pub mod rest;
pub mod state;

pub use http::create_router;
pub use state::AppState;
