//! HTTP surface.
//!
//! - `GET /` - service details
//! - `GET /api/data?fields=...&v=1` - run an aggregation query

mod server;

pub use server::{router, serve, AppState};
