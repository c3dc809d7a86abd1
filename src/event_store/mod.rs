//! Event Store Module
//!
//! Append-only log of timestamped usage events. The store is purely
//! in-memory; durability is handled by `storage`, which snapshots the
//! log together with the counters.
//!
//! ```text
//! record ──► append(event) ──► events[] (arrival order)
//!                         └──► by_time index (occurred_at -> positions)
//!
//! stats  ──► query_since(window start) ──► range lookup on by_time
//! ```

mod store;

pub use store::EventStore;
