//! Historical depth replay library.
//!
//! This crate provides the core types and logic used by the `depth_replay`
//! backtest runner and the `player` tool:
//!
//! - `event`: the capability set every market observation exposes
//!   (timestamp, symbol, exchange) and the replay ordering
//! - `depth`: order-book depth snapshots with best-level derived quantities
//! - `stream`: the replay stream that delivers events in time order while
//!   tracking the latest observation and full history per symbol
//! - `loader`: CSV depth loading, sequential or in parallel across files
//! - `strategy`: lifecycle hooks and the backtest driver loop
//!
//! Replay is deterministic: a sorted backlog always drains in the same order,
//! and `ReplayStream::reset` makes a second pass identical to the first.
pub mod depth;
pub mod error;
pub mod event;
pub mod loader;
pub mod strategy;
pub mod stream;
