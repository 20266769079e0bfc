//! Core types, rules and trait definitions for the Bubble exposure engine.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! graph closure, ledger window and status derivation are pure functions;
//! storage backends call them from inside their own transactions.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod graph;
pub mod ledger;
pub mod status;
pub mod store;
pub mod user;

pub use error::{Error, Result};
