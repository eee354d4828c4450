//! Core types and trait definitions for buildcast.
//!
//! Holds the subscription model (flags, records, the collection), the
//! persistence contract, and the transaction boundary every mutation goes
//! through. This crate is deliberately free of HTTP and database dependencies.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod event;
pub mod flag;
pub mod memory;
pub mod repository;
pub mod snapshot;
pub mod store;
pub mod subscription;
pub mod subscriptions;

pub use error::{Error, Result};
pub use subscription::{Subscription, SubscriptionKey};
pub use subscriptions::Subscriptions;
