//! Core types and the statistics cache engine for the fuelog fill-up log.
//!
//! This crate is deliberately free of database and CLI dependencies. It owns
//! the event and aggregate shapes, the rule deciding which fill-ups yield an
//! efficiency figure, and the routines that keep cached statistics in step
//! with a vehicle's event history.

// Backends implement `FuelStore` with native `async fn`.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod efficiency;
pub mod engine;
pub mod error;
pub mod event;
pub mod store;
pub mod vehicle;

pub use error::{Error, Result};
