//! Minder library — re-exports modules for integration tests.

pub mod daemon;
pub mod engine;
pub mod event;
pub mod ipc;
pub mod notify;
pub mod reminder;
pub mod schedule;
pub mod state;
