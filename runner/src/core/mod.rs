//! Deterministic, pure logic shared by the loop and the agent.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod completion;
pub mod document;
pub mod react;
pub mod types;
