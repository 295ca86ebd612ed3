//! Core abstractions for crew pipelines
//!
//! This crate defines the traits and types shared by every other crate in the
//! workspace: the [`Agent`] trait, the per-run [`Context`], and the tagged
//! [`Error`] type callers branch on.

pub mod agent;
pub mod context;
pub mod error;

pub use agent::Agent;
pub use context::{Context, Inputs};
pub use error::{Error, ErrorKind, Result};
