//! Core types and error definitions for Ragchat.
//!
//! This crate provides the foundational types shared across all Ragchat crates:
//! the error taxonomy, chat message representations, and the cancellation
//! token forwarded to external calls.
//!
//! # Main types
//!
//! - [`RagError`]: Unified error enum for every pipeline stage.
//! - [`RagResult`]: Convenience alias for `Result<T, RagError>`.
//! - [`Role`]: Message role (user, assistant, system).
//! - [`Message`]: A single message within a conversation session.
//! - [`CancellationToken`]: Cooperative cancellation for pipeline invocations.

/// Cooperative cancellation shared between a caller and a running pipeline.
pub mod cancel;
/// Error taxonomy.
pub mod error;
/// Chat message types.
pub mod message;

pub use cancel::CancellationToken;
pub use error::{RagError, RagResult};
pub use message::{Message, Role};
