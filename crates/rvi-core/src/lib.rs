//! rvi-core - Core types for the RVI gateway
//!
//! This crate provides the pieces shared by every layer of the gateway:
//! the correlation table that pairs outbound RVI calls with their
//! out-of-band replies, the single-shot caller handle, the error
//! taxonomy, and the path template helpers used to derive RVI service
//! names from the HTTP path schema.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     CorrelationTable                        │
//! │   transaction id ──► CallerHandle (oneshot sender)          │
//! │                                                             │
//! │   create()  : insert-once, returns a fresh UUID v4          │
//! │   resolve() : remove-once, exactly one caller wins          │
//! └───────────────┬───────────────────────────┬────────────────┘
//!                 │                           │
//!        reply handler (deliver)     timeout task (fail)
//! ```

pub mod correlation;
pub mod error;
pub mod routing;

pub use correlation::{CallOutcome, CallerHandle, CorrelationTable, PendingReply, TransactionId};
pub use error::GatewayError;
pub use routing::EndpointScope;
