//! # Triage Module
//!
//! Status transitions for media records.
//!
//! ## Overview
//!
//! This module owns the write side of triage:
//! - The six camera/pending/completed transitions with optimistic record
//!   update and rollback on file-operation failure
//! - Latest-version resolution for promoting edited working copies
//! - The best-effort `complete_all_pending` batch
//!
//! Every public operation returns a result value; nothing here throws past
//! its boundary.

pub mod engine;
pub mod error;

pub use engine::{BatchOutcome, TransitionEngine, TransitionResult};
pub use error::{Result, TriageError};
