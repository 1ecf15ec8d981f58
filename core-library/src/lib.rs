//! # Library Module
//!
//! Owns the canonical triage record set and its access contract.
//!
//! ## Overview
//!
//! This module provides:
//! - Domain models: [`MediaRecord`], [`MediaStatus`], [`MediaId`]
//! - The fixed three-folder [`FolderLayout`]
//! - The filename codec for identity and working-copy revisions
//! - The [`RecordStore`] port with a draft-mutator update contract, plus the
//!   in-memory reference implementation

pub mod error;
pub mod folders;
pub mod models;
pub mod naming;
pub mod store;

pub use error::{LibraryError, Result};
pub use folders::FolderLayout;
pub use models::{MediaId, MediaRecord, MediaStatus};
pub use store::{InMemoryRecordStore, RecordStore};
