//! core
//!
//! Core domain types and configuration for ghcommit.
//!
//! # Modules
//!
//! - [`types`] - Strong types: RepositoryId, BranchName, RefName, object ids
//! - [`config`] - Configuration file schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Absence is `Option`, never an empty-string sentinel
//! - Schemas are strict and reject unknown keys

pub mod config;
pub mod types;
