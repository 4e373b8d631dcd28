//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate connection acquisition and repository calls into
//!   use-case level APIs.
//! - Keep outer layers decoupled from storage details.

pub mod listing_service;
