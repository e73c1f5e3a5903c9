//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate document, roster and persistence calls into sessions.
//! - Keep the CLI decoupled from merge and save details.

pub mod reconcile_service;
