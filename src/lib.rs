//! # proofdesk
//!
//! Proofreading issue localization and review-decision lifecycle.
//!
//! Projects article HTML to the plain text a reviewer sees, anchors
//! detected issues onto it, records reviewer decisions, and moves each
//! article's worklist item through the review pipeline. Postgres
//! persistence and OpenTelemetry observability sit around that core.

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod projector;
pub mod resolver;
pub mod review;
pub mod sequencer;
pub mod telemetry;
pub mod worklist;
