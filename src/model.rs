//! Core data model.
//!
//! Issues are detected problems anchored to a span of article text.
//! Decisions are a reviewer's disposition of one issue. Worklist items
//! track one article through the review pipeline.

pub mod decision;
pub mod issue;
pub mod worklist;

pub use decision::*;
pub use issue::*;
pub use worklist::*;
