// src/models/mod.rs

//! Domain models for the job listings service.

mod category;
mod posting;

// Re-export all public types
pub use category::Category;
pub use posting::{JobPosting, ParseIssue, PostingCandidate, RawPosting};
