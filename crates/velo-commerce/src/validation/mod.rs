//! Cart validation against live catalog truth.
//!
//! The engine is read-only with respect to the cart: it re-fetches
//! current product and coupon truth through the catalog collaborator and
//! reports errors (block checkout) and warnings (inform only).

mod engine;
mod issues;

pub use engine::{ValidationConfig, ValidationEngine};
pub use issues::{IssueCode, ValidationIssue, ValidationReport};
