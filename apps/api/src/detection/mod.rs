//! Lexical bias detection: the human-facing report path.
//!
//! Matching here is substring-based over normalized text, so multi-word phrases
//! ("team player") are caught. The ML features in `crate::features::bias` use
//! whole-token matching instead.

pub mod matcher;
pub mod normalize;

pub use matcher::{detect_bias, find_matches, render_report, MatchResult};
pub use normalize::normalize;
