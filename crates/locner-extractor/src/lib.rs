//! locner Extractor - Location extraction pipeline
//!
//! Finds location mentions by combining three producers:
//! - Gazetteer: exact matches of known place names
//! - Type vocabulary: generic location-type words
//! - Sequence labeler: predictions from an external model
//!
//! and reconciling their spans into one non-overlapping, ordered list.

pub mod labeler;
pub mod lexicon;
pub mod ner;
pub mod reconcile;

pub use labeler::{DisabledLabeler, HttpLabeler};
pub use lexicon::{Lexicon, MatchOptions};
pub use ner::LocationNer;
pub use reconcile::{reconcile, ClaimedSpans};
