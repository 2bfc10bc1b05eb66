//! API handlers
//!
//! Author: hephaex@gmail.com

pub mod analyze;
pub mod health;
