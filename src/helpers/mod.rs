//! Helper functions shared by templates and page rendering

mod date;

pub use date::*;
