//! Domain models for prescription billing.

mod entry;

pub use entry::*;
