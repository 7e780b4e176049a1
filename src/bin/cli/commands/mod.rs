pub mod ai;
pub mod encryption;
pub mod notes;
