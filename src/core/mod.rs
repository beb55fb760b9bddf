pub mod structure;
pub mod pocket;
