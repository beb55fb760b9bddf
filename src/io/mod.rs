pub mod parser;
pub mod points;
pub mod summary;
pub mod writer;
pub mod pml;
pub mod normalize;
