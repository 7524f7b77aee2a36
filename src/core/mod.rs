pub mod comparator;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod harness;
pub mod traits;
pub mod verdict;
pub mod workspace;
