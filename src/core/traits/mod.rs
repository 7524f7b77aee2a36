pub mod runner;
pub mod supervisor;
