mod engine;
mod types;

pub use engine::{CROSSOVER_FLOOR_YEAR, break_even, crossover, run_comparison, simulate};
pub use types::{ComparisonResult, Inputs, PathResult, TrainingPath};
