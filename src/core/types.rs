use serde::Serialize;

/// The two residency tracks being compared. Training lengths are fixed
/// properties of the track, not tunable parameters.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TrainingPath {
    Short,
    Long,
}

impl TrainingPath {
    pub fn training_years(self) -> u32 {
        match self {
            TrainingPath::Short => 3,
            TrainingPath::Long => 7,
        }
    }

    pub fn attending_salary(self, inputs: &Inputs) -> f64 {
        match self {
            TrainingPath::Short => inputs.short_attending_salary,
            TrainingPath::Long => inputs.long_attending_salary,
        }
    }
}

/// Model parameters. Immutable for the duration of a simulation run; every
/// run is a pure function of one of these.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub initial_debt: f64,
    pub resident_salary: f64,
    pub short_attending_salary: f64,
    pub long_attending_salary: f64,
    pub living_expenses: f64,
    /// Annual percentage rate charged on negative balances, e.g. 6.0 for 6%.
    pub interest_rate: f64,
    pub years_to_model: u32,
}

/// One track's projection: end-of-year balances (index 0 is the starting
/// debt) and the first year the balance reaches zero, if any.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathResult {
    pub balances: Vec<f64>,
    pub break_even_year: Option<u32>,
}

/// Both tracks simulated over the same inputs plus the derived comparison
/// metrics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub years: u32,
    pub short: PathResult,
    pub long: PathResult,
    pub crossover_year: Option<u32>,
    pub final_advantage: f64,
}
