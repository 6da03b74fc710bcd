use super::types::{ComparisonResult, Inputs, PathResult, TrainingPath};

/// Crossover before this year is never reported, even if the long path pulls
/// ahead earlier. Fixed policy constant; residencies rarely finish before
/// year 7-8.
pub const CROSSOVER_FLOOR_YEAR: u32 = 8;

/// Projects end-of-year net worth for one track. `balances[0]` is the
/// starting debt; `balances[y]` is the balance at the end of year `y`.
pub fn simulate(years: u32, path: TrainingPath, inputs: &Inputs) -> Vec<f64> {
    let mut balances = Vec::with_capacity(years as usize + 1);
    balances.push(-inputs.initial_debt);

    for year in 1..=years {
        let prev = balances[year as usize - 1];
        let income = if year <= path.training_years() {
            inputs.resident_salary
        } else {
            path.attending_salary(inputs)
        };
        // Interest accrues on debt in every phase, training or attending.
        let interest = if prev < 0.0 {
            prev.abs() * inputs.interest_rate / 100.0
        } else {
            0.0
        };
        balances.push(prev + (income - inputs.living_expenses) - interest);
    }

    balances
}

/// First year index with a non-negative balance, or `None` if the balance
/// stays negative through the modeled horizon.
pub fn break_even(balances: &[f64]) -> Option<u32> {
    balances
        .iter()
        .position(|&balance| balance >= 0.0)
        .map(|idx| idx as u32)
}

/// First year at or after [`CROSSOVER_FLOOR_YEAR`] where the long track's
/// balance exceeds the short track's.
pub fn crossover(short: &[f64], long: &[f64]) -> Option<u32> {
    let horizon = short.len().min(long.len());
    (CROSSOVER_FLOOR_YEAR as usize..horizon)
        .find(|&year| long[year] > short[year])
        .map(|year| year as u32)
}

/// Simulates both tracks over the same inputs and derives the comparison
/// metrics the UI displays.
pub fn run_comparison(inputs: &Inputs) -> ComparisonResult {
    let years = inputs.years_to_model;
    let short_balances = simulate(years, TrainingPath::Short, inputs);
    let long_balances = simulate(years, TrainingPath::Long, inputs);

    let crossover_year = crossover(&short_balances, &long_balances);
    let final_advantage = match (short_balances.last(), long_balances.last()) {
        (Some(short_final), Some(long_final)) => long_final - short_final,
        _ => 0.0,
    };

    ComparisonResult {
        years,
        short: PathResult {
            break_even_year: break_even(&short_balances),
            balances: short_balances,
        },
        long: PathResult {
            break_even_year: break_even(&long_balances),
            balances: long_balances,
        },
        crossover_year,
        final_advantage,
    }
}
