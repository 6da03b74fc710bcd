use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;

use crate::core::{ComparisonResult, Inputs, run_comparison};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Parser, Debug)]
#[command(
    name = "residency",
    about = "Net-worth comparison for 3-year vs 7-year residency tracks"
)]
struct Cli {
    #[arg(long, default_value_t = 500_000.0, help = "Starting debt in dollars")]
    initial_debt: f64,
    #[arg(
        long,
        default_value_t = 60_000.0,
        help = "Annual salary during residency"
    )]
    resident_salary: f64,
    #[arg(
        long,
        default_value_t = 300_000.0,
        help = "Annual attending salary after the 3-year track"
    )]
    short_attending_salary: f64,
    #[arg(
        long,
        default_value_t = 400_000.0,
        help = "Annual attending salary after the 7-year track"
    )]
    long_attending_salary: f64,
    #[arg(long, default_value_t = 50_000.0, help = "Annual living expenses")]
    living_expenses: f64,
    #[arg(
        long,
        default_value_t = 6.0,
        help = "Annual interest rate on debt in percent, e.g. 6"
    )]
    interest_rate: f64,
    #[arg(
        long,
        default_value_t = 20,
        help = "Years since graduation to model"
    )]
    years_to_model: u32,
    #[arg(long, help = "Also write the comparison table to this CSV file")]
    csv: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    #[serde(alias = "debt")]
    initial_debt: Option<f64>,
    resident_salary: Option<f64>,
    short_attending_salary: Option<f64>,
    long_attending_salary: Option<f64>,
    living_expenses: Option<f64>,
    interest_rate: Option<f64>,
    #[serde(alias = "years")]
    years_to_model: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    years: u32,
    short_path: Vec<f64>,
    long_path: Vec<f64>,
    short_break_even_year: Option<u32>,
    long_break_even_year: Option<u32>,
    crossover_year: Option<u32>,
    final_advantage: f64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: &Cli) -> Result<Inputs, String> {
    for (name, value) in [
        ("--initial-debt", cli.initial_debt),
        ("--resident-salary", cli.resident_salary),
        ("--short-attending-salary", cli.short_attending_salary),
        ("--long-attending-salary", cli.long_attending_salary),
        ("--living-expenses", cli.living_expenses),
        ("--interest-rate", cli.interest_rate),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{name} must be >= 0"));
        }
    }

    if cli.years_to_model == 0 {
        return Err("--years-to-model must be >= 1".to_string());
    }

    Ok(Inputs {
        initial_debt: cli.initial_debt,
        resident_salary: cli.resident_salary,
        short_attending_salary: cli.short_attending_salary,
        long_attending_salary: cli.long_attending_salary,
        living_expenses: cli.living_expenses,
        interest_rate: cli.interest_rate,
        years_to_model: cli.years_to_model,
    })
}

fn default_cli_for_api() -> Cli {
    Cli {
        initial_debt: 500_000.0,
        resident_salary: 60_000.0,
        short_attending_salary: 300_000.0,
        long_attending_salary: 400_000.0,
        living_expenses: 50_000.0,
        interest_rate: 6.0,
        years_to_model: 20,
        csv: None,
    }
}

#[cfg(test)]
fn inputs_from_json(json: &str) -> Result<Inputs, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    inputs_from_payload(payload)
}

fn inputs_from_payload(payload: SimulatePayload) -> Result<Inputs, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.initial_debt {
        cli.initial_debt = v;
    }
    if let Some(v) = payload.resident_salary {
        cli.resident_salary = v;
    }
    if let Some(v) = payload.short_attending_salary {
        cli.short_attending_salary = v;
    }
    if let Some(v) = payload.long_attending_salary {
        cli.long_attending_salary = v;
    }
    if let Some(v) = payload.living_expenses {
        cli.living_expenses = v;
    }
    if let Some(v) = payload.interest_rate {
        cli.interest_rate = v;
    }
    if let Some(v) = payload.years_to_model {
        cli.years_to_model = v;
    }

    build_inputs(&cli)
}

fn build_simulate_response(result: ComparisonResult) -> SimulateResponse {
    SimulateResponse {
        years: result.years,
        short_break_even_year: result.short.break_even_year,
        long_break_even_year: result.long.break_even_year,
        crossover_year: result.crossover_year,
        final_advantage: result.final_advantage,
        short_path: result.short.balances,
        long_path: result.long.balances,
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("Residency calculator listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let inputs = match inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let response = build_simulate_response(run_comparison(&inputs));
    json_response(StatusCode::OK, response)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

/// Parses the CLI flags, runs the comparison, and prints the year-by-year
/// table with the derived metrics. Mirrors the interactive page for shells.
pub fn run_report() -> Result<(), String> {
    let cli = Cli::parse();
    let inputs = build_inputs(&cli)?;
    let result = run_comparison(&inputs);

    print!("{}", render_table(&result));

    if let Some(path) = &cli.csv {
        std::fs::write(path, render_csv(&result))
            .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
        println!("\nTable saved to '{}'", path.display());
    }

    Ok(())
}

fn render_table(result: &ComparisonResult) -> String {
    let mut out = String::new();
    out.push_str("Net Worth Comparison\n\n");
    out.push_str(&format!(
        "{:>4}  {:>16}  {:>16}\n",
        "Year", "3-Year Residency", "7-Year Residency"
    ));
    for year in 0..=result.years as usize {
        out.push_str(&format!(
            "{:>4}  {:>16}  {:>16}\n",
            year,
            format_currency(result.short.balances[year]),
            format_currency(result.long.balances[year]),
        ));
    }

    out.push('\n');
    out.push_str(&format!(
        "3-year track breaks even: {}\n",
        format_year(result.short.break_even_year)
    ));
    out.push_str(&format!(
        "7-year track breaks even: {}\n",
        format_year(result.long.break_even_year)
    ));
    out.push_str(&format!(
        "7-year track pulls ahead: {}\n",
        format_year(result.crossover_year)
    ));
    out.push_str(&format!(
        "Final-year advantage of the 7-year track: {}\n",
        format_currency(result.final_advantage)
    ));
    out
}

fn render_csv(result: &ComparisonResult) -> String {
    let mut out = String::from(
        "Years Since Graduation,3-Year Residency Net Worth,7-Year Residency Net Worth\n",
    );
    for year in 0..=result.years as usize {
        out.push_str(&format!(
            "{year},{},{}\n",
            result.short.balances[year], result.long.balances[year]
        ));
    }
    out
}

fn format_year(year: Option<u32>) -> String {
    match year {
        Some(year) => format!("year {year}"),
        None => "never".to_string(),
    }
}

/// Compact dollar formatting for display: `$520K` under a million, `$1.5M`
/// at or above, sign carried through.
fn format_currency(value: f64) -> String {
    if value.abs() < 1_000_000.0 {
        format!("${}K", (value / 1_000.0).trunc() as i64)
    } else {
        format!("${:.1}M", value / 1_000_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    #[test]
    fn build_inputs_accepts_defaults() {
        let inputs = build_inputs(&sample_cli()).expect("defaults are valid");
        assert_approx(inputs.initial_debt, 500_000.0);
        assert_approx(inputs.interest_rate, 6.0);
        assert_eq!(inputs.years_to_model, 20);
    }

    #[test]
    fn build_inputs_rejects_negative_debt() {
        let mut cli = sample_cli();
        cli.initial_debt = -1.0;

        let err = build_inputs(&cli).expect_err("must reject negative debt");
        assert!(err.contains("--initial-debt"));
    }

    #[test]
    fn build_inputs_rejects_non_finite_rate() {
        let mut cli = sample_cli();
        cli.interest_rate = f64::NAN;

        let err = build_inputs(&cli).expect_err("must reject NaN rate");
        assert!(err.contains("--interest-rate"));
    }

    #[test]
    fn build_inputs_rejects_zero_horizon() {
        let mut cli = sample_cli();
        cli.years_to_model = 0;

        let err = build_inputs(&cli).expect_err("must reject empty horizon");
        assert!(err.contains("--years-to-model"));
    }

    #[test]
    fn inputs_from_json_parses_web_keys() {
        let json = r#"{
          "initialDebt": 450000,
          "residentSalary": 65000,
          "shortAttendingSalary": 280000,
          "longAttendingSalary": 420000,
          "livingExpenses": 55000,
          "interestRate": 5.5,
          "yearsToModel": 25
        }"#;
        let inputs = inputs_from_json(json).expect("json should parse");

        assert_approx(inputs.initial_debt, 450_000.0);
        assert_approx(inputs.resident_salary, 65_000.0);
        assert_approx(inputs.short_attending_salary, 280_000.0);
        assert_approx(inputs.long_attending_salary, 420_000.0);
        assert_approx(inputs.living_expenses, 55_000.0);
        assert_approx(inputs.interest_rate, 5.5);
        assert_eq!(inputs.years_to_model, 25);
    }

    #[test]
    fn inputs_from_json_accepts_aliases_and_partial_payloads() {
        let inputs = inputs_from_json(r#"{"debt": 100000, "years": 10}"#)
            .expect("aliases should parse");

        assert_approx(inputs.initial_debt, 100_000.0);
        assert_eq!(inputs.years_to_model, 10);
        // Untouched fields keep the defaults.
        assert_approx(inputs.resident_salary, 60_000.0);
    }

    #[test]
    fn inputs_from_json_rejects_negative_override() {
        let err = inputs_from_json(r#"{"livingExpenses": -5}"#)
            .expect_err("must reject negative expenses");
        assert!(err.contains("--living-expenses"));
    }

    #[test]
    fn simulate_response_serialization_contains_expected_fields() {
        let inputs = build_inputs(&sample_cli()).expect("valid inputs");
        let response = build_simulate_response(run_comparison(&inputs));
        let json = serde_json::to_string(&response).expect("response should serialize");

        assert!(json.contains("\"shortPath\""));
        assert!(json.contains("\"longPath\""));
        assert!(json.contains("\"shortBreakEvenYear\""));
        assert!(json.contains("\"longBreakEvenYear\""));
        assert!(json.contains("\"crossoverYear\""));
        assert!(json.contains("\"finalAdvantage\""));
    }

    #[test]
    fn simulate_response_matches_worked_example() {
        let inputs = build_inputs(&sample_cli()).expect("valid inputs");
        let response = build_simulate_response(run_comparison(&inputs));

        assert_eq!(response.short_path.len(), 21);
        assert_approx(response.short_path[1], -520_000.0);
        assert_approx(response.long_path[1], -520_000.0);
    }

    #[test]
    fn format_currency_uses_k_and_m_suffixes() {
        assert_eq!(format_currency(0.0), "$0K");
        assert_eq!(format_currency(520_000.0), "$520K");
        assert_eq!(format_currency(-520_000.0), "$-520K");
        assert_eq!(format_currency(999_999.0), "$999K");
        assert_eq!(format_currency(1_500_000.0), "$1.5M");
        assert_eq!(format_currency(-1_240_000.0), "$-1.2M");
    }

    #[test]
    fn table_lists_every_year_and_all_metrics() {
        let mut cli = sample_cli();
        cli.years_to_model = 5;
        let inputs = build_inputs(&cli).expect("valid inputs");
        let table = render_table(&run_comparison(&inputs));

        for year in 0..=5 {
            assert!(table.contains(&format!("\n{year:>4}  ")), "missing year {year}");
        }
        assert!(table.contains("3-year track breaks even"));
        // Crossover cannot happen inside a 5-year horizon.
        assert!(table.contains("7-year track pulls ahead: never"));
    }

    #[test]
    fn csv_has_header_and_one_row_per_year() {
        let mut cli = sample_cli();
        cli.years_to_model = 3;
        let inputs = build_inputs(&cli).expect("valid inputs");
        let csv = render_csv(&run_comparison(&inputs));

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[0],
            "Years Since Graduation,3-Year Residency Net Worth,7-Year Residency Net Worth"
        );
        assert!(lines[1].starts_with("0,-500000,"));
    }
}
