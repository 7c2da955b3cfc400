use serde::Serialize;

/// Tunable limits for every solver the calculator drives.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SolverConfig
{
    /// Largest residual newton-raphson accepts as a solution.
    pub margin: f64,
    /// Iteration limit handed to newton-raphson.
    pub limit: usize,
    /// Unknown solved for by `roots(...)` and `split(...)`.
    pub symbol: String,
    /// Unknowns a system of equations may be solved for.
    pub system_symbols: Vec<String>,
    /// Largest `|a * c|` the middle-term splitter will search.
    pub max_split_search: u64,
    /// Non-polynomial equations are searched for real roots in `[-span, span]`.
    pub root_scan_span: f64,
}

impl Default for SolverConfig
{
    fn default() -> Self
    {
        SolverConfig
        {
            margin: 1e-10,
            limit: 100,
            symbol: "x".to_owned(),
            system_symbols: vec!["x".to_owned(), "y".to_owned()],
            max_split_search: 1_000_000,
            root_scan_span: 100.0,
        }
    }
}
