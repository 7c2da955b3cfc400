use std::io;
use std::net::SocketAddr;

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::debug;

use geqscalc::calculator::Calculator;
use geqscalc::config::SolverConfig;
use geqscalc::{repl, server};

/// Word problems, equations and quadratic splitting from the command line.
#[derive(Parser, Debug)]
#[command(name = "geqscalc", version, about)]
struct Cli
{
    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "GEQSCALC_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Largest residual accepted as a solution by newton-raphson
    #[arg(long, env = "GEQSCALC_MARGIN", default_value_t = SolverConfig::default().margin)]
    margin: f64,

    /// Iteration limit for newton-raphson
    #[arg(long, env = "GEQSCALC_LIMIT", default_value_t = SolverConfig::default().limit)]
    limit: usize,

    /// Largest |a*c| searched when splitting a middle term
    #[arg(long, env = "GEQSCALC_MAX_SPLIT_SEARCH", default_value_t = SolverConfig::default().max_split_search)]
    max_split_search: u64,

    /// Half-width of the interval searched for roots of non-polynomial equations
    #[arg(long, env = "GEQSCALC_ROOT_SCAN_SPAN", default_value_t = SolverConfig::default().root_scan_span)]
    root_scan_span: f64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Interactive prompt (the default)
    Repl,

    /// Serve POST /solve over HTTP
    Serve
    {
        #[arg(long, env = "GEQSCALC_ADDR", default_value = "127.0.0.1:5000")]
        addr: SocketAddr,
    },

    /// Solve one problem and exit
    Solve
    {
        problem: String,

        /// Print the answer as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()>
{
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(cli.log_level.as_str())).init();

    let config = SolverConfig
    {
        margin: cli.margin,
        limit: cli.limit,
        max_split_search: cli.max_split_search,
        root_scan_span: cli.root_scan_span,
        ..SolverConfig::default()
    };
    debug!("solver configuration: {config:?}");
    let calculator = Calculator::new(config);

    match cli.command.unwrap_or(Commands::Repl)
    {
        Commands::Repl => {
            let stdin = io::stdin();
            repl::run(&calculator, stdin.lock(), io::stdout())
        },
        Commands::Serve { addr } => {
            tokio::runtime::Runtime::new()?.block_on(server::serve(addr, calculator))
        },
        Commands::Solve { problem, json } => {
            let answer = calculator.solve_problem(&problem)?;
            if json
            {
                println!("{}", serde_json::to_string(&serde_json::json!({ "result": answer }))?);
            }
            else
            {
                println!("{answer}");
            }
            Ok(())
        },
    }
}
