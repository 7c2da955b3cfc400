/// Contains the `Calculator`, which routes a problem to the operation that answers it.
pub mod calculator;
/// Contains the rewrite rules that turn loosely written math into evaluable expressions.
pub mod cleaner;
/// Contains `SolverConfig`, the tunable limits shared by every operation.
pub mod config;
/// Contains structs for passing information to the shunting yard algorithm. This is re-exported by the `shunting` module.
mod context;
/// Contains the classification of raw problem text into operations.
pub mod dispatch;
/// Contains error types for different errors that this crate may throw.
pub mod errors;
/// Contains circle and triangle measurements.
pub mod geometry;
/// Contains root-finding algorithms for building equation-solving tools.
pub mod newton;
/// Contains single-variable polynomials, their expansion from expressions, and their roots.
pub mod polynomial;
/// Contains the line-oriented interactive front end.
pub mod repl;
/// Contains the HTTP front end.
pub mod server;
/// Contains a basic shunting yard algorithm for evaluating strings as mathematical expressions.
pub mod shunting;
/// Contains middle-term splitting for integer quadratics.
pub mod split;
/// Contains functions for checking whether systems or equations are properly constrained for solving.
pub mod system;
/// Contains the `Variable` type for numbers that exist on a user-specified domain.
pub mod variable;

use std::collections::HashMap;

use errors::EquationSolverError;
use shunting::{ContextHashMap, ContextLike, compile_to_fn_of_hashmap};
use system::get_equation_unknowns;

/// Splits `lhs = rhs` into the expression `lhs - (rhs)`.
fn equation_to_expression(equation: &str) -> anyhow::Result<String>
{
    // Ensure that we're solving just one equation
    let sides: Vec<&str> = equation.split('=').collect();
    match sides.len()
    {
        1 => Err(EquationSolverError::FoundExpression.into()),
        2 => Ok(format!("{} - ({})", sides[0], sides[1])),
        _ => Err(EquationSolverError::FoundMultipleEquations.into()),
    }
}

/// An internal function for formatting an equation to an expression prior to tokenization
pub (in crate) fn compile_equation_to_fn_of_hashmap(equation: &str, ctx: &mut ContextHashMap) -> anyhow::Result<impl Fn(&HashMap<String, f64>) -> anyhow::Result<f64>>
{
    let expr = equation_to_expression(equation)?;

    // Get the unknowns. Need to be owned to mutate ctx
    let unknowns: Vec<String> = get_equation_unknowns(equation, ctx)
        .into_iter()
        .filter(|&x| !ctx.contains_key(x))
        .map(|x| x.to_owned())
        .collect();

    // Add a default guess value of 1 for all unspecified vars
    for var in unknowns
    {
        ctx.add_var_to_ctx(&var, 1.0);
    }

    compile_to_fn_of_hashmap(&expr, ctx)
}
