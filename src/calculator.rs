use std::collections::BTreeMap;
use std::fmt;

use log::{debug, info};
use num_complex::Complex64;
use num_integer::Integer;
use serde::Serialize;

use crate::cleaner::{clean_expression, parse_equation, validate_expression};
use crate::config::SolverConfig;
use crate::dispatch::Problem;
use crate::errors::{CalculatorError, EquationSolverError, NewtonRaphsonSolverError, PolynomialError, SplitError};
use crate::geometry::{circle, triangle, Circle, Triangle};
use crate::newton::scan_real_roots;
use crate::polynomial::{expand_in, format_number};
use crate::shunting::{compile_to_fn, eval_str, new_context, ContextLike};
use crate::split::{split, Quadratic, SplitOutcome};
use crate::system::{get_equation_unknowns, SystemBuilder};

const NO_SOLUTION: &str = "No solution found";
const NO_REAL_ROOTS: &str = "No real roots found";

/// The roots of a single-variable expression or equation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Solutions
{
    pub variable: String,
    pub real: Vec<f64>,
    /// Non-real roots, rendered as `a + bi`.
    pub complex: Vec<String>,
}

/// Anything a problem can be answered with.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Answer
{
    Number(f64),
    Integer(i64),
    Circle(Circle),
    Triangle(Triangle),
    Solutions(Solutions),
    System(BTreeMap<String, f64>),
    Split(SplitOutcome),
    /// An empty solution set, explained.
    Message(String),
}

/// Answers problems using the solvers of this crate, tuned by a `SolverConfig`.
#[derive(Clone, Debug, Default)]
pub struct Calculator
{
    config: SolverConfig,
}

/// Splits a comma-separated argument list into numbers. Blank entries are skipped.
fn parse_params(params: &str) -> Result<Vec<f64>, CalculatorError>
{
    params
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<f64>().map_err(|_| CalculatorError::BadNumber(p.to_owned())))
        .collect()
}

/// Like `parse_params`, but truncates each number to an integer whose
/// magnitude fits an `i64`, so `i64::MIN` never reaches `gcd`.
fn parse_integer_params(params: &str) -> Result<Vec<i64>, CalculatorError>
{
    // 2^63, the first magnitude an i64 cannot negate
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    params
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| -> Result<i64, CalculatorError> {
            let n = p.parse::<f64>().map_err(|_| CalculatorError::BadNumber(p.to_owned()))?.trunc();
            if !n.is_finite() || n.abs() >= LIMIT
            {
                return Err(CalculatorError::IntegerTooLarge(p.to_owned()));
            }
            Ok(n as i64)
        })
        .collect()
}

/// Snaps values within floating point noise of an integer onto it.
fn tidy(value: f64) -> f64
{
    let nearest = value.round();
    if (value - nearest).abs() <= 1e-9 * nearest.abs().max(1.0)
    {
        // also turns -0 into 0
        nearest + 0.0
    }
    else
    {
        value
    }
}

fn format_complex(z: Complex64) -> String
{
    let re = tidy(z.re);
    let im = tidy(z.im);
    let magnitude = if im.abs() == 1.0 { String::new() } else { format_number(im.abs()) };
    match (re == 0.0, im < 0.0)
    {
        (true, false) => format!("{magnitude}i"),
        (true, true) => format!("-{magnitude}i"),
        (false, false) => format!("{} + {magnitude}i", format_number(re)),
        (false, true) => format!("{} - {magnitude}i", format_number(re)),
    }
}

impl Calculator
{
    pub fn new(config: SolverConfig) -> Calculator
    {
        Calculator { config }
    }

    pub fn config(&self) -> &SolverConfig
    {
        &self.config
    }

    /// Classifies `text` and hands it to the matching operation.
    ///
    /// # Example
    /// ```
    /// use geqscalc::calculator::{Answer, Calculator};
    ///
    /// let calc = Calculator::default();
    ///
    /// assert_eq!(calc.solve_problem("2 + 3 * 4").unwrap(), Answer::Number(14.0));
    /// assert_eq!(calc.solve_problem("gcd(48, 18)").unwrap(), Answer::Integer(6));
    /// assert_eq!(calc.solve_problem("2x + 3 = 7").unwrap().to_string(), "x = 2");
    /// ```
    pub fn solve_problem(&self, text: &str) -> anyhow::Result<Answer>
    {
        let problem = Problem::parse(text)?;
        info!("solving {} problem '{}'", problem.kind(), text.trim());

        let answer = match problem
        {
            Problem::Power(params) => self.calculate_power(&params)?,
            Problem::Gcd(params) => self.calculate_gcd(&params)?,
            Problem::Circle(params) => self.calculate_circle(&params)?,
            Problem::Triangle(params) => self.calculate_triangle(&params)?,
            Problem::Roots(expr) => self.calculate_roots(&expr, &self.config.symbol)?,
            Problem::Split(expr) => self.split_middle_term(&expr, &self.config.symbol)?,
            Problem::System(equations) => {
                let equations: Vec<&str> = equations.iter().map(String::as_str).collect();
                self.solve_system(&equations, &self.config.system_symbols)?
            },
            Problem::Equation(equation) => self.solve_equation(&equation)?,
            Problem::Expression(expr) => self.evaluate_expression(&expr)?,
        };

        debug!("answered '{}' with {answer}", text.trim());
        Ok(answer)
    }

    /// Cleans, validates and evaluates an arithmetic expression.
    pub fn evaluate_expression(&self, text: &str) -> anyhow::Result<Answer>
    {
        let expr = clean_expression(text);
        validate_expression(&expr)?;
        Ok(Answer::Number(eval_str(&expr)?))
    }

    /// `base, exponent`
    pub fn calculate_power(&self, params: &str) -> anyhow::Result<Answer>
    {
        match parse_params(params)?[..]
        {
            [base, exponent] => Ok(Answer::Number(base.powf(exponent))),
            _ => Err(CalculatorError::PowerArgs.into()),
        }
    }

    /// Greatest common divisor of two or more numbers. Fractional parts are dropped.
    pub fn calculate_gcd(&self, params: &str) -> anyhow::Result<Answer>
    {
        let numbers = parse_integer_params(params)?;
        if numbers.len() < 2
        {
            return Err(CalculatorError::GcdArgs.into());
        }
        Ok(Answer::Integer(numbers.iter().fold(0i64, |acc, n| acc.gcd(n))))
    }

    pub fn calculate_circle(&self, params: &str) -> anyhow::Result<Answer>
    {
        Ok(Answer::Circle(circle(&parse_params(params)?)?))
    }

    pub fn calculate_triangle(&self, params: &str) -> anyhow::Result<Answer>
    {
        Ok(Answer::Triangle(triangle(&parse_params(params)?)?))
    }

    /// Every root of `text` in `symbol`. Polynomials get all of their complex
    /// roots; anything else is searched numerically for real ones.
    ///
    /// # Example
    /// ```
    /// use geqscalc::calculator::Calculator;
    ///
    /// let calc = Calculator::default();
    ///
    /// assert_eq!(calc.calculate_roots("x^2 - 4", "x").unwrap().to_string(), "x = -2, x = 2");
    /// assert_eq!(calc.calculate_roots("x^2 + 1", "x").unwrap().to_string(), "x = -i, x = i");
    /// ```
    pub fn calculate_roots(&self, text: &str, symbol: &str) -> anyhow::Result<Answer>
    {
        let expr = clean_expression(text);
        validate_expression(&expr)?;
        self.roots_in(&expr, symbol, NO_REAL_ROOTS)
    }

    /// Solves an equation with exactly one unknown, which is inferred.
    pub fn solve_equation(&self, equation: &str) -> anyhow::Result<Answer>
    {
        let expr = parse_equation(equation)?;

        let ctx = new_context();
        let unknowns = get_equation_unknowns(&expr, &ctx);
        if unknowns.len() != 1
        {
            return Err(EquationSolverError::SingleUnknownNotFound.into());
        }

        self.roots_in(&expr, unknowns[0], NO_SOLUTION)
    }

    fn roots_in(&self, expr: &str, symbol: &str, none_found: &str) -> anyhow::Result<Answer>
    {
        let ctx = new_context();
        let solutions = match expand_in(expr, symbol, &ctx)
        {
            Ok(poly) => {
                debug!("'{expr}' expands to {poly}");
                let mut real: Vec<f64> = Vec::new();
                let mut complex: Vec<Complex64> = Vec::new();
                for root in poly.roots()?
                {
                    if root.im == 0.0
                    {
                        real.push(tidy(root.re));
                    }
                    else
                    {
                        complex.push(root);
                    }
                }
                real.sort_by(|a, b| a.total_cmp(b));
                real.dedup();
                complex.sort_by(|a, b| a.re.total_cmp(&b.re).then(a.im.total_cmp(&b.im)));
                let mut complex: Vec<String> = complex.into_iter().map(format_complex).collect();
                complex.dedup();
                Solutions { variable: symbol.to_owned(), real, complex }
            },
            Err(e) if matches!(
                e.downcast_ref::<PolynomialError>(),
                Some(PolynomialError::NonIntegerExponent)
                    | Some(PolynomialError::NonConstantDivisor)
                    | Some(PolynomialError::NonConstantFunctionArg)
            ) => {
                debug!("'{expr}' is not a polynomial in {symbol} ({e}), searching numerically");
                let mut ctx = ctx;
                ctx.add_var_to_ctx(symbol, 1.0);
                let f = compile_to_fn(expr, &ctx)?;
                let real = scan_real_roots(f, self.config.root_scan_span, self.config.margin, self.config.limit)
                    .into_iter()
                    .map(tidy)
                    .collect();
                Solutions { variable: symbol.to_owned(), real, complex: Vec::new() }
            },
            Err(e) => return Err(e),
        };

        if solutions.real.is_empty() && solutions.complex.is_empty()
        {
            return Ok(Answer::Message(none_found.to_owned()));
        }
        Ok(Answer::Solutions(solutions))
    }

    /// Solves equations joined by `and` for `symbols`. Equations that add
    /// nothing to the system are left out; an under-constrained system or an
    /// unknown outside `symbols` is an error.
    ///
    /// # Example
    /// ```
    /// use geqscalc::calculator::{Answer, Calculator};
    ///
    /// let calc = Calculator::default();
    /// let symbols = ["x".to_owned(), "y".to_owned()];
    ///
    /// match calc.solve_system(&["x + y = 5", "x - y = 1"], &symbols).unwrap()
    /// {
    ///     Answer::System(soln) => {
    ///         assert_eq!(soln["x"], 3.0);
    ///         assert_eq!(soln["y"], 2.0);
    ///     },
    ///     other => panic!("expected a solved system, got {other}"),
    /// }
    /// ```
    pub fn solve_system(&self, equations: &[&str], symbols: &[String]) -> anyhow::Result<Answer>
    {
        let equations: Vec<String> = equations
            .iter()
            .map(|eq| -> anyhow::Result<String> { Ok(format!("{} = 0", parse_equation(eq)?)) })
            .collect::<anyhow::Result<_>>()?;
        let (first, rest) = equations
            .split_first()
            .ok_or(EquationSolverError::UnderConstrainedSystem)?;

        let mut ctx = new_context();
        for equation in &equations
        {
            for unknown in get_equation_unknowns(equation, &ctx)
            {
                if !symbols.iter().any(|s| s == unknown)
                {
                    return Err(EquationSolverError::UnknownOutsideSymbols.into());
                }
            }
        }

        let mut builder = SystemBuilder::new(first, &mut ctx)?;
        let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
        builder.try_fully_constrain_with(&rest)?;
        let system = builder
            .get_system()
            .ok_or(EquationSolverError::UnderConstrainedSystem)?;

        match system.solve(self.config.margin, self.config.limit)
        {
            Ok(soln) => Ok(Answer::System(
                soln.into_iter().map(|(var, value)| (var, tidy(value))).collect()
            )),
            Err(e) if matches!(
                e.downcast_ref::<NewtonRaphsonSolverError>(),
                Some(NewtonRaphsonSolverError::ReachedIterationLimit)
                    | Some(NewtonRaphsonSolverError::SingularJacobian)
            ) => {
                debug!("system did not converge: {e}");
                Ok(Answer::Message(NO_SOLUTION.to_owned()))
            },
            Err(e) => Err(e),
        }
    }

    /// Factors `ax^2 + bx + c` by splitting its middle term.
    ///
    /// # Example
    /// ```
    /// use geqscalc::calculator::{Answer, Calculator};
    /// use geqscalc::split::SplitOutcome;
    ///
    /// let calc = Calculator::default();
    ///
    /// match calc.split_middle_term("x^2 + 5x + 6", "x").unwrap()
    /// {
    ///     Answer::Split(SplitOutcome::Split(res)) => assert_eq!(res.factors, "(x+2)(x+3)"),
    ///     other => panic!("expected a split, got {other}"),
    /// }
    /// ```
    pub fn split_middle_term(&self, text: &str, symbol: &str) -> anyhow::Result<Answer>
    {
        let expr = clean_expression(text);
        validate_expression(&expr)?;

        let poly = match expand_in(&expr, symbol, &new_context())
        {
            Ok(poly) => poly,
            Err(e) if e.is::<PolynomialError>() => return Err(SplitError::NotQuadratic.into()),
            Err(e) => return Err(e),
        };
        let quad = Quadratic::from_polynomial(&poly)?;

        Ok(Answer::Split(split(&quad, symbol, self.config.max_split_search)?))
    }
}

impl fmt::Display for Solutions
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        let rendered: Vec<String> = self.real
            .iter()
            .map(|r| format_number(*r))
            .chain(self.complex.iter().cloned())
            .map(|r| format!("{} = {r}", self.variable))
            .collect();
        write!(f, "{}", rendered.join(", "))
    }
}

impl fmt::Display for Answer
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        match self
        {
            Answer::Number(n) => write!(f, "{}", format_number(*n)),
            Answer::Integer(n) => write!(f, "{n}"),
            Answer::Circle(c) => write!(f, "{c}"),
            Answer::Triangle(t) => write!(f, "{t}"),
            Answer::Solutions(s) => write!(f, "{s}"),
            Answer::System(soln) => {
                let rendered: Vec<String> = soln
                    .iter()
                    .map(|(var, value)| format!("{var} = {}", format_number(*value)))
                    .collect();
                write!(f, "{}", rendered.join(", "))
            },
            Answer::Split(outcome) => write!(f, "{outcome}"),
            Answer::Message(msg) => write!(f, "{msg}"),
        }
    }
}

#[test]
fn test_power_and_gcd()
{
    let calc = Calculator::default();
    assert_eq!(calc.calculate_power("2, 10").unwrap(), Answer::Number(1024.0));
    assert_eq!(calc.calculate_gcd("48, 18, 30").unwrap(), Answer::Integer(6));
    assert_eq!(calc.calculate_gcd("12.9, 8").unwrap(), Answer::Integer(4));

    let err = calc.calculate_power("2").unwrap_err();
    assert_eq!(err.downcast_ref::<CalculatorError>(), Some(&CalculatorError::PowerArgs));
    let err = calc.calculate_gcd("7").unwrap_err();
    assert_eq!(err.downcast_ref::<CalculatorError>(), Some(&CalculatorError::GcdArgs));
    let err = calc.calculate_gcd("7, seven").unwrap_err();
    assert_eq!(
        err.downcast_ref::<CalculatorError>(),
        Some(&CalculatorError::BadNumber("seven".to_owned()))
    );
}

#[test]
fn test_gcd_rejects_numbers_outside_i64()
{
    let calc = Calculator::default();
    for params in ["-1e30, 5", "5, inf", "-9223372036854775808, 4"]
    {
        let err = calc.calculate_gcd(params).unwrap_err();
        assert!(
            matches!(err.downcast_ref::<CalculatorError>(), Some(CalculatorError::IntegerTooLarge(_))),
            "{params} gave {err}"
        );
    }

    let err = calc.solve_problem("gcd(-1e30, 5)").unwrap_err();
    assert_eq!(err.to_string(), "'-1e30' is too large for GCD calculation");

    assert_eq!(calc.calculate_gcd("-12, 18").unwrap(), Answer::Integer(6));
}

#[test]
fn test_expression_words()
{
    let calc = Calculator::default();
    assert_eq!(calc.evaluate_expression("what is 5 plus 3 times 2").unwrap(), Answer::Number(11.0));
    assert_eq!(calc.evaluate_expression("2 power 3").unwrap(), Answer::Number(8.0));

    let err = calc.evaluate_expression("12 7").unwrap_err();
    assert!(err.to_string().starts_with("Missing operator between numbers '12' and '7'"));
}

#[test]
fn test_equation_roots_are_sorted_and_unique()
{
    let calc = Calculator::default();
    match calc.solve_equation("x^2 - 5x + 6 = 0").unwrap()
    {
        Answer::Solutions(s) => assert_eq!(s.real, vec![2.0, 3.0]),
        other => panic!("expected solutions, got {other}"),
    }
    match calc.solve_equation("(x - 1)^2 = 0").unwrap()
    {
        Answer::Solutions(s) => assert_eq!(s.real, vec![1.0]),
        other => panic!("expected solutions, got {other}"),
    }
}

#[test]
fn test_equation_in_other_unknown()
{
    let calc = Calculator::default();
    assert_eq!(calc.solve_equation("3t - 1 = 8").unwrap().to_string(), "t = 3");
}

#[test]
fn test_equation_without_solution()
{
    let calc = Calculator::default();
    assert_eq!(calc.solve_equation("x - x + 1 = 2").unwrap(), Answer::Message(NO_SOLUTION.to_owned()));
}

#[test]
fn test_non_polynomial_equation_is_searched()
{
    let calc = Calculator::default();
    match calc.solve_equation("1/x = 4").unwrap()
    {
        Answer::Solutions(s) => {
            assert_eq!(s.real.len(), 1);
            assert!((s.real[0] - 0.25).abs() < 1e-9);
        },
        other => panic!("expected solutions, got {other}"),
    }
}

#[test]
fn test_system_rejects_stray_unknown()
{
    let calc = Calculator::default();
    let symbols = ["x".to_owned(), "y".to_owned()];
    let err = calc.solve_system(&["x + z = 5", "x - y = 1"], &symbols).unwrap_err();
    assert_eq!(
        err.downcast_ref::<EquationSolverError>(),
        Some(&EquationSolverError::UnknownOutsideSymbols)
    );
}

#[test]
fn test_system_under_constrained()
{
    let calc = Calculator::default();
    let symbols = ["x".to_owned(), "y".to_owned()];
    let err = calc.solve_system(&["x + y = 5"], &symbols).unwrap_err();
    assert_eq!(
        err.downcast_ref::<EquationSolverError>(),
        Some(&EquationSolverError::UnderConstrainedSystem)
    );
}

#[test]
fn test_split_rejects_other_variables()
{
    let calc = Calculator::default();
    let err = calc.split_middle_term("x^2 + y", "x").unwrap_err();
    assert_eq!(err.downcast_ref::<SplitError>(), Some(&SplitError::NotQuadratic));
}

#[test]
fn test_complex_formatting()
{
    assert_eq!(format_complex(Complex64::new(1.0, -2.0)), "1 - 2i");
    assert_eq!(format_complex(Complex64::new(0.0, 1.0)), "i");
    assert_eq!(format_complex(Complex64::new(-0.5, 1.5)), "-0.5 + 1.5i");
}
