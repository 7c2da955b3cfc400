use std::collections::HashMap;

use log::debug;
use nalgebra::{DMatrix, DVector};

use crate::errors::NewtonRaphsonSolverError;

const _DX_: f64 = 0.0001;

/// A basic implementation of the 1-D newton-raphson method.
/// This function allows the caller to choose an initial guess value,
/// a margin of error, and a maximum number of iterations prior to
/// returning a value.
///
/// # Example
/// ```
/// use geqscalc::newton::newton_raphson;
///
/// let y = newton_raphson(|x| Ok(x * x), 1.0, 0.0001, 10).unwrap();
///
/// assert!(y < 0.01); // solution is APPROXIMATE. In this case, very close to 0.
/// ```
pub fn newton_raphson(f: impl Fn(f64) -> anyhow::Result<f64>, guess: f64, margin: f64, limit: usize) -> anyhow::Result<f64>
{
    // Catch illegal margin of error
    if margin <= 0.0
    {
        return Err(NewtonRaphsonSolverError::NegativeMargin.into());
    }

    let mut guess = guess;
    for _ in 0..limit
    {
        // Check if we are sufficiently close to the solution:
        let y = f(guess)?;
        if y.abs() <= margin
        {
            return Ok(guess); // ...if so, exit early
        }

        // ...if not, calculate next iteration
        let y_prime = (f(guess + _DX_)? - y) / _DX_;
        guess -= y / y_prime;
    }

    Err(NewtonRaphsonSolverError::ReachedIterationLimit.into())
}

/// Newton-Raphson for a square system. `guess` holds a starting value for every
/// unknown and is updated in place; the jacobian is estimated with forward
/// differences and inverted on every step.
///
/// # Example
/// ```
/// use std::collections::HashMap;
/// use geqscalc::newton::multivariate_newton_raphson;
///
/// type Eqn = fn(&HashMap<String, f64>) -> anyhow::Result<f64>;
///
/// let f: [Eqn; 2] = [
///     |v: &HashMap<String, f64>| Ok(v["x"] + v["y"] - 9.0),
///     |v: &HashMap<String, f64>| Ok(v["x"] - v["y"] - 4.0),
/// ];
/// let mut guess = HashMap::from([("x".to_string(), 1.0), ("y".to_string(), 1.0)]);
///
/// let soln = multivariate_newton_raphson(&f, &mut guess, 0.0001, 20).unwrap();
/// assert!((soln["x"] - 6.5).abs() < 0.001);
/// assert!((soln["y"] - 2.5).abs() < 0.001);
/// ```
pub fn multivariate_newton_raphson<'a, F>(f: &[F], guess: &'a mut HashMap<String, f64>, margin: f64, limit: usize) -> anyhow::Result<&'a mut HashMap<String, f64>>
where F: Fn(&HashMap<String, f64>) -> anyhow::Result<f64>
{
    // Catch illegal margin of error
    if margin <= 0.0
    {
        return Err(NewtonRaphsonSolverError::NegativeMargin.into());
    }

    // Establish system size
    let n = f.len();
    if guess.len() != n
    {
        return Err(NewtonRaphsonSolverError::ImproperlyConstrainedSystem.into());
    }

    // Fixed variable order so that jacobian columns line up with the step vector
    let mut vars: Vec<String> = guess.keys().cloned().collect();
    vars.sort();

    for _ in 0..limit
    {
        // Calculate current error
        let mut y = DVector::<f64>::zeros(n);
        for i in 0..n
        {
            y[i] = f[i](&*guess)?;
        }

        // Return guess if it is close enough to solution
        if y.iter()
            .map(|v| v.abs())
            .sum::<f64>() < margin
        {
            return Ok(guess);
        }

        let mut jacobian = DMatrix::<f64>::zeros(n, n);
        for (j, var) in vars.iter().enumerate()
        {
            if let Some(v) = guess.get_mut(var)
            {
                *v += _DX_;
            }
            for i in 0..n
            {
                jacobian[(i, j)] = (f[i](&*guess)? - y[i]) / _DX_;
            }
            if let Some(v) = guess.get_mut(var)
            {
                *v -= _DX_;
            }
        }

        let inverse = jacobian
            .try_inverse()
            .ok_or(NewtonRaphsonSolverError::SingularJacobian)?;

        // COMPUTER, ENHANCE!
        let step = inverse * y;
        for (j, var) in vars.iter().enumerate()
        {
            if let Some(v) = guess.get_mut(var)
            {
                *v -= step[j];
            }
        }
    }

    Err(NewtonRaphsonSolverError::ReachedIterationLimit.into())
}

/// Looks for every real root of `f` reachable by starting newton-raphson from
/// a grid of guesses spread across `[-span, span]`, plus guesses halving from
/// `±span` toward zero for roots the grid is too coarse to reach. Roots are
/// returned ascending with near-duplicates merged; guesses that diverge are skipped.
///
/// # Example
/// ```
/// use geqscalc::newton::scan_real_roots;
///
/// let roots = scan_real_roots(|x| Ok(x.sin()), 4.0, 1e-10, 50);
///
/// assert_eq!(roots.len(), 3); // -pi, 0, pi
/// assert!((roots[2] - std::f64::consts::PI).abs() < 1e-6);
/// ```
pub fn scan_real_roots(f: impl Fn(f64) -> anyhow::Result<f64>, span: f64, margin: f64, limit: usize) -> Vec<f64>
{
    const STEPS: usize = 64;
    const HALVINGS: i32 = 24;

    let grid = (0..=STEPS).map(|k| -span + 2.0 * span * (k as f64) / (STEPS as f64));
    let halvings = (1..=HALVINGS)
        .map(|k| span / 2f64.powi(k))
        .flat_map(|g| [g, -g]);

    let mut roots: Vec<f64> = Vec::new();
    for guess in grid.chain(halvings)
    {
        let root = match newton_raphson(&f, guess, margin, limit)
        {
            Ok(root) if root.is_finite() && root.abs() <= span => root,
            Ok(_) => continue,
            Err(e) => {
                debug!("no root reached from guess {guess}: {e}");
                continue;
            },
        };

        let seen = roots
            .iter()
            .any(|r| (r - root).abs() <= 1e-6 * (1.0 + root.abs()));
        if !seen
        {
            roots.push(root);
        }
    }

    roots.sort_by(|a, b| a.total_cmp(b));
    roots
}

#[test]
fn test_newton_raphson_rejects_bad_margin()
{
    let err = newton_raphson(|x| Ok(x - 1.0), 0.0, 0.0, 10).unwrap_err();
    assert_eq!(
        err.downcast_ref::<NewtonRaphsonSolverError>(),
        Some(&NewtonRaphsonSolverError::NegativeMargin)
    );
}

#[test]
fn test_newton_raphson_hits_iteration_limit()
{
    // no real root, so iteration never settles
    let err = newton_raphson(|x| Ok(x * x + 1.0), 0.5, 1e-9, 25).unwrap_err();
    assert_eq!(
        err.downcast_ref::<NewtonRaphsonSolverError>(),
        Some(&NewtonRaphsonSolverError::ReachedIterationLimit)
    );
}

#[test]
fn test_large_iteration_limits_do_not_grow_the_stack()
{
    let err = newton_raphson(|x| Ok(x * x + 1.0), 0.5, 1e-9, 1_000_000).unwrap_err();
    assert_eq!(
        err.downcast_ref::<NewtonRaphsonSolverError>(),
        Some(&NewtonRaphsonSolverError::ReachedIterationLimit)
    );

    // parallel lines never meet, but each step stays finite
    let f: [fn(&HashMap<String, f64>) -> anyhow::Result<f64>; 2] = [
        |v: &HashMap<String, f64>| Ok(v["x"] * v["x"] + v["y"] * v["y"] + 1.0),
        |v: &HashMap<String, f64>| Ok(v["x"] - v["y"]),
    ];
    let mut guess = HashMap::from([("x".to_string(), 0.5), ("y".to_string(), 0.5)]);
    let err = multivariate_newton_raphson(&f, &mut guess, 1e-9, 200_000).unwrap_err();
    assert!(err.downcast_ref::<NewtonRaphsonSolverError>().is_some());
}

#[test]
fn test_multivariate_rejects_mismatched_system()
{
    let f: [fn(&HashMap<String, f64>) -> anyhow::Result<f64>; 1] = [|v| Ok(v["x"] - 1.0)];
    let mut guess = HashMap::from([("x".to_string(), 0.0), ("y".to_string(), 0.0)]);

    let err = multivariate_newton_raphson(&f, &mut guess, 0.001, 10).unwrap_err();
    assert_eq!(
        err.downcast_ref::<NewtonRaphsonSolverError>(),
        Some(&NewtonRaphsonSolverError::ImproperlyConstrainedSystem)
    );
}

#[test]
fn test_multivariate_nonlinear_system()
{
    // circle of radius 5 meets the line y = x + 1 at (3, 4) and (-4, -3)
    let f: [fn(&HashMap<String, f64>) -> anyhow::Result<f64>; 2] = [
        |v: &HashMap<String, f64>| Ok(v["x"] * v["x"] + v["y"] * v["y"] - 25.0),
        |v: &HashMap<String, f64>| Ok(v["y"] - v["x"] - 1.0),
    ];
    let mut guess = HashMap::from([("x".to_string(), 2.0), ("y".to_string(), 2.0)]);

    let soln = multivariate_newton_raphson(&f, &mut guess, 1e-9, 50).unwrap();
    assert!((soln["x"] - 3.0).abs() < 1e-6);
    assert!((soln["y"] - 4.0).abs() < 1e-6);
}
