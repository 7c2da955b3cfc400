use std::fmt;

use nalgebra::DMatrix;
use num_complex::Complex64;

use crate::errors::{PolynomialError, ShuntingYardError};
use crate::shunting::{get_context_vars, get_legal_variables_iter, rpnify, ContextHashMap, ContextLike, Token};

/// Coefficients smaller than this are treated as rounding noise.
const ZERO_TOL: f64 = 1e-12;

/// Roots whose real or imaginary part falls below this are snapped to zero.
const ROOT_ZERO_TOL: f64 = 1e-10;

/// Highest degree the expander will build.
pub const MAX_DEGREE: usize = 64;

/// A polynomial in a single named symbol. `coeffs[k]` multiplies `symbol^k`.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial
{
    symbol: String,
    coeffs: Vec<f64>,
}

impl Polynomial
{
    pub fn new(symbol: &str, coeffs: Vec<f64>) -> Polynomial
    {
        let mut poly = Polynomial { symbol: symbol.to_owned(), coeffs };
        poly.trim();
        poly
    }

    fn constant(symbol: &str, value: f64) -> Polynomial
    {
        Polynomial::new(symbol, vec![value])
    }

    fn monomial(symbol: &str) -> Polynomial
    {
        Polynomial::new(symbol, vec![0.0, 1.0])
    }

    fn trim(&mut self)
    {
        for c in self.coeffs.iter_mut()
        {
            if c.abs() <= ZERO_TOL
            {
                *c = 0.0;
            }
        }
        while self.coeffs.last() == Some(&0.0)
        {
            self.coeffs.pop();
        }
    }

    pub fn symbol(&self) -> &str
    {
        &self.symbol
    }

    /// Degree of the polynomial, or `None` for the zero polynomial.
    pub fn degree(&self) -> Option<usize>
    {
        self.coeffs.len().checked_sub(1)
    }

    /// Coefficient of `symbol^k`.
    pub fn coeff(&self, k: usize) -> f64
    {
        self.coeffs.get(k).copied().unwrap_or(0.0)
    }

    fn as_constant(&self) -> Option<f64>
    {
        match self.coeffs.len()
        {
            0 => Some(0.0),
            1 => Some(self.coeffs[0]),
            _ => None,
        }
    }

    /// Coefficients as integers, lowest power first, when every one of
    /// them is within rounding distance of an `i64`.
    pub fn integer_coeffs(&self) -> Option<Vec<i64>>
    {
        self.coeffs
            .iter()
            .map(|&c| {
                let rounded = c.round();
                let fits = rounded.abs() < i64::MAX as f64 && (c - rounded).abs() <= 1e-9;
                fits.then_some(rounded as i64)
            })
            .collect()
    }

    fn add(&self, other: &Polynomial) -> Polynomial
    {
        let n = self.coeffs.len().max(other.coeffs.len());
        let coeffs = (0..n).map(|k| self.coeff(k) + other.coeff(k)).collect();
        Polynomial::new(&self.symbol, coeffs)
    }

    fn scale(&self, factor: f64) -> Polynomial
    {
        Polynomial::new(&self.symbol, self.coeffs.iter().map(|c| c * factor).collect())
    }

    fn mul(&self, other: &Polynomial) -> anyhow::Result<Polynomial>
    {
        if self.coeffs.is_empty() || other.coeffs.is_empty()
        {
            return Ok(Polynomial::constant(&self.symbol, 0.0));
        }
        if self.coeffs.len() + other.coeffs.len() - 2 > MAX_DEGREE
        {
            return Err(PolynomialError::DegreeTooHigh.into());
        }
        let mut coeffs = vec![0.0; self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate()
        {
            for (j, b) in other.coeffs.iter().enumerate()
            {
                coeffs[i + j] += a * b;
            }
        }
        Ok(Polynomial::new(&self.symbol, coeffs))
    }

    /// `self^exponent`, refused up front when the result would pass `MAX_DEGREE`.
    fn powi(&self, exponent: f64) -> anyhow::Result<Polynomial>
    {
        let degree = self.degree().unwrap_or(0) as f64;
        if degree * exponent > MAX_DEGREE as f64
        {
            return Err(PolynomialError::DegreeTooHigh.into());
        }
        let mut result = Polynomial::constant(&self.symbol, 1.0);
        for _ in 0..exponent as usize
        {
            result = result.mul(self)?;
        }
        Ok(result)
    }

    /// Every complex root, repeated by multiplicity. Degree 1 and 2 use the
    /// closed forms; higher degrees take the eigenvalues of the companion matrix.
    ///
    /// # Example
    /// ```
    /// use geqscalc::polynomial::Polynomial;
    ///
    /// // x^2 + 1
    /// let roots = Polynomial::new("x", vec![1.0, 0.0, 1.0]).roots().unwrap();
    ///
    /// assert_eq!(roots.len(), 2);
    /// assert!(roots.iter().all(|z| z.re == 0.0 && (z.im.abs() - 1.0).abs() < 1e-12));
    /// ```
    pub fn roots(&self) -> anyhow::Result<Vec<Complex64>>
    {
        let degree = self.degree().ok_or(PolynomialError::ZeroPolynomial)?;
        let roots = match degree
        {
            0 => Vec::new(),
            1 => vec![Complex64::new(-self.coeffs[0] / self.coeffs[1], 0.0)],
            2 => quadratic_roots(self.coeffs[2], self.coeffs[1], self.coeffs[0]),
            _ => self.companion_roots()?,
        };
        Ok(roots.into_iter().map(canonicalize_root).collect())
    }

    fn companion_roots(&self) -> anyhow::Result<Vec<Complex64>>
    {
        let degree = self.coeffs.len() - 1;
        let leading = self.coeffs[degree];

        let mut companion = DMatrix::<Complex64>::zeros(degree, degree);
        for row in 1..degree
        {
            companion[(row, row - 1)] = Complex64::new(1.0, 0.0);
        }
        for column in 0..degree
        {
            companion[(0, column)] = Complex64::new(-self.coeffs[degree - 1 - column] / leading, 0.0);
        }

        let eigenvalues = companion
            .eigenvalues()
            .ok_or_else(|| anyhow::anyhow!("failed to compute eigenvalues of the companion matrix"))?;
        Ok(eigenvalues.iter().copied().collect())
    }
}

fn quadratic_roots(a: f64, b: f64, c: f64) -> Vec<Complex64>
{
    let disc = Complex64::new(b * b - 4.0 * a * c, 0.0).sqrt();
    let b = Complex64::new(b, 0.0);
    vec![(-b - disc) / (2.0 * a), (-b + disc) / (2.0 * a)]
}

fn canonicalize_root(z: Complex64) -> Complex64
{
    if !z.re.is_finite() || !z.im.is_finite()
    {
        return z;
    }
    let mut real = z.re;
    let mut imag = z.im;
    if imag.abs() <= ROOT_ZERO_TOL * (1.0 + real.abs())
    {
        imag = 0.0;
    }
    if real.abs() <= ROOT_ZERO_TOL
    {
        real = 0.0;
    }
    Complex64::new(real, imag)
}

/// Formats a float without a trailing `.0` when it holds an integer.
pub fn format_number(value: f64) -> String
{
    if value.fract() == 0.0 && value.abs() < 1e15
    {
        format!("{}", value as i64)
    }
    else
    {
        format!("{value}")
    }
}

/// Renders `(coefficient, power)` terms in the given order, e.g. `2x^2 - x + 3`.
/// Zero terms are skipped.
pub fn format_terms(terms: &[(f64, usize)], symbol: &str) -> String
{
    let mut out = String::new();
    for &(coeff, power) in terms.iter().filter(|(c, _)| *c != 0.0)
    {
        let magnitude = coeff.abs();
        if out.is_empty()
        {
            if coeff < 0.0
            {
                out.push('-');
            }
        }
        else
        {
            out.push_str(if coeff < 0.0 { " - " } else { " + " });
        }

        if power == 0 || magnitude != 1.0
        {
            out.push_str(&format_number(magnitude));
        }
        match power
        {
            0 => {},
            1 => out.push_str(symbol),
            _ => out.push_str(&format!("{symbol}^{power}")),
        }
    }

    if out.is_empty()
    {
        out.push('0');
    }
    out
}

impl fmt::Display for Polynomial
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        let terms: Vec<(f64, usize)> = self.coeffs
            .iter()
            .copied()
            .enumerate()
            .rev()
            .map(|(k, c)| (c, k))
            .collect();
        write!(f, "{}", format_terms(&terms, &self.symbol))
    }
}

fn pop_two(stack: &mut Vec<Polynomial>) -> anyhow::Result<(Polynomial, Polynomial)>
{
    match (stack.pop(), stack.pop())
    {
        (Some(rhs), Some(lhs)) => Ok((lhs, rhs)),
        _ => Err(ShuntingYardError::ExpectedArg.into()),
    }
}

/// Expands `expr` into a polynomial in `symbol` by evaluating its reverse polish
/// form over polynomials instead of numbers. Constants and functions from
/// `ctx` are folded in; any other unknown makes the expression ineligible.
///
/// # Example
/// ```
/// use geqscalc::polynomial::expand_in;
/// use geqscalc::shunting::new_context;
///
/// let poly = expand_in("(2*x + 1)*(x + 3)", "x", &new_context()).unwrap();
///
/// assert_eq!(poly.degree(), Some(2));
/// assert_eq!(poly.to_string(), "2x^2 + 7x + 3");
/// ```
pub fn expand_in(expr: &str, symbol: &str, ctx: &ContextHashMap) -> anyhow::Result<Polynomial>
{
    // any name that is neither the symbol nor a known constant/function is a second unknown
    let strangers = get_legal_variables_iter(expr)
        .any(|name| name != symbol && !ctx.contains_key(name));
    let context_vars = get_context_vars(expr, ctx)
        .into_iter()
        .any(|name| name != symbol);
    if strangers || context_vars
    {
        return Err(PolynomialError::TooManyVariables.into());
    }

    let mut local = ctx.clone();
    local.add_var_to_ctx(symbol, 0.0);
    let rpn = rpnify(expr, &local)?;

    let mut stack: Vec<Polynomial> = Vec::new();
    for token in &rpn
    {
        match token
        {
            Token::Num(num) => stack.push(Polynomial::constant(symbol, *num)),

            Token::Var(_) => stack.push(Polynomial::monomial(symbol)),

            Token::Func(args, func) => {
                if stack.len() < *args
                {
                    return Err(ShuntingYardError::ExpectedArg.into());
                }
                let arguments = stack
                    .split_off(stack.len() - args)
                    .iter()
                    .map(Polynomial::as_constant)
                    .collect::<Option<Vec<f64>>>()
                    .ok_or(PolynomialError::NonConstantFunctionArg)?;
                stack.push(Polynomial::constant(symbol, func(&arguments)));
            },

            Token::Plus => {
                let (lhs, rhs) = pop_two(&mut stack)?;
                stack.push(lhs.add(&rhs));
            },

            Token::Minus => {
                let (lhs, rhs) = pop_two(&mut stack)?;
                stack.push(lhs.add(&rhs.scale(-1.0)));
            },

            Token::Mul => {
                let (lhs, rhs) = pop_two(&mut stack)?;
                stack.push(lhs.mul(&rhs)?);
            },

            Token::Div => {
                let (lhs, rhs) = pop_two(&mut stack)?;
                let divisor = rhs.as_constant().ok_or(PolynomialError::NonConstantDivisor)?;
                if divisor == 0.0
                {
                    return Err(ShuntingYardError::DivisionByZero.into());
                }
                stack.push(lhs.scale(1.0 / divisor));
            },

            Token::Exp => {
                let (base, exponent) = pop_two(&mut stack)?;
                let exponent = exponent.as_constant().ok_or(PolynomialError::NonIntegerExponent)?;
                match base.as_constant()
                {
                    Some(value) => stack.push(Polynomial::constant(symbol, value.powf(exponent))),
                    None => {
                        if exponent < 0.0 || exponent.fract() != 0.0
                        {
                            return Err(PolynomialError::NonIntegerExponent.into());
                        }
                        stack.push(base.powi(exponent)?);
                    },
                }
            },

            _ => return Err(ShuntingYardError::LeftoverToken.into()),
        }
    }

    match stack.len()
    {
        1 => stack.pop().ok_or_else(|| ShuntingYardError::NoTokens.into()),
        0 => Err(ShuntingYardError::NoTokens.into()),
        _ => Err(ShuntingYardError::LeftoverToken.into()),
    }
}

#[test]
fn test_expand_folds_constants_and_functions()
{
    let ctx = crate::shunting::new_context();
    let poly = expand_in("sqrt(4)*x^2 - x/2 + pi - pi", "x", &ctx).unwrap();

    assert_eq!(poly.degree(), Some(2));
    assert_eq!(poly.coeff(2), 2.0);
    assert_eq!(poly.coeff(1), -0.5);
    assert_eq!(poly.coeff(0), 0.0);
}

#[test]
fn test_expand_cancels_leading_terms()
{
    let ctx = crate::shunting::new_context();
    let poly = expand_in("(x + 1)^2 - x^2", "x", &ctx).unwrap();

    assert_eq!(poly.degree(), Some(1));
    assert_eq!(poly.integer_coeffs(), Some(vec![1, 2]));
}

#[test]
fn test_expand_rejects_non_polynomials()
{
    let ctx = crate::shunting::new_context();

    let err = expand_in("x + y", "x", &ctx).unwrap_err();
    assert_eq!(err.downcast_ref::<PolynomialError>(), Some(&PolynomialError::TooManyVariables));

    let err = expand_in("1 / x", "x", &ctx).unwrap_err();
    assert_eq!(err.downcast_ref::<PolynomialError>(), Some(&PolynomialError::NonConstantDivisor));

    let err = expand_in("x^0.5", "x", &ctx).unwrap_err();
    assert_eq!(err.downcast_ref::<PolynomialError>(), Some(&PolynomialError::NonIntegerExponent));

    let err = expand_in("sin(x)", "x", &ctx).unwrap_err();
    assert_eq!(err.downcast_ref::<PolynomialError>(), Some(&PolynomialError::NonConstantFunctionArg));
}

#[test]
fn test_expand_refuses_huge_degrees()
{
    let ctx = crate::shunting::new_context();

    let err = expand_in("(x^1024)^1024", "x", &ctx).unwrap_err();
    assert_eq!(err.downcast_ref::<PolynomialError>(), Some(&PolynomialError::DegreeTooHigh));

    let err = expand_in("(x^40 + 1)*(x^40 - 1)", "x", &ctx).unwrap_err();
    assert_eq!(err.downcast_ref::<PolynomialError>(), Some(&PolynomialError::DegreeTooHigh));

    let poly = expand_in("(x^8)^8", "x", &ctx).unwrap();
    assert_eq!(poly.degree(), Some(MAX_DEGREE));
}

#[test]
fn test_cubic_roots_from_companion_matrix()
{
    // (x - 1)(x - 2)(x - 3)
    let poly = Polynomial::new("x", vec![-6.0, 11.0, -6.0, 1.0]);
    let mut roots: Vec<f64> = poly.roots().unwrap().iter().map(|z| z.re).collect();
    roots.sort_by(|a, b| a.total_cmp(b));

    for (root, expected) in roots.iter().zip([1.0, 2.0, 3.0])
    {
        assert!((root - expected).abs() < 1e-8);
    }
}

#[test]
fn test_display()
{
    assert_eq!(Polynomial::new("x", vec![6.0, -5.0, 1.0]).to_string(), "x^2 - 5x + 6");
    assert_eq!(Polynomial::new("t", vec![0.0, -1.0, -2.5]).to_string(), "-2.5t^2 - t");
    assert_eq!(Polynomial::new("x", vec![]).to_string(), "0");
}
