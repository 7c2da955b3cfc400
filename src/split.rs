//! Factoring `ax^2 + bx + c` over the integers by splitting the middle term:
//! find `p + q = b` with `p * q = a * c`, then
//! `ax^2 + bx + c = (ax + p)(ax + q) / a`.

use std::fmt;

use log::debug;
use num_integer::Integer;
use serde::Serialize;

use crate::errors::SplitError;
use crate::polynomial::{format_terms, Polynomial};

/// Integer coefficients of `a*x^2 + b*x + c` with `a != 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Quadratic
{
    pub a: i64,
    pub b: i64,
    pub c: i64,
}

impl Quadratic
{
    pub fn new(a: i64, b: i64, c: i64) -> anyhow::Result<Quadratic>
    {
        if a == 0
        {
            return Err(SplitError::ZeroLeadingCoefficient.into());
        }
        Ok(Quadratic { a, b, c })
    }

    /// Reads the coefficients off an expanded polynomial, which must have
    /// degree exactly 2 and integer coefficients.
    pub fn from_polynomial(poly: &Polynomial) -> anyhow::Result<Quadratic>
    {
        if poly.degree() != Some(2)
        {
            return Err(SplitError::NotQuadratic.into());
        }
        match poly.integer_coeffs().as_deref()
        {
            Some(&[c, b, a]) => Quadratic::new(a, b, c),
            _ => Err(SplitError::NonIntegerCoefficients.into()),
        }
    }

    /// `a * c`, or an error when it does not fit in an `i64`.
    pub fn product(&self) -> anyhow::Result<i64>
    {
        self.a
            .checked_mul(self.c)
            .ok_or_else(|| SplitError::CoefficientsTooLarge.into())
    }

    pub fn display(&self, symbol: &str) -> String
    {
        format_terms(
            &[(self.a as f64, 2), (self.b as f64, 1), (self.c as f64, 0)],
            symbol,
        )
    }
}

/// Two integers with `p + q = b` and `p * q = a * c`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FactorPair
{
    pub p: i64,
    pub q: i64,
}

/// Everything reported about a successful split, ready for display.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SplitResult
{
    pub quadratic: Quadratic,
    pub pair: FactorPair,
    pub original: String,
    pub split_terms: String,
    pub factors: String,
    pub middle_terms: String,
    /// `false` when the factored form had to fall back to the `/a` display.
    pub exact: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SplitOutcome
{
    Split(SplitResult),
    NoSuitableSplit { original: String },
}

/// Every factor pair `(i, ac / i)` and its negation, for `i` running over
/// `[-|ac|, |ac|]` without zero, in that order.
///
/// # Example
/// ```
/// use geqscalc::split::{factor_pairs, FactorPair};
///
/// let pairs: Vec<FactorPair> = factor_pairs(2).collect();
/// assert_eq!(pairs[0], FactorPair { p: -2, q: -1 });
/// assert_eq!(pairs[1], FactorPair { p: 2, q: 1 });
/// assert_eq!(pairs.len(), 8);
/// ```
pub fn factor_pairs(ac: i64) -> impl Iterator<Item = FactorPair>
{
    let bound = ac.unsigned_abs() as i64;
    (-bound..=bound)
        .filter(move |&i| i != 0 && ac % i == 0)
        .flat_map(move |i| {
            let j = ac / i;
            [FactorPair { p: i, q: j }, FactorPair { p: -i, q: -j }]
        })
}

/// Finds the first factor pair of `a * c` that sums to `b`.
///
/// When `c == 0` the divisor scan is skipped and the pair `(0, b)` is
/// reported, matching the direct factoring `x(ax + b)`. `max_search` bounds
/// `|a * c|` since the scan is linear in it.
///
/// # Example
/// ```
/// use geqscalc::split::{find_factor_pair, Quadratic};
///
/// let quad = Quadratic::new(1, 5, 6).unwrap();
/// let pair = find_factor_pair(&quad, 1_000_000).unwrap().unwrap();
///
/// assert_eq!(pair.p + pair.q, 5);
/// assert_eq!(pair.p * pair.q, 6);
/// ```
pub fn find_factor_pair(quad: &Quadratic, max_search: u64) -> anyhow::Result<Option<FactorPair>>
{
    let ac = quad.product()?;
    if ac == 0
    {
        return Ok(Some(FactorPair { p: 0, q: quad.b }));
    }
    if ac.unsigned_abs() > max_search
    {
        return Err(SplitError::CoefficientsTooLarge.into());
    }

    Ok(factor_pairs(ac).find(|pair| pair.p.checked_add(pair.q) == Some(quad.b)))
}

/// A linear factor `m*x + n`, kept with `m > 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Binomial
{
    m: i64,
    n: i64,
}

impl Binomial
{
    fn render(&self, symbol: &str) -> String
    {
        let lead = if self.m == 1 { symbol.to_owned() } else { format!("{}{symbol}", self.m) };
        match self.n
        {
            0 => lead,
            n if n > 0 => format!("({lead}+{n})"),
            n => format!("({lead}-{})", n.unsigned_abs()),
        }
    }
}

/// Builds the factored form `k(m1 x + n1)(m2 x + n2)` from `(ax + p)(ax + q) / a`.
/// Returns the rendering and whether the leftover constant came out integral.
fn factored_form(quad: &Quadratic, pair: &FactorPair, symbol: &str) -> (String, bool)
{
    let a = quad.a;

    // divide each (ax + r) by its content, keeping the x coefficient positive
    let contents = [pair.p, pair.q].map(|r| a.gcd(&r) * a.signum());
    let mut binomials: Vec<Binomial> = [pair.p, pair.q]
        .iter()
        .zip(contents)
        .map(|(r, content)| Binomial { m: a / content, n: r / content })
        .collect();

    // the leftover constant is contents[0] * contents[1] / a
    let rest = a / contents[0];
    if contents[1] % rest != 0
    {
        debug!("leftover constant is not integral for a = {a}, falling back to rational display");
        let fallback = format!(
            "({}{symbol}{:+})({}{symbol}{:+})/{a}",
            a, pair.p, a, pair.q
        );
        return (fallback, false);
    }
    let k = contents[1] / rest;

    // bare x factors first, then larger x coefficients, then smaller constants
    binomials.sort_by(|l, r| {
        (l.n != 0).cmp(&(r.n != 0))
            .then(r.m.cmp(&l.m))
            .then(l.n.cmp(&r.n))
    });

    let mut rendered = match k
    {
        1 => String::new(),
        -1 => "-".to_owned(),
        k => k.to_string(),
    };
    if binomials.iter().all(|b| b.n == 0)
    {
        rendered.push_str(&format!("{symbol}^2"));
    }
    else
    {
        for binomial in &binomials
        {
            rendered.push_str(&binomial.render(symbol));
        }
    }
    (rendered, true)
}

/// Splits the middle term of `quad`, reporting either the full factoring or
/// that no integer factor pair of `a * c` sums to `b`.
///
/// # Example
/// ```
/// use geqscalc::split::{split, Quadratic, SplitOutcome};
///
/// let quad = Quadratic::new(2, 7, 3).unwrap();
/// match split(&quad, "x", 1_000_000).unwrap()
/// {
///     SplitOutcome::Split(res) => assert_eq!(res.factors, "(2x+1)(x+3)"),
///     SplitOutcome::NoSuitableSplit { .. } => panic!("2x^2 + 7x + 3 factors"),
/// }
/// ```
pub fn split(quad: &Quadratic, symbol: &str, max_search: u64) -> anyhow::Result<SplitOutcome>
{
    let original = quad.display(symbol);
    let pair = match find_factor_pair(quad, max_search)?
    {
        Some(pair) => pair,
        None => return Ok(SplitOutcome::NoSuitableSplit { original }),
    };
    debug!("split {original} with p = {}, q = {}", pair.p, pair.q);

    let (factors, exact) = factored_form(quad, &pair, symbol);
    let ac = quad.product()?;

    let split_terms = format_terms(
        &[
            (quad.a as f64, 2),
            (pair.p as f64, 1),
            (pair.q as f64, 1),
            (quad.c as f64, 0),
        ],
        symbol,
    );
    let middle_terms = format!(
        "{}{symbol} and {}{symbol} (sum = {}{symbol}, product = {})",
        pair.p, pair.q, quad.b, ac
    );

    Ok(SplitOutcome::Split(SplitResult {
        quadratic: *quad,
        pair,
        original,
        split_terms,
        factors,
        middle_terms,
        exact,
    }))
}

impl fmt::Display for SplitOutcome
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        match self
        {
            SplitOutcome::Split(res) => {
                writeln!(f, "original: {}", res.original)?;
                writeln!(f, "split_terms: {}", res.split_terms)?;
                writeln!(f, "factors: {}", res.factors)?;
                write!(f, "middle_terms: {}", res.middle_terms)
            },
            SplitOutcome::NoSuitableSplit { original } => write!(
                f,
                "Could not find suitable factors for middle term splitting of {original}"
            ),
        }
    }
}

#[cfg(test)]
fn factors_of(a: i64, b: i64, c: i64) -> SplitOutcome
{
    split(&Quadratic::new(a, b, c).unwrap(), "x", 1_000_000).unwrap()
}

#[test]
fn test_split_monic()
{
    match factors_of(1, 5, 6)
    {
        SplitOutcome::Split(res) => {
            assert_eq!(res.factors, "(x+2)(x+3)");
            assert_eq!(res.pair.p + res.pair.q, 5);
            assert_eq!(res.pair.p * res.pair.q, 6);
            assert_eq!(res.original, "x^2 + 5x + 6");
            assert!(res.exact);
        },
        other => panic!("expected a split, got {other:?}"),
    }
}

#[test]
fn test_split_non_monic()
{
    match factors_of(2, 7, 3)
    {
        SplitOutcome::Split(res) => {
            assert_eq!(res.factors, "(2x+1)(x+3)");
            assert_eq!(res.middle_terms, format!("{}x and {}x (sum = 7x, product = 6)", res.pair.p, res.pair.q));
        },
        other => panic!("expected a split, got {other:?}"),
    }
}

#[test]
fn test_no_suitable_split()
{
    assert_eq!(
        factors_of(1, 0, 1),
        SplitOutcome::NoSuitableSplit { original: "x^2 + 1".to_owned() }
    );
    assert!(matches!(factors_of(1, 1, 1), SplitOutcome::NoSuitableSplit { .. }));
}

#[test]
fn test_negative_and_content_factors()
{
    let rendered = |a, b, c| match factors_of(a, b, c)
    {
        SplitOutcome::Split(res) => res.factors,
        other => panic!("expected a split, got {other:?}"),
    };

    assert_eq!(rendered(1, -5, 6), "(x-3)(x-2)");
    assert_eq!(rendered(-1, 5, -6), "-(x-3)(x-2)");
    assert_eq!(rendered(2, 4, 2), "2(x+1)(x+1)");
    assert_eq!(rendered(6, 1, -2), "(3x+2)(2x-1)");
    assert_eq!(rendered(1, 0, -9), "(x-3)(x+3)");
}

#[test]
fn test_zero_constant_factors_out_x()
{
    let res = match factors_of(2, 4, 0)
    {
        SplitOutcome::Split(res) => res,
        other => panic!("expected a split, got {other:?}"),
    };
    assert_eq!(res.pair, FactorPair { p: 0, q: 4 });
    assert_eq!(res.factors, "2x(x+2)");

    match factors_of(3, 0, 0)
    {
        SplitOutcome::Split(res) => assert_eq!(res.factors, "3x^2"),
        other => panic!("expected a split, got {other:?}"),
    }
}

#[test]
fn test_every_found_pair_is_valid()
{
    for a in [-3, -1, 1, 2, 5]
    {
        for b in -12..=12
        {
            for c in [-8, -3, -1, 1, 4, 9]
            {
                let quad = Quadratic::new(a, b, c).unwrap();
                if let Some(pair) = find_factor_pair(&quad, 1_000_000).unwrap()
                {
                    assert_eq!(pair.p + pair.q, b);
                    assert_eq!(pair.p * pair.q, a * c);
                }
            }
        }
    }
}

#[test]
fn test_existing_pair_is_always_found()
{
    for a in (-6..=6).filter(|&a| a != 0)
    {
        for b in -15..=15
        {
            for c in (-12..=12).filter(|&c| c != 0)
            {
                let ac: i64 = a * c;
                let exists = (-ac.abs()..=ac.abs())
                    .any(|p| p != 0 && ac % p == 0 && p + ac / p == b);

                let quad = Quadratic::new(a, b, c).unwrap();
                let found = find_factor_pair(&quad, 1_000_000).unwrap();
                assert_eq!(found.is_some(), exists, "a = {a}, b = {b}, c = {c}");
            }
        }
    }
}

#[test]
fn test_non_integral_leftover_falls_back_to_rational_form()
{
    // (4x + 2)(4x + 3) / 4 is not an integer polynomial; find_factor_pair
    // never yields such a pair, so build it directly
    let quad = Quadratic::new(4, 5, 1).unwrap();
    let (factors, exact) = factored_form(&quad, &FactorPair { p: 2, q: 3 }, "x");

    assert_eq!(factors, "(4x+2)(4x+3)/4");
    assert!(!exact);
}

#[test]
fn test_split_is_deterministic()
{
    assert_eq!(factors_of(4, -4, -15), factors_of(4, -4, -15));
}

#[test]
fn test_search_bound()
{
    let quad = Quadratic::new(1000, 1, 1000).unwrap();
    let err = find_factor_pair(&quad, 10).unwrap_err();
    assert_eq!(err.downcast_ref::<SplitError>(), Some(&SplitError::CoefficientsTooLarge));
}

#[test]
fn test_zero_leading_coefficient()
{
    let err = Quadratic::new(0, 1, 1).unwrap_err();
    assert_eq!(err.downcast_ref::<SplitError>(), Some(&SplitError::ZeroLeadingCoefficient));
}
