use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::DispatchError;

/// A problem sorted into the operation that should handle it. Named
/// operations carry the text between their parentheses.
#[derive(Clone, Debug, PartialEq)]
pub enum Problem
{
    Power(String),
    Gcd(String),
    Circle(String),
    Triangle(String),
    Roots(String),
    Split(String),
    System(Vec<String>),
    Equation(String),
    Expression(String),
}

const NAMED_OPERATIONS: [(&str, fn(String) -> Problem); 6] = [
    ("power(",    Problem::Power),
    ("gcd(",      Problem::Gcd),
    ("circle(",   Problem::Circle),
    ("triangle(", Problem::Triangle),
    ("roots(",    Problem::Roots),
    ("split(",    Problem::Split),
];

impl Problem
{
    /// Routes `text` by, in order: a named operation prefix (case-insensitive),
    /// the word `and` (a system of equations), an `=` sign (one equation),
    /// and otherwise a plain expression.
    ///
    /// # Example
    /// ```
    /// use geqscalc::dispatch::Problem;
    ///
    /// assert_eq!(Problem::parse("GCD(48, 18)").unwrap(), Problem::Gcd("48, 18".to_owned()));
    /// assert_eq!(
    ///     Problem::parse("x + y = 5 and x - y = 1").unwrap(),
    ///     Problem::System(vec!["x + y = 5".to_owned(), "x - y = 1".to_owned()])
    /// );
    /// assert_eq!(Problem::parse("2x + 3 = 7").unwrap(), Problem::Equation("2x + 3 = 7".to_owned()));
    /// ```
    pub fn parse(text: &str) -> Result<Problem, DispatchError>
    {
        lazy_static!
        {
            static ref AND: Regex = Regex::new(r"\band\b").unwrap();
        }

        let text = text.trim();
        if text.is_empty()
        {
            return Err(DispatchError::EmptyProblem);
        }
        let lower = text.to_lowercase();

        for (prefix, make) in NAMED_OPERATIONS
        {
            if lower.starts_with(prefix)
            {
                let args = lower[prefix.len()..]
                    .strip_suffix(')')
                    .ok_or(DispatchError::UnclosedCall)?;
                return Ok(make(args.trim().to_owned()));
            }
        }

        if AND.is_match(&lower)
        {
            let equations = AND
                .split(&lower)
                .map(|eq| eq.trim().to_owned())
                .filter(|eq| !eq.is_empty())
                .collect();
            return Ok(Problem::System(equations));
        }

        if text.contains('=')
        {
            return Ok(Problem::Equation(text.to_owned()));
        }

        Ok(Problem::Expression(text.to_owned()))
    }

    /// Short name of the operation, used in logs.
    pub fn kind(&self) -> &'static str
    {
        match self
        {
            Problem::Power(_) => "power",
            Problem::Gcd(_) => "gcd",
            Problem::Circle(_) => "circle",
            Problem::Triangle(_) => "triangle",
            Problem::Roots(_) => "roots",
            Problem::Split(_) => "split",
            Problem::System(_) => "system",
            Problem::Equation(_) => "equation",
            Problem::Expression(_) => "expression",
        }
    }
}

#[test]
fn test_named_operations_keep_their_arguments()
{
    assert_eq!(Problem::parse("power(2,3)").unwrap(), Problem::Power("2,3".to_owned()));
    assert_eq!(Problem::parse("Circle(5)").unwrap(), Problem::Circle("5".to_owned()));
    assert_eq!(Problem::parse("triangle(3, 4, 5)").unwrap(), Problem::Triangle("3, 4, 5".to_owned()));
    assert_eq!(Problem::parse("roots(x^2 - 4)").unwrap(), Problem::Roots("x^2 - 4".to_owned()));
    assert_eq!(Problem::parse("  split(x^2 + 5x + 6)  ").unwrap(), Problem::Split("x^2 + 5x + 6".to_owned()));
}

#[test]
fn test_named_operation_prefix_wins_over_keywords()
{
    // contains both 'and' and '=' but is still a split request
    assert_eq!(Problem::parse("split(x^2 = 1 and 2)").unwrap().kind(), "split");
}

#[test]
fn test_and_must_be_a_whole_word()
{
    assert_eq!(Problem::parse("random + 1").unwrap().kind(), "expression");
    assert_eq!(Problem::parse("5 plus 3 AND 2").unwrap().kind(), "system");
}

#[test]
fn test_rejects_empty_and_unclosed()
{
    assert_eq!(Problem::parse("   "), Err(DispatchError::EmptyProblem));
    assert_eq!(Problem::parse("gcd(4, 6"), Err(DispatchError::UnclosedCall));
}
