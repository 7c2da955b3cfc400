//! Turns loosely written math ("2x plus 3 squared") into the syntax the
//! shunting yard understands ("2*x + 3^2").

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::errors::{CleanerError, EquationSolverError};

/// One rewrite step of the cleaner.
pub struct Rule
{
    pub pattern: Regex,
    pub replacement: &'static str,
    /// The phrase this rule is meant to catch.
    pub describes: &'static str,
}

fn rule(pattern: &str, replacement: &'static str, describes: &'static str) -> Rule
{
    Rule
    {
        pattern: Regex::new(pattern).unwrap(),
        replacement,
        describes,
    }
}

lazy_static!
{
    /// Applied top to bottom after lowercasing. Multi-word phrases come
    /// before the single words they contain.
    pub static ref RULES: Vec<Rule> = vec![
        rule(r"\b(what is|what's|calculate|compute|evaluate|find)\b", " ", "question filler such as 'what is'"),
        rule(r"\bsquare root of\b", "sqrt", "'square root of 9' -> 'sqrt 9'"),
        rule(r"\b(divided by|divide by|over)\b", "/", "'6 divided by 3' -> '6 / 3'"),
        rule(r"\b(multiplied by|multiply|times)\b", "*", "'2 times 3' -> '2 * 3'"),
        rule(r"\b(plus|add)\b", "+", "'2 plus 3' -> '2 + 3'"),
        rule(r"\b(minus|subtract)\b", "-", "'5 minus 3' -> '5 - 3'"),
        rule(r"\b(to the power of|power)\b", "^", "'2 power 3' -> '2 ^ 3'"),
        rule(r"\*\*", "^", "python style '2**3' -> '2^3'"),
        rule(r"\s*\bsquared\b", "^2", "'3 squared' -> '3^2'"),
        rule(r"\s*\bcubed\b", "^3", "'3 cubed' -> '3^3'"),
        rule(r"\b([xyz])(\d+)\b", "${1}*${2}", "'x2' -> 'x*2'"),
        rule(r"\b(\d+(?:\.\d+)?)\s*([a-z(])", "${1}*${2}", "'2x' -> '2*x', '2(' -> '2*('"),
        rule(r"\)\s*([a-z0-9(])", ")*${1}", "')(' -> ')*('"),
        rule(r"[^0-9a-z_+\-*/^().,\s]", "", "anything outside the expression alphabet"),
        rule(r"\s+", " ", "runs of whitespace"),
    ];
}

/// Normalizes an expression by lowercasing it and running every rule in [`RULES`].
///
/// # Example
/// ```
/// use geqscalc::cleaner::clean_expression;
///
/// assert_eq!(clean_expression("What is 2X plus 3 squared?"), "2*x + 3^2");
/// assert_eq!(clean_expression("(x+2)(x+3)"), "(x+2)*(x+3)");
/// ```
pub fn clean_expression(text: &str) -> String
{
    let mut expr = text.to_lowercase();
    for rule in RULES.iter()
    {
        expr = rule.pattern.replace_all(&expr, rule.replacement).into_owned();
    }
    let expr = expr.trim().to_owned();
    debug!("cleaned '{text}' to '{expr}'");
    expr
}

fn is_number(token: &str) -> bool
{
    lazy_static!
    {
        static ref NUM: Regex = Regex::new(r"^-?\d*\.?\d+$").unwrap();
    }
    NUM.is_match(token)
}

/// Catches the mistakes a user is most likely to make before the expression
/// reaches the evaluator, so the error can say what to fix.
///
/// # Example
/// ```
/// use geqscalc::cleaner::validate_expression;
///
/// assert!(validate_expression("2 * 3").is_ok());
/// assert!(validate_expression("2 3").is_err());
/// assert!(validate_expression("2 */ 3").is_err());
/// ```
pub fn validate_expression(expr: &str) -> Result<(), CleanerError>
{
    lazy_static!
    {
        static ref OP_RUN: Regex = Regex::new(r"[+\-*/^]\s*[+*/^]").unwrap();
    }

    if expr.trim().is_empty()
    {
        return Err(CleanerError::EmptyExpression);
    }

    let tokens: Vec<&str> = expr.split_whitespace().collect();
    for pair in tokens.windows(2)
    {
        if is_number(pair[0]) && is_number(pair[1])
        {
            return Err(CleanerError::MissingOperator(pair[0].to_owned(), pair[1].to_owned()));
        }
    }

    if let Some(run) = OP_RUN.find(expr)
    {
        return Err(CleanerError::OperatorSequence(run.as_str().to_owned()));
    }

    Ok(())
}

/// Cleans both sides of `lhs = rhs` and moves everything to one side as
/// `lhs - (rhs)`, ready to be treated as an expression equal to zero.
///
/// # Example
/// ```
/// use geqscalc::cleaner::parse_equation;
///
/// assert_eq!(parse_equation("2x + 3 = 7").unwrap(), "2*x + 3 - (7)");
/// assert!(parse_equation("x + 1").is_err());
/// ```
pub fn parse_equation(text: &str) -> anyhow::Result<String>
{
    let sides: Vec<&str> = text.split('=').collect();
    match sides.len()
    {
        1 => return Err(EquationSolverError::FoundExpression.into()),
        2 => (),
        _ => return Err(EquationSolverError::FoundMultipleEquations.into()),
    }

    let lhs = clean_expression(sides[0]);
    let rhs = clean_expression(sides[1]);
    validate_expression(&lhs)?;
    validate_expression(&rhs)?;

    Ok(format!("{lhs} - ({rhs})"))
}

#[test]
fn test_word_operators()
{
    assert_eq!(clean_expression("5 minus 3 times 2"), "5 - 3 * 2");
    assert_eq!(clean_expression("6 divided by 3 add 1"), "6 / 3 + 1");
    assert_eq!(clean_expression("2 power 3"), "2 ^ 3");
    assert_eq!(clean_expression("2 to the power of 10"), "2 ^ 10");
    assert_eq!(clean_expression("2**3"), "2^3");
    assert_eq!(clean_expression("x cubed"), "x^3");
    assert_eq!(clean_expression("square root of 16"), "sqrt 16");
}

#[test]
fn test_implicit_multiplication()
{
    assert_eq!(clean_expression("3x^2 + 2x"), "3*x^2 + 2*x");
    assert_eq!(clean_expression("2(x + 1)"), "2*(x + 1)");
    assert_eq!(clean_expression("x2 + 1"), "x*2 + 1");
    assert_eq!(clean_expression("2 pi"), "2*pi");
}

#[test]
fn test_function_names_survive()
{
    assert_eq!(clean_expression("log10(100) + sqrt(4)"), "log10(100) + sqrt(4)");
    assert_eq!(clean_expression("log(8, 2)"), "log(8, 2)");
}

#[test]
fn test_strips_stray_characters()
{
    assert_eq!(clean_expression("  2 + 2 = ?! "), "2 + 2");
    assert_eq!(clean_expression("x  +\t1"), "x + 1");
}

#[test]
fn test_validation_messages()
{
    assert_eq!(validate_expression(""), Err(CleanerError::EmptyExpression));
    assert_eq!(
        validate_expression("12 7"),
        Err(CleanerError::MissingOperator("12".to_owned(), "7".to_owned()))
    );
    assert!(validate_expression("2 ++ 3").is_err());

    // a minus after an operator is unary
    assert!(validate_expression("2 * -3").is_ok());
    assert!(validate_expression("2 - -3").is_ok());
}

#[test]
fn test_parse_equation_rejects_two_equals()
{
    let err = parse_equation("x = 1 = 2").unwrap_err();
    assert_eq!(
        err.downcast_ref::<EquationSolverError>(),
        Some(&EquationSolverError::FoundMultipleEquations)
    );
}
