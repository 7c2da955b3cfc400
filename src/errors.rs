use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// More concise syntax for implementing `Error` and `Display` for both structs and enums
macro_rules! impl_err {
    ($s:ty, $e:expr) => {
        impl Error for $s {}
        impl Display for $s {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, $e)
            }
        }
    };
    ($s:ty, $($p:path, $e:expr),*) => {
        impl Error for $s {}
        impl Display for $s {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                match self {
                    $($p => write!(f, $e),)*
                }
            }
        }
    };
}

#[derive(Debug, PartialEq)]
pub enum ShuntingYardError {
    UnclosedParenthesis,
    LeftoverToken,
    UnknownToken,
    ContextMutation,
    ExpectedArg,
    DivisionByZero,
    NoTokens,
}
impl_err! {
    ShuntingYardError,
    ShuntingYardError::UnclosedParenthesis, "found an unclosed parenthesis while converting expression to reverse polish notation",
    ShuntingYardError::LeftoverToken, "found a token when none were expected",
    ShuntingYardError::UnknownToken, "found an unexpected token while converting expression to reverse polish notation",
    ShuntingYardError::ContextMutation, "found reserved token in context",
    ShuntingYardError::ExpectedArg, "expected to find function argument, but none was present on the stack",
    ShuntingYardError::DivisionByZero, "tried to divide by zero during postfix evaluation",
    ShuntingYardError::NoTokens, "expected to find one token in postfix evaluation stack but found none"
}

#[derive(Debug, PartialEq)]
pub enum ExpressionCompilationError {
    NoVarsFound,
    MultipleVarsFound,
}
impl_err! {
    ExpressionCompilationError,
    ExpressionCompilationError::NoVarsFound, "failed to find a single unknown variable in the expression",
    ExpressionCompilationError::MultipleVarsFound, "found more than one unknown variable where a single one was expected"
}

#[derive(Debug, PartialEq)]
pub enum NewtonRaphsonSolverError {
    NegativeMargin,
    ReachedIterationLimit,
    ImproperlyConstrainedSystem,
    SingularJacobian,
}
impl_err! {
    NewtonRaphsonSolverError,
    NewtonRaphsonSolverError::NegativeMargin, "given margin value must be greater than 0",
    NewtonRaphsonSolverError::ReachedIterationLimit, "reached the maximum number of iterations without finding a solution",
    NewtonRaphsonSolverError::ImproperlyConstrainedSystem, "number of functions given did not match the number of variables",
    NewtonRaphsonSolverError::SingularJacobian, "the jacobian of the system could not be inverted at the current guess"
}

#[derive(Debug, PartialEq)]
pub enum EquationSolverError {
    SingleUnknownNotFound,
    FoundExpression,
    FoundMultipleEquations,
    UnderConstrainedSystem,
    UnknownOutsideSymbols,
}
impl_err! {
    EquationSolverError,
    EquationSolverError::SingleUnknownNotFound, "found either no unknowns in given context or too many to solve a single equation",
    EquationSolverError::FoundExpression, "expected an equation containing '=' but found an expression",
    EquationSolverError::FoundMultipleEquations, "found more than one '=' in a single equation",
    EquationSolverError::UnderConstrainedSystem, "the given equations do not fully constrain the system's unknowns",
    EquationSolverError::UnknownOutsideSymbols, "found an unknown that is not one of the symbols being solved for"
}

#[derive(Debug, PartialEq)]
pub enum PolynomialError {
    TooManyVariables,
    NonIntegerExponent,
    NonConstantDivisor,
    NonConstantFunctionArg,
    ZeroPolynomial,
    DegreeTooHigh,
}
impl_err! {
    PolynomialError,
    PolynomialError::TooManyVariables, "expression must contain exactly one free variable",
    PolynomialError::NonIntegerExponent, "expression is not a polynomial: exponents of the variable must be non-negative integers",
    PolynomialError::NonConstantDivisor, "expression is not a polynomial: cannot divide by an expression containing the variable",
    PolynomialError::NonConstantFunctionArg, "expression is not a polynomial: functions may only be applied to constants",
    PolynomialError::ZeroPolynomial, "expression is identically zero",
    PolynomialError::DegreeTooHigh, "expression expands to a polynomial of degree higher than 64"
}

#[derive(Debug, PartialEq)]
pub enum SplitError {
    NotQuadratic,
    NonIntegerCoefficients,
    ZeroLeadingCoefficient,
    CoefficientsTooLarge,
}
impl_err! {
    SplitError,
    SplitError::NotQuadratic, "Expression must be a quadratic polynomial in one variable (ax^2 + bx + c)",
    SplitError::NonIntegerCoefficients, "middle term splitting needs integer coefficients",
    SplitError::ZeroLeadingCoefficient, "the x^2 coefficient of a quadratic must not be zero",
    SplitError::CoefficientsTooLarge, "a*c is too large to search for factor pairs"
}

/// Errors found while checking a cleaned expression before evaluation.
/// These carry the offending text so the caller can be told what to fix.
#[derive(Debug, PartialEq)]
pub enum CleanerError {
    EmptyExpression,
    MissingOperator(String, String),
    OperatorSequence(String),
}
impl Error for CleanerError {}
impl Display for CleanerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CleanerError::EmptyExpression => write!(f, "Expression is empty"),
            CleanerError::MissingOperator(a, b) => write!(
                f,
                "Missing operator between numbers '{a}' and '{b}'. Did you mean '{a} * {b}' or '{a} + {b}'?"
            ),
            CleanerError::OperatorSequence(seq) => write!(f, "Invalid sequence of operators '{seq}'"),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum DispatchError {
    EmptyProblem,
    UnclosedCall,
}
impl_err! {
    DispatchError,
    DispatchError::EmptyProblem, "No problem provided",
    DispatchError::UnclosedCall, "named operations must be written as name(arguments) with a closing parenthesis"
}

#[derive(Debug, PartialEq)]
pub enum CalculatorError {
    PowerArgs,
    GcdArgs,
    CircleArgs,
    NonPositiveRadius,
    TriangleArgs,
    NonPositiveSides,
    TriangleInequality,
    NonPositiveBaseHeight,
    BadNumber(String),
    IntegerTooLarge(String),
}
impl Error for CalculatorError {}
impl Display for CalculatorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CalculatorError::PowerArgs => write!(f, "Please provide exactly two numbers: base,exponent"),
            CalculatorError::GcdArgs => write!(f, "Please provide at least two numbers for GCD calculation (separated by commas)"),
            CalculatorError::CircleArgs => write!(f, "Invalid parameters for circle calculation. Use: radius or x,y coordinates"),
            CalculatorError::NonPositiveRadius => write!(f, "Radius must be positive"),
            CalculatorError::TriangleArgs => write!(f, "Invalid parameters for triangle calculation. Use: a,b,c (sides) or base,height"),
            CalculatorError::NonPositiveSides => write!(f, "Triangle sides must be positive"),
            CalculatorError::TriangleInequality => write!(f, "Invalid triangle: sides violate triangle inequality theorem"),
            CalculatorError::NonPositiveBaseHeight => write!(f, "Base and height must be positive"),
            CalculatorError::BadNumber(text) => write!(f, "'{text}' is not a number"),
            CalculatorError::IntegerTooLarge(text) => write!(f, "'{text}' is too large for GCD calculation"),
        }
    }
}
