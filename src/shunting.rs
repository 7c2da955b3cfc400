use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use crate::errors::{ShuntingYardError, ExpressionCompilationError};
use crate::variable::Variable;
pub use crate::context::*;

use lazy_static::lazy_static;
use regex::Regex;

/// Identifies and returns variables found in a geqscalc-legal string.
/// Function and constant names are legal variables too; filter them
/// against a context to find the unknowns.
pub fn get_legal_variables_iter(text: &str) -> impl Iterator<Item = &str>
{
    lazy_static!
    {
        static ref RE: Regex = Regex::new(r"(?i)[a-z][a-z0-9_]*").unwrap();
    }
    RE.find_iter(text).map(|i| i.as_str())
}

/// Returns the names in `text` that are `Token::Var`s of `ctx`, in order of first appearance.
pub fn get_context_vars<'a>(text: &'a str, ctx: &ContextHashMap) -> Vec<&'a str>
{
    let mut vars: Vec<&str> = Vec::new();
    for name in get_legal_variables_iter(text)
    {
        if matches!(ctx.get(name), Some(Token::Var(_))) && !vars.contains(&name)
        {
            vars.push(name);
        }
    }
    vars
}

const _OPERATORS_: &str = "()^*/+-";

fn precedence(op: &str) -> i32
{
    match op
    {
        "^" => 4,
        "/" => 3,
        "*" => 3,
        "-" => 2,
        "+" => 2,
         _  => 1,
    }
}

fn prec_check(o1: &str, o2: &str) -> bool
{
    let check1 = o2 != "(";
    let check2 = precedence(o2) > precedence(o1);
    let check3 = precedence(o2) == precedence(o1) && o1 != "^";
    check1 && (check2 || check3)
}

fn punctuate(expr: &str) -> String
{
    let mut output = String::new();
    for c in expr.chars()
    {
        if _OPERATORS_.contains(c) || c == ','
        {
            output += &format!(" {c} ");
        }
        else
        {
            output.push(c);
        }
    }
    output.trim().to_string()
}

/// Only accepts things that look like numerals, so words such as
/// `inf` or `nan` are never read as numbers.
fn parse_number(word: &str) -> Option<f64>
{
    let first = word.chars().next()?;
    if first.is_ascii_digit() || first == '.'
    {
        word.parse::<f64>().ok()
    }
    else
    {
        None
    }
}

fn tokenize(tok: &str) -> anyhow::Result<Token>
{
    let token = match tok
    {
        "^" => Token::Exp,
        "/" => Token::Div,
        "*" => Token::Mul,
        "-" => Token::Minus,
        "+" => Token::Plus,
        "," => Token::Comma,
        "(" => Token::LeftParenthesis,
        maybe_num => match parse_number(maybe_num)
        {
            Some(num) => Token::Num(num),
            None => return Err(ShuntingYardError::UnknownToken.into()),
        }
    };
    Ok(token)
}

/// Tokenizes a string, but checks `context` and
/// creates tokens for values stored there.
fn tokenize_with_context(tok: &str, context: &ContextHashMap) -> anyhow::Result<Token>
{
    if let Some(cnst_var_or_fn) = context.get(tok)
    {
        let token = match cnst_var_or_fn
        {
            Token::Func(args, func) => Token::Func(*args, *func),
            Token::Var(val) => Token::Var(Rc::clone(val)),
            Token::Num(num) => Token::Num(*num),
            _ => return Err(ShuntingYardError::ContextMutation.into()),
        };
        Ok(token)
    }
    else
    {
        tokenize(tok)
    }
}

fn is_func(word: &str, context: &ContextHashMap) -> bool
{
    matches!(context.get(word), Some(Token::Func(_, _)))
}

/// See shunting yard implementation details at:
/// https://en.wikipedia.org/wiki/Shunting_yard_algorithm
pub(crate) fn rpnify(expr: &str, context: &ContextHashMap) -> anyhow::Result<Vec<Token>>
{
    let punctuated = punctuate(expr);
    let words = punctuated.split(' ').filter(|c| !c.is_empty());

    let mut stack: Vec<&str> = Vec::new();
    let mut queue: Vec<Token> = Vec::new();
    let mut unary_minus = true; // Indicator for whether the next '-' token is a unary operator

    for word in words
    {
        match word
        {
            "," => {
                // flush the current argument, leaving the call's parenthesis in place
                loop
                {
                    match stack.last()
                    {
                        Some(&"(") => break,
                        Some(_) => {
                            if let Some(op) = stack.pop()
                            {
                                queue.push(tokenize_with_context(op, context)?);
                            }
                        },
                        None => return Err(ShuntingYardError::UnclosedParenthesis.into()),
                    }
                }
                unary_minus = true;
            },

            "(" => {
                stack.push(word);
                unary_minus = true;
            },

            ")" => {
                loop
                {
                    match stack.pop()
                    {
                        Some("(") => break,
                        Some(op) => queue.push(tokenize_with_context(op, context)?),
                        None => return Err(ShuntingYardError::UnclosedParenthesis.into()),
                    }
                }

                // a parenthesis directly after a function name closes that call
                if let Some(&top) = stack.last()
                {
                    if is_func(top, context)
                    {
                        stack.pop();
                        queue.push(tokenize_with_context(top, context)?);
                    }
                }
                unary_minus = false;
            },

            "^" | "/" | "*" | "+" | "-" => {
                let o1 = word;

                // if we find a minus and we're expecting a unary operator...
                if unary_minus && o1 == "-"
                {
                    queue.push(Token::Num(-1.0));
                    stack.push("*");
                }
                else
                {
                    while let Some(o2) = stack.pop()
                    {
                        if prec_check(o1, o2)
                        {
                            queue.push(tokenize_with_context(o2, context)?);
                        }
                        else
                        {
                            stack.push(o2); // put the prec-check-denied element back on the stack
                            break;
                        }
                    }
                    stack.push(word);
                }
                unary_minus = true;
            },

            other => {

                if let Some(num) = parse_number(other)
                {
                    queue.push(Token::Num(num));
                    unary_minus = false;
                }

                else if let Some(token) = context.get(other)
                {
                    match token
                    {
                        Token::Num(val) => {
                            queue.push(Token::Num(*val));
                            unary_minus = false;
                        },
                        Token::Var(val) => {
                            queue.push(Token::Var(Rc::clone(val)));
                            unary_minus = false;
                        }
                        Token::Func(_, _) => {
                            stack.push(word);
                            unary_minus = true;
                        },
                        _ => return Err(ShuntingYardError::ContextMutation.into())
                    }
                }

                else {
                    return Err(ShuntingYardError::UnknownToken.into())
                }
            },
        }
    }

    while let Some(tok) = stack.pop()
    {
        if tok == "("
        {
            return Err(ShuntingYardError::UnclosedParenthesis.into())
        }
        queue.push(tokenize_with_context(tok, context)?);
    }

    Ok(queue)
}

/// 'Compiles' a `&str` expression to a function that takes a hashmap as an argument.
///
/// Under the hood, this rearranges the string expression to a token stack **once**
/// prior to being moved to the returned closure value. Every occurrence of an
/// unknown shares the `Variable` cell stored in `context`, so the closure only
/// has to write each input value once before evaluating. Entries of the input
/// map that do not appear in the expression are ignored.
///
/// # Example
/// ```
/// use std::collections::HashMap;
/// use geqscalc::shunting::{
///   compile_to_fn_of_hashmap,
///   new_context,
///   ContextLike,
/// };
///
/// let my_expr = "x + x + y";
///
/// // add variable values to context
/// let mut my_hm = new_context();
/// my_hm.add_var_to_ctx("x", 4);
/// my_hm.add_var_to_ctx("y", 1);
///
/// // get a closure from the expression
/// let my_fn = compile_to_fn_of_hashmap(my_expr, &my_hm).unwrap();
///
/// // make an input hashmap
/// let my_input = HashMap::from([("x".to_string(), 8.0), ("y".to_string(), 2.0)]);
///
/// assert_eq!(my_fn(&my_input).unwrap(), 18.0);
/// ```
pub fn compile_to_fn_of_hashmap(expr: &str, context: &ContextHashMap) -> anyhow::Result<impl Fn(&HashMap<String, f64>) -> anyhow::Result<f64>>
{
    let mut arg_hm: HashMap<String, Rc<RefCell<Variable>>> = HashMap::new();
    for name in get_context_vars(expr, context)
    {
        if let Some(Token::Var(cell)) = context.get(name)
        {
            arg_hm.insert(name.to_owned(), Rc::clone(cell));
        }
    }

    let rpn = rpnify(expr, context)?;

    Ok(move |x: &HashMap<String, f64>| {
        for (var, value) in x
        {
            if let Some(cell) = arg_hm.get(var)
            {
                cell.borrow_mut().set(*value);
            }
        }
        eval_rpn_expression(&rpn)
    })
}

/// 'Compiles' an expression with exactly one unknown from `context` into a
/// function of that unknown.
///
/// # Example
/// ```
/// use geqscalc::shunting::{compile_to_fn, new_context, ContextLike};
///
/// let mut ctx = new_context();
/// ctx.add_var_to_ctx("x", 1);
///
/// let f = compile_to_fn("x^2 - 2*x", &ctx).unwrap();
/// assert_eq!(f(3.0).unwrap(), 3.0);
/// ```
pub fn compile_to_fn(expr: &str, context: &ContextHashMap) -> anyhow::Result<impl Fn(f64) -> anyhow::Result<f64>>
{
    let vars = get_context_vars(expr, context);
    let var = match (vars.len(), vars.first().and_then(|name| context.get(*name)))
    {
        (1, Some(Token::Var(cell))) => Rc::clone(cell),
        (0, _) => return Err(ExpressionCompilationError::NoVarsFound.into()),
        _ => return Err(ExpressionCompilationError::MultipleVarsFound.into()),
    };

    let rpn = rpnify(expr, context)?;

    Ok(move |x: f64| {
        var.borrow_mut().set(x);
        eval_rpn_expression(&rpn)
    })
}

fn binary_op(stack: &mut Vec<f64>, op: impl Fn(f64, f64) -> anyhow::Result<f64>) -> anyhow::Result<()>
{
    if let (Some(arg2), Some(arg1)) = (stack.pop(), stack.pop())
    {
        stack.push(op(arg1, arg2)?);
        Ok(())
    }
    else
    {
        Err(ShuntingYardError::ExpectedArg.into())
    }
}

fn eval_rpn_expression(expr: &[Token]) -> anyhow::Result<f64>
{
    let mut stack: Vec<f64> = Vec::new();

    for token in expr
    {
        match token
        {
            Token::Num(num) => stack.push(*num),

            Token::Var(val) => stack.push(val.borrow().value()),

            Token::Func(args, func) => {
                if stack.len() < *args
                {
                    return Err(ShuntingYardError::ExpectedArg.into())
                }
                let arguments = stack.split_off(stack.len() - args);
                stack.push(func(&arguments));
            },

            Token::Exp => binary_op(&mut stack, |a, b| Ok(a.powf(b)))?,

            Token::Div => binary_op(&mut stack, |a, b| {
                if b == 0.0
                {
                    return Err(ShuntingYardError::DivisionByZero.into())
                }
                Ok(a / b)
            })?,

            Token::Mul => binary_op(&mut stack, |a, b| Ok(a * b))?,

            Token::Minus => binary_op(&mut stack, |a, b| Ok(a - b))?,

            Token::Plus => binary_op(&mut stack, |a, b| Ok(a + b))?,

            _ => {
                return Err(ShuntingYardError::LeftoverToken.into())
            },
        }
    }

    match stack.len() {
        1 => Ok(stack[0]),
        0 => Err(ShuntingYardError::NoTokens.into()),
        _ => Err(ShuntingYardError::LeftoverToken.into()),
    }
}

/// Evaluates a string as a mathematical expression with built in functions including logarithms,
/// trig functions, square roots and even a conditional function.
///
/// # Example
/// ```
/// use geqscalc::shunting::eval_str;
///
/// let my_expr = "sin(-1 + 2 + 2 + 0.14)";
/// let about_zero = eval_str(my_expr).unwrap().abs();
///
/// assert!(about_zero < 0.01);
/// ```
pub fn eval_str(expr: &str) -> anyhow::Result<f64>
{
    eval_rpn_expression(&rpnify(expr, &new_context())?)
}

/// Evaluates a string as a mathematical expression using functions,
/// constants, and variables from a given `ContextHashMap`.
///
/// # Example
/// ```
/// use geqscalc::shunting::{
///   eval_str_with_context,
///   new_context,
///   ContextLike,
/// };
///
/// let mut my_ctx = new_context();
/// my_ctx.add_const_to_ctx("r", 2.0);
///
/// let area = eval_str_with_context("pi * r^2", &my_ctx).unwrap();
///
/// assert!((area - 12.566).abs() < 0.001);
/// ```
pub fn eval_str_with_context(expr: &str, context: &ContextHashMap) -> anyhow::Result<f64>
{
    eval_rpn_expression(&rpnify(expr, context)?)
}

#[test]
fn test_punctuate()
{
    let my_expr = "3+4";
    let punctuated = punctuate(my_expr);
    assert_eq!(punctuated, "3 + 4");

    let tokens = Vec::from_iter(punctuated.split(' '));
    assert_eq!(
        tokens,
        vec!["3", "+", "4"]
    )
}

#[test]
fn test_rpnify()
{
    let ctx: ContextHashMap = HashMap::new();
    let rpn = rpnify("3+4", &ctx).unwrap();
    assert_eq!(rpn, vec![Token::Num(3.0), Token::Num(4.0), Token::Plus])
}

#[test]
fn test_unary_minus()
{
    let ctx: ContextHashMap = new_context();
    let rpn = rpnify("sin(-1 + 2 + 2 + 0.14)", &ctx).unwrap();

    assert_eq!(rpn[0], Token::Num(-1.0));
}

#[test]
fn test_function_closes_before_following_operator()
{
    let ans = eval_str("sqrt(16) + 1").unwrap();
    assert_eq!(ans, 5.0);
}

#[test]
fn test_multi_argument_functions_keep_argument_order()
{
    assert!((eval_str("log(8, 2)").unwrap() - 3.0).abs() < 1e-12);
    assert_eq!(eval_str("pow(2, 10)").unwrap(), 1024.0);
    assert_eq!(eval_str("if(1, 4, 2, 10, 20)").unwrap(), 10.0);
}

#[test]
fn test_exponent_is_right_associative()
{
    assert_eq!(eval_str("2^3^2").unwrap(), 512.0);
    assert_eq!(eval_str("-2^2").unwrap(), -4.0);
}

#[test]
fn test_errors()
{
    let err = eval_str("4 / (2 - 2)").unwrap_err();
    assert_eq!(err.downcast_ref::<ShuntingYardError>(), Some(&ShuntingYardError::DivisionByZero));

    let err = eval_str("(1 + 2").unwrap_err();
    assert_eq!(err.downcast_ref::<ShuntingYardError>(), Some(&ShuntingYardError::UnclosedParenthesis));

    let err = eval_str("1 + 2)").unwrap_err();
    assert_eq!(err.downcast_ref::<ShuntingYardError>(), Some(&ShuntingYardError::UnclosedParenthesis));

    let err = eval_str("nan + 1").unwrap_err();
    assert_eq!(err.downcast_ref::<ShuntingYardError>(), Some(&ShuntingYardError::UnknownToken));
}

#[test]
fn test_compile_to_fn_rejects_two_unknowns()
{
    let mut ctx = new_context();
    ctx.add_var_to_ctx("x", 1);
    ctx.add_var_to_ctx("y", 1);

    let err = compile_to_fn("x + y", &ctx).err().unwrap();
    assert_eq!(
        err.downcast_ref::<ExpressionCompilationError>(),
        Some(&ExpressionCompilationError::MultipleVarsFound)
    );
}
