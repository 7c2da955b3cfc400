use std::collections::HashMap;
use std::rc::Rc;
use std::cell::RefCell;
use std::f64::consts::{E, PI};

use crate::variable::Variable;

pub type ContextHashMap = HashMap<String, Token>;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    LeftParenthesis,
    Comma,
    Exp,
    Mul,
    Div,
    Plus,
    Minus,
    Num(f64),
    Var(Rc<RefCell<Variable>>),
    Func(usize, fn(&[f64]) -> f64),
}

fn sin(x: &[f64]) -> f64 {
    x[0].sin()
}
fn cos(x: &[f64]) -> f64 {
    x[0].cos()
}
fn tan(x: &[f64]) -> f64 {
    x[0].tan()
}
fn arcsin(x: &[f64]) -> f64 {
    x[0].asin()
}
fn arccos(x: &[f64]) -> f64 {
    x[0].acos()
}
fn arctan(x: &[f64]) -> f64 {
    x[0].atan()
}
fn sinh(x: &[f64]) -> f64 {
    x[0].sinh()
}
fn cosh(x: &[f64]) -> f64 {
    x[0].cosh()
}
fn tanh(x: &[f64]) -> f64 {
    x[0].tanh()
}
fn ln(x: &[f64]) -> f64 {
    x[0].ln()
}
fn log10(x: &[f64]) -> f64 {
    x[0].log10()
}
/// `log(x, base)`
fn log(x: &[f64]) -> f64 {
    x[0].log(x[1])
}
fn sqrt(x: &[f64]) -> f64 {
    x[0].sqrt()
}
fn abs(x: &[f64]) -> f64 {
    x[0].abs()
}
/// `pow(base, exponent)`
fn pow(x: &[f64]) -> f64 {
    x[0].powf(x[1])
}

/// `if(a, op, b, then, else)` where `op` is 1: `==`, 2: `<=`, 3: `>=`,
/// 4: `<`, 5: `>` and anything else `!=`.
fn conditional(args: &[f64]) -> f64 {
    let a              = args[0];
    let op             = args[1];
    let b              = args[2];
    let if_true_return = args[3];
    let else_return    = args[4];

    let decision = |predicate| {
        if predicate {
            if_true_return
        } else {
            else_return
        }
    };

    match op.round() as usize {
        1 => decision(a == b),
        2 => decision(a <= b),
        3 => decision(a >= b),
        4 => decision(a <  b),
        5 => decision(a >  b),
        _ => decision(a != b),
    }
}

/// Methods for registering functions, constants and unknowns in a context
/// consumed by the shunting yard algorithm.
pub trait ContextLike
{
    fn add_func_to_ctx(&mut self, name: &str, func: fn(&[f64]) -> f64, num_args: usize);
    fn add_const_to_ctx<T: Into<f64>>(&mut self, name: &str, val: T);
    fn add_var_to_ctx<T: Into<f64>>(&mut self, name: &str, val: T);
    fn add_var_with_domain_to_ctx<T: Into<f64> + Copy>(&mut self, name: &str, val: T, min: T, max: T);

    /// Returns the current value of the unknown `name`, if it is one.
    fn var_value(&self, name: &str) -> Option<f64>;
}

impl ContextLike for ContextHashMap
{
    fn add_func_to_ctx(&mut self, name: &str, func: fn(&[f64]) -> f64, num_args: usize)
    {
        self.insert(name.to_string(), Token::Func(num_args, func));
    }

    fn add_const_to_ctx<T: Into<f64>>(&mut self, name: &str, val: T)
    {
        self.insert(name.to_string(), Token::Num(val.into()));
    }

    fn add_var_to_ctx<T: Into<f64>>(&mut self, name: &str, val: T)
    {
        self.insert(name.to_string(), Token::Var(Rc::new(RefCell::new(Variable::unbounded(val)))));
    }

    fn add_var_with_domain_to_ctx<T: Into<f64> + Copy>(&mut self, name: &str, val: T, min: T, max: T)
    {
        self.insert(name.to_string(), Token::Var(Rc::new(RefCell::new(Variable::new(val, min, max)))));
    }

    fn var_value(&self, name: &str) -> Option<f64>
    {
        match self.get(name)
        {
            Some(Token::Var(var)) => Some(var.borrow().value()),
            _ => None,
        }
    }
}

/// Builds a context holding the built-in functions and the constants `pi` and `e`.
pub fn new_context() -> ContextHashMap {
    let mut ctx = HashMap::new();
    ctx.add_func_to_ctx("if",     conditional, 5);
    ctx.add_func_to_ctx("sin",    sin,         1);
    ctx.add_func_to_ctx("cos",    cos,         1);
    ctx.add_func_to_ctx("tan",    tan,         1);
    ctx.add_func_to_ctx("arcsin", arcsin,      1);
    ctx.add_func_to_ctx("arccos", arccos,      1);
    ctx.add_func_to_ctx("arctan", arctan,      1);
    ctx.add_func_to_ctx("sinh",   sinh,        1);
    ctx.add_func_to_ctx("cosh",   cosh,        1);
    ctx.add_func_to_ctx("tanh",   tanh,        1);
    ctx.add_func_to_ctx("ln",     ln,          1);
    ctx.add_func_to_ctx("log10",  log10,       1);
    ctx.add_func_to_ctx("log",    log,         2);
    ctx.add_func_to_ctx("sqrt",   sqrt,        1);
    ctx.add_func_to_ctx("abs",    abs,         1);
    ctx.add_func_to_ctx("pow",    pow,         2);
    ctx.add_const_to_ctx("pi", PI);
    ctx.add_const_to_ctx("e",  E);
    ctx
}

#[test]
fn test_var_value_only_reports_unknowns()
{
    let mut ctx = new_context();
    ctx.add_var_to_ctx("x", 2.5);

    assert_eq!(ctx.var_value("x"), Some(2.5));
    assert_eq!(ctx.var_value("pi"), None);
    assert_eq!(ctx.var_value("sin"), None);
}
