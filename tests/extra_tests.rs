use std::collections::HashMap;
use geqscalc::calculator::{Answer, Calculator};
use geqscalc::errors::{CleanerError, DispatchError, SplitError};
use geqscalc::shunting::ContextHashMap;
use geqscalc::shunting::{eval_str, eval_str_with_context, ContextLike};
use geqscalc::split::SplitOutcome;

#[test]
fn test_eval_str()
{
    let my_expr = "sin(-1 + 2 + 2 + 0.14)";
    let about_zero = eval_str(my_expr).unwrap().abs();

    assert!(about_zero < 0.01)
}

#[test]
fn test_eval()
{
    let mut ctx: ContextHashMap = HashMap::new();
    ctx.add_const_to_ctx("x", 0.0);
    let ans = eval_str_with_context("3 + 4 + x", &ctx).unwrap();
    assert_eq!(ans, 7.0);
}

#[test]
fn ensure_that_single_unknown_solver_can_solve_equation_with_if_statement()
{
    // 6.5 < 2.5 is false, so this is i + 1 = 0
    let answer = Calculator::default()
        .solve_problem("if(6.5, 4, 2.5, i - 1, i + 1) = 0")
        .unwrap();

    assert_eq!(answer.to_string(), "i = -1");
}

fn split_answer(problem: &str) -> SplitOutcome
{
    match Calculator::default().solve_problem(problem).unwrap()
    {
        Answer::Split(outcome) => outcome,
        other => panic!("expected a split for '{problem}', got {other}"),
    }
}

#[test]
fn split_problems_factor_through_the_calculator()
{
    for (problem, factors) in [
        ("split(x^2 + 5x + 6)", "(x+2)(x+3)"),
        ("split(2x^2 + 7x + 3)", "(2x+1)(x+3)"),
        ("SPLIT(x squared minus 9)", "(x-3)(x+3)"),
    ]
    {
        match split_answer(problem)
        {
            SplitOutcome::Split(res) => assert_eq!(res.factors, factors),
            other => panic!("expected '{problem}' to split, got {other:?}"),
        }
    }
}

#[test]
fn split_without_integer_pair_is_an_answer_not_an_error()
{
    assert_eq!(
        split_answer("split(x^2 + 1)"),
        SplitOutcome::NoSuitableSplit { original: "x^2 + 1".to_owned() }
    );
}

#[test]
fn split_is_deterministic()
{
    assert_eq!(split_answer("split(6x^2 + x - 2)"), split_answer("split(6x^2 + x - 2)"));
}

#[test]
fn split_of_a_cubic_is_refused()
{
    let err = Calculator::default().solve_problem("split(x^3 + 2x + 1)").unwrap_err();
    assert_eq!(err.downcast_ref::<SplitError>(), Some(&SplitError::NotQuadratic));
    assert_eq!(err.to_string(), "Expression must be a quadratic polynomial in one variable (ax^2 + bx + c)");
}

#[test]
fn problems_route_to_their_operations()
{
    let calc = Calculator::default();

    assert_eq!(calc.solve_problem("power(2,3)").unwrap(), Answer::Number(8.0));
    assert_eq!(calc.solve_problem("2**3").unwrap(), Answer::Number(8.0));
    assert_eq!(calc.solve_problem("Gcd(48, 18)").unwrap(), Answer::Integer(6));
    assert_eq!(calc.solve_problem("roots(x^2 - 4)").unwrap().to_string(), "x = -2, x = 2");
    assert_eq!(calc.solve_problem("x^2 - 4 = 0").unwrap().to_string(), "x = -2, x = 2");
    assert_eq!(calc.solve_problem("x + y = 5 and x - y = 1").unwrap().to_string(), "x = 3, y = 2");
    assert_eq!(calc.solve_problem("triangle(6,8)").unwrap().to_string(), "base: 6, height: 8, area: 24");
    assert!(calc.solve_problem("circle(5)").unwrap().to_string().starts_with("radius: 5, diameter: 10"));
}

#[test]
fn roots_without_real_or_complex_solutions()
{
    let calc = Calculator::default();
    assert_eq!(
        calc.solve_problem("roots(7)").unwrap(),
        Answer::Message("No real roots found".to_owned())
    );
}

#[test]
fn problem_errors_keep_their_messages()
{
    let calc = Calculator::default();

    let err = calc.solve_problem("  ").unwrap_err();
    assert_eq!(err.downcast_ref::<DispatchError>(), Some(&DispatchError::EmptyProblem));

    let err = calc.solve_problem("12 7").unwrap_err();
    assert_eq!(
        err.downcast_ref::<CleanerError>(),
        Some(&CleanerError::MissingOperator("12".to_owned(), "7".to_owned()))
    );

    let err = calc.solve_problem("circle(-2)").unwrap_err();
    assert_eq!(err.to_string(), "Radius must be positive");
}
