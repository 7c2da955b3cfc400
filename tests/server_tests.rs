use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use geqscalc::calculator::Calculator;
use geqscalc::server::app;

async fn post_solve(body: Value) -> (StatusCode, Value)
{
    let request = Request::builder()
        .method("POST")
        .uri("/solve")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app(Calculator::default()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn solve_returns_the_result()
{
    let (status, body) = post_solve(json!({ "problem": "2 + 3 * 4" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": 14.0 }));
}

#[tokio::test]
async fn split_result_carries_its_fields()
{
    let (status, body) = post_solve(json!({ "problem": "split(2x^2 + 7x + 3)" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["status"], "split");
    assert_eq!(body["result"]["factors"], "(2x+1)(x+3)");
    assert_eq!(body["result"]["original"], "2x^2 + 7x + 3");
}

#[tokio::test]
async fn system_result_is_keyed_by_symbol()
{
    let (status, body) = post_solve(json!({ "problem": "x + y = 5 and x - y = 1" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": { "x": 3.0, "y": 2.0 } }));
}

#[tokio::test]
async fn missing_problem_is_a_bad_request()
{
    for body in [json!({}), json!({ "problem": "" }), json!({ "problem": "   " })]
    {
        let (status, body) = post_solve(body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "No problem provided" }));
    }
}

#[tokio::test]
async fn unsolvable_problem_reports_the_error()
{
    let (status, body) = post_solve(json!({ "problem": "split(x^3 + 2x + 1)" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body,
        json!({ "error": "Expression must be a quadratic polynomial in one variable (ax^2 + bx + c)" })
    );
}

#[tokio::test]
async fn nested_powers_are_refused_not_expanded()
{
    let (status, body) = post_solve(json!({ "problem": "roots((x^1024)^1024)" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({ "error": "expression expands to a polynomial of degree higher than 64" }));
}

#[tokio::test]
async fn huge_gcd_arguments_are_an_error_response()
{
    let (status, body) = post_solve(json!({ "problem": "gcd(-1e30, 5)" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({ "error": "'-1e30' is too large for GCD calculation" }));
}
