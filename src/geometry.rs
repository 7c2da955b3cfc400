use std::f64::consts::PI;
use std::fmt;

use serde::Serialize;

use crate::errors::CalculatorError;
use crate::polynomial::format_number;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Circle
{
    FromRadius
    {
        radius: f64,
        diameter: f64,
        circumference: f64,
        area: f64,
    },
    FromCenter
    {
        center: (f64, f64),
        equation: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Triangle
{
    FromSides
    {
        sides: (f64, f64, f64),
        perimeter: f64,
        #[serde(rename = "semi-perimeter")]
        semi_perimeter: f64,
        area: f64,
    },
    FromBaseHeight
    {
        base: f64,
        height: f64,
        area: f64,
    },
}

/// `circle(r)` gives the measurements of a circle of radius `r`;
/// `circle(x, y)` gives the general equation of a circle centred there.
///
/// # Example
/// ```
/// use geqscalc::geometry::{circle, Circle};
///
/// match circle(&[2.0]).unwrap()
/// {
///     Circle::FromRadius { diameter, area, .. } => {
///         assert_eq!(diameter, 4.0);
///         assert!((area - 4.0 * std::f64::consts::PI).abs() < 1e-12);
///     },
///     _ => unreachable!(),
/// }
/// ```
pub fn circle(params: &[f64]) -> Result<Circle, CalculatorError>
{
    match *params
    {
        [r] => {
            if r <= 0.0
            {
                return Err(CalculatorError::NonPositiveRadius);
            }
            Ok(Circle::FromRadius {
                radius: r,
                diameter: 2.0 * r,
                circumference: 2.0 * PI * r,
                area: PI * r * r,
            })
        },
        [x, y] => Ok(Circle::FromCenter {
            center: (x, y),
            equation: format!(
                "(x - {})^2 + (y - {})^2 = r^2 (radius not specified)",
                format_number(x),
                format_number(y)
            ),
        }),
        _ => Err(CalculatorError::CircleArgs),
    }
}

/// `triangle(a, b, c)` uses Heron's formula on three sides;
/// `triangle(base, height)` uses half base times height.
///
/// # Example
/// ```
/// use geqscalc::geometry::{triangle, Triangle};
///
/// match triangle(&[3.0, 4.0, 5.0]).unwrap()
/// {
///     Triangle::FromSides { perimeter, area, .. } => {
///         assert_eq!(perimeter, 12.0);
///         assert!((area - 6.0).abs() < 1e-12);
///     },
///     _ => unreachable!(),
/// }
/// ```
pub fn triangle(params: &[f64]) -> Result<Triangle, CalculatorError>
{
    match *params
    {
        [a, b, c] => {
            if [a, b, c].iter().any(|&side| side <= 0.0)
            {
                return Err(CalculatorError::NonPositiveSides);
            }
            if a + b <= c || b + c <= a || a + c <= b
            {
                return Err(CalculatorError::TriangleInequality);
            }
            let s = (a + b + c) / 2.0;
            Ok(Triangle::FromSides {
                sides: (a, b, c),
                perimeter: a + b + c,
                semi_perimeter: s,
                area: (s * (s - a) * (s - b) * (s - c)).sqrt(),
            })
        },
        [base, height] => {
            if base <= 0.0 || height <= 0.0
            {
                return Err(CalculatorError::NonPositiveBaseHeight);
            }
            Ok(Triangle::FromBaseHeight { base, height, area: 0.5 * base * height })
        },
        _ => Err(CalculatorError::TriangleArgs),
    }
}

impl fmt::Display for Circle
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        match self
        {
            Circle::FromRadius { radius, diameter, circumference, area } => write!(
                f,
                "radius: {}, diameter: {}, circumference: {}, area: {}",
                format_number(*radius),
                format_number(*diameter),
                circumference,
                area
            ),
            Circle::FromCenter { center, equation } => write!(
                f,
                "center: ({}, {}), equation: {}",
                format_number(center.0),
                format_number(center.1),
                equation
            ),
        }
    }
}

impl fmt::Display for Triangle
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        match self
        {
            Triangle::FromSides { sides, perimeter, semi_perimeter, area } => write!(
                f,
                "sides: ({}, {}, {}), perimeter: {}, semi-perimeter: {}, area: {}",
                format_number(sides.0),
                format_number(sides.1),
                format_number(sides.2),
                format_number(*perimeter),
                format_number(*semi_perimeter),
                format_number(*area)
            ),
            Triangle::FromBaseHeight { base, height, area } => write!(
                f,
                "base: {}, height: {}, area: {}",
                format_number(*base),
                format_number(*height),
                format_number(*area)
            ),
        }
    }
}

#[test]
fn test_circle_errors()
{
    assert_eq!(circle(&[0.0]), Err(CalculatorError::NonPositiveRadius));
    assert_eq!(circle(&[1.0, 2.0, 3.0]), Err(CalculatorError::CircleArgs));
}

#[test]
fn test_circle_from_center()
{
    let res = circle(&[2.0, -3.5]).unwrap();
    assert_eq!(res.to_string(), "center: (2, -3.5), equation: (x - 2)^2 + (y - -3.5)^2 = r^2 (radius not specified)");
}

#[test]
fn test_triangle_errors()
{
    assert_eq!(triangle(&[1.0, 2.0, 3.0]), Err(CalculatorError::TriangleInequality));
    assert_eq!(triangle(&[-1.0, 2.0, 2.0]), Err(CalculatorError::NonPositiveSides));
    assert_eq!(triangle(&[4.0, 0.0]), Err(CalculatorError::NonPositiveBaseHeight));
    assert_eq!(triangle(&[4.0]), Err(CalculatorError::TriangleArgs));
}

#[test]
fn test_triangle_base_height()
{
    assert_eq!(
        triangle(&[6.0, 8.0]).unwrap(),
        Triangle::FromBaseHeight { base: 6.0, height: 8.0, area: 24.0 }
    );
}
