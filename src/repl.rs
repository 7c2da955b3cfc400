use std::io::{BufRead, Write};

use log::debug;

use crate::calculator::Calculator;

const BANNER: &str = "\
Welcome to geqscalc!
Enter your equation or calculation (or type 'exit' to quit)
Examples:
- Equations: x^2 - 4 = 0, 2x + 3 = 7
- Systems: x + y = 5 and x - y = 1
- Basic calculations: 2 + 3 * 4
- Power: power(2,3) or 2**3 or 2^3 or 2 power 3
- GCD: gcd(48, 18)
- Circle: circle(5) or circle(2,3)
- Triangle: triangle(3,4,5) or triangle(6,8) (base,height)
- Roots: roots(x^2 - 4)
- Middle term split: split(x^2 + 5x + 6)
Use 'pi' for the circle constant and 'sqrt' for square roots.
";

const PROMPT: &str = "Enter your equation or calculation: ";

/// Reads problems line by line from `input` and writes each answer, or the
/// reason there is none, to `output`. Stops at `exit` or end of input.
///
/// # Example
/// ```
/// use geqscalc::calculator::Calculator;
/// use geqscalc::repl::run;
///
/// let mut output = Vec::new();
/// run(&Calculator::default(), "1 + 1\nexit\n".as_bytes(), &mut output).unwrap();
///
/// let output = String::from_utf8(output).unwrap();
/// assert!(output.contains("Result: 2"));
/// assert!(output.ends_with("Goodbye!\n"));
/// ```
pub fn run<R: BufRead, W: Write>(calculator: &Calculator, input: R, mut output: W) -> anyhow::Result<()>
{
    write!(output, "{BANNER}\n{PROMPT}")?;
    output.flush()?;

    for line in input.lines()
    {
        let line = line?;
        let problem = line.trim();

        if problem.eq_ignore_ascii_case("exit")
        {
            break;
        }

        if problem.is_empty()
        {
            writeln!(output, "Please enter a valid equation or calculation.")?;
        }
        else
        {
            writeln!(output, "\nInput: {problem}")?;
            match calculator.solve_problem(problem)
            {
                Ok(answer) => writeln!(output, "Result: {answer}")?,
                Err(e) => {
                    debug!("repl problem '{problem}' failed: {e:?}");
                    writeln!(output, "Error: {e}")?
                },
            }
        }

        write!(output, "\n{PROMPT}")?;
        output.flush()?;
    }

    writeln!(output, "Goodbye!")?;
    Ok(())
}

#[cfg(test)]
fn run_lines(input: &str) -> String
{
    let mut output = Vec::new();
    run(&Calculator::default(), input.as_bytes(), &mut output).unwrap();
    String::from_utf8(output).unwrap()
}

#[test]
fn test_repl_blank_line_hint()
{
    let output = run_lines("   \nexit\n");
    assert!(output.contains("Please enter a valid equation or calculation."));
    assert!(!output.contains("Input:"));
}

#[test]
fn test_repl_reports_errors_and_keeps_going()
{
    let output = run_lines("triangle(1, 2, 3)\ngcd(12, 18)\n");
    assert!(output.contains("Error: Invalid triangle: sides violate triangle inequality theorem"));
    assert!(output.contains("Result: 6"));
    assert!(output.ends_with("Goodbye!\n"));
}

#[test]
fn test_repl_exit_is_case_insensitive()
{
    let output = run_lines("EXIT\n1 + 1\n");
    assert!(!output.contains("Result: 2"));
}
