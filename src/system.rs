use std::collections::HashMap;

use log::debug;

use crate::newton::multivariate_newton_raphson;
use crate::shunting::{get_legal_variables_iter, ContextHashMap, Token};
use crate::compile_equation_to_fn_of_hashmap;

type CompiledEquation = Box<dyn Fn(&HashMap<String, f64>) -> anyhow::Result<f64>>;

/// An enum for indicating why an equation could or could not be added
/// to a system of equations in a `SystemBuilder`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConstrainResult
{
    /// Indicates that the equation added at most 1 unknown variable to
    /// the system of equations.
    WillConstrain,

    /// Indicates that the equation added more than 1 unknown variable
    /// to the system of equations.
    WillNotConstrain,

    /// Indicates that the equation given will over-constrain the system,
    /// giving it more equations than degrees of freedom.
    WillOverConstrain,
}

/// An object for building up a system of equations and ensuring that it is
/// fully constrained prior to attempting to solve it.
pub struct SystemBuilder<'a>
{
    context: &'a mut ContextHashMap,
    system_vars: Vec<String>,
    system_equations: Vec<CompiledEquation>,
}
impl <'a> SystemBuilder<'a>
{
    /// Constructs a new `SystemBuilder` instance.
    ///
    /// # Example
    /// ```
    /// use geqscalc::system::SystemBuilder;
    /// use geqscalc::shunting::new_context;
    ///
    /// let mut ctx = new_context();
    ///
    /// let my_sys = SystemBuilder::new("x + y = 4", &mut ctx)
    ///     .expect("failed to build system!");
    /// ```
    pub fn new(equation: &str, ctx: &'a mut ContextHashMap) -> anyhow::Result<SystemBuilder<'a>>
    {
        let system_vars = get_equation_unknowns(equation, ctx)
            .into_iter()
            .map(|x| x.to_owned())
            .collect();

        let starting_eqn: CompiledEquation = Box::new(compile_equation_to_fn_of_hashmap(equation, ctx)?);

        Ok(SystemBuilder
        {
            context: ctx,
            system_vars,
            system_equations: vec![starting_eqn],
        })
    }

    /// Gives a reference to the unknown variables in the system.
    ///
    /// # Example
    /// ```
    /// use geqscalc::system::SystemBuilder;
    /// use geqscalc::shunting::new_context;
    ///
    /// let mut ctx = new_context();
    ///
    /// let my_sys = SystemBuilder::new("x + y = 4", &mut ctx)
    ///     .expect("failed to build system!");
    ///
    /// assert_eq!(my_sys.get_vars(), &["x".to_owned(), "y".to_owned()]);
    /// ```
    pub fn get_vars(&self) -> &Vec<String>
    {
        &self.system_vars
    }

    /// Attempts to constrain the system of equations by adding an equation.
    /// If the equation adds at most 1 unknown variable, it will be added to
    /// the system and an `Ok(ConstrainResult::WillConstrain)` will be returned.
    /// If the given equation will over-constrain the system, then an
    /// `Ok(ConstrainResult::WillOverConstrain)` is returned and the equation
    /// is left out.
    ///
    /// # Example
    /// ```
    /// use geqscalc::system::{ConstrainResult, SystemBuilder};
    /// use geqscalc::shunting::new_context;
    ///
    /// let mut ctx = new_context();
    ///
    /// let mut my_sys = SystemBuilder::new("x + y = 9", &mut ctx)
    ///     .expect("failed to build system!");
    ///
    /// // Too many unknowns to be useful to system.
    /// let res = my_sys.try_constrain_with("i - j = 4").unwrap();
    /// assert_eq!(res, ConstrainResult::WillNotConstrain);
    ///
    /// // Adds 0 unknowns and 1 equation. Will not over-constrain
    /// // the system, and this will not add too many unknowns.
    /// let res = my_sys.try_constrain_with("x - y = 4").unwrap();
    /// assert_eq!(res, ConstrainResult::WillConstrain);
    ///
    /// // System is already properly constrained. This will not
    /// // be useful to add.
    /// let res = my_sys.try_constrain_with("x - y = 4").unwrap();
    /// assert_eq!(res, ConstrainResult::WillOverConstrain);
    /// ```
    pub fn try_constrain_with(&mut self, equation: &str) -> anyhow::Result<ConstrainResult>
    {
        let sys_equations = self.system_equations.len();
        let sys_unknowns = self.system_vars.len();

        let new_unknowns: Vec<String> = get_equation_unknowns(equation, self.context)
            .into_iter()
            .filter(|&x| !self.system_vars.iter().any(|v| v == x))
            .map(|x| x.to_owned())
            .collect();

        if new_unknowns.len() > 1
        {
            // Return early if adding the equation will not gainfully constrain the system
            return Ok(ConstrainResult::WillNotConstrain);
        }
        else if sys_equations + 1 > sys_unknowns + new_unknowns.len()
        {
            // Return early if the system will be over-constrained
            return Ok(ConstrainResult::WillOverConstrain);
        }

        // Add the equation to the system
        self.system_equations.push(
            Box::new(compile_equation_to_fn_of_hashmap(equation, self.context)?)
        );

        // Add possible newly-found variable to the system
        self.system_vars.extend(new_unknowns);

        // Indicate that addition was successful
        Ok(ConstrainResult::WillConstrain)
    }

    /// Returns a boolean value indicating whether a system is
    /// fully constrained. I.e. the number of equations is equal to
    /// the number of degrees of freedom.
    ///
    /// # Example
    /// ```
    /// use geqscalc::system::SystemBuilder;
    /// use geqscalc::shunting::new_context;
    ///
    /// let mut ctx = new_context();
    ///
    /// let mut my_sys = SystemBuilder::new("x + y = 9", &mut ctx).unwrap();
    ///
    /// assert!(!my_sys.is_fully_constrained());
    ///
    /// my_sys.try_constrain_with("x - y = 4")
    ///     .expect("failed to constrain more!");
    ///
    /// // Now that we have 2 equations and 2 unknowns, the system is
    /// // constrained and can be solved.
    /// assert!(my_sys.is_fully_constrained());
    /// ```
    pub fn is_fully_constrained(&self) -> bool
    {
        self.system_equations.len() == self.system_vars.len()
    }

    /// Attempts to fully constrain a system using the given equations. Each
    /// equation is used at most once; passes repeat while some equation is
    /// still being learned from.
    ///
    /// # Example
    /// ```
    /// use geqscalc::system::SystemBuilder;
    /// use geqscalc::shunting::new_context;
    ///
    /// let mut ctx = new_context();
    ///
    /// let mut my_sys = SystemBuilder::new("x + y + z = 9", &mut ctx).unwrap();
    ///
    /// let constrained = my_sys.try_fully_constrain_with(&[
    ///     "(4 * x) + (5 * y) + (6 * z) = 7",
    ///     "(8 * x) + (9 * y) - (10 * z) = 11"])
    ///     .expect("failed to constrain system!");
    ///
    /// assert!(constrained);
    /// ```
    pub fn try_fully_constrain_with(&mut self, equations: &[&str]) -> anyhow::Result<bool>
    {
        let mut used = vec![false; equations.len()];
        let mut still_learning = true;
        while still_learning && !self.is_fully_constrained()
        {
            still_learning = false;
            for (i, equation) in equations.iter().enumerate()
            {
                if used[i]
                {
                    continue;
                }
                match self.try_constrain_with(equation)?
                {
                    ConstrainResult::WillNotConstrain => {},
                    ConstrainResult::WillConstrain => {
                        used[i] = true;
                        still_learning = true;
                    },
                    ConstrainResult::WillOverConstrain => {
                        debug!("left out over-constraining equation '{equation}'");
                        used[i] = true;
                    },
                }
            }
        }
        Ok(self.is_fully_constrained())
    }

    /// Consumes `self` in order to produce a `System` object, representing
    /// a constrained system of equations.
    pub fn get_system(self) -> Option<System<'a>>
    {
        if self.is_fully_constrained()
        {
            return Some(System {
                context: self.context,
                system_vars: self.system_vars,
                system_equations: self.system_equations,
            });
        }

        None
    }
}

/// A Constrained system of equations that can either have more information specified about its
/// variables or just be solved after construction.
///
/// This object can only be built using a `SystemBuilder` object.
pub struct System<'a>
{
    context: &'a mut ContextHashMap,
    system_vars: Vec<String>,
    system_equations: Vec<CompiledEquation>,
}
impl <'a> System<'a>
{
    /// Traps the value of the given variable between `min` and `max`.
    /// Returns `false` if `var` is not an unknown of the system or the
    /// domain is empty.
    ///
    /// # Example
    /// ```
    /// use geqscalc::system::SystemBuilder;
    /// use geqscalc::shunting::new_context;
    ///
    /// let mut ctx = new_context();
    ///
    /// let mut builder = SystemBuilder::new("x^2 = 9", &mut ctx)
    ///     .expect("Failed to create a system...");
    ///
    /// let mut sys = builder
    ///     .get_system()
    ///     .unwrap();
    ///
    /// assert!(sys.specify_domain("x", -10.0, 0.0));
    /// assert!(!sys.specify_domain("q", 0.0, 7.0));
    /// assert!(!sys.specify_domain("x", 1.0, -1.0));
    ///
    /// sys.specify_guess_value("x", -5.0);
    ///
    /// let soln = sys.solve(0.0001, 50).unwrap();
    /// assert!((soln["x"] + 3.0).abs() < 0.001);
    /// ```
    pub fn specify_domain(&mut self, var: &str, min: f64, max: f64) -> bool
    {
        if !self.system_vars.iter().any(|v| v == var) || min > max
        {
            return false;
        }

        match self.context.get(var)
        {
            Some(Token::Var(value)) => value.borrow_mut().restrict(min, max),
            _ => return false,
        };

        true
    }

    /// Sets a guess value for the given variable.
    ///
    /// # Example
    /// ```
    /// use geqscalc::system::SystemBuilder;
    /// use geqscalc::shunting::new_context;
    ///
    /// let mut ctx = new_context();
    ///
    /// let mut builder = SystemBuilder::new("x^2 = 9", &mut ctx)
    ///     .expect("Failed to create a system...");
    ///
    /// let mut sys = builder
    ///     .get_system()
    ///     .expect("Failed to constrain system...");
    ///
    /// sys.specify_guess_value("x", -5.0);
    ///
    /// let soln = sys.solve(0.0001, 50).unwrap();
    /// assert!((soln["x"] + 3.0).abs() < 0.001);
    /// ```
    pub fn specify_guess_value(&mut self, var: &str, guess: f64) -> bool
    {
        if !self.system_vars.iter().any(|v| v == var)
        {
            return false;
        }

        match self.context.get(var)
        {
            Some(Token::Var(value)) => value.borrow_mut().set(guess),
            _ => return false,
        };

        true
    }

    /// Tries to solve the system of equations to within the radius `margin`
    /// of the actual solution in `limit` iterations.
    ///
    /// # Example
    /// ```
    /// use geqscalc::system::SystemBuilder;
    /// use geqscalc::shunting::new_context;
    ///
    /// let mut ctx = new_context();
    ///
    /// let mut builder = SystemBuilder::new("x + y = 9", &mut ctx)
    ///     .expect("Failed to create a system...");
    /// builder.try_constrain_with("x - y = 4").unwrap();
    ///
    /// let sys = builder
    ///     .get_system()
    ///     .expect("Failed to constrain system...");
    ///
    /// let soln = sys.solve(0.0001, 10)
    ///     .expect("Failed to find a solution...");
    ///
    /// // Solution is x = 6.5, y = 2.5
    /// assert!((6.5 - soln["x"]).abs() < 0.001);
    /// assert!((2.5 - soln["y"]).abs() < 0.001);
    /// ```
    pub fn solve(self, margin: f64, limit: usize) -> anyhow::Result<HashMap<String, f64>>
    {
        let mut guess = HashMap::new();
        for var in &self.system_vars
        {
            if let Some(Token::Var(x)) = self.context.get(var)
            {
                guess.insert(var.clone(), x.borrow().value());
            }
        }

        let res = multivariate_newton_raphson(
            &self.system_equations,
            &mut guess,
            margin,
            limit
        )?;

        Ok(res.clone())
    }
}

/// Returns the unknown variables in a given equation or expression, in order
/// of first appearance: names `ctx` does not define, plus the `Token::Var`s it
/// already holds.
///
/// # Example
/// ```
/// use geqscalc::system::get_equation_unknowns;
/// use geqscalc::shunting::{new_context, ContextLike};
///
/// let mut ctx = new_context();
/// ctx.add_var_to_ctx("j", 2.0);
///
/// // `pi` and `sin` are known to the context, `x` and `j` are not fixed
/// assert_eq!(get_equation_unknowns("x + j + sin(pi) = x", &ctx), vec!["x", "j"]);
/// ```
pub fn get_equation_unknowns<'a>(equation: &'a str, ctx: &ContextHashMap) -> Vec<&'a str>
{
    let mut unknowns: Vec<&str> = Vec::new();
    for name in get_legal_variables_iter(equation)
    {
        let unknown = matches!(ctx.get(name), None | Some(Token::Var(_)));
        if unknown && !unknowns.contains(&name)
        {
            unknowns.push(name);
        }
    }
    unknowns
}
