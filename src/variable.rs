use std::fmt;

/// An unknown's current value together with the domain it is allowed to take.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Variable
{
    value: f64,
    pub min: f64,
    pub max: f64,
}

impl Variable
{
    pub fn new<T>(value: T, min: T, max: T) -> Variable
    where T: Into<f64> + Copy
    {
        let mut var = Variable
        {
            value: 0.0,
            min: min.into(),
            max: max.into(),
        };
        var.set(value);
        var
    }

    /// A variable free to take any real value.
    pub fn unbounded<T>(value: T) -> Variable
    where T: Into<f64>
    {
        Variable
        {
            value: value.into(),
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    pub fn value(&self) -> f64
    {
        self.value
    }

    /// Sets the value of the variable, clamping its
    /// value to `self.min` or `self.max` if the given
    /// value exists outside the domain.
    ///
    /// # Example
    /// ```
    /// use geqscalc::variable::Variable;
    ///
    /// let mut var = Variable::new(1, 0, 10);
    ///
    /// var.set(11);
    /// assert_eq!(var.value(), 10.0);
    ///
    /// var.set(5.005);
    /// assert_eq!(var.value(), 5.005);
    /// ```
    pub fn set<T>(&mut self, new_value: T)
    where T: Into<f64>
    {
        self.value = new_value.into().clamp(self.min, self.max);
    }

    /// Narrows the domain and pulls the current value back inside it.
    pub fn restrict(&mut self, min: f64, max: f64)
    {
        self.min = min;
        self.max = max;
        self.set(self.value);
    }
}

impl From<Variable> for f64
{
    fn from(value: Variable) -> Self
    {
        value.value
    }
}

impl fmt::Display for Variable
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
    {
        write!(f, "{} in [{}, {}]", self.value, self.min, self.max)
    }
}

#[test]
fn test_unbounded_variable_keeps_any_value()
{
    let mut var = Variable::unbounded(3.0);
    var.set(-1e12);
    assert_eq!(f64::from(var), -1e12);
}

#[test]
fn test_restrict_clamps_current_value()
{
    let mut var = Variable::unbounded(12.0);
    var.restrict(0.0, 7.0);
    assert_eq!(var.value(), 7.0);
}
