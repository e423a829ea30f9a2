//! Sparse 0/1 constraint model.
//!
//! A small constraint-programming surface sized for roster problems:
//! boolean decision variables, exactly-one / at-most-one groups, linear
//! upper bounds, reified disjunction and conjunction, and a weighted
//! objective to maximize. The model is pure data; searching it is the
//! job of [`crate::solver::CpSolver`].

/// Handle to a boolean decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoolVar(pub(crate) usize);

impl BoolVar {
    /// Dense index of this variable.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A constraint over boolean variables.
#[derive(Debug, Clone)]
pub(crate) enum CpConstraint {
    /// Exactly one listed variable is true.
    ExactlyOne(Vec<usize>),
    /// At most one listed variable is true.
    AtMostOne(Vec<usize>),
    /// At most `bound` listed variables are true.
    LinearLe { vars: Vec<usize>, bound: u32 },
    /// `target` is true iff at least one input is true.
    Or { target: usize, inputs: Vec<usize> },
    /// `target` is true iff every input is true.
    And { target: usize, inputs: Vec<usize> },
}

/// A boolean optimization model.
#[derive(Debug, Clone, Default)]
pub struct CpModel {
    num_vars: usize,
    pub(crate) constraints: Vec<CpConstraint>,
    pub(crate) weights: Vec<i64>,
}

impl CpModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fresh boolean variable.
    pub fn new_bool_var(&mut self) -> BoolVar {
        let var = BoolVar(self.num_vars);
        self.num_vars += 1;
        self.weights.push(0);
        var
    }

    /// Number of variables.
    pub fn var_count(&self) -> usize {
        self.num_vars
    }

    /// Number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Requires exactly one of `vars` to be true.
    ///
    /// An empty group makes the model infeasible; the caller is expected
    /// to fail fast before building such a group.
    pub fn add_exactly_one(&mut self, vars: &[BoolVar]) {
        self.constraints
            .push(CpConstraint::ExactlyOne(vars.iter().map(|v| v.0).collect()));
    }

    /// Requires at most one of `vars` to be true.
    pub fn add_at_most_one(&mut self, vars: &[BoolVar]) {
        self.constraints
            .push(CpConstraint::AtMostOne(vars.iter().map(|v| v.0).collect()));
    }

    /// Requires at most `bound` of `vars` to be true.
    pub fn add_linear_le(&mut self, vars: &[BoolVar], bound: u32) {
        self.constraints.push(CpConstraint::LinearLe {
            vars: vars.iter().map(|v| v.0).collect(),
            bound,
        });
    }

    /// Constrains `target` to be true iff any input is true.
    pub fn add_or(&mut self, target: BoolVar, inputs: &[BoolVar]) {
        self.constraints.push(CpConstraint::Or {
            target: target.0,
            inputs: inputs.iter().map(|v| v.0).collect(),
        });
    }

    /// Constrains `target` to be true iff every input is true.
    pub fn add_and(&mut self, target: BoolVar, inputs: &[BoolVar]) {
        self.constraints.push(CpConstraint::And {
            target: target.0,
            inputs: inputs.iter().map(|v| v.0).collect(),
        });
    }

    /// Adds `weight` to the objective coefficient of `var`.
    ///
    /// The solver maximizes the sum of coefficients of true variables.
    pub fn add_objective_term(&mut self, var: BoolVar, weight: i64) {
        self.weights[var.0] += weight;
    }

    /// Objective coefficient of a variable.
    pub fn weight(&self, var: BoolVar) -> i64 {
        self.weights[var.0]
    }

    /// Evaluates whether a complete assignment satisfies all constraints.
    pub fn is_satisfied(&self, values: &[bool]) -> bool {
        self.constraints.iter().all(|c| match c {
            CpConstraint::ExactlyOne(vars) => {
                vars.iter().filter(|&&v| values[v]).count() == 1
            }
            CpConstraint::AtMostOne(vars) => {
                vars.iter().filter(|&&v| values[v]).count() <= 1
            }
            CpConstraint::LinearLe { vars, bound } => {
                vars.iter().filter(|&&v| values[v]).count() <= *bound as usize
            }
            CpConstraint::Or { target, inputs } => {
                values[*target] == inputs.iter().any(|&v| values[v])
            }
            CpConstraint::And { target, inputs } => {
                values[*target] == inputs.iter().all(|&v| values[v])
            }
        })
    }

    /// Evaluates the objective for a complete assignment.
    pub fn objective_of(&self, values: &[bool]) -> i64 {
        self.weights
            .iter()
            .zip(values)
            .filter(|(_, &set)| set)
            .map(|(w, _)| w)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_building() {
        let mut model = CpModel::new();
        let a = model.new_bool_var();
        let b = model.new_bool_var();
        model.add_exactly_one(&[a, b]);
        model.add_objective_term(a, 10);
        model.add_objective_term(a, 5);

        assert_eq!(model.var_count(), 2);
        assert_eq!(model.constraint_count(), 1);
        assert_eq!(model.weight(a), 15);
        assert_eq!(model.weight(b), 0);
    }

    #[test]
    fn test_is_satisfied_exactly_one() {
        let mut model = CpModel::new();
        let a = model.new_bool_var();
        let b = model.new_bool_var();
        model.add_exactly_one(&[a, b]);

        assert!(model.is_satisfied(&[true, false]));
        assert!(!model.is_satisfied(&[true, true]));
        assert!(!model.is_satisfied(&[false, false]));
    }

    #[test]
    fn test_is_satisfied_linear_le() {
        let mut model = CpModel::new();
        let vars: Vec<BoolVar> = (0..3).map(|_| model.new_bool_var()).collect();
        model.add_linear_le(&vars, 2);

        assert!(model.is_satisfied(&[true, true, false]));
        assert!(!model.is_satisfied(&[true, true, true]));
    }

    #[test]
    fn test_is_satisfied_reified() {
        let mut model = CpModel::new();
        let a = model.new_bool_var();
        let b = model.new_bool_var();
        let any = model.new_bool_var();
        let both = model.new_bool_var();
        model.add_or(any, &[a, b]);
        model.add_and(both, &[a, b]);

        assert!(model.is_satisfied(&[true, false, true, false]));
        assert!(model.is_satisfied(&[true, true, true, true]));
        assert!(model.is_satisfied(&[false, false, false, false]));
        assert!(!model.is_satisfied(&[true, false, false, false]));
        assert!(!model.is_satisfied(&[true, false, true, true]));
    }

    #[test]
    fn test_objective_of() {
        let mut model = CpModel::new();
        let a = model.new_bool_var();
        let b = model.new_bool_var();
        model.add_objective_term(a, 7);
        model.add_objective_term(b, -3);

        assert_eq!(model.objective_of(&[true, true]), 4);
        assert_eq!(model.objective_of(&[true, false]), 7);
        assert_eq!(model.objective_of(&[false, false]), 0);
    }
}
