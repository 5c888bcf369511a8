use good_lp::Solution as LpSolution;
use good_lp::solvers::coin_cbc::{CoinCbcProblem, coin_cbc};
use good_lp::{
    Expression, ProblemVariables, SolverModel, Variable, constraint, variable, variables,
};
use log::{debug, trace};
use std::collections::BTreeMap;

mod error;
mod parse;
mod types;

pub use error::Error;
pub use parse::parse;
pub use types::{ChildRequest, Country, Factory, Problem, Solution};

/// Solved values above this count as a binary variable being set.
const BINARY_THRESHOLD: f64 = 0.5;

impl Problem {
    pub fn solve(&self) -> Result<Solution, Error> {
        self.validate()?;

        // One satisfaction variable per child, and one assignment variable per
        // (child, requested factory) pair
        let (variables, satisfaction, assignments) = init_variables(&self.children);

        // Sum assignments per factory and per country
        let totals = accumulate_totals(self, &assignments)?;

        let objective: Expression = satisfaction.iter().copied().sum();
        let model = create_model(variables, objective);

        // Add constraints
        let model = constrain_one_factory_per_child(model, &satisfaction, &assignments);
        let model = constrain_factory_stock(model, &self.factories, &totals.usage);
        let model = constrain_country_exports(model, &self.countries, &totals.exports);
        let model = constrain_minimum_distribution(model, &self.countries, &totals);

        // Solve
        let solution = model.solve()?;

        let solution = create_solution(&solution, &satisfaction, &assignments);
        debug!(
            "satisfied {} of {} children",
            solution.satisfied,
            self.children.len()
        );
        trace!("assignments: {:?}", solution.assignments);
        Ok(solution)
    }
}

/// Collapse a pipeline result into the single integer the CLI prints:
/// the satisfied-child count, or `-1` for any failure.
pub fn report(result: Result<Solution, Error>) -> i64 {
    match result {
        Ok(solution) => solution.satisfied as i64,
        Err(err) => {
            debug!("no answer: {err}");
            -1
        }
    }
}

/// Assignment variables of one child, in request order, keyed by factory id.
type ChildAssignments = Vec<(i64, Variable)>;

fn init_variables(
    children: &[ChildRequest],
) -> (ProblemVariables, Vec<Variable>, Vec<ChildAssignments>) {
    let mut problem_vars = variables!();

    let satisfaction = children
        .iter()
        .map(|_| problem_vars.add(variable().binary()))
        .collect();

    let assignments = children
        .iter()
        .map(|child| {
            child
                .factories
                .iter()
                .map(|&factory| (factory, problem_vars.add(variable().binary())))
                .collect()
        })
        .collect();

    (problem_vars, satisfaction, assignments)
}

/// Per-entity accumulators, only alive while the model is being built.
#[derive(Default)]
struct Totals {
    /// Factory id → assignments drawing from it.
    usage: BTreeMap<i64, Vec<Variable>>,
    /// Owning country id → assignments shipping to children of another country.
    exports: BTreeMap<i64, Vec<Variable>>,
    /// Requesting country id → assignments made by its children.
    distribution: BTreeMap<i64, Vec<Variable>>,
    /// Requesting country id → number of its children.
    requesters: BTreeMap<i64, usize>,
}

fn accumulate_totals(
    problem: &Problem,
    assignments: &[ChildAssignments],
) -> Result<Totals, Error> {
    let mut totals = Totals::default();

    let requests = problem.children.iter().zip(assignments);
    for (index, (child, child_assignments)) in (1..).zip(requests) {
        *totals.requesters.entry(child.country).or_insert(0) += 1;

        for &(factory_id, var) in child_assignments {
            let factory = problem
                .factories
                .get(&factory_id)
                .ok_or(Error::UnknownFactory {
                    child: index,
                    factory: factory_id,
                })?;

            totals.usage.entry(factory_id).or_default().push(var);

            if factory.country != child.country {
                // Export caps exist only for declared countries
                if !problem.countries.contains_key(&factory.country) {
                    return Err(Error::UnknownCountry(factory.country));
                }
                totals.exports.entry(factory.country).or_default().push(var);
            }

            totals.distribution.entry(child.country).or_default().push(var);
        }
    }

    Ok(totals)
}

fn sum(vars: &[Variable]) -> Expression {
    vars.iter().copied().sum()
}

/// Create a model with the given objective function
fn create_model(variables: ProblemVariables, objective: Expression) -> CoinCbcProblem {
    let mut model = variables.maximise(objective).using(coin_cbc);
    // CBC logs to stdout, which must carry nothing but the answer
    model.set_parameter("loglevel", "0");
    model
}

/// Each child gets at most one toy, and is satisfied exactly when it gets one
fn constrain_one_factory_per_child<Model: SolverModel>(
    model: Model,
    satisfaction: &[Variable],
    assignments: &[ChildAssignments],
) -> Model {
    satisfaction
        .iter()
        .zip(assignments)
        .fold(model, |m, (&satisfied, child_assignments)| {
            if child_assignments.is_empty() {
                return m;
            }
            let assigned = child_assignments
                .iter()
                .fold(Expression::from(0.0), |sum, &(_, var)| sum + var);

            m.with(assigned.clone().leq(1.0))
                .with(constraint!(assigned == satisfied))
        })
}

/// Add factory stock limits to the model
fn constrain_factory_stock<Model: SolverModel>(
    model: Model,
    factories: &BTreeMap<i64, Factory>,
    usage: &BTreeMap<i64, Vec<Variable>>,
) -> Model {
    usage.iter().fold(model, |m, (factory_id, vars)| {
        let stock = factories[factory_id].stock as f64;
        m.with(sum(vars).leq(stock))
    })
}

/// Add per-country export caps to the model
fn constrain_country_exports<Model: SolverModel>(
    model: Model,
    countries: &BTreeMap<i64, Country>,
    exports: &BTreeMap<i64, Vec<Variable>>,
) -> Model {
    exports.iter().fold(model, |m, (country_id, vars)| {
        let max_export = countries[country_id].max_export as f64;
        m.with(sum(vars).leq(max_export))
    })
}

/// Add per-country minimum distribution to the model.
///
/// The declared minimum is capped by the number of children requesting from that
/// country, so a country with few (or no) children never gets an unreachable bound.
fn constrain_minimum_distribution<Model: SolverModel>(
    model: Model,
    countries: &BTreeMap<i64, Country>,
    totals: &Totals,
) -> Model {
    totals
        .distribution
        .iter()
        .fold(model, |m, (country_id, vars)| {
            let requesters = totals.requesters.get(country_id).copied().unwrap_or(0);
            let declared = countries[country_id].min_distribution;
            let minimum = declared.min(requesters as i64) as f64;
            m.with(sum(vars).geq(minimum))
        })
}

/// Read the satisfied count and the chosen factories back from the solver
fn create_solution(
    solution: &impl LpSolution,
    satisfaction: &[Variable],
    assignments: &[ChildAssignments],
) -> Solution {
    let satisfied = satisfaction
        .iter()
        .filter(|&&var| solution.value(var) > BINARY_THRESHOLD)
        .count();

    let assignments = (1..)
        .zip(assignments)
        .filter_map(|(index, child_assignments)| {
            child_assignments
                .iter()
                .find(|&&(_, var)| solution.value(var) > BINARY_THRESHOLD)
                .map(|&(factory, _)| (index, factory))
        })
        .collect();

    Solution {
        satisfied,
        assignments,
    }
}
