//! Optimal assignment of students to activities as a binary integer program.
//!
//! Each pair of a student and an activity the student may attend (chosen by the student and open
//! to the student's grade) gets one binary decision variable. The model demands capacity bounds
//! for every activity, at least one activity for every student and no overlapping activities for
//! any student. The objective sums up the preference weights of all selected pairs. It is solved
//! with the MILP solver of `good_lp`.
//!
//! All data conversion from `Student`/`Activity` objects into the weight matrix happens in
//! `precompute_problem()`, so it can be tested without running the solver.

pub mod solution_score;

use crate::{Activity, Assignment, Id, Preference, Student, Violation};
use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use itertools::Itertools;
use log::{debug, error, info, warn};
use std::collections::HashMap;

/// Type of the objective weight of a single (student, activity) pair
pub type Weight = u64;

/// Type of the objective value of a whole assignment
pub type Score = u64;

/// Reasons for the optimizing assigner to return without an assignment
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error("Student {student} chose unknown activity {activity}.")]
    UnknownActivity { student: Id, activity: Id },
    /// The student's choices are empty or none of them is open to the student's grade. The
    /// problem is infeasible, which is detected before building the model.
    #[error("Student {0} did not choose any activity open to their grade.")]
    NoEligibleActivity(Id),
    #[error("No assignment satisfies all constraints.")]
    Infeasible,
    #[error("The solver failed: {0}")]
    Solver(String),
    /// The solver's result does not pass the validity check. This hints at a bug in the model.
    #[error("The calculated assignment violates {} constraints.", .0.len())]
    Inconsistent(Vec<Violation>),
}

/// Main function of the module: Calculate an assignment of the students to the activities that
/// maximizes the total preference weight.
///
/// Returns the assignment together with its objective value (see `solution_score`).
pub fn solve(
    students: &[Student],
    activities: &[Activity],
) -> Result<(Assignment, Score), SolveError> {
    info!(
        "Setting up integer program for {} students and {} activities ...",
        students.len(),
        activities.len()
    );
    let problem = precompute_problem(students, activities)?;

    // One binary variable per allowed pair. `None` marks forbidden pairs, which are fixed to zero
    // by not having a variable at all.
    let mut problem_variables = ProblemVariables::new();
    let variables: ndarray::Array2<Option<Variable>> = problem
        .weights
        .map(|w| w.map(|_| problem_variables.add(variable().binary())));
    debug!(
        "Created {} decision variables",
        variables.iter().filter(|v| v.is_some()).count()
    );

    let objective: Expression = problem
        .weights
        .iter()
        .zip(variables.iter())
        .filter_map(|(w, v)| match (w, v) {
            (Some(w), Some(v)) => Some(*w as f64 * *v),
            _ => None,
        })
        .sum();
    let mut model = problem_variables.maximise(objective).using(default_solver);

    // Capacity bounds
    for (j, activity) in activities.iter().enumerate() {
        let candidates: Vec<Variable> = variables.column(j).iter().flatten().copied().collect();
        if candidates.len() < activity.min_capacity as usize {
            info!(
                "Only {} students may attend activity {}, minimum is {}.",
                candidates.len(),
                activity,
                activity.min_capacity
            );
            return Err(SolveError::Infeasible);
        }
        if candidates.is_empty() {
            continue;
        }
        let attendance: Expression = candidates.iter().copied().sum();
        if activity.min_capacity > 0 {
            let min = activity.min_capacity as f64;
            model.add_constraint(constraint!(attendance.clone() >= min));
        }
        if let Some(max) = activity.max_capacity {
            if (max as usize) < candidates.len() {
                let max = max as f64;
                model.add_constraint(constraint!(attendance <= max));
            }
        }
    }

    // Every student attends at least one activity
    for row in variables.rows() {
        let attendance: Expression = row.iter().flatten().copied().sum();
        model.add_constraint(constraint!(attendance >= 1));
    }

    // No student attends overlapping activities
    for (j, k) in problem.conflicts.iter() {
        for i in 0..students.len() {
            if let (Some(a), Some(b)) = (variables[[i, *j]], variables[[i, *k]]) {
                model.add_constraint(constraint!(a + b <= 1));
            }
        }
    }

    info!("Starting MILP solver ...");
    let solution = match model.solve() {
        Ok(solution) => solution,
        Err(ResolutionError::Infeasible) => {
            info!("The integer program is infeasible.");
            return Err(SolveError::Infeasible);
        }
        Err(e) => {
            warn!("The MILP solver failed: {}", e);
            return Err(SolveError::Solver(e.to_string()));
        }
    };

    // Convert the variable values into an assignment
    let mut assignment = Assignment::new();
    let mut score: Score = 0;
    for ((i, j), var) in variables.indexed_iter() {
        if let Some(var) = var {
            if solution.value(*var) > 0.5 {
                assignment.assign(students[i].id, activities[j].id);
                score += problem.weights[[i, j]].unwrap_or(0);
            }
        }
    }
    info!(
        "Found an optimal assignment with {} edges and score {}.",
        assignment.num_edges(),
        score
    );

    let violations = assignment.check_validity(students, activities);
    if !violations.is_empty() {
        for violation in violations.iter() {
            error!("Solver result is invalid: {}", violation);
        }
        return Err(SolveError::Inconsistent(violations));
    }

    Ok((assignment, score))
}

/// Precomputed problem definition for the integer program
struct PreComputedProblem {
    /// Objective weight of each student (row) with each activity (column), in the order of the
    /// input slices. `None` marks pairs the student must not be assigned to.
    weights: ndarray::Array2<Option<Weight>>,
    /// Pairs of column indexes of activities with overlapping timespans. The smaller index comes
    /// first.
    conflicts: Vec<(usize, usize)>,
}

/// Generate the problem definition (esp. the weight matrix) from the Student and Activity
/// objects and check the students' choices for obvious infeasibility.
fn precompute_problem(
    students: &[Student],
    activities: &[Activity],
) -> Result<PreComputedProblem, SolveError> {
    let known_activities: HashMap<Id, usize> = activities
        .iter()
        .enumerate()
        .map(|(j, a)| (a.id, j))
        .collect();
    for student in students {
        if let Some(activity) = student
            .preferences
            .keys()
            .find(|a| !known_activities.contains_key(*a))
        {
            return Err(SolveError::UnknownActivity {
                student: student.id,
                activity: *activity,
            });
        }
    }

    let weights = weight_matrix(students, activities);
    for (student, row) in students.iter().zip(weights.rows()) {
        if row.iter().all(|w| w.is_none()) {
            warn!(
                "Student {} has no choice open to their grade, thus no assignment is possible.",
                student
            );
            return Err(SolveError::NoEligibleActivity(student.id));
        }
    }

    let conflicts = (0..activities.len())
        .tuple_combinations()
        .filter(|(j, k)| activities[*j].id != activities[*k].id)
        .filter(|(j, k)| activities[*j].overlaps(&activities[*k]))
        .collect();

    Ok(PreComputedProblem { weights, conflicts })
}

/// Calculate the objective weight of every (student, activity) pair.
///
/// Ranked choices are weighted `max_rank + 1 - rank`, where `max_rank` is the largest rank in
/// the whole problem, so the weakest choice still counts 1. Guaranteed choices are weighted one
/// more than the sum of all ranked weights, so that no combination of ranked choices outweighs a
/// single guaranteed one. Pairs which are not chosen, not open to the student's grade or refer to
/// unknown activities get `None`.
fn weight_matrix(students: &[Student], activities: &[Activity]) -> ndarray::Array2<Option<Weight>> {
    let columns: HashMap<Id, usize> = activities
        .iter()
        .enumerate()
        .map(|(j, a)| (a.id, j))
        .collect();

    let max_rank = students
        .iter()
        .flat_map(|s| s.preferences.values())
        .filter_map(|p| match p {
            Preference::Ranked(rank) => Some(*rank),
            Preference::Guaranteed => None,
        })
        .max()
        .unwrap_or(0);
    let ranked_weight = |rank: u32| -> Weight { (max_rank - rank) as Weight + 1 };

    let mut weights =
        ndarray::Array2::<Option<Weight>>::from_elem((students.len(), activities.len()), None);
    let mut ranked_total: Weight = 0;
    for (i, student) in students.iter().enumerate() {
        for (activity_id, preference) in student.preferences.iter() {
            let j = match columns.get(activity_id) {
                Some(j) => *j,
                None => continue,
            };
            if !activities[j].admits(student.grade) {
                debug!(
                    "Ignoring choice {} of student {}, since their grade is not allowed.",
                    activities[j], student
                );
                continue;
            }
            if let Preference::Ranked(rank) = preference {
                let weight = ranked_weight(*rank);
                ranked_total += weight;
                weights[[i, j]] = Some(weight);
            }
        }
    }

    let guaranteed_weight = ranked_total + 1;
    for (i, student) in students.iter().enumerate() {
        for (activity_id, preference) in student.preferences.iter() {
            if let (Preference::Guaranteed, Some(j)) = (preference, columns.get(activity_id)) {
                if activities[*j].admits(student.grade) {
                    weights[[i, *j]] = Some(guaranteed_weight);
                }
            }
        }
    }

    weights
}
