use super::{weight_matrix, Score};
use crate::{Activity, Assignment, Student};

/// Calculate a simple upper bound for the solution score of the given problem, assuming every
/// student gets every chosen activity open to their grade (ignoring capacities and time
/// conflicts).
pub fn theoretical_max_score(students: &[Student], activities: &[Activity]) -> Score {
    weight_matrix(students, activities).iter().flatten().sum()
}

/// Calculate the score of a given assignment (not necessarily created by `optimize::solve()`)
/// using the same weights as the optimizer. Unchosen and forbidden edges do not count.
pub fn assignment_score(
    students: &[Student],
    activities: &[Activity],
    assignment: &Assignment,
) -> Score {
    let weights = weight_matrix(students, activities);
    let mut score = 0;
    for (i, student) in students.iter().enumerate() {
        for (j, activity) in activities.iter().enumerate() {
            if assignment.is_assigned(student.id, activity.id) {
                score += weights[[i, j]].unwrap_or(0);
            }
        }
    }
    score
}

/// Calculate a comparable solution quality in the range [0, 1]: the share of the theoretical
/// maximum score reached by the assignment
pub fn solution_quality(score: Score, max_score: Score) -> f32 {
    if max_score == 0 {
        return 1.0;
    }
    score as f32 / max_score as f32
}
