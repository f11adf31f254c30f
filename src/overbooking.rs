//! The simple "first come" assignment strategy: Every student is assigned to all their valid
//! choices, afterwards overbooked activities are reduced by a backtracking search.
//!
//! This strategy does not care about time conflicts or preference ranks and its runtime is
//! exponential in the worst case. It is kept as an alternative to `optimize::solve()`, which
//! should be preferred.

use crate::{activity_map, Activity, Assignment, Error, Student};
use log::{debug, info};

/// Assign students greedily and remove overbooking afterwards.
///
/// # Errors
/// * `Error::UnknownActivity` if a student chose an activity missing from `activities`
/// * `Error::EmptyPreferences` if a student has no choice open to their grade
/// * `Error::MinimumCapacityNotReached` if an activity cannot get enough participants even if
///   everybody attends all their choices
/// * `Error::MaximumCapacityExceeded` if the overbooking cannot be resolved
pub fn assign_greedily(students: &[Student], activities: &[Activity]) -> Result<Assignment, Error> {
    let mut assignment = first_come_assignment(students, activities)?;

    for activity in activities {
        let participants = assignment.participant_count(activity.id);
        if activity.is_underbooked(participants) {
            return Err(Error::MinimumCapacityNotReached {
                activity: activity.id,
                participants,
                min: activity.min_capacity,
            });
        }
    }

    reduce_overbooking(&mut assignment, activities)?;
    info!(
        "Reduced overbooking, {} assignments are left.",
        assignment.num_edges()
    );
    Ok(assignment)
}

/// Assign each student to every chosen activity open to their grade
pub fn first_come_assignment(
    students: &[Student],
    activities: &[Activity],
) -> Result<Assignment, Error> {
    let activities_by_id = activity_map(activities);
    let mut assignment = Assignment::new();

    for student in students {
        let mut assigned_any = false;
        for activity_id in student.preferences.keys() {
            let activity = activities_by_id
                .get(activity_id)
                .ok_or(Error::UnknownActivity(*activity_id))?;
            if activity.admits(student.grade) {
                assignment.assign(student.id, activity.id);
                assigned_any = true;
            } else {
                debug!(
                    "Not assigning {} to {}, since their grade is not allowed.",
                    student, activity
                );
            }
        }
        if !assigned_any {
            return Err(Error::EmptyPreferences(student.id));
        }
    }

    Ok(assignment)
}

/// Remove students from overbooked activities until no activity is overbooked.
///
/// Only students assigned to at least one other activity are removed, so no student loses their
/// last activity. The search takes the first overbooked activity and tries to remove its
/// participants one after another, each time recursing to solve the remaining overbooking. A
/// removal is undone if the recursion fails.
///
/// # Errors
/// Fails with `Error::MaximumCapacityExceeded` for the first overbooked activity, if no
/// combination of removals resolves the overbooking. The assignment is left unchanged in this
/// case.
pub fn reduce_overbooking(
    assignment: &mut Assignment,
    activities: &[Activity],
) -> Result<(), Error> {
    let activity = match activities
        .iter()
        .find(|a| a.is_overbooked(assignment.participant_count(a.id)))
    {
        Some(activity) => activity,
        None => return Ok(()),
    };

    for student_id in assignment.participants_of(activity.id) {
        if assignment.activity_count(student_id) <= 1 {
            continue;
        }
        assignment.remove(student_id, activity.id)?;
        if reduce_overbooking(assignment, activities).is_ok() {
            return Ok(());
        }
        assignment.assign(student_id, activity.id);
    }

    debug!("Could not resolve overbooking of {}.", activity);
    Err(Error::MaximumCapacityExceeded {
        activity: activity.id,
        participants: assignment.participant_count(activity.id),
    })
}
