//! The assignment of students to activities as a bipartite relation, stored redundantly as
//! student → activities and activity → students maps.
//!
//! Query methods treat unknown ids like ids without edges and return empty results.
//! `student_known()`/`activity_known()` tell both cases apart: a student (activity) becomes known
//! with its first edge and stays known after its last edge has been removed.

use crate::{activity_map, Activity, Error, Id, Student};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(try_from = "AssignmentData", into = "AssignmentData")]
pub struct Assignment {
    student_activities: BTreeMap<Id, BTreeSet<Id>>,
    activity_students: BTreeMap<Id, BTreeSet<Id>>,
}

/// Serialized form of an `Assignment`: both views are written as adjacency lists
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct AssignmentData {
    student_activity_map: BTreeMap<Id, Vec<Id>>,
    activity_student_map: BTreeMap<Id, Vec<Id>>,
}

impl From<Assignment> for AssignmentData {
    fn from(assignment: Assignment) -> Self {
        AssignmentData {
            student_activity_map: assignment
                .student_activities
                .into_iter()
                .map(|(s, activities)| (s, activities.into_iter().collect()))
                .collect(),
            activity_student_map: assignment
                .activity_students
                .into_iter()
                .map(|(a, students)| (a, students.into_iter().collect()))
                .collect(),
        }
    }
}

impl TryFrom<AssignmentData> for Assignment {
    type Error = Error;

    fn try_from(data: AssignmentData) -> Result<Self, Self::Error> {
        let assignment = Assignment {
            student_activities: data
                .student_activity_map
                .into_iter()
                .map(|(s, activities)| (s, activities.into_iter().collect()))
                .collect(),
            activity_students: data
                .activity_student_map
                .into_iter()
                .map(|(a, students)| (a, students.into_iter().collect()))
                .collect(),
        };

        for (student, activities) in assignment.student_activities.iter() {
            for activity in activities.iter() {
                if !assignment
                    .activity_students
                    .get(activity)
                    .map_or(false, |students| students.contains(student))
                {
                    return Err(Error::InconsistentAssignment {
                        student: *student,
                        activity: *activity,
                    });
                }
            }
        }
        for (activity, students) in assignment.activity_students.iter() {
            for student in students.iter() {
                if !assignment
                    .student_activities
                    .get(student)
                    .map_or(false, |activities| activities.contains(activity))
                {
                    return Err(Error::InconsistentAssignment {
                        student: *student,
                        activity: *activity,
                    });
                }
            }
        }

        Ok(assignment)
    }
}

/// A single broken hard constraint, found by [`Assignment::check_validity()`]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("Student {student} is not assigned to any activity.")]
    NoAssignedActivity { student: Id },
    #[error("Student {student} did not choose activity {activity}.")]
    NotPreferred { student: Id, activity: Id },
    #[error("Grade of student {student} not allowed in activity {activity}.")]
    GradeNotAllowed { student: Id, activity: Id },
    #[error("Student {student} has a time conflict: {first} and {second}.")]
    TimeConflict { student: Id, first: Id, second: Id },
    #[error("Student {student} is assigned to unknown activity {activity}.")]
    UnknownActivity { student: Id, activity: Id },
    #[error("Unknown student {student} is assigned to activities.")]
    UnknownStudent { student: Id },
    #[error("Only {participants} in activity {activity}, minimum is {min}.")]
    BelowMinimumCapacity {
        activity: Id,
        participants: usize,
        min: u32,
    },
    #[error("{participants} in activity {activity}, maximum is {max}.")]
    AboveMaximumCapacity {
        activity: Id,
        participants: usize,
        max: u32,
    },
}

impl Assignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the edge between student and activity. Assigning an existing edge again is a no-op.
    pub fn assign(&mut self, student_id: Id, activity_id: Id) {
        self.student_activities
            .entry(student_id)
            .or_default()
            .insert(activity_id);
        self.activity_students
            .entry(activity_id)
            .or_default()
            .insert(student_id);
    }

    /// Remove the edge between student and activity.
    ///
    /// # Errors
    /// * `Error::UnknownStudent` if the student has never been assigned to any activity
    /// * `Error::NotAssigned` if the student is known, but not assigned to this activity
    pub fn remove(&mut self, student_id: Id, activity_id: Id) -> Result<(), Error> {
        let activities = self
            .student_activities
            .get_mut(&student_id)
            .ok_or(Error::UnknownStudent(student_id))?;
        if !activities.remove(&activity_id) {
            return Err(Error::NotAssigned {
                student: student_id,
                activity: activity_id,
            });
        }
        if let Some(students) = self.activity_students.get_mut(&activity_id) {
            students.remove(&student_id);
        }
        Ok(())
    }

    /// Remove the student with all its edges from the assignment
    pub fn remove_student(&mut self, student_id: Id) {
        if let Some(activities) = self.student_activities.remove(&student_id) {
            for activity in activities {
                if let Some(students) = self.activity_students.get_mut(&activity) {
                    students.remove(&student_id);
                }
            }
        }
    }

    pub fn student_known(&self, student_id: Id) -> bool {
        self.student_activities.contains_key(&student_id)
    }

    pub fn activity_known(&self, activity_id: Id) -> bool {
        self.activity_students.contains_key(&activity_id)
    }

    pub fn is_assigned(&self, student_id: Id, activity_id: Id) -> bool {
        self.student_activities
            .get(&student_id)
            .map_or(false, |activities| activities.contains(&activity_id))
    }

    /// Ids of the activities of the student in ascending order
    pub fn activities_of(&self, student_id: Id) -> Vec<Id> {
        self.student_activities
            .get(&student_id)
            .map(|activities| activities.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Ids of the participants of the activity in ascending order
    pub fn participants_of(&self, activity_id: Id) -> Vec<Id> {
        self.activity_students
            .get(&activity_id)
            .map(|students| students.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn participant_count(&self, activity_id: Id) -> usize {
        self.activity_students
            .get(&activity_id)
            .map_or(0, |students| students.len())
    }

    pub fn activity_count(&self, student_id: Id) -> usize {
        self.student_activities
            .get(&student_id)
            .map_or(0, |activities| activities.len())
    }

    /// All (student, activity) edges, ordered by student id
    pub fn edges(&self) -> impl Iterator<Item = (Id, Id)> + '_ {
        self.student_activities
            .iter()
            .flat_map(|(s, activities)| activities.iter().map(move |a| (*s, *a)))
    }

    pub fn num_edges(&self) -> usize {
        self.student_activities.values().map(|a| a.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.student_activities.values().all(|a| a.is_empty())
    }

    /// Check the assignment against all hard constraints and return every violation found.
    ///
    /// Students are checked in the given order (no activity, unknown or unchosen activities,
    /// grade restrictions, time conflicts), followed by assignment records of students missing
    /// from `students` and finally the capacity bounds of all `activities`.
    pub fn check_validity(&self, students: &[Student], activities: &[Activity]) -> Vec<Violation> {
        let activities_by_id = activity_map(activities);
        let mut violations = Vec::new();

        for student in students {
            let assigned = self.activities_of(student.id);
            if assigned.is_empty() {
                violations.push(Violation::NoAssignedActivity {
                    student: student.id,
                });
                continue;
            }

            let mut known_activities = Vec::new();
            for activity_id in assigned {
                let activity = match activities_by_id.get(&activity_id) {
                    Some(activity) => activity,
                    None => {
                        violations.push(Violation::UnknownActivity {
                            student: student.id,
                            activity: activity_id,
                        });
                        continue;
                    }
                };
                if !student.prefers(activity_id) {
                    violations.push(Violation::NotPreferred {
                        student: student.id,
                        activity: activity_id,
                    });
                }
                if !activity.admits(student.grade) {
                    violations.push(Violation::GradeNotAllowed {
                        student: student.id,
                        activity: activity_id,
                    });
                }
                known_activities.push(*activity);
            }

            for (first, second) in known_activities.iter().tuple_combinations() {
                if first.overlaps(second) {
                    violations.push(Violation::TimeConflict {
                        student: student.id,
                        first: first.id,
                        second: second.id,
                    });
                }
            }
        }

        let student_ids: HashSet<Id> = students.iter().map(|s| s.id).collect();
        for (student_id, activities) in self.student_activities.iter() {
            if !activities.is_empty() && !student_ids.contains(student_id) {
                violations.push(Violation::UnknownStudent {
                    student: *student_id,
                });
            }
        }

        for activity in activities {
            let participants = self.participant_count(activity.id);
            if activity.is_underbooked(participants) {
                violations.push(Violation::BelowMinimumCapacity {
                    activity: activity.id,
                    participants,
                    min: activity.min_capacity,
                });
            }
            if let Some(max) = activity.max_capacity {
                if activity.is_overbooked(participants) {
                    violations.push(Violation::AboveMaximumCapacity {
                        activity: activity.id,
                        participants,
                        max,
                    });
                }
            }
        }

        violations
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{Assignment, Violation};
    use crate::{Activity, Error, Grade, Id, Preference, Student, Timespan};

    pub(crate) fn student(id: Id, grade: i64, preferences: &[Id]) -> Student {
        Student {
            id,
            name: format!("Student {}", id),
            grade: Grade::new(grade).unwrap(),
            subgrade: String::from("a"),
            preferences: preferences
                .iter()
                .enumerate()
                .map(|(rank, a)| (*a, Preference::Ranked(rank as u32 + 1)))
                .collect(),
        }
    }

    pub(crate) fn activity(id: Id, min: u32, max: Option<u32>, from: u32, to: u32) -> Activity {
        Activity {
            id,
            name: format!("Activity {}", id),
            min_capacity: min,
            max_capacity: max,
            timespan: Timespan::new(from, to).unwrap(),
            valid_grades: [true; 4],
        }
    }

    pub(crate) fn example_students() -> Vec<Student> {
        vec![student(1, 1, &[1, 2]), student(2, 2, &[2])]
    }

    pub(crate) fn example_activities() -> Vec<Activity> {
        vec![
            activity(1, 1, Some(1), 32, 38),
            activity(2, 0, Some(2), 40, 44).with_valid_grades([true, true, false, false]),
        ]
    }

    pub(crate) fn example_assignment() -> Assignment {
        let mut assignment = Assignment::new();
        assignment.assign(1, 1);
        assignment.assign(1, 2);
        assignment.assign(2, 2);
        assignment
    }

    /// Check that both views of the assignment describe the same relation
    pub(crate) fn assert_views_consistent(assignment: &Assignment) {
        for (student, activities) in assignment.student_activities.iter() {
            for activity in activities {
                assert!(
                    assignment.participants_of(*activity).contains(student),
                    "Student {} misses in participants of activity {}",
                    student,
                    activity
                );
            }
        }
        for (activity, students) in assignment.activity_students.iter() {
            for student in students {
                assert!(
                    assignment.activities_of(*student).contains(activity),
                    "Activity {} misses in activities of student {}",
                    activity,
                    student
                );
            }
        }
    }

    #[test]
    fn test_assignment_dict_conversion() {
        let assignment = example_assignment();
        let json = serde_json::to_value(&assignment).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "student_activity_map": {"1": [1, 2], "2": [2]},
                "activity_student_map": {"1": [1], "2": [1, 2]},
            })
        );
        assert_eq!(
            assignment,
            serde_json::from_value::<Assignment>(json).unwrap()
        );
    }

    #[test]
    fn test_inconsistent_views() {
        let result = serde_json::from_str::<Assignment>(
            r#"{"student_activity_map": {"1": [1, 2]}, "activity_student_map": {"1": [1]}}"#,
        );
        assert!(result.is_err());
        let result = serde_json::from_str::<Assignment>(
            r#"{"student_activity_map": {"1": [1]}, "activity_student_map": {"1": [1, 3]}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_assign_by_id() {
        let mut assignment = Assignment::new();
        assert!(assignment.is_empty());
        assignment.assign(1, 2);
        assignment.assign(1, 2);
        assert_eq!(assignment.activities_of(1), vec![2]);
        assert_eq!(assignment.participants_of(2), vec![1]);
        assert_eq!(assignment.num_edges(), 1);
        assert!(!assignment.is_empty());
        assert_views_consistent(&assignment);
    }

    #[test]
    fn test_assign_remove() {
        let mut assignment = Assignment::new();
        assignment.assign(1, 1);
        assignment.remove(1, 1).unwrap();
        assert!(assignment.activities_of(1).is_empty());
        assert!(assignment.participants_of(1).is_empty());
        assert!(assignment.is_empty());
        // The student stays known with an empty set
        assert!(assignment.student_known(1));
        assert_eq!(
            assignment.remove(1, 1),
            Err(Error::NotAssigned {
                student: 1,
                activity: 1
            })
        );
    }

    #[test]
    fn test_remove_non_existing_student() {
        let mut assignment = example_assignment();
        assert_eq!(assignment.remove(17, 1), Err(Error::UnknownStudent(17)));
    }

    #[test]
    fn test_remove_from_non_assigned_activity() {
        let mut assignment = example_assignment();
        assert_eq!(
            assignment.remove(2, 1),
            Err(Error::NotAssigned {
                student: 2,
                activity: 1
            })
        );
        assert_eq!(assignment, example_assignment());
    }

    #[test]
    fn test_remove_student() {
        let mut assignment = example_assignment();
        assignment.remove_student(1);
        assert!(!assignment.student_known(1));
        assert!(assignment.participants_of(1).is_empty());
        assert_eq!(assignment.participants_of(2), vec![2]);
        assert_views_consistent(&assignment);
    }

    #[test]
    fn test_participant_count() {
        let mut assignment = Assignment::new();
        assignment.assign(1, 1);
        assignment.assign(2, 1);
        assignment.assign(3, 1);
        assignment.assign(4, 2);
        assert_eq!(assignment.participant_count(1), 3);
        assert_eq!(assignment.participant_count(2), 1);
        assert_eq!(assignment.activity_count(4), 1);
        assert_eq!(
            assignment.edges().collect::<Vec<_>>(),
            vec![(1, 1), (2, 1), (3, 1), (4, 2)]
        );
    }

    #[test]
    fn test_unknown_ids_are_empty() {
        let assignment = example_assignment();
        assert!(!assignment.activity_known(3));
        assert_eq!(assignment.participant_count(3), 0);
        assert!(assignment.participants_of(3).is_empty());
        assert!(!assignment.student_known(3));
        assert!(assignment.activities_of(3).is_empty());
    }

    #[test]
    fn test_equality_ignores_order() {
        let mut other = Assignment::new();
        other.assign(2, 2);
        other.assign(1, 2);
        other.assign(1, 1);
        assert_eq!(other, example_assignment());

        other.remove(2, 2).unwrap();
        assert_ne!(other, example_assignment());
        other.assign(2, 2);
        assert_eq!(other, example_assignment());

        // An untouched student differs from a known student without edges
        let mut touched = Assignment::new();
        touched.assign(5, 1);
        touched.remove(5, 1).unwrap();
        assert_ne!(touched, Assignment::new());
    }

    #[test]
    fn test_assign_validity() {
        let violations =
            example_assignment().check_validity(&example_students(), &example_activities());
        assert_eq!(violations, vec![]);
    }

    #[test]
    fn test_assign_validity_grade_restriction_violation() {
        let activity = activity(1, 0, None, 0, 4).with_valid_grades([true, false, true, true]);
        let student = student(1, 2, &[1]);
        let mut assignment = Assignment::new();
        assignment.assign(1, 1);
        assert_eq!(
            assignment.check_validity(&[student], &[activity]),
            vec![Violation::GradeNotAllowed {
                student: 1,
                activity: 1
            }]
        );
    }

    #[test]
    fn test_assign_validity_min_capacity_violation() {
        let activity = activity(1, 2, None, 0, 4);
        let student = student(1, 2, &[1]);
        let mut assignment = Assignment::new();
        assignment.assign(1, 1);
        assert_eq!(
            assignment.check_validity(&[student], &[activity]),
            vec![Violation::BelowMinimumCapacity {
                activity: 1,
                participants: 1,
                min: 2
            }]
        );
    }

    #[test]
    fn test_assign_validity_max_capacity_violation() {
        let activity = activity(1, 0, Some(1), 0, 4);
        let students = vec![student(1, 2, &[1]), student(2, 3, &[1])];
        let mut assignment = Assignment::new();
        assignment.assign(1, 1);
        assignment.assign(2, 1);
        assert_eq!(
            assignment.check_validity(&students, &[activity]),
            vec![Violation::AboveMaximumCapacity {
                activity: 1,
                participants: 2,
                max: 1
            }]
        );
    }

    #[test]
    fn test_assign_validity_preference_violation() {
        let activity = activity(1, 0, Some(1), 0, 4);
        let student = student(1, 2, &[2]);
        let mut assignment = Assignment::new();
        assignment.assign(1, 1);
        assert_eq!(
            assignment.check_validity(&[student], &[activity]),
            vec![Violation::NotPreferred {
                student: 1,
                activity: 1
            }]
        );
    }

    #[test]
    fn test_assign_validity_no_assignment() {
        let mut assignment = Assignment::new();
        assignment.assign(1, 1);
        assignment.remove(1, 1).unwrap();
        assert_eq!(
            assignment.check_validity(&[student(1, 1, &[1])], &[activity(1, 0, None, 0, 4)]),
            vec![Violation::NoAssignedActivity { student: 1 }]
        );
        // A student never touched by the assignment is reported the same way
        assert_eq!(
            Assignment::new().check_validity(&[student(2, 1, &[])], &[]),
            vec![Violation::NoAssignedActivity { student: 2 }]
        );
    }

    #[test]
    fn test_assign_validity_time_conflict() {
        let activities = vec![activity(1, 0, None, 0, 8), activity(2, 0, None, 4, 12)];
        let mut assignment = Assignment::new();
        assignment.assign(1, 1);
        assignment.assign(1, 2);
        assert_eq!(
            assignment.check_validity(&[student(1, 1, &[1, 2])], &activities),
            vec![Violation::TimeConflict {
                student: 1,
                first: 1,
                second: 2
            }]
        );
    }

    #[test]
    fn test_assign_validity_unknown_ids() {
        let mut assignment = Assignment::new();
        assignment.assign(1, 7);
        assignment.assign(9, 1);
        assert_eq!(
            assignment.check_validity(&[student(1, 1, &[7])], &[activity(1, 0, None, 0, 4)]),
            vec![
                Violation::UnknownActivity {
                    student: 1,
                    activity: 7
                },
                Violation::UnknownStudent { student: 9 },
            ]
        );
    }

    #[test]
    fn test_assign_validity_reports_all_violations() {
        let students = vec![
            student(1, 3, &[1]),
            student(2, 1, &[]),
            student(3, 1, &[1, 2]),
        ];
        let activities = vec![
            activity(1, 0, Some(1), 0, 8).with_valid_grades([true, true, false, false]),
            activity(2, 3, None, 8, 12),
        ];
        let mut assignment = Assignment::new();
        assignment.assign(1, 1);
        assignment.assign(1, 2);
        assignment.assign(3, 1);

        assert_eq!(
            assignment.check_validity(&students, &activities),
            vec![
                Violation::GradeNotAllowed {
                    student: 1,
                    activity: 1
                },
                Violation::NotPreferred {
                    student: 1,
                    activity: 2
                },
                Violation::NoAssignedActivity { student: 2 },
                Violation::AboveMaximumCapacity {
                    activity: 1,
                    participants: 2,
                    max: 1
                },
                Violation::BelowMinimumCapacity {
                    activity: 2,
                    participants: 1,
                    min: 3
                },
            ]
        );
    }
}
