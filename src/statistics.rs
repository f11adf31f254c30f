//! Summary numbers of the students' choices and of an assignment.

use crate::{activity_map, Activity, Assignment, Id, Student, NUM_GRADES};
use log::debug;
use std::collections::HashMap;
use std::fmt;

/// Number of students who chose an activity, split by grade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceCount {
    pub activity: Id,
    pub per_grade: [usize; NUM_GRADES],
}

impl PreferenceCount {
    pub fn total(&self) -> usize {
        self.per_grade.iter().sum()
    }
}

/// Count the choices for every activity, in the order of `activities`.
///
/// Guaranteed choices count like ranked ones. Choices of unknown activities are ignored.
pub fn preference_counts(students: &[Student], activities: &[Activity]) -> Vec<PreferenceCount> {
    let mut counts: Vec<PreferenceCount> = activities
        .iter()
        .map(|a| PreferenceCount {
            activity: a.id,
            per_grade: [0; NUM_GRADES],
        })
        .collect();
    let columns: HashMap<Id, usize> = activities
        .iter()
        .enumerate()
        .map(|(j, a)| (a.id, j))
        .collect();

    for student in students {
        for activity_id in student.preferences.keys() {
            match columns.get(activity_id) {
                Some(j) => counts[*j].per_grade[student.grade.index()] += 1,
                None => debug!(
                    "Ignoring choice of unknown activity {} by student {}",
                    activity_id, student
                ),
            }
        }
    }
    counts
}

/// Count the students by their number of assigned activities: Entry `i` of the result is the
/// number of students with exactly `i` activities. The result has at least one entry.
pub fn assigned_count_histogram(students: &[Student], assignment: &Assignment) -> Vec<usize> {
    let mut histogram = vec![0];
    for student in students {
        let count = assignment.activity_count(student.id);
        if histogram.len() <= count {
            histogram.resize(count + 1, 0);
        }
        histogram[count] += 1;
    }
    histogram
}

/// Table of the preference counts and assignment histogram, printable for the command line
pub struct Report<'a> {
    pub activities: &'a [Activity],
    pub preference_counts: Vec<PreferenceCount>,
    pub histogram: Vec<usize>,
}

impl<'a> Report<'a> {
    pub fn new(students: &[Student], activities: &'a [Activity], assignment: &Assignment) -> Self {
        Self {
            activities,
            preference_counts: preference_counts(students, activities),
            histogram: assigned_count_histogram(students, assignment),
        }
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let activities = activity_map(self.activities);
        writeln!(f, "===== Choices per activity =====")?;
        write!(f, "{:<30}", "Activity")?;
        for grade in 1..=NUM_GRADES {
            write!(f, " {:>8}", format!("Grade {}", grade))?;
        }
        writeln!(f, " {:>8}", "Total")?;
        for count in self.preference_counts.iter() {
            let name = activities
                .get(&count.activity)
                .map_or("", |a| a.name.as_str());
            write!(f, "{:<30}", name)?;
            for n in count.per_grade.iter() {
                write!(f, " {:>8}", n)?;
            }
            writeln!(f, " {:>8}", count.total())?;
        }

        writeln!(f, "\n===== Students by number of activities =====")?;
        for (num_activities, num_students) in self.histogram.iter().enumerate() {
            writeln!(f, "{:>3} activities: {}", num_activities, num_students)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::assignment::tests::{
        activity, example_activities, example_assignment, example_students, student,
    };
    use crate::Assignment;

    #[test]
    fn test_preference_counts() {
        let mut students = example_students();
        students.push(student(3, 4, &[1, 5]));
        students[1]
            .preferences
            .insert(1, crate::Preference::Guaranteed);
        let counts = super::preference_counts(&students, &example_activities());

        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].activity, 1);
        assert_eq!(counts[0].per_grade, [1, 1, 0, 1]);
        assert_eq!(counts[0].total(), 3);
        assert_eq!(counts[1].activity, 2);
        assert_eq!(counts[1].per_grade, [1, 1, 0, 0]);
        assert_eq!(counts[1].total(), 2);
    }

    #[test]
    fn test_assigned_count_histogram() {
        let mut students = example_students();
        students.push(student(3, 1, &[1]));
        let histogram = super::assigned_count_histogram(&students, &example_assignment());
        assert_eq!(histogram, vec![1, 1, 1]);

        assert_eq!(
            super::assigned_count_histogram(&students, &Assignment::new()),
            vec![3]
        );
        let histogram = super::assigned_count_histogram(&[], &Assignment::new());
        assert_eq!(histogram, vec![0]);
    }

    #[test]
    fn test_report() {
        let activities = vec![activity(1, 0, None, 0, 4)];
        let students = vec![student(1, 2, &[1])];
        let mut assignment = Assignment::new();
        assignment.assign(1, 1);
        let report = super::Report::new(&students, &activities, &assignment);
        let text = format!("{}", report);
        assert!(text.contains("Activity 1"));
        assert!(text.contains("  1 activities: 1"));
    }
}
