pub mod simple;

use crate::{student_map, Activity, Assignment, Preference, Student};

/// Format the assignment into a human readable String (e.g. to print it to stdout).
///
/// The output format will look like
/// ```text
/// ===== Chess (Monday, 08:00 - 09:30) =====
/// Anton Ameise (1a)
/// Berta Biber (2b) (guaranteed)
///
/// ===== Pottery (Tuesday, 14:00 - 15:00) =====
///
/// ===== A third activity (Friday, 13:00 - 14:00) =====
/// …
/// ```
pub fn format_assignment(
    assignment: &Assignment,
    students: &[Student],
    activities: &[Activity],
) -> String {
    let students_by_id = student_map(students);
    let mut result = String::new();
    for activity in activities.iter() {
        result.push_str(&format!("\n===== {} =====\n", activity));
        for student_id in assignment.participants_of(activity.id) {
            match students_by_id.get(&student_id) {
                Some(student) => {
                    let guaranteed =
                        student.preferences.get(&activity.id) == Some(&Preference::Guaranteed);
                    result.push_str(&format!(
                        "{}{}\n",
                        student,
                        if guaranteed { " (guaranteed)" } else { "" }
                    ));
                }
                None => result.push_str(&format!("unknown student {}\n", student_id)),
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use crate::assignment::tests::{example_activities, example_assignment, example_students};
    use crate::Preference;

    #[test]
    fn test_format_assignment() {
        let mut students = example_students();
        students[1].name = String::from("Berta");
        students[1].subgrade = String::from("b");
        students[1].preferences.insert(2, Preference::Guaranteed);
        let mut assignment = example_assignment();
        assignment.assign(9, 1);

        let text = super::format_assignment(&assignment, &students, &example_activities());
        assert_eq!(
            text,
            "\n===== Activity 1 (Monday, 08:00 - 09:30) =====\n\
             Student 1 (1a)\n\
             unknown student 9\n\
             \n===== Activity 2 (Monday, 10:00 - 11:00) =====\n\
             Student 1 (1a)\n\
             Berta (2b) (guaranteed)\n"
        );
    }
}
