use crate::{Activity, Assignment, Student};
use log::debug;
use serde::{Deserialize, Serialize};

/// The complete persistent state: exactly the three lists below, no further keys.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StateDocument {
    pub students: Vec<Student>,
    pub activities: Vec<Activity>,
    pub assignment: Assignment,
}

/// Read students, activities and assignment from the simple JSON representation (canonical
/// serde_json serialization of `Student`, `Activity` and `Assignment` objects).
///
/// All values are validated while parsing, so invalid grades, timespans, ranks or capacities
/// and inconsistent assignment maps are rejected here.
pub fn read<R: std::io::Read>(reader: R) -> Result<StateDocument, String> {
    let document: StateDocument = serde_json::from_reader(reader).map_err(|e| format!("{}", e))?;
    debug!(
        "Parsed {} students, {} activities and {} assignment edges",
        document.students.len(),
        document.activities.len(),
        document.assignment.num_edges()
    );
    Ok(document)
}

/// Write the state as pretty printed JSON (indented by four spaces) to a Writer (e.g. an output
/// file).
pub fn write<W: std::io::Write>(writer: W, document: &StateDocument) -> Result<(), String> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    document
        .serialize(&mut serializer)
        .map_err(|e| format!("{}", e))?;

    Ok(())
}

#[cfg(test)]
mod test {
    use crate::{Preference, Timespan};

    #[test]
    fn parse_simple_file() {
        let data = include_bytes!("test_ressources/simple_state.json");
        let document = super::read(&data[..]).unwrap();
        let students = &document.students;
        let activities = &document.activities;
        let assignment = &document.assignment;

        assert_eq!(students.len(), 3);
        assert_eq!(activities.len(), 3);
        assert_eq!(students[2].id, 4);
        assert_eq!(students[2].name, "Clara Chamäleon");
        assert_eq!(students[2].grade.get(), 4);
        assert_eq!(students[1].preferences[&2], Preference::Guaranteed);
        assert_eq!(students[0].preferences[&2], Preference::Ranked(2));
        assert_eq!(activities[1].name, "Fußball");
        assert_eq!(activities[1].max_capacity, Some(2));
        assert_eq!(activities[1].valid_grades, [true, true, false, false]);
        assert_eq!(activities[2].max_capacity, None);
        assert_eq!(activities[2].timespan, Timespan::new(152, 160).unwrap());
        assert_eq!(assignment.participants_of(2), vec![1, 2]);
        assert_eq!(assignment.activities_of(4), vec![3]);
        assert!(assignment.check_validity(students, activities).is_empty());
    }

    #[test]
    fn write_simple_file() {
        let data = include_bytes!("test_ressources/simple_state.json");
        let document = super::read(&data[..]).unwrap();

        let mut buffer = Vec::<u8>::new();
        let result = super::write(&mut buffer, &document);
        assert!(result.is_ok());

        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("{\n    \"students\": ["));
        // Non-ASCII characters are written as they are
        assert!(text.contains("Töpfern"));

        let parsed = super::read(&buffer[..]).unwrap();
        assert_eq!(document, parsed);
    }

    #[test]
    fn reject_additional_keys() {
        let data = r#"{"students": [], "activities": [], "version": "1.0",
            "assignment": {"student_activity_map": {}, "activity_student_map": {}}}"#;
        assert!(super::read(data.as_bytes()).is_err());
    }

    #[test]
    fn reject_missing_keys() {
        let data = r#"{"students": [], "activities": []}"#;
        assert!(super::read(data.as_bytes()).is_err());
    }

    #[test]
    fn reject_inconsistent_assignment() {
        let data = r#"{"students": [], "activities": [],
            "assignment": {"student_activity_map": {"1": [2]}, "activity_student_map": {}}}"#;
        let result = super::read(data.as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn reject_invalid_timespan() {
        let data = r#"{"students": [],
            "assignment": {"student_activity_map": {}, "activity_student_map": {}},
            "activities": [{"id": 1, "name": "A", "min_capacity": 0, "max_capacity": null,
                "timespan": {"from_slot": 40, "to_slot": 20},
                "valid_grades": [true, true, true, true]}]}"#;
        assert!(super::read(data.as_bytes()).is_err());
    }
}
