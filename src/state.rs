//! The application state: students, activities and the current assignment together with the id
//! allocators of both collections.
//!
//! All modifications go through `State`, which keeps the collections and the assignment in line
//! with each other:
//! * The id allocators continue after the largest existing id whenever a collection changes.
//! * Changing the activities invalidates the assignment, so it is cleared.
//! * Removing an activity also removes it from every student's preferences.
//! * Removing a student removes the student's assignment edges.

use crate::io::simple::StateDocument;
use crate::{Activity, Assignment, Error, Id, IdAllocator, Student};
use log::{debug, info};
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct State {
    students: Vec<Student>,
    activities: Vec<Activity>,
    assignment: Assignment,
    student_ids: IdAllocator,
    activity_ids: IdAllocator,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    pub fn student_ids(&self) -> &IdAllocator {
        &self.student_ids
    }

    pub fn activity_ids(&self) -> &IdAllocator {
        &self.activity_ids
    }

    pub fn student(&self, id: Id) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn activity(&self, id: Id) -> Option<&Activity> {
        self.activities.iter().find(|a| a.id == id)
    }

    /// Remove all students, activities and the assignment and restart both id allocators at 1
    pub fn reset(&mut self) {
        self.students.clear();
        self.activities.clear();
        self.reset_student_ids();
        self.reset_activity_ids();
        self.reset_assignment();
    }

    fn reset_student_ids(&self) {
        self.student_ids
            .reset_after(self.students.iter().map(|s| s.id));
    }

    fn reset_activity_ids(&self) {
        self.activity_ids
            .reset_after(self.activities.iter().map(|a| a.id));
    }

    /// Replace all students. The assignment is kept as it is.
    pub fn set_students(&mut self, students: Vec<Student>) -> Result<(), Error> {
        if let Some(id) = first_duplicate(students.iter().map(|s| s.id)) {
            return Err(Error::DuplicateStudent(id));
        }
        self.students = students;
        self.reset_student_ids();
        Ok(())
    }

    pub fn add_student(&mut self, student: Student) -> Result<(), Error> {
        if self.student(student.id).is_some() {
            return Err(Error::DuplicateStudent(student.id));
        }
        debug!("Adding student {}", student);
        self.students.push(student);
        self.reset_student_ids();
        Ok(())
    }

    /// Create a student without preferences with a fresh id and add it. Returns the new id.
    pub fn new_student(
        &mut self,
        name: impl Into<String>,
        grade: i64,
        subgrade: impl Into<String>,
    ) -> Result<Id, Error> {
        let student = Student::new(&self.student_ids, name, grade, subgrade)?;
        let id = student.id;
        self.add_student(student)?;
        Ok(id)
    }

    /// Remove a student together with all of the student's assignment edges
    pub fn remove_student(&mut self, id: Id) -> Result<Student, Error> {
        let index = self
            .students
            .iter()
            .position(|s| s.id == id)
            .ok_or(Error::UnknownStudent(id))?;
        let student = self.students.remove(index);
        self.assignment.remove_student(id);
        self.reset_student_ids();
        debug!("Removed student {}", student);
        Ok(student)
    }

    /// Drop the preferences of all students. The assignment is cleared as well.
    pub fn reset_preferences(&mut self) {
        for student in self.students.iter_mut() {
            student.preferences.clear();
        }
        self.reset_assignment();
    }

    /// Replace all activities and clear the assignment
    pub fn set_activities(&mut self, activities: Vec<Activity>) -> Result<(), Error> {
        if let Some(id) = first_duplicate(activities.iter().map(|a| a.id)) {
            return Err(Error::DuplicateActivity(id));
        }
        self.activities = activities;
        self.reset_activity_ids();
        self.reset_assignment();
        Ok(())
    }

    pub fn add_activity(&mut self, activity: Activity) -> Result<(), Error> {
        if self.activity(activity.id).is_some() {
            return Err(Error::DuplicateActivity(activity.id));
        }
        debug!("Adding activity {}", activity);
        self.activities.push(activity);
        self.reset_activity_ids();
        self.reset_assignment();
        Ok(())
    }

    /// Create an unrestricted activity with a fresh id and add it. Returns the new id.
    pub fn new_activity(&mut self, name: impl Into<String>) -> Result<Id, Error> {
        let activity = Activity::new(&self.activity_ids, name);
        let id = activity.id;
        self.add_activity(activity)?;
        Ok(id)
    }

    /// Replace the activity with the same id as `activity` and clear the assignment
    pub fn edit_activity(&mut self, activity: Activity) -> Result<(), Error> {
        let existing = self
            .activities
            .iter_mut()
            .find(|a| a.id == activity.id)
            .ok_or(Error::UnknownActivity(activity.id))?;
        *existing = activity;
        self.reset_assignment();
        Ok(())
    }

    /// Remove an activity, drop it from all students' preferences and clear the assignment
    pub fn remove_activity(&mut self, id: Id) -> Result<Activity, Error> {
        let index = self
            .activities
            .iter()
            .position(|a| a.id == id)
            .ok_or(Error::UnknownActivity(id))?;
        let activity = self.activities.remove(index);
        for student in self.students.iter_mut() {
            student.preferences.remove(&id);
        }
        self.reset_activity_ids();
        self.reset_assignment();
        debug!("Removed activity {}", activity);
        Ok(activity)
    }

    pub fn set_assignment(&mut self, assignment: Assignment) {
        self.assignment = assignment;
    }

    pub fn reset_assignment(&mut self) {
        self.assignment = Assignment::new();
    }

    pub fn to_document(&self) -> StateDocument {
        StateDocument {
            students: self.students.clone(),
            activities: self.activities.clone(),
            assignment: self.assignment.clone(),
        }
    }

    /// Build a state from a parsed document. Fails on duplicate student or activity ids.
    pub fn from_document(document: StateDocument) -> Result<Self, Error> {
        let mut state = State::new();
        state.set_students(document.students)?;
        state.set_activities(document.activities)?;
        state.set_assignment(document.assignment);
        Ok(state)
    }

    /// Read a state from its JSON representation (see `io::simple`)
    pub fn read<R: std::io::Read>(reader: R) -> Result<Self, String> {
        let document = crate::io::simple::read(reader)?;
        let state = State::from_document(document).map_err(|e| format!("{}", e))?;
        info!(
            "Read {} students and {} activities",
            state.students.len(),
            state.activities.len()
        );
        Ok(state)
    }

    pub fn write<W: std::io::Write>(&self, writer: W) -> Result<(), String> {
        crate::io::simple::write(writer, &self.to_document())
    }
}

fn first_duplicate<I: IntoIterator<Item = Id>>(ids: I) -> Option<Id> {
    let mut seen = HashSet::new();
    ids.into_iter().find(|id| !seen.insert(*id))
}
