//! Batch, subject, and lecture requirement models.
//!
//! A batch (student group) takes a set of subjects, each taught by one
//! faculty member for a fixed number of sessions per week. The solver
//! does not work on batches directly: each weekly session becomes one
//! [`LectureRequirement`], the variable of the constraint problem.

use serde::{Deserialize, Serialize};

/// A subject taught to a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Unique subject identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Weekly session count.
    pub lectures_per_week: u32,
    /// Length of one session in minutes.
    pub lecture_duration_minutes: i64,
    /// Faculty member teaching this subject.
    pub faculty_id: String,
}

impl Subject {
    /// Creates a subject with one 60-minute session per week.
    pub fn new(id: impl Into<String>, faculty_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            lectures_per_week: 1,
            lecture_duration_minutes: 60,
            faculty_id: faculty_id.into(),
        }
    }

    /// Sets the subject name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the weekly session count.
    pub fn with_lectures_per_week(mut self, count: u32) -> Self {
        self.lectures_per_week = count;
        self
    }

    /// Sets the session length in minutes.
    pub fn with_duration(mut self, minutes: i64) -> Self {
        self.lecture_duration_minutes = minutes;
        self
    }
}

/// A student group with its subject list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// Unique batch identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Subjects this batch takes.
    pub subjects: Vec<Subject>,
}

impl Batch {
    /// Creates an empty batch.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            subjects: Vec::new(),
        }
    }

    /// Sets the batch name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a subject.
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.push(subject);
        self
    }

    /// Total weekly sessions across all subjects.
    pub fn weekly_sessions(&self) -> u32 {
        self.subjects.iter().map(|s| s.lectures_per_week).sum()
    }
}

/// One weekly session to place: the variable of the search.
///
/// A subject needing three sessions per week yields three requirements
/// with the same batch/subject/faculty identity. `id` is the
/// requirement's index in the expanded list and doubles as its domain
/// index in the solver arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LectureRequirement {
    /// Index of this requirement in the expanded, ordered list.
    pub id: usize,
    /// Batch attending the session.
    pub batch_id: String,
    /// Subject being taught.
    pub subject_id: String,
    /// Faculty member teaching.
    pub faculty_id: String,
    /// Session length in minutes.
    pub duration_minutes: i64,
}

impl LectureRequirement {
    /// Expands batches into per-session requirements in search order.
    ///
    /// Ordering: duration descending, then faculty id ascending, so the
    /// hardest-to-place sessions are tried first and equal-length
    /// sessions group by teacher. Ids are assigned after ordering.
    pub fn expand(batches: &[Batch]) -> Vec<LectureRequirement> {
        let mut requirements: Vec<LectureRequirement> = Vec::new();
        for batch in batches {
            for subject in &batch.subjects {
                for _ in 0..subject.lectures_per_week {
                    requirements.push(LectureRequirement {
                        id: 0,
                        batch_id: batch.id.clone(),
                        subject_id: subject.id.clone(),
                        faculty_id: subject.faculty_id.clone(),
                        duration_minutes: subject.lecture_duration_minutes,
                    });
                }
            }
        }

        requirements.sort_by(|a, b| {
            b.duration_minutes
                .cmp(&a.duration_minutes)
                .then_with(|| a.faculty_id.cmp(&b.faculty_id))
        });
        for (i, r) in requirements.iter_mut().enumerate() {
            r.id = i;
        }
        requirements
    }

    /// Short label for log and conflict messages.
    pub fn label(&self) -> String {
        format!("{}/{} ({})", self.batch_id, self.subject_id, self.faculty_id)
    }
}
