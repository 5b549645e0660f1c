//! Plaintext record kinds.
//!
//! Every kind shares the same envelope shape once encrypted. The serialized
//! form is tagged with `kind` so a decrypted payload identifies itself.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminator for record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Task,
    Note,
    Course,
    FileKey,
}

impl RecordKind {
    /// Wire name of the kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Task => "task",
            RecordKind::Note => "note",
            RecordKind::Course => "course",
            RecordKind::FileKey => "file_key",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// Task workflow status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

/// A to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub title: String,
    pub description: String,
    pub notes: String,
    pub priority: Priority,
    pub status: TaskStatus,
    /// Calendar date (`YYYY-MM-DD`), if the task has one.
    pub due_date: Option<String>,
}

/// A free-form note, optionally filed in a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub title: String,
    pub content: String,
    pub folder_id: Option<String>,
}

/// A grade record for one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRecord {
    pub name: String,
    pub code: String,
    pub term: String,
    pub grade: Option<String>,
    pub credits: u32,
}

/// Metadata and key reference for an uploaded file. The file bytes travel
/// separately; only this descriptor goes through the record envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileKeyRecord {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub folder_id: Option<String>,
}

/// A plaintext record of any kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Task(TaskRecord),
    Note(NoteRecord),
    Course(CourseRecord),
    FileKey(FileKeyRecord),
}

impl Record {
    /// The kind of this record.
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Task(_) => RecordKind::Task,
            Record::Note(_) => RecordKind::Note,
            Record::Course(_) => RecordKind::Course,
            Record::FileKey(_) => RecordKind::FileKey,
        }
    }
}

impl From<TaskRecord> for Record {
    fn from(r: TaskRecord) -> Self {
        Record::Task(r)
    }
}

impl From<NoteRecord> for Record {
    fn from(r: NoteRecord) -> Self {
        Record::Note(r)
    }
}

impl From<CourseRecord> for Record {
    fn from(r: CourseRecord) -> Self {
        Record::Course(r)
    }
}

impl From<FileKeyRecord> for Record {
    fn from(r: FileKeyRecord) -> Self {
        Record::FileKey(r)
    }
}
