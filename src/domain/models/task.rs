//! Task domain model.
//!
//! A task is the single record kind the service manages. Identifiers are
//! assigned by the record store on insert and never change afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A committed task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Scheduling date.
    pub date: DateTime<Utc>,
    /// Done / not done.
    pub status: bool,
}

/// A task that has not been stored yet, so has no identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub status: bool,
}

impl NewTask {
    pub fn new(title: impl Into<String>, description: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            date,
            status: false,
        }
    }

    pub const fn with_status(mut self, status: bool) -> Self {
        self.status = status;
        self
    }

    /// Attach the identifier the store assigned.
    pub fn into_task(self, id: i64) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            date: self.date,
            status: self.status,
        }
    }
}

/// A partial update. `None` means "leave the field as it is"; an empty
/// string is an explicit clear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<bool>,
}

/// One supplied field of a [`TaskPatch`], ready to be bound to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldUpdate<'a> {
    Title(&'a str),
    Description(&'a str),
    Date(DateTime<Utc>),
    Status(bool),
}

impl FieldUpdate<'_> {
    /// Column this update writes.
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Title(_) => "title",
            Self::Description(_) => "description",
            Self::Date(_) => "date",
            Self::Status(_) => "status",
        }
    }
}

impl TaskPatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub const fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub const fn status(mut self, status: bool) -> Self {
        self.status = Some(status);
        self
    }

    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.status.is_none()
    }

    /// The supplied fields, in fixed column order.
    pub fn updates(&self) -> Vec<FieldUpdate<'_>> {
        let mut updates = Vec::with_capacity(4);
        if let Some(title) = &self.title {
            updates.push(FieldUpdate::Title(title));
        }
        if let Some(description) = &self.description {
            updates.push(FieldUpdate::Description(description));
        }
        if let Some(date) = self.date {
            updates.push(FieldUpdate::Date(date));
        }
        if let Some(status) = self.status {
            updates.push(FieldUpdate::Status(status));
        }
        updates
    }

    /// Overwrite only the supplied fields of `task`.
    pub fn apply_to(&self, task: &mut Task) {
        for update in self.updates() {
            match update {
                FieldUpdate::Title(title) => title.clone_into(&mut task.title),
                FieldUpdate::Description(description) => {
                    description.clone_into(&mut task.description);
                }
                FieldUpdate::Date(date) => task.date = date,
                FieldUpdate::Status(status) => task.status = status,
            }
        }
    }
}

/// The list-shaped reads the service answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskQuery {
    All,
    ByStatus(bool),
    ByDateAndStatus { date: DateTime<Utc>, status: bool },
}

impl TaskQuery {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::ByStatus(status) => task.status == *status,
            Self::ByDateAndStatus { date, status } => task.date == *date && task.status == *status,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::ByStatus(_) => "by_status",
            Self::ByDateAndStatus { .. } => "by_date_and_status",
        }
    }
}
