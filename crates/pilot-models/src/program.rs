//! Program model
//!
//! Table: pilot_programs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use pilot_core::{Clock, DateRange, Entity, Id, Identifiable, Timestamped};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::progress::ProgramProgress;
use crate::validation::ParseEnumError;

/// Program status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProgramStatus {
    #[default]
    Active,
    Inactive,
}

impl ProgramStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for ProgramStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgramStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(ParseEnumError::new("program status", other)),
        }
    }
}

/// A pilot program: a trial or campaign running between two calendar dates.
///
/// `total_sites` and `total_submissions` are counted by the repository when
/// the row is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: Option<Id>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProgramStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub total_sites: i64,
    #[serde(default)]
    pub total_submissions: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identifiable for Program {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for Program {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Entity for Program {
    const TABLE_NAME: &'static str = "pilot_programs";
    const TYPE_NAME: &'static str = "Program";
}

impl Program {
    pub fn new(name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
            status: ProgramStatus::Active,
            start_date,
            end_date,
            total_sites: 0,
            total_submissions: 0,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    pub fn is_active(&self) -> bool {
        self.status == ProgramStatus::Active
    }

    pub fn progress(&self, clock: &dyn Clock) -> ProgramProgress {
        ProgramProgress::now(self.date_range(), clock)
    }

    /// Attach freshly computed progress fields
    pub fn with_progress(self, clock: &dyn Clock) -> ProgramWithProgress {
        let progress = self.progress(clock);
        ProgramWithProgress {
            program: self,
            progress,
        }
    }
}

/// A program as returned to readers: stored attributes plus derived progress
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramWithProgress {
    #[serde(flatten)]
    pub program: Program,
    #[serde(flatten)]
    pub progress: ProgramProgress,
}

/// DTO for creating a program
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProgramDto {
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub name: String,
    #[validate(length(max = 10000, message = "is too long (maximum is 10000 characters)"))]
    pub description: Option<String>,
    pub status: Option<ProgramStatus>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl From<CreateProgramDto> for Program {
    fn from(dto: CreateProgramDto) -> Self {
        Self {
            description: dto.description,
            status: dto.status.unwrap_or_default(),
            ..Program::new(dto.name, dto.start_date, dto.end_date)
        }
    }
}

/// DTO for updating a program
#[derive(Debug, Clone, Deserialize, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgramDto {
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProgramStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl UpdateProgramDto {
    /// Apply updates to a program
    pub fn apply_to(&self, program: &mut Program) {
        if let Some(ref name) = self.name {
            program.name = name.clone();
        }
        if let Some(ref description) = self.description {
            program.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            program.status = status;
        }
        if let Some(start_date) = self.start_date {
            program.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            program.end_date = end_date;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }
}
