//! Submission model
//!
//! Table: pilot_submissions
//!
//! One submission per session; it records the ambient conditions at the
//! site when the samples were taken.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use pilot_core::{Entity, Id, Identifiable, ProgramScoped, Timestamped};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Airflow {
    #[default]
    Open,
    Closed,
}

impl Airflow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl FromStr for Airflow {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(ParseEnumError::new("airflow", other)),
        }
    }
}

/// Distance at which an odor was noticed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OdorDistance {
    #[serde(rename = "5-10ft")]
    #[default]
    FiveToTen,
    #[serde(rename = "10-25ft")]
    TenToTwentyFive,
    #[serde(rename = "25-50ft")]
    TwentyFiveToFifty,
    #[serde(rename = "50-100ft")]
    FiftyToHundred,
    #[serde(rename = ">100ft")]
    OverHundred,
}

impl OdorDistance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FiveToTen => "5-10ft",
            Self::TenToTwentyFive => "10-25ft",
            Self::TwentyFiveToFifty => "25-50ft",
            Self::FiftyToHundred => "50-100ft",
            Self::OverHundred => ">100ft",
        }
    }
}

impl FromStr for OdorDistance {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "5-10ft" => Ok(Self::FiveToTen),
            "10-25ft" => Ok(Self::TenToTwentyFive),
            "25-50ft" => Ok(Self::TwentyFiveToFifty),
            "50-100ft" => Ok(Self::FiftyToHundred),
            ">100ft" => Ok(Self::OverHundred),
            other => Err(ParseEnumError::new("odor distance", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Clear,
    Cloudy,
    Rain,
}

impl Weather {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Cloudy => "cloudy",
            Self::Rain => "rain",
        }
    }
}

impl FromStr for Weather {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clear" => Ok(Self::Clear),
            "cloudy" => Ok(Self::Cloudy),
            "rain" => Ok(Self::Rain),
            other => Err(ParseEnumError::new("weather", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: Option<Id>,
    pub site_id: Id,
    pub program_id: Id,
    /// Human facing number, assigned by a database sequence
    pub global_submission_id: Option<i64>,
    /// Degrees Fahrenheit
    pub temperature: f64,
    /// Relative humidity, percent
    pub humidity: f64,
    pub airflow: Airflow,
    pub odor_distance: OdorDistance,
    pub weather: Weather,
    pub notes: Option<String>,
    pub created_by_id: Id,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identifiable for Submission {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for Submission {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Entity for Submission {
    const TABLE_NAME: &'static str = "pilot_submissions";
    const TYPE_NAME: &'static str = "Submission";
}

impl ProgramScoped for Submission {
    fn program_id(&self) -> Id {
        self.program_id
    }
}

/// Ambient readings captured when a session is opened
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionDto {
    /// Range checked by the open-session contract
    pub temperature: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "must be between 0 and 100"))]
    pub humidity: f64,
    #[serde(default)]
    pub airflow: Airflow,
    #[serde(default)]
    pub odor_distance: OdorDistance,
    #[serde(default)]
    pub weather: Weather,
    #[validate(length(max = 4000, message = "is too long (maximum is 4000 characters)"))]
    pub notes: Option<String>,
}

impl CreateSubmissionDto {
    pub fn into_submission(self, program_id: Id, site_id: Id, created_by_id: Id) -> Submission {
        Submission {
            id: None,
            site_id,
            program_id,
            global_submission_id: None,
            temperature: self.temperature,
            humidity: self.humidity,
            airflow: self.airflow,
            odor_distance: self.odor_distance,
            weather: self.weather,
            notes: self.notes,
            created_by_id,
            created_at: None,
            updated_at: None,
        }
    }
}
