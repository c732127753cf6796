//! Petri sample model
//!
//! Table: pilot_petri_samples

use std::str::FromStr;

use chrono::{DateTime, Utc};
use pilot_core::{Entity, Id, Identifiable, Timestamped};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::ParseEnumError;

pub const DEFAULT_PLANT_TYPE: &str = "Other Fresh Perishable";

/// How often the area around the sample is watered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WaterSchedule {
    #[default]
    Daily,
    EveryOtherDay,
    EveryThirdDay,
    TwiceDaily,
    ThriceDaily,
}

impl WaterSchedule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::EveryOtherDay => "every_other_day",
            Self::EveryThirdDay => "every_third_day",
            Self::TwiceDaily => "twice_daily",
            Self::ThriceDaily => "thrice_daily",
        }
    }
}

impl FromStr for WaterSchedule {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "every_other_day" => Ok(Self::EveryOtherDay),
            "every_third_day" => Ok(Self::EveryThirdDay),
            "twice_daily" => Ok(Self::TwiceDaily),
            "thrice_daily" => Ok(Self::ThriceDaily),
            other => Err(ParseEnumError::new("water schedule", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetriSample {
    pub id: Option<Id>,
    pub submission_id: Id,
    pub site_id: Id,
    pub petri_code: String,
    pub plant_type: String,
    #[serde(default)]
    pub fungicide_used: bool,
    #[serde(default)]
    pub surrounding_water_schedule: WaterSchedule,
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identifiable for PetriSample {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for PetriSample {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Entity for PetriSample {
    const TABLE_NAME: &'static str = "pilot_petri_samples";
    const TYPE_NAME: &'static str = "PetriSample";
}

impl PetriSample {
    /// A sample counts toward session completion once its photo is attached
    pub fn is_complete(&self) -> bool {
        self.image_url.as_deref().is_some_and(|url| !url.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePetriSampleDto {
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub petri_code: String,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub plant_type: Option<String>,
    #[serde(default)]
    pub fungicide_used: bool,
    #[serde(default)]
    pub surrounding_water_schedule: WaterSchedule,
    #[validate(url(message = "must be a valid URL"))]
    pub image_url: Option<String>,
    pub notes: Option<String>,
}

impl CreatePetriSampleDto {
    pub fn into_sample(self, submission_id: Id, site_id: Id) -> PetriSample {
        PetriSample {
            id: None,
            submission_id,
            site_id,
            petri_code: self.petri_code.trim().to_string(),
            plant_type: self
                .plant_type
                .unwrap_or_else(|| DEFAULT_PLANT_TYPE.to_string()),
            fungicide_used: self.fungicide_used,
            surrounding_water_schedule: self.surrounding_water_schedule,
            image_url: self.image_url,
            notes: self.notes,
            created_at: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePetriSampleDto {
    #[validate(length(min = 1, max = 50, message = "must be between 1 and 50 characters"))]
    pub petri_code: Option<String>,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub plant_type: Option<String>,
    pub fungicide_used: Option<bool>,
    pub surrounding_water_schedule: Option<WaterSchedule>,
    #[validate(url(message = "must be a valid URL"))]
    pub image_url: Option<String>,
    pub notes: Option<String>,
}

impl UpdatePetriSampleDto {
    pub fn apply_to(&self, sample: &mut PetriSample) {
        if let Some(ref code) = self.petri_code {
            sample.petri_code = code.trim().to_string();
        }
        if let Some(ref plant_type) = self.plant_type {
            sample.plant_type = plant_type.clone();
        }
        if let Some(fungicide_used) = self.fungicide_used {
            sample.fungicide_used = fungicide_used;
        }
        if let Some(schedule) = self.surrounding_water_schedule {
            sample.surrounding_water_schedule = schedule;
        }
        if let Some(ref url) = self.image_url {
            sample.image_url = Some(url.clone());
        }
        if let Some(ref notes) = self.notes {
            sample.notes = Some(notes.clone());
        }
    }
}
