//! Site model
//!
//! Table: pilot_sites

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use pilot_core::{Entity, Id, Identifiable, ProgramScoped, Timestamped};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SiteType {
    #[default]
    Greenhouse,
    Storage,
    Transport,
    ProductionFacility,
}

impl SiteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greenhouse => "greenhouse",
            Self::Storage => "storage",
            Self::Transport => "transport",
            Self::ProductionFacility => "production_facility",
        }
    }
}

impl fmt::Display for SiteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SiteType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greenhouse" => Ok(Self::Greenhouse),
            "storage" => Ok(Self::Storage),
            "transport" => Ok(Self::Transport),
            "production_facility" => Ok(Self::ProductionFacility),
            other => Err(ParseEnumError::new("site type", other)),
        }
    }
}

/// A physical location enrolled in a program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: Option<Id>,
    pub program_id: Id,
    pub name: String,
    #[serde(default)]
    pub site_type: SiteType,
    pub description: Option<String>,
    /// Petri samples every submission at this site is expected to carry
    #[serde(default)]
    pub total_petris: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identifiable for Site {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Timestamped for Site {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Entity for Site {
    const TABLE_NAME: &'static str = "pilot_sites";
    const TYPE_NAME: &'static str = "Site";
}

impl ProgramScoped for Site {
    fn program_id(&self) -> Id {
        self.program_id
    }
}

impl Site {
    pub fn new(program_id: Id, name: impl Into<String>) -> Self {
        Self {
            id: None,
            program_id,
            name: name.into(),
            site_type: SiteType::default(),
            description: None,
            total_petris: 0,
            created_at: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSiteDto {
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub name: String,
    pub site_type: Option<SiteType>,
    pub description: Option<String>,
    #[validate(range(min = 0, max = 1000, message = "must be between 0 and 1000"))]
    pub total_petris: Option<i32>,
}

impl CreateSiteDto {
    pub fn into_site(self, program_id: Id) -> Site {
        Site {
            site_type: self.site_type.unwrap_or_default(),
            description: self.description,
            total_petris: self.total_petris.unwrap_or(0),
            ..Site::new(program_id, self.name)
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSiteDto {
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub name: Option<String>,
    pub site_type: Option<SiteType>,
    pub description: Option<String>,
    #[validate(range(min = 0, max = 1000, message = "must be between 0 and 1000"))]
    pub total_petris: Option<i32>,
}

impl UpdateSiteDto {
    pub fn apply_to(&self, site: &mut Site) {
        if let Some(ref name) = self.name {
            site.name = name.clone();
        }
        if let Some(site_type) = self.site_type {
            site.site_type = site_type;
        }
        if let Some(ref description) = self.description {
            site.description = Some(description.clone());
        }
        if let Some(total_petris) = self.total_petris {
            site.total_petris = total_petris;
        }
    }
}
