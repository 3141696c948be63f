//! Rescue-training candidate presets.
//!
//! # Responsibility
//! - Encode the dog profiles shelter staff search for by rescue discipline.
//! - Produce query-language filters usable by any `DocumentStore`.
//!
//! # Invariants
//! - Sex and breed criteria match case-insensitively.
//! - Age bounds are inclusive and expressed in weeks.

use crate::store::case_insensitive;
use mongodb::bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Rescue discipline a dog may be trained for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RescueType {
    Water,
    Mountain,
    Disaster,
}

impl RescueType {
    pub const ALL: [RescueType; 3] = [Self::Water, Self::Mountain, Self::Disaster];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Mountain => "mountain",
            Self::Disaster => "disaster",
        }
    }

    /// Expected `sex_upon_outcome` value.
    pub fn sex_upon_outcome(self) -> &'static str {
        match self {
            Self::Water => "Intact Female",
            Self::Mountain | Self::Disaster => "Intact Male",
        }
    }

    /// Accepted `age_upon_outcome_in_weeks` range.
    pub fn age_weeks(self) -> RangeInclusive<i64> {
        match self {
            Self::Water | Self::Mountain => 26..=156,
            Self::Disaster => 20..=300,
        }
    }

    pub fn breeds(self) -> &'static [&'static str] {
        match self {
            Self::Water => &[
                "Labrador Retriever",
                "Chesapeake Bay Retriever",
                "Newfoundland",
            ],
            Self::Mountain => &[
                "German Shepherd",
                "Alaskan Malamute",
                "Old English Sheepdog",
                "Siberian Husky",
                "Rottweiler",
            ],
            Self::Disaster => &[
                "Doberman Pinscher",
                "German Shepherd",
                "Golden Retriever",
                "Bloodhound",
                "Rottweiler",
            ],
        }
    }

    /// Filter selecting dogs that fit this rescue profile.
    pub fn filter(self) -> Document {
        let breeds: Vec<Bson> = self
            .breeds()
            .iter()
            .map(|breed| case_insensitive(regex::escape(breed)))
            .collect();
        let ages = self.age_weeks();
        let (min_weeks, max_weeks) = (*ages.start(), *ages.end());

        doc! {
            "animal_type": "Dog",
            "sex_upon_outcome": case_insensitive(regex::escape(self.sex_upon_outcome())),
            "age_upon_outcome_in_weeks": { "$gte": min_weeks, "$lte": max_weeks },
            "breed": { "$in": breeds },
        }
    }
}

impl Display for RescueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRescueType(pub String);

impl Display for UnknownRescueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown rescue type `{}`; expected water|mountain|disaster",
            self.0
        )
    }
}

impl Error for UnknownRescueType {}

impl FromStr for RescueType {
    type Err = UnknownRescueType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "water" => Ok(Self::Water),
            "mountain" => Ok(Self::Mountain),
            "disaster" => Ok(Self::Disaster),
            _ => Err(UnknownRescueType(value.to_string())),
        }
    }
}
