use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pipeline::processing::dates::FuzzyDate;
use crate::pipeline::processing::normalize::NormalizedPlace;

/// The two record kinds the bulk importer accepts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ImportType {
    Persons,
    Events,
}

impl fmt::Display for ImportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportType::Persons => write!(f, "persons"),
            ImportType::Events => write!(f, "events"),
        }
    }
}

/// A person record as it arrives in a bulk import payload. All date fields
/// are free-text strings, not pre-parsed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPersonRecord {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<String>,
    pub birth_place: Option<String>,
    pub death_date: Option<String>,
    pub death_place: Option<String>,
    pub notes: Option<String>,
}

/// An event record as it arrives in a bulk import payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEventRecord {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub end_date: Option<String>,
    pub location: Option<String>,
}

/// The slice of an existing record that duplicate detection compares
/// against: identifier, display name, primary date and place key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub id: Uuid,
    pub name: String,
    pub date: Option<FuzzyDate>,
    pub place: Option<String>,
}

/// A person after validation and normalization, ready for the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedPerson {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<FuzzyDate>,
    pub birth_place: Option<NormalizedPlace>,
    pub death_date: Option<FuzzyDate>,
    pub death_place: Option<NormalizedPlace>,
    pub notes: Option<String>,
}

impl NormalizedPerson {
    /// Display name used for matching and snapshots: "first last" with
    /// missing parts elided.
    pub fn display_name(&self) -> String {
        let mut parts = Vec::new();
        if let Some(first) = self.first_name.as_deref() {
            parts.push(first);
        }
        if let Some(last) = self.last_name.as_deref() {
            parts.push(last);
        }
        parts.join(" ")
    }
}

/// An event after validation and normalization, ready for the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub title: String,
    pub description: Option<String>,
    pub date: Option<FuzzyDate>,
    pub end_date: Option<FuzzyDate>,
    pub location: Option<NormalizedPlace>,
}

/// The canonical entities the import pipeline hands to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NormalizedEntity {
    Person(NormalizedPerson),
    Event(NormalizedEvent),
}

impl NormalizedEntity {
    /// The snapshot duplicate detection will see once this entity is stored
    /// under `id`. Persons are keyed by birth date/place, events by their
    /// start date and location.
    pub fn snapshot(&self, id: Uuid) -> RecordSnapshot {
        match self {
            NormalizedEntity::Person(person) => RecordSnapshot {
                id,
                name: person.display_name(),
                date: person.birth_date.clone(),
                place: person.birth_place.as_ref().map(|p| p.original.clone()),
            },
            NormalizedEntity::Event(event) => RecordSnapshot {
                id,
                name: event.title.clone(),
                date: event.date.clone(),
                place: event.location.as_ref().map(|p| p.original.clone()),
            },
        }
    }

    pub fn import_type(&self) -> ImportType {
        match self {
            NormalizedEntity::Person(_) => ImportType::Persons,
            NormalizedEntity::Event(_) => ImportType::Events,
        }
    }
}
