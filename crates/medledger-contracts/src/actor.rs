//! Actor identity types.
//!
//! Every transaction names up to three actors: the creator who submitted it,
//! the patient it concerns, and the organization acting on the patient's
//! behalf.  Only the creator is mandatory.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of party performing or affected by a ledger operation.
///
/// `Unknown` is the zero-value sentinel: it is what an absent or
/// unrecognised field decodes to, and it is never accepted on a creator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorKind {
    #[default]
    Unknown,
    Hospital,
    Patient,
    Insurer,
    Admin,
}

impl ActorKind {
    /// Stable upper-case name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorKind::Unknown => "UNKNOWN",
            ActorKind::Hospital => "HOSPITAL",
            ActorKind::Patient => "PATIENT",
            ActorKind::Insurer => "INSURER",
            ActorKind::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One party referenced by a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorPayload {
    /// What kind of party this is.
    #[serde(default)]
    pub kind: ActorKind,
    /// Stable identifier, unique within `kind`.
    #[serde(default)]
    pub id: String,
    /// Display name shown in operation summaries.
    #[serde(default)]
    pub name: String,
}

impl ActorPayload {
    pub fn new(kind: ActorKind, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            name: name.into(),
        }
    }
}
