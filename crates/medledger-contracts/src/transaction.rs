//! Caller-supplied transaction payloads.
//!
//! A `Transaction` is shaped by the domain services (patient, hospital,
//! insurer APIs) and handed to AddLog.  The ledger never interprets
//! `details`; it only requires it to be non-empty.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actor::ActorPayload;

/// The state-changing action a transaction records.
///
/// `Unknown` is the zero-value sentinel and is rejected by AddLog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    #[default]
    Unknown,
    AddRecord,
    UpdateRecord,
    ViewRecord,
    GrantAccess,
    RevokeAccess,
    RegisterPatient,
    RegisterHospital,
    SubmitClaim,
    ApproveClaim,
    RejectClaim,
    UpdateProfile,
}

impl Operation {
    /// Stable upper-case name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Unknown => "UNKNOWN",
            Operation::AddRecord => "ADD_RECORD",
            Operation::UpdateRecord => "UPDATE_RECORD",
            Operation::ViewRecord => "VIEW_RECORD",
            Operation::GrantAccess => "GRANT_ACCESS",
            Operation::RevokeAccess => "REVOKE_ACCESS",
            Operation::RegisterPatient => "REGISTER_PATIENT",
            Operation::RegisterHospital => "REGISTER_HOSPITAL",
            Operation::SubmitClaim => "SUBMIT_CLAIM",
            Operation::ApproveClaim => "APPROVE_CLAIM",
            Operation::RejectClaim => "REJECT_CLAIM",
            Operation::UpdateProfile => "UPDATE_PROFILE",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The payload of one ledger entry, immutable once submitted.
///
/// Actor fields are optional to mirror the wire shape: a missing creator is
/// a validation failure, while a missing patient or organization simply
/// contributes an empty identifier to the chain hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub operation: Operation,
    #[serde(default)]
    pub creator: Option<ActorPayload>,
    #[serde(default)]
    pub patient: Option<ActorPayload>,
    #[serde(default)]
    pub organization: Option<ActorPayload>,
    /// Opaque operation-specific body, usually an inner encoded message.
    #[serde(default)]
    pub details: Vec<u8>,
}

impl Transaction {
    /// Identifier of the creator, or `""` when absent.
    pub fn creator_id(&self) -> &str {
        self.creator.as_ref().map(|a| a.id.as_str()).unwrap_or_default()
    }

    /// Identifier of the patient, or `""` when absent.
    pub fn patient_id(&self) -> &str {
        self.patient.as_ref().map(|a| a.id.as_str()).unwrap_or_default()
    }

    /// Identifier of the organization, or `""` when absent.
    pub fn organization_id(&self) -> &str {
        self.organization
            .as_ref()
            .map(|a| a.id.as_str())
            .unwrap_or_default()
    }
}
