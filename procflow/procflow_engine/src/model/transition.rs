//! Transitions: the business rules describing how an element advances.
//!
//! A transition pairs a *condition* (what happened to the element) with a
//! *transition type* (what the process does next). Only some pairs make
//! sense; [`TransitionCondition::allows`] holds the table. Conditions and
//! types outside the known vocabulary are stored as free text and accept
//! anything.

use procflow_core::id::{ElementId, TransitionId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransitionCondition {
    ApprovedOrRejected,
    Approved,
    Rejected,
    Assigned,
    Filled,
    Other(String),
}

impl TransitionCondition {
    pub fn as_str(&self) -> &str {
        match self {
            TransitionCondition::ApprovedOrRejected => "approved_or_rejected",
            TransitionCondition::Approved => "approved",
            TransitionCondition::Rejected => "rejected",
            TransitionCondition::Assigned => "assigned",
            TransitionCondition::Filled => "filled",
            TransitionCondition::Other(raw) => raw,
        }
    }

    /// Conditions that require an approve/reject decision after the element.
    pub fn is_approval(&self) -> bool {
        matches!(
            self,
            TransitionCondition::ApprovedOrRejected
                | TransitionCondition::Approved
                | TransitionCondition::Rejected
        )
    }

    /// Whether `kind` may be used together with this condition.
    pub fn allows(&self, kind: &TransitionType) -> bool {
        use TransitionType::*;

        if let TransitionType::Other(_) = kind {
            return true;
        }
        match self {
            TransitionCondition::ApprovedOrRejected => {
                matches!(kind, ApproveOrReject | Resolution)
            }
            TransitionCondition::Approved | TransitionCondition::Filled => {
                matches!(kind, Next | SendForReview | SendForApproval | Resolution)
            }
            TransitionCondition::Rejected => matches!(kind, Next | SendForReview | Resolution),
            TransitionCondition::Assigned => matches!(kind, AssignExecutor | Next),
            TransitionCondition::Other(_) => true,
        }
    }
}

impl From<String> for TransitionCondition {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "approved_or_rejected" => TransitionCondition::ApprovedOrRejected,
            "approved" => TransitionCondition::Approved,
            "rejected" => TransitionCondition::Rejected,
            "assigned" => TransitionCondition::Assigned,
            "filled" => TransitionCondition::Filled,
            _ => TransitionCondition::Other(raw),
        }
    }
}

impl From<&str> for TransitionCondition {
    fn from(raw: &str) -> Self {
        TransitionCondition::from(raw.to_string())
    }
}

impl From<TransitionCondition> for String {
    fn from(condition: TransitionCondition) -> Self {
        condition.as_str().to_string()
    }
}

impl fmt::Display for TransitionCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransitionType {
    ApproveOrReject,
    AssignExecutor,
    SendForReview,
    SendForApproval,
    Resolution,
    Next,
    Other(String),
}

impl TransitionType {
    pub fn as_str(&self) -> &str {
        match self {
            TransitionType::ApproveOrReject => "approve_or_reject",
            TransitionType::AssignExecutor => "assign_executor",
            TransitionType::SendForReview => "send_for_review",
            TransitionType::SendForApproval => "send_for_approval",
            TransitionType::Resolution => "resolution",
            TransitionType::Next => "next",
            TransitionType::Other(raw) => raw,
        }
    }
}

impl From<String> for TransitionType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "approve_or_reject" => TransitionType::ApproveOrReject,
            "assign_executor" => TransitionType::AssignExecutor,
            "send_for_review" => TransitionType::SendForReview,
            "send_for_approval" => TransitionType::SendForApproval,
            "resolution" => TransitionType::Resolution,
            "next" => TransitionType::Next,
            _ => TransitionType::Other(raw),
        }
    }
}

impl From<&str> for TransitionType {
    fn from(raw: &str) -> Self {
        TransitionType::from(raw.to_string())
    }
}

impl From<TransitionType> for String {
    fn from(kind: TransitionType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for TransitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transition rule attached to an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub id: TransitionId,

    pub element_id: ElementId,

    pub name: String,

    pub condition: TransitionCondition,

    pub transition_type: TransitionType,

    #[serde(default)]
    pub target_state: Option<String>,

    #[serde(default)]
    pub is_default: bool,

    #[serde(default)]
    pub order: u32,
}

/// Fields accepted when creating a transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionDraft {
    pub name: String,
    pub condition: TransitionCondition,
    pub transition_type: TransitionType,
    #[serde(default)]
    pub target_state: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl TransitionDraft {
    pub fn new(
        name: &str,
        condition: impl Into<TransitionCondition>,
        transition_type: impl Into<TransitionType>,
    ) -> Self {
        Self {
            name: name.to_string(),
            condition: condition.into(),
            transition_type: transition_type.into(),
            target_state: None,
            is_default: false,
        }
    }

    pub(crate) fn into_transition(self, element_id: ElementId, order: u32) -> Transition {
        Transition {
            id: TransitionId::new(),
            element_id,
            name: self.name,
            condition: self.condition,
            transition_type: self.transition_type,
            target_state: self.target_state,
            is_default: self.is_default,
            order,
        }
    }
}

impl From<&Transition> for TransitionDraft {
    fn from(transition: &Transition) -> Self {
        Self {
            name: transition.name.clone(),
            condition: transition.condition.clone(),
            transition_type: transition.transition_type.clone(),
            target_state: transition.target_state.clone(),
            is_default: transition.is_default,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionPatch {
    pub name: Option<String>,
    pub condition: Option<TransitionCondition>,
    pub transition_type: Option<TransitionType>,
    pub target_state: Option<Option<String>>,
    pub is_default: Option<bool>,
}
