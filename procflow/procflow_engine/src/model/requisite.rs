use procflow_core::id::{ApprovalStageId, ElementId, RequisiteId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::inheritance::InheritanceMeta;

/// Field type whose presence forces an approve/reject decision.
pub const APPROVAL_FIELD: &str = "approval";

/// How the stages of an approval chain are run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExecutionType {
    Sequential,
    Parallel,
    Other(String),
}

impl Default for ExecutionType {
    fn default() -> Self {
        ExecutionType::Sequential
    }
}

impl From<String> for ExecutionType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "sequential" => ExecutionType::Sequential,
            "parallel" => ExecutionType::Parallel,
            _ => ExecutionType::Other(raw),
        }
    }
}

impl From<ExecutionType> for String {
    fn from(kind: ExecutionType) -> Self {
        match kind {
            ExecutionType::Sequential => "sequential".to_string(),
            ExecutionType::Parallel => "parallel".to_string(),
            ExecutionType::Other(raw) => raw,
        }
    }
}

/// One step of an approval chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalStage {
    pub id: ApprovalStageId,
    pub requisite_id: RequisiteId,
    pub name: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub approver_role: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub execution_type: ExecutionType,
    #[serde(default)]
    pub deadline_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalStageDraft {
    pub name: String,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub approver_role: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub execution_type: ExecutionType,
    #[serde(default)]
    pub deadline_days: Option<u32>,
}

impl ApprovalStageDraft {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_required: true,
            approver_role: None,
            department: None,
            execution_type: ExecutionType::default(),
            deadline_days: None,
        }
    }

    pub(crate) fn into_stage(self, requisite_id: RequisiteId, order: u32) -> ApprovalStage {
        ApprovalStage {
            id: ApprovalStageId::new(),
            requisite_id,
            name: self.name,
            order,
            is_required: self.is_required,
            approver_role: self.approver_role,
            department: self.department,
            execution_type: self.execution_type,
            deadline_days: self.deadline_days,
        }
    }
}

impl From<&ApprovalStage> for ApprovalStageDraft {
    fn from(stage: &ApprovalStage) -> Self {
        Self {
            name: stage.name.clone(),
            is_required: stage.is_required,
            approver_role: stage.approver_role.clone(),
            department: stage.department.clone(),
            execution_type: stage.execution_type.clone(),
            deadline_days: stage.deadline_days,
        }
    }
}

/// A form field attached to an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requisite {
    pub id: RequisiteId,

    pub element_id: ElementId,

    pub name: String,

    #[serde(default)]
    pub label: Option<String>,

    pub field_type: String,

    #[serde(default)]
    pub is_required: bool,

    #[serde(default)]
    pub placeholder: Option<String>,

    #[serde(default)]
    pub options: Vec<String>,

    #[serde(default)]
    pub allow_multiple: bool,

    /// Validation rules plus inheritance markers
    #[serde(default)]
    pub validation: InheritanceMeta,

    #[serde(default)]
    pub order: u32,

    #[serde(default)]
    pub approval_stages: Vec<ApprovalStage>,
}

impl Requisite {
    pub fn is_approval(&self) -> bool {
        self.field_type == APPROVAL_FIELD
    }

    /// Reassign stage ids so that a copy shares nothing with its source.
    pub(crate) fn with_fresh_ids(mut self, element_id: ElementId) -> Self {
        self.id = RequisiteId::new();
        self.element_id = element_id;
        for stage in &mut self.approval_stages {
            stage.id = ApprovalStageId::new();
            stage.requisite_id = self.id;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequisiteDraft {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    pub field_type: String,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub allow_multiple: bool,
    #[serde(default)]
    pub validation: Map<String, Value>,
    #[serde(default)]
    pub approval_stages: Vec<ApprovalStageDraft>,
}

impl RequisiteDraft {
    pub fn new(name: &str, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            field_type: field_type.to_string(),
            is_required: false,
            placeholder: None,
            options: Vec::new(),
            allow_multiple: false,
            validation: Map::new(),
            approval_stages: Vec::new(),
        }
    }

    pub(crate) fn into_requisite(self, element_id: ElementId, order: u32) -> Requisite {
        let id = RequisiteId::new();
        let mut validation = InheritanceMeta::default();
        validation.merge(&self.validation);

        let approval_stages = self
            .approval_stages
            .into_iter()
            .enumerate()
            .map(|(i, stage)| stage.into_stage(id, i as u32))
            .collect();

        Requisite {
            id,
            element_id,
            name: self.name,
            label: self.label,
            field_type: self.field_type,
            is_required: self.is_required,
            placeholder: self.placeholder,
            options: self.options,
            allow_multiple: self.allow_multiple,
            validation,
            order,
            approval_stages,
        }
    }
}

impl From<&Requisite> for RequisiteDraft {
    fn from(requisite: &Requisite) -> Self {
        Self {
            name: requisite.name.clone(),
            label: requisite.label.clone(),
            field_type: requisite.field_type.clone(),
            is_required: requisite.is_required,
            placeholder: requisite.placeholder.clone(),
            options: requisite.options.clone(),
            allow_multiple: requisite.allow_multiple,
            validation: requisite.validation.extra.clone(),
            approval_stages: requisite
                .approval_stages
                .iter()
                .map(ApprovalStageDraft::from)
                .collect(),
        }
    }
}

/// Partial update of a requisite.
///
/// `validation` is shallow-merged into the stored document; inheritance
/// markers in it are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequisitePatch {
    pub name: Option<String>,
    pub label: Option<Option<String>>,
    pub field_type: Option<String>,
    pub is_required: Option<bool>,
    pub placeholder: Option<Option<String>>,
    pub options: Option<Vec<String>>,
    pub allow_multiple: Option<bool>,
    pub validation: Option<Map<String, Value>>,
}

impl RequisitePatch {
    pub(crate) fn apply(&self, requisite: &mut Requisite) {
        if let Some(name) = &self.name {
            requisite.name = name.clone();
        }
        if let Some(label) = &self.label {
            requisite.label = label.clone();
        }
        if let Some(field_type) = &self.field_type {
            requisite.field_type = field_type.clone();
        }
        if let Some(is_required) = self.is_required {
            requisite.is_required = is_required;
        }
        if let Some(placeholder) = &self.placeholder {
            requisite.placeholder = placeholder.clone();
        }
        if let Some(options) = &self.options {
            requisite.options = options.clone();
        }
        if let Some(allow_multiple) = self.allow_multiple {
            requisite.allow_multiple = allow_multiple;
        }
        if let Some(validation) = &self.validation {
            requisite.validation.merge(validation);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApprovalStagePatch {
    pub name: Option<String>,
    pub is_required: Option<bool>,
    pub approver_role: Option<Option<String>>,
    pub department: Option<Option<String>>,
    pub execution_type: Option<ExecutionType>,
    pub deadline_days: Option<Option<u32>>,
}
