use procflow_core::id::{ElementId, RoleId};
use serde::{Deserialize, Serialize};

/// Who participates in an element and with which rights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: RoleId,
    pub element_id: ElementId,
    pub name: String,
    /// Unique within the owning element
    pub role_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub can_approve: bool,
    #[serde(default)]
    pub can_reject: bool,
    #[serde(default)]
    pub can_register: bool,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDraft {
    pub name: String,
    pub role_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub can_edit: bool,
    #[serde(default)]
    pub can_approve: bool,
    #[serde(default)]
    pub can_reject: bool,
    #[serde(default)]
    pub can_register: bool,
}

impl RoleDraft {
    pub fn new(name: &str, role_type: &str) -> Self {
        Self {
            name: name.to_string(),
            role_type: role_type.to_string(),
            description: None,
            is_required: false,
            can_edit: false,
            can_approve: false,
            can_reject: false,
            can_register: false,
        }
    }

    pub(crate) fn into_role(self, element_id: ElementId, order: u32) -> Role {
        Role {
            id: RoleId::new(),
            element_id,
            name: self.name,
            role_type: self.role_type,
            description: self.description,
            is_required: self.is_required,
            can_edit: self.can_edit,
            can_approve: self.can_approve,
            can_reject: self.can_reject,
            can_register: self.can_register,
            order,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RolePatch {
    pub name: Option<String>,
    pub role_type: Option<String>,
    pub description: Option<Option<String>>,
    pub is_required: Option<bool>,
    pub can_edit: Option<bool>,
    pub can_approve: Option<bool>,
    pub can_reject: Option<bool>,
    pub can_register: Option<bool>,
}

impl RolePatch {
    pub(crate) fn apply(&self, role: &mut Role) {
        if let Some(name) = &self.name {
            role.name = name.clone();
        }
        if let Some(role_type) = &self.role_type {
            role.role_type = role_type.clone();
        }
        if let Some(description) = &self.description {
            role.description = description.clone();
        }
        if let Some(v) = self.is_required {
            role.is_required = v;
        }
        if let Some(v) = self.can_edit {
            role.can_edit = v;
        }
        if let Some(v) = self.can_approve {
            role.can_approve = v;
        }
        if let Some(v) = self.can_reject {
            role.can_reject = v;
        }
        if let Some(v) = self.can_register {
            role.can_register = v;
        }
    }
}
