use procflow_core::id::{ElementId, NotificationId};
use serde::{Deserialize, Serialize};

/// A message sent when something happens at an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub element_id: ElementId,
    pub name: String,
    pub trigger: String,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub order: u32,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDraft {
    pub name: String,
    pub trigger: String,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl NotificationDraft {
    pub fn new(name: &str, trigger: &str) -> Self {
        Self {
            name: name.to_string(),
            trigger: trigger.to_string(),
            template: None,
            recipients: Vec::new(),
            is_active: true,
        }
    }

    pub(crate) fn into_notification(self, element_id: ElementId, order: u32) -> Notification {
        Notification {
            id: NotificationId::new(),
            element_id,
            name: self.name,
            trigger: self.trigger,
            template: self.template,
            recipients: self.recipients,
            is_active: self.is_active,
            order,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationPatch {
    pub name: Option<String>,
    pub trigger: Option<String>,
    pub template: Option<Option<String>>,
    pub recipients: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl NotificationPatch {
    pub(crate) fn apply(&self, notification: &mut Notification) {
        if let Some(name) = &self.name {
            notification.name = name.clone();
        }
        if let Some(trigger) = &self.trigger {
            notification.trigger = trigger.clone();
        }
        if let Some(template) = &self.template {
            notification.template = template.clone();
        }
        if let Some(recipients) = &self.recipients {
            notification.recipients = recipients.clone();
        }
        if let Some(is_active) = self.is_active {
            notification.is_active = is_active;
        }
    }
}
