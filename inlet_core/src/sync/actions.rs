//! Record actions and the form-id rules derived from them.

use crate::{Error, Result};

/// A named operation exposed by a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordAction {
    pub key: &'static str,
    pub name: &'static str,
}

/// The built-in actions backed by default forms. Any other action key refers
/// to a custom form and needs an instance key to select the object it
/// operates on.
pub const RECORD_ACTIONS: &[RecordAction] = &[
    RecordAction {
        key: "get-leads",
        name: "Leads",
    },
    RecordAction {
        key: "get-AI_Engagement_Conversation__c",
        name: "AI Engagement Conversation",
    },
];

/// The form id embedded in an action key (`get-leads` → `leads`).
pub fn form_id(action_key: &str) -> &str {
    action_key.strip_prefix("get-").unwrap_or(action_key)
}

/// A custom form is any action whose form id is not backed by a default
/// action.
pub fn is_custom_form(action_key: &str) -> bool {
    let id = form_id(action_key);
    !RECORD_ACTIONS
        .iter()
        .any(|action| form_id(action.key) == id)
}

/// The record type an action reads or writes: the instance key for custom
/// forms (which therefore require one), the action key itself otherwise.
pub fn resolve_record_type(action_key: &str, instance_key: Option<&str>) -> Result<String> {
    let action_key = action_key.trim();
    if action_key.is_empty() {
        return Err(Error::InvalidInput("action key is required".to_string()));
    }

    if is_custom_form(action_key) {
        let instance = instance_key
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                Error::InvalidInput("instance key is required for custom forms".to_string())
            })?;
        return Ok(instance.to_string());
    }

    Ok(action_key.to_string())
}

/// Key for the alternate data-source read path. `get-objects` reads whatever
/// object the instance key selects; other actions read the data source named
/// by their form id.
pub fn data_source_key(action_key: &str, instance_key: Option<&str>) -> Option<String> {
    if action_key == "get-objects" {
        return instance_key
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
    }
    let key = form_id(action_key).trim();
    if key.is_empty() {
        return None;
    }
    Some(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_actions_are_not_custom_forms() {
        assert!(!is_custom_form("get-leads"));
        assert!(!is_custom_form("get-AI_Engagement_Conversation__c"));
        assert!(is_custom_form("get-objects"));
        assert!(is_custom_form("get-Opportunity__c"));
    }

    #[test]
    fn custom_forms_require_instance_key() {
        assert!(resolve_record_type("get-Opportunity__c", None).is_err());
        assert_eq!(
            resolve_record_type("get-Opportunity__c", Some("Opportunity__c")).expect("resolved"),
            "Opportunity__c"
        );
        assert_eq!(
            resolve_record_type("get-leads", None).expect("resolved"),
            "get-leads"
        );
    }

    #[test]
    fn data_source_key_rules() {
        assert_eq!(
            data_source_key("get-leads", None).as_deref(),
            Some("leads")
        );
        assert_eq!(
            data_source_key("get-objects", Some("Opportunity__c")).as_deref(),
            Some("Opportunity__c")
        );
        assert_eq!(data_source_key("get-objects", None), None);
        assert_eq!(data_source_key("get-objects", Some("  ")), None);
    }
}
