//! Hardcoded default schemas.
//!
//! These seed a customer's schema on first read/write and define the
//! protected field set: a field named here cannot be deleted from the
//! customer's schema for that record type.

use crate::schema::models::FieldProperty;
use std::collections::BTreeMap;

/// Seed material for one record type.
#[derive(Debug, Clone)]
pub struct DefaultSchema {
    pub properties: BTreeMap<String, FieldProperty>,
    pub required: Vec<String>,
}

fn text(title: &str) -> FieldProperty {
    FieldProperty {
        type_name: "string".to_string(),
        title: title.to_string(),
        format: None,
        options: None,
        default: None,
    }
}

fn formatted(title: &str, format: &str) -> FieldProperty {
    FieldProperty {
        format: Some(format.to_string()),
        ..text(title)
    }
}

fn select(title: &str, options: &[&str]) -> FieldProperty {
    FieldProperty {
        options: Some(options.iter().map(|s| s.to_string()).collect()),
        ..text(title)
    }
}

fn select_with_default(title: &str, options: &[&str], default: &str) -> FieldProperty {
    FieldProperty {
        default: Some(default.to_string()),
        ..select(title, options)
    }
}

/// The default schema for a record type, when one is defined.
pub fn default_schema(record_type: &str) -> Option<DefaultSchema> {
    match record_type {
        "contacts" => Some(contacts()),
        "companies" => Some(companies()),
        "tasks" => Some(tasks()),
        "leads" => Some(leads()),
        "AI_Engagement_Conversation__c" => Some(engagement_conversation()),
        _ => None,
    }
}

/// Field names that cannot be deleted for the given record type.
pub fn protected_fields(record_type: &str) -> Vec<String> {
    default_schema(record_type)
        .map(|schema| schema.properties.keys().cloned().collect())
        .unwrap_or_default()
}

fn contacts() -> DefaultSchema {
    let mut properties = BTreeMap::new();
    properties.insert("id".to_string(), text("ID"));
    properties.insert("name".to_string(), text("Name"));
    properties.insert("email".to_string(), formatted("Email", "email"));
    properties.insert("phone".to_string(), formatted("Phone Number", "phone"));
    properties.insert(
        "status".to_string(),
        select_with_default("Status", &["Active", "Inactive", "Pending"], "Active"),
    );
    DefaultSchema {
        properties,
        required: vec!["id".to_string(), "name".to_string(), "email".to_string()],
    }
}

fn companies() -> DefaultSchema {
    let mut properties = BTreeMap::new();
    properties.insert("id".to_string(), text("ID"));
    properties.insert("name".to_string(), text("Company Name"));
    properties.insert("website".to_string(), formatted("Website", "uri"));
    properties.insert(
        "industry".to_string(),
        select(
            "Industry",
            &[
                "Technology",
                "Healthcare",
                "Finance",
                "Manufacturing",
                "Retail",
                "Other",
            ],
        ),
    );
    properties.insert(
        "size".to_string(),
        select(
            "Company Size",
            &["1-10", "11-50", "51-200", "201-500", "501-1000", "1000+"],
        ),
    );
    DefaultSchema {
        properties,
        required: vec!["id".to_string(), "name".to_string()],
    }
}

fn tasks() -> DefaultSchema {
    let mut properties = BTreeMap::new();
    properties.insert("id".to_string(), text("ID"));
    properties.insert("name".to_string(), text("Name"));
    properties.insert("taskName".to_string(), text("Task Name"));
    properties.insert("description".to_string(), text("Description"));
    properties.insert(
        "status".to_string(),
        select(
            "Status",
            &["Not Started", "In Progress", "Completed", "Deferred"],
        ),
    );
    properties.insert(
        "priority".to_string(),
        select("Priority", &["Low", "Medium", "High", "Urgent"]),
    );
    properties.insert("dueDate".to_string(), formatted("Due Date", "date"));
    properties.insert("assignedTo".to_string(), text("Assigned To"));
    DefaultSchema {
        properties,
        required: vec![
            "id".to_string(),
            "name".to_string(),
            "taskName".to_string(),
        ],
    }
}

fn leads() -> DefaultSchema {
    let mut properties = BTreeMap::new();
    properties.insert("Id".to_string(), text("ID"));
    properties.insert("FirstName".to_string(), text("First Name"));
    properties.insert("LastName".to_string(), text("Last Name"));
    properties.insert(
        "Management_Level__c".to_string(),
        text("Management Level"),
    );
    properties.insert("Email".to_string(), formatted("Email", "email"));
    properties.insert("AccountId".to_string(), text("Account ID"));
    properties.insert("Title".to_string(), text("Title"));
    properties.insert(
        "Account_Corporate_Country__c".to_string(),
        text("Account Corporate Country"),
    );
    properties.insert(
        "State_Province_Marketo__c".to_string(),
        text("State Province Marketo"),
    );
    properties.insert(
        "Last_Touch_Offer__c".to_string(),
        text("Last Touch Offer"),
    );
    properties.insert(
        "Last_Touch_Solution__c".to_string(),
        text("Last Touch Solution"),
    );
    properties.insert("Contact_Status__c".to_string(), text("Contact Status"));
    properties.insert(
        "Contact_Owner_Name__c".to_string(),
        text("Contact Owner Name"),
    );
    properties.insert(
        "contactProfileFit6sense__c".to_string(),
        text("Contact Profile Fit 6sense"),
    );
    properties.insert(
        "account6QA6sense__c".to_string(),
        text("Account 6QA 6sense"),
    );
    properties.insert(
        "accountProfileFit6sense__c".to_string(),
        text("Account Profile Fit 6sense"),
    );
    properties.insert(
        "accountBuyingStage6sense__c".to_string(),
        text("Account Buying Stage 6sense"),
    );
    properties.insert(
        "lead6sense_Segments__c".to_string(),
        text("Lead 6sense Segments"),
    );
    properties.insert("Marketo_Id__c".to_string(), text("Marketo ID"));
    properties.insert("X18_Digit_Id__c".to_string(), text("18 Digit ID"));
    properties.insert(
        "Account_Owner_Full_Name__c".to_string(),
        text("Account Owner Full Name"),
    );
    properties.insert("Pain_Point__c".to_string(), text("Pain Point"));
    properties.insert("Top_Priority__c".to_string(), text("Top Priority"));
    properties.insert(
        "Purchase_Timeline__c".to_string(),
        text("Purchase Timeline"),
    );
    DefaultSchema {
        properties,
        required: vec!["Id".to_string()],
    }
}

fn engagement_conversation() -> DefaultSchema {
    let mut properties = BTreeMap::new();
    properties.insert("Lead__c".to_string(), text("Lead"));
    properties.insert("Email__c".to_string(), formatted("Email", "email"));
    DefaultSchema {
        properties,
        required: vec![],
    }
}

/// Forms every customer starts with.
pub fn default_forms() -> Vec<(&'static str, &'static str)> {
    vec![
        ("leads", "Leads"),
        ("AI_Engagement_Conversation__c", "AI Engagement Conversation"),
    ]
}
