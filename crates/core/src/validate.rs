use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

use crate::entry::Role;
use crate::omit::find_null_paths;

const REQUIRED_FIELDS: [&str; 5] = ["id", "speaker", "role", "text", "safetext"];

#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("entry {index} is not a JSON object")]
    NotAnObject { index: usize },
    #[error("entry {index}: missing required field: {field}")]
    MissingField { index: usize, field: String },
    #[error("entry {index}: unknown role: {role}")]
    UnknownRole { index: usize, role: String },
    #[error("entry {index}: null value at {pointer}")]
    NullValue { index: usize, pointer: String },
    #[error("duplicate id: {id}")]
    DuplicateId { id: String },
}

/// Validate exported entries by composing independent validators.
pub fn validate_entries(values: &[Value]) -> Result<(), Vec<ValidationError>> {
    let validators: &[fn(&[Value]) -> Vec<ValidationError>] = &[
        validate_shape,
        validate_roles,
        validate_no_nulls,
        validate_unique_ids,
    ];

    let errors: Vec<ValidationError> = validators.iter().flat_map(|v| v(values)).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_shape(values: &[Value]) -> Vec<ValidationError> {
    values
        .iter()
        .enumerate()
        .flat_map(|(index, value)| match value.as_object() {
            None => vec![ValidationError::NotAnObject { index }],
            Some(object) => REQUIRED_FIELDS
                .iter()
                .filter(|field| !object.contains_key(**field))
                .map(|field| ValidationError::MissingField {
                    index,
                    field: field.to_string(),
                })
                .collect(),
        })
        .collect()
}

fn validate_roles(values: &[Value]) -> Vec<ValidationError> {
    values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let role = value.get("role")?;
            let known = role.as_str().and_then(Role::from_label).is_some();
            if known {
                None
            } else {
                Some(ValidationError::UnknownRole {
                    index,
                    role: role.to_string(),
                })
            }
        })
        .collect()
}

fn validate_no_nulls(values: &[Value]) -> Vec<ValidationError> {
    values
        .iter()
        .enumerate()
        .flat_map(|(index, value)| {
            find_null_paths(value)
                .into_iter()
                .map(move |pointer| ValidationError::NullValue { index, pointer })
        })
        .collect()
}

fn validate_unique_ids(values: &[Value]) -> Vec<ValidationError> {
    let mut seen = HashSet::new();
    values
        .iter()
        .filter_map(|value| value.get("id").and_then(Value::as_str))
        .filter_map(|id| {
            if seen.insert(id) {
                None
            } else {
                Some(ValidationError::DuplicateId { id: id.to_string() })
            }
        })
        .collect()
}
