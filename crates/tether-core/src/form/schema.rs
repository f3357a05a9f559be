//! Form schemas: a builder for code and a serde document for data files.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::rules::FieldRules;
use crate::error::{TetherError, TetherResult};

/// Declaration of one field.
#[derive(Debug, Clone, Default)]
pub struct FieldSpec {
    pub initial_value: Option<Value>,
    pub rules: FieldRules,
}

impl FieldSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    pub fn rules(mut self, rules: FieldRules) -> Self {
        self.rules = rules;
        self
    }

    /// Value a field starts from and is reset to. Absent means `""`.
    pub fn effective_initial(&self) -> Value {
        self.initial_value.clone().unwrap_or_else(|| Value::String(String::new()))
    }
}

/// Ordered set of field declarations.
#[derive(Debug, Clone, Default)]
pub struct FormSchema {
    fields: Vec<(String, FieldSpec)>,
}

impl FormSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field. Declaring a name twice replaces the earlier declaration.
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = spec,
            None => self.fields.push((name, spec)),
        }
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, spec)| spec)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build from a declarative document. Fields are ordered by name.
    pub fn from_document(document: SchemaDocument) -> TetherResult<Self> {
        let mut schema = Self::new();
        for (name, field) in document {
            let rules = match field.rules {
                Some(rules) => rules.compile(&name)?,
                None => FieldRules::default(),
            };
            schema = schema.field(
                name,
                FieldSpec {
                    initial_value: field.initial_value,
                    rules,
                },
            );
        }
        Ok(schema)
    }

    pub fn from_json(content: &str) -> TetherResult<Self> {
        let document: SchemaDocument = serde_json::from_str(content)?;
        Self::from_document(document)
    }
}

/// `{ fieldName: { initialValue?, rules? } }`
pub type SchemaDocument = BTreeMap<String, FieldDocument>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDocument {
    #[serde(default)]
    pub initial_value: Option<Value>,
    #[serde(default)]
    pub rules: Option<RulesDocument>,
}

/// Data form of [`FieldRules`]. Custom predicates can only be attached in code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RulesDocument {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
}

impl RulesDocument {
    fn compile(self, field: &str) -> TetherResult<FieldRules> {
        let pattern = self
            .pattern
            .map(|p| {
                Regex::new(&p).map_err(|e| {
                    TetherError::config_with_context(
                        format!("Invalid pattern for field '{}': {}", field, e),
                        format!("Compiling pattern '{}'", p),
                    )
                })
            })
            .transpose()?;
        Ok(FieldRules {
            required: self.required,
            min_length: self.min_length,
            max_length: self.max_length,
            pattern,
            custom: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_keeps_declaration_order() {
        let schema = FormSchema::new()
            .field("zip", FieldSpec::new())
            .field("age", FieldSpec::new().initial(18))
            .field("zip", FieldSpec::new().initial("00000"));
        let names: Vec<&str> = schema.fields().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zip", "age"]);
        assert_eq!(schema.get("zip").unwrap().effective_initial(), json!("00000"));
    }

    #[test]
    fn test_missing_initial_value_is_empty_string() {
        assert_eq!(FieldSpec::new().effective_initial(), json!(""));
    }

    #[test]
    fn test_from_json_document() {
        let schema = FormSchema::from_json(
            r#"{
                "email": { "rules": { "required": true, "pattern": "^[^@]+@[^@]+$" } },
                "nickname": { "initialValue": "anon", "rules": { "maxLength": 8 } },
                "bio": {}
            }"#,
        )
        .unwrap();

        assert_eq!(schema.len(), 3);
        let email = schema.get("email").unwrap();
        assert!(email.rules.required);
        assert!(email.rules.pattern.as_ref().unwrap().is_match("a@b.c"));
        assert_eq!(schema.get("nickname").unwrap().rules.max_length, Some(8));
        assert!(schema.get("bio").unwrap().rules.is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let err = FormSchema::from_json(r#"{ "code": { "rules": { "pattern": "([a-z" } } }"#).unwrap_err();
        match err {
            TetherError::Config { message, .. } => assert!(message.contains("code")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
