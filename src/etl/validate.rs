use jsonschema::Validator;
use serde_json::Value;

use crate::data::records::ShapedElement;
use crate::errors::{Error, ErrorKind, Result};

const SCHEMA_JSON: &str = include_str!("../../schema/osm_tables.json");

/// Checks shaped elements against the table schema before they are written.
pub struct RecordValidator {
    node: Validator,
    way: Validator,
}

fn compile(definitions: &Value, root: &str) -> Result<Validator> {
    let sub_schema = serde_json::json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "$ref": format!("#/definitions/{}", root),
        "definitions": definitions,
    });
    Validator::new(&sub_schema)
        .map_err(|e| Error::new(ErrorKind::Config, format!("failed to compile schema {}: {}", root, e)))
}

impl RecordValidator {
    pub fn new() -> Result<Self> {
        let full_schema: Value = serde_json::from_str(SCHEMA_JSON)?;
        let definitions = &full_schema["definitions"];

        Ok(RecordValidator {
            node: compile(definitions, "node_element")?,
            way: compile(definitions, "way_element")?,
        })
    }

    pub fn validate(&self, shaped: &ShapedElement) -> Result<()> {
        let (validator, value) = match shaped {
            ShapedElement::Node(node) => (&self.node, serde_json::to_value(node)),
            ShapedElement::Way(way) => (&self.way, serde_json::to_value(way)),
        };
        let value = value.map_err(|e| Error::new(ErrorKind::SchemaValidation, e.to_string()))?;

        let errors: Vec<String> = validator
            .iter_errors(&value)
            .map(|e| {
                let path = e.instance_path().to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", path, e)
                }
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::schema(shaped.kind_name(), &errors))
        }
    }
}
