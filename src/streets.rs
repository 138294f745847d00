use std::collections::{BTreeMap, BTreeSet};

use regex::{NoExpand, Regex, RegexBuilder};
use serde::Deserialize;

use crate::errors::Result;

/// Last word of a street name, optionally followed by a dot.
const STREET_TYPE: &str = r"\b\S+\.?$";

const EXPECTED: [&str; 12] = [
    "Street", "Avenue", "Boulevard", "Drive", "Court", "Place", "Square", "Lane", "Road", "Trail",
    "Parkway", "Commons",
];

const MAPPING: [(&str, &str); 15] = [
    ("St", "Street"),
    ("St.", "Street"),
    ("Ave", "Avenue"),
    ("Ave.", "Avenue"),
    ("Rd", "Road"),
    ("Rd.", "Road"),
    ("Blvd", "Boulevard"),
    ("Blvd.", "Boulevard"),
    ("Dr", "Drive"),
    ("Dr.", "Drive"),
    ("Ct", "Court"),
    ("Pl", "Place"),
    ("Sq", "Square"),
    ("Ln", "Lane"),
    ("Pkwy", "Parkway"),
];

pub fn is_street_name(key: &str) -> bool {
    key == "addr:street"
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StreetAuditConfig {
    /// Street types that are already in their standard form.
    pub expected: Vec<String>,
    /// Non-standard street type -> standard street type.
    pub mapping: BTreeMap<String, String>,
}

impl Default for StreetAuditConfig {
    fn default() -> Self {
        StreetAuditConfig {
            expected: EXPECTED.iter().map(|s| s.to_string()).collect(),
            mapping: MAPPING.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }
}

/// Street types grouped with the names they were seen in.
pub type StreetTypes = BTreeMap<String, BTreeSet<String>>;

pub struct StreetNameAuditor {
    street_type_re: Regex,
    expected: BTreeSet<String>,
    mapping: BTreeMap<String, String>,
}

impl StreetNameAuditor {
    pub fn new(config: &StreetAuditConfig) -> Result<StreetNameAuditor> {
        Ok(StreetNameAuditor {
            street_type_re: RegexBuilder::new(STREET_TYPE).case_insensitive(true).build()?,
            expected: config.expected.iter().cloned().collect(),
            mapping: config.mapping.clone(),
        })
    }

    pub fn street_type<'a>(&self, name: &'a str) -> Option<&'a str> {
        self.street_type_re.find(name).map(|m| m.as_str())
    }

    /// Records `name` under its street type unless the type is already standard.
    pub fn audit(&self, street_types: &mut StreetTypes, name: &str) {
        if let Some(street_type) = self.street_type(name) {
            if !self.expected.contains(street_type) {
                street_types
                    .entry(street_type.to_string())
                    .or_default()
                    .insert(name.to_string());
            }
        }
    }

    /// Capitalizes every word of `name` and replaces a non-standard street type by its
    /// mapped form. Names without a street type come back capitalized only.
    pub fn update_name(&self, name: &str) -> String {
        let name = capwords(name);
        let replacement = self.street_type(&name)
            .filter(|street_type| !self.expected.contains(*street_type))
            .and_then(|street_type| self.mapping.get(street_type));

        match replacement {
            Some(replacement) => self.street_type_re
                .replace(&name, NoExpand(replacement.as_str()))
                .into_owned(),
            None => name,
        }
    }
}

fn capwords(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auditor() -> StreetNameAuditor {
        StreetNameAuditor::new(&StreetAuditConfig::default()).unwrap()
    }

    #[test]
    fn street_type_is_last_word() {
        let auditor = auditor();
        assert_eq!(auditor.street_type("North Main St."), Some("St."));
        assert_eq!(auditor.street_type("Broadway"), Some("Broadway"));
        assert_eq!(auditor.street_type(""), None);
    }

    #[test]
    fn updates_abbreviated_street_types() {
        let auditor = auditor();
        assert_eq!(auditor.update_name("Main St"), "Main Street");
        assert_eq!(auditor.update_name("north first st."), "North First Street");
        assert_eq!(auditor.update_name("Shoreline Blvd"), "Shoreline Boulevard");
        assert_eq!(auditor.update_name("  El   Camino  Real "), "El Camino Real");
        assert_eq!(auditor.update_name("Castro Street"), "Castro Street");
    }

    #[test]
    fn mapping_replacement_is_literal() {
        let mut config = StreetAuditConfig::default();
        config.mapping.insert("Hwy".to_string(), "$1 Highway".to_string());
        let auditor = StreetNameAuditor::new(&config).unwrap();
        assert_eq!(auditor.update_name("Pacific Coast Hwy"), "Pacific Coast $1 Highway");
    }

    #[test]
    fn audit_groups_unexpected_types() {
        let auditor = auditor();
        let mut street_types = StreetTypes::new();
        for name in ["Main St", "Oak St", "Castro Street", "Main St", "Broadway"] {
            auditor.audit(&mut street_types, name);
        }

        assert_eq!(street_types.len(), 2);
        let st: Vec<&str> = street_types["St"].iter().map(String::as_str).collect();
        assert_eq!(st, vec!["Main St", "Oak St"]);
        assert!(street_types.contains_key("Broadway"));
        assert!(!street_types.contains_key("Street"));
    }

    #[test]
    fn only_street_keys_are_audited() {
        assert!(is_street_name("addr:street"));
        assert!(!is_street_name("addr:city"));
        assert!(!is_street_name("street"));
    }
}
