//! Parsed component descriptors
//!
//! Two input shapes reach the compiler: `ParsedComponent`, where the
//! device tier is given as three flags, and `ExtractedComponent`, the shape
//! emitted by AI extraction where the tier is a single `type` string.

use serde::{Deserialize, Serialize};

/// One protective device read from a panel schematic
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedComponent {
    /// Reference code, e.g. "Q2.1"
    pub repere: String,
    pub designation: String,
    /// Rating as printed, e.g. "25A / 30mA"
    pub protection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_repere: Option<String>,
    #[serde(default)]
    pub is_main_breaker: bool,
    #[serde(default)]
    pub is_differential: bool,
    #[serde(default)]
    pub is_final_circuit: bool,
}

impl ParsedComponent {
    pub fn new(
        repere: impl Into<String>,
        designation: impl Into<String>,
        protection: impl Into<String>,
    ) -> Self {
        Self {
            repere: repere.into(),
            designation: designation.into(),
            protection: protection.into(),
            ..Self::default()
        }
    }

    pub fn main_breaker(mut self) -> Self {
        self.is_main_breaker = true;
        self
    }

    pub fn differential(mut self) -> Self {
        self.is_differential = true;
        self
    }

    pub fn final_circuit(mut self) -> Self {
        self.is_final_circuit = true;
        self
    }

    pub fn with_parent(mut self, parent_repere: impl Into<String>) -> Self {
        self.parent_repere = Some(parent_repere.into());
        self
    }

    pub fn with_cable(mut self, cable: impl Into<String>) -> Self {
        self.cable = Some(cable.into());
        self
    }

    /// Display label used for generated nodes and states
    pub fn label(&self) -> String {
        let designation = self.designation.trim();
        if designation.is_empty() {
            self.repere.clone()
        } else {
            format!("{} {}", self.repere, designation)
        }
    }
}

/// A flat device list, as handed to the compiler
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSchematic {
    pub components: Vec<ParsedComponent>,
}

impl ParsedSchematic {
    pub fn new(components: Vec<ParsedComponent>) -> Self {
        Self { components }
    }
}

impl From<Vec<ExtractedComponent>> for ParsedSchematic {
    fn from(extracted: Vec<ExtractedComponent>) -> Self {
        Self {
            components: extracted.into_iter().map(ParsedComponent::from).collect(),
        }
    }
}

/// Device tier as labelled by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    MainBreaker,
    Differential,
    FinalCircuit,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Component shape produced by AI extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedComponent {
    pub repere: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default)]
    pub protection: String,
    #[serde(default)]
    pub cable: Option<String>,
    #[serde(default)]
    pub parent_repere: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: ComponentKind,
}

impl From<ExtractedComponent> for ParsedComponent {
    fn from(c: ExtractedComponent) -> Self {
        Self {
            repere: c.repere,
            designation: c.designation,
            protection: c.protection,
            cable: c.cable.filter(|s| !s.trim().is_empty()),
            parent_repere: c.parent_repere.filter(|s| !s.trim().is_empty()),
            is_main_breaker: c.kind == ComponentKind::MainBreaker,
            is_differential: c.kind == ComponentKind::Differential,
            is_final_circuit: c.kind == ComponentKind::FinalCircuit,
        }
    }
}

/// Either accepted file layout for a component list
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ComponentsDocument {
    Parsed(ParsedSchematic),
    Extracted(Vec<ExtractedComponent>),
}

impl From<ComponentsDocument> for ParsedSchematic {
    fn from(doc: ComponentsDocument) -> Self {
        match doc {
            ComponentsDocument::Parsed(parsed) => parsed,
            ComponentsDocument::Extracted(extracted) => extracted.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracted_type_maps_to_flags() {
        let json = r#"[
            {"repere": "Q1", "designation": "General", "protection": "40A", "type": "main_breaker"},
            {"repere": "Q2", "designation": "RCD", "protection": "40A/30mA", "type": "differential"},
            {"repere": "Q2.1", "designation": "Lights", "protection": "10A", "parentRepere": "Q2", "cable": "1.5mm2", "type": "final_circuit"},
            {"repere": "X1", "designation": "Terminal", "protection": "", "type": "terminal_block"}
        ]"#;
        let doc: ComponentsDocument = serde_json::from_str(json).unwrap();
        let parsed = ParsedSchematic::from(doc);

        assert_eq!(parsed.components.len(), 4);
        assert!(parsed.components[0].is_main_breaker);
        assert!(parsed.components[1].is_differential);
        let lights = &parsed.components[2];
        assert!(lights.is_final_circuit);
        assert_eq!(lights.parent_repere.as_deref(), Some("Q2"));
        assert_eq!(lights.cable.as_deref(), Some("1.5mm2"));

        let terminal = &parsed.components[3];
        assert!(!terminal.is_main_breaker && !terminal.is_differential && !terminal.is_final_circuit);
    }

    #[test]
    fn test_blank_parent_treated_as_absent() {
        let extracted = ExtractedComponent {
            repere: "Q3".to_string(),
            designation: "Oven".to_string(),
            protection: "32A".to_string(),
            cable: Some("  ".to_string()),
            parent_repere: Some(String::new()),
            kind: ComponentKind::FinalCircuit,
        };
        let parsed = ParsedComponent::from(extracted);
        assert_eq!(parsed.parent_repere, None);
        assert_eq!(parsed.cable, None);
    }

    #[test]
    fn test_parsed_document_with_flags() {
        let json = r#"{"components": [
            {"repere": "Q1", "designation": "Main", "protection": "63A", "isMainBreaker": true}
        ]}"#;
        let doc: ComponentsDocument = serde_json::from_str(json).unwrap();
        let parsed = ParsedSchematic::from(doc);
        assert!(parsed.components[0].is_main_breaker);
        assert!(!parsed.components[0].is_final_circuit);
    }

    #[test]
    fn test_label() {
        assert_eq!(ParsedComponent::new("Q4", "Sockets", "16A").label(), "Q4 Sockets");
        assert_eq!(ParsedComponent::new("Q4", " ", "16A").label(), "Q4");
    }
}
