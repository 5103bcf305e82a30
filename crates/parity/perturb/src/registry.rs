//! Static parameter registry.
//!
//! Declares, per family, which attributes exist and how each one may be
//! perturbed. Adding a family is adding an entry; nothing is discovered at
//! runtime.

use std::collections::BTreeMap;
use std::path::Path;

use parity_types::load_model;
use serde::{Deserialize, Serialize};

use crate::error::PerturbResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// A single numeric value.
    Numeric,
    /// Numbered values (`k1`, `k2`, ...); perturbed at index 1.
    Indexed,
    /// Free text or mapped data; skipped with a warning.
    Text,
    /// Identifiers, patterns and versions; never perturbed.
    Inert,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub name: String,
    pub kind: AttributeKind,
}

impl AttributeDescriptor {
    pub fn new(name: &str, kind: AttributeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }

    /// Name of the attribute actually perturbed.
    pub fn perturbed_name(&self) -> String {
        match self.kind {
            AttributeKind::Indexed => format!("{}1", self.name),
            _ => self.name.clone(),
        }
    }

    pub fn is_perturbable(&self) -> bool {
        matches!(self.kind, AttributeKind::Numeric | AttributeKind::Indexed)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyDescriptor {
    /// Element tag of parameter entries; `None` for families without entries.
    #[serde(default)]
    pub tag: Option<String>,
    /// Active for every input regardless of labels.
    #[serde(default)]
    pub always_active: bool,
    #[serde(default)]
    pub family_attributes: Vec<AttributeDescriptor>,
    #[serde(default)]
    pub parameter_attributes: Vec<AttributeDescriptor>,
}

impl FamilyDescriptor {
    pub fn new(tag: Option<&str>) -> Self {
        Self {
            tag: tag.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn always_active(mut self) -> Self {
        self.always_active = true;
        self
    }

    pub fn family(mut self, name: &str, kind: AttributeKind) -> Self {
        self.family_attributes.push(AttributeDescriptor::new(name, kind));
        self
    }

    pub fn parameter(mut self, name: &str, kind: AttributeKind) -> Self {
        self.parameter_attributes.push(AttributeDescriptor::new(name, kind));
        self
    }

    fn families(self, names: &[&str], kind: AttributeKind) -> Self {
        names.iter().fold(self, |d, name| d.family(name, kind))
    }

    fn parameters(self, names: &[&str], kind: AttributeKind) -> Self {
        names.iter().fold(self, |d, name| d.parameter(name, kind))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterRegistry {
    families: BTreeMap<String, FamilyDescriptor>,
}

impl ParameterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_family(mut self, name: &str, descriptor: FamilyDescriptor) -> Self {
        self.families.insert(name.to_string(), descriptor);
        self
    }

    pub fn family(&self, name: &str) -> Option<&FamilyDescriptor> {
        self.families.get(name)
    }

    pub fn families(&self) -> impl Iterator<Item = (&str, &FamilyDescriptor)> {
        self.families.iter().map(|(name, d)| (name.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    pub fn load(path: impl AsRef<Path>) -> PerturbResult<Self> {
        Ok(load_model(path)?)
    }

    /// Paths of every numeric or indexed attribute, indexed ones without
    /// their index suffix.
    pub fn perturbable_attributes(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (name, family) in &self.families {
            for attr in family.family_attributes.iter().filter(|a| a.is_perturbable()) {
                out.push(format!("{}/{}", name, attr.name));
            }
            if let Some(tag) = &family.tag {
                for attr in family.parameter_attributes.iter().filter(|a| a.is_perturbable()) {
                    out.push(format!("{}/{}/{}", name, tag, attr.name));
                }
            }
        }
        out
    }

    /// Molecular-mechanics force field families.
    pub fn builtin() -> Self {
        use AttributeKind::*;

        let ids = ["smirks", "id", "parent_id"];
        let scales = ["scale12", "scale13", "scale14", "scale15"];

        Self::new()
            .with_family(
                "Bonds",
                FamilyDescriptor::new(Some("Bond"))
                    .families(&["version"], Inert)
                    .families(&["potential", "fractional_bondorder_method", "fractional_bondorder_interpolation"], Text)
                    .parameters(&ids, Inert)
                    .parameters(&["length", "k"], Numeric)
                    .parameters(&["k_bondorder", "length_bondorder"], Text),
            )
            .with_family(
                "Angles",
                FamilyDescriptor::new(Some("Angle"))
                    .families(&["version"], Inert)
                    .families(&["potential"], Text)
                    .parameters(&ids, Inert)
                    .parameters(&["angle", "k"], Numeric),
            )
            .with_family(
                "ProperTorsions",
                FamilyDescriptor::new(Some("Proper"))
                    .families(&["version"], Inert)
                    .families(&["potential", "default_idivf", "fractional_bondorder_method"], Text)
                    .parameters(&ids, Inert)
                    .parameters(&["periodicity", "phase", "k", "idivf"], Indexed)
                    .parameters(&["k_bondorder"], Text),
            )
            .with_family(
                "ImproperTorsions",
                FamilyDescriptor::new(Some("Improper"))
                    .families(&["version"], Inert)
                    .families(&["potential", "default_idivf"], Text)
                    .parameters(&ids, Inert)
                    .parameters(&["periodicity", "phase", "k", "idivf"], Indexed),
            )
            .with_family(
                "vdW",
                FamilyDescriptor::new(Some("Atom"))
                    .families(&["version"], Inert)
                    .families(&["potential", "combining_rules", "method", "periodic_method", "nonperiodic_method"], Text)
                    .families(&scales, Numeric)
                    .families(&["cutoff", "switch_width"], Numeric)
                    .parameters(&ids, Inert)
                    .parameters(&["epsilon", "sigma", "rmin_half"], Numeric),
            )
            .with_family(
                "Electrostatics",
                FamilyDescriptor::new(None)
                    .always_active()
                    .families(&["version"], Inert)
                    .families(&["method", "periodic_potential", "nonperiodic_potential"], Text)
                    .families(&scales, Numeric)
                    .families(&["cutoff", "switch_width"], Numeric),
            )
            .with_family(
                "Constraints",
                FamilyDescriptor::new(Some("Constraint"))
                    .families(&["version"], Inert)
                    .parameters(&ids, Inert)
                    .parameters(&["distance"], Numeric),
            )
            .with_family(
                "LibraryCharges",
                FamilyDescriptor::new(Some("LibraryCharge"))
                    .families(&["version"], Inert)
                    .parameters(&ids, Inert)
                    .parameters(&["name"], Inert)
                    .parameters(&["charge"], Indexed),
            )
            .with_family(
                "ToolkitAM1BCC",
                FamilyDescriptor::new(None)
                    .always_active()
                    .families(&["version"], Inert),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_families() {
        let registry = ParameterRegistry::builtin();
        assert_eq!(registry.len(), 9);
        assert!(registry.family("Electrostatics").unwrap().always_active);
        assert!(!registry.family("vdW").unwrap().always_active);
        assert_eq!(registry.family("Bonds").unwrap().tag.as_deref(), Some("Bond"));
    }

    #[test]
    fn perturbable_attributes_exclude_inert_and_text() {
        let paths = ParameterRegistry::builtin().perturbable_attributes();
        assert!(paths.contains(&"Bonds/Bond/length".to_string()));
        assert!(paths.contains(&"ProperTorsions/Proper/k".to_string()));
        assert!(paths.contains(&"vdW/scale14".to_string()));
        assert!(!paths.iter().any(|p| p.ends_with("smirks") || p.ends_with("version")));
        assert!(!paths.contains(&"Bonds/potential".to_string()));
    }

    #[test]
    fn indexed_names() {
        let attr = AttributeDescriptor::new("k", AttributeKind::Indexed);
        assert_eq!(attr.perturbed_name(), "k1");
        assert_eq!(AttributeDescriptor::new("k", AttributeKind::Numeric).perturbed_name(), "k");
    }

    #[test]
    fn loads_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.yaml");
        std::fs::write(
            &path,
            "Bonds:\n  tag: Bond\n  parameter_attributes:\n    - {name: length, kind: numeric}\n    - {name: smirks, kind: inert}\n",
        )
        .unwrap();
        let registry = ParameterRegistry::load(&path).unwrap();
        assert_eq!(registry.perturbable_attributes(), vec!["Bonds/Bond/length".to_string()]);
    }
}
