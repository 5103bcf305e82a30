//! Enumeration of single-parameter perturbations.

use parity_types::Perturbation;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::parameters::{Attributes, ParameterSet};
use crate::registry::{AttributeDescriptor, AttributeKind, ParameterRegistry};
use crate::strategy::PerturbationStrategy;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Enumeration {
    pub perturbations: Vec<Perturbation>,
    pub warnings: Vec<String>,
}

impl Enumeration {
    fn visit(
        &mut self,
        prefix: &str,
        descriptors: &[AttributeDescriptor],
        values: &Attributes,
        strategy: &dyn PerturbationStrategy,
    ) {
        for descriptor in descriptors {
            let name = descriptor.perturbed_name();
            let path = format!("{}/{}", prefix, name);
            match descriptor.kind {
                AttributeKind::Inert => continue,
                AttributeKind::Text => {
                    self.warnings
                        .push(format!("skipping {} - unsupported attribute type", path));
                }
                AttributeKind::Numeric | AttributeKind::Indexed => {
                    match strategy.perturb(&path, values.get(&name)) {
                        Ok(perturbation) => self.perturbations.push(perturbation),
                        Err(reason) => self.warnings.push(format!("skipping {} - {}", path, reason)),
                    }
                }
            }
        }
    }
}

/// Every perturbation the registry allows for `parameters`.
pub fn enumerate_perturbations(
    parameters: &ParameterSet,
    registry: &ParameterRegistry,
    strategy: &dyn PerturbationStrategy,
) -> Enumeration {
    enumerate_where(parameters, registry, strategy, |_| true)
}

/// Like [`enumerate_perturbations`], restricted to families accepted by `include`.
pub fn enumerate_where<F>(
    parameters: &ParameterSet,
    registry: &ParameterRegistry,
    strategy: &dyn PerturbationStrategy,
    include: F,
) -> Enumeration
where
    F: Fn(&str) -> bool,
{
    let mut out = Enumeration::default();
    for (name, descriptor) in registry.families() {
        if !include(name) {
            continue;
        }
        let Some(family) = parameters.family(name) else {
            out.warnings
                .push(format!("skipping {} - {} not in parameter set", name, name));
            continue;
        };

        out.visit(name, &descriptor.family_attributes, &family.attributes, strategy);

        let Some(tag) = &descriptor.tag else {
            continue;
        };
        let prefix = format!("{}/{}", name, tag);
        match family.parameters.first() {
            Some(entry) => out.visit(&prefix, &descriptor.parameter_attributes, entry, strategy),
            None if descriptor.parameter_attributes.iter().any(|a| a.is_perturbable()) => {
                out.warnings
                    .push(format!("skipping {} - no parameter entries", prefix));
            }
            None => {}
        }
    }
    debug!(
        perturbations = out.perturbations.len(),
        warnings = out.warnings.len(),
        "enumerated perturbations"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::{ParameterFamily, ParameterValue};
    use crate::registry::FamilyDescriptor;
    use crate::strategy::DefaultPerturbation;
    use parity_types::Scalar;

    fn parameters() -> ParameterSet {
        let mut bond = Attributes::new();
        bond.insert("smirks".into(), "[#6:1]-[#1:2]".into());
        bond.insert("length".into(), ParameterValue::quantity(1.09, "angstrom"));
        bond.insert("k".into(), ParameterValue::quantity(680.0, "kilocalorie / mole / angstrom ** 2"));

        let mut proper = Attributes::new();
        proper.insert("periodicity1".into(), ParameterValue::from(3i64));
        proper.insert("phase1".into(), ParameterValue::quantity(0.0, "degree"));
        proper.insert("k1".into(), ParameterValue::quantity(0.15, "kilocalorie / mole"));

        ParameterSet::new()
            .with_family(
                "Bonds",
                ParameterFamily::new()
                    .with_attribute("version", "0.4")
                    .with_attribute("potential", "harmonic")
                    .with_parameter(bond),
            )
            .with_family(
                "ProperTorsions",
                ParameterFamily::new()
                    .with_attribute("default_idivf", "auto")
                    .with_parameter(proper),
            )
            .with_family("Constraints", ParameterFamily::new())
    }

    #[test]
    fn enumerates_numeric_and_indexed() {
        let registry = ParameterRegistry::builtin();
        let result = enumerate_perturbations(&parameters(), &registry, &DefaultPerturbation::new());
        let paths: Vec<&str> = result.perturbations.iter().map(|p| p.path.as_str()).collect();
        assert!(paths.contains(&"Bonds/Bond/length"));
        assert!(paths.contains(&"Bonds/Bond/k"));
        assert!(paths.contains(&"ProperTorsions/Proper/k1"));
        assert!(paths.contains(&"ProperTorsions/Proper/periodicity1"));
        assert!(!paths.iter().any(|p| p.ends_with("smirks") || p.ends_with("version")));

        let periodicity = result
            .perturbations
            .iter()
            .find(|p| p.path == "ProperTorsions/Proper/periodicity1")
            .unwrap();
        assert_eq!(periodicity.new_value, Scalar::Int(4));
    }

    #[test]
    fn warns_for_everything_skipped() {
        let registry = ParameterRegistry::builtin();
        let result = enumerate_perturbations(&parameters(), &registry, &DefaultPerturbation::new());
        let has = |text: &str| result.warnings.iter().any(|w| w == text);
        assert!(has("skipping Bonds/potential - unsupported attribute type"));
        assert!(has("skipping vdW - vdW not in parameter set"));
        assert!(has("skipping Constraints/Constraint - no parameter entries"));
        assert!(result
            .warnings
            .iter()
            .any(|w| w.starts_with("skipping ProperTorsions/Proper/idivf1 - value is unset")));
    }

    #[test]
    fn unset_constraint_distance_gets_probe() {
        let registry = ParameterRegistry::new().with_family(
            "Constraints",
            FamilyDescriptor::new(Some("Constraint")).parameter("distance", AttributeKind::Numeric),
        );
        let params = ParameterSet::new().with_family(
            "Constraints",
            ParameterFamily::new().with_parameter(Attributes::new()),
        );
        let result = enumerate_perturbations(&params, &registry, &DefaultPerturbation::new());
        assert_eq!(result.perturbations.len(), 1);
        assert_eq!(result.perturbations[0].new_value, Scalar::Float(0.1234));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn include_filter() {
        let registry = ParameterRegistry::builtin();
        let result = enumerate_where(&parameters(), &registry, &DefaultPerturbation::new(), |f| f == "Bonds");
        assert!(result.perturbations.iter().all(|p| p.path.starts_with("Bonds/")));
        assert!(!result.warnings.iter().any(|w| w.contains("vdW")));
    }
}
