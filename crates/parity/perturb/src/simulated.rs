//! Deterministic two-particle transform.

use parity_types::format_float;

use crate::error::TransformError;
use crate::parameters::{Attributes, ParameterSet, ParameterValue};
use crate::transform::{FamilyLabels, Transform};
use crate::units::UnitTable;

/// Injected failure: returns an error for inputs it wants to reject.
pub type FaultFn = Box<dyn Fn(&ParameterSet) -> Option<TransformError> + Send + Sync>;

const MASSES: [f64; 2] = [12.011, 15.999];

/// A carbon monoxide pipeline.
///
/// Emits a system with one harmonic bond, an optional rigid constraint, a
/// nonbonded force with two particles and their excluded 1-2 pair, and a
/// cosmetic motion remover. Only Bonds, Constraints, vdW, Electrostatics and
/// LibraryCharges have any effect.
pub struct SimulatedDiatomicTransform {
    units: UnitTable,
    fault: Option<FaultFn>,
}

impl SimulatedDiatomicTransform {
    pub fn new() -> Self {
        Self {
            units: UnitTable::md(),
            fault: None,
        }
    }

    /// Fail whenever `fault` returns an error.
    pub fn with_fault<F>(mut self, fault: F) -> Self
    where
        F: Fn(&ParameterSet) -> Option<TransformError> + Send + Sync + 'static,
    {
        self.fault = Some(Box::new(fault));
        self
    }

    fn md(&self, value: Option<&ParameterValue>) -> Result<Option<f64>, TransformError> {
        match value {
            None => Ok(None),
            Some(value) => self
                .units
                .value_in_md(value)
                .map_err(|e| TransformError::recoverable(e.to_string())),
        }
    }

    fn required(&self, entry: &Attributes, name: &str, family: &str) -> Result<f64, TransformError> {
        self.md(entry.get(name))?
            .ok_or_else(|| TransformError::recoverable(format!("{} parameter has no numeric {}", family, name)))
    }

    fn entry<'p>(parameters: &'p ParameterSet, family: &str) -> Option<&'p Attributes> {
        parameters.family(family).and_then(|f| f.parameters.first())
    }

    fn family_value(&self, parameters: &ParameterSet, family: &str, name: &str, default: f64) -> Result<f64, TransformError> {
        let value = parameters.family(family).and_then(|f| f.attributes.get(name));
        Ok(self.md(value)?.unwrap_or(default))
    }

    fn lennard_jones(&self, parameters: &ParameterSet, atom: usize) -> Result<(f64, f64), TransformError> {
        let Some(entries) = parameters.family("vdW").map(|f| &f.parameters) else {
            return Ok((0.0, 0.0));
        };
        let Some(entry) = entries.get(atom).or(entries.last()) else {
            return Ok((0.0, 0.0));
        };
        let sigma = match self.md(entry.get("sigma"))? {
            Some(sigma) => sigma,
            None => self.md(entry.get("rmin_half"))?.unwrap_or(0.0) * 2.0 / 2f64.powf(1.0 / 6.0),
        };
        let epsilon = self.md(entry.get("epsilon"))?.unwrap_or(0.0);
        Ok((sigma, epsilon))
    }

    fn charges(&self, parameters: &ParameterSet) -> Result<[f64; 2], TransformError> {
        let Some(entry) = Self::entry(parameters, "LibraryCharges") else {
            return Ok([0.0, 0.0]);
        };
        Ok([
            self.md(entry.get("charge1"))?.unwrap_or(0.0),
            self.md(entry.get("charge2"))?.unwrap_or(0.0),
        ])
    }
}

impl Default for SimulatedDiatomicTransform {
    fn default() -> Self {
        Self::new()
    }
}

// Negative zero renders as "-0.0"; fold it into zero.
fn num(value: f64) -> String {
    format_float(value + 0.0)
}

impl Transform for SimulatedDiatomicTransform {
    fn transform(&self, parameters: &ParameterSet) -> Result<String, TransformError> {
        if let Some(error) = self.fault.as_ref().and_then(|fault| fault(parameters)) {
            return Err(error);
        }

        let bond = match Self::entry(parameters, "Bonds") {
            Some(entry) => Some((
                self.required(entry, "length", "Bonds")?,
                self.required(entry, "k", "Bonds")?,
            )),
            None => None,
        };
        let constraint = match Self::entry(parameters, "Constraints") {
            Some(entry) => match (self.md(entry.get("distance"))?, bond) {
                (Some(distance), _) => Some(distance),
                (None, Some((length, _))) => Some(length),
                (None, None) => {
                    return Err(TransformError::recoverable(
                        "constraint has no distance and no bond length to fall back on",
                    ))
                }
            },
            None => None,
        };

        let cutoff = self.family_value(parameters, "vdW", "cutoff", 0.9)?;
        let switch_width = self.family_value(parameters, "vdW", "switch_width", 0.1)?;
        let vdw_scale12 = self.family_value(parameters, "vdW", "scale12", 0.0)?;
        let coulomb_scale12 = self.family_value(parameters, "Electrostatics", "scale12", 0.0)?;
        let (switching_distance, use_switching) = if switch_width > 0.0 {
            (cutoff - switch_width, 1)
        } else {
            (-1.0, 0)
        };

        let lj = [self.lennard_jones(parameters, 0)?, self.lennard_jones(parameters, 1)?];
        let q = self.charges(parameters)?;

        let mut lines = vec![
            r#"<?xml version="1.0" ?>"#.to_string(),
            r#"<System openmmVersion="8.2" type="System" version="1">"#.to_string(),
            "\t<PeriodicBoxVectors>".to_string(),
            r#"		<A x="2.0" y="0.0" z="0.0"/>"#.to_string(),
            r#"		<B x="0.0" y="2.0" z="0.0"/>"#.to_string(),
            r#"		<C x="0.0" y="0.0" z="2.0"/>"#.to_string(),
            "\t</PeriodicBoxVectors>".to_string(),
            "\t<Particles>".to_string(),
        ];
        for mass in MASSES {
            lines.push(format!("\t\t<Particle mass=\"{}\"/>", num(mass)));
        }
        lines.push("\t</Particles>".to_string());

        match constraint {
            Some(d) => {
                lines.push("\t<Constraints>".to_string());
                lines.push(format!("\t\t<Constraint d=\"{}\" p1=\"0\" p2=\"1\"/>", num(d)));
                lines.push("\t</Constraints>".to_string());
            }
            None => lines.push("\t<Constraints/>".to_string()),
        }

        lines.push("\t<Forces>".to_string());
        if let Some((length, k)) = bond {
            lines.push(
                r#"		<Force forceGroup="0" name="HarmonicBondForce" type="HarmonicBondForce" usesPeriodic="0" version="2">"#
                    .to_string(),
            );
            lines.push("\t\t\t<Bonds>".to_string());
            lines.push(format!(
                "\t\t\t\t<Bond d=\"{}\" k=\"{}\" p1=\"0\" p2=\"1\"/>",
                num(length),
                num(k)
            ));
            lines.push("\t\t\t</Bonds>".to_string());
            lines.push("\t\t</Force>".to_string());
        }

        lines.push(format!(
            "\t\t<Force cutoff=\"{}\" dispersionCorrection=\"1\" ewaldTolerance=\"0.0005\" forceGroup=\"0\" method=\"4\" name=\"NonbondedForce\" switchingDistance=\"{}\" type=\"NonbondedForce\" useSwitchingFunction=\"{}\" version=\"4\">",
            num(cutoff),
            num(switching_distance),
            use_switching
        ));
        lines.push("\t\t\t<Particles>".to_string());
        for (charge, (sigma, epsilon)) in q.iter().zip(lj) {
            lines.push(format!(
                "\t\t\t\t<Particle eps=\"{}\" q=\"{}\" sig=\"{}\"/>",
                num(epsilon),
                num(*charge),
                num(sigma)
            ));
        }
        lines.push("\t\t\t</Particles>".to_string());
        // Excluded pairs carry a placeholder sigma.
        let exception_sigma = if vdw_scale12 == 0.0 {
            1.0
        } else {
            (lj[0].0 + lj[1].0) / 2.0
        };
        lines.push("\t\t\t<Exceptions>".to_string());
        lines.push(format!(
            "\t\t\t\t<Exception eps=\"{}\" p1=\"0\" p2=\"1\" q=\"{}\" sig=\"{}\"/>",
            num(vdw_scale12 * (lj[0].1 * lj[1].1).sqrt()),
            num(coulomb_scale12 * q[0] * q[1]),
            num(exception_sigma)
        ));
        lines.push("\t\t\t</Exceptions>".to_string());
        lines.push("\t\t</Force>".to_string());
        lines.push(
            r#"		<Force forceGroup="0" frequency="1" name="CMMotionRemover" type="CMMotionRemover" version="1"/>"#
                .to_string(),
        );
        lines.push("\t</Forces>".to_string());
        lines.push("</System>".to_string());
        Ok(lines.join("\n"))
    }

    fn label(&self, parameters: &ParameterSet) -> Result<FamilyLabels, TransformError> {
        let entries = |family: &str| parameters.family(family).map_or(0, |f| f.parameters.len());
        let has = |family: &str| usize::from(entries(family) > 0);

        let mut labels = FamilyLabels::new();
        labels.insert("Bonds".into(), has("Bonds"));
        labels.insert("Angles".into(), 0);
        labels.insert("ProperTorsions".into(), 0);
        labels.insert("ImproperTorsions".into(), 0);
        labels.insert("Constraints".into(), has("Constraints"));
        labels.insert("vdW".into(), 2 * has("vdW"));
        labels.insert("Electrostatics".into(), 1);
        labels.insert("LibraryCharges".into(), 2 * has("LibraryCharges"));
        labels.insert("ToolkitAM1BCC".into(), 2 * (1 - has("LibraryCharges")));
        Ok(labels)
    }

    fn name(&self) -> &str {
        "simulated-diatomic"
    }
}
