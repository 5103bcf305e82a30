//! Shared fixtures for the cross-crate suites in `tests/`.

use parity_perturb::{Attributes, ParameterFamily, ParameterSet, ParameterValue};
use parity_types::format_float;

/// One harmonic bond between particles `p1` and `p2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bond {
    pub p1: usize,
    pub p2: usize,
    pub d: f64,
    pub k: f64,
}

impl Bond {
    pub fn new(p1: usize, p2: usize, d: f64, k: f64) -> Self {
        Self { p1, p2, d, k }
    }
}

/// An OpenMM system with `particles` carbons, the given bonds (in the order
/// given), a nonbonded force with `cutoff` and a motion remover.
pub fn openmm_system(particles: usize, bonds: &[Bond], cutoff: f64) -> String {
    let masses: String = (0..particles)
        .map(|_| "\t\t<Particle mass=\"12.01078\"/>\n".to_string())
        .collect();
    let nonbonded: String = (0..particles)
        .map(|_| "\t\t\t\t<Particle eps=\".457\" q=\"0\" sig=\".339\"/>\n".to_string())
        .collect();
    let bond_lines: String = bonds
        .iter()
        .map(|b| {
            format!(
                "\t\t\t\t<Bond d=\"{}\" k=\"{}\" p1=\"{}\" p2=\"{}\"/>\n",
                format_float(b.d),
                format_float(b.k),
                b.p1,
                b.p2
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" ?>
<System openmmVersion="8.2" type="System" version="1">
	<PeriodicBoxVectors>
		<A x="2" y="0" z="0"/>
		<B x="0" y="2" z="0"/>
		<C x="0" y="0" z="2"/>
	</PeriodicBoxVectors>
	<Particles>
{masses}	</Particles>
	<Constraints/>
	<Forces>
		<Force name="CMMotionRemover" type="CMMotionRemover" frequency="1" version="1"/>
		<Force forceGroup="0" name="HarmonicBondForce" type="HarmonicBondForce" usesPeriodic="0" version="2">
			<Bonds>
{bond_lines}			</Bonds>
		</Force>
		<Force forceGroup="0" name="NonbondedForce" type="NonbondedForce" version="4" cutoff="{cutoff}" switchingDistance="-1.0">
			<Particles>
{nonbonded}			</Particles>
			<Exceptions/>
		</Force>
	</Forces>
</System>
"#,
        cutoff = format_float(cutoff),
    )
}

/// Carbon monoxide parameters covering bonds, constraints, vdW and
/// electrostatics; angles are present but never apply to a diatomic.
pub fn carbon_monoxide() -> ParameterSet {
    let mut bond = Attributes::new();
    bond.insert("smirks".into(), "[#6:1]#[#8:2]".into());
    bond.insert("id".into(), "b1".into());
    bond.insert("length".into(), ParameterValue::quantity(1.128, "angstrom"));
    bond.insert(
        "k".into(),
        ParameterValue::quantity(1000.0, "kilocalorie / mole / angstrom ** 2"),
    );

    let mut atom = Attributes::new();
    atom.insert("smirks".into(), "[#6,#8:1]".into());
    atom.insert("epsilon".into(), ParameterValue::quantity(0.1, "kilocalorie / mole"));
    atom.insert("sigma".into(), ParameterValue::quantity(3.4, "angstrom"));

    let mut angle = Attributes::new();
    angle.insert("angle".into(), ParameterValue::quantity(109.5, "degree"));
    angle.insert("k".into(), ParameterValue::quantity(100.0, "kilocalorie / mole / radian ** 2"));

    ParameterSet::new()
        .with_family("Bonds", ParameterFamily::new().with_parameter(bond))
        .with_family("Angles", ParameterFamily::new().with_parameter(angle))
        .with_family("Constraints", ParameterFamily::new().with_parameter(Attributes::new()))
        .with_family(
            "vdW",
            ParameterFamily::new()
                .with_attribute("scale12", 0.0)
                .with_attribute("scale14", 0.5)
                .with_attribute("cutoff", ParameterValue::quantity(9.0, "angstrom"))
                .with_attribute("switch_width", ParameterValue::quantity(1.0, "angstrom"))
                .with_parameter(atom),
        )
        .with_family(
            "Electrostatics",
            ParameterFamily::new().with_attribute("scale14", 0.8333333333),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_lists_bonds_in_given_order() {
        let text = openmm_system(3, &[Bond::new(1, 2, 0.1, 1.0), Bond::new(0, 1, 0.2, 2.0)], 0.9);
        let first = text.find("p1=\"1\"").unwrap();
        let second = text.find("p1=\"0\"").unwrap();
        assert!(first < second);
        assert!(text.contains("cutoff=\"0.9\""));
    }
}
