//! Property tests: numeric equality is `|a - b| <= tolerance`.

use parity_canonical::build_canonical;
use parity_differ::is_identical;
use parity_types::{format_float, CanonicalRecord, ToleranceSpec};
use proptest::prelude::*;

fn with_cutoff(cutoff: f64) -> CanonicalRecord {
    build_canonical(&format!(
        r#"<System><Forces><Force name="NonbondedForce" type="NonbondedForce" cutoff="{}"/></Forces></System>"#,
        format_float(cutoff)
    ))
    .unwrap()
}

#[test]
fn exact_boundary_counts_as_equal() {
    let tolerance = ToleranceSpec::new(0.5).unwrap();
    assert!(is_identical(&with_cutoff(1.0), &with_cutoff(1.5), &tolerance));
    assert!(!is_identical(&with_cutoff(1.0), &with_cutoff(1.5000001), &tolerance));
}

proptest! {
    /// Just inside the tolerance is equal, just outside is different.
    #[test]
    fn boundary_is_sharp(base in -10.0f64..10.0, tolerance in 1.0e-4f64..1.0) {
        let spec = ToleranceSpec::new(tolerance).unwrap();
        let a = with_cutoff(base);
        prop_assert!(is_identical(&a, &with_cutoff(base + tolerance * 0.999), &spec));
        prop_assert!(!is_identical(&a, &with_cutoff(base + tolerance * 1.001), &spec));
    }

    /// An override on the path wins over a tighter default.
    #[test]
    fn override_widens_one_path(base in -10.0f64..10.0, delta in 1.0e-3f64..0.4) {
        let spec = ToleranceSpec::new(1.0e-6)
            .unwrap()
            .with_override("Forces/*/cutoff", 0.5)
            .unwrap();
        prop_assert!(is_identical(&with_cutoff(base), &with_cutoff(base + delta), &spec));
        prop_assert!(!is_identical(
            &with_cutoff(base),
            &with_cutoff(base + delta),
            &ToleranceSpec::default()
        ));
    }
}
