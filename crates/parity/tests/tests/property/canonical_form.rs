//! Property tests: canonicalization is idempotent and blind to the
//! enumeration order of particle-indexed lists.

use parity_canonical::{build_canonical, Canonicalizer};
use parity_tests::{openmm_system, Bond};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_bond() -> impl Strategy<Value = Bond> {
    (0usize..6, 1usize..6, 0.05f64..0.3, 1.0e3f64..1.0e6)
        .prop_map(|(p1, offset, d, k)| Bond::new(p1, p1 + offset, d, k))
}

fn arb_bonds() -> impl Strategy<Value = Vec<Bond>> {
    prop::collection::vec(arb_bond(), 1..12)
}

fn particles_for(bonds: &[Bond]) -> usize {
    bonds.iter().map(|b| b.p2 + 1).max().unwrap_or(1)
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Rendering a canonical record and rebuilding it changes nothing.
    #[test]
    fn canonicalizing_twice_is_a_no_op(bonds in arb_bonds(), cutoff in 0.5f64..2.0) {
        let canonicalizer = Canonicalizer::default();
        let text = openmm_system(particles_for(&bonds), &bonds, cutoff);
        let first = canonicalizer.build(&text).unwrap();
        let second = canonicalizer.build(&canonicalizer.render(&first)).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Bond enumeration order never reaches the canonical record.
    #[test]
    fn bond_order_is_irrelevant(
        (bonds, shuffled) in arb_bonds().prop_flat_map(|bonds| {
            (Just(bonds.clone()), Just(bonds).prop_shuffle())
        }),
    ) {
        let particles = particles_for(&bonds);
        let a = build_canonical(&openmm_system(particles, &bonds, 1.0)).unwrap();
        let b = build_canonical(&openmm_system(particles, &shuffled, 1.0)).unwrap();
        prop_assert_eq!(a, b);
    }
}
