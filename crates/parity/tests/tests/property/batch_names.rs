//! Property tests: only names present in both collections are compared.

use std::collections::BTreeSet;

use parity_batch::{compare_batch, Collection};
use parity_tests::{openmm_system, Bond};
use parity_types::ToleranceSpec;
use proptest::prelude::*;

fn collection(names: &BTreeSet<String>, text: &str) -> Collection {
    names.iter().map(|name| (name.clone(), text.to_string())).collect()
}

fn arb_names() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[a-f]{1,2}", 0..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn name_sets_partition(a in arb_names(), b in arb_names()) {
        let text = openmm_system(2, &[Bond::new(0, 1, 0.1128, 1.0e5)], 0.9);
        let report = compare_batch(
            &collection(&a, &text),
            &collection(&b, &text),
            &ToleranceSpec::default(),
            &[],
        )
        .unwrap();

        let only_a: Vec<String> = a.difference(&b).cloned().collect();
        let only_b: Vec<String> = b.difference(&a).cloned().collect();
        prop_assert_eq!(&report.missing_in_b, &only_a);
        prop_assert_eq!(&report.missing_in_a, &only_b);
        prop_assert_eq!(report.compared, a.intersection(&b).count());
        prop_assert_eq!(report.identical, report.compared);
    }
}
