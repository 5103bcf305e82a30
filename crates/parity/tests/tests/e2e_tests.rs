#[path = "e2e/regression_compare.rs"]
mod regression_compare;

#[path = "e2e/propagation_roundtrip.rs"]
mod propagation_roundtrip;
