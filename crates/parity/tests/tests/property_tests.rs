#[path = "property/canonical_form.rs"]
mod canonical_form;

#[path = "property/tolerance_boundary.rs"]
mod tolerance_boundary;

#[path = "property/reconciliation.rs"]
mod reconciliation;

#[path = "property/batch_names.rs"]
mod batch_names;
