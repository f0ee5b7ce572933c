use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

pub type NumericData = f64;

/// Swept-variable value used as a sortable map key.
pub type ScanKey = OrderedFloat<NumericData>;

/// Swept value -> field value, ascending by swept value.
pub type ResultMap = BTreeMap<ScanKey, NumericData>;

pub const INPUT_SUFFIX: &str = "IN.DAT";
pub const OUTPUT_SUFFIX: &str = "MFILE.DAT";
pub const CONVERGENCE_FIELD: &str = "ifail";
pub const CONVERGED: NumericData = 1.0;

pub fn input_file_name(prefix: &str) -> String {
    format!("{}.{}", prefix, INPUT_SUFFIX)
}

pub fn output_file_name(prefix: &str) -> String {
    format!("{}.{}", prefix, OUTPUT_SUFFIX)
}
