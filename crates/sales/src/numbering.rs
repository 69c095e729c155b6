//! Purchase-order numbering.

/// `OC-<year>-<seq>` where `seq` is the loaded order count plus one, padded to
/// four digits.
///
/// Two sessions holding the same count produce the same number; callers that
/// need uniqueness must supply their own.
pub fn po_number(year: i32, loaded_orders: usize) -> String {
    format!("OC-{year}-{:04}", loaded_orders + 1)
}
