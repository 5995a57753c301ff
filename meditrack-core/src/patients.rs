//! Filters used by the staff patient table.

use crate::Patient;

/// Patients whose full name contains `query`, ignoring case. A blank query
/// matches everyone.
pub fn search_patients<'a>(patients: &'a [Patient], query: &str) -> Vec<&'a Patient> {
    let needle = query.trim().to_lowercase();
    patients
        .iter()
        .filter(|patient| needle.is_empty() || patient.fullname.to_lowercase().contains(&needle))
        .collect()
}

/// Number of patients carrying exactly the given status label.
pub fn count_with_status(patients: &[Patient], status: &str) -> usize {
    patients
        .iter()
        .filter(|patient| patient.status == status)
        .count()
}
