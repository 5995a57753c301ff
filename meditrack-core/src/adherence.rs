//! Medication adherence rate.

use crate::{DoseStatus, MedicineDose};

/// Share of doses marked `Taken`, as a whole percentage rounded half-up.
///
/// Every other status counts against adherence. An empty schedule yields 0.
pub fn compute_adherence(doses: &[MedicineDose]) -> u32 {
    let total = doses.len() as u64;
    if total == 0 {
        return 0;
    }

    let taken = doses
        .iter()
        .filter(|dose| dose.status == DoseStatus::Taken)
        .count() as u64;

    // round(100 * taken / total) without leaving integer arithmetic
    ((200 * taken + total) / (2 * total)) as u32
}
