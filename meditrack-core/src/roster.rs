//! Per-patient "last visit / next appointment" roster for the staff table.

use std::collections::{hash_map::Entry, HashMap};

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{Appointment, Patient};

/// One line of the staff roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RosterRow {
    pub patient_id: String,
    pub fullname: String,
    pub age: Option<u32>,
    pub status: String,
    /// Latest appointment before today.
    pub last_visit: Option<NaiveDateTime>,
    /// Earliest appointment today or later.
    pub next_appointment: Option<NaiveDateTime>,
}

#[derive(Default, Clone, Copy)]
struct VisitAccumulator {
    last_visit: Option<NaiveDateTime>,
    next_appointment: Option<NaiveDateTime>,
}

impl VisitAccumulator {
    fn record(&mut self, scheduled_at: NaiveDateTime, start_of_today: NaiveDateTime) {
        if scheduled_at < start_of_today {
            if self.last_visit.map_or(true, |current| scheduled_at > current) {
                self.last_visit = Some(scheduled_at);
            }
        } else if self
            .next_appointment
            .map_or(true, |current| scheduled_at < current)
        {
            self.next_appointment = Some(scheduled_at);
        }
    }
}

/// Builds one row per patient, in input order.
///
/// The day boundary is midnight of `now`'s calendar day: anything before it is
/// a past visit, anything at or after it is upcoming. Appointments whose
/// patient is not in `patients` are ignored.
pub fn aggregate_roster(
    patients: &[Patient],
    appointments: &[Appointment],
    now: NaiveDateTime,
) -> Vec<RosterRow> {
    let start_of_today = now.date().and_time(NaiveTime::MIN);

    let mut visits: HashMap<&str, VisitAccumulator> = HashMap::with_capacity(patients.len());
    for appointment in appointments {
        match visits.entry(appointment.patient_id.as_str()) {
            Entry::Occupied(mut slot) => slot
                .get_mut()
                .record(appointment.scheduled_at, start_of_today),
            Entry::Vacant(slot) => slot
                .insert(VisitAccumulator::default())
                .record(appointment.scheduled_at, start_of_today),
        }
    }

    patients
        .iter()
        .map(|patient| {
            let summary = visits
                .get(patient.id.as_str())
                .copied()
                .unwrap_or_default();
            RosterRow {
                patient_id: patient.id.clone(),
                fullname: patient.fullname.clone(),
                age: patient.age,
                status: patient.status.clone(),
                last_visit: summary.last_visit,
                next_appointment: summary.next_appointment,
            }
        })
        .collect()
}
