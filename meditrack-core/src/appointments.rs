//! Next-appointment resolution and the "today" notification list.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::Appointment;

/// Outcome of looking for a patient's next appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "appointment", rename_all = "snake_case")]
pub enum NextAppointment {
    /// The patient has no appointments at all.
    NoAppointment,
    /// Appointments exist but all of them are on earlier days.
    NoUpcoming,
    Found(Appointment),
}

impl NextAppointment {
    pub fn appointment(&self) -> Option<&Appointment> {
        match self {
            Self::Found(appointment) => Some(appointment),
            _ => None,
        }
    }

    pub fn scheduled_at(&self) -> Option<NaiveDateTime> {
        self.appointment().map(|appointment| appointment.scheduled_at)
    }

    pub fn title(&self) -> Option<&str> {
        self.appointment().map(|appointment| appointment.title.as_str())
    }
}

/// Picks the earliest appointment that is later than `now` or falls on the
/// same calendar day as `now`. An appointment earlier today still counts.
///
/// Ties on the timestamp keep their input order.
pub fn resolve_next_appointment(
    appointments: &[Appointment],
    now: NaiveDateTime,
) -> NextAppointment {
    if appointments.is_empty() {
        return NextAppointment::NoAppointment;
    }

    let mut sorted: Vec<&Appointment> = appointments.iter().collect();
    sorted.sort_by_key(|appointment| appointment.scheduled_at);

    sorted
        .into_iter()
        .find(|appointment| is_upcoming_or_today(appointment.scheduled_at, now))
        .map(|appointment| NextAppointment::Found(appointment.clone()))
        .unwrap_or(NextAppointment::NoUpcoming)
}

/// Appointments on `now`'s calendar day, in input order.
pub fn todays_appointments(
    appointments: &[Appointment],
    now: NaiveDateTime,
) -> Vec<&Appointment> {
    let today = now.date();
    appointments
        .iter()
        .filter(|appointment| appointment.scheduled_at.date() == today)
        .collect()
}

fn is_upcoming_or_today(scheduled_at: NaiveDateTime, now: NaiveDateTime) -> bool {
    scheduled_at > now || scheduled_at.date() == now.date()
}
