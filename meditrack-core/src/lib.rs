//! Core derivations behind the clinic dashboards: BMI, adherence, appointments,
//! the staff roster and list pagination.

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

pub mod adherence;
pub mod appointments;
pub mod bmi;
pub mod pagination;
pub mod patients;
pub mod roster;

pub use adherence::compute_adherence;
pub use appointments::{resolve_next_appointment, todays_appointments, NextAppointment};
pub use bmi::{assess_bmi, classify_bmi, compute_bmi, current_bmi, BmiCategory, BmiReading};
pub use pagination::{Page, Paginator};
pub use patients::{count_with_status, search_patients};
pub use roster::{aggregate_roster, RosterRow};

/// Status label given to freshly registered patients.
pub const NEW_PATIENT_STATUS: &str = "New Patient";

/// Dashboard settings resolved once at start-up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardConfig {
    /// Offset of the clinic's fixed local zone from UTC, in minutes.
    pub utc_offset_minutes: i32,
    /// Rows shown per page in every list view.
    pub items_per_page: usize,
    /// Status label counted on the "new patients" card.
    pub new_patient_status: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 8 * 60,
            items_per_page: pagination::DEFAULT_ITEMS_PER_PAGE,
            new_patient_status: NEW_PATIENT_STATUS.to_string(),
        }
    }
}

impl DashboardConfig {
    /// A fresh paginator on page one using the configured page size.
    pub fn paginator(&self) -> Paginator {
        Paginator::with_page_size(self.items_per_page)
    }
}

/// A registered patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: String,
    pub fullname: String,
    pub age: Option<u32>,
    pub status: String,
    pub created_at: Option<NaiveDateTime>,
}

/// A scheduled visit. Timestamps are clinic-local.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub title: String,
    pub scheduled_at: NaiveDateTime,
    pub patient_id: String,
}

/// Recorded state of a scheduled medication dose.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String")]
pub enum DoseStatus {
    Taken,
    Missed,
    #[serde(rename = "not taken")]
    NotTaken,
    Unrecognized,
}

impl DoseStatus {
    /// Maps a stored label onto a status. Unknown labels are kept as
    /// `Unrecognized` rather than rejected.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Taken" => Self::Taken,
            "Missed" => Self::Missed,
            "not taken" => Self::NotTaken,
            _ => Self::Unrecognized,
        }
    }
}

impl From<String> for DoseStatus {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

/// One entry of a patient's medication schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicineDose {
    pub id: String,
    pub name: String,
    pub scheduled_time: Option<NaiveTime>,
    pub size: String,
    pub status: DoseStatus,
    pub patient_id: String,
}

/// A stored BMI sample. The value keeps the decimal text that was persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BmiRecord {
    pub id: String,
    pub value: String,
    pub patient_id: String,
    pub created_at: NaiveDateTime,
}

impl BmiRecord {
    /// Parses the stored decimal, if it is one.
    pub fn parsed_value(&self) -> Option<f64> {
        self.value.trim().parse::<f64>().ok()
    }
}

/// A discussion forum post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForumPost {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Comma separated tags as entered by the author.
    pub categories: String,
    pub patient_id: String,
    pub created_at: Option<NaiveDateTime>,
}

impl ForumPost {
    /// Splits the comma separated category field into trimmed, non-empty tags.
    pub fn category_tags(&self) -> Vec<String> {
        self.categories
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Everything a patient sees on their own dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientDashboard {
    pub patient: Patient,
    pub generated_for: NaiveDateTime,
    pub next_appointment: NextAppointment,
    pub todays_appointments: Vec<Appointment>,
    pub adherence_percent: u32,
    pub current_bmi: Option<CurrentBmi>,
    /// Number of forum posts the patient has written.
    pub forum_posts: usize,
    pub appointments: Page<Appointment>,
    pub medicines: Vec<MedicineDose>,
}

/// The latest BMI sample with its classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrentBmi {
    pub reading: BmiReading,
    pub recorded_at: NaiveDateTime,
}

/// The staff overview of the whole clinic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffDashboard {
    pub generated_for: NaiveDateTime,
    pub total_patients: usize,
    pub new_patients: usize,
    pub todays_appointments: Vec<ScheduledVisit>,
    pub roster: Page<RosterRow>,
    pub appointments: Page<ScheduledVisit>,
}

/// An appointment joined with the name of the patient it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledVisit {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient_name: Option<String>,
}

/// A forum post prepared for the feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForumEntry {
    pub post: ForumPost,
    pub author: Option<String>,
    pub tags: Vec<String>,
}

/// Errors surfaced by the dashboard crates.
#[derive(Debug, thiserror::Error)]
pub enum MeditrackError {
    #[error("weight and height must be positive (weight {weight_kg} kg, height {height_m} m)")]
    InvalidMeasurement { weight_kg: f64, height_m: f64 },
    #[error("input is missing required data")]
    MissingData,
    #[error("could not read input: {0}")]
    Parse(String),
    #[error("no patient with id {0}")]
    UnknownPatient(String),
}
