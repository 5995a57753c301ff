//! Converts the clinic database's JSON row export into core records and
//! assembles the patient, staff and forum views from them.

use std::cmp::Reverse;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};
use meditrack_core::{
    aggregate_roster, compute_adherence, count_with_status, current_bmi,
    resolve_next_appointment, search_patients, todays_appointments, Appointment, BmiReading,
    BmiRecord, CurrentBmi, DashboardConfig, DoseStatus, ForumEntry, ForumPost, MedicineDose,
    MeditrackError, Page, Paginator, Patient, PatientDashboard, ScheduledVisit, StaffDashboard,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// All records of one export, already localized to the clinic's zone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClinicExport {
    pub patients: Vec<Patient>,
    pub appointments: Vec<Appointment>,
    pub medicines: Vec<MedicineDose>,
    pub bmi_records: Vec<BmiRecord>,
    pub forums: Vec<ForumPost>,
}

impl ClinicExport {
    pub fn patient(&self, patient_id: &str) -> Option<&Patient> {
        self.patients.iter().find(|patient| patient.id == patient_id)
    }

    pub fn appointments_for(&self, patient_id: &str) -> Vec<Appointment> {
        self.appointments
            .iter()
            .filter(|appointment| appointment.patient_id == patient_id)
            .cloned()
            .collect()
    }

    pub fn medicines_for(&self, patient_id: &str) -> Vec<MedicineDose> {
        self.medicines
            .iter()
            .filter(|dose| dose.patient_id == patient_id)
            .cloned()
            .collect()
    }

    /// Pairs an appointment with its owner's name, if the owner is known.
    pub fn scheduled_visit(&self, appointment: &Appointment) -> ScheduledVisit {
        ScheduledVisit {
            patient_name: self
                .patient(&appointment.patient_id)
                .map(|patient| patient.fullname.clone()),
            appointment: appointment.clone(),
        }
    }

    pub fn forum_post_count(&self, patient_id: &str) -> usize {
        self.forums
            .iter()
            .filter(|post| post.patient_id == patient_id)
            .count()
    }

    pub fn bmi_records_for(&self, patient_id: &str) -> Vec<BmiRecord> {
        self.bmi_records
            .iter()
            .filter(|record| record.patient_id == patient_id)
            .cloned()
            .collect()
    }
}

/// Parse an export from a JSON string.
pub fn parse_export_str(
    export_json: &str,
    config: &DashboardConfig,
) -> Result<ClinicExport, MeditrackError> {
    let value: Value =
        serde_json::from_str(export_json).map_err(|err| MeditrackError::Parse(err.to_string()))?;
    parse_export_value(&value, config)
}

/// Parse an export from a `serde_json::Value`.
///
/// Sections that are absent are treated as empty. Rows that lack a required
/// column are skipped.
pub fn parse_export_value(
    export: &Value,
    config: &DashboardConfig,
) -> Result<ClinicExport, MeditrackError> {
    let root = export.as_object().ok_or(MeditrackError::MissingData)?;
    let offset = clinic_offset(config);

    let mut parsed = ClinicExport::default();

    for (index, row) in section(root, &["patients"])?.iter().enumerate() {
        match read_patient(row, offset) {
            Some(patient) => parsed.patients.push(patient),
            None => warn!(section = "patients", index, "skipping malformed row"),
        }
    }

    for (index, row) in section(root, &["appointments"])?.iter().enumerate() {
        match read_appointment(row, index, offset) {
            Some(appointment) => parsed.appointments.push(appointment),
            None => warn!(section = "appointments", index, "skipping malformed row"),
        }
    }

    for (index, row) in section(root, &["medicines", "medicine"])?.iter().enumerate() {
        match read_medicine(row, index) {
            Some(dose) => parsed.medicines.push(dose),
            None => warn!(section = "medicines", index, "skipping malformed row"),
        }
    }

    for (index, row) in section(root, &["bmi_records", "bmi"])?.iter().enumerate() {
        match read_bmi(row, index, offset) {
            Some(record) => parsed.bmi_records.push(record),
            None => warn!(section = "bmi_records", index, "skipping malformed row"),
        }
    }

    for (index, row) in section(root, &["forums", "forum"])?.iter().enumerate() {
        match read_forum(row, index, offset) {
            Some(post) => parsed.forums.push(post),
            None => warn!(section = "forums", index, "skipping malformed row"),
        }
    }

    debug!(
        patients = parsed.patients.len(),
        appointments = parsed.appointments.len(),
        medicines = parsed.medicines.len(),
        bmi_records = parsed.bmi_records.len(),
        forums = parsed.forums.len(),
        "parsed clinic export"
    );

    Ok(parsed)
}

/// Build the dashboard a single patient sees.
pub fn summarize_patient(
    export: &ClinicExport,
    patient_id: &str,
    now: NaiveDateTime,
    appointments_pager: &Paginator,
) -> Result<PatientDashboard, MeditrackError> {
    let patient = export
        .patient(patient_id)
        .cloned()
        .ok_or_else(|| MeditrackError::UnknownPatient(patient_id.to_string()))?;

    let appointments = export.appointments_for(patient_id);
    let medicines = export.medicines_for(patient_id);
    let bmi_records = export.bmi_records_for(patient_id);

    let current_bmi = current_bmi(&bmi_records).and_then(|record| {
        BmiReading::from_record(record).map(|reading| CurrentBmi {
            reading,
            recorded_at: record.created_at,
        })
    });

    Ok(PatientDashboard {
        next_appointment: resolve_next_appointment(&appointments, now),
        todays_appointments: todays_appointments(&appointments, now)
            .into_iter()
            .cloned()
            .collect(),
        adherence_percent: compute_adherence(&medicines),
        current_bmi,
        forum_posts: export.forum_post_count(patient_id),
        appointments: appointments_pager.page(&appointments),
        medicines,
        patient,
        generated_for: now,
    })
}

/// Build the staff overview. `search` narrows the roster by patient name.
pub fn summarize_staff(
    export: &ClinicExport,
    now: NaiveDateTime,
    config: &DashboardConfig,
    search: &str,
    roster_pager: &Paginator,
    appointments_pager: &Paginator,
) -> StaffDashboard {
    let matching: Vec<Patient> = search_patients(&export.patients, search)
        .into_iter()
        .cloned()
        .collect();
    let roster = aggregate_roster(&matching, &export.appointments, now);
    let visits: Vec<ScheduledVisit> = export
        .appointments
        .iter()
        .map(|appointment| export.scheduled_visit(appointment))
        .collect();

    StaffDashboard {
        generated_for: now,
        total_patients: export.patients.len(),
        new_patients: count_with_status(&export.patients, &config.new_patient_status),
        todays_appointments: todays_appointments(&export.appointments, now)
            .into_iter()
            .map(|appointment| export.scheduled_visit(appointment))
            .collect(),
        roster: roster_pager.page(&roster),
        appointments: appointments_pager.page(&visits),
    }
}

/// Forum posts, newest first, with author names and split tags.
pub fn forum_feed(export: &ClinicExport, pager: &Paginator) -> Page<ForumEntry> {
    let mut entries: Vec<ForumEntry> = export
        .forums
        .iter()
        .map(|post| ForumEntry {
            author: export
                .patient(&post.patient_id)
                .map(|patient| patient.fullname.clone()),
            tags: post.category_tags(),
            post: post.clone(),
        })
        .collect();
    entries.sort_by_key(|entry| Reverse(entry.post.created_at));
    pager.page(&entries)
}

/// The clinic's fixed zone. An out-of-range offset falls back to UTC.
pub fn clinic_offset(config: &DashboardConfig) -> FixedOffset {
    config
        .utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| {
            warn!(
                utc_offset_minutes = config.utc_offset_minutes,
                "utc offset out of range, using UTC"
            );
            Utc.fix()
        })
}

/// The current wall-clock time in the clinic's zone.
pub fn local_now(config: &DashboardConfig) -> NaiveDateTime {
    Utc::now().with_timezone(&clinic_offset(config)).naive_local()
}

/// Interprets a stored timestamp as clinic-local time.
///
/// Values carrying an offset (RFC 3339, including `Z`) are shifted into the
/// clinic zone. Naive values are assumed to be local already. A bare date
/// means midnight.
pub fn parse_local_timestamp(text: &str, config: &DashboardConfig) -> Option<NaiveDateTime> {
    parse_timestamp(text, clinic_offset(config))
}

fn parse_timestamp(text: &str, offset: FixedOffset) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&offset).naive_local());
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .or_else(|_| NaiveTime::parse_from_str(text, "%I:%M %p"))
        .ok()
}

fn section<'a>(
    root: &'a serde_json::Map<String, Value>,
    names: &[&str],
) -> Result<&'a [Value], MeditrackError> {
    for name in names {
        let Some(value) = root.get(*name) else {
            continue;
        };
        return match value {
            Value::Array(rows) => Ok(rows.as_slice()),
            Value::Null => Ok(&[]),
            _ => Err(MeditrackError::Parse(format!(
                "expected `{name}` to be an array of rows"
            ))),
        };
    }
    Ok(&[])
}

fn read_patient(row: &Value, offset: FixedOffset) -> Option<Patient> {
    Some(Patient {
        id: extract_id(row, "patient_id")?,
        fullname: extract_text(row, "fullname")?,
        age: extract_age(row),
        status: extract_text(row, "status").unwrap_or_default(),
        created_at: extract_timestamp(row, "created_at", offset),
    })
}

fn read_appointment(row: &Value, index: usize, offset: FixedOffset) -> Option<Appointment> {
    Some(Appointment {
        id: row_id(row, "appointment_id", "appointment", index),
        title: extract_text(row, "title").unwrap_or_default(),
        scheduled_at: extract_timestamp(row, "appointment_date", offset)?,
        patient_id: extract_id(row, "patient_id")?,
    })
}

fn read_medicine(row: &Value, index: usize) -> Option<MedicineDose> {
    Some(MedicineDose {
        id: row_id(row, "medicine_id", "medicine", index),
        name: extract_text(row, "medicine_name")?,
        scheduled_time: extract_text(row, "time").and_then(|text| parse_time_of_day(&text)),
        size: extract_text(row, "size").unwrap_or_default(),
        status: extract_text(row, "status")
            .map(|label| DoseStatus::from_label(&label))
            .unwrap_or(DoseStatus::NotTaken),
        patient_id: extract_id(row, "patient_id")?,
    })
}

fn read_bmi(row: &Value, index: usize, offset: FixedOffset) -> Option<BmiRecord> {
    let value = match row.get("bmi")? {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };

    Some(BmiRecord {
        id: row_id(row, "bmi_id", "bmi", index),
        value,
        patient_id: extract_id(row, "patient_id")?,
        created_at: extract_timestamp(row, "created_at", offset)?,
    })
}

fn read_forum(row: &Value, index: usize, offset: FixedOffset) -> Option<ForumPost> {
    Some(ForumPost {
        id: row_id(row, "forum_id", "forum", index),
        title: extract_text(row, "title")?,
        content: extract_text(row, "content").unwrap_or_default(),
        categories: extract_text(row, "categories").unwrap_or_default(),
        patient_id: extract_id(row, "patient_id")?,
        created_at: extract_timestamp(row, "created_at", offset),
    })
}

fn extract_id(row: &Value, field: &str) -> Option<String> {
    match row.get(field)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn row_id(row: &Value, field: &str, fallback: &str, index: usize) -> String {
    extract_id(row, field).unwrap_or_else(|| format!("{fallback}-{index}"))
}

fn extract_text(row: &Value, field: &str) -> Option<String> {
    row.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn extract_age(row: &Value) -> Option<u32> {
    match row.get("age")? {
        Value::Number(number) => number.as_u64().and_then(|age| u32::try_from(age).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn extract_timestamp(row: &Value, field: &str, offset: FixedOffset) -> Option<NaiveDateTime> {
    row.get(field)
        .and_then(Value::as_str)
        .and_then(|text| parse_timestamp(text, offset))
}
