use std::fs;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use meditrack_core::{BmiCategory, DashboardConfig, DoseStatus, MeditrackError, NextAppointment};
use meditrack_rows::{
    forum_feed, parse_export_str, parse_export_value, parse_local_timestamp, summarize_patient,
    summarize_staff, ClinicExport,
};
use rstest::{fixture, rstest};
use serde_json::{json, Value};

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn local(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 10, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .expect("valid timestamp")
}

#[fixture]
fn config() -> DashboardConfig {
    DashboardConfig::default()
}

#[fixture]
fn now() -> NaiveDateTime {
    local(15, 14, 30)
}

#[fixture]
fn export(config: DashboardConfig) -> ClinicExport {
    let data = fs::read_to_string(fixture_path("clinic_export.json"))
        .expect("could not read sample export");
    parse_export_str(&data, &config).expect("sample export should parse")
}

#[rstest]
fn malformed_rows_are_skipped(export: ClinicExport) {
    assert_eq!(export.patients.len(), 3);
    assert_eq!(export.appointments.len(), 7);
    assert_eq!(export.medicines.len(), 5);
    assert_eq!(export.bmi_records.len(), 3);
    assert_eq!(export.forums.len(), 3);
}

#[rstest]
fn ids_and_ages_are_normalized(export: ClinicExport) {
    let jose = export.patient("2").expect("patient 2 present");
    assert_eq!(jose.age, Some(58));
    let registered = NaiveDate::from_ymd_opt(2024, 8, 12).and_then(|date| date.and_hms_opt(9, 15, 0));
    assert_eq!(jose.created_at, registered);

    let ana = export.patient("3").expect("patient 3 present");
    assert_eq!(ana.created_at, None);
    assert_eq!(export.appointments_for("3").len(), 1);
}

#[rstest]
fn utc_timestamps_are_shifted_into_clinic_zone(export: ClinicExport) {
    let maria = export.patient("1").expect("patient 1 present");
    assert_eq!(maria.created_at, Some(local(1, 0, 0)));

    let screening = export
        .appointments
        .iter()
        .find(|appointment| appointment.id == "5")
        .expect("appointment 5 present");
    assert_eq!(screening.scheduled_at, local(15, 0, 30));
}

#[rstest]
fn medicine_rows_keep_status_and_time(export: ClinicExport) {
    let doses = export.medicines_for("1");
    let statuses: Vec<DoseStatus> = doses.iter().map(|dose| dose.status).collect();
    assert_eq!(
        statuses,
        vec![DoseStatus::Taken, DoseStatus::Missed, DoseStatus::NotTaken, DoseStatus::Taken]
    );
    assert_eq!(doses[3].scheduled_time, NaiveTime::from_hms_opt(21, 30, 0));
}

#[rstest]
fn patient_dashboard_for_maria(export: ClinicExport, config: DashboardConfig, now: NaiveDateTime) {
    let dashboard =
        summarize_patient(&export, "1", now, &config.paginator()).expect("known patient");

    assert_eq!(dashboard.patient.fullname, "Maria Santos");
    // The 08:00 check already passed but is still today's, so it beats Saturday's follow-up.
    assert_eq!(dashboard.next_appointment.title(), Some("Blood pressure check"));
    assert_eq!(dashboard.next_appointment.scheduled_at(), Some(local(15, 8, 0)));
    assert_eq!(dashboard.todays_appointments.len(), 1);
    assert_eq!(dashboard.adherence_percent, 50);
    assert_eq!(dashboard.forum_posts, 1);

    let bmi = dashboard.current_bmi.expect("bmi on file");
    assert_eq!(bmi.reading.value, 26.12);
    assert_eq!(bmi.reading.category, BmiCategory::Overweight);
    assert_eq!(bmi.recorded_at, local(12, 11, 0));

    assert_eq!(dashboard.appointments.total_items, 4);
    assert_eq!(dashboard.appointments.total_pages, 1);
    assert_eq!(dashboard.medicines.len(), 4);
}

#[rstest]
fn patient_dashboard_without_upcoming_visits(config: DashboardConfig, now: NaiveDateTime) {
    let export = parse_export_value(
        &json!({
            "patients": [{ "patient_id": 4, "fullname": "Luz Garcia", "status": "Done" }],
            "appointments": [
                { "appointment_id": 1, "title": "Consult", "appointment_date": "2024-10-01 10:00:00", "patient_id": 4 }
            ]
        }),
        &config,
    )
    .expect("valid export");

    let dashboard =
        summarize_patient(&export, "4", now, &config.paginator()).expect("known patient");
    assert_eq!(dashboard.next_appointment, NextAppointment::NoUpcoming);
    assert_eq!(dashboard.adherence_percent, 0);
    assert!(dashboard.current_bmi.is_none());
    assert!(dashboard.todays_appointments.is_empty());
    assert_eq!(dashboard.forum_posts, 0);
}

#[rstest]
fn unknown_patient_is_an_error(export: ClinicExport, config: DashboardConfig, now: NaiveDateTime) {
    let err = summarize_patient(&export, "42", now, &config.paginator())
        .expect_err("patient 42 does not exist");
    assert!(matches!(err, MeditrackError::UnknownPatient(id) if id == "42"));
}

#[rstest]
fn staff_dashboard_matches_golden(export: ClinicExport, config: DashboardConfig, now: NaiveDateTime) {
    let dashboard = summarize_staff(
        &export,
        now,
        &config,
        "",
        &config.paginator(),
        &config.paginator(),
    );
    let actual = serde_json::to_value(dashboard).expect("could not serialize dashboard");

    let expected = fs::read_to_string(fixture_path("staff_dashboard.json"))
        .expect("could not read golden dashboard");
    let expected: Value = serde_json::from_str(&expected).expect("golden is not valid JSON");

    assert_eq!(actual, expected);
}

#[rstest]
fn staff_lists_carry_patient_names(
    export: ClinicExport,
    config: DashboardConfig,
    now: NaiveDateTime,
) {
    let pager = config.paginator();
    let dashboard = summarize_staff(&export, now, &config, "", &pager, &pager);

    let today: Vec<(&str, Option<&str>)> = dashboard
        .todays_appointments
        .iter()
        .map(|visit| (visit.appointment.title.as_str(), visit.patient_name.as_deref()))
        .collect();
    assert_eq!(
        today,
        vec![
            ("Blood pressure check", Some("Maria Santos")),
            ("Early screening", Some("Jose Cruz")),
            ("Dietitian session", Some("Ana Reyes")),
        ]
    );

    let value = serde_json::to_value(&dashboard.todays_appointments[0]).expect("serializable");
    assert_eq!(value["patient_name"], "Maria Santos");
    assert_eq!(value["title"], "Blood pressure check");
}

#[rstest]
fn visit_for_unknown_owner_has_no_name(config: DashboardConfig, now: NaiveDateTime) {
    let export = parse_export_value(
        &json!({
            "appointments": [
                { "appointment_id": 1, "title": "Walk-in", "appointment_date": "2024-10-15 09:00:00", "patient_id": 77 }
            ]
        }),
        &config,
    )
    .expect("valid export");

    let pager = config.paginator();
    let dashboard = summarize_staff(&export, now, &config, "", &pager, &pager);
    assert_eq!(dashboard.todays_appointments.len(), 1);
    assert_eq!(dashboard.todays_appointments[0].patient_name, None);
}

#[rstest]
fn staff_search_narrows_roster(export: ClinicExport, config: DashboardConfig, now: NaiveDateTime) {
    let mut appointments_pager = config.paginator();
    appointments_pager.handle_page_change(2);

    let dashboard = summarize_staff(
        &export,
        now,
        &config,
        "cruz",
        &config.paginator(),
        &appointments_pager,
    );

    assert_eq!(dashboard.total_patients, 3);
    assert_eq!(dashboard.roster.total_items, 1);
    assert_eq!(dashboard.roster.items[0].fullname, "Jose Cruz");
    assert_eq!(dashboard.appointments.current_page, 2);
    assert_eq!(dashboard.appointments.items.len(), 1);
    assert_eq!(dashboard.appointments.items[0].appointment.title, "Annual physical");
    assert_eq!(dashboard.appointments.items[0].patient_name.as_deref(), Some("Jose Cruz"));
}

#[rstest]
fn forum_feed_is_newest_first(export: ClinicExport, config: DashboardConfig) {
    let feed = forum_feed(&export, &config.paginator());
    let ids: Vec<&str> = feed.items.iter().map(|entry| entry.post.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "1", "3"]);

    assert_eq!(feed.items[0].author.as_deref(), Some("Jose Cruz"));
    assert_eq!(feed.items[0].tags, vec!["exercise", "heart"]);
    assert_eq!(feed.items[2].author, None);
    assert!(feed.items[2].tags.is_empty());
}

#[rstest]
#[case("2024-10-14T16:30:00.000Z", local(15, 0, 30))]
#[case("2024-10-15T08:00:00+08:00", local(15, 8, 0))]
#[case("2024-10-15 16:00:00", local(15, 16, 0))]
#[case("2024-10-15T16:00:00.250", local(15, 16, 0) + chrono::Duration::milliseconds(250))]
#[case("2024-10-15", local(15, 0, 0))]
fn timestamps_are_localized(
    config: DashboardConfig,
    #[case] text: &str,
    #[case] expected: NaiveDateTime,
) {
    assert_eq!(parse_local_timestamp(text, &config), Some(expected));
}

#[rstest]
fn garbage_timestamp_is_rejected(config: DashboardConfig) {
    assert_eq!(parse_local_timestamp("next tuesday", &config), None);
    assert_eq!(parse_local_timestamp("", &config), None);
}

#[rstest]
fn non_object_export_is_missing_data(config: DashboardConfig) {
    let err = parse_export_value(&json!([1, 2, 3]), &config).expect_err("arrays are not exports");
    assert!(matches!(err, MeditrackError::MissingData));
}

#[rstest]
fn section_must_be_an_array(config: DashboardConfig) {
    let err = parse_export_value(&json!({ "patients": "none" }), &config)
        .expect_err("patients must be a list");
    assert!(matches!(err, MeditrackError::Parse(_)));
}

#[rstest]
fn empty_export_gives_single_empty_pages(config: DashboardConfig, now: NaiveDateTime) {
    let export = parse_export_value(&json!({}), &config).expect("empty export is valid");
    let pager = config.paginator();
    let dashboard = summarize_staff(&export, now, &config, "", &pager, &pager);
    assert_eq!(dashboard.roster.total_pages, 1);
    assert!(dashboard.roster.is_empty());
    assert_eq!(dashboard.new_patients, 0);
}
