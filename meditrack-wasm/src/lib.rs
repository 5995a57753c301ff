//! WASM <-> JavaScript bridge for the dashboard derivations.

use chrono::NaiveDateTime;
use meditrack_core::{DashboardConfig, MeditrackError};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsDashboardConfig {
    #[serde(default)]
    utc_offset_minutes: Option<i32>,
    #[serde(default)]
    items_per_page: Option<usize>,
    #[serde(default)]
    new_patient_status: Option<String>,
}

impl From<JsDashboardConfig> for DashboardConfig {
    fn from(cfg: JsDashboardConfig) -> Self {
        let mut base = DashboardConfig::default();
        if let Some(minutes) = cfg.utc_offset_minutes {
            base.utc_offset_minutes = minutes;
        }
        if let Some(per_page) = cfg.items_per_page {
            base.items_per_page = per_page;
        }
        if let Some(status) = cfg.new_patient_status {
            base.new_patient_status = status;
        }
        base
    }
}

/// Paging and clock inputs supplied by the calling view.
#[derive(Deserialize, Default)]
struct JsViewState {
    #[serde(default)]
    now: Option<String>,
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    appointments_page: Option<usize>,
    #[serde(default)]
    search: Option<String>,
}

#[wasm_bindgen]
pub fn patient_dashboard(
    export: JsValue,
    patient_id: String,
    view: Option<JsValue>,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let cfg = read_config(config)?;
    let view = read_view(view)?;
    let clinic = read_export(export, &cfg)?;
    let now = resolve_now(view.now.as_deref(), &cfg)?;

    let mut pager = cfg.paginator();
    pager.handle_page_change(view.page.unwrap_or(1));

    let dashboard = meditrack_rows::summarize_patient(&clinic, &patient_id, now, &pager)
        .map_err(|err| JsValue::from_str(&format_error(err)))?;

    to_value(&dashboard)
        .map_err(|err| JsValue::from_str(&format!("could not serialize dashboard: {err}")))
}

#[wasm_bindgen]
pub fn staff_dashboard(
    export: JsValue,
    view: Option<JsValue>,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();

    let cfg = read_config(config)?;
    let view = read_view(view)?;
    let clinic = read_export(export, &cfg)?;
    let now = resolve_now(view.now.as_deref(), &cfg)?;

    let mut roster_pager = cfg.paginator();
    roster_pager.handle_page_change(view.page.unwrap_or(1));
    let mut appointments_pager = cfg.paginator();
    appointments_pager.handle_page_change(view.appointments_page.unwrap_or(1));

    let dashboard = meditrack_rows::summarize_staff(
        &clinic,
        now,
        &cfg,
        view.search.as_deref().unwrap_or_default(),
        &roster_pager,
        &appointments_pager,
    );

    to_value(&dashboard)
        .map_err(|err| JsValue::from_str(&format!("could not serialize dashboard: {err}")))
}

#[wasm_bindgen]
pub fn forum_feed(
    export: JsValue,
    view: Option<JsValue>,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    let cfg = read_config(config)?;
    let view = read_view(view)?;
    let clinic = read_export(export, &cfg)?;

    let mut pager = cfg.paginator();
    pager.handle_page_change(view.page.unwrap_or(1));

    to_value(&meditrack_rows::forum_feed(&clinic, &pager))
        .map_err(|err| JsValue::from_str(&format!("could not serialize feed: {err}")))
}

#[wasm_bindgen]
pub fn assess_bmi(weight_kg: f64, height_m: f64) -> Result<JsValue, JsValue> {
    let reading = meditrack_core::assess_bmi(weight_kg, height_m)
        .map_err(|err| JsValue::from_str(&format_error(err)))?;

    to_value(&reading)
        .map_err(|err| JsValue::from_str(&format!("could not serialize reading: {err}")))
}

fn read_config(config: Option<JsValue>) -> Result<DashboardConfig, JsValue> {
    match config {
        Some(js_cfg) => {
            let cfg: JsDashboardConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("could not read config: {err}")))?;
            Ok(DashboardConfig::from(cfg))
        }
        None => Ok(DashboardConfig::default()),
    }
}

fn read_view(view: Option<JsValue>) -> Result<JsViewState, JsValue> {
    match view {
        Some(js_view) => from_value(js_view)
            .map_err(|err| JsValue::from_str(&format!("could not read view state: {err}"))),
        None => Ok(JsViewState::default()),
    }
}

fn read_export(
    export: JsValue,
    cfg: &DashboardConfig,
) -> Result<meditrack_rows::ClinicExport, JsValue> {
    let value = from_value::<serde_json::Value>(export)
        .map_err(|err| JsValue::from_str(&format!("could not read export JSON: {err}")))?;
    meditrack_rows::parse_export_value(&value, cfg)
        .map_err(|err| JsValue::from_str(&format_error(err)))
}

fn resolve_now(now: Option<&str>, cfg: &DashboardConfig) -> Result<NaiveDateTime, JsValue> {
    match now {
        Some(text) => meditrack_rows::parse_local_timestamp(text, cfg)
            .ok_or_else(|| JsValue::from_str(&format!("could not read timestamp {text:?}"))),
        None => Ok(meditrack_rows::local_now(cfg)),
    }
}

fn format_error(err: MeditrackError) -> String {
    format!("Dashboard error: {err}")
}
