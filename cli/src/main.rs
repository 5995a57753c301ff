use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use meditrack_core::{DashboardConfig, NextAppointment, Paginator};
use meditrack_rows::{
    forum_feed, local_now, parse_export_str, parse_local_timestamp, summarize_patient,
    summarize_staff, ClinicExport,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "meditrack",
    about = "Derive clinic dashboard views from a JSON export of the clinic database."
)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Settings {
    /// Offset of the clinic's local zone from UTC, in minutes.
    #[arg(long, global = true, env = "MEDITRACK_UTC_OFFSET_MINUTES", allow_hyphen_values = true)]
    utc_offset_minutes: Option<i32>,

    /// Rows per page in list views.
    #[arg(long, global = true, env = "MEDITRACK_ITEMS_PER_PAGE")]
    items_per_page: Option<usize>,

    /// Print the full view as JSON instead of a summary.
    #[arg(long, global = true)]
    json: bool,
}

impl Settings {
    fn dashboard_config(&self) -> DashboardConfig {
        let mut config = DashboardConfig::default();
        if let Some(minutes) = self.utc_offset_minutes {
            config.utc_offset_minutes = minutes;
        }
        if let Some(per_page) = self.items_per_page {
            config.items_per_page = per_page;
        }
        config
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dashboard for one patient.
    Patient {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        patient_id: String,
        /// Clinic-local time to evaluate against; defaults to now.
        #[arg(long)]
        now: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Staff overview with the patient roster.
    Staff {
        #[arg(short, long)]
        input: PathBuf,
        /// Only list patients whose name contains this text.
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        now: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Forum posts, newest first.
    Forum {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Compute a BMI reading from weight and height.
    Bmi {
        /// Weight in kilograms.
        #[arg(long)]
        weight: f64,
        /// Height in metres.
        #[arg(long)]
        height: f64,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("meditrack=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.settings.dashboard_config();
    let json = cli.settings.json;

    match cli.command {
        Command::Patient {
            input,
            patient_id,
            now,
            page,
        } => {
            let export = load_export(&input, &config)?;
            let now = resolve_now(now.as_deref(), &config)?;
            let pager = pager_at(&config, page);
            let dashboard = summarize_patient(&export, &patient_id, now, &pager)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
                return Ok(());
            }

            println!("Patient: {}", dashboard.patient.fullname);
            println!("Next appointment: {}", describe_next(&dashboard.next_appointment));
            println!("Appointments today: {}", dashboard.todays_appointments.len());
            println!("Medication adherence: {}%", dashboard.adherence_percent);
            println!("Forum posts: {}", dashboard.forum_posts);
            match &dashboard.current_bmi {
                Some(bmi) => println!(
                    "BMI: {} (recorded {})",
                    bmi.reading,
                    bmi.recorded_at.format("%b %-d, %Y")
                ),
                None => println!("BMI: none recorded"),
            }
        }
        Command::Staff {
            input,
            search,
            now,
            page,
        } => {
            let export = load_export(&input, &config)?;
            let now = resolve_now(now.as_deref(), &config)?;
            let roster_pager = pager_at(&config, page);
            let dashboard = summarize_staff(
                &export,
                now,
                &config,
                &search,
                &roster_pager,
                &config.paginator(),
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
                return Ok(());
            }

            println!(
                "Patients: {} ({} new)\nAppointments today: {}",
                dashboard.total_patients,
                dashboard.new_patients,
                dashboard.todays_appointments.len()
            );
            for visit in &dashboard.todays_appointments {
                println!(
                    "  {} {} ({})",
                    visit.appointment.scheduled_at.format("%-I:%M %p"),
                    visit.patient_name.as_deref().unwrap_or("unknown patient"),
                    visit.appointment.title
                );
            }
            println!(
                "Roster page {}/{}:",
                dashboard.roster.current_page, dashboard.roster.total_pages
            );
            for row in &dashboard.roster.items {
                println!(
                    "  {:<24} last visit {:<14} next {}",
                    row.fullname,
                    format_day(row.last_visit),
                    format_day(row.next_appointment)
                );
            }
        }
        Command::Forum { input, page } => {
            let export = load_export(&input, &config)?;
            let feed = forum_feed(&export, &pager_at(&config, page));

            if json {
                println!("{}", serde_json::to_string_pretty(&feed)?);
                return Ok(());
            }

            println!("Forum page {}/{}:", feed.current_page, feed.total_pages);
            for entry in &feed.items {
                println!(
                    "  {} by {} [{}]",
                    entry.post.title,
                    entry.author.as_deref().unwrap_or("unknown"),
                    entry.tags.join(", ")
                );
            }
        }
        Command::Bmi { weight, height } => {
            let reading = meditrack_core::assess_bmi(weight, height)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reading)?);
            } else {
                println!("{reading}");
            }
        }
    }

    Ok(())
}

fn load_export(path: &Path, config: &DashboardConfig) -> anyhow::Result<ClinicExport> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("could not read file {path:?}"))?;
    let export = parse_export_str(&data, config)
        .with_context(|| format!("could not parse export {path:?}"))?;
    info!(
        patients = export.patients.len(),
        appointments = export.appointments.len(),
        "loaded clinic export"
    );
    Ok(export)
}

fn resolve_now(now: Option<&str>, config: &DashboardConfig) -> anyhow::Result<NaiveDateTime> {
    match now {
        Some(text) => parse_local_timestamp(text, config)
            .with_context(|| format!("could not read timestamp {text:?}")),
        None => Ok(local_now(config)),
    }
}

fn pager_at(config: &DashboardConfig, page: usize) -> Paginator {
    let mut pager = config.paginator();
    pager.handle_page_change(page);
    pager
}

fn describe_next(next: &NextAppointment) -> String {
    match next {
        NextAppointment::NoAppointment => "No appointment".to_string(),
        NextAppointment::NoUpcoming => "No upcoming appointments".to_string(),
        NextAppointment::Found(appointment) => format!(
            "{} ({})",
            appointment.scheduled_at.format("%b %-d, %Y %-I:%M %p"),
            appointment.title
        ),
    }
}

fn format_day(value: Option<NaiveDateTime>) -> String {
    value
        .map(|dt| dt.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}
