use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use grant_forms::config::AppConfig;
use grant_forms::error::AppError;
use grant_forms::telemetry;
use grant_forms::workflows::grants::applications::{
    ApplicationServiceError, ApplicationStateStore, ExpiryReminder, ExpirySweep, FixedClock,
    InMemoryApplicationRepository, PendingApplication, ReminderError, ReminderSender,
};
use grant_forms::workflows::grants::{
    community_grant_form, FormData, FormModel, Locale, NavigationResolver, StepOutcome,
    ValidationContext,
};
use serde::Serialize;
use serde_json::json;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "grant-forms",
    about = "Walk, validate, and summarise community grant applications from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the next (or previous) step after a given step
    Navigate(NavigateArgs),
    /// Validate a full set of answers and print localized error messages
    Validate(AnswersArgs),
    /// Print the answered steps and application overview
    Summary(AnswersArgs),
    /// Send expiry reminders and delete expired applications from a JSON export
    Sweep(SweepArgs),
}

#[derive(Args, Debug)]
struct NavigateArgs {
    /// Section slug, e.g. `your-project`
    #[arg(long)]
    section: String,
    /// One-based step number within the section
    #[arg(long)]
    step: usize,
    /// JSON file holding the answers given so far
    #[arg(long)]
    data: Option<PathBuf>,
    /// Resolve the previous step instead of the next one
    #[arg(long)]
    back: bool,
    /// Validate the current step against this date (defaults to today)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct AnswersArgs {
    /// JSON file holding the answers
    #[arg(long)]
    data: PathBuf,
    /// Output language (`en` or `cy`); defaults to APP_DEFAULT_LOCALE
    #[arg(long, value_parser = parse_locale)]
    locale: Option<Locale>,
    /// Evaluation date for relative date rules (defaults to today)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct SweepArgs {
    /// JSON array of pending applications
    #[arg(long)]
    applications: PathBuf,
    /// Instant to sweep at, RFC 3339 (defaults to now)
    #[arg(long, value_parser = parse_instant)]
    now: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct ValidationOutput {
    valid: bool,
    errors: std::collections::BTreeMap<String, String>,
}

/// Writes reminders to the log instead of sending mail.
struct LoggingReminders;

impl ReminderSender for LoggingReminders {
    fn send(&self, reminder: &ExpiryReminder) -> Result<(), ReminderError> {
        info!(
            application = %reminder.application_id,
            user = %reminder.user_id,
            kind = reminder.expiration_type.label(),
            expires_at = %reminder.expires_at,
            "expiry reminder"
        );
        Ok(())
    }
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let form = community_grant_form()?;
    info!(form = form.id(), environment = ?config.environment, "form loaded");

    match cli.command {
        Command::Navigate(args) => run_navigate(&form, args),
        Command::Validate(args) => {
            let locale = args.locale.unwrap_or(config.applications.default_locale);
            run_validate(&form, args, locale)
        }
        Command::Summary(args) => {
            let locale = args.locale.unwrap_or(config.applications.default_locale);
            run_summary(&form, args, locale)
        }
        Command::Sweep(args) => run_sweep(&config, args),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}

fn parse_locale(raw: &str) -> Result<Locale, String> {
    match raw.trim() {
        "en" | "cy" => Ok(Locale::from_code(raw)),
        other => Err(format!("unsupported locale '{other}', expected en or cy")),
    }
}

fn read_answers(path: &Path) -> Result<FormData, AppError> {
    let raw = fs::read_to_string(path)?;
    match serde_json::from_str::<serde_json::Value>(&raw)? {
        serde_json::Value::Object(answers) => Ok(answers),
        _ => Err(AppError::Input(format!(
            "{} must contain a JSON object of answers",
            path.display()
        ))),
    }
}

fn context(today: Option<NaiveDate>) -> ValidationContext<'static> {
    ValidationContext::new(today.unwrap_or_else(|| Local::now().date_naive()))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_navigate(form: &FormModel, args: NavigateArgs) -> Result<(), AppError> {
    let NavigateArgs {
        section,
        step,
        data,
        back,
        today,
    } = args;

    let (section_index, step_index) = form.locate(&section, step).ok_or_else(|| {
        AppError::Input(format!("no step {step} in section '{section}'"))
    })?;
    let answers = match data {
        Some(path) => read_answers(&path)?,
        None => FormData::new(),
    };

    let resolver = NavigationResolver::new(form);
    let destination = if back {
        resolver
            .previous(section_index, step_index, &answers)
            .map_err(ApplicationServiceError::from)?
    } else {
        let ctx = context(today);
        let outcome = resolver
            .advance(section_index, step_index, &answers, &ctx)
            .map_err(ApplicationServiceError::from)?;
        match outcome {
            StepOutcome::Proceed { destination, .. } => destination,
            StepOutcome::Blocked(report) => {
                let errors = form.error_messages(&report.errors, Locale::En);
                return print_json(&json!({ "blocked": true, "errors": errors }));
            }
        }
    };

    print_json(&destination)
}

fn run_validate(form: &FormModel, args: AnswersArgs, locale: Locale) -> Result<(), AppError> {
    let answers = read_answers(&args.data)?;
    let report = form.validate(&answers, &context(args.today));
    print_json(&ValidationOutput {
        valid: report.is_valid(),
        errors: form.error_messages(&report.errors, locale),
    })
}

fn run_summary(form: &FormModel, args: AnswersArgs, locale: Locale) -> Result<(), AppError> {
    let answers = read_answers(&args.data)?;
    let report = form.validate(&answers, &context(args.today));
    print_json(&json!({
        "overview": form.overview(locale, &report.value),
        "steps": form.get_steps_with_values(locale, &report.value),
    }))
}

fn run_sweep(config: &AppConfig, args: SweepArgs) -> Result<(), AppError> {
    let raw = fs::read_to_string(&args.applications)?;
    let pending: Vec<PendingApplication> = serde_json::from_str(&raw)?;
    let now = args.now.unwrap_or_else(Utc::now);
    info!(applications = pending.len(), %now, "starting expiry sweep");

    let repository = Arc::new(InMemoryApplicationRepository::with_pending(pending));
    let store = Arc::new(ApplicationStateStore::with_clock(
        repository,
        Arc::new(FixedClock(now)),
        &config.applications,
    ));
    let sweep = ExpirySweep::new(
        store,
        Arc::new(LoggingReminders),
        config.applications.reminders.clone(),
    );

    let report = sweep.run().map_err(ApplicationServiceError::from)?;
    print_json(&report)
}
