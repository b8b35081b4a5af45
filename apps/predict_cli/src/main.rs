use std::{fs, io, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{HttpTransport, SubmissionController, SubmitError, SubmitEvent};
use shared::{
    booking::{self, BOOKING_FIELDS},
    protocol::FormInput,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod terminal;

use config::load_settings;
use terminal::{shared_writer, ChartFormat, TerminalChartRenderer, TerminalView};

#[derive(Parser, Debug)]
#[command(name = "booking-predict", about = "Ask the booking prediction service whether a reservation will be canceled")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit one booking form and show the prediction.
    Predict(PredictArgs),
    /// List the booking form fields the service understands.
    Fields,
}

#[derive(Args, Debug)]
struct PredictArgs {
    /// Form field as `name=value`; repeatable, later values win.
    #[arg(short = 'f', long = "field", value_name = "NAME=VALUE")]
    fields: Vec<String>,
    /// JSON object of form fields, applied before `--field`.
    #[arg(long)]
    fields_file: Option<PathBuf>,
    /// Fill absent booking fields with the service defaults.
    #[arg(long)]
    with_defaults: bool,
    #[arg(long)]
    server_url: Option<String>,
    /// Settings file (defaults to ./predict.toml).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = ChartFormat::Bars)]
    chart: ChartFormat,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Command::Predict(args) => predict(args).await,
        Command::Fields => {
            print_fields();
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn predict(args: PredictArgs) -> Result<ExitCode> {
    let mut settings = load_settings(args.config.as_deref());
    if let Some(server_url) = args.server_url.clone() {
        settings.server_url = server_url;
    }

    let form = build_form(&args)?;
    for problem in booking::check_form(&form) {
        warn!(%problem, "submitting field the service may not accept");
    }

    let transport = HttpTransport::with_options(
        &settings.server_url,
        &settings.endpoint_path,
        settings.request_timeout(),
    )
    .context("invalid prediction service settings")?;
    info!(endpoint = %transport.endpoint(), fields = form.len(), "submitting booking form");

    let out = shared_writer(io::stdout());
    let err = shared_writer(io::stderr());
    let controller = SubmissionController::new(
        transport,
        TerminalView::new(out.clone(), err),
        TerminalChartRenderer::new(out, args.chart),
    );

    let mut event = SubmitEvent::new(form);
    match controller.on_submit(&mut event).await {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(SubmitError::Validation(_)) => Ok(ExitCode::from(2)),
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

fn build_form(args: &PredictArgs) -> Result<FormInput> {
    let mut form = match &args.fields_file {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read fields file '{}'", path.display()))?;
            serde_json::from_str::<FormInput>(&raw)
                .with_context(|| format!("fields file '{}' is not a flat JSON object", path.display()))?
        }
        None => FormInput::new(),
    };

    for raw in &args.fields {
        form.insert_assignment(raw)?;
    }

    if args.with_defaults {
        form = booking::with_defaults(form);
    }
    Ok(form)
}

fn print_fields() {
    for field in BOOKING_FIELDS {
        println!(
            "{:<26} {:<12} {}",
            field.name,
            format!("[{}]", field.default),
            field.describe_kind()
        );
    }
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn args(fields: &[&str]) -> PredictArgs {
        PredictArgs {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            fields_file: None,
            with_defaults: false,
            server_url: None,
            config: None,
            chart: ChartFormat::Bars,
        }
    }

    #[test]
    fn cli_fields_override_fields_file() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("booking_predict_fields_{suffix}.json"));
        fs::write(&path, r#"{"lead time": 10, "room type": "Room_Type 2"}"#).expect("write");

        let mut predict_args = args(&["lead time=45"]);
        predict_args.fields_file = Some(path.clone());
        let form = build_form(&predict_args).expect("form");

        assert_eq!(form.get("lead time"), Some("45"));
        assert_eq!(form.get("room type"), Some("Room_Type 2"));
        fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn defaults_are_only_added_on_request() {
        let form = build_form(&args(&["age=34", "flights=2"])).expect("form");
        assert_eq!(
            serde_json::to_string(&form).expect("json"),
            r#"{"age":"34","flights":"2"}"#
        );

        let mut predict_args = args(&["number of adults=3"]);
        predict_args.with_defaults = true;
        let form = build_form(&predict_args).expect("form");
        assert_eq!(form.get("number of adults"), Some("3"));
        assert_eq!(form.len(), BOOKING_FIELDS.len());
    }

    #[test]
    fn malformed_field_is_an_error() {
        assert!(build_form(&args(&["lead time"])).is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
