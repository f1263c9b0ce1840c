use crate::infra::parse_timestamp;
use chrono::{DateTime, Utc};
use clap::Args;
use service_advisor::config::AppConfig;
use service_advisor::error::AppError;
use service_advisor::telemetry;
use service_advisor::workflows::maintenance::{
    parse_history_csv, predict_from_reader, resolve, PredictionError, PredictionOutcome,
    RequestPayload, StoredServiceRecord, VehicleFeatures,
};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Default)]
pub(crate) struct PredictArgs {
    /// JSON request payload to score (reads stdin when omitted)
    #[arg(long, conflicts_with = "history_csv")]
    pub(crate) input: Option<PathBuf>,
    /// Dealer service-history CSV export to score instead of a JSON payload
    #[arg(long)]
    pub(crate) history_csv: Option<PathBuf>,
    /// Only use CSV rows for this customer
    #[arg(long, requires = "history_csv")]
    pub(crate) customer_id: Option<String>,
    /// Only use CSV rows for this VIN
    #[arg(long, requires = "history_csv")]
    pub(crate) vin: Option<String>,
    /// Current odometer reading; defaults to the latest CSV row's mileage
    #[arg(long, requires = "history_csv")]
    pub(crate) mileage: Option<f64>,
    /// Evaluation instant (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Pretty-print the JSON output
    #[arg(long)]
    pub(crate) pretty: bool,
}

/// Computation failures become the fallback recommendation; only writing the
/// result can fail this command.
pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    // stdout carries only the JSON response
    if let Err(err) = init_logging() {
        eprintln!("warning: continuing without logging ({err})");
    }

    let now = args.now.unwrap_or_else(Utc::now);
    let outcome = predict(&args, now);
    let response = outcome.into_response();

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{rendered}");
    Ok(())
}

fn init_logging() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(())
}

pub(crate) fn predict(args: &PredictArgs, now: DateTime<Utc>) -> PredictionOutcome {
    if let Some(path) = &args.history_csv {
        return resolve(payload_from_csv(path, args), now);
    }

    match &args.input {
        Some(path) => match File::open(path) {
            Ok(file) => predict_from_reader(BufReader::new(file), now),
            Err(err) => resolve(Err(err.into()), now),
        },
        None => predict_from_reader(io::stdin().lock(), now),
    }
}

fn payload_from_csv(path: &Path, args: &PredictArgs) -> Result<RequestPayload, PredictionError> {
    let file = File::open(path)?;
    let records: Vec<StoredServiceRecord> = parse_history_csv(BufReader::new(file))?
        .into_iter()
        .filter(|record| {
            args.customer_id
                .as_deref()
                .map_or(true, |id| record.customer_id == id)
                && args.vin.as_deref().map_or(true, |vin| record.vin == vin)
        })
        .collect();

    let mileage_km = args
        .mileage
        .or_else(|| records.iter().rev().find_map(|record| record.mileage_km))
        .unwrap_or(0.0);

    Ok(RequestPayload {
        customer_id: args.customer_id.clone(),
        vin: args.vin.clone(),
        history: records
            .iter()
            .map(StoredServiceRecord::to_service_record)
            .collect(),
        vehicle_features: VehicleFeatures::with_mileage(mileage_km),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use service_advisor::config::ConfigError;
    use service_advisor::workflows::maintenance::ServiceCode;
    use std::io::Write;

    const HEADER: &str =
        "Record ID,Customer ID,VIN,Date,Mileage KM,Service Codes,Issues Reported\n";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn write_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("fixture written");
        file
    }

    fn codes(outcome: PredictionOutcome) -> Vec<ServiceCode> {
        outcome
            .into_response()
            .recommendations
            .iter()
            .map(|rec| rec.service_code)
            .collect()
    }

    #[test]
    fn scores_json_input_file() {
        let file = write_file(
            r#"{"history":[{"issues_reported":["grinding brakes"]}],"vehicle_features":{"mileage_km":5000}}"#,
        );
        let args = PredictArgs {
            input: Some(file.path().to_path_buf()),
            ..PredictArgs::default()
        };

        let outcome = predict(&args, now());
        assert!(!outcome.is_fallback());
        assert_eq!(codes(outcome), vec![ServiceCode::BrakeCheck]);
    }

    #[test]
    fn missing_input_file_falls_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = PredictArgs {
            input: Some(dir.path().join("absent.json")),
            ..PredictArgs::default()
        };

        let outcome = predict(&args, now());
        assert!(outcome.is_fallback());
        assert_eq!(codes(outcome), vec![ServiceCode::Periodic10k]);
    }

    #[test]
    fn csv_history_is_filtered_and_uses_latest_mileage() {
        let file = write_file(&format!(
            "{HEADER}R1,C1,VIN1,2024-12-01,9500,PERIODIC_10K,\n\
             R2,C2,VIN2,2025-01-10,64000,,Brake noise\n\
             R3,C1,VIN1,2025-05-20,19200,,Clutch slipping\n"
        ));
        let args = PredictArgs {
            history_csv: Some(file.path().to_path_buf()),
            customer_id: Some("C1".to_string()),
            vin: Some("VIN1".to_string()),
            ..PredictArgs::default()
        };

        let outcome = predict(&args, now());
        let codes = codes(outcome);
        assert!(codes.contains(&ServiceCode::Periodic20k));
        assert!(codes.contains(&ServiceCode::ClutchAdjust));
        assert!(!codes.contains(&ServiceCode::BrakeCheck));
    }

    #[test]
    fn logging_setup_reports_bad_configuration() {
        let previous = std::env::var("APP_PORT").ok();
        std::env::set_var("APP_PORT", "not-a-port");

        let result = init_logging();

        match previous {
            Some(value) => std::env::set_var("APP_PORT", value),
            None => std::env::remove_var("APP_PORT"),
        }
        match result {
            Err(AppError::Config(ConfigError::InvalidPort)) => {}
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn bad_csv_falls_back() {
        let file = write_file(&format!("{HEADER}R1,C1,VIN1,2025-01-01,far,,\n"));
        let args = PredictArgs {
            history_csv: Some(file.path().to_path_buf()),
            ..PredictArgs::default()
        };

        let outcome = predict(&args, now());
        assert!(outcome.is_fallback());
        let response = outcome.into_response();
        assert!(response.recommendations[0].reason.contains("mileage `far`"));
    }
}
