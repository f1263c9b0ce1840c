use crate::infra::{parse_timestamp, InMemoryHistoryRepository};
use chrono::{DateTime, Utc};
use clap::Args;
use service_advisor::error::AppError;
use service_advisor::workflows::maintenance::{
    parse_history_csv, CustomerVehicle, PredictionRequest, PredictiveMaintenanceService,
    StoredServiceRecord,
};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

const DEMO_CUSTOMER: &str = "CUST-DEMO";
const DEMO_VIN: &str = "MA1DEMO0000000042";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Service-history CSV export to replace the built-in sample records
    #[arg(long)]
    pub(crate) history_csv: Option<PathBuf>,
    /// Customer to report on (defaults to the sample customer)
    #[arg(long)]
    pub(crate) customer_id: Option<String>,
    /// Vehicle to report on (defaults to the sample VIN)
    #[arg(long)]
    pub(crate) vin: Option<String>,
    /// Evaluation instant (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    pub(crate) now: Option<DateTime<Utc>>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let records = match &args.history_csv {
        Some(path) => parse_history_csv(BufReader::new(File::open(path)?))?,
        None => sample_history(),
    };

    let mut repository = InMemoryHistoryRepository::with_records(records);
    repository.register_vehicle(
        DEMO_CUSTOMER,
        CustomerVehicle {
            vin: DEMO_VIN.to_string(),
            model: Some("Swift VXi".to_string()),
            year: Some(2019),
        },
    );
    let service = PredictiveMaintenanceService::new(Arc::new(repository));

    let request = PredictionRequest {
        customer_id: Some(args.customer_id.unwrap_or_else(|| DEMO_CUSTOMER.to_string())),
        vin: Some(args.vin.unwrap_or_else(|| DEMO_VIN.to_string())),
    };
    let now = args.now.unwrap_or_else(Utc::now);
    let reply = service.predict(&request, now)?;

    println!("Predictive maintenance demo");
    println!(
        "Customer {} / VIN {} evaluated at {}",
        reply.customer_id,
        reply.vin,
        now.format("%Y-%m-%d %H:%M UTC")
    );
    println!("Recommendations:");
    for (index, recommendation) in reply.recommendations.iter().enumerate() {
        println!(
            "  {}. {} [{} / priority {}] within {}",
            index + 1,
            recommendation.service_code,
            recommendation.urgency_label.label(),
            recommendation.priority,
            recommendation.recommended_window
        );
        println!("     {}", recommendation.reason);
    }

    Ok(())
}

fn sample_history() -> Vec<StoredServiceRecord> {
    let visit = |id: &str, date: &str, mileage_km: f64, issues: &[&str]| StoredServiceRecord {
        record_id: id.to_string(),
        customer_id: DEMO_CUSTOMER.to_string(),
        vin: DEMO_VIN.to_string(),
        date: Some(date.to_string()),
        service_codes_performed: vec!["PERIODIC_10K".to_string()],
        mileage_km: Some(mileage_km),
        issues_reported: issues.iter().map(|issue| issue.to_string()).collect(),
    };

    vec![
        visit("SR-1001", "2023-11-18", 10_120.0, &[]),
        visit("SR-1002", "2024-06-02", 19_870.0, &["AC not cooling in traffic"]),
        visit(
            "SR-1003",
            "2025-05-27",
            29_450.0,
            &["Brake squeal at low speed", "Clutch feels heavy"],
        ),
    ]
}
