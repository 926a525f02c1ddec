use chrono::NaiveDate;
use sales_report_builder::*;

fn row(
    dealer: &str,
    nomenclature: &str,
    group: &str,
    quantity: i64,
    pcs_container: i64,
    turnover: f64,
    margin: f64,
    date: &str,
) -> RawRow {
    [
        (DEALER_NAME, RawValue::from(dealer)),
        (NOMENCLATURE, RawValue::from(nomenclature)),
        (BRAND, RawValue::from("Northwind")),
        (TOTAL_POWER_MW, RawValue::from(0.0045)),
        (PCS_CONTAINER, RawValue::from(pcs_container)),
        (NOMEN_GROUP_PARENT, RawValue::from(group)),
        (QUANTITY_REGISTER_UOM, RawValue::from(quantity)),
        (REGISTER_UOM, RawValue::from("pcs")),
        (TOTAL_FINAL_PRICE_CZK, RawValue::from(turnover)),
        (GROSS_MARGIN_CZK, RawValue::from(margin)),
        (DELIVERY_DATE, RawValue::from(date)),
    ]
    .into_iter()
    .map(|(column, value)| (column.to_string(), value))
    .collect()
}

fn main() {
    let rows = vec![
        row("Acme Solar s.r.o.", "Inverter 5kW hybrid with battery port", "Inverters", 10, 5, 1000.0, 200.0, "15/01/2024"),
        row("Acme Solar s.r.o.", "Panel 410Wp mono", "Panels", 36, 36, 86_400.0, 9_150.5, "04/03/2024"),
        row("Bolt Energy", "Panel 410Wp mono", "Panels", 72, 36, 170_100.0, 16_800.0, "08/03/2024"),
        row("Bolt Energy", "Mounting kit flat roof", "Accessories", 12, 0, 14_400.0, 3_100.0, "20/02/2024"),
    ];

    let reference = NaiveDate::from_ymd_opt(2024, 3, 10)
        .and_then(|d| d.and_hms_opt(18, 0, 0))
        .expect("valid reference date");

    let config = ReportConfig {
        output_dir: std::env::temp_dir().join("sales_report_demo"),
        ..ReportConfig::default()
    };
    let observer = RecordingObserver::new();
    let pipeline = SalesReportPipeline::new(config, &observer);

    for report in pipeline.compose_reports(&rows, reference) {
        println!("{} ({} sections)", report.title, report.sections.len());
        for dealer in report.dealer_names() {
            println!("  dealer page: {}", dealer);
        }
    }

    match pipeline.run(&rows, reference) {
        Ok(paths) => {
            for path in paths {
                println!("Wrote {}", path.display());
            }
        }
        Err(e) => eprintln!("Report generation failed: {}", e),
    }

    println!("\nRun events:");
    for event in observer.events() {
        println!(" - {:?}", event);
    }
}
