//! demos/ndvi_report.rs
//!
//! Prints the NDVI indicators, period means and anomalous years, then writes the
//! filtered table to `ndvi.csv`.
//!
//! To run this example:
//! cargo run --example ndvi_report -- data

use std::error::Error;

use enso_andino::export::to_csv_bytes;
use enso_andino::sections::NdviRequest;
use enso_andino::{Dashboard, SectionRequest, SectionView};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let data_dir = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());
    let dashboard = Dashboard::from_data_dir(data_dir);

    let response = dashboard
        .handle(SectionRequest::NdviAnnual(NdviRequest {
            ndvi_range: Some((0.0, 1.0)),
            ..Default::default()
        }))
        .await;
    for notice in &response.notices {
        println!("[{:?}] {}", notice.level, notice.message);
    }
    let Some(SectionView::NdviAnnual(view)) = response.view else {
        return Ok(());
    };

    if let Some(kpis) = view.kpis {
        println!(
            "mean {:.3}, min {:.3}, max {:.3}, trend {:?}",
            kpis.mean, kpis.min, kpis.max, kpis.trend
        );
    }
    for period in &view.periods {
        println!("{}-{}: {:?}", period.start_year, period.end_year, period.mean);
    }
    for anomaly in &view.anomalies {
        println!("{} {:.3} {:?}", anomaly.year, anomaly.value, anomaly.label);
    }

    std::fs::write("ndvi.csv", to_csv_bytes(&view.table)?)?;
    println!("Wrote ndvi.csv");
    Ok(())
}
