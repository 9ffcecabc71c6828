//! demos/compare_stations.rs
//!
//! Compares every station through the section interface and prints the summary
//! table with its notices.
//!
//! To run this example:
//! cargo run --example compare_stations -- data

use std::error::Error;

use enso_andino::sections::{CompareRequest, CompareView, Comparison};
use enso_andino::{Dashboard, SectionRequest, SectionView, Station};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let data_dir = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());
    let dashboard = Dashboard::from_data_dir(data_dir);

    let response = dashboard
        .handle(SectionRequest::CompareStations(CompareRequest {
            stations: Some(Station::all()),
            comparison: Comparison::SummaryTable,
            filters: Default::default(),
        }))
        .await;

    for notice in &response.notices {
        println!("[{:?}] {}", notice.level, notice.message);
    }
    if let Some(SectionView::CompareStations(CompareView::SummaryTable { table, .. })) = response.view {
        println!("{}", table);
    }

    // The same rows, stacked, straight from the façade
    let (combined, failures) = dashboard.compare().stations(Station::all()).call().await?;
    println!("{} rows loaded, {} station(s) failed", combined.frame.collect()?.height(), failures.len());
    Ok(())
}
