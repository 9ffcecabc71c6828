//! demos/phase_boxplot.rs
//!
//! Loads the precipitation table of one station, keeps the El Niño and La Niña
//! months and plots precipitation per ENSO phase.
//!
//! To run this example:
//! cargo run --example phase_boxplot --features demos -- data 2

use std::error::Error;

use enso_andino::columns::{ENSO_PHASE, PRECIPITATION};
use enso_andino::{Dashboard, EnsoPhase, FilterSet, InclusionFilter, Station};
use plotlars::{BoxPlot, Orientation, Plot, Rgb, Text};
use polars::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let data_dir = args.next().unwrap_or_else(|| "data".to_string());
    let station: Station = args.next().as_deref().unwrap_or("2").parse()?;

    let dashboard = Dashboard::from_data_dir(&data_dir);
    let observations: DataFrame = dashboard
        .observations()
        .station(station)
        .filters(FilterSet::new().with(InclusionFilter::phases([EnsoPhase::Nino, EnsoPhase::Nina])))
        .call()
        .await?
        .frame
        .collect()?;

    println!("{} months of El Niño or La Niña at {}", observations.height(), station);
    plot_phases(&observations, station);
    Ok(())
}

fn plot_phases(data: &DataFrame, station: Station) {
    BoxPlot::builder()
        .data(data)
        .labels(ENSO_PHASE)
        .values(PRECIPITATION)
        .orientation(Orientation::Vertical)
        .colors(vec![Rgb(214, 39, 40), Rgb(31, 119, 180)])
        .plot_title(Text::from(format!("Precipitación por fase ENSO - {}", station)).size(18))
        .x_title("Fase ENSO")
        .y_title("Precipitación (mm)")
        .build()
        .plot();
}
