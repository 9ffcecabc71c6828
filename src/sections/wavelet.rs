use crate::analysis::error::AnalysisError;
use crate::analysis::wavelet::{cwt, prepare_signal, scales, WaveletKind, WaveletTransform};
use crate::error::EnsoError;
use crate::sections::{Notice, SectionContext, SectionKind, SectionResponse, SectionView};
use crate::types::columns::DATE;
use crate::types::dataset::DatasetKind;
use crate::types::station::Station;
use crate::utils::{f64_values, numeric_columns};
use log::debug;
use polars::prelude::{Column, DataFrame};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WaveletRequest {
    pub station: Station,
    /// `None` picks the first numeric variable.
    #[serde(default)]
    pub variable: Option<String>,
    #[serde(default)]
    pub wavelet: Option<WaveletKind>,
    #[serde(default)]
    pub num_scales: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct WaveletView {
    pub station: Station,
    /// Numeric variables of the wavelet table.
    pub variables: Vec<String>,
    pub variable: String,
    /// `Fecha` and the gap-filled signal that was transformed.
    pub series: DataFrame,
    pub transform: WaveletTransform,
}

pub(crate) async fn render(ctx: SectionContext<'_>, request: WaveletRequest) -> Result<SectionResponse, EnsoError> {
    let kind = SectionKind::Wavelet;
    let table = ctx.fetcher.get_frame(Some(request.station), DatasetKind::Wavelet).await?;
    let variables = numeric_columns(&table);
    let Some(variable) = request.variable.or_else(|| variables.first().cloned()) else {
        return Ok(SectionResponse::empty(kind).notice(Notice::warning(
            "No hay variables numéricas para analizar.",
        )));
    };
    if !variables.contains(&variable) {
        return Err(AnalysisError::UnknownColumn(variable).into());
    }

    let settings = &ctx.config.wavelet;
    let wavelet = request.wavelet.unwrap_or(settings.kind);
    let scales = scales(request.num_scales.unwrap_or(settings.num_scales))?;
    let signal = prepare_signal(&f64_values(&table, &variable)?)?;
    debug!(
        "Transforming {} samples of {} with {} at {} scales",
        signal.len(),
        variable,
        wavelet,
        scales.len()
    );
    let transform = cwt(&signal, &scales, wavelet)?;

    let series = DataFrame::new(vec![
        table.column(DATE)?.clone(),
        Column::new(variable.as_str().into(), signal),
    ])?;
    let view = WaveletView {
        station: request.station,
        variables,
        variable,
        series,
        transform,
    };
    Ok(SectionResponse::new(kind, SectionView::Wavelet(view)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::loading::frame_fetcher::FrameFetcher;
    use crate::sections::test_data::write_csv;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_table(root: &Path) {
        let mut csv = String::from("FECHA,Precipitacion,SPI\n");
        for i in 0..40 {
            let spi = if i == 5 { String::new() } else { format!("{:.2}", (i as f64 / 3.0).sin()) };
            csv.push_str(&format!("{}-{:02}-01,{},{}\n", 1992 + i / 12, i % 12 + 1, 100 + i, spi));
        }
        csv.push_str("no es fecha,1,1\n");
        write_csv(root, "Estacion 5", "wavelet 1", &csv);
    }

    async fn run(root: &Path, request: WaveletRequest) -> Result<SectionResponse, EnsoError> {
        let config = DashboardConfig::with_data_dir(root);
        let fetcher = FrameFetcher::new(root, false);
        render(SectionContext { fetcher: &fetcher, config: &config }, request).await
    }

    #[tokio::test]
    async fn test_transform_shape() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        write_table(root.path());
        let request = WaveletRequest {
            station: Station::new(5).unwrap(),
            variable: Some("SPI".to_string()),
            wavelet: Some(WaveletKind::Morlet),
            num_scales: Some(32),
        };
        let response = run(root.path(), request).await?;
        let Some(SectionView::Wavelet(view)) = response.view else {
            panic!("expected the wavelet view");
        };
        assert_eq!(view.variables, vec!["Precipitacion", "SPI"]);
        assert_eq!(view.series.height(), 40);
        assert_eq!(view.series.column("SPI")?.null_count(), 0);
        assert_eq!(view.transform.magnitudes.len(), 31);
        assert!(view.transform.magnitudes.iter().all(|row| row.len() == 40));
        assert!(view.transform.color_ceiling > 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_defaults_and_bad_inputs() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempdir()?;
        write_table(root.path());
        let station = Station::new(5).unwrap();

        let response = run(
            root.path(),
            WaveletRequest { station, variable: None, wavelet: None, num_scales: None },
        )
        .await?;
        let Some(SectionView::Wavelet(view)) = response.view else {
            panic!("expected the wavelet view");
        };
        assert_eq!(view.variable, "Precipitacion");
        assert_eq!(view.transform.wavelet, WaveletKind::MexicanHat);
        assert_eq!(view.transform.scales.len(), 127);

        let unknown = run(
            root.path(),
            WaveletRequest { station, variable: Some("Humedad".to_string()), wavelet: None, num_scales: None },
        )
        .await;
        assert!(matches!(unknown, Err(EnsoError::Analysis(AnalysisError::UnknownColumn(_)))));

        let bad_scales = run(
            root.path(),
            WaveletRequest { station, variable: None, wavelet: None, num_scales: Some(40) },
        )
        .await;
        assert!(matches!(bad_scales, Err(EnsoError::Analysis(AnalysisError::InvalidParameter(_)))));
        Ok(())
    }
}
