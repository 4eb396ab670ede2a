use std::fmt::Display;
use std::path::{Path, PathBuf};

use plotters::prelude::*;

use crate::analysis::Analysis;
use crate::error::{AnalysisWarning, ChartError};
use crate::loader::Dataset;
use crate::models::{OwnerCount, PortfolioBucket};

pub const DISTRIBUTION_CHART: &str = "ownership_distribution.png";
pub const GEOGRAPHIC_CHART: &str = "geographic_concentration.png";
pub const GEO_OWNERS: usize = 5;

const PALETTE: [RGBColor; GEO_OWNERS] = [
    RED,
    BLUE,
    GREEN,
    RGBColor(255, 165, 0),
    RGBColor(128, 0, 128),
];

#[derive(Debug, Clone, PartialEq)]
pub struct GeoSeries {
    pub owner: String,
    pub points: Vec<(f64, f64)>,
}

/// Longitude/latitude points for the largest owners. Owners without a single
/// geocoded property are left out.
pub fn geo_series(
    dataset: &Dataset,
    owner_counts: &OwnerCount,
    owners: usize,
) -> Result<Vec<GeoSeries>, AnalysisWarning> {
    if !dataset.has_coordinates() {
        return Err(AnalysisWarning::NoGeodata);
    }

    let series: Vec<GeoSeries> = owner_counts
        .iter()
        .take(owners)
        .map(|tally| GeoSeries {
            owner: tally.owner.clone(),
            points: dataset
                .owned_by(&tally.owner)
                .into_iter()
                .filter_map(|record| record.coordinates())
                .collect(),
        })
        .filter(|series| !series.points.is_empty())
        .collect();

    if series.is_empty() {
        return Err(AnalysisWarning::NoGeodata);
    }
    Ok(series)
}

fn render_failed(path: &Path, err: &dyn Display) -> ChartError {
    ChartError::Render {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

pub fn render_distribution(buckets: &[PortfolioBucket], path: &Path) -> Result<(), ChartError> {
    let fail = |err: &dyn Display| render_failed(path, err);

    let root = BitMapBackend::new(path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| fail(&e))?;

    let max_owners = buckets.iter().map(|b| b.owners).max().unwrap_or(1) as f64;
    let slots = buckets.len().max(1) as f64;
    let mut chart = ChartBuilder::on(&root)
        .caption("Distribution of Property Ownership", ("sans-serif", 28))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..slots - 0.5, 0f64..max_owners * 1.1)
        .map_err(|e| fail(&e))?;

    let labels: Vec<String> = buckets
        .iter()
        .map(|b| b.portfolio_size.to_string())
        .collect();
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(buckets.len().max(1))
        .x_label_formatter(&|x: &f64| {
            let idx = x.round();
            if (x - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .x_desc("Number of Properties Owned")
        .y_desc("Number of Owners")
        .draw()
        .map_err(|e| fail(&e))?;

    chart
        .draw_series(buckets.iter().enumerate().map(|(idx, bucket)| {
            let x = idx as f64;
            Rectangle::new([(x - 0.4, 0.0), (x + 0.4, bucket.owners as f64)], BLUE.filled())
        }))
        .map_err(|e| fail(&e))?;

    root.present().map_err(|e| fail(&e))?;
    Ok(())
}

pub fn render_geographic(series: &[GeoSeries], path: &Path) -> Result<(), ChartError> {
    let fail = |err: &dyn Display| render_failed(path, err);
    let (x_range, y_range) = bounds(series);

    let root = BitMapBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(|e| fail(&e))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Geographic Distribution of Top 5 Property Owners",
            ("sans-serif", 28),
        )
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| fail(&e))?;

    chart
        .configure_mesh()
        .x_desc("Longitude")
        .y_desc("Latitude")
        .draw()
        .map_err(|e| fail(&e))?;

    for (owner, color) in series.iter().zip(PALETTE) {
        chart
            .draw_series(
                owner
                    .points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 4, color.mix(0.7).filled())),
            )
            .map_err(|e| fail(&e))?
            .label(format!("{} ({} props)", owner.owner, owner.points.len()))
            .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| fail(&e))?;

    root.present().map_err(|e| fail(&e))?;
    Ok(())
}

fn bounds(series: &[GeoSeries]) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let points = series.iter().flat_map(|s| s.points.iter());
    let (mut x_lo, mut x_hi, mut y_lo, mut y_hi) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
    for &(x, y) in points {
        x_lo = x_lo.min(x);
        x_hi = x_hi.max(x);
        y_lo = y_lo.min(y);
        y_hi = y_hi.max(y);
    }
    if x_lo > x_hi {
        return (-1.0..1.0, -1.0..1.0);
    }

    let x_pad = ((x_hi - x_lo) * 0.05).max(0.001);
    let y_pad = ((y_hi - y_lo) * 0.05).max(0.001);
    (x_lo - x_pad..x_hi + x_pad, y_lo - y_pad..y_hi + y_pad)
}

/// The bitmap backend flushes on drop, so a failed render can leave a
/// half-drawn file behind.
fn discard(path: &Path, err: &ChartError) {
    log::warn!("{err}");
    if !matches!(err, ChartError::Skipped(_)) && path.exists() {
        let _ = std::fs::remove_file(path);
    }
}

/// Writes both charts into `out_dir`. Failures are logged and the chart is
/// left out; the returned paths are the files actually written.
pub fn render_all(analysis: &Analysis, dataset: &Dataset, out_dir: &Path) -> Vec<PathBuf> {
    let mut written = Vec::new();

    let distribution = out_dir.join(DISTRIBUTION_CHART);
    match render_distribution(&analysis.distribution, &distribution) {
        Ok(()) => written.push(distribution),
        Err(err) => discard(&distribution, &err),
    }

    let geographic = out_dir.join(GEOGRAPHIC_CHART);
    let rendered = geo_series(dataset, &analysis.owner_counts, GEO_OWNERS)
        .map_err(ChartError::from)
        .and_then(|series| render_geographic(&series, &geographic));
    match rendered {
        Ok(()) => written.push(geographic),
        Err(err) => discard(&geographic, &err),
    }

    written
}
