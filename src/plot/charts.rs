//! SVG charts for the EDA output directory, rendered with Plotters.
//!
//! Files written by [`write_eda_charts`]:
//! - `distribution_<col>.svg`: histogram per numeric column
//! - `categorical_spectype.svg`: spectral class counts
//! - `outliers_<col>.svg`: z-score per row, outliers highlighted
//! - `multivariate.svg`: 2x2 panel (`L`-`M`, `Teff`-`L`, `R`-`M`, `met`-`M`)
//! - `collinearity.svg`: correlation heatmap
//!
//! [`write_source_comparison`] adds `compare_before_join.svg` (NEA vs Gaia).

use std::error::Error;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use nalgebra::DMatrix;
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::debug;

use crate::domain::{Feature, JoinedStar, Star};
use crate::error::AppError;
use crate::math::linregress;
use crate::prep::outliers::column_zscores;
use crate::report::eda::category_counts;

type DrawResult<T> = Result<T, Box<dyn Error>>;

const SIZE: (u32, u32) = (800, 600);
const BLUE: RGBColor = RGBColor(0x00, 0x72, 0xb2);
const ORANGE: RGBColor = RGBColor(0xd5, 0x5e, 0x00);
/// Colour-blind safe palette (Wong 2011).
const WONG: [RGBColor; 8] = [
    RGBColor(0x00, 0x00, 0x00),
    RGBColor(0xe6, 0x9f, 0x00),
    RGBColor(0x56, 0xb4, 0xe9),
    RGBColor(0x00, 0x9e, 0x73),
    RGBColor(0xf0, 0xe4, 0x42),
    RGBColor(0x00, 0x72, 0xb2),
    RGBColor(0xd5, 0x5e, 0x00),
    RGBColor(0xcc, 0x79, 0xa7),
];

/// Write every EDA chart into `dir`. Returns the written paths.
pub fn write_eda_charts(dir: &Path, stars: &[Star], threshold: f64) -> Result<Vec<PathBuf>, AppError> {
    ensure_dir(dir)?;
    let mut written = Vec::new();

    for feature in Feature::ALL {
        let path = dir.join(format!("distribution_{}.svg", feature.column()));
        let values: Vec<f64> = stars.iter().map(|s| s.get(feature)).collect();
        draw_histogram(&path, feature, &values).map_err(|e| chart_error(&path, e))?;
        written.push(path);
    }

    let path = dir.join("categorical_spectype.svg");
    draw_category_counts(&path, &category_counts(stars)).map_err(|e| chart_error(&path, e))?;
    written.push(path);

    for (feature, z) in column_zscores(stars) {
        let path = dir.join(format!("outliers_{}.svg", feature.column()));
        draw_outliers(&path, feature, &z, threshold).map_err(|e| chart_error(&path, e))?;
        written.push(path);
    }

    let path = dir.join("multivariate.svg");
    draw_multivariate(&path, stars).map_err(|e| chart_error(&path, e))?;
    written.push(path);

    let path = dir.join("collinearity.svg");
    let columns: Vec<Vec<f64>> = Feature::ALL
        .iter()
        .map(|&f| stars.iter().map(|s| s.get(f)).collect())
        .collect();
    draw_heatmap(&path, &crate::math::correlation_matrix(&columns)).map_err(|e| chart_error(&path, e))?;
    written.push(path);

    debug!(charts = written.len(), dir = %dir.display(), "wrote EDA charts");
    Ok(written)
}

/// Overlaid NEA and Gaia histograms per feature for the joined set.
pub fn write_source_comparison(dir: &Path, joined: &[JoinedStar]) -> Result<PathBuf, AppError> {
    ensure_dir(dir)?;
    let path = dir.join("compare_before_join.svg");
    draw_comparison(&path, joined).map_err(|e| chart_error(&path, e))?;
    Ok(path)
}

fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    create_dir_all(dir).map_err(|e| AppError::input(format!("Failed to create directory '{}': {e}", dir.display())))
}

fn chart_error(path: &Path, e: Box<dyn Error>) -> AppError {
    AppError::runtime(format!("Failed to draw chart '{}': {e}", path.display()))
}

/// Equal-width bins over `[min, max]`; returns `(lo, hi, count)` per bin.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<(f64, f64, usize)> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let (Some(min), Some(max)) = (
        finite.iter().copied().reduce(f64::min),
        finite.iter().copied().reduce(f64::max),
    ) else {
        return Vec::new();
    };
    let bins = bins.max(1);
    let (lo, hi) = if max > min { (min, max) } else { (min - 0.5, max + 0.5) };
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in finite {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, n)| (lo + i as f64 * width, lo + (i + 1) as f64 * width, n))
        .collect()
}

fn draw_histogram(path: &Path, feature: Feature, values: &[f64]) -> DrawResult<()> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let bins = histogram_bins(values, 20);
    draw_bins(
        &root,
        &format!("Distribution of {}", feature.column()),
        feature,
        &[(bins.as_slice(), BLUE, "")],
    )?;
    root.present()?;
    Ok(())
}

/// Draw one or more bin sets on a shared axis (labels used for the legend).
fn draw_bins(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    caption: &str,
    feature: Feature,
    sets: &[(&[(f64, f64, usize)], RGBColor, &str)],
) -> DrawResult<()> {
    let x_min = sets.iter().flat_map(|s| s.0.first()).map(|b| b.0).fold(f64::INFINITY, f64::min);
    let x_max = sets.iter().flat_map(|s| s.0.last()).map(|b| b.1).fold(f64::NEG_INFINITY, f64::max);
    let y_max = sets.iter().flat_map(|s| s.0.iter()).map(|b| b.2).max().unwrap_or(0) as f64;
    let (x_min, x_max) = if x_min.is_finite() && x_max > x_min { (x_min, x_max) } else { (0.0, 1.0) };

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, 0.0..(y_max * 1.1).max(1.0))?;
    chart
        .configure_mesh()
        .x_desc(format!("{} ({})", feature.column(), feature.unit_label()))
        .y_desc("Count")
        .draw()?;

    for &(bins, color, label) in sets {
        let series = chart.draw_series(
            bins.iter()
                .map(|&(lo, hi, n)| Rectangle::new([(lo, 0.0), (hi, n as f64)], color.mix(0.6).filled())),
        )?;
        if !label.is_empty() {
            series
                .label(label)
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
    }
    if sets.iter().any(|s| !s.2.is_empty()) {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}

fn draw_category_counts(path: &Path, counts: &[(String, usize)]) -> DrawResult<()> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let n = counts.len().max(1) as u32;
    let y_max = counts.iter().map(|c| c.1).max().unwrap_or(1) as u32;
    let labels: Vec<String> = counts.iter().map(|c| c.0.clone()).collect();

    let mut chart = ChartBuilder::on(&root)
        .caption("Counts of spectype", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d((0..n - 1).into_segmented(), 0u32..(y_max + y_max / 10 + 1))?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n as usize)
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .y_desc("Count")
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BLUE.filled())
            .margin(8)
            .data(counts.iter().enumerate().map(|(i, c)| (i as u32, c.1 as u32))),
    )?;
    root.present()?;
    Ok(())
}

fn draw_outliers(path: &Path, feature: Feature, z: &[f64], threshold: f64) -> DrawResult<()> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let z_abs_max = z.iter().fold(threshold, |acc, v| acc.max(v.abs())) * 1.1;
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Outliers Scatter Plot: {}", feature.column()), ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..(z.len().max(1) as f64), -z_abs_max..z_abs_max)?;
    chart.configure_mesh().x_desc("Index").y_desc("Z-score").draw()?;

    let (outliers, normal): (Vec<(usize, f64)>, Vec<(usize, f64)>) =
        z.iter().copied().enumerate().partition(|(_, v)| v.abs() > threshold);

    chart
        .draw_series(normal.iter().map(|&(i, v)| Circle::new((i as f64, v), 3, BLUE.filled())))?
        .label("Non-outliers")
        .legend(|(x, y)| Circle::new((x + 5, y), 3, BLUE.filled()));
    chart
        .draw_series(outliers.iter().map(|&(i, v)| TriangleMarker::new((i as f64, v), 4, ORANGE.filled())))?
        .label("Outliers")
        .legend(|(x, y)| TriangleMarker::new((x + 5, y), 4, ORANGE.filled()));
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

fn draw_multivariate(path: &Path, stars: &[Star]) -> DrawResult<()> {
    let root = SVGBackend::new(path, (1200, 1000)).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((2, 2));

    let pairs = [
        (Feature::Luminosity, Feature::Mass, "Mass vs Luminosity"),
        (Feature::Teff, Feature::Luminosity, "Effective Temperature vs Luminosity (HR diagram)"),
        (Feature::Radius, Feature::Mass, "Radius vs Mass"),
        (Feature::Metallicity, Feature::Mass, "Metallicity vs Mass"),
    ];

    let classes: Vec<String> = category_counts(stars).into_iter().map(|(k, _)| k).collect();
    let color_of = |spectype: &str| {
        let idx = classes.iter().position(|c| c == spectype).unwrap_or(0);
        WONG[idx % WONG.len()]
    };

    for (area, &(xf, yf, title)) in panels.iter().zip(&pairs) {
        // Temperature runs hot-to-cool on HR diagrams: plot -Teff and relabel.
        let flip = if xf == Feature::Teff { -1.0 } else { 1.0 };
        let xs: Vec<f64> = stars.iter().map(|s| flip * s.get(xf)).collect();
        let ys: Vec<f64> = stars.iter().map(|s| s.get(yf)).collect();
        let (x0, x1) = padded_bounds(&xs);
        let (y0, y1) = padded_bounds(&ys);

        let mut chart = ChartBuilder::on(area)
            .caption(title, ("sans-serif", 16))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(50)
            .build_cartesian_2d(x0..x1, y0..y1)?;
        chart
            .configure_mesh()
            .x_desc(xf.column())
            .y_desc(yf.column())
            .x_label_formatter(&|v| format!("{:.2}", flip * v))
            .draw()?;

        for class in &classes {
            let color = color_of(class);
            chart
                .draw_series(
                    stars
                        .iter()
                        .zip(xs.iter().zip(&ys))
                        .filter(|(s, _)| &s.spectype == class)
                        .map(|(_, (&x, &y))| Circle::new((x, y), 2, color.mix(0.8).filled())),
                )?
                .label(class.as_str())
                .legend(move |(x, y)| Circle::new((x + 5, y), 3, color.filled()));
        }

        if stars.iter().any(|s| s.spectype.is_empty()) {
            chart
                .draw_series(
                    stars
                        .iter()
                        .zip(xs.iter().zip(&ys))
                        .filter(|(s, _)| s.spectype.is_empty())
                        .map(|(_, (&x, &y))| Circle::new((x, y), 2, BLACK.mix(0.4).filled())),
                )?
                .label("unclassified")
                .legend(|(x, y)| Circle::new((x + 5, y), 3, BLACK.mix(0.4).filled()));
        }

        if let Some(fit) = linregress(&xs, &ys) {
            chart.draw_series(LineSeries::new(
                [x0, x1].map(|x| (x, fit.intercept + fit.slope * x)),
                ORANGE.stroke_width(2),
            ))?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

fn draw_heatmap(path: &Path, corr: &DMatrix<f64>) -> DrawResult<()> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let k = corr.nrows() as i32;
    // Row 0 at the top.
    let mut chart = ChartBuilder::on(&root)
        .caption("Correlation Matrix", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0i32..k, k..0i32)?;
    let label = |v: &i32| {
        usize::try_from(*v)
            .ok()
            .and_then(|i| Feature::ALL.get(i))
            .map(|f| f.column().to_string())
            .unwrap_or_default()
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(k as usize + 1)
        .y_labels(k as usize + 1)
        .x_label_offset(30)
        .y_label_offset(25)
        .x_label_formatter(&label)
        .y_label_formatter(&label)
        .draw()?;

    let cells: Vec<(i32, i32, f64)> = (0..k)
        .flat_map(|i| (0..k).map(move |j| (j, i, corr[(i as usize, j as usize)])))
        .collect();
    chart.draw_series(
        cells
            .iter()
            .map(|&(x, y, v)| Rectangle::new([(x, y), (x + 1, y + 1)], diverging(v).filled())),
    )?;
    chart.draw_series(cells.iter().map(|&(x, y, v)| {
        EmptyElement::at((x, y)) + Text::new(format!("{v:.2}"), (25, 20), ("sans-serif", 14).into_font())
    }))?;

    root.present()?;
    Ok(())
}

/// Blue (-1) -> white (0) -> orange (+1). Non-finite values are grey.
fn diverging(v: f64) -> RGBColor {
    if !v.is_finite() {
        return RGBColor(0xbb, 0xbb, 0xbb);
    }
    let t = v.clamp(-1.0, 1.0);
    let end = if t < 0.0 { BLUE } else { ORANGE };
    let a = t.abs();
    let mix = |c: u8| (255.0 + (c as f64 - 255.0) * a).round() as u8;
    RGBColor(mix(end.0), mix(end.1), mix(end.2))
}

fn draw_comparison(path: &Path, joined: &[JoinedStar]) -> DrawResult<()> {
    let root = SVGBackend::new(path, (1500, 900)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("NEA vs Gaia Feature Distributions", ("sans-serif", 24))?;
    let panels = root.split_evenly((2, 3));

    for (area, feature) in panels.iter().zip(Feature::ALL) {
        let nea: Vec<f64> = joined.iter().map(|j| j.nea.get(feature)).collect();
        let gaia: Vec<f64> = joined.iter().filter_map(|j| j.gaia.get(feature)).collect();

        // Shared bin edges so the two sources are comparable.
        let all: Vec<f64> = nea.iter().chain(&gaia).copied().collect();
        let edges = histogram_bins(&all, 30);
        let rebin = |values: &[f64]| -> Vec<(f64, f64, usize)> {
            edges
                .iter()
                .enumerate()
                .map(|(i, &(lo, hi, _))| {
                    let last = i + 1 == edges.len();
                    let n = values.iter().filter(|&&v| v >= lo && (v < hi || (last && v <= hi))).count();
                    (lo, hi, n)
                })
                .collect()
        };
        let (nea_bins, gaia_bins) = (rebin(&nea), rebin(&gaia));

        draw_bins(
            area,
            feature.column(),
            feature,
            &[(gaia_bins.as_slice(), BLUE, "Gaia"), (nea_bins.as_slice(), ORANGE, "NEA")],
        )?;
    }

    root.present()?;
    Ok(())
}

fn padded_bounds(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(min.is_finite() && max.is_finite()) {
        return (0.0, 1.0);
    }
    let pad = ((max - min) * 0.05).max(1e-6);
    (min - pad, max + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::{generate_catalog, SyntheticConfig};

    #[test]
    fn histogram_bins_cover_all_values() {
        let bins = histogram_bins(&[0.0, 0.5, 1.0, 1.0, f64::NAN], 2);
        assert_eq!(bins, vec![(0.0, 0.5, 1), (0.5, 1.0, 3)]);
        assert!(histogram_bins(&[], 10).is_empty());
        assert_eq!(histogram_bins(&[2.0, 2.0], 4).iter().map(|b| b.2).sum::<usize>(), 2);
    }

    #[test]
    fn diverging_scale_endpoints() {
        assert_eq!(diverging(0.0), RGBColor(255, 255, 255));
        assert_eq!(diverging(1.0), ORANGE);
        assert_eq!(diverging(-1.0), BLUE);
    }

    #[test]
    fn writes_eda_chart_set() {
        let dir = tempfile::tempdir().unwrap();
        let stars = generate_catalog(&SyntheticConfig {
            count: 60,
            ..SyntheticConfig::default()
        })
        .unwrap();

        let written = write_eda_charts(dir.path(), &stars, 3.0).unwrap();
        assert_eq!(written.len(), 5 + 1 + 5 + 2);
        for path in &written {
            let svg = std::fs::read_to_string(path).unwrap();
            assert!(svg.contains("<svg"), "{}", path.display());
        }
    }
}
