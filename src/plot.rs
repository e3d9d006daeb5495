//! PNG renders for exploratory analysis (`plot` feature).

use std::fmt::Display;
use std::ops::Range;
use std::path::Path;

use anyhow::{bail, Result};
use plotters::prelude::*;

use crate::model::bar::Bar;
use crate::pipeline::FeatureMatrix;
use crate::spectral::Spectrum;

const WIDE: (u32, u32) = (1200, 400);
const SQUARE: (u32, u32) = (800, 600);

fn draw_err<E: Display>(e: E) -> anyhow::Error {
    anyhow::anyhow!("plot failed: {}", e)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Min..max of `values`, widened when flat so the axis is never empty.
fn padded_range(values: impl Iterator<Item = f64>) -> Option<Range<f64>> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return None;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { lo.abs().max(1.0) * 0.01 };
    Some((lo - pad)..(hi + pad))
}

/// Close price over time.
pub fn plot_bars(path: &Path, bars: &[Bar], title: &str) -> Result<()> {
    let Some(x_range) = padded_range(bars.iter().map(|b| b.interval_start_ms as f64)) else {
        bail!("no bars to plot");
    };
    let Some(y_range) = padded_range(bars.iter().map(|b| b.close)) else {
        bail!("no finite close prices to plot");
    };
    ensure_parent(path)?;

    let root = BitMapBackend::new(path, WIDE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .x_desc("time (ms)")
        .y_desc("close")
        .draw()
        .map_err(draw_err)?;
    chart
        .draw_series(LineSeries::new(
            bars.iter().map(|b| (b.interval_start_ms as f64, b.close)),
            &BLUE,
        ))
        .map_err(draw_err)?;
    root.present().map_err(draw_err)?;
    tracing::debug!(path = %path.display(), bars = bars.len(), "Wrote bar plot");
    Ok(())
}

/// Stem chart of a magnitude spectrum.
pub fn plot_spectrum(path: &Path, spectrum: &Spectrum, title: &str) -> Result<()> {
    let Some(x_range) = padded_range(spectrum.frequencies.iter().copied()) else {
        bail!("empty spectrum");
    };
    let y_max = spectrum
        .magnitudes
        .iter()
        .copied()
        .filter(|m| m.is_finite())
        .fold(0.0_f64, f64::max);
    ensure_parent(path)?;

    let root = BitMapBackend::new(path, WIDE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, 0.0..(y_max * 1.05).max(1e-12))
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .x_desc("frequency")
        .y_desc("amplitude")
        .draw()
        .map_err(draw_err)?;
    chart
        .draw_series(
            spectrum
                .frequencies
                .iter()
                .zip(&spectrum.magnitudes)
                .map(|(&f, &m)| PathElement::new(vec![(f, 0.0), (f, m)], BLUE)),
        )
        .map_err(draw_err)?;
    root.present().map_err(draw_err)?;
    Ok(())
}

/// 2-D points coloured by integer label (cluster id or class).
pub fn plot_scatter(path: &Path, points: &[(f64, f64)], labels: &[i64], title: &str) -> Result<()> {
    if points.len() != labels.len() {
        bail!(
            "points and labels differ in length ({} vs {})",
            points.len(),
            labels.len()
        );
    }
    let Some(x_range) = padded_range(points.iter().map(|p| p.0)) else {
        bail!("no points to plot");
    };
    let Some(y_range) = padded_range(points.iter().map(|p| p.1)) else {
        bail!("no points to plot");
    };
    ensure_parent(path)?;

    let root = BitMapBackend::new(path, SQUARE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_range)
        .map_err(draw_err)?;
    chart
        .configure_mesh()
        .x_desc("component 1")
        .y_desc("component 2")
        .draw()
        .map_err(draw_err)?;

    let mut distinct: Vec<i64> = labels.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    for (slot, label) in distinct.iter().enumerate() {
        let color = Palette99::pick(slot).mix(0.7);
        chart
            .draw_series(
                points
                    .iter()
                    .zip(labels)
                    .filter(|(_, l)| *l == label)
                    .map(|(&(x, y), _)| Circle::new((x, y), 3, color.filled())),
            )
            .map_err(draw_err)?
            .label(format!("cluster {label}"))
            .legend(move |(x, y)| Circle::new((x, y), 3, color.filled()));
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(draw_err)?;
    root.present().map_err(draw_err)?;
    Ok(())
}

/// First two feature columns (`f1`, `m1`) of each labelled row, keyed by direction.
fn feature_points(matrix: &FeatureMatrix) -> (Vec<(f64, f64)>, Vec<i64>) {
    matrix
        .x
        .iter()
        .zip(&matrix.direction)
        .filter_map(|(row, &dir)| match row.as_slice() {
            [f1, m1, ..] => Some(((*f1, *m1), i64::from(dir))),
            _ => None,
        })
        .unzip()
}

/// Lowest selected frequency against its magnitude, coloured by next-window direction.
pub fn plot_feature_scatter(path: &Path, matrix: &FeatureMatrix, title: &str) -> Result<()> {
    let (points, labels) = feature_points(matrix);
    plot_scatter(path, &points, &labels, title)
}
