use std::f64::consts::PI;

use num_complex::Complex;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::utils::DynError;

pub use plotters::prelude::{RGBColor, BLUE, GREEN, RED};

const PLOT_WIDTH: u32 = 1280;
const PLOT_HEIGHT: u32 = 720;
const PLOT_FONT_SCALE: f64 = 1.2;

/// Bin count of the per-pair phase histograms.
pub const PHASE_HISTOGRAM_BINS: usize = 75;

/// Bin count of the I/Q value histograms in the signal summary.
const VALUE_HISTOGRAM_BINS: usize = 10;

const I_COLOR: RGBColor = RGBColor(0xFF, 0x77, 0x77);
const Q_COLOR: RGBColor = RGBColor(0x77, 0x77, 0xFF);

fn scaled_font_size(base: i32) -> i32 {
    ((base as f64) * PLOT_FONT_SCALE).round() as i32
}

fn scaled_area_size(base: i32) -> i32 {
    ((base as f64) * PLOT_FONT_SCALE).round() as i32
}

fn padded_range(min: f64, max: f64) -> (f64, f64) {
    if min == max {
        (min - 1.0, max + 1.0)
    } else {
        (min, max)
    }
}

fn bin_counts(values: &[f64], range: (f64, f64), bins: usize) -> Vec<usize> {
    let width = (range.1 - range.0) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &value in values {
        if value < range.0 || value > range.1 || width <= 0.0 {
            continue;
        }
        let mut idx = ((value - range.0) / width) as usize;
        if idx >= bins {
            idx = bins - 1;
        }
        counts[idx] += 1;
    }
    counts
}

/// One panel of a histogram grid: a title plus one angle series per overlay
/// (one per dwell in the dwell-indexed tools).
pub struct HistogramPanel<'a> {
    pub title: String,
    pub series: Vec<(String, &'a [f64])>,
}

/// Render phase-angle histograms over `[-PI, PI]` as a 3x2 grid, one panel
/// per channel pair, overlaying multiple series translucently.
pub fn plot_phase_histogram_grid(
    panels: &[HistogramPanel],
    filename: &str,
) -> Result<(), DynError> {
    if panels.is_empty() {
        return Err("No histogram panels to plot".into());
    }
    if panels.len() > 6 {
        return Err(format!("Histogram grid holds at most 6 panels, received {}", panels.len()).into());
    }

    let root = BitMapBackend::new(filename, (PLOT_WIDTH, PLOT_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((3, 2));
    for (panel, area) in panels.iter().zip(areas.iter()) {
        draw_phase_histogram(panel, area)?;
    }

    root.present()?;
    println!("[plot] Wrote phase histogram grid to {}", filename);
    Ok(())
}

fn draw_phase_histogram(
    panel: &HistogramPanel,
    area: &DrawingArea<BitMapBackend, Shift>,
) -> Result<(), DynError> {
    let bin_width = 2.0 * PI / PHASE_HISTOGRAM_BINS as f64;
    let counted: Vec<(String, Vec<usize>)> = panel
        .series
        .iter()
        .map(|(label, angles)| {
            (
                label.clone(),
                bin_counts(angles, (-PI, PI), PHASE_HISTOGRAM_BINS),
            )
        })
        .collect();
    let max_count = counted
        .iter()
        .flat_map(|(_, counts)| counts.iter().copied())
        .max()
        .unwrap_or(0)
        .max(1);

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", scaled_font_size(16)).into_font())
        .margin(5)
        .x_label_area_size(scaled_area_size(22))
        .y_label_area_size(scaled_area_size(32))
        .build_cartesian_2d(-PI..PI, 0.0..(max_count as f64 * 1.05))?;

    chart
        .configure_mesh()
        .x_labels(5)
        .y_labels(4)
        .label_style(("sans-serif", scaled_font_size(11)).into_font())
        .light_line_style(WHITE.mix(0.0))
        .draw()?;

    for (series_idx, (label, counts)) in counted.iter().enumerate() {
        let color = Palette99::pick(series_idx).to_rgba();
        chart
            .draw_series(counts.iter().enumerate().map(|(bin, &count)| {
                let x0 = -PI + bin as f64 * bin_width;
                Rectangle::new(
                    [(x0, 0.0), (x0 + bin_width, count as f64)],
                    color.mix(0.7).filled(),
                )
            }))?
            .label(label.as_str())
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 4), (x + 8, y + 4)], color.mix(0.7).filled())
            });
    }

    if panel.series.len() > 1 {
        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .label_font(("sans-serif", scaled_font_size(11)).into_font())
            .draw()?;
    }
    Ok(())
}

/// A per-dwell summary series: `(x, mean, sigma)` triples.
pub struct BandSeries<'a> {
    pub label: String,
    pub points: &'a [(f64, f64, f64)],
}

/// Line plot of per-dwell mean phase with a translucent band between
/// `mean - sigma` and `mean + sigma`, one color per channel pair.
pub fn plot_mean_with_band(
    series: &[BandSeries],
    filename: &str,
    x_label: &str,
    y_label: &str,
) -> Result<(), DynError> {
    if series.is_empty() {
        return Err("No series provided to plot".into());
    }
    for band in series {
        if band.points.is_empty() {
            return Err(format!("Series {} has no data points to plot", band.label).into());
        }
    }

    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for band in series {
        for &(x, mean, sigma) in band.points {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(mean - sigma);
            y_max = y_max.max(mean + sigma);
        }
    }
    let (x_min, x_max) = padded_range(x_min, x_max);
    let (y_min, y_max) = padded_range(y_min, y_max);
    let y_pad = (y_max - y_min) * 0.05;

    let root = BitMapBackend::new(filename, (PLOT_WIDTH, PLOT_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .x_label_area_size(scaled_area_size(40))
        .y_label_area_size(scaled_area_size(60))
        .build_cartesian_2d(x_min..x_max, (y_min - y_pad)..(y_max + y_pad))?;

    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .label_style(("sans-serif", scaled_font_size(20)).into_font())
        .axis_desc_style(("sans-serif", scaled_font_size(24)).into_font())
        .light_line_style(WHITE.mix(0.0))
        .draw()?;

    for (series_idx, band) in series.iter().enumerate() {
        let color = Palette99::pick(series_idx).to_rgba();

        let mut envelope: Vec<(f64, f64)> = band
            .points
            .iter()
            .map(|&(x, mean, sigma)| (x, mean - sigma))
            .collect();
        envelope.extend(
            band.points
                .iter()
                .rev()
                .map(|&(x, mean, sigma)| (x, mean + sigma)),
        );
        chart.draw_series(std::iter::once(Polygon::new(
            envelope,
            color.mix(0.3).filled(),
        )))?;

        chart.draw_series(LineSeries::new(
            band.points.iter().map(|&(x, mean, sigma)| (x, mean - sigma)),
            color.mix(0.6).stroke_width(1),
        ))?;
        chart.draw_series(LineSeries::new(
            band.points.iter().map(|&(x, mean, sigma)| (x, mean + sigma)),
            color.mix(0.6).stroke_width(1),
        ))?;

        chart
            .draw_series(LineSeries::new(
                band.points.iter().map(|&(x, mean, _)| (x, mean)),
                color.stroke_width(2),
            ))?
            .label(band.label.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 10, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .label_font(("sans-serif", scaled_font_size(20)).into_font())
        .draw()?;

    root.present()?;
    println!("[plot] Wrote phase time-domain plot to {}", filename);
    Ok(())
}

/// Three stacked panels for one capture: I/Q value histograms, the I/Q time
/// series, and the spectrum magnitude from [`crate::spectrum`].
pub fn plot_signal_summary(
    waveform: &[Complex<f64>],
    freqs: &[f64],
    magnitudes: &[f64],
    title: &str,
    filename: &str,
) -> Result<(), DynError> {
    if waveform.is_empty() {
        return Err("No samples to plot".into());
    }
    if freqs.len() != magnitudes.len() {
        return Err("Frequency axis length does not match magnitude length".into());
    }

    let root = BitMapBackend::new(filename, (PLOT_WIDTH, PLOT_HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, ("sans-serif", scaled_font_size(22)).into_font())?;
    let areas = root.split_evenly((3, 1));

    let re_values: Vec<f64> = waveform.iter().map(|s| s.re).collect();
    let im_values: Vec<f64> = waveform.iter().map(|s| s.im).collect();
    let value_min = re_values
        .iter()
        .chain(im_values.iter())
        .cloned()
        .fold(f64::INFINITY, f64::min);
    let value_max = re_values
        .iter()
        .chain(im_values.iter())
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);
    let value_range = padded_range(value_min, value_max);

    // Panel 1: value histograms.
    {
        let re_counts = bin_counts(&re_values, value_range, VALUE_HISTOGRAM_BINS);
        let im_counts = bin_counts(&im_values, value_range, VALUE_HISTOGRAM_BINS);
        let max_count = re_counts
            .iter()
            .chain(im_counts.iter())
            .copied()
            .max()
            .unwrap_or(0)
            .max(1);
        let bin_width = (value_range.1 - value_range.0) / VALUE_HISTOGRAM_BINS as f64;

        let mut chart = ChartBuilder::on(&areas[0])
            .margin(5)
            .x_label_area_size(scaled_area_size(22))
            .y_label_area_size(scaled_area_size(40))
            .build_cartesian_2d(
                value_range.0..value_range.1,
                0.0..(max_count as f64 * 1.05),
            )?;
        chart
            .configure_mesh()
            .y_desc("Count")
            .label_style(("sans-serif", scaled_font_size(12)).into_font())
            .axis_desc_style(("sans-serif", scaled_font_size(14)).into_font())
            .light_line_style(WHITE.mix(0.0))
            .draw()?;

        for (counts, color, label) in [
            (&re_counts, I_COLOR, "I"),
            (&im_counts, Q_COLOR, "Q"),
        ] {
            chart
                .draw_series(counts.iter().enumerate().map(|(bin, &count)| {
                    let x0 = value_range.0 + bin as f64 * bin_width;
                    Rectangle::new(
                        [(x0, 0.0), (x0 + bin_width, count as f64)],
                        color.mix(0.5).filled(),
                    )
                }))?
                .label(label)
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 4), (x + 8, y + 4)], color.mix(0.5).filled())
                });
        }
        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .label_font(("sans-serif", scaled_font_size(12)).into_font())
            .draw()?;
    }

    // Panel 2: I/Q time series.
    {
        let mut chart = ChartBuilder::on(&areas[1])
            .margin(5)
            .x_label_area_size(scaled_area_size(22))
            .y_label_area_size(scaled_area_size(40))
            .build_cartesian_2d(
                0.0..(waveform.len() as f64),
                value_range.0..value_range.1,
            )?;
        chart
            .configure_mesh()
            .x_desc("Sample")
            .y_desc("Value")
            .label_style(("sans-serif", scaled_font_size(12)).into_font())
            .axis_desc_style(("sans-serif", scaled_font_size(14)).into_font())
            .light_line_style(WHITE.mix(0.0))
            .draw()?;

        chart
            .draw_series(LineSeries::new(
                re_values.iter().enumerate().map(|(i, &v)| (i as f64, v)),
                &I_COLOR,
            ))?
            .label("I")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], I_COLOR));
        chart
            .draw_series(LineSeries::new(
                im_values.iter().enumerate().map(|(i, &v)| (i as f64, v)),
                &Q_COLOR,
            ))?
            .label("Q")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], Q_COLOR));
        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .label_font(("sans-serif", scaled_font_size(12)).into_font())
            .draw()?;
    }

    // Panel 3: spectrum magnitude.
    if freqs.is_empty() {
        println!("[warn] Insufficient spectrum bins to plot after removing the DC component.");
    } else {
        let freq_range = padded_range(
            freqs.iter().cloned().fold(f64::INFINITY, f64::min),
            freqs.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        );
        let mag_max = magnitudes
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max)
            .max(f64::MIN_POSITIVE);

        let mut chart = ChartBuilder::on(&areas[2])
            .margin(5)
            .x_label_area_size(scaled_area_size(22))
            .y_label_area_size(scaled_area_size(40))
            .build_cartesian_2d(freq_range.0..freq_range.1, 0.0..(mag_max * 1.05))?;
        chart
            .configure_mesh()
            .x_desc("Frequency [Hz]")
            .y_desc("Magnitude")
            .label_style(("sans-serif", scaled_font_size(12)).into_font())
            .axis_desc_style(("sans-serif", scaled_font_size(14)).into_font())
            .light_line_style(WHITE.mix(0.0))
            .draw()?;
        chart.draw_series(LineSeries::new(
            freqs.iter().zip(magnitudes.iter()).map(|(&f, &m)| (f, m)),
            &BLUE,
        ))?;
    }

    root.present()?;
    println!("[plot] Wrote signal summary to {}", filename);
    Ok(())
}
