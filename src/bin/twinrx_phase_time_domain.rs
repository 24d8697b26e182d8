use std::path::PathBuf;

use clap::Parser;

use twinrx_coherence::catalog::ChannelKey;
use twinrx_coherence::coherence::{phase_comparison, rotating_fit};
use twinrx_coherence::dwell::{channel_pair, load_dwells_with_budget};
use twinrx_coherence::plot::{plot_mean_with_band, BandSeries};
use twinrx_coherence::utils::DynError;
use twinrx_coherence::waveform::DEFAULT_MAX_SAMPLES;

/// Pairs tracked against dwell number, all referenced to A0.
const PAIRS: [(ChannelKey, ChannelKey); 3] = [
    (ChannelKey::A0, ChannelKey::A1),
    (ChannelKey::A0, ChannelKey::B0),
    (ChannelKey::A0, ChannelKey::B1),
];

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Mean relative phase and spread per dwell, plotted against dwell number",
    after_help = "Examples:\n  twinrx_phase_time_domain --data captures\n  twinrx_phase_time_domain --data captures --output drift.png\n"
)]
struct Args {
    /// Directory containing dwell-indexed capture files
    #[arg(long, default_value = ".")]
    data: PathBuf,

    /// Output image path
    #[arg(long, default_value = "twinrx_phase_time_domain.png")]
    output: PathBuf,

    /// Maximum samples loaded per capture file
    #[arg(long, default_value_t = DEFAULT_MAX_SAMPLES)]
    max_samples: usize,
}

fn main() -> Result<(), DynError> {
    let args = Args::parse();

    println!("Starting twinrx phase time-domain with the following arguments:");
    println!("--------------------------------------------------");
    println!("  data:        {}", args.data.display());
    println!("  output:      {}", args.output.display());
    println!("  max-samples: {}", args.max_samples);
    println!("--------------------------------------------------");

    let dwells = load_dwells_with_budget(&args.data, args.max_samples)?;
    if dwells.is_empty() {
        println!(
            "[warn] No dwell-indexed capture files found in {}",
            args.data.display()
        );
        return Ok(());
    }
    println!("[info] Loaded {} dwell(s)", dwells.len());

    let mut fitted: Vec<(String, Vec<(f64, f64, f64)>)> = Vec::new();
    for &(key0, key1) in PAIRS.iter() {
        println!("[info] Pair {key0}-{key1}:");
        println!("  {:>8} {:>14} {:>14}", "dwell", "mean [rad]", "sigma [rad]");
        let mut points = Vec::new();
        // BTreeMap iteration keeps the dwell axis numerically sorted.
        for (dwell_number, channels) in dwells.iter() {
            let (wf0, wf1) = channel_pair(channels, *dwell_number, key0, key1)?;
            let fit = rotating_fit(&phase_comparison(wf0, wf1));
            println!(
                "  {:>8} {:>14.6} {:>14.6}",
                dwell_number, fit.mean_phase_radians, fit.spread
            );
            points.push((*dwell_number as f64, fit.mean_phase_radians, fit.spread));
        }
        fitted.push((format!("{key0}-{key1}"), points));
    }

    let series: Vec<BandSeries> = fitted
        .iter()
        .map(|(label, points)| BandSeries {
            label: label.clone(),
            points,
        })
        .collect();
    plot_mean_with_band(
        &series,
        &args.output.to_string_lossy(),
        "Dwell",
        "Relative Phase [radians]",
    )?;

    println!("Processing finished.");
    Ok(())
}
