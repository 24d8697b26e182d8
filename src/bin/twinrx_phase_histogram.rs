use std::path::PathBuf;

use clap::Parser;

use twinrx_coherence::catalog::CANONICAL_PAIRS;
use twinrx_coherence::coherence::{phase_angles, phase_comparison};
use twinrx_coherence::dwell::{channel_pair, load_dwells_with_budget};
use twinrx_coherence::plot::{plot_phase_histogram_grid, HistogramPanel};
use twinrx_coherence::utils::DynError;
use twinrx_coherence::waveform::DEFAULT_MAX_SAMPLES;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Per-dwell relative-phase histograms for the six twinrx channel pairs",
    after_help = "Examples:\n  twinrx_phase_histogram --data captures\n  twinrx_phase_histogram --data captures --output phases.png --max-samples 50000\n"
)]
struct Args {
    /// Directory containing dwell-indexed capture files
    #[arg(long, default_value = ".")]
    data: PathBuf,

    /// Output image path
    #[arg(long, default_value = "twinrx_phase_histogram.png")]
    output: PathBuf,

    /// Maximum samples loaded per capture file
    #[arg(long, default_value_t = DEFAULT_MAX_SAMPLES)]
    max_samples: usize,
}

fn main() -> Result<(), DynError> {
    let args = Args::parse();

    println!("Starting twinrx phase histogram with the following arguments:");
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
    println!(
        "[info] Loaded {} dwell(s): {:?}",
        dwells.len(),
        dwells.keys().collect::<Vec<_>>()
    );

    let mut computed: Vec<(String, Vec<(String, Vec<f64>)>)> = Vec::new();
    for &(key0, key1) in CANONICAL_PAIRS.iter() {
        let mut per_dwell = Vec::new();
        for (dwell_number, channels) in dwells.iter() {
            let (wf0, wf1) = channel_pair(channels, *dwell_number, key0, key1)?;
            let angles = phase_angles(&phase_comparison(wf0, wf1));
            per_dwell.push((format!("dwell {dwell_number}"), angles));
        }
        computed.push((format!("{key0} vs {key1}"), per_dwell));
    }

    let panels: Vec<HistogramPanel> = computed
        .iter()
        .map(|(title, per_dwell)| HistogramPanel {
            title: title.clone(),
            series: per_dwell
                .iter()
                .map(|(label, angles)| (label.clone(), angles.as_slice()))
                .collect(),
        })
        .collect();
    plot_phase_histogram_grid(&panels, &args.output.to_string_lossy())?;

    println!("Processing finished.");
    Ok(())
}
