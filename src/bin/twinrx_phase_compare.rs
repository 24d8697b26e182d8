use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use clap::Parser;

use twinrx_coherence::catalog::{parse_capture_name, ChannelKey, CANONICAL_PAIRS};
use twinrx_coherence::coherence::{phase_angles, phase_comparison};
use twinrx_coherence::plot::{plot_phase_histogram_grid, HistogramPanel};
use twinrx_coherence::utils::DynError;
use twinrx_coherence::waveform::{load_sc16, Waveform, DEFAULT_MAX_SAMPLES};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Single-set relative-phase histograms for captures matching a tag filter",
    after_help = "Examples:\n  twinrx_phase_compare --data captures\n  twinrx_phase_compare --data captures --filter twinrx_cal --output compare.png\n"
)]
struct Args {
    /// Directory containing capture files
    #[arg(long, default_value = ".")]
    data: PathBuf,

    /// Substring the implementation tag must contain
    #[arg(long, default_value = "twinrx")]
    filter: String,

    /// Output image path
    #[arg(long, default_value = "twinrx_phase_compare.png")]
    output: PathBuf,

    /// Maximum samples loaded per capture file
    #[arg(long, default_value_t = DEFAULT_MAX_SAMPLES)]
    max_samples: usize,
}

fn main() -> Result<(), DynError> {
    let args = Args::parse();

    println!("Starting twinrx phase compare with the following arguments:");
    println!("--------------------------------------------------");
    println!("  data:        {}", args.data.display());
    println!("  filter:      {}", args.filter);
    println!("  output:      {}", args.output.display());
    println!("  max-samples: {}", args.max_samples);
    println!("--------------------------------------------------");

    // One waveform per channel key; no dwell indexing here, the tag filter
    // selects a single capture set. Name-sorted so duplicates resolve
    // deterministically (last name wins).
    let mut file_names: Vec<String> = Vec::new();
    for entry in fs::read_dir(&args.data)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            file_names.push(name.to_string());
        }
    }
    file_names.sort();

    let mut channels: BTreeMap<ChannelKey, Waveform> = BTreeMap::new();
    for file_name in &file_names {
        let Some(capture) = parse_capture_name(file_name) else {
            continue;
        };
        if !capture.implementation_tag.contains(&args.filter) {
            continue;
        }
        println!("[info] Loading {} as {}", file_name, capture.key);
        let waveform = load_sc16(&args.data.join(file_name), args.max_samples)?;
        channels.insert(capture.key, waveform);
    }
    if channels.is_empty() {
        println!(
            "[warn] No captures matching filter {:?} found in {}",
            args.filter,
            args.data.display()
        );
        return Ok(());
    }

    let mut computed: Vec<(String, Vec<f64>)> = Vec::new();
    for &(key0, key1) in CANONICAL_PAIRS.iter() {
        let wf0 = channels
            .get(&key0)
            .ok_or_else(|| format!("Channel {key0} not found among filtered captures"))?;
        let wf1 = channels
            .get(&key1)
            .ok_or_else(|| format!("Channel {key1} not found among filtered captures"))?;
        let angles = phase_angles(&phase_comparison(wf0, wf1));
        computed.push((format!("{key0} vs {key1}"), angles));
    }

    let panels: Vec<HistogramPanel> = computed
        .iter()
        .map(|(title, angles)| HistogramPanel {
            title: title.clone(),
            series: vec![(args.filter.clone(), angles.as_slice())],
        })
        .collect();
    plot_phase_histogram_grid(&panels, &args.output.to_string_lossy())?;

    println!("Processing finished.");
    Ok(())
}
