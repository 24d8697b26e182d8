use std::path::PathBuf;

use clap::Parser;

use twinrx_coherence::catalog::parse_capture_name;
use twinrx_coherence::plot::plot_signal_summary;
use twinrx_coherence::spectrum::magnitude_series;
use twinrx_coherence::utils::DynError;
use twinrx_coherence::waveform::load_sc16_raw;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Value histograms, time series, and spectrum for one sc16 capture file",
    after_help = "Examples:\n  rx_samples_plot captures/dwell3A_A0_100MHz_10dB_20Msps.dat\n  rx_samples_plot capture.bin --center-freq-mhz 95.0 --rate-msps 10.0\n"
)]
struct Args {
    /// Capture file to plot
    file: PathBuf,

    /// Center frequency in MHz (defaults from the capture file name when it parses)
    #[arg(long)]
    center_freq_mhz: Option<f64>,

    /// Sample rate in Msps (defaults from the capture file name when it parses)
    #[arg(long)]
    rate_msps: Option<f64>,

    /// Maximum samples loaded from the file
    #[arg(long, default_value_t = 100_000)]
    max_samples: usize,

    /// Output image path (defaults to the capture name with a .png suffix)
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), DynError> {
    let args = Args::parse();

    let file_name = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| args.file.display().to_string());
    let capture = parse_capture_name(&file_name);

    let center_freq_mhz = args
        .center_freq_mhz
        .or_else(|| capture.as_ref().and_then(|c| c.center_freq_mhz))
        .ok_or("Center frequency not given and not derivable from the file name; pass --center-freq-mhz")?;
    let rate_msps = args
        .rate_msps
        .or_else(|| capture.as_ref().and_then(|c| c.sample_rate_msps))
        .ok_or("Sample rate not given and not derivable from the file name; pass --rate-msps")?;
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{file_name}.png")));

    println!("Starting rx samples plot with the following arguments:");
    println!("--------------------------------------------------");
    println!("  file:        {}", args.file.display());
    println!("  center-freq: {center_freq_mhz} MHz");
    println!("  rate:        {rate_msps} Msps");
    println!("  max-samples: {}", args.max_samples);
    println!("  output:      {}", output.display());
    println!("--------------------------------------------------");

    let waveform = load_sc16_raw(&args.file, args.max_samples)?;
    if waveform.is_empty() {
        return Err(format!("No samples decoded from {}", args.file.display()).into());
    }
    println!("[info] Loaded {} samples", waveform.len());

    let (freqs, magnitudes) =
        magnitude_series(&waveform, center_freq_mhz * 1.0e6, rate_msps * 1.0e6)?;
    plot_signal_summary(
        &waveform,
        &freqs,
        &magnitudes,
        &file_name,
        &output.to_string_lossy(),
    )?;

    println!("Processing finished.");
    Ok(())
}
