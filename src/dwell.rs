use std::collections::BTreeMap;
use std::path::Path;

use rayon::prelude::*;

use crate::catalog::{scan_dir, ChannelKey};
use crate::utils::DynError;
use crate::waveform::{load_sc16, Waveform, DEFAULT_MAX_SAMPLES};

/// Channels of one dwell, keyed by the `{slot}{channel}` label.
pub type DwellChannels = BTreeMap<ChannelKey, Waveform>;

/// Dwell number to channel map. `BTreeMap` iteration yields dwells in
/// ascending numeric order, which the time-domain series relies on.
pub type DwellMap = BTreeMap<u64, DwellChannels>;

/// Scan `dir` and load every dwell-indexed capture with the default sample
/// budget. See [`load_dwells_with_budget`].
pub fn load_dwells(dir: &Path) -> Result<DwellMap, DynError> {
    load_dwells_with_budget(dir, DEFAULT_MAX_SAMPLES)
}

/// Scan `dir` for capture files, load each (DC-corrected, capped at
/// `max_samples`), and group the waveforms by dwell number and channel key.
/// Partial dwells are kept; pairing against a missing channel is the
/// caller's concern ([`channel_pair`]). Any per-file I/O failure propagates
/// and no partial map is returned.
pub fn load_dwells_with_budget(dir: &Path, max_samples: usize) -> Result<DwellMap, DynError> {
    let descriptors = scan_dir(dir)?;

    // Loads are independent; inserts stay on this thread in catalog order so
    // duplicate (dwell, channel) keys resolve to the last file in name order.
    let loaded: Vec<(u64, ChannelKey, Waveform)> = descriptors
        .par_iter()
        .map(|descriptor| {
            load_sc16(&descriptor.path, max_samples)
                .map(|waveform| (descriptor.dwell_number, descriptor.name.key, waveform))
        })
        .collect::<Result<_, DynError>>()?;

    let mut dwells = DwellMap::new();
    for (dwell_number, key, waveform) in loaded {
        dwells.entry(dwell_number).or_default().insert(key, waveform);
    }
    Ok(dwells)
}

/// Borrow the two waveforms of a channel pair from one dwell, failing with
/// the name of the missing key when the dwell is incomplete.
pub fn channel_pair<'a>(
    channels: &'a DwellChannels,
    dwell_number: u64,
    key0: ChannelKey,
    key1: ChannelKey,
) -> Result<(&'a Waveform, &'a Waveform), DynError> {
    let wf0 = channels
        .get(&key0)
        .ok_or_else(|| format!("Channel {key0} is missing from dwell {dwell_number}"))?;
    let wf1 = channels
        .get(&key1)
        .ok_or_else(|| format!("Channel {key1} is missing from dwell {dwell_number}"))?;
    Ok((wf0, wf1))
}
