use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::DynError;

/// Receiver slot of a twinrx daughterboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    A,
    B,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::A => write!(f, "A"),
            Slot::B => write!(f, "B"),
        }
    }
}

/// Slot plus channel index, rendered as the same two-character label the
/// capture file names carry (`A0`, `A1`, `B0`, `B1`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelKey {
    pub slot: Slot,
    pub channel: u8,
}

impl ChannelKey {
    pub const A0: ChannelKey = ChannelKey { slot: Slot::A, channel: 0 };
    pub const A1: ChannelKey = ChannelKey { slot: Slot::A, channel: 1 };
    pub const B0: ChannelKey = ChannelKey { slot: Slot::B, channel: 0 };
    pub const B1: ChannelKey = ChannelKey { slot: Slot::B, channel: 1 };

    pub const CANONICAL: [ChannelKey; 4] =
        [ChannelKey::A0, ChannelKey::A1, ChannelKey::B0, ChannelKey::B1];
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.slot, self.channel)
    }
}

/// The six channel pairings compared across a four-channel capture set,
/// in the panel order the phase-histogram grid uses.
pub const CANONICAL_PAIRS: [(ChannelKey, ChannelKey); 6] = [
    (ChannelKey::A0, ChannelKey::A1),
    (ChannelKey::A0, ChannelKey::B0),
    (ChannelKey::A1, ChannelKey::B0),
    (ChannelKey::A0, ChannelKey::B1),
    (ChannelKey::A1, ChannelKey::B1),
    (ChannelKey::B0, ChannelKey::B1),
];

/// Fields extracted from a capture file name matching
/// `<impl>_<slot:A|B><chan:0|1>_<freq>MHz_<gain>dB_<rate>Msps[...]`.
///
/// The numeric fields are informational; a name still matches when they do
/// not parse as floats.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureName {
    pub implementation_tag: String,
    pub key: ChannelKey,
    pub center_freq_mhz: Option<f64>,
    pub gain_db: Option<f64>,
    pub sample_rate_msps: Option<f64>,
}

impl CaptureName {
    /// Dwell number embedded in the implementation tag: the first run of
    /// ASCII digits, wherever it starts. `None` when the tag carries no
    /// digits (or the run overflows `u64`), which excludes the capture from
    /// dwell-indexed aggregation.
    pub fn dwell_number(&self) -> Option<u64> {
        let tag = &self.implementation_tag;
        let start = tag.find(|c: char| c.is_ascii_digit())?;
        let digits: &str = &tag[start..];
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        digits[..end].parse().ok()
    }
}

/// A catalogued capture file, ready for loading.
#[derive(Clone, Debug)]
pub struct CaptureFileDescriptor {
    pub name: CaptureName,
    pub dwell_number: u64,
    pub path: PathBuf,
}

/// Parse a file name against the capture grammar. Returns `None` for any
/// name outside the grammar; this is the expected high-frequency case when
/// scanning a mixed directory and is never an error.
///
/// The slot/channel token binds greedily: when several `_<A|B><0|1>_`
/// occurrences exist, the rightmost one that still lets the remaining fields
/// match wins, so everything before it stays in the implementation tag.
pub fn parse_capture_name(file_name: &str) -> Option<CaptureName> {
    let bytes = file_name.as_bytes();
    if bytes.contains(&b'/') {
        return None;
    }

    // Candidate `_<slot><chan>_` positions, scanned right to left.
    let mut candidate = bytes.len().saturating_sub(4);
    loop {
        if candidate >= 1
            && bytes[candidate] == b'_'
            && matches!(bytes[candidate + 1], b'A' | b'B')
            && matches!(bytes[candidate + 2], b'0' | b'1')
            && bytes[candidate + 3] == b'_'
        {
            if let Some((freq, gain, rate)) = parse_trailing_fields(&file_name[candidate + 4..]) {
                let slot = if bytes[candidate + 1] == b'A' { Slot::A } else { Slot::B };
                let channel = bytes[candidate + 2] - b'0';
                return Some(CaptureName {
                    implementation_tag: file_name[..candidate].to_string(),
                    key: ChannelKey { slot, channel },
                    center_freq_mhz: freq,
                    gain_db: gain,
                    sample_rate_msps: rate,
                });
            }
        }
        if candidate == 0 {
            return None;
        }
        candidate -= 1;
    }
}

/// Match `<freq>MHz_<gain>dB_<rate>Msps` at the start of `rest`, ignoring
/// any trailing bytes (extensions, suffixes). `freq` and `rate` run up to
/// the next `M`; `gain` is a run of ASCII digits.
fn parse_trailing_fields(rest: &str) -> Option<(Option<f64>, Option<f64>, Option<f64>)> {
    let (freq_raw, rest) = split_before_m(rest)?;
    let rest = rest.strip_prefix("MHz_")?;

    let gain_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    if gain_len == 0 {
        return None;
    }
    let (gain_raw, rest) = rest.split_at(gain_len);
    let rest = rest.strip_prefix("dB_")?;

    let (rate_raw, rest) = split_before_m(rest)?;
    rest.strip_prefix("Msps")?;

    Some((
        freq_raw.parse().ok(),
        gain_raw.parse().ok(),
        rate_raw.parse().ok(),
    ))
}

/// Split off the non-empty run of characters before the first `M`.
fn split_before_m(s: &str) -> Option<(&str, &str)> {
    let idx = s.find('M')?;
    if idx == 0 {
        return None;
    }
    Some(s.split_at(idx))
}

/// Enumerate a directory and return descriptors for every entry whose name
/// matches the capture grammar and carries a dwell number. Entries are
/// sorted by file name first so the descriptor order (and duplicate-key
/// precedence downstream) is deterministic for a fixed directory snapshot.
pub fn scan_dir(dir: &Path) -> Result<Vec<CaptureFileDescriptor>, DynError> {
    let mut file_names: Vec<String> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        // Non-UTF-8 names cannot match the grammar.
        if let Some(name) = entry.file_name().to_str() {
            file_names.push(name.to_string());
        }
    }
    file_names.sort();

    let mut descriptors = Vec::new();
    for file_name in file_names {
        let Some(name) = parse_capture_name(&file_name) else {
            continue;
        };
        let Some(dwell_number) = name.dwell_number() else {
            continue;
        };
        descriptors.push(CaptureFileDescriptor {
            dwell_number,
            path: dir.join(&file_name),
            name,
        });
    }
    Ok(descriptors)
}
