use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
#[cfg(target_family = "unix")]
use std::os::fd::AsRawFd;
use std::path::Path;

use num_complex::Complex;

use crate::utils::DynError;

/// A DC-corrected sequence of complex I/Q samples.
pub type Waveform = Vec<Complex<f64>>;

/// Sample budget per capture file; trailing bytes beyond it are never read.
pub const DEFAULT_MAX_SAMPLES: usize = 200_000;

/// One interleaved record: two little-endian signed 16-bit integers.
const BYTES_PER_RECORD: usize = 4;

#[cfg(target_family = "unix")]
fn advise_file_sequential(file: &File) {
    let fd = file.as_raw_fd();
    unsafe {
        let _ = libc::posix_fadvise(fd, 0, 0, libc::POSIX_FADV_SEQUENTIAL);
    }
}

#[cfg(not(target_family = "unix"))]
fn advise_file_sequential(_file: &File) {}

fn read_block_partial(reader: &mut impl Read, buffer: &mut Vec<u8>) -> Result<usize, DynError> {
    use std::io::ErrorKind;

    let mut total_read = 0usize;
    while total_read < buffer.len() {
        match reader.read(&mut buffer[total_read..]) {
            Ok(0) => break,
            Ok(n) => total_read += n,
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    buffer.truncate(total_read);
    Ok(total_read)
}

struct DecodedBlock {
    samples: Waveform,
    sum: Complex<f64>,
}

/// Single pass over the file: decode records and accumulate the component
/// sums concurrently. A trailing partial record (file length not a multiple
/// of 4 bytes) is dropped, not decoded and not an error.
fn read_and_decode(path: &Path, max_samples: usize) -> Result<DecodedBlock, DynError> {
    let file = File::open(path)?;
    advise_file_sequential(&file);
    let mut reader = BufReader::new(file);

    let mut raw = vec![0u8; max_samples * BYTES_PER_RECORD];
    read_block_partial(&mut reader, &mut raw)?;

    let mut samples = Vec::with_capacity(raw.len() / BYTES_PER_RECORD);
    let mut sum = Complex::new(0.0, 0.0);
    for record in raw.chunks_exact(BYTES_PER_RECORD) {
        let re = i16::from_le_bytes([record[0], record[1]]) as f64;
        let im = i16::from_le_bytes([record[2], record[3]]) as f64;
        sum.re += re;
        sum.im += im;
        samples.push(Complex::new(re, im));
    }
    Ok(DecodedBlock { samples, sum })
}

/// Load up to `max_samples` sc16 I/Q records from `path` and subtract the
/// DC offset, the arithmetic mean of exactly the samples read. An empty or
/// sub-record file yields an empty waveform.
pub fn load_sc16(path: &Path, max_samples: usize) -> Result<Waveform, DynError> {
    let DecodedBlock { mut samples, sum } = read_and_decode(path, max_samples)?;
    if !samples.is_empty() {
        let dc_offset = sum / samples.len() as f64;
        for sample in samples.iter_mut() {
            *sample -= dc_offset;
        }
    }
    Ok(samples)
}

/// Like [`load_sc16`] but without the DC correction, for inspecting raw
/// sample values.
pub fn load_sc16_raw(path: &Path, max_samples: usize) -> Result<Waveform, DynError> {
    Ok(read_and_decode(path, max_samples)?.samples)
}

/// Write `(re, im)` records in the interleaved little-endian sc16 layout
/// that the capture side produces and [`load_sc16`] reads back.
pub fn write_sc16(path: &Path, records: &[(i16, i16)]) -> Result<(), DynError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for &(re, im) in records {
        writer.write_all(&re.to_le_bytes())?;
        writer.write_all(&im.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_file(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("twinrx_waveform_tests_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(tag)
    }

    #[test]
    fn round_trip_preserves_raw_sample_values() {
        let path = scratch_file("round_trip.dat");
        let records = vec![(0i16, 0i16), (100, -100), (i16::MAX, i16::MIN), (-42, 7)];
        write_sc16(&path, &records).unwrap();

        let loaded = load_sc16_raw(&path, DEFAULT_MAX_SAMPLES).unwrap();
        assert_eq!(loaded.len(), records.len());
        for (sample, &(re, im)) in loaded.iter().zip(records.iter()) {
            assert_eq!(sample.re, re as f64);
            assert_eq!(sample.im, im as f64);
        }
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn dc_offset_is_the_exact_sample_mean() {
        let path = scratch_file("dc_offset.dat");
        let records: Vec<(i16, i16)> = (0..100)
            .map(|i| (50 + (i % 7) as i16, -200 + (i % 13) as i16))
            .collect();
        write_sc16(&path, &records).unwrap();

        let loaded = load_sc16(&path, DEFAULT_MAX_SAMPLES).unwrap();
        let mean = loaded.iter().sum::<Complex<f64>>() / loaded.len() as f64;
        assert!(mean.norm() < 1e-9, "residual mean {mean}");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn truncates_at_the_sample_budget() {
        let path = scratch_file("truncate.dat");
        let records: Vec<(i16, i16)> = (0..10).map(|i| (i as i16, -(i as i16))).collect();
        write_sc16(&path, &records).unwrap();

        assert_eq!(load_sc16(&path, 4).unwrap().len(), 4);
        assert_eq!(load_sc16(&path, 10).unwrap().len(), 10);
        assert_eq!(load_sc16(&path, 100).unwrap().len(), 10);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn trailing_partial_record_is_dropped() {
        let path = scratch_file("partial.dat");
        let mut bytes = Vec::new();
        for &(re, im) in &[(1i16, 2i16), (3, 4)] {
            bytes.extend_from_slice(&re.to_le_bytes());
            bytes.extend_from_slice(&im.to_le_bytes());
        }
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        std::fs::write(&path, &bytes).unwrap();

        let loaded = load_sc16_raw(&path, DEFAULT_MAX_SAMPLES).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].re, 3.0);
        assert_eq!(loaded[1].im, 4.0);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn empty_file_yields_empty_waveform() {
        let path = scratch_file("empty.dat");
        std::fs::write(&path, b"").unwrap();
        assert!(load_sc16(&path, DEFAULT_MAX_SAMPLES).unwrap().is_empty());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = scratch_file("no_such_capture.dat");
        assert!(load_sc16(&path, DEFAULT_MAX_SAMPLES).is_err());
    }
}
