//! `x,y,z,t` recording parser
//!
//! One sample per line: angular velocity in rad/s followed by a timestamp.
//! Blank lines and `#` comments are skipped.

use contracts::{SyncError, TimestampUnit};
use tracing::{debug, instrument};

use crate::recording::GyroRecording;

const FIELDS_PER_LINE: usize = 4;

/// Parse a recording held in memory
#[instrument(name = "parse_recording", level = "debug", skip(content), fields(bytes = content.len()))]
pub fn parse_recording(content: &str, unit: TimestampUnit) -> Result<GyroRecording, SyncError> {
    let factor = unit.to_seconds_factor();
    let mut recording = GyroRecording::default();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (sample, t) = parse_line(line, idx + 1)?;
        recording.samples.push(sample);
        recording.timestamps_s.push(t * factor);
    }

    debug!(samples = recording.len(), ?unit, "recording parsed");
    Ok(recording)
}

/// Parse raw uploaded bytes; must be UTF-8
pub fn parse_bytes(bytes: &[u8], unit: TimestampUnit) -> Result<GyroRecording, SyncError> {
    let content = std::str::from_utf8(bytes).map_err(|e| {
        // Report the line holding the first invalid byte
        let line = bytes[..e.valid_up_to()].iter().filter(|&&b| b == b'\n').count() + 1;
        SyncError::recording_parse(line, format!("invalid UTF-8: {e}"))
    })?;
    parse_recording(content, unit)
}

fn parse_line(line: &str, line_no: usize) -> Result<([f64; 3], f64), SyncError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != FIELDS_PER_LINE {
        return Err(SyncError::recording_parse(
            line_no,
            format!("expected {FIELDS_PER_LINE} fields, found {}", fields.len()),
        ));
    }

    let mut sample = [0.0; 3];
    for (axis, slot) in sample.iter_mut().enumerate() {
        *slot = parse_number(fields[axis], line_no, ["x", "y", "z"][axis])?;
    }

    // Integer timestamps (ns since boot) are the common case
    let t = match fields[3].parse::<i64>() {
        Ok(v) => v as f64,
        Err(_) => parse_number(fields[3], line_no, "t")?,
    };

    Ok((sample, t))
}

fn parse_number(field: &str, line_no: usize, name: &str) -> Result<f64, SyncError> {
    let value: f64 = field
        .parse()
        .map_err(|_| SyncError::recording_parse(line_no, format!("{name}: '{field}' is not a number")))?;
    if !value.is_finite() {
        return Err(SyncError::recording_parse(
            line_no,
            format!("{name}: '{field}' is not finite"),
        ));
    }
    Ok(value)
}
