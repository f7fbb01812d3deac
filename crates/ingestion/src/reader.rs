//! Recording readers for files and sockets

use std::path::Path;

use bytes::{Bytes, BytesMut};
use contracts::{SyncError, TimestampUnit};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, instrument};

use crate::csv::{parse_bytes, parse_recording};
use crate::recording::GyroRecording;

/// Read and parse a recording file
#[instrument(name = "read_recording", level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_recording(
    path: impl AsRef<Path>,
    unit: TimestampUnit,
) -> Result<GyroRecording, SyncError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse_recording(&content, unit)
}

/// Drain a reader until EOF in `buffer_size` chunks
pub async fn read_to_end_chunked<R>(reader: &mut R, buffer_size: usize) -> Result<Bytes, SyncError>
where
    R: AsyncRead + Unpin,
{
    if buffer_size == 0 {
        return Err(SyncError::invalid_input("buffer_size", "must be greater than 0"));
    }

    let mut data = BytesMut::with_capacity(buffer_size);
    let mut chunk = vec![0u8; buffer_size];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..n]);
    }

    metrics::counter!("gyro_sync_bytes_received_total").increment(data.len() as u64);
    debug!(bytes = data.len(), "upload received");
    Ok(data.freeze())
}

/// Read an upload until EOF and parse it
///
/// Returns the raw bytes as well so callers can persist the upload.
pub async fn read_recording_async<R>(
    reader: &mut R,
    unit: TimestampUnit,
    buffer_size: usize,
) -> Result<(GyroRecording, Bytes), SyncError>
where
    R: AsyncRead + Unpin,
{
    let raw = read_to_end_chunked(reader, buffer_size).await?;
    let recording = parse_bytes(&raw, unit)?;
    Ok((recording, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_recording_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0.1,0.2,0.3,0").unwrap();
        writeln!(file, "0.4,0.5,0.6,5000000").unwrap();

        let rec = read_recording(file.path(), TimestampUnit::Nanoseconds).unwrap();
        assert_eq!(rec.len(), 2);
        assert!((rec.timestamps_s[1] - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_recording("/nonexistent/gyro.csv", TimestampUnit::Seconds).unwrap_err();
        assert!(matches!(err, SyncError::Io(_)));
    }

    #[tokio::test]
    async fn test_reads_in_small_chunks() {
        let content = b"1,2,3,0.0\n4,5,6,0.1\n7,8,9,0.2\n";
        let mut reader: &[u8] = content;
        let (rec, raw) = read_recording_async(&mut reader, TimestampUnit::Seconds, 4)
            .await
            .unwrap();
        assert_eq!(raw.as_ref(), content);
        assert_eq!(rec.samples[2], [7.0, 8.0, 9.0]);
    }

    #[tokio::test]
    async fn test_zero_buffer_rejected() {
        let mut reader: &[u8] = b"";
        assert!(read_to_end_chunked(&mut reader, 0).await.is_err());
    }
}
