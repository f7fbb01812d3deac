//! TCP sync server.
//!
//! Session protocol, one TCP connection per step:
//! 1. client device uploads its recording, closes the write side
//! 2. leader device uploads its recording, closes the write side
//! 3. a third connection receives the clock offset in nanoseconds as a
//!    big-endian `f64` (NaN when estimation failed)

use std::net::SocketAddr;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use bytes::Bytes;
use contracts::{SyncError, SyncerConfig};
use ingestion::{parse_bytes, read_to_end_chunked, GyroRecording};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, instrument, warn};

use crate::pipeline::{run_estimation, ServerStats, SyncOutcome};

/// Upload order within a session
const ROLES: [&str; 2] = ["client", "leader"];

/// Sync server bound to a listening socket
pub struct SyncServer {
    listener: TcpListener,
    config: SyncerConfig,
    stats: ServerStats,
}

impl SyncServer {
    /// Bind to `server.host:server.port` from the configuration
    pub async fn bind(config: SyncerConfig) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind sync server to {addr}"))?;

        if let Some(dir) = &config.server.save_dir {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create save dir {}", dir.display()))?;
        }

        Ok(Self {
            listener,
            config,
            stats: ServerStats::default(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read listener address")
    }

    /// Serve sessions until `max_sessions` is reached (None = forever)
    pub async fn run(mut self, max_sessions: Option<u64>) -> Result<ServerStats> {
        let start_time = Instant::now();
        info!(addr = %self.local_addr()?, ?max_sessions, "Sync server started");

        while max_sessions.map_or(true, |max| self.stats.sessions < max) {
            let session = self.stats.sessions + 1;
            let session_start = Instant::now();

            let status = match self.run_session(session).await {
                Ok(Ok(_)) => "ok",
                Ok(Err(kind)) => kind,
                Err(e) => {
                    warn!(session, error = %e, "Session aborted");
                    self.stats.aborted_sessions += 1;
                    "aborted"
                }
            };

            observability::record_session(status, session_start.elapsed().as_secs_f64() * 1e3);
            self.stats.sessions += 1;
        }

        self.stats.duration = start_time.elapsed();
        info!(sessions = self.stats.sessions, "Sync server stopped");
        Ok(self.stats)
    }

    /// One upload-upload-reply cycle
    ///
    /// The outer error means the exchange itself broke (no reply was sent);
    /// the inner one carries the estimation failure kind after NaN was sent.
    #[instrument(name = "sync_session", skip(self))]
    async fn run_session(
        &mut self,
        session: u64,
    ) -> Result<std::result::Result<SyncOutcome, &'static str>> {
        info!("Session started, waiting for two gyro recordings");

        let read_timeout = Duration::from_millis(self.config.server.read_timeout_ms);
        let mut uploads: Vec<Bytes> = Vec::with_capacity(ROLES.len());
        for (idx, role) in ROLES.iter().enumerate() {
            let (mut socket, peer) = self
                .listener
                .accept()
                .await
                .context("Failed to accept upload connection")?;
            info!(%peer, role, "Device connected");

            let raw = tokio::time::timeout(
                read_timeout,
                read_to_end_chunked(&mut socket, self.config.server.read_buffer_size),
            )
            .await
            .with_context(|| {
                format!("Timed out after {read_timeout:?} receiving {role} recording")
            })?
            .with_context(|| format!("Failed to receive {role} recording"))?;
            self.stats.bytes_received += raw.len() as u64;

            if let Some(dir) = &self.config.server.save_dir {
                save_upload(dir, idx, &raw).await?;
            }
            info!(role, bytes = raw.len(), "Recording received");
            uploads.push(raw);
        }

        let result = self.estimate(&uploads[0], &uploads[1]).await;
        let reply_ns = match &result {
            Ok(outcome) => {
                info!(
                    clock_offset_s = outcome.clock_offset_s,
                    delay_s = outcome.estimate.delay_s,
                    "Returning offset"
                );
                self.stats
                    .estimations
                    .record_success(&outcome.estimate, Some(outcome.clock_offset_s));
                observability::record_clock_offset(outcome.clock_offset_s);
                outcome.clock_offset_ns()
            }
            Err(e) => {
                warn!(error = %e, "Estimation failed, returning NaN");
                self.stats.estimations.record_failure(e.kind());
                f64::NAN
            }
        };

        let (socket, peer) = self
            .listener
            .accept()
            .await
            .context("Failed to accept reply connection")?;
        info!(%peer, "Sending offset");
        send_offset(socket, reply_ns).await?;

        Ok(result.map_err(|e| e.kind()))
    }

    async fn estimate(&self, client: &Bytes, leader: &Bytes) -> Result<SyncOutcome, SyncError> {
        let unit = self.config.input.timestamp_unit;
        let first = parse_upload("client", client, unit)?;
        let second = parse_upload("leader", leader, unit)?;
        let estimator = self.config.estimator;

        tokio::task::spawn_blocking(move || run_estimation(first, second, estimator))
            .await
            .map_err(|e| SyncError::Io(std::io::Error::other(e)))?
    }
}

fn parse_upload(
    role: &str,
    raw: &[u8],
    unit: contracts::TimestampUnit,
) -> Result<GyroRecording, SyncError> {
    let recording = parse_bytes(raw, unit)?;
    observability::record_upload(role, raw.len(), recording.len());
    Ok(recording)
}

async fn save_upload(dir: &Path, idx: usize, raw: &[u8]) -> Result<()> {
    let path = dir.join(format!("gyro_file_{idx}.csv"));
    tokio::fs::write(&path, raw)
        .await
        .with_context(|| format!("Failed to save upload to {}", path.display()))
}

async fn send_offset(mut socket: TcpStream, offset_ns: f64) -> Result<()> {
    socket
        .write_all(&offset_ns.to_be_bytes())
        .await
        .context("Failed to send offset")?;
    socket.shutdown().await.context("Failed to close reply")?;
    Ok(())
}
