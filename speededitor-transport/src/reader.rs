//! Background input report reader
//!
//! hidapi reads are blocking, so input reports are pulled on a dedicated
//! thread and fanned out to subscribers over a broadcast channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use hidapi::HidDevice;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::types::{InputReport, TransportEvent};

/// Largest input report the surface sends
pub const MAX_REPORT_SIZE: usize = 64;

/// Broadcast channel capacity for input reports
pub const REPORT_CHANNEL_CAPACITY: usize = 256;

/// Configuration for the report reader loop
#[derive(Clone, Debug)]
pub struct ReaderConfig {
    /// Read timeout in milliseconds (for checking shutdown flag when idle)
    pub read_timeout_ms: i32,
    /// Name prefix for thread naming and debug logging
    pub name: &'static str,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: 5,
            name: "speededitor",
        }
    }
}

/// Reader loop for one HID input endpoint
///
/// Reads until the shutdown flag is set or the device fails. A read error
/// ends the loop: the device is gone, and a [`TransportEvent::Closed`] is
/// broadcast so the consumer can tear the session down.
pub fn run_report_reader_loop(
    input_device: HidDevice,
    tx: broadcast::Sender<TransportEvent>,
    shutdown: Arc<AtomicBool>,
    config: ReaderConfig,
) {
    debug!("{} report reader thread started", config.name);
    let mut buf = [0u8; MAX_REPORT_SIZE];
    let start_time = Instant::now();

    while !shutdown.load(Ordering::Relaxed) {
        // Timeout only affects how often we check shutdown flag when idle
        match input_device.read_timeout(&mut buf, config.read_timeout_ms) {
            Ok(len) if len > 0 => {
                let timestamp = start_time.elapsed().as_secs_f64();
                debug!(
                    "{} report reader got {} bytes at {:.3}s: {:02X?}",
                    config.name,
                    len,
                    timestamp,
                    &buf[..len.min(16)]
                );
                // Send to all subscribers (ignores if no receivers)
                let _ = tx.send(TransportEvent::Report(InputReport::new(buf[..len].to_vec())));
            }
            Ok(_) => {}
            Err(e) => {
                warn!("{} report reader error: {}", config.name, e);
                let _ = tx.send(TransportEvent::Closed {
                    reason: e.to_string(),
                });
                break;
            }
        }
    }

    debug!("{} report reader thread exiting", config.name);
}
