//! Exclusive-access transport layer
//!
//! `SerializedTransport` wraps a raw `Transport` and funnels every write
//! through one lock. Multi-report exchanges (the authentication handshake)
//! take the lock once via [`SerializedTransport::lock`] and hold it until the
//! exchange finishes, so no LED update or second handshake can land between
//! their steps.
//!
//! ```text
//! [HidTransport / test doubles]  ← implements Transport (raw I/O)
//!              |
//!     [SerializedTransport]      ← one writer at a time
//!              |
//!   [session loop / re-auth task]
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, MutexGuard};

use crate::error::TransportError;
use crate::types::{TransportDeviceInfo, TransportEvent};
use crate::Transport;

/// A transport wrapper that serializes all outbound traffic
pub struct SerializedTransport {
    inner: Arc<dyn Transport>,
    io_lock: Mutex<()>,
}

impl SerializedTransport {
    /// Wrap a raw transport
    pub fn new(inner: Arc<dyn Transport>) -> Self {
        Self {
            inner,
            io_lock: Mutex::new(()),
        }
    }

    /// Acquire exclusive access for a multi-report exchange
    pub async fn lock(&self) -> ExclusiveTransport<'_> {
        ExclusiveTransport {
            inner: self.inner.as_ref(),
            _guard: self.io_lock.lock().await,
        }
    }

    /// Write a single output report
    pub async fn write(&self, data: &[u8]) -> Result<(), TransportError> {
        self.lock().await.write(data).await
    }

    /// Subscribe to inbound input reports
    pub fn subscribe_reports(&self) -> Option<broadcast::Receiver<TransportEvent>> {
        self.inner.subscribe_reports()
    }

    /// Get device information
    pub fn device_info(&self) -> &TransportDeviceInfo {
        self.inner.device_info()
    }

    /// Close the underlying transport once any in-flight exchange finishes
    pub async fn close(&self) -> Result<(), TransportError> {
        let _guard = self.io_lock.lock().await;
        self.inner.close().await
    }
}

/// Exclusive handle on a transport; other writers wait until it is dropped
pub struct ExclusiveTransport<'a> {
    inner: &'a dyn Transport,
    _guard: MutexGuard<'a, ()>,
}

impl ExclusiveTransport<'_> {
    /// Write an output report
    pub async fn write(&self, data: &[u8]) -> Result<(), TransportError> {
        self.inner.write(data).await
    }

    /// Send a feature report
    pub async fn send_feature_report(&self, data: &[u8]) -> Result<(), TransportError> {
        self.inner.send_feature_report(data).await
    }

    /// Read a feature report
    pub async fn get_feature_report(
        &self,
        report_id: u8,
        len: usize,
    ) -> Result<Vec<u8>, TransportError> {
        self.inner.get_feature_report(report_id, len).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;

    struct RecordingTransport {
        writes: parking_lot::Mutex<Vec<Vec<u8>>>,
        info: TransportDeviceInfo,
    }

    impl RecordingTransport {
        fn new() -> Self {
            Self {
                writes: parking_lot::Mutex::new(Vec::new()),
                info: TransportDeviceInfo {
                    vid: 0x1edb,
                    pid: 0xda0e,
                    device_path: "test".into(),
                    serial: None,
                    product_name: None,
                },
            }
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn write(&self, data: &[u8]) -> Result<(), TransportError> {
            self.writes.lock().push(data.to_vec());
            Ok(())
        }

        async fn send_feature_report(&self, data: &[u8]) -> Result<(), TransportError> {
            self.writes.lock().push(data.to_vec());
            Ok(())
        }

        async fn get_feature_report(
            &self,
            report_id: u8,
            len: usize,
        ) -> Result<Vec<u8>, TransportError> {
            let mut buf = vec![0u8; len];
            buf[0] = report_id;
            Ok(buf)
        }

        fn subscribe_reports(&self) -> Option<broadcast::Receiver<TransportEvent>> {
            None
        }

        fn device_info(&self) -> &TransportDeviceInfo {
            &self.info
        }

        async fn close(&self) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_write_waits_for_exclusive_holder() {
        let raw = Arc::new(RecordingTransport::new());
        let transport = Arc::new(SerializedTransport::new(raw.clone()));

        let exclusive = transport.lock().await;
        exclusive.send_feature_report(&[0x06, 0x00]).await.unwrap();

        let writer = {
            let transport = Arc::clone(&transport);
            tokio::spawn(async move { transport.write(&[0x02, 0, 0, 0, 0]).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(raw.writes.lock().len(), 1, "write slipped into exchange");

        exclusive.send_feature_report(&[0x06, 0x01]).await.unwrap();
        drop(exclusive);

        writer.await.unwrap().unwrap();
        let writes = raw.writes.lock();
        assert_eq!(writes.len(), 3);
        assert_eq!(writes[1], vec![0x06, 0x01]);
        assert_eq!(writes[2], vec![0x02, 0, 0, 0, 0]);
    }
}
