//! hidapi-backed transport for a USB-attached surface

use std::ffi::CString;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hidapi::{DeviceInfo, HidApi, HidDevice};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::device_registry;
use crate::error::TransportError;
use crate::reader::{run_report_reader_loop, ReaderConfig, REPORT_CHANNEL_CAPACITY};
use crate::types::{TransportDeviceInfo, TransportEvent};
use crate::Transport;

/// HID transport for a directly connected Speed Editor
///
/// The device path is opened twice: one handle is owned by the reader
/// thread, the other carries output and feature reports.
pub struct HidTransport {
    /// Handle for output and feature reports
    device: Mutex<HidDevice>,
    /// Device information
    info: TransportDeviceInfo,
    /// Broadcast sender for input reports
    report_tx: broadcast::Sender<TransportEvent>,
    /// Shutdown flag for the reader thread
    shutdown: Arc<AtomicBool>,
}

impl HidTransport {
    /// Open the surface at a specific hidraw path
    pub fn open_path(api: &HidApi, path: &str) -> Result<Self, TransportError> {
        let info = api
            .device_list()
            .find(|d| d.path().to_string_lossy() == path)
            .map(device_info_from)
            .unwrap_or_else(|| TransportDeviceInfo {
                vid: device_registry::VENDOR_ID,
                pid: device_registry::PID_SPEED_EDITOR,
                device_path: path.to_string(),
                serial: None,
                product_name: None,
            });
        Self::open_with_info(api, info)
    }

    /// Open the first connected device with an exact VID/PID
    pub fn open_matching(api: &HidApi, vid: u16, pid: u16) -> Result<Self, TransportError> {
        if !device_registry::is_supported(vid, pid) {
            warn!("{:04x}:{:04x} is not a known Speed Editor ID", vid, pid);
        }
        let info = api
            .device_list()
            .find(|d| d.vendor_id() == vid && d.product_id() == pid)
            .map(device_info_from)
            .ok_or_else(|| TransportError::DeviceNotFound(format!("{vid:04x}:{pid:04x}")))?;
        Self::open_with_info(api, info)
    }

    fn open_with_info(api: &HidApi, info: TransportDeviceInfo) -> Result<Self, TransportError> {
        let path = CString::new(info.device_path.clone())
            .map_err(|e| TransportError::Internal(format!("invalid device path: {e}")))?;

        let device = api.open_path(&path)?;
        let input = api.open_path(&path)?;

        let (report_tx, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        let shutdown = Arc::new(AtomicBool::new(false));

        let config = ReaderConfig::default();
        let tx_clone = report_tx.clone();
        let shutdown_clone = Arc::clone(&shutdown);
        std::thread::Builder::new()
            .name(format!("{}-report-reader", config.name))
            .spawn(move || run_report_reader_loop(input, tx_clone, shutdown_clone, config))
            .map_err(|e| TransportError::Internal(format!("spawn reader thread: {e}")))?;

        info!(
            "Opened {} ({:04x}:{:04x}) at {}",
            info.product_name.as_deref().unwrap_or("Speed Editor"),
            info.vid,
            info.pid,
            info.device_path
        );

        Ok(Self {
            device: Mutex::new(device),
            info,
            report_tx,
            shutdown,
        })
    }
}

fn device_info_from(d: &DeviceInfo) -> TransportDeviceInfo {
    TransportDeviceInfo {
        vid: d.vendor_id(),
        pid: d.product_id(),
        device_path: d.path().to_string_lossy().into_owned(),
        serial: d.serial_number().map(str::to_string),
        product_name: d.product_string().map(str::to_string),
    }
}

#[async_trait]
impl Transport for HidTransport {
    async fn write(&self, data: &[u8]) -> Result<(), TransportError> {
        debug!("Output report: {:02X?}", data);
        let device = self.device.lock();
        device.write(data)?;
        Ok(())
    }

    async fn send_feature_report(&self, data: &[u8]) -> Result<(), TransportError> {
        debug!("Feature report out: {:02X?}", data);
        let device = self.device.lock();
        device.send_feature_report(data)?;
        Ok(())
    }

    async fn get_feature_report(
        &self,
        report_id: u8,
        len: usize,
    ) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0u8; len.max(1)];
        buf[0] = report_id;
        let read = {
            let device = self.device.lock();
            device.get_feature_report(&mut buf)?
        };
        if read == 0 {
            return Err(TransportError::ShortReport {
                expected: len,
                actual: 0,
            });
        }
        buf.truncate(read);
        debug!("Feature report in: {:02X?}", buf);
        Ok(buf)
    }

    fn subscribe_reports(&self) -> Option<broadcast::Receiver<TransportEvent>> {
        Some(self.report_tx.subscribe())
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        &self.info
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.shutdown.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for HidTransport {
    fn drop(&mut self) {
        // Signal shutdown to report reader thread
        self.shutdown.store(true, Ordering::SeqCst);
        debug!("HidTransport dropped, signaling report reader shutdown");
    }
}
