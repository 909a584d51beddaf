//! In-memory transport for driving sessions without hardware

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use speededitor::SurfaceEvent;
use speededitor_transport::{
    InputReport, Transport, TransportDeviceInfo, TransportError, TransportEvent,
};
use tokio::sync::{broadcast, mpsc};

/// Records everything written and replays queued feature reports
pub struct MockTransport {
    info: TransportDeviceInfo,
    writes: Mutex<Vec<Vec<u8>>>,
    feature_sends: Mutex<Vec<Vec<u8>>>,
    feature_replies: Mutex<VecDeque<Vec<u8>>>,
    report_tx: broadcast::Sender<TransportEvent>,
    fail_writes: AtomicBool,
    closed: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Self {
        let (report_tx, _) = broadcast::channel(64);
        Self {
            info: TransportDeviceInfo {
                vid: 0x1edb,
                pid: 0xda0e,
                device_path: "mock".into(),
                serial: None,
                product_name: Some("DaVinci Resolve Speed Editor".into()),
            },
            writes: Mutex::new(Vec::new()),
            feature_sends: Mutex::new(Vec::new()),
            feature_replies: Mutex::new(VecDeque::new()),
            report_tx,
            fail_writes: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Queue the three replies of a successful handshake
    pub fn queue_handshake(&self, challenge: [u8; 8], interval_secs: u16) {
        let mut get_challenge = vec![0x06, 0x00];
        get_challenge.extend_from_slice(&challenge);
        self.queue_reply(get_challenge);

        self.queue_reply(vec![0x06, 0x02, 0, 0, 0, 0, 0, 0, 0, 0]);

        let mut status = vec![0x06, 0x04];
        status.extend_from_slice(&interval_secs.to_le_bytes());
        status.extend_from_slice(&[0; 6]);
        self.queue_reply(status);
    }

    pub fn queue_reply(&self, reply: Vec<u8>) {
        self.feature_replies.lock().push_back(reply);
    }

    /// Deliver an input report to subscribers
    pub fn push_report(&self, data: &[u8]) {
        let _ = self
            .report_tx
            .send(TransportEvent::Report(InputReport::new(data.to_vec())));
    }

    /// Signal that the device went away
    pub fn push_closed(&self, reason: &str) {
        let _ = self.report_tx.send(TransportEvent::Closed {
            reason: reason.to_string(),
        });
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().clone()
    }

    pub fn feature_sends(&self) -> Vec<Vec<u8>> {
        self.feature_sends.lock().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn write(&self, data: &[u8]) -> Result<(), TransportError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TransportError::Disconnected);
        }
        self.writes.lock().push(data.to_vec());
        Ok(())
    }

    async fn send_feature_report(&self, data: &[u8]) -> Result<(), TransportError> {
        self.feature_sends.lock().push(data.to_vec());
        Ok(())
    }

    async fn get_feature_report(
        &self,
        report_id: u8,
        _len: usize,
    ) -> Result<Vec<u8>, TransportError> {
        let reply = self
            .feature_replies
            .lock()
            .pop_front()
            .ok_or(TransportError::Disconnected)?;
        assert_eq!(reply.first(), Some(&report_id), "queued reply for wrong report");
        Ok(reply)
    }

    fn subscribe_reports(&self) -> Option<broadcast::Receiver<TransportEvent>> {
        Some(self.report_tx.subscribe())
    }

    fn device_info(&self) -> &TransportDeviceInfo {
        &self.info
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Key report with the given key codes in the first slots, six slots total
pub fn key_report(codes: &[u16]) -> Vec<u8> {
    let mut report = vec![0x04];
    for slot in 0..6 {
        let code = codes.get(slot).copied().unwrap_or(0);
        report.extend_from_slice(&code.to_le_bytes());
    }
    report
}

/// Wheel report carrying `delta`
pub fn wheel_report(delta: i32) -> Vec<u8> {
    let mut report = vec![0x03, 0x00];
    report.extend_from_slice(&delta.to_le_bytes());
    report.push(0x00);
    report
}

/// Next event, failing the test if none arrives
pub async fn next_event(events: &mut mpsc::Receiver<SurfaceEvent>) -> SurfaceEvent {
    tokio::time::timeout(Duration::from_secs(30), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event stream ended")
}

/// Assert nothing arrives within `wait`
pub async fn assert_quiet(events: &mut mpsc::Receiver<SurfaceEvent>, wait: Duration) {
    if let Ok(event) = tokio::time::timeout(wait, events.recv()).await {
        panic!("unexpected event: {event:?}");
    }
}
