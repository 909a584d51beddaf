//! Surface session
//!
//! One session owns one opened device. A single task consumes the input
//! report stream in arrival order and turns it into [`SurfaceEvent`]s; a second
//! task re-runs the handshake whenever the device asks for it. All writes go
//! through the [`SerializedTransport`] lock, so LED updates never land in the
//! middle of a handshake.
//!
//! ```text
//!  Transport ──reports──► decode ──► edges ─────────► Pressed / Released
//!                                 └► wheel ──────────► Wheel
//!  Session (handle) ──commands──►  LED / mode writes
//!  re-auth task ──results──► Authenticated / AuthenticationFailed
//! ```

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use speededitor_transport::{
    SerializedTransport, Transport, TransportDeviceInfo, TransportError, TransportEvent,
};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::auth::{AuthError, AuthState, Authenticator};
use crate::decoder::{decode_report, DecodedReport};
use crate::edge::{KeyEdge, KeyEdgeTracker};
use crate::error::SurfaceError;
use crate::events::SurfaceEvent;
use crate::keys::{key_by_logical, KeyDescriptor};
use crate::led::{LedReport, LedStateEncoder};
use crate::wheel::{WheelConfig, WheelMode, WheelModeController};

const COMMAND_QUEUE_SIZE: usize = 32;

/// Session behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Wheel mode selected when the session starts
    pub initial_mode: WheelMode,
    /// JOG / SHTL / SCRL presses switch the wheel instead of being forwarded
    pub mode_keys_select_wheel: bool,
    /// Events buffered before the session waits for the application
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_mode: WheelMode::Jog,
            mode_keys_select_wheel: true,
            event_capacity: 256,
        }
    }
}

enum Command {
    SetWheelMode {
        mode: WheelMode,
        reply: oneshot::Sender<Result<(), SurfaceError>>,
    },
    SetKeyLed {
        logical_code: u8,
        on: bool,
        reply: oneshot::Sender<Result<(), SurfaceError>>,
    },
    ToggleKeyLed {
        logical_code: u8,
        reply: oneshot::Sender<Result<bool, SurfaceError>>,
    },
    GetWheelMode {
        reply: oneshot::Sender<WheelMode>,
    },
    Reauthenticated(Result<Duration, AuthError>),
    Close {
        reply: oneshot::Sender<Result<(), SurfaceError>>,
    },
}

/// Handle to a running session
///
/// Dropping the handle stops the session without closing the transport;
/// use [`Session::close`] for an orderly shutdown.
pub struct Session {
    commands: mpsc::Sender<Command>,
    transport: Arc<SerializedTransport>,
    auth: Arc<Authenticator>,
    task: Option<JoinHandle<()>>,
}

impl Session {
    /// Authenticate the device and start processing its input
    ///
    /// Fails if `wheel` does not validate or the first handshake fails; later
    /// handshakes are reported as events instead. The returned receiver yields events in arrival order
    /// and ends after `Disconnected` or [`Session::close`].
    pub async fn start(
        transport: Arc<dyn Transport>,
        config: &SessionConfig,
        wheel: WheelConfig,
    ) -> Result<(Session, mpsc::Receiver<SurfaceEvent>), SurfaceError> {
        wheel.validate()?;
        let transport = Arc::new(SerializedTransport::new(transport));
        // Subscribe first so nothing sent right after the handshake is missed
        let reports = transport
            .subscribe_reports()
            .ok_or(SurfaceError::NoInputStream)?;

        let auth = Arc::new(Authenticator::new());
        let interval = auth.authenticate(&transport).await?;

        let mut leds = LedStateEncoder::new();
        transport.write(&LedReport::BASELINE.to_bytes()).await?;
        leds.apply(LedReport::BASELINE);

        let mut wheel = WheelModeController::new(wheel);
        for report in wheel.set_mode(config.initial_mode, &mut leds) {
            transport.write(&report.to_bytes()).await?;
        }

        let (event_tx, event_rx) = mpsc::channel(config.event_capacity.max(1));
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_SIZE);

        // Fresh channel, nothing can be queued ahead of this
        let _ = event_tx
            .send(SurfaceEvent::Authenticated {
                interval_secs: interval.as_secs(),
            })
            .await;

        let reauth = if interval.is_zero() {
            warn!("Device reported a re-auth interval of 0, not scheduling re-authentication");
            None
        } else {
            Some(AbortOnDrop(tokio::spawn(reauth_task(
                Arc::clone(&transport),
                Arc::clone(&auth),
                interval,
                command_tx.clone(),
            ))))
        };

        let session_loop = SessionLoop {
            transport: Arc::clone(&transport),
            events: event_tx,
            edges: KeyEdgeTracker::new(),
            leds,
            wheel,
            idle: None,
            mode_keys_select_wheel: config.mode_keys_select_wheel,
            reauth,
        };
        let task = tokio::spawn(session_loop.run(command_rx, reports));

        info!(
            "Session started on {} (mode {})",
            transport.device_info().device_path,
            config.initial_mode
        );

        Ok((
            Session {
                commands: command_tx,
                transport,
                auth,
                task: Some(task),
            },
            event_rx,
        ))
    }

    /// Select the wheel mode and relight the mode keys
    pub async fn set_wheel_mode(&self, mode: WheelMode) -> Result<(), SurfaceError> {
        self.request(|reply| Command::SetWheelMode { mode, reply })
            .await?
    }

    /// Turn a key's LED on or off by logical code
    pub async fn set_key_led(&self, logical_code: u8, on: bool) -> Result<(), SurfaceError> {
        self.request(|reply| Command::SetKeyLed {
            logical_code,
            on,
            reply,
        })
        .await?
    }

    /// Flip a key's LED by logical code; returns whether it is now lit
    pub async fn toggle_key_led(&self, logical_code: u8) -> Result<bool, SurfaceError> {
        self.request(|reply| Command::ToggleKeyLed {
            logical_code,
            reply,
        })
        .await?
    }

    /// Active wheel mode
    pub async fn wheel_mode(&self) -> Result<WheelMode, SurfaceError> {
        self.request(|reply| Command::GetWheelMode { reply }).await
    }

    /// Authentication state as of the last handshake step
    pub fn auth_state(&self) -> AuthState {
        self.auth.state()
    }

    pub fn device_info(&self) -> &TransportDeviceInfo {
        self.transport.device_info()
    }

    /// Stop timers, close the transport and wait for the session to finish
    ///
    /// Closing a session that already ended is not an error.
    pub async fn close(mut self) -> Result<(), SurfaceError> {
        let result = match self.request(|reply| Command::Close { reply }).await {
            Ok(result) => result,
            Err(SurfaceError::SessionClosed) => Ok(()),
            Err(e) => Err(e),
        };
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        result
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SurfaceError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| SurfaceError::SessionClosed)?;
        response.await.map_err(|_| SurfaceError::SessionClosed)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn reauth_task(
    transport: Arc<SerializedTransport>,
    auth: Arc<Authenticator>,
    mut interval: Duration,
    commands: mpsc::Sender<Command>,
) {
    loop {
        sleep(interval).await;
        debug!("Re-authenticating");
        let result = auth.authenticate(&transport).await;

        let stop = match &result {
            Ok(next) if next.is_zero() => {
                warn!("Device reported a re-auth interval of 0, stopping re-authentication");
                true
            }
            Ok(next) => {
                interval = *next;
                false
            }
            Err(e) => {
                warn!("Re-authentication failed: {}", e);
                e.is_transport()
            }
        };

        if commands.send(Command::Reauthenticated(result)).await.is_err() || stop {
            break;
        }
    }
}

struct SessionLoop {
    transport: Arc<SerializedTransport>,
    events: mpsc::Sender<SurfaceEvent>,
    edges: KeyEdgeTracker,
    leds: LedStateEncoder,
    wheel: WheelModeController,
    /// Pending spring-back: when, and for which mode
    idle: Option<(Instant, WheelMode)>,
    mode_keys_select_wheel: bool,
    reauth: Option<AbortOnDrop>,
}

impl SessionLoop {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut reports: broadcast::Receiver<TransportEvent>,
    ) {
        loop {
            let idle_deadline = self.idle.map(|(deadline, _)| deadline);

            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        debug!("All session handles dropped");
                        return;
                    };
                    if self.handle_command(command).await.is_break() {
                        return;
                    }
                }
                event = reports.recv() => {
                    let flow = match event {
                        Ok(TransportEvent::Report(report)) => self.handle_report(&report.data).await,
                        Ok(TransportEvent::Closed { reason }) => self.disconnect(reason).await,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("Input stream lagged, {} reports dropped", skipped);
                            ControlFlow::Continue(())
                        }
                        Err(RecvError::Closed) => {
                            self.disconnect("input report stream ended".to_string()).await
                        }
                    };
                    if flow.is_break() {
                        return;
                    }
                }
                () = sleep_until(idle_deadline.unwrap_or_else(Instant::now)), if idle_deadline.is_some() => {
                    if let Some((_, mode)) = self.idle.take() {
                        let event = self.wheel.idle_expired(mode);
                        self.emit(event.into()).await;
                    }
                }
            }
        }
    }

    async fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::SetWheelMode { mode, reply } => {
                let result = self.change_mode(mode).await;
                self.reply(reply, result).await
            }
            Command::SetKeyLed {
                logical_code,
                on,
                reply,
            } => {
                let key = match self.led_key(logical_code) {
                    Ok(key) => key,
                    Err(e) => {
                        let _ = reply.send(Err(e));
                        return ControlFlow::Continue(());
                    }
                };
                let report = self.leds.set(key, on);
                let result = self.write_led(report).await;
                self.reply(reply, result).await
            }
            Command::ToggleKeyLed {
                logical_code,
                reply,
            } => {
                let key = match self.led_key(logical_code) {
                    Ok(key) => key,
                    Err(e) => {
                        let _ = reply.send(Err(e));
                        return ControlFlow::Continue(());
                    }
                };
                let report = self.leds.toggle(key);
                let result = self
                    .write_led(report)
                    .await
                    .map(|()| self.leds.is_lit(key));
                self.reply(reply, result).await
            }
            Command::GetWheelMode { reply } => {
                let _ = reply.send(self.wheel.mode());
                ControlFlow::Continue(())
            }
            Command::Reauthenticated(Ok(interval)) => {
                self.emit(SurfaceEvent::Authenticated {
                    interval_secs: interval.as_secs(),
                })
                .await;
                ControlFlow::Continue(())
            }
            Command::Reauthenticated(Err(e)) if e.is_transport() => {
                self.disconnect(e.to_string()).await
            }
            Command::Reauthenticated(Err(e)) => {
                self.emit(SurfaceEvent::AuthenticationFailed { step: e.step() })
                    .await;
                ControlFlow::Continue(())
            }
            Command::Close { reply } => {
                self.stop_timers();
                let result = self.transport.close().await.map_err(SurfaceError::from);
                info!("Session closed");
                let _ = reply.send(result);
                ControlFlow::Break(())
            }
        }
    }

    /// Send a command result; a transport failure also ends the session
    async fn reply<T>(
        &mut self,
        reply: oneshot::Sender<Result<T, SurfaceError>>,
        result: Result<T, TransportError>,
    ) -> ControlFlow<()> {
        match result {
            Ok(value) => {
                let _ = reply.send(Ok(value));
                ControlFlow::Continue(())
            }
            Err(e) => {
                let reason = e.to_string();
                let _ = reply.send(Err(e.into()));
                self.disconnect(reason).await
            }
        }
    }

    async fn handle_report(&mut self, data: &[u8]) -> ControlFlow<()> {
        match decode_report(data) {
            Some(DecodedReport::Keys(snapshot)) => {
                for edge in self.edges.update(snapshot) {
                    if let Err(e) = self.handle_edge(edge).await {
                        return self.disconnect(e.to_string()).await;
                    }
                }
            }
            Some(DecodedReport::Wheel(delta)) => {
                let mode = self.wheel.mode();
                let update = self.wheel.on_delta(delta.delta, Instant::now());
                if let Some(deadline) = update.idle_deadline {
                    self.idle = Some((deadline, mode));
                }
                if let Some(event) = update.event {
                    self.emit(event.into()).await;
                }
            }
            None => {}
        }
        ControlFlow::Continue(())
    }

    async fn handle_edge(&mut self, edge: KeyEdge) -> Result<(), TransportError> {
        let (key, pressed) = match edge {
            KeyEdge::Pressed(key) => (key, true),
            KeyEdge::Released(key) => (key, false),
        };

        if self.mode_keys_select_wheel {
            if let Some(mode) = WheelMode::from_key(key) {
                if pressed {
                    self.change_mode(mode).await?;
                }
                return Ok(());
            }
        }

        let event = if pressed {
            SurfaceEvent::Pressed { key }
        } else {
            SurfaceEvent::Released { key }
        };
        self.emit(event).await;
        Ok(())
    }

    async fn change_mode(&mut self, mode: WheelMode) -> Result<(), TransportError> {
        let changed = mode != self.wheel.mode();
        if changed {
            // Settle the outgoing mode before the new one takes over
            if let Some((_, armed)) = self.idle.take() {
                let event = self.wheel.idle_expired(armed);
                self.emit(event.into()).await;
            }
        }
        for report in self.wheel.set_mode(mode, &mut self.leds) {
            self.transport.write(&report.to_bytes()).await?;
        }
        if changed {
            debug!("Wheel mode: {}", mode);
            self.emit(SurfaceEvent::WheelModeChanged { mode }).await;
        }
        Ok(())
    }

    fn led_key(&self, logical_code: u8) -> Result<&'static KeyDescriptor, SurfaceError> {
        let key = key_by_logical(logical_code).ok_or(SurfaceError::UnknownKey(logical_code))?;
        if self.mode_keys_select_wheel && WheelMode::from_key(key).is_some() {
            return Err(SurfaceError::ReservedKey(key.name));
        }
        if key.led.is_none() {
            return Err(SurfaceError::NoLed(key.name));
        }
        Ok(key)
    }

    async fn write_led(&self, report: Option<LedReport>) -> Result<(), TransportError> {
        match report {
            Some(report) => self.transport.write(&report.to_bytes()).await,
            None => Ok(()),
        }
    }

    async fn emit(&self, event: SurfaceEvent) {
        if self.events.send(event).await.is_err() {
            debug!("Event receiver dropped");
        }
    }

    fn stop_timers(&mut self) {
        self.reauth = None;
        self.idle = None;
    }

    async fn disconnect(&mut self, reason: String) -> ControlFlow<()> {
        self.stop_timers();
        warn!("Device disconnected: {}", reason);
        self.emit(SurfaceEvent::Disconnected { reason }).await;
        if let Err(e) = self.transport.close().await {
            debug!("Close after disconnect failed: {}", e);
        }
        ControlFlow::Break(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.initial_mode, WheelMode::Jog);
        assert!(config.mode_keys_select_wheel);
        assert_eq!(config.event_capacity, 256);
    }
}
