//! Challenge-response authentication
//!
//! The surface stays silent (no input reports, LEDs ignored) until the host
//! proves it knows the vendor transform. The exchange runs over feature
//! report 6:
//!
//! ```text
//! host → [06 00 ..]            reset auth state
//! host ← [06 00 c0..c7]        device challenge
//! host → [06 01 ..]            request device response
//! host ← [06 02 ..]            device response (unused)
//! host → [06 03 r0..r7]        our response
//! host ← [06 04 t0 t1 ..]      status: re-auth interval in seconds
//! ```

use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use speededitor_transport::{ExclusiveTransport, SerializedTransport, TransportError};
use thiserror::Error;
use tracing::{debug, info};

/// Feature report ID used by the handshake
pub const AUTH_REPORT_ID: u8 = 0x06;

/// Length of every handshake feature report, report ID included
pub const AUTH_REPORT_LEN: usize = 10;

const AUTH_EVEN_TBL: [u64; 8] = [
    0x3ae1_206f_97c1_0bc8,
    0x2a9a_b32b_ebf2_44c6,
    0x20a6_f8b8_df9a_df0a,
    0xaf80_ece5_2cfc_1719,
    0xec2e_e2f7_414f_d151,
    0xb055_adfd_7334_4a15,
    0xa63d_2e30_5900_1187,
    0x751b_f623_f42e_0dde,
];

const AUTH_ODD_TBL: [u64; 8] = [
    0x3e22_b34f_502e_7fde,
    0x2465_6b98_1875_ab1c,
    0xa17f_3456_df7b_f8c3,
    0x6df7_2e19_41ae_f698,
    0x7222_6f01_1e66_ab94,
    0x3831_a3c6_0629_6b42,
    0xfd7f_f818_8133_2c89,
    0x61a3_f647_4ff2_36c6,
];

const AUTH_MASK: u64 = 0xa79a_63f5_85d3_7bf0;

/// One-byte rotation of the 64-bit challenge word
fn rol8(v: u64) -> u64 {
    v.rotate_right(8)
}

fn rol8n(v: u64, n: u64) -> u64 {
    (0..n).fold(v, |acc, _| rol8(acc))
}

/// Compute the host response for a device challenge
///
/// Both values are little-endian 64-bit words on the wire.
pub fn compute_response(challenge: [u8; 8]) -> [u8; 8] {
    let c = u64::from_le_bytes(challenge);
    let n = c & 7;
    let mut v = rol8n(c, n);

    let k = if (v & 1) == ((0x78 >> n) & 1) {
        AUTH_EVEN_TBL[n as usize]
    } else {
        v ^= rol8(v);
        AUTH_ODD_TBL[n as usize]
    };

    (v ^ (rol8(v) & AUTH_MASK) ^ k).to_le_bytes()
}

/// Handshake steps, named in errors and events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStep {
    Reset,
    GetChallenge,
    RequestDeviceResponse,
    GetDeviceResponse,
    SendResponse,
    GetStatus,
}

impl AuthStep {
    /// Stable step name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::GetChallenge => "get_challenge",
            Self::RequestDeviceResponse => "request_device_response",
            Self::GetDeviceResponse => "get_device_response",
            Self::SendResponse => "send_response",
            Self::GetStatus => "get_status",
        }
    }
}

impl fmt::Display for AuthStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handshake progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AuthPhase {
    #[default]
    Idle,
    ChallengeRequested,
    ResponseSent,
    StatusRequested,
    Authenticated,
}

/// Errors from the authentication handshake
#[derive(Error, Debug)]
pub enum AuthError {
    /// Reply carried the wrong header bytes
    #[error("Authentication failed at {step}: expected header {expected:02X?}, got {actual:02X?}")]
    UnexpectedHeader {
        step: AuthStep,
        expected: [u8; 2],
        actual: Vec<u8>,
    },

    /// Reply too short to hold its payload
    #[error("Authentication failed at {step}: reply of {len} bytes is too short")]
    ShortReply { step: AuthStep, len: usize },

    /// Transport failed mid-handshake
    #[error("Transport error during {step}: {source}")]
    Transport {
        step: AuthStep,
        #[source]
        source: TransportError,
    },
}

impl AuthError {
    /// Step at which the handshake stopped
    pub fn step(&self) -> AuthStep {
        match self {
            Self::UnexpectedHeader { step, .. }
            | Self::ShortReply { step, .. }
            | Self::Transport { step, .. } => *step,
        }
    }

    /// Whether the device itself is unreachable
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// Per-session authentication state
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub phase: AuthPhase,
    /// Interval reported by the last successful handshake
    pub reauth_interval: Option<Duration>,
    /// Challenge being answered; cleared once used
    pub last_challenge: Option<[u8; 8]>,
}

/// Drives the handshake and records its state
#[derive(Default)]
pub struct Authenticator {
    state: Mutex<AuthState>,
}

impl Authenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> AuthState {
        self.state.lock().clone()
    }

    /// Current phase
    pub fn phase(&self) -> AuthPhase {
        self.state.lock().phase
    }

    /// Run the full handshake with exclusive use of the transport
    ///
    /// Returns the re-authentication interval. On any failure the phase is
    /// back to `Idle`.
    pub async fn authenticate(&self, transport: &SerializedTransport) -> Result<Duration, AuthError> {
        let exclusive = transport.lock().await;
        let result = self.run_steps(&exclusive).await;

        {
            let mut state = self.state.lock();
            state.last_challenge = None;
            match &result {
                Ok(interval) => {
                    state.phase = AuthPhase::Authenticated;
                    state.reauth_interval = Some(*interval);
                }
                Err(_) => state.phase = AuthPhase::Idle,
            }
        }

        match &result {
            Ok(interval) => info!("Authenticated, re-auth in {}s", interval.as_secs()),
            Err(e) => debug!("Authentication failed: {}", e),
        }
        result
    }

    async fn run_steps(&self, io: &ExclusiveTransport<'_>) -> Result<Duration, AuthError> {
        self.set_phase(AuthPhase::Idle);

        send(io, AuthStep::Reset, [0x06, 0x00], [0; 8]).await?;
        let reply = receive(io, AuthStep::GetChallenge, [0x06, 0x00], 10).await?;
        let mut challenge = [0u8; 8];
        challenge.copy_from_slice(&reply[2..10]);
        debug!("Device challenge: {:02X?}", challenge);
        {
            let mut state = self.state.lock();
            state.phase = AuthPhase::ChallengeRequested;
            state.last_challenge = Some(challenge);
        }

        // The device offers to authenticate itself too; its answer is not checked
        send(io, AuthStep::RequestDeviceResponse, [0x06, 0x01], [0; 8]).await?;
        receive(io, AuthStep::GetDeviceResponse, [0x06, 0x02], 2).await?;

        let response = compute_response(challenge);
        send(io, AuthStep::SendResponse, [0x06, 0x03], response).await?;
        {
            let mut state = self.state.lock();
            state.phase = AuthPhase::ResponseSent;
            state.last_challenge = None;
        }

        self.set_phase(AuthPhase::StatusRequested);
        let status = receive(io, AuthStep::GetStatus, [0x06, 0x04], 4).await?;
        let secs = u16::from_le_bytes([status[2], status[3]]);
        Ok(Duration::from_secs(u64::from(secs)))
    }

    fn set_phase(&self, phase: AuthPhase) {
        self.state.lock().phase = phase;
    }
}

async fn send(
    io: &ExclusiveTransport<'_>,
    step: AuthStep,
    header: [u8; 2],
    payload: [u8; 8],
) -> Result<(), AuthError> {
    let mut report = [0u8; AUTH_REPORT_LEN];
    report[..2].copy_from_slice(&header);
    report[2..].copy_from_slice(&payload);
    io.send_feature_report(&report)
        .await
        .map_err(|source| AuthError::Transport { step, source })
}

/// Read report 6 and check its header; `min_len` covers the payload the step needs
async fn receive(
    io: &ExclusiveTransport<'_>,
    step: AuthStep,
    expected: [u8; 2],
    min_len: usize,
) -> Result<Vec<u8>, AuthError> {
    let reply = io
        .get_feature_report(AUTH_REPORT_ID, AUTH_REPORT_LEN)
        .await
        .map_err(|source| AuthError::Transport { step, source })?;

    if reply.len() < 2 || reply[..2] != expected {
        return Err(AuthError::UnexpectedHeader {
            step,
            expected,
            actual: reply.iter().take(2).copied().collect(),
        });
    }
    if reply.len() < min_len {
        return Err(AuthError::ShortReply {
            step,
            len: reply.len(),
        });
    }
    Ok(reply)
}
