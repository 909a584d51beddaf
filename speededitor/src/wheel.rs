//! Wheel mode arbitration
//!
//! The same rotation means different things per mode:
//! - JOG: an absolute position in `[0, 100]`, built up from small steps
//! - SHUTTLE / SCROLL: a signed speed that springs back to 0 once the wheel stops
//!
//! Output is rate-limited and small deltas (HID jitter) are dropped.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::SurfaceError;
use crate::keys::{key, KeyDescriptor};
use crate::led::{LedReport, LedStateEncoder};

/// How the wheel is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WheelMode {
    #[default]
    Jog,
    Shuttle,
    Scroll,
}

impl WheelMode {
    /// All wheel modes
    pub const ALL: &'static [WheelMode] = &[WheelMode::Jog, WheelMode::Shuttle, WheelMode::Scroll];

    /// Key that selects this mode
    pub fn key(self) -> &'static KeyDescriptor {
        match self {
            Self::Jog => &key::JOG,
            Self::Shuttle => &key::SHTL,
            Self::Scroll => &key::SCRL,
        }
    }

    /// Mode selected by a key, if it is one of the wheel-mode keys
    pub fn from_key(key: &KeyDescriptor) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.key().key_code == key.key_code)
    }

    /// Short name used in events and the CLI
    pub fn name(self) -> &'static str {
        match self {
            Self::Jog => "jog",
            Self::Shuttle => "shuttle",
            Self::Scroll => "scroll",
        }
    }
}

impl fmt::Display for WheelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for WheelMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jog" => Ok(Self::Jog),
            "shuttle" | "shtl" => Ok(Self::Shuttle),
            "scroll" | "scrl" => Ok(Self::Scroll),
            other => Err(format!("unknown wheel mode: {other}")),
        }
    }
}

/// What happens to the JOG position when the mode changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulatorPolicy {
    /// Keep the JOG position across switches
    #[default]
    Carry,
    /// Return the JOG position to the bottom of its range on every switch
    ResetOnModeSwitch,
}

/// Longest accepted idle timeout (one hour)
pub const MAX_IDLE_TIMEOUT_MS: u64 = 3_600_000;

/// Wheel tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    /// Raw delta per JOG unit
    pub jog_divisor: f64,
    /// Largest JOG change from a single report
    pub jog_step_limit: f64,
    /// JOG range lower bound
    pub jog_min: f64,
    /// JOG range upper bound
    pub jog_max: f64,
    /// Raw delta per SHUTTLE / SCROLL unit
    pub spin_divisor: f64,
    /// Minimum time between two emitted values (ms)
    pub emit_interval_ms: u64,
    /// Deltas with magnitude at or below this are treated as noise
    pub noise_threshold: u32,
    /// Quiet time after which SHUTTLE / SCROLL spring back to 0 (ms)
    pub idle_timeout_ms: u64,
    pub accumulator: AccumulatorPolicy,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            jog_divisor: 10_000.0,
            jog_step_limit: 5.0,
            jog_min: 0.0,
            jog_max: 100.0,
            spin_divisor: 360.0,
            emit_interval_ms: 50,
            noise_threshold: 200,
            idle_timeout_ms: 100,
            accumulator: AccumulatorPolicy::Carry,
        }
    }
}

impl WheelConfig {
    pub fn emit_interval(&self) -> Duration {
        Duration::from_millis(self.emit_interval_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Reject values the JOG / SHUTTLE math cannot run with
    pub fn validate(&self) -> Result<(), SurfaceError> {
        let finite = [
            ("jog_divisor", self.jog_divisor),
            ("jog_step_limit", self.jog_step_limit),
            ("jog_min", self.jog_min),
            ("jog_max", self.jog_max),
            ("spin_divisor", self.spin_divisor),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(SurfaceError::InvalidConfig(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }

        if self.jog_divisor <= 0.0 {
            return Err(SurfaceError::InvalidConfig(format!(
                "jog_divisor must be positive, got {}",
                self.jog_divisor
            )));
        }
        if self.spin_divisor <= 0.0 {
            return Err(SurfaceError::InvalidConfig(format!(
                "spin_divisor must be positive, got {}",
                self.spin_divisor
            )));
        }
        if self.jog_step_limit < 0.0 {
            return Err(SurfaceError::InvalidConfig(format!(
                "jog_step_limit must not be negative, got {}",
                self.jog_step_limit
            )));
        }
        if self.jog_min > self.jog_max {
            return Err(SurfaceError::InvalidConfig(format!(
                "jog_min ({}) is above jog_max ({})",
                self.jog_min, self.jog_max
            )));
        }
        if self.idle_timeout_ms > MAX_IDLE_TIMEOUT_MS {
            return Err(SurfaceError::InvalidConfig(format!(
                "idle_timeout_ms must be at most {MAX_IDLE_TIMEOUT_MS}, got {}",
                self.idle_timeout_ms
            )));
        }
        Ok(())
    }
}

/// A wheel value for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WheelEvent {
    pub mode: WheelMode,
    pub value: i32,
}

/// Outcome of one wheel delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WheelUpdate {
    /// Value to emit, if it passed the gate
    pub event: Option<WheelEvent>,
    /// Replacement deadline for the idle timer (SHUTTLE / SCROLL only)
    pub idle_deadline: Option<Instant>,
}

/// Owns the active wheel mode and turns raw deltas into values
#[derive(Debug)]
pub struct WheelModeController {
    config: WheelConfig,
    mode: WheelMode,
    accumulator: f64,
    last_emit: Option<Instant>,
}

impl WheelModeController {
    pub fn new(config: WheelConfig) -> Self {
        let accumulator = config.jog_min;
        Self {
            config,
            mode: WheelMode::default(),
            accumulator,
            last_emit: None,
        }
    }

    /// Active mode
    pub fn mode(&self) -> WheelMode {
        self.mode
    }

    /// Current JOG position
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Switch modes and relight the mode keys
    ///
    /// Returns the LED reports to write: the new mode's key lit, the other
    /// two dark. Keys already in the right state produce no report.
    pub fn set_mode(&mut self, mode: WheelMode, leds: &mut LedStateEncoder) -> Vec<LedReport> {
        if mode != self.mode && self.config.accumulator == AccumulatorPolicy::ResetOnModeSwitch {
            self.accumulator = self.config.jog_min;
        }
        self.mode = mode;

        WheelMode::ALL
            .iter()
            .filter_map(|&m| leds.set(m.key(), m == mode))
            .collect()
    }

    /// Interpret one raw delta received at `now`
    pub fn on_delta(&mut self, delta: i32, now: Instant) -> WheelUpdate {
        let cfg = &self.config;
        let (candidate, idle_deadline) = match self.mode {
            WheelMode::Jog => {
                let step = (f64::from(delta) / cfg.jog_divisor)
                    .clamp(-cfg.jog_step_limit, cfg.jog_step_limit);
                self.accumulator = (self.accumulator + step).clamp(cfg.jog_min, cfg.jog_max);
                (round_half_up(self.accumulator), None)
            }
            WheelMode::Shuttle | WheelMode::Scroll => (
                round_half_up(f64::from(delta) / cfg.spin_divisor),
                Some(now + cfg.idle_timeout()),
            ),
        };

        let above_noise = delta.unsigned_abs() > cfg.noise_threshold;
        let interval_elapsed = self
            .last_emit
            .map_or(true, |last| now.saturating_duration_since(last) >= cfg.emit_interval());

        let event = if above_noise && interval_elapsed {
            self.last_emit = Some(now);
            Some(WheelEvent {
                mode: self.mode,
                value: candidate,
            })
        } else {
            None
        };

        WheelUpdate {
            event,
            idle_deadline,
        }
    }

    /// Value emitted when the idle timer armed under `mode` fires
    pub fn idle_expired(&self, mode: WheelMode) -> WheelEvent {
        WheelEvent { mode, value: 0 }
    }
}

/// Round to nearest, halves toward positive infinity
fn round_half_up(x: f64) -> i32 {
    (x + 0.5).floor() as i32
}
