// Browser bindings around the telemetry sink so the dashboard shares the native client's state rules.

use rover_telemetry_core::session::token_expiry_ms;
use rover_telemetry_core::{CommandKind, RoverCommand, SocketEvent, TelemetrySink};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct DashboardSink {
    inner: TelemetrySink,
}

impl Default for DashboardSink {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl DashboardSink {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: TelemetrySink::new(),
        }
    }

    /// Applies one socket frame; true when it carried telemetry.
    pub fn push_frame(&mut self, frame: &str, now_ms: f64) -> Result<bool, JsValue> {
        self.apply_frame(frame, js_ms(now_ms)).map_err(to_js)
    }

    /// Updates local state optimistically and returns the frame to send.
    pub fn apply_command(&mut self, kind: &str, now_ms: f64) -> Result<String, JsValue> {
        self.command_frame(kind, js_ms(now_ms)).map_err(to_js)
    }

    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.inner.tick(js_ms(now_ms))
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.inner.set_connected(connected);
    }

    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    pub fn received(&self) -> f64 {
        self.inner.received() as f64
    }

    pub fn status(&self) -> Result<JsValue, JsValue> {
        to_value(self.inner.status())
    }

    pub fn pose(&self) -> Result<JsValue, JsValue> {
        to_value(self.inner.pose())
    }

    pub fn battery_series(&self) -> Result<JsValue, JsValue> {
        to_value(&self.inner.history().battery_series())
    }

    pub fn speed_series(&self) -> Result<JsValue, JsValue> {
        to_value(&self.inner.history().speed_series())
    }

    pub fn track(&self) -> Result<JsValue, JsValue> {
        to_value(&self.inner.track().path())
    }

    pub fn log_lines(&self, count: usize) -> Result<JsValue, JsValue> {
        to_value(&self.inner.dashboard().recent_lines(count))
    }
}

impl DashboardSink {
    fn apply_frame(&mut self, frame: &str, now_ms: u64) -> Result<bool, String> {
        match SocketEvent::decode(frame).map_err(|err| err.to_string())? {
            SocketEvent::Telemetry(snapshot) => {
                self.inner.on_snapshot(snapshot, now_ms);
                Ok(true)
            }
            SocketEvent::Command(_) => Ok(false),
        }
    }

    fn command_frame(&mut self, kind: &str, now_ms: u64) -> Result<String, String> {
        let kind = CommandKind::parse(kind).ok_or_else(|| format!("unknown command {kind:?}"))?;
        let command = RoverCommand::new(kind);
        self.inner.apply_command(command, now_ms);
        SocketEvent::Command(command)
            .encode()
            .map_err(|err| err.to_string())
    }
}

/// Expiry of a session token in epoch ms, read from its `exp` claim.
#[wasm_bindgen]
pub fn token_expiry(token: &str) -> Option<f64> {
    token_expiry_ms(token).map(|ms| ms as f64)
}

fn js_ms(now_ms: f64) -> u64 {
    if now_ms.is_finite() && now_ms > 0.0 {
        now_ms as u64
    } else {
        0
    }
}

fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|err| JsValue::from_str(&err.to_string()))
}

fn to_js(message: String) -> JsValue {
    JsValue::from_str(&message)
}
