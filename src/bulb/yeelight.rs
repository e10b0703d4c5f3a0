//! Yeelight LAN control client.
//!
//! Each command opens a short TCP connection to the bulb, writes one JSON request
//! terminated by `\r\n` and reads lines until the reply carrying the same `id`
//! arrives. Bulbs interleave unsolicited `props` notifications with replies;
//! those are skipped. Every step is bounded by the configured command timeout.

use serde::Deserialize;
use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use super::{BulbCommandError, Light, PropertyMap};
use crate::constants::{
    BULB_TRANSITION_MS, MAX_NOTIFICATION_LINES, SNAPSHOT_PROPERTIES, YEELIGHT_PORT,
};

/// Reply frame sent by the bulb. Notifications have no `id`.
#[derive(Debug, Deserialize)]
struct Reply {
    id: Option<u64>,
    #[serde(default)]
    result: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<ReplyError>,
}

#[derive(Debug, Deserialize)]
struct ReplyError {
    code: i64,
    message: String,
}

pub struct YeelightBulb {
    address: SocketAddr,
    timeout: Duration,
    next_id: u64,
}

impl YeelightBulb {
    pub fn new(address: SocketAddr, timeout: Duration) -> Self {
        Self {
            address,
            timeout,
            next_id: 1,
        }
    }

    /// Resolve `"host"` or `"host:port"`; the port defaults to the Yeelight control port.
    pub fn resolve(entry: &str) -> anyhow::Result<SocketAddr> {
        let entry = entry.trim();
        if let Ok(address) = entry.parse::<SocketAddr>() {
            return Ok(address);
        }

        let with_port = if entry.contains(':') {
            entry.to_string()
        } else {
            format!("{entry}:{YEELIGHT_PORT}")
        };

        with_port
            .to_socket_addrs()
            .map_err(|e| anyhow::anyhow!("Cannot resolve bulb address '{entry}': {e}"))?
            .next()
            .ok_or_else(|| anyhow::anyhow!("Bulb address '{entry}' resolved to nothing"))
    }

    fn fail(&self, message: impl Into<String>) -> BulbCommandError {
        BulbCommandError::new(self.address.to_string(), message)
    }

    fn call(&mut self, method: &str, params: Vec<Value>) -> Result<Vec<Value>, BulbCommandError> {
        let deadline = Instant::now() + self.timeout;
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        let mut stream = TcpStream::connect_timeout(&self.address, self.timeout)
            .map_err(|e| self.fail(format!("connect failed: {e}")))?;
        stream
            .set_write_timeout(Some(self.timeout))
            .map_err(|e| self.fail(format!("socket setup failed: {e}")))?;

        let request = encode_request(id, method, params);
        stream
            .write_all(request.as_bytes())
            .map_err(|e| self.fail(format!("{method} write failed: {e}")))?;

        let mut reader = BufReader::new(stream);
        for _ in 0..=MAX_NOTIFICATION_LINES {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            reader
                .get_ref()
                .set_read_timeout(Some(remaining))
                .map_err(|e| self.fail(format!("socket setup failed: {e}")))?;

            let mut line = String::new();
            let read = reader
                .read_line(&mut line)
                .map_err(|e| self.fail(format!("{method} read failed: {e}")))?;
            if read == 0 {
                return Err(self.fail(format!("{method}: connection closed before reply")));
            }

            if let Some(result) = decode_reply(&line, id).map_err(|m| self.fail(m))? {
                return Ok(result);
            }
        }

        Err(self.fail(format!("{method}: no reply within {}ms", self.timeout.as_millis())))
    }
}

fn encode_request(id: u64, method: &str, params: Vec<Value>) -> String {
    let mut line = json!({ "id": id, "method": method, "params": params }).to_string();
    line.push_str("\r\n");
    line
}

/// `Ok(None)` for lines that are not the reply to `id`.
fn decode_reply(line: &str, id: u64) -> Result<Option<Vec<Value>>, String> {
    let reply: Reply =
        serde_json::from_str(line.trim()).map_err(|e| format!("malformed reply: {e}"))?;

    if reply.id != Some(id) {
        return Ok(None);
    }
    if let Some(error) = reply.error {
        return Err(format!("bulb error {}: {}", error.code, error.message));
    }
    Ok(Some(reply.result.unwrap_or_default()))
}

fn smooth() -> Vec<Value> {
    vec![json!("smooth"), json!(BULB_TRANSITION_MS)]
}

impl Light for YeelightBulb {
    fn address(&self) -> String {
        self.address.to_string()
    }

    fn set_power(&mut self, on: bool) -> Result<(), BulbCommandError> {
        let mut params = vec![json!(if on { "on" } else { "off" })];
        params.extend(smooth());
        self.call("set_power", params).map(|_| ())
    }

    fn toggle(&mut self) -> Result<(), BulbCommandError> {
        self.call("toggle", Vec::new()).map(|_| ())
    }

    fn set_brightness(&mut self, percent: u8) -> Result<(), BulbCommandError> {
        // The device rejects 0
        let percent = percent.clamp(1, 100);
        let mut params = vec![json!(percent)];
        params.extend(smooth());
        self.call("set_bright", params).map(|_| ())
    }

    fn properties(&mut self) -> Result<PropertyMap, BulbCommandError> {
        let names: Vec<Value> = SNAPSHOT_PROPERTIES.iter().map(|name| json!(name)).collect();
        let values = self.call("get_prop", names)?;

        Ok(SNAPSHOT_PROPERTIES
            .iter()
            .zip(values)
            .map(|(name, value)| {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (name.to_string(), value)
            })
            .collect())
    }
}
