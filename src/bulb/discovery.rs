//! SSDP-style discovery of Yeelight bulbs on the local network.
//!
//! A single search datagram goes to the Yeelight multicast group; every bulb
//! with LAN control enabled answers with an HTTP-like response whose `Location`
//! header carries `yeelight://<ip>:<port>`. Responses are collected until the
//! discovery timeout elapses.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use crate::constants::DISCOVERY_MULTICAST_ADDR;

const SEARCH_REQUEST: &str = "M-SEARCH * HTTP/1.1\r\n\
HOST: 239.255.255.250:1982\r\n\
MAN: \"ssdp:discover\"\r\n\
ST: wifi_bulb\r\n";

/// Addresses of every bulb that answered within `timeout`, sorted and deduplicated.
pub fn discover(timeout: Duration) -> Result<Vec<SocketAddr>> {
    let socket = UdpSocket::bind("0.0.0.0:0").context("Failed to bind discovery socket")?;
    socket
        .send_to(SEARCH_REQUEST.as_bytes(), DISCOVERY_MULTICAST_ADDR)
        .context("Failed to send discovery request")?;

    let deadline = Instant::now() + timeout;
    let mut found = BTreeSet::new();
    let mut buffer = [0u8; 2048];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        socket
            .set_read_timeout(Some(remaining))
            .context("Failed to set discovery timeout")?;

        match socket.recv_from(&mut buffer) {
            Ok((len, from)) => {
                let response = String::from_utf8_lossy(&buffer[..len]);
                match parse_location(&response) {
                    Some(address) => {
                        found.insert(address);
                    }
                    None => log_debug!("Ignoring discovery reply from {from} without a location"),
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => break,
            Err(e) => return Err(e).context("Discovery receive failed"),
        }
    }

    Ok(found.into_iter().collect())
}

/// Extract the control address from a discovery response.
fn parse_location(response: &str) -> Option<SocketAddr> {
    response.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if !name.trim().eq_ignore_ascii_case("location") {
            return None;
        }
        value.trim().strip_prefix("yeelight://")?.parse().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_location_from_response() {
        let response = "HTTP/1.1 200 OK\r\n\
Cache-Control: max-age=3600\r\n\
Location: yeelight://192.168.1.239:55443\r\n\
Server: POSIX UPnP/1.0 YGLC/1\r\n\
id: 0x000000000015243f\r\n\
model: color\r\n\
power: on\r\n\
bright: 100\r\n";

        assert_eq!(
            parse_location(response),
            Some("192.168.1.239:55443".parse().unwrap())
        );
    }

    #[test]
    fn test_parse_location_header_is_case_insensitive() {
        assert_eq!(
            parse_location("LOCATION: yeelight://10.0.0.5:55443\r\n"),
            Some("10.0.0.5:55443".parse().unwrap())
        );
    }

    #[test]
    fn test_parse_location_rejects_other_schemes() {
        assert_eq!(parse_location("Location: http://10.0.0.5:80/desc.xml\r\n"), None);
        assert_eq!(parse_location("HTTP/1.1 200 OK\r\n"), None);
    }
}
