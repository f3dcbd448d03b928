#![allow(dead_code)]

use std::collections::VecDeque;

use heapless::String;
use iotlink::network::error::Error;
use iotlink::network::{AccessPoint, LinkInfo, LinkStatus, NetworkInterface, MAX_SCAN};
use iotlink::session::{BrokerSession, Credentials, InboundMessage, QoS, SessionOptions};
use iotlink::system::Platform;

#[derive(Debug, Default)]
pub struct MockNetwork {
    pub connected: bool,
    /// Attach as soon as `begin` is called.
    pub attach_on_begin: bool,
    /// SSIDs returned by `scan`.
    pub visible: Vec<&'static str>,
    pub fail_scan: bool,
    pub begins: u32,
    pub scans: u32,
    pub resets: Vec<std::string::String>,
    pub hostnames: Vec<std::string::String>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self {
            attach_on_begin: true,
            ..Self::default()
        }
    }

    /// A network that never attaches.
    pub fn unreachable() -> Self {
        Self::default()
    }
}

impl NetworkInterface for MockNetwork {
    type Error = Error;

    fn status(&mut self) -> LinkStatus {
        if self.connected {
            LinkStatus::Connected
        } else {
            LinkStatus::Disconnected
        }
    }

    fn scan(&mut self) -> Result<heapless::Vec<AccessPoint, MAX_SCAN>, Error> {
        self.scans += 1;
        if self.fail_scan {
            return Err(Error::ScanFailed);
        }
        let mut found = heapless::Vec::new();
        for ssid in &self.visible {
            let _ = found.push(AccessPoint {
                ssid: String::try_from(*ssid).unwrap(),
                rssi: -60,
                channel: 6,
            });
        }
        Ok(found)
    }

    fn reset(&mut self, hostname: &str) -> Result<(), Error> {
        self.resets.push(hostname.into());
        self.connected = false;
        Ok(())
    }

    fn begin(&mut self, _ssid: &str, _password: &str) -> Result<(), Error> {
        self.begins += 1;
        if self.attach_on_begin {
            self.connected = true;
        }
        Ok(())
    }

    fn link_info(&mut self) -> Option<LinkInfo> {
        Some(LinkInfo {
            ip: [192, 168, 1, 42],
            rssi: -55,
            channel: 6,
            bssid: [0xde, 0xad, 0xbe, 0xef, 0x00, 0x01],
        })
    }

    fn announce_hostname(&mut self, hostname: &str) -> Result<(), Error> {
        self.hostnames.push(hostname.into());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Publication {
    pub topic: std::string::String,
    pub payload: std::string::String,
    pub qos: QoS,
    pub retain: bool,
}

#[derive(Debug, Default)]
pub struct MockSession {
    pub connected: bool,
    pub refuse: bool,
    /// Accept `connect` but never open the session.
    pub pending: bool,
    /// Reject `configure`.
    pub reject_options: bool,
    pub configures: u32,
    pub connects: u32,
    pub disconnects: u32,
    pub client_id: std::string::String,
    pub published: Vec<Publication>,
    pub subscribed: Vec<std::string::String>,
    pub inbound: VecDeque<InboundMessage>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    /// A session whose connects are accepted but never complete.
    pub fn stalled() -> Self {
        Self {
            pending: true,
            ..Self::default()
        }
    }

    /// Queues a message as if the broker had delivered it.
    pub fn deliver(&mut self, topic: &str, payload: &str) {
        self.inbound
            .push_back(InboundMessage::new(topic, payload.as_bytes()).unwrap());
    }

    /// Publications to `topic`, oldest first.
    pub fn payloads(&self, topic: &str) -> Vec<&str> {
        self.published
            .iter()
            .filter(|p| p.topic == topic)
            .map(|p| p.payload.as_str())
            .collect()
    }
}

impl BrokerSession for MockSession {
    type Error = Error;

    fn configure(&mut self, _options: &SessionOptions<'_>) -> Result<(), Error> {
        self.configures += 1;
        if self.reject_options {
            return Err(Error::ConnectionRefused);
        }
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        self.connected
    }

    fn connect(&mut self, credentials: &Credentials<'_>) -> Result<(), Error> {
        self.connects += 1;
        if self.refuse {
            return Err(Error::ConnectionRefused);
        }
        self.client_id = credentials.client_id.into();
        self.connected = !self.pending;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), Error> {
        self.disconnects += 1;
        self.connected = false;
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS, retain: bool) -> Result<(), Error> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        self.published.push(Publication {
            topic: topic.into(),
            payload: std::str::from_utf8(payload).unwrap().into(),
            qos,
            retain,
        });
        Ok(())
    }

    fn subscribe(&mut self, topic: &str, _qos: QoS) -> Result<(), Error> {
        self.subscribed.push(topic.into());
        Ok(())
    }

    fn poll(&mut self) -> Result<Option<InboundMessage>, Error> {
        Ok(self.inbound.pop_front())
    }
}

#[derive(Debug, Default)]
pub struct MockPlatform {
    pub now: u64,
    pub kicks: u32,
    pub reboots: u32,
}

impl Platform for MockPlatform {
    fn now_ms(&self) -> u64 {
        self.now
    }

    fn kick_watchdog(&mut self) {
        self.kicks += 1;
    }

    fn reboot(&mut self) {
        self.reboots += 1;
    }
}
