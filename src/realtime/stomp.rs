//! STOMP Frame Codec
//!
//! Minimal STOMP 1.2 framing for the broker connection: enough to
//! handshake, manage subscriptions, and receive MESSAGE frames. A frame
//! is `COMMAND\nheader:value\n...\n\nbody\0`; a bare newline is a
//! heartbeat.

use thiserror::Error;

/// STOMP frame commands used by this client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Connected,
    Subscribe,
    Unsubscribe,
    Message,
    Receipt,
    Error,
    Disconnect,
}

impl Command {
    fn as_str(&self) -> &'static str {
        match self {
            Command::Connect => "CONNECT",
            Command::Connected => "CONNECTED",
            Command::Subscribe => "SUBSCRIBE",
            Command::Unsubscribe => "UNSUBSCRIBE",
            Command::Message => "MESSAGE",
            Command::Receipt => "RECEIPT",
            Command::Error => "ERROR",
            Command::Disconnect => "DISCONNECT",
        }
    }

    fn from_str(s: &str) -> Result<Self, StompError> {
        match s {
            "CONNECT" => Ok(Command::Connect),
            "CONNECTED" => Ok(Command::Connected),
            "SUBSCRIBE" => Ok(Command::Subscribe),
            "UNSUBSCRIBE" => Ok(Command::Unsubscribe),
            "MESSAGE" => Ok(Command::Message),
            "RECEIPT" => Ok(Command::Receipt),
            "ERROR" => Ok(Command::Error),
            "DISCONNECT" => Ok(Command::Disconnect),
            other => Err(StompError::UnknownCommand(other.to_string())),
        }
    }
}

/// A parsed STOMP frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub command: Command,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    /// First header with the given name, if present
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Client CONNECT frame. `heartbeat_ms` applies in both directions;
    /// zero disables heartbeats.
    pub fn connect(heartbeat_ms: u64) -> Self {
        Frame::new(Command::Connect)
            .header("accept-version", "1.2")
            .header("heart-beat", &format!("{0},{0}", heartbeat_ms))
    }

    /// Server CONNECTED frame (used by the test broker)
    pub fn connected(heartbeat_ms: u64) -> Self {
        Frame::new(Command::Connected)
            .header("version", "1.2")
            .header("heart-beat", &format!("{0},{0}", heartbeat_ms))
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Frame::new(Command::Subscribe)
            .header("id", id)
            .header("destination", destination)
    }

    pub fn unsubscribe(id: &str) -> Self {
        Frame::new(Command::Unsubscribe).header("id", id)
    }

    /// Broker MESSAGE frame (used by the test broker)
    pub fn message(destination: &str, subscription: &str, body: &str) -> Self {
        Frame::new(Command::Message)
            .header("destination", destination)
            .header("subscription", subscription)
            .header("content-type", "application/json")
            .body(body)
    }

    pub fn disconnect() -> Self {
        Frame::new(Command::Disconnect)
    }

    /// Serialize to the wire format
    pub fn encode(&self) -> String {
        let mut out = String::new();
        out.push_str(self.command.as_str());
        out.push('\n');
        for (name, value) in &self.headers {
            out.push_str(name);
            out.push(':');
            out.push_str(value);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Parse a frame from the wire format
    pub fn parse(raw: &str) -> Result<Frame, StompError> {
        let raw = raw.trim_end_matches(['\0', '\n', '\r']);
        if raw.is_empty() {
            return Err(StompError::Empty);
        }

        let (head, body) = match raw.split_once("\n\n") {
            Some((head, body)) => (head, body),
            None => (raw, ""),
        };

        let mut lines = head.lines();
        let command_line = lines.next().ok_or(StompError::Empty)?;
        let command = Command::from_str(command_line.trim_end_matches('\r'))?;

        let mut headers = Vec::new();
        for line in lines {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| StompError::MalformedHeader(line.to_string()))?;
            headers.push((name.to_string(), value.to_string()));
        }

        Ok(Frame {
            command,
            headers,
            body: body.trim_end_matches('\0').to_string(),
        })
    }
}

/// Whether a raw websocket text payload is a STOMP heartbeat
pub fn is_heartbeat(raw: &str) -> bool {
    raw.trim_matches(['\n', '\r', '\0']).is_empty()
}

/// Frame-level errors
#[derive(Debug, Error)]
pub enum StompError {
    #[error("Empty frame")]
    Empty,

    #[error("Unknown STOMP command: {0}")]
    UnknownCommand(String),

    #[error("Malformed header line: {0}")]
    MalformedHeader(String),
}
