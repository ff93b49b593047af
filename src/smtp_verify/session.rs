use std::io;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use super::error::ProbeError;
use super::types::SmtpReply;

/// Minimal line-oriented SMTP client: enough for EHLO / MAIL / RCPT / QUIT.
pub(crate) struct SmtpSession {
    host: String,
    stream: BufReader<TcpStream>,
    pub transcript: Vec<String>,
}

impl SmtpSession {
    pub(crate) async fn connect(host: &str, port: u16) -> Result<Self, ProbeError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|err| ProbeError::connect(host, err))?;
        Ok(Self {
            host: host.to_string(),
            stream: BufReader::new(stream),
            transcript: Vec::new(),
        })
    }

    pub(crate) async fn read_banner(&mut self) -> Result<SmtpReply, ProbeError> {
        let reply = self.read_reply().await?;
        self.record_reply(&reply);
        Ok(reply)
    }

    /// Sends one command line. A command carrying its own line break would
    /// smuggle extra commands past the envelope, so it is refused unsent.
    pub(crate) async fn send_command(&mut self, command: &str) -> Result<SmtpReply, ProbeError> {
        if command.contains(['\r', '\n']) {
            return Err(ProbeError::Protocol(format!(
                "line break in command: {}",
                command.escape_debug()
            )));
        }
        self.record("C", command);
        let mut data = command.as_bytes().to_vec();
        data.extend_from_slice(b"\r\n");
        let writer = self.stream.get_mut();
        writer.write_all(&data).await?;
        writer.flush().await?;
        let reply = self.read_reply().await?;
        self.record_reply(&reply);
        Ok(reply)
    }

    /// Best effort; the verdict is already decided when this runs.
    pub(crate) async fn quit(&mut self) {
        if self.send_command("QUIT").await.is_err() {
            self.record("!", "QUIT failed");
        }
    }

    async fn read_reply(&mut self) -> Result<SmtpReply, ProbeError> {
        let mut lines = Vec::new();
        let mut code: Option<u16> = None;
        loop {
            let line = self.read_line().await?;
            if line.len() < 3 {
                return Err(ProbeError::Protocol(format!("invalid reply: {line}")));
            }
            let parsed_code = line
                .get(..3)
                .and_then(|part| part.parse::<u16>().ok())
                .ok_or_else(|| ProbeError::Protocol(format!("invalid code in line: {line}")))?;
            match code {
                Some(existing) if existing != parsed_code => {
                    return Err(ProbeError::Protocol(format!(
                        "inconsistent reply codes: {existing} vs {parsed_code}"
                    )));
                }
                Some(_) => {}
                None => code = Some(parsed_code),
            }
            let is_last = line.as_bytes().get(3) != Some(&b'-');
            lines.push(line.get(4..).unwrap_or_default().to_string());
            if is_last {
                break;
            }
        }
        Ok(SmtpReply {
            code: code.unwrap_or(0),
            lines,
        })
    }

    async fn read_line(&mut self) -> Result<String, ProbeError> {
        let mut raw = Vec::new();
        let read = self.stream.read_until(b'\n', &mut raw).await?;
        if read == 0 {
            return Err(ProbeError::Io {
                source: io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed"),
            });
        }
        if raw.ends_with(b"\r\n") {
            raw.truncate(raw.len() - 2);
        } else if raw.ends_with(b"\n") {
            raw.truncate(raw.len() - 1);
        }
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    fn record(&mut self, direction: &str, message: &str) {
        self.transcript
            .push(format!("[{}] {direction}: {message}", self.host));
    }

    fn record_reply(&mut self, reply: &SmtpReply) {
        if reply.lines.is_empty() {
            self.record("S", &reply.code.to_string());
        } else {
            for line in &reply.lines {
                self.record("S", &format!("{} {}", reply.code, line));
            }
        }
    }
}
