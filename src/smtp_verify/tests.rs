use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use super::session::SmtpSession;
use super::{
    LocalProber, ProbeError, ProbeUnauthorized, SmtpProbeOptions, SmtpProber, SmtpReply, Verdict,
    Verification, classify_rcpt,
};

/// Replies a scripted mail exchanger gives.
#[derive(Debug, Clone)]
pub(crate) struct MockScript {
    pub banner: &'static str,
    pub ehlo: &'static str,
    pub helo: &'static str,
    pub mail_from: &'static str,
    pub rcpt: &'static str,
    /// `None` leaves `QUIT` unanswered with the connection held open.
    pub quit: Option<&'static str>,
}

impl MockScript {
    pub(crate) fn rcpt(rcpt: &'static str) -> Self {
        Self {
            banner: "220 mock.test ESMTP ready",
            ehlo: "250-mock.test\r\n250 PIPELINING",
            helo: "250 mock.test",
            mail_from: "250 2.1.0 Ok",
            rcpt,
            quit: Some("221 2.0.0 Bye"),
        }
    }
}

/// Every command line the mock has received, across connections.
pub(crate) type CommandLog = Arc<Mutex<Vec<String>>>;

/// Serves `script` to every connection until the test runtime stops.
pub(crate) async fn spawn_mock_smtp(script: MockScript) -> SocketAddr {
    spawn_recording_smtp(script).await.0
}

pub(crate) async fn spawn_recording_smtp(script: MockScript) -> (SocketAddr, CommandLog) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock smtp");
    let addr = listener.local_addr().expect("mock addr");
    let log = CommandLog::default();
    let received = Arc::clone(&log);
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let script = script.clone();
            let received = Arc::clone(&received);
            tokio::spawn(async move {
                let (read, mut write) = socket.into_split();
                let mut lines = BufReader::new(read).lines();
                if write
                    .write_all(format!("{}\r\n", script.banner).as_bytes())
                    .await
                    .is_err()
                {
                    return;
                }
                while let Ok(Some(line)) = lines.next_line().await {
                    received.lock().push(line.clone());
                    let upper = line.to_ascii_uppercase();
                    let reply = if upper.starts_with("EHLO") {
                        script.ehlo
                    } else if upper.starts_with("HELO") {
                        script.helo
                    } else if upper.starts_with("MAIL FROM") {
                        script.mail_from
                    } else if upper.starts_with("RCPT TO") {
                        script.rcpt
                    } else if upper.starts_with("QUIT") {
                        match script.quit {
                            Some(bye) => {
                                let _ = write.write_all(format!("{bye}\r\n").as_bytes()).await;
                                return;
                            }
                            None => continue,
                        }
                    } else {
                        "500 5.5.2 Unrecognized command"
                    };
                    if write
                        .write_all(format!("{reply}\r\n").as_bytes())
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
            });
        }
    });
    (addr, log)
}

/// Accepts connections and never says a word.
async fn spawn_silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind silent");
    let addr = listener.local_addr().expect("silent addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    port
}

pub(crate) fn prober_for(addr: SocketAddr) -> LocalProber {
    LocalProber::new(SmtpProbeOptions {
        port: addr.port(),
        timeout: Duration::from_secs(2),
        ..SmtpProbeOptions::default()
    })
}

type ProbeFn = dyn Fn(&str, &str) -> Result<Verification, ProbeUnauthorized> + Send + Sync;

/// Prober double that records how often, and how concurrently, it runs.
pub(crate) struct StubProber {
    answer: Box<ProbeFn>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Option<Duration>,
}

impl StubProber {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &str) -> Result<Verification, ProbeUnauthorized> + Send + Sync + 'static,
    {
        Self {
            answer: Box::new(f),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub(crate) fn verified() -> Self {
        Self::new(|_, _| Ok(Verification::valid("SMTP Verified")))
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SmtpProber for StubProber {
    async fn probe(&self, email: &str, mx_host: &str) -> Result<Verification, ProbeUnauthorized> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let out = (self.answer)(email, mx_host);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        out
    }
}

#[test]
fn rcpt_decision_table() {
    let reply = |code: u16, text: &str| SmtpReply {
        code,
        lines: vec![text.to_string()],
    };
    assert_eq!(
        classify_rcpt(&reply(250, "2.1.5 Ok")),
        Verification::valid("SMTP Verified")
    );
    assert_eq!(
        classify_rcpt(&reply(550, "5.1.1 No such user")),
        Verification::invalid("User does not exist (550)")
    );
    let greylisted = classify_rcpt(&reply(451, "4.7.1 Try again later"));
    assert_eq!(greylisted.verdict, Verdict::Risky);
    assert_eq!(greylisted.details, "SMTP Response: 451 4.7.1 Try again later");
}

#[tokio::test]
async fn accepted_recipient_is_valid() {
    let addr = spawn_mock_smtp(MockScript::rcpt("250 2.1.5 Ok")).await;
    let outcome = prober_for(addr).check("user@example.com", "127.0.0.1").await;
    assert_eq!(outcome, Verification::valid("SMTP Verified"));
}

#[tokio::test]
async fn rejected_recipient_is_invalid() {
    let addr = spawn_mock_smtp(MockScript::rcpt("550 5.1.1 User unknown")).await;
    let outcome = prober_for(addr).check("ghost@example.com", "127.0.0.1").await;
    assert_eq!(outcome, Verification::invalid("User does not exist (550)"));
}

#[tokio::test]
async fn rejected_sender_is_unknown() {
    let script = MockScript {
        mail_from: "553 5.7.1 Sender rejected",
        ..MockScript::rcpt("250 2.1.5 Ok")
    };
    let addr = spawn_mock_smtp(script).await;
    let outcome = prober_for(addr).check("user@example.com", "127.0.0.1").await;
    assert_eq!(outcome.verdict, Verdict::Unknown);
    assert_eq!(outcome.details, "SMTP Mail From failed: 553 5.7.1 Sender rejected");
}

#[tokio::test]
async fn multiline_ehlo_then_other_code_is_risky() {
    let addr = spawn_mock_smtp(MockScript::rcpt("452 4.2.2 Mailbox full")).await;
    let outcome = prober_for(addr).check("full@example.com", "127.0.0.1").await;
    assert_eq!(outcome.verdict, Verdict::Risky);
    assert!(outcome.details.contains("452"));
}

#[tokio::test]
async fn refused_connection_uses_optimistic_fallback() {
    let prober = LocalProber::new(SmtpProbeOptions {
        port: closed_port(),
        timeout: Duration::from_secs(2),
        ..SmtpProbeOptions::default()
    });
    let outcome = prober.check("user@example.com", "127.0.0.1").await;
    assert_eq!(outcome.verdict, Verdict::Valid);
    assert!(outcome.details.starts_with("DNS verified, deep SMTP check unavailable"));
}

#[tokio::test]
async fn silent_server_times_out_into_fallback() {
    let addr = spawn_silent_server().await;
    let prober = LocalProber::new(SmtpProbeOptions {
        port: addr.port(),
        timeout: Duration::from_millis(200),
        optimistic_fallback: false,
        ..SmtpProbeOptions::default()
    });
    let outcome = prober.check("user@example.com", "127.0.0.1").await;
    assert_eq!(outcome.verdict, Verdict::Unknown);
    assert!(outcome.details.contains("timed out"));
}

#[tokio::test]
async fn garbage_greeting_is_error() {
    let script = MockScript {
        banner: "hello there",
        ..MockScript::rcpt("250 2.1.5 Ok")
    };
    let addr = spawn_mock_smtp(script).await;
    let outcome = prober_for(addr).check("user@example.com", "127.0.0.1").await;
    assert_eq!(outcome.verdict, Verdict::Error);
    assert!(outcome.details.starts_with("SMTP Connect failed"));
}

#[tokio::test]
async fn local_prober_never_returns_unauthorized() {
    let addr = spawn_mock_smtp(MockScript::rcpt("250 2.1.5 Ok")).await;
    let prober: Arc<dyn SmtpProber> = Arc::new(prober_for(addr));
    assert!(prober.probe("user@example.com", "127.0.0.1").await.is_ok());
}

#[tokio::test]
async fn stalled_quit_keeps_decided_verdict() {
    let script = MockScript {
        quit: None,
        ..MockScript::rcpt("550 5.1.1 User unknown")
    };
    let addr = spawn_mock_smtp(script).await;
    let prober = LocalProber::new(SmtpProbeOptions {
        port: addr.port(),
        timeout: Duration::from_millis(500),
        optimistic_fallback: true,
        ..SmtpProbeOptions::default()
    });
    let outcome = prober.check("ghost@example.com", "127.0.0.1").await;
    assert_eq!(outcome, Verification::invalid("User does not exist (550)"));
}

#[tokio::test]
async fn helo_fallback_after_ehlo_rejection() {
    let script = MockScript {
        ehlo: "502 5.5.1 Command not implemented",
        ..MockScript::rcpt("250 2.1.5 Ok")
    };
    let (addr, log) = spawn_recording_smtp(script).await;
    let outcome = prober_for(addr).check("user@example.com", "127.0.0.1").await;
    assert_eq!(outcome, Verification::valid("SMTP Verified"));
    let log = log.lock();
    assert!(log.iter().any(|line| line.starts_with("EHLO ")));
    assert!(log.iter().any(|line| line.starts_with("HELO ")));
}

#[tokio::test]
async fn ehlo_and_helo_both_rejected_is_error() {
    let script = MockScript {
        ehlo: "502 5.5.1 Command not implemented",
        helo: "501 5.5.4 Syntax error",
        ..MockScript::rcpt("250 2.1.5 Ok")
    };
    let (addr, log) = spawn_recording_smtp(script).await;
    let outcome = prober_for(addr).check("user@example.com", "127.0.0.1").await;
    assert_eq!(outcome.verdict, Verdict::Error);
    assert_eq!(outcome.details, "SMTP EHLO failed: 501 5.5.4 Syntax error");
    assert!(!log.lock().iter().any(|line| line.starts_with("MAIL FROM")));
}

#[tokio::test]
async fn line_break_in_recipient_is_never_sent() {
    let (addr, log) = spawn_recording_smtp(MockScript::rcpt("250 2.1.5 Ok")).await;
    let outcome = prober_for(addr)
        .check("a@example.com>\r\nDATA\r\nSubject: hi", "127.0.0.1")
        .await;
    assert_eq!(outcome.verdict, Verdict::Error);
    assert!(outcome.details.contains("line break in command"), "{}", outcome.details);
    let log = log.lock();
    assert!(!log.iter().any(|line| line.starts_with("RCPT TO")));
    assert!(!log.iter().any(|line| line.starts_with("DATA")));
}

#[tokio::test]
async fn session_refuses_multi_line_command() {
    let (addr, log) = spawn_recording_smtp(MockScript::rcpt("250 2.1.5 Ok")).await;
    let mut session = SmtpSession::connect("127.0.0.1", addr.port())
        .await
        .expect("connect");
    session.read_banner().await.expect("banner");

    let err = session
        .send_command("NOOP\r\nDATA")
        .await
        .expect_err("must refuse");
    assert!(matches!(err, ProbeError::Protocol(_)), "{err}");
    assert!(session.transcript.iter().all(|line| !line.contains("NOOP")));

    let reply = session.send_command("EHLO localhost").await.expect("still usable");
    assert_eq!(reply.code, 250);
    assert_eq!(*log.lock(), vec!["EHLO localhost".to_string()]);
}
