//! Mock SMTP relay
//!
//! Speaks just enough SMTP for lettre's client: greeting, EHLO, NOOP, RSET,
//! MAIL, RCPT, DATA and QUIT. Every reply code is configurable so tests can
//! make the relay refuse service or reject a message, and every accepted
//! message body is recorded.
//!
//! # Example
//!
//! ```rust,no_run
//! use support::mock_server::MockSmtpServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let server = MockSmtpServer::builder()
//!     .with_data_end_response(554, "Message rejected")
//!     .build()
//!     .await?;
//!
//! // point the relay at server.addr()
//!
//! server.shutdown();
//! # Ok(())
//! # }
//! ```
#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::RwLock,
    time::timeout,
};

#[derive(Debug, Clone)]
struct Reply {
    code: u16,
    text: String,
}

impl Reply {
    fn new(code: u16, text: impl Into<String>) -> Self {
        Self {
            code,
            text: text.into(),
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        format!("{} {}\r\n", self.code, self.text).into_bytes()
    }
}

#[derive(Debug, Clone)]
struct Script {
    greeting: Reply,
    mail_from: Reply,
    rcpt_to: Reply,
    data_end: Reply,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            greeting: Reply::new(220, "mock.relay ESMTP ready"),
            mail_from: Reply::new(250, "OK"),
            rcpt_to: Reply::new(250, "OK"),
            data_end: Reply::new(250, "OK: queued"),
        }
    }
}

pub struct MockSmtpServer {
    addr: SocketAddr,
    messages: Arc<RwLock<Vec<String>>>,
    shutdown: Arc<AtomicBool>,
}

impl MockSmtpServer {
    #[must_use]
    pub fn builder() -> MockSmtpServerBuilder {
        MockSmtpServerBuilder {
            script: Script::default(),
        }
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Raw DATA payloads accepted so far.
    pub async fn messages(&self) -> Vec<String> {
        self.messages.read().await.clone()
    }

    /// Wait until `count` messages have been accepted.
    pub async fn wait_for_messages(&self, count: usize, limit: Duration) -> Vec<String> {
        let _ = timeout(limit, async {
            while self.messages.read().await.len() < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;

        self.messages().await
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    async fn handle_client(
        mut stream: TcpStream,
        script: Arc<Script>,
        messages: Arc<RwLock<Vec<String>>>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let (reader, mut writer) = stream.split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        writer.write_all(&script.greeting.to_bytes()).await?;
        writer.flush().await?;

        if script.greeting.code != 220 {
            return Ok(());
        }

        loop {
            line.clear();

            let Ok(read) = timeout(Duration::from_secs(10), reader.read_line(&mut line)).await
            else {
                return Ok(());
            };
            if read? == 0 {
                return Ok(());
            }

            let command = line
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_ascii_uppercase();

            let reply = match command.as_str() {
                "EHLO" => b"250-mock.relay\r\n250 8BITMIME\r\n".to_vec(),
                "HELO" | "NOOP" | "RSET" => Reply::new(250, "OK").to_bytes(),
                "MAIL" => script.mail_from.to_bytes(),
                "RCPT" => script.rcpt_to.to_bytes(),
                "DATA" => {
                    writer
                        .write_all(&Reply::new(354, "End data with <CR><LF>.<CR><LF>").to_bytes())
                        .await?;
                    writer.flush().await?;

                    let mut body = String::new();
                    loop {
                        line.clear();
                        if reader.read_line(&mut line).await? == 0 {
                            return Ok(());
                        }
                        if line.trim_end_matches(['\r', '\n']) == "." {
                            break;
                        }
                        body.push_str(&line);
                    }

                    if script.data_end.code == 250 {
                        messages.write().await.push(body);
                    }
                    script.data_end.to_bytes()
                }
                "QUIT" => {
                    writer.write_all(&Reply::new(221, "Bye").to_bytes()).await?;
                    writer.flush().await?;
                    return Ok(());
                }
                _ => Reply::new(502, "Command not implemented").to_bytes(),
            };

            writer.write_all(&reply).await?;
            writer.flush().await?;
        }
    }
}

pub struct MockSmtpServerBuilder {
    script: Script,
}

impl MockSmtpServerBuilder {
    /// Greet with something other than 220 to refuse every session.
    #[must_use]
    pub fn with_greeting(mut self, code: u16, text: impl Into<String>) -> Self {
        self.script.greeting = Reply::new(code, text);
        self
    }

    #[must_use]
    pub fn with_rcpt_to_response(mut self, code: u16, text: impl Into<String>) -> Self {
        self.script.rcpt_to = Reply::new(code, text);
        self
    }

    /// Reply sent after the terminating `.` of DATA.
    #[must_use]
    pub fn with_data_end_response(mut self, code: u16, text: impl Into<String>) -> Self {
        self.script.data_end = Reply::new(code, text);
        self
    }

    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn build(self) -> Result<MockSmtpServer, std::io::Error> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let script = Arc::new(self.script);
        let messages = Arc::new(RwLock::new(Vec::new()));
        let shutdown = Arc::new(AtomicBool::new(false));

        let accepted = Arc::clone(&messages);
        let stop = Arc::clone(&shutdown);

        tokio::spawn(async move {
            while !stop.load(Ordering::Relaxed) {
                // Short accept timeout so the shutdown flag is noticed.
                if let Ok(Ok((stream, _peer))) =
                    timeout(Duration::from_millis(100), listener.accept()).await
                {
                    let script = Arc::clone(&script);
                    let messages = Arc::clone(&accepted);

                    tokio::spawn(async move {
                        if let Err(e) = MockSmtpServer::handle_client(stream, script, messages).await
                        {
                            eprintln!("Mock relay client error: {e}");
                        }
                    });
                }
            }
        });

        Ok(MockSmtpServer {
            addr,
            messages,
            shutdown,
        })
    }
}
