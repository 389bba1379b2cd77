//! Development feed server
//!
//! Every line typed on stdin is published as a message (prefix it with
//! `lang:xx ` to set its language, default `en`). Connected bots receive the
//! messages matching their TRACK filter; their replies are logged.

use anyhow::{anyhow, bail, Result};
use feedbot_shared::codec::{self, FeedFrame, LineDecoder};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// A message published to all subscribers
#[derive(Debug, Clone, PartialEq)]
struct Published {
    id: u64,
    language: String,
    text: String,
}

/// What one subscriber asked for
#[derive(Debug, Clone, Default, PartialEq)]
struct Subscription {
    accounts: Vec<String>,
    languages: Vec<String>,
}

impl Subscription {
    /// Language must be listed, and some tracked account must be mentioned
    fn matches(&self, msg: &Published) -> bool {
        let language_ok = self.languages.is_empty()
            || self
                .languages
                .iter()
                .any(|l| l.eq_ignore_ascii_case(&msg.language));
        let text = msg.text.to_lowercase();
        let account_ok = self.accounts.is_empty()
            || self
                .accounts
                .iter()
                .any(|a| text.contains(&a.trim_start_matches('@').to_lowercase()));
        language_ok && account_ok
    }
}

/// Split an optional `lang:xx ` prefix off an operator line
fn split_language(line: &str) -> (String, String) {
    if let Some(rest) = line.strip_prefix("lang:") {
        if let Some((language, text)) = rest.split_once(' ') {
            if !language.is_empty() {
                return (language.to_string(), text.trim().to_string());
            }
        }
    }
    ("en".to_string(), line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let address = std::env::var("FEEDSIM_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into());
    let token = Arc::new(std::env::var("FEEDSIM_TOKEN").unwrap_or_else(|_| "dev-token".into()));

    let listener = TcpListener::bind(&address).await?;
    info!("Feed simulator listening on {}", address);

    let (publish_tx, _) = broadcast::channel::<Published>(256);

    let stdin_tx = publish_tx.clone();
    tokio::spawn(async move {
        let mut next_id: u64 = 1000;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            let (language, text) = split_language(&line);
            next_id += 1;
            let msg = Published {
                id: next_id,
                language,
                text,
            };
            info!("Publishing {} [{}]: {}", msg.id, msg.language, msg.text);
            // No subscribers is fine
            let _ = stdin_tx.send(msg);
        }
        info!("stdin closed, no more messages");
    });

    loop {
        let (socket, addr) = listener.accept().await?;
        info!("Connection from: {}", addr);

        let token = token.clone();
        let rx = publish_tx.subscribe();
        tokio::spawn(async move {
            match handle_client(socket, addr, &token, rx).await {
                Ok(()) => info!("Client disconnected: {}", addr),
                Err(e) => error!("Client {} dropped: {}", addr, e),
            }
        });
    }
}

async fn read_frame(
    reader: &mut OwnedReadHalf,
    decoder: &mut LineDecoder,
) -> Result<Option<FeedFrame>> {
    let mut buf = vec![0u8; 4096];
    loop {
        if let Some(frame) = decoder.decode_next()? {
            return Ok(Some(frame));
        }
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        decoder.extend(&buf[..n]);
    }
}

async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    token: &str,
    mut published: broadcast::Receiver<Published>,
) -> Result<()> {
    let (mut reader, mut writer) = socket.into_split();
    let mut decoder = LineDecoder::new();

    // Handshake: AUTH then TRACK
    match read_frame(&mut reader, &mut decoder).await? {
        Some(FeedFrame::Auth { token: offered }) if offered == token => {}
        Some(FeedFrame::Auth { .. }) => {
            writer
                .write_all(&codec::encode(&FeedFrame::Denied {
                    reason: "unknown token".into(),
                }))
                .await?;
            bail!("rejected bad token");
        }
        other => bail!("expected AUTH, got {:?}", other),
    }

    let subscription = match read_frame(&mut reader, &mut decoder).await? {
        Some(FeedFrame::Track {
            accounts,
            languages,
        }) => Subscription {
            accounts,
            languages,
        },
        other => return Err(anyhow!("expected TRACK, got {:?}", other)),
    };
    writer.write_all(&codec::encode(&FeedFrame::Ok)).await?;
    info!("[{}] tracking {:?}", addr, subscription);

    loop {
        tokio::select! {
            msg = published.recv() => {
                match msg {
                    Ok(msg) if subscription.matches(&msg) => {
                        let frame = FeedFrame::Message {
                            id: msg.id.to_string(),
                            language: msg.language,
                            text: msg.text,
                        };
                        writer.write_all(&codec::encode(&frame)).await?;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("[{}] skipped {} messages", addr, n);
                    }
                    Err(broadcast::error::RecvError::Closed) => return Ok(()),
                }
            }

            frame = read_frame(&mut reader, &mut decoder) => {
                match frame? {
                    Some(FeedFrame::Reply { in_reply_to, text }) => {
                        info!("[{}] reply to {}: {}", addr, in_reply_to, text);
                    }
                    Some(other) => warn!("[{}] unexpected frame {:?}", addr, other),
                    None => return Ok(()),
                }
            }
        }
    }
}
