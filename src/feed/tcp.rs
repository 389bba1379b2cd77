//! TCP feed client speaking the line protocol from `feedbot_shared::codec`

use super::traits::{FeedError, FeedFilter, FeedStream, InboundMessage, MessageFeed, ReplySink};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use feedbot_shared::codec::{self, FeedFrame, LineDecoder};
use feedbot_shared::OriginatorId;
use futures::StreamExt;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Configuration for the TCP feed connection
#[derive(Debug, Clone)]
pub struct TcpFeedConfig {
    /// Feed server address
    pub address: String,
    /// Token sent in the AUTH frame
    pub token: String,
    /// Connection timeout
    pub connect_timeout: Duration,
}

impl Default for TcpFeedConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8080".into(),
            token: "dev-token".into(),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Message feed backed by a TCP connection to a feed server
pub struct TcpFeed {
    config: TcpFeedConfig,
    /// Channel for outgoing replies
    outbound_tx: mpsc::Sender<FeedFrame>,
    /// Handed to the connection task on subscribe
    outbound_rx: Mutex<Option<mpsc::Receiver<FeedFrame>>>,
}

impl TcpFeed {
    pub fn new(config: TcpFeedConfig) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel::<FeedFrame>(100);
        Self {
            config,
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
        }
    }

    async fn connect(&self) -> Result<TcpStream, FeedError> {
        let address = &self.config.address;
        match timeout(self.config.connect_timeout, TcpStream::connect(address)).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(FeedError::Connect {
                address: address.clone(),
                reason: e.to_string(),
            }),
            Err(_) => Err(FeedError::Connect {
                address: address.clone(),
                reason: "timed out".into(),
            }),
        }
    }
}

#[async_trait]
impl MessageFeed for TcpFeed {
    async fn subscribe(&self, filter: &FeedFilter) -> Result<FeedStream, FeedError> {
        let mut outbound_slot = self.outbound_rx.lock().await;
        if outbound_slot.is_none() {
            return Err(FeedError::Handshake("feed already subscribed".into()));
        }

        let stream = self.connect().await?;
        let (mut reader, mut writer) = stream.into_split();
        let mut decoder = LineDecoder::new();

        writer
            .write_all(&codec::encode(&FeedFrame::Auth {
                token: self.config.token.clone(),
            }))
            .await?;
        writer
            .write_all(&codec::encode(&FeedFrame::Track {
                accounts: filter.accounts.clone(),
                languages: filter.languages.clone(),
            }))
            .await?;

        match read_frame(&mut reader, &mut decoder).await? {
            Some(FeedFrame::Ok) => {}
            Some(FeedFrame::Denied { reason }) => return Err(FeedError::Unauthorized(reason)),
            Some(other) => {
                return Err(FeedError::Handshake(format!("unexpected frame {:?}", other)))
            }
            None => return Err(FeedError::Closed),
        }

        info!("[FEED] Subscribed to {}", self.config.address);

        let outbound_rx = match outbound_slot.take() {
            Some(rx) => rx,
            None => return Err(FeedError::Handshake("feed already subscribed".into())),
        };
        let (inbound_tx, inbound_rx) = mpsc::channel(100);
        tokio::spawn(async move {
            connection_loop(reader, writer, decoder, outbound_rx, inbound_tx).await;
        });

        Ok(futures::stream::unfold(inbound_rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })
        .boxed())
    }

    fn name(&self) -> &'static str {
        "tcp"
    }
}

#[async_trait]
impl ReplySink for TcpFeed {
    async fn post_reply(&self, text: &str, in_reply_to: &OriginatorId) -> Result<()> {
        self.outbound_tx
            .try_send(FeedFrame::Reply {
                in_reply_to: in_reply_to.to_string(),
                text: text.to_string(),
            })
            .map_err(|e| anyhow!("Reply to {} dropped: {}", in_reply_to, e))
    }
}

/// Read until one complete frame is available. `None` means the peer closed.
async fn read_frame(
    reader: &mut OwnedReadHalf,
    decoder: &mut LineDecoder,
) -> Result<Option<FeedFrame>, FeedError> {
    let mut read_buf = vec![0u8; 4096];
    loop {
        if let Some(frame) = decoder.decode_next()? {
            return Ok(Some(frame));
        }
        let n = reader.read(&mut read_buf).await?;
        if n == 0 {
            return Ok(None);
        }
        decoder.extend(&read_buf[..n]);
    }
}

/// Pump frames in both directions until either side goes away
async fn connection_loop(
    mut reader: OwnedReadHalf,
    mut writer: OwnedWriteHalf,
    mut decoder: LineDecoder,
    mut outbound_rx: mpsc::Receiver<FeedFrame>,
    inbound_tx: mpsc::Sender<Result<InboundMessage, FeedError>>,
) {
    loop {
        tokio::select! {
            Some(frame) = outbound_rx.recv() => {
                if let Err(e) = writer.write_all(&codec::encode(&frame)).await {
                    let _ = inbound_tx.send(Err(e.into())).await;
                    return;
                }
            }

            result = read_frame(&mut reader, &mut decoder) => {
                let item = match result {
                    Ok(Some(FeedFrame::Message { id, language, text })) => Ok(InboundMessage {
                        id: OriginatorId::new(id),
                        language,
                        text,
                    }),
                    Ok(Some(FeedFrame::Denied { reason })) => Err(FeedError::Unauthorized(reason)),
                    Ok(Some(other)) => {
                        debug!("[FEED] Ignoring frame {:?}", other);
                        continue;
                    }
                    Ok(None) => {
                        info!("[FEED] Feed server closed the connection");
                        return;
                    }
                    Err(e) => Err(e),
                };

                let fatal = item.is_err();
                if inbound_tx.send(item).await.is_err() {
                    warn!("[FEED] Subscriber went away");
                    return;
                }
                if fatal {
                    return;
                }
            }
        }
    }
}
