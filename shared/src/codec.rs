//! Line codec for the message feed
//!
//! Every frame is one UTF-8 line terminated by `\n`:
//! ```text
//! AUTH <token>                  client -> feed
//! TRACK <acct,..|-> <lang,..|-> client -> feed
//! REPLY <id> <text>             client -> feed
//! OK                            feed -> client
//! DENIED <reason>               feed -> client
//! MSG <id> <lang> <text>        feed -> client
//! ```
//!
//! The last field of a frame is the rest of the line and may contain spaces.

use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;

/// Maximum line length (64 KiB) before the peer is considered broken
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Placeholder for an empty list in a `TRACK` frame
const EMPTY_LIST: &str = "-";

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug, PartialEq)]
pub enum CodecError {
    #[error("Line too long: {0} bytes (max: {MAX_LINE_LEN})")]
    LineTooLong(usize),

    #[error("Line is not valid UTF-8")]
    InvalidUtf8,

    #[error("Unknown frame: {0}")]
    UnknownFrame(String),

    #[error("{frame} frame is missing its {field} field")]
    MissingField {
        frame: &'static str,
        field: &'static str,
    },
}

/// One line of the feed protocol
#[derive(Debug, Clone, PartialEq)]
pub enum FeedFrame {
    Auth { token: String },
    Track {
        accounts: Vec<String>,
        languages: Vec<String>,
    },
    Reply { in_reply_to: String, text: String },
    Ok,
    Denied { reason: String },
    Message {
        id: String,
        language: String,
        text: String,
    },
}

/// Replace line breaks so text cannot split a frame
fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// Collapse whitespace so a field stays one token
fn single_token(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join("_")
}

fn join_list(items: &[String]) -> String {
    if items.is_empty() {
        EMPTY_LIST.to_string()
    } else {
        items.join(",")
    }
}

fn split_list(field: &str) -> Vec<String> {
    if field == EMPTY_LIST {
        return Vec::new();
    }
    field
        .split(',')
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Encode a frame into a newline terminated line
pub fn encode(frame: &FeedFrame) -> Bytes {
    let line = match frame {
        FeedFrame::Auth { token } => format!("AUTH {}", single_line(token)),
        FeedFrame::Track {
            accounts,
            languages,
        } => format!("TRACK {} {}", join_list(accounts), join_list(languages)),
        FeedFrame::Reply { in_reply_to, text } => {
            format!("REPLY {} {}", single_token(in_reply_to), single_line(text))
        }
        FeedFrame::Ok => "OK".to_string(),
        FeedFrame::Denied { reason } => format!("DENIED {}", single_line(reason)),
        FeedFrame::Message { id, language, text } => {
            format!(
                "MSG {} {} {}",
                single_token(id),
                single_token(language),
                single_line(text)
            )
        }
    };

    let mut out = line.into_bytes();
    out.push(b'\n');
    Bytes::from(out)
}

/// Parse one line (without its terminator) into a frame
pub fn parse_line(line: &str) -> Result<FeedFrame, CodecError> {
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));

    match verb {
        "AUTH" => Ok(FeedFrame::Auth {
            token: required(rest, "AUTH", "token")?.to_string(),
        }),
        "TRACK" => {
            let (accounts, languages) = rest.split_once(' ').ok_or(CodecError::MissingField {
                frame: "TRACK",
                field: "languages",
            })?;
            Ok(FeedFrame::Track {
                accounts: split_list(accounts),
                languages: split_list(languages),
            })
        }
        "REPLY" => {
            let (id, text) = rest.split_once(' ').unwrap_or((rest, ""));
            Ok(FeedFrame::Reply {
                in_reply_to: required(id, "REPLY", "id")?.to_string(),
                text: text.to_string(),
            })
        }
        "OK" => Ok(FeedFrame::Ok),
        "DENIED" => Ok(FeedFrame::Denied {
            reason: rest.to_string(),
        }),
        "MSG" => {
            let mut fields = rest.splitn(3, ' ');
            let id = required(fields.next().unwrap_or(""), "MSG", "id")?;
            let language = required(fields.next().unwrap_or(""), "MSG", "language")?;
            Ok(FeedFrame::Message {
                id: id.to_string(),
                language: language.to_string(),
                text: fields.next().unwrap_or("").to_string(),
            })
        }
        other => Err(CodecError::UnknownFrame(other.to_string())),
    }
}

fn required<'a>(
    field: &'a str,
    frame: &'static str,
    name: &'static str,
) -> Result<&'a str, CodecError> {
    if field.is_empty() {
        Err(CodecError::MissingField { frame, field: name })
    } else {
        Ok(field)
    }
}

/// Try to decode one line from a buffer
///
/// Returns:
/// - `Ok(Some(frame))` if a complete line was decoded
/// - `Ok(None)` if more data is needed
/// - `Err(...)` if the data is invalid
pub fn decode(buf: &mut BytesMut) -> Result<Option<FeedFrame>, CodecError> {
    let Some(end) = buf.iter().position(|&b| b == b'\n') else {
        if buf.len() > MAX_LINE_LEN {
            return Err(CodecError::LineTooLong(buf.len()));
        }
        return Ok(None);
    };

    if end > MAX_LINE_LEN {
        return Err(CodecError::LineTooLong(end));
    }

    let line = buf.split_to(end);
    buf.advance(1);

    let text = std::str::from_utf8(&line).map_err(|_| CodecError::InvalidUtf8)?;
    parse_line(text.trim_end_matches('\r')).map(Some)
}

/// Decoder state for streaming decoding
#[derive(Debug, Default)]
pub struct LineDecoder {
    /// Partial line data being accumulated
    buffer: BytesMut,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
        }
    }

    /// Add data to the decoder buffer
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode the next frame from the buffer
    ///
    /// Call this repeatedly until it returns `Ok(None)` to drain all complete lines
    pub fn decode_next(&mut self) -> Result<Option<FeedFrame>, CodecError> {
        decode(&mut self.buffer)
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }
}
