//! Open Pixel Control wire format and a write-only client.
//!
//! Every message is `[channel:1][command:1][length:2 BE][payload:length]`.
//! The controller never answers, so the client only writes.

use crate::color::{Rgb, BLACK};
use crate::error::{GlowError, Result};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{error, info};

/// Number of LEDs on the strip.
pub const LED_COUNT: usize = 60;

/// Channel 0 addresses every strip attached to the controller.
pub const BROADCAST_CHANNEL: u8 = 0;

/// "Set pixel colors" command code.
pub const CMD_SET_PIXELS: u8 = 0;

pub const HEADER_LEN: usize = 4;

/// Length of a full-strip pixel payload.
pub const FRAME_PAYLOAD_LEN: usize = 3 * LED_COUNT;

/// One complete strip update, in strip index order.
pub type Frame = [Rgb; LED_COUNT];

/// A single OPC message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub channel: u8,
    pub command: u8,
    pub payload: Vec<u8>,
}

impl Message {
    /// Build a broadcast set-pixel message from RGB triples.
    pub fn set_pixels(pixels: &[Rgb]) -> Self {
        let mut payload = Vec::with_capacity(pixels.len() * 3);
        for p in pixels.iter().take(usize::from(u16::MAX) / 3) {
            payload.extend_from_slice(&[p.r, p.g, p.b]);
        }
        Self {
            channel: BROADCAST_CHANNEL,
            command: CMD_SET_PIXELS,
            payload,
        }
    }

    /// Append the wire encoding of this message to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        let len = u16::try_from(self.payload.len()).unwrap_or(u16::MAX);
        out.reserve(HEADER_LEN + usize::from(len));
        out.push(self.channel);
        out.push(self.command);
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&self.payload[..usize::from(len)]);
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    /// Decode one message from the front of `buf`.
    ///
    /// Returns the message and the number of bytes consumed, or `None` if
    /// `buf` does not yet hold a complete message.
    pub fn decode(buf: &[u8]) -> Option<(Self, usize)> {
        if buf.len() < HEADER_LEN {
            return None;
        }
        let len = usize::from(u16::from_be_bytes([buf[2], buf[3]]));
        let end = HEADER_LEN + len;
        let payload = buf.get(HEADER_LEN..end)?.to_vec();
        Some((
            Self {
                channel: buf[0],
                command: buf[1],
                payload,
            },
            end,
        ))
    }

    /// Interpret the payload as RGB triples. A trailing partial triple is ignored.
    pub fn pixels(&self) -> Vec<Rgb> {
        self.payload
            .chunks_exact(3)
            .map(|c| Rgb::new(c[0], c[1], c[2]))
            .collect()
    }
}

/// Decode every complete message in `buf`, ignoring a trailing fragment.
pub fn decode_all(mut buf: &[u8]) -> Vec<Message> {
    let mut messages = Vec::new();
    while let Some((msg, used)) = Message::decode(buf) {
        messages.push(msg);
        buf = &buf[used..];
    }
    messages
}

/// Write-only OPC connection.
pub struct OpcClient<W> {
    writer: W,
    buf: Vec<u8>,
}

impl OpcClient<TcpStream> {
    /// Open a TCP connection to an OPC server such as fcserver.
    ///
    /// # Errors
    /// Returns `GlowError::Connect` if the server cannot be reached.
    pub async fn connect(addr: &str) -> Result<Self> {
        info!("connecting to OPC server {addr}");
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| GlowError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        stream.set_nodelay(true)?;
        info!("connected to OPC server {addr}");
        Ok(Self::new(stream))
    }
}

impl<W: AsyncWrite + Unpin> OpcClient<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            buf: Vec::with_capacity(HEADER_LEN + FRAME_PAYLOAD_LEN),
        }
    }

    /// Send one message. Failures are logged here and returned to the caller.
    pub async fn send(&mut self, message: &Message) -> Result<()> {
        self.buf.clear();
        message.encode_into(&mut self.buf);
        let res = async {
            self.writer.write_all(&self.buf).await?;
            self.writer.flush().await
        }
        .await;
        if let Err(e) = res {
            error!("couldn't send frame: {e}");
            return Err(GlowError::Send(e));
        }
        Ok(())
    }

    pub async fn send_pixels(&mut self, pixels: &[Rgb]) -> Result<()> {
        self.send(&Message::set_pixels(pixels)).await
    }

    /// Turn every LED off.
    pub async fn clear(&mut self) -> Result<()> {
        self.send_pixels(&[BLACK; LED_COUNT]).await
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
