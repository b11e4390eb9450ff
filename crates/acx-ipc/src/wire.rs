//! Fixed-width frames for the inter-process byte streams.
//!
//! Strings are NUL-padded fixed fields, integers little-endian `i32`, no
//! alignment padding. A frame is either read whole or the stream is
//! considered broken: these are non-seekable pipes, and once alignment is
//! lost there is no way back.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use acx_core::account::NoticeSummary;
use acx_core::notice::Notice;
use acx_core::payment::PaymentRequest;
use acx_core::SpeedBand;

pub const FLIGHT_FIELD: usize = 20;
pub const AIRLINE_FIELD: usize = 20;
pub const CLASS_FIELD: usize = 20;
pub const NOTICE_ID_FIELD: usize = 30;

/// flight + airline + three i32s.
pub const VIOLATION_FRAME_LEN: usize = FLIGHT_FIELD + AIRLINE_FIELD + 12;
/// notice id + flight + class + two i32s + paid byte.
pub const PAYMENT_FRAME_LEN: usize = NOTICE_ID_FIELD + FLIGHT_FIELD + CLASS_FIELD + 9;

#[derive(Debug, Error)]
pub enum WireError {
    /// EOF in the middle of a frame. Unrecoverable on a byte stream.
    #[error("stream truncated mid-frame ({got}/{expected} bytes)")]
    Truncated { got: usize, expected: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn put_str(dst: &mut [u8], value: &str) {
    // Always leave at least one NUL so the field reads back as a C string.
    let bytes = value.as_bytes();
    let n = bytes.len().min(dst.len() - 1);
    dst[..n].copy_from_slice(&bytes[..n]);
}

fn get_str(src: &[u8]) -> String {
    let end = src.iter().position(|b| *b == 0).unwrap_or(src.len());
    String::from_utf8_lossy(&src[..end]).into_owned()
}

fn get_i32(src: &[u8]) -> i32 {
    i32::from_le_bytes([src[0], src[1], src[2], src[3]])
}

/// Read exactly `N` bytes. `Ok(None)` on clean EOF at a frame boundary,
/// `Truncated` when the peer went away mid-frame.
async fn read_frame<const N: usize, R>(reader: &mut R) -> Result<Option<[u8; N]>, WireError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; N];
    let mut filled = 0;
    while filled < N {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(WireError::Truncated { got: filled, expected: N });
        }
        filled += n;
    }
    Ok(Some(buf))
}

/// One detected speed violation, radar → notice generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationFrame {
    pub flight_number: String,
    pub airline: String,
    pub speed: i32,
    pub min_allowed: i32,
    pub max_allowed: i32,
}

impl ViolationFrame {
    pub fn new(flight_number: &str, airline: &str, speed: i32, band: SpeedBand) -> Self {
        Self {
            flight_number: flight_number.to_string(),
            airline: airline.to_string(),
            speed,
            min_allowed: band.min,
            max_allowed: band.max,
        }
    }

    pub fn encode(&self) -> [u8; VIOLATION_FRAME_LEN] {
        let mut buf = [0u8; VIOLATION_FRAME_LEN];
        put_str(&mut buf[..FLIGHT_FIELD], &self.flight_number);
        put_str(&mut buf[FLIGHT_FIELD..FLIGHT_FIELD + AIRLINE_FIELD], &self.airline);
        let base = FLIGHT_FIELD + AIRLINE_FIELD;
        buf[base..base + 4].copy_from_slice(&self.speed.to_le_bytes());
        buf[base + 4..base + 8].copy_from_slice(&self.min_allowed.to_le_bytes());
        buf[base + 8..base + 12].copy_from_slice(&self.max_allowed.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; VIOLATION_FRAME_LEN]) -> Self {
        let base = FLIGHT_FIELD + AIRLINE_FIELD;
        Self {
            flight_number: get_str(&buf[..FLIGHT_FIELD]),
            airline: get_str(&buf[FLIGHT_FIELD..base]),
            speed: get_i32(&buf[base..]),
            min_allowed: get_i32(&buf[base + 4..]),
            max_allowed: get_i32(&buf[base + 8..]),
        }
    }

    pub async fn read_from<R>(reader: &mut R) -> Result<Option<Self>, WireError>
    where
        R: AsyncRead + Unpin,
    {
        Ok(read_frame::<VIOLATION_FRAME_LEN, _>(reader).await?.map(|buf| Self::decode(&buf)))
    }

    pub async fn write_to<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(&self.encode()).await
    }
}

/// Notice/payment update frame. Carried on the notice stream, the
/// payment-request stream and the confirmation stream alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentFrame {
    pub notice_id: String,
    pub flight_number: String,
    pub fine_class: String,
    pub amount_due: i32,
    pub amount_paid: i32,
    pub paid: bool,
}

impl PaymentFrame {
    pub fn from_notice(notice: &Notice) -> Self {
        Self {
            notice_id: notice.id.clone(),
            flight_number: notice.flight_number.clone(),
            fine_class: notice.fine_class.as_str().to_string(),
            amount_due: notice.total as i32,
            amount_paid: if notice.paid { notice.total as i32 } else { 0 },
            paid: notice.paid,
        }
    }

    pub fn from_request(request: &PaymentRequest) -> Self {
        Self {
            notice_id: request.notice_id.clone(),
            flight_number: request.flight_number.clone(),
            fine_class: request.fine_class.clone(),
            amount_due: request.amount_due as i32,
            amount_paid: request.amount_offered as i32,
            paid: false,
        }
    }

    pub fn to_summary(&self) -> NoticeSummary {
        NoticeSummary {
            id: self.notice_id.clone(),
            flight_number: self.flight_number.clone(),
            fine_class: self.fine_class.clone(),
            amount: self.amount_due as i64,
            paid: self.paid,
        }
    }

    pub fn to_request(&self) -> PaymentRequest {
        PaymentRequest {
            notice_id: self.notice_id.clone(),
            flight_number: self.flight_number.clone(),
            fine_class: self.fine_class.clone(),
            amount_due: self.amount_due as i64,
            amount_offered: self.amount_paid as i64,
        }
    }

    /// The confirmation the payment service sends back on approval.
    pub fn confirmed(mut self) -> Self {
        self.amount_paid = self.amount_due;
        self.paid = true;
        self
    }

    pub fn encode(&self) -> [u8; PAYMENT_FRAME_LEN] {
        let mut buf = [0u8; PAYMENT_FRAME_LEN];
        put_str(&mut buf[..NOTICE_ID_FIELD], &self.notice_id);
        let flight_at = NOTICE_ID_FIELD;
        let class_at = flight_at + FLIGHT_FIELD;
        let nums_at = class_at + CLASS_FIELD;
        put_str(&mut buf[flight_at..class_at], &self.flight_number);
        put_str(&mut buf[class_at..nums_at], &self.fine_class);
        buf[nums_at..nums_at + 4].copy_from_slice(&self.amount_due.to_le_bytes());
        buf[nums_at + 4..nums_at + 8].copy_from_slice(&self.amount_paid.to_le_bytes());
        buf[nums_at + 8] = self.paid as u8;
        buf
    }

    pub fn decode(buf: &[u8; PAYMENT_FRAME_LEN]) -> Self {
        let flight_at = NOTICE_ID_FIELD;
        let class_at = flight_at + FLIGHT_FIELD;
        let nums_at = class_at + CLASS_FIELD;
        Self {
            notice_id: get_str(&buf[..flight_at]),
            flight_number: get_str(&buf[flight_at..class_at]),
            fine_class: get_str(&buf[class_at..nums_at]),
            amount_due: get_i32(&buf[nums_at..]),
            amount_paid: get_i32(&buf[nums_at + 4..]),
            paid: buf[nums_at + 8] != 0,
        }
    }

    pub async fn read_from<R>(reader: &mut R) -> Result<Option<Self>, WireError>
    where
        R: AsyncRead + Unpin,
    {
        Ok(read_frame::<PAYMENT_FRAME_LEN, _>(reader).await?.map(|buf| Self::decode(&buf)))
    }

    pub async fn write_to<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(&self.encode()).await
    }
}
