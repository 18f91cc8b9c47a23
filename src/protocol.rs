/// BetaCrew wire format
///
/// Requests (client -> server), 2 bytes:
///   - kind: u8 (1 = stream all, 2 = resend one)
///   - sequence: u8 (resend target; 0 for stream all)
///
/// Responses (server -> client), 17 bytes, big-endian, no header or delimiter:
///   - symbol: [u8; 4] ASCII
///   - side: u8 ('B' or 'S')
///   - quantity: i32
///   - price: i32
///   - sequence: i32

use byteorder::{BigEndian, ByteOrder};
use serde::{Serialize, Serializer};
use thiserror::Error;

pub const PACKET_SIZE: usize = 17;
pub const REQUEST_SIZE: usize = 2;

/// Highest sequence a resend request can address; the target is a single byte.
pub const MAX_RECOVERY_SEQUENCE: i32 = u8::MAX as i32;

pub const SYMBOL_OFFSET: usize = 0;
pub const SIDE_OFFSET: usize = 4;
pub const QUANTITY_OFFSET: usize = 5;
pub const PRICE_OFFSET: usize = 9;
pub const SEQUENCE_OFFSET: usize = 13;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    StreamAll = 1,
    Resend = 2,
}

impl RequestKind {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(RequestKind::StreamAll),
            2 => Some(RequestKind::Resend),
            _ => None,
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy = b'B',
    Sell = b'S',
}

impl Side {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            b'B' => Some(Side::Buy),
            b'S' => Some(Side::Sell),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        self as u8 as char
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("sequence {0} cannot be requested: resend target must be within 0..=255")]
    SequenceOutOfRange(i32),
}

/// One order packet as it came off the wire.
///
/// Fields are kept raw; `validate` in the decoder decides whether the
/// record is usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Packet {
    #[serde(rename = "Symbol", serialize_with = "serialize_symbol")]
    pub symbol: [u8; 4],
    #[serde(rename = "BuySellIndicator", serialize_with = "serialize_side")]
    pub side: u8,
    #[serde(rename = "Quantity")]
    pub quantity: i32,
    #[serde(rename = "Price")]
    pub price: i32,
    #[serde(rename = "Sequence")]
    pub sequence: i32,
}

impl Packet {
    /// Symbol as text. Non-UTF-8 bytes are replaced, not trimmed.
    pub fn symbol_str(&self) -> String {
        String::from_utf8_lossy(&self.symbol).into_owned()
    }

    pub fn side(&self) -> Option<Side> {
        Side::from_u8(self.side)
    }

    /// Encode back into the 17-byte response layout
    pub fn to_frame(&self) -> [u8; PACKET_SIZE] {
        let mut frame = [0u8; PACKET_SIZE];
        frame[SYMBOL_OFFSET..SIDE_OFFSET].copy_from_slice(&self.symbol);
        frame[SIDE_OFFSET] = self.side;
        BigEndian::write_i32(&mut frame[QUANTITY_OFFSET..PRICE_OFFSET], self.quantity);
        BigEndian::write_i32(&mut frame[PRICE_OFFSET..SEQUENCE_OFFSET], self.price);
        BigEndian::write_i32(&mut frame[SEQUENCE_OFFSET..PACKET_SIZE], self.sequence);
        frame
    }
}

fn serialize_symbol<S: Serializer>(symbol: &[u8; 4], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(symbol))
}

fn serialize_side<S: Serializer>(side: &u8, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_char(*side as char)
}

/// Request frame asking the server to stream every packet it has
pub fn encode_bulk_request() -> [u8; REQUEST_SIZE] {
    [RequestKind::StreamAll as u8, 0]
}

/// Request frame asking the server to resend one packet
pub fn encode_recovery_request(sequence: i32) -> Result<[u8; REQUEST_SIZE], ProtocolError> {
    let target = u8::try_from(sequence).map_err(|_| ProtocolError::SequenceOutOfRange(sequence))?;
    Ok([RequestKind::Resend as u8, target])
}
