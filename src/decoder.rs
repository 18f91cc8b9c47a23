/// Response frame decoder and field validation
///
/// Frames have no length prefix or checksum, so the decoder only checks that a
/// full 17 bytes are present. Field-level checks live in `Packet::validate`
/// and are reported, never raised.

use crate::protocol::*;
use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed frame: need {need} bytes, have {have}")]
    MalformedFrame { need: usize, have: usize },
}

pub type DecodeResult<T> = Result<T, DecodeError>;

/// Why a decoded packet was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol {:?} is not alphanumeric", String::from_utf8_lossy(.0))]
    Symbol([u8; 4]),

    #[error("invalid side indicator {0:#04x}")]
    Side(u8),

    #[error("negative quantity: {0}")]
    NegativeQuantity(i32),

    #[error("negative price: {0}")]
    NegativePrice(i32),
}

pub struct Decoder;

impl Decoder {
    /// Decode one response frame. Bytes past the first 17 are ignored.
    pub fn decode(buffer: &[u8]) -> DecodeResult<Packet> {
        if buffer.len() < PACKET_SIZE {
            return Err(DecodeError::MalformedFrame {
                need: PACKET_SIZE,
                have: buffer.len(),
            });
        }

        let mut symbol = [0u8; 4];
        symbol.copy_from_slice(&buffer[SYMBOL_OFFSET..SIDE_OFFSET]);

        Ok(Packet {
            symbol,
            side: buffer[SIDE_OFFSET],
            quantity: BigEndian::read_i32(&buffer[QUANTITY_OFFSET..PRICE_OFFSET]),
            price: BigEndian::read_i32(&buffer[PRICE_OFFSET..SEQUENCE_OFFSET]),
            sequence: BigEndian::read_i32(&buffer[SEQUENCE_OFFSET..PACKET_SIZE]),
        })
    }
}

impl Packet {
    /// Check field-level rules, returning the first one that fails
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.symbol.iter().all(u8::is_ascii_alphanumeric) {
            return Err(ValidationError::Symbol(self.symbol));
        }
        if self.side().is_none() {
            return Err(ValidationError::Side(self.side));
        }
        if self.quantity < 0 {
            return Err(ValidationError::NegativeQuantity(self.quantity));
        }
        if self.price < 0 {
            return Err(ValidationError::NegativePrice(self.price));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
