//! Low-level cursor over an encoded metadata payload.
//!
//! This module provides the [`Parser`] type, a cursor-based reader for the
//! protobuf-style payload carried in `d1`. All reads are bounds checked and report
//! [`crate::Error::OutOfBounds`] instead of panicking, so a damaged payload surfaces as
//! an ordinary error of the round-trip guard.
//!
//! # Key Components
//!
//! - [`Parser`] - Position tracking, varints, keys and nested messages
//! - [`Field`] / [`FieldValue`] - One decoded field of a message
//!
//! # Usage Examples
//!
//! ```rust
//! use kmetadata::wire::parser::{FieldValue, Parser};
//!
//! // field 1, varint 150
//! let data = [0x08, 0x96, 0x01];
//! let mut parser = Parser::new(&data);
//!
//! let field = parser.read_field()?;
//! assert_eq!(field.number, 1);
//! assert_eq!(field.value, FieldValue::Varint(150));
//! assert!(!parser.has_more_data());
//! # Ok::<(), kmetadata::Error>(())
//! ```

use crate::{
    wire::proto::{WIRE_FIXED32, WIRE_FIXED64, WIRE_LENGTH_DELIMITED, WIRE_VARINT},
    Result,
};

/// Value of a decoded field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// A varint scalar
    Varint(u64),
    /// The bytes of a length-delimited value
    Bytes(&'a [u8]),
    /// A fixed-width value the payload format does not produce
    Fixed,
}

/// A decoded field, borrowing nested message bytes from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    /// Field number
    pub number: u32,
    /// Field value
    pub value: FieldValue<'a>,
}

impl<'a> Field<'a> {
    /// Returns the varint value of this field.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the field is not a varint.
    pub fn varint(&self) -> Result<u64> {
        match self.value {
            FieldValue::Varint(value) => Ok(value),
            _ => Err(malformed_error!(
                "Field {} - expected a varint",
                self.number
            )),
        }
    }

    /// Returns the varint value of this field, narrowed to 32 bits.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the field is not a varint or does not fit.
    pub fn varint_u32(&self) -> Result<u32> {
        let value = self.varint()?;
        u32::try_from(value)
            .map_err(|_| malformed_error!("Field {} - value {} exceeds 32 bits", self.number, value))
    }

    /// Returns the bytes of this length-delimited field.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the field is not length-delimited.
    pub fn bytes(&self) -> Result<&'a [u8]> {
        match self.value {
            FieldValue::Bytes(bytes) => Ok(bytes),
            _ => Err(malformed_error!(
                "Field {} - expected a nested message",
                self.number
            )),
        }
    }
}

/// A cursor over an encoded payload.
pub struct Parser<'a> {
    /// The encoded data
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`Parser`] from a byte slice.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the underlying data buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if unread data remains.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Returns the number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Calculates an end position safely with overflow checking.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the calculation would overflow
    /// or if the resulting position exceeds the data length.
    pub fn calc_end_position(&self, length: usize) -> Result<usize> {
        let end = self
            .position
            .checked_add(length)
            .ok_or(out_of_bounds_error!())?;

        if end > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        Ok(end)
    }

    /// Reads a slice of bytes of the specified length from the current position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `length` bytes would exceed the data.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.calc_end_position(length)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Reads a LEB128 varint of up to 64 bits.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the data ends inside the varint or
    /// [`crate::Error::Malformed`] if the varint is longer than ten bytes.
    pub fn read_varint(&mut self) -> Result<u64> {
        let mut value = 0u64;
        let mut shift = 0;

        loop {
            if self.position >= self.data.len() {
                return Err(out_of_bounds_error!());
            }

            let byte = self.data[self.position];
            self.position += 1;

            value |= u64::from(byte & 0x7F) << shift;
            shift += 7;

            if (byte & 0x80) == 0 {
                break;
            }

            // A u64 holds at most ten 7-bit groups
            if shift >= 64 {
                return Err(malformed_error!(
                    "Varint overflow: value exceeds u64 capacity after {} bits",
                    shift
                ));
            }
        }

        Ok(value)
    }

    /// Reads a field key and splits it into field number and wire type.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for field number `0` or numbers beyond 32 bits.
    pub fn read_key(&mut self) -> Result<(u32, u8)> {
        let key = self.read_varint()?;
        let wire_type = (key & 0x7) as u8;
        let number = u32::try_from(key >> 3)
            .map_err(|_| malformed_error!("Field number out of range - {}", key >> 3))?;
        if number == 0 {
            return Err(malformed_error!("Field number 0 is reserved"));
        }
        Ok((number, wire_type))
    }

    /// Reads the next complete field.
    ///
    /// Fixed-width fields are consumed and reported as [`FieldValue::Fixed`] so callers
    /// can skip them like any other unknown field.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for unknown wire types and
    /// [`crate::Error::OutOfBounds`] for truncated fields.
    pub fn read_field(&mut self) -> Result<Field<'a>> {
        let (number, wire_type) = self.read_key()?;
        let value = match wire_type {
            WIRE_VARINT => FieldValue::Varint(self.read_varint()?),
            WIRE_LENGTH_DELIMITED => {
                let length = usize::try_from(self.read_varint()?)
                    .map_err(|_| out_of_bounds_error!())?;
                FieldValue::Bytes(self.read_bytes(length)?)
            }
            WIRE_FIXED64 => {
                self.read_bytes(8)?;
                FieldValue::Fixed
            }
            WIRE_FIXED32 => {
                self.read_bytes(4)?;
                FieldValue::Fixed
            }
            other => {
                return Err(malformed_error!(
                    "Field {} - unsupported wire type {}",
                    number,
                    other
                ))
            }
        };

        Ok(Field { number, value })
    }
}
