//! Byte-level decoding shared by the metadata parser and the channel reader.
//!
//! TDMS segments carry a big-endian flag; everything after the lead-in's ToC
//! mask (metadata and raw data) follows it.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::error::TdmsError;
use super::types::{DataType, PropertyValue, Timestamp, Values};

/// Cursor over an in-memory metadata block
pub(crate) struct MetaReader<'a> {
    buf: &'a [u8],
    pos: usize,
    big_endian: bool,
    /// Absolute file position of `buf[0]`, for error messages
    base_offset: u64,
}

impl<'a> MetaReader<'a> {
    pub(crate) fn new(buf: &'a [u8], big_endian: bool, base_offset: u64) -> Self {
        Self {
            buf,
            pos: 0,
            big_endian,
            base_offset,
        }
    }

    pub(crate) fn offset(&self) -> u64 {
        self.base_offset + self.pos as u64
    }

    pub(crate) fn bytes(&mut self, len: usize) -> Result<&'a [u8], TdmsError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| TdmsError::truncated("segment metadata", self.offset()))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, TdmsError> {
        Ok(self.bytes(1)?[0])
    }

    pub(crate) fn u32(&mut self) -> Result<u32, TdmsError> {
        let b = self.bytes(4)?;
        Ok(if self.big_endian {
            BigEndian::read_u32(b)
        } else {
            LittleEndian::read_u32(b)
        })
    }

    pub(crate) fn u64(&mut self) -> Result<u64, TdmsError> {
        let b = self.bytes(8)?;
        Ok(if self.big_endian {
            BigEndian::read_u64(b)
        } else {
            LittleEndian::read_u64(b)
        })
    }

    pub(crate) fn string(&mut self) -> Result<String, TdmsError> {
        let len = self.u32()? as usize;
        let bytes = self.bytes(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read one property value of the given type code
    pub(crate) fn property_value(&mut self) -> Result<PropertyValue, TdmsError> {
        let data_type = DataType::from_code(self.u32()?)?;
        if data_type == DataType::String {
            return Ok(PropertyValue::String(self.string()?));
        }

        let size = data_type
            .fixed_size()
            .filter(|_| data_type.is_decodable())
            .ok_or_else(|| {
                TdmsError::InvalidMetadata(format!("property of type {data_type} is not supported"))
            })?;
        let bytes = self.bytes(size as usize)?;
        let values = decode_packed(data_type, bytes, self.big_endian)?;

        let value = match values {
            Values::I8(v) => PropertyValue::Int(i64::from(v[0])),
            Values::I16(v) => PropertyValue::Int(i64::from(v[0])),
            Values::I32(v) => PropertyValue::Int(i64::from(v[0])),
            Values::I64(v) => PropertyValue::Int(v[0]),
            Values::U8(v) => PropertyValue::UInt(u64::from(v[0])),
            Values::U16(v) => PropertyValue::UInt(u64::from(v[0])),
            Values::U32(v) => PropertyValue::UInt(u64::from(v[0])),
            Values::U64(v) => PropertyValue::UInt(v[0]),
            Values::F32(v) => PropertyValue::F32(v[0]),
            Values::F64(v) => PropertyValue::F64(v[0]),
            Values::Bool(v) => PropertyValue::Bool(v[0]),
            Values::Timestamp(v) => PropertyValue::Timestamp(v[0]),
            Values::ComplexF32(v) => PropertyValue::Complex(f64::from(v[0].0), f64::from(v[0].1)),
            Values::ComplexF64(v) => PropertyValue::Complex(v[0].0, v[0].1),
            Values::String(mut v) => PropertyValue::String(v.pop().unwrap_or_default()),
        };
        Ok(value)
    }
}

/// Decode tightly packed fixed-size values
pub(crate) fn decode_packed(
    data_type: DataType,
    bytes: &[u8],
    big_endian: bool,
) -> Result<Values, TdmsError> {
    if big_endian {
        decode_packed_with::<BigEndian>(data_type, bytes, true)
    } else {
        decode_packed_with::<LittleEndian>(data_type, bytes, false)
    }
}

fn decode_packed_with<B: ByteOrder>(
    data_type: DataType,
    bytes: &[u8],
    big_endian: bool,
) -> Result<Values, TdmsError> {
    let size = data_type.fixed_size().unwrap_or(0) as usize;
    let count = if size == 0 { 0 } else { bytes.len() / size };
    let bytes = &bytes[..count * size];

    let values = match data_type {
        DataType::I8 => Values::I8(bytes.iter().map(|b| *b as i8).collect()),
        DataType::U8 => Values::U8(bytes.to_vec()),
        DataType::Bool => Values::Bool(bytes.iter().map(|b| *b != 0).collect()),
        DataType::I16 => {
            let mut out = vec![0; count];
            B::read_i16_into(bytes, &mut out);
            Values::I16(out)
        }
        DataType::U16 => {
            let mut out = vec![0; count];
            B::read_u16_into(bytes, &mut out);
            Values::U16(out)
        }
        DataType::I32 => {
            let mut out = vec![0; count];
            B::read_i32_into(bytes, &mut out);
            Values::I32(out)
        }
        DataType::U32 => {
            let mut out = vec![0; count];
            B::read_u32_into(bytes, &mut out);
            Values::U32(out)
        }
        DataType::I64 => {
            let mut out = vec![0; count];
            B::read_i64_into(bytes, &mut out);
            Values::I64(out)
        }
        DataType::U64 => {
            let mut out = vec![0; count];
            B::read_u64_into(bytes, &mut out);
            Values::U64(out)
        }
        DataType::F32 => {
            let mut out = vec![0.0; count];
            B::read_f32_into(bytes, &mut out);
            Values::F32(out)
        }
        DataType::F64 => {
            let mut out = vec![0.0; count];
            B::read_f64_into(bytes, &mut out);
            Values::F64(out)
        }
        DataType::ComplexF32 => Values::ComplexF32(
            bytes
                .chunks_exact(8)
                .map(|c| (B::read_f32(&c[..4]), B::read_f32(&c[4..])))
                .collect(),
        ),
        DataType::ComplexF64 => Values::ComplexF64(
            bytes
                .chunks_exact(16)
                .map(|c| (B::read_f64(&c[..8]), B::read_f64(&c[8..])))
                .collect(),
        ),
        // Little-endian files store the fractions first, big-endian files the seconds
        DataType::Timestamp => Values::Timestamp(
            bytes
                .chunks_exact(16)
                .map(|c| {
                    let (seconds, fractions) = if big_endian {
                        (&c[..8], &c[8..])
                    } else {
                        (&c[8..], &c[..8])
                    };
                    Timestamp {
                        seconds: B::read_i64(seconds),
                        fractions: B::read_u64(fractions),
                    }
                })
                .collect(),
        ),
        DataType::String | DataType::Void | DataType::ExtendedFloat | DataType::DaqmxRaw => {
            return Err(TdmsError::InvalidMetadata(format!(
                "{data_type} values cannot be decoded as fixed-size data"
            )))
        }
    };
    Ok(values)
}
