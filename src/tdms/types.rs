use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use super::error::TdmsError;

/// Seconds between the TDMS epoch (1904-01-01 UTC) and the Unix epoch
const TDMS_EPOCH_OFFSET_SECONDS: i64 = 2_082_844_800;

/// Element data type of a channel or property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// No data (tdsTypeVoid)
    Void,
    /// Signed 8-bit integer
    I8,
    /// Signed 16-bit integer
    I16,
    /// Signed 32-bit integer
    I32,
    /// Signed 64-bit integer
    I64,
    /// Unsigned 8-bit integer
    U8,
    /// Unsigned 16-bit integer
    U16,
    /// Unsigned 32-bit integer
    U32,
    /// Unsigned 64-bit integer
    U64,
    /// 32-bit float (also used for the "with unit" variant)
    F32,
    /// 64-bit float (also used for the "with unit" variant)
    F64,
    /// 128-bit extended precision float
    ExtendedFloat,
    /// UTF-8 string
    String,
    /// Boolean stored as one byte
    Bool,
    /// LabVIEW timestamp (seconds since 1904 plus 2^-64 fractions)
    Timestamp,
    /// Complex number of two 32-bit floats
    ComplexF32,
    /// Complex number of two 64-bit floats
    ComplexF64,
    /// DAQmx raw data (scaled on read by NI software)
    DaqmxRaw,
}

impl DataType {
    /// Decode a data type from its on-disk code
    pub fn from_code(code: u32) -> Result<Self, TdmsError> {
        let data_type = match code {
            0x00 => DataType::Void,
            0x01 => DataType::I8,
            0x02 => DataType::I16,
            0x03 => DataType::I32,
            0x04 => DataType::I64,
            0x05 => DataType::U8,
            0x06 => DataType::U16,
            0x07 => DataType::U32,
            0x08 => DataType::U64,
            0x09 | 0x19 => DataType::F32,
            0x0A | 0x1A => DataType::F64,
            0x0B | 0x1B => DataType::ExtendedFloat,
            0x20 => DataType::String,
            0x21 => DataType::Bool,
            0x44 => DataType::Timestamp,
            0x08_000C => DataType::ComplexF32,
            0x10_000D => DataType::ComplexF64,
            0xFFFF_FFFF => DataType::DaqmxRaw,
            other => return Err(TdmsError::UnknownDataType(other)),
        };
        Ok(data_type)
    }

    /// On-disk code written for this data type
    pub fn code(self) -> u32 {
        match self {
            DataType::Void => 0x00,
            DataType::I8 => 0x01,
            DataType::I16 => 0x02,
            DataType::I32 => 0x03,
            DataType::I64 => 0x04,
            DataType::U8 => 0x05,
            DataType::U16 => 0x06,
            DataType::U32 => 0x07,
            DataType::U64 => 0x08,
            DataType::F32 => 0x09,
            DataType::F64 => 0x0A,
            DataType::ExtendedFloat => 0x0B,
            DataType::String => 0x20,
            DataType::Bool => 0x21,
            DataType::Timestamp => 0x44,
            DataType::ComplexF32 => 0x08_000C,
            DataType::ComplexF64 => 0x10_000D,
            DataType::DaqmxRaw => 0xFFFF_FFFF,
        }
    }

    /// Size in bytes of one value, `None` for variable-size types
    pub fn fixed_size(self) -> Option<u64> {
        match self {
            DataType::Void => Some(0),
            DataType::I8 | DataType::U8 | DataType::Bool => Some(1),
            DataType::I16 | DataType::U16 => Some(2),
            DataType::I32 | DataType::U32 | DataType::F32 => Some(4),
            DataType::I64 | DataType::U64 | DataType::F64 | DataType::ComplexF32 => Some(8),
            DataType::ExtendedFloat | DataType::Timestamp | DataType::ComplexF64 => Some(16),
            DataType::String | DataType::DaqmxRaw => None,
        }
    }

    /// Whether values of this type can be decoded into [`Values`]
    pub fn is_decodable(self) -> bool {
        !matches!(
            self,
            DataType::Void | DataType::ExtendedFloat | DataType::DaqmxRaw
        )
    }

    /// Short human-readable name
    pub fn name(self) -> &'static str {
        match self {
            DataType::Void => "void",
            DataType::I8 => "i8",
            DataType::I16 => "i16",
            DataType::I32 => "i32",
            DataType::I64 => "i64",
            DataType::U8 => "u8",
            DataType::U16 => "u16",
            DataType::U32 => "u32",
            DataType::U64 => "u64",
            DataType::F32 => "f32",
            DataType::F64 => "f64",
            DataType::ExtendedFloat => "f128",
            DataType::String => "string",
            DataType::Bool => "bool",
            DataType::Timestamp => "timestamp",
            DataType::ComplexF32 => "complex64",
            DataType::ComplexF64 => "complex128",
            DataType::DaqmxRaw => "daqmx-raw",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// LabVIEW timestamp as stored in TDMS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timestamp {
    /// Whole seconds since 1904-01-01 00:00:00 UTC
    pub seconds: i64,
    /// Positive fractions of a second in units of 2^-64
    pub fractions: u64,
}

impl Timestamp {
    /// Build a timestamp from a UTC date-time
    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        let seconds = datetime.timestamp() + TDMS_EPOCH_OFFSET_SECONDS;
        let nanos = u128::from(datetime.timestamp_subsec_nanos().min(999_999_999));
        let fractions = ((nanos << 64) / 1_000_000_000) as u64;
        Self { seconds, fractions }
    }

    /// Convert to a UTC date-time, `None` if out of chrono's range
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let unix_seconds = self.seconds.checked_sub(TDMS_EPOCH_OFFSET_SECONDS)?;
        // Round to the nearest nanosecond so from_datetime/to_datetime is stable
        let nanos = ((u128::from(self.fractions) * 1_000_000_000 + (1u128 << 63)) >> 64) as u64;
        let (unix_seconds, nanos) = if nanos >= 1_000_000_000 {
            (unix_seconds.checked_add(1)?, nanos - 1_000_000_000)
        } else {
            (unix_seconds, nanos)
        };
        DateTime::from_timestamp(unix_seconds, nanos as u32)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(datetime) => f.write_str(&datetime.to_rfc3339_opts(SecondsFormat::Nanos, true)),
            None => write!(f, "{}+{}/2^64s", self.seconds, self.fractions),
        }
    }
}

/// A block of channel values of a single type
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    /// Signed 8-bit integers
    I8(Vec<i8>),
    /// Signed 16-bit integers
    I16(Vec<i16>),
    /// Signed 32-bit integers
    I32(Vec<i32>),
    /// Signed 64-bit integers
    I64(Vec<i64>),
    /// Unsigned 8-bit integers
    U8(Vec<u8>),
    /// Unsigned 16-bit integers
    U16(Vec<u16>),
    /// Unsigned 32-bit integers
    U32(Vec<u32>),
    /// Unsigned 64-bit integers
    U64(Vec<u64>),
    /// 32-bit floats
    F32(Vec<f32>),
    /// 64-bit floats
    F64(Vec<f64>),
    /// Booleans
    Bool(Vec<bool>),
    /// Strings
    String(Vec<String>),
    /// Timestamps
    Timestamp(Vec<Timestamp>),
    /// Complex values as (re, im) pairs of 32-bit floats
    ComplexF32(Vec<(f32, f32)>),
    /// Complex values as (re, im) pairs of 64-bit floats
    ComplexF64(Vec<(f64, f64)>),
}

macro_rules! dispatch {
    ($values:expr, $v:ident => $body:expr) => {
        match $values {
            Values::I8($v) => $body,
            Values::I16($v) => $body,
            Values::I32($v) => $body,
            Values::I64($v) => $body,
            Values::U8($v) => $body,
            Values::U16($v) => $body,
            Values::U32($v) => $body,
            Values::U64($v) => $body,
            Values::F32($v) => $body,
            Values::F64($v) => $body,
            Values::Bool($v) => $body,
            Values::String($v) => $body,
            Values::Timestamp($v) => $body,
            Values::ComplexF32($v) => $body,
            Values::ComplexF64($v) => $body,
        }
    };
}

impl Values {
    /// Empty block for a data type; undecodable types map to an empty string block
    pub fn empty(data_type: DataType) -> Self {
        match data_type {
            DataType::I8 => Values::I8(Vec::new()),
            DataType::I16 => Values::I16(Vec::new()),
            DataType::I32 => Values::I32(Vec::new()),
            DataType::I64 => Values::I64(Vec::new()),
            DataType::U8 => Values::U8(Vec::new()),
            DataType::U16 => Values::U16(Vec::new()),
            DataType::U32 => Values::U32(Vec::new()),
            DataType::U64 => Values::U64(Vec::new()),
            DataType::F32 => Values::F32(Vec::new()),
            DataType::F64 => Values::F64(Vec::new()),
            DataType::Bool => Values::Bool(Vec::new()),
            DataType::Timestamp => Values::Timestamp(Vec::new()),
            DataType::ComplexF32 => Values::ComplexF32(Vec::new()),
            DataType::ComplexF64 => Values::ComplexF64(Vec::new()),
            DataType::String
            | DataType::Void
            | DataType::ExtendedFloat
            | DataType::DaqmxRaw => Values::String(Vec::new()),
        }
    }

    /// TDMS data type of the values
    pub fn data_type(&self) -> DataType {
        match self {
            Values::I8(_) => DataType::I8,
            Values::I16(_) => DataType::I16,
            Values::I32(_) => DataType::I32,
            Values::I64(_) => DataType::I64,
            Values::U8(_) => DataType::U8,
            Values::U16(_) => DataType::U16,
            Values::U32(_) => DataType::U32,
            Values::U64(_) => DataType::U64,
            Values::F32(_) => DataType::F32,
            Values::F64(_) => DataType::F64,
            Values::Bool(_) => DataType::Bool,
            Values::String(_) => DataType::String,
            Values::Timestamp(_) => DataType::Timestamp,
            Values::ComplexF32(_) => DataType::ComplexF32,
            Values::ComplexF64(_) => DataType::ComplexF64,
        }
    }

    /// Number of values
    pub fn len(&self) -> usize {
        dispatch!(self, v => v.len())
    }

    /// Whether the block holds no values
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append another block of the same type
    pub fn append(&mut self, other: Values) -> Result<(), TdmsError> {
        match (self, other) {
            (Values::I8(a), Values::I8(b)) => a.extend(b),
            (Values::I16(a), Values::I16(b)) => a.extend(b),
            (Values::I32(a), Values::I32(b)) => a.extend(b),
            (Values::I64(a), Values::I64(b)) => a.extend(b),
            (Values::U8(a), Values::U8(b)) => a.extend(b),
            (Values::U16(a), Values::U16(b)) => a.extend(b),
            (Values::U32(a), Values::U32(b)) => a.extend(b),
            (Values::U64(a), Values::U64(b)) => a.extend(b),
            (Values::F32(a), Values::F32(b)) => a.extend(b),
            (Values::F64(a), Values::F64(b)) => a.extend(b),
            (Values::Bool(a), Values::Bool(b)) => a.extend(b),
            (Values::String(a), Values::String(b)) => a.extend(b),
            (Values::Timestamp(a), Values::Timestamp(b)) => a.extend(b),
            (Values::ComplexF32(a), Values::ComplexF32(b)) => a.extend(b),
            (Values::ComplexF64(a), Values::ComplexF64(b)) => a.extend(b),
            (a, b) => {
                return Err(TdmsError::InvalidMetadata(format!(
                    "cannot append {} values to {} values",
                    b.data_type(),
                    a.data_type()
                )))
            }
        }
        Ok(())
    }
}

/// Value of an object property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Any signed integer type
    Int(i64),
    /// Any unsigned integer type
    UInt(u64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// Boolean
    Bool(bool),
    /// String
    String(String),
    /// Timestamp
    Timestamp(Timestamp),
    /// Complex value as (re, im)
    Complex(f64, f64),
}

impl PropertyValue {
    /// Data type code written for this property
    pub fn data_type(&self) -> DataType {
        match self {
            PropertyValue::Int(_) => DataType::I64,
            PropertyValue::UInt(_) => DataType::U64,
            PropertyValue::F32(_) => DataType::F32,
            PropertyValue::F64(_) => DataType::F64,
            PropertyValue::Bool(_) => DataType::Bool,
            PropertyValue::String(_) => DataType::String,
            PropertyValue::Timestamp(_) => DataType::Timestamp,
            PropertyValue::Complex(_, _) => DataType::ComplexF64,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Int(v) => write!(f, "{v}"),
            PropertyValue::UInt(v) => write!(f, "{v}"),
            PropertyValue::F32(v) => write!(f, "{v:?}"),
            PropertyValue::F64(v) => write!(f, "{v:?}"),
            PropertyValue::Bool(v) => write!(f, "{v}"),
            PropertyValue::String(v) => f.write_str(v),
            PropertyValue::Timestamp(v) => write!(f, "{v}"),
            PropertyValue::Complex(re, im) => write!(f, "{re:?}{im:+?}j"),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::F64(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

/// Named property attached to the file, a group or a channel
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name
    pub name: String,
    /// Property value
    pub value: PropertyValue,
}

impl Property {
    /// Create a property
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Insert or replace a property by name, keeping first-seen order
pub(crate) fn upsert_property(properties: &mut Vec<Property>, property: Property) {
    match properties.iter_mut().find(|p| p.name == property.name) {
        Some(existing) => existing.value = property.value,
        None => properties.push(property),
    }
}
