//! Minimal TDMS writer.
//!
//! Produces files this crate's reader (and NI tooling) can open: one segment
//! per [`TdmsWriter::write_segment`] call, metadata only when the object
//! layout or properties change.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::error::TdmsError;
use super::path::ObjectPath;
use super::segment::{
    NO_RAW_DATA, SAME_AS_PREVIOUS, TOC_BIG_ENDIAN, TOC_INTERLEAVED_DATA, TOC_META_DATA,
    TOC_NEW_OBJ_LIST, TOC_RAW_DATA,
};
use super::types::{DataType, Property, PropertyValue, Timestamp, Values};

const VERSION: u32 = 4713;

/// Values of one channel for one segment
#[derive(Debug, Clone)]
pub struct ChannelData {
    /// Owning group name
    pub group: String,
    /// Channel name
    pub name: String,
    /// Values written in this segment
    pub values: Values,
    /// Properties set in this segment
    pub properties: Vec<Property>,
}

impl ChannelData {
    /// Channel data without properties
    pub fn new(group: impl Into<String>, name: impl Into<String>, values: Values) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            values,
            properties: Vec::new(),
        }
    }

    /// Attach a property
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.push(Property::new(name, value));
        self
    }
}

/// Per-segment layout switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentOptions {
    /// Interleave values of all channels (fixed-size types, equal lengths)
    pub interleaved: bool,
    /// Write metadata and raw data big-endian
    pub big_endian: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexSpec {
    data_type: DataType,
    count: u64,
    data_size: u64,
}

/// Streaming TDMS encoder over any [`Write`]
pub struct TdmsWriter<W: Write> {
    out: W,
    pending_file_properties: Vec<Property>,
    pending_groups: Vec<(String, Vec<Property>)>,
    last_index: HashMap<(String, String), IndexSpec>,
    previous_layout: Option<(Vec<(String, String, IndexSpec)>, SegmentOptions)>,
    segments: usize,
}

impl TdmsWriter<BufWriter<File>> {
    /// Create (or truncate) a TDMS file on disk
    pub fn create(path: impl AsRef<Path>) -> Result<Self, TdmsError> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> TdmsWriter<W> {
    /// Create a writer; nothing is written until the first segment
    pub fn new(out: W) -> Self {
        Self {
            out,
            pending_file_properties: Vec::new(),
            pending_groups: Vec::new(),
            last_index: HashMap::new(),
            previous_layout: None,
            segments: 0,
        }
    }

    /// Set a property on the file object, written with the next segment
    pub fn file_property(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.pending_file_properties.push(Property::new(name, value));
    }

    /// Emit an explicit group object with the next segment
    ///
    /// Groups that are never declared still exist through their channels'
    /// paths.
    pub fn declare_group(&mut self, name: impl Into<String>, properties: Vec<Property>) {
        self.pending_groups.push((name.into(), properties));
    }

    /// Write one little-endian, contiguous segment
    pub fn write_segment(&mut self, channels: &[ChannelData]) -> Result<(), TdmsError> {
        self.write_segment_opts(channels, SegmentOptions::default())
    }

    /// Write one segment with explicit layout options
    pub fn write_segment_opts(
        &mut self,
        channels: &[ChannelData],
        options: SegmentOptions,
    ) -> Result<(), TdmsError> {
        let layout = channels
            .iter()
            .map(|c| Ok((c.group.clone(), c.name.clone(), index_spec(&c.values)?)))
            .collect::<Result<Vec<_>, TdmsError>>()?;

        if options.interleaved {
            validate_interleaved(channels)?;
        }

        let raw = encode_raw(channels, options);

        let needs_metadata = self.segments == 0
            || !self.pending_file_properties.is_empty()
            || !self.pending_groups.is_empty()
            || channels.iter().any(|c| !c.properties.is_empty())
            || self.previous_layout.as_ref() != Some(&(layout.clone(), options));

        let metadata = if needs_metadata {
            Some(self.encode_metadata(channels, &layout, options.big_endian))
        } else {
            None
        };

        let mut toc = 0u32;
        if metadata.is_some() {
            toc |= TOC_META_DATA | TOC_NEW_OBJ_LIST;
        }
        if !channels.is_empty() {
            toc |= TOC_RAW_DATA;
        }
        if options.interleaved {
            toc |= TOC_INTERLEAVED_DATA;
        }
        if options.big_endian {
            toc |= TOC_BIG_ENDIAN;
        }

        let meta_len = metadata.as_ref().map_or(0, Vec::len) as u64;
        let mut lead_in = Encoder::new(options.big_endian);
        lead_in.buf.extend_from_slice(b"TDSm");
        lead_in.buf.extend_from_slice(&toc.to_le_bytes());
        lead_in.u32(VERSION);
        lead_in.u64(meta_len + raw.len() as u64);
        lead_in.u64(meta_len);

        self.out.write_all(&lead_in.buf)?;
        if let Some(metadata) = metadata {
            self.out.write_all(&metadata)?;
        }
        self.out.write_all(&raw)?;

        for (group, name, spec) in &layout {
            self.last_index.insert((group.clone(), name.clone()), *spec);
        }
        self.previous_layout = Some((layout, options));
        self.segments += 1;
        Ok(())
    }

    fn encode_metadata(
        &mut self,
        channels: &[ChannelData],
        layout: &[(String, String, IndexSpec)],
        big_endian: bool,
    ) -> Vec<u8> {
        let mut meta = Encoder::new(big_endian);
        let write_root = self.segments == 0 || !self.pending_file_properties.is_empty();
        let groups = std::mem::take(&mut self.pending_groups);
        let object_count = usize::from(write_root) + groups.len() + channels.len();
        meta.u32(object_count as u32);

        if write_root {
            meta.string(&ObjectPath::Root.to_string());
            meta.u32(NO_RAW_DATA);
            meta.properties(&std::mem::take(&mut self.pending_file_properties));
        }

        for (name, properties) in &groups {
            meta.string(&ObjectPath::group(name.as_str()).to_string());
            meta.u32(NO_RAW_DATA);
            meta.properties(properties);
        }

        for (channel, (group, name, spec)) in channels.iter().zip(layout) {
            meta.string(&ObjectPath::channel(group.as_str(), name.as_str()).to_string());
            match self.last_index.get(&(group.clone(), name.clone())) {
                Some(previous) if previous == spec => meta.u32(SAME_AS_PREVIOUS),
                _ => {
                    let is_string = spec.data_type == DataType::String;
                    meta.u32(if is_string { 28 } else { 20 });
                    meta.u32(spec.data_type.code());
                    meta.u32(1);
                    meta.u64(spec.count);
                    if is_string {
                        meta.u64(spec.data_size);
                    }
                }
            }
            meta.properties(&channel.properties);
        }
        meta.buf
    }

    /// Number of segments written so far
    pub fn segment_count(&self) -> usize {
        self.segments
    }

    /// Flush and return the underlying writer
    pub fn finish(mut self) -> Result<W, TdmsError> {
        self.out.flush()?;
        Ok(self.out)
    }
}

fn index_spec(values: &Values) -> Result<IndexSpec, TdmsError> {
    let data_type = values.data_type();
    let count = values.len() as u64;
    let data_size = match values {
        Values::String(strings) => {
            count * 4 + strings.iter().map(|s| s.len() as u64).sum::<u64>()
        }
        _ => count * data_type.fixed_size().unwrap_or(0),
    };
    if data_type == DataType::String && data_size > u64::from(u32::MAX) {
        return Err(TdmsError::InvalidMetadata(
            "string data exceeds the 4 GiB offset range".to_string(),
        ));
    }
    Ok(IndexSpec {
        data_type,
        count,
        data_size,
    })
}

fn validate_interleaved(channels: &[ChannelData]) -> Result<(), TdmsError> {
    let Some(first) = channels.first() else {
        return Ok(());
    };
    for channel in channels {
        if channel.values.data_type().fixed_size().is_none() {
            return Err(TdmsError::InvalidMetadata(format!(
                "channel '{}' holds {} values, which cannot be interleaved",
                channel.name,
                channel.values.data_type()
            )));
        }
        if channel.values.len() != first.values.len() {
            return Err(TdmsError::InvalidMetadata(
                "interleaved channels must have equal lengths".to_string(),
            ));
        }
    }
    Ok(())
}

fn encode_raw(channels: &[ChannelData], options: SegmentOptions) -> Vec<u8> {
    let mut raw = Encoder::new(options.big_endian);
    if options.interleaved {
        let count = channels.first().map_or(0, |c| c.values.len());
        for i in 0..count {
            for channel in channels {
                raw.value(&channel.values, i);
            }
        }
        return raw.buf;
    }

    for channel in channels {
        match &channel.values {
            Values::String(strings) => {
                let mut end = 0u32;
                for s in strings {
                    end += s.len() as u32;
                    raw.u32(end);
                }
                for s in strings {
                    raw.buf.extend_from_slice(s.as_bytes());
                }
            }
            values => {
                for i in 0..values.len() {
                    raw.value(values, i);
                }
            }
        }
    }
    raw.buf
}

struct Encoder {
    buf: Vec<u8>,
    big_endian: bool,
}

macro_rules! put {
    ($name:ident, $ty:ty, $write:ident, $n:expr) => {
        fn $name(&mut self, v: $ty) {
            let mut b = [0u8; $n];
            if self.big_endian {
                BigEndian::$write(&mut b, v);
            } else {
                LittleEndian::$write(&mut b, v);
            }
            self.buf.extend_from_slice(&b);
        }
    };
}

impl Encoder {
    fn new(big_endian: bool) -> Self {
        Self {
            buf: Vec::new(),
            big_endian,
        }
    }

    put!(u16, u16, write_u16, 2);
    put!(i16, i16, write_i16, 2);
    put!(u32, u32, write_u32, 4);
    put!(i32, i32, write_i32, 4);
    put!(u64, u64, write_u64, 8);
    put!(i64, i64, write_i64, 8);
    put!(f32, f32, write_f32, 4);
    put!(f64, f64, write_f64, 8);

    fn string(&mut self, s: &str) {
        self.u32(s.len() as u32);
        self.buf.extend_from_slice(s.as_bytes());
    }

    fn timestamp(&mut self, t: Timestamp) {
        if self.big_endian {
            self.i64(t.seconds);
            self.u64(t.fractions);
        } else {
            self.u64(t.fractions);
            self.i64(t.seconds);
        }
    }

    fn properties(&mut self, properties: &[Property]) {
        self.u32(properties.len() as u32);
        for property in properties {
            self.string(&property.name);
            self.u32(property.value.data_type().code());
            match &property.value {
                PropertyValue::Int(v) => self.i64(*v),
                PropertyValue::UInt(v) => self.u64(*v),
                PropertyValue::F32(v) => self.f32(*v),
                PropertyValue::F64(v) => self.f64(*v),
                PropertyValue::Bool(v) => self.buf.push(u8::from(*v)),
                PropertyValue::String(v) => self.string(v),
                PropertyValue::Timestamp(v) => self.timestamp(*v),
                PropertyValue::Complex(re, im) => {
                    self.f64(*re);
                    self.f64(*im);
                }
            }
        }
    }

    /// Encode one fixed-size value; strings are handled by the caller
    fn value(&mut self, values: &Values, i: usize) {
        match values {
            Values::I8(v) => self.buf.push(v[i] as u8),
            Values::U8(v) => self.buf.push(v[i]),
            Values::Bool(v) => self.buf.push(u8::from(v[i])),
            Values::I16(v) => self.i16(v[i]),
            Values::U16(v) => self.u16(v[i]),
            Values::I32(v) => self.i32(v[i]),
            Values::U32(v) => self.u32(v[i]),
            Values::I64(v) => self.i64(v[i]),
            Values::U64(v) => self.u64(v[i]),
            Values::F32(v) => self.f32(v[i]),
            Values::F64(v) => self.f64(v[i]),
            Values::Timestamp(v) => self.timestamp(v[i]),
            Values::ComplexF32(v) => {
                self.f32(v[i].0);
                self.f32(v[i].1);
            }
            Values::ComplexF64(v) => {
                self.f64(v[i].0);
                self.f64(v[i].1);
            }
            Values::String(_) => {}
        }
    }
}
