//! Segment walking and index construction.
//!
//! Opening a file reads every lead-in and metadata block but never raw data.
//! The result is a [`FileIndex`]: groups and channels in first-seen order,
//! each channel carrying the list of [`DataBlock`]s where its values live.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::{debug, warn};

use super::decode::MetaReader;
use super::error::TdmsError;
use super::path::ObjectPath;
use super::types::{upsert_property, DataType, Property};

/// Length of a segment lead-in in bytes
pub const LEAD_IN_LEN: u64 = 28;

/// Segment contains metadata
pub const TOC_META_DATA: u32 = 1 << 1;
/// Segment starts a new object list
pub const TOC_NEW_OBJ_LIST: u32 = 1 << 2;
/// Segment contains raw data
pub const TOC_RAW_DATA: u32 = 1 << 3;
/// Raw data is interleaved
pub const TOC_INTERLEAVED_DATA: u32 = 1 << 5;
/// Metadata and raw data are big-endian
pub const TOC_BIG_ENDIAN: u32 = 1 << 6;
/// Segment contains DAQmx raw data
pub const TOC_DAQMX_RAW_DATA: u32 = 1 << 7;

pub(crate) const NO_RAW_DATA: u32 = 0xFFFF_FFFF;
pub(crate) const SAME_AS_PREVIOUS: u32 = 0x0000_0000;
const DAQMX_FORMAT_CHANGING: u32 = 0x6912_0000;
const DAQMX_DIGITAL_LINE: u32 = 0x6913_0000;

/// Fixed 28-byte header of every segment
#[derive(Debug, Clone, Copy)]
pub(crate) struct LeadIn {
    pub toc: u32,
    pub version: u32,
    pub next_segment_offset: u64,
    pub raw_data_offset: u64,
}

impl LeadIn {
    fn has(&self, flag: u32) -> bool {
        self.toc & flag != 0
    }
}

/// Raw data index of one object in one segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawIndex {
    data_type: DataType,
    count: u64,
    /// Bytes this object occupies in one chunk
    data_size: u64,
    daqmx: bool,
}

/// How a channel's values are laid out inside one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockLayout {
    /// Values are packed one after another
    Contiguous,
    /// Values of all channels alternate; `stride` bytes between two values
    Interleaved { stride: u64 },
    /// Table of `count` u32 end offsets followed by `data_bytes` of UTF-8
    Strings { data_bytes: u64 },
    /// DAQmx raw buffers; indexed but not decoded
    Daqmx,
}

/// Run of a channel's values inside one segment
///
/// A segment holds `chunks` repetitions of the same layout, `chunk_size`
/// bytes apart; this channel has `count` values in each of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DataBlock {
    pub offset: u64,
    pub count: u64,
    pub chunks: u64,
    pub chunk_size: u64,
    pub layout: BlockLayout,
    pub big_endian: bool,
}

impl DataBlock {
    pub fn total(&self) -> u64 {
        self.count * self.chunks
    }
}

#[derive(Debug)]
pub(crate) struct ChannelIndex {
    pub name: String,
    pub data_type: Option<DataType>,
    pub properties: Vec<Property>,
    pub blocks: Vec<DataBlock>,
}

#[derive(Debug)]
pub(crate) struct GroupIndex {
    pub name: String,
    pub properties: Vec<Property>,
    pub channels: Vec<ChannelIndex>,
}

/// Everything learned from the segment metadata of one file
#[derive(Debug, Default)]
pub(crate) struct FileIndex {
    pub properties: Vec<Property>,
    pub groups: Vec<GroupIndex>,
    pub segments: usize,
    pub file_len: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ObjectKey {
    Root,
    Group(usize),
    Channel(usize, usize),
}

#[derive(Debug, Clone)]
struct SegmentObject {
    key: ObjectKey,
    index: Option<RawIndex>,
}

#[derive(Default)]
struct Indexer {
    index: FileIndex,
    group_lookup: HashMap<String, usize>,
    channel_lookup: HashMap<(usize, String), usize>,
    last_index: HashMap<ObjectKey, RawIndex>,
    /// Object list of the most recent segment, in raw data order
    objects: Vec<SegmentObject>,
}

/// Walk every segment of a TDMS stream and build its index
pub(crate) fn build_index<R: Read + Seek>(reader: &mut R) -> Result<FileIndex, TdmsError> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    if file_len == 0 {
        return Err(TdmsError::truncated("segment lead-in (empty file)", 0));
    }

    let mut indexer = Indexer::default();
    indexer.index.file_len = file_len;
    let mut position = 0u64;

    while position < file_len {
        let lead_in = read_lead_in(reader, position, file_len)?;
        let lead_in_end = position + LEAD_IN_LEN;

        // All ones marks a segment whose writer never finished it
        let declared_end = if lead_in.next_segment_offset == u64::MAX {
            None
        } else {
            Some(
                lead_in_end
                    .checked_add(lead_in.next_segment_offset)
                    .ok_or_else(|| {
                        TdmsError::InvalidMetadata(format!(
                            "segment at byte {position} has an impossible length"
                        ))
                    })?,
            )
        };
        let segment_end = declared_end.unwrap_or(file_len);
        let raw_data_start = lead_in_end
            .checked_add(lead_in.raw_data_offset)
            .filter(|start| *start <= segment_end)
            .ok_or_else(|| {
                TdmsError::InvalidMetadata(format!(
                    "segment at byte {position} places raw data beyond its own end"
                ))
            })?;

        match declared_end {
            Some(end) if end > file_len => warn!(
                "Segment at byte {} declares {} bytes past the end of the file; its data is truncated",
                position,
                end - file_len
            ),
            None => debug!("Segment at byte {} is incomplete, reading to end of file", position),
            _ => {}
        }

        if lead_in.has(TOC_META_DATA) {
            if raw_data_start > file_len {
                return Err(TdmsError::truncated("segment metadata", lead_in_end));
            }
            let mut metadata = vec![0u8; lead_in.raw_data_offset as usize];
            reader.seek(SeekFrom::Start(lead_in_end))?;
            reader
                .read_exact(&mut metadata)
                .map_err(|e| TdmsError::from_read(e, "segment metadata", lead_in_end))?;
            indexer.read_metadata(&metadata, lead_in, lead_in_end)?;
        }

        if lead_in.has(TOC_RAW_DATA) {
            indexer.add_raw_data(lead_in, raw_data_start, segment_end, declared_end.is_none())?;
        }

        indexer.index.segments += 1;
        match declared_end {
            Some(end) if end < file_len => position = end,
            _ => break,
        }
    }

    debug!(
        "Indexed {} segment(s), {} group(s)",
        indexer.index.segments,
        indexer.index.groups.len()
    );
    Ok(indexer.index)
}

fn read_lead_in<R: Read + Seek>(
    reader: &mut R,
    position: u64,
    file_len: u64,
) -> Result<LeadIn, TdmsError> {
    if file_len - position < LEAD_IN_LEN {
        return Err(TdmsError::truncated("segment lead-in", position));
    }

    let mut bytes = [0u8; LEAD_IN_LEN as usize];
    reader.seek(SeekFrom::Start(position))?;
    reader
        .read_exact(&mut bytes)
        .map_err(|e| TdmsError::from_read(e, "segment lead-in", position))?;

    match &bytes[..4] {
        b"TDSm" => {}
        b"TDSh" => return Err(TdmsError::IndexFile),
        _ => {
            return Err(TdmsError::InvalidTag {
                offset: position,
                tag: [bytes[0], bytes[1], bytes[2], bytes[3]],
            })
        }
    }

    // The ToC mask itself is always little-endian
    let toc = LittleEndian::read_u32(&bytes[4..8]);
    let lead_in = if toc & TOC_BIG_ENDIAN != 0 {
        LeadIn {
            toc,
            version: BigEndian::read_u32(&bytes[8..12]),
            next_segment_offset: BigEndian::read_u64(&bytes[12..20]),
            raw_data_offset: BigEndian::read_u64(&bytes[20..28]),
        }
    } else {
        LeadIn {
            toc,
            version: LittleEndian::read_u32(&bytes[8..12]),
            next_segment_offset: LittleEndian::read_u64(&bytes[12..20]),
            raw_data_offset: LittleEndian::read_u64(&bytes[20..28]),
        }
    };

    if lead_in.version != 4712 && lead_in.version != 4713 {
        warn!(
            "Segment at byte {} has unexpected TDMS version {}",
            position, lead_in.version
        );
    }
    Ok(lead_in)
}

fn read_raw_index(meta: &mut MetaReader<'_>) -> Result<RawIndex, TdmsError> {
    let data_type = DataType::from_code(meta.u32()?)?;
    let dimension = meta.u32()?;
    if dimension != 1 {
        return Err(TdmsError::InvalidMetadata(format!(
            "raw data dimension must be 1, found {dimension}"
        )));
    }
    let count = meta.u64()?;

    let data_size = match data_type.fixed_size() {
        Some(size) => count.checked_mul(size).ok_or_else(|| {
            TdmsError::InvalidMetadata(format!("{count} values of {data_type} overflow"))
        })?,
        None => {
            let total = meta.u64()?;
            if total < count.saturating_mul(4) {
                return Err(TdmsError::InvalidMetadata(format!(
                    "string data of {total} bytes cannot hold {count} offsets"
                )));
            }
            total
        }
    };

    Ok(RawIndex {
        data_type,
        count,
        data_size,
        daqmx: false,
    })
}

fn read_daqmx_index(meta: &mut MetaReader<'_>, marker: u32) -> Result<RawIndex, TdmsError> {
    let _data_type = meta.u32()?;
    let _dimension = meta.u32()?;
    let count = meta.u64()?;

    let scaler_count = meta.u32()?;
    for _ in 0..scaler_count {
        let _scaler_type = meta.u32()?;
        let _raw_buffer_index = meta.u32()?;
        let _raw_offset = meta.u32()?;
        if marker == DAQMX_DIGITAL_LINE {
            let _sample_format = meta.u8()?;
        } else {
            let _sample_format = meta.u32()?;
        }
        let _scale_id = meta.u32()?;
    }

    let width_count = meta.u32()?;
    let mut width_sum = 0u64;
    for _ in 0..width_count {
        width_sum += u64::from(meta.u32()?);
    }

    Ok(RawIndex {
        data_type: DataType::DaqmxRaw,
        count,
        data_size: count.checked_mul(width_sum).ok_or_else(|| {
            TdmsError::InvalidMetadata("DAQmx raw data size overflows".to_string())
        })?,
        daqmx: true,
    })
}

impl Indexer {
    fn register(&mut self, path: &ObjectPath) -> ObjectKey {
        match path {
            ObjectPath::Root => ObjectKey::Root,
            ObjectPath::Group(group) => ObjectKey::Group(self.group_id(group)),
            ObjectPath::Channel { group, channel } => {
                let group_id = self.group_id(group);
                let channels = &mut self.index.groups[group_id].channels;
                let channel_id = *self
                    .channel_lookup
                    .entry((group_id, channel.clone()))
                    .or_insert_with(|| {
                        channels.push(ChannelIndex {
                            name: channel.clone(),
                            data_type: None,
                            properties: Vec::new(),
                            blocks: Vec::new(),
                        });
                        channels.len() - 1
                    });
                ObjectKey::Channel(group_id, channel_id)
            }
        }
    }

    /// Groups may appear only through their channels' paths
    fn group_id(&mut self, name: &str) -> usize {
        if let Some(id) = self.group_lookup.get(name) {
            return *id;
        }
        self.index.groups.push(GroupIndex {
            name: name.to_string(),
            properties: Vec::new(),
            channels: Vec::new(),
        });
        let id = self.index.groups.len() - 1;
        self.group_lookup.insert(name.to_string(), id);
        id
    }

    fn properties_mut(&mut self, key: ObjectKey) -> &mut Vec<Property> {
        match key {
            ObjectKey::Root => &mut self.index.properties,
            ObjectKey::Group(g) => &mut self.index.groups[g].properties,
            ObjectKey::Channel(g, c) => &mut self.index.groups[g].channels[c].properties,
        }
    }

    fn channel_mut(&mut self, key: ObjectKey) -> Option<&mut ChannelIndex> {
        match key {
            ObjectKey::Channel(g, c) => Some(&mut self.index.groups[g].channels[c]),
            _ => None,
        }
    }

    fn read_metadata(
        &mut self,
        buf: &[u8],
        lead_in: LeadIn,
        base_offset: u64,
    ) -> Result<(), TdmsError> {
        let mut meta = MetaReader::new(buf, lead_in.has(TOC_BIG_ENDIAN), base_offset);

        let mut objects = if lead_in.has(TOC_NEW_OBJ_LIST) {
            Vec::new()
        } else {
            self.objects.clone()
        };

        let object_count = meta.u32()?;
        for _ in 0..object_count {
            let raw_path = meta.string()?;
            let path = ObjectPath::parse(&raw_path)?;
            let key = self.register(&path);

            let index = match meta.u32()? {
                NO_RAW_DATA => None,
                SAME_AS_PREVIOUS => Some(*self.last_index.get(&key).ok_or_else(|| {
                    TdmsError::InvalidMetadata(format!(
                        "object {path} reuses a raw data index it never had"
                    ))
                })?),
                marker @ (DAQMX_FORMAT_CHANGING | DAQMX_DIGITAL_LINE) => {
                    Some(read_daqmx_index(&mut meta, marker)?)
                }
                _ => Some(read_raw_index(&mut meta)?),
            };

            if let Some(index) = index {
                let channel = self.channel_mut(key).ok_or_else(|| {
                    TdmsError::InvalidMetadata(format!("object {path} is not a channel but has raw data"))
                })?;
                match channel.data_type {
                    Some(existing) if existing != index.data_type => {
                        return Err(TdmsError::InvalidMetadata(format!(
                            "channel {path} changes type from {existing} to {}",
                            index.data_type
                        )))
                    }
                    _ => channel.data_type = Some(index.data_type),
                }
                self.last_index.insert(key, index);
            }

            let property_count = meta.u32()?;
            for _ in 0..property_count {
                let name = meta.string()?;
                let value = meta.property_value()?;
                upsert_property(self.properties_mut(key), Property { name, value });
            }

            match objects.iter_mut().find(|o| o.key == key) {
                Some(existing) => existing.index = index,
                None => objects.push(SegmentObject { key, index }),
            }
        }

        self.objects = objects;
        Ok(())
    }

    fn add_raw_data(
        &mut self,
        lead_in: LeadIn,
        data_start: u64,
        data_end: u64,
        open_ended: bool,
    ) -> Result<(), TdmsError> {
        let with_data: Vec<(ObjectKey, RawIndex)> = self
            .objects
            .iter()
            .filter_map(|o| o.index.map(|index| (o.key, index)))
            .collect();

        let chunk_size = with_data
            .iter()
            .try_fold(0u64, |sum, (_, index)| sum.checked_add(index.data_size))
            .ok_or_else(|| TdmsError::InvalidMetadata("chunk size overflows".to_string()))?;
        if chunk_size == 0 {
            return Ok(());
        }

        let available = data_end - data_start;
        let chunks = available / chunk_size;
        if available % chunk_size != 0 {
            if open_ended {
                debug!("Ignoring incomplete final chunk at byte {}", data_start);
            } else {
                warn!(
                    "Raw data at byte {} ({} bytes) is not a whole number of {}-byte chunks",
                    data_start, available, chunk_size
                );
            }
        }
        if chunks == 0 {
            return Ok(());
        }

        let big_endian = lead_in.has(TOC_BIG_ENDIAN);
        let daqmx =
            lead_in.has(TOC_DAQMX_RAW_DATA) || with_data.iter().any(|(_, index)| index.daqmx);
        let interleaved = lead_in.has(TOC_INTERLEAVED_DATA);

        let stride = if interleaved && !daqmx {
            let mut stride = 0u64;
            let first_count = with_data[0].1.count;
            for (_, index) in &with_data {
                let size = index.data_type.fixed_size().ok_or_else(|| {
                    TdmsError::InvalidMetadata(format!(
                        "{} data cannot be interleaved",
                        index.data_type
                    ))
                })?;
                if index.count != first_count {
                    return Err(TdmsError::InvalidMetadata(
                        "interleaved channels must have equal value counts".to_string(),
                    ));
                }
                stride += size;
            }
            Some(stride)
        } else {
            None
        };

        let mut offset = data_start;
        for (key, index) in with_data {
            let layout = match (daqmx, stride, index.data_type) {
                (true, _, _) => BlockLayout::Daqmx,
                (false, Some(stride), _) => BlockLayout::Interleaved { stride },
                (false, None, DataType::String) => BlockLayout::Strings {
                    data_bytes: index.data_size - index.count * 4,
                },
                (false, None, _) => BlockLayout::Contiguous,
            };

            let block = DataBlock {
                offset,
                count: index.count,
                chunks,
                chunk_size,
                layout,
                big_endian,
            };

            offset += match stride {
                Some(_) => index.data_type.fixed_size().unwrap_or(0),
                None => index.data_size,
            };

            if block.count == 0 {
                continue;
            }
            block.count.checked_mul(block.chunks).ok_or_else(|| {
                TdmsError::InvalidMetadata("value count overflows".to_string())
            })?;
            if let Some(channel) = self.channel_mut(key) {
                channel.blocks.push(block);
            }
        }
        Ok(())
    }
}
