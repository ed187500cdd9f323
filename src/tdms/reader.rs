//! Lazily-reading view over one TDMS file.

use std::cell::RefCell;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::decode::decode_packed;
use super::error::TdmsError;
use super::segment::{build_index, BlockLayout, DataBlock, FileIndex};
use super::types::{DataType, Property, Values};

/// An open TDMS file
///
/// Opening parses all segment metadata; channel values stay on disk until
/// they are pulled through [`Channel::read_chunks`]. Every read goes through
/// the one handle owned here, which is closed when the file is dropped.
pub struct TdmsFile<R = BufReader<File>> {
    source: RefCell<R>,
    properties: Vec<Property>,
    groups: Vec<Group>,
    segments: usize,
    /// Bytes actually present, whatever the segments declare
    len: u64,
}

/// A group of channels
#[derive(Debug, Clone)]
pub struct Group {
    name: String,
    properties: Vec<Property>,
    channels: Vec<Channel>,
}

/// One channel: a typed column of values spread over data blocks
#[derive(Debug, Clone)]
pub struct Channel {
    name: String,
    group: String,
    data_type: DataType,
    len: u64,
    properties: Vec<Property>,
    blocks: Vec<DataBlock>,
}

impl TdmsFile {
    /// Open a TDMS file read-only and index its segments
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TdmsError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> TdmsFile<R> {
    /// Index a TDMS stream
    pub fn from_reader(mut reader: R) -> Result<Self, TdmsError> {
        let index = build_index(&mut reader)?;
        Ok(Self::from_index(reader, index))
    }

    fn from_index(reader: R, index: FileIndex) -> Self {
        let groups = index
            .groups
            .into_iter()
            .map(|group| {
                let channels = group
                    .channels
                    .into_iter()
                    .map(|channel| Channel {
                        len: channel
                            .blocks
                            .iter()
                            .fold(0u64, |sum, block| sum.saturating_add(block.total())),
                        data_type: channel.data_type.unwrap_or(DataType::Void),
                        name: channel.name,
                        group: group.name.clone(),
                        properties: channel.properties,
                        blocks: channel.blocks,
                    })
                    .collect();
                Group {
                    name: group.name,
                    properties: group.properties,
                    channels,
                }
            })
            .collect();

        Self {
            source: RefCell::new(reader),
            properties: index.properties,
            groups,
            segments: index.segments,
            len: index.file_len,
        }
    }

    /// Read every value of a channel into memory
    pub fn read_channel(&self, channel: &Channel) -> Result<Values, TdmsError> {
        let mut all = Values::empty(channel.data_type);
        for chunk in channel.read_chunks(self, 65_536) {
            all.append(chunk?)?;
        }
        Ok(all)
    }

    /// Read `len` raw bytes at `offset`
    ///
    /// The range is checked against the real file length before anything is
    /// allocated, so a corrupt length fails as [`TdmsError::Truncated`].
    fn read_bytes(&self, offset: u64, len: u64, channel: &str) -> Result<Vec<u8>, TdmsError> {
        let what = || format!("raw data of channel '{channel}'");
        match offset.checked_add(len) {
            Some(end) if end <= self.len => {}
            _ => return Err(TdmsError::truncated(what(), offset)),
        }

        let mut buf = vec![0u8; len as usize];
        let mut source = self.source.borrow_mut();
        source.seek(SeekFrom::Start(offset))?;
        source
            .read_exact(&mut buf)
            .map_err(|e| TdmsError::from_read(e, what(), offset))?;
        Ok(buf)
    }
}

impl<R> TdmsFile<R> {
    /// Groups in order of first appearance
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Look up a group by exact name
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Properties of the root object
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Number of segments in the file
    pub fn segment_count(&self) -> usize {
        self.segments
    }
}

impl<R> fmt::Debug for TdmsFile<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TdmsFile")
            .field("properties", &self.properties)
            .field("groups", &self.groups)
            .field("segments", &self.segments)
            .finish()
    }
}

impl Group {
    /// Group name as stored in the file
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Channels in order of first appearance
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Look up a channel by exact name
    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    /// Group properties
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Length of the longest channel
    pub fn max_len(&self) -> u64 {
        self.channels.iter().map(Channel::len).max().unwrap_or(0)
    }
}

impl Channel {
    /// Channel name as stored in the file
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning group
    pub fn group_name(&self) -> &str {
        &self.group
    }

    /// Element type; [`DataType::Void`] when the channel never had data
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Total number of values across all segments
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the channel has no values
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Channel properties
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Iterate over the channel's values in blocks of at most `chunk_size`
    ///
    /// Every block except the last holds exactly `chunk_size` values. A
    /// `chunk_size` of zero is treated as one. The iterator ends after the
    /// first error.
    pub fn read_chunks<'a, R: Read + Seek>(
        &'a self,
        file: &'a TdmsFile<R>,
        chunk_size: usize,
    ) -> ChannelChunks<'a, R> {
        ChannelChunks {
            file,
            channel: self,
            chunk_size: chunk_size.max(1) as u64,
            block: 0,
            chunk: 0,
            value: 0,
            done: false,
        }
    }
}

/// One-pass iterator over a channel's values, see [`Channel::read_chunks`]
pub struct ChannelChunks<'a, R> {
    file: &'a TdmsFile<R>,
    channel: &'a Channel,
    chunk_size: u64,
    block: usize,
    chunk: u64,
    value: u64,
    done: bool,
}

impl<'a, R: Read + Seek> ChannelChunks<'a, R> {
    fn unsupported(&self, reason: impl Into<String>) -> TdmsError {
        TdmsError::Unsupported {
            channel: self.channel.name.clone(),
            reason: reason.into(),
        }
    }

    fn corrupt(&self, reason: impl Into<String>) -> TdmsError {
        TdmsError::CorruptData {
            channel: self.channel.name.clone(),
            reason: reason.into(),
        }
    }

    /// Read `n` values starting at the current position of the current chunk
    fn read_run(&self, block: &DataBlock, n: u64) -> Result<Values, TdmsError> {
        let data_type = self.channel.data_type;
        if block.layout == BlockLayout::Daqmx {
            return Err(self.unsupported("DAQmx raw data"));
        }
        if !data_type.is_decodable() {
            return Err(self.unsupported(format!("{data_type} values")));
        }

        let chunk_start = block.offset + self.chunk * block.chunk_size;
        match block.layout {
            BlockLayout::Contiguous => {
                let size = data_type.fixed_size().unwrap_or(0);
                let buf = self.file.read_bytes(
                    chunk_start + self.value * size,
                    n * size,
                    &self.channel.name,
                )?;
                decode_packed(data_type, &buf, block.big_endian)
            }
            BlockLayout::Interleaved { stride } => {
                let size = data_type.fixed_size().unwrap_or(0);
                let span = (n - 1) * stride + size;
                let buf = self.file.read_bytes(
                    chunk_start + self.value * stride,
                    span,
                    &self.channel.name,
                )?;
                let mut packed = Vec::with_capacity((n * size) as usize);
                for i in 0..n {
                    let at = (i * stride) as usize;
                    packed.extend_from_slice(&buf[at..at + size as usize]);
                }
                decode_packed(data_type, &packed, block.big_endian)
            }
            BlockLayout::Strings { data_bytes } => {
                self.read_strings(block, chunk_start, data_bytes, n)
            }
            BlockLayout::Daqmx => Err(self.unsupported("DAQmx raw data")),
        }
    }

    /// Read strings `value..value + n` of the current chunk
    ///
    /// Only the matching slice of the offset table is read, plus the entry
    /// before it that marks where the first string starts, and then only the
    /// data bytes those entries span.
    fn read_strings(
        &self,
        block: &DataBlock,
        chunk_start: u64,
        data_bytes: u64,
        n: u64,
    ) -> Result<Values, TdmsError> {
        let first_entry = self.value.saturating_sub(1);
        let entries = self.value + n - first_entry;
        let table = self.file.read_bytes(
            chunk_start + first_entry * 4,
            entries * 4,
            &self.channel.name,
        )?;
        let ends: Vec<u64> = table
            .chunks_exact(4)
            .map(|entry| {
                u64::from(if block.big_endian {
                    BigEndian::read_u32(entry)
                } else {
                    LittleEndian::read_u32(entry)
                })
            })
            .collect();
        let (start, ends) = match ends.split_first() {
            Some((&previous, rest)) if self.value > 0 => (previous, rest),
            _ => (0, &ends[..]),
        };

        let mut previous = start;
        for &end in ends {
            if end < previous || end > data_bytes {
                return Err(self.corrupt(format!(
                    "string offset {end} outside {previous}..={data_bytes}"
                )));
            }
            previous = end;
        }

        let data = self.file.read_bytes(
            chunk_start + block.count * 4 + start,
            previous - start,
            &self.channel.name,
        )?;
        let mut strings = Vec::with_capacity(ends.len());
        let mut from = start;
        for &end in ends {
            let slice = &data[(from - start) as usize..(end - start) as usize];
            strings.push(String::from_utf8_lossy(slice).into_owned());
            from = end;
        }
        Ok(Values::String(strings))
    }
}

impl<'a, R: Read + Seek> Iterator for ChannelChunks<'a, R> {
    type Item = Result<Values, TdmsError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let channel = self.channel;
        let blocks = &channel.blocks;
        let mut out: Option<Values> = None;
        let mut needed = self.chunk_size;

        while needed > 0 {
            let Some(block) = blocks.get(self.block) else {
                break;
            };
            if self.chunk >= block.chunks {
                self.block += 1;
                self.chunk = 0;
                self.value = 0;
                continue;
            }
            if self.value >= block.count {
                self.chunk += 1;
                self.value = 0;
                continue;
            }

            let n = (block.count - self.value).min(needed);
            let run = self.read_run(block, n).and_then(|values| match out.as_mut() {
                Some(acc) => acc.append(values),
                None => {
                    out = Some(values);
                    Ok(())
                }
            });
            if let Err(e) = run {
                self.done = true;
                return Some(Err(e));
            }
            self.value += n;
            needed -= n;
        }

        match out {
            Some(values) => Some(Ok(values)),
            None => {
                self.done = true;
                None
            }
        }
    }
}
