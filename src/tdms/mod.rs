//! # TDMS Container Module
//!
//! Reader (and a small writer) for National Instruments TDMS files.
//!
//! ## Layout
//!
//! A TDMS file is a sequence of segments. Each segment starts with a 28-byte
//! lead-in, optionally followed by metadata (objects, raw data indices and
//! properties) and raw data. Metadata is incremental: a segment may reuse the
//! object list and data layout of the one before it.
//!
//! [`TdmsFile::open`] reads every lead-in and metadata block and builds a
//! per-channel index of data blocks. Values are read on demand through
//! [`Channel::read_chunks`], so files larger than memory can be processed.

mod decode;
mod encode;
mod error;
mod path;
mod reader;
mod segment;
mod types;


pub use encode::{ChannelData, SegmentOptions, TdmsWriter};
pub use error::TdmsError;
pub use path::ObjectPath;
pub use reader::{Channel, ChannelChunks, Group, TdmsFile};
pub use segment::{
    LEAD_IN_LEN, TOC_BIG_ENDIAN, TOC_DAQMX_RAW_DATA, TOC_INTERLEAVED_DATA, TOC_META_DATA,
    TOC_NEW_OBJ_LIST, TOC_RAW_DATA,
};
pub use types::{DataType, Property, PropertyValue, Timestamp, Values};
