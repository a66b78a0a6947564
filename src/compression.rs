//! Compression size accounting.
//!
//! The source size is the raw 24-bit RGB payload of the input bitmap
//! (`width * height * 3`). The compressed size is taken from the block length
//! field of the compressed file header rather than the file length:
//!
//! ```text
//! offset  size  field
//!      0     8  reserved (format / version, not interpreted)
//!      8     4  block length, little-endian u32
//! ```

use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

/// Offset of the block length field.
pub const BLOCK_LENGTH_OFFSET: u64 = 8;

/// Size of the block length field.
const BLOCK_LENGTH_SIZE: usize = 4;

/// Bytes per pixel of the canonical test bitmaps.
pub const RGB_BYTES_PER_PIXEL: u64 = 3;

/// Uncompressed and compressed size of one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompressionInfo {
    /// Raw RGB payload size in bytes.
    pub source_size: u64,
    /// Stored block length of the compressed file.
    pub compressed_size: u64,
}

impl CompressionInfo {
    /// Create a new size pair.
    ///
    /// A compressed size larger than the source is accepted; pathological
    /// inputs can expand.
    #[must_use]
    pub fn new(source_size: u64, compressed_size: u64) -> Self {
        Self {
            source_size,
            compressed_size,
        }
    }

    /// Compressed size divided by source size (lower is better).
    ///
    /// NaN or infinite when `source_size` is zero.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        self.compressed_size as f64 / self.source_size as f64
    }

    /// Measure a source bitmap and its compressed counterpart.
    pub fn measure(source: &Path, compressed: &Path) -> Result<Self> {
        Ok(Self::new(source_size(source)?, compressed_size(compressed)?))
    }
}

/// Raw RGB payload size of a bitmap, from its header dimensions.
pub fn source_size(path: &Path) -> Result<u64> {
    let (width, height) = image::image_dimensions(path).map_err(|e| Error::ImageLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(u64::from(width) * u64::from(height) * RGB_BYTES_PER_PIXEL)
}

/// Block length stored in a compressed file's header.
pub fn compressed_size(path: &Path) -> Result<u64> {
    let mut file = File::open(path)?;
    read_block_length(&mut file).map_err(|e| match e {
        Error::TruncatedHeader { got, .. } => Error::TruncatedHeader {
            path: path.to_path_buf(),
            got,
        },
        other => other,
    })
}

/// Read the block length field from the start of a compressed stream.
pub fn read_block_length<R: Read + Seek>(reader: &mut R) -> Result<u64> {
    let end = reader.seek(SeekFrom::End(0))?;
    if end < BLOCK_LENGTH_OFFSET {
        return Err(Error::TruncatedHeader {
            path: PathBuf::new(),
            got: end as usize,
        });
    }
    reader.seek(SeekFrom::Start(BLOCK_LENGTH_OFFSET))?;

    let mut buf = [0u8; BLOCK_LENGTH_SIZE];
    let got = read_fully(reader, &mut buf)?;
    if got != BLOCK_LENGTH_SIZE {
        return Err(Error::TruncatedHeader {
            path: PathBuf::new(),
            got: BLOCK_LENGTH_OFFSET as usize + got,
        });
    }

    Ok(u64::from(decode_block_length(buf)))
}

/// Interpret the stored field bytes.
///
/// The field is little-endian on disk whatever the host byte order.
#[must_use]
pub fn decode_block_length(bytes: [u8; 4]) -> u32 {
    u32::from_le_bytes(bytes)
}

/// Read until `buf` is full or the stream ends; returns bytes read.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
