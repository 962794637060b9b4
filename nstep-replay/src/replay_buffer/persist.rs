//! On-disk layout of the replay memory.
//!
//! A persisted memory starts with the magic bytes `NSRB` and a little-endian
//! `u32` format version, followed by a bincode body whose layout depends on
//! the version:
//!
//! * version 0: a plain bounded deque, written by releases that kept the
//!   memory in a `VecDeque`;
//! * version 1: the indexed queue, items from the oldest to the newest.
//!
//! Both are read back into a [`RandomAccessQueue`]; only version 1 is written.
use crate::{error::ReplayBufferError, RandomAccessQueue};
use anyhow::Result;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    collections::VecDeque,
    io::{self, Read, Write},
};

const MAGIC: &[u8; 4] = b"NSRB";

/// Versions of the persisted layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatVersion {
    /// Bounded deque without indexed access.
    LegacyDeque = 0,

    /// Indexed queue.
    Indexed = 1,
}

impl FormatVersion {
    /// The version written by [`write_queue`].
    pub const CURRENT: FormatVersion = FormatVersion::Indexed;

    fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::LegacyDeque),
            1 => Some(Self::Indexed),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct IndexedQueueRef<'a, T> {
    maxlen: Option<usize>,
    items: Vec<&'a T>,
}

#[derive(Deserialize)]
struct IndexedQueue<T> {
    maxlen: Option<usize>,
    items: Vec<T>,
}

#[derive(Serialize, Deserialize)]
struct LegacyDeque<T> {
    maxlen: Option<usize>,
    items: VecDeque<T>,
}

/// Writes the queue in the current layout.
///
/// I/O errors are returned as [`std::io::Error`].
pub fn write_queue<W, T>(writer: &mut W, queue: &RandomAccessQueue<T>) -> Result<()>
where
    W: Write,
    T: Serialize,
{
    write_header(writer, FormatVersion::CURRENT)?;
    let body = IndexedQueueRef {
        maxlen: queue.maxlen(),
        items: queue.iter().collect(),
    };
    bincode::serialize_into(&mut *writer, &body).map_err(|e| match *e {
        bincode::ErrorKind::Io(e) => e.into(),
        e => anyhow::Error::new(e),
    })?;
    writer.flush()?;
    Ok(())
}

/// Reads a queue written in the current or the legacy layout.
///
/// # Errors
///
/// Returns [`ReplayBufferError::UnknownFormat`] if the data is not a persisted
/// memory, has an unknown version or is truncated. Other I/O errors are returned
/// as [`std::io::Error`].
pub fn read_queue<R, T>(reader: &mut R) -> Result<RandomAccessQueue<T>>
where
    R: Read,
    T: DeserializeOwned,
{
    let mut header = [0u8; 8];
    reader.read_exact(&mut header).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => unknown_format("data too short for a header"),
        _ => e.into(),
    })?;
    if &header[..4] != MAGIC {
        return Err(unknown_format("bad magic bytes"));
    }
    let mut version = [0u8; 4];
    version.copy_from_slice(&header[4..]);
    let version = u32::from_le_bytes(version);

    match FormatVersion::from_u32(version) {
        Some(FormatVersion::Indexed) => {
            let body: IndexedQueue<T> = read_body(reader)?;
            Ok(RandomAccessQueue::from_iter_with_maxlen(
                body.items,
                body.maxlen,
            ))
        }
        Some(FormatVersion::LegacyDeque) => {
            let body: LegacyDeque<T> = read_body(reader)?;
            info!(
                "Upgrade legacy replay memory of {} items into an indexed queue",
                body.items.len()
            );
            Ok(RandomAccessQueue::from_iter_with_maxlen(
                body.items,
                body.maxlen,
            ))
        }
        None => Err(unknown_format(&format!("unsupported version {}", version))),
    }
}

fn write_header<W: Write>(writer: &mut W, version: FormatVersion) -> io::Result<()> {
    writer.write_all(MAGIC)?;
    writer.write_all(&(version as u32).to_le_bytes())
}

fn read_body<R: Read, B: DeserializeOwned>(reader: &mut R) -> Result<B> {
    // Decoding from a slice checks every length prefix against the bytes left,
    // so a corrupt prefix cannot trigger a huge allocation.
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    bincode::deserialize(&bytes).map_err(|e| unknown_format(&e.to_string()))
}

fn unknown_format(msg: &str) -> anyhow::Error {
    ReplayBufferError::UnknownFormat(msg.to_string()).into()
}

/// Writes the queue as a version 0 bounded deque.
#[cfg(test)]
pub(crate) fn write_legacy_queue<W, T>(writer: &mut W, items: VecDeque<T>, maxlen: Option<usize>) -> Result<()>
where
    W: Write,
    T: Serialize,
{
    write_header(writer, FormatVersion::LegacyDeque)?;
    bincode::serialize_into(&mut *writer, &LegacyDeque { maxlen, items })?;
    Ok(())
}
