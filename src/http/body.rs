//! C8 — the body store. Small bodies live on the heap; anything past
//! `BODY_IN_FILE_THRESHOLD` spills to an anonymous temp file so a
//! handful of large uploads can't blow up resident memory. `tempfile`
//! gives us the anonymous-and-deleted-on-close semantics spec §4.8
//! wants for free.

use std::io::{self, Read, Seek, SeekFrom, Write};

use tempfile::NamedTempFile;

use crate::prelude::BODY_IN_FILE_THRESHOLD;

pub enum BodyStore {
    Empty,
    Memory(Vec<u8>),
    File(NamedTempFile),
}

impl BodyStore {
    pub fn init(expected: usize) -> io::Result<Self> {
        if expected == 0 {
            // Spec §9(a): a zero-length body is treated uniformly as
            // "no body", never as an empty memory/file store.
            return Ok(BodyStore::Empty);
        }
        if expected > BODY_IN_FILE_THRESHOLD {
            Ok(BodyStore::File(NamedTempFile::new()?))
        } else {
            Ok(BodyStore::Memory(Vec::with_capacity(expected)))
        }
    }

    pub fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            BodyStore::Empty => Ok(()),
            BodyStore::Memory(buf) => {
                buf.extend_from_slice(bytes);
                Ok(())
            }
            BodyStore::File(file) => {
                let n = file.write(bytes)?;
                if n != bytes.len() {
                    return Err(io::Error::other("short write to body temp file"));
                }
                Ok(())
            }
        }
    }

    /// Rewinds a file store to offset 0 so the dispatch handler sees it
    /// from the start, matching spec §4.8's `finalize()`.
    pub fn finalize(&mut self) -> io::Result<()> {
        if let BodyStore::File(file) = self {
            file.as_file_mut().seek(SeekFrom::Start(0))?;
        }
        Ok(())
    }

    pub fn read_to_end(&mut self) -> io::Result<Vec<u8>> {
        match self {
            BodyStore::Empty => Ok(Vec::new()),
            BodyStore::Memory(buf) => Ok(buf.clone()),
            BodyStore::File(file) => {
                let mut out = Vec::new();
                file.as_file_mut().read_to_end(&mut out)?;
                file.as_file_mut().seek(SeekFrom::Start(0))?;
                Ok(out)
            }
        }
    }

    pub fn location(&self) -> super::request::BodyLocation {
        match self {
            BodyStore::Empty => super::request::BodyLocation::None,
            BodyStore::Memory(_) => super::request::BodyLocation::Memory,
            BodyStore::File(_) => super::request::BodyLocation::File,
        }
    }
}

impl Default for BodyStore {
    fn default() -> Self {
        BodyStore::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::BodyLocation;

    #[test]
    fn zero_expected_is_the_empty_store_regardless_of_threshold() {
        let store = BodyStore::init(0).unwrap();
        assert_eq!(store.location(), BodyLocation::None);
    }

    #[test]
    fn small_bodies_land_in_memory() {
        let store = BodyStore::init(BODY_IN_FILE_THRESHOLD).unwrap();
        assert_eq!(store.location(), BodyLocation::Memory);
    }

    #[test]
    fn bodies_past_the_threshold_spill_to_a_file() {
        let store = BodyStore::init(BODY_IN_FILE_THRESHOLD + 1).unwrap();
        assert_eq!(store.location(), BodyLocation::File);
    }

    #[test]
    fn write_then_read_back_round_trips_in_memory() {
        let mut store = BodyStore::init(5).unwrap();
        store.write(b"hello").unwrap();
        store.finalize().unwrap();
        assert_eq!(store.read_to_end().unwrap(), b"hello");
    }

    #[test]
    fn write_then_read_back_round_trips_through_a_file() {
        let mut store = BodyStore::init(BODY_IN_FILE_THRESHOLD + 1).unwrap();
        store.write(b"first-").unwrap();
        store.write(b"second").unwrap();
        store.finalize().unwrap();
        assert_eq!(store.read_to_end().unwrap(), b"first-second");
    }
}
