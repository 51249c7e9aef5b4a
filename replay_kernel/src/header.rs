//! Finalized record log header.
//!
//!   [signature u32][version u32]
//!   [subtitles u8]
//!   [record_count u32][time_count u32]
//!   [source_count u32] then per source [len u32][name bytes][seed u32]
//!
//! The entries follow the header directly; the time log is a separate
//! file with no header at all.

use std::io::{self, Read, Write};

use crate::codec::{CodecError, Result};
use crate::ledger::{RandomSourceRecord, SeedLedger};
use crate::wire::*;
use crate::{RECORD_SIGNATURE, RECORD_VERSION};

/// Everything written before the first log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogHeader {
    pub version: u32,
    /// Configuration snapshot taken when recording started.
    pub subtitles: bool,
    pub record_count: u32,
    pub time_count: u32,
    pub ledger: SeedLedger,
}

impl LogHeader {
    pub fn new(subtitles: bool, record_count: u32, time_count: u32, ledger: SeedLedger) -> Self {
        Self {
            version: RECORD_VERSION,
            subtitles,
            record_count,
            time_count,
            ledger,
        }
    }

    /// Write signature, version and the rest of the header.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        write_u32_le(out, RECORD_SIGNATURE)?;
        write_u32_le(out, self.version)?;
        write_u8(out, u8::from(self.subtitles))?;
        write_u32_le(out, self.record_count)?;
        write_u32_le(out, self.time_count)?;

        let records = self.ledger.records();
        write_u32_le(out, records.len() as u32)?;
        for rec in records {
            write_u32_le(out, rec.name.len() as u32)?;
            out.write_all(rec.name.as_bytes())?;
            write_u32_le(out, rec.seed)?;
        }
        Ok(())
    }

    /// Read and validate a header. A wrong signature is rejected before
    /// anything else is read; the version is returned as found.
    pub fn read_from<R: Read + ?Sized>(input: &mut R) -> Result<Self> {
        let signature = read_u32_le(input)?;
        if signature != RECORD_SIGNATURE {
            return Err(CodecError::BadSignature { found: signature });
        }
        let version = read_u32_le(input)?;
        let subtitles = read_u8(input)? != 0;
        let record_count = read_u32_le(input)?;
        let time_count = read_u32_le(input)?;

        let source_count = read_u32_le(input)?;
        let mut records = Vec::new();
        for _ in 0..source_count {
            let len = read_u32_le(input)?;
            // Grow with the data actually present, not with `len`.
            let mut name = Vec::new();
            Read::take(&mut *input, u64::from(len)).read_to_end(&mut name)?;
            if name.len() as u64 != u64::from(len) {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
            let seed = read_u32_le(input)?;
            records.push(RandomSourceRecord {
                name: String::from_utf8_lossy(&name).into_owned(),
                seed,
            });
        }

        Ok(Self {
            version,
            subtitles,
            record_count,
            time_count,
            ledger: SeedLedger::from_records(records),
        })
    }
}
