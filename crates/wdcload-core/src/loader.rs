//! Moving memory images between files and the board
//!
//! Loads stream a file through its decoder and issue one memory write per
//! record. Saves read the whole region with a single memory read and hand the
//! bytes to the encoder. A load that fails midway leaves the records already
//! written in board memory.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::format::raw::RawChunks;
use crate::format::srec::{self, SrecReader};
use crate::format::wdc::{self, WdcReader};
use crate::format::{LoadFormat, Record, SaveFormat};
use crate::link::Transport;
use crate::protocol::{read_memory, write_memory};

/// Totals of a finished transfer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferSummary {
    /// Payload bytes moved
    pub bytes: usize,
    /// Records (memory writes for loads, file records for saves)
    pub records: usize,
}

/// Callback for progress reporting during transfers
pub trait TransferProgress {
    /// Called before the first record; `total_bytes` is known for saves only
    fn start(&mut self, total_bytes: Option<usize>);

    /// Called after each record
    fn record(&mut self, address: u32, bytes: usize);

    /// Called when the transfer is complete
    fn complete(&mut self, summary: &TransferSummary);
}

/// A no-op progress reporter
pub struct NoProgress;

impl TransferProgress for NoProgress {
    fn start(&mut self, _total_bytes: Option<usize>) {}
    fn record(&mut self, _address: u32, _bytes: usize) {}
    fn complete(&mut self, _summary: &TransferSummary) {}
}

/// Write every record from `records` to board memory, in order
pub fn load_records<T, I, P>(transport: &mut T, records: I, progress: &mut P) -> Result<TransferSummary>
where
    T: Transport + ?Sized,
    I: IntoIterator<Item = Result<Record>>,
    P: TransferProgress + ?Sized,
{
    let mut summary = TransferSummary::default();
    progress.start(None);

    for rec in records {
        let rec = rec?;
        log::debug!(
            "Writing record of size {} at address 0x{:06X}",
            rec.data.len(),
            rec.address
        );
        write_memory(transport, rec.address, &rec.data)?;

        summary.bytes += rec.data.len();
        summary.records += 1;
        progress.record(rec.address, summary.bytes);
    }

    progress.complete(&summary);
    Ok(summary)
}

/// Load an S-record file
pub fn load_srec<T, P>(transport: &mut T, path: &Path, progress: &mut P) -> Result<TransferSummary>
where
    T: Transport + ?Sized,
    P: TransferProgress + ?Sized,
{
    let reader = SrecReader::new(BufReader::new(File::open(path)?));
    load_records(
        transport,
        reader.map(|rec| {
            rec.map(|rec| {
                log::debug!(
                    "Loading {:?} record of size {} at address 0x{:06X} ...",
                    rec.kind,
                    rec.data.len(),
                    rec.address
                );
                Record::from(rec)
            })
        }),
        progress,
    )
}

/// Load a WDC binary file
pub fn load_wdc<T, P>(transport: &mut T, path: &Path, progress: &mut P) -> Result<TransferSummary>
where
    T: Transport + ?Sized,
    P: TransferProgress + ?Sized,
{
    let reader = WdcReader::new(BufReader::new(File::open(path)?))?;
    load_records(transport, reader, progress)
}

/// Load a raw binary file at `address`, 64 bytes per write
pub fn load_raw<T, P>(
    transport: &mut T,
    address: u32,
    path: &Path,
    progress: &mut P,
) -> Result<TransferSummary>
where
    T: Transport + ?Sized,
    P: TransferProgress + ?Sized,
{
    let chunks = RawChunks::new(BufReader::new(File::open(path)?), address);
    load_records(transport, chunks, progress)
}

/// Load a file in the given format
pub fn load_file<T, P>(
    transport: &mut T,
    format: LoadFormat,
    path: &Path,
    progress: &mut P,
) -> Result<TransferSummary>
where
    T: Transport + ?Sized,
    P: TransferProgress + ?Sized,
{
    log::info!("Loading {} file {} ...", format, path.display());
    let summary = match format {
        LoadFormat::Srec => load_srec(transport, path, progress)?,
        LoadFormat::Wdc => load_wdc(transport, path, progress)?,
        LoadFormat::Raw { address } => load_raw(transport, address, path, progress)?,
    };
    log::info!("Loaded {} bytes from {}.", summary.bytes, path.display());
    Ok(summary)
}

/// Save `data` read from `address` as S2 records
pub fn save_records(address: u32, data: &[u8], path: &Path) -> Result<usize> {
    let mut writer = BufWriter::new(File::create(path)?);
    let records = srec::write_records(&mut writer, address, data)?;
    writer.flush()?;
    Ok(records)
}

/// Save `data` read from `address` as a single-record WDC binary
pub fn save_binary(address: u32, data: &[u8], path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    wdc::write_single(&mut writer, address, data)?;
    writer.flush()?;
    Ok(())
}

/// Read `length` bytes at `address` from the board and save them
pub fn save_file<T, P>(
    transport: &mut T,
    format: SaveFormat,
    address: u32,
    length: usize,
    path: &Path,
    progress: &mut P,
) -> Result<TransferSummary>
where
    T: Transport + ?Sized,
    P: TransferProgress + ?Sized,
{
    log::info!(
        "Saving {} bytes from address 0x{:06X} in {} file {} ...",
        length,
        address,
        format,
        path.display()
    );
    progress.start(Some(length));

    let data = read_memory(transport, address, length)?;
    progress.record(address, data.len());

    let records = match format {
        SaveFormat::Srec => save_records(address, &data, path)?,
        SaveFormat::Wdc => {
            save_binary(address, &data, path)?;
            1
        }
    };

    let summary = TransferSummary {
        bytes: data.len(),
        records,
    };
    progress.complete(&summary);
    log::info!("Saved {} bytes to {}.", summary.bytes, path.display());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, FormatError};
    use crate::protocol::SYNC_ACK;
    use crate::testing::ScriptedLink;

    struct Counting {
        started: usize,
        records: Vec<(u32, usize)>,
        completed: Option<TransferSummary>,
    }

    impl TransferProgress for Counting {
        fn start(&mut self, _total_bytes: Option<usize>) {
            self.started += 1;
        }
        fn record(&mut self, address: u32, bytes: usize) {
            self.records.push((address, bytes));
        }
        fn complete(&mut self, summary: &TransferSummary) {
            self.completed = Some(*summary);
        }
    }

    #[test]
    fn test_load_records_one_write_per_record() {
        let mut link = ScriptedLink::new(&[SYNC_ACK, SYNC_ACK]);
        let mut progress = Counting {
            started: 0,
            records: Vec::new(),
            completed: None,
        };
        let records = vec![
            Ok(Record::new(0x1000, vec![0xAA])),
            Ok(Record::new(0x2000, vec![0xBB, 0xCC])),
        ];

        let summary = load_records(&mut link, records, &mut progress).unwrap();
        assert_eq!(summary, TransferSummary { bytes: 3, records: 2 });
        assert_eq!(progress.started, 1);
        assert_eq!(progress.records, vec![(0x1000, 1), (0x2000, 3)]);
        assert_eq!(progress.completed, Some(summary));
        assert_eq!(
            link.written,
            vec![
                0x55, 0xAA, 0x02, 0x00, 0x10, 0x00, 0x01, 0x00, 0xAA, //
                0x55, 0xAA, 0x02, 0x00, 0x20, 0x00, 0x02, 0x00, 0xBB, 0xCC,
            ]
        );
    }

    #[test]
    fn test_load_records_stops_at_first_error() {
        let mut link = ScriptedLink::new(&[SYNC_ACK, SYNC_ACK]);
        let records = vec![
            Ok(Record::new(0x1000, vec![0xAA])),
            Err(FormatError::BadMagic.into()),
            Ok(Record::new(0x2000, vec![0xBB])),
        ];

        let err = load_records(&mut link, records, &mut NoProgress).unwrap_err();
        assert!(matches!(err, Error::Format(FormatError::BadMagic)));
        // The first record stays written
        assert_eq!(link.written.len(), 9);
    }
}
