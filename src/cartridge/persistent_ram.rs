use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::Result;
use log::{debug, info};

pub const RAM_BANK_SIZE: usize = 0x2000;

pub type RamBank = [u8; RAM_BANK_SIZE];

enum Backing {
    File(File),
    Memory(Vec<u8>),
}

/// External cartridge RAM in its stored form: `banks * 8 KB`, bank `n` at offset `n * 8192`.
/// The cartridge keeps one bank mapped at a time and moves banks in and out through
/// [`PersistentRam::load_bank`] and [`PersistentRam::flush_bank`].
pub struct PersistentRam {
    banks: usize,
    backing: Backing,
}

impl PersistentRam {
    /// Opens (or creates) the save file at `path`, growing it to hold every bank.
    pub fn open(path: &Path, banks: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let size = (banks * RAM_BANK_SIZE) as u64;
        if file.metadata()?.len() < size {
            file.set_len(size)?;
        }
        info!("Using {} for {} bank(s) of cartridge RAM", path.display(), banks);

        Ok(Self {
            banks,
            backing: Backing::File(file),
        })
    }

    /// RAM that lives only as long as the session.
    pub fn in_memory(banks: usize) -> Self {
        Self {
            banks,
            backing: Backing::Memory(vec![0; banks * RAM_BANK_SIZE]),
        }
    }

    pub fn banks(&self) -> usize {
        self.banks
    }

    pub fn is_file_backed(&self) -> bool {
        matches!(self.backing, Backing::File(_))
    }

    /// Copies bank `bank` into `buffer`. Banks past the end read as zero.
    pub fn load_bank(&mut self, bank: usize, buffer: &mut RamBank) -> Result<()> {
        if bank >= self.banks {
            buffer.fill(0);
            return Ok(());
        }

        debug!("Loading RAM bank {bank}");
        let offset = bank * RAM_BANK_SIZE;
        match &mut self.backing {
            Backing::File(file) => {
                file.seek(SeekFrom::Start(offset as u64))?;
                file.read_exact(buffer)?;
            }
            Backing::Memory(data) => buffer.copy_from_slice(&data[offset..offset + RAM_BANK_SIZE]),
        }
        Ok(())
    }

    /// Writes `buffer` back as bank `bank`.
    pub fn flush_bank(&mut self, bank: usize, buffer: &RamBank) -> Result<()> {
        if bank >= self.banks {
            return Ok(());
        }

        debug!("Flushing RAM bank {bank}");
        let offset = bank * RAM_BANK_SIZE;
        match &mut self.backing {
            Backing::File(file) => {
                file.seek(SeekFrom::Start(offset as u64))?;
                file.write_all(buffer)?;
                file.flush()?;
            }
            Backing::Memory(data) => data[offset..offset + RAM_BANK_SIZE].copy_from_slice(buffer),
        }
        Ok(())
    }
}
