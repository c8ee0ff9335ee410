pub mod mbc1;
pub mod mbc3;
pub mod persistent_ram;

use std::fmt::Display;
use std::path::Path;

use log::*;

use self::{
    mbc1::Mbc1,
    mbc3::Mbc3,
    persistent_ram::{PersistentRam, RamBank, RAM_BANK_SIZE},
};
use crate::component::{Address, Addressable};
use crate::error::{Error, Result};

pub const ROM_BANK_SIZE: usize = 0x4000;

const HEADER_END: usize = 0x150;
const TITLE_START: usize = 0x134;
const TITLE_END: usize = 0x143;
const TYPE_ADDRESS: usize = 0x147;
const ROM_SIZE_ADDRESS: usize = 0x148;
const RAM_SIZE_ADDRESS: usize = 0x149;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MbcType {
    RomOnly,
    Mbc1,
    Mbc3,
}

/// What the controller currently maps into 0xa000 - 0xbfff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamWindow {
    Disabled,
    /// The current RAM bank.
    Bank,
    /// A real-time clock register (0x08 - 0x0c).
    Clock(u8),
    /// Enabled, but the select register points at nothing.
    Unmapped,
}

/// Register logic of a bank controller. The cartridge owns the ROM and RAM contents and asks
/// the controller which banks should be visible after every register write.
pub trait MemoryBankController {
    /// Handles a write into 0x0000 - 0x7fff.
    fn write_register(&mut self, address: Address, value: u8);
    /// Requested switchable ROM bank, before wrapping to the cartridge size.
    fn rom_bank(&self) -> usize;
    fn ram_bank(&self) -> usize;
    fn ram_window(&self) -> RamWindow;
    fn get_type(&self) -> MbcType;
}

/// A Gameboy cartridge that only has a single ROM bank, with no switching.
/// Any RAM is always mapped.
#[derive(Default)]
struct NoMbc {}

impl MemoryBankController for NoMbc {
    fn write_register(&mut self, address: Address, value: u8) {
        // ignore writes to rom
        trace!("Ignoring write of {value:#04x} to rom at {address:#06x}");
    }

    fn rom_bank(&self) -> usize {
        1
    }

    fn ram_bank(&self) -> usize {
        0
    }

    fn ram_window(&self) -> RamWindow {
        RamWindow::Bank
    }

    fn get_type(&self) -> MbcType {
        MbcType::RomOnly
    }
}

/// Examines the header to get the number of 16 KB ROM banks.
fn get_rom_banks(data: &[u8]) -> Result<usize> {
    match data[ROM_SIZE_ADDRESS] {
        code @ 0..=8 => Ok(2 << code),
        code => Err(Error::UnsupportedConfiguration(format!(
            "rom size code {code:#04x}"
        ))),
    }
}

/// Examines the header to get the number of 8 KB RAM banks. A 2 KB chip still takes a bank.
fn get_ram_banks(data: &[u8]) -> Result<usize> {
    match data[RAM_SIZE_ADDRESS] {
        0 => Ok(0),
        1 | 2 => Ok(1),
        3 => Ok(4),
        4 => Ok(16),
        5 => Ok(8),
        code => Err(Error::UnsupportedConfiguration(format!(
            "ram size code {code:#04x}"
        ))),
    }
}

/// Reads bytes 0x134 ..= 0x143 into a string
fn get_title(data: &[u8]) -> String {
    let title = &data[TITLE_START..=TITLE_END];
    let end = title.iter().position(|&b| b == 0).unwrap_or(title.len());
    String::from_utf8_lossy(&title[..end]).trim_end().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeType {
    pub mbc_type: MbcType,
    pub code: u8,
    pub has_ram: bool,
    pub has_battery: bool,
    pub has_timer: bool,
    pub rom_banks: usize,
    pub ram_banks: usize,
    pub title: String,
}

impl CartridgeType {
    pub fn from_data(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_END {
            return Err(Error::UnsupportedConfiguration(format!(
                "image of {} bytes has no complete header",
                data.len()
            )));
        }

        let code = data[TYPE_ADDRESS];
        debug!("cartridge type byte: {code:#04x}");
        let (mbc_type, has_ram, has_battery, has_timer) = match code {
            0x00 => (MbcType::RomOnly, false, false, false),
            0x08 => (MbcType::RomOnly, true, false, false),
            0x09 => (MbcType::RomOnly, true, true, false),
            0x01 => (MbcType::Mbc1, false, false, false),
            0x02 => (MbcType::Mbc1, true, false, false),
            0x03 => (MbcType::Mbc1, true, true, false),
            0x0f => (MbcType::Mbc3, false, true, true),
            0x10 => (MbcType::Mbc3, true, true, true),
            0x11 => (MbcType::Mbc3, false, false, false),
            0x12 => (MbcType::Mbc3, true, false, false),
            0x13 => (MbcType::Mbc3, true, true, false),
            code => return Err(Error::UnsupportedCartridge { code }),
        };

        let rom_banks = get_rom_banks(data)?;
        if data.len() > rom_banks * ROM_BANK_SIZE {
            return Err(Error::UnsupportedConfiguration(format!(
                "image of {} bytes is larger than the {} rom banks in its header",
                data.len(),
                rom_banks
            )));
        }

        let declared_ram_banks = get_ram_banks(data)?;
        let ram_banks = if has_ram { declared_ram_banks } else { 0 };
        if !has_ram && declared_ram_banks != 0 {
            warn!("Header declares {declared_ram_banks} ram bank(s) on a cartridge without ram");
        }
        if mbc_type == MbcType::Mbc1 && ram_banks > 4 {
            return Err(Error::UnsupportedConfiguration(format!(
                "MBC1 cannot address {ram_banks} ram banks"
            )));
        }

        Ok(CartridgeType {
            mbc_type,
            code,
            has_ram,
            has_battery,
            has_timer,
            rom_banks,
            ram_banks,
            title: get_title(data),
        })
    }

    fn build_mbc(&self) -> Box<dyn MemoryBankController + Send> {
        match self.mbc_type {
            MbcType::RomOnly => Box::new(NoMbc {}),
            MbcType::Mbc1 => Box::new(Mbc1::new()),
            MbcType::Mbc3 => Box::new(Mbc3::new()),
        }
    }
}

impl Display for CartridgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "\"{}\" type {:#04x} ({:?}), {} rom bank(s), {} ram bank(s)",
            self.title, self.code, self.mbc_type, self.rom_banks, self.ram_banks
        )?;
        if self.has_battery {
            write!(f, ", battery")?;
        }
        if self.has_timer {
            write!(f, ", timer")?;
        }
        Ok(())
    }
}

pub struct Cartridge {
    cartridge_type: CartridgeType,
    mbc: Box<dyn MemoryBankController + Send>,
    /// The whole image, padded to the declared size.
    rom: Vec<u8>,
    /// Copy of the bank visible at 0x4000 - 0x7fff.
    rom_window: Box<[u8; ROM_BANK_SIZE]>,
    rom_bank: usize,
    /// Copy of the bank visible at 0xa000 - 0xbfff.
    ram_window: Box<RamBank>,
    ram_bank: usize,
    ram: PersistentRam,
}

impl Cartridge {
    /// A cartridge whose RAM lives only in memory.
    pub fn from_data(data: &[u8]) -> Result<Cartridge> {
        let cartridge_type = CartridgeType::from_data(data)?;
        let ram = PersistentRam::in_memory(cartridge_type.ram_banks);
        Cartridge::build(cartridge_type, data, ram)
    }

    /// A cartridge whose battery-backed RAM is mirrored to `save_path`.
    /// Cartridges without a battery ignore the path.
    pub fn from_data_with_save_file(data: &[u8], save_path: &Path) -> Result<Cartridge> {
        let cartridge_type = CartridgeType::from_data(data)?;
        let ram = if cartridge_type.has_battery && cartridge_type.ram_banks > 0 {
            PersistentRam::open(save_path, cartridge_type.ram_banks)?
        } else {
            PersistentRam::in_memory(cartridge_type.ram_banks)
        };
        Cartridge::build(cartridge_type, data, ram)
    }

    fn build(
        cartridge_type: CartridgeType,
        data: &[u8],
        mut ram: PersistentRam,
    ) -> Result<Cartridge> {
        info!("Loaded cartridge {cartridge_type}");

        let mut rom = data.to_vec();
        rom.resize(cartridge_type.rom_banks * ROM_BANK_SIZE, 0);

        let mut rom_window = Box::new([0; ROM_BANK_SIZE]);
        rom_window.copy_from_slice(&rom[ROM_BANK_SIZE..2 * ROM_BANK_SIZE]);

        let mut ram_window = Box::new([0; RAM_BANK_SIZE]);
        ram.load_bank(0, &mut ram_window)?;

        Ok(Cartridge {
            mbc: cartridge_type.build_mbc(),
            cartridge_type,
            rom,
            rom_window,
            rom_bank: 1,
            ram_window,
            ram_bank: 0,
            ram,
        })
    }

    pub fn cartridge_type(&self) -> &CartridgeType {
        &self.cartridge_type
    }

    pub fn rom_bank(&self) -> usize {
        self.rom_bank
    }

    pub fn ram_bank(&self) -> usize {
        self.ram_bank
    }

    /// Writes the mapped RAM bank back to its backing store.
    pub fn flush(&mut self) -> Result<()> {
        self.ram.flush_bank(self.ram_bank, &self.ram_window)
    }

    fn has_ram(&self) -> bool {
        self.cartridge_type.has_ram && self.ram.banks() > 0
    }

    fn write_register(&mut self, address: Address, value: u8) -> Result<()> {
        let was_enabled = self.mbc.ram_window() != RamWindow::Disabled;
        self.mbc.write_register(address, value);

        if was_enabled
            && self.mbc.ram_window() == RamWindow::Disabled
            && self.cartridge_type.has_battery
            && self.has_ram()
        {
            debug!("RAM disabled, flushing bank {}", self.ram_bank);
            self.flush()?;
        }

        self.sync_rom_window();
        self.sync_ram_window()
    }

    /// Maps the bank the controller asks for, wrapped to the cartridge size.
    fn sync_rom_window(&mut self) {
        let bank = match self.mbc.rom_bank() % self.cartridge_type.rom_banks {
            0 => 1,
            bank => bank,
        };
        if bank != self.rom_bank {
            trace!("Switching to rom bank {bank}");
            let start = bank * ROM_BANK_SIZE;
            self.rom_window
                .copy_from_slice(&self.rom[start..start + ROM_BANK_SIZE]);
            self.rom_bank = bank;
        }
    }

    fn sync_ram_window(&mut self) -> Result<()> {
        if !self.has_ram() {
            return Ok(());
        }
        let bank = self.mbc.ram_bank() % self.ram.banks();
        if bank != self.ram_bank {
            trace!("Switching from ram bank {} to {bank}", self.ram_bank);
            self.ram.flush_bank(self.ram_bank, &self.ram_window)?;
            self.ram.load_bank(bank, &mut self.ram_window)?;
            self.ram_bank = bank;
        }
        Ok(())
    }

    /// Index into the RAM window, or `None` when nothing is mapped there.
    fn ram_offset(&self, address: Address) -> Result<Option<usize>> {
        if !self.has_ram() {
            return Ok(None);
        }
        match self.mbc.ram_window() {
            RamWindow::Bank => Ok(Some(usize::from(address - 0xa000))),
            RamWindow::Clock(register) => Err(Error::unsupported_feature(format!(
                "real-time clock register {register:#04x}"
            ))),
            RamWindow::Disabled | RamWindow::Unmapped => Ok(None),
        }
    }
}

impl Addressable for Cartridge {
    fn read_u8(&mut self, address: Address) -> Result<u8> {
        match address {
            0x0000..=0x3fff => Ok(self.rom[usize::from(address)]),
            0x4000..=0x7fff => Ok(self.rom_window[usize::from(address - 0x4000)]),
            0xa000..=0xbfff => Ok(match self.ram_offset(address)? {
                Some(offset) => self.ram_window[offset],
                None => 0xff,
            }),
            _ => Err(Error::from_message(format!(
                "cartridge read at {address:#06x}"
            ))),
        }
    }

    fn write_u8(&mut self, address: Address, value: u8) -> Result<()> {
        match address {
            0x0000..=0x7fff => self.write_register(address, value),
            0xa000..=0xbfff => {
                if let Some(offset) = self.ram_offset(address)? {
                    self.ram_window[offset] = value;
                }
                Ok(())
            }
            _ => Err(Error::from_message(format!(
                "cartridge write at {address:#06x}"
            ))),
        }
    }
}

impl std::fmt::Debug for Cartridge {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{:?}", self.mbc.get_type())
    }
}

impl Display for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cartridge_type)
    }
}
