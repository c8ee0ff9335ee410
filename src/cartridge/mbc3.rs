use log::{debug, trace};

use crate::component::Address;

use super::{MbcType, MemoryBankController, RamWindow};

#[derive(Debug)]
pub struct Mbc3 {
    ram_timer_enable: bool,
    rom_bank_number: u8,
    ram_bank_number: u8,
    /// Write only register: a RAM bank (0-3) or a real-time clock register (0x08-0x0c)
    ram_rtc_select: u8,
}

impl Default for Mbc3 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mbc3 {
    pub fn new() -> Self {
        Self {
            ram_timer_enable: false,
            rom_bank_number: 1,
            ram_bank_number: 0,
            ram_rtc_select: 0,
        }
    }
}

impl MemoryBankController for Mbc3 {
    fn write_register(&mut self, address: Address, value: u8) {
        match address {
            0x0000..=0x1fff => self.ram_timer_enable = value & 0xf == 0xa,
            0x2000..=0x3fff => {
                self.rom_bank_number = match value & 0x7f {
                    0 => 1,
                    bank => bank,
                };
                trace!("MBC3 ROM bank {:#04x}", self.rom_bank_number);
            }
            0x4000..=0x5fff => {
                self.ram_rtc_select = value;
                if value <= 0x03 {
                    self.ram_bank_number = value;
                }
            }
            _ => debug!("Ignoring MBC3 clock latch write {value:#04x}"),
        }
    }

    fn rom_bank(&self) -> usize {
        usize::from(self.rom_bank_number)
    }

    fn ram_bank(&self) -> usize {
        usize::from(self.ram_bank_number)
    }

    fn ram_window(&self) -> RamWindow {
        if !self.ram_timer_enable {
            return RamWindow::Disabled;
        }
        match self.ram_rtc_select {
            0x00..=0x03 => RamWindow::Bank,
            0x08..=0x0c => RamWindow::Clock(self.ram_rtc_select),
            _ => RamWindow::Unmapped,
        }
    }

    fn get_type(&self) -> MbcType {
        MbcType::Mbc3
    }
}
