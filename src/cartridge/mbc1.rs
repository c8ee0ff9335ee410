use log::trace;

use crate::component::Address;

use super::{MbcType, MemoryBankController, RamWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mbc1Mode {
    /// The 0x4000 window supplies the upper ROM bank bits.
    Rom,
    /// The 0x4000 window selects the RAM bank.
    Ram,
}

#[derive(Debug)]
pub struct Mbc1 {
    ram_enable: bool,
    /// Lower five ROM bank bits. Never 0.
    bank_register_1: u8,
    /// Upper two ROM bank bits, used in ROM mode.
    bank_register_2: u8,
    ram_bank_register: u8,
    mode: Mbc1Mode,
}

impl Default for Mbc1 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mbc1 {
    pub fn new() -> Self {
        Self {
            ram_enable: false,
            bank_register_1: 1,
            bank_register_2: 0,
            ram_bank_register: 0,
            mode: Mbc1Mode::Rom,
        }
    }
}

impl MemoryBankController for Mbc1 {
    fn write_register(&mut self, address: Address, value: u8) {
        match address {
            0x0000..=0x1fff => self.ram_enable = value & 0xf == 0xa,
            0x2000..=0x3fff => {
                // lower 5 bits, with 0 replaced by 1
                self.bank_register_1 = match value & 0x1f {
                    0 => 1,
                    bank => bank,
                };
                trace!("MBC1 bank register 1 = {:#04x}", self.bank_register_1);
            }
            0x4000..=0x5fff => match self.mode {
                Mbc1Mode::Ram => self.ram_bank_register = value & 0x3,
                Mbc1Mode::Rom => self.bank_register_2 = value & 0x3,
            },
            _ => {
                self.mode = if value & 1 == 0 {
                    Mbc1Mode::Rom
                } else {
                    Mbc1Mode::Ram
                };
                trace!("MBC1 mode {:?}", self.mode);
            }
        }
    }

    fn rom_bank(&self) -> usize {
        match self.mode {
            Mbc1Mode::Rom => usize::from(self.bank_register_2 << 5 | self.bank_register_1),
            Mbc1Mode::Ram => usize::from(self.bank_register_1),
        }
    }

    fn ram_bank(&self) -> usize {
        match self.mode {
            Mbc1Mode::Rom => 0,
            Mbc1Mode::Ram => usize::from(self.ram_bank_register),
        }
    }

    fn ram_window(&self) -> RamWindow {
        if self.ram_enable {
            RamWindow::Bank
        } else {
            RamWindow::Disabled
        }
    }

    fn get_type(&self) -> MbcType {
        MbcType::Mbc1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ram_enable_needs_a_in_low_nibble() {
        let mut mbc = Mbc1::new();
        mbc.write_register(0x0000, 0x1a);
        assert_eq!(RamWindow::Bank, mbc.ram_window());
        mbc.write_register(0x1fff, 0x0b);
        assert_eq!(RamWindow::Disabled, mbc.ram_window());
    }

    #[test]
    fn bank_zero_selects_one() {
        let mut mbc = Mbc1::new();
        mbc.write_register(0x2000, 0x00);
        assert_eq!(1, mbc.rom_bank());
        mbc.write_register(0x2000, 0xe0);
        assert_eq!(1, mbc.rom_bank());
        mbc.write_register(0x3fff, 0x1f);
        assert_eq!(0x1f, mbc.rom_bank());
    }

    #[test]
    fn upper_bits_depend_on_mode() {
        let mut mbc = Mbc1::new();
        mbc.write_register(0x2000, 0b00100);
        mbc.write_register(0x4000, 0b10);
        assert_eq!(0x44, mbc.rom_bank());
        assert_eq!(0, mbc.ram_bank());

        mbc.write_register(0x6000, 0x01);
        mbc.write_register(0x4000, 0b11);
        assert_eq!(3, mbc.ram_bank());
        assert_eq!(0x04, mbc.rom_bank());

        mbc.write_register(0x6000, 0x00);
        assert_eq!(0x44, mbc.rom_bank());
    }
}
