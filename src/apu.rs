//! Audio processing unit. No sound is synthesised; the block stores what the program writes and
//! reads it back through the hardware's per-register masks.

use crate::component::{Address, Addressable, ElapsedTime, Peripheral};
use crate::error::{Error, Result};
use log::debug;

const REGISTERS_START: Address = 0xff10;
const REGISTERS_END: Address = 0xff2f;
const WAVE_START: Address = 0xff30;
const WAVE_END: Address = 0xff3f;

/// Bits that always read back as 1, for FF10 through FF2F. Unused offsets are 0xff.
#[rustfmt::skip]
const READ_MASKS: [u8; 0x20] = [
    // NR10  NR11  NR12  NR13  NR14
    0x80, 0x3f, 0x00, 0xff, 0xbf,
    // ----  NR21  NR22  NR23  NR24
    0xff, 0x3f, 0x00, 0xff, 0xbf,
    // NR30  NR31  NR32  NR33  NR34
    0x7f, 0xff, 0x9f, 0xff, 0xbf,
    // ----  NR41  NR42  NR43  NR44
    0xff, 0xff, 0x00, 0x00, 0xbf,
    // NR50  NR51  NR52
    0x00, 0x00, 0x70,
    // FF27 - FF2F
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
];

/// Offsets with no register behind them.
fn is_unused(address: Address) -> bool {
    matches!(address, 0xff15 | 0xff1f | 0xff27..=0xff2f)
}

pub struct Apu {
    registers: [u8; 0x20],
    wave_table: [u8; 0x10],
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

impl Apu {
    pub fn new() -> Self {
        Self {
            registers: [0; 0x20],
            wave_table: [0; 0x10],
        }
    }

    /// Register contents as the boot ROM leaves them.
    pub fn new_post_boot() -> Self {
        let mut apu = Self::new();
        for (address, value) in [
            (0xff10, 0x80),
            (0xff11, 0xbf),
            (0xff12, 0xf3),
            (0xff14, 0xbf),
            (0xff16, 0x3f),
            (0xff19, 0xbf),
            (0xff1a, 0x7f),
            (0xff1b, 0xff),
            (0xff1c, 0x9f),
            (0xff1e, 0xbf),
            (0xff20, 0xff),
            (0xff23, 0xbf),
            (0xff24, 0x77),
            (0xff25, 0xf3),
            (0xff26, 0xf1),
        ] {
            apu.registers[usize::from(address - REGISTERS_START)] = value;
        }
        apu
    }
}

impl Addressable for Apu {
    fn read_u8(&mut self, address: Address) -> Result<u8> {
        match address {
            REGISTERS_START..=REGISTERS_END => {
                let index = usize::from(address - REGISTERS_START);
                Ok(self.registers[index] | READ_MASKS[index])
            }
            WAVE_START..=WAVE_END => Ok(self.wave_table[usize::from(address - WAVE_START)]),
            _ => Err(Error::from_message(format!("apu read at {address:#06x}"))),
        }
    }

    fn write_u8(&mut self, address: Address, value: u8) -> Result<()> {
        match address {
            _ if is_unused(address) => {
                debug!("Ignoring write of {value:#04x} to unused sound register {address:#06x}");
            }
            REGISTERS_START..=REGISTERS_END => {
                self.registers[usize::from(address - REGISTERS_START)] = value
            }
            WAVE_START..=WAVE_END => self.wave_table[usize::from(address - WAVE_START)] = value,
            _ => return Err(Error::from_message(format!("apu write at {address:#06x}"))),
        }
        Ok(())
    }
}

impl Peripheral for Apu {
    fn advance(&mut self, _cycles: ElapsedTime) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_read_through_masks() {
        let mut apu = Apu::new();
        for address in REGISTERS_START..=0xff26 {
            if is_unused(address) {
                continue;
            }
            apu.write_u8(address, 0x00).unwrap();
        }
        let expected = [
            (0xff10, 0x80),
            (0xff11, 0x3f),
            (0xff12, 0x00),
            (0xff13, 0xff),
            (0xff14, 0xbf),
            (0xff1a, 0x7f),
            (0xff1c, 0x9f),
            (0xff20, 0xff),
            (0xff23, 0xbf),
            (0xff26, 0x70),
        ];
        for (address, value) in expected {
            assert_eq!(value, apu.read_u8(address).unwrap(), "{address:#06x}");
        }
    }

    #[test]
    fn stored_bits_survive_masks() {
        let mut apu = Apu::new();
        apu.write_u8(0xff12, 0xa5).unwrap();
        apu.write_u8(0xff11, 0x81).unwrap();
        assert_eq!(0xa5, apu.read_u8(0xff12).unwrap());
        assert_eq!(0xbf, apu.read_u8(0xff11).unwrap());
    }

    #[test]
    fn unused_offsets_ignore_writes() {
        let mut apu = Apu::new();
        apu.write_u8(0xff15, 0x00).unwrap();
        apu.write_u8(0xff2a, 0x00).unwrap();
        assert_eq!(0xff, apu.read_u8(0xff15).unwrap());
        assert_eq!(0xff, apu.read_u8(0xff2a).unwrap());
    }

    #[test]
    fn wave_table_is_plain_memory() {
        let mut apu = Apu::new();
        for (offset, address) in (WAVE_START..=WAVE_END).enumerate() {
            apu.write_u8(address, offset as u8 * 0x11).unwrap();
        }
        assert_eq!(0x00, apu.read_u8(0xff30).unwrap());
        assert_eq!(0xff, apu.read_u8(0xff3f).unwrap());
    }
}
