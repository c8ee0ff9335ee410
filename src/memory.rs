/*!
 * The memory bus holds ownership of the non-cpu components of the gameboy.
 * This structure makes it easy to delegate reads/writes to the corresponding memory-mapped component.
 */

use crate::apu::Apu;
use crate::cartridge::Cartridge;
use crate::component::{Address, Addressable, ElapsedTime};
use crate::error::{Error, Result};
use crate::interrupt::{Interrupt, InterruptController};
use crate::joypad::Joypad;
use crate::ppu::{Ppu, OAM_SIZE};
use crate::timer::Timer;
use log::{debug, trace, warn};

pub const BOOT_ROM_SIZE: usize = 0x100;
const WRAM_SIZE: usize = 0x2000;
const HRAM_SIZE: usize = 0x7f;

const SERIAL_TRANSFER_START: u8 = 0x81;
/// M-cycles the CPU loses to an OAM DMA transfer.
const DMA_STALL_CYCLES: ElapsedTime = 160;

pub struct MemoryBus {
    pub(crate) cartridge: Option<Cartridge>,
    pub(crate) ppu: Ppu,
    pub(crate) apu: Apu,
    pub(crate) joypad: Joypad,
    pub(crate) timer: Timer,
    pub(crate) interrupts: InterruptController,

    /// Shadows 0x0000 - 0x00ff until a nonzero write to 0xff50.
    boot_rom: Option<Box<[u8; BOOT_ROM_SIZE]>>,
    wram: Box<[u8; WRAM_SIZE]>,
    hram: [u8; HRAM_SIZE],

    serial_data: u8,
    serial_control: u8,
    serial_output: Vec<u8>,

    stall_cycles: ElapsedTime,
}

impl MemoryBus {
    /// A bus with peripherals in their post-boot state.
    pub fn new(cartridge: Option<Cartridge>) -> Self {
        Self::with_peripherals(cartridge, Ppu::new(), Apu::new_post_boot(), Timer::new())
    }

    /// A bus at power-on, meant to run a boot ROM loaded with [`MemoryBus::load_boot_rom`].
    pub fn new_at_reset(cartridge: Option<Cartridge>) -> Self {
        Self::with_peripherals(cartridge, Ppu::new_at_reset(), Apu::new(), Timer::new_at_reset())
    }

    fn with_peripherals(cartridge: Option<Cartridge>, ppu: Ppu, apu: Apu, timer: Timer) -> Self {
        Self {
            cartridge,
            ppu,
            apu,
            joypad: Joypad::new(),
            timer,
            interrupts: InterruptController::new(),
            boot_rom: None,
            wram: Box::new([0; WRAM_SIZE]),
            hram: [0; HRAM_SIZE],
            serial_data: 0,
            serial_control: 0,
            serial_output: Vec::new(),
            stall_cycles: 0,
        }
    }

    /// Maps a 256 byte boot ROM over the bottom of the cartridge.
    pub fn load_boot_rom(&mut self, data: &[u8]) -> Result<()> {
        let boot_rom: [u8; BOOT_ROM_SIZE] = data.try_into().map_err(|_| {
            Error::UnsupportedConfiguration(format!(
                "boot rom must be {BOOT_ROM_SIZE} bytes, got {}",
                data.len()
            ))
        })?;
        self.boot_rom = Some(Box::new(boot_rom));
        Ok(())
    }

    pub fn boot_rom_active(&self) -> bool {
        self.boot_rom.is_some()
    }

    pub fn cartridge_mut(&mut self) -> Option<&mut Cartridge> {
        self.cartridge.as_mut()
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    /// Cycles the last instruction spent stalled, cleared on read.
    pub fn take_stall_cycles(&mut self) -> ElapsedTime {
        std::mem::take(&mut self.stall_cycles)
    }

    /// Bytes sent over the serial port since the last call.
    pub fn take_serial_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.serial_output)
    }

    // Initiate an OAM transfer
    fn oam_transfer(&mut self, value: u8) -> Result<()> {
        let read_base_address = Address::from(value) << 8;
        let mut data = [0; OAM_SIZE];

        for (offset, byte) in data.iter_mut().enumerate() {
            *byte = self.read_u8(read_base_address + offset as Address)?;
        }

        self.ppu.oam_transfer(&data);
        self.stall_cycles += DMA_STALL_CYCLES;
        Ok(())
    }

    /// There is no link partner, so a transfer started with the internal clock completes at once.
    fn write_serial_control(&mut self, value: u8) {
        if value == SERIAL_TRANSFER_START {
            trace!("Serial out {:#04x}", self.serial_data);
            self.serial_output.push(self.serial_data);
            self.serial_control = value & 0x7f;
            self.interrupts.request(Interrupt::Serial);
        } else {
            self.serial_control = value;
        }
    }

    fn read_cartridge(&mut self, address: Address) -> Result<u8> {
        match self.cartridge.as_mut() {
            Some(cartridge) => cartridge.read_u8(address),
            None => Ok(0xff),
        }
    }

    fn write_cartridge(&mut self, address: Address, value: u8) -> Result<()> {
        match self.cartridge.as_mut() {
            Some(cartridge) => cartridge.write_u8(address, value),
            None => Ok(()),
        }
    }
}

impl Addressable for MemoryBus {
    fn read_u8(&mut self, address: Address) -> Result<u8> {
        match address {
            0..=0xff if self.boot_rom.is_some() => Ok(self
                .boot_rom
                .as_ref()
                .map_or(0xff, |boot_rom| boot_rom[usize::from(address)])),
            0..=0x7fff => self.read_cartridge(address),
            0x8000..=0x9fff => self.ppu.read_u8(address),
            // Cartridge RAM
            0xa000..=0xbfff => self.read_cartridge(address),
            0xc000..=0xdfff => Ok(self.wram[usize::from(address - 0xc000)]),
            // Echo RAM
            0xe000..=0xfdff => Ok(self.wram[usize::from(address - 0xe000)]),
            // OAM
            0xfe00..=0xfe9f => self.ppu.read_u8(address),
            0xfea0..=0xfeff => {
                warn!("Read from unusable memory at {address:#06x}");
                Ok(0xff)
            }
            // Joypad
            0xff00 => Ok(self.joypad.read()),
            0xff01 => Ok(self.serial_data),
            0xff02 => Ok(0x7e | self.serial_control),
            0xff04..=0xff07 => self.timer.read_u8(address),
            // IF register always has top 3 bits high
            0xff0f => Ok(self.interrupts.read_flags()),
            0xff10..=0xff3f => self.apu.read_u8(address),
            // PPU mappings
            0xff40..=0xff45 | 0xff47..=0xff4b => self.ppu.read_u8(address),
            0xff80..=0xfffe => Ok(self.hram[usize::from(address - 0xff80)]),
            0xffff => Ok(self.interrupts.read_enable()),
            // FF46 and FF50 are write-only
            _ => {
                warn!("Read from unmapped register {address:#06x}");
                Ok(0xff)
            }
        }
    }

    fn write_u8(&mut self, address: Address, value: u8) -> Result<()> {
        match address {
            0..=0x7fff => self.write_cartridge(address, value)?,
            0x8000..=0x9fff => self.ppu.write_u8(address, value)?,
            // Cartridge RAM
            0xa000..=0xbfff => self.write_cartridge(address, value)?,
            0xc000..=0xdfff => self.wram[usize::from(address - 0xc000)] = value,
            // Echo RAM
            0xe000..=0xfdff => self.wram[usize::from(address - 0xe000)] = value,
            // OAM
            0xfe00..=0xfe9f => self.ppu.write_u8(address, value)?,
            0xfea0..=0xfeff => {
                warn!("Ignoring write of {value:#04x} to unusable memory at {address:#06x}")
            }
            // Joypad
            0xff00 => self.joypad.write(value),
            0xff01 => self.serial_data = value,
            0xff02 => self.write_serial_control(value),
            0xff04..=0xff07 => self.timer.write_u8(address, value)?,
            0xff0f => self.interrupts.write_flags(value),
            0xff10..=0xff3f => self.apu.write_u8(address, value)?,
            // PPU mappings
            0xff40..=0xff45 | 0xff47..=0xff4b => self.ppu.write_u8(address, value)?,
            0xff46 => self.oam_transfer(value)?,
            0xff50 => {
                if value != 0 && self.boot_rom.take().is_some() {
                    debug!("Boot rom disabled");
                }
            }
            0xff80..=0xfffe => self.hram[usize::from(address - 0xff80)] = value,
            0xffff => self.interrupts.write_enable(value),
            _ => debug!("Ignoring write of {value:#04x} to unmapped register {address:#06x}"),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ram_regions_round_trip() {
        let mut memory_bus = MemoryBus::new(None);
        for address in (0x8000..=0x9fff).chain(0xc000..=0xdfff).chain(0xff80..=0xfffe) {
            let value = (address as u8) ^ 0x5a;
            memory_bus.write_u8(address, value).unwrap();
            assert_eq!(value, memory_bus.read_u8(address).unwrap(), "{address:#06x}");
        }
    }

    #[test]
    fn echo_mirrors_work_ram() {
        let mut memory_bus = MemoryBus::new(None);
        memory_bus.write_u8(0xc123, 0x42).unwrap();
        assert_eq!(0x42, memory_bus.read_u8(0xe123).unwrap());
        memory_bus.write_u8(0xfdff, 0x24).unwrap();
        assert_eq!(0x24, memory_bus.read_u8(0xddff).unwrap());
    }

    #[test]
    fn unmapped_reads_are_all_ones() {
        let mut memory_bus = MemoryBus::new(None);
        for address in [0x0000, 0x4000, 0xa000, 0xfea0, 0xfeff, 0xff03, 0xff4c, 0xff7f] {
            memory_bus.write_u8(address, 0x00).unwrap();
            assert_eq!(0xff, memory_bus.read_u8(address).unwrap(), "{address:#06x}");
        }
    }

    #[test]
    fn interrupt_registers() {
        let mut memory_bus = MemoryBus::new(None);
        assert_eq!(0xe0, memory_bus.read_u8(0xff0f).unwrap());
        memory_bus.write_u8(0xff0f, 0xff).unwrap();
        assert_eq!(0xff, memory_bus.read_u8(0xff0f).unwrap());
        memory_bus.write_u8(0xffff, 0x05).unwrap();
        assert_eq!(0xe5, memory_bus.read_u8(0xffff).unwrap());
        assert_eq!(0x05, memory_bus.interrupts.pending());
    }

    #[test]
    fn serial_transfer_is_captured() {
        let mut memory_bus = MemoryBus::new(None);
        for &byte in b"ok" {
            memory_bus.write_u8(0xff01, byte).unwrap();
            memory_bus.write_u8(0xff02, 0x81).unwrap();
        }
        assert_eq!(b"ok".to_vec(), memory_bus.take_serial_output());
        assert!(memory_bus.take_serial_output().is_empty());
        assert!(memory_bus.interrupts.is_requested(Interrupt::Serial));
        assert_eq!(0x7f, memory_bus.read_u8(0xff02).unwrap());
    }

    #[test]
    fn dma_copies_into_oam_and_stalls() {
        let mut memory_bus = MemoryBus::new(None);
        for offset in 0..OAM_SIZE as Address {
            memory_bus.write_u8(0xc100 + offset, offset as u8).unwrap();
        }
        memory_bus.write_u8(0xff46, 0xc1).unwrap();
        assert_eq!(DMA_STALL_CYCLES, memory_bus.take_stall_cycles());
        assert_eq!(0, memory_bus.take_stall_cycles());
        assert_eq!(0x00, memory_bus.read_u8(0xfe00).unwrap());
        assert_eq!(0x9f, memory_bus.read_u8(0xfe9f).unwrap());
    }

    #[test]
    fn boot_rom_overlay_until_disabled() {
        let mut memory_bus = MemoryBus::new_at_reset(None);
        assert!(memory_bus.load_boot_rom(&[0; 0x20]).is_err());
        memory_bus.load_boot_rom(&[0x31; BOOT_ROM_SIZE]).unwrap();

        assert_eq!(0x31, memory_bus.read_u8(0x00ff).unwrap());
        assert_eq!(0xff, memory_bus.read_u8(0x0100).unwrap());

        memory_bus.write_u8(0xff50, 0x00).unwrap();
        assert!(memory_bus.boot_rom_active());
        memory_bus.write_u8(0xff50, 0x01).unwrap();
        assert!(!memory_bus.boot_rom_active());
        assert_eq!(0xff, memory_bus.read_u8(0x0000).unwrap());
    }

    #[test]
    fn peripheral_registers_are_forwarded() {
        let mut memory_bus = MemoryBus::new(None);
        assert_eq!(0xab, memory_bus.read_u8(0xff04).unwrap());
        assert_eq!(0xf8, memory_bus.read_u8(0xff07).unwrap());
        assert_eq!(0x91, memory_bus.read_u8(0xff40).unwrap());
        assert_eq!(0xf1, memory_bus.read_u8(0xff26).unwrap());
        assert_eq!(0xcf, memory_bus.read_u8(0xff00).unwrap() & 0xcf);
    }
}
