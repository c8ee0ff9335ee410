/*!
 * The video peripheral. It stores the LCD registers, VRAM and OAM, and runs the scanline clock
 * that drives LY, the STAT mode bits and the VBlank/STAT interrupt requests. Nothing is drawn.
 */

mod lcd;

pub use lcd::{LcdControl, ScanlineMode, DOTS_PER_LINE, LINES_PER_FRAME};

use crate::component::{Address, Addressable, ElapsedTime, Peripheral};
use crate::error::{Error, Result};
use lcd::Lcd;
use log::trace;

pub const VRAM_SIZE: usize = 0x2000;
pub const OAM_SIZE: usize = 0xa0;

const VRAM_START: Address = 0x8000;
const OAM_START: Address = 0xfe00;

pub struct Ppu {
    vram: Box<[u8; VRAM_SIZE]>,
    oam: [u8; OAM_SIZE],
    lcd: Lcd,

    scy: u8,
    scx: u8,
    bgp: u8,
    obp0: u8,
    obp1: u8,
    wy: u8,
    wx: u8,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    /// The peripheral as the boot ROM leaves it: LCD on, background palette loaded.
    pub fn new() -> Self {
        Self {
            bgp: 0xfc,
            ..Self::new_at_reset()
        }
        .with_control(0x91)
    }

    pub fn new_at_reset() -> Self {
        Self {
            vram: Box::new([0; VRAM_SIZE]),
            oam: [0; OAM_SIZE],
            lcd: Lcd::new(0),
            scy: 0,
            scx: 0,
            bgp: 0,
            obp0: 0,
            obp1: 0,
            wy: 0,
            wx: 0,
        }
    }

    fn with_control(mut self, lcd_control: u8) -> Self {
        self.lcd.write_control(lcd_control);
        self
    }

    /// VRAM byte at an offset into the 8 KB window.
    pub fn read_vram(&self, offset: usize) -> u8 {
        self.vram[offset % VRAM_SIZE]
    }

    pub fn write_vram(&mut self, offset: usize, value: u8) {
        self.vram[offset % VRAM_SIZE] = value;
    }

    pub fn write_oam(&mut self, offset: usize, value: u8) {
        self.oam[offset % OAM_SIZE] = value;
    }

    /// DMA sink: replaces the whole object attribute table.
    pub fn oam_transfer(&mut self, data: &[u8; OAM_SIZE]) {
        trace!("OAM transfer");
        self.oam.copy_from_slice(data);
    }

    pub fn in_vblank(&self) -> bool {
        self.lcd.mode() == ScanlineMode::VBlank
    }

    pub fn mode(&self) -> ScanlineMode {
        self.lcd.mode()
    }

    /// True once per frame, when line 144 begins.
    pub fn take_vblank_interrupt(&mut self) -> bool {
        self.lcd.take_vblank_edge()
    }

    /// True when the OR of the enabled STAT sources went high since the last call.
    pub fn take_stat_interrupt(&mut self) -> bool {
        self.lcd.take_stat_edge()
    }

    pub fn vram(&self) -> &[u8] {
        &self.vram[..]
    }

    pub fn oam(&self) -> &[u8] {
        &self.oam
    }
}

impl Addressable for Ppu {
    fn read_u8(&mut self, address: Address) -> Result<u8> {
        let value = match address {
            0x8000..=0x9fff => self.read_vram(usize::from(address - VRAM_START)),
            0xfe00..=0xfe9f => self.oam[usize::from(address - OAM_START)],
            0xff40 => self.lcd.lcd_control.read(),
            0xff41 => self.lcd.read_stat(),
            0xff42 => self.scy,
            0xff43 => self.scx,
            0xff44 => self.lcd.ly,
            0xff45 => self.lcd.lyc,
            // palettes are write-only
            0xff47..=0xff49 => 0xff,
            0xff4a => self.wy,
            0xff4b => self.wx,
            _ => return Err(Error::from_message(format!("ppu read at {address:#06x}"))),
        };

        Ok(value)
    }

    fn write_u8(&mut self, address: Address, value: u8) -> Result<()> {
        match address {
            0x8000..=0x9fff => self.write_vram(usize::from(address - VRAM_START), value),
            0xfe00..=0xfe9f => self.write_oam(usize::from(address - OAM_START), value),
            0xff40 => self.lcd.write_control(value),
            0xff41 => self.lcd.write_stat(value),
            0xff42 => self.scy = value,
            0xff43 => self.scx = value,
            0xff44 => (), // ly: lcd y coordinate is read only
            0xff45 => self.lcd.write_lyc(value),
            0xff47 => self.bgp = value,
            0xff48 => self.obp0 = value,
            0xff49 => self.obp1 = value,
            0xff4a => self.wy = value,
            0xff4b => self.wx = value,
            _ => return Err(Error::from_message(format!("ppu write at {address:#06x}"))),
        }

        Ok(())
    }
}

impl Peripheral for Ppu {
    fn advance(&mut self, cycles: ElapsedTime) {
        self.lcd.advance(cycles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_boot_registers() {
        let mut ppu = Ppu::new();
        assert_eq!(0x91, ppu.read_u8(0xff40).unwrap());
        assert_eq!(0xfc, ppu.bgp);
        assert_eq!(0x82, ppu.read_u8(0xff41).unwrap() & 0x83);
    }

    #[test]
    fn vram_and_oam_round_trip() {
        let mut ppu = Ppu::new();
        ppu.write_u8(0x8000, 0x12).unwrap();
        ppu.write_u8(0x9fff, 0x34).unwrap();
        ppu.write_u8(0xfe9f, 0x56).unwrap();
        assert_eq!(0x12, ppu.read_u8(0x8000).unwrap());
        assert_eq!(0x34, ppu.read_vram(0x1fff));
        assert_eq!(0x56, ppu.oam()[0x9f]);
    }

    #[test]
    fn write_only_and_read_only_registers() {
        let mut ppu = Ppu::new();
        ppu.write_u8(0xff47, 0xe4).unwrap();
        assert_eq!(0xff, ppu.read_u8(0xff47).unwrap());
        assert_eq!(0xe4, ppu.bgp);

        ppu.write_u8(0xff44, 0x50).unwrap();
        assert_eq!(0, ppu.read_u8(0xff44).unwrap());

        ppu.write_u8(0xff42, 0x10).unwrap();
        ppu.write_u8(0xff4b, 0x07).unwrap();
        assert_eq!(0x10, ppu.read_u8(0xff42).unwrap());
        assert_eq!(0x07, ppu.read_u8(0xff4b).unwrap());
    }

    #[test]
    fn dma_replaces_oam() {
        let mut ppu = Ppu::new();
        let mut data = [0; OAM_SIZE];
        data[0] = 0x10;
        data[OAM_SIZE - 1] = 0x99;
        ppu.oam_transfer(&data);
        assert_eq!(0x10, ppu.read_u8(0xfe00).unwrap());
        assert_eq!(0x99, ppu.read_u8(0xfe9f).unwrap());
    }

    #[test]
    fn frame_raises_one_vblank() {
        let mut ppu = Ppu::new();
        let mut vblanks = 0;
        for _ in 0..(DOTS_PER_LINE * u32::from(LINES_PER_FRAME) / 4) {
            ppu.advance(4);
            if ppu.take_vblank_interrupt() {
                vblanks += 1;
                assert!(ppu.in_vblank());
            }
        }
        assert_eq!(1, vblanks);
    }
}
