use crate::component::ElapsedTime;
use log::trace;

/// Clock cycles per scanline.
pub const DOTS_PER_LINE: ElapsedTime = 456;
/// Lines per frame, including the ten VBlank lines.
pub const LINES_PER_FRAME: u8 = 154;
pub const VISIBLE_LINES: u8 = 144;

const OAM_SEARCH_DOTS: ElapsedTime = 80;
const PIXEL_TRANSFER_DOTS: ElapsedTime = 172;

/// Represents the LCD Control register at 0xff40
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LcdControl {
    pub bg_window_enable: bool,
    pub obj_enable: bool,
    pub obj_size: bool,
    pub bg_tile_map_area: bool,
    pub bg_window_tile_data_area: bool,
    pub window_enable: bool,
    pub window_tile_map_area: bool,
    pub lcd_ppu_enable: bool,
}

impl LcdControl {
    pub fn read(&self) -> u8 {
        (self.bg_window_enable as u8)
            | (self.obj_enable as u8) << 1
            | (self.obj_size as u8) << 2
            | (self.bg_tile_map_area as u8) << 3
            | (self.bg_window_tile_data_area as u8) << 4
            | (self.window_enable as u8) << 5
            | (self.window_tile_map_area as u8) << 6
            | (self.lcd_ppu_enable as u8) << 7
    }

    pub fn write(&mut self, value: u8) {
        let bit = |index: u8| (value >> index) & 1 == 1;
        self.bg_window_enable = bit(0);
        self.obj_enable = bit(1);
        self.obj_size = bit(2);
        self.bg_tile_map_area = bit(3);
        self.bg_window_tile_data_area = bit(4);
        self.window_enable = bit(5);
        self.window_tile_map_area = bit(6);
        self.lcd_ppu_enable = bit(7);
    }
}

/// STAT mode bits.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ScanlineMode {
    HBlank = 0,
    VBlank = 1,
    OamSearch = 2,
    PixelTransfer = 3,
}

// STAT interrupt source selects
const HBLANK_SELECT: u8 = 1 << 3;
const VBLANK_SELECT: u8 = 1 << 4;
const OAM_SELECT: u8 = 1 << 5;
const LYC_SELECT: u8 = 1 << 6;
const SELECT_MASK: u8 = HBLANK_SELECT | VBLANK_SELECT | OAM_SELECT | LYC_SELECT;

/// Scanline and mode timing. No pixels are produced; only LY, STAT and the two interrupt edges.
#[derive(Debug, Clone)]
pub struct Lcd {
    /// LY: LCD Y coordinate (read only)
    pub ly: u8,
    /// LYC: LY compare
    pub lyc: u8,
    pub lcd_control: LcdControl,
    stat_select: u8,
    mode: ScanlineMode,
    dots: ElapsedTime,

    /// OR of the enabled STAT sources. An interrupt is raised when it goes high.
    stat_line: bool,
    vblank_edge: bool,
    stat_edge: bool,
}

impl Lcd {
    pub fn new(lcd_control: u8) -> Lcd {
        let mut lcd = Lcd {
            ly: 0,
            lyc: 0,
            lcd_control: LcdControl::default(),
            stat_select: 0,
            mode: ScanlineMode::HBlank,
            dots: 0,
            stat_line: false,
            vblank_edge: false,
            stat_edge: false,
        };
        lcd.write_control(lcd_control);
        lcd
    }

    pub fn mode(&self) -> ScanlineMode {
        self.mode
    }

    pub fn read_stat(&self) -> u8 {
        let coincidence = if self.ly == self.lyc { 1 << 2 } else { 0 };
        0x80 | self.stat_select | coincidence | self.mode as u8
    }

    pub fn write_stat(&mut self, value: u8) {
        self.stat_select = value & SELECT_MASK;
        self.update_stat_line();
    }

    pub fn write_lyc(&mut self, value: u8) {
        self.lyc = value;
        self.update_stat_line();
    }

    pub fn write_control(&mut self, value: u8) {
        let was_enabled = self.lcd_control.lcd_ppu_enable;
        self.lcd_control.write(value);

        match (was_enabled, self.lcd_control.lcd_ppu_enable) {
            (true, false) => {
                trace!("LCD off");
                self.ly = 0;
                self.dots = 0;
                self.mode = ScanlineMode::HBlank;
                self.stat_line = false;
            }
            (false, true) => {
                trace!("LCD on");
                self.ly = 0;
                self.dots = 0;
                self.update_mode();
            }
            _ => {}
        }
    }

    /// Dot at which the current mode ends.
    fn next_boundary(&self) -> ElapsedTime {
        match self.mode {
            ScanlineMode::OamSearch => OAM_SEARCH_DOTS,
            ScanlineMode::PixelTransfer => OAM_SEARCH_DOTS + PIXEL_TRANSFER_DOTS,
            ScanlineMode::HBlank | ScanlineMode::VBlank => DOTS_PER_LINE,
        }
    }

    pub fn advance(&mut self, mut cycles: ElapsedTime) {
        if !self.lcd_control.lcd_ppu_enable {
            return;
        }

        while cycles > 0 {
            let step = cycles.min(self.next_boundary() - self.dots);
            self.dots += step;
            cycles -= step;

            if self.dots == DOTS_PER_LINE {
                self.dots = 0;
                self.ly = (self.ly + 1) % LINES_PER_FRAME;
                if self.ly == VISIBLE_LINES {
                    self.vblank_edge = true;
                }
            }
            self.update_mode();
        }
    }

    fn update_mode(&mut self) {
        self.mode = if self.ly >= VISIBLE_LINES {
            ScanlineMode::VBlank
        } else if self.dots < OAM_SEARCH_DOTS {
            ScanlineMode::OamSearch
        } else if self.dots < OAM_SEARCH_DOTS + PIXEL_TRANSFER_DOTS {
            ScanlineMode::PixelTransfer
        } else {
            ScanlineMode::HBlank
        };
        self.update_stat_line();
    }

    fn update_stat_line(&mut self) {
        if !self.lcd_control.lcd_ppu_enable {
            return;
        }

        let selected = |source: u8| self.stat_select & source != 0;
        let line = (selected(HBLANK_SELECT) && self.mode == ScanlineMode::HBlank)
            || (selected(VBLANK_SELECT) && self.mode == ScanlineMode::VBlank)
            || (selected(OAM_SELECT) && self.mode == ScanlineMode::OamSearch)
            || (selected(LYC_SELECT) && self.ly == self.lyc);

        if line && !self.stat_line {
            self.stat_edge = true;
        }
        self.stat_line = line;
    }

    pub fn take_vblank_edge(&mut self) -> bool {
        std::mem::take(&mut self.vblank_edge)
    }

    pub fn take_stat_edge(&mut self) -> bool {
        std::mem::take(&mut self.stat_edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_round_trip() {
        let mut control = LcdControl::default();
        control.write(0x91);
        assert!(control.lcd_ppu_enable && control.bg_window_tile_data_area && control.bg_window_enable);
        assert_eq!(0x91, control.read());
    }

    #[test]
    fn modes_within_a_line() {
        let mut lcd = Lcd::new(0x80);
        assert_eq!(ScanlineMode::OamSearch, lcd.mode());
        lcd.advance(80);
        assert_eq!(ScanlineMode::PixelTransfer, lcd.mode());
        lcd.advance(172);
        assert_eq!(ScanlineMode::HBlank, lcd.mode());
        lcd.advance(204);
        assert_eq!((1, ScanlineMode::OamSearch), (lcd.ly, lcd.mode()));
    }

    #[test]
    fn vblank_edge_fires_once_per_frame() {
        let mut lcd = Lcd::new(0x80);
        lcd.advance(DOTS_PER_LINE * 144 - 4);
        assert!(!lcd.take_vblank_edge());
        lcd.advance(4);
        assert_eq!((144, ScanlineMode::VBlank), (lcd.ly, lcd.mode()));
        assert!(lcd.take_vblank_edge());
        assert!(!lcd.take_vblank_edge());

        lcd.advance(DOTS_PER_LINE * 10);
        assert_eq!((0, ScanlineMode::OamSearch), (lcd.ly, lcd.mode()));
        assert!(!lcd.take_vblank_edge());
    }

    #[test]
    fn coincidence_and_stat_edge() {
        let mut lcd = Lcd::new(0x80);
        lcd.write_lyc(2);
        lcd.write_stat(LYC_SELECT);
        assert!(!lcd.take_stat_edge());
        assert_eq!(0, lcd.read_stat() & 0x04);

        lcd.advance(DOTS_PER_LINE * 2);
        assert_eq!(0x04, lcd.read_stat() & 0x04);
        assert!(lcd.take_stat_edge());

        // the line stays high for the rest of line 2, so no second edge
        lcd.advance(100);
        assert!(!lcd.take_stat_edge());
    }

    #[test]
    fn disabled_lcd_holds_line_zero() {
        let mut lcd = Lcd::new(0x80);
        lcd.advance(DOTS_PER_LINE * 3 + 10);
        lcd.write_control(0x00);
        assert_eq!((0, ScanlineMode::HBlank), (lcd.ly, lcd.mode()));
        lcd.advance(DOTS_PER_LINE * 200);
        assert_eq!(0, lcd.ly);
        assert_eq!(ScanlineMode::HBlank as u8, lcd.read_stat() & 0x03);
    }
}
