use crate::component::{Address, Addressable, ElapsedTime, Peripheral};
use crate::error::{Error, Result};
use log::trace;

// Divider register
const DIV: Address = 0xff04;
// Timer counter
const TIMA: Address = 0xff05;
// Timer modulo
const TMA: Address = 0xff06;
// Timer control
const TAC: Address = 0xff07;

/// Clock cycles per divider increment.
const DIV_PERIOD: ElapsedTime = 256;

pub struct Timer {
    div: u8,
    tima: u8,
    tma: u8,
    /// Low three bits of TAC.
    tac: u8,

    /// Clock cycles accumulated towards the next divider and counter increments.
    div_clocksum: ElapsedTime,
    timer_clocksum: ElapsedTime,

    overflowed: bool,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Timer state after the boot ROM has run.
    pub fn new() -> Self {
        Self {
            div: 0xab,
            tima: 0,
            tma: 0,
            tac: 0,
            div_clocksum: 0,
            timer_clocksum: 0,
            overflowed: false,
        }
    }

    /// Timer state at power-on, before any boot ROM.
    pub fn new_at_reset() -> Self {
        Self {
            div: 0,
            ..Self::new()
        }
    }

    fn is_enabled(&self) -> bool {
        self.tac & 0b100 != 0
    }

    /// Clock cycles per counter increment, from the clock-select bits.
    fn period(&self) -> ElapsedTime {
        match self.tac & 0b11 {
            0b00 => 1024,
            0b01 => 16,
            0b10 => 64,
            _ => 256,
        }
    }

    /// Returns whether the counter overflowed since the last call, clearing the flag.
    pub fn take_overflow(&mut self) -> bool {
        std::mem::take(&mut self.overflowed)
    }

    fn increment_counter(&mut self) {
        let (tima, overflow) = self.tima.overflowing_add(1);
        if overflow {
            trace!("Timer overflow, reloading {:#04x}", self.tma);
            self.tima = self.tma;
            self.overflowed = true;
        } else {
            self.tima = tima;
        }
    }
}

impl Addressable for Timer {
    fn read_u8(&mut self, address: Address) -> Result<u8> {
        let value = match address {
            DIV => self.div,
            TIMA => self.tima,
            TMA => self.tma,
            TAC => 0b1111_1000 | self.tac,
            _ => return Err(Error::from_message(format!("timer read at {address:#06x}"))),
        };
        Ok(value)
    }

    fn write_u8(&mut self, address: Address, value: u8) -> Result<()> {
        match address {
            // writing any value to DIV resets it to 0
            DIV => {
                self.div = 0;
                self.div_clocksum = 0;
            }
            TIMA => self.tima = value,
            TMA => self.tma = value,
            TAC => {
                let was_enabled = self.is_enabled();
                self.tac = value & 0b111;
                if self.is_enabled() && !was_enabled {
                    self.timer_clocksum = 0;
                }
            }
            _ => return Err(Error::from_message(format!("timer write at {address:#06x}"))),
        }
        Ok(())
    }
}

impl Peripheral for Timer {
    fn advance(&mut self, cycles: ElapsedTime) {
        self.div_clocksum += cycles;
        while self.div_clocksum >= DIV_PERIOD {
            self.div_clocksum -= DIV_PERIOD;
            self.div = self.div.wrapping_add(1);
        }

        if self.is_enabled() {
            let period = self.period();
            self.timer_clocksum += cycles;
            while self.timer_clocksum >= period {
                self.timer_clocksum -= period;
                self.increment_counter();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_boot_values() {
        let mut timer = Timer::new();
        assert_eq!(0xab, timer.read_u8(DIV).unwrap());
        assert_eq!(0xf8, timer.read_u8(TAC).unwrap());
    }

    #[test]
    fn divider_counts_every_256_clocks_even_when_disabled() {
        let mut timer = Timer::new_at_reset();
        timer.advance(255);
        assert_eq!(0, timer.read_u8(DIV).unwrap());
        timer.advance(1);
        assert_eq!(1, timer.read_u8(DIV).unwrap());
        timer.advance(256 * 3);
        assert_eq!(4, timer.read_u8(DIV).unwrap());
        assert_eq!(0, timer.read_u8(TIMA).unwrap());
    }

    #[test]
    fn sixteen_clocks_increment_counter_once() {
        let mut timer = Timer::new();
        timer.write_u8(TAC, 0x05).unwrap();
        timer.advance(15);
        assert_eq!(0, timer.read_u8(TIMA).unwrap());
        timer.advance(1);
        assert_eq!(1, timer.read_u8(TIMA).unwrap());
    }

    #[test]
    fn clock_select_periods() {
        for (tac, period) in [(0x04, 1024), (0x05, 16), (0x06, 64), (0x07, 256)] {
            let mut timer = Timer::new();
            timer.write_u8(TAC, tac).unwrap();
            timer.advance(period * 3);
            assert_eq!(3, timer.read_u8(TIMA).unwrap(), "tac {tac:#04x}");
        }
    }

    #[test]
    fn overflow_reloads_modulo_and_flags_once() {
        let mut timer = Timer::new();
        timer.write_u8(TMA, 0x42).unwrap();
        timer.write_u8(TIMA, 0xff).unwrap();
        timer.write_u8(TAC, 0x05).unwrap();
        timer.advance(16);
        assert_eq!(0x42, timer.read_u8(TIMA).unwrap());
        assert!(timer.take_overflow());
        assert!(!timer.take_overflow());
    }

    #[test]
    fn divider_reset_leaves_counter_alone() {
        let mut timer = Timer::new();
        timer.write_u8(TAC, 0x05).unwrap();
        timer.advance(16 * 5);
        timer.write_u8(DIV, 0x99).unwrap();
        assert_eq!(0, timer.read_u8(DIV).unwrap());
        assert_eq!(5, timer.read_u8(TIMA).unwrap());
    }

    #[test]
    fn enabling_resets_counter_phase() {
        let mut timer = Timer::new();
        timer.write_u8(TAC, 0x05).unwrap();
        timer.advance(10);
        timer.write_u8(TAC, 0x01).unwrap();
        timer.write_u8(TAC, 0x05).unwrap();
        timer.advance(10);
        assert_eq!(0, timer.read_u8(TIMA).unwrap());
        timer.advance(6);
        assert_eq!(1, timer.read_u8(TIMA).unwrap());
    }
}
