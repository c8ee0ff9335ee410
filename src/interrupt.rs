use log::trace;
use strum_macros::{AsRefStr, EnumIter};

/// Interrupt sources, declared in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumIter)]
pub enum Interrupt {
    VBlank,
    Stat,
    Timer,
    Serial,
    Joypad,
}

impl Interrupt {
    pub fn bit(self) -> u8 {
        1 << self as u8
    }

    /// Entry point the CPU jumps to when dispatching this interrupt.
    pub fn vector(self) -> u16 {
        0x40 + 8 * self as u16
    }
}

const UNUSED_BITS: u8 = 0xe0;
const INTERRUPT_MASK: u8 = 0x1f;

/// IF and IE. Both keep their state regardless of IME.
#[derive(Debug, Clone, Default)]
pub struct InterruptController {
    flags: u8,
    enable: u8,
}

impl InterruptController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, interrupt: Interrupt) {
        trace!("Requesting {} interrupt", interrupt.as_ref());
        self.flags |= interrupt.bit();
    }

    pub fn is_requested(&self, interrupt: Interrupt) -> bool {
        self.flags & interrupt.bit() != 0
    }

    /// Requested and enabled sources as a bit set.
    pub fn pending(&self) -> u8 {
        self.flags & self.enable & INTERRUPT_MASK
    }

    pub fn highest_priority(&self) -> Option<Interrupt> {
        use strum::IntoEnumIterator;

        let pending = self.pending();
        Interrupt::iter().find(|interrupt| pending & interrupt.bit() != 0)
    }

    /// Clears a request once it has been dispatched.
    pub fn acknowledge(&mut self, interrupt: Interrupt) {
        self.flags &= !interrupt.bit();
    }

    pub fn read_flags(&self) -> u8 {
        self.flags | UNUSED_BITS
    }

    pub fn write_flags(&mut self, value: u8) {
        self.flags = value & INTERRUPT_MASK;
    }

    pub fn read_enable(&self) -> u8 {
        self.enable | UNUSED_BITS
    }

    pub fn write_enable(&mut self, value: u8) {
        self.enable = value & INTERRUPT_MASK;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors() {
        assert_eq!(0x40, Interrupt::VBlank.vector());
        assert_eq!(0x48, Interrupt::Stat.vector());
        assert_eq!(0x50, Interrupt::Timer.vector());
        assert_eq!(0x58, Interrupt::Serial.vector());
        assert_eq!(0x60, Interrupt::Joypad.vector());
    }

    #[test]
    fn unused_bits_read_high() {
        let mut controller = InterruptController::new();
        assert_eq!(0xe0, controller.read_flags());
        assert_eq!(0xe0, controller.read_enable());
        controller.write_flags(0x00);
        controller.write_enable(0xff);
        assert_eq!(0xff, controller.read_enable());
    }

    #[test]
    fn priority_picks_lowest_bit() {
        let mut controller = InterruptController::new();
        controller.write_enable(0x1f);
        controller.request(Interrupt::Joypad);
        controller.request(Interrupt::Timer);
        assert_eq!(Some(Interrupt::Timer), controller.highest_priority());
        controller.acknowledge(Interrupt::Timer);
        assert_eq!(Some(Interrupt::Joypad), controller.highest_priority());
    }

    #[test]
    fn disabled_requests_stay_latched() {
        let mut controller = InterruptController::new();
        controller.request(Interrupt::Serial);
        assert_eq!(0, controller.pending());
        assert_eq!(None, controller.highest_priority());
        assert!(controller.is_requested(Interrupt::Serial));
        controller.write_enable(Interrupt::Serial.bit());
        assert_eq!(Some(Interrupt::Serial), controller.highest_priority());
    }
}
