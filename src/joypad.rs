use log::debug;
use strum_macros::{AsRefStr, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumIter)]
pub enum JoypadInput {
    A,
    B,
    Select,
    Start,
    Right,
    Left,
    Up,
    Down,
}

impl JoypadInput {
    fn bit(self) -> u8 {
        use JoypadInput::*;
        match self {
            A | Right => 0,
            B | Left => 1,
            Select | Up => 2,
            Start | Down => 3,
        }
    }

    fn is_action(self) -> bool {
        use JoypadInput::*;
        matches!(self, A | B | Select | Start)
    }
}

const SELECT_DIRECTION: u8 = 1 << 4;
const SELECT_ACTION: u8 = 1 << 5;

/// The joypad matrix behind 0xff00. Pressed inputs read as 0.
#[derive(Debug)]
pub struct Joypad {
    /// Only bits 4 and 5 are used
    select: u8,
    action_nibble: u8,
    direction_nibble: u8,
}

impl Default for Joypad {
    fn default() -> Self {
        Self::new()
    }
}

impl Joypad {
    pub fn new() -> Joypad {
        Joypad {
            select: SELECT_DIRECTION | SELECT_ACTION,
            action_nibble: 0xf,
            direction_nibble: 0xf,
        }
    }

    fn nibble_mut(&mut self, input: JoypadInput) -> &mut u8 {
        if input.is_action() {
            &mut self.action_nibble
        } else {
            &mut self.direction_nibble
        }
    }

    /// Notify the joypad that an input was pressed. Returns true iff the input was not already
    /// held, which is when the joypad interrupt is requested.
    pub fn press(&mut self, input: JoypadInput) -> bool {
        debug!("Pressed {}", input.as_ref());
        let mask = 1 << input.bit();
        let nibble = self.nibble_mut(input);
        let newly_pressed = *nibble & mask != 0;
        *nibble &= !mask;
        newly_pressed
    }

    /// Notify the joypad that an input was released. Returns true iff the input was held.
    pub fn release(&mut self, input: JoypadInput) -> bool {
        debug!("Released {}", input.as_ref());
        let mask = 1 << input.bit();
        let nibble = self.nibble_mut(input);
        let was_pressed = *nibble & mask == 0;
        *nibble |= mask;
        was_pressed
    }

    pub fn is_pressed(&self, input: JoypadInput) -> bool {
        let nibble = if input.is_action() {
            self.action_nibble
        } else {
            self.direction_nibble
        };
        nibble & (1 << input.bit()) == 0
    }

    /// The byte at 0xff00. A group is selected by writing 0 to its select bit; with both
    /// selected the groups are combined, with neither the low nibble reads 0xf.
    pub fn read(&self) -> u8 {
        let mut nibble = 0xf;
        if self.select & SELECT_ACTION == 0 {
            nibble &= self.action_nibble;
        }
        if self.select & SELECT_DIRECTION == 0 {
            nibble &= self.direction_nibble;
        }
        0xc0 | self.select | nibble
    }

    pub fn write(&mut self, value: u8) {
        self.select = value & (SELECT_DIRECTION | SELECT_ACTION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn nothing_selected_reads_all_ones() {
        let mut joypad = Joypad::new();
        joypad.press(JoypadInput::A);
        joypad.press(JoypadInput::Down);
        assert_eq!(0xff, joypad.read());
    }

    #[test]
    fn groups_are_selected_independently() {
        let mut joypad = Joypad::new();
        joypad.press(JoypadInput::Start);
        joypad.press(JoypadInput::Left);

        joypad.write(0x10);
        assert_eq!(0xd7, joypad.read());

        joypad.write(0x20);
        assert_eq!(0xed, joypad.read());

        joypad.write(0x00);
        assert_eq!(0xc5, joypad.read());
    }

    #[test]
    fn press_reports_new_presses_only() {
        let mut joypad = Joypad::new();
        assert!(joypad.press(JoypadInput::B));
        assert!(!joypad.press(JoypadInput::B));
        assert!(joypad.is_pressed(JoypadInput::B));
        assert!(joypad.release(JoypadInput::B));
        assert!(!joypad.release(JoypadInput::B));
    }

    #[test]
    fn every_input_maps_to_a_distinct_line() {
        let mut seen = Vec::new();
        for input in JoypadInput::iter() {
            let line = (input.is_action(), input.bit());
            assert!(!seen.contains(&line), "{input:?}");
            seen.push(line);
        }
        assert_eq!(8, seen.len());
    }
}
