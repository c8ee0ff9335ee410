/// The eight 8-bit CPU registers. SP and PC live on the CPU itself.
/// B/C, D/E and H/L pair up into 16-bit registers; A pairs with the flag register.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub f: FlagRegister,
    pub h: u8,
    pub l: u8,
}

macro_rules! register_pair {
    ($get:ident, $set:ident, $high:ident, $low:ident) => {
        #[doc = concat!("Reads the pair ", stringify!($high), stringify!($low), ".")]
        pub fn $get(&self) -> u16 {
            u16::from_be_bytes([self.$high.into(), self.$low.into()])
        }

        #[doc = concat!("Writes the pair ", stringify!($high), stringify!($low), ".")]
        pub fn $set(&mut self, value: u16) {
            let [high, low] = value.to_be_bytes();
            self.$high = high.into();
            self.$low = low.into();
        }
    };
}

impl Registers {
    register_pair!(get_af, set_af, a, f);
    register_pair!(get_bc, set_bc, b, c);
    register_pair!(get_de, set_de, d, e);
    register_pair!(get_hl, set_hl, h, l);
}

/// The upper nibble of F. The lower nibble does not exist, so converting to and from a byte
/// always drops it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlagRegister {
    /// Z: the last result was zero (or CP found equal operands).
    pub zero: bool,
    /// N: the last arithmetic operation was a subtraction.
    pub subtract: bool,
    /// H: carry out of bit 3 (bit 11 for 16-bit adds), or a borrow into it.
    pub half_carry: bool,
    /// C: carry out of bit 7 (bit 15 for 16-bit adds), or a borrow.
    pub carry: bool,
}

const ZERO_FLAG_BYTE_POSITION: u8 = 7;
const SUBTRACT_FLAG_BYTE_POSITION: u8 = 6;
const HALF_CARRY_FLAG_BYTE_POSITION: u8 = 5;
const CARRY_FLAG_BYTE_POSITION: u8 = 4;

impl FlagRegister {
    pub fn new(zero: bool, subtract: bool, half_carry: bool, carry: bool) -> Self {
        Self {
            zero,
            subtract,
            half_carry,
            carry,
        }
    }
}

impl From<FlagRegister> for u8 {
    fn from(flag: FlagRegister) -> u8 {
        u8::from(flag.zero) << ZERO_FLAG_BYTE_POSITION
            | u8::from(flag.subtract) << SUBTRACT_FLAG_BYTE_POSITION
            | u8::from(flag.half_carry) << HALF_CARRY_FLAG_BYTE_POSITION
            | u8::from(flag.carry) << CARRY_FLAG_BYTE_POSITION
    }
}

impl From<u8> for FlagRegister {
    fn from(byte: u8) -> Self {
        let bit = |position: u8| (byte >> position) & 0b1 == 1;
        Self {
            zero: bit(ZERO_FLAG_BYTE_POSITION),
            subtract: bit(SUBTRACT_FLAG_BYTE_POSITION),
            half_carry: bit(HALF_CARRY_FLAG_BYTE_POSITION),
            carry: bit(CARRY_FLAG_BYTE_POSITION),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn af_drops_low_nibble_of_f() {
        let mut registers = Registers::default();
        registers.set_af(0x12ff);
        assert_eq!(0x12, registers.a);
        assert_eq!(0xf0, u8::from(registers.f));
        assert_eq!(0x12f0, registers.get_af());
    }

    #[test]
    fn pairs_are_big_endian() {
        let mut registers = Registers::default();
        registers.set_bc(0xbeef);
        registers.set_hl(0x014d);
        assert_eq!((0xbe, 0xef), (registers.b, registers.c));
        assert_eq!((0x01, 0x4d), (registers.h, registers.l));
        assert_eq!(0xbeef, registers.get_bc());
    }

    #[test]
    fn flag_bits() {
        let flags = FlagRegister::from(0b1010_0000);
        assert!(flags.zero && flags.half_carry);
        assert!(!flags.subtract && !flags.carry);
    }
}
