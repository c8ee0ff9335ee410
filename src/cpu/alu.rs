//! Flag-exact arithmetic. Every helper takes its inputs by value and returns the result together
//! with the flags it produces, so the instruction executor only has to decide where they go.

use super::register::FlagRegister;

/// ADD / ADC.
pub fn add(a: u8, value: u8, carry_in: bool) -> (u8, FlagRegister) {
    let carry = u8::from(carry_in);
    let sum = u16::from(a) + u16::from(value) + u16::from(carry);
    let result = sum as u8;
    let flags = FlagRegister::new(
        result == 0,
        false,
        (a & 0xf) + (value & 0xf) + carry > 0xf,
        sum > 0xff,
    );
    (result, flags)
}

/// SUB / SBC / CP. H and C report a borrow from bit 4 and bit 8.
pub fn sub(a: u8, value: u8, carry_in: bool) -> (u8, FlagRegister) {
    let carry = u8::from(carry_in);
    let result = a.wrapping_sub(value).wrapping_sub(carry);
    let flags = FlagRegister::new(
        result == 0,
        true,
        (a & 0xf) < (value & 0xf) + carry,
        u16::from(a) < u16::from(value) + u16::from(carry),
    );
    (result, flags)
}

pub fn and(a: u8, value: u8) -> (u8, FlagRegister) {
    let result = a & value;
    (result, FlagRegister::new(result == 0, false, true, false))
}

pub fn or(a: u8, value: u8) -> (u8, FlagRegister) {
    let result = a | value;
    (result, FlagRegister::new(result == 0, false, false, false))
}

pub fn xor(a: u8, value: u8) -> (u8, FlagRegister) {
    let result = a ^ value;
    (result, FlagRegister::new(result == 0, false, false, false))
}

/// 8-bit INC. Carry is untouched, so the caller's C comes back unchanged.
pub fn inc(value: u8, flags: FlagRegister) -> (u8, FlagRegister) {
    let result = value.wrapping_add(1);
    let flags = FlagRegister::new(result == 0, false, value & 0xf == 0xf, flags.carry);
    (result, flags)
}

/// 8-bit DEC. Carry is untouched.
pub fn dec(value: u8, flags: FlagRegister) -> (u8, FlagRegister) {
    let result = value.wrapping_sub(1);
    let flags = FlagRegister::new(result == 0, true, value & 0xf == 0, flags.carry);
    (result, flags)
}

/// ADD HL,rr: H from bit 11, C from bit 15, Z preserved.
pub fn add_hl(hl: u16, value: u16, flags: FlagRegister) -> (u16, FlagRegister) {
    let (result, carry) = hl.overflowing_add(value);
    let half_carry = (hl & 0x0fff) + (value & 0x0fff) > 0x0fff;
    (result, FlagRegister::new(flags.zero, false, half_carry, carry))
}

/// SP + signed immediate, shared by ADD SP,e and LD HL,SP+e. The flags come from treating the
/// immediate as an unsigned byte added to the low byte of SP.
pub fn add_sp_offset(sp: u16, offset: i8) -> (u16, FlagRegister) {
    let unsigned = offset as u8;
    let result = sp.wrapping_add_signed(i16::from(offset));
    let half_carry = (sp & 0x000f) + u16::from(unsigned & 0x0f) > 0x000f;
    let carry = (sp & 0x00ff) + u16::from(unsigned) > 0x00ff;
    (result, FlagRegister::new(false, false, half_carry, carry))
}

/// Correction added (or subtracted after a subtraction) by DAA, indexed by
/// `(high_adjust << 1) | low_adjust`.
const DAA_CORRECTION: [u8; 4] = [0x00, 0x06, 0x60, 0x66];

/// DAA over the accumulator.
///
/// The selector has one bit for the low digit (low nibble above 9 or H set after an addition,
/// H set after a subtraction) and one for the high digit (A above 0x99 or C set after an
/// addition, C set after a subtraction). The selected correction is added or subtracted
/// depending on N. C comes out as the high-digit selector bit and H is always cleared, which is
/// every row of the SM83 truth table.
pub fn daa(a: u8, flags: FlagRegister) -> (u8, FlagRegister) {
    let (low_adjust, high_adjust) = if flags.subtract {
        (flags.half_carry, flags.carry)
    } else {
        (flags.half_carry || a & 0x0f > 0x09, flags.carry || a > 0x99)
    };
    let selector = usize::from(high_adjust) << 1 | usize::from(low_adjust);
    let correction = DAA_CORRECTION[selector];
    let result = if flags.subtract {
        a.wrapping_sub(correction)
    } else {
        a.wrapping_add(correction)
    };
    (
        result,
        FlagRegister::new(result == 0, flags.subtract, false, high_adjust),
    )
}

/// The shift/rotate family of the 0xCB table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    /// Rotate left, bit 7 to carry and bit 0.
    Rlc,
    /// Rotate right, bit 0 to carry and bit 7.
    Rrc,
    /// Rotate left through carry.
    Rl,
    /// Rotate right through carry.
    Rr,
    /// Shift left, bit 0 cleared.
    Sla,
    /// Arithmetic shift right, bit 7 kept.
    Sra,
    /// Nibble swap.
    Swap,
    /// Logical shift right, bit 7 cleared.
    Srl,
}

impl ShiftOp {
    pub fn from_index(index: u8) -> ShiftOp {
        match index & 0b111 {
            0 => ShiftOp::Rlc,
            1 => ShiftOp::Rrc,
            2 => ShiftOp::Rl,
            3 => ShiftOp::Rr,
            4 => ShiftOp::Sla,
            5 => ShiftOp::Sra,
            6 => ShiftOp::Swap,
            _ => ShiftOp::Srl,
        }
    }
}

/// Applies a shift or rotate. Z reflects the result; the accumulator-only forms (RLCA and
/// friends) clear Z afterwards themselves.
pub fn shift(op: ShiftOp, value: u8, carry_in: bool) -> (u8, FlagRegister) {
    let carry_bit = u8::from(carry_in);
    let (result, carry) = match op {
        ShiftOp::Rlc => (value.rotate_left(1), value & 0x80 != 0),
        ShiftOp::Rrc => (value.rotate_right(1), value & 0x01 != 0),
        ShiftOp::Rl => (value << 1 | carry_bit, value & 0x80 != 0),
        ShiftOp::Rr => (value >> 1 | carry_bit << 7, value & 0x01 != 0),
        ShiftOp::Sla => (value << 1, value & 0x80 != 0),
        ShiftOp::Sra => (value >> 1 | value & 0x80, value & 0x01 != 0),
        ShiftOp::Swap => (value.rotate_left(4), false),
        ShiftOp::Srl => (value >> 1, value & 0x01 != 0),
    };
    (result, FlagRegister::new(result == 0, false, false, carry))
}

/// BIT b: Z is the complement of the tested bit, H set, C preserved.
pub fn bit(bit: u8, value: u8, flags: FlagRegister) -> FlagRegister {
    FlagRegister::new(value & (1 << bit) == 0, false, true, flags.carry)
}
