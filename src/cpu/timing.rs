//! Instruction durations in M-cycles.

/// Base table, branch not taken. The illegal opcodes and the 0xCB prefix are 0; the prefix is
/// accounted for in [`CB_CYCLES`].
#[rustfmt::skip]
const BASE_CYCLES: [u8; 256] = [
//  x0 x1 x2 x3 x4 x5 x6 x7 x8 x9 xA xB xC xD xE xF
    1, 3, 2, 2, 1, 1, 2, 1, 5, 2, 2, 2, 1, 1, 2, 1, // 0x
    1, 3, 2, 2, 1, 1, 2, 1, 3, 2, 2, 2, 1, 1, 2, 1, // 1x
    2, 3, 2, 2, 1, 1, 2, 1, 2, 2, 2, 2, 1, 1, 2, 1, // 2x
    2, 3, 2, 2, 3, 3, 3, 1, 2, 2, 2, 2, 1, 1, 2, 1, // 3x
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 4x
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 5x
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 6x
    2, 2, 2, 2, 2, 2, 1, 2, 1, 1, 1, 1, 1, 1, 2, 1, // 7x
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 8x
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // 9x
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // Ax
    1, 1, 1, 1, 1, 1, 2, 1, 1, 1, 1, 1, 1, 1, 2, 1, // Bx
    2, 3, 3, 4, 3, 4, 2, 4, 2, 4, 3, 0, 3, 6, 2, 4, // Cx
    2, 3, 3, 0, 3, 4, 2, 4, 2, 4, 3, 0, 3, 0, 2, 4, // Dx
    3, 3, 2, 0, 0, 4, 2, 4, 4, 1, 4, 0, 0, 0, 2, 4, // Ex
    3, 3, 2, 1, 0, 4, 2, 4, 3, 2, 4, 1, 0, 0, 2, 4, // Fx
];

/// Duration of a base opcode whose branch was not taken (or which never branches).
pub fn base_cycles(opcode: u8) -> u8 {
    BASE_CYCLES[usize::from(opcode)]
}

/// Duration of a conditional branch that was taken.
pub fn branch_taken_cycles(opcode: u8) -> u8 {
    match opcode {
        0x20 | 0x28 | 0x30 | 0x38 => 3,
        0xC0 | 0xC8 | 0xD0 | 0xD8 => 5,
        0xC2 | 0xCA | 0xD2 | 0xDA => 4,
        0xC4 | 0xCC | 0xD4 | 0xDC => 6,
        _ => base_cycles(opcode),
    }
}

/// Duration of a 0xCB-prefixed opcode, prefix fetch included.
pub fn cb_cycles(opcode: u8) -> u8 {
    let reads_hl = opcode & 0x07 == 0x06;
    match (reads_hl, opcode) {
        (false, _) => 2,
        // BIT b,(HL) only reads memory
        (true, 0x40..=0x7F) => 3,
        (true, _) => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_opcodes_have_no_duration() {
        for opcode in [0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD] {
            assert_eq!(0, base_cycles(opcode), "opcode {opcode:#04x}");
        }
    }

    #[test]
    fn conditional_branches_cost_more_when_taken() {
        assert_eq!((2, 3), (base_cycles(0x20), branch_taken_cycles(0x20)));
        assert_eq!((3, 4), (base_cycles(0xC2), branch_taken_cycles(0xC2)));
        assert_eq!((3, 6), (base_cycles(0xCC), branch_taken_cycles(0xCC)));
        assert_eq!((2, 5), (base_cycles(0xD8), branch_taken_cycles(0xD8)));
        assert_eq!(4, branch_taken_cycles(0xC3));
    }

    #[test]
    fn cb_memory_operands() {
        assert_eq!(2, cb_cycles(0x37));
        assert_eq!(4, cb_cycles(0x06));
        assert_eq!(3, cb_cycles(0x46));
        assert_eq!(3, cb_cycles(0x7E));
        assert_eq!(4, cb_cycles(0x86));
        assert_eq!(4, cb_cycles(0xFE));
    }
}
