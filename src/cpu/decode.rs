//! Opcode decoding.
//!
//! Both tables are laid out in octal fields `xx yyy zzz`. In the register columns index 6 is the
//! byte at (HL), so one helper covers `B C D E H L (HL) A` everywhere it appears.

use crate::cpu::instruction::{Condition, InstrArgByte, Instruction, Reg, WReg};
use crate::cpu::Cpu;
use crate::error::{Error, Result};
use crate::memory::MemoryBus;

fn byte_arg(index: u8) -> InstrArgByte {
    match index & 0b111 {
        0 => InstrArgByte::Register(Reg::B),
        1 => InstrArgByte::Register(Reg::C),
        2 => InstrArgByte::Register(Reg::D),
        3 => InstrArgByte::Register(Reg::E),
        4 => InstrArgByte::Register(Reg::H),
        5 => InstrArgByte::Register(Reg::L),
        6 => InstrArgByte::AddressRegister(WReg::HL),
        _ => InstrArgByte::Register(Reg::A),
    }
}

/// Register pair column for loads and 16-bit arithmetic.
fn word_register(index: u8) -> WReg {
    match index & 0b11 {
        0 => WReg::BC,
        1 => WReg::DE,
        2 => WReg::HL,
        _ => WReg::SP,
    }
}

/// Register pair column for PUSH/POP, where AF takes the place of SP.
fn stack_register(index: u8) -> WReg {
    match index & 0b11 {
        0 => WReg::BC,
        1 => WReg::DE,
        2 => WReg::HL,
        _ => WReg::AF,
    }
}

fn condition(index: u8) -> Condition {
    match index & 0b11 {
        0 => Condition::NZ,
        1 => Condition::Z,
        2 => Condition::NC,
        _ => Condition::C,
    }
}

fn alu_instruction(index: u8, source: InstrArgByte) -> Instruction {
    match index & 0b111 {
        0 => Instruction::ADD(source),
        1 => Instruction::ADC(source),
        2 => Instruction::SUB(source),
        3 => Instruction::SBC(source),
        4 => Instruction::AND(source),
        5 => Instruction::XOR(source),
        6 => Instruction::OR(source),
        _ => Instruction::CP(source),
    }
}

/// Decodes an opcode of the 0xCB table. Every entry is defined.
pub fn decode_cb_opcode(opcode: u8) -> Instruction {
    let y = (opcode >> 3) & 0b111;
    let target = byte_arg(opcode);
    match opcode >> 6 {
        0 => match y {
            0 => Instruction::RLC(target),
            1 => Instruction::RRC(target),
            2 => Instruction::RL(target),
            3 => Instruction::RR(target),
            4 => Instruction::SLA(target),
            5 => Instruction::SRA(target),
            6 => Instruction::SWAP(target),
            _ => Instruction::SRL(target),
        },
        1 => Instruction::BIT(y, target),
        2 => Instruction::RES(y, target),
        _ => Instruction::SET(y, target),
    }
}

impl Cpu {
    /// Decodes a base-table opcode whose byte has already been fetched, consuming its operand
    /// bytes from PC. 0xCB is handled by the caller and, like the eleven holes in the table,
    /// decodes as an unknown opcode here.
    pub fn decode_regular_opcode(
        &mut self,
        memory_bus: &mut MemoryBus,
        opcode: u8,
    ) -> Result<Instruction> {
        let y = (opcode >> 3) & 0b111;
        let z = opcode & 0b111;
        let p = y >> 1;

        let instruction = match opcode {
            0x00 => Instruction::NOP,
            0x08 => Instruction::LD_DIRECT_SP(self.get_word_from_pc(memory_bus)?),
            0x10 => {
                // STOP is followed by a padding byte
                self.get_byte_from_pc(memory_bus)?;
                Instruction::STOP
            }
            0x18 => Instruction::JR(self.get_signed_byte_from_pc(memory_bus)?),
            0x20 | 0x28 | 0x30 | 0x38 => Instruction::JR_CONDITION(
                condition(y - 4),
                self.get_signed_byte_from_pc(memory_bus)?,
            ),

            0x01 | 0x11 | 0x21 | 0x31 => {
                Instruction::LD_WORD(word_register(p), self.get_word_from_pc(memory_bus)?)
            }
            0x09 | 0x19 | 0x29 | 0x39 => Instruction::ADD_HL(word_register(p)),

            0x02 => Instruction::LD(
                InstrArgByte::AddressRegister(WReg::BC),
                InstrArgByte::Register(Reg::A),
            ),
            0x12 => Instruction::LD(
                InstrArgByte::AddressRegister(WReg::DE),
                InstrArgByte::Register(Reg::A),
            ),
            0x22 => Instruction::LDI_A_INTO_HL,
            0x32 => Instruction::LDD_A_INTO_HL,
            0x0A => Instruction::LD(
                InstrArgByte::Register(Reg::A),
                InstrArgByte::AddressRegister(WReg::BC),
            ),
            0x1A => Instruction::LD(
                InstrArgByte::Register(Reg::A),
                InstrArgByte::AddressRegister(WReg::DE),
            ),
            0x2A => Instruction::LDI_A_FROM_HL,
            0x3A => Instruction::LDD_A_FROM_HL,

            0x03 | 0x13 | 0x23 | 0x33 => Instruction::INC_WORD(word_register(p)),
            0x0B | 0x1B | 0x2B | 0x3B => Instruction::DEC_WORD(word_register(p)),

            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => Instruction::INC(byte_arg(y)),
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => Instruction::DEC(byte_arg(y)),
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => Instruction::LD(
                byte_arg(y),
                InstrArgByte::ImmediateByte(self.get_byte_from_pc(memory_bus)?),
            ),

            0x07 => Instruction::RLCA,
            0x0F => Instruction::RRCA,
            0x17 => Instruction::RLA,
            0x1F => Instruction::RRA,
            0x27 => Instruction::DAA,
            0x2F => Instruction::CPL,
            0x37 => Instruction::SCF,
            0x3F => Instruction::CCF,

            0x76 => Instruction::HALT,
            0x40..=0x7F => Instruction::LD(byte_arg(y), byte_arg(z)),
            0x80..=0xBF => alu_instruction(y, byte_arg(z)),

            0xC0 | 0xC8 | 0xD0 | 0xD8 => Instruction::RET_CONDITION(condition(y)),
            0xC9 => Instruction::RET,
            0xD9 => Instruction::RETI,
            0xC1 | 0xD1 | 0xE1 | 0xF1 => Instruction::POP(stack_register(p)),
            0xC5 | 0xD5 | 0xE5 | 0xF5 => Instruction::PUSH(stack_register(p)),

            0xC2 | 0xCA | 0xD2 | 0xDA => {
                Instruction::JP_CONDITION(condition(y), self.get_word_from_pc(memory_bus)?)
            }
            0xC3 => Instruction::JP(self.get_word_from_pc(memory_bus)?),
            0xE9 => Instruction::JP_HL,
            0xC4 | 0xCC | 0xD4 | 0xDC => {
                Instruction::CALL_CONDITION(condition(y), self.get_word_from_pc(memory_bus)?)
            }
            0xCD => Instruction::CALL(self.get_word_from_pc(memory_bus)?),
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                Instruction::RST(u16::from(y) * 8)
            }

            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => alu_instruction(
                y,
                InstrArgByte::ImmediateByte(self.get_byte_from_pc(memory_bus)?),
            ),

            0xE0 => Instruction::LD(
                InstrArgByte::AddressDirect(0xff00 | u16::from(self.get_byte_from_pc(memory_bus)?)),
                InstrArgByte::Register(Reg::A),
            ),
            0xF0 => Instruction::LD(
                InstrArgByte::Register(Reg::A),
                InstrArgByte::AddressDirect(0xff00 | u16::from(self.get_byte_from_pc(memory_bus)?)),
            ),
            0xE2 => Instruction::LD(InstrArgByte::Offset(Reg::C), InstrArgByte::Register(Reg::A)),
            0xF2 => Instruction::LD(InstrArgByte::Register(Reg::A), InstrArgByte::Offset(Reg::C)),
            0xEA => Instruction::LD(
                InstrArgByte::AddressDirect(self.get_word_from_pc(memory_bus)?),
                InstrArgByte::Register(Reg::A),
            ),
            0xFA => Instruction::LD(
                InstrArgByte::Register(Reg::A),
                InstrArgByte::AddressDirect(self.get_word_from_pc(memory_bus)?),
            ),

            0xE8 => Instruction::ADD_SP(self.get_signed_byte_from_pc(memory_bus)?),
            0xF8 => Instruction::LDHL_SP(self.get_signed_byte_from_pc(memory_bus)?),
            0xF9 => Instruction::LD_SP_HL,

            0xF3 => Instruction::DI,
            0xFB => Instruction::EI,

            // 0xCB and D3 DB DD E3 E4 EB EC ED F4 FC FD
            _ => {
                return Err(Error::UnknownOpcode {
                    opcode,
                    pc: self.pc.wrapping_sub(1),
                    prefixed: false,
                })
            }
        };

        Ok(instruction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cb_table_columns() {
        assert_eq!(
            Instruction::RLC(InstrArgByte::Register(Reg::B)),
            decode_cb_opcode(0x00)
        );
        assert_eq!(
            Instruction::SWAP(InstrArgByte::AddressRegister(WReg::HL)),
            decode_cb_opcode(0x36)
        );
        assert_eq!(
            Instruction::SRL(InstrArgByte::Register(Reg::A)),
            decode_cb_opcode(0x3F)
        );
        assert_eq!(
            Instruction::BIT(7, InstrArgByte::Register(Reg::H)),
            decode_cb_opcode(0x7C)
        );
        assert_eq!(
            Instruction::RES(0, InstrArgByte::AddressRegister(WReg::HL)),
            decode_cb_opcode(0x86)
        );
        assert_eq!(
            Instruction::SET(7, InstrArgByte::Register(Reg::A)),
            decode_cb_opcode(0xFF)
        );
    }

    #[test]
    fn operand_columns() {
        assert_eq!(InstrArgByte::Register(Reg::L), byte_arg(5));
        assert_eq!(InstrArgByte::AddressRegister(WReg::HL), byte_arg(6));
        assert_eq!(WReg::SP, word_register(3));
        assert_eq!(WReg::AF, stack_register(3));
        assert_eq!(Condition::C, condition(3));
        assert_eq!(
            Instruction::CP(InstrArgByte::ImmediateByte(1)),
            alu_instruction(7, InstrArgByte::ImmediateByte(1))
        );
    }
}
