use crate::component::{Address, Addressable};
use crate::cpu::alu::{self, ShiftOp};
use crate::cpu::register::FlagRegister;
use crate::cpu::Cpu;
use crate::error::{Error, Result};
use crate::memory::MemoryBus;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

impl Reg {
    fn get(self, cpu: &Cpu) -> u8 {
        match self {
            Self::A => cpu.registers.a,
            Self::B => cpu.registers.b,
            Self::C => cpu.registers.c,
            Self::D => cpu.registers.d,
            Self::E => cpu.registers.e,
            Self::H => cpu.registers.h,
            Self::L => cpu.registers.l,
        }
    }

    fn set(self, cpu: &mut Cpu, value: u8) {
        match self {
            Self::A => cpu.registers.a = value,
            Self::B => cpu.registers.b = value,
            Self::C => cpu.registers.c = value,
            Self::D => cpu.registers.d = value,
            Self::E => cpu.registers.e = value,
            Self::H => cpu.registers.h = value,
            Self::L => cpu.registers.l = value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WReg {
    AF,
    BC,
    DE,
    HL,
    SP,
}

impl WReg {
    fn get(self, cpu: &Cpu) -> u16 {
        match self {
            Self::AF => cpu.registers.get_af(),
            Self::BC => cpu.registers.get_bc(),
            Self::DE => cpu.registers.get_de(),
            Self::HL => cpu.registers.get_hl(),
            Self::SP => cpu.sp,
        }
    }

    fn set(self, cpu: &mut Cpu, value: u16) {
        match self {
            Self::AF => cpu.registers.set_af(value),
            Self::BC => cpu.registers.set_bc(value),
            Self::DE => cpu.registers.set_de(value),
            Self::HL => cpu.registers.set_hl(value),
            Self::SP => cpu.sp = value,
        }
    }
}

/// An 8-bit operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrArgByte {
    ImmediateByte(u8),
    AddressDirect(Address),
    AddressRegister(WReg),
    Register(Reg),
    /// `0xFF00 + reg`, the `LD (C),A` family.
    Offset(Reg),
}

impl InstrArgByte {
    fn get_u8(self, cpu: &Cpu, memory_bus: &mut MemoryBus) -> Result<u8> {
        match self {
            Self::ImmediateByte(byte) => Ok(byte),
            Self::AddressDirect(address) => memory_bus.read_u8(address),
            Self::AddressRegister(wreg) => memory_bus.read_u8(wreg.get(cpu)),
            Self::Register(reg) => Ok(reg.get(cpu)),
            Self::Offset(reg) => memory_bus.read_u8(0xff00 | u16::from(reg.get(cpu))),
        }
    }

    fn set_u8(self, cpu: &mut Cpu, memory_bus: &mut MemoryBus, value: u8) -> Result<()> {
        match self {
            Self::ImmediateByte(_) => Err(Error::from_message(
                "immediate operand used as a destination".to_string(),
            )),
            Self::AddressDirect(address) => memory_bus.write_u8(address, value),
            Self::AddressRegister(wreg) => memory_bus.write_u8(wreg.get(cpu), value),
            Self::Register(reg) => {
                reg.set(cpu, value);
                Ok(())
            }
            Self::Offset(reg) => memory_bus.write_u8(0xff00 | u16::from(reg.get(cpu)), value),
        }
    }
}

pub type Bit = u8;

/// Branch condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    NZ,
    Z,
    NC,
    C,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchStatus {
    Branch,
    NoBranch,
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /* LD */
    LD(InstrArgByte, InstrArgByte),
    LD_WORD(WReg, u16),
    LD_DIRECT_SP(Address),
    LD_SP_HL,
    LDHL_SP(i8),

    /* LDD / LDI */
    LDD_A_FROM_HL,
    LDD_A_INTO_HL,
    LDI_A_FROM_HL,
    LDI_A_INTO_HL,

    PUSH(WReg),
    POP(WReg),

    /* 8-bit arithmetic */
    ADD(InstrArgByte),
    ADC(InstrArgByte),
    SUB(InstrArgByte),
    SBC(InstrArgByte),
    AND(InstrArgByte),
    OR(InstrArgByte),
    XOR(InstrArgByte),
    CP(InstrArgByte),
    INC(InstrArgByte),
    DEC(InstrArgByte),

    /* 16-bit arithmetic */
    ADD_HL(WReg),
    ADD_SP(i8),
    INC_WORD(WReg),
    DEC_WORD(WReg),

    DAA,
    CPL,
    CCF,
    SCF,

    NOP,
    HALT,
    STOP,
    DI,
    EI,

    /* Rotates & shifts */
    RLCA,
    RLA,
    RRCA,
    RRA,
    RLC(InstrArgByte),
    RRC(InstrArgByte),
    RL(InstrArgByte),
    RR(InstrArgByte),
    SLA(InstrArgByte),
    SRA(InstrArgByte),
    SWAP(InstrArgByte),
    SRL(InstrArgByte),

    /* Bit opcodes */
    BIT(Bit, InstrArgByte),
    RES(Bit, InstrArgByte),
    SET(Bit, InstrArgByte),

    /* Jumps */
    JP(Address),
    JP_CONDITION(Condition, Address),
    JP_HL,
    JR(i8),
    JR_CONDITION(Condition, i8),

    /* Calls, restarts and returns */
    CALL(Address),
    CALL_CONDITION(Condition, Address),
    RST(Address),
    RET,
    RET_CONDITION(Condition),
    RETI,
}

impl Cpu {
    fn test_condition(&self, condition: Condition) -> bool {
        match condition {
            Condition::Z => self.registers.f.zero,
            Condition::NZ => !self.registers.f.zero,
            Condition::C => self.registers.f.carry,
            Condition::NC => !self.registers.f.carry,
        }
    }

    fn shift(
        &mut self,
        memory_bus: &mut MemoryBus,
        op: ShiftOp,
        target: InstrArgByte,
    ) -> Result<()> {
        let value = target.get_u8(self, memory_bus)?;
        let (result, flags) = alu::shift(op, value, self.registers.f.carry);
        target.set_u8(self, memory_bus, result)?;
        self.registers.f = flags;
        Ok(())
    }

    /// Accumulator-only rotates always clear Z.
    fn rotate_accumulator(&mut self, op: ShiftOp) {
        let (result, mut flags) = alu::shift(op, self.registers.a, self.registers.f.carry);
        flags.zero = false;
        self.registers.a = result;
        self.registers.f = flags;
    }

    fn arithmetic(
        &mut self,
        memory_bus: &mut MemoryBus,
        source: InstrArgByte,
        op: fn(u8, u8, bool) -> (u8, FlagRegister),
        use_carry: bool,
        store: bool,
    ) -> Result<()> {
        let value = source.get_u8(self, memory_bus)?;
        let carry_in = use_carry && self.registers.f.carry;
        let (result, flags) = op(self.registers.a, value, carry_in);
        if store {
            self.registers.a = result;
        }
        self.registers.f = flags;
        Ok(())
    }

    fn logic(
        &mut self,
        memory_bus: &mut MemoryBus,
        source: InstrArgByte,
        op: fn(u8, u8) -> (u8, FlagRegister),
    ) -> Result<()> {
        let value = source.get_u8(self, memory_bus)?;
        let (result, flags) = op(self.registers.a, value);
        self.registers.a = result;
        self.registers.f = flags;
        Ok(())
    }

    /// Runs one decoded instruction. Operand bytes have already been consumed, so PC points at
    /// the next instruction when this is called.
    pub fn execute_instruction(
        &mut self,
        memory_bus: &mut MemoryBus,
        instruction: Instruction,
    ) -> Result<BranchStatus> {
        let mut branch_status = BranchStatus::NoBranch;
        match instruction {
            Instruction::LD(target, source) => {
                let value = source.get_u8(self, memory_bus)?;
                target.set_u8(self, memory_bus, value)?;
            }
            Instruction::LD_WORD(target, value) => target.set(self, value),
            Instruction::LD_DIRECT_SP(address) => {
                let [low, high] = self.sp.to_le_bytes();
                memory_bus.write_u8(address, low)?;
                memory_bus.write_u8(address.wrapping_add(1), high)?;
            }
            Instruction::LD_SP_HL => self.sp = self.registers.get_hl(),
            Instruction::LDHL_SP(offset) => {
                let (sum, flags) = alu::add_sp_offset(self.sp, offset);
                self.registers.set_hl(sum);
                self.registers.f = flags;
            }
            Instruction::LDD_A_FROM_HL | Instruction::LDI_A_FROM_HL => {
                let hl = self.registers.get_hl();
                self.registers.a = memory_bus.read_u8(hl)?;
                self.registers.set_hl(step_hl(hl, instruction));
            }
            Instruction::LDD_A_INTO_HL | Instruction::LDI_A_INTO_HL => {
                let hl = self.registers.get_hl();
                memory_bus.write_u8(hl, self.registers.a)?;
                self.registers.set_hl(step_hl(hl, instruction));
            }
            Instruction::PUSH(pair) => {
                let value = pair.get(self);
                self.push_word(memory_bus, value)?;
            }
            Instruction::POP(pair) => {
                let value = self.pop_word(memory_bus)?;
                pair.set(self, value);
            }

            /* Arithmetic */
            Instruction::ADD(source) => self.arithmetic(memory_bus, source, alu::add, false, true)?,
            Instruction::ADC(source) => self.arithmetic(memory_bus, source, alu::add, true, true)?,
            Instruction::SUB(source) => self.arithmetic(memory_bus, source, alu::sub, false, true)?,
            Instruction::SBC(source) => self.arithmetic(memory_bus, source, alu::sub, true, true)?,
            Instruction::CP(source) => self.arithmetic(memory_bus, source, alu::sub, false, false)?,
            Instruction::AND(source) => self.logic(memory_bus, source, alu::and)?,
            Instruction::OR(source) => self.logic(memory_bus, source, alu::or)?,
            Instruction::XOR(source) => self.logic(memory_bus, source, alu::xor)?,
            Instruction::INC(target) => {
                let value = target.get_u8(self, memory_bus)?;
                let (result, flags) = alu::inc(value, self.registers.f);
                target.set_u8(self, memory_bus, result)?;
                self.registers.f = flags;
            }
            Instruction::DEC(target) => {
                let value = target.get_u8(self, memory_bus)?;
                let (result, flags) = alu::dec(value, self.registers.f);
                target.set_u8(self, memory_bus, result)?;
                self.registers.f = flags;
            }
            Instruction::ADD_HL(source) => {
                let (sum, flags) =
                    alu::add_hl(self.registers.get_hl(), source.get(self), self.registers.f);
                self.registers.set_hl(sum);
                self.registers.f = flags;
            }
            Instruction::ADD_SP(offset) => {
                let (sum, flags) = alu::add_sp_offset(self.sp, offset);
                self.sp = sum;
                self.registers.f = flags;
            }
            Instruction::INC_WORD(target) => {
                let value = target.get(self).wrapping_add(1);
                target.set(self, value);
            }
            Instruction::DEC_WORD(target) => {
                let value = target.get(self).wrapping_sub(1);
                target.set(self, value);
            }

            /* Miscellaneous */
            Instruction::DAA => {
                let (result, flags) = alu::daa(self.registers.a, self.registers.f);
                self.registers.a = result;
                self.registers.f = flags;
            }
            Instruction::CPL => {
                self.registers.a = !self.registers.a;
                self.registers.f.subtract = true;
                self.registers.f.half_carry = true;
            }
            Instruction::CCF => {
                self.registers.f.subtract = false;
                self.registers.f.half_carry = false;
                self.registers.f.carry = !self.registers.f.carry;
            }
            Instruction::SCF => {
                self.registers.f.subtract = false;
                self.registers.f.half_carry = false;
                self.registers.f.carry = true;
            }
            Instruction::NOP => {}
            Instruction::HALT => {
                debug!("Halting at {:#06x}", self.pc.wrapping_sub(1));
                self.halted = true;
            }
            Instruction::STOP => {
                debug!("Stopping at {:#06x}", self.pc.wrapping_sub(2));
                self.stopped = true;
            }
            Instruction::DI => self.interrupt_enabled = false,
            Instruction::EI => self.enable_interrupts_pending = true,

            /* Rotates & shifts */
            Instruction::RLCA => self.rotate_accumulator(ShiftOp::Rlc),
            Instruction::RLA => self.rotate_accumulator(ShiftOp::Rl),
            Instruction::RRCA => self.rotate_accumulator(ShiftOp::Rrc),
            Instruction::RRA => self.rotate_accumulator(ShiftOp::Rr),
            Instruction::RLC(target) => self.shift(memory_bus, ShiftOp::Rlc, target)?,
            Instruction::RRC(target) => self.shift(memory_bus, ShiftOp::Rrc, target)?,
            Instruction::RL(target) => self.shift(memory_bus, ShiftOp::Rl, target)?,
            Instruction::RR(target) => self.shift(memory_bus, ShiftOp::Rr, target)?,
            Instruction::SLA(target) => self.shift(memory_bus, ShiftOp::Sla, target)?,
            Instruction::SRA(target) => self.shift(memory_bus, ShiftOp::Sra, target)?,
            Instruction::SWAP(target) => self.shift(memory_bus, ShiftOp::Swap, target)?,
            Instruction::SRL(target) => self.shift(memory_bus, ShiftOp::Srl, target)?,

            /* Bit opcodes */
            Instruction::BIT(bit, target) => {
                let value = target.get_u8(self, memory_bus)?;
                self.registers.f = alu::bit(bit, value, self.registers.f);
            }
            Instruction::SET(bit, target) => {
                let value = target.get_u8(self, memory_bus)?;
                target.set_u8(self, memory_bus, value | (1 << bit))?;
            }
            Instruction::RES(bit, target) => {
                let value = target.get_u8(self, memory_bus)?;
                target.set_u8(self, memory_bus, value & !(1 << bit))?;
            }

            /* Jumps */
            Instruction::JP(address) => self.pc = address,
            Instruction::JP_CONDITION(condition, address) => {
                if self.test_condition(condition) {
                    self.pc = address;
                    branch_status = BranchStatus::Branch;
                }
            }
            Instruction::JP_HL => self.pc = self.registers.get_hl(),
            Instruction::JR(offset) => self.pc = self.pc.wrapping_add_signed(offset.into()),
            Instruction::JR_CONDITION(condition, offset) => {
                if self.test_condition(condition) {
                    self.pc = self.pc.wrapping_add_signed(offset.into());
                    branch_status = BranchStatus::Branch;
                }
            }

            /* Calls */
            Instruction::CALL(address) => {
                self.push_word(memory_bus, self.pc)?;
                self.pc = address;
            }
            Instruction::CALL_CONDITION(condition, address) => {
                if self.test_condition(condition) {
                    self.push_word(memory_bus, self.pc)?;
                    self.pc = address;
                    branch_status = BranchStatus::Branch;
                }
            }
            Instruction::RST(vector) => {
                self.push_word(memory_bus, self.pc)?;
                self.pc = vector;
            }

            /* Returns */
            Instruction::RET => self.pc = self.pop_word(memory_bus)?,
            Instruction::RET_CONDITION(condition) => {
                if self.test_condition(condition) {
                    self.pc = self.pop_word(memory_bus)?;
                    branch_status = BranchStatus::Branch;
                }
            }
            Instruction::RETI => {
                self.pc = self.pop_word(memory_bus)?;
                self.interrupt_enabled = true;
            }
        }

        Ok(branch_status)
    }
}

fn step_hl(hl: u16, instruction: Instruction) -> u16 {
    match instruction {
        Instruction::LDI_A_FROM_HL | Instruction::LDI_A_INTO_HL => hl.wrapping_add(1),
        _ => hl.wrapping_sub(1),
    }
}
