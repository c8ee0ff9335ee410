use crate::component::{Addressable, ElapsedTime, Steppable};
use crate::cpu::decode::decode_cb_opcode;
use crate::cpu::instruction::BranchStatus;
use crate::cpu::register::Registers;
use crate::cpu::timing;
use crate::error::{Error, Result};
use crate::memory::MemoryBus;
use log::{debug, trace};

const ENABLE_INTERRUPTS_OPCODE: u8 = 0xFB;
const PREFIX_OPCODE: u8 = 0xCB;

/// An unknown opcode the CPU met. Once set the CPU refuses to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fault {
    opcode: u8,
    pc: u16,
    prefixed: bool,
}

impl From<Fault> for Error {
    fn from(fault: Fault) -> Self {
        Error::UnknownOpcode {
            opcode: fault.opcode,
            pc: fault.pc,
            prefixed: fault.prefixed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cpu {
    pub registers: Registers,
    pub sp: u16,
    pub pc: u16,
    /// IME, the global interrupt latch.
    pub(crate) interrupt_enabled: bool,
    /// Set by EI, applied at the start of the following step.
    pub(crate) enable_interrupts_pending: bool,
    pub(crate) halted: bool,
    pub(crate) stopped: bool,
    fault: Option<Fault>,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// A CPU in the state the boot ROM leaves behind, ready to run the cartridge at 0x100.
    pub fn new() -> Cpu {
        let mut cpu = Cpu::new_at_reset();
        cpu.emulate_bootrom();
        cpu
    }

    /// A CPU straight out of reset, for running a real boot ROM from 0x0000.
    pub fn new_at_reset() -> Cpu {
        Cpu {
            registers: Registers::default(),
            sp: 0,
            pc: 0,
            interrupt_enabled: false,
            enable_interrupts_pending: false,
            halted: false,
            stopped: false,
            fault: None,
        }
    }

    /// Initialize the CPU's registers to post-bootrom values
    fn emulate_bootrom(&mut self) {
        self.pc = 0x100;
        self.registers.a = 0x01;
        self.registers.f = 0xB0.into();
        self.registers.set_bc(0x0013);
        self.registers.set_de(0x00D8);
        self.registers.set_hl(0x014D);
        self.sp = 0xFFFE;
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.interrupt_enabled
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// True once an unknown opcode has locked the CPU.
    pub fn is_locked(&self) -> bool {
        self.fault.is_some()
    }

    /// Leaves STOP mode. Called when a joypad input is newly pressed.
    pub fn wake_from_stop(&mut self) {
        if self.stopped {
            debug!("Waking from STOP");
            self.stopped = false;
        }
    }

    pub fn get_byte_from_pc(&mut self, memory_bus: &mut MemoryBus) -> Result<u8> {
        let byte = memory_bus.read_u8(self.pc)?;
        self.pc = self.pc.wrapping_add(1);
        Ok(byte)
    }

    pub fn get_signed_byte_from_pc(&mut self, memory_bus: &mut MemoryBus) -> Result<i8> {
        Ok(self.get_byte_from_pc(memory_bus)? as i8)
    }

    pub fn get_word_from_pc(&mut self, memory_bus: &mut MemoryBus) -> Result<u16> {
        let bytes = [
            self.get_byte_from_pc(memory_bus)?,
            self.get_byte_from_pc(memory_bus)?,
        ];
        Ok(u16::from_le_bytes(bytes))
    }

    /// Pushes high byte then low byte, so the low byte ends up on top of the stack.
    pub fn push_word(&mut self, memory_bus: &mut MemoryBus, value: u16) -> Result<()> {
        let [low, high] = value.to_le_bytes();
        self.sp = self.sp.wrapping_sub(1);
        memory_bus.write_u8(self.sp, high)?;
        self.sp = self.sp.wrapping_sub(1);
        memory_bus.write_u8(self.sp, low)
    }

    pub fn pop_word(&mut self, memory_bus: &mut MemoryBus) -> Result<u16> {
        let low = memory_bus.read_u8(self.sp)?;
        self.sp = self.sp.wrapping_add(1);
        let high = memory_bus.read_u8(self.sp)?;
        self.sp = self.sp.wrapping_add(1);
        Ok(u16::from_le_bytes([low, high]))
    }

    /// Fetches, decodes and executes one instruction, returning its duration in M-cycles.
    fn execute_next(&mut self, memory_bus: &mut MemoryBus) -> Result<ElapsedTime> {
        let opcode = self.get_byte_from_pc(memory_bus)?;

        if self.enable_interrupts_pending {
            self.enable_interrupts_pending = false;
            if opcode != ENABLE_INTERRUPTS_OPCODE {
                self.interrupt_enabled = true;
            }
        }

        if opcode == PREFIX_OPCODE {
            let opcode = self.get_byte_from_pc(memory_bus)?;
            let instruction = decode_cb_opcode(opcode);
            trace!("{:#06x}: {:?}", self.pc.wrapping_sub(2), instruction);
            self.execute_instruction(memory_bus, instruction)?;
            return Ok(timing::cb_cycles(opcode).into());
        }

        let address = self.pc.wrapping_sub(1);
        let instruction = self.decode_regular_opcode(memory_bus, opcode)?;
        trace!("{:#06x}: {:?}", address, instruction);
        let cycles = match self.execute_instruction(memory_bus, instruction)? {
            BranchStatus::Branch => timing::branch_taken_cycles(opcode),
            BranchStatus::NoBranch => timing::base_cycles(opcode),
        };
        Ok(cycles.into())
    }

    /// Polls the interrupt controller after a step.
    ///
    /// Any enabled pending interrupt ends HALT, whatever the state of IME. With IME set the
    /// highest-priority request is acknowledged and dispatched: PC is pushed, IME cleared and
    /// control moves to the request's vector. Returns the M-cycles spent dispatching (0 or 5).
    ///
    /// A stopped CPU ignores requests entirely; only a joypad press brings it out of STOP.
    pub fn service_interrupts(&mut self, memory_bus: &mut MemoryBus) -> Result<ElapsedTime> {
        if self.stopped || memory_bus.interrupts.pending() == 0 {
            return Ok(0);
        }

        if self.halted {
            debug!("Waking from HALT");
            self.halted = false;
        }

        if !self.interrupt_enabled {
            return Ok(0);
        }

        self.interrupt_enabled = false;
        self.push_word(memory_bus, self.pc)?;

        // The push may have overwritten IE, in which case nothing is left to dispatch.
        self.pc = match memory_bus.interrupts.highest_priority() {
            Some(interrupt) => {
                debug!("Dispatching {} interrupt", interrupt.as_ref());
                memory_bus.interrupts.acknowledge(interrupt);
                interrupt.vector()
            }
            None => 0x0000,
        };

        Ok(5)
    }
}

impl Steppable for Cpu {
    type Context = MemoryBus;

    /// Runs one instruction, or idles for one M-cycle while halted or stopped. The result is in
    /// M-cycles and includes any DMA stall the instruction triggered.
    fn step(&mut self, memory_bus: &mut MemoryBus) -> Result<ElapsedTime> {
        if let Some(fault) = self.fault {
            return Err(fault.into());
        }

        let cycles = if self.halted || self.stopped {
            1
        } else {
            match self.execute_next(memory_bus) {
                Ok(cycles) => cycles,
                Err(Error::UnknownOpcode {
                    opcode,
                    pc,
                    prefixed,
                }) => {
                    let fault = Fault {
                        opcode,
                        pc,
                        prefixed,
                    };
                    self.fault = Some(fault);
                    return Err(fault.into());
                }
                Err(err) => return Err(err),
            }
        };

        Ok(cycles + memory_bus.take_stall_cycles())
    }
}
