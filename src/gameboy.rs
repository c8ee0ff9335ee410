use crate::cartridge::Cartridge;
use crate::component::{Addressable, ElapsedTime, Peripheral, Steppable, CLOCKS_PER_M_CYCLE};
use crate::cpu::Cpu;
use crate::error::Result;
use crate::interrupt::Interrupt;
use crate::joypad::JoypadInput;
use crate::memory::MemoryBus;
use core::fmt;
use log::{info, trace};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameboyDebugInfo {
    pub pc: u16,
    pub opcode: u8, // opcode at pc
    pub sp: u16,
    pub register_a: u8,
    pub register_f: [bool; 4],
    pub register_bc: u16,
    pub register_de: u16,
    pub register_hl: u16,
    pub interrupt_enabled: bool,
    pub halted: bool,
    /// M-cycles since power on.
    pub total_cycles: u64,
}

/// The CPU together with everything it can address. One `tick` is one instruction.
pub struct GameBoy {
    pub(crate) cpu: Cpu,
    pub(crate) memory_bus: MemoryBus,
    total_cycles: u64,
}

impl GameBoy {
    /// A machine in the post-boot state, about to run the cartridge at 0x100.
    pub fn new(cartridge: Option<Cartridge>) -> Self {
        if let Some(cartridge) = &cartridge {
            info!("Inserted cartridge: {cartridge}");
        }
        Self {
            cpu: Cpu::new(),
            memory_bus: MemoryBus::new(cartridge),
            total_cycles: 0,
        }
    }

    /// A machine at power on that runs `boot_rom` from 0x0000 before the cartridge.
    pub fn with_boot_rom(cartridge: Option<Cartridge>, boot_rom: &[u8]) -> Result<Self> {
        let mut memory_bus = MemoryBus::new_at_reset(cartridge);
        memory_bus.load_boot_rom(boot_rom)?;
        Ok(Self {
            cpu: Cpu::new_at_reset(),
            memory_bus,
            total_cycles: 0,
        })
    }

    pub fn get_pc(&self) -> u16 {
        self.cpu.pc
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn memory_bus(&mut self) -> &mut MemoryBus {
        &mut self.memory_bus
    }

    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Runs one instruction, dispatches any interrupt, then advances every peripheral by the
    /// time that took. Returns the elapsed M-cycles.
    pub fn tick(&mut self) -> Result<ElapsedTime> {
        let mut elapsed_cycles = self.cpu.step(&mut self.memory_bus)?;

        self.poll_interrupt_sources();
        elapsed_cycles += self.cpu.service_interrupts(&mut self.memory_bus)?;

        let clocks = elapsed_cycles * CLOCKS_PER_M_CYCLE;
        self.memory_bus.timer.advance(clocks);
        self.memory_bus.ppu.advance(clocks);
        self.memory_bus.apu.advance(clocks);
        trace!("stepped peripherals for {elapsed_cycles} M-cycles");

        self.total_cycles += u64::from(elapsed_cycles);
        Ok(elapsed_cycles)
    }

    /// Moves one-shot peripheral events into IF.
    fn poll_interrupt_sources(&mut self) {
        let bus = &mut self.memory_bus;
        if bus.ppu.take_vblank_interrupt() {
            bus.interrupts.request(Interrupt::VBlank);
        }
        if bus.ppu.take_stat_interrupt() {
            bus.interrupts.request(Interrupt::Stat);
        }
        if bus.timer.take_overflow() {
            bus.interrupts.request(Interrupt::Timer);
        }
    }

    /// Presses an input. A new press requests the joypad interrupt and ends STOP.
    pub fn press(&mut self, input: JoypadInput) {
        if self.memory_bus.joypad.press(input) {
            self.memory_bus.interrupts.request(Interrupt::Joypad);
            self.cpu.wake_from_stop();
        }
    }

    pub fn release(&mut self, input: JoypadInput) {
        self.memory_bus.joypad.release(input);
    }

    pub fn take_serial_output(&mut self) -> Vec<u8> {
        self.memory_bus.take_serial_output()
    }

    /// Writes the cartridge's mapped RAM bank to its save file, if there is one.
    pub fn flush(&mut self) -> Result<()> {
        match self.memory_bus.cartridge_mut() {
            Some(cartridge) => cartridge.flush(),
            None => Ok(()),
        }
    }

    pub fn debug_info(&mut self) -> GameboyDebugInfo {
        let opcode = self.memory_bus.read_u8(self.cpu.pc).unwrap_or(0xff);
        let cpu = &self.cpu;

        let register_f = [
            cpu.registers.f.zero,
            cpu.registers.f.subtract,
            cpu.registers.f.half_carry,
            cpu.registers.f.carry,
        ];

        GameboyDebugInfo {
            pc: cpu.pc,
            opcode,
            sp: cpu.sp,
            register_a: cpu.registers.a,
            register_f,
            register_bc: cpu.registers.get_bc(),
            register_de: cpu.registers.get_de(),
            register_hl: cpu.registers.get_hl(),
            interrupt_enabled: cpu.interrupts_enabled(),
            halted: cpu.is_halted(),
            total_cycles: self.total_cycles,
        }
    }
}

impl std::fmt::Display for GameboyDebugInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pc: {:04x} ({:02x}), sp: {:04x}, A: {:02x}, F: {}{}{}{}, BC: {:04x}, DE: {:04x}, HL: {:04x}, IME: {}{} | cycles: {}",
            self.pc,
            self.opcode,
            self.sp,
            self.register_a,
            if self.register_f[0] { 'Z' } else { '-' },
            if self.register_f[1] { 'N' } else { '-' },
            if self.register_f[2] { 'H' } else { '-' },
            if self.register_f[3] { 'C' } else { '-' },
            self.register_bc,
            self.register_de,
            self.register_hl,
            u8::from(self.interrupt_enabled),
            if self.halted { " (halted)" } else { "" },
            self.total_cycles,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppu::{DOTS_PER_LINE, LINES_PER_FRAME};

    /// A machine with no cartridge running `program` from work RAM.
    fn gameboy_with_program(program: &[u8]) -> GameBoy {
        let mut gameboy = GameBoy::new(None);
        for (offset, &byte) in program.iter().enumerate() {
            gameboy
                .memory_bus
                .write_u8(0xc000 + offset as u16, byte)
                .unwrap();
        }
        gameboy.cpu.pc = 0xc000;
        gameboy
    }

    #[test]
    fn timer_overflow_interrupts_halt() {
        // ld a,$05 ; ldh ($07),a ; ld a,$f0 ; ldh ($05),a ; ld a,$04 ; ldh ($ff),a ; ei ; halt
        let mut gameboy = gameboy_with_program(&[
            0x3e, 0x05, 0xe0, 0x07, 0x3e, 0xf0, 0xe0, 0x05, 0x3e, 0x04, 0xe0, 0xff, 0xfb, 0x76,
        ]);
        for _ in 0..8 {
            gameboy.tick().unwrap();
        }
        assert!(gameboy.cpu.is_halted());

        let mut ticks = 0;
        while gameboy.get_pc() != Interrupt::Timer.vector() {
            gameboy.tick().unwrap();
            ticks += 1;
            assert!(ticks < 100, "timer interrupt never dispatched");
        }
        assert!(!gameboy.cpu.is_halted());
        assert!(!gameboy.cpu.interrupts_enabled());
    }

    #[test]
    fn vblank_is_requested_once_per_frame() {
        // jr -2
        let mut gameboy = gameboy_with_program(&[0x18, 0xfe]);
        let frame = u64::from(DOTS_PER_LINE * ElapsedTime::from(LINES_PER_FRAME))
            / u64::from(CLOCKS_PER_M_CYCLE);

        let mut requests = 0;
        while gameboy.total_cycles() < 2 * frame {
            gameboy.tick().unwrap();
            if gameboy.memory_bus.interrupts.is_requested(Interrupt::VBlank) {
                requests += 1;
                gameboy.memory_bus.write_u8(0xff0f, 0).unwrap();
            }
        }
        assert_eq!(2, requests);
    }

    #[test]
    fn press_wakes_stop_and_requests_joypad() {
        // stop ; nop
        let mut gameboy = gameboy_with_program(&[0x10, 0x00, 0x00]);
        gameboy.tick().unwrap();
        assert!(gameboy.cpu.is_stopped());
        assert_eq!(1, gameboy.tick().unwrap());
        assert_eq!(0xc002, gameboy.get_pc());

        gameboy.press(JoypadInput::Start);
        assert!(!gameboy.cpu.is_stopped());
        assert!(gameboy.memory_bus.interrupts.is_requested(Interrupt::Joypad));

        gameboy.memory_bus.write_u8(0xff0f, 0).unwrap();
        gameboy.press(JoypadInput::Start);
        assert!(!gameboy.memory_bus.interrupts.is_requested(Interrupt::Joypad));
    }

    #[test]
    fn stop_ignores_pending_interrupts() {
        // stop ; nop
        let mut gameboy = gameboy_with_program(&[0x10, 0x00, 0x00]);
        gameboy.memory_bus.write_u8(0xffff, 0x04).unwrap();
        gameboy.tick().unwrap();
        assert!(gameboy.cpu.is_stopped());

        gameboy.cpu.interrupt_enabled = true;
        gameboy.memory_bus.interrupts.request(Interrupt::Timer);
        let sp = gameboy.cpu.sp;
        assert_eq!(1, gameboy.tick().unwrap());

        assert!(gameboy.cpu.is_stopped());
        assert!(gameboy.cpu.interrupts_enabled());
        assert_eq!(0xc002, gameboy.get_pc());
        assert_eq!(sp, gameboy.cpu.sp);
        assert!(gameboy.memory_bus.interrupts.is_requested(Interrupt::Timer));
    }

    #[test]
    fn debug_info_snapshot() {
        let mut gameboy = gameboy_with_program(&[0x00]);
        gameboy.tick().unwrap();
        let info = gameboy.debug_info();
        assert_eq!(0xc001, info.pc);
        assert_eq!(0xfffe, info.sp);
        assert_eq!(0x01, info.register_a);
        assert_eq!([true, false, true, true], info.register_f);
        assert_eq!(0x0013, info.register_bc);
        assert_eq!(1, info.total_cycles);
        assert!(info.to_string().starts_with("pc: c001"));
    }
}
