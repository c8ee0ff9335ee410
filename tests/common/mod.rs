#![allow(dead_code)]

use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use gameboy_core::emulator::events::{EmulationControlEvent, EmulationEvent};
use gameboy_core::emulator::GameboyEmulator;
use gameboy_core::{EmulatorConfig, GameBoy};

pub const ROM_BANK_SIZE: usize = 0x4000;
pub const PROGRAM_START: usize = 0x150;

/// Assembles a cartridge image in memory. The entry point at 0x100 runs `nop ; jp $0150`.
pub struct RomBuilder {
    data: Vec<u8>,
}

impl RomBuilder {
    pub fn new(cartridge_type: u8) -> Self {
        let mut data = vec![0; 2 * ROM_BANK_SIZE];
        data[0x100..0x104].copy_from_slice(&[0x00, 0xc3, 0x50, 0x01]);
        data[0x134..0x138].copy_from_slice(b"TEST");
        data[0x147] = cartridge_type;
        Self { data }
    }

    pub fn ram_size_code(mut self, code: u8) -> Self {
        self.data[0x149] = code;
        self
    }

    pub fn program(self, program: &[u8]) -> Self {
        self.bytes_at(PROGRAM_START, program)
    }

    pub fn bytes_at(mut self, address: usize, bytes: &[u8]) -> Self {
        self.data[address..address + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

pub fn unthrottled() -> EmulatorConfig {
    EmulatorConfig {
        throttled: false,
        ..EmulatorConfig::default()
    }
}

/// Collects serial output until it ends with `target` or the timeout passes.
pub fn wait_for_serial(
    events: &Receiver<EmulationEvent>,
    target: &[u8],
    timeout: Duration,
) -> Vec<u8> {
    let deadline = Instant::now() + timeout;
    let mut serial_port_output = Vec::new();

    while !serial_port_output.ends_with(target) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match events.recv_timeout(remaining) {
            Ok(EmulationEvent::SerialData(byte)) => serial_port_output.push(byte),
            Ok(EmulationEvent::Stopped { error }) => panic!("emulation stopped: {error:?}"),
            Ok(_) => {}
            Err(_) => panic!(
                "timed out with serial output {:?}",
                String::from_utf8_lossy(&serial_port_output)
            ),
        }
    }
    serial_port_output
}

/// Runs `gameboy` on the emulator thread until its serial output ends with `target`, then quits.
pub fn run_until_serial(gameboy: GameBoy, target: &[u8]) -> Vec<u8> {
    let (join_handle, control, events) = GameboyEmulator::gameboy_thread(gameboy, &unthrottled());
    let output = wait_for_serial(&events, target, Duration::from_secs(10));
    control.send(EmulationControlEvent::Quit).unwrap();
    join_handle.join().unwrap().unwrap();
    output
}
