mod component;
mod error;

pub mod apu;
pub mod cartridge;
pub mod config;
pub mod cpu;
pub mod emulator;
pub mod gameboy;
pub mod interrupt;
pub mod joypad;
pub mod memory;
pub mod ppu;
pub mod timer;

pub use component::{Address, Addressable, ElapsedTime, Peripheral, Steppable};
pub use config::EmulatorConfig;
pub use error::{Error, Result};
pub use gameboy::GameBoy;
pub use joypad::JoypadInput;
pub use memory::MemoryBus;
