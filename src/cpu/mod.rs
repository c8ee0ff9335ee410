mod alu;
#[allow(clippy::module_inception)]
mod cpu;
mod decode;
pub mod instruction;
pub mod register;
mod timing;

pub use cpu::Cpu;
pub use register::{FlagRegister, Registers};
