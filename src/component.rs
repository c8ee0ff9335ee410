use crate::error::Result;

/// A 16-bit address on the CPU bus.
pub type Address = u16;

/// Elapsed time. The CPU reports M-cycles, peripherals are fed clock cycles (4 per M-cycle).
pub type ElapsedTime = u32;

pub const CLOCKS_PER_M_CYCLE: ElapsedTime = 4;

pub trait Addressable {
    fn read_u8(&mut self, address: Address) -> Result<u8>;

    fn write_u8(&mut self, address: Address, value: u8) -> Result<()>;
}

/// Something that drives time forward and reports how long it took.
pub trait Steppable {
    type Context;

    fn step(&mut self, context: &mut Self::Context) -> Result<ElapsedTime>;
}

/// A memory-mapped device that is told how many clock cycles passed after every CPU step.
pub trait Peripheral: Addressable {
    fn advance(&mut self, cycles: ElapsedTime);
}
