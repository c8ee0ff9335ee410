use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gameboy_core::cartridge::Cartridge;
use gameboy_core::{Addressable, GameBoy, MemoryBus, Steppable};

/// A ROM-only cartridge whose program at 0x150 is `opcode` repeated, ending in `jp $0150`.
fn cartridge_repeating(opcode: u8) -> Cartridge {
    let mut data = vec![0; 0x8000];
    data[0x100..0x104].copy_from_slice(&[0x00, 0xc3, 0x50, 0x01]);
    data[0x150..0x3ffd].fill(opcode);
    data[0x3ffd..0x4000].copy_from_slice(&[0xc3, 0x50, 0x01]);
    Cartridge::from_data(&data).unwrap()
}

fn repeat_regular_opcode(c: &mut Criterion, name: &str, opcode: u8) {
    let mut gameboy = GameBoy::new(Some(cartridge_repeating(opcode)));
    let mut cpu = gameboy.cpu().clone();
    let memory_bus: &mut MemoryBus = gameboy.memory_bus();
    memory_bus.write_u8(0xffff, 0x00).unwrap();

    c.bench_function(name, |b| {
        b.iter(|| black_box(cpu.step(memory_bus).unwrap()))
    });
}

fn repeat_nop(c: &mut Criterion) {
    repeat_regular_opcode(c, "nop", 0x00);
}

fn repeat_inc_b_reg(c: &mut Criterion) {
    repeat_regular_opcode(c, "inc-b", 0x04);
}

fn bench_gameboy_tick(c: &mut Criterion) {
    let mut gameboy = GameBoy::new(Some(cartridge_repeating(0x00)));

    c.bench_function("gameboy tick", |b| {
        b.iter(|| black_box(gameboy.tick().unwrap()));
    });
}

criterion_group! {
    name = gameboy_benches;
    config = Criterion::default().sample_size(500);
    targets = repeat_nop, repeat_inc_b_reg, bench_gameboy_tick
}

criterion_main!(gameboy_benches);
