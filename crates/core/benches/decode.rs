// Armulet - ARM/Thumb Instruction Emulation
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use armulet_core::decoder::{self, InstrSize};
use armulet_core::{ArmEmulator, EmulationState, InstructionEmulator, ProcessorMode};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

const ARM_OPCODES: &[(u32, &str)] = &[
    (0xe92d_4ff0, "push"),
    (0xe24d_d010, "sub sp"),
    (0xe59f_1010, "ldr literal"),
    (0xe12f_ff1e, "bx lr"),
    (0xeb00_0010, "bl"),
];

const THUMB_OPCODES: &[(u32, &str)] = &[
    (0xb580, "push"),
    (0xaf00, "add r7, sp"),
    (0xe92d_4ff0, "push.w"),
    (0xf000_f802, "bl"),
    (0x4770, "bx lr"),
];

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");
    for (opcode, name) in ARM_OPCODES {
        group.bench_with_input(BenchmarkId::new("arm", name), opcode, |b, &opcode| {
            b.iter(|| decoder::lookup(black_box(opcode), ProcessorMode::Arm))
        });
    }
    for (opcode, name) in THUMB_OPCODES {
        group.bench_with_input(BenchmarkId::new("thumb", name), opcode, |b, &opcode| {
            b.iter(|| decoder::lookup(black_box(opcode), ProcessorMode::Thumb))
        });
    }
    group.finish();
}

fn bench_evaluate_push(c: &mut Criterion) {
    c.bench_function("evaluate_thumb_push", |b| {
        b.iter(|| {
            let mut state = EmulationState::new();
            state.set_sp(0x2000);
            let mut emulator = ArmEmulator::new(state);
            emulator.set_architecture("armv7");
            emulator.set_instruction(0xb5f0, InstrSize::Size16, ProcessorMode::Thumb, 0x100);
            black_box(emulator.evaluate_instruction())
        })
    });
}

criterion_group!(benches, bench_lookup, bench_evaluate_push);
criterion_main!(benches);
