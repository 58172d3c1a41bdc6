use lumen_core::cpu::z80::Z80;
mod common;
use common::TestBus;

fn run_instruction(cpu: &mut Z80, bus: &mut TestBus) -> u32 {
    cpu.step_instruction(bus).expect("instruction should execute")
}

// --- IX/IY substitution for HL ---

#[test]
fn test_ld_ix_nn() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xDD, 0x21, 0x34, 0x12]); // LD IX,0x1234

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 14);
    assert_eq!(cpu.ix, 0x1234);
    assert_eq!(cpu.get_hl(), 0x0000, "HL untouched");
}

#[test]
fn test_add_ix_bc() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x1000;
    cpu.set_bc(0x2000);
    bus.load(0, &[0xDD, 0x09]); // ADD IX,BC

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 15);
    assert_eq!(cpu.ix, 0x3000);
}

#[test]
fn test_add_iy_iy() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.iy = 0x4000;
    cpu.set_hl(0x1111);
    bus.load(0, &[0xFD, 0x29]); // ADD IY,IY: pair index 2 is IY here

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.iy, 0x8000);
    assert_eq!(cpu.get_hl(), 0x1111);
}

#[test]
fn test_jp_ix() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x5678;
    bus.load(0, &[0xDD, 0xE9]); // JP (IX)

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 8);
    assert_eq!(cpu.pc, 0x5678);
}

// --- Displacement forms ---

#[test]
fn test_ld_r_ix_d() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x4000;
    bus.memory[0x4010] = 0x99;
    bus.load(0, &[0xDD, 0x46, 0x10]); // LD B,(IX+0x10)

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 19);
    assert_eq!(cpu.b, 0x99);
}

#[test]
fn test_ld_ix_d_r_negative_displacement() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x4000;
    cpu.c = 0x77;
    bus.load(0, &[0xDD, 0x71, 0xFE]); // LD (IX-2),C

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 19);
    assert_eq!(bus.memory[0x3FFE], 0x77);
}

#[test]
fn test_ld_ix_d_n() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x4000;
    bus.load(0, &[0xDD, 0x36, 0x05, 0xAB]); // LD (IX+5),0xAB

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 19);
    assert_eq!(bus.memory[0x4005], 0xAB);
}

#[test]
fn test_alu_ix_d() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x01;
    cpu.iy = 0x4000;
    bus.memory[0x4003] = 0x41;
    bus.load(0, &[0xFD, 0x86, 0x03]); // ADD A,(IY+3)

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 19);
    assert_eq!(cpu.a, 0x42);
}

#[test]
fn test_inc_ix_d() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x4000;
    bus.memory[0x4001] = 0x0F;
    bus.load(0, &[0xDD, 0x34, 0x01]); // INC (IX+1)

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 23);
    assert_eq!(bus.memory[0x4001], 0x10);
}

#[test]
fn test_ld_h_from_ix_d_uses_real_h() {
    // The memory forms do not substitute IXH/IXL for the register operand
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x4000;
    bus.memory[0x4000] = 0x66;
    bus.load(0, &[0xDD, 0x66, 0x00]); // LD H,(IX+0)

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.h, 0x66);
    assert_eq!(cpu.ix, 0x4000, "IX not written");
}

// --- Undocumented IXH/IXL ---

#[test]
fn test_ld_ixh_n() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x0034;
    bus.load(0, &[0xDD, 0x26, 0x12]); // LD IXH,0x12

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.ix, 0x1234);
    assert_eq!(cpu.h, 0x00, "H untouched");
}

#[test]
fn test_ld_a_ixl() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x12EF;
    bus.load(0, &[0xDD, 0x7D]); // LD A,IXL

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0xEF);
}

#[test]
fn test_ld_iyh_iyl() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.iy = 0x12EF;
    bus.load(0, &[0xFD, 0x65]); // LD IYH,IYL

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.iy, 0xEFEF);
}

#[test]
fn test_alu_on_ixh() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x01;
    cpu.ix = 0x4100;
    bus.load(0, &[0xDD, 0x84]); // ADD A,IXH

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x42);
}

#[test]
fn test_inc_ixl() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x40FF;
    bus.load(0, &[0xDD, 0x2C]); // INC IXL

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.ix, 0x4000);
    assert_ne!(cpu.f & 0x40, 0, "Z from the wrapped low byte");
}

// --- Fall-through behaviour ---

#[test]
fn test_prefixed_unrelated_op_costs_extra_four() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.b = 0x01;
    bus.load(0, &[0xDD, 0x04]); // DD INC B: prefix is dead weight

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 8, "4T base + 4T prefix");
    assert_eq!(cpu.b, 0x02);
}

#[test]
fn test_ex_de_hl_ignores_prefix() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_de(0x1234);
    cpu.set_hl(0x5678);
    cpu.ix = 0x9999;
    bus.load(0, &[0xDD, 0xEB]); // DD EX DE,HL swaps the real HL

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.get_de(), 0x5678);
    assert_eq!(cpu.get_hl(), 0x1234);
    assert_eq!(cpu.ix, 0x9999);
}

#[test]
fn test_chained_prefixes_last_wins() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.ix = 0x1111;
    cpu.iy = 0x2222;
    bus.load(0, &[0xDD, 0xFD, 0xE9]); // DD FD JP (IY)

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 12, "two prefixes, then JP");
    assert_eq!(cpu.pc, 0x2222);
}
