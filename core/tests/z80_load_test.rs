use lumen_core::cpu::z80::Z80;
mod common;
use common::TestBus;

fn run_instruction(cpu: &mut Z80, bus: &mut TestBus) -> u32 {
    cpu.step_instruction(bus).expect("instruction should execute")
}

#[test]
fn test_ld_r_n() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x06, 0x42]); // LD B,0x42

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 7);
    assert_eq!(cpu.b, 0x42);
}

#[test]
fn test_ld_rr_nn() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0x21, 0x34, 0x12]); // LD HL,0x1234

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 10);
    assert_eq!(cpu.get_hl(), 0x1234);
}

#[test]
fn test_ld_r_r() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.c = 0x99;
    bus.load(0, &[0x41]); // LD B,C

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 4);
    assert_eq!(cpu.b, 0x99);
}

#[test]
fn test_ld_r_hl() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x3000);
    bus.memory[0x3000] = 0x7E;
    bus.load(0, &[0x5E]); // LD E,(HL)

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 7);
    assert_eq!(cpu.e, 0x7E);
}

#[test]
fn test_ld_hl_r() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x3000);
    cpu.a = 0x5A;
    bus.load(0, &[0x77]); // LD (HL),A

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(bus.memory[0x3000], 0x5A);
}

#[test]
fn test_ld_hl_n() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x2500);
    bus.load(0, &[0x36, 0xAB]); // LD (HL),0xAB

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 10);
    assert_eq!(bus.memory[0x2500], 0xAB);
}

#[test]
fn test_ld_a_bc_de() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x1111);
    cpu.set_de(0x2222);
    bus.memory[0x1111] = 0x01;
    bus.memory[0x2222] = 0x02;
    bus.load(0, &[0x0A, 0x1A]); // LD A,(BC); LD A,(DE)

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 7);
    assert_eq!(cpu.a, 0x01);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x02);
}

#[test]
fn test_ld_nn_a_and_back() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0xD7;
    bus.load(0, &[0x32, 0x00, 0x80, 0x3E, 0x00, 0x3A, 0x00, 0x80]);
    // LD (0x8000),A; LD A,0; LD A,(0x8000)

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 13);
    assert_eq!(bus.memory[0x8000], 0xD7);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x00);

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 13);
    assert_eq!(cpu.a, 0xD7);
}

#[test]
fn test_ld_nn_hl_little_endian() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0xBEEF);
    bus.load(0, &[0x22, 0x00, 0x40]); // LD (0x4000),HL

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 16);
    assert_eq!(bus.memory[0x4000], 0xEF, "L first");
    assert_eq!(bus.memory[0x4001], 0xBE);
}

#[test]
fn test_ld_hl_nn_indirect() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    bus.memory[0x4000] = 0x34;
    bus.memory[0x4001] = 0x12;
    bus.load(0, &[0x2A, 0x00, 0x40]); // LD HL,(0x4000)

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 16);
    assert_eq!(cpu.get_hl(), 0x1234);
}

#[test]
fn test_ld_sp_hl() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0xDFF0);
    bus.load(0, &[0xF9]); // LD SP,HL

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 6);
    assert_eq!(cpu.sp, 0xDFF0);
}

// --- Exchanges ---

#[test]
fn test_ex_af_af() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.a = 0x11;
    cpu.f = 0x22;
    cpu.a_prime = 0x33;
    cpu.f_prime = 0x44;
    bus.load(0, &[0x08]); // EX AF,AF'

    run_instruction(&mut cpu, &mut bus);
    assert_eq!((cpu.a, cpu.f), (0x33, 0x44));
    assert_eq!((cpu.a_prime, cpu.f_prime), (0x11, 0x22));
}

#[test]
fn test_ex_de_hl() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_de(0x1234);
    cpu.set_hl(0x5678);
    bus.load(0, &[0xEB]); // EX DE,HL

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.get_de(), 0x5678);
    assert_eq!(cpu.get_hl(), 0x1234);
}

#[test]
fn test_exx() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.set_bc(0x1111);
    cpu.set_de(0x2222);
    cpu.set_hl(0x3333);
    bus.load(0, &[0xD9]); // EXX

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.get_bc(), 0x0000);
    assert_eq!(cpu.b_prime, 0x11);
    assert_eq!(cpu.h_prime, 0x33);
    // AF stays put
    assert_eq!(cpu.a, 0xFF);
}

#[test]
fn test_ex_sp_hl() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x8000;
    cpu.set_hl(0xAABB);
    bus.memory[0x8000] = 0x11;
    bus.memory[0x8001] = 0x22;
    bus.load(0, &[0xE3]); // EX (SP),HL

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 19);
    assert_eq!(cpu.get_hl(), 0x2211);
    assert_eq!(bus.memory[0x8000], 0xBB);
    assert_eq!(bus.memory[0x8001], 0xAA);
}
