use lumen_core::cpu::z80::Z80;
use lumen_core::core::machine::EmulationError;
mod common;
use common::TestBus;

fn run_instruction(cpu: &mut Z80, bus: &mut TestBus) -> u32 {
    cpu.step_instruction(bus).expect("instruction should execute")
}

// --- EI / DI ---

#[test]
fn test_ei_sets_both_flip_flops() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xFB]); // EI

    run_instruction(&mut cpu, &mut bus);
    assert!(cpu.iff1);
    assert!(cpu.iff2);
}

#[test]
fn test_di_clears_both() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.iff1 = true;
    cpu.iff2 = true;
    bus.load(0, &[0xF3]); // DI

    run_instruction(&mut cpu, &mut bus);
    assert!(!cpu.iff1);
    assert!(!cpu.iff2);
}

#[test]
fn test_ei_defers_interrupt_one_instruction() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.im = 1;
    cpu.sp = 0x8000;
    bus.int_line = true;
    bus.load(0, &[0xFB, 0xF3]); // EI; DI

    // The interrupt pending during EI must not fire before the next
    // instruction; that instruction is DI, so it never fires at all.
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 1, "no interrupt after EI");

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 2, "DI executed, interrupt masked again");
    assert!(!cpu.iff1);
}

// --- Maskable interrupt, IM 1 ---

#[test]
fn test_im1_interrupt_vectors_to_0x38() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.im = 1;
    cpu.iff1 = true;
    cpu.iff2 = true;
    cpu.sp = 0x8000;
    cpu.pc = 0x1234;
    bus.int_line = true;

    let cycles = run_instruction(&mut cpu, &mut bus);
    // One NOP (4T) plus the 13T IM 1 response
    assert_eq!(cycles, 17);
    assert_eq!(cpu.pc, 0x0038);
    assert!(!cpu.iff1);
    assert!(!cpu.iff2);
    assert_eq!(cpu.sp, 0x7FFE);
    assert_eq!(bus.memory[0x7FFF], 0x12, "PC high pushed first");
    assert_eq!(bus.memory[0x7FFE], 0x35, "PC past the executed NOP");
}

#[test]
fn test_interrupt_masked_when_iff1_clear() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.im = 1;
    cpu.iff1 = false;
    bus.int_line = true;

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 1, "level ignored while masked");
}

#[test]
fn test_interrupt_level_triggered() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.im = 1;
    cpu.sp = 0x8000;
    bus.int_line = true;
    bus.load(0x0038, &[0xFB, 0xC9]); // EI; RET at the handler

    // Enable interrupts; the line is held high
    bus.load(0, &[0xFB]);
    run_instruction(&mut cpu, &mut bus); // EI (deferred)
    run_instruction(&mut cpu, &mut bus); // NOP + interrupt accepted
    assert_eq!(cpu.pc, 0x0038);

    // The handler re-enables and returns; the held line interrupts again
    // at the RET's own instruction boundary
    run_instruction(&mut cpu, &mut bus); // EI
    run_instruction(&mut cpu, &mut bus); // RET + interrupt accepted
    assert_eq!(cpu.pc, 0x0038, "level-triggered line fires again");
}

// --- IM 0 / IM 2 unsupported ---

#[test]
fn test_im0_interrupt_is_fatal() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.im = 0;
    cpu.iff1 = true;
    bus.int_line = true;

    let result = cpu.step_instruction(&mut bus);
    assert_eq!(result, Err(EmulationError::UnsupportedInterruptMode(0)));
}

#[test]
fn test_im2_interrupt_is_fatal() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.im = 2;
    cpu.iff1 = true;
    bus.int_line = true;

    let result = cpu.step_instruction(&mut bus);
    assert_eq!(result, Err(EmulationError::UnsupportedInterruptMode(2)));
}

// --- NMI ---

#[test]
fn test_nmi_edge_triggered() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x8000;
    cpu.pc = 0x1234;
    cpu.iff1 = true;
    cpu.iff2 = true;
    bus.nmi_line = true;

    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 15, "4T NOP + 11T NMI response");
    assert_eq!(cpu.pc, 0x0066);
    assert!(!cpu.iff1, "IFF1 cleared");
    assert!(cpu.iff2, "IFF2 preserved for RETN");

    // SP dropped by exactly two, holding the pre-NMI PC
    assert_eq!(cpu.sp, 0x7FFE);
    assert_eq!(bus.memory[0x7FFF], 0x12);
    assert_eq!(bus.memory[0x7FFE], 0x35);

    // Held high: no second service until a fresh edge
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x0067, "no retrigger on level");

    bus.nmi_line = false;
    run_instruction(&mut cpu, &mut bus);
    bus.nmi_line = true;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x0066, "new edge taken");
}

#[test]
fn test_nmi_wakes_halt() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x8000;
    bus.load(0x100, &[0x76, 0x00]); // HALT; NOP
    cpu.pc = 0x100;

    run_instruction(&mut cpu, &mut bus); // HALT
    assert!(cpu.halted);
    run_instruction(&mut cpu, &mut bus); // idle
    assert!(cpu.halted);

    bus.nmi_line = true;
    run_instruction(&mut cpu, &mut bus);
    assert!(!cpu.halted);
    assert_eq!(cpu.pc, 0x0066);
    // The pushed return address points past the HALT
    assert_eq!(bus.memory[0x7FFE], 0x01);
    assert_eq!(bus.memory[0x7FFF], 0x01);
}

#[test]
fn test_int_wakes_halt() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x8000;
    cpu.im = 1;
    cpu.iff1 = true;
    cpu.iff2 = true;
    bus.load(0x100, &[0x76]); // HALT
    cpu.pc = 0x100;

    run_instruction(&mut cpu, &mut bus);
    assert!(cpu.halted);

    bus.int_line = true;
    run_instruction(&mut cpu, &mut bus);
    assert!(!cpu.halted);
    assert_eq!(cpu.pc, 0x0038);
}

#[test]
fn test_nmi_priority_over_int() {
    let mut cpu = Z80::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x8000;
    cpu.im = 1;
    cpu.iff1 = true;
    cpu.iff2 = true;
    bus.nmi_line = true;
    bus.int_line = true;

    run_instruction(&mut cpu, &mut bus);
    // NMI clears IFF1, so the maskable line is ignored this boundary
    assert_eq!(cpu.pc, 0x0066);
}
