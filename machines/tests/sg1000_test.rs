use lumen_core::core::machine::{Console, InputEvent};
use lumen_machines::gamepad::Button;
use lumen_machines::registry::ConsoleConfig;
use lumen_machines::rom::RomImage;
use lumen_machines::sg1000::Sg1000;

const CYCLES_PER_LINE: u32 = 228;

fn nop_rom(size: usize) -> RomImage {
    RomImage::from_bytes(&vec![0u8; size]).unwrap()
}

fn console_with(rom: RomImage) -> Sg1000 {
    Sg1000::new(ConsoleConfig::new(rom))
}

// --- Boot ---

#[test]
fn test_boots_in_im1() {
    let console = console_with(nop_rom(32 << 10));
    assert_eq!(console.cpu().im, 1, "IM 1 for SMS-tested homebrew");
}

// --- Memory map ---

#[test]
fn test_ram_is_2k_mirrored() {
    let mut console = console_with(nop_rom(32 << 10));
    console.poke(0xC000, 0x12);
    assert_eq!(console.peek(0xC800), 0x12, "2 KiB mirror step");
    assert_eq!(console.peek(0xF800), 0x12);

    console.poke(0xC400, 0x34);
    assert_eq!(console.peek(0xC000), 0x12, "0x400 is a distinct byte");
    assert_eq!(console.peek(0xC400), 0x34);
}

#[test]
fn test_rom_reads_and_bounds() {
    let mut bytes = vec![0u8; 32 << 10];
    bytes[0x1234] = 0xAB;
    let mut console = console_with(RomImage::from_bytes(&bytes).unwrap());

    assert_eq!(console.peek(0x1234), 0xAB);
    // Beyond the ROM: open bus via the SRAM region default
    assert_eq!(console.peek(0xBFFF), 0x00);
}

#[test]
fn test_bank_register_at_ffff() {
    // 64 KiB ROM with a marker at the start of each bank
    let mut bytes = vec![0u8; 64 << 10];
    for bank in 0..4 {
        bytes[bank << 14] = 0xB0 | bank as u8;
    }
    let mut console = console_with(RomImage::from_bytes(&bytes).unwrap());

    assert_eq!(console.peek(0x8000), 0xB2, "slot 2 defaults to bank 2");
    console.poke(0xFFFF, 0x03);
    assert_eq!(console.peek(0x8000), 0xB3);

    // The write also landed in the RAM mirror underneath
    assert_eq!(console.peek(0xF7FF), 0x03);
}

#[test]
fn test_sram_write_marks_used() {
    let mut console = console_with(nop_rom(16 << 10));
    assert!(console.sram().is_none());

    console.poke(0x9000, 0x5A);
    assert_eq!(console.peek(0x9000), 0x5A);
    assert_eq!(console.sram().expect("persisted")[0x1000], 0x5A);
}

// --- Graphic Board ---

#[test]
fn test_graphic_board_reads() {
    let mut console = console_with(nop_rom(32 << 10));
    console.set_graphic_board(true);

    console.input_event(&InputEvent::MouseMotion { x: 50, y: 50 });
    console.input_event(&InputEvent::MouseButton { button: 0, pressed: true });

    // Bit 0 low while the pen is pressed
    assert_eq!(console.peek(0x8000), 0x00);
    // Default axis select is Y: position + 28
    assert_eq!(console.peek(0xA000), 78);

    // Switch to the X axis: position - 2
    console.poke(0x6000, 0x01);
    assert_eq!(console.peek(0xA000), 48);
}

#[test]
fn test_graphic_board_pen_off_board() {
    let mut console = console_with(nop_rom(32 << 10));
    console.set_graphic_board(true);

    console.input_event(&InputEvent::MouseMotion { x: 300, y: 50 });
    assert_eq!(console.peek(0xA000), 0x00);

    console.input_event(&InputEvent::MouseButton { button: 0, pressed: false });
    assert_eq!(console.peek(0x8000), 0x01, "button released");
}

// --- Controllers ---

#[test]
fn test_controller_port_idle() {
    let mut console = console_with(nop_rom(32 << 10));
    assert_eq!(console.io_peek(0xDC), 0xFF);
    assert_eq!(console.io_peek(0xDD), 0xFF);
}

#[test]
fn test_controller_active_low_bits() {
    let mut console = console_with(nop_rom(32 << 10));
    console.gamepad_mut(0).set_button(Button::Up, true);
    console.gamepad_mut(0).set_button(Button::Button2, true);
    console.gamepad_mut(1).set_button(Button::Down, true);

    let port_a = console.io_peek(0xDC);
    assert_eq!(port_a, 0xFF & !0x01 & !0x20 & !0x80);
}

// --- Interrupt wiring ---

#[test]
fn test_start_button_is_nmi() {
    // BIOS-free program: JP 0 loop at the reset vector, HALT at the NMI
    // vector so the interrupt is observable
    let mut bytes = vec![0u8; 32 << 10];
    bytes[0] = 0xC3; // JP 0x0000
    bytes[0x66] = 0x76; // HALT
    let mut console = console_with(RomImage::from_bytes(&bytes).unwrap());

    console.run(CYCLES_PER_LINE * 4).unwrap();
    assert!(!console.cpu().halted);

    console.gamepad_mut(0).set_button(Button::Start, true);
    console.run(CYCLES_PER_LINE * 4).unwrap();
    assert!(console.cpu().halted, "NMI vector reached");
}

#[test]
fn test_frame_interrupt_reaches_cpu() {
    // EI at reset, spin, HALT at the IM 1 vector; enable the VDP frame
    // interrupt through the control port
    let mut bytes = vec![0u8; 32 << 10];
    bytes[0] = 0xFB; // EI
    bytes[1] = 0xC3; // JP 0x0001
    bytes[2] = 0x01;
    bytes[3] = 0x00;
    bytes[0x38] = 0x76; // HALT
    let mut console = console_with(RomImage::from_bytes(&bytes).unwrap());

    // Register 1: frame interrupts on
    console.io_poke(0xBF, 0x20);
    console.io_poke(0xBF, 0x81);

    console.run(CYCLES_PER_LINE * 300).unwrap();
    assert!(console.cpu().halted, "IM 1 handler reached");
}

// --- Save states ---

#[test]
fn test_save_state_round_trip() {
    let mut console = console_with(nop_rom(32 << 10));
    console.poke(0xC100, 0x42);
    console.poke(0x9000, 0x24); // SRAM
    console.io_poke(0x7F, 0x9F); // PSG
    console.run(CYCLES_PER_LINE * 40).unwrap();

    let saved = console.state_save();

    let mut other = console_with(nop_rom(32 << 10));
    other.run(CYCLES_PER_LINE * 3).unwrap();
    other.state_load(&saved).expect("state loads");

    assert_eq!(other.state_save(), saved);
    assert_eq!(other.peek(0xC100), 0x42);
    assert_eq!(other.peek(0x9000), 0x24);
}
