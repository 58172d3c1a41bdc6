//! Coleco ColecoVision.
//!
//! Same silicon family as the SG-1000 with a different glue arrangement:
//! the BIOS sits at the bottom of the address space, the VDP's frame
//! interrupt drives NMI rather than INT, and the controller port multiplexes
//! a joystick and a twelve-key keypad selected by I/O writes.

use log::info;
use lumen_core::core::machine::{
    Console, ConsoleKind, EmulationError, InputEvent, VideoFormat,
};
use lumen_core::core::{Bus, Clock};
use lumen_core::cpu::z80::Z80;
use lumen_core::sound::sn76489::Psg;
use lumen_core::state::{
    SECTION_ID_COL_HW, SECTION_ID_PSG, SECTION_ID_RAM, SECTION_ID_VDP, SECTION_ID_VRAM,
    SECTION_ID_Z80, StateError, StateReader, StateWriter,
};
use lumen_core::video::frame::FrameSink;
use lumen_core::video::tms9928a::{VRAM_SIZE, Vdp, VdpVariant};

use crate::gamepad::{Button, Gamepad, GamepadType};
use crate::registry::{ConsoleConfig, ConsoleEntry};
use crate::rom::RomImage;

pub const COLECOVISION_RAM_SIZE: usize = 1 << 10;

pub const NTSC_CLOCK_RATE: u32 = 3_579_545;
pub const PAL_CLOCK_RATE: u32 = 3_546_895;

const CYCLES_PER_SCANLINE: u32 = 228;

const COL_HW_STATE_SIZE: usize = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InputMode {
    Joystick,
    Keypad,
}

struct ColecoBus {
    vdp: Vdp,
    psg: Psg,
    ram: [u8; COLECOVISION_RAM_SIZE],
    rom: RomImage,
    bios: Option<RomImage>,
    input_mode: InputMode,
    gamepad_1: Gamepad,
}

impl Bus for ColecoBus {
    fn mem_read(&mut self, addr: u16) -> u8 {
        // BIOS
        if addr <= 0x1FFF {
            if let Some(bios) = &self.bios {
                return bios.read(u32::from(addr));
            }
        }

        // 1 KiB RAM, mirrored
        if (0x6000..=0x7FFF).contains(&addr) {
            return self.ram[addr as usize & (COLECOVISION_RAM_SIZE - 1)];
        }

        // Cartridge slot
        if addr >= 0x8000 {
            return self.rom.read(u32::from(addr));
        }

        0xFF
    }

    fn mem_write(&mut self, addr: u16, data: u8) {
        // Everything except RAM ignores writes
        if (0x6000..=0x7FFF).contains(&addr) {
            self.ram[addr as usize & (COLECOVISION_RAM_SIZE - 1)] = data;
        }
    }

    fn io_read(&mut self, port: u8) -> u8 {
        match port {
            0xA0..=0xBF => {
                if port & 0x01 == 0 {
                    self.vdp.data_read()
                } else {
                    self.vdp.status_read()
                }
            }
            // Controller: address bit 1 selects player 2, which is not
            // implemented.
            0xE0..=0xFF if port & 0x02 == 0 => match self.input_mode {
                InputMode::Joystick => {
                    (if self.gamepad_1.pressed(Button::Up) { 0 } else { 0x01 })
                        | (if self.gamepad_1.pressed(Button::Right) { 0 } else { 0x02 })
                        | (if self.gamepad_1.pressed(Button::Down) { 0 } else { 0x04 })
                        | (if self.gamepad_1.pressed(Button::Left) { 0 } else { 0x08 })
                        | 0x30
                        | (if self.gamepad_1.pressed(Button::Button1) { 0 } else { 0x40 })
                }
                InputMode::Keypad => {
                    self.gamepad_1.keypad_code()
                        | 0x30
                        | (if self.gamepad_1.pressed(Button::Button2) { 0 } else { 0x40 })
                }
            },
            _ => 0xFF,
        }
    }

    fn io_write(&mut self, port: u8, data: u8) {
        match port {
            0x80..=0x9F => self.input_mode = InputMode::Keypad,
            0xA0..=0xBF => {
                if port & 0x01 == 0 {
                    self.vdp.data_write(data);
                } else {
                    self.vdp.control_write(data);
                }
            }
            0xC0..=0xDF => self.input_mode = InputMode::Joystick,
            0xE0..=0xFF => self.psg.data_write(data),
            _ => {}
        }
    }

    fn get_int(&mut self) -> bool {
        // The maskable interrupt line is not used
        false
    }

    fn get_nmi(&mut self) -> bool {
        self.vdp.get_interrupt()
    }
}

pub struct ColecoVision {
    cpu: Z80,
    bus: ColecoBus,
    clock: Clock,
    frame_sink: FrameSink,
    overclock: u32,
    pending_cycles: u32,
}

impl ColecoVision {
    pub fn new(config: ConsoleConfig) -> Self {
        let mut vdp = Vdp::new(VdpVariant::Tms9928a, config.format);
        vdp.remove_sprite_limit = config.remove_sprite_limit;
        vdp.disable_blanking = config.disable_blanking;

        info!("{} KiB ColecoVision ROM loaded", config.rom.size() >> 10);
        if let Some(bios) = &config.bios {
            info!("{} KiB ColecoVision BIOS loaded", bios.size() >> 10);
        }

        let clock_rate = match config.format {
            VideoFormat::Ntsc => NTSC_CLOCK_RATE,
            VideoFormat::Pal => PAL_CLOCK_RATE,
        };

        Self {
            cpu: Z80::new(),
            bus: ColecoBus {
                vdp,
                psg: Psg::new(false),
                ram: [0; COLECOVISION_RAM_SIZE],
                rom: config.rom,
                bios: config.bios,
                input_mode: InputMode::Joystick,
                gamepad_1: Gamepad::with_keyboard_defaults(GamepadType::Standard),
            },
            clock: Clock::new(clock_rate),
            frame_sink: FrameSink::new(256, 192),
            overclock: config.overclock,
            pending_cycles: 0,
        }
    }

    pub fn gamepad_mut(&mut self) -> &mut Gamepad {
        &mut self.bus.gamepad_1
    }

    // Diagnostics hooks: direct views of the chips and the bus.

    pub fn cpu(&self) -> &Z80 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Z80 {
        &mut self.cpu
    }

    pub fn vdp(&self) -> &Vdp {
        &self.bus.vdp
    }

    pub fn peek(&mut self, addr: u16) -> u8 {
        self.bus.mem_read(addr)
    }

    pub fn poke(&mut self, addr: u16, data: u8) {
        self.bus.mem_write(addr, data);
    }

    pub fn io_peek(&mut self, port: u8) -> u8 {
        self.bus.io_read(port)
    }

    pub fn io_poke(&mut self, port: u8, data: u8) {
        self.bus.io_write(port, data);
    }
}

impl Console for ColecoVision {
    fn kind(&self) -> ConsoleKind {
        ConsoleKind::ColecoVision
    }

    fn clock_rate(&self) -> u32 {
        self.clock.clock_rate()
    }

    fn run(&mut self, cycles: u32) -> Result<(), EmulationError> {
        self.pending_cycles += cycles;
        let mut lines = self.pending_cycles / CYCLES_PER_SCANLINE;
        self.pending_cycles -= lines * CYCLES_PER_SCANLINE;

        let clock_rate = self.clock.clock_rate();

        while lines > 0 {
            lines -= 1;
            self.cpu
                .run_cycles(&mut self.bus, CYCLES_PER_SCANLINE + self.overclock)?;
            self.bus.psg.run_cycles(clock_rate, CYCLES_PER_SCANLINE);
            if self.bus.vdp.run_one_scanline() {
                self.frame_sink.publish(&self.bus.vdp.frame_buffer);
            }
        }

        Ok(())
    }

    fn frame_sink(&self) -> FrameSink {
        self.frame_sink.clone()
    }

    fn audio(&self) -> Psg {
        self.bus.psg.clone()
    }

    fn input_event(&mut self, event: &InputEvent) {
        self.bus.gamepad_1.handle_event(event);
    }

    fn state_save(&mut self) -> Vec<u8> {
        let mut writer = StateWriter::new(self.kind().state_tag());

        let input_mode = match self.bus.input_mode {
            InputMode::Joystick => 0u8,
            InputMode::Keypad => 1,
        };
        writer.add_section(SECTION_ID_COL_HW, 1, &[input_mode]);

        self.cpu.state_save(&mut writer);
        writer.add_section(SECTION_ID_RAM, 1, &self.bus.ram);

        self.bus.vdp.state_save(&mut writer);
        writer.add_section(SECTION_ID_VRAM, 1, self.bus.vdp.vram());

        self.bus.psg.state_save(&mut writer);

        writer.finish()
    }

    fn state_load(&mut self, data: &[u8]) -> Result<(), StateError> {
        let mut reader = StateReader::open(data)?;
        if reader.console_tag() != self.kind().state_tag() {
            return Err(StateError::WrongConsole(reader.console_tag()));
        }

        while let Some(section) = reader.next_section()? {
            match section.tag {
                SECTION_ID_COL_HW => {
                    StateReader::expect_size(&section, COL_HW_STATE_SIZE)?;
                    self.bus.input_mode = if section.data[0] != 0 {
                        InputMode::Keypad
                    } else {
                        InputMode::Joystick
                    };
                }
                SECTION_ID_Z80 => self.cpu.state_load(section.version, section.data)?,
                SECTION_ID_RAM => {
                    StateReader::expect_size(&section, COLECOVISION_RAM_SIZE)?;
                    self.bus.ram.copy_from_slice(section.data);
                }
                SECTION_ID_VDP => self.bus.vdp.state_load(section.version, section.data)?,
                SECTION_ID_VRAM => {
                    StateReader::expect_size(&section, VRAM_SIZE)?;
                    self.bus.vdp.vram_mut().copy_from_slice(section.data);
                }
                SECTION_ID_PSG => self.bus.psg.state_load(section.version, section.data)?,
                tag => {
                    log::warn!("unknown save-state section {:?}, skipped", tag);
                }
            }
        }

        Ok(())
    }

    fn sram(&self) -> Option<&[u8]> {
        None
    }
}

inventory::submit! {
    ConsoleEntry {
        name: "colecovision",
        kind: ConsoleKind::ColecoVision,
        create: |config| Box::new(ColecoVision::new(config)),
    }
}
