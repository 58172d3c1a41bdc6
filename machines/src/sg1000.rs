//! Sega SG-1000 (and SC-3000 software).
//!
//! TMS9928A video, SN76489 sound, up to 48 KiB of flat cartridge ROM with
//! an optional Sega-style bank register at 0xFFFF, 8 KiB of on-cartridge
//! SRAM, and the Terebi Oekaki Graphic Board. RAM is 2 KiB: real hardware
//! carries 1 KiB, but SC-3000 homebrew expects the larger machine.

use log::info;
use lumen_core::core::machine::{
    Console, ConsoleKind, EmulationError, InputEvent, VideoFormat,
};
use lumen_core::core::{Bus, Clock};
use lumen_core::cpu::z80::Z80;
use lumen_core::sound::sn76489::Psg;
use lumen_core::state::{
    SECTION_ID_RAM, SECTION_ID_SG_HW, SECTION_ID_SRAM, SECTION_ID_VDP, SECTION_ID_VRAM,
    StateError, StateReader, StateWriter, SECTION_ID_PSG, SECTION_ID_Z80,
};
use lumen_core::video::frame::FrameSink;
use lumen_core::video::tms9928a::{VRAM_SIZE, Vdp, VdpVariant};

use crate::db::{self, sg_hint};
use crate::gamepad::{Button, Gamepad, GamepadType};
use crate::registry::{ConsoleConfig, ConsoleEntry};
use crate::rom::RomImage;

pub const SG_1000_RAM_SIZE: usize = 2 << 10;
pub const SG_1000_SRAM_SIZE: usize = 8 << 10;

pub const NTSC_CLOCK_RATE: u32 = 3_579_545;
pub const PAL_CLOCK_RATE: u32 = 3_546_895;

const CYCLES_PER_SCANLINE: u32 = 228;

const SG_HW_STATE_SIZE: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SgMapper {
    /// Not yet known; a 0xFFFF write behaves as the Sega mapper anyway.
    Unknown,
    /// Flat mapping for ROMs of 48 KiB or less.
    None,
    /// Terebi Oekaki drawing tablet.
    GraphicBoard,
}

impl SgMapper {
    fn to_u8(self) -> u8 {
        match self {
            SgMapper::Unknown => 0,
            SgMapper::None => 1,
            SgMapper::GraphicBoard => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => SgMapper::None,
            2 => SgMapper::GraphicBoard,
            _ => SgMapper::Unknown,
        }
    }
}

struct SgHwState {
    mapper: SgMapper,
    mapper_bank: [u8; 3],
    graphic_board_axis: u8,
}

struct Sg1000Bus {
    vdp: Vdp,
    psg: Psg,
    ram: [u8; SG_1000_RAM_SIZE],
    sram: Box<[u8; SG_1000_SRAM_SIZE]>,
    sram_used: bool,
    rom: RomImage,
    rom_hints: u16,
    hw: SgHwState,
    gamepad_1: Gamepad,
    gamepad_2: Gamepad,
    cursor: (i32, i32),
    cursor_button: bool,
}

impl Bus for Sg1000Bus {
    fn mem_read(&mut self, addr: u16) -> u8 {
        // Graphic Board status and position
        if self.hw.mapper == SgMapper::GraphicBoard {
            if addr == 0x8000 {
                // Bit 0: button pressed. Bit 7: busy.
                return if self.cursor_button { 0x00 } else { 0x01 };
            }
            if addr == 0xA000 {
                let (x, y) = self.cursor;
                if !(2..=254).contains(&x) || !(0..=192).contains(&y) {
                    // Pen not on the board
                    return 0x00;
                }
                return if self.hw.graphic_board_axis != 0 {
                    (x - 2) as u8
                } else {
                    (y + 28) as u8
                };
            }
        }

        // Cartridge slot
        if addr <= 0xBFFF && u32::from(addr) < self.rom.size() {
            let slot = addr >> 14;
            let bank_base = u32::from(self.hw.mapper_bank[slot as usize]) * (16 << 10);
            let offset = u32::from(addr & 0x3FFF);
            return self.rom.read(bank_base + offset);
        }

        // Up to 8 KiB of on-cartridge SRAM
        if (0x8000..=0xBFFF).contains(&addr) {
            return self.sram[addr as usize & (SG_1000_SRAM_SIZE - 1)];
        }

        // RAM, mirrored
        if addr >= 0xC000 {
            return self.ram[addr as usize & (SG_1000_RAM_SIZE - 1)];
        }

        0xFF
    }

    fn mem_write(&mut self, addr: u16, data: u8) {
        // No early returns: the bank register at 0xFFFF is also RAM

        if addr == 0xFFFF {
            self.hw.mapper_bank[2] = data & 0x3F;
        }

        if self.hw.mapper == SgMapper::GraphicBoard && addr == 0x6000 {
            self.hw.graphic_board_axis = data & 0x01;
        }

        if (0x8000..=0xBFFF).contains(&addr) {
            self.sram[addr as usize & (SG_1000_SRAM_SIZE - 1)] = data;
            self.sram_used = true;
        }

        if addr >= 0xC000 {
            self.ram[addr as usize & (SG_1000_RAM_SIZE - 1)] = data;
        }
    }

    fn io_read(&mut self, port: u8) -> u8 {
        match port {
            0x80..=0xBF => {
                if port & 0x01 == 0 {
                    self.vdp.data_read()
                } else {
                    self.vdp.status_read()
                }
            }
            // A pressed button reads as zero
            0xC0..=0xFF => {
                if port & 0x01 == 0 {
                    // Port A/B: player 1, plus player 2 up/down
                    (if self.gamepad_1.pressed(Button::Up) { 0 } else { 0x01 })
                        | (if self.gamepad_1.pressed(Button::Down) { 0 } else { 0x02 })
                        | (if self.gamepad_1.pressed(Button::Left) { 0 } else { 0x04 })
                        | (if self.gamepad_1.pressed(Button::Right) { 0 } else { 0x08 })
                        | (if self.gamepad_1.pressed(Button::Button1) { 0 } else { 0x10 })
                        | (if self.gamepad_1.pressed(Button::Button2) { 0 } else { 0x20 })
                        | (if self.gamepad_2.pressed(Button::Up) { 0 } else { 0x40 })
                        | (if self.gamepad_2.pressed(Button::Down) { 0 } else { 0x80 })
                } else {
                    // Port B/misc: the high bits cover SC-3000 peripherals
                    // that are not present
                    (if self.gamepad_2.pressed(Button::Left) { 0 } else { 0x01 })
                        | (if self.gamepad_2.pressed(Button::Right) { 0 } else { 0x02 })
                        | (if self.gamepad_2.pressed(Button::Button1) { 0 } else { 0x04 })
                        | (if self.gamepad_2.pressed(Button::Button2) { 0 } else { 0x08 })
                        | 0xF0
                }
            }
            _ => 0xFF,
        }
    }

    fn io_write(&mut self, port: u8, data: u8) {
        match port {
            0x40..=0x7F => self.psg.data_write(data),
            0x80..=0xBF => {
                if port & 0x01 == 0 {
                    self.vdp.data_write(data);
                } else {
                    self.vdp.control_write(data);
                }
            }
            _ => {}
        }
    }

    fn get_int(&mut self) -> bool {
        self.vdp.get_interrupt()
    }

    fn get_nmi(&mut self) -> bool {
        self.gamepad_1.pressed(Button::Start)
    }
}

/// SG-1000 console: CPU, bus, and the per-scanline scheduler.
pub struct Sg1000 {
    cpu: Z80,
    bus: Sg1000Bus,
    clock: Clock,
    frame_sink: FrameSink,
    format: VideoFormat,
    overclock: u32,
    pending_cycles: u32,
}

impl Sg1000 {
    pub fn new(config: ConsoleConfig) -> Self {
        let mut vdp = Vdp::new(VdpVariant::Tms9928a, config.format);
        vdp.remove_sprite_limit = config.remove_sprite_limit;
        vdp.disable_blanking = config.disable_blanking;

        let hints = db::sg_hints(config.rom.hash());
        let mapper = if hints & sg_hint::MAPPER_GRAPHIC_BOARD != 0 {
            SgMapper::GraphicBoard
        } else if config.rom.size() <= 48 << 10 {
            SgMapper::None
        } else {
            SgMapper::Unknown
        };

        info!("{} KiB SG-1000 ROM loaded", config.rom.size() >> 10);

        let clock_rate = match config.format {
            VideoFormat::Ntsc => NTSC_CLOCK_RATE,
            VideoFormat::Pal => PAL_CLOCK_RATE,
        };

        let mut cpu = Z80::new();
        // A real SG-1000 comes up in IM 0 and relies on the game to switch;
        // some homebrew is only tested on the Master System, whose BIOS
        // leaves IM 1 behind.
        cpu.im = 1;

        Self {
            cpu,
            bus: Sg1000Bus {
                vdp,
                psg: Psg::new(false),
                ram: [0; SG_1000_RAM_SIZE],
                sram: Box::new([0; SG_1000_SRAM_SIZE]),
                sram_used: false,
                rom: config.rom,
                rom_hints: hints,
                hw: SgHwState {
                    mapper,
                    mapper_bank: [0, 1, 2],
                    graphic_board_axis: 0,
                },
                gamepad_1: Gamepad::with_keyboard_defaults(GamepadType::Standard),
                gamepad_2: Gamepad::new(GamepadType::Standard),
                cursor: (0, 0),
                cursor_button: false,
            },
            clock: Clock::new(clock_rate),
            frame_sink: FrameSink::new(256, 192),
            format: config.format,
            overclock: config.overclock,
            pending_cycles: 0,
        }
    }

    /// Restore battery-backed cartridge memory saved by a previous session.
    pub fn load_sram(&mut self, data: &[u8]) {
        let len = data.len().min(SG_1000_SRAM_SIZE);
        self.bus.sram[..len].copy_from_slice(&data[..len]);
    }

    /// Hints matched against the ROM hash at load time.
    pub fn rom_hints(&self) -> u16 {
        self.bus.rom_hints
    }

    pub fn rom_hash(&self) -> &[u8; crate::rom::HASH_LENGTH] {
        self.bus.rom.hash()
    }

    /// Manually select the Graphic Board, overriding the hint database.
    /// The hint only covers known dumps; homebrew needs the switch.
    pub fn set_graphic_board(&mut self, enabled: bool) {
        self.bus.hw.mapper = if enabled {
            SgMapper::GraphicBoard
        } else if self.bus.rom.size() <= 48 << 10 {
            SgMapper::None
        } else {
            SgMapper::Unknown
        };
    }

    pub fn gamepad_mut(&mut self, player: usize) -> &mut Gamepad {
        if player == 0 {
            &mut self.bus.gamepad_1
        } else {
            &mut self.bus.gamepad_2
        }
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

    pub fn vdp_mut(&mut self) -> &mut Vdp {
        &mut self.bus.vdp
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

impl Console for Sg1000 {
    fn kind(&self) -> ConsoleKind {
        ConsoleKind::Sg1000
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
        match *event {
            InputEvent::MouseMotion { x, y } => self.bus.cursor = (x, y),
            InputEvent::MouseButton { button: 0, pressed } => self.bus.cursor_button = pressed,
            _ => {}
        }
        self.bus.gamepad_1.handle_event(event);
        self.bus.gamepad_2.handle_event(event);
    }

    fn state_save(&mut self) -> Vec<u8> {
        let mut writer = StateWriter::new(self.kind().state_tag());

        let hw = [
            self.bus.hw.mapper.to_u8(),
            self.bus.hw.mapper_bank[0],
            self.bus.hw.mapper_bank[1],
            self.bus.hw.mapper_bank[2],
            self.bus.hw.graphic_board_axis,
        ];
        writer.add_section(SECTION_ID_SG_HW, 1, &hw);

        self.cpu.state_save(&mut writer);
        writer.add_section(SECTION_ID_RAM, 1, &self.bus.ram);
        if self.bus.sram_used {
            writer.add_section(SECTION_ID_SRAM, 1, &self.bus.sram[..]);
        }

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

        self.bus.sram_used = false;

        while let Some(section) = reader.next_section()? {
            match section.tag {
                SECTION_ID_SG_HW => {
                    StateReader::expect_size(&section, SG_HW_STATE_SIZE)?;
                    self.bus.hw.mapper = SgMapper::from_u8(section.data[0]);
                    self.bus.hw.mapper_bank.copy_from_slice(&section.data[1..4]);
                    self.bus.hw.graphic_board_axis = section.data[4];
                }
                SECTION_ID_Z80 => self.cpu.state_load(section.version, section.data)?,
                SECTION_ID_RAM => {
                    StateReader::expect_size(&section, SG_1000_RAM_SIZE)?;
                    self.bus.ram.copy_from_slice(section.data);
                }
                SECTION_ID_SRAM => {
                    StateReader::expect_size(&section, SG_1000_SRAM_SIZE)?;
                    self.bus.sram.copy_from_slice(section.data);
                    self.bus.sram_used = true;
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
        self.bus.sram_used.then_some(&self.bus.sram[..])
    }
}

impl Sg1000 {
    /// The video format the console was created with.
    pub fn format(&self) -> VideoFormat {
        self.format
    }
}

inventory::submit! {
    ConsoleEntry {
        name: "sg-1000",
        kind: ConsoleKind::Sg1000,
        create: |config| Box::new(Sg1000::new(config)),
    }
}
