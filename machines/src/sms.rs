//! Sega Master System and Game Gear.
//!
//! Mode-4 VDP, SN76489 PSG (with the Game Gear's stereo mask), optional
//! YM2413 FM unit behind the audio-control port, Sega/Codemasters/Korean
//! mappers with auto-detection, battery-backed cartridge SRAM, BIOS
//! mapping, 3D glasses, and the stranger port-1 devices: paddle, Sports
//! Pad, and light phaser.

use log::info;
use lumen_core::core::machine::{
    Console, ConsoleKind, EmulationError, InputEvent, Region, VideoFormat,
};
use lumen_core::core::{Bus, Clock};
use lumen_core::cpu::z80::Z80;
use lumen_core::sound::sn76489::Psg;
use lumen_core::sound::ym2413::Ym2413;
use lumen_core::state::{
    ByteReader, ByteWriter, SECTION_ID_PSG, SECTION_ID_RAM, SECTION_ID_SMS_HW, SECTION_ID_SRAM,
    SECTION_ID_VDP, SECTION_ID_VRAM, SECTION_ID_Z80, StateError, StateReader, StateWriter,
};
use lumen_core::video::frame::FrameSink;
use lumen_core::video::tms9928a::{VRAM_SIZE, Vdp, VdpVariant, code, ctrl0};

use crate::db::{self, sms_hint};
use crate::gamepad::{Button, Gamepad, GamepadType};
use crate::registry::{ConsoleConfig, ConsoleEntry};
use crate::rom::RomImage;

pub const SMS_RAM_SIZE: usize = 8 << 10;
pub const SMS_SRAM_SIZE: usize = 32 << 10;
const SRAM_BANK_MASK: u32 = (16 << 10) - 1;

pub const NTSC_CLOCK_RATE: u32 = 3_579_545;
pub const PAL_CLOCK_RATE: u32 = 3_546_895;

const CYCLES_PER_SCANLINE: u32 = 228;

/// How long the reset button stays asserted after a press, in CPU cycles.
const RESET_BUTTON_CYCLES: u32 = 200_000;

const SMS_HW_STATE_SIZE: usize = 13;

/// Memory-control register bits (I/O port 0x3E).
mod memory_control {
    pub const IO_DISABLE: u8 = 0x04;
    pub const BIOS_DISABLE: u8 = 0x08;
    pub const CART_DISABLE: u8 = 0x40;
}

/// I/O-control register bits (I/O port 0x3F). Direction: 0 output, 1 input.
mod io_control {
    pub const TH_A_DIRECTION: u8 = 0x02;
    pub const TH_B_DIRECTION: u8 = 0x08;
    pub const TH_A_LEVEL: u8 = 0x20;
    pub const TH_B_LEVEL: u8 = 0x80;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SmsMapper {
    Unknown,
    None,
    Sega,
    Codemasters,
    Korean,
}

impl SmsMapper {
    fn to_u8(self) -> u8 {
        match self {
            SmsMapper::Unknown => 0,
            SmsMapper::None => 1,
            SmsMapper::Sega => 2,
            SmsMapper::Codemasters => 3,
            SmsMapper::Korean => 4,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => SmsMapper::None,
            2 => SmsMapper::Sega,
            3 => SmsMapper::Codemasters,
            4 => SmsMapper::Korean,
            _ => SmsMapper::Unknown,
        }
    }
}

/// Stereoscopic field selected through the 3D-glasses latch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field3d {
    None,
    Left,
    Right,
}

struct SmsHwState {
    memory_control: u8,
    io_control: u8,
    mapper: SmsMapper,
    mapper_bank: [u8; 4],
    sram_bank: u16,
    sram_enable: bool,
    audio_control: u8,
}

struct SmsBus {
    kind: ConsoleKind,
    region: Region,
    format: VideoFormat,
    clock_rate: u32,

    vdp: Vdp,
    psg: Psg,
    fm: Option<Ym2413>,

    ram: [u8; SMS_RAM_SIZE],
    sram: Box<[u8; SMS_SRAM_SIZE]>,
    sram_used: bool,
    rom: RomImage,
    bios: Option<RomImage>,

    hw: SmsHwState,
    rom_hints: u16,
    video_3d_field: Field3d,

    gamepad_1: Gamepad,
    gamepad_2: Gamepad,
    export_paddle: bool,
    paddle_clock: u8,
    reset_button: bool,
    reset_button_timeout: u32,

    /// CPU cycle count, refreshed once per instruction for counter latches.
    now: u64,

    /// Error raised from inside a bus access; surfaced at the next scanline.
    pending_error: Option<EmulationError>,
}

impl SmsBus {
    fn is_game_gear(&self) -> bool {
        self.kind == ConsoleKind::GameGear
    }

    fn has_fm(&self) -> bool {
        self.fm.is_some()
    }

    /// TH pin level as seen by the console: driven level when the pin is an
    /// output, pulled high when it is an input.
    fn th_level(control: u8, direction_bit: u8, level_bit: u8) -> bool {
        control & direction_bit != 0 || control & level_bit != 0
    }

    fn write_io_control(&mut self, data: u8) {
        let previous = self.hw.io_control;
        self.hw.io_control = data;

        let th_a_was = Self::th_level(previous, io_control::TH_A_DIRECTION, io_control::TH_A_LEVEL);
        let th_a = Self::th_level(data, io_control::TH_A_DIRECTION, io_control::TH_A_LEVEL);
        let th_b_was = Self::th_level(previous, io_control::TH_B_DIRECTION, io_control::TH_B_LEVEL);
        let th_b = Self::th_level(data, io_control::TH_B_DIRECTION, io_control::TH_B_LEVEL);

        // A rising TH edge latches the H-counter
        if (th_a && !th_a_was) || (th_b && !th_b_was) {
            self.vdp.update_h_counter(self.now);
        }

        // The Sports Pad is strobed through TH-A
        if self.gamepad_1.kind == GamepadType::SmsSportsPad && th_a != th_a_was {
            self.gamepad_1.trackball_strobe(th_a, self.now);
        }
    }

    fn read_port_a(&mut self) -> u8 {
        let mut value = match self.gamepad_1.kind {
            GamepadType::SmsPaddle => {
                // The export paddle clocks through TH; the Japanese paddle
                // has an internal 8 kHz clock, approximated by toggling on
                // each read.
                if self.export_paddle {
                    self.paddle_clock = u8::from(
                        self.hw.io_control & io_control::TH_A_DIRECTION == 0
                            && self.hw.io_control & io_control::TH_A_LEVEL != 0,
                    );
                } else {
                    self.paddle_clock ^= 0x01;
                }

                let fire = self.gamepad_1.pressed(Button::Button1)
                    || self.gamepad_1.pressed(Button::Button2);
                let position = self.gamepad_1.paddle_position();

                if self.paddle_clock & 0x01 == 0 {
                    (position & 0x0F) | if fire { 0 } else { 0x10 }
                } else {
                    (position >> 4) | if fire { 0 } else { 0x10 } | 0x20
                }
            }
            GamepadType::SmsSportsPad => {
                self.gamepad_1.trackball_port(self.now, self.clock_rate) & 0x3F
            }
            _ => {
                (if self.gamepad_1.pressed(Button::Up) { 0 } else { 0x01 })
                    | (if self.gamepad_1.pressed(Button::Down) { 0 } else { 0x02 })
                    | (if self.gamepad_1.pressed(Button::Left) { 0 } else { 0x04 })
                    | (if self.gamepad_1.pressed(Button::Right) { 0 } else { 0x08 })
                    | (if self.gamepad_1.pressed(Button::Button1) { 0 } else { 0x10 })
                    | (if self.gamepad_1.pressed(Button::Button2) { 0 } else { 0x20 })
            }
        };

        value |= if self.gamepad_2.pressed(Button::Up) { 0 } else { 0x40 };
        value |= if self.gamepad_2.pressed(Button::Down) { 0 } else { 0x80 };
        value
    }

    fn read_port_b(&mut self) -> u8 {
        let mut port_1_th = false;
        let mut port_2_th = false;

        if self.region == Region::World {
            if self.hw.io_control & io_control::TH_A_DIRECTION == 0 {
                port_1_th = self.hw.io_control & io_control::TH_A_LEVEL == 0;

                if self.gamepad_1.kind == GamepadType::SmsPaddle {
                    self.export_paddle = true;
                }
            }
            if self.hw.io_control & io_control::TH_B_DIRECTION == 0 {
                port_2_th = self.hw.io_control & io_control::TH_B_LEVEL == 0;
            }
        }

        if self.gamepad_1.kind == GamepadType::SmsPhaser {
            port_1_th |= self.vdp.get_phaser_th(self.now);
        }

        (if self.gamepad_2.pressed(Button::Left) { 0 } else { 0x01 })
            | (if self.gamepad_2.pressed(Button::Right) { 0 } else { 0x02 })
            | (if self.gamepad_2.pressed(Button::Button1) { 0 } else { 0x04 })
            | (if self.gamepad_2.pressed(Button::Button2) { 0 } else { 0x08 })
            | (if self.reset_button { 0 } else { 0x10 })
            | (if port_1_th { 0 } else { 0x40 })
            | (if port_2_th { 0 } else { 0x80 })
    }

    fn sram_offset(&self, addr: u16) -> usize {
        ((u32::from(self.hw.sram_bank) * (16 << 10) + (u32::from(addr) & SRAM_BANK_MASK))
            as usize)
            & (SMS_SRAM_SIZE - 1)
    }
}

impl Bus for SmsBus {
    fn mem_read(&mut self, addr: u16) -> u8 {
        // Cartridge, BIOS, and SRAM share the lower 48 KiB
        if addr <= 0xBFFF {
            let slot = (addr >> 14) as usize;
            let offset = u32::from(addr & 0x3FFF);

            // The first 1 KiB of slot 0 bypasses the mapper so interrupt
            // vectors stay put
            let bank_base = if slot == 0 && offset < (1 << 10) {
                0
            } else {
                u32::from(self.hw.mapper_bank[slot]) * (16 << 10)
            };

            if self.hw.memory_control & memory_control::BIOS_DISABLE == 0 {
                if let Some(bios) = &self.bios {
                    return bios.read(bank_base + offset);
                }
            }

            if self.hw.sram_enable && slot == 2 {
                return self.sram[self.sram_offset(addr)];
            }

            if self.hw.memory_control & memory_control::CART_DISABLE == 0 {
                return self.rom.read(bank_base + offset);
            }

            return 0xFF;
        }

        // 8 KiB RAM, mirrored
        self.ram[addr as usize & (SMS_RAM_SIZE - 1)]
    }

    fn mem_write(&mut self, addr: u16, data: u8) {
        // No early returns: the register windows are also RAM

        // 3D glasses field latch. A right-eye field is only accepted after
        // a left-eye one, so zero-initialisation does not flicker the
        // glasses on.
        if (0xFFF8..=0xFFFB).contains(&addr) {
            if data & 0x01 != 0 {
                self.video_3d_field = Field3d::Left;
            } else if self.video_3d_field == Field3d::Left {
                self.video_3d_field = Field3d::Right;
            }
        }

        // The first mapper-port write decides the mapper
        if self.hw.mapper == SmsMapper::Unknown {
            match addr {
                0xFFFC..=0xFFFF => self.hw.mapper = SmsMapper::Sega,
                0x4000 | 0x8000 => self.hw.mapper = SmsMapper::Codemasters,
                0xA000 => self.hw.mapper = SmsMapper::Korean,
                _ => {}
            }
        }

        match self.hw.mapper {
            SmsMapper::Sega => match addr {
                0xFFFC => {
                    self.hw.sram_enable = data & 0x08 != 0;
                    if data & 0x03 != 0 {
                        self.pending_error = Some(EmulationError::UnsupportedMapperFeature(
                            "bank shifting",
                        ));
                    }
                    if data & 0x14 != 0 {
                        self.pending_error =
                            Some(EmulationError::UnsupportedMapperFeature("SRAM banking"));
                    }
                }
                0xFFFD => self.hw.mapper_bank[0] = data & 0x3F,
                0xFFFE => self.hw.mapper_bank[1] = data & 0x3F,
                0xFFFF => self.hw.mapper_bank[2] = data & 0x3F,
                _ => {}
            },
            SmsMapper::Codemasters => match addr {
                0x0000 => self.hw.mapper_bank[0] = data & 0x3F,
                0x4000 => self.hw.mapper_bank[1] = data & 0x3F,
                0x8000 => {
                    self.hw.mapper_bank[2] = data & 0x3F;
                    if data & 0x80 != 0 {
                        self.pending_error = Some(EmulationError::UnsupportedMapperFeature(
                            "Codemasters SRAM",
                        ));
                    }
                }
                _ => {}
            },
            SmsMapper::Korean => {
                if addr == 0xA000 {
                    self.hw.mapper_bank[2] = data & 0x3F;
                }
            }
            SmsMapper::Unknown | SmsMapper::None => {}
        }

        if self.hw.sram_enable && (0x8000..=0xBFFF).contains(&addr) {
            self.sram[self.sram_offset(addr)] = data;
            self.sram_used = true;
        }

        if addr >= 0xC000 {
            self.ram[addr as usize & (SMS_RAM_SIZE - 1)] = data;
        }
    }

    fn io_read(&mut self, port: u8) -> u8 {
        match port {
            // Game Gear start button, region, and video format
            0x00 if self.is_game_gear() => {
                let mut value = 0;
                if !self.gamepad_1.pressed(Button::Start) {
                    value |= 0x80;
                }
                if self.region == Region::World {
                    value |= 0x40;
                }
                if self.format == VideoFormat::Pal {
                    value |= 0x20;
                }
                value
            }
            0x40..=0x7F => {
                if port & 0x01 == 0 {
                    self.vdp.get_v_counter()
                } else {
                    self.vdp.get_h_counter()
                }
            }
            0x80..=0xBF => {
                if port & 0x01 == 0 {
                    self.vdp.data_read()
                } else {
                    self.vdp.status_read()
                }
            }
            // Audio control readback, present only with the FM unit
            0xF2 if self.has_fm() => self.hw.audio_control & 0x03,
            0xC0..=0xFF => {
                if port & 0x01 == 0 {
                    self.read_port_a()
                } else {
                    self.read_port_b()
                }
            }
            _ => 0xFF,
        }
    }

    fn io_write(&mut self, port: u8, data: u8) {
        match port {
            // Game Gear stereo mask
            0x06 if self.is_game_gear() => self.psg.set_gg_stereo(data),
            0x00..=0x05 if self.is_game_gear() => {}
            0x00..=0x3F => {
                if port & 0x01 == 0 {
                    self.hw.memory_control = data;
                } else {
                    self.write_io_control(data);
                }
            }
            0x40..=0x7F => self.psg.data_write(data),
            0x80..=0xBF => {
                if port & 0x01 == 0 {
                    self.vdp.data_write(data);
                } else {
                    self.vdp.control_write(data);
                }
            }
            0xF0 if self.has_fm() => {
                if let Some(fm) = &mut self.fm {
                    fm.addr_write(data);
                }
            }
            0xF1 if self.has_fm() => {
                if let Some(fm) = &mut self.fm {
                    fm.data_write(data);
                }
            }
            0xF2 if self.has_fm() => self.hw.audio_control = data & 0x03,
            // SDSC debug console
            0xFD | 0xFE if self.hw.memory_control & memory_control::IO_DISABLE != 0 => {
                eprint!("{}", data as char);
            }
            _ => {}
        }
    }

    fn get_int(&mut self) -> bool {
        self.vdp.get_interrupt()
    }

    fn get_nmi(&mut self) -> bool {
        // Pause button; the Game Gear's Start is an I/O-port bit instead
        self.kind == ConsoleKind::MasterSystem && self.gamepad_1.pressed(Button::Start)
    }

    fn sync_cycles(&mut self, cycle_count: u64) {
        self.now = cycle_count;
    }
}

pub struct Sms {
    cpu: Z80,
    bus: SmsBus,
    clock: Clock,
    frame_sink: FrameSink,
    overclock: u32,
    pending_cycles: u32,
}

impl Sms {
    pub fn new(config: ConsoleConfig, kind: ConsoleKind) -> Self {
        debug_assert!(matches!(
            kind,
            ConsoleKind::MasterSystem | ConsoleKind::GameGear
        ));

        let hints = db::sms_hints(config.rom.hash());

        let mut format = config.format;
        if config.format_auto && hints & sms_hint::PAL_ONLY != 0 {
            format = VideoFormat::Pal;
        }

        let variant = if kind == ConsoleKind::GameGear {
            VdpVariant::GameGear
        } else {
            VdpVariant::Sms
        };
        let mut vdp = Vdp::new(variant, format);
        vdp.remove_sprite_limit = config.remove_sprite_limit;
        vdp.disable_blanking = config.disable_blanking;
        vdp.sms1_vdp_hint = hints & sms_hint::SMS1_VDP != 0;

        let gamepad_kind = if hints & sms_hint::PADDLE_ONLY != 0 {
            GamepadType::SmsPaddle
        } else if hints & sms_hint::LIGHT_PHASER != 0 {
            GamepadType::SmsPhaser
        } else {
            GamepadType::Standard
        };

        let mapper = if hints & sms_hint::MAPPER_NONE != 0 {
            SmsMapper::None
        } else if hints & sms_hint::MAPPER_SEGA != 0 {
            SmsMapper::Sega
        } else if hints & sms_hint::MAPPER_CODEMASTERS != 0 {
            SmsMapper::Codemasters
        } else if hints & sms_hint::MAPPER_KOREAN != 0 {
            SmsMapper::Korean
        } else {
            SmsMapper::Unknown
        };

        info!(
            "{} KiB {} ROM loaded",
            config.rom.size() >> 10,
            if kind == ConsoleKind::GameGear { "Game Gear" } else { "Master System" },
        );

        let clock_rate = match format {
            VideoFormat::Ntsc => NTSC_CLOCK_RATE,
            VideoFormat::Pal => PAL_CLOCK_RATE,
        };

        // The FM unit shipped in Japanese Master Systems
        let fm = (kind == ConsoleKind::MasterSystem && config.region == Region::Japan)
            .then(Ym2413::new);

        let has_bios = config.bios.is_some();

        let mut console = Self {
            cpu: Z80::new(),
            bus: SmsBus {
                kind,
                region: config.region,
                format,
                clock_rate,
                vdp,
                psg: Psg::new(kind == ConsoleKind::GameGear),
                fm,
                ram: [0; SMS_RAM_SIZE],
                sram: Box::new([0; SMS_SRAM_SIZE]),
                sram_used: false,
                rom: config.rom,
                bios: config.bios,
                hw: SmsHwState {
                    memory_control: 0,
                    io_control: 0,
                    mapper,
                    mapper_bank: [0, 1, 2, 0],
                    sram_bank: 0,
                    sram_enable: false,
                    audio_control: 0,
                },
                rom_hints: hints,
                video_3d_field: Field3d::None,
                gamepad_1: Gamepad::with_keyboard_defaults(gamepad_kind),
                gamepad_2: Gamepad::new(GamepadType::Standard),
                export_paddle: false,
                paddle_clock: 0,
                reset_button: false,
                reset_button_timeout: 0,
                now: 0,
                pending_error: None,
            },
            clock: Clock::new(clock_rate),
            frame_sink: FrameSink::new(256, 192),
            overclock: config.overclock,
            pending_cycles: 0,
        };

        if !has_bios {
            console.boot_without_bios();
        }

        console
    }

    /// Minimal substitute for the boot ROM: interrupt mode and stack
    /// pointer as the BIOS leaves them, the VDP in mode 4, and the line
    /// counter reset value parked at 0xFF.
    fn boot_without_bios(&mut self) {
        self.cpu.im = 1;
        self.cpu.sp = 0xDFF0;

        self.bus.hw.memory_control |= memory_control::BIOS_DISABLE;

        self.bus.vdp.control_write(ctrl0::MODE_4);
        self.bus.vdp.control_write(code::REG_WRITE);

        self.bus.vdp.control_write(0xFF);
        self.bus.vdp.control_write(code::REG_WRITE | 0x0A);
    }

    /// Restore battery-backed cartridge memory saved by a previous session.
    pub fn load_sram(&mut self, data: &[u8]) {
        let len = data.len().min(SMS_SRAM_SIZE);
        self.bus.sram[..len].copy_from_slice(&data[..len]);
    }

    /// Console reset button (SMS only; the Game Gear has none). Asserted
    /// on the controller port for a fraction of a second.
    pub fn press_reset(&mut self) {
        self.bus.reset_button = true;
        self.bus.reset_button_timeout = RESET_BUTTON_CYCLES;
    }

    /// Field currently selected through the 3D-glasses latch.
    pub fn video_3d_field(&self) -> Field3d {
        self.bus.video_3d_field
    }

    /// Hints matched against the ROM hash at load time.
    pub fn rom_hints(&self) -> u16 {
        self.bus.rom_hints
    }

    pub fn rom_hash(&self) -> &[u8; crate::rom::HASH_LENGTH] {
        self.bus.rom.hash()
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

impl Console for Sms {
    fn kind(&self) -> ConsoleKind {
        self.bus.kind
    }

    fn clock_rate(&self) -> u32 {
        self.clock.clock_rate()
    }

    fn run(&mut self, cycles: u32) -> Result<(), EmulationError> {
        if self.bus.gamepad_1.kind == GamepadType::SmsPaddle {
            self.bus.gamepad_1.paddle_tick(cycles, self.bus.clock_rate);
        }

        if self.bus.reset_button {
            self.bus.reset_button_timeout = self.bus.reset_button_timeout.saturating_sub(cycles);
            if self.bus.reset_button_timeout == 0 {
                self.bus.reset_button = false;
            }
        }

        self.pending_cycles += cycles;
        let mut lines = self.pending_cycles / CYCLES_PER_SCANLINE;
        self.pending_cycles -= lines * CYCLES_PER_SCANLINE;

        let clock_rate = self.bus.clock_rate;

        while lines > 0 {
            lines -= 1;

            self.cpu
                .run_cycles(&mut self.bus, CYCLES_PER_SCANLINE + self.overclock)?;
            if let Some(error) = self.bus.pending_error.take() {
                return Err(error);
            }

            self.bus.psg.run_cycles(clock_rate, CYCLES_PER_SCANLINE);
            if let Some(fm) = &mut self.bus.fm {
                fm.run_cycles(clock_rate, CYCLES_PER_SCANLINE);
            }

            if self.bus.vdp.run_one_scanline() {
                self.frame_sink.publish(&self.bus.vdp.frame_buffer);
            }
            self.bus.vdp.update_line_interrupt();
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
        if let InputEvent::MouseMotion { x, y } = *event {
            if self.bus.gamepad_1.kind == GamepadType::SmsPhaser {
                self.bus.vdp.phaser_cursor = Some((x, y));
            }
        }
        self.bus.gamepad_1.handle_event(event);
        self.bus.gamepad_2.handle_event(event);
    }

    fn state_save(&mut self) -> Vec<u8> {
        let mut writer = StateWriter::new(self.kind().state_tag());

        let mut hw = ByteWriter::new();
        hw.put_u8(self.bus.hw.memory_control);
        hw.put_u8(self.bus.hw.io_control);
        hw.put_u8(self.bus.hw.mapper.to_u8());
        hw.put_bytes(&self.bus.hw.mapper_bank);
        hw.put_u16(self.bus.hw.sram_bank);
        hw.put_bool(self.bus.hw.sram_enable);
        hw.put_u8(self.bus.hw.audio_control);
        hw.put_u8(match self.bus.video_3d_field {
            Field3d::None => 0,
            Field3d::Left => 1,
            Field3d::Right => 2,
        });
        hw.put_bool(self.bus.export_paddle);
        writer.add_section(SECTION_ID_SMS_HW, 1, &hw.into_bytes());

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
                SECTION_ID_SMS_HW => {
                    StateReader::expect_size(&section, SMS_HW_STATE_SIZE)?;
                    let mut input = ByteReader::new(section.data);
                    self.bus.hw.memory_control = input.u8()?;
                    self.bus.hw.io_control = input.u8()?;
                    self.bus.hw.mapper = SmsMapper::from_u8(input.u8()?);
                    let banks = input.bytes(4)?;
                    self.bus.hw.mapper_bank.copy_from_slice(banks);
                    self.bus.hw.sram_bank = input.u16()?;
                    self.bus.hw.sram_enable = input.bool()?;
                    self.bus.hw.audio_control = input.u8()?;
                    self.bus.video_3d_field = match input.u8()? {
                        1 => Field3d::Left,
                        2 => Field3d::Right,
                        _ => Field3d::None,
                    };
                    self.bus.export_paddle = input.bool()?;
                }
                SECTION_ID_Z80 => self.cpu.state_load(section.version, section.data)?,
                SECTION_ID_RAM => {
                    StateReader::expect_size(&section, SMS_RAM_SIZE)?;
                    self.bus.ram.copy_from_slice(section.data);
                }
                SECTION_ID_SRAM => {
                    StateReader::expect_size(&section, SMS_SRAM_SIZE)?;
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

inventory::submit! {
    ConsoleEntry {
        name: "sms",
        kind: ConsoleKind::MasterSystem,
        create: |config| Box::new(Sms::new(config, ConsoleKind::MasterSystem)),
    }
}

inventory::submit! {
    ConsoleEntry {
        name: "gamegear",
        kind: ConsoleKind::GameGear,
        create: |config| Box::new(Sms::new(config, ConsoleKind::GameGear)),
    }
}
