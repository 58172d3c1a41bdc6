//! Controller state and host-input routing.
//!
//! Host adapters deliver [`InputEvent`]s; each player's mapping turns them
//! into the button-state array the console I/O handlers read. The less
//! ordinary port-1 devices live here too: the paddle's position
//! accumulator, the Sports Pad's strobe/nibble state machines, and the
//! ColecoVision keypad.

use lumen_core::core::machine::InputEvent;

/// Buttons a console can poll. `Start` doubles as Pause on the SMS and as
/// the NMI button on the SG-1000.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    Button1,
    Button2,
    Start,
}

pub const BUTTON_COUNT: usize = 7;

/// Which device is plugged into the port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GamepadType {
    None,
    Standard,
    SmsPaddle,
    SmsSportsPad,
    SmsPhaser,
}

/// Where one logical button comes from on the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MappingSource {
    Unmapped,
    Key(u32),
    JoyButton { device: u32, button: u8 },
    JoyAxis { device: u32, axis: u8, sign: i8 },
    JoyHat { device: u32, hat: u8, direction: u8 },
}

/// Host keysyms used by the default keyboard mapping (SDL keycode values).
pub mod keysym {
    pub const UP: u32 = 0x4000_0052;
    pub const DOWN: u32 = 0x4000_0051;
    pub const LEFT: u32 = 0x4000_0050;
    pub const RIGHT: u32 = 0x4000_004F;
    pub const Z: u32 = 'z' as u32;
    pub const X: u32 = 'x' as u32;
    pub const RETURN: u32 = '\r' as u32;
}

/// Axis deflection beyond which a mapped axis counts as pressed.
const AXIS_THRESHOLD: i16 = 16_000;

/// Paddle travel in position units per second while a direction is held.
const PADDLE_SPEED: f32 = 250.0;

/// Sports Pad nibble sequencing in relative mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TrackballState {
    XHigh,
    XLow,
    YHigh,
    YLow,
}

/// One controller port's worth of state.
pub struct Gamepad {
    pub kind: GamepadType,
    pub state: [bool; BUTTON_COUNT],
    mapping: [(Button, MappingSource); BUTTON_COUNT],

    // Paddle
    paddle_position: f32,
    paddle_velocity: f32,

    // Sports Pad
    trackball_delta: (f32, f32),
    trackball_x: i32,
    trackball_y: i32,
    trackball_state: TrackballState,
    trackball_strobe: bool,
    trackball_strobe_time: u64,

    pub mouse_button_left: bool,
    pub mouse_button_right: bool,

    /// ColecoVision keypad: one bit per key, 0-9 then '*' (10) and '#' (11).
    keypad: u16,
}

impl Gamepad {
    pub fn new(kind: GamepadType) -> Self {
        Self {
            kind,
            state: [false; BUTTON_COUNT],
            mapping: [
                (Button::Up, MappingSource::Unmapped),
                (Button::Down, MappingSource::Unmapped),
                (Button::Left, MappingSource::Unmapped),
                (Button::Right, MappingSource::Unmapped),
                (Button::Button1, MappingSource::Unmapped),
                (Button::Button2, MappingSource::Unmapped),
                (Button::Start, MappingSource::Unmapped),
            ],
            paddle_position: 128.0,
            paddle_velocity: 0.0,
            trackball_delta: (0.0, 0.0),
            trackball_x: 0,
            trackball_y: 0,
            trackball_state: TrackballState::XHigh,
            trackball_strobe: false,
            trackball_strobe_time: 0,
            mouse_button_left: false,
            mouse_button_right: false,
            keypad: 0,
        }
    }

    /// Arrow keys, Z/X fire buttons, Return for Start/Pause.
    pub fn with_keyboard_defaults(kind: GamepadType) -> Self {
        let mut pad = Self::new(kind);
        pad.mapping = [
            (Button::Up, MappingSource::Key(keysym::UP)),
            (Button::Down, MappingSource::Key(keysym::DOWN)),
            (Button::Left, MappingSource::Key(keysym::LEFT)),
            (Button::Right, MappingSource::Key(keysym::RIGHT)),
            (Button::Button1, MappingSource::Key(keysym::Z)),
            (Button::Button2, MappingSource::Key(keysym::X)),
            (Button::Start, MappingSource::Key(keysym::RETURN)),
        ];
        pad
    }

    pub fn set_mapping(&mut self, button: Button, source: MappingSource) {
        for entry in self.mapping.iter_mut() {
            if entry.0 == button {
                entry.1 = source;
            }
        }
    }

    pub fn pressed(&self, button: Button) -> bool {
        self.state[button as usize]
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        self.state[button as usize] = pressed;
    }

    /// Route one host event through the mapping.
    pub fn handle_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Key { keysym, pressed } => {
                for &(button, source) in &self.mapping {
                    if source == MappingSource::Key(keysym) {
                        self.state[button as usize] = pressed;
                    }
                }
                self.handle_keypad(keysym, pressed);
            }
            InputEvent::Button { device, button, pressed } => {
                for &(mapped, source) in &self.mapping {
                    if source == (MappingSource::JoyButton { device, button }) {
                        self.state[mapped as usize] = pressed;
                    }
                }
            }
            InputEvent::Axis { device, axis, value } => {
                for &(mapped, source) in &self.mapping {
                    if let MappingSource::JoyAxis { device: d, axis: a, sign } = source {
                        if d == device && a == axis {
                            self.state[mapped as usize] =
                                value as i32 * i32::from(sign) > i32::from(AXIS_THRESHOLD);
                        }
                    }
                }
                // The Sports Pad accumulates raw axis motion
                if self.kind == GamepadType::SmsSportsPad {
                    let delta = f32::from(value) / 2048.0;
                    if axis == 0 {
                        self.trackball_delta.0 += delta;
                    } else if axis == 1 {
                        self.trackball_delta.1 += delta;
                    }
                }
            }
            InputEvent::Hat { device, hat, direction } => {
                for &(mapped, source) in &self.mapping {
                    if let MappingSource::JoyHat { device: d, hat: h, direction: bit } = source {
                        if d == device && h == hat {
                            self.state[mapped as usize] = direction & bit != 0;
                        }
                    }
                }
            }
            InputEvent::MouseButton { button, pressed } => {
                if button == 0 {
                    self.mouse_button_left = pressed;
                } else if button == 1 {
                    self.mouse_button_right = pressed;
                }
            }
            InputEvent::MouseMotion { .. } => {
                // Cursor position is console-level state (phaser, Graphic Board)
            }
        }
    }

    fn handle_keypad(&mut self, keysym: u32, pressed: bool) {
        let bit = match keysym {
            0x30..=0x39 => keysym - 0x30,     // '0'..'9'
            0x2A => 10,                       // '*'
            0x23 => 11,                       // '#'
            _ => return,
        };
        if pressed {
            self.keypad |= 1 << bit;
        } else {
            self.keypad &= !(1 << bit);
        }
    }

    // -----------------------------------------------------------------------
    // Paddle
    // -----------------------------------------------------------------------

    /// Integrate digital-direction paddle movement over elapsed CPU cycles.
    pub fn paddle_tick(&mut self, cycles: u32, clock_rate: u32) {
        self.paddle_velocity = if self.pressed(Button::Left) {
            -1.0
        } else if self.pressed(Button::Right) {
            1.0
        } else {
            0.0
        };

        let time = cycles as f32 / clock_rate as f32;
        self.paddle_position =
            (self.paddle_position + self.paddle_velocity * PADDLE_SPEED * time).clamp(0.0, 255.0);
    }

    pub fn paddle_position(&self) -> u8 {
        self.paddle_position as u8
    }

    // -----------------------------------------------------------------------
    // Sports Pad
    // -----------------------------------------------------------------------

    /// Strobe-signal handling (TH pin level changes). `now` is in CPU
    /// cycles since power-on.
    pub fn trackball_strobe(&mut self, strobe: bool, now: u64) {
        if strobe == self.trackball_strobe {
            return;
        }
        self.trackball_strobe = strobe;

        let since_strobe = now.saturating_sub(self.trackball_strobe_time);
        self.trackball_strobe_time = now;

        // The transition into X-high latches the accumulated delta. A long
        // gap (50 lines) forces the latch even mid-sequence, resyncing a
        // game that stopped polling.
        if !strobe
            && (self.trackball_state == TrackballState::YLow
                || (self.trackball_state == TrackballState::XLow && since_strobe > 11_400))
        {
            self.trackball_x = -self.trackball_delta.0 as i32;
            self.trackball_y = -self.trackball_delta.1 as i32;

            // The fractional part keeps accumulating
            self.trackball_delta.0 += self.trackball_x as f32;
            self.trackball_delta.1 += self.trackball_y as f32;
            self.trackball_state = TrackballState::XHigh;
        } else if strobe && self.trackball_state == TrackballState::XHigh {
            self.trackball_state = TrackballState::XLow;
        } else if !strobe && self.trackball_state == TrackballState::XLow {
            self.trackball_state = TrackballState::YHigh;
        } else if strobe && self.trackball_state == TrackballState::YHigh {
            self.trackball_state = TrackballState::YLow;
        }
    }

    /// Controller-port level for the Sports Pad: nibble in bits 0-3, TL in
    /// bit 4, TR in bit 5.
    ///
    /// A real Sports Pad picks relative or absolute mode shortly after
    /// power-on from how TH is driven and then sticks with it; here the
    /// mode follows whether a strobe has been seen in the last three
    /// seconds, which is more forgiving to soft reset.
    pub fn trackball_port(&mut self, now: u64, clock_rate: u32) -> u8 {
        const BIT_TL: u8 = 0x10;
        const BIT_TR: u8 = 0x20;

        let since_strobe = now.saturating_sub(self.trackball_strobe_time);

        if since_strobe > u64::from(clock_rate) * 3 {
            // Absolute mode: coordinates update continuously, five nibbles
            // time-sliced over a 238 us loop with no strobe.
            self.trackball_x += self.trackball_delta.0 as i32;
            self.trackball_y += self.trackball_delta.1 as i32;
            self.trackball_delta.0 -= self.trackball_delta.0 as i32 as f32;
            self.trackball_delta.1 -= self.trackball_delta.1 as i32 as f32;

            let clocks_per_step = (238 * u64::from(clock_rate) / 1_000_000 / 5).max(1);
            match (since_strobe / clocks_per_step) % 5 {
                0 => {
                    BIT_TL | BIT_TR
                        | 0x04
                        | if self.mouse_button_left { 0 } else { 0x01 }
                        | if self.mouse_button_right { 0 } else { 0x02 }
                }
                1 => ((self.trackball_x >> 4) & 0x0F) as u8,
                2 => BIT_TL | (self.trackball_x & 0x0F) as u8,
                3 => ((self.trackball_y >> 4) & 0x0F) as u8,
                _ => BIT_TL | (self.trackball_y & 0x0F) as u8,
            }
        } else {
            // Relative mode: four nibbles advanced by the strobe edges
            let mut levels = match self.trackball_state {
                TrackballState::XHigh => ((self.trackball_x >> 4) & 0x0F) as u8,
                TrackballState::XLow => (self.trackball_x & 0x0F) as u8,
                TrackballState::YHigh => ((self.trackball_y >> 4) & 0x0F) as u8,
                TrackballState::YLow => (self.trackball_y & 0x0F) as u8,
            };

            if !self.mouse_button_left {
                levels |= BIT_TL;
            }
            if !self.mouse_button_right {
                levels |= BIT_TR;
            }
            levels
        }
    }

    // -----------------------------------------------------------------------
    // ColecoVision keypad
    // -----------------------------------------------------------------------

    /// Four-bit keypad code for the highest-priority pressed key, or 0x0F
    /// when nothing is held.
    pub fn keypad_code(&self) -> u8 {
        const CODES: [(u16, u8); 12] = [
            (10, 0x09), // *
            (11, 0x06), // #
            (1, 0x0D),
            (2, 0x07),
            (3, 0x0C),
            (4, 0x02),
            (5, 0x03),
            (6, 0x0E),
            (7, 0x05),
            (8, 0x01),
            (9, 0x0B),
            (0, 0x0A),
        ];

        for &(bit, keypad_code) in &CODES {
            if self.keypad & (1 << bit) != 0 {
                return keypad_code;
            }
        }
        0x0F
    }
}
