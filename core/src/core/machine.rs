use crate::sound::sn76489::Psg;
use crate::state::StateError;
use crate::video::frame::FrameSink;

/// Which member of the TMS9918-family console line is being emulated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleKind {
    Sg1000,
    ColecoVision,
    MasterSystem,
    GameGear,
}

impl ConsoleKind {
    /// Four-byte console tag used in the save-state header.
    pub fn state_tag(self) -> [u8; 4] {
        match self {
            ConsoleKind::Sg1000 => *b"SG\0\0",
            ConsoleKind::ColecoVision => *b"COL\0",
            ConsoleKind::MasterSystem => *b"SMS\0",
            ConsoleKind::GameGear => *b"GG\0\0",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoFormat {
    Ntsc,
    Pal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    Japan,
    World,
}

/// Host input event, as delivered by whatever windowing/controller adapter
/// the frontend uses. The consoles route these through their gamepad
/// mappings; the core only defines the shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Axis { device: u32, axis: u8, value: i16 },
    Button { device: u32, button: u8, pressed: bool },
    Hat { device: u32, hat: u8, direction: u8 },
    Key { keysym: u32, pressed: bool },
    MouseButton { button: u8, pressed: bool },
    MouseMotion { x: i32, y: i32 },
}

/// A condition the emulated machine cannot recover from on its own.
/// Surfaced to the host as a (title, message) pair; the machine should be
/// considered stopped until a new ROM is loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmulationError {
    /// The program selected an interrupt mode that no supported console
    /// uses (IM 0 / IM 2 with a pending interrupt).
    UnsupportedInterruptMode(u8),
    /// A mapper feature the program relies on is not implemented
    /// (bank shifting, SRAM banking, Codemasters SRAM).
    UnsupportedMapperFeature(&'static str),
}

impl std::fmt::Display for EmulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedInterruptMode(im) => {
                write!(f, "unsupported interrupt mode {im}")
            }
            Self::UnsupportedMapperFeature(what) => {
                write!(f, "unsupported mapper feature: {what}")
            }
        }
    }
}

impl std::error::Error for EmulationError {}

/// Machine-agnostic interface for the emulated consoles.
///
/// The frontend drives a console through this trait alone: a cycle budget in,
/// frames out through the [`FrameSink`], audio pulled from the shared PSG
/// handle, input events routed in, and save states as opaque buffers.
pub trait Console {
    fn kind(&self) -> ConsoleKind;

    /// Advance emulation by a CPU cycle budget. Whole scanlines are run;
    /// the remainder is carried over to the next call.
    fn run(&mut self, cycles: u32) -> Result<(), EmulationError>;

    /// CPU clock rate in Hz for the current video format.
    fn clock_rate(&self) -> u32;

    /// Handle for the host presenter to pick up completed frames.
    fn frame_sink(&self) -> FrameSink;

    /// Handle for the host audio callback to pull samples from.
    fn audio(&self) -> Psg;

    /// Route a host input event into the console's controller state.
    fn input_event(&mut self, event: &InputEvent);

    /// Serialize the full machine state into a save-state buffer.
    fn state_save(&mut self) -> Vec<u8>;

    /// Restore machine state from a save-state buffer. On error the current
    /// state is left as-is for sections that failed their size check.
    fn state_load(&mut self, data: &[u8]) -> Result<(), StateError>;

    /// Battery-backed cartridge memory, if any writes happened this session.
    /// The host persists this on shutdown.
    fn sram(&self) -> Option<&[u8]>;
}
