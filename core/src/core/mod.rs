pub mod bus;
pub mod clock;
pub mod machine;

pub use bus::Bus;
pub use clock::Clock;
pub use machine::{Console, ConsoleKind, EmulationError, InputEvent, Region, VideoFormat};
