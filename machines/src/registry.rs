//! Console registry for automatic front-end discovery.
//!
//! Each console self-registers via [`inventory::submit!`] with a
//! [`ConsoleEntry`] containing its CLI name, console kind, and a factory
//! function. The front-end discovers available consoles at runtime without
//! any central list.

use lumen_core::core::machine::{Console, ConsoleKind, Region, VideoFormat};

use crate::rom::RomImage;

/// Everything needed to construct a console.
pub struct ConsoleConfig {
    pub rom: RomImage,
    pub bios: Option<RomImage>,
    pub format: VideoFormat,
    /// Let per-title hints (PAL-only releases) override `format`.
    pub format_auto: bool,
    pub region: Region,
    /// Extra CPU cycles per scanline. Affects CPU speed only, not video or
    /// audio timing.
    pub overclock: u32,
    pub remove_sprite_limit: bool,
    pub disable_blanking: bool,
}

impl ConsoleConfig {
    pub fn new(rom: RomImage) -> Self {
        Self {
            rom,
            bios: None,
            format: VideoFormat::Ntsc,
            format_auto: true,
            region: Region::World,
            overclock: 0,
            remove_sprite_limit: false,
            disable_blanking: false,
        }
    }
}

/// Describes a front-end-selectable console.
pub struct ConsoleEntry {
    /// CLI name used to select this console (e.g., "sms").
    pub name: &'static str,
    pub kind: ConsoleKind,
    /// Factory: construct the console around a loaded ROM image.
    pub create: fn(ConsoleConfig) -> Box<dyn Console>,
}

inventory::collect!(ConsoleEntry);

/// Return all registered consoles, sorted by name.
pub fn all() -> Vec<&'static ConsoleEntry> {
    let mut entries: Vec<_> = inventory::iter::<ConsoleEntry>.into_iter().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

/// Look up a console by its CLI name.
pub fn find(name: &str) -> Option<&'static ConsoleEntry> {
    inventory::iter::<ConsoleEntry>
        .into_iter()
        .find(|e| e.name == name)
}
