pub mod band_limit;
pub mod sn76489;
pub mod ym2413;

pub use band_limit::BandLimit;
pub use sn76489::{Psg, Sn76489};
pub use ym2413::Ym2413;

/// Output sample rate of the audio path, in Hz.
pub const AUDIO_SAMPLE_RATE: u32 = 48_000;
