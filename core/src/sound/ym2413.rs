//! YM2413 FM sound unit (OPLL).
//!
//! Register interface, instrument ROM, and the sign-magnitude exp/log-sin
//! pipeline tables, based on Andete's reverse-engineering documents. The
//! operator/envelope pipeline is not yet modelled, so the unit contributes
//! silence; games still program it through the SMS audio-control port.

use std::sync::OnceLock;

pub const YM2413_RING_SIZE: usize = 4096;

const SAMPLE_RATE: u32 = 48_000;

/// Sign-magnitude 16-bit value: bit 15 is the sign, the rest is magnitude.
pub type SignMag16 = u16;

pub const SIGN_BIT: u16 = 0x8000;
pub const MAG_BITS: u16 = 0x7FFF;

/// Built-in instrument parameters (15 instruments x 8 bytes).
pub const INSTRUMENT_ROM: [[u8; 8]; 15] = [
    [0x71, 0x61, 0x1E, 0x17, 0xD0, 0x78, 0x00, 0x17],
    [0x13, 0x41, 0x1A, 0x0D, 0xD8, 0xF7, 0x23, 0x13],
    [0x13, 0x01, 0x99, 0x00, 0xF2, 0xC4, 0x11, 0x23],
    [0x31, 0x61, 0x0E, 0x07, 0xA8, 0x64, 0x70, 0x27],
    [0x32, 0x21, 0x1E, 0x06, 0xE0, 0x76, 0x00, 0x28],
    [0x31, 0x22, 0x16, 0x05, 0xE0, 0x71, 0x00, 0x18],
    [0x21, 0x61, 0x1D, 0x07, 0x82, 0x81, 0x10, 0x07],
    [0x23, 0x21, 0x2D, 0x14, 0xA2, 0x72, 0x00, 0x07],
    [0x61, 0x61, 0x1B, 0x06, 0x64, 0x65, 0x10, 0x17],
    [0x41, 0x61, 0x0B, 0x18, 0x85, 0xF7, 0x71, 0x07],
    [0x13, 0x01, 0x83, 0x11, 0xFA, 0xE4, 0x10, 0x04],
    [0x17, 0xC1, 0x24, 0x07, 0xF8, 0xF8, 0x22, 0x12],
    [0x61, 0x50, 0x0C, 0x05, 0xC2, 0xF5, 0x20, 0x42],
    [0x01, 0x01, 0x55, 0x03, 0xC9, 0x95, 0x03, 0x02],
    [0x61, 0x41, 0x89, 0x03, 0xF1, 0xE4, 0x40, 0x13],
];

/// exp2 table with 8 fractional input bits. The always-set bit 10 is kept.
fn exp_table() -> &'static [u32; 256] {
    static TABLE: OnceLock<[u32; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0u32; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            *entry = ((i as f64 / 256.0).exp2() * 1024.0).round() as u32;
        }
        table
    })
}

/// -log2(sin) quarter-wave table, fixed point with 8 fractional bits.
fn log_sin_table() -> &'static [u32; 256] {
    static TABLE: OnceLock<[u32; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0u32; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let sin = ((i as f64 + 0.5) * std::f64::consts::PI / 2.0 / 256.0).sin();
            *entry = (-sin.log2() * 256.0).round() as u32;
        }
        table
    })
}

/// Lookup through the exp table. The index is inverted to account for the
/// log-sin table storing -log2 values.
pub fn ym2413_exp(val: SignMag16) -> SignMag16 {
    let fractional = !(val as u8);
    let integral = (val & MAG_BITS) >> 8;

    let mut result = (exp_table()[fractional as usize] >> integral) as u16;

    // Propagate the sign
    result |= val & SIGN_BIT;
    result
}

/// Quarter-wave log-sin lookup over a 10-bit phase. The second and fourth
/// quarters mirror the table by bit inversion; the second half of the wave
/// shifts the phase MSB into the sign bit.
pub fn ym2413_sin(phase: u16) -> SignMag16 {
    let mut index = phase as u8;

    if phase & (1 << 8) != 0 {
        index = !index;
    }

    let mut result = log_sin_table()[index as usize] as u16;
    result |= (phase << 6) & SIGN_BIT;
    result
}

/// Register file and output ring of the FM unit.
pub struct Ym2413 {
    addr_latch: u8,
    pub regs: [u8; 0x3A],

    sample_ring: [i16; YM2413_RING_SIZE],
    write_index: u64,
    read_index: u64,
    completed_samples: u64,
    clock_rate: u32,
    excess: u32,
}

impl Default for Ym2413 {
    fn default() -> Self {
        Self::new()
    }
}

impl Ym2413 {
    pub fn new() -> Self {
        // One-time table builds
        let _ = exp_table();
        let _ = log_sin_table();

        Self {
            addr_latch: 0,
            regs: [0; 0x3A],
            sample_ring: [0; YM2413_RING_SIZE],
            write_index: 0,
            read_index: 0,
            completed_samples: 0,
            clock_rate: 0,
            excess: 0,
        }
    }

    /// Latch a register address. The channel-register rows mirror their
    /// upper addresses down (0x19-0x1F behave as 0x10-0x16, and likewise
    /// for the 0x2x and 0x3x rows).
    pub fn addr_write(&mut self, addr: u8) {
        let addr = match addr {
            0x19..=0x1F | 0x29..=0x2F | 0x39..=0x3F => addr - 0x09,
            _ => addr,
        };
        self.addr_latch = addr;
    }

    /// Write data to the latched register address.
    pub fn data_write(&mut self, data: u8) {
        if (self.addr_latch as usize) < self.regs.len() {
            self.regs[self.addr_latch as usize] = data;
        }
    }

    /// Advance the unit; a full 18-operator update takes 72 CPU cycles.
    pub fn run_cycles(&mut self, clock_rate: u32, cycles: u32) {
        let total = u64::from(cycles) + u64::from(self.excess);
        let mut samples = total / 72;
        self.excess = (total - samples * 72) as u32;

        if self.clock_rate != clock_rate {
            self.clock_rate = clock_rate;
            self.read_index = 0;
            self.write_index = 0;
            self.completed_samples = 0;
        }

        while samples > 0 {
            samples -= 1;

            // Operator and envelope simulation is not yet modelled; the
            // ring carries silence at the correct rate.
            self.sample_ring[(self.write_index % YM2413_RING_SIZE as u64) as usize] = 0;

            self.completed_samples += 1;
            self.write_index = self.completed_samples * u64::from(SAMPLE_RATE) * 72
                / u64::from(self.clock_rate);
        }
    }

    /// Pull interleaved-stereo frames, mixing into `stream`.
    pub fn get_samples(&mut self, stream: &mut [i16]) {
        let count = (stream.len() / 2) as u64;

        if self.clock_rate == 0 {
            return;
        }

        if self.read_index + count > self.write_index {
            let shortfall = count - (self.write_index - self.read_index);
            let cycles = (shortfall + 1) * u64::from(self.clock_rate) / u64::from(SAMPLE_RATE);
            self.run_cycles(self.clock_rate, cycles as u32);
        }

        for i in 0..count as usize {
            let slot = ((self.read_index + i as u64) % YM2413_RING_SIZE as u64) as usize;
            let sample = self.sample_ring[slot];
            stream[2 * i] = stream[2 * i].saturating_add(sample);
            stream[2 * i + 1] = stream[2 * i + 1].saturating_add(sample);
        }

        self.read_index += count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sin_quarter_symmetry() {
        // Second quarter mirrors the first
        assert_eq!(
            ym2413_sin(0x010) & MAG_BITS,
            ym2413_sin(0x1EF) & MAG_BITS
        );
        // Second half is the first half with the sign bit set
        assert_eq!(
            ym2413_sin(0x210),
            ym2413_sin(0x010) | SIGN_BIT
        );
    }

    #[test]
    fn exp_propagates_sign() {
        let positive = ym2413_exp(0x0123);
        let negative = ym2413_exp(0x0123 | SIGN_BIT);
        assert_eq!(positive | SIGN_BIT, negative);
        assert_eq!(positive & SIGN_BIT, 0);
    }

    #[test]
    fn sin_peak_is_near_zero_attenuation() {
        // The wave peak (phase 0xFF) has the smallest -log2 magnitude
        assert!(ym2413_sin(0x0FF) & MAG_BITS <= 1);
    }

    #[test]
    fn register_rows_mirror_down() {
        let mut fm = Ym2413::new();
        fm.addr_write(0x1F);
        fm.data_write(0xAB);
        assert_eq!(fm.regs[0x16], 0xAB);
    }
}
