//! Band-limited step synthesis.
//!
//! Square-wave transitions from the PSG are turned into pre-computed
//! band-limited steps before they reach the 48 kHz output, removing the
//! aliasing a naive resample would produce. A single high-resolution step
//! (-1.0 to +1.0) is built once from summed harmonics; 32 sub-sample phases
//! of it are then stored as 48-sample difference kernels.

use std::f64::consts::PI;
use std::sync::OnceLock;

/// Number of sub-sample phase offsets.
pub const PHASE_COUNT: usize = 32;

/// Output samples affected by one step.
pub const PHASE_SAMPLES: usize = 48;

const MASTER_SAMPLE_COUNT: usize = PHASE_COUNT * PHASE_SAMPLES;

struct StepTable {
    /// `step[phase][sample]`: difference kernels, each summing to 1.0.
    step: [[f64; PHASE_SAMPLES]; PHASE_COUNT],
}

static STEP_TABLE: OnceLock<StepTable> = OnceLock::new();

/// Build the band-limited master step by summing odd harmonics of a 50 Hz
/// fundamental up to the given limit. 50 Hz allows a reasonable number of
/// harmonics below the 24 kHz Nyquist limit.
fn calculate_master_step(limit: u32) -> [f64; MASTER_SAMPLE_COUNT] {
    let base_hz = 50u32;
    let mut master = [0.0; MASTER_SAMPLE_COUNT];

    let mut harmonic = 0u32;
    let mut frequency = base_hz;

    while frequency < limit {
        for (i, value) in master.iter_mut().enumerate() {
            // t ranges over -0.5 ms .. +0.5 ms, covering 48 samples at 48 kHz
            let t = (i as f64 - (MASTER_SAMPLE_COUNT / 2) as f64)
                * ((48.0 / 48000.0) / MASTER_SAMPLE_COUNT as f64);

            *value +=
                (frequency as f64 * t * (2.0 * PI)).sin() * (4.0 / PI) / (1 + 2 * harmonic) as f64;
        }

        harmonic += 1;
        frequency = base_hz * (1 + 2 * harmonic);
    }

    master
}

/// Sample the master step with tapering towards the ends; indexes outside
/// the table saturate to the step's resting levels.
fn sample_master_step(master: &[f64; MASTER_SAMPLE_COUNT], index: i32) -> f64 {
    if index < 0 {
        return -1.0;
    }
    if index >= MASTER_SAMPLE_COUNT as i32 {
        return 1.0;
    }

    let mut sample = master[index as usize];
    let taper_length = (MASTER_SAMPLE_COUNT / 8) as i32;

    if index < taper_length {
        let ratio = index as f64 / taper_length as f64;
        sample = sample * ratio - (1.0 - ratio);
    }
    if index > MASTER_SAMPLE_COUNT as i32 - taper_length {
        let ratio = (MASTER_SAMPLE_COUNT as i32 - index) as f64 / taper_length as f64;
        sample = sample * ratio + (1.0 - ratio);
    }

    sample
}

fn build_step_table() -> StepTable {
    let master = calculate_master_step(24_000);
    let mut step = [[0.0; PHASE_SAMPLES]; PHASE_COUNT];

    for (phase, kernel) in step.iter_mut().enumerate() {
        let offset = PHASE_COUNT as i32 - phase as i32 - 31;

        for (sample, value) in kernel.iter_mut().enumerate() {
            // Halved: the master step swings -1.0 to +1.0, the kernel must
            // carry a transition of magnitude 1.0
            *value = (sample_master_step(&master, offset + (sample as i32) * PHASE_COUNT as i32)
                - sample_master_step(&master, offset + (sample as i32 - 1) * PHASE_COUNT as i32))
                * 0.5;
        }

        // Spread any drift evenly so each kernel sums to exactly 1.0
        let sum: f64 = kernel.iter().sum();
        for value in kernel.iter_mut() {
            *value += (1.0 - sum) / PHASE_SAMPLES as f64;
        }
    }

    StepTable { step }
}

fn step_table() -> &'static StepTable {
    STEP_TABLE.get_or_init(build_step_table)
}

/// Per-channel band-limiting state: a circular difference ring and the
/// running integrator. Introduces a 24-sample delay, as each output sample
/// is affected by future transitions.
pub struct BandLimit {
    diff_ring: [f64; PHASE_SAMPLES],
    diff_ring_index: usize,
    previous_input: i16,
    output: f64,
}

impl Default for BandLimit {
    fn default() -> Self {
        Self::new()
    }
}

impl BandLimit {
    pub fn new() -> Self {
        // Force the one-time table build outside the audio path
        let _ = step_table();
        Self {
            diff_ring: [0.0; PHASE_SAMPLES],
            diff_ring_index: 0,
            previous_input: 0,
            output: 0.0,
        }
    }

    /// Feed one raw square-wave sample with its sub-sample transition phase
    /// (0 = no delay, 31 = almost a full sample); returns the band-limited
    /// output sample.
    pub fn process(&mut self, input: i16, phase: usize) -> i16 {
        let delta = f64::from(input) - f64::from(self.previous_input);
        self.previous_input = input;

        if delta != 0.0 {
            let kernel = &step_table().step[phase & (PHASE_COUNT - 1)];
            for (j, weight) in kernel.iter().enumerate() {
                self.diff_ring[(self.diff_ring_index + j) % PHASE_SAMPLES] += weight * delta;
            }
        }

        self.output += self.diff_ring[self.diff_ring_index];
        let result = self.output as i16;

        self.diff_ring[self.diff_ring_index] = 0.0;
        self.diff_ring_index = (self.diff_ring_index + 1) % PHASE_SAMPLES;

        result
    }
}
