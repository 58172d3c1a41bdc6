/// Converts host wall-clock time into whole CPU cycles without cumulative
/// drift. The fractional remainder is carried in millicycles (thousandths
/// of a cycle), so `clock_rate × elapsed` is always accounted for exactly.
pub struct Clock {
    clock_rate: u32,
    millicycles: u64,
}

impl Clock {
    pub fn new(clock_rate: u32) -> Self {
        Self {
            clock_rate,
            millicycles: 0,
        }
    }

    pub fn clock_rate(&self) -> u32 {
        self.clock_rate
    }

    /// Change the clock rate (NTSC <-> PAL). The millicycle remainder is
    /// kept; it is below one cycle, so no time is lost.
    pub fn set_clock_rate(&mut self, clock_rate: u32) {
        self.clock_rate = clock_rate;
    }

    /// Whole CPU cycles for `ms` milliseconds of wall-clock time.
    pub fn cycles_for_ms(&mut self, ms: u32) -> u32 {
        self.millicycles += u64::from(ms) * u64::from(self.clock_rate);
        let cycles = self.millicycles / 1000;
        self.millicycles -= cycles * 1000;
        cycles as u32
    }
}
