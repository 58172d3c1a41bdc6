//! Shared plumbing for single-step CPU validation.
//!
//! Test vectors follow the SingleStepTests JSON layout: an initial CPU and
//! RAM state, a final state, the per-cycle bus activity (used here only for
//! its length, which is the instruction's T-state count), and queued I/O
//! port data for IN/OUT coverage.

use serde::{Deserialize, Serialize};

use lumen_core::core::Bus;

/// Flat 64 KiB memory with a scripted I/O port queue and an access log for
/// the vector generator.
pub struct VectorBus {
    pub memory: Box<[u8; 0x10000]>,
    /// Queued (port, data, direction) triples; direction is "r" or "w".
    pub port_queue: Vec<(u16, u8, char)>,
    port_cursor: usize,
    /// Memory addresses touched, with 'r'/'w' direction.
    pub accesses: Vec<(u16, char)>,
    pub int_line: bool,
    pub nmi_line: bool,
}

impl VectorBus {
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
            port_queue: Vec::new(),
            port_cursor: 0,
            accesses: Vec::new(),
            int_line: false,
            nmi_line: false,
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }
}

impl Default for VectorBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for VectorBus {
    fn mem_read(&mut self, addr: u16) -> u8 {
        self.accesses.push((addr, 'r'));
        self.memory[addr as usize]
    }

    fn mem_write(&mut self, addr: u16, data: u8) {
        self.accesses.push((addr, 'w'));
        self.memory[addr as usize] = data;
    }

    fn io_read(&mut self, port: u8) -> u8 {
        // Serve the next queued read for this port's low byte
        while self.port_cursor < self.port_queue.len() {
            let (vector_port, data, direction) = self.port_queue[self.port_cursor];
            self.port_cursor += 1;
            if direction == 'r' && vector_port as u8 == port {
                return data;
            }
        }
        0xFF
    }

    fn io_write(&mut self, _port: u8, _data: u8) {}

    fn get_int(&mut self) -> bool {
        self.int_line
    }

    fn get_nmi(&mut self) -> bool {
        self.nmi_line
    }
}

// --- Z80 JSON test vector types (SingleStepTests/z80 format) ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Z80TestCase {
    pub name: String,
    pub initial: Z80CpuState,
    #[serde(rename = "final")]
    pub final_state: Z80CpuState,
    /// Per-cycle bus records; only the length (T-state count) is checked.
    #[serde(default)]
    pub cycles: Vec<serde_json::Value>,
    #[serde(default)]
    pub ports: Vec<(u16, u8, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Z80CpuState {
    pub pc: u16,
    pub sp: u16,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub f: u8,
    pub h: u8,
    pub l: u8,
    pub i: u8,
    pub r: u8,
    pub ix: u16,
    pub iy: u16,
    #[serde(rename = "af_")]
    pub af_prime: u16,
    #[serde(rename = "bc_")]
    pub bc_prime: u16,
    #[serde(rename = "de_")]
    pub de_prime: u16,
    #[serde(rename = "hl_")]
    pub hl_prime: u16,
    pub im: u8,
    pub iff1: u8,
    pub iff2: u8,
    /// EI-delay flag; carried through but not asserted on.
    #[serde(default)]
    pub ei: u8,
    /// Hidden WZ register and the undocumented P/Q latches are not
    /// modelled by the interpreter; accepted so vectors parse.
    #[serde(default)]
    pub wz: u16,
    #[serde(default)]
    pub p: u8,
    #[serde(default)]
    pub q: u8,
    pub ram: Vec<(u16, u8)>,
}

/// Load a vector file; `.gz` files are decompressed transparently.
pub fn load_test_cases(path: &std::path::Path) -> std::io::Result<Vec<Z80TestCase>> {
    let raw = std::fs::read(path)?;

    let text = if path.extension().is_some_and(|ext| ext == "gz") {
        use std::io::Read;
        let mut decoder = flate2::read::GzDecoder::new(&raw[..]);
        let mut text = String::new();
        decoder.read_to_string(&mut text)?;
        text
    } else {
        String::from_utf8(raw).map_err(std::io::Error::other)?
    };

    serde_json::from_str(&text).map_err(std::io::Error::other)
}

/// Write a vector file, gzip-compressed.
pub fn write_test_cases(
    path: &std::path::Path,
    cases: &[Z80TestCase],
) -> std::io::Result<()> {
    use std::io::Write;

    let json = serde_json::to_string(cases)?;
    let file = std::fs::File::create(path)?;
    let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    encoder.write_all(json.as_bytes())?;
    encoder.finish()?;
    Ok(())
}
