/// Connects a CPU to the rest of a console: memory, I/O ports, and the two
/// interrupt lines. Each console implements this on its internal bus struct,
/// so CPU dispatch is static: no trait objects, no allocation.
pub trait Bus {
    fn mem_read(&mut self, addr: u16) -> u8;
    fn mem_write(&mut self, addr: u16, data: u8);

    /// Read from the I/O port address space (separate from memory on the Z80).
    fn io_read(&mut self, port: u8) -> u8;

    /// Write to the I/O port address space.
    fn io_write(&mut self, port: u8, data: u8);

    /// Level of the maskable interrupt line.
    fn get_int(&mut self) -> bool;

    /// Level of the non-maskable interrupt line. Edge detection is done by
    /// the CPU, the bus only reports the current level.
    fn get_nmi(&mut self) -> bool;

    /// Notification of the CPU's running cycle count, once per instruction.
    /// Consoles that latch counters against time (H-counter on TH edges,
    /// Sports Pad nibble cycling) keep their clock here.
    fn sync_cycles(&mut self, _cycle_count: u64) {}
}
