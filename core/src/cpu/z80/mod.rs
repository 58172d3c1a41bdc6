mod alu;
mod bit;
mod block;
mod branch;
mod load_store;
mod stack;

use crate::core::Bus;
use crate::core::machine::EmulationError;
use crate::state::{ByteReader, ByteWriter, SECTION_ID_Z80, StateError, StateWriter};

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum Flag {
    C = 0x01,  // Carry
    N = 0x02,  // Add/Subtract
    PV = 0x04, // Parity/Overflow
    X = 0x08,  // Unused (copy of bit 3)
    H = 0x10,  // Half Carry
    Y = 0x20,  // Unused (copy of bit 5)
    Z = 0x40,  // Zero
    S = 0x80,  // Sign
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IndexMode {
    HL,
    IX,
    IY,
}

/// Size of the serialized register file in a save state.
pub const Z80_STATE_SIZE: usize = 35;

/// Instruction-stepped Z80 interpreter.
///
/// `run_cycles` executes whole instructions until the cycle budget is spent,
/// carrying the overshoot in `excess_cycles`. Memory, I/O, and the interrupt
/// lines are reached through the [`Bus`] the caller passes in, so one CPU
/// implementation serves every console.
pub struct Z80 {
    // Registers
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    // Shadow Registers
    pub a_prime: u8,
    pub f_prime: u8,
    pub b_prime: u8,
    pub c_prime: u8,
    pub d_prime: u8,
    pub e_prime: u8,
    pub h_prime: u8,
    pub l_prime: u8,
    // Index & Special Registers
    pub ix: u16,
    pub iy: u16,
    pub i: u8,
    pub r: u8,
    pub sp: u16,
    pub pc: u16,

    // Interrupt state
    pub iff1: bool,
    pub iff2: bool,
    pub im: u8,
    pub halted: bool,
    /// EI defers interrupt acceptance by one instruction.
    pub wait_after_ei: bool,

    /// Cycle counter since power-on.
    pub cycle_count: u64,
    /// Budget overshoot carried between `run_cycles` calls.
    pub excess_cycles: u32,

    pub(crate) used_cycles: u32,
    pub(crate) index_mode: IndexMode,
    nmi_previous: bool,
}

impl Default for Z80 {
    fn default() -> Self {
        Self::new()
    }
}

impl Z80 {
    /// Power-on defaults: AF and SP at 0xFFFF, everything else zero.
    pub fn new() -> Self {
        Self {
            a: 0xFF,
            f: 0xFF,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            a_prime: 0,
            f_prime: 0,
            b_prime: 0,
            c_prime: 0,
            d_prime: 0,
            e_prime: 0,
            h_prime: 0,
            l_prime: 0,
            ix: 0,
            iy: 0,
            i: 0,
            r: 0,
            sp: 0xFFFF,
            pc: 0x0000,
            iff1: false,
            iff2: false,
            im: 0,
            halted: false,
            wait_after_ei: false,
            cycle_count: 0,
            excess_cycles: 0,
            used_cycles: 0,
            index_mode: IndexMode::HL,
            nmi_previous: false,
        }
    }

    // Helpers for 16-bit register access
    pub fn get_bc(&self) -> u16 { ((self.b as u16) << 8) | self.c as u16 }
    pub fn set_bc(&mut self, val: u16) { self.b = (val >> 8) as u8; self.c = val as u8; }

    pub fn get_de(&self) -> u16 { ((self.d as u16) << 8) | self.e as u16 }
    pub fn set_de(&mut self, val: u16) { self.d = (val >> 8) as u8; self.e = val as u8; }

    pub fn get_hl(&self) -> u16 { ((self.h as u16) << 8) | self.l as u16 }
    pub fn set_hl(&mut self, val: u16) { self.h = (val >> 8) as u8; self.l = val as u8; }

    pub fn get_af(&self) -> u16 { ((self.a as u16) << 8) | self.f as u16 }
    pub fn set_af(&mut self, val: u16) { self.a = (val >> 8) as u8; self.f = val as u8; }

    pub(crate) fn flag(&self, flag: Flag) -> bool {
        self.f & flag as u8 != 0
    }

    /// Get 8-bit register by operand index (0=B .. 5=L, 7=A).
    /// Index 6 is the memory operand and is handled by callers.
    pub fn get_reg8(&self, index: u8) -> u8 {
        match index {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            7 => self.a,
            _ => unreachable!("get_reg8 called with index {}", index),
        }
    }

    pub fn set_reg8(&mut self, index: u8, val: u8) {
        match index {
            0 => self.b = val,
            1 => self.c = val,
            2 => self.d = val,
            3 => self.e = val,
            4 => self.h = val,
            5 => self.l = val,
            7 => self.a = val,
            _ => unreachable!("set_reg8 called with index {}", index),
        }
    }

    /// Get 8-bit register by index, respecting an active DD/FD prefix for
    /// H/L (undocumented IXH/IXL/IYH/IYL access).
    pub fn get_reg8_ix(&self, index: u8) -> u8 {
        match (index, self.index_mode) {
            (4, IndexMode::IX) => (self.ix >> 8) as u8,
            (5, IndexMode::IX) => self.ix as u8,
            (4, IndexMode::IY) => (self.iy >> 8) as u8,
            (5, IndexMode::IY) => self.iy as u8,
            _ => self.get_reg8(index),
        }
    }

    pub fn set_reg8_ix(&mut self, index: u8, val: u8) {
        match (index, self.index_mode) {
            (4, IndexMode::IX) => self.ix = (self.ix & 0x00FF) | ((val as u16) << 8),
            (5, IndexMode::IX) => self.ix = (self.ix & 0xFF00) | val as u16,
            (4, IndexMode::IY) => self.iy = (self.iy & 0x00FF) | ((val as u16) << 8),
            (5, IndexMode::IY) => self.iy = (self.iy & 0xFF00) | val as u16,
            _ => self.set_reg8(index, val),
        }
    }

    /// Get 16-bit register pair by index (0=BC, 1=DE, 2=HL/IX/IY, 3=SP).
    pub(crate) fn get_rp(&self, index: u8) -> u16 {
        match index {
            0 => self.get_bc(),
            1 => self.get_de(),
            2 => self.index_base(),
            3 => self.sp,
            _ => unreachable!("get_rp called with index {}", index),
        }
    }

    pub(crate) fn set_rp(&mut self, index: u8, val: u16) {
        match index {
            0 => self.set_bc(val),
            1 => self.set_de(val),
            2 => match self.index_mode {
                IndexMode::HL => self.set_hl(val),
                IndexMode::IX => self.ix = val,
                IndexMode::IY => self.iy = val,
            },
            3 => self.sp = val,
            _ => unreachable!("set_rp called with index {}", index),
        }
    }

    /// Like `get_rp`/`set_rp`, but index 3 is AF (PUSH/POP encoding).
    pub(crate) fn get_rp_af(&self, index: u8) -> u16 {
        match index {
            3 => self.get_af(),
            _ => self.get_rp(index),
        }
    }

    pub(crate) fn set_rp_af(&mut self, index: u8, val: u16) {
        match index {
            3 => self.set_af(val),
            _ => self.set_rp(index, val),
        }
    }

    /// HL, or IX/IY while a DD/FD prefix is active.
    pub(crate) fn index_base(&self) -> u16 {
        match self.index_mode {
            IndexMode::HL => self.get_hl(),
            IndexMode::IX => self.ix,
            IndexMode::IY => self.iy,
        }
    }

    /// Effective address of a (HL)/(IX+d)/(IY+d) operand. In indexed mode
    /// this fetches the displacement byte and charges `indexed_extra`
    /// additional cycles on top of the base instruction timing.
    pub(crate) fn mem_operand_addr<B: Bus>(&mut self, bus: &mut B, indexed_extra: u32) -> u16 {
        match self.index_mode {
            IndexMode::HL => self.get_hl(),
            _ => {
                let displacement = self.fetch(bus) as i8;
                self.used_cycles += indexed_extra;
                self.index_base().wrapping_add(displacement as i16 as u16)
            }
        }
    }

    /// Condition code evaluation for JP/JR/CALL/RET cc.
    pub(crate) fn condition(&self, cc: u8) -> bool {
        match cc {
            0 => !self.flag(Flag::Z),
            1 => self.flag(Flag::Z),
            2 => !self.flag(Flag::C),
            3 => self.flag(Flag::C),
            4 => !self.flag(Flag::PV),
            5 => self.flag(Flag::PV),
            6 => !self.flag(Flag::S),
            7 => self.flag(Flag::S),
            _ => unreachable!("condition called with cc {}", cc),
        }
    }

    // --- Bus access helpers ---

    pub(crate) fn fetch<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.mem_read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    pub(crate) fn fetch_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let low = self.fetch(bus) as u16;
        let high = self.fetch(bus) as u16;
        (high << 8) | low
    }

    pub(crate) fn read_word<B: Bus>(&mut self, bus: &mut B, addr: u16) -> u16 {
        let low = bus.mem_read(addr) as u16;
        let high = bus.mem_read(addr.wrapping_add(1)) as u16;
        (high << 8) | low
    }

    pub(crate) fn write_word<B: Bus>(&mut self, bus: &mut B, addr: u16, val: u16) {
        bus.mem_write(addr, val as u8);
        bus.mem_write(addr.wrapping_add(1), (val >> 8) as u8);
    }

    /// Push big-endian: high byte first, SP decrements twice.
    pub(crate) fn push_word<B: Bus>(&mut self, bus: &mut B, val: u16) {
        self.sp = self.sp.wrapping_sub(1);
        bus.mem_write(self.sp, (val >> 8) as u8);
        self.sp = self.sp.wrapping_sub(1);
        bus.mem_write(self.sp, val as u8);
    }

    pub(crate) fn pop_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let low = bus.mem_read(self.sp) as u16;
        self.sp = self.sp.wrapping_add(1);
        let high = bus.mem_read(self.sp) as u16;
        self.sp = self.sp.wrapping_add(1);
        (high << 8) | low
    }

    // --- Execution ---

    /// Run until at least `cycles` (plus any carried excess) have elapsed.
    ///
    /// The loop keeps >= 34 cycles of headroom so the longest instruction
    /// plus its interrupt response always fits within the budget overshoot.
    pub fn run_cycles<B: Bus>(&mut self, bus: &mut B, cycles: u32) -> Result<(), EmulationError> {
        let mut budget = i64::from(cycles) + i64::from(self.excess_cycles);

        while budget > 34 {
            match self.step_instruction(bus) {
                Ok(used) => budget -= i64::from(used),
                Err(error) => {
                    self.excess_cycles = budget.max(0) as u32;
                    return Err(error);
                }
            }
        }

        self.excess_cycles = budget.max(0) as u32;
        Ok(())
    }

    /// Execute exactly one instruction, service any pending interrupt, and
    /// return the cycles consumed. `run_cycles` loops over this; tests and
    /// single-step validation call it directly.
    pub fn step_instruction<B: Bus>(&mut self, bus: &mut B) -> Result<u32, EmulationError> {
        self.used_cycles = 0;
        bus.sync_cycles(self.cycle_count);

        if self.halted {
            // Halted CPU executes internal NOPs until an interrupt.
            self.used_cycles += 4;
        } else {
            self.step(bus);
        }

        // Check for interrupts
        if self.wait_after_ei {
            self.wait_after_ei = false;
        } else {
            // Non-maskable interrupt is edge-triggered.
            let nmi = bus.get_nmi();
            if nmi && !self.nmi_previous {
                if self.halted {
                    self.halted = false;
                    self.pc = self.pc.wrapping_add(1);
                }
                self.iff1 = false;
                let pc = self.pc;
                self.push_word(bus, pc);
                self.pc = 0x0066;
                self.used_cycles += 11;
            }
            self.nmi_previous = nmi;

            // Maskable interrupt is level-triggered and masked by IFF1.
            if self.iff1 && bus.get_int() {
                if self.halted {
                    self.halted = false;
                    self.pc = self.pc.wrapping_add(1);
                }
                self.iff1 = false;
                self.iff2 = false;

                match self.im {
                    1 => {
                        let pc = self.pc;
                        self.push_word(bus, pc);
                        self.pc = 0x0038;
                        self.used_cycles += 13;
                    }
                    im => {
                        // IM 0 needs the interrupting device to supply an
                        // opcode and IM 2 a vector; no supported console
                        // wires either up.
                        return Err(EmulationError::UnsupportedInterruptMode(im));
                    }
                }
            }
        }

        self.cycle_count += u64::from(self.used_cycles);
        Ok(self.used_cycles)
    }

    /// Execute a single instruction, including any prefix chain.
    fn step<B: Bus>(&mut self, bus: &mut B) {
        // Memory refresh: R increments once per instruction, bit 7 fixed.
        self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);

        let mut opcode = self.fetch(bus);

        // DD/FD prefixes substitute IX/IY for HL in the following opcode.
        // A chain of prefixes costs 4 cycles each; the last one wins.
        loop {
            match opcode {
                0xDD => {
                    self.index_mode = IndexMode::IX;
                    self.used_cycles += 4;
                    opcode = self.fetch(bus);
                }
                0xFD => {
                    self.index_mode = IndexMode::IY;
                    self.used_cycles += 4;
                    opcode = self.fetch(bus);
                }
                _ => break,
            }
        }

        self.execute(bus, opcode);
        self.index_mode = IndexMode::HL;
    }

    fn execute<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        match opcode {
            // NOP — 4T
            0x00 => self.used_cycles += 4,

            // HALT — 4T. PC steps back onto the HALT so it re-executes
            // until an interrupt advances past it.
            0x76 => {
                self.pc = self.pc.wrapping_sub(1);
                self.halted = true;
                self.used_cycles += 4;
            }

            // Prefixes
            0xCB => {
                if self.index_mode == IndexMode::HL {
                    self.op_cb(bus);
                } else {
                    self.op_index_cb(bus);
                }
            }
            0xED => {
                // ED ignores any active DD/FD prefix.
                self.index_mode = IndexMode::HL;
                let sub = self.fetch(bus);
                self.execute_ed(bus, sub);
            }

            // --- Load / store / exchange ---
            0x02 => self.op_ld_bc_a(bus),
            0x12 => self.op_ld_de_a(bus),
            0x0A => self.op_ld_a_bc(bus),
            0x1A => self.op_ld_a_de(bus),
            0x22 => self.op_ld_nn_hl(bus),
            0x2A => self.op_ld_hl_nn_ind(bus),
            0x32 => self.op_ld_nn_a(bus),
            0x3A => self.op_ld_a_nn(bus),
            0x36 => self.op_ld_hl_n(bus),
            0xF9 => self.op_ld_sp_hl(),
            0x08 => self.op_ex_af_af(),
            0xEB => self.op_ex_de_hl(),
            0xD9 => self.op_exx(),
            0xE3 => self.op_ex_sp_hl(bus),

            // --- Rotates / misc ALU on A ---
            0x07 => self.op_rlca(),
            0x0F => self.op_rrca(),
            0x17 => self.op_rla(),
            0x1F => self.op_rra(),
            0x27 => self.op_daa(),
            0x2F => self.op_cpl(),
            0x37 => self.op_scf(),
            0x3F => self.op_ccf(),

            // --- Control flow ---
            0xC3 => self.op_jp_nn(bus),
            0xE9 => self.op_jp_hl(),
            0x18 => self.op_jr(bus),
            0x10 => self.op_djnz(bus),
            0xCD => self.op_call_nn(bus),
            0xC9 => self.op_ret(bus),
            0xDB => self.op_in_a_n(bus),
            0xD3 => self.op_out_n_a(bus),
            0xF3 => self.op_di(),
            0xFB => self.op_ei(),

            // --- Pattern groups ---

            // LD rr,nn — 10T
            op if (op & 0xCF) == 0x01 => self.op_ld_rr_nn(bus, op),
            // INC rr / DEC rr — 6T
            op if (op & 0xCF) == 0x03 => self.op_inc_rr(op),
            op if (op & 0xCF) == 0x0B => self.op_dec_rr(op),
            // ADD HL,rr — 11T
            op if (op & 0xCF) == 0x09 => self.op_add_hl_rr(op),
            // INC r / DEC r — 4T (11T memory)
            op if (op & 0xC7) == 0x04 => self.op_inc_r(bus, op),
            op if (op & 0xC7) == 0x05 => self.op_dec_r(bus, op),
            // LD r,n — 7T
            op if (op & 0xC7) == 0x06 => self.op_ld_r_n(bus, op),
            // JR cc,e — 12/7T
            op if (op & 0xE7) == 0x20 => self.op_jr_cc(bus, op),
            // LD r,r' — 4T (7T memory)
            op if (op & 0xC0) == 0x40 => self.op_ld_r_r(bus, op),
            // ALU A,r — 4T (7T memory)
            op if (op & 0xC0) == 0x80 => self.op_alu_r(bus, op),
            // RET cc — 11/5T
            op if (op & 0xC7) == 0xC0 => self.op_ret_cc(bus, op),
            // POP rr — 10T / PUSH rr — 11T
            op if (op & 0xCF) == 0xC1 => self.op_pop(bus, op),
            op if (op & 0xCF) == 0xC5 => self.op_push(bus, op),
            // JP cc,nn — 10T
            op if (op & 0xC7) == 0xC2 => self.op_jp_cc_nn(bus, op),
            // CALL cc,nn — 17/10T
            op if (op & 0xC7) == 0xC4 => self.op_call_cc_nn(bus, op),
            // ALU A,n — 7T
            op if (op & 0xC7) == 0xC6 => self.op_alu_n(bus, op),
            // RST p — 11T
            op if (op & 0xC7) == 0xC7 => self.op_rst(bus, op),

            _ => unreachable!("unhandled opcode {:02x}", opcode),
        }
    }

    // --- Save-state codec ---

    /// Append the register file to a save state, big-endian.
    pub fn state_save(&self, writer: &mut StateWriter) {
        let mut out = ByteWriter::new();
        out.put_u16(self.get_af());
        out.put_u16(self.get_bc());
        out.put_u16(self.get_de());
        out.put_u16(self.get_hl());
        out.put_u16(((self.a_prime as u16) << 8) | self.f_prime as u16);
        out.put_u16(((self.b_prime as u16) << 8) | self.c_prime as u16);
        out.put_u16(((self.d_prime as u16) << 8) | self.e_prime as u16);
        out.put_u16(((self.h_prime as u16) << 8) | self.l_prime as u16);
        out.put_u16(self.ix);
        out.put_u16(self.iy);
        out.put_u16(self.sp);
        out.put_u16(self.pc);
        out.put_u8(self.i);
        out.put_u8(self.r);
        out.put_u8(self.im);
        out.put_bool(self.iff1);
        out.put_bool(self.iff2);
        out.put_bool(self.wait_after_ei);
        out.put_bool(self.halted);
        out.put_u32(self.excess_cycles);
        writer.add_section(SECTION_ID_Z80, 1, &out.into_bytes());
    }

    /// Restore the register file from a save-state section.
    pub fn state_load(&mut self, _version: u32, data: &[u8]) -> Result<(), StateError> {
        if data.len() != Z80_STATE_SIZE {
            return Err(StateError::SectionSize {
                section: SECTION_ID_Z80,
                expected: Z80_STATE_SIZE,
                actual: data.len(),
            });
        }
        let mut input = ByteReader::new(data);
        let af = input.u16()?;
        self.set_af(af);
        let bc = input.u16()?;
        self.set_bc(bc);
        let de = input.u16()?;
        self.set_de(de);
        let hl = input.u16()?;
        self.set_hl(hl);
        let af_prime = input.u16()?;
        self.a_prime = (af_prime >> 8) as u8;
        self.f_prime = af_prime as u8;
        let bc_prime = input.u16()?;
        self.b_prime = (bc_prime >> 8) as u8;
        self.c_prime = bc_prime as u8;
        let de_prime = input.u16()?;
        self.d_prime = (de_prime >> 8) as u8;
        self.e_prime = de_prime as u8;
        let hl_prime = input.u16()?;
        self.h_prime = (hl_prime >> 8) as u8;
        self.l_prime = hl_prime as u8;
        self.ix = input.u16()?;
        self.iy = input.u16()?;
        self.sp = input.u16()?;
        self.pc = input.u16()?;
        self.i = input.u8()?;
        self.r = input.u8()?;
        self.im = input.u8()?;
        self.iff1 = input.bool()?;
        self.iff2 = input.bool()?;
        self.wait_after_ei = input.bool()?;
        self.halted = input.bool()?;
        self.excess_cycles = input.u32()?;
        Ok(())
    }
}
