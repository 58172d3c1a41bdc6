use crate::core::Bus;
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    /// Shared rotate/shift core for the CB group. Opcode bits 3-5 select
    /// the variant; SLL (0x30 row) is the undocumented shift that feeds a
    /// one into bit 0.
    fn cb_rotate_shift(&mut self, variant: u8, val: u8) -> u8 {
        let carry_in = self.flag(Flag::C) as u8;
        let (result, carry_out) = match variant {
            0 => (val.rotate_left(1), val >> 7),          // RLC
            1 => (val.rotate_right(1), val & 0x01),       // RRC
            2 => ((val << 1) | carry_in, val >> 7),       // RL
            3 => ((val >> 1) | (carry_in << 7), val & 1), // RR
            4 => (val << 1, val >> 7),                    // SLA
            5 => ((val >> 1) | (val & 0x80), val & 1),    // SRA
            6 => ((val << 1) | 0x01, val >> 7),           // SLL
            7 => (val >> 1, val & 1),                     // SRL
            _ => unreachable!(),
        };

        let mut f = 0;
        if carry_out != 0 { f |= Flag::C as u8; }
        if result == 0 { f |= Flag::Z as u8; }
        if (result & 0x80) != 0 { f |= Flag::S as u8; }
        if Self::parity(result) { f |= Flag::PV as u8; }
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        result
    }

    /// BIT b — only flags. Z and PV are the complement of the tested bit,
    /// S is set only for BIT 7 of a set bit, H is always set.
    fn cb_bit(&mut self, bit: u8, val: u8) {
        let set = val & (1 << bit) != 0;
        let mut f = (self.f & Flag::C as u8) | Flag::H as u8;
        if !set {
            f |= Flag::Z as u8 | Flag::PV as u8;
        }
        if bit == 7 && set {
            f |= Flag::S as u8;
        }
        f |= val & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    /// CB prefix: rotate/shift, BIT, RES, SET on a register or (HL).
    /// Register forms: 8T. (HL) forms: 15T, BIT (HL): 12T.
    pub(crate) fn op_cb<B: Bus>(&mut self, bus: &mut B) {
        let sub = self.fetch(bus);
        let operand = sub & 0x07;
        let group = sub >> 6;
        let selector = (sub >> 3) & 0x07; // shift variant or bit index

        if operand == 6 {
            let addr = self.get_hl();
            let val = bus.mem_read(addr);
            match group {
                0 => {
                    let result = self.cb_rotate_shift(selector, val);
                    bus.mem_write(addr, result);
                    self.used_cycles += 15;
                }
                1 => {
                    self.cb_bit(selector, val);
                    self.used_cycles += 12;
                }
                2 => {
                    bus.mem_write(addr, val & !(1 << selector));
                    self.used_cycles += 15;
                }
                3 => {
                    bus.mem_write(addr, val | (1 << selector));
                    self.used_cycles += 15;
                }
                _ => unreachable!(),
            }
        } else {
            let val = self.get_reg8(operand);
            match group {
                0 => {
                    let result = self.cb_rotate_shift(selector, val);
                    self.set_reg8(operand, result);
                }
                1 => self.cb_bit(selector, val),
                2 => self.set_reg8(operand, val & !(1 << selector)),
                3 => self.set_reg8(operand, val | (1 << selector)),
                _ => unreachable!(),
            }
            self.used_cycles += 8;
        }
    }

    /// DDCB / FDCB: indexed bit instructions. The displacement byte comes
    /// before the sub-opcode. BIT is read-only; every other operation
    /// writes back to memory and, unless the operand field is 6, also
    /// copies the result into the encoded register. 23T (BIT: 20T); the
    /// DD/FD prefix cost is already accounted.
    pub(crate) fn op_index_cb<B: Bus>(&mut self, bus: &mut B) {
        let displacement = self.fetch(bus) as i8;
        let sub = self.fetch(bus);
        let addr = self.index_base().wrapping_add(displacement as i16 as u16);

        let operand = sub & 0x07;
        let group = sub >> 6;
        let selector = (sub >> 3) & 0x07;

        let val = bus.mem_read(addr);
        let result = match group {
            0 => self.cb_rotate_shift(selector, val),
            1 => {
                self.cb_bit(selector, val);
                self.used_cycles += 16;
                return;
            }
            2 => val & !(1 << selector),
            3 => val | (1 << selector),
            _ => unreachable!(),
        };

        bus.mem_write(addr, result);
        if operand != 6 {
            self.set_reg8(operand, result);
        }
        self.used_cycles += 19;
    }
}
