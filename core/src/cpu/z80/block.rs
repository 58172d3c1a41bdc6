use crate::core::Bus;
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    /// ED-prefixed group: block transfer/compare/IO, 16-bit ADC/SBC,
    /// interrupt-mode selects, I/R transfers, RRD/RLD, RETI/RETN.
    /// Undocumented aliases (NEG at 0x4C.., RETN at 0x55.., IM at 0x4E..)
    /// behave exactly like the documented encodings.
    pub(crate) fn execute_ed<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        match opcode {
            0x47 => self.op_ld_i_a(),
            0x4F => self.op_ld_r_a(),
            0x57 => self.op_ld_a_i(),
            0x5F => self.op_ld_a_r(),
            0x67 => self.op_rrd(bus),
            0x6F => self.op_rld(bus),

            0xA0 | 0xA8 => self.op_ldi_ldd(bus, opcode, false),
            0xB0 | 0xB8 => self.op_ldi_ldd(bus, opcode, true),
            0xA1 | 0xA9 => self.op_cpi_cpd(bus, opcode, false),
            0xB1 | 0xB9 => self.op_cpi_cpd(bus, opcode, true),
            0xA2 | 0xAA => self.op_ini_ind(bus, opcode, false),
            0xB2 | 0xBA => self.op_ini_ind(bus, opcode, true),
            0xA3 | 0xAB => self.op_outi_outd(bus, opcode, false),
            0xB3 | 0xBB => self.op_outi_outd(bus, opcode, true),

            op if (op & 0xC7) == 0x40 => self.op_in_r_c(bus, op),
            op if (op & 0xC7) == 0x41 => self.op_out_c_r(bus, op),
            op if (op & 0xCF) == 0x42 => self.op_sbc_hl_rr(op),
            op if (op & 0xCF) == 0x43 => self.op_ld_nn_rr(bus, op),
            op if (op & 0xC7) == 0x44 => self.op_neg(),
            op if (op & 0xC7) == 0x45 => self.op_retn(bus),
            op if (op & 0xC7) == 0x46 => self.op_im(op),
            op if (op & 0xCF) == 0x4A => self.op_adc_hl_rr(op),
            op if (op & 0xCF) == 0x4B => self.op_ld_rr_nn_ind(bus, op),

            // Undefined ED opcodes act as two-byte NOPs.
            _ => self.used_cycles += 8,
        }
    }

    /// LD I,A — 9T
    fn op_ld_i_a(&mut self) {
        self.i = self.a;
        self.used_cycles += 9;
    }

    /// LD R,A — 9T
    fn op_ld_r_a(&mut self) {
        self.r = self.a;
        self.used_cycles += 9;
    }

    /// LD A,I — 9T. PV takes IFF2 so software can recover interrupt state.
    fn op_ld_a_i(&mut self) {
        self.a = self.i;
        self.ir_transfer_flags();
        self.used_cycles += 9;
    }

    /// LD A,R — 9T. PV takes IFF2.
    fn op_ld_a_r(&mut self) {
        self.a = self.r;
        self.ir_transfer_flags();
        self.used_cycles += 9;
    }

    fn ir_transfer_flags(&mut self) {
        let mut f = self.f & Flag::C as u8;
        if self.a == 0 { f |= Flag::Z as u8; }
        if (self.a & 0x80) != 0 { f |= Flag::S as u8; }
        if self.iff2 { f |= Flag::PV as u8; }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    /// RRD — 18T. Rotate the low nibbles of A and (HL) right.
    fn op_rrd<B: Bus>(&mut self, bus: &mut B) {
        let addr = self.get_hl();
        let val = bus.mem_read(addr);
        bus.mem_write(addr, (self.a << 4) | (val >> 4));
        self.a = (self.a & 0xF0) | (val & 0x0F);
        self.rld_rrd_flags();
        self.used_cycles += 18;
    }

    /// RLD — 18T. Rotate the low nibbles of A and (HL) left.
    fn op_rld<B: Bus>(&mut self, bus: &mut B) {
        let addr = self.get_hl();
        let val = bus.mem_read(addr);
        bus.mem_write(addr, (val << 4) | (self.a & 0x0F));
        self.a = (self.a & 0xF0) | (val >> 4);
        self.rld_rrd_flags();
        self.used_cycles += 18;
    }

    fn rld_rrd_flags(&mut self) {
        let mut f = self.f & Flag::C as u8;
        if self.a == 0 { f |= Flag::Z as u8; }
        if (self.a & 0x80) != 0 { f |= Flag::S as u8; }
        if Self::parity(self.a) { f |= Flag::PV as u8; }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    /// RETN / RETI (and their undocumented aliases) — 14T.
    /// IFF1 is restored from IFF2, un-nesting a non-maskable interrupt.
    fn op_retn<B: Bus>(&mut self, bus: &mut B) {
        self.pc = self.pop_word(bus);
        self.iff1 = self.iff2;
        self.used_cycles += 14;
    }

    /// IM 0/1/2 — 8T. Bits 3-4 select the mode; the 0x4E/0x6E encodings
    /// fall back to IM 0.
    fn op_im(&mut self, opcode: u8) {
        self.im = match (opcode >> 3) & 0x03 {
            0 | 1 => 0,
            2 => 1,
            3 => 2,
            _ => unreachable!(),
        };
        self.used_cycles += 8;
    }

    /// LD (nn),rr — 20T (ED)
    fn op_ld_nn_rr<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        let rp = (opcode >> 4) & 0x03;
        let addr = self.fetch_word(bus);
        let val = self.get_rp(rp);
        self.write_word(bus, addr, val);
        self.used_cycles += 20;
    }

    /// LD rr,(nn) — 20T (ED)
    fn op_ld_rr_nn_ind<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        let rp = (opcode >> 4) & 0x03;
        let addr = self.fetch_word(bus);
        let val = self.read_word(bus, addr);
        self.set_rp(rp, val);
        self.used_cycles += 20;
    }

    /// LDI / LDD / LDIR / LDDR — 16T, 21T per repeat iteration.
    /// Repeats re-execute by stepping PC back over the ED pair, so
    /// interrupts are serviced between iterations.
    fn op_ldi_ldd<B: Bus>(&mut self, bus: &mut B, opcode: u8, repeat: bool) {
        let decrement = opcode & 0x08 != 0;
        let val = bus.mem_read(self.get_hl());
        bus.mem_write(self.get_de(), val);

        if decrement {
            self.set_hl(self.get_hl().wrapping_sub(1));
            self.set_de(self.get_de().wrapping_sub(1));
        } else {
            self.set_hl(self.get_hl().wrapping_add(1));
            self.set_de(self.get_de().wrapping_add(1));
        }
        let bc = self.get_bc().wrapping_sub(1);
        self.set_bc(bc);

        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::C as u8);
        if bc != 0 { f |= Flag::PV as u8; }
        // Undocumented: X/Y come from A + the copied byte
        let undoc = self.a.wrapping_add(val);
        if undoc & 0x08 != 0 { f |= Flag::X as u8; }
        if undoc & 0x02 != 0 { f |= Flag::Y as u8; }
        self.f = f;

        if repeat && bc != 0 {
            self.pc = self.pc.wrapping_sub(2);
            self.used_cycles += 21;
        } else {
            self.used_cycles += 16;
        }
    }

    /// CPI / CPD / CPIR / CPDR — 16T, 21T per repeat iteration.
    fn op_cpi_cpd<B: Bus>(&mut self, bus: &mut B, opcode: u8, repeat: bool) {
        let decrement = opcode & 0x08 != 0;
        let val = bus.mem_read(self.get_hl());

        if decrement {
            self.set_hl(self.get_hl().wrapping_sub(1));
        } else {
            self.set_hl(self.get_hl().wrapping_add(1));
        }
        let bc = self.get_bc().wrapping_sub(1);
        self.set_bc(bc);

        let result = self.a.wrapping_sub(val);
        let mut f = (self.f & Flag::C as u8) | Flag::N as u8;
        if result == 0 { f |= Flag::Z as u8; }
        if (result & 0x80) != 0 { f |= Flag::S as u8; }
        if (self.a & 0xF) < (val & 0xF) { f |= Flag::H as u8; }
        if bc != 0 { f |= Flag::PV as u8; }
        // Undocumented: X/Y from the comparison result minus half-carry
        let undoc = result.wrapping_sub(((f & Flag::H as u8) != 0) as u8);
        if undoc & 0x08 != 0 { f |= Flag::X as u8; }
        if undoc & 0x02 != 0 { f |= Flag::Y as u8; }
        self.f = f;

        if repeat && bc != 0 && result != 0 {
            self.pc = self.pc.wrapping_sub(2);
            self.used_cycles += 21;
        } else {
            self.used_cycles += 16;
        }
    }

    /// INI / IND / INIR / INDR — 16T, 21T per repeat iteration.
    fn op_ini_ind<B: Bus>(&mut self, bus: &mut B, opcode: u8, repeat: bool) {
        let decrement = opcode & 0x08 != 0;
        let val = bus.io_read(self.c);
        bus.mem_write(self.get_hl(), val);

        if decrement {
            self.set_hl(self.get_hl().wrapping_sub(1));
        } else {
            self.set_hl(self.get_hl().wrapping_add(1));
        }
        self.b = self.b.wrapping_sub(1);
        self.block_io_flags();

        if repeat && self.b != 0 {
            self.pc = self.pc.wrapping_sub(2);
            self.used_cycles += 21;
        } else {
            self.used_cycles += 16;
        }
    }

    /// OUTI / OUTD / OTIR / OTDR — 16T, 21T per repeat iteration.
    fn op_outi_outd<B: Bus>(&mut self, bus: &mut B, opcode: u8, repeat: bool) {
        let decrement = opcode & 0x08 != 0;
        let val = bus.mem_read(self.get_hl());
        self.b = self.b.wrapping_sub(1);
        bus.io_write(self.c, val);

        if decrement {
            self.set_hl(self.get_hl().wrapping_sub(1));
        } else {
            self.set_hl(self.get_hl().wrapping_add(1));
        }
        self.block_io_flags();

        if repeat && self.b != 0 {
            self.pc = self.pc.wrapping_sub(2);
            self.used_cycles += 21;
        } else {
            self.used_cycles += 16;
        }
    }

    /// Block I/O sets Z from the decremented B and N; the remaining flag
    /// behaviour of real silicon is not modelled.
    fn block_io_flags(&mut self) {
        let mut f = (self.f & Flag::C as u8) | Flag::N as u8;
        if self.b == 0 { f |= Flag::Z as u8; }
        if (self.b & 0x80) != 0 { f |= Flag::S as u8; }
        f |= self.b & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }
}
