use crate::core::Bus;
use crate::cpu::z80::{Flag, Z80};

impl Z80 {
    /// JP nn — 10T
    pub(crate) fn op_jp_nn<B: Bus>(&mut self, bus: &mut B) {
        self.pc = self.fetch_word(bus);
        self.used_cycles += 10;
    }

    /// JP cc,nn — 10T
    pub(crate) fn op_jp_cc_nn<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        let target = self.fetch_word(bus);
        if self.condition((opcode >> 3) & 0x07) {
            self.pc = target;
        }
        self.used_cycles += 10;
    }

    /// JP (HL) — 4T (8T for IX/IY)
    pub(crate) fn op_jp_hl(&mut self) {
        self.pc = self.index_base();
        self.used_cycles += 4;
    }

    /// JR e — 12T
    pub(crate) fn op_jr<B: Bus>(&mut self, bus: &mut B) {
        let offset = self.fetch(bus) as i8;
        self.pc = self.pc.wrapping_add(offset as i16 as u16);
        self.used_cycles += 12;
    }

    /// JR cc,e — 12T taken, 7T not taken. Conditions NZ/Z/NC/C only.
    pub(crate) fn op_jr_cc<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        let offset = self.fetch(bus) as i8;
        if self.condition((opcode >> 3) & 0x03) {
            self.pc = self.pc.wrapping_add(offset as i16 as u16);
            self.used_cycles += 12;
        } else {
            self.used_cycles += 7;
        }
    }

    /// DJNZ e — 13T taken, 8T fall-through
    pub(crate) fn op_djnz<B: Bus>(&mut self, bus: &mut B) {
        let offset = self.fetch(bus) as i8;
        self.b = self.b.wrapping_sub(1);
        if self.b != 0 {
            self.pc = self.pc.wrapping_add(offset as i16 as u16);
            self.used_cycles += 13;
        } else {
            self.used_cycles += 8;
        }
    }

    /// CALL nn — 17T
    pub(crate) fn op_call_nn<B: Bus>(&mut self, bus: &mut B) {
        let target = self.fetch_word(bus);
        let pc = self.pc;
        self.push_word(bus, pc);
        self.pc = target;
        self.used_cycles += 17;
    }

    /// CALL cc,nn — 17T taken, 10T not taken
    pub(crate) fn op_call_cc_nn<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        let target = self.fetch_word(bus);
        if self.condition((opcode >> 3) & 0x07) {
            let pc = self.pc;
            self.push_word(bus, pc);
            self.pc = target;
            self.used_cycles += 17;
        } else {
            self.used_cycles += 10;
        }
    }

    /// RET — 10T
    pub(crate) fn op_ret<B: Bus>(&mut self, bus: &mut B) {
        self.pc = self.pop_word(bus);
        self.used_cycles += 10;
    }

    /// RET cc — 11T taken, 5T not taken
    pub(crate) fn op_ret_cc<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        if self.condition((opcode >> 3) & 0x07) {
            self.pc = self.pop_word(bus);
            self.used_cycles += 11;
        } else {
            self.used_cycles += 5;
        }
    }

    /// RST p — 11T. Target address is encoded in opcode bits 3-5.
    pub(crate) fn op_rst<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        let pc = self.pc;
        self.push_word(bus, pc);
        self.pc = (opcode & 0x38) as u16;
        self.used_cycles += 11;
    }

    /// IN A,(n) — 11T. No flags.
    pub(crate) fn op_in_a_n<B: Bus>(&mut self, bus: &mut B) {
        let port = self.fetch(bus);
        self.a = bus.io_read(port);
        self.used_cycles += 11;
    }

    /// OUT (n),A — 11T
    pub(crate) fn op_out_n_a<B: Bus>(&mut self, bus: &mut B) {
        let port = self.fetch(bus);
        bus.io_write(port, self.a);
        self.used_cycles += 11;
    }

    /// IN r,(C) — 12T (ED). Sets S/Z/PV from the value; H/N cleared.
    /// r = 6 is the undocumented IN (C): flags only, no register write.
    pub(crate) fn op_in_r_c<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        let operand = (opcode >> 3) & 0x07;
        let val = bus.io_read(self.c);

        let mut f = self.f & Flag::C as u8;
        if val == 0 { f |= Flag::Z as u8; }
        if (val & 0x80) != 0 { f |= Flag::S as u8; }
        if Self::parity(val) { f |= Flag::PV as u8; }
        f |= val & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;

        if operand != 6 {
            self.set_reg8(operand, val);
        }
        self.used_cycles += 12;
    }

    /// OUT (C),r — 12T (ED). r = 6 is the undocumented OUT (C),0.
    pub(crate) fn op_out_c_r<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        let operand = (opcode >> 3) & 0x07;
        let val = if operand == 6 { 0 } else { self.get_reg8(operand) };
        bus.io_write(self.c, val);
        self.used_cycles += 12;
    }

    /// DI — 4T
    pub(crate) fn op_di(&mut self) {
        self.iff1 = false;
        self.iff2 = false;
        self.used_cycles += 4;
    }

    /// EI — 4T. Interrupt acceptance is deferred by one instruction so an
    /// EI / RETI pair cannot be split by a pending interrupt.
    pub(crate) fn op_ei(&mut self) {
        self.iff1 = true;
        self.iff2 = true;
        self.wait_after_ei = true;
        self.used_cycles += 4;
    }
}
