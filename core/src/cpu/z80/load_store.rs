use crate::core::Bus;
use crate::cpu::z80::{IndexMode, Z80};

impl Z80 {
    /// LD rr,nn — 10T (14T for IX/IY)
    pub(crate) fn op_ld_rr_nn<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        let rp = (opcode >> 4) & 0x03;
        let val = self.fetch_word(bus);
        self.set_rp(rp, val);
        self.used_cycles += 10;
    }

    /// LD r,n — 7T. Under a DD/FD prefix the H/L destinations name
    /// IXH/IXL/IYH/IYL.
    pub(crate) fn op_ld_r_n<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        let operand = (opcode >> 3) & 0x07;
        debug_assert_ne!(operand, 6, "LD (HL),n has its own handler");
        let val = self.fetch(bus);
        self.set_reg8_ix(operand, val);
        self.used_cycles += 7;
    }

    /// LD (HL),n — 10T; LD (IX+d),n — 19T. Displacement precedes the
    /// immediate byte in the instruction stream.
    pub(crate) fn op_ld_hl_n<B: Bus>(&mut self, bus: &mut B) {
        let addr = self.mem_operand_addr(bus, 5);
        let val = self.fetch(bus);
        bus.mem_write(addr, val);
        self.used_cycles += 10;
    }

    /// LD r,r' — 4T register to register, 7T through memory.
    /// When an index prefix is active, H/L name IXH/IXL except in the
    /// memory forms, where the untouched H/L are used.
    pub(crate) fn op_ld_r_r<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        let dst = (opcode >> 3) & 0x07;
        let src = opcode & 0x07;

        if src == 6 {
            // LD r,(HL) / LD r,(IX+d)
            let addr = self.mem_operand_addr(bus, 8);
            let val = bus.mem_read(addr);
            self.set_reg8(dst, val);
            self.used_cycles += 7;
        } else if dst == 6 {
            // LD (HL),r / LD (IX+d),r
            let addr = self.mem_operand_addr(bus, 8);
            let val = self.get_reg8(src);
            bus.mem_write(addr, val);
            self.used_cycles += 7;
        } else {
            let val = self.get_reg8_ix(src);
            self.set_reg8_ix(dst, val);
            self.used_cycles += 4;
        }
    }

    /// LD (BC),A — 7T
    pub(crate) fn op_ld_bc_a<B: Bus>(&mut self, bus: &mut B) {
        bus.mem_write(self.get_bc(), self.a);
        self.used_cycles += 7;
    }

    /// LD (DE),A — 7T
    pub(crate) fn op_ld_de_a<B: Bus>(&mut self, bus: &mut B) {
        bus.mem_write(self.get_de(), self.a);
        self.used_cycles += 7;
    }

    /// LD A,(BC) — 7T
    pub(crate) fn op_ld_a_bc<B: Bus>(&mut self, bus: &mut B) {
        self.a = bus.mem_read(self.get_bc());
        self.used_cycles += 7;
    }

    /// LD A,(DE) — 7T
    pub(crate) fn op_ld_a_de<B: Bus>(&mut self, bus: &mut B) {
        self.a = bus.mem_read(self.get_de());
        self.used_cycles += 7;
    }

    /// LD (nn),HL — 16T (20T indexed)
    pub(crate) fn op_ld_nn_hl<B: Bus>(&mut self, bus: &mut B) {
        let addr = self.fetch_word(bus);
        let val = self.index_base();
        self.write_word(bus, addr, val);
        self.used_cycles += 16;
    }

    /// LD HL,(nn) — 16T (20T indexed)
    pub(crate) fn op_ld_hl_nn_ind<B: Bus>(&mut self, bus: &mut B) {
        let addr = self.fetch_word(bus);
        let val = self.read_word(bus, addr);
        match self.index_mode {
            IndexMode::HL => self.set_hl(val),
            IndexMode::IX => self.ix = val,
            IndexMode::IY => self.iy = val,
        }
        self.used_cycles += 16;
    }

    /// LD (nn),A — 13T
    pub(crate) fn op_ld_nn_a<B: Bus>(&mut self, bus: &mut B) {
        let addr = self.fetch_word(bus);
        bus.mem_write(addr, self.a);
        self.used_cycles += 13;
    }

    /// LD A,(nn) — 13T
    pub(crate) fn op_ld_a_nn<B: Bus>(&mut self, bus: &mut B) {
        let addr = self.fetch_word(bus);
        self.a = bus.mem_read(addr);
        self.used_cycles += 13;
    }

    /// LD SP,HL — 6T (10T for IX/IY)
    pub(crate) fn op_ld_sp_hl(&mut self) {
        self.sp = self.index_base();
        self.used_cycles += 6;
    }

    /// EX AF,AF' — 4T
    pub(crate) fn op_ex_af_af(&mut self) {
        std::mem::swap(&mut self.a, &mut self.a_prime);
        std::mem::swap(&mut self.f, &mut self.f_prime);
        self.used_cycles += 4;
    }

    /// EX DE,HL — 4T. Always the real HL, even under a prefix.
    pub(crate) fn op_ex_de_hl(&mut self) {
        std::mem::swap(&mut self.d, &mut self.h);
        std::mem::swap(&mut self.e, &mut self.l);
        self.used_cycles += 4;
    }

    /// EXX — 4T
    pub(crate) fn op_exx(&mut self) {
        std::mem::swap(&mut self.b, &mut self.b_prime);
        std::mem::swap(&mut self.c, &mut self.c_prime);
        std::mem::swap(&mut self.d, &mut self.d_prime);
        std::mem::swap(&mut self.e, &mut self.e_prime);
        std::mem::swap(&mut self.h, &mut self.h_prime);
        std::mem::swap(&mut self.l, &mut self.l_prime);
        self.used_cycles += 4;
    }

    /// EX (SP),HL — 19T (23T for IX/IY)
    pub(crate) fn op_ex_sp_hl<B: Bus>(&mut self, bus: &mut B) {
        let sp = self.sp;
        let from_stack = self.read_word(bus, sp);
        let from_reg = self.index_base();
        self.write_word(bus, sp, from_reg);
        match self.index_mode {
            IndexMode::HL => self.set_hl(from_stack),
            IndexMode::IX => self.ix = from_stack,
            IndexMode::IY => self.iy = from_stack,
        }
        self.used_cycles += 19;
    }
}
