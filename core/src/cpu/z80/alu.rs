use crate::core::Bus;
use crate::cpu::z80::{Flag, IndexMode, Z80};

impl Z80 {
    // --- Flag helpers ---

    pub(crate) fn parity(val: u8) -> bool {
        val.count_ones() % 2 == 0
    }

    pub(crate) fn update_flags_logic(&mut self, result: u8, is_and: bool) {
        let mut f = 0;
        if result == 0 { f |= Flag::Z as u8; }
        if (result & 0x80) != 0 { f |= Flag::S as u8; }
        if Self::parity(result) { f |= Flag::PV as u8; }
        if is_and { f |= Flag::H as u8; } // AND sets H, OR/XOR clear it
        // N is 0, C is 0
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    fn do_add(&mut self, val: u8, with_carry: bool) {
        let a = self.a;
        let carry_in = (with_carry && self.flag(Flag::C)) as u8;
        let result_wide = (a as u16) + (val as u16) + (carry_in as u16);
        let result = result_wide as u8;

        let mut f = 0;
        if result == 0 { f |= Flag::Z as u8; }
        if (result & 0x80) != 0 { f |= Flag::S as u8; }
        if ((a & 0xF) + (val & 0xF) + carry_in) > 0xF { f |= Flag::H as u8; }
        // Overflow: operands agree in sign, result disagrees
        if ((a ^ result) & (val ^ result) & 0x80) != 0 { f |= Flag::PV as u8; }
        if result_wide > 0xFF { f |= Flag::C as u8; }

        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.a = result;
        self.f = f;
    }

    fn do_sub(&mut self, val: u8, with_carry: bool) {
        let a = self.a;
        let carry_in = (with_carry && self.flag(Flag::C)) as u8;
        let result_wide = (a as u16)
            .wrapping_sub(val as u16)
            .wrapping_sub(carry_in as u16);
        let result = result_wide as u8;

        let mut f = Flag::N as u8;
        if result == 0 { f |= Flag::Z as u8; }
        if (result & 0x80) != 0 { f |= Flag::S as u8; }
        if (a & 0xF) < (val & 0xF) + carry_in { f |= Flag::H as u8; }
        if ((a ^ val) & (a ^ result) & 0x80) != 0 { f |= Flag::PV as u8; }
        if result_wide > 0xFF { f |= Flag::C as u8; }

        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.a = result;
        self.f = f;
    }

    pub(crate) fn do_cp(&mut self, val: u8) {
        let a = self.a;
        let result_wide = (a as u16).wrapping_sub(val as u16);
        let result = result_wide as u8;

        let mut f = Flag::N as u8;
        if result == 0 { f |= Flag::Z as u8; }
        if (result & 0x80) != 0 { f |= Flag::S as u8; }
        if (a & 0xF) < (val & 0xF) { f |= Flag::H as u8; }
        if ((a ^ val) & (a ^ result) & 0x80) != 0 { f |= Flag::PV as u8; }
        if result_wide > 0xFF { f |= Flag::C as u8; }

        // X/Y come from the operand for CP, not the result
        f |= val & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
    }

    pub(crate) fn perform_alu_op(&mut self, alu_op: u8, val: u8) {
        match alu_op {
            0 => self.do_add(val, false), // ADD
            1 => self.do_add(val, true),  // ADC
            2 => self.do_sub(val, false), // SUB
            3 => self.do_sub(val, true),  // SBC
            4 => { self.a &= val; self.update_flags_logic(self.a, true); }  // AND
            5 => { self.a ^= val; self.update_flags_logic(self.a, false); } // XOR
            6 => { self.a |= val; self.update_flags_logic(self.a, false); } // OR
            7 => self.do_cp(val),         // CP
            _ => unreachable!(),
        }
    }

    fn calc_inc_flags(&mut self, val: u8) -> u8 {
        let result = val.wrapping_add(1);
        let mut f = self.f & Flag::C as u8; // C untouched
        if result == 0 { f |= Flag::Z as u8; }
        if (result & 0x80) != 0 { f |= Flag::S as u8; }
        if (val & 0xF) == 0xF { f |= Flag::H as u8; }
        if val == 0x7F { f |= Flag::PV as u8; } // overflow 7F -> 80
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        result
    }

    fn calc_dec_flags(&mut self, val: u8) -> u8 {
        let result = val.wrapping_sub(1);
        let mut f = (self.f & Flag::C as u8) | Flag::N as u8;
        if result == 0 { f |= Flag::Z as u8; }
        if (result & 0x80) != 0 { f |= Flag::S as u8; }
        if (val & 0xF) == 0x0 { f |= Flag::H as u8; } // borrow from bit 4
        if val == 0x80 { f |= Flag::PV as u8; } // overflow 80 -> 7F
        f |= result & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        result
    }

    // --- Instructions ---

    /// ALU A,r — 4T register, 7T (HL), 19T (IX+d)
    pub(crate) fn op_alu_r<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        let alu_op = (opcode >> 3) & 0x07;
        let operand = opcode & 0x07;

        if operand == 6 {
            let addr = self.mem_operand_addr(bus, 8);
            let val = bus.mem_read(addr);
            self.perform_alu_op(alu_op, val);
            self.used_cycles += 7;
        } else {
            let val = self.get_reg8_ix(operand);
            self.perform_alu_op(alu_op, val);
            self.used_cycles += 4;
        }
    }

    /// ALU A,n — 7T
    pub(crate) fn op_alu_n<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        let alu_op = (opcode >> 3) & 0x07;
        let val = self.fetch(bus);
        self.perform_alu_op(alu_op, val);
        self.used_cycles += 7;
    }

    /// INC r — 4T register, 11T (HL), 23T (IX+d)
    pub(crate) fn op_inc_r<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        let operand = (opcode >> 3) & 0x07;
        if operand == 6 {
            let addr = self.mem_operand_addr(bus, 8);
            let val = bus.mem_read(addr);
            let result = self.calc_inc_flags(val);
            bus.mem_write(addr, result);
            self.used_cycles += 11;
        } else {
            let val = self.get_reg8_ix(operand);
            let result = self.calc_inc_flags(val);
            self.set_reg8_ix(operand, result);
            self.used_cycles += 4;
        }
    }

    /// DEC r — 4T register, 11T (HL), 23T (IX+d)
    pub(crate) fn op_dec_r<B: Bus>(&mut self, bus: &mut B, opcode: u8) {
        let operand = (opcode >> 3) & 0x07;
        if operand == 6 {
            let addr = self.mem_operand_addr(bus, 8);
            let val = bus.mem_read(addr);
            let result = self.calc_dec_flags(val);
            bus.mem_write(addr, result);
            self.used_cycles += 11;
        } else {
            let val = self.get_reg8_ix(operand);
            let result = self.calc_dec_flags(val);
            self.set_reg8_ix(operand, result);
            self.used_cycles += 4;
        }
    }

    /// INC rr — 6T. No flags.
    pub(crate) fn op_inc_rr(&mut self, opcode: u8) {
        let rp = (opcode >> 4) & 0x03;
        let val = self.get_rp(rp).wrapping_add(1);
        self.set_rp(rp, val);
        self.used_cycles += 6;
    }

    /// DEC rr — 6T. No flags.
    pub(crate) fn op_dec_rr(&mut self, opcode: u8) {
        let rp = (opcode >> 4) & 0x03;
        let val = self.get_rp(rp).wrapping_sub(1);
        self.set_rp(rp, val);
        self.used_cycles += 6;
    }

    /// ADD HL,rr (IX/IY under prefix) — 11T.
    /// H from bit-11 carry, C from bit-15 carry; S/Z/PV untouched.
    pub(crate) fn op_add_hl_rr(&mut self, opcode: u8) {
        let rp = (opcode >> 4) & 0x03;
        let lhs = self.index_base();
        let rhs = self.get_rp(rp);
        let result = lhs.wrapping_add(rhs);

        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if ((lhs & 0x0FFF) + (rhs & 0x0FFF)) > 0x0FFF { f |= Flag::H as u8; }
        if (lhs as u32) + (rhs as u32) > 0xFFFF { f |= Flag::C as u8; }
        f |= ((result >> 8) as u8) & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;

        match self.index_mode {
            IndexMode::HL => self.set_hl(result),
            IndexMode::IX => self.ix = result,
            IndexMode::IY => self.iy = result,
        }
        self.used_cycles += 11;
    }

    /// ADC HL,rr — 15T (ED). All flags computed at word width.
    pub(crate) fn op_adc_hl_rr(&mut self, opcode: u8) {
        let rp = (opcode >> 4) & 0x03;
        let lhs = self.get_hl();
        let rhs = self.get_rp(rp);
        let carry_in = self.flag(Flag::C) as u16;
        let result_wide = (lhs as u32) + (rhs as u32) + (carry_in as u32);
        let result = result_wide as u16;

        let mut f = 0;
        if result == 0 { f |= Flag::Z as u8; }
        if (result & 0x8000) != 0 { f |= Flag::S as u8; }
        if ((lhs & 0x0FFF) + (rhs & 0x0FFF) + carry_in) > 0x0FFF { f |= Flag::H as u8; }
        if ((lhs ^ result) & (rhs ^ result) & 0x8000) != 0 { f |= Flag::PV as u8; }
        if result_wide > 0xFFFF { f |= Flag::C as u8; }
        f |= ((result >> 8) as u8) & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;

        self.set_hl(result);
        self.used_cycles += 15;
    }

    /// SBC HL,rr — 15T (ED). All flags computed at word width.
    pub(crate) fn op_sbc_hl_rr(&mut self, opcode: u8) {
        let rp = (opcode >> 4) & 0x03;
        let lhs = self.get_hl();
        let rhs = self.get_rp(rp);
        let carry_in = self.flag(Flag::C) as u16;
        let result_wide = (lhs as u32)
            .wrapping_sub(rhs as u32)
            .wrapping_sub(carry_in as u32);
        let result = result_wide as u16;

        let mut f = Flag::N as u8;
        if result == 0 { f |= Flag::Z as u8; }
        if (result & 0x8000) != 0 { f |= Flag::S as u8; }
        if (lhs & 0x0FFF) < (rhs & 0x0FFF) + carry_in { f |= Flag::H as u8; }
        if ((lhs ^ rhs) & (lhs ^ result) & 0x8000) != 0 { f |= Flag::PV as u8; }
        if result_wide > 0xFFFF { f |= Flag::C as u8; }
        f |= ((result >> 8) as u8) & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;

        self.set_hl(result);
        self.used_cycles += 15;
    }

    /// NEG — 8T (ED). A = 0 - A.
    pub(crate) fn op_neg(&mut self) {
        let val = self.a;
        self.a = 0;
        self.do_sub(val, false);
        self.used_cycles += 8;
    }

    /// DAA — 4T. Decimal-adjust A after BCD arithmetic.
    pub(crate) fn op_daa(&mut self) {
        let a = self.a;
        let high = a & 0xF0;
        let low = a & 0x0F;

        // Correction byte from the {C, H} x {nibble range} grid
        let diff: u8 = match (self.flag(Flag::C), self.flag(Flag::H)) {
            (false, false) => {
                if high < 0xA0 && low < 0x0A { 0x00 }
                else if high < 0x90 && low > 0x09 { 0x06 }
                else if high > 0x90 && low < 0x0A { 0x60 }
                else { 0x66 }
            }
            (false, true) => {
                if low < 0x0A {
                    if high < 0xA0 { 0x06 } else { 0x66 }
                } else if high < 0x90 { 0x06 } else { 0x66 }
            }
            (true, false) => {
                if low < 0x0A { 0x60 } else { 0x66 }
            }
            (true, true) => 0x66,
        };

        let carry_out = (high > 0x80 && low > 0x09)
            || (high > 0x90 && low < 0x0A)
            || self.flag(Flag::C);

        let half_out = (!self.flag(Flag::N) && low > 0x09)
            || (self.flag(Flag::N) && self.flag(Flag::H) && low < 0x06);

        let result = if self.flag(Flag::N) {
            a.wrapping_sub(diff)
        } else {
            a.wrapping_add(diff)
        };

        let mut f = self.f & Flag::N as u8;
        if carry_out { f |= Flag::C as u8; }
        if half_out { f |= Flag::H as u8; }
        if Self::parity(result) { f |= Flag::PV as u8; }
        if result == 0 { f |= Flag::Z as u8; }
        if (result & 0x80) != 0 { f |= Flag::S as u8; }
        f |= result & (Flag::X as u8 | Flag::Y as u8);

        self.a = result;
        self.f = f;
        self.used_cycles += 4;
    }

    /// CPL — 4T. A inverted; sets H and N only.
    pub(crate) fn op_cpl(&mut self) {
        self.a = !self.a;
        let mut f = self.f & !(Flag::X as u8 | Flag::Y as u8);
        f |= Flag::H as u8 | Flag::N as u8;
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.used_cycles += 4;
    }

    /// SCF — 4T. C set, H and N cleared; S/Z/PV untouched.
    pub(crate) fn op_scf(&mut self) {
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        f |= Flag::C as u8;
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.used_cycles += 4;
    }

    /// CCF — 4T. H takes the old carry, C inverts, N cleared.
    pub(crate) fn op_ccf(&mut self) {
        let old_carry = self.flag(Flag::C);
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if old_carry {
            f |= Flag::H as u8;
        } else {
            f |= Flag::C as u8;
        }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.used_cycles += 4;
    }

    /// RLCA — 4T. C from bit 7; H/N cleared; S/Z/PV untouched.
    pub(crate) fn op_rlca(&mut self) {
        self.a = self.a.rotate_left(1);
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if (self.a & 0x01) != 0 { f |= Flag::C as u8; }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.used_cycles += 4;
    }

    /// RRCA — 4T. C from bit 0; H/N cleared; S/Z/PV untouched.
    pub(crate) fn op_rrca(&mut self) {
        let carry = self.a & 0x01;
        self.a = self.a.rotate_right(1);
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if carry != 0 { f |= Flag::C as u8; }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.used_cycles += 4;
    }

    /// RLA — 4T. Rotate A left through carry.
    pub(crate) fn op_rla(&mut self) {
        let carry_out = self.a >> 7;
        self.a = (self.a << 1) | self.flag(Flag::C) as u8;
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if carry_out != 0 { f |= Flag::C as u8; }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.used_cycles += 4;
    }

    /// RRA — 4T. Rotate A right through carry.
    pub(crate) fn op_rra(&mut self) {
        let carry_out = self.a & 0x01;
        self.a = (self.a >> 1) | ((self.flag(Flag::C) as u8) << 7);
        let mut f = self.f & (Flag::S as u8 | Flag::Z as u8 | Flag::PV as u8);
        if carry_out != 0 { f |= Flag::C as u8; }
        f |= self.a & (Flag::X as u8 | Flag::Y as u8);
        self.f = f;
        self.used_cycles += 4;
    }
}
