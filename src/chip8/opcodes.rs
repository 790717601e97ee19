use crate::{
    definitions::{display, memory},
    devices::{AudioCommands, DisplayCommands},
    opcode::{AluOpcode, Instruction, KeyOpcode, MiscOpcode, Operation, ProgramCounterStep},
    MemoryError, ProcessError,
};

use super::ChipSet;

impl<D, A> ChipSet<D, A>
where
    D: DisplayCommands,
    A: AudioCommands,
{
    /// Runs a single decoded instruction, the program counter already points
    /// at the following instruction.
    pub(super) fn execute(&mut self, instruction: Instruction) -> Result<Operation, ProcessError> {
        let mut operation = Operation::None;

        let step = match instruction {
            Instruction::Clear => {
                self.display.clear();
                self.display.render();
                operation = Operation::Draw;
                ProgramCounterStep::Next
            }
            Instruction::Return => {
                self.registers.ret()?;
                ProgramCounterStep::Next
            }
            Instruction::Jump { nnn } => ProgramCounterStep::Jump(nnn),
            Instruction::Call { nnn } => {
                self.registers.call(nnn)?;
                ProgramCounterStep::Next
            }
            Instruction::SkipIfEqual { x, nn } => {
                ProgramCounterStep::cond(self.registers.get_register(x) == nn)
            }
            Instruction::SkipIfNotEqual { x, nn } => {
                ProgramCounterStep::cond(self.registers.get_register(x) != nn)
            }
            Instruction::SkipIfRegistersEqual { x, y } => ProgramCounterStep::cond(
                self.registers.get_register(x) == self.registers.get_register(y),
            ),
            Instruction::Set { x, nn } => {
                self.registers.set_register(x, nn);
                ProgramCounterStep::Next
            }
            Instruction::Add { x, nn } => {
                // let VX overflow, but ignore carry
                let res = self.registers.get_register(x).wrapping_add(nn);
                self.registers.set_register(x, res);
                ProgramCounterStep::Next
            }
            Instruction::Alu { ops, x, y } => {
                self.alu(ops, x, y);
                ProgramCounterStep::Next
            }
            Instruction::SkipIfRegistersNotEqual { x, y } => ProgramCounterStep::cond(
                self.registers.get_register(x) != self.registers.get_register(y),
            ),
            Instruction::SetIndex { nnn } => {
                self.registers.set_index_register(nnn as u16);
                ProgramCounterStep::Next
            }
            Instruction::JumpWithOffset { nnn } => {
                let v0 = self.registers.get_register(0) as usize;
                ProgramCounterStep::Jump(v0 + nnn)
            }
            Instruction::Random { x, nn } => {
                // using a fill bytes call here, as the trait RngCore does not
                // support random u8.
                let mut rand: [u8; 1] = [0];
                self.rng.fill_bytes(&mut rand);
                self.registers.set_register(x, nn & rand[0]);
                ProgramCounterStep::Next
            }
            Instruction::Draw { x, y, n } => {
                self.draw(x, y, n)?;
                operation = Operation::Draw;
                ProgramCounterStep::Next
            }
            Instruction::Key { ops, x } => {
                let key = (self.registers.get_register(x) & 0xF) as usize;
                let pressed = self.keyboard.is_pressed(key);
                match ops {
                    KeyOpcode::Pressed => ProgramCounterStep::cond(pressed),
                    KeyOpcode::NotPressed => ProgramCounterStep::cond(!pressed),
                }
            }
            Instruction::Misc { ops, x } => {
                if let MiscOpcode::AwaitKeyPress = ops {
                    operation = Operation::Wait;
                }
                self.misc(ops, x)?;
                ProgramCounterStep::Next
            }
        };

        self.registers.step(step)?;
        Ok(operation)
    }

    /// The `8XYN` register operations, `VF` is always written last.
    fn alu(&mut self, ops: AluOpcode, x: usize, y: usize) {
        let vx = self.registers.get_register(x);
        let vy = self.registers.get_register(y);

        let (res, flag) = match ops {
            AluOpcode::Assign => (vy, None),
            AluOpcode::Or => (vx | vy, None),
            AluOpcode::And => (vx & vy, None),
            AluOpcode::Xor => (vx ^ vy, None),
            AluOpcode::Add => {
                let (res, carry) = vx.overflowing_add(vy);
                (res, Some(carry))
            }
            AluOpcode::Sub => {
                let (res, borrow) = vx.overflowing_sub(vy);
                (res, Some(!borrow))
            }
            AluOpcode::ShiftRight => (vx >> 1, Some(vx & 0x01 == 0x01)),
            AluOpcode::SubReverse => {
                let (res, borrow) = vy.overflowing_sub(vx);
                (res, Some(!borrow))
            }
            AluOpcode::ShiftLeft => (vx << 1, Some(vx & 0x80 == 0x80)),
        };

        self.registers.set_register(x, res);
        if let Some(flag) = flag {
            self.registers.set_flag(flag);
        }
    }

    /// Draws a sprite at coordinate `(VX, VY)` that has a width of `8` pixels and a height
    /// of `N` pixels. Each row of `8` pixels is read as bit-coded starting from memory
    /// location `I`. The start position wraps around the screen and so do the pixels
    /// reaching over the edge.
    fn draw(&mut self, x: usize, y: usize, n: usize) -> Result<(), ProcessError> {
        let coorx = self.registers.get_register(x) as usize % display::WIDTH;
        let coory = self.registers.get_register(y) as usize % display::HEIGHT;
        let index = self.registers.get_index_register();

        let sprite = self.memory.read_slice(index, n)?;
        let mut collision = false;

        for (i, row) in sprite.iter().enumerate() {
            let py = (coory + i) % display::HEIGHT;
            for j in 0..display::SPRITE_WIDTH {
                let mask = 0x80 >> j;
                if row & mask == 0 {
                    continue;
                }
                let px = (coorx + j) % display::WIDTH;
                collision |= self.display.toggle_pixel(px, py);
            }
        }

        self.registers.set_flag(collision);
        self.display.render();
        Ok(())
    }

    /// The `FXNN` timer, keyboard and memory operations.
    fn misc(&mut self, ops: MiscOpcode, x: usize) -> Result<(), ProcessError> {
        let vx = self.registers.get_register(x);
        let index = self.registers.get_index_register();

        match ops {
            MiscOpcode::GetDelayTimer => self.registers.set_register(x, self.timers.get_delay()),
            MiscOpcode::AwaitKeyPress => {
                log::debug!("Waiting for a key press into V{:X}", x);
                self.keyboard.await_key(x);
            }
            MiscOpcode::SetDelayTimer => self.timers.set_delay(vx),
            MiscOpcode::SetSoundTimer => self.timers.set_sound(vx, &mut self.audio),
            MiscOpcode::AddVxToI => {
                let res = index + vx as usize;
                if res >= memory::SIZE {
                    return Err(MemoryError::OutOfBounds {
                        address: res,
                        len: 1,
                    }
                    .into());
                }
                self.registers.set_index_register(res as u16);
            }
            MiscOpcode::SetIToSprite => {
                let glyph = display::fontset::LOCATION
                    + (vx & 0xF) as usize * display::fontset::GLYPH_SIZE;
                self.registers.set_index_register(glyph as u16);
            }
            MiscOpcode::StoreBCD => {
                let bcd = [vx / 100, vx / 10 % 10, vx % 10];
                self.memory.write_slice(index, &bcd)?;
            }
            MiscOpcode::StoreV0ToVx => {
                self.memory
                    .write_slice(index, &self.registers.get_registers()[..=x])?;
            }
            MiscOpcode::FillV0ToVx => {
                let data = self.memory.read_slice(index, x + 1)?;
                self.registers.get_registers_mut()[..=x].copy_from_slice(data);
            }
        }
        Ok(())
    }
}
