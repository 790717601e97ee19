//! Opcode abstractions, decoding and constants.
use std::convert::TryFrom;

use crate::{definitions::memory, MemoryError, OpcodeError};

/// the base mask used for generating all the other sub masks
pub(crate) const OPCODE_MASK_FFFF: u16 = u16::MAX;

/// the mask for the first twelve bits
pub(crate) const OPCODE_MASK_FFF0: u16 = OPCODE_MASK_FFFF << 4;

/// the mask for the first eight bits
pub(crate) const OPCODE_MASK_FF00: u16 = OPCODE_MASK_FFFF << 8;

/// the mask for the first four bits
pub(crate) const OPCODE_MASK_F000: u16 = OPCODE_MASK_FFFF << 12;

/// the mask for the last four bits
pub(crate) const OPCODE_MASK_000F: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_FFF0;

/// the mask for the last eight bits
pub(crate) const OPCODE_MASK_00FF: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_FF00;

/// the mask for the last twelve bits
pub(crate) const OPCODE_MASK_0FFF: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_F000;

/// the size of a nibble in bits
const NIBBLE: u16 = 4;

/// a wrapper type for u16 to make it clear what is meant to be used
pub type Opcode = u16;

/// will build an opcode from data and the given point
/// # Arguments
///
/// - `data` - A slice of u8 data entries used to generate the opcodes
/// - `pointer` - Where in the data the opcode shall be extracted, so `pointer` and `pointer + 1` make
/// the opcode up
///
/// # Example
/// ```rust
/// # use chip::opcode::*;
///  const OPCODES: [Opcode; 2] = [0x00EE, 0x1EDA];
///  const SPLIT_OPCODE: [u8; 4] = [0x00, 0xEE, 0x1E, 0xDA];
///  for (i, val) in OPCODES.iter().enumerate() {
///      let opcode = build_opcode(&SPLIT_OPCODE, i * 2).expect("This will work.");
///      assert_eq!(opcode, *val);
///  }
/// # assert!(build_opcode(&SPLIT_OPCODE, 3).is_err());
/// ```
pub fn build_opcode(data: &[u8], pointer: usize) -> Result<Opcode, MemoryError> {
    match (data.get(pointer), pointer.checked_add(1).and_then(|p| data.get(p))) {
        (Some(&high), Some(&low)) => Ok(Opcode::from_be_bytes([high, low])),
        _ => Err(MemoryError::OutOfBounds {
            address: pointer,
            len: memory::opcodes::SIZE,
        }),
    }
}

/// These are special traits used to filter out information
/// from opcodes
pub trait OpcodeTrait {
    /// this is an opcode extractor that will return the
    /// instruction category `T` (`0x0-0xF`)
    fn t(&self) -> u8;

    /// this is an opcode extractor for the opcode type `TNNN`
    /// - `NNN` is an address
    fn nnn(&self) -> usize;

    /// this is an opcode extractor for the opcode type `TXNN`
    /// - `X` is a register index
    /// - `NN` is a constant
    fn xnn(&self) -> (usize, u8);

    /// this is an opcode extractor for the opcode type `TXYN`
    /// - `X` is a register index
    /// - `Y` is a register index
    /// - `N` is a constant or sub opcode
    fn xyn(&self) -> (usize, usize, u8);

    /// this is an opcode extractor for the opcode type `TXTT`
    /// - `X` is a register index
    fn x(&self) -> usize;
}

impl OpcodeTrait for Opcode {
    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.t(), 0x1);
    /// ```
    fn t(&self) -> u8 {
        ((self & OPCODE_MASK_F000) >> (3 * NIBBLE)) as u8
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.nnn(), 0xEDA)
    /// ```
    fn nnn(&self) -> usize {
        (self & OPCODE_MASK_0FFF) as usize
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.xnn(), (0xE, 0xDA));
    /// ```
    fn xnn(&self) -> (usize, u8) {
        (self.x(), (self & OPCODE_MASK_00FF) as u8)
    }

    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.xyn(), (0xE, 0xD, 0xA));
    /// ```
    fn xyn(&self) -> (usize, usize, u8) {
        let y = ((self >> NIBBLE) & OPCODE_MASK_000F) as usize;
        let n = (self & OPCODE_MASK_000F) as u8;
        (self.x(), y, n)
    }

    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.x(), 0xE);
    /// ```
    fn x(&self) -> usize {
        ((self >> (2 * NIBBLE)) & OPCODE_MASK_000F) as usize
    }
}

/// Generates the enum and its `TryFrom<u8>` conversion for the
/// sub opcode tables, unknown values map to `()`.
macro_rules! subcodes {
    ($(#[$meta:meta])* $name:ident { $( $(#[$vmeta:meta])* $key:literal => $variant:ident ),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl TryFrom<u8> for $name {
            type Error = ();

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $key => Ok($name::$variant), )+
                    _ => Err(()),
                }
            }
        }
    };
}

subcodes!(
    /// The register to register operations of the `8XYN` category.
    AluOpcode {
        /// 8XY0 - Sets VX to the value of VY.
        0x0 => Assign,
        /// 8XY1 - Sets VX to VX or VY.
        0x1 => Or,
        /// 8XY2 - Sets VX to VX and VY.
        0x2 => And,
        /// 8XY3 - Sets VX to VX xor VY.
        0x3 => Xor,
        /// 8XY4 - Adds VY to VX. VF is set to 1 when there's a carry, and to 0 when there isn't.
        0x4 => Add,
        /// 8XY5 - VY is subtracted from VX. VF is set to 0 when there's a borrow, and 1 when
        /// there isn't.
        0x5 => Sub,
        /// 8XY6 - Stores the least significant bit of VX in VF and then shifts VX to the right by 1.
        0x6 => ShiftRight,
        /// 8XY7 - Sets VX to VY minus VX. VF is set to 0 when there's a borrow, and 1 when there
        /// isn't.
        0x7 => SubReverse,
        /// 8XYE - Stores the most significant bit of VX in VF and then shifts VX to the left by 1.
        0xE => ShiftLeft,
    }
);

subcodes!(
    /// The keyboard conditions of the `EXNN` category.
    KeyOpcode {
        /// EX9E - Skips the next instruction if the key stored in VX is pressed.
        0x9E => Pressed,
        /// EXA1 - Skips the next instruction if the key stored in VX isn't pressed.
        0xA1 => NotPressed,
    }
);

subcodes!(
    /// The timer, keyboard and memory operations of the `FXNN` category.
    MiscOpcode {
        /// FX07 - Sets VX to the value of the delay timer.
        0x07 => GetDelayTimer,
        /// FX0A - A key press is awaited, and then stored in VX.
        0x0A => AwaitKeyPress,
        /// FX15 - Sets the delay timer to VX.
        0x15 => SetDelayTimer,
        /// FX18 - Sets the sound timer to VX.
        0x18 => SetSoundTimer,
        /// FX1E - Adds VX to I. VF is not affected.
        0x1E => AddVxToI,
        /// FX29 - Sets I to the location of the sprite for the character in VX.
        0x29 => SetIToSprite,
        /// FX33 - Stores the binary-coded decimal representation of VX at I, I+1 and I+2.
        0x33 => StoreBCD,
        /// FX55 - Stores V0 to VX (including VX) in memory starting at address I.
        0x55 => StoreV0ToVx,
        /// FX65 - Fills V0 to VX (including VX) with values from memory starting at address I.
        0x65 => FillV0ToVx,
    }
);

/// A fully decoded instruction, one variant per opcode category.
///
/// - `00E0` - Display  - `disp_clear()`        - Clears the screen.
/// - `00EE` - Flow     - `return;`             - Returns from a subroutine.
/// - `1NNN` - Flow     - `goto NNN;`           - Jumps to address `NNN`.
/// - `2NNN` - Flow     - `*(0xNNN)()`          - Calls subroutine at `NNN`.
/// - `3XNN` - Cond     - `if(Vx==NN)`          - Skips the next instruction if `VX` equals `NN`.
/// - `4XNN` - Cond     - `if(Vx!=NN)`          - Skips the next instruction if `VX` doesn't equal `NN`.
/// - `5XY0` - Cond     - `if(Vx==Vy)`          - Skips the next instruction if `VX` equals `VY`.
/// - `6XNN` - Const    - `Vx = NN`             - Sets `VX` to `NN`.
/// - `7XNN` - Const    - `Vx += NN`            - Adds `NN` to `VX`. (Carry flag is not changed)
/// - `8XYN` - see [`AluOpcode`](AluOpcode)
/// - `9XY0` - Cond     - `if(Vx!=Vy)`          - Skips the next instruction if `VX` doesn't equal `VY`.
/// - `ANNN` - MEM      - `I = NNN`             - Sets `I` to the address `NNN`.
/// - `BNNN` - Flow     - `PC=V0+NNN`           - Jumps to the address `NNN` plus `V0`.
/// - `CXNN` - Rand     - `Vx=rand()&NN`        - Sets `VX` to a random byte and `NN`.
/// - `DXYN` - Disp     - `draw(Vx,Vy,N)`       - Draws an `8xN` sprite from `I` at `(VX, VY)`, `VF` flags a collision.
/// - `EXNN` - see [`KeyOpcode`](KeyOpcode)
/// - `FXNN` - see [`MiscOpcode`](MiscOpcode)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Clear,
    Return,
    Jump { nnn: usize },
    Call { nnn: usize },
    SkipIfEqual { x: usize, nn: u8 },
    SkipIfNotEqual { x: usize, nn: u8 },
    SkipIfRegistersEqual { x: usize, y: usize },
    Set { x: usize, nn: u8 },
    Add { x: usize, nn: u8 },
    Alu { ops: AluOpcode, x: usize, y: usize },
    SkipIfRegistersNotEqual { x: usize, y: usize },
    SetIndex { nnn: usize },
    JumpWithOffset { nnn: usize },
    Random { x: usize, nn: u8 },
    Draw { x: usize, y: usize, n: usize },
    Key { ops: KeyOpcode, x: usize },
    Misc { ops: MiscOpcode, x: usize },
}

impl TryFrom<Opcode> for Instruction {
    type Error = OpcodeError;

    fn try_from(value: Opcode) -> Result<Self, Self::Error> {
        let invalid = |_| OpcodeError::InvalidOpcode(value);
        let nnn = value.nnn();
        let (x, nn) = value.xnn();
        let (_, y, n) = value.xyn();

        let res = match value.t() {
            0x0 => match nnn {
                0x0E0 => Instruction::Clear,
                0x0EE => Instruction::Return,
                _ => return Err(OpcodeError::InvalidOpcode(value)),
            },
            0x1 => Instruction::Jump { nnn },
            0x2 => Instruction::Call { nnn },
            0x3 => Instruction::SkipIfEqual { x, nn },
            0x4 => Instruction::SkipIfNotEqual { x, nn },
            0x5 if n == 0 => Instruction::SkipIfRegistersEqual { x, y },
            0x6 => Instruction::Set { x, nn },
            0x7 => Instruction::Add { x, nn },
            0x8 => Instruction::Alu {
                ops: AluOpcode::try_from(n).map_err(invalid)?,
                x,
                y,
            },
            0x9 if n == 0 => Instruction::SkipIfRegistersNotEqual { x, y },
            0xA => Instruction::SetIndex { nnn },
            0xB => Instruction::JumpWithOffset { nnn },
            0xC => Instruction::Random { x, nn },
            0xD => Instruction::Draw {
                x,
                y,
                n: n as usize,
            },
            0xE => Instruction::Key {
                ops: KeyOpcode::try_from(nn).map_err(invalid)?,
                x,
            },
            0xF => Instruction::Misc {
                ops: MiscOpcode::try_from(nn).map_err(invalid)?,
                x,
            },
            _ => return Err(OpcodeError::InvalidOpcode(value)),
        };
        Ok(res)
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// Represents the program steps that the chip can take after an
/// instruction has been executed. The fetch has already moved the
/// program counter past the executed instruction.
pub enum ProgramCounterStep {
    /// Continue with the following instruction
    Next,
    /// Skip the following instruction
    Skip,
    /// Will simply move the program counter to the given location.
    Jump(usize),
}

impl ProgramCounterStep {
    /// Will return a Skip if the condition is true.
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::ProgramCounterStep;
    /// assert_eq!(ProgramCounterStep::Next, ProgramCounterStep::cond(false));
    /// assert_eq!(ProgramCounterStep::Skip, ProgramCounterStep::cond(true));
    /// ```
    #[inline]
    pub fn cond(cond: bool) -> Self {
        if cond {
            ProgramCounterStep::Skip
        } else {
            ProgramCounterStep::Next
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// Represents a command from the interpreter up to the driver.
pub enum Operation {
    /// If no action has to be taken.
    None,
    /// The chip waits for the next key press.
    Wait,
    /// The display was repainted.
    Draw,
}

#[cfg(test)]
mod tests {
    use std::convert::TryInto;

    use super::*;

    #[test]
    fn test_tryfrom_opcode_simple() {
        let value: Opcode = 0x00E0;
        let conv: Result<Instruction, _> = value.try_into();
        assert_eq!(conv, Ok(Instruction::Clear));
    }

    #[test]
    fn test_tryfrom_opcode_simple_fail() {
        let value: Opcode = 0x00E1;
        let conv: Result<Instruction, _> = value.try_into();
        assert_eq!(conv, Err(OpcodeError::InvalidOpcode(value)));
    }

    #[test]
    fn test_tryfrom_opcode_multiple() {
        use Instruction::*;
        let tests: &[(Opcode, Result<Instruction, ()>)] = &[
            (0x00E0, Ok(Clear)),
            (0x00EE, Ok(Return)),
            (0x0123, Err(())),
            (0x1919, Ok(Jump { nnn: 0x919 })),
            (0x2222, Ok(Call { nnn: 0x222 })),
            (0x3123, Ok(SkipIfEqual { x: 0x1, nn: 0x23 })),
            (0x4123, Ok(SkipIfNotEqual { x: 0x1, nn: 0x23 })),
            (0x5120, Ok(SkipIfRegistersEqual { x: 0x1, y: 0x2 })),
            (0x5121, Err(())),
            (0x6123, Ok(Set { x: 0x1, nn: 0x23 })),
            (0x7123, Ok(Add { x: 0x1, nn: 0x23 })),
            (
                0x8124,
                Ok(Alu {
                    ops: AluOpcode::Add,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x812E,
                Ok(Alu {
                    ops: AluOpcode::ShiftLeft,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (0x8128, Err(())),
            (0x9120, Ok(SkipIfRegistersNotEqual { x: 0x1, y: 0x2 })),
            (0x9121, Err(())),
            (0xA222, Ok(SetIndex { nnn: 0x222 })),
            (0xB222, Ok(JumpWithOffset { nnn: 0x222 })),
            (0xC123, Ok(Random { x: 0x1, nn: 0x23 })),
            (
                0xD123,
                Ok(Draw {
                    x: 0x1,
                    y: 0x2,
                    n: 0x3,
                }),
            ),
            (
                0xE19E,
                Ok(Key {
                    ops: KeyOpcode::Pressed,
                    x: 0x1,
                }),
            ),
            (
                0xE1A1,
                Ok(Key {
                    ops: KeyOpcode::NotPressed,
                    x: 0x1,
                }),
            ),
            (0xE111, Err(())),
            (
                0xF00A,
                Ok(Misc {
                    ops: MiscOpcode::AwaitKeyPress,
                    x: 0x0,
                }),
            ),
            (
                0xF533,
                Ok(Misc {
                    ops: MiscOpcode::StoreBCD,
                    x: 0x5,
                }),
            ),
            (0xF0AA, Err(())),
        ];
        for (value, res) in tests.iter() {
            let conv: Result<Instruction, _> = (*value).try_into();
            assert_eq!(conv, res.map_err(|_| OpcodeError::InvalidOpcode(*value)));
        }
    }

    #[test]
    fn test_every_alu_subcode() {
        let known: [u8; 9] = [0x0, 0x1, 0x2, 0x3, 0x4, 0x5, 0x6, 0x7, 0xE];
        for n in 0..=0xFu8 {
            let decoded = AluOpcode::try_from(n);
            assert_eq!(decoded.is_ok(), known.contains(&n), "subcode {:#X}", n);
        }
    }

    #[test]
    fn test_every_misc_subcode() {
        let known: [u8; 9] = [0x07, 0x0A, 0x15, 0x18, 0x1E, 0x29, 0x33, 0x55, 0x65];
        let decoded = (0..=u8::MAX)
            .filter(|&nn| MiscOpcode::try_from(nn).is_ok())
            .collect::<Vec<_>>();
        assert_eq!(decoded, known);
    }
}
