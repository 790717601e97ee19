//! The register file of the chip.
use crate::{
    definitions::{
        cpu::{self, register, stack},
        memory,
    },
    opcode::ProgramCounterStep,
    MemoryError, StackError,
};

/// All the registers of the chip.
///
/// `8-bit` data registers are named `V0` to `VF`. The `VF` register doubles as a flag for
/// some instructions, it is written as a side effect by
/// - `8XY4` the carry of the addition,
/// - `8XY5` and `8XY7` the inverted borrow of the subtraction,
/// - `8XY6` and `8XYE` the bit shifted out,
/// - `DXYN` the pixel collision,
///
/// always after the result has been stored, so using `VF` as the target of one of these
/// instructions leaves only the flag behind.
#[derive(Debug, Clone, PartialEq)]
pub struct Registers {
    v: [u8; register::SIZE],
    /// The index for the register, this is a special register entry
    /// called index `I`
    index: u16,
    /// The address of the next instruction to be executed from memory.
    program_counter: usize,
    /// The stack is only used to store return addresses when subroutines are called.
    /// It is filled from the top slot downwards.
    stack: [u16; stack::SIZE],
    /// The next free slot on the stack, `None` once every slot is used.
    stack_pointer: Option<usize>,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    pub fn new() -> Self {
        Self {
            v: [0; register::SIZE],
            index: 0,
            program_counter: cpu::PROGRAM_COUNTER,
            stack: [0; stack::SIZE],
            stack_pointer: Some(stack::TOP),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn get_register(&self, x: usize) -> u8 {
        self.v[x]
    }

    pub fn set_register(&mut self, x: usize, value: u8) {
        self.v[x] = value;
    }

    /// All the data registers `V0` to `VF`.
    pub fn get_registers(&self) -> &[u8] {
        &self.v
    }

    pub(crate) fn get_registers_mut(&mut self) -> &mut [u8] {
        &mut self.v
    }

    /// Reads `VF`.
    pub fn get_flag(&self) -> u8 {
        self.v[register::LAST]
    }

    /// Writes `1` or `0` into `VF`.
    pub fn set_flag(&mut self, flag: bool) {
        self.v[register::LAST] = flag as u8;
    }

    pub fn get_index_register(&self) -> usize {
        self.index as usize
    }

    pub fn set_index_register(&mut self, index: u16) {
        self.index = index;
    }

    pub fn get_program_counter(&self) -> usize {
        self.program_counter
    }

    pub fn set_program_counter(&mut self, pointer: usize) -> Result<(), MemoryError> {
        if pointer >= memory::SIZE {
            return Err(MemoryError::OutOfBounds {
                address: pointer,
                len: memory::opcodes::SIZE,
            });
        }
        self.program_counter = pointer;
        Ok(())
    }

    /// Moves the program counter to the next instruction, a counter that runs off the
    /// end of the memory starts over at the beginning of the program.
    pub fn advance(&mut self) {
        self.program_counter += memory::opcodes::SIZE;
        if self.program_counter >= memory::SIZE {
            log::debug!("Program counter ran out of memory, wrapping to the program start");
            self.program_counter = cpu::PROGRAM_COUNTER;
        }
    }

    /// Applies the step requested by an instruction.
    pub fn step(&mut self, step: ProgramCounterStep) -> Result<(), MemoryError> {
        match step {
            ProgramCounterStep::Next => Ok(()),
            ProgramCounterStep::Skip => {
                self.advance();
                Ok(())
            }
            ProgramCounterStep::Jump(pointer) => self.set_program_counter(pointer),
        }
    }

    /// Pushes the current program counter onto the stack and jumps to the target.
    pub fn call(&mut self, target: usize) -> Result<(), StackError> {
        let pointer = self.stack_pointer.ok_or(StackError::Full)?;
        self.stack[pointer] = self.program_counter as u16;
        self.stack_pointer = pointer.checked_sub(1);
        log::debug!(
            "call {:#06X} from {:#06X}",
            target,
            self.program_counter
        );
        self.program_counter = target;
        Ok(())
    }

    /// Pops the last return address from the stack into the program counter.
    pub fn ret(&mut self) -> Result<(), StackError> {
        let pointer = match self.stack_pointer {
            Some(stack::TOP) => return Err(StackError::Empty),
            Some(pointer) => pointer + 1,
            None => 0,
        };
        self.program_counter = self.stack[pointer] as usize;
        self.stack_pointer = Some(pointer);
        log::debug!("return to {:#06X}", self.program_counter);
        Ok(())
    }

    /// The current stack pointer, `None` if the stack is full.
    pub fn get_stack_pointer(&self) -> Option<usize> {
        self.stack_pointer
    }

    /// The amount of return addresses on the stack.
    pub fn get_stack_depth(&self) -> usize {
        self.stack_pointer
            .map(|pointer| stack::TOP - pointer)
            .unwrap_or(stack::SIZE)
    }

    /// The stored return addresses, the most recent one last.
    pub fn get_stack(&self) -> impl Iterator<Item = usize> + '_ {
        let depth = self.get_stack_depth();
        self.stack[(stack::SIZE - depth)..]
            .iter()
            .rev()
            .map(|&address| address as usize)
    }
}
