use std::convert::TryFrom;

use {
    crate::{
        devices::{AudioCommands, DisplayCommands, Keyboard},
        memory::Memory,
        opcode::{Instruction, Opcode, Operation},
        registers::Registers,
        resources::Rom,
        timer::Timers,
        ProcessError,
    },
    rand::RngCore,
};

/// The ChipSet struct represents the current state
/// of the system, it contains all the structures
/// needed for emulating an instant on the
/// Chip8 CPU.
///
/// The chip can only be built with a display and an audio device, everything
/// else is owned by the chip itself and driven through [`step`](ChipSet::step)
/// and [`tick`](ChipSet::tick).
pub struct ChipSet<D, A>
where
    D: DisplayCommands,
    A: AudioCommands,
{
    /// name of the loaded rom
    pub(super) name: String,
    /// the last fetched opcode, all two bytes long and stored big-endian
    pub(super) opcode: Opcode,
    pub(super) memory: Memory,
    pub(super) registers: Registers,
    pub(super) timers: Timers,
    pub(super) keyboard: Keyboard,
    /// This stores the random number generator, used by the chipset.
    /// It is stored into the chipset, so as to enable simple mocking
    /// of the given type.
    pub(super) rng: Box<dyn RngCore + Send>,
    pub(super) display: D,
    pub(super) audio: A,
}

impl<D, A> ChipSet<D, A>
where
    D: DisplayCommands,
    A: AudioCommands,
{
    /// will create a new chipset object
    pub fn new(display: D, audio: A) -> Self {
        Self {
            name: String::new(),
            opcode: 0,
            memory: Memory::new(),
            registers: Registers::new(),
            timers: Timers::new(),
            keyboard: Keyboard::new(),
            rng: Box::new(rand::rngs::OsRng {}),
            display,
            audio,
        }
    }

    /// Brings the chip back into the power on state, the font is reloaded and
    /// the display cleared.
    pub fn reset(&mut self) {
        log::debug!("Resetting the chip");
        self.name.clear();
        self.opcode = 0;
        self.memory.reset();
        self.registers.reset();
        self.timers.reset();
        self.keyboard.reset();
        self.display.clear();
        self.audio.stop_tone();
    }

    /// Resets the chip and loads the raw rom data into the program memory.
    ///
    /// Returns the amount of bytes loaded, data past the program capacity
    /// is dropped.
    pub fn load_rom(&mut self, rom: &[u8]) -> usize {
        self.reset();
        let len = self.memory.load(rom);
        log::debug!("Loaded {} bytes of rom data", len);
        len
    }

    /// Resets the chip and loads the given rom.
    pub fn load(&mut self, rom: &Rom) -> usize {
        let len = self.load_rom(rom.get_data());
        self.name = rom.get_name().to_string();
        len
    }

    /// will get the next opcode from memory and move the
    /// program counter past it
    pub(super) fn fetch(&mut self) -> Result<Opcode, ProcessError> {
        self.opcode = self
            .memory
            .read_opcode(self.registers.get_program_counter())?;
        self.registers.advance();
        Ok(self.opcode)
    }

    /// will advance the program by a single step
    ///
    /// While the chip waits for a key press, this does nothing. Opcodes that
    /// can't be decoded are skipped. An error means the rom can't continue.
    pub fn step(&mut self) -> Result<Operation, ProcessError> {
        if self.keyboard.is_waiting() {
            return Ok(Operation::Wait);
        }

        let pc = self.registers.get_program_counter();
        let opcode = self.fetch()?;

        match Instruction::try_from(opcode) {
            Ok(instruction) => {
                log::trace!("{:#06X}: {:#06X} {:?}", pc, opcode, instruction);
                self.execute(instruction)
            }
            Err(err) => {
                log::warn!("Skipping at {:#06X}: {}", pc, err);
                Ok(Operation::None)
            }
        }
    }

    /// Counts the timers down, has to be called at `60Hz`.
    pub fn tick(&mut self) {
        self.timers.tick(&mut self.audio);
    }

    /// Handles a physical key being pressed, unknown keys are ignored.
    pub fn key_down(&mut self, key: &str) {
        match Keyboard::map_key(key) {
            Some(key) => self.key_down_logical(key),
            None => log::trace!("Ignoring unmapped key '{}'", key),
        }
    }

    /// Handles a physical key being released, unknown keys are ignored.
    pub fn key_up(&mut self, key: &str) {
        if let Some(key) = Keyboard::map_key(key) {
            self.key_up_logical(key);
        }
    }

    /// Presses the logical key `0x0-0xF`, this resolves a pending key wait.
    pub fn key_down_logical(&mut self, key: usize) {
        if let Some(register) = self.keyboard.press(key) {
            log::debug!("Key {:#X} resolves the wait on V{:X}", key, register);
            self.registers.set_register(register, key as u8);
        }
    }

    /// Releases the logical key `0x0-0xF`.
    pub fn key_up_logical(&mut self, key: usize) {
        self.keyboard.release(key);
    }

    pub fn is_pressed(&self, key: usize) -> bool {
        self.keyboard.is_pressed(key)
    }

    /// Returns if the chip is blocked until the next key press.
    pub fn is_waiting(&self) -> bool {
        self.keyboard.is_waiting()
    }

    /// Will get the current state of the keyboard
    pub fn get_keyboard(&self) -> &[bool] {
        self.keyboard.get_keys()
    }

    pub fn get_registers(&self) -> &Registers {
        &self.registers
    }

    pub fn get_program_counter(&self) -> usize {
        self.registers.get_program_counter()
    }

    pub fn get_index_register(&self) -> usize {
        self.registers.get_index_register()
    }

    pub fn get_memory(&self) -> &Memory {
        &self.memory
    }

    /// will return the sound timer
    pub fn get_sound_timer(&self) -> u8 {
        self.timers.get_sound()
    }

    /// will return the delay timer
    pub fn get_delay_timer(&self) -> u8 {
        self.timers.get_delay()
    }

    pub fn get_display(&self) -> &D {
        &self.display
    }

    pub fn get_display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn get_audio(&self) -> &A {
        &self.audio
    }

    /// the name of the loaded rom
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Replaces the random number generator used by `CXNN`.
    pub fn set_rng<R: RngCore + Send + 'static>(&mut self, rng: R) {
        self.rng = Box::new(rng);
    }
}
