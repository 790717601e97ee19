//! The pretty print implementation of the [`ChipSet`](super::ChipSet), used as the
//! diagnostic dump when a rom fails.

use std::fmt::{self, Write};

use super::ChipSet;
use crate::{
    definitions::{cpu, memory},
    devices::{AudioCommands, DisplayCommands},
};

/// The amount of opcodes printed in a single memory line
const HEX_PRINT_STEP: usize = 8;

/// The amount of bytes covered by a single memory line
const LINE_SIZE: usize = HEX_PRINT_STEP * memory::opcodes::SIZE;

/// The values that are used when there are at lease two rows of zeros.
const FILLER: &str = "...";

const INDENT: &str = "\t";

impl<D, A> fmt::Display for ChipSet<D, A>
where
    D: DisplayCommands,
    A: AudioCommands,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.name.is_empty() {
            "<unnamed>"
        } else {
            self.name.as_str()
        };
        writeln!(f, "Rom: {}", name)?;
        writeln!(
            f,
            "{}PC: {:#06X} Opcode: {:#06X} I: {:#06X} DT: {} ST: {}",
            INDENT,
            self.registers.get_program_counter(),
            self.opcode,
            self.registers.get_index_register(),
            self.timers.get_delay(),
            self.timers.get_sound(),
        )?;

        write!(f, "{}Registers:", INDENT)?;
        for (i, value) in self.registers.get_registers().iter().enumerate() {
            write!(f, " V{:X}={:#04X}", i, value)?;
        }
        writeln!(f)?;

        write!(f, "{}Stack:", INDENT)?;
        for address in self.registers.get_stack() {
            write!(f, " {:#06X}", address)?;
        }
        writeln!(f)?;

        write!(f, "{}Keys:", INDENT)?;
        let keys = self.keyboard.get_keys().iter().enumerate();
        for (key, _) in keys.filter(|(_, pressed)| **pressed) {
            write!(f, " {:X}", key)?;
        }
        if self.keyboard.is_waiting() {
            write!(f, " (waiting)")?;
        }
        writeln!(f)?;

        writeln!(f, "{}Memory:", INDENT)?;
        let program = &self.memory.as_slice()[cpu::PROGRAM_COUNTER..];
        f.write_str(&memory_dump(program, cpu::PROGRAM_COUNTER))
    }
}

/// Formats the data as rows of opcodes, two or more consecutive zero rows
/// are collapsed into a filler line.
fn memory_dump(data: &[u8], offset: usize) -> String {
    let mut text = String::new();
    let mut zero_rows = 0;

    let chunks = data.chunks(LINE_SIZE).collect::<Vec<_>>();
    for (i, chunk) in chunks.iter().enumerate() {
        let is_zero = chunk.iter().all(|&b| b == 0);
        let is_last = i + 1 == chunks.len();

        if is_zero && !is_last {
            zero_rows += 1;
            continue;
        }

        match zero_rows {
            0 => {}
            1 => memory_line(&mut text, &chunks[i - 1], offset + (i - 1) * LINE_SIZE),
            _ => {
                text.push_str(INDENT);
                text.push_str(INDENT);
                text.push_str(FILLER);
                text.push('\n');
            }
        }
        zero_rows = 0;

        memory_line(&mut text, chunk, offset + i * LINE_SIZE);
    }
    text
}

fn memory_line(text: &mut String, chunk: &[u8], from: usize) {
    // writing into a string can't fail
    let _ = write!(
        text,
        "{}{}{:#06X} - {:#06X} :",
        INDENT,
        INDENT,
        from,
        from + chunk.len() - 1
    );
    for opcode in chunk.chunks(memory::opcodes::SIZE) {
        let _ = match *opcode {
            [high, low] => write!(text, " {:#06X}", u16::from_be_bytes([high, low])),
            [single] => write!(text, " {:#04X}", single),
            _ => Ok(()),
        };
    }
    text.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{Screen, Silence};

    #[test]
    fn test_memory_dump_collapses_zeros() {
        let mut data = vec![0u8; 5 * LINE_SIZE];
        data[0] = 0x12;
        data[1] = 0x34;
        data[4 * LINE_SIZE] = 0xAB;

        let dump = memory_dump(&data, 0x200);
        let lines: Vec<&str> = dump.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("0x0200 - 0x020F : 0x1234"));
        assert!(lines[1].ends_with(FILLER));
        assert!(lines[2].contains("0x0240 - 0x024F : 0xAB00"));
    }

    #[test]
    fn test_memory_dump_keeps_single_zero_row() {
        let mut data = vec![0u8; 3 * LINE_SIZE];
        data[0] = 0x01;
        data[2 * LINE_SIZE] = 0x02;

        let dump = memory_dump(&data, 0);
        assert_eq!(dump.lines().count(), 3);
        assert!(!dump.contains(FILLER));
    }

    #[test]
    fn test_display_state() {
        let mut chip = ChipSet::new(Screen::new(), Silence::default());
        chip.load_rom(&[0x60, 0x2A, 0x12, 0x02]);
        chip.step().unwrap();
        chip.key_down_logical(0xB);

        let text = format!("{}", chip);
        assert!(text.starts_with("Rom: <unnamed>"));
        assert!(text.contains("PC: 0x0202"));
        assert!(text.contains("V0=0x2A"));
        assert!(text.contains("Keys: B"));
        assert!(text.contains("0x0200 - 0x020F : 0x602A 0x1202"));
    }
}
