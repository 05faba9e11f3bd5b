//! Decoded instructions and the immutable program they form.

use std::fmt;

/// One decoded Brainfuck operation.
///
/// Loop instructions carry the index of their partner within the owning
/// [`Program`], so jumps stay valid no matter where the program's storage lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// `>`: move the data cursor one cell to the right.
    MoveRight,
    /// `<`: move the data cursor one cell to the left.
    MoveLeft,
    /// `+`: wrapping increment of the current cell.
    Increment,
    /// `-`: wrapping decrement of the current cell.
    Decrement,
    /// `.`: write the current cell to the output sink.
    Write,
    /// `,`: read one byte from the input source into the current cell.
    Read,
    /// `[`: skip past the matching `]` when the current cell is zero.
    LoopStart { end: usize },
    /// `]`: jump back to the matching `[` when the current cell is nonzero.
    LoopEnd { start: usize },
}

impl Instruction {
    /// Decode a non-loop command byte. Brackets and comment bytes yield `None`.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'>' => Some(Instruction::MoveRight),
            b'<' => Some(Instruction::MoveLeft),
            b'+' => Some(Instruction::Increment),
            b'-' => Some(Instruction::Decrement),
            b'.' => Some(Instruction::Write),
            b',' => Some(Instruction::Read),
            _ => None,
        }
    }

    /// Whether `byte` is one of the eight command symbols.
    pub fn is_command(byte: u8) -> bool {
        matches!(byte, b'>' | b'<' | b'+' | b'-' | b'.' | b',' | b'[' | b']')
    }

    /// The source symbol for this instruction.
    pub fn symbol(&self) -> char {
        match self {
            Instruction::MoveRight => '>',
            Instruction::MoveLeft => '<',
            Instruction::Increment => '+',
            Instruction::Decrement => '-',
            Instruction::Write => '.',
            Instruction::Read => ',',
            Instruction::LoopStart { .. } => '[',
            Instruction::LoopEnd { .. } => ']',
        }
    }

    /// Partner index for loop instructions.
    pub fn partner(&self) -> Option<usize> {
        match *self {
            Instruction::LoopStart { end } => Some(end),
            Instruction::LoopEnd { start } => Some(start),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A parsed program: instructions in source order with every loop pair resolved.
///
/// Programs are only built by [`crate::parser`], so the partner indices of a
/// `Program` always point at each other and a `LoopStart` always precedes its
/// `LoopEnd`. Each instruction also remembers the byte offset it was decoded
/// from, which diagnostics use to point back into the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
    offsets: Vec<usize>,
}

impl Program {
    pub(crate) fn from_parts(instructions: Vec<Instruction>, offsets: Vec<usize>) -> Self {
        debug_assert_eq!(instructions.len(), offsets.len());
        Self { instructions, offsets }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, ip: usize) -> Option<Instruction> {
        self.instructions.get(ip).copied()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Index of the partner of the loop instruction at `ip`.
    pub fn partner(&self, ip: usize) -> Option<usize> {
        self.get(ip).and_then(|instr| instr.partner())
    }

    /// Byte offset in the source of the instruction at `ip`.
    pub fn source_offset(&self, ip: usize) -> Option<usize> {
        self.offsets.get(ip).copied()
    }

    /// `(start, end)` indices of every loop pair, ordered by start.
    pub fn loop_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.instructions
            .iter()
            .enumerate()
            .filter_map(|(ip, instr)| match *instr {
                Instruction::LoopStart { end } => Some((ip, end)),
                _ => None,
            })
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

/// Renders the canonical source: the command symbols only, comments dropped.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instr in &self.instructions {
            write!(f, "{instr}")?;
        }
        Ok(())
    }
}
