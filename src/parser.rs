//! Source bytes to [`Program`].
//!
//! The parser reads its input in fixed-size chunks, keeps only the eight
//! command bytes and resolves every `[`/`]` pair to each other's index while
//! reading, so the evaluator never has to search for a matching bracket.

use std::fmt;
use std::io::{self, Read};
use tracing::debug;

use crate::config::Limits;
use crate::instruction::{Instruction, Program};

const CHUNK_SIZE: usize = 4096;

/// Errors that can occur while parsing Brainfuck source.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Reserving memory for the program or the bracket stack failed.
    #[error("out of memory while parsing")]
    OutOfMemory,

    /// The program is longer, or nests loops deeper, than the configured limit.
    #[error("program too long: {limit} (at byte {offset})")]
    ProgramTooLong { offset: usize, limit: LimitKind },

    /// A `]` without an open `[`, or a `[` still open at end of input.
    #[error("malformed program: unmatched bracket {kind} at byte {offset}")]
    MalformedProgram { offset: usize, kind: UnmatchedBracketKind },

    /// The source stream failed.
    #[error("I/O error at byte {offset}: {source}")]
    Io { offset: usize, #[source] source: io::Error },
}

impl ParseError {
    /// Byte offset in the source the error refers to, when there is one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            ParseError::OutOfMemory => None,
            ParseError::ProgramTooLong { offset, .. }
            | ParseError::MalformedProgram { offset, .. }
            | ParseError::Io { offset, .. } => Some(*offset),
        }
    }
}

/// Which configured limit a program exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    /// More instructions than `max_program_len`.
    Length { max: usize },
    /// Loops nested deeper than `max_loop_depth`.
    LoopDepth { max: usize },
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitKind::Length { max } => write!(f, "more than {max} instructions"),
            LimitKind::LoopDepth { max } => write!(f, "loops nested deeper than {max}"),
        }
    }
}

/// Which side of the loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedBracketKind {
    Open,
    Close,
}

impl fmt::Display for UnmatchedBracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedBracketKind::Open => write!(f, "'['"),
            UnmatchedBracketKind::Close => write!(f, "']'"),
        }
    }
}

/// Parse a complete program from `reader`.
pub fn parse<R: Read>(mut reader: R, limits: &Limits) -> Result<Program, ParseError> {
    let mut instructions: Vec<Instruction> = Vec::new();
    let mut offsets: Vec<usize> = Vec::new();
    // Indices of `[` still waiting for their `]`.
    let mut open_loops: Vec<usize> = Vec::new();

    let mut buf = [0u8; CHUNK_SIZE];
    let mut consumed = 0usize;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ParseError::Io { offset: consumed, source: e }),
        };
        let chunk = &buf[..n];

        let emitted = chunk.iter().filter(|b| Instruction::is_command(**b)).count();
        if instructions.len() + emitted > limits.max_program_len {
            // Point at the first command byte that does not fit.
            let room = limits.max_program_len - instructions.len();
            let offset = chunk
                .iter()
                .enumerate()
                .filter(|(_, b)| Instruction::is_command(**b))
                .nth(room)
                .map_or(consumed, |(i, _)| consumed + i);
            return Err(ParseError::ProgramTooLong {
                offset,
                limit: LimitKind::Length { max: limits.max_program_len },
            });
        }
        instructions.try_reserve(emitted).map_err(|_| ParseError::OutOfMemory)?;
        offsets.try_reserve(emitted).map_err(|_| ParseError::OutOfMemory)?;

        for (i, &byte) in chunk.iter().enumerate() {
            let offset = consumed + i;
            let ip = instructions.len();
            let instr = match byte {
                b'[' => {
                    if open_loops.len() >= limits.max_loop_depth {
                        return Err(ParseError::ProgramTooLong {
                            offset,
                            limit: LimitKind::LoopDepth { max: limits.max_loop_depth },
                        });
                    }
                    open_loops.try_reserve(1).map_err(|_| ParseError::OutOfMemory)?;
                    open_loops.push(ip);
                    // Points at itself until the matching `]` shows up.
                    Instruction::LoopStart { end: ip }
                }
                b']' => {
                    let Some(start) = open_loops.pop() else {
                        return Err(ParseError::MalformedProgram {
                            offset,
                            kind: UnmatchedBracketKind::Close,
                        });
                    };
                    instructions[start] = Instruction::LoopStart { end: ip };
                    Instruction::LoopEnd { start }
                }
                other => match Instruction::from_byte(other) {
                    Some(instr) => instr,
                    None => continue,
                },
            };
            instructions.push(instr);
            offsets.push(offset);
        }

        consumed += n;
    }

    if let Some(&unmatched) = open_loops.last() {
        return Err(ParseError::MalformedProgram {
            offset: offsets[unmatched],
            kind: UnmatchedBracketKind::Open,
        });
    }

    debug!(instructions = instructions.len(), bytes = consumed, "parsed program");
    Ok(Program::from_parts(instructions, offsets))
}

/// Parse a program held in memory.
pub fn parse_bytes(source: &[u8], limits: &Limits) -> Result<Program, ParseError> {
    parse(source, limits)
}
