//! A small Brainfuck interpreter built as a two-stage pipeline.
//!
//! 1. [`parser::parse`] turns source bytes into a [`Program`]: only the eight
//!    command bytes `><+-.,[]` become instructions, everything else is a
//!    comment, and every `[` is linked to its `]` by index while reading.
//! 2. [`evaluator::evaluate`] runs the program on a fixed-size [`Tape`]
//!    (30,000 zeroed cells by default) with a single data pointer.
//!
//! Behaviors:
//! - Moving the pointer left of cell 0 or past the last cell is an error.
//! - Cells wrap around on `+` and `-`.
//! - `,` stores the configured EOF byte (0xFF by default) once input runs out.
//! - Unmatched brackets and programs over the configured limits are rejected
//!   before anything runs.
//!
//! Quick start:
//!
//! ```
//! use tapebf::{evaluate, parse_bytes, Limits, Tape};
//!
//! let program = parse_bytes(b"++>+++++[<+>-]<.", &Limits::default()).expect("program should parse");
//! let mut tape = Tape::default();
//! let mut out = Vec::new();
//! evaluate(&program, &mut tape, &mut out, &mut std::io::empty()).expect("program should run");
//! assert_eq!(out, vec![7]);
//! ```

pub mod cli_util;
pub mod config;
pub mod evaluator;
pub mod instruction;
pub mod logging;
pub mod parser;
pub mod theme;

pub use config::{Config, ConfigError, Limits};
pub use evaluator::{evaluate, EvalError, Evaluator, Report, StepControl, Tape};
pub use instruction::{Instruction, Program};
pub use parser::{parse, parse_bytes, LimitKind, ParseError, UnmatchedBracketKind};
