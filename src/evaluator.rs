//! Executes a parsed [`Program`] against a fixed-size [`Tape`].
//!
//! Behaviors:
//! - The data cursor starts at cell 0; moving left of cell 0 or right of the
//!   last cell is an [`EvalError::OutOfBounds`] error.
//! - Cells wrap around on `+` and `-`.
//! - `.` writes the current cell to the output sink as a raw byte.
//! - `,` reads one byte from the input source; once input is exhausted the cell
//!   is set to the configured EOF byte ([`DEFAULT_EOF_BYTE`] unless changed).
//! - Output already written when an error occurs stays written.

use std::io::{self, Read, Write};
use std::num::NonZeroUsize;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{debug, trace};

use crate::config::{DEFAULT_EOF_BYTE, DEFAULT_TAPE_CELLS};
use crate::instruction::{Instruction, Program};

/// Errors that can occur while executing a program.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// The data cursor attempted to move left of cell 0 or beyond the last cell.
    #[error("pointer out of bounds at instruction {ip} (ptr={ptr}, op='{op}')")]
    OutOfBounds { ip: usize, ptr: usize, op: Instruction },

    /// Writing output or reading input failed.
    #[error("I/O error at instruction {ip}: {source}")]
    Io { ip: usize, #[source] source: io::Error },

    /// Execution aborted due to step limit.
    #[error("Execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: u64 },

    /// Execution aborted due to cooperative cancellation (e.g., ctrl+c).
    #[error("Execution aborted: cancelled")]
    Canceled,
}

/// A fixed-length, zero-initialized row of byte cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Box<[u8]>,
}

impl Tape {
    pub fn new(len: NonZeroUsize) -> Self {
        Self { cells: vec![0; len.get()].into_boxed_slice() }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; a tape has at least one cell.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Zero every cell.
    pub fn reset(&mut self) {
        self.cells.fill(0);
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_TAPE_CELLS).unwrap_or(NonZeroUsize::MIN))
    }
}

/// Controls for cooperative cancellation and step limiting.
#[derive(Clone)]
pub struct StepControl {
    pub max_steps: Option<u64>,
    pub cancel_flag: Arc<AtomicBool>,
}

impl StepControl {
    pub fn new(max_steps: Option<u64>, cancel_flag: Arc<AtomicBool>) -> Self {
        Self { max_steps, cancel_flag }
    }
}

/// Summary of a finished execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    /// Number of instructions executed.
    pub steps: u64,
}

/// Configurable executor. [`evaluate`] covers the common case.
#[derive(Clone)]
pub struct Evaluator {
    eof_byte: u8,
    step_control: Option<StepControl>,
    debug: bool,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            eof_byte: DEFAULT_EOF_BYTE,
            step_control: None,
            debug: false,
        }
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Byte stored by `,` once the input source is exhausted.
    pub fn with_eof_byte(mut self, eof_byte: u8) -> Self {
        self.eof_byte = eof_byte;
        self
    }

    pub fn with_step_control(mut self, step_control: StepControl) -> Self {
        self.step_control = Some(step_control);
        self
    }

    /// Write a step-by-step table of operations to the output sink instead of
    /// performing program I/O. The tape changes exactly as in a real run, but:
    /// - '.' does not emit the byte; the action is logged instead
    /// - ',' does not read input; it behaves as if input were exhausted
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Execute `program` on `tape` until it runs off the end of the program.
    ///
    /// The data cursor starts at cell 0. `tape` is used as given, so pass a
    /// fresh or [`Tape::reset`] tape for a clean run.
    pub fn run<W: Write, R: Read>(
        &self,
        program: &Program,
        tape: &mut Tape,
        output: &mut W,
        input: &mut R,
    ) -> Result<Report, EvalError> {
        match self.execute(program, tape, output, input) {
            Ok(report) => {
                output.flush().map_err(|e| EvalError::Io { ip: program.len(), source: e })?;
                debug!(steps = report.steps, "program finished");
                Ok(report)
            }
            Err(err) => {
                // Keep whatever the program printed before failing.
                let _ = output.flush();
                debug!("program aborted: {err}");
                Err(err)
            }
        }
    }

    fn execute<W: Write, R: Read>(
        &self,
        program: &Program,
        tape: &mut Tape,
        output: &mut W,
        input: &mut R,
    ) -> Result<Report, EvalError> {
        let code = program.instructions();
        let cells: &mut [u8] = &mut tape.cells;
        let last_cell = cells.len() - 1;
        let mut ip = 0usize;
        let mut ptr = 0usize;
        let mut steps: u64 = 0;

        if self.debug {
            writeln!(output, "STEP | IP  | PTR | CELL | INSTR | ACTION")
                .and_then(|_| writeln!(output, "-----+-----+-----+------+-------+------------------------------------------------"))
                .map_err(|e| EvalError::Io { ip, source: e })?;
        }

        while ip < code.len() {
            if let Some(ctrl) = self.step_control.as_ref() {
                if ctrl.cancel_flag.load(Ordering::Relaxed) {
                    return Err(EvalError::Canceled);
                }
                if let Some(max) = ctrl.max_steps {
                    if steps >= max {
                        return Err(EvalError::StepLimitExceeded { limit: max });
                    }
                }
            }

            let instr = code[ip];
            let (ip_before, ptr_before, cell_before) = (ip, ptr, cells[ptr]);
            let mut action: Option<String> = if self.debug { Some(String::new()) } else { None };
            trace!(ip, ptr, cell = cell_before, op = %instr, "step");

            match instr {
                Instruction::MoveRight => {
                    if ptr == last_cell {
                        return Err(EvalError::OutOfBounds { ip, ptr, op: instr });
                    }
                    ptr += 1;
                    if let Some(a) = action.as_mut() { *a = format!("Moved pointer head to index {ptr}"); }
                }
                Instruction::MoveLeft => {
                    if ptr == 0 {
                        return Err(EvalError::OutOfBounds { ip, ptr, op: instr });
                    }
                    ptr -= 1;
                    if let Some(a) = action.as_mut() { *a = format!("Moved pointer head to index {ptr}"); }
                }
                Instruction::Increment => {
                    cells[ptr] = cells[ptr].wrapping_add(1);
                    if let Some(a) = action.as_mut() { *a = format!("Increment cell[{ptr}] from {cell_before} to {}", cells[ptr]); }
                }
                Instruction::Decrement => {
                    cells[ptr] = cells[ptr].wrapping_sub(1);
                    if let Some(a) = action.as_mut() { *a = format!("Decrement cell[{ptr}] from {cell_before} to {}", cells[ptr]); }
                }
                Instruction::Write => {
                    if let Some(a) = action.as_mut() {
                        *a = format!("Output byte {} (suppressed in debug)", cells[ptr]);
                    } else {
                        output.write_all(&[cells[ptr]]).map_err(|e| EvalError::Io { ip, source: e })?;
                    }
                }
                Instruction::Read => {
                    if let Some(a) = action.as_mut() {
                        cells[ptr] = self.eof_byte;
                        *a = format!("Read byte -> simulated EOF (set cell to {})", self.eof_byte);
                    } else {
                        // Prompts written so far should be visible before blocking on input.
                        output.flush().map_err(|e| EvalError::Io { ip, source: e })?;
                        cells[ptr] = read_byte(input)
                            .map_err(|e| EvalError::Io { ip, source: e })?
                            .unwrap_or(self.eof_byte);
                    }
                }
                Instruction::LoopStart { end } => {
                    if cells[ptr] == 0 {
                        if let Some(a) = action.as_mut() { *a = format!("Cell is 0; jump forward to matching ']' at IP {end}"); }
                        ip = end;
                    } else if let Some(a) = action.as_mut() {
                        *a = "Enter loop (cell != 0)".to_string();
                    }
                }
                Instruction::LoopEnd { start } => {
                    if cells[ptr] != 0 {
                        if let Some(a) = action.as_mut() { *a = format!("Cell != 0; jump back to matching '[' at IP {start}"); }
                        ip = start;
                    } else if let Some(a) = action.as_mut() {
                        *a = "Exit loop (cell is 0)".to_string();
                    }
                }
            }

            if let Some(a) = action {
                writeln!(
                    output,
                    "{:<4} | {:<3} | {:<3} | {:<4} |  {}    | {}",
                    steps, ip_before, ptr_before, cell_before, instr, a
                )
                .map_err(|e| EvalError::Io { ip, source: e })?;
            }

            steps += 1;
            ip += 1;
        }

        Ok(Report { steps })
    }
}

/// Read a single byte, `None` at end of input.
fn read_byte<R: Read>(input: &mut R) -> io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match input.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Run `program` on `tape` with default settings, writing `.` output to
/// `output` and reading `,` input from `input`.
pub fn evaluate<W: Write, R: Read>(
    program: &Program,
    tape: &mut Tape,
    output: &mut W,
    input: &mut R,
) -> Result<(), EvalError> {
    Evaluator::default().run(program, tape, output, input).map(|_| ())
}
