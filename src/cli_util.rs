use std::io::{self, IsTerminal, Read, Seek, SeekFrom, Write};
use nu_ansi_term::Style;

use crate::evaluator::EvalError;
use crate::instruction::Program;
use crate::parser::ParseError;
use crate::theme::catppuccin::Mocha;

pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_INTERRUPTED: i32 = 130;

// Bytes shown on either side of the offending position.
const WINDOW_BYTES: usize = 32;
const SCAN_CHUNK: usize = 4096;

/// Process exit code for a failed run: 130 after ctrl+c, 1 otherwise.
pub fn exit_code(err: &EvalError) -> i32 {
    match err {
        EvalError::Canceled => EXIT_INTERRUPTED,
        _ => EXIT_FAILURE,
    }
}

/// Pretty-print a [`ParseError`] with caret positioning into `source`.
///
/// `source` is rewound and scanned up to the error, so it does not have to
/// fit in memory.
pub fn print_parse_error<S: Read + Seek>(program: &str, source: &mut S, err: &ParseError) {
    match err {
        ParseError::OutOfMemory => {
            eprintln!("{program}: {}: out of memory", label("Parse error"));
        }
        ParseError::ProgramTooLong { offset, limit } => {
            let msg = format!("{program}: {}: program too long ({limit})", label("Parse error"));
            print_error_with_context(&msg, source, *offset);
        }
        ParseError::MalformedProgram { offset, kind } => {
            let msg = format!("{program}: {}: unmatched bracket {kind}", label("Parse error"));
            print_error_with_context(&msg, source, *offset);
        }
        ParseError::Io { source: e, .. } => {
            eprintln!("{program}: {}: failed to read program: {e}", label("I/O error"));
        }
    }
    let _ = io::stderr().flush();
}

/// Pretty-print an [`EvalError`], pointing at the source of the failing instruction.
pub fn print_eval_error<S: Read + Seek>(
    program: &str,
    source: &mut S,
    code: &Program,
    err: &EvalError,
) {
    match err {
        EvalError::OutOfBounds { ip, ptr, op } => {
            let msg = format!(
                "{program}: {}: pointer out of bounds (ptr={ptr}, op={op})",
                label("Runtime error")
            );
            match code.source_offset(*ip) {
                Some(offset) => print_error_with_context(&msg, source, offset),
                None => eprintln!("{msg} at instruction {ip}"),
            }
        }
        EvalError::Io { ip, source: e } => {
            eprintln!("{program}: {}: {e} at instruction {ip}", label("I/O error"));
        }
        EvalError::StepLimitExceeded { limit } => {
            eprintln!(
                "{program}: {}: execution aborted, step limit exceeded ({limit})",
                label("Runtime error")
            );
        }
        EvalError::Canceled => {
            eprintln!("{program}: {}: execution aborted, interrupted", label("Runtime error"));
        }
    }
    let _ = io::stderr().flush();
}

/// Print a concise error with line/column and a caret under the offending byte.
/// Falls back to the raw byte offset if the source cannot be reread.
pub fn print_error_with_context<S: Read + Seek>(prefix: &str, source: &mut S, offset: usize) {
    match SourceContext::locate(source, offset) {
        Ok(ctx) => {
            eprintln!("{prefix} at line {}, column {}", ctx.line, ctx.column);
            eprintln!("  {}", ctx.snippet);
            eprintln!("  {}{}", " ".repeat(ctx.caret), styled("^", Style::new().fg(Mocha::PEACH)));
        }
        Err(_) => eprintln!("{prefix} at byte {offset}"),
    }
}

/// Where a byte offset sits in the source, plus a short excerpt of its line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContext {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
    /// The part of the line within [`WINDOW_BYTES`] of the offset.
    pub snippet: String,
    /// Character position of the offset within `snippet`.
    pub caret: usize,
}

impl SourceContext {
    /// Scan `source` from its start up to `offset` in fixed-size chunks, then
    /// read back only the excerpt window. Offsets past the end are clamped.
    pub fn locate<S: Read + Seek>(source: &mut S, offset: usize) -> io::Result<Self> {
        source.seek(SeekFrom::Start(0))?;

        let mut line = 1;
        let mut column = 1;
        let mut line_start = 0usize;
        let mut pos = 0usize;
        let mut buf = [0u8; SCAN_CHUNK];
        while pos < offset {
            let want = (offset - pos).min(SCAN_CHUNK);
            let n = match source.read(&mut buf[..want]) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            for (i, &b) in buf[..n].iter().enumerate() {
                if b == b'\n' {
                    line += 1;
                    column = 1;
                    line_start = pos + i + 1;
                } else if !is_continuation(b) {
                    column += 1;
                }
            }
            pos += n;
        }
        let offset = pos;

        let start = line_start.max(offset.saturating_sub(WINDOW_BYTES));
        source.seek(SeekFrom::Start(start as u64))?;
        let mut window = Vec::with_capacity(2 * WINDOW_BYTES + 1);
        source
            .take((offset - start + WINDOW_BYTES + 1) as u64)
            .read_to_end(&mut window)?;
        let before = offset - start;
        if let Some(nl) = window[before.min(window.len())..].iter().position(|b| *b == b'\n') {
            window.truncate(before + nl);
        }

        // Control characters would shift the caret, so blank them out.
        let printable = |c: char| if c.is_control() { ' ' } else { c };
        let snippet = String::from_utf8_lossy(&window).chars().map(printable).collect();
        let caret = String::from_utf8_lossy(&window[..before.min(window.len())]).chars().count();

        Ok(Self { line, column, snippet, caret })
    }
}

fn is_continuation(b: u8) -> bool {
    b & 0xC0 == 0x80
}

fn label(text: &str) -> String {
    styled(text, Style::new().bold().fg(Mocha::RED))
}

/// Apply `style` only when stderr is a terminal.
fn styled(text: &str, style: Style) -> String {
    if io::stderr().is_terminal() {
        style.paint(text).to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn locate(source: &[u8], offset: usize) -> SourceContext {
        SourceContext::locate(&mut Cursor::new(source), offset).unwrap()
    }

    #[test]
    fn line_and_column_count_from_one() {
        let source = b"+++\n>>[\n";
        assert_eq!((locate(source, 0).line, locate(source, 0).column), (1, 1));
        assert_eq!((locate(source, 2).line, locate(source, 2).column), (1, 3));
        assert_eq!((locate(source, 6).line, locate(source, 6).column), (2, 3));
    }

    #[test]
    fn column_counts_characters_not_bytes() {
        let ctx = locate("é]".as_bytes(), 2);
        assert_eq!((ctx.line, ctx.column), (1, 2));
        assert_eq!(ctx.caret, 1);
    }

    #[test]
    fn excerpt_stays_on_the_offending_line() {
        let ctx = locate(b"first line\nsecond ] line\nthird", 18);
        assert_eq!(ctx.snippet, "second ] line");
        assert_eq!(ctx.caret, 7);
    }

    #[test]
    fn excerpt_is_windowed_on_long_lines() {
        let mut source = vec![b'+'; 100];
        source[60] = b']';
        let ctx = locate(&source, 60);
        assert_eq!(ctx.snippet.len(), 2 * WINDOW_BYTES + 1);
        assert_eq!(ctx.caret, WINDOW_BYTES);
        assert_eq!(ctx.snippet.as_bytes()[ctx.caret], b']');
        assert_eq!(ctx.column, 61);
    }

    #[test]
    fn excerpt_blanks_tabs() {
        let ctx = locate(b"\t<", 1);
        assert_eq!(ctx.snippet, " <");
        assert_eq!(ctx.caret, 1);
    }

    #[test]
    fn location_is_found_past_the_first_scan_chunk() {
        let mut source = b"# comment\n".repeat(SCAN_CHUNK);
        source.extend_from_slice(b"  <");
        let offset = source.len() - 1;
        let ctx = locate(&source, offset);
        assert_eq!((ctx.line, ctx.column), (SCAN_CHUNK + 1, 3));
        assert_eq!(ctx.snippet, "  <");
        assert_eq!(ctx.caret, 2);
    }

    #[test]
    fn offset_past_the_end_is_clamped() {
        let ctx = locate(b"+[", 10);
        assert_eq!((ctx.line, ctx.column), (1, 3));
        assert_eq!(ctx.caret, 2);
    }

    #[test]
    fn canceled_runs_exit_with_130() {
        assert_eq!(exit_code(&EvalError::Canceled), EXIT_INTERRUPTED);
        assert_eq!(exit_code(&EvalError::Canceled), 130);
        assert_eq!(exit_code(&EvalError::StepLimitExceeded { limit: 5 }), EXIT_FAILURE);
        let oob = EvalError::OutOfBounds { ip: 0, ptr: 0, op: crate::Instruction::MoveLeft };
        assert_eq!(exit_code(&oob), EXIT_FAILURE);
    }
}
