use clap::Parser;
use std::env;
use std::fs::File;
use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tapebf::cli_util::{exit_code, print_eval_error, print_parse_error, EXIT_FAILURE, EXIT_INTERRUPTED};
use tapebf::logging::init_logging;
use tapebf::{parse, Config, Evaluator, StepControl, Tape};
use tracing::{debug, warn};

const EXIT_USAGE: i32 = 2;

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} [OPTIONS] <PROGRAM>     # Run the Brainfuck program stored in the file PROGRAM

Options:
  --tape-cells <N>            Number of tape cells (default 30000)
  --max-program-len <N>       Maximum number of instructions (default 65536)
  --max-loop-depth <N>        Maximum loop nesting depth (default 512)
  --eof <BYTE>                Value stored by ',' once input is exhausted (default 255)
  --max-steps <N>             Abort after N executed instructions (default unlimited)
  --debug,   -d               Print a step-by-step table of operations instead of executing
  --verbose, -v               Log to stderr (-v debug, -vv trace; RUST_LOG overrides)
  --version, -V               Show version
  --help,    -h               Show this help

Configuration:
  Limits are read from $BF_CONFIG or bf.toml in the XDG config directory
  ([limits] tape_cells, max_program_len, max_loop_depth; [runtime] eof, max_steps),
  then from BF_TAPE_CELLS, BF_MAX_PROGRAM_LEN, BF_MAX_LOOP_DEPTH, BF_EOF and
  BF_MAX_STEPS, then from the flags above.

Notes:
- Every byte other than ><+-.,[] is a comment.
- Output (`.`) writes raw bytes to stdout; input (`,`) reads single bytes from stdin.
- Ctrl+c aborts a running program with exit code 130.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "bf", version, disable_help_flag = true)]
struct Cli {
    /// Path to the Brainfuck source file
    #[arg(value_name = "PROGRAM")]
    path: Option<PathBuf>,

    /// Number of tape cells
    #[arg(long = "tape-cells", value_name = "N")]
    tape_cells: Option<NonZeroUsize>,

    /// Maximum number of instructions
    #[arg(long = "max-program-len", value_name = "N")]
    max_program_len: Option<usize>,

    /// Maximum loop nesting depth
    #[arg(long = "max-loop-depth", value_name = "N")]
    max_loop_depth: Option<usize>,

    /// Value stored by ',' once input is exhausted
    #[arg(long = "eof", value_name = "BYTE")]
    eof: Option<u8>,

    /// Abort after N executed instructions
    #[arg(long = "max-steps", value_name = "N")]
    max_steps: Option<u64>,

    /// Print a step-by-step table of operations instead of executing
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Increase log verbosity
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,
}

impl Cli {
    /// File and environment configuration with command-line flags on top.
    fn config(&self) -> Config {
        let mut cfg = Config::load();
        if let Some(n) = self.tape_cells { cfg.limits.tape_cells = n; }
        if let Some(n) = self.max_program_len { cfg.limits.max_program_len = n; }
        if let Some(n) = self.max_loop_depth { cfg.limits.max_loop_depth = n; }
        if let Some(b) = self.eof { cfg.eof_byte = b; }
        if let Some(n) = self.max_steps { cfg.max_steps = Some(n); }
        cfg
    }
}

fn run(program: &str, cli: Cli) -> i32 {
    let Some(path) = cli.path.as_ref() else {
        eprintln!("{program}: missing required argument <PROGRAM>");
        usage_and_exit(program, EXIT_USAGE);
    };

    let config = cli.config();
    debug!(?config, "resolved configuration");

    let mut source = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("{program}: {} could not be opened: {e}", path.display());
            let _ = io::stderr().flush();
            return EXIT_FAILURE;
        }
    };

    // Read in chunks; diagnostics seek back into the file for their excerpt.
    let code = match parse(&mut source, &config.limits) {
        Ok(code) => code,
        Err(err) => {
            print_parse_error(program, &mut source, &err);
            return EXIT_FAILURE;
        }
    };

    // First ctrl+c asks the evaluator to stop; a second one exits right away.
    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        // stdout stays locked by the evaluator, so no flushing from here.
        if handler_flag.swap(true, Ordering::Relaxed) {
            std::process::exit(EXIT_INTERRUPTED);
        }
    }) {
        warn!("failed to set ctrl+c handler: {e}");
    }

    let evaluator = Evaluator::new()
        .with_eof_byte(config.eof_byte)
        .with_debug(cli.debug)
        .with_step_control(StepControl::new(config.max_steps, cancel));
    let mut tape = Tape::new(config.limits.tape_cells);
    let mut stdout = io::stdout().lock();
    let mut stdin = io::stdin().lock();

    match evaluator.run(&code, &mut tape, &mut stdout, &mut stdin) {
        Ok(report) => {
            debug!(steps = report.steps, "execution complete");
            0
        }
        Err(err) => {
            print_eval_error(program, &mut source, &code, &err);
            exit_code(&err)
        }
    }
}

fn main() {
    // We still pull the program name for help rendering consistency
    let program = env::args().next().unwrap_or_else(|| String::from("bf"));

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == clap::error::ErrorKind::DisplayVersion => e.exit(),
        Err(e) => {
            let reason = e.kind().as_str().unwrap_or("invalid arguments");
            eprintln!("{program}: {reason}");
            usage_and_exit(&program, EXIT_USAGE);
        }
    };

    if cli.help {
        usage_and_exit(&program, 0);
    }

    init_logging(cli.verbose);
    std::process::exit(run(&program, cli));
}
