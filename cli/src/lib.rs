use clap::{CommandFactory, Parser};
use color_print::cformat;
use mpasm::output::listing;
use mpasm::{Assembly, OutputLine, OutputLines};
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
pub struct Args {
    /// Write a listing to stdout
    #[clap(short, long, conflicts_with_all = ["hex", "debug"])]
    pub listing: bool,

    /// Write Intel hex to stdout
    #[clap(short = 'x', long, conflicts_with = "debug")]
    pub hex: bool,

    /// Show the listing around an address (decimal or 0x prefixed hex)
    #[clap(short, long, value_parser = parse_address)]
    pub debug: Option<usize>,

    /// Lines shown by --debug, header included
    #[clap(short = 'n', long, default_value_t = 40)]
    pub lines: usize,

    /// Force ANSI colours even when stdout is redirected
    #[clap(long)]
    pub ansi: bool,

    /// Keep repeated lines in listings
    #[clap(long)]
    pub no_collapse: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Listing,
    Hex,
    Debug(usize),
    Usage,
}

impl Args {
    fn mode(&self) -> Mode {
        match (self.listing, self.hex, self.debug) {
            (true, _, _) => Mode::Listing,
            (_, true, _) => Mode::Hex,
            (_, _, Some(address)) => Mode::Debug(address),
            _ => Mode::Usage,
        }
    }

    pub fn colours(&self) -> bool {
        self.ansi || io::stdout().is_terminal()
    }
}

fn parse_address(arg: &str) -> Result<usize, String> {
    let parsed = match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => arg.parse(),
    };
    parsed.map_err(|err| format!("invalid address `{}`: {}", arg, err))
}

// ----------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Assemble(#[from] mpasm::Error),

    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),
}

type Lines = Box<dyn Iterator<Item = mpasm::Result<OutputLine>>>;

fn resolved(asm: &Assembly, collapse: bool) -> Lines {
    let lines = asm.assemble();
    if collapse {
        Box::new(lines.collapse_repeats())
    } else {
        Box::new(lines)
    }
}

fn write_lines<W, I>(out: &mut W, lines: I) -> Result<(), Error>
where
    W: Write,
    I: IntoIterator<Item = mpasm::Result<String>>,
{
    for line in lines {
        writeln!(out, "{}", line?)?;
    }
    Ok(())
}

/// Builds the program and writes the output selected by `args`.
pub fn run<W, F>(args: &Args, build: F, out: &mut W) -> Result<(), Error>
where
    W: Write,
    F: FnOnce() -> mpasm::Result<Assembly>,
{
    render(args, build, args.colours(), out)
}

fn render<W, F>(args: &Args, build: F, ansi: bool, out: &mut W) -> Result<(), Error>
where
    W: Write,
    F: FnOnce() -> mpasm::Result<Assembly>,
{
    let mode = args.mode();
    if mode == Mode::Usage {
        writeln!(out, "{}", Args::command().render_help())?;
        return Ok(());
    }

    let asm = build()?;
    info!(
        bytes = asm.total_bytes(),
        lines = asm.lines().len(),
        ?mode,
        "program built"
    );

    let collapse = !args.no_collapse;
    match mode {
        Mode::Listing => write_lines(out, resolved(&asm, collapse).into_listing(ansi))?,
        Mode::Hex => write_lines(out, asm.assemble().into_intel_hex())?,
        Mode::Debug(address) => {
            let window = listing::debug_window(resolved(&asm, collapse), address, args.lines, ansi)?;
            write_lines(out, window.into_iter().map(Ok))?;
        }
        Mode::Usage => {}
    }
    out.flush()?;
    Ok(())
}

/// Logs go to stderr, filtered by `RUST_LOG` (default `warn`).
pub fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Entry point shared by program binaries.
pub fn main_with<F>(build: F) -> ExitCode
where
    F: FnOnce() -> mpasm::Result<Assembly>,
{
    init_logger();
    let args = Args::parse();
    let result = run(&args, build, &mut io::stdout().lock());
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", cformat!("<red,bold>error</>: {}", err));
            ExitCode::FAILURE
        }
    }
}
