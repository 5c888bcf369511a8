use std::env::args_os;
use std::ffi::OsString;
use std::fs::read_to_string;
use std::io::{Read, stdin};
use std::panic::{AssertUnwindSafe, catch_unwind, set_hook};
use std::path::{Path, PathBuf};

use clap::Parser;
use clap::error::ErrorKind;
use clap_verbosity_flag::{OffLevel, Verbosity};
use log::debug;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use toydist::{Error, Problem, Solution, parse, report};

/// Print the maximum number of children whose toy request can be satisfied, or -1.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Read the problem from a file instead of stdin (.yaml/.yml for YAML)
    #[arg(short, long)]
    input: Option<PathBuf>,

    #[command(flatten)]
    verbose: Verbosity<OffLevel>,
}

fn main() {
    let Some(cli) = parse_cli(args_os()) else {
        println!("-1");
        return;
    };

    if let Some(level) = cli.verbose.log_level() {
        let log_config = ConfigBuilder::new().build();
        // stdout carries only the answer
        let _ = TermLogger::init(
            level.to_level_filter(),
            log_config,
            TerminalMode::Stderr,
            ColorChoice::Auto,
        );
    }
    debug!("cli={cli:?}");

    // A panic anywhere in the pipeline is just another failed run
    set_hook(Box::new(|info| debug!("panic: {info}")));
    let result = guarded(|| run(cli.input.as_deref()));

    println!("{}", report(result));
}

/// `None` when the arguments are unusable; help and version requests exit as usual.
fn parse_cli<I, T>(args: I) -> Option<Cli>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Some(cli),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(_) => None,
    }
}

fn guarded(pipeline: impl FnOnce() -> Result<Solution, Error>) -> Result<Solution, Error> {
    catch_unwind(AssertUnwindSafe(pipeline)).unwrap_or(Err(Error::Panicked))
}

fn run(input: Option<&Path>) -> Result<Solution, Error> {
    let problem = match input {
        Some(path) if is_yaml(path) => serde_yaml::from_str::<Problem>(&read_to_string(path)?)?,
        Some(path) => parse(&read_to_string(path)?)?,
        None => {
            let mut buf = String::new();
            stdin().read_to_string(&mut buf)?;
            parse(&buf)?
        }
    };
    problem.solve()
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == "yaml" || ext == "yml")
        .unwrap_or(false)
}
