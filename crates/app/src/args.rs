use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    EmptyValue { flag: &'static str },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::EmptyValue { flag } => write!(f, "{flag} cannot be empty"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Solve,
    Ping,
    Help,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "solve" => Some(Self::Solve),
            "ping" => Some(Self::Ping),
            "help" | "--help" | "-h" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Parsed command line. Overrides are left raw so config parsing reports them.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Args {
    pub text: Option<String>,
    pub image: Option<PathBuf>,
    pub api_url: Option<String>,
    pub max_attempts: Option<String>,
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  math-tutor solve [--text <problem> | --image <path>] [--api <url>] [--max-attempts <n>]");
    eprintln!("  math-tutor ping  [--api <url>]");
    eprintln!();
    eprintln!("While solving:");
    eprintln!("  <answer>          submit a text answer");
    eprintln!("  :image <path>     submit a photo of your work");
    eprintln!("  :hint             show or hide the hint");
    eprintln!("  :quit             leave the session");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TUTOR_API_BASE_URL, TUTOR_MAX_ATTEMPTS, RUST_LOG");
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    let value = args.next().ok_or(ArgsError::MissingValue { flag })?;
    if value.trim().is_empty() {
        return Err(ArgsError::EmptyValue { flag });
    }
    Ok(value)
}

/// Parse `argv` (without the program name). No subcommand means `solve`.
pub fn parse(argv: Vec<String>) -> Result<(Command, Args), ArgsError> {
    let mut iter = argv.into_iter().peekable();
    let cmd = match iter.peek().map(String::as_str) {
        None => Command::Solve,
        Some(first) if first.starts_with("--") && first != "--help" => Command::Solve,
        Some(first) => {
            let cmd = Command::from_arg(first)
                .ok_or_else(|| ArgsError::UnknownCommand(first.to_string()))?;
            iter.next();
            cmd
        }
    };

    let mut args = Args::default();
    while let Some(arg) = iter.next() {
        match (cmd, arg.as_str()) {
            (_, "--api") => args.api_url = Some(require_value(&mut iter, "--api")?),
            (Command::Solve, "--text") => args.text = Some(require_value(&mut iter, "--text")?),
            (Command::Solve, "--image") => {
                args.image = Some(PathBuf::from(require_value(&mut iter, "--image")?));
            }
            (Command::Solve, "--max-attempts") => {
                args.max_attempts = Some(require_value(&mut iter, "--max-attempts")?);
            }
            (_, "--help" | "-h") => return Ok((Command::Help, args)),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok((cmd, args))
}
