use clap::Parser;
use embed_js::{Context, ContextOptions, Error, Value};
use std::fs::File;
use std::io::stdin;
use std::io::Read;
use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "embed-js", about = "Run JavaScript in an embedded engine")]
struct Cli {
  /// Script to run; omit for stdin. The engine rejects raw NUL characters; escape them as `\0`.
  #[arg(short, long)]
  input: Option<PathBuf>,

  /// Source name used in stack traces. Defaults to the input path or `<stdin>`.
  #[arg(short, long)]
  name: Option<String>,

  /// Run the script for its side effects only and print nothing.
  #[arg(long, conflicts_with = "call")]
  exec: bool,

  /// After running the script, call this global function and print its result.
  #[arg(long, value_name = "FN")]
  call: Option<String>,

  /// Argument for `--call`, as JSON. Repeat for more arguments.
  #[arg(long = "arg", value_name = "JSON", requires = "call", value_parser = parse_json)]
  args: Vec<serde_json::Value>,

  /// Interrupt the script after this many milliseconds.
  #[arg(long, value_name = "MS")]
  timeout_ms: Option<u64>,

  /// Engine heap limit in bytes.
  #[arg(long, value_name = "BYTES")]
  memory_limit: Option<usize>,

  /// Emit tracing spans as JSON to stderr.
  #[arg(long)]
  trace: bool,
}

fn parse_json(raw: &str) -> Result<serde_json::Value, String> {
  serde_json::from_str(raw).map_err(|err| format!("invalid JSON: {err}"))
}

fn init_tracing(enabled: bool) {
  if !enabled {
    return;
  }
  let _ = tracing_subscriber::fmt()
    .with_span_events(FmtSpan::CLOSE)
    .with_max_level(Level::DEBUG)
    .json()
    .with_ansi(false)
    .with_writer(std::io::stderr)
    .try_init();
}

fn exit_with_message(message: impl AsRef<str>) -> ! {
  eprintln!("{}", message.as_ref());
  process::exit(1);
}

fn exit_with_error(error: Error) -> ! {
  eprintln!("{error}");
  if let Some(stack) = error.as_js().and_then(|js| js.stack()) {
    eprintln!("{}", stack.trim_end());
  }
  process::exit(1);
}

fn read_source(input: Option<&PathBuf>) -> String {
  let mut raw = Vec::new();
  let mut reader: Box<dyn Read> = match input {
    Some(path) => match File::open(path) {
      Ok(file) => Box::new(file),
      Err(err) => exit_with_message(format!("failed to open {}: {err}", path.display())),
    },
    None => Box::new(stdin()),
  };
  if let Err(err) = reader.read_to_end(&mut raw) {
    exit_with_message(format!("failed to read input: {err}"));
  }
  match String::from_utf8(raw) {
    Ok(source) => source,
    Err(err) => exit_with_message(format!("input is not valid UTF-8: {err}")),
  }
}

fn run(cli: &Cli, ctx: &mut Context, source: &str, name: &str) -> embed_js::Result<Option<Value>> {
  if cli.exec {
    ctx.execute(source, name)?;
    return Ok(None);
  }
  match &cli.call {
    Some(function) => {
      ctx.execute(source, name)?;
      let args: Vec<Value> = cli.args.iter().cloned().map(Value::from).collect();
      ctx.call_property(function, &args).map(Some)
    }
    None => ctx.evaluate(source, name).map(Some),
  }
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.trace);

  let source = read_source(cli.input.as_ref());
  let name = cli.name.clone().unwrap_or_else(|| {
    cli
      .input
      .as_ref()
      .map(|p| p.to_string_lossy().into_owned())
      .unwrap_or_else(|| "<stdin>".to_string())
  });

  let options = ContextOptions {
    memory_limit: cli.memory_limit,
    ..ContextOptions::default()
  };
  let mut ctx = match Context::with_options(options) {
    Ok(ctx) => ctx,
    Err(err) => exit_with_error(err),
  };

  if let Some(timeout) = cli.timeout_ms {
    let handle = ctx.interrupt_handle();
    thread::spawn(move || {
      thread::sleep(Duration::from_millis(timeout));
      handle.interrupt();
    });
  }

  match run(&cli, &mut ctx, &source, &name) {
    Ok(Some(value)) => match serde_json::to_string(&value) {
      Ok(json) => println!("{json}"),
      Err(err) => exit_with_message(format!("failed to serialize result: {err}")),
    },
    Ok(None) => {}
    Err(err) => exit_with_error(err),
  }
}
