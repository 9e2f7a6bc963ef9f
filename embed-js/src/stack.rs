use std::fmt::Display;

/// A single frame of an engine stack trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
  pub function: Option<String>,
  /// Source name as passed to the engine, or `native` for builtins.
  pub source: String,
  pub line: Option<u32>,
  pub col: Option<u32>,
}

impl StackFrame {
  fn parse(line: &str) -> Option<StackFrame> {
    let rest = line.trim().strip_prefix("at ")?;
    let (function, location) = match rest.strip_suffix(')').and_then(|r| r.split_once(" (")) {
      Some((function, location)) => (Some(function.to_string()), location),
      None => (None, rest),
    };
    if location.is_empty() {
      return None;
    }

    let (source, first) = split_number(location);
    let (source, line, col) = match first {
      Some(last) => match split_number(source) {
        (source, Some(line)) => (source, Some(line), Some(last)),
        (source, None) => (source, Some(last), None),
      },
      None => (source, None, None),
    };

    Some(StackFrame {
      function,
      source: source.to_string(),
      line,
      col,
    })
  }

  fn fmt_location(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.source)?;
    if let Some(line) = self.line {
      write!(f, ":{line}")?;
      if let Some(col) = self.col {
        write!(f, ":{col}")?;
      }
    }
    Ok(())
  }
}

// Splits a trailing `:<digits>` off `text`.
fn split_number(text: &str) -> (&str, Option<u32>) {
  match text.rsplit_once(':') {
    Some((head, tail)) if !head.is_empty() => match tail.parse::<u32>() {
      Ok(n) => (head, Some(n)),
      Err(_) => (text, None),
    },
    _ => (text, None),
  }
}

impl Display for StackFrame {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match &self.function {
      Some(function) => {
        write!(f, "at {function} (")?;
        self.fmt_location(f)?;
        f.write_str(")")
      }
      None => {
        f.write_str("at ")?;
        self.fmt_location(f)
      }
    }
  }
}

/// Parse engine stack trace text into frames. Lines that are not frames are skipped.
pub fn parse_stack_trace(stack: &str) -> Vec<StackFrame> {
  stack.lines().filter_map(StackFrame::parse).collect()
}

/// Format stack frames into a stable stack trace string.
pub fn format_stack_trace(frames: &[StackFrame]) -> String {
  frames
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn frame(
    function: Option<&str>,
    source: &str,
    line: Option<u32>,
    col: Option<u32>,
  ) -> StackFrame {
    StackFrame {
      function: function.map(str::to_string),
      source: source.to_string(),
      line,
      col,
    }
  }

  #[test]
  fn parses_engine_frames() {
    let stack = concat!(
      "    at thrower (lib.js:3:11)\n",
      "    at <eval> (main.js:7:1)\n",
      "    at JSON.parse (native)\n",
    );
    assert_eq!(parse_stack_trace(stack), vec![
      frame(Some("thrower"), "lib.js", Some(3), Some(11)),
      frame(Some("<eval>"), "main.js", Some(7), Some(1)),
      frame(Some("JSON.parse"), "native", None, None),
    ]);
  }

  #[test]
  fn parses_anonymous_and_line_only_frames() {
    assert_eq!(parse_stack_trace("at script.js:4:2"), vec![frame(
      None,
      "script.js",
      Some(4),
      Some(2)
    )]);
    assert_eq!(parse_stack_trace("at f (script.js:4)"), vec![frame(
      Some("f"),
      "script.js",
      Some(4),
      None
    )]);
  }

  #[test]
  fn source_names_may_contain_colons() {
    assert_eq!(parse_stack_trace("at f (file:///a/b.js:10:5)"), vec![frame(
      Some("f"),
      "file:///a/b.js",
      Some(10),
      Some(5)
    )]);
  }

  #[test]
  fn skips_non_frame_lines() {
    assert!(parse_stack_trace("TypeError: nope\n\n  something else").is_empty());
  }

  #[test]
  fn formatting_is_stable() {
    let frames = vec![
      frame(Some("f"), "a.js", Some(1), Some(2)),
      frame(None, "b.js", Some(3), None),
      frame(Some("g"), "native", None, None),
    ];
    let text = format_stack_trace(&frames);
    assert_eq!(text, "at f (a.js:1:2)\nat b.js:3\nat g (native)");
    assert_eq!(parse_stack_trace(&text), frames);
  }
}
