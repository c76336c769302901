//! Line-oriented decoding of esbuild's watch-mode output into events.

use super::events::{BuildEvent, Location, Problem, WatchEvent};
use crate::bundler::error::MalformedEventError;
use serde::Deserialize;

/// Framing of the watch-mode event stream.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EventFormat {
    /// esbuild's native log on stderr: `[watch] build started`, `✘ [ERROR]`
    /// blocks with a location line, `[watch] build finished`
    #[default]
    Log,
    /// One JSON build result per stdout line:
    /// `{"errors":[{"text":..,"location":{..}}],"warnings":[..]}`
    JsonLines,
}

impl EventFormat {
    /// Whether events arrive on stdout (otherwise stderr).
    pub fn reads_stdout(self) -> bool {
        matches!(self, Self::JsonLines)
    }
}

/// Problems collected since the last `build started`.
#[derive(Default)]
struct Cycle {
    errors: Vec<Problem>,
    warnings: Vec<Problem>,
    /// Whether the last problem went to `warnings`
    last_is_warning: bool,
}

impl Cycle {
    fn last_problem(&mut self) -> Option<&mut Problem> {
        if self.last_is_warning {
            self.warnings.last_mut()
        } else {
            self.errors.last_mut()
        }
    }
}

/// Stateful decoder fed one line at a time.
pub struct EventDecoder {
    format: EventFormat,
    cycle: Cycle,
}

const WATCH_STARTED: &str = "[watch] build started";
const WATCH_FINISHED: &str = "[watch] build finished";
const ERROR_MARKER: &str = "[ERROR] ";
const WARNING_MARKER: &str = "[WARNING] ";

impl EventDecoder {
    /// Creates a decoder for `format`.
    pub fn new(format: EventFormat) -> Self {
        Self {
            format,
            cycle: Cycle::default(),
        }
    }

    /// Consumes one line (without its terminator); returns an event when the
    /// line completes one.
    pub fn decode_line(&mut self, line: &str) -> Option<WatchEvent> {
        match self.format {
            EventFormat::Log => self.decode_log_line(line),
            EventFormat::JsonLines => decode_json_line(line),
        }
    }

    fn decode_log_line(&mut self, line: &str) -> Option<WatchEvent> {
        let trimmed = line.trim();

        if trimmed.starts_with(WATCH_STARTED) {
            self.cycle = Cycle::default();
            return None;
        }
        if trimmed.starts_with(WATCH_FINISHED) {
            let cycle = std::mem::take(&mut self.cycle);
            return Some(WatchEvent::Build(BuildEvent::from_problems(
                cycle.errors,
                cycle.warnings,
            )));
        }
        if let Some(message) = marker_text(trimmed, ERROR_MARKER) {
            self.cycle.errors.push(Problem::new(message));
            self.cycle.last_is_warning = false;
            return None;
        }
        if let Some(message) = marker_text(trimmed, WARNING_MARKER) {
            self.cycle.warnings.push(Problem::new(message));
            self.cycle.last_is_warning = true;
            return None;
        }
        if let Some(location) = parse_location(trimmed) {
            if let Some(problem) = self.cycle.last_problem() {
                if problem.location.is_none() {
                    problem.location = Some(location);
                }
            }
        }
        None
    }
}

/// Text after a `✘ [ERROR] ` / `▲ [WARNING] ` style marker.
fn marker_text<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let index = line.find(marker)?;
    // Only a one-character icon (✘, ▲, X) may precede the marker
    if line[..index].trim().chars().count() > 1 {
        return None;
    }
    Some(line[index + marker.len()..].trim())
}

/// Parses `file:line:column:`.
fn parse_location(line: &str) -> Option<Location> {
    let body = line.strip_suffix(':')?;
    let mut parts = body.rsplitn(3, ':');
    let column = parts.next()?.parse().ok()?;
    let line_no = parts.next()?.parse().ok()?;
    let file = parts.next().filter(|f| !f.is_empty())?;
    Some(Location {
        file: file.to_string(),
        line: line_no,
        column,
    })
}

#[derive(Deserialize)]
struct JsonBuildResult {
    #[serde(default)]
    errors: Vec<Problem>,
    #[serde(default)]
    warnings: Vec<Problem>,
}

fn decode_json_line(line: &str) -> Option<WatchEvent> {
    let payload = line.trim();
    if payload.is_empty() {
        return None;
    }

    let malformed = |reason: String| {
        Some(WatchEvent::Malformed(MalformedEventError {
            payload: payload.to_string(),
            reason,
        }))
    };

    let value: serde_json::Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => return malformed(e.to_string()),
    };
    if !value.is_object() {
        return malformed("expected a JSON object".to_string());
    }

    match serde_json::from_value::<JsonBuildResult>(value) {
        Ok(result) => Some(WatchEvent::Build(BuildEvent::from_problems(
            result.errors,
            result.warnings,
        ))),
        Err(e) => malformed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::process::BuildOutcome;

    fn decode_all(format: EventFormat, text: &str) -> Vec<WatchEvent> {
        let mut decoder = EventDecoder::new(format);
        text.lines().filter_map(|l| decoder.decode_line(l)).collect()
    }

    #[test]
    fn log_cycle_with_located_errors() {
        let events = decode_all(
            EventFormat::Log,
            r#"[watch] build started (change: "src/index.js")
✘ [ERROR] Could not resolve "missing"

    src/index.js:1:7:
      1 │ import "missing";
        ╵        ~~~~~~~~~

✘ [ERROR] Expected ";" but found "}"

    src/util.js:4:2:
      4 │ }}
        ╵  ^

2 errors
[watch] build finished
"#,
        );

        assert_eq!(events.len(), 1);
        let WatchEvent::Build(event) = &events[0] else {
            panic!("expected a build event");
        };
        let problems = event.problems();
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].message, r#"Could not resolve "missing""#);
        assert_eq!(
            problems[0].location,
            Some(Location {
                file: "src/index.js".into(),
                line: 1,
                column: 7
            })
        );
        assert_eq!(problems[1].location.as_ref().unwrap().file, "src/util.js");
    }

    #[test]
    fn initial_build_without_started_line_is_reported() {
        let events = decode_all(
            EventFormat::Log,
            "[watch] build finished, watching for changes...\n",
        );
        assert_eq!(
            events,
            vec![WatchEvent::Build(BuildEvent {
                outcome: BuildOutcome::Success,
                warnings: vec![],
            })]
        );
    }

    #[test]
    fn warnings_do_not_fail_the_build() {
        let events = decode_all(
            EventFormat::Log,
            "▲ [WARNING] Duplicate key \"a\"\n\n    src/a.js:2:3:\n[watch] build finished\n",
        );
        let WatchEvent::Build(event) = &events[0] else {
            panic!("expected a build event");
        };
        assert!(event.is_success());
        assert_eq!(event.warnings.len(), 1);
        assert_eq!(event.warnings[0].location.as_ref().unwrap().line, 2);
    }

    #[test]
    fn started_line_discards_stale_problems() {
        let events = decode_all(
            EventFormat::Log,
            "✘ [ERROR] stale\n[watch] build started\n[watch] build finished\n",
        );
        let WatchEvent::Build(event) = &events[0] else {
            panic!("expected a build event");
        };
        assert!(event.is_success());
    }

    #[test]
    fn json_lines_success_and_failure() {
        let events = decode_all(
            EventFormat::JsonLines,
            r#"{"errors":[],"warnings":[]}

{"errors":[{"text":"boom","location":{"file":"a.js","line":3,"column":1}}]}
{}
"#,
        );
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], WatchEvent::Build(e) if e.is_success()));
        assert!(matches!(&events[1], WatchEvent::Build(e) if e.problems()[0].message == "boom"));
        assert!(matches!(&events[2], WatchEvent::Build(e) if e.is_success()));
    }

    #[test]
    fn json_lines_garbage_is_malformed() {
        let events = decode_all(EventFormat::JsonLines, "not json\n[1,2]\n{\"errors\":5}\n");
        assert_eq!(events.len(), 3);
        for event in &events {
            assert!(matches!(event, WatchEvent::Malformed(_)));
        }
        let WatchEvent::Malformed(err) = &events[0] else {
            unreachable!()
        };
        assert_eq!(err.payload, "not json");
    }

    #[test]
    fn location_parsing_handles_windows_drive_letters() {
        let location = parse_location(r"C:\work\src\a.js:10:4:").unwrap();
        assert_eq!(location.file, r"C:\work\src\a.js");
        assert_eq!(location.line, 10);
        assert_eq!(location.column, 4);
        assert!(parse_location("1 │ import x").is_none());
        assert!(parse_location("2 errors").is_none());
    }
}
