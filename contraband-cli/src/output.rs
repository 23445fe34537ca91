//! Report rendering on stdout
//!
//! Reports go to stdout and logs go to stderr, so `--output json` stays
//! machine-readable. Each payload is `Serialize` for JSON and [`Render`] for text.

use std::io::{self, Write};

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Writes command payloads in the format selected by `--output`.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a payload to locked stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        self.render_to(payload, io::stdout().lock())
    }

    /// Render a payload to `out`. JSON is pretty-printed and newline-terminated.
    pub fn render_to<T, W>(&self, payload: &T, mut out: W) -> Result<(), CliError>
    where
        T: Render + Serialize,
        W: Write,
    {
        match self.format {
            OutputFormat::Text => payload.render_text(&mut out)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut out, payload)?;
                writeln!(out)?;
            }
        }
        out.flush()?;
        Ok(())
    }
}

/// Human-readable rendering of a report.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> io::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Finding {
        check: String,
        location: String,
        matched: Vec<String>,
    }

    impl Render for Finding {
        fn render_text(&self, w: &mut dyn Write) -> io::Result<()> {
            writeln!(w, "[{}] {}", self.check, self.location)?;
            writeln!(w, "matched: {}", self.matched.join(", "))
        }
    }

    fn finding() -> Finding {
        Finding {
            check: "credentials".to_owned(),
            location: "release/비밀.txt".to_owned(),
            matched: vec!["password".to_owned(), "api_key".to_owned()],
        }
    }

    fn rendered(format: OutputFormat) -> String {
        let mut buffer = Vec::new();
        OutputWriter::new(format)
            .render_to(&finding(), &mut buffer)
            .expect("rendering should succeed");
        String::from_utf8(buffer).expect("valid UTF-8")
    }

    #[test]
    fn test_text_format_uses_render_impl() {
        let output = rendered(OutputFormat::Text);
        assert_eq!(
            output,
            "[credentials] release/비밀.txt\nmatched: password, api_key\n"
        );
    }

    #[test]
    fn test_json_format_is_pretty_and_newline_terminated() {
        let output = rendered(OutputFormat::Json);
        assert!(output.ends_with("}\n"));
        assert!(output.lines().count() > 1, "pretty JSON spans lines");
        let parsed: serde_json::Value = serde_json::from_str(&output).expect("valid JSON");
        assert_eq!(parsed["check"], "credentials");
        assert_eq!(parsed["location"], "release/비밀.txt");
        assert_eq!(parsed["matched"][1], "api_key");
    }
}
