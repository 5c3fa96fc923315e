//! Top-level functions of the `rv` namespace.
//!
//! A [`Script`] is what a script sees as `rv`: its `main` and `sidebar`
//! handles plus the helpers here, which are not handle methods.

use std::borrow::Cow;

use rivulet_api::DataFrame;

use crate::error::DeltaError;
use crate::generator::DeltaGenerator;
use crate::runner::Script;

/// Message shown by [`Script::spinner`] when none is given.
pub const DEFAULT_SPINNER_TEXT: &str = "In progress...";

/// How one argument of [`Script::write`] is drawn.
pub enum WriteArg<'a> {
    /// Markdown, joined with neighboring text into one element.
    Markdown(Cow<'a, str>),
    Frame(&'a DataFrame),
    Json(&'a serde_json::Value),
    Error(&'a DeltaError),
}

/// A value [`Script::write`] knows how to draw.
pub trait Writable {
    fn write_arg(&self) -> WriteArg<'_>;
}

impl Writable for &str {
    fn write_arg(&self) -> WriteArg<'_> {
        WriteArg::Markdown(Cow::Borrowed(self))
    }
}

impl Writable for String {
    fn write_arg(&self) -> WriteArg<'_> {
        WriteArg::Markdown(Cow::Borrowed(self))
    }
}

impl Writable for DataFrame {
    fn write_arg(&self) -> WriteArg<'_> {
        WriteArg::Frame(self)
    }
}

impl Writable for serde_json::Value {
    fn write_arg(&self) -> WriteArg<'_> {
        WriteArg::Json(self)
    }
}

impl Writable for DeltaError {
    fn write_arg(&self) -> WriteArg<'_> {
        WriteArg::Error(self)
    }
}

// Anything else is shown inline as code.
macro_rules! writable_as_code {
    ($($ty:ty),+) => {
        $(impl Writable for $ty {
            fn write_arg(&self) -> WriteArg<'_> {
                WriteArg::Markdown(Cow::Owned(format!("`{}`", self)))
            }
        })+
    };
}

writable_as_code!(bool, i32, i64, u32, u64, f32, f64);

impl Script {
    /// Draw each argument in the main stream according to its kind.
    ///
    /// Consecutive text arguments are joined with spaces into a single
    /// markdown element; frames, JSON values and errors each get their own.
    pub fn write(&mut self, args: &[&dyn Writable]) -> Result<(), DeltaError> {
        let mut text: Vec<Cow<'_, str>> = Vec::new();

        for &arg in args {
            match arg.write_arg() {
                WriteArg::Markdown(s) => text.push(s),
                WriteArg::Frame(df) => {
                    flush_markdown(&mut self.main, &mut text);
                    self.main.dataframe(df.clone(), None, None);
                }
                WriteArg::Json(value) => {
                    flush_markdown(&mut self.main, &mut text);
                    self.main.json(value)?;
                }
                WriteArg::Error(err) => {
                    flush_markdown(&mut self.main, &mut text);
                    self.main.exception(err);
                }
            }
        }
        flush_markdown(&mut self.main, &mut text);
        Ok(())
    }

    /// Show `text` as a warning while `block` runs, then remove it.
    ///
    /// The message occupies one slot ahead of whatever `block` writes. A
    /// block that finishes before the next delivery never shows it, since
    /// the cleared slot replaces the message in the queue.
    pub fn spinner<R>(&mut self, text: &str, block: impl FnOnce(&mut Script) -> R) -> R {
        let mut message = self.main.empty();
        message.warning(text);
        let result = block(self);
        message.empty();
        result
    }

    /// Run `block`, then show `source` as a code block above its output.
    ///
    /// Usually called through [`echo!`](crate::echo), which passes the
    /// block's own source text.
    pub fn echo<R>(&mut self, source: &str, block: impl FnOnce(&mut Script) -> R) -> R {
        let mut code = self.main.empty();
        let result = block(self);
        code.code(strip_braces(source), "rust");
        result
    }
}

fn flush_markdown(main: &mut DeltaGenerator, text: &mut Vec<Cow<'_, str>>) {
    if text.is_empty() {
        return;
    }
    main.markdown(&text.join(" "), false);
    text.clear();
}

fn strip_braces(source: &str) -> &str {
    let trimmed = source.trim();
    trimmed
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .map(str::trim)
        .unwrap_or(trimmed)
}

/// Run a block against a [`Script`] and show the block's source above its
/// output.
///
/// ```ignore
/// echo!(rv, |rv| {
///     rv.main.text("this line is shown, then run");
/// });
/// ```
#[macro_export]
macro_rules! echo {
    ($script:expr, |$rv:ident| $body:block) => {
        $script.echo(stringify!($body), |$rv: &mut $crate::Script| $body)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use crate::report::Report;
    use crate::runner::ScriptRunner;
    use crate::widgets::Widgets;
    use rivulet_api::{Element, ForwardMsg, Text, TextFormat};
    use std::sync::Arc;

    fn runner() -> ScriptRunner {
        let report = Arc::new(Report::new("app.rs", Vec::new(), ReportConfig::default()));
        ScriptRunner::new(report, Arc::new(Widgets::new()))
    }

    /// Elements of the last run, in master queue order.
    fn elements(runner: &ScriptRunner) -> Vec<(u32, Element)> {
        runner
            .report()
            .master_messages()
            .iter()
            .filter_map(|m: &ForwardMsg| {
                m.new_element()
                    .map(|e| (m.metadata.delta_id, e.clone()))
            })
            .collect()
    }

    fn markdown(body: &str) -> Element {
        Element::Text(Text {
            body: body.into(),
            format: TextFormat::Markdown,
            allow_html: false,
        })
    }

    #[test]
    fn write_joins_text_and_dispatches_the_rest() {
        let mut runner = runner();
        let frame = DataFrame::new(["a"]).with_row([1]);
        let doc = serde_json::json!({"k": 1});
        runner
            .run(|rv| {
                rv.write(&[&"1 + 1 =", &2_i64, &frame, &doc, &"done"])
            })
            .expect("run");

        let elements = elements(&runner);
        assert_eq!(elements.len(), 4);
        assert_eq!(elements[0].1, markdown("1 + 1 = `2`"));
        assert_eq!(elements[1].1, Element::DataFrame(frame));
        match &elements[2].1 {
            Element::Text(text) => {
                assert_eq!(text.format, TextFormat::Json);
                assert_eq!(text.body, r#"{"k":1}"#);
            }
            other => panic!("expected json text, got {other:?}"),
        }
        assert_eq!(elements[3].1, markdown("done"));
    }

    #[test]
    fn write_shows_errors_as_exceptions() {
        let mut runner = runner();
        let err = DeltaError::Usage("bad call".into());
        runner.run(|rv| rv.write(&[&err])).expect("run");

        match &elements(&runner)[0].1 {
            Element::Exception(info) => assert_eq!(info.type_name, err.type_name()),
            other => panic!("expected exception, got {other:?}"),
        }
    }

    #[test]
    fn spinner_slot_is_cleared_after_block() {
        let mut runner = runner();
        runner
            .run(|rv| {
                let n = rv.spinner(DEFAULT_SPINNER_TEXT, |rv| {
                    rv.main.text("work");
                    7
                });
                assert_eq!(n, 7);
                Ok(())
            })
            .expect("run");

        let elements = elements(&runner);
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0], (0, Element::Empty));
        assert_eq!(elements[1].0, 1);
    }

    #[test]
    fn spinner_message_is_visible_while_block_runs() {
        let mut runner = runner();
        let report = runner.report().clone();
        runner
            .run(|rv| {
                rv.spinner("Wait for it...", |_| {
                    let shown = report
                        .flush_browser_queue()
                        .iter()
                        .filter_map(|m| m.new_element().cloned())
                        .any(|e| match e {
                            Element::Text(text) => {
                                text.format == TextFormat::Warning && text.body == "Wait for it..."
                            }
                            _ => false,
                        });
                    assert!(shown);
                });
                Ok(())
            })
            .expect("run");

        let after = report.flush_browser_queue();
        assert!(after.iter().any(|m| m.new_element() == Some(&Element::Empty)));
    }

    #[test]
    fn echo_shows_source_above_output() {
        let mut runner = runner();
        runner
            .run(|rv| {
                crate::echo!(rv, |rv| {
                    rv.main.text("hi");
                });
                Ok(())
            })
            .expect("run");

        let elements = elements(&runner);
        assert_eq!(elements.len(), 2);
        match &elements[0] {
            (0, Element::Text(text)) => {
                assert_eq!(text.format, TextFormat::Markdown);
                assert!(text.body.starts_with("```rust\n"));
                assert!(text.body.contains("text"));
                assert!(text.body.contains("\"hi\""));
            }
            other => panic!("expected code block, got {other:?}"),
        }
        assert_eq!(elements[1].0, 1);
    }

    #[test]
    fn strip_braces_trims_block_delimiters() {
        assert_eq!(strip_braces("{ a(); b(); }"), "a(); b();");
        assert_eq!(strip_braces("  plain  "), "plain");
    }
}
