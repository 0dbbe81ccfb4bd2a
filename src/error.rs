use std::fmt::Display;

use ariadne::{Config, IndexType, Label, Report, ReportKind, Source};
use strum::{EnumProperty, IntoStaticStr};

/// Everything that can go wrong while building, loading or saving a [`Grammar`](crate::Grammar).
///
/// Rejecting a string or producing fewer strings than requested are not errors,
/// those outcomes are carried by [`CykResult`](crate::CykResult) and the generator's output.
#[derive(Debug)]
pub enum GrammarError {
    /// A production line could not be understood.
    Format {
        /// 1-based position of the line in the list it came from, if known
        line_no: Option<usize>,
        line: String,
        reason: FormatFailure,
    },
    /// A persisted grammar lacks one of its required keys.
    MissingKey(&'static str),
    Json(serde_json::Error),
    Io(std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumProperty, IntoStaticStr)]
pub enum FormatFailure {
    #[strum(props(message = "expected `->` or `→` between the left and right side"))]
    MissingArrow,
    #[strum(props(message = "no symbol on the left side of the arrow"))]
    EmptyLeftSide,
    #[strum(props(message = "could not split the right side into symbols"))]
    UnlexableSymbol,
}

impl FormatFailure {
    pub fn message(self) -> &'static str {
        self.get_str("message").unwrap_or_default()
    }
}

impl GrammarError {
    pub(crate) fn format(line: &str, reason: FormatFailure) -> GrammarError {
        GrammarError::Format {
            line_no: None,
            line: line.to_owned(),
            reason,
        }
    }

    /// Attaches the position of the offending line, leaving other errors untouched.
    pub(crate) fn at_line(self, n: usize) -> GrammarError {
        match self {
            GrammarError::Format { line, reason, .. } => GrammarError::Format {
                line_no: Some(n),
                line,
                reason,
            },
            other => other,
        }
    }

    /// Renders a format error as an annotated snippet of the offending line.
    ///
    /// Returns `None` for errors that have no source text to point at.
    pub fn report(&self) -> Option<String> {
        let GrammarError::Format {
            line_no,
            line,
            reason,
        } = self
        else {
            return None;
        };
        if line.trim().is_empty() {
            return None;
        }
        let span = match reason {
            FormatFailure::EmptyLeftSide => 0..line.find(['-', '→']).unwrap_or(0).max(1),
            FormatFailure::MissingArrow | FormatFailure::UnlexableSymbol => 0..line.len(),
        };
        let name: &str = reason.into();
        let title = match line_no {
            Some(n) => format!("malformed production on line {n}"),
            None => "malformed production".to_owned(),
        };

        let mut out = Vec::new();
        Report::build(ReportKind::Error, span.clone())
            .with_config(
                Config::default()
                    .with_color(false)
                    .with_index_type(IndexType::Byte),
            )
            .with_code(name)
            .with_message(title)
            .with_label(Label::new(span).with_message(reason.message()))
            .finish()
            .write(Source::from(line.as_str()), &mut out)
            .ok()?;
        String::from_utf8(out).ok()
    }
}

impl Display for GrammarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrammarError::Format {
                line_no: Some(n),
                line,
                reason,
            } => write!(f, "line {n}: `{line}`: {}", reason.message()),
            GrammarError::Format {
                line_no: None,
                line,
                reason,
            } => write!(f, "`{line}`: {}", reason.message()),
            GrammarError::MissingKey(key) => write!(f, "grammar record has no `{key}` entry"),
            GrammarError::Json(e) => write!(f, "invalid grammar JSON: {e}"),
            GrammarError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for GrammarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GrammarError::Json(e) => Some(e),
            GrammarError::Io(e) => Some(e),
            GrammarError::Format { .. } | GrammarError::MissingKey(_) => None,
        }
    }
}

impl From<serde_json::Error> for GrammarError {
    fn from(value: serde_json::Error) -> Self {
        GrammarError::Json(value)
    }
}

impl From<std::io::Error> for GrammarError {
    fn from(value: std::io::Error) -> Self {
        GrammarError::Io(value)
    }
}

#[cfg(test)]
mod test {
    use super::{FormatFailure, GrammarError};

    #[test]
    fn display_names_the_line() {
        let err = GrammarError::format("S a b", FormatFailure::MissingArrow).at_line(3);
        assert_eq!(
            err.to_string(),
            "line 3: `S a b`: expected `->` or `→` between the left and right side"
        );
    }

    #[test]
    fn at_line_leaves_other_errors_alone() {
        let err = GrammarError::MissingKey("N").at_line(2);
        assert!(matches!(err, GrammarError::MissingKey("N")));
    }

    #[test]
    fn report_mentions_reason() {
        let err = GrammarError::format("S a b", FormatFailure::MissingArrow).at_line(1);
        let report = err.report().unwrap();
        println!("{report}");
        assert!(report.contains("MissingArrow"));
        assert!(report.contains("malformed production on line 1"));
        assert!(report.contains("S a b"));
    }

    #[test]
    fn report_keeps_non_ascii_lines() {
        let err = GrammarError::format("Ä ε ε ε ε", FormatFailure::MissingArrow).at_line(1);
        let report = err.report().unwrap();
        println!("{report}");
        assert!(report.contains("Ä ε ε ε ε"));
        assert!(report.contains(FormatFailure::MissingArrow.message()));

        let err = GrammarError::format("  → ε", FormatFailure::EmptyLeftSide);
        let report = err.report().unwrap();
        println!("{report}");
        assert!(report.contains("→ ε"));
        assert!(report.contains(FormatFailure::EmptyLeftSide.message()));
    }

    #[test]
    fn no_report_without_source() {
        assert!(GrammarError::MissingKey("P").report().is_none());
    }
}
