// src/services/parser.rs

//! Strict line-oriented parser for the ePrint RSS document.
//!
//! The upstream document is not validated against any schema. Instead this
//! parser knows its exact layout: a fixed block of boilerplate lines, one
//! `<lastBuildDate>` line, and items laid out as
//!
//! ```text
//! <item>
//! <link>...</link>
//! <title>...</title>
//! <description>...        (one or more lines)
//! ...</description>
//! <guid>...</guid>
//! </item>
//! ```
//!
//! Every line must fit this layout exactly. There is no lenient fallback:
//! any deviation fails the whole document so that format drift upstream
//! surfaces as an error instead of silently dropped items.

use std::fmt;
use std::mem;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{FeedSnapshot, Item};
use crate::services::normalize::{sanitize, strip_cdata};

/// Lines the upstream always emits verbatim outside of items.
pub const BOILERPLATE_LINES: [&str; 11] = [
    "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>",
    "<rss version=\"2.0\">",
    "<channel><title>Cryptology ePrint Archive</title>",
    "<link>https://eprint.iacr.org/</link>",
    "<description>Recently modified papers in the IACR Cryptology ePrint Archive</description>",
    "<language>en-us</language>",
    "<webMaster>webmaster@iacr.org</webMaster>",
    "<managingEditor>eprint-admin@iacr.org</managingEditor>",
    "<generator>None of your business</generator>",
    "<ttl>60</ttl>",
    "</channel></rss>",
];

/// Format of the `<lastBuildDate>` value after the weekday, e.g.
/// `8 Mar 2022 21:05:07 +0000` from `Tue, 8 Mar 2022 21:05:07 +0000`.
const LAST_BUILD_DATE_FORMAT: &str = "%d %b %Y %H:%M:%S %z";

/// Weekday abbreviations accepted in front of the build date.
const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

const LAST_BUILD_DATE_OPEN: &str = "<lastBuildDate>";
const LAST_BUILD_DATE_CLOSE: &str = "</lastBuildDate>";
const ITEM_OPEN: &str = "<item>";
const ITEM_CLOSE: &str = "</item>";
const LINK_OPEN: &str = "<link>";
const LINK_CLOSE: &str = "</link>";
const TITLE_OPEN: &str = "<title>";
const TITLE_CLOSE: &str = "</title>";
const DESCRIPTION_OPEN: &str = "<description>";
const DESCRIPTION_CLOSE: &str = "</description>";
const GUID_OPEN: &str = "<guid>";
const GUID_CLOSE: &str = "</guid>";

/// The part of the document a line was expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Top-level line outside of any item
    Line,
    LastBuildDate,
    Link,
    Title,
    Description,
    Guid,
    ItemEnd,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Line => "line",
            Field::LastBuildDate => "lastBuildDate",
            Field::Link => "link",
            Field::Title => "title",
            Field::Description => "description",
            Field::Guid => "guid",
            Field::ItemEnd => "item end",
        };
        f.write_str(name)
    }
}

/// Parser state between two lines.
#[derive(Debug, Default)]
enum State {
    /// Outside of an item: boilerplate, build date, or item open
    #[default]
    Scanning,
    AwaitingLink,
    AwaitingTitle {
        link: String,
    },
    /// Collects raw lines until the buffer holds the closing marker
    AwaitingDescription {
        link: String,
        title: String,
        buffer: String,
    },
    AwaitingGuid {
        link: String,
        title: String,
        description: String,
    },
    AwaitingItemEnd(Item),
}

impl State {
    fn awaiting(&self) -> Field {
        match self {
            State::Scanning => Field::Line,
            State::AwaitingLink => Field::Link,
            State::AwaitingTitle { .. } => Field::Title,
            State::AwaitingDescription { .. } => Field::Description,
            State::AwaitingGuid { .. } => Field::Guid,
            State::AwaitingItemEnd(_) => Field::ItemEnd,
        }
    }
}

/// Incremental line parser. Feed it lines in order, then call `finish`.
#[derive(Debug, Default)]
pub struct LineParser {
    state: State,
    items: Vec<Item>,
    updated: Option<DateTime<Utc>>,
    line_no: usize,
}

impl LineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the next line of the document.
    ///
    /// On error the parser is left in its scanning state and must be
    /// discarded; the document as a whole is invalid.
    pub fn push_line(&mut self, line: &str) -> Result<()> {
        self.line_no += 1;
        let state = mem::take(&mut self.state);
        self.state = self.transition(state, line)?;
        Ok(())
    }

    /// Close the document and build the snapshot.
    ///
    /// A document that ends inside an item fails on the field that was still
    /// awaited; the partial item is never emitted. A document without a
    /// `<lastBuildDate>` line is stamped with the Unix epoch.
    pub fn finish(self) -> Result<FeedSnapshot> {
        match self.state {
            State::Scanning => Ok(FeedSnapshot::new(
                self.items,
                self.updated.unwrap_or_default(),
            )),
            pending => Err(AppError::parse(
                self.line_no + 1,
                pending.awaiting(),
                "document ended before the item was closed",
            )),
        }
    }

    fn transition(&mut self, state: State, line: &str) -> Result<State> {
        let line_no = self.line_no;
        let field = state.awaiting();

        let next = match state {
            State::Scanning => return self.scan(line),
            State::AwaitingLink => {
                let link = strip_markers(line, LINK_OPEN, LINK_CLOSE)
                    .map_err(|msg| AppError::parse(line_no, field, msg))?;
                State::AwaitingTitle {
                    link: link.to_string(),
                }
            }
            State::AwaitingTitle { link } => {
                let title = strip_markers(line, TITLE_OPEN, TITLE_CLOSE)
                    .map_err(|msg| item_error(line_no, field, &link, msg))?;
                State::AwaitingDescription {
                    link,
                    title: sanitize(&strip_cdata(title)),
                    buffer: String::new(),
                }
            }
            State::AwaitingDescription {
                link,
                title,
                mut buffer,
            } => {
                // Continuation lines are joined without a separator.
                buffer.push_str(line);
                if !buffer.contains(DESCRIPTION_CLOSE) {
                    return Ok(State::AwaitingDescription {
                        link,
                        title,
                        buffer,
                    });
                }
                let description = strip_markers(&buffer, DESCRIPTION_OPEN, DESCRIPTION_CLOSE)
                    .map_err(|msg| item_error(line_no, field, &link, msg))?;
                State::AwaitingGuid {
                    description: sanitize(&strip_cdata(description)),
                    link,
                    title,
                }
            }
            State::AwaitingGuid {
                link,
                title,
                description,
            } => {
                let guid = strip_markers(line, GUID_OPEN, GUID_CLOSE)
                    .map_err(|msg| item_error(line_no, field, &link, msg))?;
                State::AwaitingItemEnd(Item {
                    title,
                    link,
                    author: String::new(),
                    description,
                    id: guid.to_string(),
                    created: None,
                    updated: None,
                })
            }
            State::AwaitingItemEnd(item) => {
                if line != ITEM_CLOSE {
                    return Err(item_error(
                        line_no,
                        field,
                        &item.link,
                        format!("expected {ITEM_CLOSE}, got: {line}"),
                    ));
                }
                self.items.push(item);
                State::Scanning
            }
        };

        Ok(next)
    }

    fn scan(&mut self, line: &str) -> Result<State> {
        if BOILERPLATE_LINES.contains(&line) {
            return Ok(State::Scanning);
        }
        if line.contains(LAST_BUILD_DATE_OPEN) {
            self.updated = Some(parse_last_build_date(self.line_no, line)?);
            return Ok(State::Scanning);
        }
        if line.contains(ITEM_OPEN) {
            return Ok(State::AwaitingLink);
        }
        Err(AppError::parse(
            self.line_no,
            Field::Line,
            format!("failed to parse line: {line}"),
        ))
    }
}

/// Parse a complete upstream document.
///
/// Either every line fits the layout and the full snapshot is returned, or
/// the first offending line is reported and nothing is returned.
pub fn parse_document(bytes: &[u8]) -> Result<FeedSnapshot> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        let line = bytes[..e.valid_up_to()]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1;
        AppError::parse(line, Field::Line, format!("document is not valid UTF-8: {e}"))
    })?;

    let mut parser = LineParser::new();
    for line in text.lines() {
        parser.push_line(line)?;
    }
    parser.finish()
}

fn parse_last_build_date(line_no: usize, line: &str) -> Result<DateTime<Utc>> {
    let value = strip_markers(line, LAST_BUILD_DATE_OPEN, LAST_BUILD_DATE_CLOSE)
        .map_err(|msg| AppError::parse(line_no, Field::LastBuildDate, msg))?;

    let fail = |reason: String| {
        AppError::parse(
            line_no,
            Field::LastBuildDate,
            format!("failed to parse last build date {value:?}: {reason}"),
        )
    };

    // The weekday must be well-formed but is not checked against the date.
    let (weekday, rest) = value
        .split_once(", ")
        .ok_or_else(|| fail("missing weekday".to_string()))?;
    if !WEEKDAYS.iter().any(|day| day.eq_ignore_ascii_case(weekday)) {
        return Err(fail(format!("unknown weekday {weekday:?}")));
    }

    DateTime::parse_from_str(rest, LAST_BUILD_DATE_FORMAT)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|e| fail(e.to_string()))
}

fn item_error(line_no: usize, field: Field, link: &str, msg: String) -> AppError {
    AppError::parse(line_no, field, format!("for {link:?}: {msg}"))
}

/// Unwrap `line` from a literal prefix and postfix.
///
/// Both markers must occur in the line, the prefix exactly at its start and
/// the postfix exactly at its end.
fn strip_markers<'a>(
    line: &'a str,
    prefix: &str,
    postfix: &str,
) -> std::result::Result<&'a str, String> {
    if !line.contains(prefix) || !line.contains(postfix) {
        return Err(format!(
            "expected line with {prefix} and {postfix}, got: {line}"
        ));
    }
    let rest = line.strip_prefix(prefix).ok_or_else(|| {
        let head: String = line.chars().take(prefix.chars().count()).collect();
        format!("unexpected prefix! expected: {prefix:?}, got: {head:?}")
    })?;
    rest.strip_suffix(postfix).ok_or_else(|| {
        let mut tail: Vec<char> = line.chars().rev().take(postfix.chars().count()).collect();
        tail.reverse();
        let tail: String = tail.into_iter().collect();
        format!("unexpected postfix! expected: {postfix:?}, got: {tail:?}")
    })
}
