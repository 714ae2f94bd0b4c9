use std::sync::LazyLock;

use log::debug;
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;

static SEQUENCE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").expect("valid regex"));
static TIMESTAMP_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d:,]+ --> [\d:,]+$").expect("valid regex"));
static ANNOTATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[.*\]$").expect("valid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Shape of a raw subtitle body as served by YouTube
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Srt,
    WebVtt,
    TimedText,
}

impl SubtitleFormat {
    pub fn detect(raw: &str) -> Self {
        let head = raw.trim_start_matches('\u{feff}').trim_start();
        if head.starts_with("WEBVTT") {
            SubtitleFormat::WebVtt
        } else if head.starts_with("<?xml") || head.starts_with("<transcript") || head.starts_with("<timedtext") {
            SubtitleFormat::TimedText
        } else {
            SubtitleFormat::Srt
        }
    }
}

impl std::fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubtitleFormat::Srt => write!(f, "srt"),
            SubtitleFormat::WebVtt => write!(f, "webvtt"),
            SubtitleFormat::TimedText => write!(f, "timedtext"),
        }
    }
}

/// Turn SRT-like subtitle text into a single line of prose.
///
/// Sequence numbers, timestamp ranges, `[bracketed]` annotations and blank
/// lines are dropped, the rest is joined with spaces, `<tags>` are stripped
/// and whitespace runs collapse to one space.
pub fn clean(raw: &str) -> String {
    let joined = raw
        .lines()
        .map(str::trim)
        .filter(|line| !is_structural(line))
        .collect::<Vec<_>>()
        .join(" ");

    let untagged = TAG.replace_all(&joined, "");
    WHITESPACE.replace_all(&untagged, " ").trim().to_string()
}

fn is_structural(line: &str) -> bool {
    line.is_empty() || SEQUENCE_NUMBER.is_match(line) || TIMESTAMP_RANGE.is_match(line) || ANNOTATION.is_match(line)
}

/// Clean a raw subtitle body of any supported format.
pub fn normalize(raw: &str) -> String {
    match SubtitleFormat::detect(raw) {
        SubtitleFormat::Srt => clean(raw),
        SubtitleFormat::WebVtt => clean(&webvtt_lines(raw)),
        SubtitleFormat::TimedText => match timed_text_lines(raw) {
            Ok(lines) => clean(&lines),
            Err(e) => {
                debug!("Timed-text parse failed ({e}), cleaning as plain text");
                clean(raw)
            }
        },
    }
}

/// Reduce a WebVTT body to its caption lines, one per line.
///
/// Auto-generated tracks repeat each line as the caption rolls, so
/// consecutive duplicates are collapsed.
fn webvtt_lines(raw: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_header = true;
    let mut in_block = false;

    for line in raw.lines().map(str::trim) {
        if in_header || in_block {
            if line.is_empty() {
                in_header = false;
                in_block = false;
            }
            continue;
        }
        if line.starts_with("NOTE") || line.starts_with("STYLE") || line.starts_with("REGION") {
            in_block = true;
            continue;
        }
        if line.contains("-->") {
            continue;
        }

        let text = TAG.replace_all(line, "").trim().to_string();
        if text.is_empty() || lines.last() == Some(&text) {
            continue;
        }
        lines.push(text);
    }

    lines.join("\n")
}

/// Extract the caption text of a YouTube timed-text XML document, one cue per line.
fn timed_text_lines(xml: &str) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut in_cue = false;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) if is_cue(e.name().as_ref()) => {
                in_cue = true;
                current.clear();
            }
            Event::End(ref e) if is_cue(e.name().as_ref()) => {
                in_cue = false;
                let text = current.trim();
                if !text.is_empty() {
                    lines.push(text.to_string());
                }
                current.clear();
            }
            Event::Text(ref e) if in_cue => {
                let raw_text = e.unescape().unwrap_or_default();
                current.push_str(&html_escape::decode_html_entities(&raw_text));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(lines.join("\n"))
}

fn is_cue(name: &[u8]) -> bool {
    name == b"text" || name == b"p"
}
