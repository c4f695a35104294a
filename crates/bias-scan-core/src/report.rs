use std::fmt::Write;

use chrono::{Local, TimeZone};
use colored::Colorize;

use crate::{
    history::AnalysisHistory,
    scanner::{AnalysisResult, BiasBand, FlaggedPhrase, Severity},
};

/// Format styles supported in default reporter implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// A run of analysed text, either untouched or covered by a flagged phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Flagged(&'a FlaggedPhrase),
}

/// Split `text` into plain and flagged runs, in order.
///
/// Phrases starting inside an already emitted phrase are skipped, so each
/// character of `text` appears in exactly one segment. Phrases whose spans do
/// not fit `text` are ignored.
pub fn highlight_segments<'a>(text: &'a str, phrases: &'a [FlaggedPhrase]) -> Vec<Segment<'a>> {
    let mut segments = Vec::new();
    let mut last = 0;
    for phrase in phrases {
        let (start, end) = phrase.span;
        if start < last || text.get(start..end).is_none() {
            continue;
        }
        if start > last {
            segments.push(Segment::Plain(&text[last..start]));
        }
        segments.push(Segment::Flagged(phrase));
        last = end;
    }
    if last < text.len() {
        segments.push(Segment::Plain(&text[last..]));
    }
    segments
}

/// Produce a report string for `result`, which was computed over `text`.
pub fn render_report(
    text: &str,
    result: &AnalysisResult,
    format: OutputFormat,
    color: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Human => render_human(text, result, color),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
    }
}

fn render_human(text: &str, result: &AnalysisResult, color: bool) -> anyhow::Result<String> {
    let mut out = String::new();
    let band = result.band();
    let headline = format!("Bias Score: {}/10 ({})", result.bias_score, band.label());
    writeln!(out, "{}", paint_band(&headline, band, color))?;
    writeln!(out)?;
    writeln!(out, "Summary:")?;
    writeln!(out, "  {}", result.summary)?;

    if !text.is_empty() {
        writeln!(out)?;
        writeln!(out, "Text:")?;
        for segment in highlight_segments(text, &result.flagged_phrases) {
            match segment {
                Segment::Plain(run) => out.push_str(run),
                Segment::Flagged(phrase) => {
                    let marked = format!("[[{}]]", phrase.text);
                    out.push_str(&paint_severity(&marked, phrase.severity, color));
                }
            }
        }
        writeln!(out)?;
    }

    writeln!(out)?;
    writeln!(out, "Flagged Phrases ({}):", result.flagged_phrases.len())?;
    for phrase in &result.flagged_phrases {
        writeln!(
            out,
            "  - \"{text}\" [{severity}] @ {start}..{end}",
            text = sanitize(&phrase.text),
            severity = paint_severity(&phrase.severity.to_string(), phrase.severity, color),
            start = phrase.start,
            end = phrase.end,
        )?;
        writeln!(out, "    {}", phrase.explanation)?;
    }
    Ok(out)
}

/// List stored analyses, newest first.
pub fn render_history(history: &AnalysisHistory, format: OutputFormat) -> anyhow::Result<String> {
    if format == OutputFormat::Json {
        let entries: Vec<_> = history.entries().collect();
        return Ok(serde_json::to_string_pretty(&entries)?);
    }
    let mut out = String::new();
    if history.is_empty() {
        writeln!(out, "No analysis history yet")?;
        return Ok(out);
    }
    writeln!(out, "Recent Analyses ({}):", history.len())?;
    for (idx, entry) in history.entries().enumerate() {
        writeln!(
            out,
            "{idx:>3}. {score}/10 · {when} · {summary}",
            idx = idx + 1,
            score = entry.bias_score,
            when = format_timestamp(entry.timestamp),
            summary = entry.summary,
        )?;
    }
    Ok(out)
}

fn format_timestamp(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn paint_severity(text: &str, severity: Severity, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    match severity {
        Severity::Low => text.yellow().to_string(),
        Severity::Medium => text.yellow().bold().to_string(),
        Severity::High => text.red().bold().to_string(),
    }
}

fn paint_band(text: &str, band: BiasBand, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    match band {
        BiasBand::Low => text.green().to_string(),
        BiasBand::Moderate => text.yellow().to_string(),
        BiasBand::High => text.red().to_string(),
    }
}

fn sanitize(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\n' | '\r' => ' ',
            _ => c,
        })
        .collect()
}
