//! Output formatting for lint reports and diagnostic dumps

use clap::ValueEnum;
use markcheck_engine::{EventDump, Message, Report, Severity, TokenDump};
use owo_colors::{OwoColorize, Style};

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Formatter {
    /// One line per message, `file:line:column: severity [rule] message`
    #[default]
    Text,
    /// The serialized report
    Json,
}

/// Render a lint report.
pub fn render_report(report: &Report, format: Formatter, color: bool) -> serde_json::Result<String> {
    match format {
        Formatter::Text => Ok(render_text(report, color)),
        Formatter::Json => json(report),
    }
}

fn render_text(report: &Report, color: bool) -> String {
    let mut output = String::new();
    for result in &report.results {
        for message in &result.messages {
            output.push_str(&format!(
                "{}:{}:{}: {} {} {}\n",
                paint(&result.file_path, Style::new().bold(), color),
                message.line,
                message.column,
                severity_label(message, color),
                paint(&format!("[{}]", message.rule_id), Style::new().dimmed(), color),
                message.message
            ));
        }
    }

    let problems = report.error_count + report.warning_count;
    if problems > 0 {
        let summary = format!(
            "\n{problems} {} ({} {}, {} {})\n",
            plural(problems, "problem"),
            report.error_count,
            plural(report.error_count, "error"),
            report.warning_count,
            plural(report.warning_count, "warning")
        );
        let style = if report.error_count > 0 {
            Style::new().red().bold()
        } else {
            Style::new().yellow().bold()
        };
        output.push_str(&paint(&summary, style, color));
    }
    output
}

fn severity_label(message: &Message, color: bool) -> String {
    match message.severity {
        Severity::Error => paint("error", Style::new().red(), color),
        Severity::Warn => paint("warning", Style::new().yellow(), color),
        Severity::Disabled => "off".to_string(),
    }
}

fn paint(text: &str, style: Style, color: bool) -> String {
    if color {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 { word.to_string() } else { format!("{word}s") }
}

/// Render the token stream, one token per line.
pub fn render_tokens(tokens: &[TokenDump], format: Formatter) -> serde_json::Result<String> {
    if format == Formatter::Json {
        return json(tokens);
    }
    let mut output = String::new();
    for token in tokens {
        let data = format!("{:?}", token.data);
        output.push_str(&format!("{:<16} {data:<24} {}\n", token.token, token.location));
    }
    Ok(output)
}

/// Render parser events, one event and its payload per line.
pub fn render_events(events: &[EventDump], format: Formatter) -> serde_json::Result<String> {
    if format == Formatter::Json {
        return json(events);
    }
    let mut output = String::new();
    for event in events {
        output.push_str(&format!("{}: {}\n", event.event, serde_json::to_string(&event.data)?));
    }
    Ok(output)
}

/// Render the element tree.
pub fn render_tree(lines: &[String], format: Formatter) -> serde_json::Result<String> {
    if format == Formatter::Json {
        return json(lines);
    }
    Ok(lines.iter().map(|line| format!("{line}\n")).collect())
}

fn json<T: serde::Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut output = serde_json::to_string_pretty(value)?;
    output.push('\n');
    Ok(output)
}
