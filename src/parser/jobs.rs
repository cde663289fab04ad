//! Parsers for the `ajaxShowJobs` endpoints
//!
//! Servers from 3.5.0 answer `showjb` with structured JSON. Older servers
//! wrap an escaped HTML table in a JSON string.

use serde_json::Value;

use super::html::{elements, strip_tags};
use super::{ParsedJob, STATUS_COMPLETED, STATUS_NOT_STARTED};
use crate::error::ParseError;

fn parse_json(body: &str, page: &str) -> Result<Value, ParseError> {
    serde_json::from_str(body).map_err(|e| ParseError::Json {
        page: page.to_string(),
        source: e,
    })
}

fn number_in(text: &str) -> Option<u64> {
    let digits: String = text
        .trim()
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Parse the JSON `showjb` answer of servers 3.5.0 and later
pub fn parse_json_show_jobs(body: &str) -> Result<Vec<ParsedJob>, ParseError> {
    let json = parse_json(body, "showjb")?;
    let Some(entries) = json.get("showJobsData").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    let mut jobs = Vec::new();
    for entry in entries {
        let Some(queue) = entry
            .get("job")
            .and_then(|job| job.get("jobQueue"))
            .and_then(Value::as_object)
        else {
            continue;
        };
        for (key, item) in queue {
            let id = key
                .parse()
                .map_err(|_| ParseError::invalid("job id", key.as_str(), "showjb"))?;
            let end_text = item.get("jq_endtext").and_then(Value::as_str).unwrap_or("");
            jobs.push(ParsedJob {
                id,
                status: if end_text.is_empty() {
                    STATUS_NOT_STARTED.to_string()
                } else {
                    end_text.to_string()
                },
                agent: item
                    .get("jq_type")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string(),
                report_id: None,
            });
        }
    }
    Ok(jobs)
}

/// Undo the backslash escaping pre-3.5.0 servers apply inside `showJobsData`
pub fn decode_ajax_show_jobs(body: &str) -> Result<String, ParseError> {
    let json = parse_json(body, "showjb")?;
    let raw = json
        .get("showJobsData")
        .and_then(Value::as_str)
        .ok_or_else(|| ParseError::missing("showJobsData string", "showjb"))?;
    Ok(unescape(raw))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Parse the decoded HTML job table of pre-3.5.0 servers
///
/// Only rows carrying a `class` attribute are jobs; the rest are headers.
pub fn parse_decoded_show_jobs(html: &str) -> Vec<ParsedJob> {
    let mut jobs = Vec::new();
    for row in elements(html, "tr") {
        if row.attr("class").is_none() {
            continue;
        }
        let cols = elements(&row.inner_html, "td");
        if cols.len() < 8 {
            continue;
        }
        let Some(id) = elements(&cols[0].inner_html, "a")
            .first()
            .and_then(|a| number_in(&a.text()))
        else {
            continue;
        };

        let status = match cols[1].text() {
            s if s.is_empty() => STATUS_NOT_STARTED.to_string(),
            s => s,
        };
        let report_id = if status == STATUS_COMPLETED {
            elements(&cols[7].inner_html, "a")
                .first()
                .and_then(|a| a.attr("href"))
                .and_then(|href| href.split_once("report="))
                .and_then(|(_, rest)| number_in(rest))
        } else {
            None
        };

        jobs.push(ParsedJob {
            id,
            status,
            agent: cols[2].text(),
            report_id,
        });
    }
    jobs
}

/// Parse the `showSingleJob` answer
///
/// `aaData` is a list of label/value rows: 0 holds the linked job id, 1 the
/// report id, 3 the agent and 11 the status lines.
pub fn parse_single_job(body: &str) -> Result<ParsedJob, ParseError> {
    const PAGE: &str = "showSingleJob";

    let json = parse_json(body, PAGE)?;
    let rows = json
        .get("aaData")
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::missing("aaData", PAGE))?;
    if rows.len() < 12 {
        return Err(ParseError::missing("12 job detail rows", PAGE));
    }
    let cell = |index: usize| rows[index].get("1").and_then(Value::as_str).unwrap_or("");

    let id_markup = cell(0);
    let id = elements(id_markup, "a")
        .first()
        .map(|a| a.text())
        .or_else(|| Some(strip_tags(id_markup)))
        .and_then(|text| number_in(&text))
        .ok_or_else(|| ParseError::invalid("job id", id_markup, PAGE))?;

    let agent = strip_tags(cell(3));
    let status_lines = cell(11);
    let status = strip_tags(
        status_lines
            .split_once("<br>")
            .map(|(first, _)| first)
            .unwrap_or(status_lines),
    );

    let is_report_agent = agent == "spdx2tv" || agent == "spdx2";
    let report_id = if is_report_agent && status == STATUS_COMPLETED {
        let raw = cell(1);
        Some(number_in(raw).ok_or_else(|| ParseError::invalid("report id", raw, PAGE))?)
    } else {
        None
    };

    Ok(ParsedJob {
        id,
        status,
        agent,
        report_id,
    })
}
