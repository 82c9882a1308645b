//! "Download my data": one CSV row per response, in submission order.
//!
//! The column order is part of the download format and must not change.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::SecondsFormat;

use crate::session::Response;

pub const COLUMNS: [&str; 11] = [
    "session_id",
    "timestamp",
    "dilemma_id",
    "choice_key",
    "score",
    "role",
    "region",
    "utm_source",
    "utm_campaign",
    "ref",
    "first_click_latency",
];

/// Render each response as its fields in `COLUMNS` order.
pub fn rows(responses: &[Response]) -> Vec<[String; 11]> {
    responses.iter().map(row).collect()
}

fn row(r: &Response) -> [String; 11] {
    [
        r.session_id.to_string(),
        r.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
        r.dilemma_id.clone(),
        r.choice_key.clone(),
        r.score.to_string(),
        r.role.to_string(),
        r.region.to_string(),
        r.tags.utm_source.clone(),
        r.tags.utm_campaign.clone(),
        r.tags.referrer.clone(),
        r.first_click_latency.map(|s| s.to_string()).unwrap_or_default(),
    ]
}

fn escape(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn write_csv<W: Write>(out: &mut W, responses: &[Response]) -> std::io::Result<usize> {
    writeln!(out, "{}", COLUMNS.join(","))?;
    let rows = rows(responses);
    for fields in &rows {
        let line: Vec<String> = fields.iter().map(|f| escape(f)).collect();
        writeln!(out, "{}", line.join(","))?;
    }
    Ok(rows.len())
}

pub fn to_csv(responses: &[Response]) -> String {
    let mut buf = Vec::new();
    // writing into a Vec cannot fail
    let _ = write_csv(&mut buf, responses);
    String::from_utf8_lossy(&buf).into_owned()
}

pub fn write_csv_file(path: &Path, responses: &[Response]) -> Result<usize> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    let n = write_csv(&mut out, responses).with_context(|| format!("writing {}", path.display()))?;
    out.flush()?;
    Ok(n)
}
