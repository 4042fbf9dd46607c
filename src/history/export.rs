// CSV projection of history records.
//
// The default export joins fields with ',' and rows with '\n' without quoting, so a
// node id containing a comma shifts the columns. `to_csv_quoted` is the RFC 4180
// variant and is only used when explicitly requested.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

use crate::models::{HistoryRecord, WorkerPresence, WorkerState};

pub const CSV_CONTENT_TYPE: &str = "text/csv";

pub const CSV_HEADER: [&str; 7] = [
    "Timestamp",
    "Node ID",
    "Temperature (°C)",
    "Humidity (%)",
    "PM2.5 (µg/m³)",
    "Worker State",
    "Worker Presence",
];

/// `node_history_report_<YYYY-MM-DD>.csv`
pub fn export_filename(date: NaiveDate) -> String {
    format!("node_history_report_{}.csv", date.format("%Y-%m-%d"))
}

/// en-US style local date/time, e.g. `3/7/2025, 2:05:09 PM`.
pub fn format_timestamp<Tz: TimeZone>(ts: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    ts.with_timezone(tz)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

pub fn worker_state_label(state: WorkerState) -> &'static str {
    match state {
        WorkerState::Alert => "ALERT",
        WorkerState::Fine => "Fine",
    }
}

pub fn worker_presence_label(presence: WorkerPresence) -> &'static str {
    match presence {
        WorkerPresence::Present => "Present",
        WorkerPresence::Absent => "Not Present",
    }
}

fn fields<Tz: TimeZone>(record: &HistoryRecord, tz: &Tz) -> [String; 7]
where
    Tz::Offset: std::fmt::Display,
{
    let r = &record.reading;
    [
        format_timestamp(r.timestamp, tz),
        r.node_id.clone(),
        r.temperature.to_string(),
        r.humidity.to_string(),
        r.pm25.to_string(),
        worker_state_label(r.worker_state).to_string(),
        worker_presence_label(r.worker_presence).to_string(),
    ]
}

/// Header + one unquoted line per record, timestamps in `tz`.
pub fn to_csv_in<Tz: TimeZone>(records: &[HistoryRecord], tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADER.join(","));
    for record in records {
        lines.push(fields(record, tz).join(","));
    }
    lines.join("\n")
}

pub fn to_csv(records: &[HistoryRecord]) -> String {
    to_csv_in(records, &Local)
}

/// Same columns as [`to_csv_in`], written through the `csv` crate with quoting.
pub fn to_csv_quoted_in<Tz: TimeZone>(records: &[HistoryRecord], tz: &Tz) -> anyhow::Result<String>
where
    Tz::Offset: std::fmt::Display,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record(fields(record, tz))?;
    }
    let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!("csv flush: {}", e))?;
    let mut out = String::from_utf8(bytes)?;
    if out.ends_with('\n') {
        out.pop();
    }
    Ok(out)
}

pub fn to_csv_quoted(records: &[HistoryRecord]) -> anyhow::Result<String> {
    to_csv_quoted_in(records, &Local)
}
