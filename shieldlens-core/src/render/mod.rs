//! Plain-text dashboard for the terminal.


use crate::aggregate::Ranked;
use crate::engine::{DataState, Evaluation};
use std::fmt::Write as _;
use std::io::{self, Write};

const BAR_WIDTH: usize = 30;
const DETAIL_ROWS: usize = 10;
const ERROR_ROWS: usize = 10;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn render_dashboard(eval: &Evaluation) -> String {
    let mut out = String::new();
    let views = &eval.views;

    let _ = write!(
        out,
        "Shieldlens ({} UTC)\n\
         ===========================\n",
        eval.evaluated_at.format("%Y-%m-%d %H:%M:%S")
    );

    match eval.state {
        DataState::NoData => {
            out.push_str("No data: the access log is missing, unreadable, or empty.\n");
            render_errors(&mut out, eval);
            return out;
        }
        DataState::NoMatches => {
            out.push_str("No matching data for the current filters.\n");
            render_errors(&mut out, eval);
            return out;
        }
        DataState::Ready => {}
    }

    let _ = writeln!(
        out,
        "Requests: {} | human={} bot={} | located={}\n",
        views.total_count,
        views.human_count,
        views.bot_count,
        views.geo_points.len()
    );

    //-------------------------------------------------------------------------
    // Requests over time
    //-------------------------------------------------------------------------
    let _ = writeln!(out, "Requests per {} min:", eval.bucket_minutes);
    let peak = views.histogram.iter().map(|b| b.count).max().unwrap_or(0);
    for bucket in &views.histogram {
        let _ = writeln!(
            out,
            "  {}  {:<width$} {}",
            bucket.start.format(TIME_FORMAT),
            bar(bucket.count, peak),
            bucket.count,
            width = BAR_WIDTH
        );
    }
    out.push('\n');

    //-------------------------------------------------------------------------
    // Status codes
    //-------------------------------------------------------------------------
    out.push_str("Status:\n");
    for (status, count) in &views.status_distribution {
        let pct = (*count as f64 / views.total_count as f64) * 100.0;
        let _ = writeln!(
            out,
            "  {:<5} {:<width$} {:>5.1}%",
            status,
            bar(*count, views.total_count),
            pct,
            width = BAR_WIDTH
        );
    }
    out.push('\n');

    render_ranked(&mut out, "Top IPs", &views.top_ips);
    render_ranked(&mut out, "Top URLs", &views.top_urls);

    //-------------------------------------------------------------------------
    // Detail
    //-------------------------------------------------------------------------
    out.push_str("Visitors:\n");
    for row in views.detail_table.iter().take(DETAIL_ROWS) {
        let _ = writeln!(
            out,
            "  {:>6}  {:<39} {}  {:<2}  {:<5}  {}",
            row.count,
            row.ip,
            row.time.format(TIME_FORMAT),
            row.country.as_deref().unwrap_or("--"),
            if row.is_bot { "bot" } else { "human" },
            row.isp.as_deref().unwrap_or("-"),
        );
    }
    if views.detail_table.len() > DETAIL_ROWS {
        let _ = writeln!(out, "  … {} more", views.detail_table.len() - DETAIL_ROWS);
    }

    render_errors(&mut out, eval);
    out
}

fn render_ranked(out: &mut String, title: &str, rows: &[Ranked]) {
    let _ = writeln!(out, "{title}:");
    for row in rows {
        let _ = writeln!(out, "  {:>6}  {}", row.count, row.value);
    }
    out.push('\n');
}

fn render_errors(out: &mut String, eval: &Evaluation) {
    if eval.error_records.is_empty() {
        return;
    }

    let _ = writeln!(out, "\nErrors ({}):", eval.error_records.len());
    let skip = eval.error_records.len().saturating_sub(ERROR_ROWS);
    for e in eval.error_records.iter().skip(skip) {
        let _ = writeln!(out, "  {}  {}", e.timestamp, e.ip);
    }
}

/// At least one block for any non-zero count.
fn bar(count: usize, scale: usize) -> String {
    if count == 0 || scale == 0 {
        return String::new();
    }
    let blocks = (count * BAR_WIDTH / scale).max(1);
    "█".repeat(blocks)
}

pub fn redraw(output: &str) {
    print!("\x1b[2J\x1b[H");
    println!("{output}");
    let _ = io::stdout().flush();
}
