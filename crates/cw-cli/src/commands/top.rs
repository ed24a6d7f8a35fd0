//! Leaderboard of viewers by watch time.

use std::io::Write;

use anyhow::Result;
use cw_core::{Aggregate, IgnoreList, format_hms, render_table, top_n};

use super::util::load_aggregate;
use crate::Config;

const HEADERS: [&str; 4] = ["#", "Nick", "Watch time", "Visits"];

pub fn run<W: Write>(writer: &mut W, config: &Config, limit: Option<usize>, json: bool) -> Result<()> {
    let aggregate = load_aggregate(config)?;
    let ignore = config.ignore_list()?;
    let limit = limit.unwrap_or(config.top_n);
    write_top(writer, &aggregate, &ignore, limit, json)
}

fn write_top<W: Write>(
    writer: &mut W,
    aggregate: &Aggregate,
    ignore: &IgnoreList,
    limit: usize,
    json: bool,
) -> Result<()> {
    let entries = top_n(aggregate, ignore, limit);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(());
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .enumerate()
        .map(|(rank, entry)| {
            vec![
                (rank + 1).to_string(),
                entry.identity.to_string(),
                format_hms(entry.total_watch_time),
                entry.visits.to_string(),
            ]
        })
        .collect();
    write!(writer, "{}", render_table(&HEADERS, &rows))?;
    Ok(())
}
