//! Fixed-width ASCII table rendering.

use std::fmt::Write;

/// Emitted instead of a table when there are no rows.
pub const NO_DATA: &str = "no data";

/// Renders `rows` under `headers` as a bordered table.
///
/// Each column is as wide as its longest cell or header, counted in
/// characters. Missing cells render empty; extra cells are dropped.
/// With no rows the output is the single line [`NO_DATA`].
pub fn render_table<S: AsRef<str>>(headers: &[&str], rows: &[Vec<S>]) -> String {
    if rows.is_empty() {
        return format!("{NO_DATA}\n");
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.as_ref().chars().count());
        }
    }

    let mut out = String::new();
    push_separator(&mut out, &widths);
    push_row(&mut out, &widths, headers);
    push_separator(&mut out, &widths);
    for row in rows {
        push_row(&mut out, &widths, row);
    }
    push_separator(&mut out, &widths);
    out
}

fn push_separator(out: &mut String, widths: &[usize]) {
    for width in widths {
        out.push('+');
        out.push_str(&"-".repeat(width + 2));
    }
    out.push_str("+\n");
}

fn push_row<S: AsRef<str>>(out: &mut String, widths: &[usize], cells: &[S]) {
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map_or("", AsRef::as_ref);
        let pad = width - cell.chars().count();
        // Writing to a String cannot fail.
        let _ = write!(out, "| {cell}{} ", " ".repeat(pad));
    }
    out.push_str("|\n");
}
