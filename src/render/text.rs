use crate::core::dashboard::DashboardView;
use crate::render::table::TableView;
use crate::utils::format::{fmt_int, fmt_money, fmt_pct};
use std::fmt::Write;

const TITLE: &str = "SNIP / SEGEPLAN audit";

fn pad(cell: &str, width: usize) -> String {
    let len = cell.chars().count();
    format!("{}{}", cell, " ".repeat(width.saturating_sub(len)))
}

/// Plain-text table with a leading row index column. Only the first
/// `max_rows` rows are printed.
pub fn render_table(out: &mut String, table: &TableView, max_rows: usize) {
    let _ = match table.selectable_as {
        Some(name) => writeln!(out, "## {} [select:{}:<row>]", table.title, name),
        None => writeln!(out, "## {}", table.title),
    };
    if table.is_empty() {
        let _ = writeln!(out, "(no rows)");
        return;
    }

    let shown = &table.rows[..table.len().min(max_rows)];
    let index_width = shown.len().saturating_sub(1).to_string().len().max(1);
    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            shown
                .iter()
                .map(|row| row[idx].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = table
        .columns
        .iter()
        .zip(&widths)
        .map(|(h, w)| pad(h, *w))
        .collect();
    let _ = writeln!(out, "{}  {}", pad("#", index_width), header.join("  ").trim_end());

    for (i, row) in shown.iter().enumerate() {
        let cells: Vec<String> = row.iter().zip(&widths).map(|(c, w)| pad(c, *w)).collect();
        let _ = writeln!(
            out,
            "{}  {}",
            pad(&i.to_string(), index_width),
            cells.join("  ").trim_end()
        );
    }
    if table.len() > shown.len() {
        let _ = writeln!(out, "... {} more rows", table.len() - shown.len());
    }
}

pub fn render_text(view: &DashboardView, max_rows: usize) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# {}", TITLE);
    let _ = writeln!(out, "Map filter: {}", view.filter);
    let _ = writeln!(out);

    let kpis = &view.kpis;
    let _ = writeln!(
        out,
        "Distinct SNIP: {} | Current budget (sum): {} | Executed (sum): {} | Global execution: {}",
        fmt_int(Some(kpis.distinct_projects as f64)),
        fmt_money(Some(kpis.total_budget), 2),
        fmt_money(Some(kpis.total_executed), 2),
        fmt_pct(kpis.execution_ratio, 1)
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "## {}", view.map.title);
    let _ = writeln!(out, "{}", view.map.caption());
    if let Some([lat, lon]) = view.map.center {
        let _ = writeln!(out, "Center: {:.5}, {:.5}", lat, lon);
    }
    for marker in view.map.markers.iter().take(max_rows) {
        let _ = writeln!(
            out,
            "  SNIP {} @ {:.5},{:.5}  {}  [{}]  {}  {}{}",
            marker.snip_id,
            marker.latitude,
            marker.longitude,
            marker.location,
            marker.audit_status,
            marker.current_budget,
            marker.execution,
            if marker.inconsistent { "  (inconsistent)" } else { "" }
        );
    }
    if view.map.shown_points() > max_rows {
        let _ = writeln!(out, "  ... {} more markers", view.map.shown_points() - max_rows);
    }
    let _ = writeln!(out);

    for table in &view.tables {
        render_table(&mut out, table, max_rows);
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "## Quality / consistency [inconsistencies]");
    let _ = writeln!(
        out,
        "Projects with inconsistency: {} | Associated current budget: {}",
        fmt_int(Some(view.inconsistencies.flagged_projects as f64)),
        fmt_money(Some(view.inconsistencies.flagged_budget), 2)
    );
    render_table(&mut out, &view.inconsistency_sample, max_rows);
    let _ = writeln!(out);
    render_table(&mut out, &view.budget_inconsistencies, max_rows);

    out
}
