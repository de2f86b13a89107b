use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use loopforge::grids::KnownGrid;
use loopforge::output::ResultRecord;
use loopforge::sweep::{Status, SweepReport};

// Headline scalars shown after a single run, in display order.
const HEADLINE: &[(&str, &str)] = &[
    ("v_mean", "Mean velocity"),
    ("err_v_mean", "  bootstrap error"),
    ("v_med", "Median velocity"),
    ("v_th", "Mean-field velocity"),
    ("v_fit", "Velocity from fitted rates"),
    ("vf", "Early x/t"),
    ("wf", "Late exponent"),
    ("tau_forwards", "Forward dwell tau"),
    ("tau_reverses", "Reverse dwell tau"),
    ("v_marcand", "Array crossing velocity"),
    ("err_fpt_slope", "  bootstrap error"),
    ("dx_mean", "Mean jump"),
    ("dt_mean", "Mean waiting time"),
];

fn fmt_value(value: Option<f64>) -> Cell {
    match value {
        Some(v) => Cell::new(format!("{:.4}", v)),
        None => Cell::new("n/a").fg(Color::DarkGrey),
    }
}

pub fn print_run_report(title: &str, record: &ResultRecord, secs: f64) {
    println!("\n{}", title);
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Quantity").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);
    if let Some(col) = table.column_mut(1) {
        col.set_cell_alignment(CellAlignment::Right);
    }

    for (key, label) in HEADLINE {
        if record.get(key).is_none() {
            continue;
        }
        let cell = fmt_value(record.scalar(key));
        let cell = if key.starts_with("v_") { cell.fg(Color::Cyan) } else { cell };
        table.add_row(vec![Cell::new(*label), cell]);
    }
    table.add_row(vec![
        Cell::new("Wall time (s)"),
        Cell::new(format!("{:.2}", secs)),
    ]);
    println!("{}", table);
}

pub fn print_sweep_report(report: &SweepReport) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Combination").add_attribute(Attribute::Bold),
        Cell::new("Status"),
        Cell::new("v_mean").fg(Color::Cyan),
    ]);
    if let Some(col) = table.column_mut(2) {
        col.set_cell_alignment(CellAlignment::Right);
    }

    // Long sweeps only list their failures.
    let list_all = report.outcomes.len() <= 50;
    for outcome in &report.outcomes {
        if !list_all && outcome.status == Status::Ok {
            continue;
        }
        let status = match outcome.status {
            Status::Ok => Cell::new("ok").fg(Color::Green),
            Status::Failed => Cell::new(outcome.error.as_deref().unwrap_or("failed")).fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(&outcome.title),
            status,
            fmt_value(outcome.v_mean),
        ]);
    }
    println!("\n{}", table);
    println!(
        "✅ {} ok / ❌ {} failed in {:.1}s, summary at {}",
        report.succeeded(),
        report.failed(),
        report.elapsed_secs,
        report.summary.display()
    );
}

pub fn print_grid_table(rows: &[(KnownGrid, usize)]) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Grid").add_attribute(Attribute::Bold),
        Cell::new("Directory"),
        Cell::new("Kind"),
        Cell::new("Combinations").fg(Color::Cyan),
    ]);
    if let Some(col) = table.column_mut(3) {
        col.set_cell_alignment(CellAlignment::Right);
    }

    for (grid, count) in rows {
        table.add_row(vec![
            Cell::new(grid.to_string()).add_attribute(Attribute::Bold),
            Cell::new(grid.path()),
            Cell::new(if grid.is_array() { "array" } else { "chromatin" }),
            Cell::new(count.to_string()).fg(Color::Cyan),
        ]);
    }
    println!("{}", table);
}
