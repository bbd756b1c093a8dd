use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use polars::prelude::DataFrame;

use featgen_common::any_to_string;
use featgen_model::SnapshotReport;

use featgen_cli::commands::{EnforceResult, FeatureDtypes};

pub fn print_enforce_summary(result: &EnforceResult, preview_rows: usize) {
    if let Some(path) = &result.output {
        println!("Output: {}", path.display());
    }
    println!(
        "Rows: {}  Features: {}",
        result.frame.height(),
        result.frame.width()
    );

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Feature"),
        header_cell("Input dtype"),
        header_cell("Enforced dtype"),
    ]);
    apply_summary_table_style(&mut table);
    for row in &result.features {
        table.add_row(vec![
            Cell::new(&row.feature)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            input_cell(row),
            Cell::new(row.enforced),
        ]);
    }
    println!("{table}");

    if !result.dropped.is_empty() {
        println!("Dropped from scope: {}", result.dropped.join(", "));
    }
    if result.output.is_none() {
        print_preview(&result.frame, preview_rows);
    }
    if !result.warnings.is_empty() {
        eprintln!("Warnings:");
        for warning in &result.warnings {
            eprintln!("- {warning}");
        }
    }
}

pub fn print_report(report: &SnapshotReport) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dtype"),
        header_cell("Group"),
        header_cell("Count"),
        header_cell("Features"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for entry in &report.entries {
        table.add_row(vec![
            Cell::new(entry.dtype).add_attribute(Attribute::Bold),
            dim_cell(entry.group),
            Cell::new(entry.features.len()),
            Cell::new(entry.features.join(", ")),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(report.feature_count()).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    println!("{table}");
}

fn print_preview(frame: &DataFrame, rows: usize) {
    if rows == 0 || frame.width() == 0 {
        return;
    }
    let preview = frame.head(Some(rows));
    let mut table = Table::new();
    table.set_header(
        preview
            .get_columns()
            .iter()
            .map(|column| header_cell(&format!("{}\n{}", column.name(), column.dtype()))),
    );
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
    for row in 0..preview.height() {
        let cells = preview.get_columns().iter().map(|column| {
            match column.get(row) {
                Ok(value) if value.is_null() => dim_cell("null"),
                Ok(value) => Cell::new(any_to_string(value)),
                Err(_) => dim_cell("?"),
            }
        });
        table.add_row(cells.collect::<Vec<_>>());
    }
    println!();
    println!("Preview (first {} rows):", preview.height());
    println!("{table}");
}

fn input_cell(row: &FeatureDtypes) -> Cell {
    match row.input {
        Some(dtype) if dtype == row.enforced => dim_cell(dtype),
        Some(dtype) => Cell::new(dtype).fg(Color::Yellow),
        None => dim_cell("-"),
    }
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
