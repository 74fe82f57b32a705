pub mod config;
pub mod cursor;
pub mod daemon;
pub mod run;

use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct KeyValueRow {
    #[tabled(rename = "field")]
    pub field: String,
    #[tabled(rename = "value")]
    pub value: String,
}

/// Print `(field, value)` pairs as a rounded two-column table.
pub fn print_rows<K: ToString>(rows: impl IntoIterator<Item = (K, String)>) {
    let rows: Vec<KeyValueRow> = rows
        .into_iter()
        .map(|(field, value)| KeyValueRow {
            field: field.to_string(),
            value,
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

pub fn separator() -> String {
    "■".repeat(48).bright_black().to_string()
}
