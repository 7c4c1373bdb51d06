use colored::Colorize;
use serde_json::{Map, Value};
use std::fmt::Write;
use tabled::{builder::Builder, Table};

use fundamentals_core::analysis::{format_metric_value, AnalysisSummary, SectionView};
use fundamentals_core::ComputationOutput;

use super::{flatten, format_scalar};
use crate::provider::CompanyProfile;

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            // Check if "result" key holds the primary data
            if let Some(Value::Object(result)) = map.get("result") {
                print_result_tables(result, map);
            } else {
                print_section(None, map);
            }
        }
        Value::Array(arr) => {
            print_array_table(None, arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

/// Scalars of the result go in one table; every nested group (a metric
/// section, a DCF source, ...) gets its own titled table.
fn print_result_tables(result: &Map<String, Value>, envelope: &Map<String, Value>) {
    let (groups, top): (Vec<_>, Vec<_>) = result.iter().partition(|(_, v)| v.is_object());

    let top: Map<String, Value> = top.into_iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    if !top.is_empty() {
        print_section(None, &top);
    }
    for (key, group) in groups {
        if let Value::Object(inner) = group {
            println!();
            print_section(Some(key.as_str()), inner);
        }
    }

    // Print warnings if any
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\n{}", "Warnings:".yellow().bold());
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    // Print methodology
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// One Field/Value table. Arrays of records are printed after it as their
/// own tables; other nesting is flattened into dotted field names.
fn print_section(title: Option<&str>, map: &Map<String, Value>) {
    if let Some(title) = title {
        println!("{}", title.bold());
    }

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut record_tables = Vec::new();

    for (key, val) in map {
        match val {
            Value::Array(arr) if arr.iter().any(Value::is_object) => record_tables.push((key, arr)),
            Value::Object(_) => {
                for (path, leaf) in flatten(val) {
                    builder.push_record([format!("{key}.{path}"), format_scalar(&leaf)]);
                }
            }
            _ => builder.push_record([key.clone(), format_scalar(val)]),
        }
    }
    println!("{}", Table::from(builder));

    for (key, arr) in record_tables {
        print_array_table(Some(key.as_str()), arr);
    }
}

fn print_array_table(title: Option<&str>, arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }
    if let Some(title) = title {
        println!("{}", title.bold());
    }

    // Column set comes from the flattened first record
    if let Some(first) = arr.first().filter(|v| v.is_object()) {
        let headers: Vec<String> = flatten(first).into_iter().map(|(k, _)| k).collect();
        let mut builder = Builder::default();
        builder.push_record(headers.clone());

        for item in arr {
            let cells = flatten(item);
            let row: Vec<String> = headers
                .iter()
                .map(|h| {
                    cells
                        .iter()
                        .find(|(k, _)| k == h)
                        .map(|(_, v)| format_scalar(v))
                        .unwrap_or_default()
                })
                .collect();
            builder.push_record(row);
        }

        println!("{}", Table::from(builder));
    } else {
        // Simple array of values
        for item in arr {
            println!("{}", format_scalar(item));
        }
    }
}

/// Analysis report for people: the company summary, then one table per
/// metric section under its display names, then the warnings.
pub fn render_analysis(
    output: &ComputationOutput<AnalysisSummary>,
    profile: Option<&CompanyProfile>,
) -> String {
    let mut out = String::new();

    if let Some(profile) = profile {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (name, value) in profile.summary_rows() {
            builder.push_record([name.to_string(), value]);
        }
        let _ = writeln!(out, "{}\n{}\n", "Company Summary".bold(), Table::from(builder));
    }

    for section in output.result.sections() {
        let _ = writeln!(out, "{}", section.title.bold());
        let _ = writeln!(out, "{}\n", section_body(&section));
    }

    if let Some(v) = output.result.valuation.available() {
        let mut builder = Builder::default();
        builder.push_record(["Year", "FCF", "Discount Factor", "PV of FCF"]);
        for p in &v.projections {
            builder.push_record([
                p.period.label.clone(),
                format_metric_value(p.fcf),
                format!("{:.4}", p.discount_factor),
                format_metric_value(p.pv_fcf),
            ]);
        }
        let _ = writeln!(out, "{}\n{}\n", "DCF Projections".bold(), Table::from(builder));
    }

    if !output.warnings.is_empty() {
        let _ = writeln!(out, "{}", "Warnings:".yellow().bold());
        for w in &output.warnings {
            let _ = writeln!(out, "  - {w}");
        }
    }
    let _ = write!(out, "\nMethodology: {}", output.methodology);
    out
}

fn section_body(section: &SectionView) -> String {
    if section.is_empty() {
        return match &section.note {
            Some(note) => format!("No data available ({note})"),
            None => "No data available".to_string(),
        };
    }

    let mut builder = Builder::default();
    builder.push_record(["Metric", "Value"]);
    for (name, value) in &section.metrics {
        builder.push_record([name.to_string(), format_metric_value(*value)]);
    }
    for (name, value) in &section.details {
        builder.push_record([name.to_string(), value.clone()]);
    }
    Table::from(builder).to_string()
}
