use chrono::Month;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table};
use consolidation::{ConsolidationHistory, ConsolidationOutcome};
use core_types::{Organization, ResultRecord, Variation};
use variation::UpdateOutcome;

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn value_cell(value: f64) -> Cell {
    let cell = Cell::new(format_value(value)).set_alignment(CellAlignment::Right);
    if value.is_finite() { cell } else { cell.fg(Color::Yellow) }
}

fn variation_cell(variation: Variation) -> Cell {
    match variation {
        Variation::Pending => Cell::new("-").fg(Color::DarkGrey),
        Variation::NotIncreased => Cell::new("0").fg(Color::Green),
        Variation::Increased => Cell::new("1").fg(Color::Red),
    }
}

fn check_cell(done: bool) -> Cell {
    if done {
        Cell::new("yes").fg(Color::Green)
    } else {
        Cell::new("no").fg(Color::DarkGrey)
    }
}

fn format_value(value: f64) -> String {
    if value.is_finite() { format!("{value:.4}") } else { value.to_string() }
}

/// One row per indicator, with its stratification underneath when `detailed`.
pub fn result_table(record: &ResultRecord, detailed: bool) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Indicator"),
        header_cell("Description"),
        header_cell("Value"),
        header_cell("Variation"),
    ]);

    for (key, indicator) in &record.indicators {
        table.add_row(vec![
            Cell::new(key).add_attribute(Attribute::Bold),
            Cell::new(key.description()),
            value_cell(indicator.value),
            variation_cell(indicator.variation),
        ]);
        if detailed {
            for stratum in &indicator.stratification {
                table.add_row(vec![
                    Cell::new(""),
                    Cell::new(format!("  {}", stratum.label)).fg(Color::DarkGrey),
                    value_cell(stratum.value),
                    Cell::new(""),
                ]);
            }
        }
    }
    table
}

pub fn outcome_summary(outcome: &ConsolidationOutcome) -> String {
    match outcome {
        ConsolidationOutcome::AllUpdated(report) => {
            format!("All {} variation flags applied.", report.expected())
        }
        ConsolidationOutcome::FirstConsolidation(_) => {
            "First consolidation: no preceding month to compare against.".to_string()
        }
        ConsolidationOutcome::Partial { applied, expected, .. } => {
            format!("Partial: {applied} of {expected} variation flags applied.")
        }
        ConsolidationOutcome::Failed { expected, .. } => {
            format!("Failed: none of {expected} variation flags could be applied.")
        }
    }
}

/// The flags that did not make it onto the stored document.
pub fn failed_items_table(outcome: &ConsolidationOutcome) -> Option<Table> {
    let failed = outcome.report().failed();
    if failed.is_empty() {
        return None;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Indicator"), header_cell("Flag"), header_cell("Reason")]);
    for item in failed {
        let reason = match &item.outcome {
            UpdateOutcome::Acknowledged(_) => "no matching document".to_string(),
            UpdateOutcome::Failed(message) => message.clone(),
        };
        table.add_row(vec![
            Cell::new(item.flag.indicator_key),
            variation_cell(item.flag.variation),
            Cell::new(reason).fg(Color::Red),
        ]);
    }
    Some(table)
}

pub fn history_table(history: &ConsolidationHistory) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Month"), header_cell("Submitted"), header_cell("Consolidated")]);
    for status in &history.months {
        let name = u8::try_from(status.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name().to_string())
            .unwrap_or_else(|| status.month.to_string());
        table.add_row(vec![
            Cell::new(name),
            check_cell(status.submitted),
            check_cell(status.consolidated),
        ]);
    }
    table
}

pub fn organizations_table(organizations: &[Organization]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("ID"), header_cell("Name")]);
    for organization in organizations {
        table.add_row(vec![
            Cell::new(organization.organization_id).set_alignment(CellAlignment::Right),
            Cell::new(&organization.name),
        ]);
    }
    table
}
