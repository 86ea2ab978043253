//! Shared terminal rendering for previews, conflicts and operations

use colored::{ColoredString, Colorize};
use kwiz_core::diff::inline_text_diff;
use kwiz_core::{
    ChangeAction, ChangeDetails, ChangeItem, ConflictResolution, DataFreshness, OperationStatus,
    Resolution, RiskLevel, SyncOperation, SyncPreview,
};
use serde::Serialize;

use crate::error::Result;

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn risk_label(risk: RiskLevel) -> ColoredString {
    match risk {
        RiskLevel::Safe => "SAFE".green().bold(),
        RiskLevel::Caution => "CAUTION".yellow().bold(),
        RiskLevel::Destructive => "DESTRUCTIVE".red().bold(),
    }
}

pub fn status_label(status: OperationStatus) -> ColoredString {
    match status {
        OperationStatus::Pending => "pending".dimmed(),
        OperationStatus::Completed => "completed".green(),
        OperationStatus::Failed => "failed".red(),
        OperationStatus::RolledBack => "rolled back".yellow(),
    }
}

fn freshness_label(freshness: DataFreshness) -> ColoredString {
    match freshness {
        DataFreshness::Fresh => "fresh".green(),
        DataFreshness::Stale => "stale".yellow(),
        DataFreshness::Outdated => "outdated".red(),
    }
}

fn action_marker(action: ChangeAction) -> ColoredString {
    match action {
        ChangeAction::Add => "+".green(),
        ChangeAction::Modify => "~".yellow(),
        ChangeAction::Delete => "-".red(),
    }
}

/// One line per change, plus a word diff when a question's text changed
pub fn print_changes(changes: &[ChangeItem]) {
    for change in changes {
        println!(
            "   {} {} {}",
            action_marker(change.action),
            change.impact,
            format!("[{} -> {}]", change.risk_level, change.target).dimmed()
        );

        if let ChangeDetails::Question { changes: fields, .. } = &change.details
            && let Some(text) = fields.get("question")
            && let (Some(old), Some(new)) = (text.old.as_str(), text.new.as_str())
        {
            println!("       {}", inline_text_diff(old, new).dimmed());
        }
    }
}

pub fn print_conflicts(conflicts: &[ConflictResolution]) {
    for conflict in conflicts {
        let how = match conflict.resolution {
            Resolution::AdminWins => "admin wins".cyan(),
            Resolution::FrontendWins => "frontend wins".cyan(),
            Resolution::Merge => "merged".green(),
            Resolution::Manual => "needs resolution".red().bold(),
        };
        println!(
            "   {} {} ({}): admin {} / frontend {}",
            "!".yellow(),
            conflict.field.cyan(),
            how,
            display(conflict.admin_value.as_ref()),
            display(conflict.frontend_value.as_ref())
        );
    }
}

fn display(value: Option<&serde_json::Value>) -> String {
    value.map_or_else(|| "<deleted>".to_string(), kwiz_core::diff::display_value)
}

/// Full human-readable preview
pub fn print_preview(preview: &SyncPreview) {
    let summary = &preview.summary;
    println!(
        "{} {} preview: {} change(s), risk {}",
        "=>".blue().bold(),
        preview.operation.op_type,
        summary.total_changes,
        risk_label(preview.risk_level())
    );
    println!(
        "   {} safe, {} caution, {} destructive (about {} ms)",
        summary.safe_changes, summary.caution_changes, summary.destructive_changes, summary.estimated_duration
    );
    println!(
        "   data: admin {}, frontend {}",
        freshness_label(preview.data_freshness.admin),
        freshness_label(preview.data_freshness.frontend)
    );

    if preview.operation.changes.is_empty() {
        println!();
        println!("{} Stores are already in sync.", "OK".green().bold());
    } else {
        println!();
        println!("{}:", "Changes".bold());
        print_changes(&preview.operation.changes);
    }

    if !preview.conflicts.is_empty() {
        println!();
        println!("{}:", "Conflicts".bold());
        print_conflicts(&preview.conflicts);
    }
}

/// Single history line
pub fn print_operation(operation: &SyncOperation) {
    println!(
        "   {} {} {:<5} {} {} {} change(s)",
        operation.id.to_string()[..8].cyan(),
        operation.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
        operation.op_type.to_string(),
        status_label(operation.status),
        risk_label(operation.risk_level),
        operation.changes.len()
    );
    if let Some(error) = &operation.error {
        println!("      {} {}", "!".red(), error);
    }
}
