use crate::output::print_table;
use playlist_core::reconcile::{DetachOutcome, ReconcileReport};
use playlist_core::{RunOutcome, StepOutcome};
use serde_json::{json, Value};

fn outcome_text(outcome: &StepOutcome) -> String {
    match outcome {
        StepOutcome::Succeeded => "ok".to_string(),
        StepOutcome::Failed(body) => format!("failed: {body}"),
    }
}

fn detach_text(outcome: &DetachOutcome) -> String {
    match outcome {
        DetachOutcome::Nothing => "none".to_string(),
        DetachOutcome::Detached(n) => format!("{n} detached"),
        DetachOutcome::Failed(body) => format!("failed: {body}"),
    }
}

fn reconcile_text(r: &ReconcileReport) -> String {
    let detached: Vec<String> = r
        .detached
        .iter()
        .map(|(kind, outcome)| format!("{} {}", kind.as_str(), detach_text(outcome)))
        .collect();
    format!("{}; delete {}", detached.join(", "), outcome_text(&r.deleted))
}

/// Print the step table followed by the overview body, if any.
pub fn print(outcome: &RunOutcome) {
    let report = &outcome.report;
    let mut rows: Vec<Vec<String>> = Vec::new();

    if let Some(id) = report.screen_id {
        rows.push(vec!["screen".into(), id.to_string(), "found".into()]);
    }
    if let Some(asset) = report.asset {
        let how = if asset.reused { "reused" } else { "uploaded" };
        rows.push(vec!["media file".into(), asset.id.to_string(), how.into()]);
    }
    for r in &report.reconciled {
        rows.push(vec![
            "replace playlist".into(),
            r.playlist_id.to_string(),
            reconcile_text(r),
        ]);
    }
    if let Some(id) = report.playlist_id {
        rows.push(vec!["create playlist".into(), id.to_string(), "ok".into()]);
    }
    for record in &report.steps {
        rows.push(vec![
            record.step.label().into(),
            String::new(),
            outcome_text(&record.outcome),
        ]);
    }

    print_table(&["STEP", "ID", "RESULT"], rows);

    match &outcome.fatal {
        Some(fatal) => println!("\naborted: {fatal}"),
        None => println!(
            "\nfinished: {} of {} steps failed",
            outcome.failed_steps(),
            report.steps.len()
        ),
    }

    if let Some(overview) = &report.overview {
        let body = serde_json::to_string_pretty(overview).unwrap_or_else(|_| overview.to_string());
        println!("\nOverview:\n{body}");
    }
}

pub fn to_json(outcome: &RunOutcome) -> Value {
    let report = &outcome.report;
    json!({
        "exit_code": outcome.exit_status().code(),
        "fatal": outcome.fatal.as_ref().map(|e| e.to_string()),
        "screen_id": report.screen_id,
        "asset": report.asset.map(|a| json!({ "id": a.id, "reused": a.reused })),
        "replaced": report.reconciled.iter().map(|r| json!({
            "playlist_id": r.playlist_id,
            "detail": reconcile_text(r),
            "deleted": r.deleted.is_success(),
        })).collect::<Vec<_>>(),
        "playlist_id": report.playlist_id,
        "steps": report.steps.iter().map(|s| json!({
            "step": s.step.label(),
            "ok": s.outcome.is_success(),
            "result": outcome_text(&s.outcome),
        })).collect::<Vec<_>>(),
        "overview": report.overview,
    })
}
