use super::{call_log_path, load_config};
use std::collections::BTreeMap;
use std::path::Path;
use tagwise_telemetry::{read_jsonl, CallOutcome, CallRecord};

pub fn run(config: Option<&Path>, stats: bool, limit: usize) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let path = call_log_path(&config)?;
    let records: Vec<CallRecord> = read_jsonl(&path)?;

    if records.is_empty() {
        println!("No calls recorded at {}", path.display());
        return Ok(());
    }

    if stats {
        println!("{}", compute_stats(&records));
        return Ok(());
    }

    let recent: Vec<_> = records.iter().rev().take(limit).collect();
    println!("Recent Calls (last {})", recent.len());
    println!("======================");
    for record in recent {
        println!("  {}", format_record(record));
    }
    Ok(())
}

fn format_record(record: &CallRecord) -> String {
    let mut line = format!(
        "{} | {} {}/{} | {:?} {}ms",
        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
        record.operation,
        record.provider,
        record.model,
        record.outcome,
        record.duration_ms,
    );
    if let Some(kind) = &record.error_kind {
        line.push_str(&format!(" [{kind}]"));
    }
    if let Some(user) = &record.correlation.user_id {
        line.push_str(&format!(" user:{user}"));
    }
    line
}

fn compute_stats(records: &[CallRecord]) -> String {
    let total = records.len();
    let count = |outcome: CallOutcome| records.iter().filter(|r| r.outcome == outcome).count();
    let avg_ms = records.iter().map(|r| r.duration_ms).sum::<u64>() / total.max(1) as u64;

    let mut by_kind: BTreeMap<&str, usize> = BTreeMap::new();
    for kind in records.iter().filter_map(|r| r.error_kind.as_deref()) {
        *by_kind.entry(kind).or_default() += 1;
    }

    let mut out = format!(
        "Total calls: {}\n\
         Succeeded: {}\n\
         Failed: {}\n\
         Timed out: {}\n\
         Cancelled: {}\n\
         Avg duration: {}ms",
        total,
        count(CallOutcome::Success),
        count(CallOutcome::Failure),
        count(CallOutcome::Timeout),
        count(CallOutcome::Cancelled),
        avg_ms
    );
    for (kind, n) in by_kind {
        out.push_str(&format!("\n  {kind}: {n}"));
    }
    out
}
