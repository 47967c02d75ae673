//! Concurrent value search.
//!
//! Eligible tables are scanned through a bounded pool of `workers` concurrent
//! scans. Each scan has its own timeout, and the whole search has a deadline;
//! when it passes, scans still in flight are dropped and the results
//! collected so far are returned.

use super::SearchSettings;
use super::scanner::TableScanner;
use crate::error::{ExplorerError, ExplorerResult};
use crate::models::{Catalog, MAX_ROW_LIMIT, SearchResult, Table, ValueSearchReport};
use futures_util::StreamExt;
use futures_util::stream;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, info, warn};

/// Whether `table` takes part in a value search.
fn is_eligible(table: &Table, skip_prefixes: &[String]) -> bool {
    if skip_prefixes.iter().any(|p| table.name.starts_with(p.as_str())) {
        return false;
    }
    table.exists && table.string_columns().next().is_some()
}

/// Search row values of every eligible catalog table for `term`.
///
/// `limit` is clamped to `1..=MAX_ROW_LIMIT` rows per table. Results are
/// ordered by table name. Fails with
/// [`ExplorerError::NoSearchableTables`] only when no scan succeeded, at
/// least one failed, and the deadline did not cut the search short.
pub async fn search_by_value(
    catalog: &Catalog,
    scanner: &dyn TableScanner,
    term: &str,
    limit: Option<u32>,
    settings: &SearchSettings,
) -> ExplorerResult<ValueSearchReport> {
    if term.is_empty() {
        return Err(ExplorerError::invalid_input("Search term cannot be empty"));
    }

    let limit = limit.unwrap_or(settings.row_limit).clamp(1, MAX_ROW_LIMIT);
    let table_timeout = settings.table_timeout;
    let eligible: Vec<Table> = catalog
        .tables
        .values()
        .filter(|t| is_eligible(t, &settings.skip_prefixes))
        .cloned()
        .collect();
    let eligible_count = eligible.len();

    debug!(
        term = %term,
        tables = eligible_count,
        workers = settings.workers,
        "Starting value search"
    );

    let deadline = Instant::now() + settings.deadline;
    let mut scans = stream::iter(eligible.into_iter().enumerate())
        .map(|(index, table)| async move {
            let started = Instant::now();
            let outcome = match timeout(table_timeout, scanner.scan(&table, term, limit)).await {
                Ok(Ok(rows)) => Ok(rows),
                Ok(Err(e)) => Err(ExplorerError::scan_failed(&table.name, e.to_string())),
                Err(_) => Err(ExplorerError::scan_timeout(
                    &table.name,
                    started.elapsed().as_millis() as u64,
                )),
            };
            (index, table.name, outcome)
        })
        .buffer_unordered(settings.workers.max(1));

    let mut collected = Vec::new();
    let mut scanned = 0usize;
    let mut failed = 0usize;
    let mut deadline_expired = false;

    loop {
        match timeout_at(deadline, scans.next()).await {
            Ok(Some((index, table, Ok(rows)))) => {
                scanned += 1;
                if !rows.is_empty() {
                    debug!(table = %table, matches = rows.len(), "Table matched");
                    let count = rows.len();
                    collected.push((
                        index,
                        SearchResult::Value {
                            table,
                            matches: rows,
                            count,
                        },
                    ));
                }
            }
            Ok(Some((_, table, Err(e)))) => {
                failed += 1;
                warn!(table = %table, error = %e, "Skipping table in value search");
            }
            Ok(None) => break,
            Err(_) => {
                deadline_expired = true;
                warn!(
                    completed = scanned + failed,
                    total = eligible_count,
                    "Value search deadline expired, returning partial results"
                );
                break;
            }
        }
    }
    drop(scans);

    if !deadline_expired && scanned == 0 && failed > 0 {
        return Err(ExplorerError::NoSearchableTables { failed });
    }

    collected.sort_by_key(|(index, _)| *index);
    let results: Vec<SearchResult> = collected.into_iter().map(|(_, r)| r).collect();

    info!(
        term = %term,
        results = results.len(),
        scanned,
        skipped = failed,
        deadline_expired,
        "Value search finished"
    );

    Ok(ValueSearchReport {
        results,
        scanned,
        skipped: failed + eligible_count.saturating_sub(scanned + failed),
        deadline_expired,
    })
}
