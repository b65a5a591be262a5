//! Uploading result tables to a record store

use crate::output::table::TabularRow;
use crate::output::traits::{RecordStore, UploadReport};
use crate::state::BatchState;

/// Uploads every row of one table, continuing past rejected records
pub async fn upload_rows<R: TabularRow>(store: &dyn RecordStore, rows: &[R]) -> UploadReport {
    let mut report = UploadReport {
        table: R::TABLE.to_string(),
        ..Default::default()
    };

    for (index, row) in rows.iter().enumerate() {
        let record = row.to_record();
        match store.upsert(R::TABLE, &record, R::KEY_COLUMNS).await {
            Ok(()) => report.uploaded += 1,
            Err(e) => {
                tracing::warn!("Failed to upload {} row {}: {}", R::TABLE, index, e);
                report.failures.push((index, e.to_string()));
            }
        }
    }

    tracing::info!(
        "Uploaded {}/{} {} rows",
        report.uploaded,
        rows.len(),
        R::TABLE
    );
    report
}

/// Uploads the four batch tables in order: pages, content, assets, links
pub async fn upload_batch(store: &dyn RecordStore, state: &BatchState) -> Vec<UploadReport> {
    vec![
        upload_rows(store, &state.page_rows).await,
        upload_rows(store, &state.content_rows).await,
        upload_rows(store, &state.asset_rows).await,
        upload_rows(store, &state.link_rows).await,
    ]
}
