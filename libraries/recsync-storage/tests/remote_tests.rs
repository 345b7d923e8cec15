mod test_helpers;

use recsync_core::types::{RecordColumn, RecordFilter};
use recsync_core::{RecordSource, RemoteServers};
use recsync_storage::SqliteRemoteRegistry;
use std::collections::HashMap;
use std::time::Duration;
use test_helpers::*;

#[tokio::test]
async fn test_registry_reads_remote_records() {
    let remote = TestDb::new().await;
    let id = insert_record_row(remote.pool(), &sample_record(1, at(0, 0), at(1, 0))).await;

    let registry = SqliteRemoteRegistry::new(
        HashMap::from([(2, remote.url.clone())]),
        Duration::from_secs(5),
    );

    let source = registry.source(2).await.expect("remote 2 is configured");
    let rows = source
        .select_records(&RecordFilter::new().order_by(RecordColumn::Id, false))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, id);

    // Served from the cache on the second lookup
    assert!(registry.source(2).await.is_some());
}

#[tokio::test]
async fn test_unknown_or_unreachable_remote_yields_none() {
    let dir = tempfile::tempdir().unwrap();
    let missing = format!("sqlite://{}", dir.path().join("absent.db").display());

    let registry = SqliteRemoteRegistry::new(
        HashMap::from([(3, missing)]),
        Duration::from_secs(1),
    );

    assert!(registry.source(9).await.is_none());
    assert!(registry.source(3).await.is_none());
    assert_eq!(registry.server_ids(), vec![3]);
}

#[tokio::test]
async fn test_unreachable_remote_does_not_hold_back_others() {
    let remote = TestDb::new().await;
    insert_record_row(remote.pool(), &sample_record(1, at(0, 0), at(1, 0))).await;
    let dir = tempfile::tempdir().unwrap();
    let missing = format!("sqlite://{}", dir.path().join("gone/absent.db").display());

    let registry = SqliteRemoteRegistry::new(
        HashMap::from([(2, remote.url.clone()), (3, missing)]),
        Duration::from_secs(1),
    );

    let (unreachable, reachable) = tokio::join!(registry.source(3), registry.source(2));
    assert!(unreachable.is_none());
    let rows = reachable
        .expect("remote 2 is reachable")
        .select_records(&RecordFilter::new())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);

    // The failed connect is remembered, not retried per lookup
    assert_eq!(registry.unreachable_servers(), vec![3]);
    assert!(registry.source(3).await.is_none());
    assert_eq!(registry.unreachable_servers(), vec![3]);
}
