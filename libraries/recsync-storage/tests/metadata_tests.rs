mod test_helpers;

use recsync_core::types::{Stream, StreamType};
use recsync_core::{MetadataService, RecSyncError, RecordStore};
use recsync_storage::{parameters, streams, LocalRecordStore, SqliteMetadataService};
use test_helpers::TestDb;

fn stream(id: i64, stream_type: StreamType, enabled: bool, order: Option<&str>) -> Stream {
    Stream {
        id,
        name: format!("Stream {}", id),
        enabled,
        stream_type,
        server_import_order: order.map(str::to_string),
    }
}

#[tokio::test]
async fn test_parameters_round_trip_and_overwrite() {
    let db = TestDb::new().await;
    let metadata = SqliteMetadataService::new(db.pool.clone());

    assert_eq!(metadata.get_parameter("server_number").await.unwrap(), None);

    parameters::set(db.pool(), "server_number", "2").await.unwrap();
    parameters::set(db.pool(), "server_number", "3").await.unwrap();

    assert_eq!(
        metadata.get_parameter("server_number").await.unwrap(),
        Some("3".to_string())
    );
}

#[tokio::test]
async fn test_stream_name_lookup() {
    let db = TestDb::new().await;
    let metadata = SqliteMetadataService::new(db.pool.clone());
    streams::upsert(db.pool(), &stream(7, StreamType::Audio, true, None))
        .await
        .unwrap();

    assert_eq!(metadata.stream_name(7).await.unwrap(), "Stream 7");
    assert!(matches!(
        metadata.stream_name(8).await,
        Err(RecSyncError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_select_streams_filters_type_enabled_and_id() {
    let db = TestDb::new().await;
    let store = LocalRecordStore::new(db.pool.clone());

    for s in [
        stream(1, StreamType::Audio, true, Some("2,3")),
        stream(2, StreamType::Audio, false, None),
        stream(3, StreamType::Video, true, None),
        stream(4, StreamType::Audio, true, None),
    ] {
        streams::upsert(db.pool(), &s).await.unwrap();
    }

    let audio = store.select_streams(StreamType::Audio, None).await.unwrap();
    assert_eq!(audio.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 4]);
    assert_eq!(audio[0].server_import_order.as_deref(), Some("2,3"));

    let single = store.select_streams(StreamType::Audio, Some(4)).await.unwrap();
    assert_eq!(single.len(), 1);

    let wrong_type = store.select_streams(StreamType::Video, Some(4)).await.unwrap();
    assert!(wrong_type.is_empty());
}
