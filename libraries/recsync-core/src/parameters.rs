//! Parameter keys read through [`MetadataService`](crate::MetadataService)

use crate::types::StreamType;

/// Number of this server within the fleet
pub const SERVER_NUMBER: &str = "server_number";

pub const VIDEO_PROCESSING: &str = "is_video_processing";

/// Band streams are processed as video
pub const BAND_PROCESSING: &str = "is_band_processing";

/// Prefix of the task type registered for a sync run
pub const SYNC_TASK_PREFIX: &str = "records_sync";

/// Key holding the comma-separated default import order for a stream type
pub fn import_order_key(stream_type: StreamType) -> String {
    format!("server_order_{}_records_import", stream_type.as_str())
}

/// Key enabling processing of a stream type
pub fn processing_key(stream_type: StreamType) -> String {
    format!("is_{}_processing", stream_type.as_str())
}

/// Task type of a sync run; one run per stream type may hold it
pub fn sync_task_type(stream_type: StreamType) -> String {
    format!("{}_{}", SYNC_TASK_PREFIX, stream_type.as_str())
}

/// Whether a parameter value switches a feature on
pub fn is_enabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim() == "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_follow_stream_type() {
        assert_eq!(
            import_order_key(StreamType::Video),
            "server_order_video_records_import"
        );
        assert_eq!(processing_key(StreamType::Audio), "is_audio_processing");
        assert_eq!(processing_key(StreamType::Video), VIDEO_PROCESSING);
        assert_eq!(sync_task_type(StreamType::Audio), "records_sync_audio");
    }

    #[test]
    fn test_only_one_enables() {
        assert!(is_enabled(Some("1")));
        assert!(!is_enabled(Some("0")));
        assert!(!is_enabled(Some("true")));
        assert!(!is_enabled(None));
    }
}
