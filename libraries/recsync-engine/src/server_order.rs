//! Per-stream search order over remote servers

use recsync_core::types::{ServerId, Stream, StreamId};
use std::collections::BTreeMap;
use tracing::warn;

/// Parse a comma-separated server list. Blank and malformed entries are
/// skipped.
pub fn parse_server_list(value: &str) -> Vec<ServerId> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .filter_map(|part| match part.parse::<ServerId>() {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(entry = part, error = %e, "Skipping malformed server id in import order");
                None
            }
        })
        .collect()
}

/// Ordered candidate servers for every stream of a run. Built once, then
/// read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerOrder {
    orders: BTreeMap<StreamId, Vec<ServerId>>,
}

impl ServerOrder {
    /// Resolve orders from the global default and per-stream overrides.
    ///
    /// A non-empty override replaces the default. Streams with neither are
    /// left out.
    pub fn resolve(default_order: &str, streams: &[Stream]) -> Self {
        let general = parse_server_list(default_order);

        let orders = streams
            .iter()
            .filter_map(|stream| {
                let own = stream
                    .server_import_order
                    .as_deref()
                    .map(parse_server_list)
                    .unwrap_or_default();
                let order = if own.is_empty() { general.clone() } else { own };
                (!order.is_empty()).then_some((stream.id, order))
            })
            .collect();

        Self { orders }
    }

    /// Servers to consult for `stream_id`, in priority order
    pub fn servers_for(&self, stream_id: StreamId) -> &[ServerId] {
        self.orders.get(&stream_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StreamId, &[ServerId])> {
        self.orders.iter().map(|(id, order)| (*id, order.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recsync_core::types::StreamType;

    fn stream(id: StreamId, order: Option<&str>) -> Stream {
        Stream {
            id,
            name: format!("stream {}", id),
            enabled: true,
            stream_type: StreamType::Audio,
            server_import_order: order.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_skips_blank_and_malformed() {
        assert_eq!(parse_server_list(" 3, 1,,x, 2 "), vec![3, 1, 2]);
        assert!(parse_server_list("").is_empty());
    }

    #[test]
    fn test_override_replaces_default() {
        let order = ServerOrder::resolve(
            "1,2",
            &[stream(10, None), stream(11, Some("4,3")), stream(12, Some(" "))],
        );

        assert_eq!(order.servers_for(10), &[1, 2]);
        assert_eq!(order.servers_for(11), &[4, 3]);
        assert_eq!(order.servers_for(12), &[1, 2]);
        assert_eq!(order.len(), 3);
    }

    #[test]
    fn test_stream_without_any_order_is_omitted() {
        let order = ServerOrder::resolve("", &[stream(10, None), stream(11, Some("2"))]);

        assert_eq!(order.len(), 1);
        assert!(order.servers_for(10).is_empty());
        assert_eq!(order.servers_for(11), &[2]);
    }

    #[test]
    fn test_nothing_configured_is_empty() {
        assert!(ServerOrder::resolve("", &[stream(10, None)]).is_empty());
        assert!(ServerOrder::resolve("1,2", &[]).is_empty());
    }
}
