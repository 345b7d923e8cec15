use recsync_cli::{parse_datetime, Cli, CliError};
use recsync_core::types::{StreamType, SyncWindowSpec};

fn request(args: &[&str]) -> Result<recsync_core::types::SyncRequest, CliError> {
    let cli = Cli::parse_from_args(std::iter::once("recsync").chain(args.iter().copied()))
        .map_err(|e| CliError::Usage(e.to_string()))?;
    cli.command.into_request()
}

#[test]
fn test_period_with_single_dash_options() {
    let request = request(&[
        "period",
        "-start",
        "2024-03-01 00:00",
        "-end",
        "2024-03-02 00:00",
        "-stream_type",
        "audio",
        "-stream_id",
        "10",
        "-sync",
    ])
    .unwrap();

    assert_eq!(
        request.window,
        SyncWindowSpec::Period {
            start: parse_datetime("2024-03-01 00:00").unwrap(),
            end: parse_datetime("2024-03-02 00:00").unwrap(),
        }
    );
    assert_eq!(request.stream_type, StreamType::Audio);
    assert_eq!(request.stream_id, Some(10));
    assert!(request.sync);
    assert!(!request.add_mode);
    assert!(!request.no_task);
}

#[test]
fn test_auto_days_and_hours() {
    let days = request(&["auto", "-days", "2", "-stream_type", "video", "-add_mode"]).unwrap();
    assert_eq!(days.window, SyncWindowSpec::Days(2));
    assert_eq!(days.stream_type, StreamType::Video);
    assert!(days.add_mode);

    let hours = request(&["auto", "--hours", "6", "--stream_type", "audio", "--no_task"]).unwrap();
    assert_eq!(hours.window, SyncWindowSpec::Hours(6));
    assert!(hours.no_task);
}

#[test]
fn test_auto_requires_exactly_one_span() {
    assert!(request(&["auto", "-stream_type", "audio"]).is_err());
    assert!(request(&["auto", "-days", "1", "-hours", "2", "-stream_type", "audio"]).is_err());
}

#[test]
fn test_invalid_arguments_are_usage_errors() {
    let cases: [&[&str]; 5] = [
        // end before start
        &[
            "period",
            "-start",
            "2024-03-02 00:00",
            "-end",
            "2024-03-01 00:00",
            "-stream_type",
            "audio",
        ],
        &[
            "period",
            "-start",
            "March 1st",
            "-end",
            "2024-03-01 00:00",
            "-stream_type",
            "audio",
        ],
        &["auto", "-days", "1", "-stream_type", "radio"],
        &["auto", "-days", "0", "-stream_type", "audio"],
        &["auto", "-days", "1"],
    ];

    for args in cases {
        match request(args) {
            Err(e @ CliError::Usage(_)) => assert_eq!(e.exit_code(), 1),
            other => panic!("{:?} should be a usage error, got {:?}", args, other),
        }
    }
}

#[test]
fn test_config_flag_is_global() {
    let cli = Cli::parse_from_args([
        "recsync",
        "auto",
        "-hours",
        "1",
        "-stream_type",
        "audio",
        "-config",
        "/etc/recsync.toml",
        "-json",
    ])
    .unwrap();

    assert!(cli.json);
    assert_eq!(
        cli.config.as_deref(),
        Some(std::path::Path::new("/etc/recsync.toml"))
    );
}
