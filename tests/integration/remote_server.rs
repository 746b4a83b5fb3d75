use super::test_utils::connect_to_test_server;
use ferric_scp::client::{RemoteMode, RemoteOptions, ScpClient};
use ferric_scp::filesystem;
use ferric_scp::scp::{Context, FileInfos};
use std::io::Cursor;
use std::time::Duration;

#[test]
#[ignore] // Ignore by default since it needs a real server
fn test_push_then_pull_round_trip() {
    let client = connect_to_test_server().unwrap();
    let payload = b"integration test payload\n".to_vec();
    let infos = FileInfos::new("ferric_scp_it.txt", "0644", payload.len() as u64)
        .with_times(1610000000, 1609999000);
    let ctx = Context::background().with_timeout(Duration::from_secs(30));

    let mut push = client
        .open(
            RemoteMode::Sink,
            "/tmp",
            RemoteOptions {
                preserve_times: true,
                ..Default::default()
            },
            ctx.clone(),
        )
        .unwrap();
    push.upload_file(&infos, Cursor::new(payload.clone())).unwrap();
    assert_eq!(ScpClient::finish(push).unwrap(), 0);

    let mut pull = client
        .open(
            RemoteMode::Source,
            "/tmp/ferric_scp_it.txt",
            RemoteOptions {
                preserve_times: true,
                ..Default::default()
            },
            ctx,
        )
        .unwrap();
    let target = std::env::temp_dir();
    let report = pull
        .download(|infos| filesystem::create_file(&filesystem::destination_path(&target, infos)))
        .unwrap();
    assert_eq!(report.completed.len(), 1);
    assert_eq!(report.completed[0].filename, "ferric_scp_it.txt");
    assert_eq!(report.completed[0].modify_time, 1609999000);
    ScpClient::finish(pull).unwrap();

    let local = target.join("ferric_scp_it.txt");
    filesystem::apply_metadata(&local, &report.completed[0], true).unwrap();
    assert_eq!(std::fs::read(&local).unwrap(), payload);
    std::fs::remove_file(&local).unwrap();
}

#[test]
#[ignore]
fn test_pull_missing_file_reports_warning() {
    let client = connect_to_test_server().unwrap();
    let mut pull = client
        .open(
            RemoteMode::Source,
            "/path/that/does/not/exist",
            RemoteOptions::default(),
            Context::background(),
        )
        .unwrap();

    let result = pull.download(|_| Ok(Vec::new()));
    match result {
        Ok(report) => assert_eq!(report.failed.len(), 1),
        Err(e) => assert!(e.is_remote_failure()),
    }
}
