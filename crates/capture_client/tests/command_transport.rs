#![cfg(unix)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::Path,
    time::{Duration, Instant},
};

use capture_client::{CommandTransport, Envelope, Transport, TransportError};

fn write_script(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("uploader");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

fn envelope() -> Envelope {
    Envelope {
        event_id: "0123456789abcdef0123456789abcdef".to_string(),
        store_url: "https://errors.example.com/api/42/store/".to_string(),
        auth_header: "Sentry sentry_version=7, sentry_key=public".to_string(),
        body: br#"{"message":"hi"}"#.to_vec(),
    }
}

#[tokio::test]
async fn pipes_body_and_exposes_destination_in_env() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        r#"cat > "$OUT_DIR/body.json"
printf '%s' "$CAPTURE_STORE_URL" > "$OUT_DIR/url"
printf '%s' "$CAPTURE_EVENT_ID" > "$OUT_DIR/id""#,
    );
    let transport = CommandTransport::new()
        .binary(&script)
        .env("OUT_DIR", dir.path().to_string_lossy());

    transport.send(&envelope()).await.unwrap();

    assert_eq!(
        fs::read(dir.path().join("body.json")).unwrap(),
        br#"{"message":"hi"}"#
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("url")).unwrap(),
        "https://errors.example.com/api/42/store/"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("id")).unwrap(),
        "0123456789abcdef0123456789abcdef"
    );
}

#[tokio::test]
async fn non_zero_exit_reports_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "cat > /dev/null\necho 'upstream rejected' >&2\nexit 22",
    );
    let transport = CommandTransport::new().binary(&script);

    let err = transport.send(&envelope()).await.unwrap_err();
    match err {
        TransportError::NonZeroExit { status, stderr } => {
            assert_eq!(status.code(), Some(22));
            assert_eq!(stderr, "upstream rejected");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn slow_uploader_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "cat > /dev/null\nsleep 5");
    let transport = CommandTransport::new()
        .binary(&script)
        .timeout(Some(Duration::from_millis(100)));

    let err = transport.send(&envelope()).await.unwrap_err();
    assert!(matches!(err, TransportError::Timeout { .. }), "{err:?}");
}

#[tokio::test]
async fn missing_binary_is_a_spawn_error() {
    let dir = tempfile::tempdir().unwrap();
    let transport = CommandTransport::new().binary(dir.path().join("does-not-exist"));

    let err = transport.send(&envelope()).await.unwrap_err();
    assert!(matches!(err, TransportError::Spawn { .. }), "{err:?}");
}

#[tokio::test]
async fn timeout_covers_body_write_to_stalled_uploader() {
    let dir = tempfile::tempdir().unwrap();
    // Never reads stdin, so a body larger than the pipe buffer blocks the write.
    let script = write_script(dir.path(), "sleep 3");
    let transport = CommandTransport::new()
        .binary(&script)
        .timeout(Some(Duration::from_millis(200)));
    let envelope = Envelope {
        body: vec![b'x'; 1 << 20],
        ..envelope()
    };

    let started = Instant::now();
    let err = transport.send(&envelope).await.unwrap_err();

    assert!(matches!(err, TransportError::Timeout { .. }), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(2), "{:?}", started.elapsed());
}

#[tokio::test]
async fn uploader_exiting_early_with_success_reports_the_failed_write() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "exit 0");
    let transport = CommandTransport::new().binary(&script);
    let envelope = Envelope {
        body: vec![b'x'; 1 << 20],
        ..envelope()
    };

    let err = transport.send(&envelope).await.unwrap_err();
    assert!(matches!(err, TransportError::StdinWrite(_)), "{err:?}");
}

#[tokio::test]
async fn binary_from_env_is_resolved_at_construction() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), r#"cat > "$OUT_DIR/body.json""#);

    std::env::set_var("CAPTURE_TRANSPORT_BINARY", &script);
    let transport = CommandTransport::new().env("OUT_DIR", dir.path().to_string_lossy());
    std::env::remove_var("CAPTURE_TRANSPORT_BINARY");

    assert_eq!(transport.binary_path(), script.as_path());
    transport.send(&envelope()).await.unwrap();
    assert_eq!(
        fs::read(dir.path().join("body.json")).unwrap(),
        br#"{"message":"hi"}"#
    );
}
