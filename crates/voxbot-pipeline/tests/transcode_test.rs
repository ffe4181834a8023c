#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::time::Duration;
use voxbot_pipeline::{PipelineError, Transcoder};

/// ffmpeg stand-in: copies the `-i` input to the last argument.
const FFMPEG_OK: &str = r#"#!/bin/sh
in=""
out=""
prev=""
for a in "$@"; do
  if [ "$prev" = "-i" ]; then in="$a"; fi
  prev="$a"
  out="$a"
done
cp "$in" "$out"
"#;

/// ffmpeg stand-in that writes a partial output file and fails.
const FFMPEG_FAIL: &str = r#"#!/bin/sh
out=""
for a in "$@"; do out="$a"; done
echo partial > "$out"
exit 1
"#;

/// ffmpeg stand-in that hangs well past any test timeout.
const FFMPEG_HANG: &str = "#!/bin/sh\nsleep 30\n";

fn write_script(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("ffmpeg");
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn transcoder(tmp: &Path, body: &str) -> Transcoder {
    Transcoder::new(write_script(tmp, body), Duration::from_secs(5))
}

#[tokio::test]
async fn to_voice_produces_ogg_next_to_input() {
    let tmp = tempfile::tempdir().unwrap();
    let raw = tmp.path().join("7_1700000000.wav");
    std::fs::write(&raw, b"RIFF").unwrap();

    let out = transcoder(tmp.path(), FFMPEG_OK)
        .to_voice(&raw)
        .await
        .unwrap();

    assert_eq!(out, tmp.path().join("7_1700000000.ogg"));
    assert!(out.exists());
    assert!(raw.exists(), "forward conversion keeps the source");
}

#[tokio::test]
async fn to_voice_failure_removes_partial_output() {
    let tmp = tempfile::tempdir().unwrap();
    let raw = tmp.path().join("in.wav");
    std::fs::write(&raw, b"RIFF").unwrap();

    let result = transcoder(tmp.path(), FFMPEG_FAIL).to_voice(&raw).await;

    assert!(matches!(result, Err(PipelineError::Transcode(_))));
    assert!(
        !tmp.path().join("in.ogg").exists(),
        "partial output must be removed"
    );
}

#[tokio::test]
async fn to_voice_missing_binary_is_transcode_error() {
    let tmp = tempfile::tempdir().unwrap();
    let raw = tmp.path().join("in.wav");
    std::fs::write(&raw, b"RIFF").unwrap();

    let transcoder = Transcoder::new(tmp.path().join("no-such-ffmpeg"), Duration::from_secs(5));
    let result = transcoder.to_voice(&raw).await;

    assert!(matches!(result, Err(PipelineError::Transcode(_))));
}

#[tokio::test]
async fn hung_conversion_times_out() {
    let tmp = tempfile::tempdir().unwrap();
    let raw = tmp.path().join("in.wav");
    std::fs::write(&raw, b"RIFF").unwrap();

    let transcoder = Transcoder::new(
        write_script(tmp.path(), FFMPEG_HANG),
        Duration::from_millis(100),
    );
    let result = transcoder.to_voice(&raw).await;

    match result {
        Err(PipelineError::Transcode(msg)) => assert!(msg.contains("timed out")),
        other => panic!("expected timeout error, got {other:?}"),
    }
}

#[tokio::test]
async fn to_raw_removes_source_on_success() {
    let tmp = tempfile::tempdir().unwrap();
    let voice = tmp.path().join("sample.ogg");
    std::fs::write(&voice, b"OggS").unwrap();

    let out = transcoder(tmp.path(), FFMPEG_OK).to_raw(&voice).await.unwrap();

    assert_eq!(out, tmp.path().join("sample.wav"));
    assert!(out.exists());
    assert!(!voice.exists(), "source removed after ingestion");
}

#[tokio::test]
async fn to_raw_removes_source_and_partial_on_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let voice = tmp.path().join("sample.ogg");
    std::fs::write(&voice, b"OggS").unwrap();

    let result = transcoder(tmp.path(), FFMPEG_FAIL).to_raw(&voice).await;

    assert!(matches!(result, Err(PipelineError::Transcode(_))));
    assert!(!voice.exists(), "source removed even on failure");
    assert!(!tmp.path().join("sample.wav").exists());
}
