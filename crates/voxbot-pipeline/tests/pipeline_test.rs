#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use voxbot_pipeline::{
    ChatTransport, Pipeline, PipelineError, ProcessEngine, StagingArea, SynthesisEngine,
    Transcoder, ValidationFailure, VoiceMessage, MAX_CAPTION_CHARS,
};
use voxbot_types::{MessageRef, Request, RequesterId, VoiceId};

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

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[derive(Clone, Default)]
struct StubEngine {
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl StubEngine {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl SynthesisEngine for StubEngine {
    async fn synthesize(
        &self,
        dest: &Path,
        _text: &str,
        _voice: &VoiceId,
    ) -> Result<(), PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PipelineError::Synthesis("stub engine down".to_string()));
        }
        std::fs::write(dest, b"RIFF stub pcm").unwrap();
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingTransport {
    fail_voice: bool,
    texts: Arc<Mutex<Vec<String>>>,
    /// Delivered messages plus whether the file existed at send time.
    voices: Arc<Mutex<Vec<(VoiceMessage, bool)>>>,
}

impl RecordingTransport {
    fn rejecting() -> Self {
        Self {
            fail_voice: true,
            ..Self::default()
        }
    }
}

impl ChatTransport for RecordingTransport {
    async fn send_text(
        &self,
        _to: RequesterId,
        _reply_to: MessageRef,
        text: &str,
    ) -> Result<(), PipelineError> {
        self.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn send_voice(&self, message: &VoiceMessage) -> Result<(), PipelineError> {
        if self.fail_voice {
            return Err(PipelineError::Delivery("transport rejected file".to_string()));
        }
        self.voices
            .lock()
            .unwrap()
            .push((message.clone(), message.file.exists()));
        Ok(())
    }
}

fn make_pipeline(tmp: &Path, engine: StubEngine, ffmpeg_body: &str) -> Pipeline<StubEngine> {
    let ffmpeg = write_script(tmp, "ffmpeg", ffmpeg_body);
    Pipeline::new(
        engine,
        Transcoder::new(ffmpeg, Duration::from_secs(5)),
        StagingArea::new(tmp.join("outputs")),
    )
}

fn request(text: &str) -> Request {
    Request {
        requester: RequesterId(7),
        text: text.to_string(),
        voice: VoiceId::new("freeman"),
        reply_to: MessageRef(5),
    }
}

fn staging_is_empty(tmp: &Path) -> bool {
    let root = tmp.join("outputs");
    !root.exists() || std::fs::read_dir(&root).unwrap().next().is_none()
}

#[tokio::test]
async fn success_delivers_voice_with_caption_and_regenerate_button() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = make_pipeline(tmp.path(), StubEngine::default(), FFMPEG_OK);
    let transport = RecordingTransport::default();

    pipeline
        .run(&request("Hello [laughs] world"), &transport)
        .await
        .unwrap();

    let voices = transport.voices.lock().unwrap();
    assert_eq!(voices.len(), 1);
    let (message, file_existed) = &voices[0];
    assert_eq!(message.caption, "Hello [laughs] world");
    assert_eq!(message.regenerate, VoiceId::new("freeman"));
    assert_eq!(message.to, RequesterId(7));
    assert_eq!(message.reply_to, MessageRef(5));
    assert_eq!(message.file.extension().unwrap(), "ogg");
    assert!(file_existed, "artifact must exist at delivery time");

    assert!(staging_is_empty(tmp.path()), "staging cleared after success");
}

#[tokio::test]
async fn unpaired_bracket_rejected_before_synthesis() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = StubEngine::default();
    let pipeline = make_pipeline(tmp.path(), engine.clone(), FFMPEG_OK);
    let transport = RecordingTransport::default();

    let result = pipeline.run(&request("test [oops"), &transport).await;

    assert!(matches!(
        result,
        Err(PipelineError::Invalid(ValidationFailure::UnpairedBracket))
    ));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0, "no synthesis call");
    assert!(transport.voices.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_text_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = StubEngine::default();
    let pipeline = make_pipeline(tmp.path(), engine.clone(), FFMPEG_OK);
    let transport = RecordingTransport::default();

    let result = pipeline.run(&request(""), &transport).await;

    assert!(matches!(
        result,
        Err(PipelineError::Invalid(ValidationFailure::EmptyText))
    ));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn synthesis_failure_short_circuits_and_cleans_up() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = make_pipeline(tmp.path(), StubEngine::failing(), FFMPEG_OK);
    let transport = RecordingTransport::default();

    let result = pipeline.run(&request("Hello"), &transport).await;

    assert!(matches!(result, Err(PipelineError::Synthesis(_))));
    assert!(transport.voices.lock().unwrap().is_empty(), "delivery skipped");
    assert!(staging_is_empty(tmp.path()), "staging cleared after failure");
}

#[tokio::test]
async fn transcode_failure_skips_delivery_and_cleans_up() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = make_pipeline(tmp.path(), StubEngine::default(), FFMPEG_FAIL);
    let transport = RecordingTransport::default();

    let result = pipeline.run(&request("Hello"), &transport).await;

    assert!(matches!(result, Err(PipelineError::Transcode(_))));
    assert!(transport.voices.lock().unwrap().is_empty());
    assert!(staging_is_empty(tmp.path()));
}

#[tokio::test]
async fn delivery_failure_still_cleans_up() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = make_pipeline(tmp.path(), StubEngine::default(), FFMPEG_OK);
    let transport = RecordingTransport::rejecting();

    let result = pipeline.run(&request("Hello"), &transport).await;

    assert!(matches!(result, Err(PipelineError::Delivery(_))));
    assert!(staging_is_empty(tmp.path()));
}

#[tokio::test]
async fn regenerate_produces_distinct_artifact() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = make_pipeline(tmp.path(), StubEngine::default(), FFMPEG_OK);
    let transport = RecordingTransport::default();
    let req = request("Hello again");

    // Same text and voice, as the regenerate button replays them.
    pipeline.run(&req, &transport).await.unwrap();
    pipeline.run(&req, &transport).await.unwrap();

    let voices = transport.voices.lock().unwrap();
    assert_eq!(voices.len(), 2);
    assert_eq!(voices[0].0.caption, voices[1].0.caption);
    assert_eq!(voices[0].0.regenerate, voices[1].0.regenerate);
    assert_ne!(
        voices[0].0.file, voices[1].0.file,
        "each run stages a fresh artifact"
    );
}

#[tokio::test]
async fn regenerate_accepts_caption_truncated_inside_marker() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = StubEngine::default();
    let pipeline = make_pipeline(tmp.path(), engine.clone(), FFMPEG_OK);
    let transport = RecordingTransport::default();

    // The caption cut can land inside an emotion marker, leaving an
    // unpaired '[' in the delivered text.
    let text = format!("{}[laughs] tail", "a".repeat(MAX_CAPTION_CHARS - 2));
    pipeline.run(&request(&text), &transport).await.unwrap();

    let caption = transport.voices.lock().unwrap()[0].0.caption.clone();
    assert!(caption.contains('[') && !caption.contains(']'));

    // The regenerate button replays exactly that caption; it enters at the
    // synthesis stage, so the damaged marker must still reach the engine.
    pipeline
        .regenerate(&request(&caption), &transport)
        .await
        .unwrap();
    assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
    assert_eq!(transport.voices.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn hung_engine_times_out() {
    let tmp = tempfile::tempdir().unwrap();
    let binary = write_script(tmp.path(), "engine", "#!/bin/sh\nsleep 30\n");
    let engine = ProcessEngine::new(binary, Duration::from_millis(100));

    let dest = tmp.path().join("out.wav");
    let result = engine
        .synthesize(&dest, "Hello", &VoiceId::new("freeman"))
        .await;

    match result {
        Err(PipelineError::Synthesis(msg)) => assert!(msg.contains("timed out")),
        other => panic!("expected timeout error, got {other:?}"),
    }
}

#[tokio::test]
async fn long_text_is_truncated_in_caption() {
    let tmp = tempfile::tempdir().unwrap();
    let pipeline = make_pipeline(tmp.path(), StubEngine::default(), FFMPEG_OK);
    let transport = RecordingTransport::default();

    let text = "x".repeat(MAX_CAPTION_CHARS + 50);
    pipeline.run(&request(&text), &transport).await.unwrap();

    let voices = transport.voices.lock().unwrap();
    let caption = &voices[0].0.caption;
    assert_eq!(caption.len(), MAX_CAPTION_CHARS + 3);
    assert!(caption.ends_with("..."));
}
