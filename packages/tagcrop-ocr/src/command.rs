use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::engine::{DetectionError, DetectionInput, TextDetector};
use crate::region::Detection;
use crate::wire::parse_detections;

/// Runs an external recognizer process per image.
///
/// Image bytes are written to the child's stdin (file inputs are passed as the last argument)
/// and stdout must be the JSON triple array understood by [`parse_detections`]. Recognizers
/// usually hold a model in memory, so concurrent invocations are capped by `max_parallel`.
pub struct CommandDetector {
    program: PathBuf,
    args: Vec<String>,
    permits: Arc<Semaphore>,
}

impl CommandDetector {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            permits: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(max_parallel.max(1)));
        self
    }
}

fn run_recognizer(
    program: &Path,
    args: &[String],
    input: DetectionInput,
) -> Result<Vec<u8>, DetectionError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let stdin_data = match input {
        DetectionInput::FilePath(path) => {
            command.arg(path).stdin(Stdio::null());
            None
        }
        DetectionInput::Bytes(data) => {
            command.stdin(Stdio::piped());
            Some(data)
        }
    };

    let mut child = command.spawn().map_err(|e| {
        DetectionError::EngineError(format!("failed to spawn {}: {e}", program.display()))
    })?;

    // Feed stdin from a separate thread so a chatty child cannot fill stdout and deadlock us.
    let writer = match (stdin_data, child.stdin.take()) {
        (Some(data), Some(mut stdin)) => Some(std::thread::spawn(move || stdin.write_all(&data))),
        _ => None,
    };

    let output = child
        .wait_with_output()
        .map_err(|e| DetectionError::EngineError(e.to_string()))?;

    if let Some(writer) = writer {
        match writer.join() {
            Ok(Ok(())) => {}
            // The recognizer may legitimately exit before draining stdin; its status decides.
            Ok(Err(e)) => debug!("recognizer closed stdin early: {e}"),
            Err(_) => {
                return Err(DetectionError::EngineError(
                    "stdin writer thread panicked".into(),
                ))
            }
        }
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DetectionError::EngineError(format!(
            "{} exited with {}: {}",
            program.display(),
            output.status,
            stderr.trim()
        )));
    }

    Ok(output.stdout)
}

#[async_trait]
impl TextDetector for CommandDetector {
    async fn detect(&self, input: &DetectionInput) -> Result<Vec<Detection>, DetectionError> {
        if matches!(input, DetectionInput::Bytes(data) if data.is_empty()) {
            return Err(DetectionError::InvalidInput("empty image bytes".into()));
        }

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| DetectionError::EngineError(e.to_string()))?;

        let program = self.program.clone();
        let args = self.args.clone();
        let input = input.clone();
        let stdout = tokio::task::spawn_blocking(move || run_recognizer(&program, &args, input))
            .await
            .map_err(|e| DetectionError::EngineError(e.to_string()))??;

        let detections = parse_detections(&stdout)?;
        debug!(
            "{} reported {} detections",
            self.program.display(),
            detections.len()
        );
        Ok(detections)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> CommandDetector {
        CommandDetector::new("sh").with_args(["-c", script])
    }

    #[tokio::test]
    async fn test_detect_reads_stdout() {
        let detector = shell(
            r#"cat > /dev/null; echo '[[[[10,50],[30,50],[30,80],[10,80]],"50% off",0.9]]'"#,
        );
        let detections = detector
            .detect(&DetectionInput::Bytes(vec![0u8; 256 * 1024]))
            .await
            .unwrap();

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].text, "50% off");
    }

    #[tokio::test]
    async fn test_detect_passes_file_path_argument() {
        let detector = shell(r#"test "$0" = /tmp/shelf.jpg && echo '[]'"#);
        let detections = detector
            .detect(&DetectionInput::FilePath(PathBuf::from("/tmp/shelf.jpg")))
            .await
            .unwrap();
        assert!(detections.is_empty());
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_engine_error() {
        let detector = shell("echo 'model not loaded' >&2; exit 3");
        let err = detector
            .detect(&DetectionInput::Bytes(vec![0u8; 16]))
            .await
            .unwrap_err();
        assert!(matches!(err, DetectionError::EngineError(msg) if msg.contains("model not loaded")));
    }

    #[tokio::test]
    async fn test_garbage_output_is_malformed() {
        let detector = shell("echo 'not json'");
        let err = detector
            .detect(&DetectionInput::Bytes(vec![0u8; 16]))
            .await
            .unwrap_err();
        assert!(matches!(err, DetectionError::MalformedOutput(_)));
    }

    #[tokio::test]
    async fn test_missing_program_is_engine_error() {
        let detector = CommandDetector::new("/nonexistent/recognizer");
        let err = detector
            .detect(&DetectionInput::Bytes(vec![0u8; 16]))
            .await
            .unwrap_err();
        assert!(matches!(err, DetectionError::EngineError(msg) if msg.contains("failed to spawn")));
    }

    #[tokio::test]
    async fn test_empty_bytes_are_rejected_without_spawning() {
        let detector = CommandDetector::new("/nonexistent/recognizer");
        let err = detector
            .detect(&DetectionInput::Bytes(Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, DetectionError::InvalidInput(_)));
    }
}
