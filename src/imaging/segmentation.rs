//! Background segmentation boundary.
//!
//! Removal of backgrounds is delegated to an external capability that takes
//! encoded image bytes and returns encoded image bytes with an alpha
//! channel. The default implementation shells out to a configurable command
//! (`rembg i` unless overridden) and speaks to it over stdin/stdout.

use std::io::{self, Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

const STDERR_SNIPPET_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum SegmentationError {
    #[error("failed to launch segmentation command `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("i/o error talking to segmentation command: {0}")]
    Io(#[from] io::Error),
    #[error("segmentation command exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
    #[error("segmentation command produced no output")]
    EmptyOutput,
}

/// Bytes-in/bytes-out segmentation capability.
///
/// Implementations receive an encoded image and return an encoded image
/// whose alpha channel marks the subject. They must be callable from
/// multiple worker threads at once.
pub trait SegmentationBackend: Send + Sync {
    fn segment(&self, image_bytes: &[u8]) -> Result<Vec<u8>, SegmentationError>;
}

/// Runs an external command, piping the image through stdin/stdout.
pub struct CommandSegmenter {
    program: String,
    args: Vec<String>,
}

impl CommandSegmenter {
    pub fn new(
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for CommandSegmenter {
    fn default() -> Self {
        Self::new("rembg", ["i"])
    }
}

impl SegmentationBackend for CommandSegmenter {
    fn segment(&self, image_bytes: &[u8]) -> Result<Vec<u8>, SegmentationError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SegmentationError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdin = child.stdin.take();
        let stderr_pipe = child.stderr.take();
        let mut stdout = Vec::new();

        // Feed stdin and drain stderr on scoped threads while stdout is read
        // here, so a child filling any pipe in any order can never stall the
        // exchange. rembg streams model-download progress to stderr before
        // its first stdout byte.
        let (read_result, write_result, stderr) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || -> io::Result<()> {
                if let Some(mut stdin) = stdin {
                    stdin.write_all(image_bytes)?;
                }
                Ok(())
            });
            let drainer = scope.spawn(move || {
                let mut buf = Vec::new();
                if let Some(mut pipe) = stderr_pipe {
                    let _ = pipe.read_to_end(&mut buf);
                }
                buf
            });
            let read_result = match child.stdout.as_mut() {
                Some(out) => out.read_to_end(&mut stdout).map(|_| ()),
                None => Ok(()),
            };
            let write_result = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
            (read_result, write_result, drainer.join().unwrap_or_default())
        });
        read_result?;

        let status = child.wait()?;
        if !status.success() {
            return Err(SegmentationError::Failed {
                status,
                stderr: stderr_snippet(&stderr),
            });
        }
        // A broken pipe from a command that exited cleanly without reading
        // everything is tolerable only if it still produced output.
        if stdout.is_empty() {
            write_result?;
            return Err(SegmentationError::EmptyOutput);
        }
        Ok(stdout)
    }
}

fn stderr_snippet(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim()
        .chars()
        .take(STDERR_SNIPPET_CHARS)
        .collect()
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::{Mutex, mpsc};
    use std::time::Duration;

    /// Canned-response backend that records every input it was handed.
    pub struct MockSegmenter {
        response: Vec<u8>,
        received: Mutex<Vec<Vec<u8>>>,
    }

    impl MockSegmenter {
        pub fn returning(response: Vec<u8>) -> Self {
            Self {
                response,
                received: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.received.lock().unwrap().len()
        }

        pub fn last_input(&self) -> Option<Vec<u8>> {
            self.received.lock().unwrap().last().cloned()
        }
    }

    impl SegmentationBackend for MockSegmenter {
        fn segment(&self, image_bytes: &[u8]) -> Result<Vec<u8>, SegmentationError> {
            self.received.lock().unwrap().push(image_bytes.to_vec());
            Ok(self.response.clone())
        }
    }

    // Lets a test keep a handle on the mock after boxing it into an engine.
    impl SegmentationBackend for std::sync::Arc<MockSegmenter> {
        fn segment(&self, image_bytes: &[u8]) -> Result<Vec<u8>, SegmentationError> {
            self.as_ref().segment(image_bytes)
        }
    }

    /// Backend that always fails, for error-path coverage.
    pub struct FailingSegmenter;

    impl SegmentationBackend for FailingSegmenter {
        fn segment(&self, _image_bytes: &[u8]) -> Result<Vec<u8>, SegmentationError> {
            Err(SegmentationError::EmptyOutput)
        }
    }

    // ==== command backend ====

    #[test]
    fn cat_round_trips_bytes() {
        let backend = CommandSegmenter::new("cat", Vec::<String>::new());
        let out = backend.segment(b"pretend image bytes").unwrap();
        assert_eq!(out, b"pretend image bytes");
    }

    #[test]
    fn stderr_chatter_does_not_stall_the_exchange() {
        // Floods stderr well past a pipe buffer before echoing stdin, the
        // shape of a tool logging progress while the parent awaits stdout
        let backend = CommandSegmenter::new(
            "sh",
            ["-c", "head -c 262144 /dev/zero | tr '\\0' 'e' >&2; cat"],
        );
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            tx.send(backend.segment(b"subject bytes")).ok();
        });
        let out = rx
            .recv_timeout(Duration::from_secs(10))
            .expect("segment() wedged behind an undrained stderr pipe")
            .unwrap();
        assert_eq!(out, b"subject bytes");
    }

    #[test]
    fn failing_command_reports_status() {
        let backend = CommandSegmenter::new("false", Vec::<String>::new());
        let err = backend.segment(b"x").unwrap_err();
        assert!(matches!(err, SegmentationError::Failed { .. }));
    }

    #[test]
    fn failure_carries_the_stderr_text() {
        let backend =
            CommandSegmenter::new("sh", ["-c", "echo model weights missing >&2; exit 3"]);
        let err = backend.segment(b"x").unwrap_err();
        match err {
            SegmentationError::Failed { stderr, .. } => {
                assert!(stderr.contains("model weights missing"), "{stderr}");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn silent_success_is_empty_output() {
        let backend = CommandSegmenter::new("true", Vec::<String>::new());
        let err = backend.segment(b"").unwrap_err();
        assert!(matches!(err, SegmentationError::EmptyOutput));
    }

    #[test]
    fn unknown_program_fails_to_spawn() {
        let backend =
            CommandSegmenter::new("definitely-not-a-real-binary-9f2", Vec::<String>::new());
        let err = backend.segment(b"x").unwrap_err();
        match err {
            SegmentationError::Spawn { program, .. } => {
                assert_eq!(program, "definitely-not-a-real-binary-9f2");
            }
            other => panic!("expected spawn error, got {other:?}"),
        }
    }

    // ==== mock ====

    #[test]
    fn mock_records_inputs() {
        let mock = MockSegmenter::returning(vec![1, 2, 3]);
        assert_eq!(mock.segment(b"abc").unwrap(), vec![1, 2, 3]);
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.last_input().unwrap(), b"abc");
    }
}
