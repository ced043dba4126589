//! Collaborators that talk to the terminal and the local filesystem.

use std::{fs, io::Write, path::Path};

use crate::cli::io;
use crate::wizard::{FilePicker, FileRef, NotificationKind, Notifier, Router};

/// Announces the redirect instead of loading a page.
#[derive(Debug, Default)]
pub struct TerminalRouter;

impl Router for TerminalRouter {
    fn navigate(&mut self, path: &str) {
        tracing::info!(path, "redirect");
        io::print_info(format!("Redirecting to {path}"));
    }
}

/// Rings the terminal bell on submission outcomes when enabled.
#[derive(Debug, Default)]
pub struct TerminalNotifier {
    pub bell: bool,
}

impl Notifier for TerminalNotifier {
    fn notify(&mut self, kind: NotificationKind) {
        tracing::debug!(%kind, "notification");
        match kind {
            NotificationKind::DraftSaved => io::print_success("Draft saved."),
            NotificationKind::Success | NotificationKind::Error if self.bell => {
                let mut stdout = std::io::stdout();
                let _ = stdout.write_all(b"\x07");
                let _ = stdout.flush();
            }
            _ => {}
        }
    }
}

/// Resolves a path typed at the prompt into a file handle.
#[derive(Debug, Default)]
pub struct FsFilePicker;

impl FilePicker for FsFilePicker {
    fn pick(&mut self, hint: &str) -> Option<FileRef> {
        let path = Path::new(hint);
        let metadata = match fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => {
                tracing::warn!(path = hint, "not a regular file");
                return None;
            }
            Err(err) => {
                tracing::warn!(path = hint, error = %err, "file not readable");
                return None;
            }
        };
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| hint.to_string());
        Some(FileRef::new(name, metadata.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn picks_existing_files_only() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("demo.mp3");
        fs::write(&path, b"abc").unwrap();

        let mut picker = FsFilePicker;
        let file = picker.pick(path.to_str().unwrap()).unwrap();
        assert_eq!(file.name, "demo.mp3");
        assert_eq!(file.size_bytes, 3);

        assert!(picker.pick(temp.path().to_str().unwrap()).is_none());
        assert!(picker.pick("/definitely/not/here.pdf").is_none());
    }
}
