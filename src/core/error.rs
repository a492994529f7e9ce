use std::error::Error as StdError;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

/// A failed hardware call: the operation that failed and the errno it returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{op}: {}", describe_errno(*.errno))]
pub struct BackendError {
    pub op: &'static str,
    pub errno: i32,
}

impl BackendError {
    pub fn new(op: &'static str, errno: i32) -> Self {
        Self { op, errno }
    }

    pub fn from_errno(op: &'static str, errno: Errno) -> Self {
        Self::new(op, errno as i32)
    }

    pub fn is(&self, errno: Errno) -> bool {
        self.errno == errno as i32
    }

    pub fn is_busy(&self) -> bool {
        self.is(Errno::EBUSY)
    }

    /// Device missing or not permitted to this process.
    pub fn is_inaccessible(&self) -> bool {
        [
            Errno::ENOENT,
            Errno::ENODEV,
            Errno::ENXIO,
            Errno::EACCES,
            Errno::EPERM,
        ]
        .iter()
        .any(|e| self.is(*e))
    }
}

fn describe_errno(errno: i32) -> &'static str {
    Errno::from_raw(errno).desc()
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MixerError {
    #[error("mixer open error: {0}")]
    Open(BackendError),
    #[error("mixer attach {card} error: {source}")]
    Attach { card: String, source: BackendError },
    #[error("mixer register error: {0}")]
    Register(BackendError),
    #[error("mixer {card} load error: {source}")]
    Load { card: String, source: BackendError },
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("sound device directory {} not found", path.display())]
    DirectoryMissing { path: PathBuf },
    #[error("can not read sound device directory {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{message}")]
    Message { message: String },
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl ConfigError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    pub fn with_context<E>(context: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Context {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_is_not_inaccessible() {
        let err = BackendError::from_errno("snd_pcm_open", Errno::EBUSY);
        assert!(err.is_busy());
        assert!(!err.is_inaccessible());
    }

    #[test]
    fn missing_and_denied_are_inaccessible() {
        for errno in [Errno::ENOENT, Errno::ENODEV, Errno::EACCES, Errno::EPERM] {
            let err = BackendError::from_errno("snd_pcm_open", errno);
            assert!(err.is_inaccessible(), "{:?}", errno);
        }
        assert!(!BackendError::from_errno("snd_pcm_open", Errno::EINVAL).is_inaccessible());
    }

    #[test]
    fn display_names_operation_and_errno() {
        let err = BackendError::from_errno("snd_pcm_hw_params", Errno::EIO);
        let text = err.to_string();
        assert!(text.starts_with("snd_pcm_hw_params: "));
        assert!(text.len() > "snd_pcm_hw_params: ".len());
    }

    #[test]
    fn config_error_keeps_context() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ConfigError::with_context("reading explore.toml", io);
        assert_eq!(err.to_string(), "reading explore.toml: gone");
    }
}
