use std::path::PathBuf;
use thiserror::Error;

use crate::finder::TraversalResult;

/// Result type for operations that can produce FindError
pub type FindResult<T> = Result<T, FindError>;

/// rust-sift 的自定义错误类型
#[derive(Debug, Error)]
pub enum FindError {
    /// 目录不可读（无法列出子项）
    #[error("目录不可读 {}: {source}", .path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 指定的路径无效
    #[error("无效路径: {}", .0.display())]
    InvalidPath(PathBuf),

    /// 过滤条件的值无法解析
    #[error("无效的过滤条件 {key}: '{value}'")]
    InvalidFilter { key: String, value: String },
}

impl FindError {
    /// Wrap a listing failure for `path`.
    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FindError::DirectoryUnreadable {
            path: path.into(),
            source,
        }
    }

    /// The path this error refers to, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            FindError::DirectoryUnreadable { path, .. } => Some(path),
            FindError::InvalidPath(path) => Some(path),
            FindError::InvalidFilter { .. } => None,
        }
    }
}

/// 遍历中断时返回的错误
///
/// Carries the first listing error together with everything collected from
/// the levels that completed before it.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct TraversalError {
    #[source]
    pub source: FindError,
    pub partial: TraversalResult,
}

impl From<TraversalError> for FindError {
    fn from(err: TraversalError) -> Self {
        err.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_directory_unreadable_display() {
        // 测试目录不可读错误的显示格式
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let find_error = FindError::unreadable("/test/path", io_error);
        assert_eq!(
            find_error.to_string(),
            "目录不可读 /test/path: file not found"
        );
        assert!(find_error.source().is_some());
    }

    #[test]
    fn test_invalid_path_display() {
        let find_error = FindError::InvalidPath(PathBuf::from("/invalid/path"));
        assert_eq!(find_error.to_string(), "无效路径: /invalid/path");
        assert_eq!(find_error.path(), Some(&PathBuf::from("/invalid/path")));
    }

    #[test]
    fn test_invalid_filter_display() {
        let find_error = FindError::InvalidFilter {
            key: "size".to_string(),
            value: ">abc".to_string(),
        };
        assert_eq!(find_error.to_string(), "无效的过滤条件 size: '>abc'");
        assert!(find_error.path().is_none());
    }

    #[test]
    fn test_traversal_error_keeps_partial() {
        let partial = TraversalResult {
            files: vec![PathBuf::from("/a/b.txt")],
            dirs: Vec::new(),
        };
        let err = TraversalError {
            source: FindError::unreadable("/a/c", io::Error::from(io::ErrorKind::PermissionDenied)),
            partial,
        };
        assert!(err.to_string().starts_with("目录不可读 /a/c"));
        assert_eq!(err.partial.files.len(), 1);

        let find_error: FindError = err.into();
        match find_error {
            FindError::DirectoryUnreadable { path, .. } => assert_eq!(path, PathBuf::from("/a/c")),
            _ => panic!("Expected DirectoryUnreadable variant"),
        }
    }
}
