//! 文件系统遍历功能
//!
//! 本模块按“层”遍历目录：每一层先并发列出所有目录的子项，
//! 再并发 stat 每个子项以区分文件和目录。递归时，下一层的
//! 队列就是本层发现的目录。每层的并发数受 `FindOptions::concurrency` 限制。

use std::ffi::OsStr;
use std::ops::Range;
use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt, TryStreamExt};
use log::debug;
use tokio::fs;

use super::options::{FindOptions, HIDDEN_MARKER};
use crate::errors::{FindError, FindResult, TraversalError};

/// 遍历结果：文件与目录分开存放
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalResult {
    /// Entries that were not directories when stat-ed
    pub files: Vec<PathBuf>,
    /// Entries that were directories when stat-ed
    pub dirs: Vec<PathBuf>,
}

impl TraversalResult {
    /// Append another (level) result to this one
    pub fn merge(&mut self, other: TraversalResult) {
        self.files.extend(other.files);
        self.dirs.extend(other.dirs);
    }

    /// Total number of entries
    pub fn len(&self) -> usize {
        self.files.len() + self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }
}

/// 使用给定选项按层遍历文件系统
pub struct LevelWalker<'a> {
    options: &'a FindOptions,
}

impl<'a> LevelWalker<'a> {
    /// 使用给定选项创建新的 LevelWalker
    pub fn new(options: &'a FindOptions) -> Self {
        Self { options }
    }

    /// 从给定的根路径开始遍历
    ///
    /// On a listing failure the walk stops at once; the error carries the
    /// entries gathered by the levels that had already completed.
    pub async fn walk<I, P>(&self, roots: I) -> Result<TraversalResult, TraversalError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let roots: Vec<PathBuf> = roots
            .into_iter()
            .map(|root| root.as_ref().to_path_buf())
            .collect();
        let mut result = TraversalResult::default();
        // directories found by the previous level, as a range of `result.dirs`
        let mut pending: Option<Range<usize>> = None;
        let mut depth = 0usize;

        loop {
            let queue = match &pending {
                None => roots.as_slice(),
                Some(range) => &result.dirs[range.clone()],
            };
            if queue.is_empty() {
                break;
            }
            debug!("Level {}: listing {} directories", depth, queue.len());

            let outcome = self.walk_level(queue).await;
            let level = match outcome {
                Ok(level) => level,
                Err(source) => {
                    debug!("Level {} aborted: {}", depth, source);
                    return Err(TraversalError {
                        source,
                        partial: result,
                    });
                }
            };

            debug!(
                "Level {}: {} files, {} directories",
                depth,
                level.files.len(),
                level.dirs.len()
            );

            let start = result.dirs.len();
            result.merge(level);
            if !self.options.recursive {
                break;
            }
            pending = Some(start..result.dirs.len());
            depth += 1;
        }

        Ok(result)
    }

    /// 处理一层：列出子项，然后分类
    async fn walk_level(&self, paths: &[PathBuf]) -> FindResult<TraversalResult> {
        let children = self.list_children(paths).await?;
        Ok(self.classify(children).await)
    }

    /// 并发列出每个目录的非隐藏子项，任一目录失败则整层失败
    async fn list_children(&self, paths: &[PathBuf]) -> FindResult<Vec<PathBuf>> {
        let listings: Vec<Vec<PathBuf>> = stream::iter(paths)
            .map(|dir| list_dir(dir.as_path()))
            .buffer_unordered(self.options.concurrency)
            .try_collect()
            .await?;

        Ok(listings.into_iter().flatten().collect())
    }

    /// 并发 stat 每个子项；stat 失败的条目直接丢弃
    async fn classify(&self, children: Vec<PathBuf>) -> TraversalResult {
        let classified: Vec<Option<(PathBuf, bool)>> = stream::iter(children)
            .map(|path| async move {
                match fs::metadata(&path).await {
                    Ok(metadata) => Some((path, metadata.is_dir())),
                    Err(err) => {
                        debug!("Dropping {}: {}", path.display(), err);
                        None
                    }
                }
            })
            .buffer_unordered(self.options.concurrency)
            .collect()
            .await;

        let mut level = TraversalResult::default();
        for (path, is_dir) in classified.into_iter().flatten() {
            if is_dir {
                level.dirs.push(path);
            } else {
                level.files.push(path);
            }
        }
        level
    }
}

/// Whether a name starts with the hidden-entry marker
pub fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with(HIDDEN_MARKER)
}

async fn list_dir(dir: &Path) -> FindResult<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .await
        .map_err(|err| FindError::unreadable(dir, err))?;

    let mut children = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|err| FindError::unreadable(dir, err))?
    {
        let name = entry.file_name();
        if is_hidden(&name) {
            continue;
        }
        children.push(dir.join(name));
    }
    Ok(children)
}
