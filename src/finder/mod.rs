//! 文件查找模块
//!
//! 这个模块提供了异步的文件系统遍历和文件过滤功能：
//! [`Finder::get_files`] 按层列出文件和目录，
//! [`Finder::filter_files`] 按条件筛选文件列表。

pub mod filter;
pub mod options;
pub mod walker;

use std::path::{Path, PathBuf};

use log::info;

use crate::errors::TraversalError;
pub use self::filter::{FileFilter, FilterAttributes, FilterSpec, MatchMode};
pub use self::options::{FindOptions, DEFAULT_CONCURRENCY};
pub use self::walker::{LevelWalker, TraversalResult};

/// 文件查找器
///
/// 持有遍历选项；遍历和过滤是两个独立的操作，
/// 它们之间只通过文件路径列表连接。
#[derive(Debug, Clone, Default)]
pub struct Finder {
    options: FindOptions,
}

impl Finder {
    /// 创建新的文件查找器实例
    pub fn new(options: FindOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FindOptions {
        &self.options
    }

    /// 列出根路径下的文件和目录（递归与否取决于选项）
    pub async fn get_files<I, P>(&self, roots: I) -> Result<TraversalResult, TraversalError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let result = LevelWalker::new(&self.options).walk(roots).await?;
        info!(
            "Found {} files and {} directories",
            result.files.len(),
            result.dirs.len()
        );
        Ok(result)
    }

    /// 按条件筛选文件，保持输入顺序
    pub async fn filter_files<P: AsRef<Path>>(&self, files: &[P], spec: FilterSpec) -> Vec<PathBuf> {
        let kept = filter::filter_files(files, spec).await;
        info!("{} of {} files matched", kept.len(), files.len());
        kept
    }

    /// 遍历后立即筛选文件；目录原样保留
    pub async fn find<I, P>(&self, roots: I, spec: FilterSpec) -> Result<TraversalResult, TraversalError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let TraversalResult { files, dirs } = self.get_files(roots).await?;
        let files = self.filter_files(&files, spec).await;
        Ok(TraversalResult { files, dirs })
    }
}
