//! 用于列出和筛选文件的库
//!
//! 本库提供了异步的文件列出与筛选功能，支持：
//! - 按层遍历目录，每层的 I/O 并发数有上限
//! - 自动跳过隐藏条目（以 `.` 开头）
//! - 按扩展名、大小、路径子串、修改/访问/创建时间筛选
//! - 条件之间使用 AND 或 OR 组合
//!
//! # 示例
//!
//! ```no_run
//! use rust_sift::finder::{Finder, FindOptions, FilterAttributes, MatchMode};
//!
//! # async fn run() -> Result<(), rust_sift::FindError> {
//! let finder = Finder::new(FindOptions::new().with_recursive(true));
//!
//! // 列出文件和目录
//! let found = finder.get_files(["./docs"]).await?;
//!
//! // 筛选出大于 1000 字节的 .txt 文件
//! let spec = FilterAttributes::new()
//!     .with_ext([".txt"])
//!     .with_size(">1000")
//!     .with_mode(MatchMode::And);
//! let files = finder.filter_files(&found.files, spec.into()).await;
//!
//! for file in files {
//!     println!("找到文件: {}", file.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod errors;
pub mod finder;

// Re-export main types for convenience
pub use errors::{FindError, FindResult, TraversalError};
pub use finder::{FilterSpec, Finder, TraversalResult};
