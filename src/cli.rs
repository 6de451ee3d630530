//! 命令行接口
//!
//! 本模块提供了参数解析和验证功能。

use clap::Parser;

use crate::errors::FindError;
use crate::finder::filter::{FilterAttributes, MatchMode, TimeField};
use crate::finder::options::FindOptions;

/// 列出目录内容并按属性筛选文件
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 搜索路径（默认：当前目录）
    #[arg(default_value = ".")]
    pub paths: Vec<String>,

    /// 递归进入子目录
    #[arg(short, long)]
    pub recursive: bool,

    /// 扩展名，包含前导点，如 .txt（可多次指定）
    #[arg(short, long, value_name = "EXT")]
    pub ext: Vec<String>,

    /// 文件大小，如 >1000、<10、500
    #[arg(short, long, value_name = "SIZE")]
    pub size: Option<String>,

    /// 路径中包含的子串
    #[arg(short, long, value_name = "TEXT")]
    pub contain: Option<String>,

    /// 修改时间，如 >2024-01-01
    #[arg(long, value_name = "TIME")]
    pub mtime: Option<String>,

    /// 访问时间
    #[arg(long, value_name = "TIME")]
    pub atime: Option<String>,

    /// 创建时间
    #[arg(long, value_name = "TIME")]
    pub ctime: Option<String>,

    /// 任一条件满足即可（默认全部满足）
    #[arg(long)]
    pub or: bool,

    /// 同时输出目录
    #[arg(long)]
    pub dirs: bool,

    /// 启用调试日志
    #[arg(short, long)]
    pub debug: bool,
}

impl Cli {
    /// 构建查找选项
    pub fn build_options(&self) -> FindOptions {
        FindOptions::from_cli(self)
    }

    /// 由参数构建筛选条件
    pub fn build_filter(&self) -> FilterAttributes {
        let mut attrs = FilterAttributes::new().with_mode(if self.or {
            MatchMode::Or
        } else {
            MatchMode::And
        });

        if !self.ext.is_empty() {
            attrs = attrs.with_ext(self.ext.iter().cloned());
        }
        if let Some(size) = &self.size {
            attrs = attrs.with_size(size.clone());
        }
        if let Some(part) = &self.contain {
            attrs = attrs.with_contain(part.clone());
        }
        for (field, value) in [
            (TimeField::Modified, &self.mtime),
            (TimeField::Accessed, &self.atime),
            (TimeField::Created, &self.ctime),
        ] {
            if let Some(value) = value {
                attrs = attrs.with_time(field, value.clone());
            }
        }

        attrs
    }

    /// 验证命令行参数
    pub fn validate(&self) -> Result<(), FindError> {
        for path in &self.paths {
            if !std::path::Path::new(path).exists() {
                return Err(FindError::InvalidPath(std::path::PathBuf::from(path)));
            }
        }

        self.build_filter().validate()
    }
}
