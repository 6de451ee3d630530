use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use rust_sift::cli::Cli;
use rust_sift::finder::Finder;

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let cli = Cli::parse();

    // 初始化日志
    env_logger::Builder::new()
        .filter_level(if cli.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .init();

    cli.validate().context("参数无效")?;

    info!("开始运行 rust-sift");
    let start_time = Instant::now();

    let finder = Finder::new(cli.build_options());
    let spec = cli.build_filter();
    debug!("筛选条件: {:?}", spec);

    let results = finder
        .find(&cli.paths, spec.into())
        .await
        .with_context(|| format!("遍历 {} 失败", cli.paths.join(", ")))?;

    // 打印结果
    if cli.dirs {
        for dir in &results.dirs {
            println!("{}", dir.display());
        }
    }
    for file in &results.files {
        println!("{}", file.display());
    }

    let elapsed = start_time.elapsed();
    info!("完成，耗时 {:.2?}", elapsed);

    Ok(())
}
