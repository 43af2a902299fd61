//! # Matscreen - 材料稳定性筛查与预弛豫工具箱
//!
//! 将组成空间凸包分析与结构预弛豫两个常用筛查脚本用 Rust 重构，
//! 统一成单一可执行文件。
//!
//! ## 子命令
//! - `hull`  - CSV 组成-能量数据的凸包/形成能分析（可选相图绘制）
//! - `relax` - 经典势下的结构预弛豫 + MD 摇晃测试（sanity/provenance 报告）
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (结构文件解析)
//!   │     ├── hull/      (相图与凸包)
//!   │     ├── relax/     (势函数、弛豫、MD)
//!   │     └── models/    (数据模型)
//!   ├── batch/      (批量处理)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod error;
mod hull;
mod models;
mod parsers;
mod relax;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
