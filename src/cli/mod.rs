//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `hull`: CSV 组成-能量数据的凸包稳定性分析
//! - `relax`: 结构预弛豫 + 可选 MD 摇晃测试
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: hull, relax

pub mod hull;
pub mod relax;

use clap::{Parser, Subcommand};

/// Matscreen - 材料稳定性筛查与预弛豫工具箱
#[derive(Parser)]
#[command(name = "matscreen")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "A materials stability screening and structure pre-relaxation toolkit", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Convex-hull / formation-energy analysis of composition-energy CSV data
    Hull(hull::HullArgs),

    /// Pre-relax structures with a classical potential, with an optional MD shake test
    Relax(relax::RelaxArgs),
}
