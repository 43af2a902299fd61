//! # hull 子命令 CLI 定义
//!
//! 凸包 / 形成能分析的命令行参数。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/hull.rs`

use clap::Args;
use std::path::PathBuf;

/// hull 子命令参数
#[derive(Args, Debug)]
pub struct HullArgs {
    /// Input CSV with columns: composition, energy_per_atom_eV, [label]
    pub csv: PathBuf,

    /// Output CSV path with formation energies and hull distances
    #[arg(long, default_value = "hull_results.csv")]
    pub out: PathBuf,

    /// Optional phase diagram image (binary/ternary systems only; PNG or SVG by extension)
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Figure width in pixels (PNG) or points (SVG)
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Figure height in pixels (PNG) or points (SVG)
    #[arg(long, default_value_t = 900)]
    pub height: u32,

    /// Number of entries shown in the terminal summary table
    #[arg(long, default_value_t = 10)]
    pub top_n: usize,
}
