//! # relax 子命令 CLI 定义
//!
//! 结构预弛豫 + MD 摇晃测试的命令行参数。
//! 输入为目录时进入批量模式。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/relax.rs`

use clap::Args;
use std::path::PathBuf;

/// relax 子命令参数
#[derive(Args, Debug)]
pub struct RelaxArgs {
    /// Input structure file (CIF / POSCAR) or directory containing structure files
    pub input: PathBuf,

    /// Output directory (per-structure subdirectories in batch mode)
    #[arg(long, default_value = "runs/out")]
    pub outdir: PathBuf,

    /// Relaxation force convergence threshold in eV/Å
    #[arg(long, default_value_t = 0.05)]
    pub fmax: f64,

    /// Maximum number of relaxation steps
    #[arg(long, default_value_t = 500)]
    pub max_steps: usize,

    /// Number of MD shake-test steps (0 to skip MD)
    #[arg(long, default_value_t = 0)]
    pub md_steps: usize,

    /// MD timestep (fs)
    #[arg(long, default_value_t = 1.0)]
    pub md_timestep_fs: f64,

    /// MD temperature (K)
    #[arg(long, default_value_t = 300.0)]
    pub md_temperature_k: f64,

    /// Random seed for MD velocities and thermostat noise
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Flag the run if |ΔE|/N over MD exceeds this threshold (meV/atom)
    #[arg(long, default_value_t = 2.5)]
    pub drift_threshold_mev_per_atom: f64,

    // ─────────────────────────────────────────────────────────────
    // 批量处理参数
    // ─────────────────────────────────────────────────────────────
    /// Glob pattern for input files (batch mode)
    #[arg(long, default_value = "*.cif,*.vasp,*.poscar,POSCAR*,CONTCAR*")]
    pub pattern: String,

    /// Number of parallel jobs (0 = auto, batch mode only)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Recurse into subdirectories (batch mode)
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Overwrite existing output directories
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}
