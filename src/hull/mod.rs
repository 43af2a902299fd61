//! # 凸包稳定性分析模块
//!
//! 提供组成空间相图构建与热力学稳定性分析。
//!
//! ## 子模块
//! - `entry`: 相图条目 (组成 + 每原子能量)
//! - `simplex`: 两阶段单纯形法线性规划
//! - `phase_diagram`: 相图构建、形成能与凸包距离
//! - `plot`: 二元/三元相图绘制
//!
//! ## 依赖关系
//! - 被 `commands/hull.rs` 使用
//! - 使用 `models/composition.rs`

pub mod entry;
pub mod phase_diagram;
pub mod plot;
pub mod simplex;

pub use entry::PdEntry;
pub use phase_diagram::{Candidate, PhaseDiagram, Stability};
