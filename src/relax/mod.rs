//! # 结构预弛豫模块
//!
//! 提供经典势下的结构弛豫与短时 MD 摇晃测试。
//!
//! ## 子模块
//! - `units`: 单位制常数
//! - `elements`: 元素参数数据库（原子量、LJ 参数）
//! - `potential`: 计算器接口与 UFF Lennard-Jones 实现
//! - `fire`: FIRE 弛豫器
//! - `langevin`: Maxwell–Boltzmann 初速度与 Langevin 积分
//! - `report`: sanity / provenance 报告
//!
//! ## 依赖关系
//! - 被 `commands/relax.rs` 使用
//! - 使用 `models/structure.rs`

pub mod elements;
pub mod fire;
pub mod langevin;
pub mod potential;
pub mod report;
pub mod units;

pub use fire::{Fire, RelaxOutcome};
pub use langevin::{Langevin, LangevinParams, MdOutcome};
pub use potential::{EnergyForces, Potential, UffLennardJones};
pub use report::{MdSummary, Provenance, SanitySummary};
