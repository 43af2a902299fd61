//! # 弛豫报告（sanity / provenance）
//!
//! 生成并写出三份 JSON 报告：
//! - `sanity.json`: 终态受力、能量、MD 漂移与标记原因
//! - `md_summary.json`: MD 逐步势能（仅在运行了 MD 时写出）
//! - `provenance.json`: 命令行参数、工具与势函数版本、时间戳、输出清单
//!
//! ## 依赖关系
//! - 被 `commands/relax.rs` 调用
//! - 使用 `serde_json` 序列化、`chrono` 生成时间戳

use crate::error::{MatscreenError, Result};

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// 弛豫与 MD 的健全性汇总
#[derive(Debug, Clone, Serialize)]
pub struct SanitySummary {
    /// 弛豫终态最大受力 (eV/Å)
    #[serde(rename = "max_force_eVA")]
    pub max_force: f64,
    /// 弛豫终态总势能 (eV)
    #[serde(rename = "energy_eV")]
    pub energy: f64,
    /// 实际执行的 MD 步数
    pub md_steps: usize,
    /// MD 能量漂移 (meV/atom)，未运行 MD 时为 null
    #[serde(rename = "md_energy_drift_meV_per_atom")]
    pub md_energy_drift: Option<f64>,
    /// 是否触发警告
    pub flagged: bool,
    /// 警告原因
    pub reasons: Vec<String>,
}

impl SanitySummary {
    /// 根据阈值评估健全性
    ///
    /// 标记条件：
    /// - 终态最大受力 > max(0.1, 2·fmax)
    /// - |MD 能量漂移| 超过阈值
    pub fn evaluate(
        max_force: f64,
        energy: f64,
        md_steps: usize,
        md_drift: Option<f64>,
        fmax: f64,
        drift_threshold: f64,
    ) -> Self {
        let mut flagged = false;
        let mut reasons = Vec::new();

        if max_force > (0.1_f64).max(fmax * 2.0) {
            flagged = true;
            reasons.push(format!(
                "High max force after relax: {:.3} eV/Å",
                max_force
            ));
        }

        if let Some(drift) = md_drift {
            if drift.abs() > drift_threshold {
                flagged = true;
                reasons.push(format!(
                    "MD energy drift {:.2} meV/atom exceeds threshold {:.2}",
                    drift, drift_threshold
                ));
            }
        }

        SanitySummary {
            max_force,
            energy,
            md_steps,
            md_energy_drift: md_drift,
            flagged,
            reasons,
        }
    }
}

/// MD 逐步能量记录
#[derive(Debug, Clone, Serialize)]
pub struct MdSummary {
    /// 每步势能 (eV)
    #[serde(rename = "energies_eV")]
    pub energies: Vec<f64>,
}

/// 运行溯源信息
#[derive(Debug, Clone, Serialize)]
pub struct Provenance {
    /// 工具名称
    pub tool: String,
    /// 工具版本
    pub version: String,
    /// 使用的势函数
    pub potential: String,
    /// 运行时间戳
    pub timestamp: String,
    /// 命令行参数
    pub cli_args: BTreeMap<String, String>,
    /// 输入结构路径
    pub structure_input: String,
    /// 输出文件清单
    pub outputs: BTreeMap<String, String>,
}

impl Provenance {
    pub fn new(potential: impl Into<String>, structure_input: impl Into<String>) -> Self {
        Provenance {
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            potential: potential.into(),
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            cli_args: BTreeMap::new(),
            structure_input: structure_input.into(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, key: &str, value: impl ToString) -> Self {
        self.cli_args.insert(key.to_string(), value.to_string());
        self
    }

    pub fn output(mut self, key: &str, path: &Path) -> Self {
        self.outputs
            .insert(key.to_string(), path.display().to_string());
        self
    }
}

/// 以缩进格式写出 JSON 文件
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).map_err(|e| MatscreenError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanity_clean_run_not_flagged() {
        let sanity = SanitySummary::evaluate(0.03, -12.5, 100, Some(1.0), 0.05, 2.5);
        assert!(!sanity.flagged);
        assert!(sanity.reasons.is_empty());
    }

    #[test]
    fn test_sanity_flags_high_force() {
        let sanity = SanitySummary::evaluate(0.5, -12.5, 0, None, 0.05, 2.5);
        assert!(sanity.flagged);
        assert_eq!(sanity.reasons.len(), 1);
        assert!(sanity.reasons[0].contains("max force"));
    }

    #[test]
    fn test_sanity_force_threshold_scales_with_fmax() {
        // fmax = 0.2 -> 阈值 0.4，0.3 eV/Å 不应触发
        let sanity = SanitySummary::evaluate(0.3, 0.0, 0, None, 0.2, 2.5);
        assert!(!sanity.flagged);
    }

    #[test]
    fn test_sanity_flags_md_drift() {
        let sanity = SanitySummary::evaluate(0.01, 0.0, 50, Some(-4.0), 0.05, 2.5);
        assert!(sanity.flagged);
        assert!(sanity.reasons[0].contains("drift"));
    }

    #[test]
    fn test_sanity_json_fields() {
        let sanity = SanitySummary::evaluate(0.01, -3.0, 0, None, 0.05, 2.5);
        let json = serde_json::to_value(&sanity).unwrap();

        assert!(json.get("max_force_eVA").is_some());
        assert!(json.get("energy_eV").is_some());
        assert!(json["md_energy_drift_meV_per_atom"].is_null());
        assert_eq!(json["flagged"], false);
    }

    #[test]
    fn test_provenance_builder() {
        let prov = Provenance::new("uff-lennard-jones", "in.cif")
            .arg("fmax", 0.05)
            .output("relaxed_cif", Path::new("out/relaxed.cif"));

        assert_eq!(prov.tool, "matscreen");
        assert_eq!(prov.cli_args["fmax"], "0.05");
        assert!(prov.outputs["relaxed_cif"].ends_with("relaxed.cif"));
    }
}
