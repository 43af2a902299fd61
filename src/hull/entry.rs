//! # 相图条目数据模型
//!
//! CSV 的一行：组成 + 每原子能量 + 可选标签。
//!
//! ## 依赖关系
//! - 被 `hull/phase_diagram.rs` 和 `commands/hull.rs` 使用
//! - 使用 `models/composition.rs`

use crate::models::Composition;
use serde::{Deserialize, Serialize};

/// 相图条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdEntry {
    /// 可选标签（CSV `label` 列）
    pub label: Option<String>,

    /// 化学组成
    pub composition: Composition,

    /// 每原子能量 (eV)
    pub energy_per_atom: f64,
}

impl PdEntry {
    pub fn new(composition: Composition, energy_per_atom: f64) -> Self {
        PdEntry {
            label: None,
            composition,
            energy_per_atom,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// 显示名称：标签优先，否则约化化学式
    pub fn name(&self) -> String {
        match &self.label {
            Some(label) if !label.is_empty() => label.clone(),
            _ => self.composition.reduced_formula(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_name_prefers_label() {
        let comp = Composition::parse("Fe2O3").unwrap();
        let entry = PdEntry::new(comp.clone(), -7.5).with_label("sample-42");
        assert_eq!(entry.name(), "sample-42");

        let unlabeled = PdEntry::new(comp, -7.5);
        assert_eq!(unlabeled.name(), "Fe2O3");
    }
}
