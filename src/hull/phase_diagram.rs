//! # 组成空间凸包 / 相图构建
//!
//! 从 (组成, 每原子能量) 条目集合构建相图并计算热力学稳定性。
//!
//! ## 算法概述
//! 1. 收集元素集合，取每个元素最低能量的单质条目作为参考能量
//! 2. 形成能 = 每原子能量 - Σ 原子分数 × 参考能量
//! 3. 同一组成的多个条目约化为最低形成能的候选点
//! 4. 凸包距离：目标组成处下包络能量由线性规划给出
//!    （`hull/simplex.rs`），e_above_hull = 形成能 - 包络能量
//!
//! ## 参考
//! - pymatgen.analysis.phase_diagram
//!
//! ## 依赖关系
//! - 被 `commands/hull.rs` 和 `hull/plot.rs` 调用
//! - 使用 `hull/entry.rs`, `hull/simplex.rs`

use crate::error::{MatscreenError, Result};
use crate::hull::entry::PdEntry;
use crate::hull::simplex;
use crate::models::Composition;

use std::collections::{BTreeMap, BTreeSet};

/// 判定稳定（位于凸包上）的能量容差 (eV/atom)
const STABLE_TOL: f64 = 1e-8;

/// 凸包候选点：某一组成下最低形成能的条目
#[derive(Debug, Clone)]
pub struct Candidate {
    /// 显示名称（来源条目的标签或约化化学式）
    pub name: String,
    /// 原子分数向量，与 `PhaseDiagram::elements` 对齐
    pub fractions: Vec<f64>,
    /// 每原子形成能 (eV)
    pub formation_energy: f64,
}

/// 单个条目的稳定性分析结果
#[derive(Debug, Clone)]
pub struct Stability {
    /// 每原子形成能 (eV)
    pub formation_energy_per_atom: f64,
    /// 到凸包的距离 (eV/atom)，稳定条目为 0
    pub e_above_hull: f64,
    /// 是否位于凸包上
    pub is_stable: bool,
}

/// 组成空间相图
#[derive(Debug, Clone)]
pub struct PhaseDiagram {
    elements: Vec<String>,
    references: BTreeMap<String, f64>,
    candidates: Vec<Candidate>,
}

impl PhaseDiagram {
    /// 从条目集合构建相图
    ///
    /// 所有出现过的元素都必须有单质参考条目，否则报错。
    pub fn build(entries: &[PdEntry]) -> Result<Self> {
        if entries.is_empty() {
            return Err(MatscreenError::EmptyPhaseDiagram);
        }

        // 元素集合（字母序）
        let mut element_set: BTreeSet<String> = BTreeSet::new();
        for entry in entries {
            for el in entry.composition.elements() {
                element_set.insert(el.to_string());
            }
        }
        let elements: Vec<String> = element_set.into_iter().collect();

        // 单质参考能量：每个元素最低的 energy_per_atom
        let mut references: BTreeMap<String, f64> = BTreeMap::new();
        for entry in entries {
            if let Some(el) = entry.composition.as_element() {
                references
                    .entry(el.to_string())
                    .and_modify(|e| *e = e.min(entry.energy_per_atom))
                    .or_insert(entry.energy_per_atom);
            }
        }

        for el in &elements {
            if !references.contains_key(el) {
                return Err(MatscreenError::MissingReference {
                    element: el.clone(),
                });
            }
        }

        let mut diagram = PhaseDiagram {
            elements,
            references,
            candidates: Vec::new(),
        };

        // 同一组成只保留最低形成能的条目
        let mut best: BTreeMap<Vec<i64>, (String, Vec<f64>, f64)> = BTreeMap::new();
        for entry in entries {
            let fractions = diagram.fraction_vector(&entry.composition);
            let ef = diagram.formation_energy_per_atom(entry);
            let key: Vec<i64> = fractions.iter().map(|f| (f * 1e8).round() as i64).collect();

            let slot = best
                .entry(key)
                .or_insert_with(|| (entry.name(), fractions, f64::INFINITY));
            if ef < slot.2 {
                slot.0 = entry.name();
                slot.2 = ef;
            }
        }

        diagram.candidates = best
            .into_values()
            .map(|(name, fractions, formation_energy)| Candidate {
                name,
                fractions,
                formation_energy,
            })
            .collect();

        Ok(diagram)
    }

    /// 相图涉及的元素（字母序）
    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    /// 组分数（元素个数）
    pub fn num_components(&self) -> usize {
        self.elements.len()
    }

    /// 凸包候选点
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// 某元素的参考能量 (eV/atom)
    pub fn reference_energy(&self, element: &str) -> Option<f64> {
        self.references.get(element).copied()
    }

    /// 每原子形成能
    pub fn formation_energy_per_atom(&self, entry: &PdEntry) -> f64 {
        let correction: f64 = self
            .elements
            .iter()
            .map(|el| entry.composition.fraction(el) * self.references[el])
            .sum();
        entry.energy_per_atom - correction
    }

    /// 组成向量（原子分数，与 `elements` 对齐）
    pub fn fraction_vector(&self, composition: &Composition) -> Vec<f64> {
        self.elements
            .iter()
            .map(|el| composition.fraction(el))
            .collect()
    }

    /// 求解目标组成处的包络线性规划
    fn solve_envelope(&self, fractions: &[f64]) -> Result<simplex::LpSolution> {
        let m = self.elements.len();
        let n = self.candidates.len();

        let mut a: Vec<Vec<f64>> = vec![vec![0.0; n]; m];
        for (j, cand) in self.candidates.iter().enumerate() {
            for i in 0..m {
                a[i][j] = cand.fractions[i];
            }
        }
        let c: Vec<f64> = self.candidates.iter().map(|x| x.formation_energy).collect();

        simplex::solve_min(&a, fractions, &c).ok_or_else(|| {
            MatscreenError::Other(
                "Composition cannot be expressed by the phase diagram entries".to_string(),
            )
        })
    }

    /// 目标组成处凸包下包络的能量 (eV/atom)
    pub fn hull_energy(&self, fractions: &[f64]) -> Result<f64> {
        self.solve_envelope(fractions).map(|sol| sol.objective)
    }

    /// 目标组成在凸包上的分解：(竞争相名称, 原子分数权重)
    ///
    /// 权重按降序排列，微小权重（< 1e-6）丢弃。
    pub fn decomposition(&self, composition: &Composition) -> Result<Vec<(String, f64)>> {
        let sol = self.solve_envelope(&self.fraction_vector(composition))?;

        let mut phases: Vec<(String, f64)> = sol
            .weights
            .iter()
            .zip(self.candidates.iter())
            .filter(|(&w, _)| w > 1e-6)
            .map(|(&w, cand)| (cand.name.clone(), w))
            .collect();

        phases.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(phases)
    }

    /// 条目到凸包的距离 (eV/atom)
    ///
    /// 条目本身参与凸包构建，因此结果非负；容差内取 0。
    pub fn e_above_hull(&self, entry: &PdEntry) -> Result<f64> {
        let ef = self.formation_energy_per_atom(entry);
        let hull = self.hull_energy(&self.fraction_vector(&entry.composition))?;

        let dist = ef - hull;
        Ok(if dist < STABLE_TOL { 0.0 } else { dist })
    }

    /// 条目的完整稳定性分析
    pub fn evaluate(&self, entry: &PdEntry) -> Result<Stability> {
        let formation_energy_per_atom = self.formation_energy_per_atom(entry);
        let e_above_hull = self.e_above_hull(entry)?;

        Ok(Stability {
            formation_energy_per_atom,
            e_above_hull,
            is_stable: e_above_hull <= STABLE_TOL,
        })
    }

    /// 位于凸包上的候选点（相图顶点，用于绘图）
    pub fn stable_candidates(&self) -> Vec<&Candidate> {
        self.candidates
            .iter()
            .filter(|cand| {
                self.hull_energy(&cand.fractions)
                    .map(|hull| cand.formation_energy - hull <= STABLE_TOL)
                    .unwrap_or(false)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(formula: &str, epa: f64) -> PdEntry {
        PdEntry::new(Composition::parse(formula).unwrap(), epa)
    }

    fn binary_entries() -> Vec<PdEntry> {
        vec![
            entry("A", -1.0),
            entry("B", -2.0),
            entry("AB", -2.5),
            entry("A3B", -1.0),
        ]
    }

    #[test]
    fn test_formation_energies() {
        let entries = binary_entries();
        let pd = PhaseDiagram::build(&entries).unwrap();

        // Ef(AB) = -2.5 - (0.5*-1 + 0.5*-2) = -1.0
        let ef_ab = pd.formation_energy_per_atom(&entries[2]);
        assert!((ef_ab - (-1.0)).abs() < 1e-10);

        // Ef(A3B) = -1.0 - (0.75*-1 + 0.25*-2) = 0.25
        let ef_a3b = pd.formation_energy_per_atom(&entries[3]);
        assert!((ef_a3b - 0.25).abs() < 1e-10);

        // 单质参考本身形成能为 0
        assert!(pd.formation_energy_per_atom(&entries[0]).abs() < 1e-10);
    }

    #[test]
    fn test_e_above_hull_binary() {
        let entries = binary_entries();
        let pd = PhaseDiagram::build(&entries).unwrap();

        // AB 在包上
        assert!(pd.e_above_hull(&entries[2]).unwrap().abs() < 1e-10);

        // A3B: 包络在 x_B=0.25 处为 0.5*0 + 0.5*(-1) = -0.5
        let d = pd.e_above_hull(&entries[3]).unwrap();
        assert!((d - 0.75).abs() < 1e-8);

        // 单质端点稳定
        assert!(pd.e_above_hull(&entries[0]).unwrap().abs() < 1e-10);
        assert!(pd.e_above_hull(&entries[1]).unwrap().abs() < 1e-10);
    }

    #[test]
    fn test_stable_candidates() {
        let entries = binary_entries();
        let pd = PhaseDiagram::build(&entries).unwrap();

        let stable = pd.stable_candidates();
        let names: Vec<&str> = stable.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(stable.len(), 3);
        assert!(names.contains(&"AB"));
        assert!(!names.contains(&"A3B"));
    }

    #[test]
    fn test_duplicate_composition_takes_lowest() {
        let entries = vec![
            entry("A", -1.0),
            entry("B", -1.0),
            entry("AB", -1.5),
            entry("AB", -2.0),
        ];
        let pd = PhaseDiagram::build(&entries).unwrap();

        // 包络取更低的 AB 条目，-1.5 的那条距包 0.5
        let d = pd.e_above_hull(&entries[2]).unwrap();
        assert!((d - 0.5).abs() < 1e-8);
        assert!(pd.e_above_hull(&entries[3]).unwrap().abs() < 1e-10);
    }

    #[test]
    fn test_decomposition_of_unstable_entry() {
        let entries = binary_entries();
        let pd = PhaseDiagram::build(&entries).unwrap();

        // A3B 分解为 0.5 A + 0.5 AB
        let phases = pd.decomposition(&entries[3].composition).unwrap();
        assert_eq!(phases.len(), 2);

        let names: Vec<&str> = phases.iter().map(|(n, _)| n.as_str()).collect();
        assert!(names.contains(&"A"));
        assert!(names.contains(&"AB"));
        for (_, w) in &phases {
            assert!((w - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_missing_reference_error() {
        let entries = vec![entry("A", -1.0), entry("AB", -2.0)];
        let err = PhaseDiagram::build(&entries).unwrap_err();
        assert!(err.to_string().contains("reference"));
    }

    #[test]
    fn test_empty_entries_error() {
        assert!(PhaseDiagram::build(&[]).is_err());
    }

    #[test]
    fn test_ternary_above_hull() {
        let entries = vec![
            entry("A", 0.0),
            entry("B", 0.0),
            entry("C", 0.0),
            entry("ABC", -1.0),
            entry("A2BC", -0.1),
        ];
        let pd = PhaseDiagram::build(&entries).unwrap();

        assert!(pd.e_above_hull(&entries[3]).unwrap().abs() < 1e-10);

        // A2BC = 0.25*A + 0.75*ABC... 原子分数: A2BC -> (0.5, 0.25, 0.25)
        // 包络 = λ_A*0 + λ_ABC*(-1), λ_ABC = 0.75 -> -0.75
        let d = pd.e_above_hull(&entries[4]).unwrap();
        assert!((d - (-0.1 - (-0.75))).abs() < 1e-8);
    }
}
