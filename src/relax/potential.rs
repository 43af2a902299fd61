//! # 原子间相互作用势
//!
//! 定义计算器接口 `Potential` 与内置的 UFF 参数化 Lennard-Jones
//! 实现。接口输入晶体结构，输出总能量 (eV) 与每原子受力 (eV/Å)。
//!
//! ## 周期性处理
//! 对 -1..=1 的 27 个晶格平移像求最小像和，截断半径取 2.5·r_min。
//! 截断处做能量平移保证连续。截断半径超过一个晶格周期的超小晶胞
//! 会漏掉更远的像。
//!
//! ## 依赖关系
//! - 被 `relax/fire.rs`, `relax/langevin.rs` 调用
//! - 使用 `relax/elements.rs` 的参数数据库
//! - 使用 `models/structure.rs`

use crate::error::Result;
use crate::models::Crystal;
use crate::relax::elements;

/// 一次能量/力计算的结果
#[derive(Debug, Clone)]
pub struct EnergyForces {
    /// 总势能 (eV)
    pub energy: f64,
    /// 每原子受力 (eV/Å)
    pub forces: Vec<[f64; 3]>,
}

impl EnergyForces {
    /// 最大受力范数 (eV/Å)
    pub fn max_force(&self) -> f64 {
        self.forces
            .iter()
            .map(|f| (f[0] * f[0] + f[1] * f[1] + f[2] * f[2]).sqrt())
            .fold(0.0, f64::max)
    }
}

/// 计算器接口：弛豫与 MD 对势函数的唯一依赖点
pub trait Potential {
    /// 势函数名称（写入 provenance）
    fn name(&self) -> &'static str;

    /// 计算总能量与每原子受力
    fn energy_and_forces(&self, crystal: &Crystal) -> Result<EnergyForces>;
}

/// UFF 参数化的 12-6 Lennard-Jones 势
///
/// E(r) = D_ij [ (r_m/r)^12 - 2 (r_m/r)^6 ]，
/// 混合规则按 UFF 取几何平均：r_m,ij = √(r_m,i · r_m,j)，
/// D_ij = √(D_i · D_j)。
pub struct UffLennardJones {
    /// 截断半径相对势阱位置的倍数
    cutoff_factor: f64,
}

impl UffLennardJones {
    pub fn new() -> Self {
        UffLennardJones { cutoff_factor: 2.5 }
    }
}

impl Default for UffLennardJones {
    fn default() -> Self {
        Self::new()
    }
}

impl Potential for UffLennardJones {
    fn name(&self) -> &'static str {
        "uff-lennard-jones"
    }

    fn energy_and_forces(&self, crystal: &Crystal) -> Result<EnergyForces> {
        let n = crystal.atoms.len();
        let carts = crystal.cart_positions();

        // 每原子参数
        let params: Vec<elements::ElementData> = crystal
            .atoms
            .iter()
            .map(|a| elements::lookup(&a.element))
            .collect::<Result<_>>()?;

        // 27 个平移向量
        let m = crystal.lattice.matrix;
        let mut shifts: Vec<[f64; 3]> = Vec::with_capacity(27);
        for na in -1i32..=1 {
            for nb in -1i32..=1 {
                for nc in -1i32..=1 {
                    shifts.push([
                        na as f64 * m[0][0] + nb as f64 * m[1][0] + nc as f64 * m[2][0],
                        na as f64 * m[0][1] + nb as f64 * m[1][1] + nc as f64 * m[2][1],
                        na as f64 * m[0][2] + nb as f64 * m[1][2] + nc as f64 * m[2][2],
                    ]);
                }
            }
        }

        let mut energy = 0.0;
        let mut forces = vec![[0.0; 3]; n];

        for i in 0..n {
            for j in i..n {
                let r_min = (params[i].lj_r_min * params[j].lj_r_min).sqrt();
                let depth = (params[i].lj_well_depth * params[j].lj_well_depth).sqrt();
                let r_cut = self.cutoff_factor * r_min;
                let e_cut = lj_energy(r_cut, r_min, depth);

                for shift in &shifts {
                    // 原子与自身的原像不成对
                    if i == j && shift.iter().all(|s| s.abs() < 1e-12) {
                        continue;
                    }

                    let d = [
                        carts[j][0] + shift[0] - carts[i][0],
                        carts[j][1] + shift[1] - carts[i][1],
                        carts[j][2] + shift[2] - carts[i][2],
                    ];
                    let r = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();

                    if r >= r_cut || r < 1e-6 {
                        continue;
                    }

                    // 自身周期像的成对能量会被 +shift/-shift 各数一次
                    let weight = if i == j { 0.5 } else { 1.0 };
                    energy += weight * (lj_energy(r, r_min, depth) - e_cut);

                    if i != j {
                        // F_i = dE/dr · d̂（d̂ 由 i 指向 j 的像）
                        let de_dr = lj_derivative(r, r_min, depth);
                        let scale = de_dr / r;
                        for k in 0..3 {
                            forces[i][k] += scale * d[k];
                            forces[j][k] -= scale * d[k];
                        }
                    }
                    // i == j 时 +shift 与 -shift 的力互相抵消，不累加
                }
            }
        }

        Ok(EnergyForces { energy, forces })
    }
}

/// E(r) = D [ (r_m/r)^12 - 2 (r_m/r)^6 ]
#[inline]
fn lj_energy(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    well_depth * (rho12 - 2.0 * rho6)
}

/// dE/dr = (12 D / r) [ (r_m/r)^6 - (r_m/r)^12 ]
#[inline]
fn lj_derivative(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    12.0 * well_depth * (rho6 - rho12) / dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Crystal, Lattice};

    /// 大晶胞中的 Ar 二聚体，避免周期像干扰
    fn argon_dimer(separation: f64) -> Crystal {
        let box_len = 40.0;
        let lattice = Lattice::from_vectors([
            [box_len, 0.0, 0.0],
            [0.0, box_len, 0.0],
            [0.0, 0.0, box_len],
        ]);
        let atoms = vec![
            Atom::new("Ar", [0.0, 0.0, 0.0]),
            Atom::new("Ar", [separation / box_len, 0.0, 0.0]),
        ];
        Crystal::new("Ar2", lattice, atoms)
    }

    #[test]
    fn test_lj_energy_minimum() {
        assert!((lj_energy(2.0, 2.0, 10.0) - (-10.0)).abs() < 1e-9);
        assert!(lj_derivative(2.0, 2.0, 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_dimer_at_minimum_has_zero_force() {
        let ar = crate::relax::elements::lookup("Ar").unwrap();
        let crystal = argon_dimer(ar.lj_r_min);

        let pot = UffLennardJones::new();
        let ef = pot.energy_and_forces(&crystal).unwrap();

        // 截断平移使能量略高于 -D
        assert!(ef.energy < -0.97 * ar.lj_well_depth);
        assert!(ef.energy > -ar.lj_well_depth);
        assert!(ef.max_force() < 1e-8);
    }

    #[test]
    fn test_compressed_dimer_repels() {
        let ar = crate::relax::elements::lookup("Ar").unwrap();
        let crystal = argon_dimer(0.8 * ar.lj_r_min);

        let pot = UffLennardJones::new();
        let ef = pot.energy_and_forces(&crystal).unwrap();

        // 原子 0 在原点，应被推向 -x
        assert!(ef.forces[0][0] < 0.0);
        assert!(ef.forces[1][0] > 0.0);
    }

    #[test]
    fn test_stretched_dimer_attracts() {
        let ar = crate::relax::elements::lookup("Ar").unwrap();
        let crystal = argon_dimer(1.3 * ar.lj_r_min);

        let pot = UffLennardJones::new();
        let ef = pot.energy_and_forces(&crystal).unwrap();

        assert!(ef.forces[0][0] > 0.0);
        assert!(ef.forces[1][0] < 0.0);
    }

    #[test]
    fn test_forces_sum_to_zero() {
        let lattice = Lattice::from_vectors([[8.0, 0.0, 0.0], [0.0, 8.0, 0.0], [0.0, 0.0, 8.0]]);
        let atoms = vec![
            Atom::new("Ar", [0.1, 0.2, 0.3]),
            Atom::new("Kr", [0.5, 0.4, 0.6]),
            Atom::new("Xe", [0.8, 0.7, 0.2]),
        ];
        let crystal = Crystal::new("mixed", lattice, atoms);

        let pot = UffLennardJones::new();
        let ef = pot.energy_and_forces(&crystal).unwrap();

        for k in 0..3 {
            let total: f64 = ef.forces.iter().map(|f| f[k]).sum();
            assert!(total.abs() < 1e-10);
        }
    }

    #[test]
    fn test_unknown_element_errors() {
        let lattice = Lattice::from_vectors([[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]]);
        let crystal = Crystal::new("bad", lattice, vec![Atom::new("Xx", [0.0, 0.0, 0.0])]);

        let pot = UffLennardJones::new();
        assert!(pot.energy_and_forces(&crystal).is_err());
    }

    #[test]
    fn test_numerical_force_consistency() {
        // 数值微分校验解析力
        let lattice = Lattice::from_vectors([[9.0, 0.0, 0.0], [0.0, 9.0, 0.0], [0.0, 0.0, 9.0]]);
        let atoms = vec![
            Atom::new("Ar", [0.10, 0.10, 0.10]),
            Atom::new("Ar", [0.55, 0.15, 0.12]),
        ];
        let crystal = Crystal::new("Ar2", lattice, atoms);
        let pot = UffLennardJones::new();

        let ef = pot.energy_and_forces(&crystal).unwrap();

        let h = 1e-6;
        let mut carts = crystal.cart_positions();
        carts[0][0] += h;
        let mut shifted = crystal.clone();
        shifted.set_cart_positions(&carts);
        let e_plus = pot.energy_and_forces(&shifted).unwrap().energy;

        carts[0][0] -= 2.0 * h;
        shifted.set_cart_positions(&carts);
        let e_minus = pot.energy_and_forces(&shifted).unwrap().energy;

        let numeric = -(e_plus - e_minus) / (2.0 * h);
        assert!((numeric - ef.forces[0][0]).abs() < 1e-5);
    }
}
