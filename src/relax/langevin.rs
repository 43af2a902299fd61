//! # Langevin 分子动力学（摇晃测试）
//!
//! 弛豫后的短时 MD：Maxwell–Boltzmann 初速度 + Langevin 恒温积分，
//! 逐步记录势能，用能量漂移判断结构是否稳定。
//!
//! ## 积分格式
//! ```text
//! v += dt · ( F/m − γ v ) + √(2 γ kB T dt / m) · ξ,  ξ ~ N(0,1)
//! x += dt · v
//! ```
//! 单位制 eV/Å/fs/amu，质量换算见 `relax/units.rs`。
//!
//! ## 参考
//! - ase.md.langevin.Langevin
//! - ase.md.velocitydistribution.MaxwellBoltzmannDistribution
//!
//! ## 依赖关系
//! - 被 `commands/relax.rs` 调用
//! - 使用 `relax/potential.rs`, `relax/elements.rs`, `relax/units.rs`
//! - 使用 `rand` / `rand_distr` 生成初速度与热噪声

use crate::error::Result;
use crate::models::Crystal;
use crate::relax::elements;
use crate::relax::potential::Potential;
use crate::relax::units::{AMU_A2_PER_FS2_IN_EV, KB_EV_PER_K};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// MD 运行参数
#[derive(Debug, Clone)]
pub struct LangevinParams {
    /// 步数
    pub steps: usize,
    /// 时间步长 (fs)
    pub timestep_fs: f64,
    /// 目标温度 (K)
    pub temperature_k: f64,
    /// 摩擦系数 (fs⁻¹)
    pub friction_per_fs: f64,
    /// 初速度与热噪声的随机种子
    pub seed: u64,
}

/// MD 运行结果
#[derive(Debug, Clone)]
pub struct MdOutcome {
    /// 每步势能 (eV)
    pub energies: Vec<f64>,
    /// 能量漂移 (meV/atom)，不足两步时为 None
    pub drift_mev_per_atom: Option<f64>,
}

/// Maxwell–Boltzmann 初速度 (Å/fs)，去除质心动量
pub fn maxwell_boltzmann_velocities(
    masses: &[f64],
    temperature_k: f64,
    rng: &mut StdRng,
) -> Vec<[f64; 3]> {
    let mut velocities: Vec<[f64; 3]> = masses
        .iter()
        .map(|&m| {
            let sigma =
                (KB_EV_PER_K * temperature_k.max(0.0) / (m * AMU_A2_PER_FS2_IN_EV)).sqrt();
            // sigma 非负有限，构造不会失败
            let normal = Normal::new(0.0, sigma).unwrap();
            [
                normal.sample(rng),
                normal.sample(rng),
                normal.sample(rng),
            ]
        })
        .collect();

    // 去除净动量
    let total_mass: f64 = masses.iter().sum();
    if total_mass > 0.0 {
        let mut p = [0.0_f64; 3];
        for (&m, v) in masses.iter().zip(velocities.iter()) {
            for k in 0..3 {
                p[k] += m * v[k];
            }
        }
        for v in velocities.iter_mut() {
            for k in 0..3 {
                v[k] -= p[k] / total_mass;
            }
        }
    }

    velocities
}

/// Langevin 积分器
pub struct Langevin {
    params: LangevinParams,
}

impl Langevin {
    pub fn new(params: LangevinParams) -> Self {
        Langevin { params }
    }

    /// 原位运行 MD，日志逐行追加到 `log`
    pub fn run(
        &self,
        crystal: &mut Crystal,
        potential: &dyn Potential,
        log: &mut String,
    ) -> Result<MdOutcome> {
        let n = crystal.atoms.len();
        let dt = self.params.timestep_fs;
        let gamma = self.params.friction_per_fs;
        let kbt = KB_EV_PER_K * self.params.temperature_k.max(0.0);

        let masses: Vec<f64> = crystal
            .atoms
            .iter()
            .map(|a| elements::lookup(&a.element).map(|d| d.mass))
            .collect::<Result<_>>()?;

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut velocities =
            maxwell_boltzmann_velocities(&masses, self.params.temperature_k, &mut rng);
        let mut carts = crystal.cart_positions();

        let noise = Normal::new(0.0, 1.0).unwrap();

        log.push_str("step       epot_eV       ekin_eV      temp_K\n");

        let mut energies = Vec::with_capacity(self.params.steps);
        let mut ef = potential.energy_and_forces(crystal)?;

        for step in 0..self.params.steps {
            for i in 0..n {
                let m_eff = masses[i] * AMU_A2_PER_FS2_IN_EV;
                let sigma = (2.0 * gamma * kbt * dt / m_eff).sqrt();

                for k in 0..3 {
                    let accel = ef.forces[i][k] / m_eff - gamma * velocities[i][k];
                    velocities[i][k] += dt * accel + sigma * noise.sample(&mut rng);
                    carts[i][k] += dt * velocities[i][k];
                }
            }

            crystal.set_cart_positions(&carts);
            ef = potential.energy_and_forces(crystal)?;
            energies.push(ef.energy);

            let ekin = kinetic_energy(&masses, &velocities);
            let temp = 2.0 * ekin / (3.0 * n.max(1) as f64 * KB_EV_PER_K);
            log.push_str(&format!(
                "{:4}  {:12.6}  {:12.6}  {:10.2}\n",
                step + 1,
                ef.energy,
                ekin,
                temp
            ));
        }

        let drift_mev_per_atom = if energies.len() >= 2 {
            Some(1000.0 * (energies[energies.len() - 1] - energies[0]) / n.max(1) as f64)
        } else {
            None
        };

        Ok(MdOutcome {
            energies,
            drift_mev_per_atom,
        })
    }
}

/// 总动能 (eV)
fn kinetic_energy(masses: &[f64], velocities: &[[f64; 3]]) -> f64 {
    masses
        .iter()
        .zip(velocities.iter())
        .map(|(&m, v)| {
            0.5 * m * AMU_A2_PER_FS2_IN_EV * (v[0] * v[0] + v[1] * v[1] + v[2] * v[2])
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Atom, Crystal, Lattice};
    use crate::relax::potential::UffLennardJones;

    #[test]
    fn test_maxwell_boltzmann_zero_momentum() {
        let masses = vec![39.948; 32];
        let mut rng = StdRng::seed_from_u64(7);
        let velocities = maxwell_boltzmann_velocities(&masses, 300.0, &mut rng);

        for k in 0..3 {
            let p: f64 = masses
                .iter()
                .zip(velocities.iter())
                .map(|(&m, v)| m * v[k])
                .sum();
            assert!(p.abs() < 1e-10);
        }
    }

    #[test]
    fn test_maxwell_boltzmann_temperature() {
        // 大样本下动能应接近 3/2 N kB T
        let n = 500;
        let masses = vec![39.948; n];
        let mut rng = StdRng::seed_from_u64(42);
        let velocities = maxwell_boltzmann_velocities(&masses, 300.0, &mut rng);

        let ekin = kinetic_energy(&masses, &velocities);
        let expected = 1.5 * n as f64 * KB_EV_PER_K * 300.0;

        assert!((ekin - expected).abs() / expected < 0.15);
    }

    #[test]
    fn test_seeded_runs_are_deterministic() {
        let params = LangevinParams {
            steps: 5,
            timestep_fs: 1.0,
            temperature_k: 100.0,
            friction_per_fs: 0.02,
            seed: 42,
        };

        let make = || {
            let lattice =
                Lattice::from_vectors([[20.0, 0.0, 0.0], [0.0, 20.0, 0.0], [0.0, 0.0, 20.0]]);
            let atoms = vec![
                Atom::new("Ar", [0.0, 0.0, 0.0]),
                Atom::new("Ar", [0.19, 0.0, 0.0]),
            ];
            Crystal::new("Ar2", lattice, atoms)
        };

        let pot = UffLennardJones::new();

        let mut a = make();
        let mut log_a = String::new();
        let out_a = Langevin::new(params.clone()).run(&mut a, &pot, &mut log_a).unwrap();

        let mut b = make();
        let mut log_b = String::new();
        let out_b = Langevin::new(params).run(&mut b, &pot, &mut log_b).unwrap();

        assert_eq!(out_a.energies.len(), 5);
        for (x, y) in out_a.energies.iter().zip(out_b.energies.iter()) {
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_drift_requires_two_steps() {
        let lattice = Lattice::from_vectors([[20.0, 0.0, 0.0], [0.0, 20.0, 0.0], [0.0, 0.0, 20.0]]);
        let atoms = vec![Atom::new("Ar", [0.5, 0.5, 0.5])];
        let mut crystal = Crystal::new("Ar", lattice, atoms);

        let params = LangevinParams {
            steps: 1,
            timestep_fs: 1.0,
            temperature_k: 300.0,
            friction_per_fs: 0.02,
            seed: 1,
        };

        let pot = UffLennardJones::new();
        let mut log = String::new();
        let out = Langevin::new(params).run(&mut crystal, &pot, &mut log).unwrap();

        assert_eq!(out.energies.len(), 1);
        assert!(out.drift_mev_per_atom.is_none());
    }
}
