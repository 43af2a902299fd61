//! # FIRE 结构弛豫器
//!
//! Fast Inertial Relaxation Engine (Bitzek et al., PRL 97, 170201
//! (2006))。对笛卡尔坐标做准动力学下降，收敛判据为最大受力范数
//! 低于 fmax。优化动力学不涉及真实质量，统一取单位质量。
//!
//! ## 参考
//! - ase.optimize.FIRE
//!
//! ## 依赖关系
//! - 被 `commands/relax.rs` 调用
//! - 使用 `relax/potential.rs` 的计算器接口

use crate::error::Result;
use crate::models::Crystal;
use crate::relax::potential::Potential;

/// 弛豫结果
#[derive(Debug, Clone)]
pub struct RelaxOutcome {
    /// 是否达到 fmax 收敛
    pub converged: bool,
    /// 实际执行的步数
    pub steps: usize,
    /// 终态总势能 (eV)
    pub energy: f64,
    /// 终态最大受力 (eV/Å)
    pub max_force: f64,
}

/// FIRE 弛豫器
pub struct Fire {
    /// 收敛阈值：最大受力范数 (eV/Å)
    pub fmax: f64,
    /// 最大步数
    pub max_steps: usize,

    dt_start: f64,
    dt_max: f64,
    n_min: usize,
    f_inc: f64,
    f_dec: f64,
    alpha_start: f64,
    f_alpha: f64,
}

impl Fire {
    /// 标准 FIRE 参数
    pub fn new(fmax: f64, max_steps: usize) -> Self {
        Fire {
            fmax,
            max_steps,
            dt_start: 0.1,
            dt_max: 1.0,
            n_min: 5,
            f_inc: 1.1,
            f_dec: 0.5,
            alpha_start: 0.1,
            f_alpha: 0.99,
        }
    }

    /// 原位弛豫结构，日志逐行追加到 `log`
    pub fn run(
        &self,
        crystal: &mut Crystal,
        potential: &dyn Potential,
        log: &mut String,
    ) -> Result<RelaxOutcome> {
        let n = crystal.atoms.len();
        let mut carts = crystal.cart_positions();
        let mut velocity = vec![[0.0_f64; 3]; n];

        let mut dt = self.dt_start;
        let mut alpha = self.alpha_start;
        let mut n_pos = 0usize;

        log.push_str("step        energy_eV      fmax_eVA\n");

        let mut last = potential.energy_and_forces(crystal)?;
        let mut steps = 0;

        for step in 0..=self.max_steps {
            let fmax = last.max_force();
            log.push_str(&format!("{:4}  {:16.6}  {:12.6}\n", step, last.energy, fmax));

            if fmax <= self.fmax {
                return Ok(RelaxOutcome {
                    converged: true,
                    steps,
                    energy: last.energy,
                    max_force: fmax,
                });
            }

            if step == self.max_steps {
                break;
            }

            // 动力/阻尼混合：P = F·v
            let power: f64 = last
                .forces
                .iter()
                .zip(velocity.iter())
                .map(|(f, v)| f[0] * v[0] + f[1] * v[1] + f[2] * v[2])
                .sum();

            if power > 0.0 {
                n_pos += 1;
                if n_pos > self.n_min {
                    dt = (dt * self.f_inc).min(self.dt_max);
                    alpha *= self.f_alpha;
                }

                let v_norm: f64 = velocity
                    .iter()
                    .map(|v| v[0] * v[0] + v[1] * v[1] + v[2] * v[2])
                    .sum::<f64>()
                    .sqrt();
                let f_norm: f64 = last
                    .forces
                    .iter()
                    .map(|f| f[0] * f[0] + f[1] * f[1] + f[2] * f[2])
                    .sum::<f64>()
                    .sqrt();

                if f_norm > 1e-12 {
                    let mix = alpha * v_norm / f_norm;
                    for (v, f) in velocity.iter_mut().zip(last.forces.iter()) {
                        for k in 0..3 {
                            v[k] = (1.0 - alpha) * v[k] + mix * f[k];
                        }
                    }
                }
            } else {
                n_pos = 0;
                dt *= self.f_dec;
                alpha = self.alpha_start;
                velocity = vec![[0.0; 3]; n];
            }

            // 单位质量的半隐式欧拉步
            for ((v, f), x) in velocity.iter_mut().zip(last.forces.iter()).zip(carts.iter_mut()) {
                for k in 0..3 {
                    v[k] += dt * f[k];
                    x[k] += dt * v[k];
                }
            }

            crystal.set_cart_positions(&carts);
            last = potential.energy_and_forces(crystal)?;
            steps = step + 1;
        }

        Ok(RelaxOutcome {
            converged: false,
            steps,
            energy: last.energy,
            max_force: last.max_force(),
        })
    }
}
