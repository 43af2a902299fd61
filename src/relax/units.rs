//! # 单位制与物理常数
//!
//! 全工具链采用 eV / Å / fs / amu / K 内部单位制。
//!
//! ## 依赖关系
//! - 被 `relax/` 各子模块使用
//! - 纯常数，无外部依赖

/// 玻尔兹曼常数 (eV/K)
pub const KB_EV_PER_K: f64 = 8.617333262e-5;

/// 1 amu·Å²/fs² 对应的能量 (eV)
///
/// 动能 KE[eV] = 0.5 · m[amu] · v²[Å²/fs²] · 该常数；
/// 加速度 a[Å/fs²] = F[eV/Å] / (m[amu] · 该常数)。
pub const AMU_A2_PER_FS2_IN_EV: f64 = 103.642697;

/// 1 kcal/mol 对应的能量 (eV)
pub const KCAL_PER_MOL_IN_EV: f64 = 0.0433641;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinetic_energy_conversion() {
        // 1 amu 以 1 Å/fs 运动的动能应为 ~51.8 eV
        let ke = 0.5 * 1.0 * 1.0 * AMU_A2_PER_FS2_IN_EV;
        assert!((ke - 51.8213485).abs() < 1e-4);
    }
}
