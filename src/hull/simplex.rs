//! # 稠密两阶段单纯形法
//!
//! 求解凸包距离所需的小规模线性规划：
//!
//! ```text
//! min  c·λ
//! s.t. A λ = b,  λ >= 0
//! ```
//!
//! 其中 A 的列是候选相的原子分数向量（非负，列和为 1），b 是目标组成
//! 的原子分数（非负，和为 1），c 是候选相的每原子形成能。此时最优值
//! 就是组成 b 处凸包下包络的能量。
//!
//! ## 算法
//! 1. 第一阶段：引入人工变量，最小化其和以找到可行基
//! 2. 第二阶段：在可行基上最小化真实目标
//! 3. 入基采用 Bland 规则，避免退化循环
//!
//! 问题规模为（元素数 × 候选相数），通常只有个位数行、几十列。
//!
//! ## 依赖关系
//! - 被 `hull/phase_diagram.rs` 调用
//! - 无外部模块依赖

const TOL: f64 = 1e-9;

/// 线性规划解
#[derive(Debug, Clone)]
pub struct LpSolution {
    /// 最优目标值 c·λ
    pub objective: f64,
    /// 最优解 λ
    pub weights: Vec<f64>,
}

/// 求解 min c·λ, A λ = b, λ >= 0
///
/// `a` 为 m 行 n 列（行主序），`b` 长度 m 且非负，`c` 长度 n。
/// 不可行时返回 `None`。目标函数在可行域上有下界（本用例中 λ 有界），
/// 因此不处理无界情形。
pub fn solve_min(a: &[Vec<f64>], b: &[f64], c: &[f64]) -> Option<LpSolution> {
    let m = a.len();
    if m == 0 {
        return None;
    }
    let n = a[0].len();
    if n == 0 || b.len() != m || c.len() != n {
        return None;
    }

    // 画布: n 个真实变量 + m 个人工变量 + 1 列 rhs
    let cols = n + m + 1;
    let mut t: Vec<Vec<f64>> = Vec::with_capacity(m);
    for i in 0..m {
        let mut row = vec![0.0; cols];
        row[..n].copy_from_slice(&a[i]);
        row[n + i] = 1.0;
        row[cols - 1] = b[i].max(0.0);
        t.push(row);
    }

    // 初始基 = 人工变量
    let mut basis: Vec<usize> = (n..n + m).collect();

    // ─────────────────────────────────────────────────────────────
    // 第一阶段：min Σ 人工变量
    // ─────────────────────────────────────────────────────────────
    let mut phase1_cost = vec![0.0; n + m];
    for j in n..n + m {
        phase1_cost[j] = 1.0;
    }

    pivot_until_optimal(&mut t, &mut basis, &phase1_cost, n + m);

    let phase1_value: f64 = basis
        .iter()
        .zip(t.iter())
        .map(|(&bj, row)| phase1_cost[bj] * row[cols - 1])
        .sum();

    if phase1_value > 1e-7 {
        return None; // 不可行
    }

    // 仍在基中的零值人工变量：尝试换出；整行为零则该约束冗余
    for i in 0..m {
        if basis[i] >= n {
            if let Some(j) = (0..n).find(|&j| t[i][j].abs() > TOL) {
                pivot(&mut t, &mut basis, i, j);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // 第二阶段：min c·λ（人工变量不再入基）
    // ─────────────────────────────────────────────────────────────
    // 残留在基中的人工变量对应冗余约束，取值为零且不参与入基，
    // 成本记零即可
    let mut phase2_cost = vec![0.0; n + m];
    phase2_cost[..n].copy_from_slice(c);

    pivot_until_optimal(&mut t, &mut basis, &phase2_cost, n);

    let mut weights = vec![0.0; n];
    let mut objective = 0.0;
    for (i, &bj) in basis.iter().enumerate() {
        let value = t[i][cols - 1];
        if bj < n {
            weights[bj] = value;
            objective += c[bj] * value;
        }
    }

    Some(LpSolution { objective, weights })
}

/// 反复选择入基/出基变量直到最优
///
/// `enter_limit` 限制可入基的列（第二阶段排除人工变量）。
fn pivot_until_optimal(
    t: &mut [Vec<f64>],
    basis: &mut [usize],
    cost: &[f64],
    enter_limit: usize,
) {
    let m = t.len();
    let cols = t[0].len();

    loop {
        // 约简成本: c_j - Σ_i c_basis[i] * t[i][j]，Bland 规则取最小下标
        let mut entering = None;
        for j in 0..enter_limit {
            if basis.contains(&j) {
                continue;
            }
            let reduced: f64 =
                cost[j] - basis.iter().zip(t.iter()).map(|(&bj, row)| cost[bj] * row[j]).sum::<f64>();
            if reduced < -TOL {
                entering = Some(j);
                break;
            }
        }

        let j = match entering {
            Some(j) => j,
            None => return,
        };

        // 最小比值测试，同样用最小基变量下标破平
        let mut leaving: Option<(usize, f64)> = None;
        for i in 0..m {
            if t[i][j] > TOL {
                let ratio = t[i][cols - 1] / t[i][j];
                match leaving {
                    None => leaving = Some((i, ratio)),
                    Some((li, lr)) => {
                        if ratio < lr - TOL || (ratio < lr + TOL && basis[i] < basis[li]) {
                            leaving = Some((i, ratio));
                        }
                    }
                }
            }
        }

        let i = match leaving {
            Some((i, _)) => i,
            None => return, // 无界方向；本用例不会出现，防御性退出
        };

        pivot(t, basis, i, j);
    }
}

/// 在 (row, col) 处做一次高斯消元主元变换
fn pivot(t: &mut [Vec<f64>], basis: &mut [usize], row: usize, col: usize) {
    let cols = t[0].len();
    let p = t[row][col];

    for v in t[row].iter_mut() {
        *v /= p;
    }

    let pivot_row = t[row].clone();
    for (i, current) in t.iter_mut().enumerate() {
        if i == row {
            continue;
        }
        let factor = current[col];
        if factor != 0.0 {
            for j in 0..cols {
                current[j] -= factor * pivot_row[j];
            }
        }
    }

    basis[row] = col;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_match_single_candidate() {
        // 一个候选恰好等于目标组成
        let a = vec![vec![0.5], vec![0.5]];
        let b = vec![0.5, 0.5];
        let c = vec![-1.0];

        let sol = solve_min(&a, &b, &c).unwrap();
        assert!((sol.objective - (-1.0)).abs() < 1e-8);
        assert!((sol.weights[0] - 1.0).abs() < 1e-8);
    }

    #[test]
    fn test_binary_mixture_beats_endpoints() {
        // 列: A, B, AB；目标 AB 组成
        let a = vec![vec![1.0, 0.0, 0.5], vec![0.0, 1.0, 0.5]];
        let b = vec![0.5, 0.5];
        let c = vec![0.0, 0.0, -1.0];

        let sol = solve_min(&a, &b, &c).unwrap();
        assert!((sol.objective - (-1.0)).abs() < 1e-8);
    }

    #[test]
    fn test_interpolated_composition() {
        // 目标在 A 和 AB 之间: x_B = 0.25 -> 0.5*A + 0.5*AB
        let a = vec![vec![1.0, 0.0, 0.5], vec![0.0, 1.0, 0.5]];
        let b = vec![0.75, 0.25];
        let c = vec![0.0, 0.0, -1.0];

        let sol = solve_min(&a, &b, &c).unwrap();
        assert!((sol.objective - (-0.5)).abs() < 1e-8);
        assert!((sol.weights[0] - 0.5).abs() < 1e-6);
        assert!((sol.weights[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_positive_candidate_ignored() {
        // 高于端点连线的候选不应被选中
        let a = vec![vec![1.0, 0.0, 0.5], vec![0.0, 1.0, 0.5]];
        let b = vec![0.5, 0.5];
        let c = vec![0.0, 0.0, 2.0];

        let sol = solve_min(&a, &b, &c).unwrap();
        assert!(sol.objective.abs() < 1e-8);
    }

    #[test]
    fn test_infeasible_composition() {
        // 没有候选含第二种元素
        let a = vec![vec![1.0], vec![0.0]];
        let b = vec![0.5, 0.5];
        let c = vec![0.0];

        assert!(solve_min(&a, &b, &c).is_none());
    }

    #[test]
    fn test_ternary_facet() {
        // 列: A, B, C, ABC(各 1/3, Ef=-3)；目标 = ABC 组成
        let third = 1.0 / 3.0;
        let a = vec![
            vec![1.0, 0.0, 0.0, third],
            vec![0.0, 1.0, 0.0, third],
            vec![0.0, 0.0, 1.0, third],
        ];
        let b = vec![third, third, third];
        let c = vec![0.0, 0.0, 0.0, -3.0];

        let sol = solve_min(&a, &b, &c).unwrap();
        assert!((sol.objective - (-3.0)).abs() < 1e-8);
    }
}
