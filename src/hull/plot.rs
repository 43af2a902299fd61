//! # 相图图表生成
//!
//! 使用 `plotters` 库绘制二元 / 三元相图。
//!
//! ## 功能
//! - 二元体系：形成能 vs 组成曲线，凸包连线 + 稳定/非稳定散点
//! - 三元体系：重心坐标三角图，凸包面片连线（tie-lines）
//! - 支持 PNG 和 SVG 输出
//!
//! 四元及以上体系无法在平面上表达，由调用方跳过。
//!
//! ## 依赖关系
//! - 被 `commands/hull.rs` 调用
//! - 使用 `plotters` 渲染图表

use crate::error::{MatscreenError, Result};

use plotters::prelude::*;
use std::collections::BTreeSet;
use std::path::Path;

/// 绘图用的条目投影
#[derive(Debug, Clone)]
pub struct HullPlotPoint {
    /// 显示名称
    pub name: String,
    /// 原子分数向量（与元素列表对齐）
    pub fractions: Vec<f64>,
    /// 每原子形成能 (eV)
    pub formation_energy: f64,
    /// 是否位于凸包上
    pub is_stable: bool,
}

/// 生成相图（根据元素个数选择二元/三元布局）
pub fn generate_hull_plot(
    elements: &[String],
    points: &[HullPlotPoint],
    output_path: &Path,
    title: &str,
    width: u32,
    height: u32,
    use_svg: bool,
) -> Result<()> {
    match elements.len() {
        2 => {
            if use_svg {
                let root = SVGBackend::new(output_path, (width, height)).into_drawing_area();
                draw_binary(&root, elements, points, title)?;
                root.present()
                    .map_err(|e| MatscreenError::Other(e.to_string()))?;
            } else {
                let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
                draw_binary(&root, elements, points, title)?;
                root.present()
                    .map_err(|e| MatscreenError::Other(e.to_string()))?;
            }
            Ok(())
        }
        3 => {
            if use_svg {
                let root = SVGBackend::new(output_path, (width, height)).into_drawing_area();
                draw_ternary(&root, elements, points, title)?;
                root.present()
                    .map_err(|e| MatscreenError::Other(e.to_string()))?;
            } else {
                let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
                draw_ternary(&root, elements, points, title)?;
                root.present()
                    .map_err(|e| MatscreenError::Other(e.to_string()))?;
            }
            Ok(())
        }
        n => Err(MatscreenError::InvalidArgument(format!(
            "Hull plots support 2 or 3 components, got {}",
            n
        ))),
    }
}

/// 二元相图：x = 第二个元素的原子分数，y = 形成能
fn draw_binary<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    elements: &[String],
    points: &[HullPlotPoint],
    title: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)
        .map_err(|e| MatscreenError::Other(format!("{:?}", e)))?;

    let y_min = points
        .iter()
        .map(|p| p.formation_energy)
        .fold(0.0_f64, f64::min);
    let y_max = points
        .iter()
        .map(|p| p.formation_energy)
        .fold(0.0_f64, f64::max);
    let pad = ((y_max - y_min) * 0.15).max(0.05);

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.02..1.02, (y_min - pad)..(y_max + pad))
        .map_err(|e| MatscreenError::Other(format!("{:?}", e)))?;

    chart
        .configure_mesh()
        .x_desc(format!("x in {}(1-x){}(x)", elements[0], elements[1]))
        .y_desc("Formation energy (eV/atom)")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(|e| MatscreenError::Other(format!("{:?}", e)))?;

    // 凸包连线：稳定点按组成排序
    let mut hull: Vec<(f64, f64)> = points
        .iter()
        .filter(|p| p.is_stable)
        .map(|p| (p.fractions[1], p.formation_energy))
        .collect();
    hull.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let hull_color = RGBColor(0, 102, 204);
    chart
        .draw_series(LineSeries::new(hull.iter().cloned(), hull_color.stroke_width(2)))
        .map_err(|e| MatscreenError::Other(format!("{:?}", e)))?;

    // 散点：稳定实心蓝圆，非稳定红叉
    chart
        .draw_series(
            points
                .iter()
                .filter(|p| p.is_stable)
                .map(|p| Circle::new((p.fractions[1], p.formation_energy), 5, hull_color.filled())),
        )
        .map_err(|e| MatscreenError::Other(format!("{:?}", e)))?;

    chart
        .draw_series(
            points
                .iter()
                .filter(|p| !p.is_stable)
                .map(|p| Cross::new((p.fractions[1], p.formation_energy), 5, RED.stroke_width(2))),
        )
        .map_err(|e| MatscreenError::Other(format!("{:?}", e)))?;

    // 稳定相标注
    chart
        .draw_series(points.iter().filter(|p| p.is_stable).map(|p| {
            Text::new(
                p.name.clone(),
                (p.fractions[1] + 0.012, p.formation_energy - pad * 0.2),
                ("sans-serif", 14),
            )
        }))
        .map_err(|e| MatscreenError::Other(format!("{:?}", e)))?;

    Ok(())
}

/// 三元相图：重心坐标投影
///
/// 分数 (f0, f1, f2) 映射到 x = f1 + f2/2, y = f2·√3/2。
fn draw_ternary<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    elements: &[String],
    points: &[HullPlotPoint],
    title: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)
        .map_err(|e| MatscreenError::Other(format!("{:?}", e)))?;

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(40)
        .build_cartesian_2d(-0.12..1.12, -0.10..1.00)
        .map_err(|e| MatscreenError::Other(format!("{:?}", e)))?;

    let height = 3.0_f64.sqrt() / 2.0;
    let to_xy = |f: &[f64]| -> (f64, f64) { (f[1] + f[2] / 2.0, f[2] * height) };

    // 三角形边框
    let corners = [(0.0, 0.0), (1.0, 0.0), (0.5, height), (0.0, 0.0)];
    chart
        .draw_series(LineSeries::new(corners.iter().cloned(), BLACK.stroke_width(2)))
        .map_err(|e| MatscreenError::Other(format!("{:?}", e)))?;

    // 顶点元素标签
    let labels = [
        (elements[0].clone(), (-0.06, -0.05)),
        (elements[1].clone(), (1.02, -0.05)),
        (elements[2].clone(), (0.48, height + 0.03)),
    ];
    for (text, pos) in labels {
        chart
            .draw_series(std::iter::once(Text::new(text, pos, ("sans-serif", 20))))
            .map_err(|e| MatscreenError::Other(format!("{:?}", e)))?;
    }

    // 凸包面片的边（tie-lines）
    let stable: Vec<&HullPlotPoint> = points.iter().filter(|p| p.is_stable).collect();
    let hull_color = RGBColor(0, 102, 204);

    for (i, j) in lower_hull_edges(&stable) {
        let a = to_xy(&stable[i].fractions);
        let b = to_xy(&stable[j].fractions);
        chart
            .draw_series(LineSeries::new(vec![a, b], hull_color.stroke_width(1)))
            .map_err(|e| MatscreenError::Other(format!("{:?}", e)))?;
    }

    // 散点
    chart
        .draw_series(
            stable
                .iter()
                .map(|p| Circle::new(to_xy(&p.fractions), 5, hull_color.filled())),
        )
        .map_err(|e| MatscreenError::Other(format!("{:?}", e)))?;

    chart
        .draw_series(
            points
                .iter()
                .filter(|p| !p.is_stable)
                .map(|p| Cross::new(to_xy(&p.fractions), 5, RED.stroke_width(2))),
        )
        .map_err(|e| MatscreenError::Other(format!("{:?}", e)))?;

    chart
        .draw_series(stable.iter().map(|p| {
            let (x, y) = to_xy(&p.fractions);
            Text::new(p.name.clone(), (x + 0.015, y + 0.015), ("sans-serif", 14))
        }))
        .map_err(|e| MatscreenError::Other(format!("{:?}", e)))?;

    Ok(())
}

/// 三元凸包面片枚举（暴力法）
///
/// 在 (f1, f2, Ef) 空间内，三个稳定点构成下包络面片当且仅当其余
/// 稳定点都不在平面下方。稳定点通常只有个位数，O(s^4) 足够。
fn lower_hull_edges(stable: &[&HullPlotPoint]) -> BTreeSet<(usize, usize)> {
    let mut edges = BTreeSet::new();
    let s = stable.len();

    let coords: Vec<[f64; 3]> = stable
        .iter()
        .map(|p| [p.fractions[1], p.fractions[2], p.formation_energy])
        .collect();

    for i in 0..s {
        for j in (i + 1)..s {
            for k in (j + 1)..s {
                if let Some(plane) = plane_through(&coords[i], &coords[j], &coords[k]) {
                    let ok = coords.iter().all(|p| {
                        let z = plane[0] + plane[1] * p[0] + plane[2] * p[1];
                        p[2] >= z - 1e-9
                    });
                    if ok {
                        edges.insert((i, j));
                        edges.insert((i, k));
                        edges.insert((j, k));
                    }
                }
            }
        }
    }

    edges
}

/// 过三点的非竖直平面 z = p0 + p1·x + p2·y；三点投影共线时返回 None
fn plane_through(a: &[f64; 3], b: &[f64; 3], c: &[f64; 3]) -> Option<[f64; 3]> {
    let det = (b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1]);
    if det.abs() < 1e-12 {
        return None;
    }

    let p1 = ((b[2] - a[2]) * (c[1] - a[1]) - (c[2] - a[2]) * (b[1] - a[1])) / det;
    let p2 = ((b[0] - a[0]) * (c[2] - a[2]) - (c[0] - a[0]) * (b[2] - a[2])) / det;
    let p0 = a[2] - p1 * a[0] - p2 * a[1];

    Some([p0, p1, p2])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(name: &str, fractions: Vec<f64>, ef: f64, stable: bool) -> HullPlotPoint {
        HullPlotPoint {
            name: name.to_string(),
            fractions,
            formation_energy: ef,
            is_stable: stable,
        }
    }

    #[test]
    fn test_plane_through_flat() {
        let plane = plane_through(&[0.0, 0.0, 1.0], &[1.0, 0.0, 1.0], &[0.0, 1.0, 1.0]).unwrap();
        assert!((plane[0] - 1.0).abs() < 1e-12);
        assert!(plane[1].abs() < 1e-12);
        assert!(plane[2].abs() < 1e-12);
    }

    #[test]
    fn test_plane_through_collinear() {
        assert!(plane_through(&[0.0, 0.0, 0.0], &[0.5, 0.0, 1.0], &[1.0, 0.0, 2.0]).is_none());
    }

    #[test]
    fn test_lower_hull_edges_single_facet() {
        let a = point("A", vec![1.0, 0.0, 0.0], 0.0, true);
        let b = point("B", vec![0.0, 1.0, 0.0], 0.0, true);
        let c = point("C", vec![0.0, 0.0, 1.0], 0.0, true);
        let stable = vec![&a, &b, &c];

        let edges = lower_hull_edges(&stable);
        assert_eq!(edges.len(), 3);
    }

    #[test]
    fn test_lower_hull_edges_interior_vertex() {
        // 内部稳定点把三角形剖分成三个面片
        let a = point("A", vec![1.0, 0.0, 0.0], 0.0, true);
        let b = point("B", vec![0.0, 1.0, 0.0], 0.0, true);
        let c = point("C", vec![0.0, 0.0, 1.0], 0.0, true);
        let third = 1.0 / 3.0;
        let abc = point("ABC", vec![third, third, third], -1.0, true);
        let stable = vec![&a, &b, &c, &abc];

        let edges = lower_hull_edges(&stable);

        // 三条外边 + 三条到内部点的边；外三角自身不再是面片
        assert!(edges.contains(&(0, 3)));
        assert!(edges.contains(&(1, 3)));
        assert!(edges.contains(&(2, 3)));
        assert_eq!(edges.len(), 6);
    }
}
