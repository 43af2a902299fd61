//! # hull 子命令实现
//!
//! 读取组成-能量 CSV，构建相图并输出形成能与凸包距离。
//!
//! ## 流程
//! 1. 校验输入列（composition, energy_per_atom_eV, 可选 label）
//! 2. 构建相图（单质参考、形成能、凸包）
//! 3. 写出结果 CSV（追加 formation/distance/is_stable 列）
//! 4. 终端表格显示最接近凸包的条目
//! 5. 可选绘制二元/三元相图
//!
//! ## 依赖关系
//! - 使用 `cli/hull.rs` 定义的参数
//! - 使用 `hull/` 模块进行计算与绘图
//! - 使用 `utils/output.rs`

use crate::cli::hull::HullArgs;
use crate::error::{MatscreenError, Result};
use crate::hull::plot::{generate_hull_plot, HullPlotPoint};
use crate::hull::{PdEntry, PhaseDiagram, Stability};
use crate::models::Composition;
use crate::utils::output;

use std::path::Path;
use tabled::{Table, Tabled};

/// CSV 一行的原始数据 + 解析结果
struct Row {
    composition: String,
    energy_per_atom: f64,
    label: Option<String>,
    entry: PdEntry,
}

/// 终端表格行
#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Entry")]
    entry: String,
    #[tabled(rename = "Composition")]
    composition: String,
    #[tabled(rename = "Ef (eV/atom)")]
    formation_energy: String,
    #[tabled(rename = "ΔH_hull (eV/atom)")]
    distance: String,
    #[tabled(rename = "Decomposition")]
    decomposition: String,
}

/// 执行凸包分析
pub fn execute(args: HullArgs) -> Result<()> {
    output::print_header("Convex Hull Stability Analysis");

    if !args.csv.exists() {
        return Err(MatscreenError::FileNotFound {
            path: args.csv.display().to_string(),
        });
    }

    let rows = load_rows(&args.csv)?;
    output::print_info(&format!(
        "Loaded {} entries from '{}'",
        rows.len(),
        args.csv.display()
    ));

    let entries: Vec<PdEntry> = rows.iter().map(|r| r.entry.clone()).collect();
    let diagram = PhaseDiagram::build(&entries)?;

    output::print_info(&format!(
        "{}-component system: {}",
        diagram.num_components(),
        diagram.elements().join("-")
    ));

    let references: Vec<String> = diagram
        .elements()
        .iter()
        .filter_map(|el| {
            diagram
                .reference_energy(el)
                .map(|e| format!("{} = {:.4} eV/atom", el, e))
        })
        .collect();
    output::print_info(&format!("Elemental references: {}", references.join(", ")));

    let stabilities: Vec<Stability> = entries
        .iter()
        .map(|e| diagram.evaluate(e))
        .collect::<Result<_>>()?;

    let stable_count = stabilities.iter().filter(|s| s.is_stable).count();
    output::print_info(&format!(
        "{} of {} entries on the hull",
        stable_count,
        rows.len()
    ));

    let mut stable_names: Vec<String> =
        diagram.stable_candidates().iter().map(|c| c.name.clone()).collect();
    stable_names.sort();
    output::print_success(&format!("Stable phases: {}", stable_names.join(", ")));

    // 结果 CSV
    write_results_csv(&rows, &stabilities, &args.out)?;
    output::print_success(&format!("Results saved to '{}'", args.out.display()));

    // 终端表格：按凸包距离升序
    print_result_table(&diagram, &rows, &stabilities, args.top_n);

    // 可选相图
    if let Some(ref plot_path) = args.plot {
        match diagram.num_components() {
            2 | 3 => {
                let points: Vec<HullPlotPoint> = rows
                    .iter()
                    .zip(stabilities.iter())
                    .map(|(row, s)| HullPlotPoint {
                        name: row.entry.name(),
                        fractions: diagram.fraction_vector(&row.entry.composition),
                        formation_energy: s.formation_energy_per_atom,
                        is_stable: s.is_stable,
                    })
                    .collect();

                let title = format!("{} phase diagram", diagram.elements().join("-"));
                let use_svg = plot_path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|s| s.eq_ignore_ascii_case("svg"))
                    .unwrap_or(false);

                generate_hull_plot(
                    diagram.elements(),
                    &points,
                    plot_path,
                    &title,
                    args.width,
                    args.height,
                    use_svg,
                )?;
                output::print_success(&format!("Plot saved to '{}'", plot_path.display()));
            }
            n => {
                output::print_warning(&format!(
                    "Plotting supported only for binary/ternary systems ({} components). Skipping.",
                    n
                ));
            }
        }
    }

    Ok(())
}

/// 读取并校验输入 CSV
fn load_rows(path: &Path) -> Result<Vec<Row>> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let comp_col = column("composition").ok_or_else(|| MatscreenError::MissingColumn {
        column: "composition".to_string(),
        path: path.display().to_string(),
    })?;
    let energy_col = column("energy_per_atom_eV").ok_or_else(|| MatscreenError::MissingColumn {
        column: "energy_per_atom_eV".to_string(),
        path: path.display().to_string(),
    })?;
    let label_col = column("label");

    let mut rows = Vec::new();

    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let line = idx + 2; // 表头占第 1 行

        let comp_text = record.get(comp_col).unwrap_or("").trim().to_string();
        let composition = Composition::parse(&comp_text).map_err(|e| {
            MatscreenError::ParseError {
                format: "csv".to_string(),
                path: path.display().to_string(),
                reason: format!("line {}: {}", line, e),
            }
        })?;

        let energy_text = record.get(energy_col).unwrap_or("").trim();
        let energy_per_atom: f64 =
            energy_text
                .parse()
                .map_err(|_| MatscreenError::ParseError {
                    format: "csv".to_string(),
                    path: path.display().to_string(),
                    reason: format!("line {}: invalid energy_per_atom_eV '{}'", line, energy_text),
                })?;

        let label = label_col
            .and_then(|c| record.get(c))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let mut entry = PdEntry::new(composition, energy_per_atom);
        if let Some(ref label) = label {
            entry = entry.with_label(label.clone());
        }

        rows.push(Row {
            composition: comp_text,
            energy_per_atom,
            label,
            entry,
        });
    }

    if rows.is_empty() {
        return Err(MatscreenError::EmptyPhaseDiagram);
    }

    Ok(rows)
}

/// 写出结果 CSV
fn write_results_csv(rows: &[Row], stabilities: &[Stability], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "composition",
        "energy_per_atom_eV",
        "label",
        "formation_energy_per_atom_eV",
        "distance_to_hull_eV",
        "is_stable",
    ])?;

    for (row, s) in rows.iter().zip(stabilities.iter()) {
        wtr.write_record([
            row.composition.clone(),
            format!("{:.10}", row.energy_per_atom),
            row.label.clone().unwrap_or_default(),
            format!("{:.10}", s.formation_energy_per_atom),
            format!("{:.10}", s.e_above_hull),
            s.is_stable.to_string(),
        ])?;
    }

    wtr.flush().map_err(|e| MatscreenError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 终端表格：凸包距离最小的 top_n 条目
fn print_result_table(
    diagram: &PhaseDiagram,
    rows: &[Row],
    stabilities: &[Stability],
    top_n: usize,
) {
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by(|&a, &b| {
        stabilities[a]
            .e_above_hull
            .partial_cmp(&stabilities[b].e_above_hull)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let table_rows: Vec<ResultRow> = order
        .iter()
        .take(top_n)
        .enumerate()
        .map(|(rank, &i)| ResultRow {
            rank: rank + 1,
            entry: rows[i].entry.name(),
            composition: rows[i].entry.composition.reduced_formula(),
            formation_energy: format!("{:.6}", stabilities[i].formation_energy_per_atom),
            distance: format!("{:.6}", stabilities[i].e_above_hull),
            decomposition: if stabilities[i].is_stable {
                "stable".to_string()
            } else {
                describe_decomposition(diagram, &rows[i].entry)
            },
        })
        .collect();

    output::print_header(&format!(
        "Top {} Entries by Distance to Hull",
        table_rows.len()
    ));

    let table = Table::new(&table_rows);
    println!("{}", table);
}

/// 非稳定条目的凸包分解描述（"0.50 A + 0.50 AB"）
fn describe_decomposition(diagram: &PhaseDiagram, entry: &PdEntry) -> String {
    match diagram.decomposition(&entry.composition) {
        Ok(phases) => phases
            .iter()
            .map(|(name, w)| format!("{:.2} {}", w, name))
            .collect::<Vec<_>>()
            .join(" + "),
        Err(_) => String::new(),
    }
}
