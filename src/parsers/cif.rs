//! # CIF 格式解析器
//!
//! 解析与写出晶体学信息文件 (CIF) 的最小子集：晶胞参数与第一个
//! `atom_site` 循环中的分数坐标。对称操作不展开，输入按 P1 处理。
//!
//! ## 支持的标签
//! ```text
//! data_<name>
//! _cell_length_a / _b / _c
//! _cell_angle_alpha / _beta / _gamma
//! loop_
//! _atom_site_label
//! _atom_site_type_symbol
//! _atom_site_fract_x / _y / _z
//! ```
//!
//! 数值允许带不确定度后缀（如 `5.4310(2)`）。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/structure.rs`
//! - 使用 `regex` 处理数值后缀

use crate::error::{MatscreenError, Result};
use crate::models::{Atom, Crystal, Lattice};
use regex::Regex;
use std::fs;
use std::path::Path;

/// 解析 CIF 文件
pub fn parse_cif_file(path: &Path) -> Result<Crystal> {
    let content = fs::read_to_string(path).map_err(|e| MatscreenError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_cif_content(
        &content,
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown"),
    )
}

/// 从字符串内容解析 CIF 格式
pub fn parse_cif_content(content: &str, default_name: &str) -> Result<Crystal> {
    let number_re = Regex::new(r"^([-+]?\d*\.?\d+(?:[eE][-+]?\d+)?)(?:\(\d+\))?$").unwrap();
    let lines: Vec<&str> = content.lines().collect();

    let mut name = default_name.to_string();
    let mut cell: [Option<f64>; 6] = [None; 6];
    let mut atoms: Vec<Atom> = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();

        if line.is_empty() || line.starts_with('#') {
            i += 1;
            continue;
        }

        if let Some(block) = line.strip_prefix("data_") {
            if !block.is_empty() {
                name = block.to_string();
            }
            i += 1;
            continue;
        }

        if line.starts_with('_') {
            let mut parts = line.split_whitespace();
            let tag = parts.next().unwrap_or("").to_lowercase();
            let value = parts.next();

            let slot = match tag.as_str() {
                "_cell_length_a" => Some(0),
                "_cell_length_b" => Some(1),
                "_cell_length_c" => Some(2),
                "_cell_angle_alpha" => Some(3),
                "_cell_angle_beta" => Some(4),
                "_cell_angle_gamma" => Some(5),
                _ => None,
            };

            if let (Some(slot), Some(value)) = (slot, value) {
                cell[slot] = parse_number(&number_re, value);
            }

            i += 1;
            continue;
        }

        if line.eq_ignore_ascii_case("loop_") {
            let (consumed, parsed) = parse_loop(&lines[i + 1..], &number_re);
            // 只取第一个含坐标的 atom_site 循环
            if atoms.is_empty() {
                atoms = parsed;
            }
            i += 1 + consumed;
            continue;
        }

        i += 1;
    }

    let lattice = match cell {
        [Some(a), Some(b), Some(c), Some(alpha), Some(beta), Some(gamma)] => {
            Lattice::from_parameters(a, b, c, alpha, beta, gamma)
        }
        _ => {
            return Err(MatscreenError::ParseError {
                format: "cif".to_string(),
                path: default_name.to_string(),
                reason: "Incomplete cell parameters (_cell_length_* / _cell_angle_*)".to_string(),
            })
        }
    };

    if atoms.is_empty() {
        return Err(MatscreenError::ParseError {
            format: "cif".to_string(),
            path: default_name.to_string(),
            reason: "No atom_site loop with fractional coordinates".to_string(),
        });
    }

    let mut crystal = Crystal::new(name, lattice, atoms);
    crystal.source_format = Some("cif".to_string());

    Ok(crystal)
}

/// 解析一个 loop_ 块，返回 (消耗的行数, 原子列表)
///
/// 不是 atom_site 坐标循环时返回空列表，但仍然消耗整个块。
fn parse_loop(lines: &[&str], number_re: &Regex) -> (usize, Vec<Atom>) {
    let mut headers: Vec<String> = Vec::new();
    let mut idx = 0;

    // 头部：连续的 _tag 行
    while idx < lines.len() {
        let line = lines[idx].trim();
        if line.starts_with('_') {
            headers.push(line.split_whitespace().next().unwrap_or("").to_lowercase());
            idx += 1;
        } else {
            break;
        }
    }

    let col = |tag: &str| headers.iter().position(|h| h == tag);

    let symbol_col = col("_atom_site_type_symbol").or_else(|| col("_atom_site_label"));
    let label_col = col("_atom_site_label");
    let fx = col("_atom_site_fract_x");
    let fy = col("_atom_site_fract_y");
    let fz = col("_atom_site_fract_z");

    let mut atoms = Vec::new();

    // 数据行：直到下一个 tag / loop_ / data_ 或空行
    while idx < lines.len() {
        let line = lines[idx].trim();
        if line.is_empty()
            || line.starts_with('_')
            || line.starts_with('#')
            || line.eq_ignore_ascii_case("loop_")
            || line.starts_with("data_")
        {
            break;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();

        if let (Some(sc), Some(xc), Some(yc), Some(zc)) = (symbol_col, fx, fy, fz) {
            let coords = (
                fields.get(xc).and_then(|v| parse_number(number_re, v)),
                fields.get(yc).and_then(|v| parse_number(number_re, v)),
                fields.get(zc).and_then(|v| parse_number(number_re, v)),
            );

            if let (Some(sym), (Some(x), Some(y), Some(z))) = (fields.get(sc), coords) {
                if let Some(element) = extract_element(sym) {
                    let mut atom = Atom::new(element, [x, y, z]);
                    if let Some(lc) = label_col {
                        if let Some(label) = fields.get(lc) {
                            atom = atom.with_label(*label);
                        }
                    }
                    atoms.push(atom);
                }
            }
        }

        idx += 1;
    }

    (idx, atoms)
}

/// 带不确定度后缀的数值解析："5.4310(2)" -> 5.4310
fn parse_number(re: &Regex, value: &str) -> Option<f64> {
    re.captures(value)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// 从 atom_site 符号/标签提取元素符号（"Fe1" -> "Fe", "O2-" -> "O"）
fn extract_element(symbol: &str) -> Option<String> {
    let mut chars = symbol.chars();
    let first = chars.next()?;

    if !first.is_ascii_uppercase() {
        return None;
    }

    let mut element = String::new();
    element.push(first);

    for c in chars {
        if c.is_ascii_lowercase() {
            element.push(c);
        } else {
            break;
        }
    }

    Some(element)
}

/// 将 Crystal 转换为 P1 CIF 格式字符串
pub fn to_cif_string(crystal: &Crystal) -> String {
    let (a, b, c, alpha, beta, gamma) = crystal.lattice.parameters();

    let mut result = String::new();
    result.push_str(&format!("data_{}\n", sanitize_block_name(&crystal.name)));
    result.push_str(&format!("_chemical_formula_sum    '{}'\n", crystal.formula()));
    result.push_str("_symmetry_space_group_name_H-M    'P 1'\n");
    result.push_str("_symmetry_Int_Tables_number       1\n");
    result.push_str(&format!("_cell_length_a     {:.6}\n", a));
    result.push_str(&format!("_cell_length_b     {:.6}\n", b));
    result.push_str(&format!("_cell_length_c     {:.6}\n", c));
    result.push_str(&format!("_cell_angle_alpha  {:.6}\n", alpha));
    result.push_str(&format!("_cell_angle_beta   {:.6}\n", beta));
    result.push_str(&format!("_cell_angle_gamma  {:.6}\n", gamma));
    result.push_str("loop_\n");
    result.push_str("  _atom_site_label\n");
    result.push_str("  _atom_site_type_symbol\n");
    result.push_str("  _atom_site_fract_x\n");
    result.push_str("  _atom_site_fract_y\n");
    result.push_str("  _atom_site_fract_z\n");

    let mut counters: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for atom in &crystal.atoms {
        let n = counters.entry(atom.element.as_str()).or_insert(0);
        *n += 1;
        result.push_str(&format!(
            "  {}{}  {}  {:.10}  {:.10}  {:.10}\n",
            atom.element, n, atom.element, atom.position[0], atom.position[1], atom.position[2]
        ));
    }

    result
}

/// 写出 CIF 文件
pub fn write_cif_file(crystal: &Crystal, path: &Path) -> Result<()> {
    fs::write(path, to_cif_string(crystal)).map_err(|e| MatscreenError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// data_ 块名不允许空白
fn sanitize_block_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_CIF: &str = r#"data_NaCl
_cell_length_a     5.6402(3)
_cell_length_b     5.6402
_cell_length_c     5.6402
_cell_angle_alpha  90.0
_cell_angle_beta   90.0
_cell_angle_gamma  90.0
loop_
  _atom_site_label
  _atom_site_type_symbol
  _atom_site_fract_x
  _atom_site_fract_y
  _atom_site_fract_z
  Na1  Na  0.0  0.0  0.0
  Cl1  Cl  0.5  0.5  0.5
"#;

    #[test]
    fn test_parse_simple_cif() {
        let crystal = parse_cif_content(SIMPLE_CIF, "fallback").unwrap();
        assert_eq!(crystal.name, "NaCl");
        assert_eq!(crystal.atoms.len(), 2);

        let (a, _, _, _, _, gamma) = crystal.lattice.parameters();
        assert!((a - 5.6402).abs() < 1e-6);
        assert!((gamma - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_cif_label_only_loop() {
        let cif = r#"data_Fe
_cell_length_a     2.87
_cell_length_b     2.87
_cell_length_c     2.87
_cell_angle_alpha  90
_cell_angle_beta   90
_cell_angle_gamma  90
loop_
  _atom_site_label
  _atom_site_fract_x
  _atom_site_fract_y
  _atom_site_fract_z
  Fe1  0.0  0.0  0.0
  Fe2  0.5  0.5  0.5
"#;
        let crystal = parse_cif_content(cif, "Fe").unwrap();
        assert_eq!(crystal.atoms.len(), 2);
        assert!(crystal.atoms.iter().all(|a| a.element == "Fe"));
    }

    #[test]
    fn test_parse_cif_missing_cell() {
        let cif = r#"data_broken
_cell_length_a 4.0
loop_
  _atom_site_label
  _atom_site_fract_x
  _atom_site_fract_y
  _atom_site_fract_z
  X1 0 0 0
"#;
        assert!(parse_cif_content(cif, "broken").is_err());
    }

    #[test]
    fn test_parse_cif_no_atoms() {
        let cif = r#"data_empty
_cell_length_a     4.0
_cell_length_b     4.0
_cell_length_c     4.0
_cell_angle_alpha  90
_cell_angle_beta   90
_cell_angle_gamma  90
"#;
        assert!(parse_cif_content(cif, "empty").is_err());
    }

    #[test]
    fn test_extract_element() {
        assert_eq!(extract_element("Fe1"), Some("Fe".to_string()));
        assert_eq!(extract_element("O2-"), Some("O".to_string()));
        assert_eq!(extract_element("Na"), Some("Na".to_string()));
        assert_eq!(extract_element("1Fe"), None);
    }

    #[test]
    fn test_cif_round_trip() {
        let lattice = Lattice::from_parameters(4.1, 4.1, 4.1, 90.0, 90.0, 90.0);
        let atoms = vec![
            Atom::new("Mg", [0.0, 0.0, 0.0]),
            Atom::new("O", [0.5, 0.5, 0.5]),
        ];
        let crystal = Crystal::new("MgO", lattice, atoms);

        let text = to_cif_string(&crystal);
        let parsed = parse_cif_content(&text, "round_trip").unwrap();

        assert_eq!(parsed.name, "MgO");
        assert_eq!(parsed.atoms.len(), 2);
        let (a, _, _, _, _, _) = parsed.lattice.parameters();
        assert!((a - 4.1).abs() < 1e-5);
    }
}
