//! # 解析器模块
//!
//! 提供晶体结构文件的解析与写出（CIF、VASP POSCAR）。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: cif, poscar

pub mod cif;
pub mod poscar;

use crate::error::{MatscreenError, Result};
use crate::models::Crystal;
use std::path::Path;

/// 从文件路径推断格式并解析
pub fn parse_structure_file(path: &Path) -> Result<Crystal> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "cif" => cif::parse_cif_file(path),
        "vasp" | "poscar" => poscar::parse_poscar_file(path),
        _ => {
            // POSCAR/CONTCAR 通常没有扩展名
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with("POSCAR") || name.starts_with("CONTCAR") {
                    return poscar::parse_poscar_file(path);
                }
            }
            Err(MatscreenError::UnsupportedFormat(format!(
                "Cannot determine format for: {} (expected .cif, .vasp, .poscar, POSCAR*, CONTCAR*)",
                path.display()
            )))
        }
    }
}
