//! # 文件收集器
//!
//! 根据输入路径和模式收集待处理的结构文件列表。
//!
//! ## 功能
//! - 支持单文件和目录输入
//! - glob 模式匹配（逗号分隔多模式）
//! - 递归目录搜索
//!
//! ## 依赖关系
//! - 被 `commands/relax.rs` 调用
//! - 使用 `walkdir` 遍历目录、`glob` 做模式匹配

use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 文件收集器
pub struct FileCollector {
    /// 输入路径
    input: PathBuf,
    /// 匹配模式列表
    patterns: Vec<Pattern>,
    /// 是否递归
    recursive: bool,
}

impl FileCollector {
    /// 创建新的文件收集器
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            patterns: vec![Pattern::new("*").expect("literal pattern")],
            recursive: false,
        }
    }

    /// 设置匹配模式（逗号分隔的多模式），非法模式被忽略
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.patterns = pattern
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter_map(|s| Pattern::new(s).ok())
            .collect();
        if self.patterns.is_empty() {
            self.patterns = vec![Pattern::new("*").expect("literal pattern")];
        }
        self
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 收集所有匹配的文件（按路径排序，保证批量输出顺序稳定）
    pub fn collect(&self) -> Vec<PathBuf> {
        if self.input.is_file() {
            return vec![self.input.clone()];
        }

        if !self.input.is_dir() {
            return vec![];
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let mut files: Vec<PathBuf> = WalkDir::new(&self.input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| self.matches(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();

        files.sort();
        files
    }

    /// 文件名匹配任一模式即通过
    fn matches(&self, path: &Path) -> bool {
        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };

        self.patterns.iter().any(|p| p.matches(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector_with(pattern: &str) -> FileCollector {
        FileCollector::new(PathBuf::from(".")).with_pattern(pattern)
    }

    #[test]
    fn test_pattern_matching() {
        let c = collector_with("*.cif,POSCAR*");

        assert!(c.matches(Path::new("dir/LiFePO4.cif")));
        assert!(c.matches(Path::new("POSCAR")));
        assert!(c.matches(Path::new("POSCAR_001")));
        assert!(!c.matches(Path::new("notes.txt")));
    }

    #[test]
    fn test_empty_pattern_falls_back_to_wildcard() {
        let c = collector_with(" , ");
        assert!(c.matches(Path::new("anything.xyz")));
    }

    #[test]
    fn test_missing_input_collects_nothing() {
        let c = FileCollector::new(PathBuf::from("definitely/not/a/path"));
        assert!(c.collect().is_empty());
    }
}
