//! # 统一错误处理模块
//!
//! 定义 Matscreen 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// Matscreen 统一错误类型
#[derive(Error, Debug)]
pub enum MatscreenError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Invalid composition '{input}': {reason}")]
    CompositionError { input: String, reason: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Missing required column '{column}' in {path}")]
    MissingColumn { column: String, path: String },

    // ─────────────────────────────────────────────────────────────
    // 相图错误
    // ─────────────────────────────────────────────────────────────
    #[error("No elemental reference entry for '{element}'; add a pure-{element} row to the input")]
    MissingReference { element: String },

    #[error("Phase diagram needs at least one entry")]
    EmptyPhaseDiagram,

    // ─────────────────────────────────────────────────────────────
    // 势函数错误
    // ─────────────────────────────────────────────────────────────
    #[error("No potential parameters for element '{element}'")]
    NoParameters { element: String },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // CSV / JSON 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, MatscreenError>;
