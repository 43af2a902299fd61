//! # 化学组成数据模型
//!
//! 将组成字符串解析为化学计量映射，是凸包分析的基础输入。
//!
//! ## 支持语法
//! ```text
//! Fe2O3            # 元素 + 整数计量
//! Li0.5CoO2        # 分数计量
//! Ca(OH)2          # 括号组 + 乘数
//! (MgO)3(Al2O3)    # 嵌套组可以连写
//! ```
//!
//! ## 依赖关系
//! - 被 `hull/` 和 `models/structure.rs` 使用
//! - 无外部模块依赖

use crate::error::{MatscreenError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 化学组成：元素符号 -> 计量数
///
/// 元素按字母序存储，保证输出与比较的确定性。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    amounts: BTreeMap<String, f64>,
}

impl Composition {
    /// 解析组成字符串
    pub fn parse(input: &str) -> Result<Self> {
        let chars: Vec<char> = input.chars().filter(|c| !c.is_whitespace()).collect();

        if chars.is_empty() {
            return Err(MatscreenError::CompositionError {
                input: input.to_string(),
                reason: "empty composition string".to_string(),
            });
        }

        let mut pos = 0;
        let amounts = parse_group(&chars, &mut pos, input, 0)?;

        if pos != chars.len() {
            return Err(MatscreenError::CompositionError {
                input: input.to_string(),
                reason: format!("unexpected character '{}'", chars[pos]),
            });
        }

        if amounts.is_empty() {
            return Err(MatscreenError::CompositionError {
                input: input.to_string(),
                reason: "no elements found".to_string(),
            });
        }

        Ok(Composition { amounts })
    }

    /// 由原子符号列表构造（结构文件 -> 组成）
    pub fn from_atom_list<'a>(symbols: impl Iterator<Item = &'a str>) -> Self {
        let mut amounts: BTreeMap<String, f64> = BTreeMap::new();
        for sym in symbols {
            *amounts.entry(sym.to_string()).or_insert(0.0) += 1.0;
        }
        Composition { amounts }
    }

    /// 元素列表（字母序）
    pub fn elements(&self) -> Vec<&str> {
        self.amounts.keys().map(|s| s.as_str()).collect()
    }

    /// 某元素的计量数（不存在时为 0）
    pub fn amount(&self, element: &str) -> f64 {
        self.amounts.get(element).copied().unwrap_or(0.0)
    }

    /// 总原子数（计量数之和）
    pub fn num_atoms(&self) -> f64 {
        self.amounts.values().sum()
    }

    /// 某元素的原子分数
    pub fn fraction(&self, element: &str) -> f64 {
        let total = self.num_atoms();
        if total <= 0.0 {
            return 0.0;
        }
        self.amount(element) / total
    }

    /// 单质判断：只含一种元素时返回其符号
    pub fn as_element(&self) -> Option<&str> {
        if self.amounts.len() == 1 {
            self.amounts.keys().next().map(|s| s.as_str())
        } else {
            None
        }
    }

    /// 约化化学式（Fe4O6 -> Fe2O3, Li0.5CoO2 -> Co2LiO4）
    ///
    /// 分数计量先放大到整数再做 gcd 约化；16 倍以内放大失败时
    /// 按原始计量输出。
    pub fn reduced_formula(&self) -> String {
        let amounts: Vec<f64> = self.amounts.values().copied().collect();
        let min = amounts.iter().cloned().fold(f64::INFINITY, f64::min);

        if min <= 0.0 {
            return self.to_string();
        }

        let ratios: Vec<f64> = amounts.iter().map(|a| a / min).collect();

        for mult in 1..=16u64 {
            let scaled: Vec<f64> = ratios.iter().map(|r| r * mult as f64).collect();
            if scaled.iter().all(|s| (s - s.round()).abs() < 1e-5) {
                let ints: Vec<u64> = scaled.iter().map(|s| s.round() as u64).collect();
                let g = ints.iter().fold(0u64, |acc, &n| gcd(acc, n)).max(1);

                return self
                    .amounts
                    .keys()
                    .zip(ints.iter())
                    .map(|(el, &n)| format_term(el, (n / g) as f64))
                    .collect::<Vec<_>>()
                    .join("");
            }
        }

        self.to_string()
    }
}

impl std::fmt::Display for Composition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (el, &amount) in &self.amounts {
            write!(f, "{}", format_term(el, amount))?;
        }
        Ok(())
    }
}

/// 单个元素项的格式化（计量 1 省略，接近整数时取整）
fn format_term(element: &str, amount: f64) -> String {
    if (amount - 1.0).abs() < 1e-8 {
        element.to_string()
    } else if (amount - amount.round()).abs() < 1e-8 {
        format!("{}{}", element, amount.round() as i64)
    } else {
        format!("{}{}", element, amount)
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// 解析一个组（顶层或括号内），在 ')' 或串尾处停止
fn parse_group(
    chars: &[char],
    pos: &mut usize,
    input: &str,
    depth: usize,
) -> Result<BTreeMap<String, f64>> {
    let mut amounts: BTreeMap<String, f64> = BTreeMap::new();

    while *pos < chars.len() {
        let c = chars[*pos];

        if c == '(' {
            *pos += 1;
            let inner = parse_group(chars, pos, input, depth + 1)?;

            if *pos >= chars.len() || chars[*pos] != ')' {
                return Err(MatscreenError::CompositionError {
                    input: input.to_string(),
                    reason: "unbalanced parentheses".to_string(),
                });
            }
            *pos += 1;

            let mult = parse_amount(chars, pos).unwrap_or(1.0);
            if mult <= 0.0 {
                return Err(MatscreenError::CompositionError {
                    input: input.to_string(),
                    reason: "group multiplier must be positive".to_string(),
                });
            }

            for (el, amount) in inner {
                *amounts.entry(el).or_insert(0.0) += amount * mult;
            }
        } else if c == ')' {
            if depth == 0 {
                return Err(MatscreenError::CompositionError {
                    input: input.to_string(),
                    reason: "unbalanced parentheses".to_string(),
                });
            }
            break;
        } else if c.is_ascii_uppercase() {
            let mut symbol = String::new();
            symbol.push(c);
            *pos += 1;

            while *pos < chars.len() && chars[*pos].is_ascii_lowercase() {
                symbol.push(chars[*pos]);
                *pos += 1;
            }

            let amount = parse_amount(chars, pos).unwrap_or(1.0);
            if amount <= 0.0 {
                return Err(MatscreenError::CompositionError {
                    input: input.to_string(),
                    reason: format!("amount for '{}' must be positive", symbol),
                });
            }

            // 同一元素重复出现时累加（FeOFe -> Fe2O）
            *amounts.entry(symbol).or_insert(0.0) += amount;
        } else {
            return Err(MatscreenError::CompositionError {
                input: input.to_string(),
                reason: format!("unexpected character '{}'", c),
            });
        }
    }

    Ok(amounts)
}

/// 解析一个可选的数值（整数或小数），没有数字时返回 None
fn parse_amount(chars: &[char], pos: &mut usize) -> Option<f64> {
    let start = *pos;
    let mut seen_dot = false;

    while *pos < chars.len() {
        let c = chars[*pos];
        if c.is_ascii_digit() {
            *pos += 1;
        } else if c == '.' && !seen_dot {
            seen_dot = true;
            *pos += 1;
        } else {
            break;
        }
    }

    if *pos == start {
        return None;
    }

    let text: String = chars[start..*pos].iter().collect();
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_binary() {
        let comp = Composition::parse("Fe2O3").unwrap();
        assert_eq!(comp.amount("Fe"), 2.0);
        assert_eq!(comp.amount("O"), 3.0);
        assert_eq!(comp.num_atoms(), 5.0);
    }

    #[test]
    fn test_parse_implicit_one() {
        let comp = Composition::parse("NaCl").unwrap();
        assert_eq!(comp.amount("Na"), 1.0);
        assert_eq!(comp.amount("Cl"), 1.0);
    }

    #[test]
    fn test_parse_fractional_amount() {
        let comp = Composition::parse("Li0.5CoO2").unwrap();
        assert!((comp.amount("Li") - 0.5).abs() < 1e-12);
        assert!((comp.fraction("O") - 2.0 / 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_parse_parenthesized_group() {
        let comp = Composition::parse("Ca(OH)2").unwrap();
        assert_eq!(comp.amount("Ca"), 1.0);
        assert_eq!(comp.amount("O"), 2.0);
        assert_eq!(comp.amount("H"), 2.0);
    }

    #[test]
    fn test_parse_adjacent_groups() {
        let comp = Composition::parse("(MgO)3(Al2O3)").unwrap();
        assert_eq!(comp.amount("Mg"), 3.0);
        assert_eq!(comp.amount("Al"), 2.0);
        assert_eq!(comp.amount("O"), 6.0);
    }

    #[test]
    fn test_parse_repeated_element_accumulates() {
        let comp = Composition::parse("FeOFe").unwrap();
        assert_eq!(comp.amount("Fe"), 2.0);
        assert_eq!(comp.amount("O"), 1.0);
    }

    #[test]
    fn test_parse_whitespace_tolerated() {
        let comp = Composition::parse(" Fe2 O3 ").unwrap();
        assert_eq!(comp.amount("Fe"), 2.0);
        assert_eq!(comp.amount("O"), 3.0);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Composition::parse("").is_err());
        assert!(Composition::parse("2Fe").is_err());
        assert!(Composition::parse("fe2").is_err());
        assert!(Composition::parse("Fe(O").is_err());
        assert!(Composition::parse("FeO)").is_err());
        assert!(Composition::parse("Fe0O").is_err());
    }

    #[test]
    fn test_as_element() {
        assert_eq!(Composition::parse("Fe4").unwrap().as_element(), Some("Fe"));
        assert_eq!(Composition::parse("FeO").unwrap().as_element(), None);
    }

    #[test]
    fn test_reduced_formula_integer() {
        let comp = Composition::parse("Fe4O6").unwrap();
        assert_eq!(comp.reduced_formula(), "Fe2O3");
    }

    #[test]
    fn test_reduced_formula_fractional() {
        let comp = Composition::parse("Li0.5CoO2").unwrap();
        assert_eq!(comp.reduced_formula(), "Co2LiO4");
    }

    #[test]
    fn test_display_round_amounts() {
        let comp = Composition::parse("Ca(OH)2").unwrap();
        assert_eq!(comp.to_string(), "CaH2O2");
    }

    #[test]
    fn test_from_atom_list() {
        let comp = Composition::from_atom_list(["O", "Ti", "O"].into_iter());
        assert_eq!(comp.amount("Ti"), 1.0);
        assert_eq!(comp.amount("O"), 2.0);
    }
}
