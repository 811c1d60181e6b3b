//! 金额编解码
//!
//! 本地化货币文本（"$ 3.090"、"-$ 2.276"）与整数金额（最小货币单位）互转。

/// 把货币文本解析为整数金额
///
/// - 去掉不换行空格和 `$`
/// - 任意位置出现 `-` 即为负数
/// - 所有数字字符拼接为数值（千位分隔符被忽略）
/// - 没有数字时返回 `None`
pub fn parse_amount(text: &str) -> Option<i64> {
    let clean = text.replace('\u{a0}', " ").replace('$', "");
    let negative = clean.contains('-');
    let digits: String = clean.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let magnitude: i64 = digits.parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// 把整数金额格式化为 "$ 3.090" 样式
pub fn format_amount(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("$ -{}", grouped)
    } else {
        format!("$ {}", grouped)
    }
}
