//! 通用工具函数

/// 校验 SQL 标识符（表名、列名），只允许字母、数字和下划线，且不能以数字开头
pub fn is_sql_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_identifier() {
        assert!(is_sql_identifier("C_BankStatement"));
        assert!(is_sql_identifier("_tmp1"));
        assert!(!is_sql_identifier(""));
        assert!(!is_sql_identifier("1table"));
        assert!(!is_sql_identifier("name; DROP TABLE x"));
        assert!(!is_sql_identifier("a.b"));
    }
}
