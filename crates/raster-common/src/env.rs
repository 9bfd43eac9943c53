//! Environment variable substitution for YAML configuration files.
//!
//! Supports `${VAR}` and `${VAR:-default}` syntax.

use anyhow::{Context, Result};

/// Expand `${VAR}` and `${VAR:-default}` references.
pub fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            let mut brace_count = 1;

            while brace_count > 0 {
                match chars.next() {
                    Some('{') => {
                        brace_count += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        brace_count -= 1;
                        if brace_count > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars_with_default() {
        std::env::remove_var("WILDFIRE_TEST_UNSET_DIR");
        let result = expand_env_vars("dir: ${WILDFIRE_TEST_UNSET_DIR:-raw_data}/NDVI").unwrap();
        assert_eq!(result, "dir: raw_data/NDVI");
    }

    #[test]
    fn test_expand_env_vars_simple() {
        std::env::set_var("WILDFIRE_TEST_DATA_DIR", "/data");
        let result = expand_env_vars("${WILDFIRE_TEST_DATA_DIR}/BA").unwrap();
        assert_eq!(result, "/data/BA");
    }

    #[test]
    fn test_expand_env_vars_missing_required() {
        std::env::remove_var("WILDFIRE_TEST_REQUIRED");
        assert!(expand_env_vars("${WILDFIRE_TEST_REQUIRED}").is_err());
        assert!(expand_env_vars("${UNCLOSED").is_err());
    }

    #[test]
    fn test_plain_dollar_is_kept() {
        assert_eq!(expand_env_vars("cost: $5").unwrap(), "cost: $5");
    }
}
