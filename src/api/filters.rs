//! Query-string parsing for list endpoints.

/// Parse a comma-separated list of integer IDs. Any non-integer token fails
/// the whole parse; bad tokens are rejected, never silently dropped.
pub fn parse_id_list(raw: &str) -> Result<Vec<i32>, String> {
    raw.split(',')
        .map(|token| {
            let token = token.trim();
            token
                .parse::<i32>()
                .map_err(|_| format!("Invalid id: {:?}", token))
        })
        .collect()
}

/// Parse the `assigned_only` flag. Only "1" and "0" are accepted.
pub fn parse_assigned_only(raw: &str) -> Result<bool, String> {
    match raw {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(format!(
            "Invalid assigned_only value: {:?} (expected 0 or 1)",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_id() {
        assert_eq!(parse_id_list("7").unwrap(), vec![7]);
    }

    #[test]
    fn test_parse_multiple_ids() {
        assert_eq!(parse_id_list("1,2,3").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_ids_with_whitespace() {
        assert_eq!(parse_id_list(" 4 , 5 ").unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_parse_rejects_non_integer_token() {
        let err = parse_id_list("1,abc,3").unwrap_err();
        assert!(err.contains("abc"));
    }

    #[test]
    fn test_parse_rejects_empty_token() {
        assert!(parse_id_list("1,,3").is_err());
        assert!(parse_id_list("").is_err());
    }

    #[test]
    fn test_parse_rejects_trailing_comma() {
        assert!(parse_id_list("1,2,").is_err());
    }

    #[test]
    fn test_assigned_only_accepts_one_and_zero() {
        assert!(parse_assigned_only("1").unwrap());
        assert!(!parse_assigned_only("0").unwrap());
    }

    #[test]
    fn test_assigned_only_rejects_other_values() {
        assert!(parse_assigned_only("true").is_err());
        assert!(parse_assigned_only("2").is_err());
        assert!(parse_assigned_only("").is_err());
    }
}
