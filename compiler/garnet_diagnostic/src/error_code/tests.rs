use super::*;

#[test]
fn test_error_code_display() {
    assert_eq!(ErrorCode::E1001.to_string(), "E1001");
    assert_eq!(ErrorCode::W4001.as_str(), "W4001");
}

#[test]
fn test_parse_round_trip() {
    for code in ErrorCode::ALL {
        assert_eq!(code.as_str().parse::<ErrorCode>(), Ok(*code));
    }
    assert_eq!("e3001".parse::<ErrorCode>(), Ok(ErrorCode::E3001));
    assert!("E0000".parse::<ErrorCode>().is_err());
}

#[test]
fn test_predicate_exclusivity() {
    for code in ErrorCode::ALL {
        let hits = [
            code.is_lookup_error(),
            code.is_scope_error(),
            code.is_type_error(),
            code.is_redeclaration_error(),
            code.is_unsupported_error(),
            code.is_eval_error(),
            code.is_internal_error(),
            code.is_warning(),
        ]
        .iter()
        .filter(|b| **b)
        .count();
        assert_eq!(hits, 1, "{code} matched {hits} classes");
    }
}

#[test]
fn test_every_code_has_a_summary() {
    for code in ErrorCode::ALL {
        assert!(!code.summary().is_empty());
    }
}
