//! Checks on the lexical form of names and literals accepted by the builders.
//!
//! These mirror what the lexer produces, so anything that passes here renders to text that
//! tokenizes back to the same value.

pub(crate) fn is_valid_ident(s: &str) -> bool {
    !s.is_empty()
        && (s.as_bytes()[0].is_ascii_alphabetic() || s.as_bytes()[0] == b'_')
        && s.as_bytes()[1..]
            .iter()
            .all(|&ch| ch.is_ascii_alphanumeric() || ch == b'_')
}

pub(crate) fn is_valid_full_ident(s: &str) -> bool {
    s.split('.').all(is_valid_ident)
}

pub(crate) fn is_valid_type_name(s: &str) -> bool {
    is_valid_full_ident(s.strip_prefix('.').unwrap_or(s))
}

/// Normalizes a field type, returning `None` if it is not valid.
///
/// Map types are rewritten to the form `map<K, V>`.
pub(crate) fn normalize_field_type(s: &str) -> Option<String> {
    let compact: String = s.chars().filter(|ch| !ch.is_whitespace()).collect();
    match compact
        .strip_prefix("map<")
        .and_then(|rest| rest.strip_suffix('>'))
    {
        Some(inner) => {
            let (key, value) = inner.split_once(',')?;
            if is_valid_ident(key) && is_valid_type_name(value) {
                Some(format!("map<{}, {}>", key, value))
            } else {
                None
            }
        }
        None if is_valid_type_name(&compact) && compact == s => Some(compact),
        None => None,
    }
}

/// Returns `true` if a field of this type, written without a label, would be read back as the start
/// of a different statement.
pub(crate) fn is_keyword_type(s: &str) -> bool {
    matches!(
        s.split('.').next(),
        Some(
            "optional"
                | "required"
                | "repeated"
                | "message"
                | "enum"
                | "oneof"
                | "option"
                | "reserved"
                | "extensions"
                | "extend"
        )
    )
}

pub(crate) fn is_map_type(s: &str) -> bool {
    s.starts_with("map<")
}

/// Checks the name of an option statement, such as `foo`, `(foo.bar)` or `(.foo).bar.(baz)`.
pub(crate) fn is_valid_option_name(s: &str) -> bool {
    let mut rest = s;
    loop {
        let part_len = if let Some(paren) = rest.strip_prefix('(') {
            match paren.find(')') {
                Some(end) if is_valid_type_name(&paren[..end]) => end + 2,
                _ => return false,
            }
        } else {
            let end = rest.find('.').unwrap_or(rest.len());
            if !is_valid_ident(&rest[..end]) {
                return false;
            }
            end
        };

        rest = &rest[part_len..];
        if rest.is_empty() {
            return true;
        }
        match rest.strip_prefix('.') {
            Some(next) => rest = next,
            None => return false,
        }
    }
}

/// Checks the name of an entry in an aggregate option value: either a single field name, or an
/// extension or type URL in brackets, such as `[foo.bar]` or `[type.googleapis.com/foo.Bar]`.
pub(crate) fn is_valid_option_entry_name(s: &str) -> bool {
    match s.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(inner) => inner.split('/').all(is_valid_full_ident),
        None => is_valid_ident(s),
    }
}

/// Checks a numeric literal as written in an option value, including an optional leading `-`.
pub(crate) fn is_valid_number(s: &str) -> bool {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, s),
    };

    if negative && matches!(digits.to_ascii_lowercase().as_str(), "inf" | "infinity" | "nan") {
        return true;
    }

    is_valid_int(digits) || is_valid_float(digits)
}

fn is_valid_int(s: &str) -> bool {
    if s == "0" {
        true
    } else if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).is_ok() && hex.bytes().all(|b| b.is_ascii_hexdigit())
    } else if let Some(oct) = s.strip_prefix('0') {
        u64::from_str_radix(oct, 8).is_ok() && oct.bytes().all(|b| matches!(b, b'0'..=b'7'))
    } else {
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) && s.parse::<u64>().is_ok()
    }
}

fn is_valid_float(s: &str) -> bool {
    let (mantissa, exponent) = match s.find(|ch| ch == 'e' || ch == 'E') {
        Some(index) => (&s[..index], Some(&s[index + 1..])),
        None => (s, None),
    };

    let mantissa_ok = match mantissa.split_once('.') {
        Some((int, frac)) => {
            !(int.is_empty() && frac.is_empty())
                && int.bytes().all(|b| b.is_ascii_digit())
                && frac.bytes().all(|b| b.is_ascii_digit())
        }
        // Without a '.', only an exponent makes this a float.
        None => {
            exponent.is_some()
                && !mantissa.is_empty()
                && mantissa.bytes().all(|b| b.is_ascii_digit())
        }
    };

    let exponent_ok = match exponent {
        Some(exp) => {
            let digits = exp.strip_prefix(|ch| ch == '+' || ch == '-').unwrap_or(exp);
            !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
        }
        None => true,
    };

    mantissa_ok && exponent_ok
}

#[test]
fn idents() {
    assert!(is_valid_ident("foo_Bar1"));
    assert!(is_valid_ident("_foo"));
    assert!(!is_valid_ident(""));
    assert!(!is_valid_ident("1foo"));
    assert!(!is_valid_ident("foo.bar"));
    assert!(is_valid_full_ident("foo.bar"));
    assert!(!is_valid_full_ident("foo..bar"));
    assert!(is_valid_type_name(".foo.Bar"));
    assert!(!is_valid_type_name("..foo"));
}

#[test]
fn field_types() {
    assert_eq!(normalize_field_type("int32").as_deref(), Some("int32"));
    assert_eq!(normalize_field_type(".foo.Bar").as_deref(), Some(".foo.Bar"));
    assert_eq!(
        normalize_field_type("map<string,Foo>").as_deref(),
        Some("map<string, Foo>")
    );
    assert_eq!(
        normalize_field_type("map< int32 , .a.B >").as_deref(),
        Some("map<int32, .a.B>")
    );
    assert_eq!(normalize_field_type("map<.a, b>"), None);
    assert_eq!(normalize_field_type("foo bar"), None);
    assert_eq!(normalize_field_type(""), None);
}

#[test]
fn keyword_types() {
    assert!(is_keyword_type("optional"));
    assert!(is_keyword_type("message.Foo"));
    assert!(!is_keyword_type(".message.Foo"));
    assert!(!is_keyword_type("Foo.message"));
    assert!(!is_keyword_type("map"));
    assert!(!is_keyword_type("group"));
}

#[test]
fn option_names() {
    assert!(is_valid_option_name("java_package"));
    assert!(is_valid_option_name("(custom.option)"));
    assert!(is_valid_option_name("(custom).field.sub"));
    assert!(is_valid_option_name("foo.(.bar.baz).qux"));
    assert!(!is_valid_option_name("[ext.field]"));
    assert!(!is_valid_option_name(""));
    assert!(!is_valid_option_name("()"));
    assert!(!is_valid_option_name("(foo"));
    assert!(!is_valid_option_name("foo."));
    assert!(!is_valid_option_name("(foo)bar"));

    assert!(is_valid_option_entry_name("field"));
    assert!(is_valid_option_entry_name("[ext.field]"));
    assert!(is_valid_option_entry_name("[type.googleapis.com/foo.Bar]"));
    assert!(!is_valid_option_entry_name("a.b"));
    assert!(!is_valid_option_entry_name("(ext)"));
    assert!(!is_valid_option_entry_name("[]"));
    assert!(!is_valid_option_entry_name("[.foo]"));
}

#[test]
fn numbers() {
    for valid in [
        "0", "42", "-42", "052", "0x2A", "0X2a", "5.", "0.5", ".5", "1e10", "1.5E-3", "-inf", "-nan",
    ] {
        assert!(is_valid_number(valid), "{}", valid);
    }
    for invalid in ["", "-", "09", "0x", "1e", ".", "inf", "abc", "1.2.3", "--1", "99999999999999999999999"] {
        assert!(!is_valid_number(invalid), "{}", invalid);
    }
}
