//! Validation of field numbers and enum values.

/// The smallest field number that may be assigned to a message field.
pub const MIN_TAG_VALUE: i32 = 1;
/// The largest field number that may be assigned to a message field (2<sup>29</sup> - 1).
pub const MAX_TAG_VALUE: i32 = 536_870_911;

/// The first field number of the range reserved for the protobuf implementation.
pub const RESERVED_TAG_VALUE_START: i32 = 19_000;
/// The last field number of the range reserved for the protobuf implementation.
pub const RESERVED_TAG_VALUE_END: i32 = 19_999;

/// Returns `true` if `value` may be used as the number of a message field.
///
/// Valid numbers lie between [`MIN_TAG_VALUE`] and [`MAX_TAG_VALUE`] inclusive, excluding the
/// range [`RESERVED_TAG_VALUE_START`]..=[`RESERVED_TAG_VALUE_END`].
///
/// This applies to field numbers only. Enum constant numbers are checked with
/// [`is_valid_enum_value`], which accepts zero and negative values.
///
/// # Examples
///
/// ```
/// # use protoschema::is_valid_tag;
/// assert!(is_valid_tag(1));
/// assert!(!is_valid_tag(0));
/// assert!(!is_valid_tag(19_500));
/// ```
pub const fn is_valid_tag(value: i32) -> bool {
    value >= MIN_TAG_VALUE
        && value <= MAX_TAG_VALUE
        && !(value >= RESERVED_TAG_VALUE_START && value <= RESERVED_TAG_VALUE_END)
}

/// Returns `true` if `value` may be used as the number of an enum constant.
///
/// Enum numbers may be zero or negative, so any value that fits in an `i32` is accepted.
pub const fn is_valid_enum_value(value: i64) -> bool {
    value >= i32::MIN as i64 && value <= i32::MAX as i64
}

#[test]
fn tag_boundaries() {
    assert!(!is_valid_tag(MIN_TAG_VALUE - 1));
    assert!(is_valid_tag(MIN_TAG_VALUE));
    assert!(is_valid_tag(1234));
    assert!(is_valid_tag(18_999));
    assert!(!is_valid_tag(19_000));
    assert!(!is_valid_tag(19_222));
    assert!(!is_valid_tag(19_999));
    assert!(is_valid_tag(20_000));
    assert!(is_valid_tag(2_319_573));
    assert!(is_valid_tag(MAX_TAG_VALUE));
    assert!(!is_valid_tag(MAX_TAG_VALUE + 1));
    assert!(!is_valid_tag(-1));
}

#[test]
fn enum_value_boundaries() {
    assert!(is_valid_enum_value(0));
    assert!(is_valid_enum_value(-1));
    assert!(is_valid_enum_value(19_500));
    assert!(is_valid_enum_value(i32::MIN as i64));
    assert!(is_valid_enum_value(i32::MAX as i64));
    assert!(!is_valid_enum_value(i32::MAX as i64 + 1));
    assert!(!is_valid_enum_value(i32::MIN as i64 - 1));
}
