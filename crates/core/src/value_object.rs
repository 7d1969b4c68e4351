//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. Two
/// `Money` amounts of 10.00 are the same amount; two products with the same name
/// are still two products.
///
/// ```ignore
/// let a = Money::from_minor(1000);
/// let b = Money::parse("10.00")?;
/// assert_eq!(a, b);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
