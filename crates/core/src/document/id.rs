/// Document and sub-document addressing.
///
/// Top-level documents and entity sub-documents carry store-assigned UUIDv7
/// identifiers. Primitive sub-collections (lists of strings) have no
/// identifiers and are addressed by position instead.
use uuid::Uuid;

/// Generate a fresh document identifier. Time-ordered, never reused.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Reference to one element of a parent's sub-collection, as it appeared in
/// the request path.
///
/// Primitive arrays read it as a zero-based position; entity arrays match it
/// against `_id` verbatim, so `"03"` never resolves to the entity `"3"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubRef(String);

impl SubRef {
    pub fn parse(raw: &str) -> Self {
        SubRef(raw.trim().to_string())
    }

    /// The position this reference names, if it is a plain decimal number.
    pub fn as_index(&self) -> Option<usize> {
        if self.0.is_empty() || !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.0.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_name_a_position() {
        let sub = SubRef::parse(" 3 ");
        assert_eq!(sub.as_index(), Some(3));
        assert_eq!(sub.to_string(), "3");
    }

    #[test]
    fn leading_zero_keeps_raw_segment() {
        let sub = SubRef::parse("03");
        assert_eq!(sub.as_index(), Some(3));
        assert_eq!(sub.as_str(), "03");
    }

    #[test]
    fn identifiers_are_not_positions() {
        let id = new_id();
        let sub = SubRef::parse(&id);
        assert_eq!(sub.as_str(), id);
        assert_eq!(sub.as_index(), None);
        assert_eq!(SubRef::parse("-1").as_index(), None);
        assert_eq!(SubRef::parse("").as_index(), None);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(new_id(), new_id());
    }
}
