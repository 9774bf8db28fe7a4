//! Constraint severity and its integer scoring weight.

/// Severity of a constraint. The discriminant doubles as the multiplier
/// applied to update-score contributions (`score *= status.weight()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[repr(i64)]
pub enum Status {
    Suggestion = 1,
    Regular = 2,
    Mandatory = 4,
}

impl Status {
    pub fn weight(self) -> i64 {
        self as i64
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Regular
    }
}
