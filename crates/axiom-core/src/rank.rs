//! Claim rank. `Preferred` shadows `Normal` within the same property when a
//! predicate or caller needs the "best" claim (e.g. resolving a property's
//! formatter URL); plain diffing and constraint checks ignore rank.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Rank {
    Deprecated,
    Normal,
    Preferred,
}

impl Default for Rank {
    fn default() -> Self {
        Rank::Normal
    }
}
