//! Typed claim values.

use rust_decimal::Decimal;

use crate::ids::EntityId;

/// A page reference, used for the `geoshape`, `tabular-data` and
/// `commonsMedia` value types alike. `title` is already namespace-qualified
/// (e.g. `"Data:Some file.tab"`), matching how `Format`'s textual projection
/// expects it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PageRef {
    pub title: String,
}

/// A Wikibase quantity: an exact decimal amount with optional bounds and unit.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Quantity {
    pub amount: Decimal,
    pub upper_bound: Option<Decimal>,
    pub lower_bound: Option<Decimal>,
    /// Unit entity id; `None` means unitless ("1").
    pub unit: Option<EntityId>,
}

impl Quantity {
    pub fn has_bounds(&self) -> bool {
        self.upper_bound.is_some() || self.lower_bound.is_some()
    }

    pub fn is_integer(&self) -> bool {
        self.amount.fract().is_zero()
    }
}

/// Wikibase time precision codes (abbreviated: 9 = year, 10 = month,
/// 11 = day, 14 = second). Anything coarser than year truncates to the
/// year component only.
pub type Precision = u8;

/// A Wikibase time value. Components outside the claimed precision are
/// conventionally zero/one but not meaningful for comparison; callers should
/// go through [`WbTime::truncated`] rather than compare fields directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WbTime {
    pub year: i64,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub precision: Precision,
    /// Calendar model entity id (proleptic Gregorian / Julian); `None` means
    /// the default (proleptic Gregorian).
    pub calendar: Option<EntityId>,
}

impl WbTime {
    /// Truncate to a tuple comparable at `min(self.precision, other_precision)`,
    /// matching the "precision = min of the two sides" rule used by
    /// `TimeRange` and `DifferenceWithinRange`.
    ///
    /// Precision codes below 9 (year) all collapse to the year-only tuple;
    /// this mirrors `max(1, precision - 8)` truncation on the (Y,M,D,h,m,s)
    /// tuple.
    pub fn truncated(&self, precision: Precision) -> TimeTuple {
        let components = (self.year, self.month, self.day, self.hour, self.minute, self.second);
        let keep = (precision as i32 - 8).max(1) as usize;
        TimeTuple::from_components(components, keep)
    }
}

/// A truncated time tuple, comparable lexicographically the way the
/// original Python tuple-slicing comparison works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeTuple {
    len: usize,
    values: [i64; 6],
}

impl TimeTuple {
    fn from_components(c: (i64, u8, u8, u8, u8, u8), keep: usize) -> Self {
        let full = [c.0, c.1 as i64, c.2 as i64, c.3 as i64, c.4 as i64, c.5 as i64];
        let keep = keep.min(6);
        let mut values = [i64::MIN; 6];
        values[..keep].copy_from_slice(&full[..keep]);
        // Unused trailing slots must not affect ordering between tuples of
        // equal `len`, and two tuples are only ever compared at equal `len`
        // (callers always pass the same `precision` to both sides).
        TimeTuple { len: keep, values }
    }
}

/// A claim's typed value. Snaks with `snaktype != value` (`novalue`,
/// `somevalue`) carry no `Value` at all — see [`crate::entity::SnakType`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Value {
    Entity(EntityId),
    Str(String),
    MonolingualText { lang: String, text: String },
    Quantity(Quantity),
    Time(WbTime),
    Page(PageRef),
}

impl Value {
    /// The textual projection used by the `Format` constraint: a string
    /// as-is, monolingual text's bare text, and a page-like value's
    /// namespaced title. Entity, quantity and time values have no
    /// meaningful projection and fall back to `""`, matching the source
    /// behavior for values `Format` was never meant to see.
    pub fn format_projection(&self) -> &str {
        match self {
            Value::Str(s) => s,
            Value::MonolingualText { text, .. } => text,
            Value::Page(p) => &p.title,
            _ => "",
        }
    }

    pub fn as_entity(&self) -> Option<&EntityId> {
        match self {
            Value::Entity(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_quantity(&self) -> Option<&Quantity> {
        match self {
            Value::Quantity(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<&WbTime> {
        match self {
            Value::Time(t) => Some(t),
            _ => None,
        }
    }
}
