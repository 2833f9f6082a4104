use nutype::nutype;

/// Monetary amount in minor currency units (e.g. cents).
///
/// Prices and totals are fixed-point integers so summing line totals never
/// accumulates rounding error. Arithmetic is checked: callers receive `None` on
/// overflow and decide how to report it.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    Serialize,
    Deserialize
))]
pub struct Money(i64);

impl Money {
    /// A zero amount.
    pub fn zero() -> Self {
        Self::new(0)
    }

    /// Amount expressed in minor units.
    pub fn minor_units(self) -> i64 {
        self.into_inner()
    }

    pub fn is_positive(self) -> bool {
        self.into_inner() > 0
    }

    pub fn is_negative(self) -> bool {
        self.into_inner() < 0
    }

    /// Multiply a unit price by a quantity, returning `None` on overflow.
    pub fn checked_times(self, quantity: Quantity) -> Option<Self> {
        self.into_inner()
            .checked_mul(i64::from(quantity.into_inner()))
            .map(Self::new)
    }

    /// Add two amounts, returning `None` on overflow.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.into_inner()
            .checked_add(other.into_inner())
            .map(Self::new)
    }
}

/// Number of units requested or moved; always at least one.
#[nutype(
    validate(greater = 0),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Display,
        Serialize,
        Deserialize
    )
)]
pub struct Quantity(u32);

impl Quantity {
    pub fn get(self) -> u32 {
        self.into_inner()
    }

    /// Sum two quantities, returning `None` if the result does not fit in `u32`.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.into_inner()
            .checked_add(other.into_inner())
            .and_then(|sum| Self::try_new(sum).ok())
    }
}
