/// Number of digits in a normalized fund identifier.
pub const FUND_ID_DIGITS: usize = 14;

/// Decimal precision for monetary values and weights
pub const DECIMAL_PRECISION: u32 = 6;

/// Trailing window, in months, inside which the latest custody filing must
/// fall for the custody feed to keep precedence over regulator data.
pub const CUSTODY_PRECEDENCE_WINDOW_MONTHS: u32 = 6;

/// Number of holdings considered "top" for common-holdings intersections.
pub const TOP_HOLDINGS_COUNT: usize = 15;

/// Label of the residual bucket produced by top-N collapsing, and the
/// sector assigned to unclassified assets.
pub const OTHER_LABEL: &str = "Other";

/// Asset-id prefix for fund-of-fund share positions.
pub const FUND_SHARE_PREFIX: &str = "FUND:";

/// Asset-id prefix for public (government) bond positions.
pub const PUBLIC_BOND_PREFIX: &str = "GOVT:";

/// Asset-id prefix for bank deposit positions.
pub const DEPOSIT_PREFIX: &str = "DEPOSIT:";

/// Asset-id prefix for derivative positions.
pub const DERIVATIVE_PREFIX: &str = "DERIV:";

/// Asset-id used for cash positions.
pub const CASH_ASSET_ID: &str = "CASH";
