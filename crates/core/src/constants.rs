use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Decimal precision for persisted amounts and percentages
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for fund units and NAV per unit
pub const UNIT_PRECISION: u32 = 8;

/// NAV used for the very first subscription into a fund with no units outstanding
pub const DEFAULT_BOOTSTRAP_NAV: Decimal = dec!(1.0);

/// Default number of portfolios processed concurrently by a snapshot run
pub const DEFAULT_MAX_CONCURRENT_PORTFOLIOS: usize = 4;

/// Default number of asset lookups in flight per portfolio
pub const DEFAULT_MAX_CONCURRENT_ASSETS: usize = 8;

/// Default timeout for a single price/position lookup, in milliseconds
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 10_000;

/// Date format used in snapshot keys and persisted dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Identity recorded on executions started without an explicit operator
pub const SYSTEM_USER: &str = "system";
