//! # Sequential Codes
//!
//! Human-readable numbers printed on orders and invoices. The sequence value
//! itself comes from a counter row in the database; this module only knows
//! how each kind of code looks.
//!
//! | Kind    | Counter   | Example       |
//! |---------|-----------|---------------|
//! | Order   | `order`   | `PED-0001`    |
//! | Invoice | `invoice` | `00000001`    |
//! | Control | `control` | `00-00000001` |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of order codes.
pub const ORDER_PREFIX: &str = "PED-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeKind {
    Order,
    Invoice,
    Control,
}

impl CodeKind {
    /// Name of the backing row in the `counters` table.
    pub const fn counter_name(self) -> &'static str {
        match self {
            CodeKind::Order => "order",
            CodeKind::Invoice => "invoice",
            CodeKind::Control => "control",
        }
    }

    /// Renders sequence value `n` (1-based).
    ///
    /// ```rust
    /// use siconi_core::codes::CodeKind;
    ///
    /// assert_eq!(CodeKind::Order.format(1), "PED-0001");
    /// assert_eq!(CodeKind::Order.format(12345), "PED-12345");
    /// assert_eq!(CodeKind::Invoice.format(7), "00000007");
    /// assert_eq!(CodeKind::Control.format(7), "00-00000007");
    /// ```
    pub fn format(self, n: i64) -> String {
        match self {
            CodeKind::Order => format!("{}{:04}", ORDER_PREFIX, n),
            CodeKind::Invoice => format!("{:08}", n),
            CodeKind::Control => format!("00-{:08}", n),
        }
    }

    /// Extracts the sequence value back out of a code.
    pub fn parse(self, code: &str) -> Option<i64> {
        let digits = match self {
            CodeKind::Order => code.trim().strip_prefix(ORDER_PREFIX)?,
            CodeKind::Invoice => code.trim(),
            CodeKind::Control => code.trim().strip_prefix("00-")?,
        };
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

impl fmt::Display for CodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.counter_name())
    }
}
