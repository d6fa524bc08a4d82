//! Record key text
//!
//! A key is `prefix` followed by the decimal ordinal, left-padded with zeros to
//! `zero_padding` digits. With hashed insert order the ordinal is first run
//! through [`mix64`], which is a bijection, so [`KeyFormatter::parse`] can
//! always recover the original ordinal.
//!
//! # Example
//!
//! ```
//! use kvpulse::config::workload::InsertOrder;
//! use kvpulse::workload::key::KeyFormatter;
//!
//! let keys = KeyFormatter::new("user", 4, InsertOrder::Ordered);
//! assert_eq!(keys.format(42), "user0042");
//! assert_eq!(keys.parse("user0042"), Some(42));
//! ```

use crate::config::workload::InsertOrder;
use crate::distribution::scrambled::{mix64, unmix64};
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFormatter {
    prefix: String,
    zero_padding: usize,
    order: InsertOrder,
}

impl KeyFormatter {
    pub fn new(prefix: impl Into<String>, zero_padding: usize, order: InsertOrder) -> Self {
        Self {
            prefix: prefix.into(),
            zero_padding,
            order,
        }
    }

    /// Key text for `ordinal`
    pub fn format(&self, ordinal: u64) -> String {
        let mut key = String::with_capacity(self.prefix.len() + 20);
        self.format_into(ordinal, &mut key);
        key
    }

    /// Write the key for `ordinal` into `buf`, replacing its contents
    pub fn format_into(&self, ordinal: u64, buf: &mut String) {
        let number = match self.order {
            InsertOrder::Ordered => ordinal,
            InsertOrder::Hashed => mix64(ordinal),
        };
        buf.clear();
        buf.push_str(&self.prefix);
        let _ = write!(buf, "{:0width$}", number, width = self.zero_padding);
    }

    /// Ordinal encoded in `key`, if it was produced by this formatter
    pub fn parse(&self, key: &str) -> Option<u64> {
        let digits = key.strip_prefix(self.prefix.as_str())?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let number: u64 = digits.parse().ok()?;
        Some(match self.order {
            InsertOrder::Ordered => number,
            InsertOrder::Hashed => unmix64(number),
        })
    }
}
