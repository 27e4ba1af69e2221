//! Binary operator precedence.
//!
//! Higher binds tighter. `in` and `instanceof` are handled by the parser and
//! are not part of the table.

use rustc_hash::FxHashMap;

/// Default binding strengths.
pub const DEFAULT_PRECEDENCE: &[(&str, u8)] = &[
    (")", 0),
    (";", 0),
    (",", 0),
    ("=", 0),
    ("]", 0),
    ("??", 5),
    ("||", 6),
    ("&&", 7),
    ("|", 8),
    ("^", 9),
    ("&", 10),
    ("==", 11),
    ("!=", 11),
    ("===", 11),
    ("!==", 11),
    ("<", 12),
    (">", 12),
    ("<=", 12),
    (">=", 12),
    ("<<", 13),
    (">>", 13),
    (">>>", 13),
    ("+", 14),
    ("-", 14),
    ("*", 15),
    ("/", 15),
    ("%", 15),
];

/// Precedence of `in` and `instanceof`.
pub const RELATIONAL_KEYWORD_PRECEDENCE: u8 = 12;

/// A per-parser precedence table.
#[derive(Debug, Clone)]
pub struct PrecedenceTable {
    map: FxHashMap<&'static str, u8>,
}

impl Default for PrecedenceTable {
    fn default() -> Self {
        Self {
            map: DEFAULT_PRECEDENCE.iter().copied().collect(),
        }
    }
}

impl PrecedenceTable {
    /// The default table with every key passed through `f`.
    ///
    /// Keys for which `f` returns `None` keep their default.
    pub fn with_override(f: &dyn Fn(&str) -> Option<u8>) -> Self {
        let mut table = Self::default();
        for (op, prec) in table.map.iter_mut() {
            if let Some(p) = f(op) {
                *prec = p;
            }
        }
        table
    }

    /// Precedence of a punctuator, 0 when unknown.
    #[inline]
    pub fn get(&self, op: &str) -> u8 {
        self.map.get(op).copied().unwrap_or(0)
    }
}
