use std::fmt;

use serde::{Deserialize, Serialize};

/// The built-in numeric kinds.
///
/// A numeric type can represent another when both share the integer/float
/// category and the other's width is not larger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Numeric {
    Byte,
    Short,
    Int,
    Long,
    BigInt,
    Float,
    Double,
    BigDecimal,
}

impl Numeric {
    pub const ALL: [Numeric; 8] = [
        Numeric::Byte,
        Numeric::Short,
        Numeric::Int,
        Numeric::Long,
        Numeric::BigInt,
        Numeric::Float,
        Numeric::Double,
        Numeric::BigDecimal,
    ];

    /// Width in bits.
    pub fn size(self) -> u32 {
        match self {
            Numeric::Byte => 8,
            Numeric::Short => 16,
            Numeric::Int | Numeric::Float => 32,
            Numeric::Long | Numeric::Double => 64,
            Numeric::BigInt | Numeric::BigDecimal => 128,
        }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Numeric::Byte | Numeric::Short | Numeric::Int | Numeric::Long | Numeric::BigInt
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Numeric::Byte => "Byte",
            Numeric::Short => "Short",
            Numeric::Int => "Int",
            Numeric::Long => "Long",
            Numeric::BigInt => "BigInt",
            Numeric::Float => "Float",
            Numeric::Double => "Double",
            Numeric::BigDecimal => "BigDecimal",
        }
    }

    /// Whether values of `other` fit in `self` without loss.
    pub fn can_represent(self, other: Numeric) -> bool {
        self.is_integer() == other.is_integer() && other.size() <= self.size()
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
