//! Point type vocabulary (see `spec.md` §3).

use serde::{Deserialize, Serialize};

/// The wire type of a SunSpec point.
///
/// `String` carries no length — a point's register length always comes
/// from its `PointDef::len` (strings vary per point; every other variant
/// has a length implied by its own width, available via
/// [`PointType::fixed_len_registers`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointType {
    Uint16,
    Int16,
    Uint32,
    Int32,
    Uint64,
    Int64,
    /// Monotonic accumulator, same wire shape as the unsigned type of the
    /// same width. The non-decreasing invariant is documentary only; the
    /// codec does not enforce it.
    Acc16,
    Acc32,
    Acc64,
    /// Signed 16-bit base-10 exponent used by scale-factor points.
    Sunssf,
    Bitfield16,
    Bitfield32,
    Enum16,
    Enum32,
    String,
}

impl PointType {
    /// Register width for every type whose length doesn't depend on the
    /// point definition. Returns `None` for `String`, whose length is
    /// carried by `PointDef::len`.
    pub fn fixed_len_registers(self) -> Option<u16> {
        match self {
            PointType::Uint16
            | PointType::Int16
            | PointType::Sunssf
            | PointType::Bitfield16
            | PointType::Enum16
            | PointType::Acc16 => Some(1),
            PointType::Uint32 | PointType::Int32 | PointType::Bitfield32 | PointType::Enum32 | PointType::Acc32 => {
                Some(2)
            }
            PointType::Uint64 | PointType::Int64 | PointType::Acc64 => Some(4),
            PointType::String => None,
        }
    }

    /// Whether decoding this type sign-extends from its declared width.
    pub fn is_signed(self) -> bool {
        matches!(self, PointType::Int16 | PointType::Int32 | PointType::Int64 | PointType::Sunssf)
    }
}
