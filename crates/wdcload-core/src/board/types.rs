//! Board type definitions

use core::fmt;

/// Supported development boards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoardType {
    /// W65C02SXB
    W65C02Sxb,
    /// W65C816SXB
    W65C816Sxb,
    /// MENSCH, revision A
    MenschRevA,
    /// MENSCH, revision B
    MenschRevB,
    /// MENSCH, revision C
    MenschRevC,
    /// Anything the info block does not identify
    Unknown,
}

/// MENSCH revisions indexed by `cpu_type - 0x41`
pub(crate) const MENSCH_REVISIONS: [BoardType; 3] = [
    BoardType::MenschRevA,
    BoardType::MenschRevB,
    BoardType::MenschRevC,
];

impl BoardType {
    /// Board name as printed by the tool
    pub const fn name(self) -> &'static str {
        match self {
            Self::W65C02Sxb => "W65C02SXB",
            Self::W65C816Sxb => "W65C816SXB",
            Self::MenschRevA => "MENSCH_RevA",
            Self::MenschRevB => "MENSCH_RevB",
            Self::MenschRevC => "MENSCH_RevC",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// SXB boards execute through the staged CPU state block
    pub const fn is_sxb(self) -> bool {
        matches!(self, Self::W65C02Sxb | Self::W65C816Sxb)
    }

    /// MENSCH boards take a 24-bit execute address directly
    pub const fn is_mensch(self) -> bool {
        matches!(self, Self::MenschRevA | Self::MenschRevB | Self::MenschRevC)
    }
}

impl fmt::Display for BoardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
