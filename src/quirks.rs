/// Behavioral differences between historical interpreters, selected once at
/// machine creation. Each flag covers one instruction whose semantics
/// diverged between the COSMAC VIP interpreter and later S-CHIP-style
/// implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuirkProfile {
    /// 8XY6/8XYE shift V[Y] into V[X] (classic) rather than shifting V[X]
    /// in place (S-CHIP).
    pub shift_reads_vy: bool,
    /// FX55/FX65 leave I pointing one past the last register written
    /// (classic) rather than untouched (S-CHIP).
    pub index_increments: bool,
    /// 8XY1/8XY2/8XY3 reset VF to 0 (classic COSMAC VIP behavior).
    pub logic_resets_vf: bool,
}

impl QuirkProfile {
    pub fn classic() -> Self {
        Self {
            shift_reads_vy: true,
            index_increments: true,
            logic_resets_vf: true,
        }
    }

    pub fn super_chip() -> Self {
        Self {
            shift_reads_vy: false,
            index_increments: false,
            logic_resets_vf: false,
        }
    }
}
