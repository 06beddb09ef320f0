/// Combat rule constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatConfig {
    /// Initiative used for a participant without a preset value when combat
    /// starts without auto-rolling.
    pub default_initiative: i32,
}

impl CombatConfig {
    // ===== rule constants =====
    /// Faces on the initiative die.
    pub const INITIATIVE_DIE_SIDES: u32 = 20;
    /// Lowest initiative total a roll can produce, however bad the modifier.
    pub const MIN_INITIATIVE_TOTAL: i32 = 1;
    /// Dexterity score whose modifier is zero.
    pub const DEXTERITY_BASELINE: i32 = 10;
    /// Round number assigned when combat starts.
    pub const FIRST_ROUND: i32 = 1;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_INITIATIVE: i32 = 0;

    pub fn new() -> Self {
        Self {
            default_initiative: Self::DEFAULT_INITIATIVE,
        }
    }

    pub fn with_default_initiative(default_initiative: i32) -> Self {
        Self { default_initiative }
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}
