//! Flag model - a named unit of access control or setting

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

const PROTECTION_FLAGS: &str = "protection.flags.";

/// How a flag is evaluated and who may change it
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
    /// Protects an island. Changed by the island owner, applied by the rank
    /// of the player performing the guarded action.
    #[default]
    Protection,
    /// An island parameter, usually on/off. Changed by the island owner.
    Setting,
    /// Applies to the whole world. Changed by administrators only.
    WorldSetting,
}

impl FlagType {
    /// Protection and world-setting flags keep a durable per-world record
    pub fn is_world_scoped(&self) -> bool {
        matches!(self, FlagType::Protection | FlagType::WorldSetting)
    }

    /// Icon shown for the type in menus
    pub fn icon(&self) -> &'static str {
        match self {
            FlagType::Protection => "SHIELD",
            FlagType::Setting => "COMPARATOR",
            FlagType::WorldSetting => "GRASS_BLOCK",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FlagType::Protection => "Protection",
            FlagType::Setting => "Setting",
            FlagType::WorldSetting => "World Setting",
        }
    }

    pub fn all() -> &'static [FlagType] {
        &[FlagType::Protection, FlagType::Setting, FlagType::WorldSetting]
    }
}

impl std::fmt::Display for FlagType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Menu tier a flag is shown in
///
/// `Basic < Advanced < Expert` for [`FlagMode::is_greater_than`]. `TopRow`
/// sits outside that order: it is never greater than anything and nothing
/// is greater than it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlagMode {
    Basic,
    Advanced,
    #[default]
    Expert,
    TopRow,
}

impl FlagMode {
    /// Next tier in the `Basic -> Advanced -> Expert -> Basic` cycle.
    ///
    /// `TopRow` is not part of the cycle and falls through to `Basic`.
    pub fn next(self) -> Self {
        match self {
            FlagMode::Basic => FlagMode::Advanced,
            FlagMode::Advanced => FlagMode::Expert,
            FlagMode::Expert | FlagMode::TopRow => FlagMode::Basic,
        }
    }

    /// Partial order over the menu tiers
    pub fn is_greater_than(self, other: FlagMode) -> bool {
        match self {
            FlagMode::Expert => matches!(other, FlagMode::Basic | FlagMode::Advanced),
            FlagMode::Advanced => other == FlagMode::Basic,
            FlagMode::Basic | FlagMode::TopRow => false,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FlagMode::Basic => "Basic",
            FlagMode::Advanced => "Advanced",
            FlagMode::Expert => "Expert",
            FlagMode::TopRow => "Top Row",
        }
    }
}

impl std::fmt::Display for FlagMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Interaction triggered when the flag's menu entry is clicked
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickHandler {
    /// Toggle the setting on the island being viewed
    IslandToggle,
    /// Toggle the setting for the whole world
    WorldToggle,
    /// Step the protection threshold through the rank table
    CycleRanks,
    /// Handler supplied by the registering extension
    Custom(String),
}

impl ClickHandler {
    /// Handler used when the builder was given none
    pub fn default_for(flag_type: FlagType) -> Self {
        match flag_type {
            FlagType::Setting => ClickHandler::IslandToggle,
            FlagType::WorldSetting => ClickHandler::WorldToggle,
            FlagType::Protection => ClickHandler::CycleRanks,
        }
    }
}

/// An immutable flag definition
///
/// Built once through [`crate::FlagBuilder`] and shared as `Arc<Flag>`.
/// The compiled default setting is the only mutable field.
#[derive(Debug)]
pub struct Flag {
    pub(crate) id: String,
    pub(crate) icon: String,
    pub(crate) flag_type: FlagType,
    pub(crate) mode: FlagMode,
    pub(crate) default_setting: AtomicBool,
    pub(crate) default_rank: i32,
    pub(crate) cooldown: i32,
    pub(crate) click_handler: ClickHandler,
    pub(crate) use_panel: bool,
    pub(crate) owner: Option<String>,
    pub(crate) game_mode: Option<String>,
    pub(crate) subflags: Vec<Arc<Flag>>,
}

impl Flag {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn flag_type(&self) -> FlagType {
        self.flag_type
    }

    pub fn mode(&self) -> FlagMode {
        self.mode
    }

    /// Compiled default for locations outside island spaces
    pub fn default_setting(&self) -> bool {
        self.default_setting.load(AtomicOrdering::SeqCst)
    }

    /// Override the compiled default. Touches no world store and no sub-flags.
    pub fn set_default_setting(&self, value: bool) {
        self.default_setting.store(value, AtomicOrdering::SeqCst);
    }

    /// Minimum rank score needed to perform the guarded action
    pub fn default_rank(&self) -> i32 {
        self.default_rank
    }

    /// Cooldown in seconds between toggles (settings only)
    pub fn cooldown(&self) -> i32 {
        self.cooldown
    }

    pub fn click_handler(&self) -> &ClickHandler {
        &self.click_handler
    }

    /// Whether the menu entry opens a sub-panel
    pub fn has_sub_panel(&self) -> bool {
        self.use_panel
    }

    /// Id of the extension that registered this flag
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Game mode this flag was built for, if it is game-mode specific
    pub fn game_mode(&self) -> Option<&str> {
        self.game_mode.as_deref()
    }

    pub fn has_subflags(&self) -> bool {
        !self.subflags.is_empty()
    }

    pub fn subflags(&self) -> &[Arc<Flag>] {
        &self.subflags
    }

    /// Sub-flag ids, sorted
    pub fn subflag_ids(&self) -> BTreeSet<&str> {
        self.subflags.iter().map(|f| f.id()).collect()
    }

    pub fn name_reference(&self) -> String {
        format!("{}{}.name", PROTECTION_FLAGS, self.id)
    }

    pub fn icon_reference(&self) -> String {
        format!("{}{}.icon", PROTECTION_FLAGS, self.id)
    }

    pub fn description_reference(&self) -> String {
        format!("{}{}.description", PROTECTION_FLAGS, self.id)
    }

    pub fn hint_reference(&self) -> String {
        format!("{}{}.hint", PROTECTION_FLAGS, self.id)
    }
}

// Identity is (id, type); every other field is payload.
impl PartialEq for Flag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.flag_type == other.flag_type
    }
}

impl Eq for Flag {}

impl Hash for Flag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.flag_type.hash(state);
    }
}

impl PartialOrd for Flag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Flag {
    /// Lexicographic by id. Type only breaks ties so the order agrees with `Eq`.
    fn cmp(&self, other: &Self) -> Ordering {
        self.id
            .cmp(&other.id)
            .then_with(|| self.flag_type.cmp(&other.flag_type))
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Flag [id={}]", self.id)
    }
}
