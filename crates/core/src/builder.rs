//! Flag builder
//!
//! Collects the mandatory id and icon plus optional fields, then freezes
//! them into a shared [`Flag`].

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::models::{ClickHandler, Flag, FlagMode, FlagType, MEMBER_RANK};

/// Builder for [`Flag`] definitions
///
/// Defaults: `Protection` type, `MEMBER_RANK` threshold, `Expert` mode,
/// no sub-panel, no cooldown, default setting `false`.
#[derive(Debug, Clone)]
pub struct FlagBuilder {
    id: String,
    icon: String,
    flag_type: FlagType,
    default_setting: bool,
    default_rank: i32,
    click_handler: Option<ClickHandler>,
    use_panel: bool,
    game_mode: Option<String>,
    owner: Option<String>,
    cooldown: i32,
    mode: FlagMode,
    subflags: Vec<Arc<Flag>>,
}

impl FlagBuilder {
    pub fn new(id: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            icon: icon.into(),
            flag_type: FlagType::Protection,
            default_setting: false,
            default_rank: MEMBER_RANK,
            click_handler: None,
            use_panel: false,
            game_mode: None,
            owner: None,
            cooldown: 0,
            mode: FlagMode::Expert,
            subflags: Vec::new(),
        }
    }

    pub fn flag_type(mut self, flag_type: FlagType) -> Self {
        self.flag_type = flag_type;
        self
    }

    pub fn click_handler(mut self, handler: ClickHandler) -> Self {
        self.click_handler = Some(handler);
        self
    }

    /// Default setting for `Setting` and `WorldSetting` flags
    pub fn default_setting(mut self, value: bool) -> Self {
        self.default_setting = value;
        self
    }

    /// Default rank threshold for `Protection` flags
    pub fn default_rank(mut self, rank: i32) -> Self {
        self.default_rank = rank;
        self
    }

    pub fn use_panel(mut self, use_panel: bool) -> Self {
        self.use_panel = use_panel;
        self
    }

    /// Restrict the flag to one game mode
    pub fn game_mode(mut self, game_mode: impl Into<String>) -> Self {
        self.game_mode = Some(game_mode.into());
        self
    }

    /// Extension registering the flag. Needed for reload/unregister.
    pub fn owner(mut self, extension_id: impl Into<String>) -> Self {
        self.owner = Some(extension_id.into());
        self
    }

    /// Cooldown in seconds, only meaningful for `Setting` flags
    pub fn cooldown(mut self, seconds: i32) -> Self {
        self.cooldown = seconds;
        self
    }

    pub fn mode(mut self, mode: FlagMode) -> Self {
        self.mode = mode;
        self
    }

    /// Add sub-flags whose state follows this flag on write
    pub fn subflags<I>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = Arc<Flag>>,
    {
        for flag in flags {
            if !self.subflags.contains(&flag) {
                self.subflags.push(flag);
            }
        }
        self
    }

    pub fn build(self) -> Arc<Flag> {
        let click_handler = self
            .click_handler
            .unwrap_or_else(|| ClickHandler::default_for(self.flag_type));

        let flag = Flag {
            id: self.id,
            icon: self.icon,
            flag_type: self.flag_type,
            mode: self.mode,
            default_setting: AtomicBool::new(self.default_setting),
            default_rank: self.default_rank,
            cooldown: self.cooldown,
            click_handler,
            use_panel: self.use_panel,
            owner: self.owner,
            game_mode: self.game_mode,
            subflags: self.subflags,
        };
        crate::invariants::assert_flag_invariants(&flag);
        Arc::new(flag)
    }
}
