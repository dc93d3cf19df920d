//! UI settings and preferences
//!
//! Read from LocalStorage, separately from the card list.

use serde::{Deserialize, Serialize};

use crate::card::ProgressLevel;

/// Display preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Notifications ===
    /// How long a notice stays on screen (ms)
    pub notice_ms: u32,
    /// Fade-out duration before removal (ms)
    pub notice_fade_ms: u32,

    // === Progress bar ===
    /// Below this percentage the bar turns red
    pub danger_below: f64,
    /// Below this percentage the bar turns amber
    pub warning_below: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notice_ms: 3000,
            notice_fade_ms: 500,

            danger_below: 20.0,
            warning_below: 50.0,
        }
    }
}

impl Settings {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "calorie_cards_settings";

    /// Clamp thresholds to 0-100 and keep warning >= danger
    pub fn sanitized(mut self) -> Self {
        let clamp = |v: f64| if v.is_finite() { v.clamp(0.0, 100.0) } else { 0.0 };
        self.danger_below = clamp(self.danger_below);
        self.warning_below = clamp(self.warning_below).max(self.danger_below);
        self
    }

    /// Bar colour band for a remaining percentage
    pub fn progress_level(&self, percent: f64) -> ProgressLevel {
        ProgressLevel::from_percent(percent, self.danger_below, self.warning_below)
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str::<Settings>(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings.sanitized();
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}
