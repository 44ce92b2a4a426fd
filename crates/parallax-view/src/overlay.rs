use serde::{Deserialize, Serialize};

/// HUD placement presets, cycled by the calibration UI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HudMode {
    #[default]
    Default,
    Small,
    Large,
    Full,
}

/// GUI placement presets, cycled by the calibration UI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuiMode {
    #[default]
    Default,
    Small,
    Large,
    /// Full-screen GUI; also switches the view into bullet-labyrinth mode.
    Full,
}

impl HudMode {
    pub const ALL: [HudMode; 4] = [HudMode::Default, HudMode::Small, HudMode::Large, HudMode::Full];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl GuiMode {
    pub const ALL: [GuiMode; 4] = [GuiMode::Default, GuiMode::Small, GuiMode::Large, GuiMode::Full];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Per-mode HUD distance and 3D depth values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HudPresets {
    pub distance: [f32; 4],
    pub depth: [f32; 4],
}

impl Default for HudPresets {
    fn default() -> Self {
        Self {
            distance: [0.5, 0.9, 0.3, 0.0],
            depth: [0.0; 4],
        }
    }
}

impl HudPresets {
    pub fn distance(&self, mode: HudMode) -> f32 {
        self.distance[mode.index()]
    }

    pub fn depth(&self, mode: HudMode) -> f32 {
        self.depth[mode.index()]
    }
}

/// Per-mode GUI squash and 3D depth values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiPresets {
    pub squash: [f32; 4],
    pub depth: [f32; 4],
}

impl Default for GuiPresets {
    fn default() -> Self {
        Self {
            squash: [0.6, 0.5, 0.9, 1.0],
            depth: [0.0; 4],
        }
    }
}

impl GuiPresets {
    pub fn squash(&self, mode: GuiMode) -> f32 {
        self.squash[mode.index()]
    }

    pub fn depth(&self, mode: GuiMode) -> f32 {
        self.depth[mode.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_indices_round_trip() {
        for mode in HudMode::ALL {
            assert_eq!(HudMode::from_index(mode.index()), Some(mode));
        }
        assert_eq!(GuiMode::from_index(4), None);
    }

    #[test]
    fn default_presets() {
        let hud = HudPresets::default();
        assert_eq!(hud.distance(HudMode::Small), 0.9);
        assert_eq!(hud.depth(HudMode::Full), 0.0);

        let gui = GuiPresets::default();
        assert_eq!(gui.squash(GuiMode::Default), 0.6);
        assert_eq!(gui.squash(GuiMode::Full), 1.0);
    }
}
