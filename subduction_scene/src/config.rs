// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame loop configuration.

use subduction_core::geometry::Color;
use subduction_core::trace::CadenceKind;

/// Settings of one cadence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CadenceConfig {
    /// Target steps per second. Zero or negative disables the cadence.
    pub frame_rate: f64,
    /// Multiplier applied to the elapsed time reported as the step delta.
    pub time_scale: f64,
    /// Multiplier applied to the step interval. Values above one step less
    /// often.
    pub speed_scale: f64,
    /// Start paused.
    pub paused: bool,
}

impl CadenceConfig {
    /// A running cadence at `frame_rate` with unit scales.
    #[must_use]
    pub const fn at(frame_rate: f64) -> Self {
        Self {
            frame_rate,
            time_scale: 1.0,
            speed_scale: 1.0,
            paused: false,
        }
    }
}

/// Configuration for [`MainLoop`](crate::MainLoop).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopConfig {
    /// Render cadence.
    pub render: CadenceConfig,
    /// Process cadence; also where deferred actions are flushed.
    pub process: CadenceConfig,
    /// Physics cadence; only steps when a physics bridge is installed.
    pub physics: CadenceConfig,
    /// Replace the render rate with the surface's refresh rate when it
    /// reports one.
    pub follow_refresh_rate: bool,
    /// Clear color of every render pass.
    pub clear_color: Color,
}

impl LoopConfig {
    /// Interactive desktop defaults: render follows the display while
    /// process and physics run at 60 Hz.
    #[must_use]
    pub const fn desktop() -> Self {
        Self {
            render: CadenceConfig::at(60.0),
            process: CadenceConfig::at(60.0),
            physics: CadenceConfig::at(60.0),
            follow_refresh_rate: true,
            clear_color: Color::BLACK,
        }
    }

    /// Fixed rates for tests and offline runs: render at 30 Hz, process at
    /// 10 Hz, physics at 60 Hz, no refresh-rate following.
    #[must_use]
    pub const fn headless() -> Self {
        Self {
            render: CadenceConfig::at(30.0),
            process: CadenceConfig::at(10.0),
            physics: CadenceConfig::at(60.0),
            follow_refresh_rate: false,
            clear_color: Color::TRANSPARENT,
        }
    }

    /// Returns the settings of one cadence.
    #[must_use]
    pub const fn cadence(&self, kind: CadenceKind) -> CadenceConfig {
        match kind {
            CadenceKind::Render => self.render,
            CadenceKind::Process => self.process,
            CadenceKind::Physics => self.physics,
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self::desktop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadence_selects_the_matching_settings() {
        let config = LoopConfig::headless();
        assert_eq!(
            config.cadence(CadenceKind::Render).frame_rate,
            30.0,
            "render rate"
        );
        assert_eq!(
            config.cadence(CadenceKind::Process).frame_rate,
            10.0,
            "process rate"
        );
        assert_eq!(
            config.cadence(CadenceKind::Physics),
            config.physics,
            "physics settings"
        );
    }

    #[test]
    fn presets_differ_in_refresh_following() {
        assert!(LoopConfig::default().follow_refresh_rate, "desktop follows");
        assert!(!LoopConfig::headless().follow_refresh_rate, "headless fixed");
        let at = CadenceConfig::at(24.0);
        assert!(
            !at.paused && at.time_scale == 1.0 && at.speed_scale == 1.0,
            "unit scales, running"
        );
    }
}
