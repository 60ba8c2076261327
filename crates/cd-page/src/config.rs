//! Interaction tuning knobs.

use cd_core::PageError;
use cd_core::PageResult;

/// Thresholds and durations for the page behaviors. Defaults match the
/// site the engine was built for.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionConfig {
    /// Scroll offset past which the scroll-to-top control shows.
    pub scroll_top_threshold: f32,
    /// Scroll offset past which the navbar shadow intensifies.
    pub navbar_shadow_threshold: f32,
    /// Lookahead subtracted from section tops when highlighting nav links.
    pub section_lookahead: f32,
    /// Visibility ratio that reveals an entrance-animated element.
    pub reveal_threshold: f32,
    /// Bottom inset applied to the viewport for reveal sweeps.
    pub reveal_bottom_margin: f32,
    /// Visibility ratio that starts a counter animation.
    pub counter_threshold: f32,
    /// Total counter animation time.
    pub counter_duration_ms: u64,
    /// Nominal frame step used to derive the per-frame counter increment.
    pub counter_frame_ms: u64,
    /// Delay between lightbox exit styles and overlay removal. Matches the
    /// overlay's CSS transition duration.
    pub lightbox_exit_ms: u64,
    /// Anchor scroll offset used when the navbar has no rendered height.
    pub anchor_offset_fallback: f32,
    /// Duration of programmatic smooth scrolls.
    pub smooth_scroll_ms: u64,
    /// Delay before the hero badge reveal.
    pub hero_badge_delay_ms: u64,
    /// Per-index transition delay applied to hero stat elements.
    pub hero_stat_stagger_ms: u64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            scroll_top_threshold: 400.0,
            navbar_shadow_threshold: 100.0,
            section_lookahead: 120.0,
            reveal_threshold: 0.12,
            reveal_bottom_margin: 40.0,
            counter_threshold: 0.5,
            counter_duration_ms: 2000,
            counter_frame_ms: 16,
            lightbox_exit_ms: 300,
            anchor_offset_fallback: 60.0,
            smooth_scroll_ms: 400,
            hero_badge_delay_ms: 300,
            hero_stat_stagger_ms: 100,
        }
    }
}

impl InteractionConfig {
    pub fn validate(&self) -> PageResult<()> {
        if self.counter_duration_ms == 0 || self.counter_frame_ms == 0 {
            return Err(PageError::new(
                "config.counter_timing_invalid",
                "counter duration and frame step must be greater than zero",
            ));
        }

        if self.counter_frame_ms > self.counter_duration_ms {
            return Err(PageError::new(
                "config.counter_timing_invalid",
                "counter frame step must not exceed the counter duration",
            ));
        }

        if self.smooth_scroll_ms == 0 {
            return Err(PageError::new(
                "config.smooth_scroll_invalid",
                "smooth scroll duration must be greater than zero",
            ));
        }

        if self.lightbox_exit_ms == 0 {
            return Err(PageError::new(
                "config.lightbox_exit_invalid",
                "lightbox exit delay must be greater than zero",
            ));
        }

        for (name, threshold) in [
            ("reveal", self.reveal_threshold),
            ("counter", self.counter_threshold),
        ] {
            if !(threshold > 0.0 && threshold <= 1.0) {
                return Err(PageError::new(
                    "config.threshold_invalid",
                    format!("{name} threshold must be within (0, 1], got {threshold}"),
                ));
            }
        }

        for (name, value) in [
            ("scroll_top_threshold", self.scroll_top_threshold),
            ("navbar_shadow_threshold", self.navbar_shadow_threshold),
            ("section_lookahead", self.section_lookahead),
            ("reveal_bottom_margin", self.reveal_bottom_margin),
            ("anchor_offset_fallback", self.anchor_offset_fallback),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PageError::new(
                    "config.offset_invalid",
                    format!("{name} must be a non-negative finite offset, got {value}"),
                ));
            }
        }

        Ok(())
    }
}
