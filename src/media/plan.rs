//! Screenshot timestamp planning.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::media::events::DisplayEvent;

/// How many screenshots one request produces.
pub const SCREENSHOT_COUNT: usize = 5;

/// Middle span of the video preferred for subtitle-driven sampling, as
/// fractions of duration. Skips intros and credits.
pub const GOLDEN_WINDOW: (f64, f64) = (0.30, 0.80);

/// Fallback timestamps as fractions of duration.
pub const FALLBACK_FRACTIONS: [f64; SCREENSHOT_COUNT] = [0.15, 0.30, 0.50, 0.70, 0.85];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSource {
    /// Timestamps sampled from subtitle display events.
    Subtitles,
    /// Fixed percentage-of-duration timestamps.
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreenshotPlan {
    pub timestamps: Vec<f64>,
    pub source: PlanSource,
}

/// Build the capture plan for a video of `duration` seconds.
///
/// Subtitle events are only used when at least `count` of them exist, with
/// golden-window events preferred; each chosen event gets a random instant
/// inside its middle 80% so frames are not captured on a fade edge. With too
/// few events the plan is the deterministic percentage fallback; the two
/// sources are never mixed within one plan.
pub fn plan_screenshots(
    duration: f64,
    events: &[DisplayEvent],
    count: usize,
    rng: &mut impl Rng,
) -> ScreenshotPlan {
    if events.len() >= count {
        let golden_start = duration * GOLDEN_WINDOW.0;
        let golden_end = duration * GOLDEN_WINDOW.1;
        let golden: Vec<DisplayEvent> = events
            .iter()
            .copied()
            .filter(|event| event.start >= golden_start && event.end <= golden_end)
            .collect();
        let candidates: &[DisplayEvent] = if golden.len() >= count {
            &golden
        } else {
            tracing::debug!(
                golden = golden.len(),
                "not enough golden-window events, sampling from all"
            );
            events
        };

        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.shuffle(rng);
        let timestamps: Vec<f64> = order
            .into_iter()
            .take(count)
            .map(|index| {
                let event = candidates[index];
                let span = event.end - event.start;
                event.start + span * rng.gen_range(0.1..0.9)
            })
            .collect();
        return ScreenshotPlan {
            timestamps,
            source: PlanSource::Subtitles,
        };
    }

    ScreenshotPlan {
        timestamps: FALLBACK_FRACTIONS
            .iter()
            .map(|fraction| duration * fraction)
            .collect(),
        source: PlanSource::Fallback,
    }
}
