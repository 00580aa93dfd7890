//! Character-level rate limiting applied in the Decide step.

use chrono::{DateTime, Utc};

use chorus_types::character::CharacterState;
use chorus_types::workflow::DeferReason;

use crate::personality::PersonalityProfile;

/// Return the reason a character must defer at `now`, if any.
///
/// The daily cap is checked before the cooldown window. A
/// `max_daily_interactions` of zero disables the daily cap.
pub fn check_rate_limit(
    state: &CharacterState,
    personality: &dyn PersonalityProfile,
    now: DateTime<Utc>,
) -> Option<DeferReason> {
    let daily_cap = personality.max_daily_interactions();
    if daily_cap > 0 && state.interactions_on(now) >= daily_cap {
        return Some(DeferReason::DailyCap);
    }
    if state.is_cooling_down(now) {
        return Some(DeferReason::Cooldown);
    }
    None
}
