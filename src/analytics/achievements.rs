//! Achievement unlock conditions.

use chrono::{FixedOffset, Timelike};

use crate::models::{AchievementId, TypingResult, UnlockedAchievement};

pub const VETERAN_TESTS: usize = 50;
pub const WPM_100: u32 = 100;
pub const SPEED_DEVIL_WPM: u32 = 130;
pub const NIGHT_OWL_TESTS: usize = 10;
/// Night owl results are created in the local hours `[0, 4)`.
pub const NIGHT_OWL_END_HOUR: u32 = 4;

fn is_night_owl(result: &TypingResult, offset: &FixedOffset) -> bool {
    result.created_at.with_timezone(offset).hour() < NIGHT_OWL_END_HOUR
}

/// Every achievement whose condition holds over the full history, in the
/// order they are checked.
pub fn satisfied(results: &[TypingResult], offset: &FixedOffset) -> Vec<AchievementId> {
    let checks = [
        (AchievementId::FirstTest, !results.is_empty()),
        (AchievementId::Veteran50, results.len() >= VETERAN_TESTS),
        (
            AchievementId::AccuracyKing,
            results.iter().any(|r| r.accuracy() >= 100),
        ),
        (
            AchievementId::Wpm100Club,
            results.iter().any(|r| r.wpm() >= WPM_100),
        ),
        (
            AchievementId::SpeedDevil,
            results.iter().any(|r| r.wpm() >= SPEED_DEVIL_WPM),
        ),
        (
            AchievementId::NightOwl,
            results.iter().filter(|r| is_night_owl(r, offset)).count() >= NIGHT_OWL_TESTS,
        ),
    ];

    checks
        .into_iter()
        .filter_map(|(id, ok)| ok.then_some(id))
        .collect()
}

/// Satisfied achievements not yet in `unlocked`. Existing unlocks are never
/// re-evaluated, so nothing is ever revoked.
pub fn newly_unlocked(
    results: &[TypingResult],
    unlocked: &[UnlockedAchievement],
    offset: &FixedOffset,
) -> Vec<AchievementId> {
    satisfied(results, offset)
        .into_iter()
        .filter(|id| !unlocked.iter().any(|u| u.achievement_id == *id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, ResultMetrics};
    use chrono::{DateTime, TimeZone, Utc};

    fn result_at(wpm: u32, accuracy: u8, created_at: DateTime<Utc>) -> TypingResult {
        TypingResult::recorded_at(
            "u1".into(),
            Category::Standard,
            ResultMetrics {
                wpm,
                accuracy,
                time_taken: 30,
                missed_chars: None,
                missed_words: None,
                cadence: None,
            },
            created_at,
        )
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_no_results_no_achievements() {
        assert!(satisfied(&[], &utc()).is_empty());
    }

    #[test]
    fn test_speed_thresholds() {
        let results = vec![result_at(99, 90, noon()), result_at(100, 90, noon())];
        assert_eq!(
            satisfied(&results, &utc()),
            vec![AchievementId::FirstTest, AchievementId::Wpm100Club]
        );

        let results = vec![result_at(130, 100, noon())];
        assert_eq!(
            satisfied(&results, &utc()),
            vec![
                AchievementId::FirstTest,
                AchievementId::AccuracyKing,
                AchievementId::Wpm100Club,
                AchievementId::SpeedDevil,
            ]
        );
    }

    #[test]
    fn test_night_owl_uses_local_hour() {
        // 02:30 UTC is 21:30 the previous day at UTC-5
        let late = Utc.with_ymd_and_hms(2025, 5, 1, 2, 30, 0).unwrap();
        let results: Vec<_> = (0..10).map(|_| result_at(50, 90, late)).collect();

        assert!(satisfied(&results, &utc()).contains(&AchievementId::NightOwl));
        let eastern = FixedOffset::west_opt(5 * 3600).unwrap();
        assert!(!satisfied(&results, &eastern).contains(&AchievementId::NightOwl));

        assert!(!satisfied(&results[..9], &utc()).contains(&AchievementId::NightOwl));
    }

    #[test]
    fn test_already_unlocked_not_repeated() {
        let results = vec![result_at(50, 100, noon())];
        let unlocked = vec![UnlockedAchievement {
            user: "u1".into(),
            achievement_id: AchievementId::FirstTest,
            unlocked_at: noon(),
        }];
        assert_eq!(
            newly_unlocked(&results, &unlocked, &utc()),
            vec![AchievementId::AccuracyKing]
        );
    }
}
