//! Training insights: weak/strong areas, struggled keys and accuracy advice.

use serde::Serialize;

use crate::models::{Category, MissFrequency, TypingResult};

/// How many struggled letters/words are reported.
pub const STRUGGLED_TOP_N: usize = 3;

/// Per-category mean WPM relative to the user's overall average.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDelta {
    pub category: Category,
    pub mean_wpm: f64,
    pub delta: f64,
}

/// Outcome of weak/strong-area inference.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AreaInference {
    pub weakest: Option<Category>,
    pub strongest: Option<Category>,
    /// Deltas in order of each category's first appearance.
    pub deltas: Vec<CategoryDelta>,
}

/// Group results by category and compare each category's mean WPM with
/// `avg_wpm`. Ties go to the category seen first in `results`.
pub fn infer_areas(results: &[TypingResult], avg_wpm: u32) -> AreaInference {
    let mut groups: Vec<(Category, u64, u64)> = Vec::new();
    for r in results {
        match groups.iter_mut().find(|(c, _, _)| *c == r.category) {
            Some((_, total, count)) => {
                *total += r.wpm() as u64;
                *count += 1;
            }
            None => groups.push((r.category, r.wpm() as u64, 1)),
        }
    }

    let mut inference = AreaInference::default();
    let mut lowest = f64::INFINITY;
    let mut highest = f64::NEG_INFINITY;
    for (category, total, count) in groups {
        let mean_wpm = total as f64 / count as f64;
        let delta = mean_wpm - avg_wpm as f64;
        if delta < lowest {
            lowest = delta;
            inference.weakest = Some(category);
        }
        if delta > highest {
            highest = delta;
            inference.strongest = Some(category);
        }
        inference.deltas.push(CategoryDelta {
            category,
            mean_wpm,
            delta,
        });
    }
    inference
}

/// Sum several frequency maps.
pub fn merge_frequencies<'a, I>(maps: I) -> MissFrequency
where
    I: IntoIterator<Item = &'a MissFrequency>,
{
    let mut merged = MissFrequency::new();
    for map in maps {
        for (key, count) in map {
            *merged.entry(key.clone()).or_insert(0) += count;
        }
    }
    merged
}

/// Keys with the highest counts, ties in key order.
pub fn top_n(frequencies: &MissFrequency, n: usize) -> Vec<String> {
    let mut entries: Vec<(&String, &u32)> = frequencies.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1));
    entries.into_iter().take(n).map(|(k, _)| k.clone()).collect()
}

/// User-facing insight block of the stats snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingInsights {
    pub weakest_area: String,
    pub strongest_area: String,
    pub accuracy_insight: String,
    pub recommendation: String,
    pub suggested_challenge: String,
    pub struggled_letters: Vec<String>,
    pub struggled_words: Vec<String>,
}

impl Default for TrainingInsights {
    /// Shown until the user has enough results.
    fn default() -> Self {
        Self {
            weakest_area: "Not enough data".to_string(),
            strongest_area: "Keep practicing!".to_string(),
            accuracy_insight: "Play more to get insights on your precision.".to_string(),
            recommendation:
                "Take a few more tests across different modes to get personalized insights!"
                    .to_string(),
            suggested_challenge: "/challenge".to_string(),
            struggled_letters: Vec::new(),
            struggled_words: Vec::new(),
        }
    }
}

fn strong_area_label(category: Option<Category>) -> &'static str {
    match category {
        Some(Category::Developer) => "Developer Snippets",
        Some(Category::Paragraph) => "Paragraph Endurance",
        Some(Category::Standard) => "Standard Reflexes",
        Some(Category::Daily) => "Daily Global",
        _ => "Consistency",
    }
}

/// Label, recommendation and suggested route for the weakest category.
fn weak_area_advice(category: Category) -> (&'static str, &'static str, &'static str) {
    match category {
        Category::Developer => (
            "Developer Snippets",
            "You're dropping speed on special characters and symbols. Practice the Developer mode specifically to build muscle memory for brackets, semi-colons, and syntax format.",
            "/challenge/developer",
        ),
        Category::Paragraph => (
            "Paragraph Endurance",
            "Your endurance is wavering on longer prose. Start focusing on rhythm rather than raw speed bursts. Run the Paragraph challenge daily.",
            "/challenge/paragraph",
        ),
        Category::Standard => (
            "Standard Reflexes",
            "Your raw reflex speed on random words is holding you back. Warm up with 5 quick Standard tests to increase baseline input speed.",
            "/challenge/standard",
        ),
        Category::Daily | Category::Custom => (
            "Global Modifiers",
            "You're performing well consistently, but you can push deeper on the daily challenges to compete with the globe.",
            "/challenge/daily",
        ),
    }
}

pub fn accuracy_insight(mean_accuracy: f64) -> String {
    if mean_accuracy < 90.0 {
        format!(
            "Your overall accuracy is {:.1}%. You are rushing! Slow down to build accuracy, and speed will follow naturally.",
            mean_accuracy
        )
    } else if mean_accuracy < 95.0 {
        format!(
            "Solid precision at {:.1}%. Aim for 96%+ to eliminate time wasted on backspaces.",
            mean_accuracy
        )
    } else {
        format!(
            "Incredible precision ({:.1}%). You are ready to start pushing your raw speed to the absolute limit.",
            mean_accuracy
        )
    }
}

/// Build the insight block from a non-empty history.
pub fn training_insights(results: &[TypingResult], avg_wpm: u32) -> TrainingInsights {
    let mut insights = TrainingInsights::default();
    if results.is_empty() {
        return insights;
    }

    let letters = merge_frequencies(results.iter().filter_map(|r| r.metrics.missed_chars.as_ref()));
    let words = merge_frequencies(results.iter().filter_map(|r| r.metrics.missed_words.as_ref()));
    insights.struggled_letters = top_n(&letters, STRUGGLED_TOP_N);
    insights.struggled_words = top_n(&words, STRUGGLED_TOP_N);

    let areas = infer_areas(results, avg_wpm);
    insights.strongest_area = strong_area_label(areas.strongest).to_string();
    if let Some(weakest) = areas.weakest {
        let (label, recommendation, route) = weak_area_advice(weakest);
        insights.weakest_area = label.to_string();
        insights.recommendation = recommendation.to_string();
        insights.suggested_challenge = route.to_string();
    }

    if !insights.struggled_letters.is_empty() {
        let keys: Vec<String> = insights
            .struggled_letters
            .iter()
            .map(|l| format!("'{}'", l))
            .collect();
        insights.recommendation.push_str(&format!(
            " Watch your accuracy on the specific keys: {}.",
            keys.join(", ")
        ));
    }

    let mean_accuracy =
        results.iter().map(|r| r.accuracy() as f64).sum::<f64>() / results.len() as f64;
    insights.accuracy_insight = accuracy_insight(mean_accuracy);
    insights
}
