//! Built-in challenge texts.

use chrono::{Datelike, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{Category, Challenge, EntityId};

const STANDARD: &[&str] = &["abcdefghijklmnopqrstuvwxyzabcdefghijklmnopqrstuvwxyz"];

const PARAGRAPH: &[&str] = &[
    "The quick brown fox jumps over the lazy dog. A journey of a thousand miles begins with a single step. To be or not to be, that is the question. All that glitters is not gold.",
    "Success is not final, failure is not fatal: it is the courage to continue that counts. In the middle of every difficulty lies opportunity. Believe you can and you're halfway there.",
    "Happiness depends upon ourselves. It is not something ready made. It comes from your own actions. The purpose of our lives is to be happy. Life is what happens when you're busy.",
];

const DEVELOPER: &[&str] = &[
    "const handleUpload = async (file: File) => {\n  if (!file) return null;\n  const formData = new FormData();\n  formData.append('data', file);\n  return await api.post('/upload');\n};",
    "function debounce(func: Function, wait: number) {\n  let timeout: NodeJS.Timeout;\n  return function executedFunction(...args: any[]) {\n    const later = () => {\n      clearTimeout();\n    };\n  };\n}",
    "class Singleton {\n  private static instance: Singleton;\n  private constructor() { }\n  public static getInstance(): Singleton {\n    if (!Singleton.instance) {\n      Singleton.instance;\n    }\n  }\n}",
];

const DAILY: &[&str] = &[
    "Welcome to the daily keysprint challenge. This text changes exactly once every twenty-four hours for all users across the entire globe. Compete to lock in the fastest time today.",
    "The daily sprint tests your consistency. Every day presents a new sequence of characters to master. Can you maintain your position at the top of the leaderboard against the world?",
    "Another day, another challenge. Focus your mind, steady your hands, and prepare to type. The path to perfection is paved with daily practice and unrelenting determination to win.",
];

/// Built-in texts for a category. Custom challenges live in the record store.
pub fn texts(category: Category) -> &'static [&'static str] {
    match category {
        Category::Standard => STANDARD,
        Category::Paragraph => PARAGRAPH,
        Category::Developer => DEVELOPER,
        Category::Daily => DAILY,
        Category::Custom => &[],
    }
}

/// Index of the daily text for a calendar date; identical for every user that day.
pub fn daily_index(date: NaiveDate, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let seed = date.year() as i64 * 10_000 + date.month() as i64 * 100 + date.day() as i64;
    seed.rem_euclid(len as i64) as usize
}

fn builtin(category: Category, content: &str) -> Challenge {
    Challenge {
        id: EntityId::generate(&[category.as_str(), content]),
        category,
        name: category.display_name().to_string(),
        content: content.to_string(),
    }
}

/// Choose a built-in challenge for a fresh attempt.
pub fn pick<R: Rng + ?Sized>(
    category: Category,
    today: NaiveDate,
    rng: &mut R,
) -> Option<Challenge> {
    let candidates = texts(category);
    if candidates.is_empty() {
        return None;
    }
    let content = if category == Category::Daily {
        candidates[daily_index(today, candidates.len())]
    } else {
        *candidates.choose(rng)?
    };
    Some(builtin(category, content))
}

/// Choose the challenge for a "try again", avoiding an immediate repeat
/// when the category has more than one candidate.
pub fn pick_next<R: Rng + ?Sized>(
    category: Category,
    current: &str,
    today: NaiveDate,
    rng: &mut R,
) -> Option<Challenge> {
    if !category.is_randomized() {
        return pick(category, today, rng);
    }
    let candidates = texts(category);
    let pool: Vec<&&str> = if candidates.len() > 1 {
        candidates.iter().filter(|t| **t != current).collect()
    } else {
        candidates.iter().collect()
    };
    let content = pool.choose(rng)?;
    Some(builtin(category, content))
}
