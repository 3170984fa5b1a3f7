//! Typing speed test: sample texts, keystroke comparison, scoring and the countdown.
//!
//! A word is five correct characters. Scores are rounded to whole numbers.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

const EASY: &[&str] = &[
    "The quick brown fox jumps over the lazy dog. This is a simple test to help you practice typing.",
    "A journey of a thousand miles begins with a single step. Keep practicing every day to improve.",
    "Practice makes perfect. The more you type, the faster you will become at typing.",
    "Every expert was once a beginner. Start slow and focus on accuracy before speed.",
    "Life is like riding a bicycle. To keep your balance you must keep moving forward.",
];

const MEDIUM: &[&str] = &[
    "The advancement of technology has revolutionized the way we communicate and work. From smartphones to cloud computing, innovation continues to shape our daily lives.",
    "Success is not final, failure is not fatal: it is the courage to continue that counts. Winston Churchill spoke these words during a time of great challenge.",
    "In the digital age, typing skills have become essential for productivity. Whether you're writing emails, creating documents, or coding, speed and accuracy matter.",
    "The universe is under no obligation to make sense to you. Science continues to reveal mysteries about the cosmos that challenge our understanding of reality.",
    "Climate change represents one of the greatest challenges facing humanity. Sustainable practices and renewable energy sources are crucial for our planet's future.",
];

const HARD: &[&str] = &[
    "Quantum mechanics describes the behavior of matter and energy at the atomic and subatomic levels, challenging our classical understanding of physics through principles like superposition and entanglement.",
    "Cryptocurrency and blockchain technology have disrupted traditional financial systems, introducing decentralized networks that enable peer-to-peer transactions without intermediaries or centralized authorities.",
    "Artificial intelligence and machine learning algorithms are transforming industries by analyzing vast datasets, recognizing patterns, and making predictions with unprecedented accuracy and efficiency.",
    "The philosophical concept of existentialism emphasizes individual freedom, choice, and responsibility, suggesting that humans define their own meaning in life through their actions and decisions.",
    "Neuroplasticity refers to the brain's ability to reorganize itself by forming new neural connections throughout life, enabling recovery from injury and adaptation to new experiences and learning.",
];

impl Difficulty {
    pub fn samples(&self) -> &'static [&'static str] {
        match self {
            Difficulty::Easy => EASY,
            Difficulty::Medium => MEDIUM,
            Difficulty::Hard => HARD,
        }
    }

    /// Pick a sample text; `seed` wraps around the sample list.
    pub fn sample(&self, seed: usize) -> &'static str {
        let samples = self.samples();
        samples[seed % samples.len()]
    }
}

/// Per-keystroke comparison of typed text against the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub correct: usize,
    pub incorrect: usize,
    pub typed: usize,
    /// Index of the next character to type, `None` once the target is covered.
    pub current: Option<usize>,
    pub complete: bool,
}

/// Compare character by character over the overlapping prefix.
pub fn compare(target: &str, typed: &str) -> Progress {
    let target_len = target.chars().count();
    let typed_len = typed.chars().count();

    let (correct, incorrect) = target
        .chars()
        .zip(typed.chars())
        .fold((0, 0), |(ok, bad), (want, got)| {
            if want == got {
                (ok + 1, bad)
            } else {
                (ok, bad + 1)
            }
        });

    Progress {
        correct,
        incorrect,
        typed: typed_len,
        current: (typed_len < target_len).then_some(typed_len),
        complete: typed_len >= target_len,
    }
}

/// Speed and accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub wpm: u32,
    pub cpm: u32,
    /// Percentage, 100 when nothing has been typed.
    pub accuracy: u32,
}

pub fn stats(correct: usize, typed: usize, elapsed: Duration) -> Stats {
    let minutes = elapsed.as_secs_f64() / 60.0;
    let per_minute = |n: f64| {
        if minutes > 0.0 {
            (n / minutes).round().max(0.0) as u32
        } else {
            0
        }
    };
    let accuracy = if typed > 0 {
        (correct as f64 / typed as f64 * 100.0).round() as u32
    } else {
        100
    };

    Stats {
        wpm: per_minute(correct as f64 / 5.0),
        cpm: per_minute(correct as f64),
        accuracy,
    }
}

/// Performance rating shown with the final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rating {
    pub icon: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

pub fn rating(wpm: u32, accuracy: u32) -> Rating {
    let (icon, title, description) = if accuracy < 80 {
        (
            "📚",
            "Focus on Accuracy",
            "Try to make fewer mistakes. Accuracy is more important than speed!",
        )
    } else if wpm >= 81 {
        (
            "🏆",
            "Expert Typist!",
            "Exceptional! You have mastered the art of typing!",
        )
    } else if wpm >= 61 {
        (
            "🎖️",
            "Excellent Work!",
            "Professional level typing! You are among the best!",
        )
    } else if wpm >= 41 {
        (
            "🌟",
            "Great Progress!",
            "Above average! Your typing skills are solid!",
        )
    } else if wpm >= 21 {
        (
            "👍",
            "Nice Work!",
            "You are making good progress. Keep it up!",
        )
    } else if wpm > 0 {
        (
            "🌱",
            "Keep Practicing!",
            "Every expert started as a beginner. Stay consistent!",
        )
    } else {
        (
            "⭐",
            "Good Job!",
            "Keep practicing to improve your speed!",
        )
    };
    Rating {
        icon,
        title,
        description,
    }
}

/// "1m 30s" from a minute up, "45s" below.
pub fn format_timer(seconds: u64) -> String {
    if seconds >= 60 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{seconds}s")
    }
}

/// Final result of a finished test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestResult {
    pub stats: Stats,
    pub correct: usize,
    pub incorrect: usize,
    pub total_words: usize,
    pub rating: Rating,
    pub share_text: String,
}

impl TestResult {
    pub fn new(progress: Progress, elapsed: Duration) -> Self {
        let stats = stats(progress.correct, progress.typed, elapsed);
        Self {
            stats,
            correct: progress.correct,
            incorrect: progress.incorrect,
            total_words: (progress.correct as f64 / 5.0).round() as usize,
            rating: rating(stats.wpm, stats.accuracy),
            share_text: share_text(stats),
        }
    }
}

fn share_text(stats: Stats) -> String {
    format!(
        "🚀 I just completed a typing speed test!\n\n⚡ WPM: {}\n🎯 Accuracy: {}%\n✏️ CPM: {}\n\nTest your typing speed at All-in-one Pocket!",
        stats.wpm, stats.accuracy, stats.cpm
    )
}

/// Score of one snapshot of a running test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scorecard {
    pub progress: Progress,
    pub stats: Stats,
    /// Whole seconds left on the countdown.
    pub remaining: u64,
    pub timer: String,
    /// Set once the target is fully typed or the countdown has run out.
    pub result: Option<TestResult>,
}

/// Score `typed` against `target` after `elapsed` of a test lasting `duration`.
///
/// Elapsed time is capped at the test duration.
pub fn score(target: &str, typed: &str, elapsed: Duration, duration: Duration) -> Scorecard {
    let elapsed = elapsed.min(duration);
    let progress = compare(target, typed);
    let remaining = duration.saturating_sub(elapsed).as_secs();
    let finished = progress.complete || remaining == 0;

    Scorecard {
        progress,
        stats: stats(progress.correct, progress.typed, elapsed),
        remaining,
        timer: format_timer(remaining),
        result: finished.then(|| TestResult::new(progress, elapsed)),
    }
}
