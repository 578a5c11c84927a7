//! Built-in gallery used when no stored candidate list is usable.

use crate::model::candidate::Candidate;

struct SeedEntry {
    id: &'static str,
    name: &'static str,
    image_url: &'static str,
    votes: u64,
    description: &'static str,
    tags: [&'static str; 3],
    age_ms: i64,
    vibe_score: u8,
    ai_critique: &'static str,
}

const SEED_ENTRIES: [SeedEntry; 3] = [
    SeedEntry {
        id: "1",
        name: "The Adventurer",
        image_url: "https://picsum.photos/seed/adventure/800/600",
        votes: 42,
        description: "Caught in the wild, seeking the next summit.",
        tags: ["Nature", "Epic", "Outdoor"],
        age_ms: 1_000_000,
        vibe_score: 92,
        ai_critique: "This shot perfectly captures the essence of wandering souls. The lighting suggests a dawn of new possibilities.",
    },
    SeedEntry {
        id: "2",
        name: "Urban Echo",
        image_url: "https://picsum.photos/seed/urban/800/600",
        votes: 28,
        description: "The city never sleeps, and neither does the style.",
        tags: ["City", "Modern", "Style"],
        age_ms: 2_000_000,
        vibe_score: 88,
        ai_critique: "Geometric precision meets street energy. A masterclass in modern composition.",
    },
    SeedEntry {
        id: "3",
        name: "Quiet Coffee",
        image_url: "https://picsum.photos/seed/coffee/800/600",
        votes: 56,
        description: "Simple moments are the most profound.",
        tags: ["Minimalist", "Cozy", "Interior"],
        age_ms: 500_000,
        vibe_score: 95,
        ai_critique: "The warmth is palpable. This image evokes a sense of peace that is rarely captured so effectively.",
    },
];

/// Returns the seed gallery with timestamps relative to `now_ms`.
pub fn seed_candidates(now_ms: i64) -> Vec<Candidate> {
    SEED_ENTRIES
        .iter()
        .map(|entry| Candidate {
            id: entry.id.to_string(),
            name: entry.name.to_string(),
            image_url: entry.image_url.to_string(),
            votes: entry.votes,
            description: entry.description.to_string(),
            vibe_score: Some(entry.vibe_score),
            ai_critique: Some(entry.ai_critique.to_string()),
            tags: entry.tags.iter().map(|tag| (*tag).to_string()).collect(),
            timestamp: now_ms - entry.age_ms,
        })
        .collect()
}
