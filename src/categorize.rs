//! Health category tagging
//!
//! Products are tagged by plain keyword containment against their name and
//! description. Matching is case-insensitive and exact: no stemming, no fuzzy
//! matching.

/// Tag table: each tag with the substrings that trigger it
pub const HEALTH_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "immune-support",
        &["immune", "immunity", "echinacea", "elderberry", "vitamin c", "zinc", "astragalus"],
    ),
    (
        "digestive-health",
        &["digest", "probiotic", "prebiotic", "gut", "fiber", "fibre", "peppermint", "ginger"],
    ),
    (
        "sleep-relaxation",
        &["sleep", "melatonin", "chamomile", "valerian", "relax", "calm", "lavender"],
    ),
    (
        "stress-mood",
        &["stress", "ashwagandha", "mood", "anxiety", "adaptogen", "rhodiola", "st john"],
    ),
    (
        "energy-vitality",
        &["energy", "ginseng", "vitamin b12", "b-complex", "maca", "guarana", "fatigue"],
    ),
    (
        "heart-health",
        &["heart", "cardio", "omega-3", "omega 3", "cholesterol", "coq10", "blood pressure"],
    ),
    (
        "joint-bone",
        &["joint", "glucosamine", "chondroitin", "bone", "calcium", "turmeric", "curcumin"],
    ),
    (
        "skin-hair-nails",
        &["skin", "hair", "nail", "biotin", "collagen", "hyaluronic"],
    ),
    (
        "detox-cleanse",
        &["detox", "cleanse", "milk thistle", "dandelion", "liver support"],
    ),
    (
        "weight-management",
        &["weight loss", "weight management", "metabolism", "appetite", "garcinia"],
    ),
    (
        "womens-health",
        &["women", "menopause", "prenatal", "cranberry"],
    ),
    ("mens-health", &["for men", "prostate", "saw palmetto", "testosterone"]),
    (
        "brain-focus",
        &["brain", "memory", "focus", "cognitive", "ginkgo", "lion's mane"],
    ),
];

/// Tags a product from its name and description
///
/// Tags come back in table order with no duplicates; a product may receive no
/// tag at all.
///
/// # Examples
///
/// ```
/// use shelf_sweep::categorize::categorize;
///
/// let tags = categorize("Chamomile Sleep Tea", "A calming blend with ginger.");
/// assert_eq!(tags, vec!["digestive-health", "sleep-relaxation"]);
/// ```
pub fn categorize(name: &str, description: &str) -> Vec<String> {
    let haystack = format!("{} {}", name, description).to_lowercase();

    HEALTH_CATEGORIES
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| haystack.contains(k)))
        .map(|(tag, _)| tag.to_string())
        .collect()
}
