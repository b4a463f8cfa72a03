//! Fixed word tables shared by the scoring engine and the difficulty
//! analyzer. These are lookup tables, not learned vocabularies; the
//! entries come from the AI-art prompt corpus the game ships with.

/// Semantic categories used for the category bonus. A category counts
/// when both the target and the attempt contain at least one of its
/// words.
pub const SEMANTIC_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "people",
        &[
            "person", "man", "woman", "child", "boy", "girl", "people", "character", "figure",
            "human", "guy", "lady",
        ],
    ),
    (
        "actions",
        &[
            "standing", "sitting", "walking", "running", "jumping", "climbing", "eating",
            "drinking", "playing", "working", "holding", "carrying", "wearing", "looking",
            "smiling", "laughing", "throwing", "leaning", "selling",
        ],
    ),
    (
        "objects",
        &[
            "car", "vehicle", "house", "building", "tree", "mountain", "road", "path", "table",
            "chair", "book", "phone", "umbrella", "frisbee", "clock", "apple", "train", "laptop",
            "fence", "plant", "sand",
        ],
    ),
    (
        "styles",
        &[
            "painting", "drawing", "photograph", "photo", "render", "3d", "vector", "digital",
            "oil", "watercolor", "sketch", "claymation", "style",
        ],
    ),
    (
        "colors",
        &[
            "red", "blue", "green", "yellow", "black", "white", "colorful", "bright", "dark",
            "light", "golden", "silver", "brown", "purple", "orange", "pink", "gray", "grey",
        ],
    ),
    (
        "settings",
        &[
            "indoor", "outdoor", "street", "park", "forest", "city", "village", "beach",
            "mountain", "desert", "town", "factory", "bar", "cabin", "spaceship",
        ],
    ),
    (
        "time",
        &[
            "day", "night", "morning", "evening", "sunny", "cloudy", "rainy", "snowy", "foggy",
            "old", "fashioned",
        ],
    ),
];

/// Descriptive adjectives that earn the creativity bonus.
pub const DESCRIPTIVE_ADJECTIVES: &[&str] = &[
    "vibrant",
    "ethereal",
    "dramatic",
    "surreal",
    "whimsical",
    "majestic",
    "serene",
    "mysterious",
    "glowing",
    "ancient",
    "dreamy",
    "vivid",
    "elegant",
    "striking",
    "moody",
];

/// Art-technique vocabulary for the technical-term bonus (+2 per term
/// present in both prompts).
pub const TECHNICAL_TERMS: &[&str] = &[
    "watercolor",
    "oil",
    "acrylic",
    "render",
    "3d",
    "vector",
    "digital",
    "dslr",
    "fisheye",
    "macro",
    "claymation",
    "sketch",
    "charcoal",
    "pastel",
    "panorama",
    "portrait",
    "caricature",
    "pixel",
    "isometric",
    "cinematic",
];

// Difficulty analyzer keyword bands.

pub const COMPLEXITY_EASY: &[&str] = &[
    "photo", "image", "picture", "simple", "basic", "clear", "cute", "young", "standing",
    "sitting",
];

pub const COMPLEXITY_MEDIUM: &[&str] = &[
    "style", "art", "painting", "drawing", "render", "design", "fashion", "show", "old",
    "fashioned", "photograph",
];

pub const COMPLEXITY_HARD: &[&str] = &[
    "installation", "claymation", "fisheye", "dslr", "rembrandt", "vector", "3d", "barbershop",
    "microtome", "cyprinodont", "tenement", "caricature", "piece",
];

pub const ART_STYLES_EASY: &[&str] = &["photo", "image"];
pub const ART_STYLES_MEDIUM: &[&str] = &["painting", "drawing", "render"];
pub const ART_STYLES_HARD: &[&str] = &[
    "rembrandt",
    "claymation",
    "vector",
    "dslr",
    "fisheye",
    "installation",
];

pub const ABSTRACT_EASY: &[&str] = &["standing", "sitting", "walking", "holding"];
pub const ABSTRACT_MEDIUM: &[&str] = &["fashion", "dangerous", "elastic", "frightening"];
pub const ABSTRACT_HARD: &[&str] = &["installation", "cyprinodont", "tenement", "microtome"];

/// Proper names that appear in the prompt corpus; used by the
/// named-entity count alongside the capitalization heuristic.
pub const KNOWN_NAMES: &[&str] = &[
    "henry",
    "viii",
    "mulder",
    "krusty",
    "dredd",
    "eddard",
    "stark",
    "rembrandt",
    "riesling",
    "hoopoe",
    "hamburglar",
    "antonio",
    "salieri",
    "britney",
    "spears",
];
