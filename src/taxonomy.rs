//! Fixed curriculum-theme taxonomy used by the theme-classification stage.
//!
//! The taxonomy is an ordered, immutable list of labels. It has no lookup
//! semantics of its own; it exists only to be enumerated inside the
//! classification prompt so the model can pick the matching theme.

/// The full set of curriculum themes, in canonical order.
pub const CURRICULUM_THEMES: [&str; 85] = [
    "Communication in the family",
    "Communication in the community",
    "Listening and speaking for everyday life",
    "Reading for information and pleasure",
    "Writing for practical purposes",
    "Storytelling and oral tradition",
    "Media and information awareness",
    "Numbers in daily transactions",
    "Measurement in the home",
    "Money and budgeting",
    "Geometry in the environment",
    "Patterns and sequences",
    "Data handling and simple statistics",
    "Fractions in everyday situations",
    "Time and scheduling",
    "Science in human activities and occupation",
    "The human body and its care",
    "Food and nutrition",
    "Water and its uses",
    "Air and weather",
    "Plants in the environment",
    "Animals in the environment",
    "Matter and materials",
    "Energy in the home",
    "Light and sound",
    "Forces and simple machines",
    "Earth and space",
    "Health and sanitation",
    "Disease prevention",
    "First aid and safety",
    "Personal hygiene",
    "Reproductive health and responsible parenthood",
    "Substance abuse awareness",
    "Mental and emotional well-being",
    "Family life and relationships",
    "Roles and responsibilities in the community",
    "Citizenship and governance",
    "Rights and duties of citizens",
    "Laws and public order",
    "National identity and heritage",
    "Cultural diversity and tolerance",
    "Historical events and their lessons",
    "Geography of the local community",
    "Population and migration",
    "Work ethics and values",
    "Livelihood and income generation",
    "Entrepreneurship and small business",
    "Agriculture and food production",
    "Fishing and aquatic resources",
    "Handicrafts and cottage industries",
    "Consumer rights and protection",
    "Saving and investment",
    "Taxes and public finance",
    "Banking and financial services",
    "Employment and job seeking",
    "Occupational safety",
    "Technology in the workplace",
    "Computers and digital literacy",
    "The internet and online safety",
    "Communication technology",
    "Transportation systems",
    "Environmental conservation",
    "Waste management and recycling",
    "Climate change and its effects",
    "Natural resources and their management",
    "Disaster preparedness",
    "Pollution and its prevention",
    "Biodiversity and ecosystems",
    "Sustainable development",
    "Peace and conflict resolution",
    "Gender equality",
    "Respect for elders and authority",
    "Honesty and integrity",
    "Cooperation and teamwork",
    "Self-reliance and independence",
    "Critical thinking and problem solving",
    "Decision making in daily life",
    "Goal setting and personal development",
    "Leadership in the community",
    "Volunteerism and civic participation",
    "Arts and creative expression",
    "Music and performance",
    "Sports, games, and physical fitness",
    "Travel and global awareness",
    "Lifelong learning",
];

/// Render the taxonomy as a numbered list for embedding in a prompt.
pub fn numbered_theme_list() -> String {
    let mut list = String::with_capacity(4096);
    for (index, theme) in CURRICULUM_THEMES.iter().enumerate() {
        list.push_str(&format!("{}. {}\n", index + 1, theme));
    }
    list
}
