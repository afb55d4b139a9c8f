//! Nutrition Table
//!
//! Approximate energy density of common ingredients, in kcal per 100 g.
//! Lookup is a best-effort name match, not a food database.

/// Energy density used for ingredients missing from the table
pub const DEFAULT_KCAL_PER_100G: f64 = 100.0;

/// Entries are ordered so longer names precede names they contain
const TABLE: &[(&str, f64)] = &[
    // Proteins
    ("chicken breast", 165.0),
    ("chicken", 165.0),
    ("ground beef", 250.0),
    ("beef", 250.0),
    ("pork", 242.0),
    ("salmon", 208.0),
    ("tuna", 130.0),
    ("fish", 120.0),
    ("eggplant", 25.0),
    ("egg", 155.0),
    ("tofu", 76.0),
    ("ham", 145.0),
    // Carbohydrates
    ("rice", 130.0),
    ("pasta", 131.0),
    ("bread", 265.0),
    ("potato", 77.0),
    ("quinoa", 120.0),
    ("oats", 389.0),
    ("tortilla", 218.0),
    ("flour", 364.0),
    // Vegetables
    ("tomato", 18.0),
    ("onion", 40.0),
    ("garlic", 149.0),
    ("carrot", 41.0),
    ("broccoli", 34.0),
    ("spinach", 23.0),
    ("lettuce", 15.0),
    ("bell pepper", 31.0),
    ("mushroom", 22.0),
    ("zucchini", 17.0),
    // Dairy
    ("milk", 42.0),
    ("cheese", 402.0),
    ("cream", 340.0),
    ("yogurt", 59.0),
    ("butter", 717.0),
    // Oils and fats
    ("olive oil", 884.0),
    ("oil", 884.0),
    ("mayonnaise", 680.0),
    // Legumes
    ("beans", 347.0),
    ("lentils", 116.0),
    ("chickpeas", 164.0),
    // Fruit
    ("apple", 52.0),
    ("banana", 89.0),
    ("orange", 47.0),
    ("lemon", 29.0),
    // Other
    ("sugar", 387.0),
    ("salt", 0.0),
    ("black pepper", 251.0),
    ("chocolate", 546.0),
];

/// Energy density for an ingredient name, or `None` when nothing matches
///
/// An exact name wins; otherwise the first entry where either name contains
/// the other is used.
pub fn kcal_per_100g(name: &str) -> Option<f64> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return None;
    }

    TABLE
        .iter()
        .find(|(key, _)| *key == name)
        .or_else(|| {
            TABLE
                .iter()
                .find(|(key, _)| name.contains(key) || key.contains(name.as_str()))
        })
        .map(|(_, kcal)| *kcal)
}
