//! Keyword-based product category detection.
//!
//! The objective and audience text are lower-cased and joined into one
//! haystack. Every keyword of a category found as a substring adds a fixed
//! weight to that category's score. The strictly highest score wins; on a tie
//! the category declared first in [`Category::ALL`] wins. No match at all
//! yields `(General, 0)`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default score added per matched keyword.
pub const DEFAULT_KEYWORD_WEIGHT: u32 = 2;

/// Largest per-keyword weight a config may set.
pub const MAX_KEYWORD_WEIGHT: u32 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Cosmetics,
    Automotive,
    Technology,
    FoodBeverage,
    Fashion,
    Healthcare,
    Finance,
    Travel,
    Education,
    General,
}

impl Category {
    /// Classifiable categories in tie-break order. `General` is the fallback
    /// and never scored.
    pub const ALL: [Category; 9] = [
        Category::Cosmetics,
        Category::Automotive,
        Category::Technology,
        Category::FoodBeverage,
        Category::Fashion,
        Category::Healthcare,
        Category::Finance,
        Category::Travel,
        Category::Education,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cosmetics => "cosmetics",
            Self::Automotive => "automotive",
            Self::Technology => "technology",
            Self::FoodBeverage => "food_beverage",
            Self::Fashion => "fashion",
            Self::Healthcare => "healthcare",
            Self::Finance => "finance",
            Self::Travel => "travel",
            Self::Education => "education",
            Self::General => "general",
        }
    }

    /// Human-readable label used inside prompts.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Cosmetics => "Cosmetics & Personal Care",
            Self::Automotive => "Automotive",
            Self::Technology => "Technology & Electronics",
            Self::FoodBeverage => "Food & Beverage",
            Self::Fashion => "Fashion & Apparel",
            Self::Healthcare => "Healthcare & Pharma",
            Self::Finance => "Banking & Financial Services",
            Self::Travel => "Travel & Hospitality",
            Self::Education => "Education",
            Self::General => "General Consumer",
        }
    }

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Cosmetics => &[
                "cosmetic", "makeup", "make-up", "skincare", "skin care", "lipstick",
                "foundation", "mascara", "beauty", "fragrance", "perfume", "serum",
            ],
            Self::Automotive => &[
                "automotive", "car", "vehicle", "suv", "sedan", "hatchback", "motorcycle",
                "two-wheeler", "dealership", "electric vehicle",
            ],
            Self::Technology => &[
                "smartphone", "laptop", "software", "gadget", "electronics", "tablet",
                "wearable", "app ", "technology", "cloud",
            ],
            Self::FoodBeverage => &[
                "food", "beverage", "snack", "drink", "restaurant", "dairy", "coffee",
                "juice", "grocery", "cereal",
            ],
            Self::Fashion => &[
                "fashion", "apparel", "clothing", "footwear", "sneaker", "garment",
                "accessories", "handbag",
            ],
            Self::Healthcare => &[
                "healthcare", "hospital", "pharma", "medicine", "clinic", "patient",
                "doctor", "wellness", "diagnostic",
            ],
            Self::Finance => &[
                "bank", "finance", "insurance", "loan", "credit card", "investment",
                "mutual fund", "fintech", "payment",
            ],
            Self::Travel => &[
                "travel", "hotel", "airline", "flight", "tourism", "vacation", "holiday",
                "booking",
            ],
            Self::Education => &[
                "education", "school", "university", "college", "course", "student",
                "e-learning", "tutoring",
            ],
            Self::General => &[],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    /// Sum of matched keyword weights; zero means nothing matched.
    pub confidence: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct CategoryClassifier {
    keyword_weight: u32,
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORD_WEIGHT)
    }
}

impl CategoryClassifier {
    pub fn new(keyword_weight: u32) -> Self {
        Self { keyword_weight }
    }

    pub fn classify(&self, objective: &str, audience: &str) -> Classification {
        let haystack = format!("{} {}", objective.to_lowercase(), audience.to_lowercase());

        let mut best = Classification {
            category: Category::General,
            confidence: 0,
        };
        for category in Category::ALL {
            let score = self.score(category, &haystack);
            // Strictly greater: earlier categories keep ties.
            if score > best.confidence {
                best = Classification {
                    category,
                    confidence: score,
                };
            }
        }
        best
    }

    fn score(&self, category: Category, haystack: &str) -> u32 {
        let matched = category
            .keywords()
            .iter()
            .filter(|kw| haystack.contains(*kw))
            .count() as u32;
        matched.saturating_mul(self.keyword_weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_keywords_is_general_with_zero_confidence() {
        let c = CategoryClassifier::default().classify("Measure sentiment", "Adults 18+");
        assert_eq!(c.category, Category::General);
        assert_eq!(c.confidence, 0);
    }

    #[test]
    fn single_keyword_scores_one_weight() {
        let c = CategoryClassifier::default().classify("Explore hotel preferences", "Adults");
        assert_eq!(c.category, Category::Travel);
        assert_eq!(c.confidence, DEFAULT_KEYWORD_WEIGHT);
    }

    #[test]
    fn huge_weight_saturates_instead_of_overflowing() {
        let c = CategoryClassifier::new(u32::MAX).classify("car vehicle", "suv buyers");
        assert_eq!(c.category, Category::Automotive);
        assert_eq!(c.confidence, u32::MAX);
    }

    #[test]
    fn automotive_objective_beats_stray_matches() {
        let c = CategoryClassifier::default().classify(
            "Automotive brand health tracker for SUV and sedan buyers",
            "High-income car buyers in urban India",
        );
        assert_eq!(c.category, Category::Automotive);
        assert!(c.confidence >= 8, "confidence {}", c.confidence);
    }

    #[test]
    fn ties_go_to_first_declared_category() {
        // "beauty" (cosmetics) and "fashion" (fashion) each score once.
        let c = CategoryClassifier::new(3).classify("beauty and fashion habits", "");
        assert_eq!(c.category, Category::Cosmetics);
        assert_eq!(c.confidence, 3);
    }

    #[test]
    fn classification_is_case_insensitive_and_repeatable() {
        let clf = CategoryClassifier::default();
        let a = clf.classify("BANK account switching", "Millennials");
        let b = clf.classify("BANK account switching", "Millennials");
        assert_eq!(a, b);
        assert_eq!(a.category, Category::Finance);
    }
}
