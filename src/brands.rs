//! Brand list resolution.
//!
//! One [`BrandList`] is resolved per run and shared by every batch that
//! references brands. Resolution prefers an external lookup and falls back to
//! a static `(category, market)` table, then to the category's global entry,
//! then to generic placeholders. It never fails.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classifier::Category;
use crate::error::GenerationError;
use crate::generator::{GenerationParams, TextGenerator};
use crate::prompts::brand_lookup_prompt;

pub const MIN_BRAND_CHARS: usize = 3;
pub const MAX_BRAND_CHARS: usize = 49;
pub const MAX_BRANDS: usize = 20;

const PLACEHOLDERS: [&str; 5] = ["Brand A", "Brand B", "Brand C", "Brand D", "Brand E"];

// =============================================================================
// BrandList
// =============================================================================

/// Ordered, de-duplicated, never-empty list of brand names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BrandList(Vec<String>);

impl BrandList {
    pub fn placeholders() -> Self {
        Self(PLACEHOLDERS.iter().map(|s| s.to_string()).collect())
    }

    /// Clean, de-duplicate (case-insensitively) and cap candidate names.
    /// Returns `None` when nothing survives.
    pub fn from_candidates<I, S>(candidates: I, cap: usize) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let names: Vec<String> = candidates
            .into_iter()
            .filter_map(|c| clean_brand_line(c.as_ref()))
            .filter(|name| seen.insert(name.to_lowercase()))
            .take(cap)
            .collect();
        if names.is_empty() {
            None
        } else {
            Some(Self(names))
        }
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// First `n` names (all of them when `n` exceeds the length).
    pub fn top(&self, n: usize) -> &[String] {
        &self.0[..n.min(self.0.len())]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_placeholder(&self) -> bool {
        self.0.iter().map(String::as_str).eq(PLACEHOLDERS.iter().copied())
    }
}

/// Strip list decoration from one line of lookup output.
///
/// List numbering (`1.`, `12)`), bullets and markdown emphasis, repeated.
/// Digits that belong to the name itself ("7-Eleven", "3M") do not match.
static LIST_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\s*(?:\d{1,3}[.)]|[-*•·►–—#]))*\s*").expect("Invalid list prefix regex")
});

/// Leading list numbering, bullets and markdown emphasis are removed, trailing
/// emphasis and punctuation are trimmed. Names outside
/// `MIN_BRAND_CHARS..=MAX_BRAND_CHARS` characters are discarded.
pub fn clean_brand_line(line: &str) -> Option<String> {
    let line = line.trim();
    let prefix = LIST_PREFIX_RE.find(line).map_or(0, |m| m.end());
    let stripped = line[prefix..]
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '_' | ',' | ';' | '.'))
        .trim();
    let len = stripped.chars().count();
    if (MIN_BRAND_CHARS..=MAX_BRAND_CHARS).contains(&len) {
        Some(stripped.to_string())
    } else {
        None
    }
}

// =============================================================================
// Lookup collaborator
// =============================================================================

/// External brand lookup returning newline-delimited names.
#[async_trait]
pub trait BrandLookup: Send + Sync {
    async fn lookup(
        &self,
        category: Category,
        market: &str,
        count: usize,
    ) -> Result<String, GenerationError>;
}

/// Brand lookup backed by the text-generation collaborator.
pub struct GeneratorBrandLookup {
    generator: Arc<dyn TextGenerator>,
    params: GenerationParams,
}

impl GeneratorBrandLookup {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            params: GenerationParams {
                max_output_tokens: 400,
                temperature: 0.2,
            },
        }
    }
}

#[async_trait]
impl BrandLookup for GeneratorBrandLookup {
    async fn lookup(
        &self,
        category: Category,
        market: &str,
        count: usize,
    ) -> Result<String, GenerationError> {
        let prompt = brand_lookup_prompt(category, market, count);
        let out = self
            .generator
            .generate(&prompt.system, &prompt.user, self.params)
            .await?;
        Ok(out.text)
    }
}

// =============================================================================
// Resolver
// =============================================================================

fn default_min_viable() -> usize {
    5
}
fn default_max_brands() -> usize {
    MAX_BRANDS
}
fn default_request_count() -> usize {
    20
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandResolver {
    /// Fewer cleaned lookup results than this falls through to the table.
    #[serde(default = "default_min_viable")]
    pub min_viable: usize,
    #[serde(default = "default_max_brands")]
    pub max_brands: usize,
    /// Number of brands requested from the lookup.
    #[serde(default = "default_request_count")]
    pub request_count: usize,
}

impl Default for BrandResolver {
    fn default() -> Self {
        Self {
            min_viable: default_min_viable(),
            max_brands: default_max_brands(),
            request_count: default_request_count(),
        }
    }
}

impl BrandResolver {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_brands == 0 || self.max_brands > MAX_BRANDS {
            return Err(format!("max_brands must be in 1..={MAX_BRANDS}"));
        }
        if self.min_viable == 0 || self.min_viable > self.max_brands {
            return Err("min_viable must be in 1..=max_brands".to_string());
        }
        if self.request_count == 0 {
            return Err("request_count must be >= 1".to_string());
        }
        Ok(())
    }

    pub async fn resolve(
        &self,
        category: Category,
        market: &str,
        lookup: Option<&dyn BrandLookup>,
    ) -> BrandList {
        if let (Some(lookup), true) = (lookup, category != Category::General) {
            match lookup.lookup(category, market, self.request_count).await {
                Ok(raw) => match BrandList::from_candidates(raw.lines(), self.max_brands) {
                    Some(list) if list.len() >= self.min_viable => {
                        info!(%category, market, brands = list.len(), "brand lookup succeeded");
                        return list;
                    }
                    other => warn!(
                        %category,
                        market,
                        brands = other.map(|l| l.len()).unwrap_or(0),
                        min_viable = self.min_viable,
                        "brand lookup returned too few names, using static table"
                    ),
                },
                Err(e) => warn!(%category, market, error = %e, "brand lookup failed, using static table"),
            }
        }
        self.resolve_static(category, market)
    }

    /// Deterministic fallback: exact market, then the category's global
    /// entry, then placeholders.
    pub fn resolve_static(&self, category: Category, market: &str) -> BrandList {
        let market = normalize_market(market);
        let entry = static_brands(category, &market).or_else(|| static_brands(category, GLOBAL));
        match entry.and_then(|names| BrandList::from_candidates(names.iter(), self.max_brands)) {
            Some(list) => {
                debug!(%category, market, brands = list.len(), "static brand table");
                list
            }
            None => {
                debug!(%category, market, "no static brands, using placeholders");
                BrandList::placeholders()
            }
        }
    }
}

const GLOBAL: &str = "global";

/// Lower-case, trim, and fold demonyms and abbreviations onto country names.
pub fn normalize_market(market: &str) -> String {
    let m = market.trim().to_lowercase();
    match m.as_str() {
        "indian" | "bharat" => "india".into(),
        "us" | "usa" | "u.s." | "american" | "united states of america" => "united states".into(),
        "uk" | "u.k." | "british" | "great britain" | "england" => "united kingdom".into(),
        _ => m,
    }
}

fn static_brands(category: Category, market: &str) -> Option<&'static [&'static str]> {
    let names: &'static [&'static str] = match (category, market) {
        (Category::Automotive, "india") => &[
            // luxury
            "Mercedes-Benz", "BMW", "Audi", "Jaguar", "Land Rover", "Volvo", "Lexus", "Porsche",
            // mass market
            "Maruti Suzuki", "Hyundai", "Tata Motors", "Mahindra",
            // premium
            "Toyota", "Honda", "Skoda", "Volkswagen", "Kia", "BYD",
            // electric
            "Tata Nexon EV", "MG ZS EV", "Hyundai Kona", "Ather", "Ola Electric",
        ],
        (Category::Automotive, "united states") => &[
            "Ford", "Chevrolet", "Toyota", "Honda", "Tesla", "Jeep", "Ram", "GMC", "Nissan",
            "Hyundai", "Subaru", "Kia", "BMW", "Mercedes-Benz", "Lexus",
        ],
        (Category::Automotive, GLOBAL) => &[
            "Toyota", "Volkswagen", "Hyundai", "Honda", "Ford", "BMW", "Mercedes-Benz",
            "Nissan", "Kia", "Tesla", "BYD", "Audi",
        ],
        (Category::Cosmetics, "india") => &[
            "Lakme", "Maybelline", "L'Oreal Paris", "Nykaa Cosmetics", "Sugar Cosmetics",
            "MAC", "Lotus Herbals", "Himalaya", "Mamaearth", "Colorbar", "Biotique",
        ],
        (Category::Cosmetics, GLOBAL) => &[
            "L'Oreal Paris", "Maybelline", "Estee Lauder", "MAC", "Clinique", "Lancome",
            "Nivea", "Dove", "Olay", "Revlon", "Fenty Beauty",
        ],
        (Category::Technology, GLOBAL) => &[
            "Apple", "Samsung", "Google", "Microsoft", "Xiaomi", "OnePlus", "Dell", "Lenovo",
            "Sony", "Asus", "Huawei",
        ],
        (Category::FoodBeverage, "india") => &[
            "Amul", "Britannia", "Parle", "Haldiram's", "Nestle", "ITC", "Tata Consumer",
            "Coca-Cola", "PepsiCo", "Mother Dairy",
        ],
        (Category::FoodBeverage, GLOBAL) => &[
            "Nestle", "PepsiCo", "Coca-Cola", "Unilever", "Danone", "Mondelez", "Kellogg's",
            "Kraft Heinz", "Mars", "Starbucks",
        ],
        (Category::Fashion, GLOBAL) => &[
            "Zara", "H&M", "Uniqlo", "Nike", "Adidas", "Levi's", "Gap", "Puma", "Gucci",
            "Louis Vuitton",
        ],
        (Category::Healthcare, GLOBAL) => &[
            "Pfizer", "Johnson & Johnson", "Novartis", "Roche", "GSK", "Sanofi", "Abbott",
            "Bayer", "AstraZeneca", "Merck",
        ],
        (Category::Finance, "india") => &[
            "HDFC Bank", "ICICI Bank", "State Bank of India", "Axis Bank", "Kotak Mahindra Bank",
            "Paytm", "PhonePe", "Bajaj Finserv", "LIC", "Yes Bank",
        ],
        (Category::Finance, GLOBAL) => &[
            "JPMorgan Chase", "HSBC", "Citi", "Bank of America", "Visa", "Mastercard",
            "American Express", "PayPal", "Barclays", "Allianz",
        ],
        (Category::Travel, GLOBAL) => &[
            "Booking.com", "Expedia", "Airbnb", "Marriott", "Hilton", "Emirates",
            "Singapore Airlines", "TripAdvisor", "Agoda", "Trivago",
        ],
        (Category::Education, GLOBAL) => &[
            "Coursera", "Udemy", "edX", "Khan Academy", "Duolingo", "BYJU'S",
            "Unacademy", "Skillshare", "LinkedIn Learning", "Chegg",
        ],
        _ => return None,
    };
    Some(names)
}
