use serde::{Deserialize, Serialize};

/// The closed set of business categories the platform understands.
///
/// Detection is substring matching over lowercased free text. Anything that
/// matches no keyword falls back to `Service`, so every request maps into
/// this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    Restaurant,
    Retail,
    Service,
}

/// Keyword table for business-type detection. English and Hindi terms,
/// matching what customers actually type.
const RESTAURANT_KEYWORDS: &[&str] = &[
    "restaurant",
    "cafe",
    "dhaba",
    "bakery",
    "food",
    "kitchen",
    "catering",
    "रेस्टोरेंट",
    "खाना",
    "ढाबा",
];

const RETAIL_KEYWORDS: &[&str] = &[
    "shop",
    "store",
    "retail",
    "kirana",
    "boutique",
    "mart",
    "grocery",
    "electronics",
    "दुकान",
    "स्टोर",
];

const SERVICE_KEYWORDS: &[&str] = &[
    "salon",
    "repair",
    "clinic",
    "consult",
    "tuition",
    "coaching",
    "agency",
    "सेवा",
    "सैलून",
];

impl BusinessType {
    /// Detect the business type from free text. Restaurant keywords win over
    /// retail, retail over service; no match defaults to `Service`.
    pub fn detect(text: &str) -> Self {
        let lower = text.to_lowercase();
        if RESTAURANT_KEYWORDS.iter().any(|k| lower.contains(k)) {
            BusinessType::Restaurant
        } else if RETAIL_KEYWORDS.iter().any(|k| lower.contains(k)) {
            BusinessType::Retail
        } else if SERVICE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            BusinessType::Service
        } else {
            BusinessType::Service
        }
    }

    /// Stable label used in envelopes and template lookups.
    pub fn label(&self) -> &'static str {
        match self {
            BusinessType::Restaurant => "restaurant",
            BusinessType::Retail => "retail",
            BusinessType::Service => "service",
        }
    }
}

/// Market tier driving pricing multipliers and platform suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketTier {
    Tier1,
    Tier2,
    Tier3,
}

/// Resolved market context for a request: where the business operates and
/// how responses should be localized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub city: String,
    pub country: String,
    pub tier: MarketTier,
    pub currency: String,
    pub currency_symbol: String,
    pub language: String,
}

/// City table: (keyword, city, ISO country, tier). First match wins.
const CITIES: &[(&str, &str, &str, MarketTier)] = &[
    ("mumbai", "Mumbai", "IN", MarketTier::Tier1),
    ("delhi", "Delhi", "IN", MarketTier::Tier1),
    ("bangalore", "Bangalore", "IN", MarketTier::Tier1),
    ("bengaluru", "Bangalore", "IN", MarketTier::Tier1),
    ("pune", "Pune", "IN", MarketTier::Tier2),
    ("jaipur", "Jaipur", "IN", MarketTier::Tier2),
    ("lucknow", "Lucknow", "IN", MarketTier::Tier3),
    ("new york", "New York", "US", MarketTier::Tier1),
    ("san francisco", "San Francisco", "US", MarketTier::Tier1),
    ("london", "London", "UK", MarketTier::Tier1),
    ("dubai", "Dubai", "AE", MarketTier::Tier1),
    ("singapore", "Singapore", "SG", MarketTier::Tier1),
];

/// Country fallbacks when no city keyword matches.
const COUNTRIES: &[(&str, &str, MarketTier)] = &[
    ("india", "IN", MarketTier::Tier2),
    ("usa", "US", MarketTier::Tier1),
    ("united states", "US", MarketTier::Tier1),
    ("uk", "UK", MarketTier::Tier1),
    ("uae", "AE", MarketTier::Tier1),
];

fn currency_for(country: &str) -> (&'static str, &'static str) {
    match country {
        "IN" => ("INR", "₹"),
        "US" => ("USD", "$"),
        "UK" => ("GBP", "£"),
        "AE" => ("AED", "د.إ"),
        "SG" => ("SGD", "S$"),
        _ => ("USD", "$"),
    }
}

fn language_for(country: &str) -> &'static str {
    match country {
        "IN" => "hi-en",
        "AE" => "ar-en",
        _ => "en",
    }
}

impl Market {
    /// Detect the market from free text. Falls back to the default Indian
    /// Tier-2 market when nothing matches, matching the platform's original
    /// home market.
    pub fn detect(text: &str) -> Self {
        let lower = text.to_lowercase();

        for (keyword, city, country, tier) in CITIES {
            if lower.contains(keyword) {
                return Market::new(city, country, *tier);
            }
        }
        for (keyword, country, tier) in COUNTRIES {
            if lower.contains(keyword) {
                return Market::new("", country, *tier);
            }
        }
        Market::default()
    }

    fn new(city: &str, country: &str, tier: MarketTier) -> Self {
        let (currency, symbol) = currency_for(country);
        Self {
            city: city.to_string(),
            country: country.to_string(),
            tier,
            currency: currency.to_string(),
            currency_symbol: symbol.to_string(),
            language: language_for(country).to_string(),
        }
    }
}

impl Default for Market {
    fn default() -> Self {
        Market::new("", "IN", MarketTier::Tier2)
    }
}

/// Monthly pricing packages for a market, in the market's currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTier {
    pub tier: MarketTier,
    pub country_multiplier: f64,
    pub starter_monthly: u64,
    pub growth_monthly: u64,
    pub premium_monthly: u64,
}

impl PricingTier {
    /// Base packages are INR Tier-2 figures; tier and country scale them.
    pub fn for_market(market: &Market) -> Self {
        let tier_multiplier = match market.tier {
            MarketTier::Tier1 => 1.5,
            MarketTier::Tier2 => 1.0,
            MarketTier::Tier3 => 0.7,
        };
        let country_multiplier = match market.country.as_str() {
            "US" => 4.0,
            "UK" => 3.5,
            "AE" => 2.5,
            "SG" => 2.5,
            _ => 1.0,
        };
        let scale = |base: f64| (base * tier_multiplier * country_multiplier).round() as u64;
        Self {
            tier: market.tier,
            country_multiplier,
            starter_monthly: scale(2999.0),
            growth_monthly: scale(7999.0),
            premium_monthly: scale(14999.0),
        }
    }
}

/// Festival keyword table: (keyword, canonical name). Marketing routing and
/// campaign content attach festival context when one is mentioned.
const FESTIVALS: &[(&str, &str)] = &[
    ("diwali", "Diwali"),
    ("दिवाली", "Diwali"),
    ("holi", "Holi"),
    ("होली", "Holi"),
    ("navratri", "Navratri"),
    ("raksha bandhan", "Raksha Bandhan"),
    ("rakhi", "Raksha Bandhan"),
    ("eid", "Eid"),
    ("christmas", "Christmas"),
];

/// Detect a festival mention in free text.
pub fn detect_festival(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    FESTIVALS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, name)| *name)
}

/// The single source of business context shared by every agent. Derived once
/// per request instead of re-detected inside each agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub name: String,
    pub business_type: BusinessType,
    pub market: Market,
    pub pricing: PricingTier,
}

impl BusinessProfile {
    pub fn derive(name: Option<&str>, type_hint: Option<&str>, description: &str) -> Self {
        // An explicit business_type field wins over description keywords.
        let business_type = match type_hint {
            Some(hint) if !hint.is_empty() => BusinessType::detect(hint),
            _ => BusinessType::detect(description),
        };
        let market = Market::detect(description);
        let pricing = PricingTier::for_market(&market);
        Self {
            name: name.unwrap_or("your business").to_string(),
            business_type,
            market,
            pricing,
        }
    }

    /// Substitution variables for the content template engine.
    pub fn template_vars(&self) -> Vec<(&'static str, String)> {
        let location = if self.market.city.is_empty() {
            self.market.country.clone()
        } else {
            self.market.city.clone()
        };
        vec![
            ("business_name", self.name.clone()),
            ("business_type", self.business_type.label().to_string()),
            ("location", location),
            ("currency", self.market.currency_symbol.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_restaurant_keywords() {
        for text in ["a small restaurant", "Open a CAFE in town", "मेरा ढाबा"] {
            assert_eq!(BusinessType::detect(text), BusinessType::Restaurant);
        }
    }

    #[test]
    fn detect_retail_keywords() {
        for text in ["kirana shop", "electronics store", "मेरी दुकान"] {
            assert_eq!(BusinessType::detect(text), BusinessType::Retail);
        }
    }

    #[test]
    fn detect_service_keywords() {
        for text in ["beauty salon", "mobile repair", "coaching center"] {
            assert_eq!(BusinessType::detect(text), BusinessType::Service);
        }
    }

    #[test]
    fn detect_always_lands_in_closed_set() {
        // Every supported keyword — and unknown text — maps into the set.
        let samples = [
            "restaurant",
            "shop",
            "salon",
            "quantum flux emporium",
            "",
        ];
        for text in samples {
            let t = BusinessType::detect(text);
            assert!(matches!(
                t,
                BusinessType::Restaurant | BusinessType::Retail | BusinessType::Service
            ));
        }
    }

    #[test]
    fn detect_unknown_defaults_to_service() {
        assert_eq!(BusinessType::detect("something else"), BusinessType::Service);
    }

    #[test]
    fn restaurant_beats_retail_on_mixed_text() {
        // "food store" contains both a restaurant and a retail keyword.
        assert_eq!(BusinessType::detect("food store"), BusinessType::Restaurant);
    }

    #[test]
    fn market_detects_tier1_city() {
        let m = Market::detect("open a cafe in Mumbai");
        assert_eq!(m.city, "Mumbai");
        assert_eq!(m.country, "IN");
        assert_eq!(m.tier, MarketTier::Tier1);
        assert_eq!(m.currency, "INR");
        assert_eq!(m.language, "hi-en");
    }

    #[test]
    fn market_detects_country_without_city() {
        let m = Market::detect("expand across the USA");
        assert_eq!(m.country, "US");
        assert!(m.city.is_empty());
        assert_eq!(m.currency, "USD");
    }

    #[test]
    fn market_defaults_when_unknown() {
        let m = Market::detect("no location here");
        assert_eq!(m, Market::default());
        assert_eq!(m.country, "IN");
        assert_eq!(m.tier, MarketTier::Tier2);
    }

    #[test]
    fn pricing_scales_by_tier_and_country() {
        let tier1_us = PricingTier::for_market(&Market::detect("New York"));
        let tier2_in = PricingTier::for_market(&Market::default());
        assert!(tier1_us.starter_monthly > tier2_in.starter_monthly);
        assert_eq!(tier2_in.country_multiplier, 1.0);
        assert_eq!(tier2_in.starter_monthly, 2999);
    }

    #[test]
    fn profile_explicit_type_hint_wins() {
        let p = BusinessProfile::derive(
            Some("Sharma Foods"),
            Some("retail"),
            "restaurant in Pune",
        );
        assert_eq!(p.business_type, BusinessType::Retail);
        assert_eq!(p.market.city, "Pune");
    }

    #[test]
    fn profile_template_vars_include_name_and_location() {
        let p = BusinessProfile::derive(None, None, "salon in Jaipur");
        let vars = p.template_vars();
        assert!(vars.iter().any(|(k, v)| *k == "business_name" && v == "your business"));
        assert!(vars.iter().any(|(k, v)| *k == "location" && v == "Jaipur"));
    }

    #[test]
    fn festival_detection() {
        assert_eq!(detect_festival("Diwali sale campaign"), Some("Diwali"));
        assert_eq!(detect_festival("होली offers"), Some("Holi"));
        assert_eq!(detect_festival("plain campaign"), None);
    }

    #[test]
    fn business_type_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&BusinessType::Restaurant).unwrap(),
            r#""restaurant""#
        );
        let parsed: BusinessType = serde_json::from_str(r#""retail""#).unwrap();
        assert_eq!(parsed, BusinessType::Retail);
    }
}
