//! The content template engine. One table of canned content per business
//! type plus a `{placeholder}` renderer; agents supply data and shaping,
//! never their own copies of this machinery.

use crate::business::BusinessType;

/// Canned content for one business type. All strings may contain
/// `{placeholder}` markers resolved against the business profile.
pub struct ContentSet {
    pub headline: &'static str,
    pub about: &'static str,
    pub services: &'static [&'static str],
    pub seo_keywords: &'static [&'static str],
    pub hashtags: &'static [&'static str],
    pub campaign_themes: &'static [&'static str],
    pub greeting_reply: &'static str,
    pub enquiry_reply: &'static str,
}

static RESTAURANT: ContentSet = ContentSet {
    headline: "{business_name} — authentic flavours in {location}",
    about: "{business_name} serves fresh, locally loved food in {location}. \
            Order online, book a table, or drop in for today's specials.",
    services: &[
        "Dine-in and takeaway",
        "Online ordering",
        "Table reservations",
        "Catering for events",
    ],
    seo_keywords: &[
        "best restaurant in {location}",
        "{business_name} menu",
        "food delivery {location}",
        "family restaurant near me",
    ],
    hashtags: &["#foodie", "#{location}eats", "#freshfood", "#ordernow"],
    campaign_themes: &[
        "Weekend family combo offers",
        "Festival special menus",
        "First-order discount for online customers",
    ],
    greeting_reply: "Namaste! Welcome to {business_name}. How can we help you today?",
    enquiry_reply: "Thanks for reaching out to {business_name}! Our team will \
                    confirm your order or reservation shortly.",
};

static RETAIL: ContentSet = ContentSet {
    headline: "{business_name} — your trusted store in {location}",
    about: "{business_name} brings quality products at fair prices to \
            {location}. Browse our catalogue and enjoy quick home delivery.",
    services: &[
        "Product catalogue",
        "Home delivery",
        "Easy returns",
        "Seasonal discounts",
    ],
    seo_keywords: &[
        "best store in {location}",
        "{business_name} offers",
        "buy online {location}",
        "shop near me",
    ],
    hashtags: &["#shoplocal", "#{location}shopping", "#deals", "#newarrivals"],
    campaign_themes: &[
        "Festive season sale",
        "Clearance weekend",
        "Loyalty rewards for repeat customers",
    ],
    greeting_reply: "Welcome to {business_name}! Ask us about today's offers.",
    enquiry_reply: "Thanks for contacting {business_name}! We'll get back to \
                    you with availability and pricing right away.",
};

static SERVICE: ContentSet = ContentSet {
    headline: "{business_name} — professional services in {location}",
    about: "{business_name} provides dependable, professional service in \
            {location}. Book an appointment online in under a minute.",
    services: &[
        "Online appointment booking",
        "Transparent pricing",
        "Certified professionals",
        "Customer support",
    ],
    seo_keywords: &[
        "best {business_type} in {location}",
        "{business_name} booking",
        "{business_type} near me",
        "trusted {business_type} {location}",
    ],
    hashtags: &["#localbusiness", "#{location}", "#bookonline", "#trustedservice"],
    campaign_themes: &[
        "First appointment discount",
        "Refer-a-friend rewards",
        "Seasonal service packages",
    ],
    greeting_reply: "Hello! You've reached {business_name}. How can we assist?",
    enquiry_reply: "Thanks for your enquiry with {business_name}! We'll \
                    confirm your appointment slot shortly.",
};

/// Look up the content table for a business type.
pub fn content_for(business_type: BusinessType) -> &'static ContentSet {
    match business_type {
        BusinessType::Restaurant => &RESTAURANT,
        BusinessType::Retail => &RETAIL,
        BusinessType::Service => &SERVICE,
    }
}

/// Substitute `{key}` markers in `template` from `vars`. Unknown markers are
/// left intact so a missing variable never breaks rendering.
pub fn render(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

/// Render a list of templates.
pub fn render_all(templates: &[&str], vars: &[(&str, String)]) -> Vec<String> {
    templates.iter().map(|t| render(t, vars)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::BusinessProfile;

    fn vars() -> Vec<(&'static str, String)> {
        BusinessProfile::derive(Some("Sharma Dhaba"), None, "dhaba in Jaipur").template_vars()
    }

    #[test]
    fn render_substitutes_known_vars() {
        let out = render("Visit {business_name} in {location}", &vars());
        assert_eq!(out, "Visit Sharma Dhaba in Jaipur");
    }

    #[test]
    fn render_leaves_unknown_markers_intact() {
        let out = render("{business_name} uses {unknown_marker}", &vars());
        assert_eq!(out, "Sharma Dhaba uses {unknown_marker}");
    }

    #[test]
    fn render_repeated_marker() {
        let out = render("{business_name} and {business_name}", &vars());
        assert_eq!(out, "Sharma Dhaba and Sharma Dhaba");
    }

    #[test]
    fn content_tables_exist_for_every_type() {
        for t in [
            BusinessType::Restaurant,
            BusinessType::Retail,
            BusinessType::Service,
        ] {
            let set = content_for(t);
            assert!(!set.headline.is_empty());
            assert!(!set.services.is_empty());
            assert!(!set.seo_keywords.is_empty());
            assert!(!set.hashtags.is_empty());
        }
    }

    #[test]
    fn render_all_renders_each_entry() {
        let set = content_for(BusinessType::Restaurant);
        let rendered = render_all(set.seo_keywords, &vars());
        assert_eq!(rendered.len(), set.seo_keywords.len());
        assert!(rendered.iter().any(|k| k.contains("Jaipur")));
        assert!(rendered.iter().all(|k| !k.contains("{location}")));
    }
}
