//! Per-app heuristics
//!
//! A fixed decision table keyed by the originating app. Each rule tests the
//! raw text (case-sensitive) and contributes a small constant when it matches.
//! Unknown apps contribute nothing.

use serde::{Deserialize, Serialize};

/// Apps with a dedicated rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceApp {
    Instagram,
    TikTok,
    Facebook,
    Twitter,
    LinkedIn,
    Unknown,
}

impl SourceApp {
    /// Resolve an app from a short name or Android package name
    pub fn from_identifier(identifier: &str) -> Self {
        match identifier.trim().to_lowercase().as_str() {
            "instagram" | "com.instagram.android" => SourceApp::Instagram,
            "tiktok" | "com.zhiliaoapp.musically" => SourceApp::TikTok,
            "facebook" | "com.facebook.katana" => SourceApp::Facebook,
            "twitter" | "com.twitter.android" => SourceApp::Twitter,
            "linkedin" | "com.linkedin.android" => SourceApp::LinkedIn,
            _ => SourceApp::Unknown,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SourceApp::Instagram => "Instagram",
            SourceApp::TikTok => "TikTok",
            SourceApp::Facebook => "Facebook",
            SourceApp::Twitter => "Twitter",
            SourceApp::LinkedIn => "LinkedIn",
            SourceApp::Unknown => "Unknown",
        }
    }

    fn rules(&self) -> &'static [AppRule] {
        match self {
            SourceApp::Instagram => INSTAGRAM_RULES,
            SourceApp::TikTok => TIKTOK_RULES,
            SourceApp::Facebook => FACEBOOK_RULES,
            SourceApp::Twitter => TWITTER_RULES,
            SourceApp::LinkedIn => LINKEDIN_RULES,
            SourceApp::Unknown => &[],
        }
    }
}

enum Markers {
    /// Every marker must be present
    All(&'static [&'static str]),
    /// At least one marker must be present
    Any(&'static [&'static str]),
}

struct AppRule {
    markers: Markers,
    weight: u32,
}

impl AppRule {
    fn matches(&self, text: &str) -> bool {
        match self.markers {
            Markers::All(markers) => markers.iter().all(|m| text.contains(m)),
            Markers::Any(markers) => markers.iter().any(|m| text.contains(m)),
        }
    }
}

#[rustfmt::skip]
const INSTAGRAM_RULES: &[AppRule] = &[
    AppRule { markers: Markers::All(&["story", "lifestyle"]), weight: 12 },
    AppRule { markers: Markers::Any(&["influencer", "sponsored"]), weight: 10 },
    AppRule { markers: Markers::Any(&["swipe up", "link in bio"]), weight: 8 },
];

#[rustfmt::skip]
const TIKTOK_RULES: &[AppRule] = &[
    AppRule { markers: Markers::Any(&["challenge", "trend"]), weight: 15 },
    AppRule { markers: Markers::Any(&["transformation", "glow up"]), weight: 18 },
    AppRule { markers: Markers::Any(&["viral", "famous"]), weight: 10 },
];

#[rustfmt::skip]
const FACEBOOK_RULES: &[AppRule] = &[
    AppRule { markers: Markers::Any(&["life update", "achievement"]), weight: 12 },
    AppRule { markers: Markers::Any(&["milestone", "celebration"]), weight: 8 },
];

#[rustfmt::skip]
const TWITTER_RULES: &[AppRule] = &[
    AppRule { markers: Markers::All(&["thread", "success"]), weight: 10 },
    AppRule { markers: Markers::Any(&["hot take", "unpopular opinion"]), weight: 8 },
];

#[rustfmt::skip]
const LINKEDIN_RULES: &[AppRule] = &[
    AppRule { markers: Markers::Any(&["promoted", "new job", "new role"]), weight: 12 },
    AppRule { markers: Markers::All(&["grateful", "opportunity"]), weight: 10 },
];

/// Score contributed by the app's rule table
pub fn app_specific_score(text: &str, app_context: &str) -> u32 {
    SourceApp::from_identifier(app_context)
        .rules()
        .iter()
        .filter(|rule| rule.matches(text))
        .map(|rule| rule.weight)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_aliases() {
        assert_eq!(SourceApp::from_identifier("Instagram"), SourceApp::Instagram);
        assert_eq!(
            SourceApp::from_identifier("com.zhiliaoapp.musically"),
            SourceApp::TikTok
        );
        assert_eq!(SourceApp::from_identifier("com.example.app"), SourceApp::Unknown);
    }

    #[test]
    fn test_unknown_app_scores_zero() {
        assert_eq!(app_specific_score("challenge viral transformation", "unknown"), 0);
        assert_eq!(app_specific_score("anything", ""), 0);
    }

    #[test]
    fn test_tiktok_rules() {
        assert_eq!(app_specific_score("new challenge", "tiktok"), 15);
        assert_eq!(app_specific_score("challenge viral glow up", "TikTok"), 43);
    }

    #[test]
    fn test_all_markers_required() {
        assert_eq!(app_specific_score("my story", "instagram"), 0);
        assert_eq!(app_specific_score("my story about lifestyle", "instagram"), 12);
        assert_eq!(app_specific_score("thread on success", "com.twitter.android"), 10);
    }

    #[test]
    fn test_text_matching_is_case_sensitive() {
        assert_eq!(app_specific_score("CHALLENGE", "tiktok"), 0);
    }

    #[test]
    fn test_linkedin_rules() {
        assert_eq!(
            app_specific_score("grateful for this opportunity, new role!", "linkedin"),
            22
        );
    }
}
