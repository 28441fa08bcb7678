//! The fixed two-level feedback taxonomy.
//!
//! Every classification produced by this crate lands in one of the categories
//! below (or the `"Error"` sentinel). Each category owns a set of subcategory
//! groups, and each group owns the detail tags the model may emit for it.
//!
//! The taxonomy is a process-wide constant: there is no way to mutate it at
//! runtime.

use serde_json::{Map, Value};

/// Sentinel category used for degraded results.
pub const ERROR_CATEGORY: &str = "Error";

/// A subcategory group and the detail tags that belong to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subcategory {
    pub name: &'static str,
    pub tags: &'static [&'static str],
}

impl Subcategory {
    /// Returns `true` if `tag` is one of this group's detail tags.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag)
    }

    /// The tag used when the model supplies no details for this group.
    pub fn default_tag(&self) -> &'static str {
        self.tags[0]
    }
}

/// A top-level category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub subcategories: &'static [Subcategory],
    /// Name of the subcategory substituted when the model's choice is unusable.
    pub default_subcategory: &'static str,
}

impl Category {
    /// Looks up a subcategory group by name.
    ///
    /// Matches exactly first, then ignoring ASCII case.
    pub fn subcategory(&self, name: &str) -> Option<&'static Subcategory> {
        let name = name.trim();
        self.subcategories
            .iter()
            .find(|s| s.name == name)
            .or_else(|| {
                self.subcategories
                    .iter()
                    .find(|s| s.name.eq_ignore_ascii_case(name))
            })
    }

    /// Finds the subcategory group that owns `tag`.
    pub fn subcategory_for_tag(&self, tag: &str) -> Option<&'static Subcategory> {
        self.subcategories.iter().find(|s| s.has_tag(tag))
    }

    /// The group named by `default_subcategory`.
    pub fn fallback_subcategory(&self) -> &'static Subcategory {
        self.subcategory(self.default_subcategory)
            .unwrap_or(&self.subcategories[0])
    }
}

/// The complete category → subcategory → tag mapping.
#[derive(Debug)]
pub struct Taxonomy {
    categories: &'static [Category],
}

/// Common category spellings the model produces instead of the canonical names.
///
/// Keys are compared ignoring ASCII case.
const CATEGORY_ALIASES: &[(&str, &str)] = &[
    ("bug", "Bug & Issues"),
    ("bugs", "Bug & Issues"),
    ("issue", "Bug & Issues"),
    ("issues", "Bug & Issues"),
    ("bug/issues", "Bug & Issues"),
    ("bugs & issues", "Bug & Issues"),
    ("feature", "Feature Requests"),
    ("features", "Feature Requests"),
    ("feature request", "Feature Requests"),
    ("perf", "Performance"),
    ("speed", "Performance"),
    ("satisfaction", "User Satisfaction"),
    ("user feedback", "User Satisfaction"),
    ("ux", "App Experience"),
    ("experience", "App Experience"),
    ("usability", "App Experience"),
    ("other", "Uncategorized"),
    ("general", "Uncategorized"),
    ("unknown", "Uncategorized"),
];

pub static TAXONOMY: Taxonomy = Taxonomy {
    categories: &[
        Category {
            name: "Bug & Issues",
            default_subcategory: "Functional Bugs",
            subcategories: &[
                Subcategory {
                    name: "UI/UX Bugs",
                    tags: &["display_error", "layout_issue", "responsive_bug", "visual_glitch"],
                },
                Subcategory {
                    name: "Functional Bugs",
                    tags: &["crash", "data_loss", "performance_lag", "feature_malfunction"],
                },
                Subcategory {
                    name: "Authentication Bugs",
                    tags: &["login_error", "session_issue", "access_denied", "token_expired"],
                },
                Subcategory {
                    name: "Payment Bugs",
                    tags: &[
                        "transaction_fail",
                        "pricing_error",
                        "checkout_issue",
                        "refund_problem",
                    ],
                },
                Subcategory {
                    name: "Integration Bugs",
                    tags: &["api_error", "sync_fail", "third_party_issue", "connection_error"],
                },
                Subcategory {
                    name: "Security Bugs",
                    tags: &[
                        "vulnerability",
                        "data_breach",
                        "authentication_bypass",
                        "injection_risk",
                    ],
                },
            ],
        },
        Category {
            name: "Feature Requests",
            default_subcategory: "Enhancements",
            subcategories: &[
                Subcategory {
                    name: "New Features",
                    tags: &[
                        "new_functionality",
                        "additional_option",
                        "new_integration",
                        "new_tool",
                    ],
                },
                Subcategory {
                    name: "Enhancements",
                    tags: &["improvement", "optimization", "better_ui", "workflow_enhancement"],
                },
                Subcategory {
                    name: "Customization",
                    tags: &["personalization", "configuration", "theming", "user_preference"],
                },
                Subcategory {
                    name: "Integration",
                    tags: &["api_feature", "third_party", "external_service", "data_sync"],
                },
            ],
        },
        Category {
            name: "Performance",
            default_subcategory: "Speed Issues",
            subcategories: &[
                Subcategory {
                    name: "Speed Issues",
                    tags: &["slow_loading", "response_time", "lag", "bottleneck"],
                },
                Subcategory {
                    name: "Resource Usage",
                    tags: &["high_cpu", "memory_leak", "battery_drain", "storage_issue"],
                },
                Subcategory {
                    name: "Scalability",
                    tags: &["load_handling", "concurrent_users", "data_volume", "traffic_spike"],
                },
                Subcategory {
                    name: "Optimization",
                    tags: &[
                        "efficiency",
                        "resource_optimization",
                        "caching",
                        "performance_tuning",
                    ],
                },
            ],
        },
        Category {
            name: "User Satisfaction",
            default_subcategory: "Suggestions",
            subcategories: &[
                Subcategory {
                    name: "Positive Feedback",
                    tags: &["praise", "appreciation", "satisfaction", "endorsement"],
                },
                Subcategory {
                    name: "Complaints",
                    tags: &["frustration", "dissatisfaction", "annoyance", "disappointment"],
                },
                Subcategory {
                    name: "Suggestions",
                    tags: &["recommendation", "improvement_idea", "user_request", "feedback"],
                },
            ],
        },
        Category {
            name: "App Experience",
            default_subcategory: "Usability",
            subcategories: &[
                Subcategory {
                    name: "Usability",
                    tags: &["ease_of_use", "user_friendly", "intuitive", "accessibility"],
                },
                Subcategory {
                    name: "Content",
                    tags: &["ads", "pricing", "features", "information"],
                },
                Subcategory {
                    name: "Compatibility",
                    tags: &[
                        "device_support",
                        "version_issues",
                        "platform_specific",
                        "compatibility_problem",
                    ],
                },
            ],
        },
        Category {
            name: "Uncategorized",
            default_subcategory: "General Comments",
            subcategories: &[
                Subcategory {
                    name: "General Comments",
                    tags: &["general_feedback", "comment", "statement", "observation"],
                },
                Subcategory {
                    name: "Unclear Feedback",
                    tags: &["ambiguous", "unclear", "incomplete", "unspecific"],
                },
                Subcategory {
                    name: "Other",
                    tags: &["miscellaneous", "unclassified", "other", "unknown"],
                },
            ],
        },
    ],
};

impl Taxonomy {
    /// All categories in declaration order.
    pub fn categories(&self) -> &'static [Category] {
        self.categories
    }

    /// Category names in declaration order.
    pub fn category_names(&self) -> impl Iterator<Item = &'static str> {
        self.categories.iter().map(|c| c.name)
    }

    /// Looks up a category by its exact name.
    pub fn category(&self, name: &str) -> Option<&'static Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Returns `true` if `name` is exactly a taxonomy key.
    pub fn contains(&self, name: &str) -> bool {
        self.category(name).is_some()
    }

    /// Resolves a model-supplied category to a taxonomy entry.
    ///
    /// Tries the exact key, then the key ignoring ASCII case, then the alias table.
    pub fn resolve_category(&self, raw: &str) -> Option<&'static Category> {
        let raw = raw.trim();
        if let Some(category) = self.category(raw) {
            return Some(category);
        }
        if let Some(category) = self
            .categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(raw))
        {
            return Some(category);
        }
        CATEGORY_ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(raw))
            .and_then(|(_, canonical)| self.category(canonical))
    }

    /// Renders the taxonomy as a JSON object for inclusion in prompts.
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        for category in self.categories {
            let mut groups = Map::new();
            for sub in category.subcategories {
                groups.insert(
                    sub.name.to_string(),
                    Value::Array(sub.tags.iter().map(|t| Value::from(*t)).collect()),
                );
            }
            root.insert(category.name.to_string(), Value::Object(groups));
        }
        Value::Object(root)
    }
}
