/// Post-processing layer for detail tags.
///
/// Ensures consistent tag formatting regardless of LLM output quality.
/// All tags are normalized to lowercase snake_case with only ASCII
/// alphanumeric characters and underscores.
pub struct DetailNormalizer;

/// Maximum number of detail tags kept per result.
pub const MAX_DETAILS: usize = 3;

impl DetailNormalizer {
    /// Normalizes a single tag to lowercase snake_case.
    ///
    /// # Normalization rules
    ///
    /// - Converts to lowercase
    /// - Replaces spaces and hyphens with underscores
    /// - Removes all characters except ASCII alphanumerics and underscores
    /// - Collapses repeated underscores and trims them from both ends
    ///
    /// # Examples
    ///
    /// ```
    /// use feda::classifier::DetailNormalizer;
    ///
    /// assert_eq!(DetailNormalizer::normalize_detail("Slow Loading"), "slow_loading");
    /// assert_eq!(DetailNormalizer::normalize_detail("login-error"), "login_error");
    /// assert_eq!(DetailNormalizer::normalize_detail("  __crash!__ "), "crash");
    /// ```
    #[must_use]
    pub fn normalize_detail(tag: &str) -> String {
        let normalized = tag
            .to_lowercase()
            .replace([' ', '-'], "_")
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect::<String>();

        normalized
            .split('_')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Normalizes a list of tags, removing duplicates and empty strings.
    ///
    /// Keeps the order of first occurrence and at most [`MAX_DETAILS`] entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use feda::classifier::DetailNormalizer;
    ///
    /// let tags = vec!["Crash", "crash", "DATA LOSS", "lag", "bottleneck"];
    /// assert_eq!(
    ///     DetailNormalizer::normalize_details(tags),
    ///     vec!["crash", "data_loss", "lag"]
    /// );
    /// ```
    #[must_use]
    pub fn normalize_details<I, S>(tags: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = std::collections::HashSet::new();
        tags.into_iter()
            .map(|tag| Self::normalize_detail(tag.as_ref()))
            .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
            .take(MAX_DETAILS)
            .collect()
    }
}
