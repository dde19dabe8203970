use serde::{Deserialize, Serialize};

/// Headline rules for an outlet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlineRules {
    /// Maximum headline length in characters (not bytes)
    pub max_chars: usize,
    /// Whether '!' may appear in the headline
    pub allow_exclamation: bool,
}

/// Word-count bounds for the article text (excluding SEO/meta fields)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
}

impl LengthBounds {
    pub fn contains(&self, words: usize) -> bool {
        (self.min..=self.max).contains(&words)
    }
}

/// A required or optional structural section, e.g. `"lead"` or `"callout_optional?"`
///
/// Serialized in the compact string form with a trailing `?` marking optional
/// sections, which is also the form the writer sees in its prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Section {
    pub name: String,
    pub optional: bool,
}

impl Section {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: true,
        }
    }

    /// Human label for the section, e.g. `teaser` -> `Teaser`
    pub fn label(&self) -> String {
        let base = self.name.strip_suffix("_optional").unwrap_or(&self.name);
        let mut chars = base.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>().replace('_', " "),
            None => String::new(),
        }
    }
}

impl From<String> for Section {
    fn from(raw: String) -> Self {
        match raw.trim().strip_suffix('?') {
            Some(name) => Section::optional(name),
            None => Section::required(raw.trim()),
        }
    }
}

impl From<Section> for String {
    fn from(section: Section) -> Self {
        if section.optional {
            format!("{}?", section.name)
        } else {
            section.name
        }
    }
}

/// Immutable per-outlet style configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleProfile {
    /// Outlet identifier, e.g. `express.de`
    #[serde(rename = "site")]
    pub outlet: String,
    /// Language the articles are written in
    #[serde(default = "default_language")]
    pub language: String,
    pub tone: String,
    pub headline: HeadlineRules,
    #[serde(rename = "length_words")]
    pub length: LengthBounds,
    /// Ordered structural sections
    pub structure: Vec<Section>,
    pub facts_policy: String,
}

fn default_language() -> String {
    "de".to_string()
}

impl StyleProfile {
    /// Check the headline rules: length in characters and the exclamation policy
    pub fn headline_conforms(&self, headline: &str) -> bool {
        headline.chars().count() <= self.headline.max_chars
            && (self.headline.allow_exclamation || !headline.contains('!'))
    }

    pub fn length_conforms(&self, word_count: usize) -> bool {
        self.length.contains(word_count)
    }

    /// Label of the lead/teaser section (the second structural section)
    pub fn lead_label(&self) -> String {
        self.structure
            .get(1)
            .map(Section::label)
            .unwrap_or_else(|| "Lead".to_string())
    }

    /// Basic sanity checks for profiles loaded from outside the binary
    pub fn validate(&self) -> Result<(), String> {
        if self.outlet.trim().is_empty() {
            return Err("outlet identifier is empty".to_string());
        }
        if self.headline.max_chars == 0 {
            return Err(format!("{}: headline.max_chars must be positive", self.outlet));
        }
        if self.length.min > self.length.max {
            return Err(format!(
                "{}: length_words.min {} exceeds max {}",
                self.outlet, self.length.min, self.length.max
            ));
        }
        if self.structure.is_empty() {
            return Err(format!("{}: structure is empty", self.outlet));
        }
        Ok(())
    }
}

/// A sample article used only to steer tone and format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub headline: String,
    #[serde(rename = "teaser_or_lead")]
    pub lead: String,
    pub body_paragraphs: Vec<String>,
}
