use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Source attribution carried by every article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    /// Name of the source, e.g. "Polizei Köln"
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

/// A generated article for one outlet
///
/// Field names mirror the persisted document exactly. Articles are never
/// mutated in place by the pipeline; a revision produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Outlet identifier
    #[serde(rename = "site")]
    pub outlet: String,
    pub headline: String,
    #[serde(rename = "teaser_or_lead")]
    pub lead: String,
    pub body_paragraphs: Vec<String>,
    #[serde(rename = "callout_optional", default)]
    pub callout: Option<String>,
    pub seo_title: String,
    pub meta_description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub attribution: Attribution,
    #[serde(default)]
    pub fact_table: Option<BTreeMap<String, serde_json::Value>>,
}

impl Article {
    /// Headline length in characters
    pub fn headline_chars(&self) -> usize {
        self.headline.chars().count()
    }

    /// Word count of headline, lead, body and callout (SEO/meta excluded)
    pub fn word_count(&self) -> usize {
        let body: usize = self.body_paragraphs.iter().map(|p| count_words(p)).sum();
        count_words(&self.headline)
            + count_words(&self.lead)
            + body
            + self.callout.as_deref().map(count_words).unwrap_or(0)
    }
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_article_document() {
        let json = r#"{
            "site": "ksta.de",
            "headline": "Festnahme nach Streit in Kalk",
            "teaser_or_lead": "Die Polizei nahm einen 34-Jährigen fest.",
            "body_paragraphs": ["Erster Absatz.", "Zweiter Absatz mit mehr Worten."],
            "callout_optional": null,
            "seo_title": "Festnahme in Köln-Kalk",
            "meta_description": "Polizei nimmt 34-Jährigen fest.",
            "tags": ["Köln", "Polizei"],
            "attribution": {"source": "Polizei Köln"},
            "fact_table": null
        }"#;

        let article: Article = serde_json::from_str(json).unwrap();

        assert_eq!(article.outlet, "ksta.de");
        assert_eq!(article.body_paragraphs.len(), 2);
        assert!(article.callout.is_none());
        assert!(article.attribution.source_url.is_none());
        assert_eq!(article.headline_chars(), 29);
        // 5 + 6 + 2 + 5
        assert_eq!(article.word_count(), 18);
    }

    #[test]
    fn test_count_words_ignores_extra_whitespace() {
        assert_eq!(count_words("  ein   zwei\ndrei "), 3);
        assert_eq!(count_words(""), 0);
    }
}
