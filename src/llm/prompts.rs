use serde_json::json;

use crate::models::{Article, FewShotExample, StyleProfile};

/// System/user instruction pair for one generation call
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn fenced_source(source_text: &str) -> String {
    format!("<<<\n{}\n>>>", source_text)
}

/// Writer prompt: style profile in the system role; schema, numeric
/// constraints, examples and the verbatim source in the user role
pub fn build_writer_prompt(
    profile: &StyleProfile,
    examples: &[FewShotExample],
    source_text: &str,
    source_url: Option<&str>,
) -> Prompt {
    let system = format!(
        "You are an editor for the outlet named in the style profile and follow the style profile strictly. \
         Write factually correct short news items and never invent facts. \
         Write in the profile language ({}).\n\n\
         STYLE_PROFILE_JSON:\n{}",
        profile.language,
        to_pretty_json(profile)
    );

    let schema = json!({
        "site": profile.outlet,
        "headline": "...",
        "teaser_or_lead": "...",
        "body_paragraphs": ["...", "..."],
        "callout_optional": null,
        "seo_title": "...",
        "meta_description": "...",
        "tags": [],
        "attribution": {"source": "Polizei", "source_url": source_url.unwrap_or("")},
        "fact_table": null
    });

    let mut user = String::new();
    user.push_str("Turn the following police report into a short news item, returned ONLY as valid JSON in the given schema.\n");
    user.push_str(&format!(
        "- Total word count (excluding SEO/meta fields): {}-{} words.\n",
        profile.length.min, profile.length.max
    ));
    user.push_str(&format!(
        "- Headline at most {} characters; exclamation mark allowed: {}.\n",
        profile.headline.max_chars, profile.headline.allow_exclamation
    ));
    user.push_str("- Use only confirmed content from the source; no new facts, no speculation.\n");
    user.push_str("- Use clear language according to the style profile.\n\n");
    user.push_str("SCHEMA:\n");
    user.push_str(&to_pretty_json(&schema));
    user.push_str("\n\n");
    user.push_str("EXAMPLES (format and tone only, do not copy their content):\n");
    user.push_str(&to_pretty_json(&examples));
    user.push_str("\n\n");
    user.push_str("POLICE_REPORT:\n");
    user.push_str(&fenced_source(source_text));
    user.push_str("\nAnswer ONLY with JSON, no explanations.");

    Prompt { system, user }
}

pub const JUDGE_SYSTEM_PROMPT: &str = "You are a quality-assurance editor. Check strictly, briefly and in binary terms. \
Return only valid JSON in the requested shape.";

/// Response template shown to the judge
const VERDICT_TEMPLATE: &str = r#"{
  "metrics": {
    "headline_length_chars": 0,
    "body_word_count": 0,
    "claim_coverage": 0.0,
    "claims": [
      {"claim": "...", "status": "supported" | "unsupported" | "deviating", "source_quote": "..."}
    ]
  },
  "scores": {
    "factual_consistency": 0.0,
    "style_match": 0.0,
    "length_ok": true,
    "structure_ok": true,
    "safety_ok": true
  },
  "violations": ["..."],
  "suggested_fixes": ["..."],
  "decision": "auto_ok" | "revise" | "human_review"
}"#;

/// Judge prompt: claim extraction and evidence, hard policy checks, scores
pub fn build_judge_prompt(profile: &StyleProfile, article: &Article, source_text: &str) -> Prompt {
    let mut user = String::new();
    user.push_str("Check the article against (1) the outlet STYLE_PROFILE_JSON and (2) the SOURCE_TEXT.\n");
    user.push_str("Work in three steps: claim evidence, then MUST-PASS checks, then scores.\n\n");

    user.push_str("CLAIM EVIDENCE:\n");
    user.push_str("1) Extract every verifiable factual claim from headline, teaser_or_lead and body_paragraphs (ignore seo_title and meta_description).\n");
    user.push_str("2) For each claim quote the supporting passage of SOURCE_TEXT verbatim as source_quote, or mark it 'unsupported' or 'deviating'.\n");
    user.push_str("3) claim_coverage = supported claims / total claims, rounded to two decimals.\n\n");

    user.push_str("MUST-PASS (hard criteria; any violation => decision='human_review'):\n");
    user.push_str("1) Source-only facts: every factual sentence is backed by SOURCE_TEXT (no new details, no speculation).\n");
    user.push_str("2) Presumption of innocence: phrasing such as 'suspected', 'according to police'.\n");
    user.push_str("3) Protection of victims and minors: no identifying details (names, exact addresses, licence plates, schools).\n");
    user.push_str("4) No discrimination: no mention of origin, religion or similar traits without relevance to the case.\n");
    user.push_str("5) Attribution present: police/authority clearly named as source (including source_url if given).\n");
    user.push_str("6) Safety: no insults, doxing, calls to violence or other moderation violations.\n");
    user.push_str(&format!(
        "7) Headline and length: headline <= {} characters; {}; word count {}-{}.\n",
        profile.headline.max_chars,
        if profile.headline.allow_exclamation {
            "'!' allowed"
        } else {
            "no '!' in the headline"
        },
        profile.length.min,
        profile.length.max
    ));
    user.push_str("8) Required structure complete: headline, teaser_or_lead, at least 2 body_paragraphs.\n");
    user.push_str("9) Numbers, places and times consistent with the source (no deviations).\n\n");

    user.push_str("SCORES/BOOLEANS (keep compact):\n");
    user.push_str("- factual_consistency (0..1): below 1.0 unless claim_coverage is 1.00 and there are no violations.\n");
    user.push_str("- style_match (0..1): below 1.0 unless every tone, headline and length rule of the outlet is met exactly.\n");
    user.push_str("- length_ok (bool)\n- structure_ok (bool)\n- safety_ok (bool)\n\n");

    user.push_str("DECISION (exactly one):\n");
    user.push_str("- auto_ok: no issues\n");
    user.push_str("- revise: issues that can be fixed without human input\n");
    user.push_str("- human_review: any MUST-PASS violation\n\n");

    user.push_str("STYLE_PROFILE_JSON:\n");
    user.push_str(&to_pretty_json(profile));
    user.push_str("\n\nARTICLE_JSON:\n");
    user.push_str(&to_pretty_json(article));
    user.push_str("\n\nSOURCE_TEXT:\n");
    user.push_str(&fenced_source(source_text));
    user.push_str("\n\nReturn ONLY this JSON (no further explanation):\n");
    user.push_str(VERDICT_TEMPLATE);

    Prompt {
        system: JUDGE_SYSTEM_PROMPT.to_string(),
        user,
    }
}

/// Correction prompt: fix only the listed issues, same schema, no new facts
pub fn build_revision_prompt(
    profile: &StyleProfile,
    article: &Article,
    source_text: &str,
    reasons: &[String],
) -> Prompt {
    let system = format!(
        "You are an editor. Correct the existing article minimally. \
         Do NOT invent new facts. Answer ONLY with valid JSON in the article schema.\n\n\
         STYLE_PROFILE_JSON:\n{}",
        to_pretty_json(profile)
    );

    let mut user = String::new();
    user.push_str("CURRENT ARTICLE (JSON):\n");
    user.push_str(&to_pretty_json(article));
    user.push_str("\n\nSOURCE:\n");
    user.push_str(&fenced_source(source_text));
    user.push_str("\n\nFIX ONLY THE FOLLOWING ISSUES (no new facts):\n");
    for reason in reasons {
        user.push_str(&format!("- {}\n", reason));
    }
    user.push_str("\nAnswer ONLY with valid JSON (same schema).");

    Prompt { system, user }
}
