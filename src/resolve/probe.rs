use regex::Regex;
use scraper::Selector;
use tracing::warn;

use crate::resolve::document::{search_structured, Document};
use crate::resolve::tables::{BRANDS, FEATURE_KEYWORDS};

/// Where a candidate value was found. Validators key off this: a value lifted
/// from loose page text gets tighter bounds than one read from a dedicated
/// element or a structured-data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Element,
    Attribute,
    TextPattern,
    Structured,
    Name,
}

/// One raw extraction result, pre-validation. `groups` carries the capture
/// groups when a regex produced the value (dimensions keep all three axes);
/// `context` is the surrounding text for pattern matches, kept for rejection
/// logging.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub value: String,
    pub groups: Vec<String>,
    pub source: Source,
    pub context: Option<String>,
}

impl Candidate {
    fn new(value: impl Into<String>, source: Source) -> Self {
        Self {
            value: value.into().trim().to_string(),
            groups: Vec::new(),
            source,
            context: None,
        }
    }
}

/// Cross-field context available to probes. The name field resolves first and
/// feeds the probes that mine the title for brand and color mentions.
#[derive(Debug, Default)]
pub struct ProbeCtx<'a> {
    pub name: Option<&'a str>,
}

/// Which text projection a pattern probe scans.
#[derive(Debug, Clone, Copy)]
pub enum TextScope {
    Full,
    Details,
}

/// A single extraction strategy. Probes are infallible: one that cannot run
/// against a given page contributes zero candidates and the chain moves on.
pub enum Probe {
    /// Element text via a selector cascade; the first selector yielding any
    /// matches wins and its matches come back in document order.
    Elements { selectors: Vec<Selector> },
    /// Attribute values (first present attribute per element), optionally the
    /// element text too, optionally refined through a capture pattern.
    Attributes {
        selectors: Vec<Selector>,
        attrs: &'static [&'static str],
        include_text: bool,
        refine: Option<&'static Regex>,
    },
    /// Regex scan over a text projection; first matching pattern wins.
    Patterns { patterns: &'static [Regex], scope: TextScope },
    /// Alias lookup across the page's JSON-LD blocks.
    Structured { aliases: &'static [&'static str] },
    /// Color fragments decomposed out of the resolved product name.
    TitleColors { patterns: &'static [Regex] },
    /// Known-brand containment scan over the resolved product name.
    BrandInName,
    /// Feature keyword scan over the full page text.
    FeatureKeywords,
}

/// A short text window around a pattern match, clamped to char boundaries.
fn window(text: &str, start: usize, end: usize) -> String {
    const PAD: usize = 40;
    let mut lo = start.saturating_sub(PAD);
    while lo > 0 && !text.is_char_boundary(lo) {
        lo -= 1;
    }
    let mut hi = (end + PAD).min(text.len());
    while hi < text.len() && !text.is_char_boundary(hi) {
        hi += 1;
    }
    text[lo..hi].to_string()
}

impl Probe {
    /// Compile a selector cascade, dropping any selector that fails to parse.
    pub fn compile(selectors: &[&str]) -> Vec<Selector> {
        selectors
            .iter()
            .filter_map(|s| match Selector::parse(s) {
                Ok(sel) => Some(sel),
                Err(e) => {
                    warn!("unusable selector {:?}: {:?}", s, e);
                    None
                }
            })
            .collect()
    }

    pub fn candidates(&self, doc: &Document, ctx: &ProbeCtx) -> Vec<Candidate> {
        match self {
            Probe::Elements { selectors } => {
                // Cascade: the first selector that matches anything wins.
                for selector in selectors {
                    let out: Vec<Candidate> = doc
                        .html()
                        .select(selector)
                        .map(Document::element_text)
                        .filter(|text| !text.is_empty())
                        .map(|text| Candidate::new(text, Source::Element))
                        .collect();
                    if !out.is_empty() {
                        return out;
                    }
                }
                Vec::new()
            }

            Probe::Attributes { selectors, attrs, include_text, refine } => {
                let mut out = Vec::new();
                for selector in selectors {
                    for el in doc.html().select(selector) {
                        if let Some(raw) =
                            attrs.iter().find_map(|a| el.value().attr(a)).map(str::trim)
                        {
                            if !raw.is_empty() {
                                match refine {
                                    Some(pattern) => {
                                        if let Some(caps) = pattern.captures(raw) {
                                            out.push(Candidate::new(
                                                &caps[1],
                                                Source::Attribute,
                                            ));
                                        }
                                    }
                                    None => out.push(Candidate::new(raw, Source::Attribute)),
                                }
                            }
                        }
                        if *include_text {
                            let text = Document::element_text(el);
                            if !text.is_empty() {
                                out.push(Candidate::new(text, Source::Element));
                            }
                        }
                    }
                }
                out
            }

            Probe::Patterns { patterns, scope } => {
                let text = match scope {
                    TextScope::Full => doc.text(),
                    TextScope::Details => doc.details_or_text(),
                };
                for pattern in patterns.iter() {
                    if let Some(caps) = pattern.captures(text) {
                        let groups: Vec<String> = caps
                            .iter()
                            .skip(1)
                            .flatten()
                            .map(|m| m.as_str().to_string())
                            .collect();
                        let value = groups.first().cloned().unwrap_or_default();
                        if !value.is_empty() {
                            let whole = caps.get(0).map(|m| window(text, m.start(), m.end()));
                            return vec![Candidate {
                                value,
                                groups,
                                source: Source::TextPattern,
                                context: whole,
                            }];
                        }
                    }
                }
                Vec::new()
            }

            Probe::Structured { aliases } => search_structured(doc.structured(), aliases)
                .into_iter()
                .map(|v| Candidate::new(v, Source::Structured))
                .collect(),

            Probe::TitleColors { patterns } => {
                let Some(name) = ctx.name else { return Vec::new() };
                let mut out = Vec::new();
                for pattern in patterns.iter() {
                    if let Some(caps) = pattern.captures(name) {
                        if let Some(m) = caps.get(1) {
                            out.push(Candidate::new(m.as_str(), Source::Name));
                        }
                    }
                }
                out
            }

            Probe::BrandInName => {
                let Some(name) = ctx.name else { return Vec::new() };
                let lower = name.to_lowercase();
                BRANDS
                    .iter()
                    .filter(|brand| lower.contains(&brand.to_lowercase()))
                    .map(|brand| Candidate::new(*brand, Source::Name))
                    .collect()
            }

            Probe::FeatureKeywords => {
                let lower = doc.text().to_lowercase();
                FEATURE_KEYWORDS
                    .iter()
                    .filter(|kw| lower.contains(**kw))
                    .map(|kw| Candidate::new(*kw, Source::TextPattern))
                    .collect()
            }
        }
    }
}
