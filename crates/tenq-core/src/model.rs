use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{PipelineError, PipelineResult};

/// Items kept from a 10-Q: Part I items 1-4, Part II items 1 and 1A.
pub const STANDARD_ITEMS: [(&str, &str); 6] = [
    ("I", "1"),
    ("I", "2"),
    ("I", "3"),
    ("I", "4"),
    ("II", "1"),
    ("II", "1A"),
];

/// Key of the MD&A item (Part I Item 2) inside a cached filing document.
pub const MDA_ITEM_KEY: &str = "item 2";

const FILING_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Revenue,
    Cashflow,
    Debt,
}

impl AnalysisKind {
    /// Processing order of one pipeline iteration.
    pub const ALL: [AnalysisKind; 3] = [
        AnalysisKind::Revenue,
        AnalysisKind::Cashflow,
        AnalysisKind::Debt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Revenue => "revenue",
            AnalysisKind::Cashflow => "cashflow",
            AnalysisKind::Debt => "debt",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "revenue" => Ok(AnalysisKind::Revenue),
            "cashflow" => Ok(AnalysisKind::Cashflow),
            "debt" => Ok(AnalysisKind::Debt),
            other => Err(PipelineError::Config {
                message: format!("unknown analysis kind '{}'", other),
            }),
        }
    }
}

/// Make a string safe to use as a single path component.
pub fn sanitize_component(raw: &str) -> String {
    let clean = raw.trim().replace(['/', '\\'], "-");
    match clean.as_str() {
        "." | ".." => clean.replace('.', "-"),
        _ => clean,
    }
}

/// Whether `raw` is a `YYYY-MM-DD` calendar date.
pub fn is_filing_date(raw: &str) -> bool {
    NaiveDate::parse_from_str(raw, FILING_DATE_FORMAT)
        .is_ok_and(|date| date.format(FILING_DATE_FORMAT).to_string() == raw)
}

/// Identifies one filing. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilingReference {
    company_name: String,
    form_type: String,
    filing_date: String,
}

impl FilingReference {
    pub fn new(
        company_name: impl Into<String>,
        form_type: impl Into<String>,
        filing_date: impl Into<String>,
    ) -> PipelineResult<Self> {
        let company_name = company_name.into().trim().to_string();
        let form_type = form_type.into().trim().to_string();
        let filing_date = filing_date.into().trim().to_string();

        if company_name.is_empty() {
            return Err(PipelineError::acquisition("filing has no company name"));
        }
        if form_type.is_empty() {
            return Err(PipelineError::acquisition("filing has no form type"));
        }
        if !is_filing_date(&filing_date) {
            return Err(PipelineError::acquisition(format!(
                "invalid filing date '{}', expected YYYY-MM-DD",
                filing_date
            )));
        }

        Ok(Self {
            company_name,
            form_type,
            filing_date,
        })
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn form_type(&self) -> &str {
        &self.form_type
    }

    pub fn filing_date(&self) -> &str {
        &self.filing_date
    }

    /// `{company}_{form}_{date}.json`
    pub fn cache_file_name(&self) -> String {
        format!(
            "{}_{}_{}.json",
            sanitize_component(&self.company_name),
            sanitize_component(&self.form_type),
            self.filing_date
        )
    }

    /// Inverse of [`FilingReference::cache_file_name`]. The company part may itself
    /// contain underscores; form and date never do.
    pub fn from_cache_file_name(file_name: &str) -> PipelineResult<Self> {
        let stem = file_name.strip_suffix(".json").ok_or_else(|| {
            PipelineError::acquisition(format!("'{}' is not a cached filing", file_name))
        })?;

        let mut parts = stem.rsplitn(3, '_');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(date), Some(form), Some(company)) => Self::new(company, form, date),
            _ => Err(PipelineError::acquisition(format!(
                "cached filing name '{}' does not match company_form_date.json",
                file_name
            ))),
        }
    }
}

impl fmt::Display for FilingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.company_name, self.form_type, self.filing_date
        )
    }
}

/// Free text of one filing item. Only Item 2 (MD&A) feeds the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingSection(String);

impl FilingSection {
    pub fn new(text: impl Into<String>) -> PipelineResult<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(PipelineError::acquisition("filing section is empty"));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Output of a successful acquisition: the filing and its MD&A text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredFiling {
    pub reference: FilingReference,
    pub section: FilingSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingItem {
    #[serde(rename = "item name")]
    pub name: String,
    pub contents: String,
}

/// Where an item sits in a 10-Q: its part (`I` or `II`) and number (`2`, `1A`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    part: String,
    number: String,
}

impl ItemKey {
    pub fn new(part: &str, number: &str) -> Self {
        Self {
            part: part.trim().to_ascii_uppercase(),
            number: number.trim().to_ascii_uppercase(),
        }
    }

    pub fn part(&self) -> &str {
        &self.part
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    fn is_standard(&self) -> bool {
        STANDARD_ITEMS
            .iter()
            .any(|(part, number)| self.part == *part && self.number == *number)
    }

    /// `item 2` for Part I items, `part ii item 1a` for Part II items.
    pub fn document_key(&self) -> String {
        let number = self.number.to_ascii_lowercase();
        if self.part == "I" {
            format!("item {}", number)
        } else {
            format!("part {} item {}", self.part.to_ascii_lowercase(), number)
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Part {} Item {}", self.part, self.number)
    }
}

/// Snapshot of a 10-Q as stored in the filing cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingDocument {
    pub ticker: String,
    pub form: String,
    /// Keyed by [`ItemKey::document_key`].
    #[serde(flatten)]
    pub items: BTreeMap<String, FilingItem>,
}

impl FilingDocument {
    /// Keep the standard items, keyed by their parsed part and number.
    pub fn from_items(
        ticker: impl Into<String>,
        form: impl Into<String>,
        items: Vec<(ItemKey, FilingItem)>,
    ) -> Self {
        let items = items
            .into_iter()
            .filter(|(key, _)| key.is_standard())
            .map(|(key, item)| (key.document_key(), item))
            .collect();

        Self {
            ticker: ticker.into(),
            form: form.into(),
            items,
        }
    }

    /// Part I Item 2, or an acquisition error when it is missing or blank.
    pub fn mda_section(&self) -> PipelineResult<FilingSection> {
        let item = self.items.get(MDA_ITEM_KEY).ok_or_else(|| {
            PipelineError::acquisition(format!(
                "filing for {} has no Part I Item 2 (MD&A)",
                self.ticker
            ))
        })?;
        FilingSection::new(item.contents.clone())
    }
}

// --- Analysis reports ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RevenueStream {
    #[serde(rename = "revenue stream")]
    pub stream: String,
    pub driver: String,
    #[serde(rename = "organic or inorganic")]
    pub growth_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RevenueReport {
    #[serde(rename = "company name")]
    pub company_name: String,
    #[serde(rename = "headline result")]
    pub headline_result: String,
    #[serde(rename = "what drove the revenue change")]
    pub change_drivers: String,
    #[serde(
        rename = "revenue streams and growth type",
        deserialize_with = "one_or_many"
    )]
    pub streams: Vec<RevenueStream>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperatingCashflow {
    #[serde(rename = "operating cashflow")]
    pub summary: String,
    pub driver: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CashflowReport {
    #[serde(rename = "company name")]
    pub company_name: String,
    #[serde(rename = "headline result")]
    pub headline_result: String,
    #[serde(rename = "cashflow and growth type")]
    pub operating: OperatingCashflow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DebtReport {
    #[serde(rename = "company name")]
    pub company_name: String,
    pub what_changed_with_debt: String,
    pub why_it_changed: String,
    pub can_they_pay_bills: String,
    pub management_plan: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(item) => vec![item],
        OneOrMany::Many(items) => items,
    })
}

/// A kind-specific structured analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnalysisReport {
    Revenue(RevenueReport),
    Cashflow(CashflowReport),
    Debt(DebtReport),
}

impl AnalysisReport {
    /// Parse a model's JSON into the exact field set of `kind`.
    pub fn from_value(kind: AnalysisKind, value: serde_json::Value) -> Result<Self, String> {
        let report = match kind {
            AnalysisKind::Revenue => {
                let report: RevenueReport =
                    serde_json::from_value(value).map_err(|e| e.to_string())?;
                if report.streams.is_empty() {
                    return Err("revenue report lists no revenue streams".to_string());
                }
                AnalysisReport::Revenue(report)
            }
            AnalysisKind::Cashflow => AnalysisReport::Cashflow(
                serde_json::from_value(value).map_err(|e| e.to_string())?,
            ),
            AnalysisKind::Debt => {
                AnalysisReport::Debt(serde_json::from_value(value).map_err(|e| e.to_string())?)
            }
        };
        Ok(report)
    }

    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisReport::Revenue(_) => AnalysisKind::Revenue,
            AnalysisReport::Cashflow(_) => AnalysisKind::Cashflow,
            AnalysisReport::Debt(_) => AnalysisKind::Debt,
        }
    }

    /// Pretty JSON. The judge reviews exactly this text and the store writes exactly these bytes.
    pub fn render(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// --- Judge verdict ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictOutcome {
    Pass,
    Fail,
}

impl FromStr for VerdictOutcome {
    type Err = String;

    /// Exact match only: `pass` or `fail`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pass" => Ok(VerdictOutcome::Pass),
            "fail" => Ok(VerdictOutcome::Fail),
            other => Err(format!(
                "judge outcome must be 'pass' or 'fail', got '{}'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail { anomalies: String },
}

impl Verdict {
    pub fn outcome(&self) -> VerdictOutcome {
        match self {
            Verdict::Pass => VerdictOutcome::Pass,
            Verdict::Fail { .. } => VerdictOutcome::Fail,
        }
    }

    /// Present only for failed verdicts.
    pub fn anomalies(&self) -> Option<&str> {
        match self {
            Verdict::Pass => None,
            Verdict::Fail { anomalies } => Some(anomalies),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub meta: serde_json::Value,
}
