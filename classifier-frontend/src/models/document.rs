use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;

/// Label shown for records the service has not classified.
pub const UNCLASSIFIED: &str = "Unclassified";

/// Opaque document identifier assigned by the classification service.
///
/// The service may send either a JSON string or an integer; both are held
/// as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id percent-encoded for use in a URL path segment or fragment.
    pub fn slug(&self) -> String {
        urlencoding::encode(&self.0).into_owned()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        DocumentId(value.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        DocumentId(value)
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => DocumentId(s),
            RawId::Signed(n) => DocumentId(n.to_string()),
            RawId::Unsigned(n) => DocumentId(n.to_string()),
        })
    }
}

/// A classified document as returned by `GET /documents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub filename: String,
    #[serde(default)]
    pub predicted_category: Option<String>,
    #[serde(default)]
    pub confidence_scores: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub upload_time: String,
}

/// One line of an expanded confidence breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRow {
    pub label: String,
    pub score: f64,
    /// Bar width in percent, clamped to [0, 100].
    pub bar_width: f64,
    /// Score as a percentage with two decimals, e.g. "87.50%".
    pub percent: String,
}

impl ScoreRow {
    fn new(label: &str, score: f64) -> Self {
        let score = if score.is_finite() { score } else { 0.0 };
        Self {
            label: label.to_string(),
            score,
            bar_width: (score * 100.0).clamp(0.0, 100.0),
            percent: format!("{:.2}%", score * 100.0),
        }
    }
}

impl DocumentRecord {
    pub fn category_label(&self) -> &str {
        self.predicted_category.as_deref().unwrap_or(UNCLASSIFIED)
    }

    pub fn uploaded_at(&self) -> Option<NaiveDateTime> {
        parse_upload_time(&self.upload_time)
    }

    /// Confidence scores ordered from most to least likely.
    pub fn ranked_scores(&self) -> Vec<ScoreRow> {
        let mut rows: Vec<ScoreRow> = self
            .confidence_scores
            .iter()
            .flatten()
            .map(|(label, score)| ScoreRow::new(label, *score))
            .collect();

        rows.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.label.cmp(&b.label))
        });
        rows
    }
}

/// Accepts RFC 3339 (`2024-05-01T10:00:00Z`) and the naive ISO form the
/// classifier emits (`2024-05-01T10:00:00.123456`), with `T` or space.
pub fn parse_upload_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Most recent upload first. Unparseable timestamps go last.
pub fn sort_most_recent_first(records: &mut [DocumentRecord]) {
    records.sort_by_cached_key(|r| Reverse((r.uploaded_at(), r.upload_time.clone())));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, upload_time: &str) -> DocumentRecord {
        DocumentRecord {
            id: DocumentId::from(id),
            filename: format!("{}.txt", id),
            predicted_category: None,
            confidence_scores: None,
            upload_time: upload_time.to_string(),
        }
    }

    #[test]
    fn integer_and_string_ids_deserialize() {
        let numeric: DocumentRecord = serde_json::from_value(json!({
            "id": 7,
            "filename": "a.txt",
            "upload_time": "2024-01-01T00:00:00"
        }))
        .unwrap();
        let text: DocumentRecord = serde_json::from_value(json!({
            "id": "doc-7",
            "filename": "a.txt",
            "upload_time": "2024-01-01T00:00:00"
        }))
        .unwrap();

        assert_eq!(numeric.id.as_str(), "7");
        assert_eq!(text.id.as_str(), "doc-7");
    }

    #[test]
    fn classification_fields_are_optional() {
        let doc: DocumentRecord = serde_json::from_value(json!({
            "id": 1,
            "filename": "legacy.txt",
            "upload_time": "2024-01-01T00:00:00"
        }))
        .unwrap();

        assert_eq!(doc.category_label(), UNCLASSIFIED);
        assert!(doc.ranked_scores().is_empty());
    }

    #[test]
    fn parses_naive_and_rfc3339_timestamps() {
        assert!(parse_upload_time("2024-03-05T10:11:12.123456").is_some());
        assert!(parse_upload_time("2024-03-05T10:11:12").is_some());
        assert!(parse_upload_time("2024-03-05 10:11:12").is_some());
        assert!(parse_upload_time("2024-03-05T10:11:12+02:00").is_some());
        assert!(parse_upload_time("yesterday").is_none());
        assert!(parse_upload_time("").is_none());
    }

    #[test]
    fn rfc3339_offsets_are_normalised_to_utc() {
        let a = parse_upload_time("2024-03-05T10:00:00+02:00").unwrap();
        let b = parse_upload_time("2024-03-05T08:00:00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn sorts_most_recent_first_with_unparseable_last() {
        let mut docs = vec![
            record("old", "2023-12-31T23:59:59"),
            record("broken", "not a date"),
            record("new", "2024-06-01T08:00:00.5"),
            record("mid", "2024-01-15T12:00:00"),
        ];

        sort_most_recent_first(&mut docs);

        let order: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(order, vec!["new", "mid", "old", "broken"]);
    }

    #[test]
    fn ranked_scores_descend_and_format() {
        let mut doc = record("1", "2024-01-01T00:00:00");
        doc.confidence_scores = Some(BTreeMap::from([
            ("Other".to_string(), 0.05),
            ("Invoice".to_string(), 0.875),
            ("Contract".to_string(), 0.075),
        ]));

        let rows = doc.ranked_scores();
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();

        assert_eq!(labels, vec!["Invoice", "Contract", "Other"]);
        assert_eq!(rows[0].percent, "87.50%");
        assert_eq!(rows[0].bar_width, 87.5);
        assert_eq!(rows[2].percent, "5.00%");
    }

    #[test]
    fn out_of_range_scores_clamp_bar_width() {
        let mut doc = record("1", "2024-01-01T00:00:00");
        doc.confidence_scores = Some(BTreeMap::from([
            ("Over".to_string(), 1.2),
            ("Under".to_string(), -0.1),
        ]));

        let rows = doc.ranked_scores();
        assert_eq!(rows[0].bar_width, 100.0);
        assert_eq!(rows[1].bar_width, 0.0);
    }
}
