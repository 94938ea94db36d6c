use serde::{Deserialize, Serialize};

use crate::models::job::JobId;

/// One extracted video segment.
///
/// All timing fields are kept exactly as the backend sent them. `duration` is
/// supplied independently of `start`/`end`; use [`Clip::span`] for the
/// timing-derived length. The backend is expected to send `end > start`, but an
/// inverted or empty span is not rejected, since display only uses `duration`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub url: String,
}

impl Clip {
    /// `end - start` in seconds. May differ from `duration`, and is zero or
    /// negative for a malformed clip.
    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    /// Reported duration formatted with one decimal, e.g. `"12.5s"`.
    pub fn duration_label(&self) -> String {
        format!("{:.1}s", self.duration)
    }
}

/// Results of a finished job, fetched once from `GET /jobs/{job_id}/results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub job_id: JobId,
    pub summary: Option<String>,
    pub caption: Option<String>,
    #[serde(default)]
    pub clips: Vec<Clip>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_span_kept_verbatim() {
        let json = r#"{"start": 40.0, "end": 32.0, "duration": 8.0, "url": "https://cdn/b.mp4"}"#;
        let clip: Clip = serde_json::from_str(json).unwrap();
        assert_eq!(clip.start, 40.0);
        assert_eq!(clip.end, 32.0);
        assert_eq!(clip.span(), -8.0);
        assert_eq!(clip.duration_label(), "8.0s");
    }

    #[test]
    fn test_results_with_null_fields() {
        let json = r#"{
            "job_id": "abc",
            "summary": null,
            "caption": "Watch this",
            "clips": [
                {"start": 10.0, "end": 25.5, "duration": 15.5, "url": "https://cdn/a.mp4"}
            ]
        }"#;
        let results: ResultSet = serde_json::from_str(json).unwrap();
        assert_eq!(results.job_id.as_str(), "abc");
        assert!(results.summary.is_none());
        assert_eq!(results.caption.as_deref(), Some("Watch this"));
        assert_eq!(results.clips.len(), 1);
        assert_eq!(results.clips[0].url, "https://cdn/a.mp4");
    }

    #[test]
    fn test_results_without_clips() {
        let results: ResultSet =
            serde_json::from_str(r#"{"job_id":"abc","summary":"s","caption":null}"#).unwrap();
        assert!(results.clips.is_empty());
    }

    #[test]
    fn test_duration_kept_verbatim() {
        let clip = Clip {
            start: 3.0,
            end: 10.0,
            duration: 6.84,
            url: "u".to_string(),
        };
        assert_eq!(clip.duration, 6.84);
        assert_eq!(clip.span(), 7.0);
        assert_eq!(clip.duration_label(), "6.8s");
    }
}
