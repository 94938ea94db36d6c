//! Result payloads shared by the integration tests

use clippyio_client::models::clip::{Clip, ResultSet};
use clippyio_client::models::job::JobId;

/// Backend results body with two clips, no summary and a caption.
pub const TWO_CLIP_RESULTS_JSON: &str = r#"{
    "job_id": "abc",
    "summary": null,
    "caption": "Two moments worth sharing",
    "clips": [
        {
            "start": 12.0,
            "end": 31.5,
            "duration": 19.5,
            "url": "https://cdn.clippy.io/abc/clip_0.mp4"
        },
        {
            "start": 48.25,
            "end": 70.0,
            "duration": 21.7,
            "url": "https://cdn.clippy.io/abc/clip_1.mp4"
        }
    ]
}"#;

pub fn clip(index: usize) -> Clip {
    let start = index as f64 * 40.0;
    Clip {
        start,
        end: start + 25.0,
        duration: 25.0,
        url: format!("https://cdn.clippy.io/abc/clip_{}.mp4", index),
    }
}

pub fn results_with_clips(job_id: &str, count: usize) -> ResultSet {
    ResultSet {
        job_id: JobId::new(job_id),
        summary: Some("A walkthrough of the new release.".to_string()),
        caption: Some("Three things you missed".to_string()),
        clips: (0..count).map(clip).collect(),
    }
}
