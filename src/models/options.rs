use garde::Validate;
use serde::{Deserialize, Serialize};

/// Optional processing stages requested alongside an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingOptions {
    pub summary: bool,
    pub video_caption: bool,
    pub captions: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            summary: true,
            video_caption: true,
            captions: true,
        }
    }
}

impl ProcessingOptions {
    /// Multipart text fields, booleans serialized as `"true"` / `"false"`.
    pub fn form_fields(&self) -> [(&'static str, &'static str); 3] {
        [
            ("summary", bool_field(self.summary)),
            ("video_caption", bool_field(self.video_caption)),
            ("captions", bool_field(self.captions)),
        ]
    }
}

fn bool_field(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// A video upload ready to be submitted.
#[derive(Debug, Clone, Validate)]
pub struct UploadRequest {
    #[garde(length(min = 1, max = 255))]
    pub file_name: String,

    #[garde(length(min = 1))]
    pub bytes: Vec<u8>,

    #[garde(skip)]
    pub options: ProcessingOptions,
}

impl UploadRequest {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>, options: ProcessingOptions) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            options,
        }
    }

    /// MIME type for the file part, guessed from the file extension.
    pub fn mime_type(&self) -> &'static str {
        let extension = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("mp4") | Some("m4v") => "video/mp4",
            Some("mov") => "video/quicktime",
            Some("webm") => "video/webm",
            Some("mkv") => "video/x-matroska",
            _ => "application/octet-stream",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_stages_enabled_by_default() {
        let options = ProcessingOptions::default();
        assert_eq!(
            options.form_fields(),
            [
                ("summary", "true"),
                ("video_caption", "true"),
                ("captions", "true")
            ]
        );
    }

    #[test]
    fn test_disabled_stage_serializes_false() {
        let options = ProcessingOptions {
            video_caption: false,
            ..Default::default()
        };
        assert_eq!(options.form_fields()[1], ("video_caption", "false"));
        assert_eq!(options.form_fields()[0], ("summary", "true"));
    }

    #[test]
    fn test_empty_payload_is_invalid() {
        let request = UploadRequest::new("clip.mp4", Vec::new(), ProcessingOptions::default());
        assert!(request.validate().is_err());

        let request = UploadRequest::new("", vec![1, 2, 3], ProcessingOptions::default());
        assert!(request.validate().is_err());

        let request = UploadRequest::new("clip.mp4", vec![1, 2, 3], ProcessingOptions::default());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_mime_type_from_extension() {
        let request = |name: &str| UploadRequest::new(name, vec![0], ProcessingOptions::default());
        assert_eq!(request("talk.MP4").mime_type(), "video/mp4");
        assert_eq!(request("talk.mov").mime_type(), "video/quicktime");
        assert_eq!(request("talk.webm").mime_type(), "video/webm");
        assert_eq!(request("talk").mime_type(), "application/octet-stream");
    }
}
