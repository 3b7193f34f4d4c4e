use crate::error::{PlannerError, Result};

/// MIME type assumed for image attachments that do not declare one.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Image supplied alongside the prompt for aesthetic inspiration.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

impl ImageAttachment {
    pub fn new(bytes: Vec<u8>, mime_type: Option<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.filter(|mime| !mime.trim().is_empty()),
        }
    }

    /// Declared MIME type, or `image/jpeg` when none was given.
    pub fn mime_type(&self) -> &str {
        self.mime_type.as_deref().unwrap_or(DEFAULT_IMAGE_MIME)
    }
}

impl std::fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("len", &self.bytes.len())
            .field("mime_type", &self.mime_type())
            .finish()
    }
}

/// A single plan-trip request. Built per call and owned by the planner for its duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItineraryRequest {
    prompt_text: String,
    image: Option<ImageAttachment>,
}

impl ItineraryRequest {
    pub fn new(prompt_text: impl Into<String>) -> Result<Self> {
        let prompt_text = prompt_text.into();
        if prompt_text.trim().is_empty() {
            return Err(PlannerError::InvalidRequest("Missing prompt".to_string()));
        }

        Ok(Self {
            prompt_text,
            image: None,
        })
    }

    pub fn with_image(mut self, bytes: Vec<u8>, mime_type: Option<String>) -> Self {
        self.image = Some(ImageAttachment::new(bytes, mime_type));
        self
    }

    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub fn image(&self) -> Option<&ImageAttachment> {
        self.image.as_ref()
    }
}
