use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicImageSource {
    #[serde(default)]
    pub r#type: String,
    pub media_type: Option<String>,
    pub data: Option<String>,
    pub url: Option<String>,
}

impl AnthropicImageSource {
    /// `data:` URI for inline base64 images, the plain URL for url sources.
    pub fn to_image_url(&self) -> Option<String> {
        match self.r#type.as_str() {
            "base64" => Some(format!(
                "data:{};base64,{}",
                self.media_type.as_deref().unwrap_or("image/png"),
                self.data.as_deref().unwrap_or_default()
            )),
            "url" => self.url.clone(),
            _ => None,
        }
    }
}
