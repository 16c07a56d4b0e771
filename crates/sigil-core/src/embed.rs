//! Structured ("embed") messages.
//!
//! Only the subset of fields the dispatcher's built-in flows render is
//! modelled. Transports map it onto their platform's rich message format.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A single titled field inside an [`Embed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    /// Field title.
    pub name: String,
    /// Field body.
    pub value: String,
    /// Whether the platform may lay the field out next to its neighbours.
    #[serde(default)]
    pub inline: bool,
}

/// A structured message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    /// Title line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Body text under the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Accent colour as `0xRRGGBB`.
    #[serde(default)]
    pub color: u32,
    /// RFC 3339 timestamp shown in the footer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Ordered fields.
    #[serde(default)]
    pub fields: Vec<EmbedField>,
}

impl Embed {
    /// Yellow, used for informational embeds.
    pub const COLOR_INFO: u32 = 0xffff00;
    /// Red, used for error embeds.
    pub const COLOR_ERROR: u32 = 0xff0000;

    /// Creates an empty embed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the accent colour.
    pub fn color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    /// Stamps the embed with the current UTC time.
    pub fn timestamp_now(mut self) -> Self {
        self.timestamp = OffsetDateTime::now_utc().format(&Rfc3339).ok();
        self
    }

    /// Appends a non-inline field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline: false,
        });
        self
    }

    /// Returns the value of the first field called `name`.
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}
