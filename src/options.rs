//! Tool-specific request options.
//!
//! Each tool declares an [`OptionSchema`] in the registry. The caller supplies
//! a matching [`ToolOptions`] value and the dispatcher renders it either as
//! extra multipart fields (file tools) or as extra JSON members (text tools).
//! A tool never receives fields that belong to another tool: the schema check
//! in the dispatcher rejects mismatched options before anything is sent.
//!
//! | Schema | Wire fields |
//! |--------|-------------|
//! | `merge` | none; `bookmarks` switches the work path to `/api/pdf-merge-with-bookmarks` |
//! | `document-summary` | `level`, `mode` |
//! | `text-summary` | `level` (JSON) |
//! | `pdf-render` | `dpi`, `format`, `quality` |
//! | `image-layout` | `layout`, `page_size` |
//! | `background` | `model`, `alpha_matting`, `bg_type`, `bg_option`, `bg_color`, `gradient_angle`, `pattern_scale`, `pattern_color`, `refine_edges` |
//! | `compression` | `preset`, `format`, `maintain_aspect`, `preserve_exif`, and `width` / `height` / `target_size` when set |
//! | `speech` | `language`, `speed`, `engine`, `voice_gender`, `style` (JSON) |

use crate::error::DocdashError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a closed set of string values sent on the wire.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DocdashError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(if s.eq_ignore_ascii_case($wire) {
                    return Ok($name::$variant);
                })+
                Err(DocdashError::InvalidConfig(format!(
                    "'{}' is not a valid {} (expected one of: {})",
                    s,
                    stringify!($name),
                    [$($wire),+].join(", ")
                )))
            }
        }
    };
}

wire_enum! {
    /// How much of the source a summary keeps.
    SummaryLevel {
        Brief => "brief",
        Detailed => "detailed",
        Comprehensive => "comprehensive",
    }
}

wire_enum! {
    /// Raster format for PDF page export.
    RenderFormat {
        Png => "PNG",
        Jpg => "JPG",
        Tiff => "TIFF",
    }
}

wire_enum! {
    /// How an image is placed on the PDF page.
    PageLayout {
        Fit => "fit",
        Stretch => "stretch",
        Original => "original",
    }
}

wire_enum! {
    PageSize {
        A4 => "A4",
        Letter => "Letter",
        Legal => "Legal",
        Original => "original",
    }
}

wire_enum! {
    /// Replacement background after the subject is cut out.
    BackgroundKind {
        Solid => "solid",
        Gradient => "gradient",
        Pattern => "pattern",
    }
}

wire_enum! {
    CompressionPreset {
        Web => "web",
        Balanced => "balanced",
        High => "high",
        Archive => "archive",
    }
}

wire_enum! {
    /// Output encoding for image compression.
    ImageFormat {
        Jpeg => "JPEG",
        Png => "PNG",
        Webp => "WEBP",
    }
}

wire_enum! {
    SpeechSpeed {
        Slow => "slow",
        Normal => "normal",
        Fast => "fast",
    }
}

wire_enum! {
    VoiceGender {
        Female => "female",
        Male => "male",
    }
}

/// Which option set a tool understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptionSchema {
    None,
    Merge,
    DocumentSummary,
    TextSummary,
    PdfRender,
    ImageLayout,
    Background,
    Compression,
    Speech,
}

impl OptionSchema {
    pub fn as_str(self) -> &'static str {
        match self {
            OptionSchema::None => "none",
            OptionSchema::Merge => "merge",
            OptionSchema::DocumentSummary => "document-summary",
            OptionSchema::TextSummary => "text-summary",
            OptionSchema::PdfRender => "pdf-render",
            OptionSchema::ImageLayout => "image-layout",
            OptionSchema::Background => "background",
            OptionSchema::Compression => "compression",
            OptionSchema::Speech => "speech",
        }
    }

    /// The option values a service assumes when a field is omitted.
    pub fn default_options(self) -> ToolOptions {
        match self {
            OptionSchema::None => ToolOptions::None,
            OptionSchema::Merge => ToolOptions::Merge(MergeOptions::default()),
            OptionSchema::DocumentSummary => {
                ToolOptions::DocumentSummary(DocumentSummaryOptions::default())
            }
            OptionSchema::TextSummary => ToolOptions::TextSummary(TextSummaryOptions::default()),
            OptionSchema::PdfRender => ToolOptions::PdfRender(PdfRenderOptions::default()),
            OptionSchema::ImageLayout => ToolOptions::ImageLayout(ImageLayoutOptions::default()),
            OptionSchema::Background => ToolOptions::Background(BackgroundOptions::default()),
            OptionSchema::Compression => ToolOptions::Compression(CompressionOptions::default()),
            OptionSchema::Speech => ToolOptions::Speech(SpeechOptions::default()),
        }
    }
}

/// Options for one dispatch. The variant must match the tool's [`OptionSchema`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "schema", rename_all = "kebab-case")]
pub enum ToolOptions {
    #[default]
    None,
    Merge(MergeOptions),
    DocumentSummary(DocumentSummaryOptions),
    TextSummary(TextSummaryOptions),
    PdfRender(PdfRenderOptions),
    ImageLayout(ImageLayoutOptions),
    Background(BackgroundOptions),
    Compression(CompressionOptions),
    Speech(SpeechOptions),
}

impl ToolOptions {
    pub fn schema(&self) -> OptionSchema {
        match self {
            ToolOptions::None => OptionSchema::None,
            ToolOptions::Merge(_) => OptionSchema::Merge,
            ToolOptions::DocumentSummary(_) => OptionSchema::DocumentSummary,
            ToolOptions::TextSummary(_) => OptionSchema::TextSummary,
            ToolOptions::PdfRender(_) => OptionSchema::PdfRender,
            ToolOptions::ImageLayout(_) => OptionSchema::ImageLayout,
            ToolOptions::Background(_) => OptionSchema::Background,
            ToolOptions::Compression(_) => OptionSchema::Compression,
            ToolOptions::Speech(_) => OptionSchema::Speech,
        }
    }

    /// Extra multipart text fields, in the order they are appended.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            ToolOptions::None
            | ToolOptions::Merge(_)
            | ToolOptions::TextSummary(_)
            | ToolOptions::Speech(_) => vec![],
            ToolOptions::DocumentSummary(o) => vec![
                ("level", o.level.to_string()),
                ("mode", o.mode.clone()),
            ],
            ToolOptions::PdfRender(o) => vec![
                ("dpi", o.dpi.to_string()),
                ("format", o.format.to_string()),
                ("quality", o.quality.to_string()),
            ],
            ToolOptions::ImageLayout(o) => vec![
                ("layout", o.layout.to_string()),
                ("page_size", o.page_size.to_string()),
            ],
            ToolOptions::Background(o) => vec![
                ("model", o.model.clone()),
                ("alpha_matting", o.alpha_matting.to_string()),
                ("bg_type", o.bg_type.to_string()),
                ("bg_option", o.bg_option.clone()),
                ("bg_color", o.bg_color.clone()),
                ("gradient_angle", o.gradient_angle.to_string()),
                ("pattern_scale", o.pattern_scale.to_string()),
                ("pattern_color", o.pattern_color.clone()),
                ("refine_edges", o.refine_edges.to_string()),
            ],
            ToolOptions::Compression(o) => {
                let mut fields = vec![
                    ("preset", o.preset.to_string()),
                    ("format", o.format.to_string()),
                    ("maintain_aspect", o.maintain_aspect.to_string()),
                    ("preserve_exif", o.preserve_exif.to_string()),
                ];
                if let Some(w) = o.width {
                    fields.push(("width", w.to_string()));
                }
                if let Some(h) = o.height {
                    fields.push(("height", h.to_string()));
                }
                if let Some(kb) = o.target_size_kb {
                    fields.push(("target_size", kb.to_string()));
                }
                fields
            }
        }
    }

    /// Work path that replaces the tool's default one, if these options
    /// select a different endpoint.
    pub fn work_path(&self) -> Option<&'static str> {
        match self {
            ToolOptions::Merge(MergeOptions { bookmarks: true }) => {
                Some("/api/pdf-merge-with-bookmarks")
            }
            _ => None,
        }
    }

    /// Extra members merged into the JSON body of a text tool.
    pub fn json_members(&self) -> serde_json::Map<String, serde_json::Value> {
        let value = match self {
            ToolOptions::TextSummary(o) => serde_json::to_value(o),
            ToolOptions::Speech(o) => serde_json::to_value(o),
            _ => return serde_json::Map::new(),
        };
        match value {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

/// PDF merge. With `bookmarks` set, the merged file gets one outline entry
/// per source document, titled after its file stem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOptions {
    pub bookmarks: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummaryOptions {
    pub level: SummaryLevel,
    /// Passed through verbatim; the service default is `overall`.
    pub mode: String,
}

impl Default for DocumentSummaryOptions {
    fn default() -> Self {
        Self {
            level: SummaryLevel::Detailed,
            mode: "overall".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSummaryOptions {
    pub level: SummaryLevel,
}

impl Default for TextSummaryOptions {
    fn default() -> Self {
        Self {
            level: SummaryLevel::Detailed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfRenderOptions {
    /// 72–600; the service rejects anything outside.
    pub dpi: u32,
    pub format: RenderFormat,
    /// JPEG quality, 1–100.
    pub quality: u8,
}

impl Default for PdfRenderOptions {
    fn default() -> Self {
        Self {
            dpi: 300,
            format: RenderFormat::Png,
            quality: 95,
        }
    }
}

impl PdfRenderOptions {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageLayoutOptions {
    pub layout: PageLayout,
    pub page_size: PageSize,
}

impl Default for ImageLayoutOptions {
    fn default() -> Self {
        Self {
            layout: PageLayout::Fit,
            page_size: PageSize::A4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundOptions {
    /// Segmentation model: `u2net`, `u2net_human_seg`, `isnet-general-use`.
    pub model: String,
    pub alpha_matting: bool,
    pub bg_type: BackgroundKind,
    /// Colour, gradient or pattern name depending on `bg_type`.
    pub bg_option: String,
    /// Hex colour for solid backgrounds.
    pub bg_color: String,
    /// Degrees.
    pub gradient_angle: u16,
    pub pattern_scale: f32,
    pub pattern_color: String,
    pub refine_edges: bool,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self {
            model: "u2net".to_string(),
            alpha_matting: true,
            bg_type: BackgroundKind::Solid,
            bg_option: "white".to_string(),
            bg_color: "#FFFFFF".to_string(),
            gradient_angle: 45,
            pattern_scale: 1.0,
            pattern_color: "#000000".to_string(),
            refine_edges: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionOptions {
    pub preset: CompressionPreset,
    pub format: ImageFormat,
    pub maintain_aspect: bool,
    pub preserve_exif: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Target output size in kilobytes.
    pub target_size_kb: Option<u32>,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            preset: CompressionPreset::Balanced,
            format: ImageFormat::Jpeg,
            maintain_aspect: true,
            preserve_exif: false,
            width: None,
            height: None,
            target_size_kb: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechOptions {
    /// Language code, e.g. `en`, `es`, `fr`.
    pub language: String,
    pub speed: SpeechSpeed,
    /// `auto`, `edge-tts` or `gtts`.
    pub engine: String,
    pub voice_gender: VoiceGender,
    pub style: String,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            speed: SpeechSpeed::Normal,
            engine: "auto".to_string(),
            voice_gender: VoiceGender::Female,
            style: "professional".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field<'a>(fields: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        fields
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn default_options_match_schema() {
        for schema in [
            OptionSchema::None,
            OptionSchema::Merge,
            OptionSchema::DocumentSummary,
            OptionSchema::TextSummary,
            OptionSchema::PdfRender,
            OptionSchema::ImageLayout,
            OptionSchema::Background,
            OptionSchema::Compression,
            OptionSchema::Speech,
        ] {
            assert_eq!(schema.default_options().schema(), schema);
        }
    }

    #[test]
    fn compression_omits_unset_dimensions() {
        let opts = ToolOptions::Compression(CompressionOptions::default());
        let fields = opts.form_fields();
        assert_eq!(field(&fields, "preset"), Some("balanced"));
        assert_eq!(field(&fields, "format"), Some("JPEG"));
        assert_eq!(field(&fields, "maintain_aspect"), Some("true"));
        assert!(field(&fields, "width").is_none());
        assert!(field(&fields, "height").is_none());
        assert!(field(&fields, "target_size").is_none());
    }

    #[test]
    fn compression_includes_set_dimensions() {
        let opts = ToolOptions::Compression(CompressionOptions {
            width: Some(800),
            target_size_kb: Some(150),
            ..CompressionOptions::default()
        });
        let fields = opts.form_fields();
        assert_eq!(field(&fields, "width"), Some("800"));
        assert_eq!(field(&fields, "target_size"), Some("150"));
        assert!(field(&fields, "height").is_none());
    }

    #[test]
    fn background_fields_use_service_names() {
        let fields = ToolOptions::Background(BackgroundOptions::default()).form_fields();
        let names: Vec<&str> = fields.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            names,
            [
                "model",
                "alpha_matting",
                "bg_type",
                "bg_option",
                "bg_color",
                "gradient_angle",
                "pattern_scale",
                "pattern_color",
                "refine_edges"
            ]
        );
        assert_eq!(field(&fields, "pattern_scale"), Some("1"));
        assert_eq!(field(&fields, "bg_color"), Some("#FFFFFF"));
    }

    #[test]
    fn text_options_become_json_members() {
        let members = ToolOptions::Speech(SpeechOptions::default()).json_members();
        assert_eq!(members["language"], "en");
        assert_eq!(members["speed"], "normal");
        assert_eq!(members["voice_gender"], "female");

        let members = ToolOptions::TextSummary(TextSummaryOptions {
            level: SummaryLevel::Brief,
        })
        .json_members();
        assert_eq!(members["level"], "brief");

        assert!(ToolOptions::None.json_members().is_empty());
        assert!(ToolOptions::Speech(SpeechOptions::default())
            .form_fields()
            .is_empty());
    }

    #[test]
    fn wire_enums_parse_case_insensitively() {
        assert_eq!("JPEG".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
        assert_eq!("webp".parse::<ImageFormat>().unwrap(), ImageFormat::Webp);
        assert_eq!(
            "Comprehensive".parse::<SummaryLevel>().unwrap(),
            SummaryLevel::Comprehensive
        );
        assert!("gif".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn bookmarks_select_the_bookmark_endpoint() {
        assert_eq!(ToolOptions::Merge(MergeOptions::default()).work_path(), None);
        let opts = ToolOptions::Merge(MergeOptions { bookmarks: true });
        assert_eq!(opts.work_path(), Some("/api/pdf-merge-with-bookmarks"));
        assert!(opts.form_fields().is_empty());
        assert_eq!(ToolOptions::None.work_path(), None);
    }

    #[test]
    fn pdf_render_setters_clamp() {
        let o = PdfRenderOptions::default().dpi(20).quality(0);
        assert_eq!(o.dpi, 72);
        assert_eq!(o.quality, 1);
        assert_eq!(PdfRenderOptions::default().dpi(9000).dpi, 600);
    }
}
