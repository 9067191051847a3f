use serde::Serialize;
use url::Url;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "ico"];

/// What kind of resource a URL points at, judged from its path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Html,
    Image,
    Stylesheet,
    Script,
    Pdf,
    Sitemap,
    Robots,
    Xml,
    Json,
    /// No extension or one we don't recognise; treated as a page
    Other,
}

impl FileKind {
    /// Returns true for static assets that never contain navigable links
    pub fn is_asset(&self) -> bool {
        matches!(
            self,
            Self::Image | Self::Stylesheet | Self::Script | Self::Pdf
        )
    }

    /// Returns true if the resource may be an HTML page worth crawling
    pub fn is_page(&self) -> bool {
        matches!(self, Self::Html | Self::Other)
    }
}

/// Classifies a URL by the extension of its last path segment
pub fn file_kind(url: &Url) -> FileKind {
    let path = url.path().to_ascii_lowercase();
    let last_segment = path.rsplit('/').next().unwrap_or("");

    if last_segment == "robots.txt" {
        return FileKind::Robots;
    }
    if last_segment.ends_with("sitemap.xml") || last_segment.ends_with("sitemap.xml.gz") {
        return FileKind::Sitemap;
    }

    let extension = match last_segment.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => return FileKind::Other,
    };

    match extension {
        "html" | "htm" => FileKind::Html,
        "css" => FileKind::Stylesheet,
        "js" => FileKind::Script,
        "pdf" => FileKind::Pdf,
        "xml" => FileKind::Xml,
        "json" => FileKind::Json,
        ext if IMAGE_EXTENSIONS.contains(&ext) => FileKind::Image,
        _ => FileKind::Other,
    }
}
