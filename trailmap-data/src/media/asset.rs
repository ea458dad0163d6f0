use camino::{Utf8Path, Utf8PathBuf};
use sha2::{Digest, Sha256};
use trailmap_core::LayerName;
use url::Url;

/// Image extensions kept when inferring a local file name.
pub const KNOWN_EXTENSIONS: [&str; 9] = [
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "svg", "tif", "tiff",
];

/// Extension used when the URL path carries no known image suffix.
pub const DEFAULT_EXTENSION: &str = ".jpg";

/// Number of hex characters of the URL digest used in file names.
const HASH_PREFIX_LEN: usize = 12;

/// A remote asset and the local path it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    url: String,
    file_name: String,
    relative_path: Utf8PathBuf,
}

impl MediaAsset {
    /// Derive the local name for `url`, first referenced by the feature at
    /// `position` in `layer`.
    ///
    /// # Examples
    /// ```
    /// use camino::Utf8Path;
    /// use trailmap_core::LayerName;
    /// use trailmap_data::media::MediaAsset;
    ///
    /// let layer = LayerName::new("Hiking Trails").expect("valid layer");
    /// let media_dir = Utf8Path::new("media");
    /// let asset = MediaAsset::derive("https://cdn.example/photo.PNG?size=large", &layer, 7, media_dir);
    /// assert!(asset.file_name().starts_with("hiking_trails_7_"));
    /// assert!(asset.file_name().ends_with(".png"));
    /// assert_eq!(asset.relative_path().parent(), Some(media_dir));
    /// ```
    #[must_use]
    pub fn derive(url: &str, layer: &LayerName, position: usize, media_dir: &Utf8Path) -> Self {
        let file_name = format!(
            "{}_{position}_{}{}",
            layer.file_stem(),
            url_digest_prefix(url),
            infer_extension(url)
        );
        let relative_path = media_dir.join(&file_name);
        Self {
            url: url.to_owned(),
            file_name,
            relative_path,
        }
    }

    /// Remote URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Local file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Path relative to the output directory, as written into properties.
    #[must_use]
    pub fn relative_path(&self) -> &Utf8Path {
        &self.relative_path
    }
}

fn url_digest_prefix(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
    hex.truncate(HASH_PREFIX_LEN);
    hex
}

/// Infer a lowercase file extension, including the dot, from the URL path.
///
/// Query strings and fragments are ignored. Unknown or missing suffixes fall
/// back to [`DEFAULT_EXTENSION`].
#[must_use]
pub fn infer_extension(url: &str) -> String {
    let path = Url::parse(url).map_or_else(
        |_| {
            url.split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_owned()
        },
        |parsed| parsed.path().to_owned(),
    );
    path.rsplit('/')
        .next()
        .and_then(|segment| segment.rsplit_once('.'))
        .map(|(_, suffix)| suffix.to_ascii_lowercase())
        .filter(|suffix| KNOWN_EXTENSIONS.contains(&suffix.as_str()))
        .map_or_else(|| DEFAULT_EXTENSION.to_owned(), |suffix| format!(".{suffix}"))
}

/// Split a media-links value into URLs, accepting whitespace and commas as
/// separators.
///
/// # Examples
/// ```
/// use trailmap_data::media::split_links;
///
/// assert_eq!(split_links("https://a/1.jpg, https://a/2.jpg  https://a/3.jpg"), [
///     "https://a/1.jpg",
///     "https://a/2.jpg",
///     "https://a/3.jpg",
/// ]);
/// assert!(split_links(" , ").is_empty());
/// ```
#[must_use]
pub fn split_links(value: &str) -> Vec<&str> {
    value
        .split(|ch: char| ch.is_whitespace() || ch == ',')
        .filter(|link| !link.is_empty())
        .collect()
}
