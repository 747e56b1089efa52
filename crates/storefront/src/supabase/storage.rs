//! Public storage object URLs.

/// Shown when a product has no image.
pub const PLACEHOLDER_IMAGE: &str = "/static/images/placeholder-product.svg";

/// Resolves storage paths to public object URLs.
#[derive(Debug, Clone)]
pub struct StorageUrls {
    public_base: String,
}

impl StorageUrls {
    /// `project_url` is the Supabase project URL, with or without a trailing slash.
    #[must_use]
    pub fn new(project_url: &str) -> Self {
        Self {
            public_base: format!(
                "{}/storage/v1/object/public",
                project_url.trim_end_matches('/')
            ),
        }
    }

    /// URL for `path` (`bucket/object`), or the placeholder image when the
    /// path is absent or blank. Absolute URLs are returned unchanged.
    #[must_use]
    pub fn public_url(&self, path: Option<&str>) -> String {
        match path.map(str::trim) {
            None | Some("") => PLACEHOLDER_IMAGE.to_owned(),
            Some(p) if p.starts_with("https://") || p.starts_with("http://") => p.to_owned(),
            Some(p) => format!("{}/{}", self.public_base, p.trim_start_matches('/')),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_public_object_url() {
        let urls = StorageUrls::new("https://abcd1234.supabase.co/");
        assert_eq!(
            urls.public_url(Some("/products/arepa-flour.jpg")),
            "https://abcd1234.supabase.co/storage/v1/object/public/products/arepa-flour.jpg"
        );
    }

    #[test]
    fn missing_path_uses_placeholder() {
        let urls = StorageUrls::new("https://abcd1234.supabase.co");
        assert_eq!(urls.public_url(None), PLACEHOLDER_IMAGE);
        assert_eq!(urls.public_url(Some("  ")), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn absolute_urls_pass_through() {
        let urls = StorageUrls::new("https://abcd1234.supabase.co");
        let external = "https://cdn.example.com/x.png";
        assert_eq!(urls.public_url(Some(external)), external);
    }
}
