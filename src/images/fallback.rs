use reqwest::Url;

pub const INLINE_PLACEHOLDER_TYPE: &str = "image/svg+xml";

const PLACEHOLDER_TITLE_CHARS: usize = 20;

/// One way of producing a cover image. Strategies are tried in order and the first that
/// yields an image wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverStrategy {
    /// The cover thumbnail on the image host.
    Upstream(Url),
    /// An external placeholder service rendering the title.
    Placeholder(Url),
    /// A static SVG served from memory; never fails.
    Inline,
}

impl CoverStrategy {
    /// The ordered chain for a cover: image host thumbnail, placeholder service (when
    /// configured), then the inline SVG.
    pub fn chain(
        image_base: &Url,
        manga_id: &str,
        file_name: &str,
        placeholder: Option<&Url>,
        title: Option<&str>,
    ) -> Vec<CoverStrategy> {
        let mut strategies = Vec::with_capacity(3);

        let mut cover = image_base.clone();
        let has_cover = match cover.path_segments_mut() {
            Ok(mut segments) => {
                segments
                    .pop_if_empty()
                    .push("covers")
                    .push(manga_id)
                    .push(&format!("{}.256.jpg", file_name));
                true
            }
            Err(()) => false,
        };
        if has_cover {
            strategies.push(CoverStrategy::Upstream(cover));
        }

        if let Some(placeholder) = placeholder {
            let text: String = title
                .unwrap_or("No Cover")
                .chars()
                .take(PLACEHOLDER_TITLE_CHARS)
                .collect();
            let mut url = placeholder.clone();
            url.query_pairs_mut().append_pair("text", &text);
            strategies.push(CoverStrategy::Placeholder(url));
        }

        strategies.push(CoverStrategy::Inline);
        strategies
    }

    pub fn name(&self) -> &'static str {
        match self {
            CoverStrategy::Upstream(_) => "upstream",
            CoverStrategy::Placeholder(_) => "placeholder",
            CoverStrategy::Inline => "inline",
        }
    }
}

pub fn inline_placeholder() -> Vec<u8> {
    concat!(
        r##"<svg width="256" height="384" viewBox="0 0 256 384" fill="none" xmlns="http://www.w3.org/2000/svg">"##,
        r##"<rect width="256" height="384" fill="#2a2a4e"/>"##,
        r##"<text x="50%" y="50%" dominant-baseline="middle" text-anchor="middle" fill="#c77dff" "##,
        r##"font-family="Arial, sans-serif" font-size="14">No Cover</text></svg>"##,
    )
    .as_bytes()
    .to_vec()
}
