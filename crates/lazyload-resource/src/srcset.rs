//! Responsive source synthesis
//!
//! Local assets are requested through the image host's query convention
//! (`w`, `q`, `fm`). External and pre-optimized assets are passed through
//! untouched and get a single-entry source set.

use lazyload_core::{LoaderConfig, ResourceRequest};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a URL is treated by synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlKind {
    /// Absolute, protocol-relative, data or blob URL
    External,
    /// Already carries the optimization marker or targets the output format
    PreOptimized,
    /// Served by the image host; candidates are synthesized
    Local,
}

impl UrlKind {
    /// Check if the URL is used as-is
    #[inline]
    #[must_use]
    pub fn is_passthrough(self) -> bool {
        !matches!(self, Self::Local)
    }
}

/// One entry of a source set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Candidate URL
    pub url: String,
    /// Width descriptor; `None` for a single unmodified entry
    pub width: Option<u32>,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.width {
            Some(width) => write!(f, "{} {}w", self.url, width),
            None => f.write_str(&self.url),
        }
    }
}

/// Ordered responsive candidates
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceSet {
    candidates: Vec<Candidate>,
}

impl SourceSet {
    /// Source set holding one unmodified URL
    #[must_use]
    pub fn single(url: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                url: url.into(),
                width: None,
            }],
        }
    }

    /// Candidates in ascending width order
    #[inline]
    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Number of candidates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Check if the set is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Check if candidates carry width descriptors
    #[inline]
    #[must_use]
    pub fn is_synthesized(&self) -> bool {
        self.candidates.iter().any(|c| c.width.is_some())
    }

    /// `srcset`-style descriptor string
    #[must_use]
    pub fn descriptor(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, candidate) in self.candidates.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{candidate}")?;
        }
        Ok(())
    }
}

/// Builds active URLs and source sets following the image host convention
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlSynthesizer {
    target_format: String,
    optimization_marker: String,
}

impl UrlSynthesizer {
    /// Create synthesizer
    #[must_use]
    pub fn new(target_format: impl Into<String>, optimization_marker: impl Into<String>) -> Self {
        Self {
            target_format: target_format.into(),
            optimization_marker: optimization_marker.into(),
        }
    }

    /// Create synthesizer from loader configuration
    #[must_use]
    pub fn from_config(config: &LoaderConfig) -> Self {
        Self::new(&config.target_format, &config.optimization_marker)
    }

    /// Format requested for local assets
    #[inline]
    #[must_use]
    pub fn target_format(&self) -> &str {
        &self.target_format
    }

    /// Classify a URL
    #[must_use]
    pub fn classify(&self, url: &str) -> UrlKind {
        if is_external(url) {
            return UrlKind::External;
        }

        let (without_fragment, _) = split_fragment(url);
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (without_fragment, None),
        };

        let marked = !self.optimization_marker.is_empty() && url.contains(&self.optimization_marker);
        let extension_matches = path
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(&self.target_format));
        let format_requested = query
            .is_some_and(|q| q.split('&').any(|pair| pair.starts_with("fm=")));

        if marked || extension_matches || format_requested {
            UrlKind::PreOptimized
        } else {
            UrlKind::Local
        }
    }

    /// URL fetched when the resource enters `Loading`
    ///
    /// Passthrough URLs are returned unchanged. Local URLs get quality and
    /// format parameters, plus the intrinsic width when known.
    #[must_use]
    pub fn active_url(&self, request: &ResourceRequest) -> String {
        let url = request.primary_url.as_str();
        if self.classify(url).is_passthrough() {
            return url.to_string();
        }

        let params = match request.intrinsic_width {
            Some(width) => format!(
                "w={width}&q={}&fm={}",
                request.quality_hint, self.target_format
            ),
            None => format!("q={}&fm={}", request.quality_hint, self.target_format),
        };
        append_query(url, &params)
    }

    /// Responsive candidates for a request
    ///
    /// Widths are emitted ascending with duplicates removed. A local request
    /// without widths yields its active URL as the only entry.
    #[must_use]
    pub fn source_set(&self, request: &ResourceRequest) -> SourceSet {
        let url = request.primary_url.as_str();
        if self.classify(url).is_passthrough() {
            return SourceSet::single(url);
        }

        let mut widths: Vec<u32> = request.candidate_widths.iter().copied().collect();
        widths.sort_unstable();
        widths.dedup();

        if widths.is_empty() {
            return SourceSet::single(self.active_url(request));
        }

        let candidates = widths
            .into_iter()
            .map(|width| Candidate {
                url: append_query(
                    url,
                    &format!(
                        "w={width}&q={}&fm={}",
                        request.quality_hint, self.target_format
                    ),
                ),
                width: Some(width),
            })
            .collect();

        SourceSet { candidates }
    }
}

impl Default for UrlSynthesizer {
    fn default() -> Self {
        Self::from_config(&LoaderConfig::default())
    }
}

/// Absolute, protocol-relative, data or blob URL
#[must_use]
pub fn is_external(url: &str) -> bool {
    const SCHEMES: [&str; 4] = ["http://", "https://", "data:", "blob:"];
    let lowered = url.trim_start().to_ascii_lowercase();
    lowered.starts_with("//") || SCHEMES.iter().any(|scheme| lowered.starts_with(scheme))
}

fn split_fragment(url: &str) -> (&str, Option<&str>) {
    match url.split_once('#') {
        Some((head, fragment)) => (head, Some(fragment)),
        None => (url, None),
    }
}

fn append_query(url: &str, params: &str) -> String {
    let (head, fragment) = split_fragment(url);
    let separator = if head.contains('?') { '&' } else { '?' };
    match fragment {
        Some(fragment) => format!("{head}{separator}{params}#{fragment}"),
        None => format!("{head}{separator}{params}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn synth() -> UrlSynthesizer {
        UrlSynthesizer::default()
    }

    #[test]
    fn classify_external() {
        let s = synth();
        assert_eq!(s.classify("https://cdn.example.com/a.jpg"), UrlKind::External);
        assert_eq!(s.classify("HTTP://cdn.example.com/a.jpg"), UrlKind::External);
        assert_eq!(s.classify("//cdn.example.com/a.jpg"), UrlKind::External);
        assert_eq!(s.classify("data:image/png;base64,AAAA"), UrlKind::External);
        assert_eq!(s.classify("blob:https://app/1234"), UrlKind::External);
    }

    #[test]
    fn classify_pre_optimized() {
        let s = synth();
        assert_eq!(s.classify("/optimized/hero.jpg"), UrlKind::PreOptimized);
        assert_eq!(s.classify("/img/hero.webp"), UrlKind::PreOptimized);
        assert_eq!(s.classify("/img/hero.WEBP?v=2"), UrlKind::PreOptimized);
        assert_eq!(s.classify("/img/hero.jpg?fm=avif"), UrlKind::PreOptimized);
    }

    #[test]
    fn classify_local() {
        let s = synth();
        assert_eq!(s.classify("/img/hero.jpg"), UrlKind::Local);
        assert_eq!(s.classify("img/hero.png?v=3"), UrlKind::Local);
        assert_eq!(s.classify("/img/webp-guide.jpg"), UrlKind::Local);
    }

    #[test]
    fn local_source_set_has_four_ascending_candidates() {
        let request = ResourceRequest::new("/img/hero.jpg");
        let set = synth().source_set(&request);

        assert_eq!(set.len(), 4);
        let widths: Vec<_> = set.candidates().iter().map(|c| c.width).collect();
        assert_eq!(widths, vec![Some(400), Some(800), Some(1200), Some(1600)]);
        assert_eq!(
            set.descriptor(),
            "/img/hero.jpg?w=400&q=85&fm=webp 400w, \
             /img/hero.jpg?w=800&q=85&fm=webp 800w, \
             /img/hero.jpg?w=1200&q=85&fm=webp 1200w, \
             /img/hero.jpg?w=1600&q=85&fm=webp 1600w"
        );
    }

    #[test]
    fn unsorted_widths_are_sorted_and_deduped() {
        let request = ResourceRequest::new("/a.png").with_candidate_widths([1200, 400, 800, 400]);
        let set = synth().source_set(&request);
        let widths: Vec<_> = set.candidates().iter().filter_map(|c| c.width).collect();
        assert_eq!(widths, vec![400, 800, 1200]);
    }

    #[test]
    fn external_source_set_is_single_unmodified() {
        let url = "https://images.example.com/photo.jpg?w=300";
        let request = ResourceRequest::new(url);
        let set = synth().source_set(&request);

        assert_eq!(set.len(), 1);
        assert!(!set.is_synthesized());
        assert_eq!(set.descriptor(), url);
        assert_eq!(synth().active_url(&request), url);
    }

    #[test]
    fn pre_optimized_is_passthrough() {
        let request = ResourceRequest::new("/optimized/banner.jpg");
        assert_eq!(synth().active_url(&request), "/optimized/banner.jpg");
        assert_eq!(synth().source_set(&request).descriptor(), "/optimized/banner.jpg");
    }

    #[test]
    fn active_url_for_local() {
        let request = ResourceRequest::new("/img/a.jpg").with_quality(70);
        assert_eq!(synth().active_url(&request), "/img/a.jpg?q=70&fm=webp");

        let request = request.with_intrinsic_size(640, 480);
        assert_eq!(synth().active_url(&request), "/img/a.jpg?w=640&q=70&fm=webp");
    }

    #[test]
    fn existing_query_and_fragment_preserved() {
        let request = ResourceRequest::new("/img/a.jpg?v=2#top").with_candidate_widths([400]);
        assert_eq!(
            synth().source_set(&request).descriptor(),
            "/img/a.jpg?v=2&w=400&q=85&fm=webp#top 400w"
        );
    }

    #[test]
    fn no_widths_falls_back_to_active_url() {
        let request = ResourceRequest::new("/img/a.jpg").with_candidate_widths([]);
        let set = synth().source_set(&request);
        assert_eq!(set.len(), 1);
        assert_eq!(set.descriptor(), "/img/a.jpg?q=85&fm=webp");
    }

    #[test]
    fn custom_format_from_config() {
        let config = LoaderConfig::new().with_target_format("avif");
        let s = UrlSynthesizer::from_config(&config);
        assert_eq!(s.classify("/a.avif"), UrlKind::PreOptimized);
        assert_eq!(s.classify("/a.webp"), UrlKind::Local);

        let request = ResourceRequest::from_config("/a.jpg", &config);
        assert_eq!(s.active_url(&request), "/a.jpg?q=85&fm=avif");
    }

    proptest! {
        #[test]
        fn prop_local_candidates_ascending_and_annotated(
            widths in proptest::collection::vec(1u32..4000, 1..8),
            quality in 1u8..=100,
        ) {
            let request = ResourceRequest::new("/img/p.jpg")
                .with_candidate_widths(widths.clone())
                .with_quality(quality);
            let set = synth().source_set(&request);

            let mut expected = widths;
            expected.sort_unstable();
            expected.dedup();
            prop_assert_eq!(set.len(), expected.len());

            for (candidate, width) in set.candidates().iter().zip(expected) {
                prop_assert_eq!(candidate.width, Some(width));
                let expected_quality = format!("q={quality}");
                prop_assert!(candidate.url.contains(&expected_quality));
                prop_assert!(candidate.url.ends_with("fm=webp"));
            }
        }

        #[test]
        fn prop_external_never_expanded(
            host in "[a-z]{1,12}",
            path in "[a-z0-9/]{0,20}",
            widths in proptest::collection::vec(1u32..4000, 0..8),
        ) {
            let url = format!("https://{host}.example/{path}");
            let request = ResourceRequest::new(url.clone()).with_candidate_widths(widths);
            let set = synth().source_set(&request);
            prop_assert_eq!(set.descriptor(), url);
        }
    }
}
