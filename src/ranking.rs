//! Quality ranking and the selection menu built from it.
//!
//! Pure data transformation: nothing in here touches the network or disk.

use crate::error::{AppError, Result};
use crate::stream::{non_empty, StreamDescriptor};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::num::ParseIntError;
use tracing::warn;

const RESOLUTION_SUFFIX: &str = "p";
const BITRATE_SUFFIX: &str = "kbps";
const UNKNOWN_QUALITY: &str = "unknown";

/// Computes the sort key of a descriptor.
///
/// A resolution ending in `p` wins, then a bitrate ending in `kbps`,
/// otherwise the key is zero. The numeric part must be a plain integer.
///
/// # Examples
///
/// ```
/// use ytgrab::{ranking::rank_key, StreamDescriptor};
///
/// let stream = StreamDescriptor {
///     resolution: Some("1080p".to_string()),
///     abr: None,
///     mime_type: "video/mp4".to_string(),
///     subtype: "mp4".to_string(),
///     handle: (),
/// };
/// assert_eq!(rank_key(&stream).unwrap(), 1080);
/// ```
pub fn rank_key<H>(stream: &StreamDescriptor<H>) -> std::result::Result<u64, ParseIntError> {
    if let Some(value) = non_empty(&stream.resolution).and_then(|r| r.strip_suffix(RESOLUTION_SUFFIX)) {
        return value.trim().parse();
    }
    if let Some(value) = non_empty(&stream.abr).and_then(|b| b.strip_suffix(BITRATE_SUFFIX)) {
        return value.trim().parse();
    }
    Ok(0)
}

/// Orders streams by descending quality.
///
/// The sort is stable, so equal keys keep adapter order. If any key cannot
/// be computed the input order is returned unchanged and a warning logged;
/// selection stays possible even when ranking degrades.
pub fn rank<H>(streams: &[StreamDescriptor<H>]) -> Vec<&StreamDescriptor<H>> {
    let keys = match streams
        .iter()
        .map(rank_key)
        .collect::<std::result::Result<Vec<_>, _>>()
    {
        Ok(keys) => keys,
        Err(e) => {
            warn!("Error sorting streams, keeping adapter order: {}", e);
            return streams.iter().collect();
        }
    };

    let mut ranked: Vec<_> = keys.into_iter().zip(streams).collect();
    ranked.sort_by_key(|(key, _)| Reverse(*key));
    ranked.into_iter().map(|(_, stream)| stream).collect()
}

/// Display label of a stream, e.g. `"720p (video/mp4)"`.
pub fn label<H>(stream: &StreamDescriptor<H>) -> String {
    format!(
        "{} ({})",
        stream.quality().unwrap_or(UNKNOWN_QUALITY),
        stream.mime_type
    )
}

/// A labelled menu entry.
#[derive(Debug, Clone)]
pub struct MenuEntry<H> {
    pub label: String,
    pub stream: StreamDescriptor<H>,
}

/// Quality-ordered menu of one category, with label lookup.
///
/// Labels are assumed unique within a category. When two streams share a
/// label, the entry stays at the position of the first one but resolves to
/// the later stream.
#[derive(Debug, Clone)]
pub struct SelectionMenu<H> {
    entries: Vec<MenuEntry<H>>,
    by_label: HashMap<String, usize>,
    ranked: bool,
}

impl<H: Clone> SelectionMenu<H> {
    pub fn build(streams: &[StreamDescriptor<H>]) -> Self {
        let ranked = streams.iter().all(|s| rank_key(s).is_ok());
        let mut entries: Vec<MenuEntry<H>> = Vec::with_capacity(streams.len());
        let mut by_label: HashMap<String, usize> = HashMap::with_capacity(streams.len());

        for stream in rank(streams) {
            let label = label(stream);
            if let Some(&index) = by_label.get(&label) {
                entries[index].stream = stream.clone();
                continue;
            }
            by_label.insert(label.clone(), entries.len());
            entries.push(MenuEntry {
                label,
                stream: stream.clone(),
            });
        }

        Self {
            entries,
            by_label,
            ranked,
        }
    }
}

impl<H> SelectionMenu<H> {
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    pub fn entries(&self) -> &[MenuEntry<H>] {
        &self.entries
    }

    pub fn get(&self, label: &str) -> Option<&StreamDescriptor<H>> {
        self.by_label.get(label).map(|&i| &self.entries[i].stream)
    }

    pub fn first(&self) -> Option<&MenuEntry<H>> {
        self.entries.first()
    }

    /// Resolves a user's pick, given either as an exact label or as a
    /// 1-based menu position.
    pub fn resolve(&self, choice: &str) -> Result<&MenuEntry<H>> {
        let choice = choice.trim();
        if let Some(&index) = self.by_label.get(choice) {
            return Ok(&self.entries[index]);
        }
        choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.entries.get(i))
            .ok_or_else(|| AppError::UnknownSelection(choice.to_string()))
    }

    /// False when ranking fell back to adapter order.
    pub fn is_ranked(&self) -> bool {
        self.ranked
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{CategorizedStreams, Category};

    fn stream(resolution: Option<&str>, abr: Option<&str>, mime: &str, id: u32) -> StreamDescriptor<u32> {
        StreamDescriptor {
            resolution: resolution.map(String::from),
            abr: abr.map(String::from),
            mime_type: mime.to_string(),
            subtype: mime.rsplit('/').next().unwrap_or("bin").to_string(),
            handle: id,
        }
    }

    fn video(resolution: &str, id: u32) -> StreamDescriptor<u32> {
        stream(Some(resolution), None, "video/mp4", id)
    }

    fn audio(abr: &str, id: u32) -> StreamDescriptor<u32> {
        stream(None, Some(abr), "audio/mp4", id)
    }

    fn ids(ranked: &[&StreamDescriptor<u32>]) -> Vec<u32> {
        ranked.iter().map(|s| s.handle).collect()
    }

    #[test]
    fn resolutions_rank_in_descending_order() {
        let streams = vec![video("360p", 1), video("1080p", 2), video("144p", 3), video("720p", 4)];
        let ranked = rank(&streams);
        let keys: Vec<u64> = ranked.iter().map(|s| rank_key(s).unwrap()).collect();
        assert!(keys.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(ids(&ranked), [2, 4, 1, 3]);
    }

    #[test]
    fn bitrates_rank_in_descending_order() {
        let streams = vec![audio("48kbps", 1), audio("160kbps", 2), audio("128kbps", 3)];
        assert_eq!(ids(&rank(&streams)), [2, 3, 1]);
    }

    #[test]
    fn mixed_entries_share_one_order_and_unknowns_go_last() {
        let streams = vec![
            stream(None, None, "video/webm", 1),
            audio("160kbps", 2),
            video("144p", 3),
            video("720p", 4),
        ];
        assert_eq!(ids(&rank(&streams)), [4, 2, 3, 1]);
    }

    #[test]
    fn resolution_without_suffix_falls_back_to_bitrate() {
        let s = stream(Some("hd"), Some("96kbps"), "video/mp4", 1);
        assert_eq!(rank_key(&s).unwrap(), 96);
    }

    #[test]
    fn equal_keys_keep_adapter_order() {
        let streams = vec![
            stream(Some("720p"), None, "video/webm", 1),
            video("1080p", 2),
            stream(Some("720p"), None, "video/mp4", 3),
            stream(Some("720p"), None, "video/3gpp", 4),
        ];
        assert_eq!(ids(&rank(&streams)), [2, 1, 3, 4]);
    }

    #[test]
    fn malformed_key_keeps_input_order() {
        let streams = vec![video("360p", 1), video("abcp", 2), video("1080p", 3)];
        assert_eq!(ids(&rank(&streams)), [1, 2, 3]);

        let menu = SelectionMenu::build(&streams);
        assert!(!menu.is_ranked());
        assert_eq!(menu.len(), 3);
        assert_eq!(menu.resolve("3").unwrap().stream.handle, 3);
    }

    #[test]
    fn video_category_menu_matches_expected_order() {
        let mut categorized = CategorizedStreams::new();
        categorized.push(Category::Video, video("480p", 1));
        categorized.push(Category::Video, video("1080p", 2));
        categorized.push(Category::Audio, audio("128kbps", 3));

        let menu = SelectionMenu::build(categorized.get(Category::Video));
        let labels: Vec<_> = menu.labels().collect();
        assert_eq!(labels, ["1080p (video/mp4)", "480p (video/mp4)"]);

        let audio_menu = SelectionMenu::build(categorized.get(Category::Audio));
        assert_eq!(audio_menu.labels().collect::<Vec<_>>(), ["128kbps (audio/mp4)"]);
    }

    #[test]
    fn labels_differ_by_mime_type() {
        let streams = vec![
            stream(Some("720p"), None, "video/mp4", 1),
            stream(Some("720p"), None, "video/webm", 2),
        ];
        let menu = SelectionMenu::build(&streams);
        assert_eq!(menu.len(), 2);
        assert_eq!(menu.get("720p (video/mp4)").unwrap().handle, 1);
        assert_eq!(menu.get("720p (video/webm)").unwrap().handle, 2);
    }

    #[test]
    fn duplicate_labels_keep_the_later_stream() {
        let streams = vec![video("720p", 1), video("1080p", 2), video("720p", 3)];
        let menu = SelectionMenu::build(&streams);
        assert_eq!(menu.labels().collect::<Vec<_>>(), ["1080p (video/mp4)", "720p (video/mp4)"]);
        assert_eq!(menu.get("720p (video/mp4)").unwrap().handle, 3);
    }

    #[test]
    fn stream_without_quality_gets_placeholder_label() {
        let s = stream(None, None, "video/mp4", 1);
        assert_eq!(label(&s), "unknown (video/mp4)");
    }

    #[test]
    fn resolve_accepts_labels_and_positions() {
        let streams = vec![video("480p", 1), video("1080p", 2)];
        let menu = SelectionMenu::build(&streams);
        assert_eq!(menu.resolve("480p (video/mp4)").unwrap().stream.handle, 1);
        assert_eq!(menu.resolve("1").unwrap().stream.handle, 2);
        assert!(menu.resolve("0").is_err());
        assert!(menu.resolve("3").is_err());
        assert!(menu.resolve("720p (video/mp4)").is_err());
    }

    #[test]
    fn empty_category_builds_empty_menu() {
        let menu = SelectionMenu::<u32>::build(&[]);
        assert!(menu.is_empty());
        assert!(menu.first().is_none());
        assert!(menu.is_ranked());
    }
}
