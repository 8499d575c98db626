/*!
 * Splitting the document into per-scene chunks.
 *
 * A chunk runs from its slugline's offset up to the next resolved offset
 * beyond it, or to the end of the document. An unresolved slugline yields an
 * empty chunk.
 */

use serde::Serialize;

use crate::extraction::document::Document;
use crate::extraction::offsets::ResolvedOffset;

/// Text belonging to one scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneChunk {
    pub slugline_index: usize,
    /// Byte range `[start, end)` in the document
    pub start: usize,
    pub end: usize,
    #[serde(skip)]
    pub text: String,
}

impl SceneChunk {
    /// Whether there is nothing to extract from
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Build one chunk per offset, in slugline-index order
pub fn segment(document: &Document, offsets: &[ResolvedOffset]) -> Vec<SceneChunk> {
    let mut ordered: Vec<&ResolvedOffset> = offsets.iter().collect();
    ordered.sort_by_key(|offset| offset.slugline_index);

    ordered
        .iter()
        .enumerate()
        .map(|(position, offset)| {
            let Some(start) = offset.char_offset else {
                return SceneChunk {
                    slugline_index: offset.slugline_index,
                    start: 0,
                    end: 0,
                    text: String::new(),
                };
            };

            let end = ordered[position + 1..]
                .iter()
                .filter_map(|next| next.char_offset)
                .find(|next| *next > start)
                .unwrap_or(document.len());

            SceneChunk {
                slugline_index: offset.slugline_index,
                start,
                end,
                text: document.slice(start, end).to_string(),
            }
        })
        .collect()
}
