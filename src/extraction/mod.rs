/*!
 * Extraction and segmentation stages.
 *
 * Leaf-first:
 * - `normalize`: canonical text form used for comparisons
 * - `sluglines`: locating scene headings
 * - `offsets`: resolving heading positions in the raw text
 * - `segmenter`: carving the document into scene chunks
 * - `scenes`: structured per-scene extraction with retry
 */

pub mod document;
pub mod json;
pub mod normalize;
pub mod offsets;
pub mod prompts;
pub mod retry;
pub mod scenes;
pub mod segmenter;
pub mod service;
pub mod sluglines;

pub use document::Document;
pub use offsets::{OffsetResolver, ResolvedOffset};
pub use retry::RetryPolicy;
pub use scenes::{ActionBeat, SceneDetailExtractor, SceneResult, StructuredScene};
pub use segmenter::SceneChunk;
pub use service::ExtractionService;
pub use sluglines::{Slugline, SluglineLocator};
