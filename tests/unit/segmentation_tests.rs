/*!
 * Offset resolution and segmentation properties.
 */

use scenewright::extraction::offsets::MatchStrategy;
use scenewright::extraction::segmenter::segment;
use scenewright::extraction::sluglines::{finalize_sluglines, scan_sluglines};
use scenewright::extraction::{Document, OffsetResolver, Slugline};

use crate::common::{LETTERED_SCRIPT, SCENARIO_SCRIPT, synthetic_script};

fn sluglines(texts: &[&str]) -> Vec<Slugline> {
    finalize_sluglines(texts.iter().map(|text| text.to_string()))
}

#[test]
fn test_segment_scenarioDocument_shouldSplitAtHeadings() {
    let document = Document::new(SCENARIO_SCRIPT);
    let sluglines = sluglines(&["1 INT. HOUSE – DAY", "2 EXT. GARDEN – DAY"]);

    let offsets = OffsetResolver::new().resolve_all(&document, &sluglines);
    let chunks = segment(&document, &offsets);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].text, "1 INT. HOUSE – DAY\nJohn enters.\n");
    assert_eq!(chunks[1].text, "2 EXT. GARDEN – DAY\nJohn leaves.");
}

#[test]
fn test_segment_syntheticScript_shouldTileDocumentWithoutGapsOrOverlaps() {
    let (text, headings) = synthetic_script(40);
    let document = Document::new(text.as_str());
    let headings: Vec<&str> = headings.iter().map(String::as_str).collect();
    let sluglines = sluglines(&headings);

    let offsets = OffsetResolver::new().resolve_all(&document, &sluglines);
    let chunks = segment(&document, &offsets);

    assert_eq!(chunks.len(), 40);
    for pair in chunks.windows(2) {
        assert!(pair[0].start < pair[1].start);
        assert_eq!(pair[0].end, pair[1].start);
    }
    assert_eq!(chunks.last().unwrap().end, document.len());

    let rebuilt: String = chunks.iter().map(|chunk| chunk.text.as_str()).collect();
    assert_eq!(rebuilt, &text[chunks[0].start..]);

    for (chunk, heading) in chunks.iter().zip(&headings) {
        assert!(chunk.text.starts_with(heading));
    }
}

#[test]
fn test_resolve_sameInputs_shouldBeDeterministic() {
    let document = Document::new(LETTERED_SCRIPT);
    let sluglines = scan_sluglines(&document);
    let resolver = OffsetResolver::new();

    let first = resolver.resolve_all(&document, &sluglines);
    for _ in 0..5 {
        assert_eq!(resolver.resolve_all(&document, &sluglines), first);
    }
    for slugline in &sluglines {
        assert_eq!(resolver.resolve(&document, slugline), resolver.resolve(&document, slugline));
    }
}

#[test]
fn test_resolve_offsets_shouldBeNonDecreasingInIndexOrder() {
    let document = Document::new(LETTERED_SCRIPT);
    let sluglines = scan_sluglines(&document);

    let offsets = OffsetResolver::new().resolve_all(&document, &sluglines);

    assert!(offsets.iter().all(|offset| offset.is_resolved()));
    let positions: Vec<usize> = offsets.iter().filter_map(|offset| offset.char_offset).collect();
    assert!(positions.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn test_segment_continuationHeading_shouldStayInsideItsScene() {
    let document = Document::new(LETTERED_SCRIPT);
    let sluglines = scan_sluglines(&document);

    let chunks = segment(&document, &OffsetResolver::new().resolve_all(&document, &sluglines));

    let scene_3b = &chunks[3];
    assert!(scene_3b.text.starts_with("3B INT. GARAGE - NIGHT\n"));
    assert!(scene_3b.text.contains("(CONT'D)"));
    assert!(scene_3b.text.contains("Tom wipes his hands."));
    assert!(chunks[4].text.starts_with("4 EXT. STREET - DUSK"));
}

#[test]
fn test_resolve_headingReworded_shouldFallBackToNumberAndLocation() {
    let document = Document::new("12 INT. WAREHOUSE, BACK ROOM - NIGHT\nCrates everywhere.\n");

    let resolved = OffsetResolver::new().resolve(
        &document,
        &Slugline {
            index: 1,
            text: "12 INT. WAREHOUSE - NIGHT".into(),
        },
    );

    assert_eq!(resolved.char_offset, Some(0));
    assert_eq!(resolved.strategy, Some(MatchStrategy::NumberAndLocation));
}

#[test]
fn test_resolve_missingHeading_shouldStayUnresolvedAndYieldEmptyChunk() {
    let document = Document::new(SCENARIO_SCRIPT);
    let sluglines = sluglines(&["1 INT. HOUSE – DAY", "9 INT. SPACESHIP – NIGHT", "2 EXT. GARDEN – DAY"]);

    let offsets = OffsetResolver::new().resolve_all(&document, &sluglines);
    let chunks = segment(&document, &offsets);

    assert!(!offsets[1].is_resolved());
    assert_eq!(offsets[1].recorded_offset(), 0);
    assert!(chunks[1].is_empty());
    assert_eq!(chunks[0].text, "1 INT. HOUSE – DAY\nJohn enters.\n");
}
