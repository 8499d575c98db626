/*!
 * Tests for slugline location: dense indices, continuation handling and
 * the regex fallback.
 */

use std::sync::Arc;

use scenewright::errors::{ExtractionError, ProviderError};
use scenewright::extraction::sluglines::{
    SluglineLocator, SluglineSource, finalize_sluglines, parse_slugline_response, scan_sluglines,
};
use scenewright::extraction::segmenter::segment;
use scenewright::extraction::{Document, OffsetResolver, RetryPolicy};
use scenewright::providers::mock::{MockProvider, MockReply};

use crate::common::{LETTERED_HEADINGS, LETTERED_SCRIPT};

fn locator(provider: MockProvider) -> SluglineLocator {
    SluglineLocator::new(Arc::new(provider), RetryPolicy::immediate(3), 8192)
}

fn assert_dense(indices: impl IntoIterator<Item = usize>) {
    for (expected, index) in (1..).zip(indices) {
        assert_eq!(index, expected);
    }
}

#[test]
fn test_scanSluglines_letteredScript_shouldSkipContinuationAndNumberDensely() {
    let sluglines = scan_sluglines(&Document::new(LETTERED_SCRIPT));

    let texts: Vec<&str> = sluglines.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, LETTERED_HEADINGS);
    assert_dense(sluglines.iter().map(|s| s.index));
}

#[test]
fn test_finalizeSluglines_printedNumbersIgnored_shouldStayConsecutive() {
    let sluglines = finalize_sluglines(
        ["12 INT. A - DAY", "3A INT. B - DAY", "3B INT. B - DAY", "40 EXT. C - NIGHT"]
            .into_iter()
            .map(String::from),
    );

    assert_eq!(sluglines.len(), 4);
    assert_dense(sluglines.iter().map(|s| s.index));
    assert_eq!(sluglines[1].text, "3A INT. B - DAY");
    assert_eq!(sluglines[2].text, "3B INT. B - DAY");
}

#[test]
fn test_scanSluglines_repeatedUnnumberedHeading_shouldKeepEachScene() {
    let document = Document::new("INT. CAR - DAY\nThey drive.\nINT. CAR - DAY\nThey drive on.\n");

    let sluglines = scan_sluglines(&document);
    let offsets = OffsetResolver::new().resolve_all(&document, &sluglines);
    let chunks = segment(&document, &offsets);

    assert_eq!(sluglines.len(), 2);
    assert_eq!(chunks[0].text, "INT. CAR - DAY\nThey drive.\n");
    assert_eq!(chunks[1].text, "INT. CAR - DAY\nThey drive on.\n");
}

#[test]
fn test_parseSlugline_serviceListsContinuation_shouldDropIt() {
    let response = r#"Sure, here you go:
```json
[
  {"index": 1, "text": "3A INT. X – DAY"},
  {"index": 2, "text": "3A INT. X – DAY (CONT'D)"},
  {"index": 7, "text": "4 EXT. Y – NIGHT"}
]
```"#;

    let sluglines = parse_slugline_response(response).unwrap();

    assert_eq!(sluglines.len(), 2);
    assert_eq!(sluglines[1].index, 2);
    assert_eq!(sluglines[1].text, "4 EXT. Y – NIGHT");
}

#[tokio::test]
async fn test_locate_serviceReply_shouldUseService() {
    let provider = MockProvider::scripted(vec![MockReply::text(
        r#"{"sluglines": [{"text": "1 INT. KITCHEN - MORNING", "line_number": 3}]}"#,
    )]);

    let located = locator(provider).locate(&Document::new(LETTERED_SCRIPT)).await.unwrap();

    assert_eq!(located.source, SluglineSource::Service);
    assert_eq!(located.sluglines.len(), 1);
}

#[tokio::test]
async fn test_locate_malformedReplies_shouldFallBackToRegex() {
    let provider = MockProvider::responder(|_, _| Ok("I could not find any headings.".to_string()));

    let located = locator(provider.clone())
        .locate(&Document::new(LETTERED_SCRIPT))
        .await
        .unwrap();

    assert_eq!(located.source, SluglineSource::RegexFallback);
    assert_eq!(located.sluglines.len(), LETTERED_HEADINGS.len());
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test]
async fn test_locate_serviceUnreachable_shouldFallBackToRegex() {
    let provider = MockProvider::failing(ProviderError::ConnectionError("refused".into()));

    let located = locator(provider).locate(&Document::new(LETTERED_SCRIPT)).await.unwrap();

    assert_eq!(located.source, SluglineSource::RegexFallback);
}

#[tokio::test]
async fn test_locate_nothingAnywhere_shouldBeFatal() {
    let provider = MockProvider::responder(|_, _| Ok("[]".to_string()));

    let result = locator(provider).locate(&Document::new("A letter, not a screenplay.")).await;

    assert!(matches!(result, Err(ExtractionError::Fatal(_))));
}
