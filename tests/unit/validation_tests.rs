/*!
 * Result validator tests.
 */

use scenewright::extraction::scenes::{PARSING_FAILED, SceneResult, StructuredScene};
use scenewright::validation::{ResultValidator, ValidationConfig};

use crate::common::mock_extractor::scene_json;

fn scene(index: usize, number: &str, int_ext: &str, location: &str, time: &str) -> SceneResult {
    let mut value = scene_json(number, int_ext, location, time, &["ALEX"]);
    value["scene_index"] = index.into();
    SceneResult::Extracted(serde_json::from_value::<StructuredScene>(value).unwrap())
}

fn validator() -> ResultValidator {
    ResultValidator::new(ValidationConfig::default())
}

#[test]
fn test_validate_cleanSet_shouldSucceedWithoutWarnings() {
    let report = validator().validate(&[
        scene(1, "1", "INT", "KITCHEN", "DAY"),
        scene(2, "2", "EXT", "GARDEN", "NIGHT"),
    ]);

    assert!(report.success);
    assert!(report.errors.is_empty());
    assert!(report.warnings.is_empty());
}

#[test]
fn test_validate_duplicateSceneNumbers_shouldReportOffendingValue() {
    let report = validator().validate(&[
        scene(1, "3A", "INT", "KITCHEN", "DAY"),
        scene(2, "3B", "INT", "KITCHEN", "DAY"),
        scene(3, "3a", "INT", "KITCHEN", "DAY"),
    ]);

    assert!(!report.success);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("3A"));
}

#[test]
fn test_validate_shortLocationAndOddTime_shouldOnlyWarn() {
    let report = validator().validate(&[
        scene(1, "1", "INT", "A", "GOLDEN HOUR"),
        scene(2, "2", "INT/EXT", "CAR", "DAY"),
    ]);

    assert!(report.success);
    assert!(report.errors.is_empty());
    assert_eq!(report.warnings.len(), 3);
}

#[test]
fn test_validate_extraCommonTimes_shouldSilenceWarning() {
    let config = ValidationConfig {
        extra_common_times: vec!["GOLDEN HOUR".to_string()],
        ..ValidationConfig::default()
    };

    let report = ResultValidator::new(config).validate(&[scene(1, "1", "INT", "KITCHEN", "golden hour")]);

    assert!(report.warnings.is_empty());
}

#[test]
fn test_validate_invalidIntExt_shouldBeError() {
    let report = validator().validate(&[scene(1, "1", "OUTSIDE", "KITCHEN", "DAY")]);

    assert!(!report.success);
}

#[test]
fn test_validate_failedPlaceholder_shouldWarnNotError() {
    let report = validator().validate(&[
        scene(1, "1", "INT", "KITCHEN", "DAY"),
        SceneResult::failed(2, PARSING_FAILED),
    ]);

    assert!(report.success);
    assert_eq!(report.warnings.len(), 1);
}
