/*!
 * Common test utilities for the scenewright test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// Re-export the scripted extractor helpers
pub mod mock_extractor;

/// Two-scene document using typographic dashes
pub const SCENARIO_SCRIPT: &str = "1 INT. HOUSE – DAY\nJohn enters.\n2 EXT. GARDEN – DAY\nJohn leaves.";

/// Screenplay with lettered scene numbers, a continuation heading and dialogue
pub const LETTERED_SCRIPT: &str = r#"FADE IN:

1 INT. KITCHEN - MORNING

MARY pours coffee.

                    MARY
          Where is everyone?

2 EXT. BACKYARD - DAY

TOM (V.O.) calls out from behind the fence.

3A INT. GARAGE - NIGHT

Tom fixes the car.

3B INT. GARAGE - NIGHT

                    TOM
          Almost done.

3B INT. GARAGE - NIGHT (CONT'D)

Tom wipes his hands.

4 EXT. STREET - DUSK

Mary drives away.
"#;

/// Headings of `LETTERED_SCRIPT` after continuation removal
pub const LETTERED_HEADINGS: [&str; 5] = [
    "1 INT. KITCHEN - MORNING",
    "2 EXT. BACKYARD - DAY",
    "3A INT. GARAGE - NIGHT",
    "3B INT. GARAGE - NIGHT",
    "4 EXT. STREET - DUSK",
];

/// Synthetic screenplay with `scenes` numbered scenes
pub fn synthetic_script(scenes: usize) -> (String, Vec<String>) {
    const TIMES: [&str; 4] = ["DAY", "NIGHT", "MORNING", "EVENING"];
    let mut text = String::from("FADE IN:\n\n");
    let mut headings = Vec::with_capacity(scenes);

    for number in 1..=scenes {
        let marker = if number % 2 == 0 { "EXT." } else { "INT." };
        let heading = format!("{} {} LOCATION {} - {}", number, marker, number, TIMES[number % TIMES.len()]);
        text.push_str(&heading);
        text.push_str("\n\nSomething happens in this place.\n\n                    ALEX\n          A line of dialogue.\n\n");
        headings.push(heading);
    }
    text.push_str("FADE OUT.\n");

    (text, headings)
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Initialize test logging once; later calls are no-ops
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
