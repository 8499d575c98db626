/*!
 * Prompt templates for the two structured-extraction calls.
 *
 * Both templates ask for JSON only; responses are still cleaned defensively
 * before parsing.
 */

/// Marker used as the following slugline of the last scene
pub const END_OF_SCRIPT: &str = "END OF SCRIPT";

/// System instruction shared by both calls
pub const SYSTEM_PROMPT: &str = "You are a meticulous script supervisor. You convert screenplay text into strictly valid JSON. You never add commentary, never invent content that is not in the text, and never wrap the JSON in markdown.";

const SLUGLINE_TEMPLATE: &str = r#"List every scene heading (slugline) in the screenplay below.

## Rules
- Return a JSON object of the form {"sluglines": [{"index": 1, "text": "..."}]}
- "index" starts at 1 and increases by exactly 1 for each entry, in document order
- "text" is the heading line copied exactly as it appears in the document
- A heading that repeats an earlier scene number with CONT'D or CONTINUED is not a new scene; leave it out
- Lettered scene numbers such as 3A and 3B are separate scenes
- Continue to the very end of the document; do not stop early

## Screenplay
<<<
{document}
>>>"#;

const SCENE_TEMPLATE: &str = r#"Extract the scene that starts at the heading "{slugline}" and ends right before "{next_slugline}".

## Output schema
Return one JSON object with exactly these fields:
{
  "scene_index": {scene_index},
  "scene_number": "printed scene number, e.g. 3A",
  "int_ext": "INT or EXT",
  "location": "location from the heading",
  "time": "time of day from the heading, e.g. DAY",
  "extra": "any other heading qualifier, or empty string",
  "description": "one or two sentence summary of the scene",
  "characters": ["every character who appears or speaks"],
  "action_beats": [
    {
      "type": "action or dialogue",
      "characters": ["characters involved in this beat"],
      "indications": "parenthetical or staging note, or empty string",
      "content": "the action text or the spoken line"
    }
  ]
}

## Rules
- Keep action beats in their original order
- One beat per action paragraph and one beat per dialogue block
- Character names in uppercase, without (V.O.), (O.S.) or (CONT'D)

## Scene text
<<<
{scene_text}
>>>"#;

/// Prompt for the whole-document slugline call
pub fn slugline_prompt(document: &str) -> String {
    SLUGLINE_TEMPLATE.replace("{document}", document)
}

/// Prompt for one scene chunk
pub fn scene_prompt(scene_index: usize, slugline: &str, next_slugline: Option<&str>, scene_text: &str) -> String {
    SCENE_TEMPLATE
        .replace("{slugline}", slugline)
        .replace("{next_slugline}", next_slugline.unwrap_or(END_OF_SCRIPT))
        .replace("{scene_index}", &scene_index.to_string())
        .replace("{scene_text}", scene_text)
}
