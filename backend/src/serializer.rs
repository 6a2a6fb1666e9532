//! Renders [`GameEvents`] into the document sent to clients.

use common::demo_events::GameEvents;
use serde::Serialize;

/// Renders the whole document at once, indented by four spaces.
pub fn render(events: &GameEvents) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);

    events.serialize(&mut serializer)?;

    Ok(buffer)
}

/// `<demo name without extension>.json`, works for paths and URLs alike.
pub fn output_file_name(location: &str) -> String {
    let name = location
        .rsplit(['/', '\\'])
        .next()
        .and_then(|n| n.split(['?', '#']).next())
        .unwrap_or_default();

    let stem = std::path::Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("demo");

    format!("{}.json", stem)
}
