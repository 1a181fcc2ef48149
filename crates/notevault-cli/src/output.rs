//! JSON output formatting.

use notevault_core::{PlaintextRecord, SessionState, StorageMetadata};

/// Convert a note to JSON for output.
pub fn note_json(note: &PlaintextRecord) -> serde_json::Value {
    serde_json::json!({
        "id": note.id,
        "title": note.title,
        "body": note.body,
        "created_at": note.created_at,
        "updated_at": note.updated_at,
    })
}

/// Convert multiple notes to a JSON array.
pub fn notes_json(notes: &[PlaintextRecord]) -> serde_json::Value {
    serde_json::Value::Array(notes.iter().map(note_json).collect())
}

/// Storage status as JSON. Carries no plaintext.
pub fn status_json(
    path: &std::path::Path,
    setup_required: bool,
    metadata: Option<&StorageMetadata>,
    session: &SessionState,
) -> serde_json::Value {
    serde_json::json!({
        "path": path.to_string_lossy(),
        "setup_required": setup_required,
        "metadata": metadata,
        "session": session,
    })
}

pub fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
