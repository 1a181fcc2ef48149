//! Rendering of notes for human-readable output.

use comfy_table::presets::UTF8_FULL;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::{ContentArrangement, Table};

use notevault_core::PlaintextRecord;

use super::format::{first_line, format_datetime, short_id, truncate};
use super::OutputMode;
use crate::constants::TITLE_COLUMN_WIDTH;

const PREVIEW_WIDTH: usize = 40;

/// Render a listing of notes.
///
/// Pretty mode: bordered table with a header.
/// Plain mode: tab-separated `id created title` lines, no header.
pub fn notes_table(mode: OutputMode, notes: &[PlaintextRecord]) -> String {
    if !mode.is_pretty() {
        return notes
            .iter()
            .map(|note| {
                format!(
                    "{}\t{}\t{}",
                    note.id,
                    format_datetime(&note.created_at, false),
                    note.title
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "Created", "Title", "Preview"]);

    for note in notes {
        table.add_row(vec![
            short_id(&note.id),
            format_datetime(&note.created_at, true),
            truncate(&note.title, TITLE_COLUMN_WIDTH),
            truncate(first_line(&note.body), PREVIEW_WIDTH),
        ]);
    }

    table.to_string()
}

/// Render one note in full.
pub fn note_detail(note: &PlaintextRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("ID:      {}\n", note.id));
    out.push_str(&format!(
        "Created: {}\n",
        format_datetime(&note.created_at, true)
    ));
    if note.updated_at != note.created_at {
        out.push_str(&format!(
            "Updated: {}\n",
            format_datetime(&note.updated_at, true)
        ));
    }
    out.push_str(&format!("Title:   {}\n\n", note.title));
    out.push_str(&note.body);
    out
}
