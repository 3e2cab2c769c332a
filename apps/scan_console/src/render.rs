//! Text rendering of scan snapshots and parsing of console input lines.

use scan_core::{CycleState, ScanSnapshot};
use shared::domain::{DecodedCode, Symbology};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Code(DecodedCode),
    Reset,
    DismissAlert,
    Show,
    Quit,
    Empty,
}

/// `:reset`, `:dismiss`, `:show` and `:quit` are intents. `<tag>:<payload>`
/// carries an explicit symbology when `tag` is one of `known`; anything else
/// is a QR payload taken verbatim.
pub fn parse_line(line: &str, known: &[Symbology]) -> ConsoleInput {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    match trimmed.trim() {
        "" => return ConsoleInput::Empty,
        ":reset" | ":again" => return ConsoleInput::Reset,
        ":dismiss" | ":ok" => return ConsoleInput::DismissAlert,
        ":show" => return ConsoleInput::Show,
        ":quit" | ":q" => return ConsoleInput::Quit,
        _ => {}
    }

    if let Some((tag, payload)) = trimmed.split_once(':') {
        let symbology = Symbology::from_tag(tag);
        if known.contains(&symbology) {
            return ConsoleInput::Code(DecodedCode::new(payload, symbology));
        }
    }
    ConsoleInput::Code(DecodedCode::qr(trimmed))
}

pub fn render(snapshot: &ScanSnapshot) -> String {
    let mut lines = Vec::new();

    if let Some(status) = snapshot.status_text() {
        lines.push(status.to_string());
    }
    if let Some(error) = snapshot.error_text() {
        lines.push(format!("Error: {error}"));
    }

    if let (CycleState::Resolved(_), Some(item)) = (snapshot.state, &snapshot.item) {
        lines.push("Scanned Item Details:".to_string());
        lines.push(format!("  Item ID: {}", item.id));
        lines.push(format!("  Item Name: {}", item.name));
        if let Some(bytes) = &item.thumbnail {
            lines.push(format!("  Thumbnail: {} bytes (jpeg)", bytes.len()));
        }
        if let Some(detail) = item.extension("OtherDetail1") {
            lines.push(format!("  Other Detail 1: {detail}"));
        }
    }

    if let Some(alert) = &snapshot.alert {
        lines.push(format!("[alert] {} (:dismiss)", alert.text));
    }

    if snapshot.scan_again_available() {
        lines.push("Scan again with :reset".to_string());
    } else if snapshot.state.is_idle() {
        lines.push("Ready to scan".to_string());
    }

    lines.join("\n")
}
