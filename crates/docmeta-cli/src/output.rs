use std::io::Write;

use docmeta_core::{ExtractedText, ResponseEnvelope};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print what the extractor found without calling the model.
pub fn print_dry_run(
    w: &mut dyn Write,
    file_name: &str,
    extracted: &ExtractedText,
    max_prompt_chars: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    let text_length = extracted.char_len();

    if color.enabled() {
        writeln!(w, "{} {}", "DRY RUN:".bold().cyan(), file_name.bold())?;
    } else {
        writeln!(w, "DRY RUN: {}", file_name)?;
    }
    writeln!(w, "  pages:       {}", extracted.page_count)?;
    writeln!(w, "  characters:  {}", text_length)?;

    if text_length > max_prompt_chars {
        let msg = format!(
            "  prompt would be truncated to {} of {} characters",
            max_prompt_chars, text_length
        );
        if color.enabled() {
            writeln!(w, "{}", msg.dimmed())?;
        } else {
            writeln!(w, "{}", msg)?;
        }
    }
    Ok(())
}

/// Print the envelope as JSON.
pub fn print_envelope(
    w: &mut dyn Write,
    envelope: &ResponseEnvelope,
    pretty: bool,
) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(envelope)?
    } else {
        serde_json::to_string(envelope)?
    };
    writeln!(w, "{}", json)?;
    Ok(())
}

/// Print a failure the same way the server reports it: `{"error": ...}`.
pub fn print_error(w: &mut dyn Write, message: &str, color: ColorMode) -> std::io::Result<()> {
    let body = serde_json::json!({ "error": message });
    if color.enabled() {
        writeln!(w, "{}", body.to_string().red())
    } else {
        writeln!(w, "{}", body)
    }
}
