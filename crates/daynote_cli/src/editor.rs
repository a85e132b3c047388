//! Round-trips text through the user's editor.

use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use std::fs;
use std::io::Write;
use std::process::Command;

/// Writes `initial` to a temporary `.md` file, runs `editor` on it and
/// returns the saved contents.
///
/// `editor` may carry arguments (`"code --wait"`).
pub fn edit_text(editor: &str, initial: &str) -> Result<String> {
    let mut parts = editor.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| eyre!("editor command is empty"))?;

    let mut file = tempfile::Builder::new()
        .prefix("daynote-")
        .suffix(".md")
        .tempfile()
        .wrap_err("failed to create temporary sheet file")?;
    file.write_all(initial.as_bytes())?;
    file.flush()?;

    let status = Command::new(program)
        .args(parts)
        .arg(file.path())
        .status()
        .wrap_err_with(|| format!("failed to launch editor `{editor}`"))?;
    if !status.success() {
        bail!("editor `{editor}` exited with {status}");
    }

    // Re-read by path: many editors replace the file instead of writing
    // through the open handle.
    fs::read_to_string(file.path()).wrap_err("failed to read edited sheet")
}

#[cfg(all(test, unix))]
mod tests {
    use super::edit_text;

    #[test]
    fn no_op_editor_returns_initial_text() {
        let text = edit_text("true", "# Day: 2024-01-01\n").unwrap();
        assert_eq!(text, "# Day: 2024-01-01\n");
    }

    #[test]
    fn failing_editor_is_an_error() {
        let err = edit_text("false", "x").unwrap_err();
        assert!(err.to_string().contains("exited"));
    }

    #[test]
    fn empty_editor_is_rejected() {
        assert!(edit_text("   ", "x").is_err());
    }
}
