use std::io::{BufRead, Write};
use std::path::Path;

use eyre::Result;
use log::debug;

/// Ask whether to overwrite `path`. Anything but `y`/`Y` declines.
pub fn confirm_overwrite<R: BufRead, W: Write>(path: &Path, input: &mut R, prompt: &mut W) -> Result<bool> {
    write!(prompt, "File {} exists. Overwrite? (y/n): ", path.display())?;
    prompt.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

/// Write cleaned subtitle text to `path`.
pub fn save_subtitles(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text)?;
    debug!("Subtitles written to {}", path.display());
    Ok(())
}
