use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// File names for the first and second fenced block, in that order.
pub const OUTPUT_FILES: [&str; 2] = ["new_service.py", "test_service.py"];

/// Bodies of ```` ```python ```` fenced blocks, trimmed, in order.
pub fn python_blocks(text: &str) -> Result<Vec<String>> {
    let re = Regex::new(r"(?s)```python(.*?)```")?;
    Ok(re.captures_iter(text).filter_map(|c| c.get(1)).map(|m| m.as_str().trim().to_string()).collect())
}

/// Writes the service block and, when present, the test block. Returns the
/// paths written; an answer without fenced Python writes nothing.
pub fn save_code_blocks(text: &str, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let blocks = python_blocks(text)?;
    if blocks.is_empty() {
        tracing::warn!("no python code blocks in model response");
        return Ok(Vec::new());
    }
    fs::create_dir_all(output_dir)?;
    let mut written = Vec::new();
    for (block, name) in blocks.iter().zip(OUTPUT_FILES) {
        let path = output_dir.join(name);
        fs::write(&path, block)?;
        tracing::info!(path = %path.display(), "saved generated code");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANSWER: &str = "Here you go.\n```python\nclass InvoiceService:\n    pass\n```\nAnd tests:\n```python\ndef test_it():\n    assert True\n```\n```python\nextra = 1\n```";

    #[test]
    fn blocks_are_trimmed_in_order() {
        let blocks = python_blocks(ANSWER).unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], "class InvoiceService:\n    pass");
        assert_eq!(blocks[2], "extra = 1");
    }

    #[test]
    fn first_two_blocks_are_saved() {
        let dir = tempfile::tempdir().unwrap();
        let written = save_code_blocks(ANSWER, dir.path()).unwrap();
        assert_eq!(written, vec![dir.path().join("new_service.py"), dir.path().join("test_service.py")]);
        assert_eq!(fs::read_to_string(&written[1]).unwrap(), "def test_it():\n    assert True");
    }

    #[test]
    fn single_block_writes_only_the_service() {
        let dir = tempfile::tempdir().unwrap();
        let written = save_code_blocks("```python\nx = 1\n```", dir.path()).unwrap();
        assert_eq!(written, vec![dir.path().join("new_service.py")]);
        assert!(!dir.path().join("test_service.py").exists());
    }

    #[test]
    fn prose_only_answer_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("generated");
        assert!(save_code_blocks("no code here", &out).unwrap().is_empty());
        assert!(!out.exists());
    }
}
