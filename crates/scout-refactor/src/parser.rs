//! Indentation-scoped extraction of Python functions and the names they call.

use regex::Regex;
use std::collections::{BTreeSet, HashSet};

use crate::error::Result;

const KEYWORDS: &[&str] = &[
    "and", "as", "assert", "await", "elif", "except", "for", "if", "in", "is", "lambda", "not", "or", "raise", "return",
    "while", "with", "yield",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionChunk {
    pub name: String,
    pub code: String,
    pub calls: BTreeSet<String>,
}

pub struct FunctionExtractor {
    def_re: Regex,
    decl_re: Regex,
    call_re: Regex,
}

impl FunctionExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            def_re: Regex::new(r"^(\s*)(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\(")?,
            decl_re: Regex::new(r"\b(?:def|class)\s+([A-Za-z_]\w*)")?,
            call_re: Regex::new(r"([A-Za-z_]\w*)\s*\(")?,
        })
    }

    /// Every `def` in `source`, in order of appearance. Nested functions are
    /// reported on their own and also stay inside their parent's code.
    pub fn extract(&self, source: &str) -> Vec<FunctionChunk> {
        let lines: Vec<&str> = source.lines().collect();
        let mut chunks = Vec::new();
        for (start, line) in lines.iter().enumerate() {
            let Some(caps) = self.def_re.captures(line) else { continue };
            let indent = caps[1].chars().count();
            let mut end = start + 1;
            while end < lines.len() && belongs_to_block(lines[end], indent) {
                end += 1;
            }
            while end > start + 1 && lines[end - 1].trim().is_empty() {
                end -= 1;
            }
            let code = lines[start..end].join("\n");
            let calls = self.calls_in(&code);
            chunks.push(FunctionChunk { name: caps[2].to_string(), code, calls });
        }
        chunks
    }

    fn calls_in(&self, code: &str) -> BTreeSet<String> {
        let stripped: String = code.lines().map(strip_comment).collect::<Vec<_>>().join("\n");
        let declared: HashSet<&str> = self.decl_re.captures_iter(&stripped).filter_map(|c| c.get(1)).map(|m| m.as_str()).collect();
        self.call_re
            .captures_iter(&stripped)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .filter(|name| !declared.contains(name) && !KEYWORDS.contains(name))
            .map(str::to_string)
            .collect()
    }
}

fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

fn belongs_to_block(line: &str, def_indent: usize) -> bool {
    let trimmed = line.trim_start();
    // a closing paren at def indent ends a multi-line signature
    trimmed.is_empty() || indent_of(line) > def_indent || trimmed.starts_with(')')
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(code, _)| code)
}

pub fn extract_functions(source: &str) -> Result<Vec<FunctionChunk>> {
    Ok(FunctionExtractor::new()?.extract(source))
}
