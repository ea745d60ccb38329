use passk_core::{PasskError, PromptStub, Result};
use regex::Regex;

/// Isolate the signature (and docstring, when present) of a target function
/// from a benchmark prompt blob.
///
/// The prompt may be wrapped in markdown fences and may carry prose before
/// the first definition; both are tolerated. With an `entry_point` the
/// matching definition is selected, otherwise the first one found. No
/// definition at all is an [`PasskError::Extraction`] the caller must handle.
pub fn extract_stub(prompt_text: &str, entry_point: Option<&str>) -> Result<PromptStub> {
    let unfenced = unwrap_fences(prompt_text);
    let lines: Vec<&str> = unfenced.lines().collect();

    let def_idx = find_def_line(&lines, entry_point).ok_or_else(|| {
        PasskError::Extraction(match entry_point {
            Some(name) => format!("no function definition named '{name}' in prompt"),
            None => "no function definition found in prompt".to_string(),
        })
    })?;

    let sig_end = signature_end(&lines, def_idx);
    let end = docstring_end(&lines, sig_end).unwrap_or(sig_end);

    let mut snippet: Vec<&str> = lines[def_idx..=end]
        .iter()
        .copied()
        .filter(|line| !is_noop_line(line))
        .collect();
    // guard against a snippet reduced to nothing but noop lines
    if snippet.is_empty() {
        snippet.push(lines[def_idx]);
    }

    let mut source = snippet.join("\n");
    if !source.ends_with('\n') {
        source.push('\n');
    }
    Ok(PromptStub::new(source))
}

/// Drop wrapping markdown fence lines from a prompt blob.
fn unwrap_fences(text: &str) -> String {
    let re = Regex::new(r"(?m)^```(?:\w+)?[ \t]*$\n?").unwrap();
    re.replace_all(text, "").trim_matches('\n').to_string()
}

fn def_pattern() -> Regex {
    Regex::new(r"^[ \t]*(?:async[ \t]+)?def[ \t]+(\w+)\s*\(").unwrap()
}

fn find_def_line(lines: &[&str], entry_point: Option<&str>) -> Option<usize> {
    let re = def_pattern();
    for (idx, line) in lines.iter().enumerate() {
        if let Some(caps) = re.captures(line) {
            match entry_point {
                Some(name) if &caps[1] != name => continue,
                _ => return Some(idx),
            }
        }
    }
    None
}

/// Index of the line closing the signature. Signatures spanning several
/// lines end at the first line whose content ends with `:`.
fn signature_end(lines: &[&str], def_idx: usize) -> usize {
    for (idx, line) in lines.iter().enumerate().skip(def_idx) {
        if line.trim_end().ends_with(':') {
            return idx;
        }
    }
    def_idx
}

/// If the first statement after the signature is a string-literal docstring,
/// the index of its closing line. Blank lines before it are skipped; an
/// unterminated docstring counts as absent.
fn docstring_end(lines: &[&str], sig_end: usize) -> Option<usize> {
    let mut idx = sig_end + 1;
    while idx < lines.len() && lines[idx].trim().is_empty() {
        idx += 1;
    }
    let first = lines.get(idx)?.trim_start();
    let stripped = first.trim_start_matches(|c: char| "rRbBuUfF".contains(c));
    let delim = if stripped.starts_with("\"\"\"") {
        "\"\"\""
    } else if stripped.starts_with("'''") {
        "'''"
    } else {
        return None;
    };

    // single-line docstring closes on the opening line
    if stripped[delim.len()..].contains(delim) {
        return Some(idx);
    }
    lines[idx + 1..]
        .iter()
        .position(|line| line.contains(delim))
        .map(|offset| idx + 1 + offset)
}

fn is_noop_line(line: &str) -> bool {
    let re = Regex::new(r"^[ \t]+(?:pass|\.\.\.)\s*$").unwrap();
    re.is_match(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_and_docstring_with_pass_removed() {
        let prompt = "def add(a, b):\n    \"\"\"Add.\"\"\"\n    pass\n";
        let stub = extract_stub(prompt, Some("add")).unwrap();
        assert_eq!(stub.as_str(), "def add(a, b):\n    \"\"\"Add.\"\"\"\n");
    }

    #[test]
    fn multiline_docstring_is_kept_whole() {
        let prompt = concat!(
            "def truncate_number(number: float) -> float:\n",
            "    \"\"\" Given a positive floating point number, it can be decomposed into\n",
            "    and integer part and decimals.\n",
            "\n",
            "    >>> truncate_number(3.5)\n",
            "    0.5\n",
            "    \"\"\"\n",
        );
        let stub = extract_stub(prompt, Some("truncate_number")).unwrap();
        assert_eq!(stub.as_str(), prompt);
    }

    #[test]
    fn entry_point_selects_among_several_defs() {
        let prompt = concat!(
            "def helper(x):\n",
            "    return x * 2\n",
            "\n",
            "def target(y):\n",
            "    \"\"\"Pick me.\"\"\"\n",
        );
        let stub = extract_stub(prompt, Some("target")).unwrap();
        assert_eq!(stub.as_str(), "def target(y):\n    \"\"\"Pick me.\"\"\"\n");
    }

    #[test]
    fn first_def_wins_without_entry_point() {
        let prompt = "def first(x):\n    return x\n\ndef second(y):\n    return y\n";
        let stub = extract_stub(prompt, None).unwrap();
        assert_eq!(stub.as_str(), "def first(x):\n");
    }

    #[test]
    fn prose_before_the_def_is_skipped() {
        let prompt = "Solve this task:\n\ndef solve(n):\n    \"\"\"Doc.\"\"\"\n";
        let stub = extract_stub(prompt, Some("solve")).unwrap();
        assert_eq!(stub.as_str(), "def solve(n):\n    \"\"\"Doc.\"\"\"\n");
    }

    #[test]
    fn fenced_prompt_is_unwrapped() {
        let prompt = "```python\ndef f(a):\n    \"\"\"Doc.\"\"\"\n```\n";
        let stub = extract_stub(prompt, None).unwrap();
        assert_eq!(stub.as_str(), "def f(a):\n    \"\"\"Doc.\"\"\"\n");
    }

    #[test]
    fn ellipsis_placeholder_is_stripped() {
        let prompt = "def g():\n    ...\n";
        let stub = extract_stub(prompt, None).unwrap();
        assert_eq!(stub.as_str(), "def g():\n");
    }

    #[test]
    fn no_def_at_all_is_an_extraction_error() {
        let err = extract_stub("just some prose\nx = 1\n", None).unwrap_err();
        assert!(matches!(err, PasskError::Extraction(_)));
    }

    #[test]
    fn missing_entry_point_is_an_extraction_error() {
        let err = extract_stub("def other(x):\n    pass\n", Some("wanted")).unwrap_err();
        assert!(matches!(err, PasskError::Extraction(_)));
    }

    #[test]
    fn stub_always_ends_with_newline() {
        let stub = extract_stub("def f():\n    \"\"\"D.\"\"\"", None).unwrap();
        assert!(stub.as_str().ends_with('\n'));
    }
}
