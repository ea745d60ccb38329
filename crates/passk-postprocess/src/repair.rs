use std::future::Future;

/// Fixed repair template: the original prompt plus the broken body, with the
/// corrected body demanded inside the same tag delimiters the normalizer
/// extracts.
pub fn repair_instruction(prompt: &str, broken_body: &str) -> String {
    format!(
        "Fix the following Python function BODY so it compiles and satisfies the docstring.\n\
         Rules: return ONLY the body between <sol> and </sol>, exactly 4-space indents, no imports/def/tests.\n\n\
         {prompt}\n\nBroken body:\n<sol>\n{broken_body}\n</sol>\n\
         Reply with only the corrected body inside <sol> and </sol>."
    )
}

/// One-shot self-repair: build the repair instruction and hand it to a
/// caller-supplied completion future.
///
/// Returns the raw repaired text, or `None` when the completion produced no
/// text. The result is neither re-normalized nor validated here; callers run
/// it back through [`normalize`](crate::normalize) themselves. No retries.
pub async fn attempt_repair<F, Fut>(
    prompt: &str,
    broken_body: &str,
    complete: F,
) -> Option<String>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Option<String>>,
{
    let text = complete(repair_instruction(prompt, broken_body)).await?;
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forwards_the_instruction_and_returns_model_text() {
        let result = attempt_repair("def f():\n", "    retur 1", |instr| async move {
            assert!(instr.contains("def f():"));
            assert!(instr.contains("<sol>\n    retur 1\n</sol>"));
            Some("<sol>\n    return 1\n</sol>".to_string())
        })
        .await;
        assert_eq!(result.as_deref(), Some("<sol>\n    return 1\n</sol>"));
    }

    #[tokio::test]
    async fn empty_completion_means_no_repair() {
        let result = attempt_repair("def f():\n", "body", |_| async { Some(String::new()) }).await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn absent_completion_means_no_repair() {
        let result = attempt_repair("def f():\n", "body", |_| async { None }).await;
        assert_eq!(result, None);
    }
}
