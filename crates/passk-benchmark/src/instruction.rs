use passk_core::PromptStub;

/// Default instruction header. The trailing `<sol>` opener in the built
/// instruction primes completion-style models to emit the closing tag, which
/// is also what the normalizer extracts first.
pub const DEFAULT_HEADER: &str = "# Python 3\n\
# Return ONLY the function BODY. No 'def', imports, tests, prints.\n\
# Indent with EXACTLY 4 spaces. Put final body between <sol> and </sol>.\n";

/// Assemble the instruction payload sent to the model for one task.
pub fn build_instruction(header: &str, stub: &PromptStub) -> String {
    format!(
        "{}\n\n{}\n<sol>\n",
        header.trim_end(),
        stub.as_str().trim_end()
    )
}
