//! Prompt assembly: context block, template rendering, and the two-message
//! exchange sent to the chat model.
use crate::config::{CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER};
use crate::llm::ChatMessage;

const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Join retrieved documents with blank lines, preserving rank order.
///
/// Returns `None` for an empty slice; callers short-circuit instead of
/// prompting with no context.
pub fn build_context(documents: &[String]) -> Option<String> {
    if documents.is_empty() {
        return None;
    }
    Some(documents.join(DOCUMENT_SEPARATOR))
}

/// Substitute `{context}` and `{question}` in a single left-to-right pass.
///
/// Placeholders appearing inside the substituted values are left as-is.
pub fn render_prompt(template: &str, context: &str, question: &str) -> String {
    let mut out = String::with_capacity(template.len() + context.len() + question.len());
    let mut rest = template;

    while let Some(idx) = rest.find('{') {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];
        if let Some(after) = tail.strip_prefix(CONTEXT_PLACEHOLDER) {
            out.push_str(context);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(QUESTION_PLACEHOLDER) {
            out.push_str(question);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// System instruction followed by the rendered user prompt.
pub fn build_messages(system_prompt: &str, user_prompt: String) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user(user_prompt),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn test_build_context_empty() {
        assert_eq!(build_context(&[]), None);
    }

    #[test]
    fn test_build_context_joins_with_blank_lines() {
        let docs = vec!["Doc A".to_string(), "Doc B".to_string()];
        assert_eq!(build_context(&docs).as_deref(), Some("Doc A\n\nDoc B"));
    }

    #[test]
    fn test_build_context_single() {
        let docs = vec!["solo".to_string()];
        assert_eq!(build_context(&docs).as_deref(), Some("solo"));
    }

    #[test]
    fn test_render_prompt() {
        let out = render_prompt("Contexto:\n{context}\n\nPregunta:\n{question}\n", "C", "Q?");
        assert_eq!(out, "Contexto:\nC\n\nPregunta:\nQ?\n");
    }

    #[test]
    fn test_render_prompt_does_not_reexpand_values() {
        let out = render_prompt("{context}|{question}", "doc with {question}", "q {context}");
        assert_eq!(out, "doc with {question}|q {context}");
    }

    #[test]
    fn test_render_prompt_keeps_other_braces() {
        let out = render_prompt("{json: 1} {context} {", "C", "Q");
        assert_eq!(out, "{json: 1} C {");
    }

    #[test]
    fn test_render_prompt_multibyte() {
        let out = render_prompt("¿{question}? — {context}", "fotosíntesis", "Qué es");
        assert_eq!(out, "¿Qué es? — fotosíntesis");
    }

    #[test]
    fn test_build_messages_order() {
        let messages = build_messages("Responde en español.", "prompt".to_string());
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, "Responde en español.");
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "prompt");
    }
}
