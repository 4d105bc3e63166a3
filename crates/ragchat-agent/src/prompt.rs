//! Prompt assembly for each generation step.
//!
//! Prompts are built as plain message lists; there is no template language.

use ragchat_core::Message;

/// System instruction for the rephrase step.
pub const REPHRASE_SYSTEM_PROMPT: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question.";

const ANSWER_SYSTEM_PREAMBLE: &str = "You are an experienced researcher, expert at interpreting and \
answering questions based on provided sources. Using the provided context and chat history, \
answer the user's question to the best of your ability using only the resources provided. \
Be verbose!";

const QA_PREAMBLE: &str = "You are an experienced researcher, expert at interpreting and \
answering questions based on provided sources. Using the provided context, answer the user's \
question to the best of your ability using only the resources provided. Be verbose!";

/// `[system, ...history, user(rephrase request)]`.
pub fn rephrase_messages(history: &[Message], question: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(REPHRASE_SYSTEM_PROMPT));
    messages.extend(history.iter().cloned());
    messages.push(Message::user(format!(
        "Rephrase the following question as a standalone question:\n{question}"
    )));
    messages
}

/// `[system(with context), ...history, user(standalone question)]`.
pub fn answer_messages(
    context: &str,
    standalone_question: &str,
    history: &[Message],
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(format!(
        "{ANSWER_SYSTEM_PREAMBLE}\n\n<context>\n{context}\n</context>"
    )));
    messages.extend(history.iter().cloned());
    messages.push(Message::user(format!(
        "Now, answer this question using the previous context and chat history:\n{standalone_question}"
    )));
    messages
}

/// Single-turn prompt: context and question in one exchange, no history.
pub fn qa_messages(context: &str, question: &str) -> Vec<Message> {
    vec![
        Message::system(format!("{QA_PREAMBLE}\n\n<context>\n{context}\n</context>")),
        Message::user(format!(
            "Now, answer this question using the above context:\n{question}"
        )),
    ]
}
