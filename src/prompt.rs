// Prompt format the FAQ model was fine-tuned on
pub const QUESTION_MARKER: &str = "질문:";
pub const ANSWER_MARKER: &str = "답변:";

pub fn build_prompt(question: &str) -> String {
    format!("{} {}\n{}", QUESTION_MARKER, question.trim(), ANSWER_MARKER)
}

/// Cleans a raw completion down to the answer text.
///
/// The model tends to keep going after its answer, either opening the next
/// `질문:` turn or emitting markup, so both are cut off.
pub fn extract_answer(completion: &str) -> String {
    let mut answer = completion.trim();
    if let Some((head, _)) = answer.split_once(QUESTION_MARKER) {
        answer = head.trim();
    }
    if let Some((head, _)) = answer.split_once('<') {
        answer = head.trim();
    }
    answer.to_string()
}
