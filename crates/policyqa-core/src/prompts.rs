//! Prompt templates sent to the completion service.
//!
//! The `##Output` blocks must list exactly the labels of
//! [`crate::parse::ANSWER_SCHEMA`] and [`crate::parse::EVALUATION_SCHEMA`].

/// Prompt asking the model to answer `question` from `document_text`.
pub fn answer_prompt(document_text: &str, question: &str) -> String {
    format!(
        "You are an expert document analyzer. You are given the text content of a document \
containing HR policy.
Your task is to analyze the user's question, find the answer in the document and give a crisp answer.
Respond using exactly the four labeled fields below, each label starting a new line.

##Output
answer: <Your answer here>
page_number: <Page number where the answer is found>
reasoning: <Your reasoning for the answer>
data_source: <Source of the data used to answer the question>

##Input
document_text: {document_text}
user_question: {question}
"
    )
}

/// Prompt asking the model to grade `answer` against the document.
pub fn evaluation_prompt(document_text: &str, question: &str, answer: &str) -> String {
    format!(
        "You are an expert evaluator. You are given a text document, a question and an answer.
Your task is to evaluate the answer based on the document and the question.
Respond using exactly the three labeled fields below, each label starting a new line.

##Output
is_correct: <true/false>
score: <0-10>
reasoning: <Your reasoning for the score>

##Input
document_text: {document_text}
question: {question}
answer: {answer}
"
    )
}
