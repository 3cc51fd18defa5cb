//! Keyword lookup over a tabular medical Q&A dataset.
//!
//! Retrieval here is deliberately simple: case-insensitive keyword
//! matching against the question column, first matches in file order.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use gena_core::GenerationRequest;

use crate::error::{Result, ToolError};

/// System instruction for the medical answering path.
const MEDICAL_INSTRUCTION: &str = "You are a specialized medical assistant. Use the provided \
     context to answer the user query. If the context does not have the answer, use your medical \
     knowledge but state that you are doing so. Always end with a disclaimer advising the user to \
     consult a professional doctor.";

/// Fallback context when no dataset rows match.
const NO_CONTEXT_FALLBACK: &str = "No direct context found in the medical dataset.";

#[derive(Debug, Deserialize)]
struct QaRow {
    #[serde(rename = "Question")]
    question: String,
    #[serde(rename = "Answer")]
    answer: String,
}

#[derive(Debug)]
struct QaRecord {
    question_lower: String,
    answer: String,
}

/// An in-memory medical Q&A dataset loaded from a CSV file.
///
/// The file must carry at least `Question` and `Answer` columns.
#[derive(Debug)]
pub struct MedicalDataset {
    records: Vec<QaRecord>,
}

impl MedicalDataset {
    /// Load the dataset from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Dataset`] if the file is missing, unreadable,
    /// or lacks the required columns.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path).map_err(|e| {
            ToolError::Dataset(format!("failed to open '{}': {e}", path.display()))
        })?;

        let mut records = Vec::new();
        for row in reader.deserialize::<QaRow>() {
            let row = row.map_err(|e| {
                ToolError::Dataset(format!("failed to parse '{}': {e}", path.display()))
            })?;
            records.push(QaRecord {
                question_lower: row.question.to_lowercase(),
                answer: row.answer,
            });
        }

        info!(path = %path.display(), rows = records.len(), "loaded medical dataset");
        Ok(Self { records })
    }

    /// Number of Q&A rows loaded.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset holds no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Return answers whose question matches any query keyword,
    /// case-insensitively, in file order, at most `limit` of them.
    pub fn lookup(&self, query: &str, limit: usize) -> Vec<&str> {
        let keywords: Vec<String> =
            query.split_whitespace().map(|w| w.to_lowercase()).collect();
        if keywords.is_empty() {
            return Vec::new();
        }

        self.records
            .iter()
            .filter(|record| keywords.iter().any(|kw| record.question_lower.contains(kw)))
            .take(limit)
            .map(|record| record.answer.as_str())
            .collect()
    }

    /// Compose the medical generation prompt from lookup results.
    pub fn build_prompt(query: &str, answers: &[&str]) -> GenerationRequest {
        let context = if answers.is_empty() {
            NO_CONTEXT_FALLBACK.to_string()
        } else {
            answers.join("\n")
        };

        GenerationRequest::text(format!(
            "Context from the medical dataset:\n{context}\n\nUser query: {query}"
        ))
        .with_instruction(MEDICAL_INSTRUCTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn dataset(csv: &str) -> MedicalDataset {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(csv.as_bytes()).unwrap();
        MedicalDataset::load(file.path()).unwrap()
    }

    const SAMPLE: &str = "\
Question,Answer
What causes diabetes?,Insulin resistance and genetics.
How is asthma treated?,Inhalers and avoiding triggers.
What causes high blood pressure?,Salt intake and stress.
Can diabetes be prevented?,Often yes with lifestyle changes.
";

    #[test]
    fn lookup_matches_keywords_case_insensitively() {
        let ds = dataset(SAMPLE);
        let answers = ds.lookup("DIABETES", 10);
        assert_eq!(
            answers,
            ["Insulin resistance and genetics.", "Often yes with lifestyle changes."]
        );
    }

    #[test]
    fn lookup_caps_results_at_limit_in_file_order() {
        let ds = dataset(SAMPLE);
        // "diabetes" matches two questions; the limit keeps the first.
        let answers = ds.lookup("diabetes", 1);
        assert_eq!(answers, ["Insulin resistance and genetics."]);
    }

    #[test]
    fn lookup_with_no_match_returns_empty() {
        let ds = dataset(SAMPLE);
        assert!(ds.lookup("astrophysics", 3).is_empty());
        assert!(ds.lookup("   ", 3).is_empty());
    }

    #[test]
    fn missing_file_fails_with_dataset_error() {
        let result = MedicalDataset::load("/nonexistent/medquad.csv");
        assert!(matches!(result, Err(ToolError::Dataset(_))));
    }

    #[test]
    fn prompt_includes_answers_or_fallback() {
        let request = MedicalDataset::build_prompt("query", &["answer one", "answer two"]);
        assert!(request.prompt.contains("answer one\nanswer two"));

        let request = MedicalDataset::build_prompt("query", &[]);
        assert!(request.prompt.contains("No direct context found"));
        assert!(request.instruction.unwrap().contains("disclaimer"));
    }
}
