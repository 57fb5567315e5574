use anyhow::Result;
use async_trait::async_trait;
use medibot::errors::PromptError;
use medibot::providers::ai::{AiProvider, EmbeddingProvider};
use medibot::providers::db::{PrescriptionStore, SqliteProvider};
use medibot::types::{NewPrescription, Prescription};
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

// --- Test Setup ---

/// A fresh in-memory database with the schema applied, one per test.
pub struct TestSetup {
    pub store: SqliteProvider,
}

impl TestSetup {
    pub async fn new() -> Result<Self> {
        let db = turso::Builder::new_local(":memory:").build().await?;
        let conn = db.connect()?;

        for statement in medibot::providers::db::sqlite::sql::ALL_TABLE_CREATION_SQL {
            conn.execute(statement, ()).await?;
        }

        Ok(Self {
            store: SqliteProvider::from_database(db),
        })
    }
}

// --- Mock AI Provider ---

#[derive(Clone, Debug)]
enum Reply {
    Text(String),
    Error(String),
}

/// A chat provider whose replies are programmed per system-prompt substring.
///
/// A prompt that matches no rule is answered with an error, which makes the
/// unprogrammed case exercise the caller's failure path.
#[derive(Clone, Debug, Default)]
pub struct MockAiProvider {
    rules: Arc<Mutex<Vec<(String, Reply)>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockAiProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers with `response` whenever the system prompt contains `key`.
    pub fn add_response(&self, key: &str, response: &str) {
        self.rules
            .lock()
            .unwrap()
            .push((key.to_string(), Reply::Text(response.to_string())));
    }

    /// Fails with `message` whenever the system prompt contains `key`.
    pub fn add_failure(&self, key: &str, message: &str) {
        self.rules
            .lock()
            .unwrap()
            .push((key.to_string(), Reply::Error(message.to_string())));
    }

    /// The `(system_prompt, user_prompt)` pairs received so far.
    pub fn get_calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, PromptError> {
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));

        let rules = self.rules.lock().unwrap();
        match rules.iter().find(|(key, _)| system_prompt.contains(key.as_str())) {
            Some((_, Reply::Text(text))) => Ok(text.clone()),
            Some((_, Reply::Error(message))) => Err(PromptError::AiApi(message.clone())),
            None => Err(PromptError::AiApi(format!(
                "MockAiProvider: No response programmed for system prompt. Got: '{system_prompt}'"
            ))),
        }
    }
}

// --- Mock Embedding Provider ---

/// Embeds text as keyword counts over a fixed vocabulary.
///
/// Texts mentioning the same terms end up close in cosine space, which is all a
/// similarity search test needs.
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    vocabulary: Arc<Vec<String>>,
    fail: bool,
    inputs: Arc<Mutex<Vec<String>>>,
}

impl MockEmbeddingProvider {
    pub fn new(vocabulary: &[&str]) -> Self {
        Self {
            vocabulary: Arc::new(vocabulary.iter().map(|w| w.to_lowercase()).collect()),
            fail: false,
            inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A provider whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }

    pub fn embedded_inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, input: &str) -> Result<Vec<f32>, PromptError> {
        self.inputs.lock().unwrap().push(input.to_string());
        if self.fail {
            return Err(PromptError::AiApi("embedding service unavailable".to_string()));
        }

        let lowered = input.to_lowercase();
        let mut vector: Vec<f32> = self
            .vocabulary
            .iter()
            .map(|word| lowered.matches(word.as_str()).count() as f32)
            .collect();
        // Keeps texts without any vocabulary word off the zero vector.
        vector.push(0.01);
        Ok(vector)
    }
}

// --- Failing Store ---

/// A store that rejects every operation, for exercising storage failure paths.
#[derive(Clone, Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl PrescriptionStore for FailingStore {
    fn name(&self) -> &str {
        "Failing"
    }

    async fn insert_prescription(
        &self,
        _prescription: NewPrescription,
    ) -> Result<Prescription, PromptError> {
        Err(PromptError::StorageOperationFailed(
            "database is unavailable".to_string(),
        ))
    }

    async fn get_prescription(&self, _id: &str) -> Result<Option<Prescription>, PromptError> {
        Err(PromptError::StorageOperationFailed(
            "database is unavailable".to_string(),
        ))
    }

    async fn list_prescriptions(
        &self,
        _user_email: &str,
    ) -> Result<Vec<Prescription>, PromptError> {
        Err(PromptError::StorageOperationFailed(
            "database is unavailable".to_string(),
        ))
    }
}

// --- Test-Specific Helpers ---
#[cfg(feature = "pdf")]
pub mod helpers {
    use anyhow::{anyhow, Result};
    use printpdf::{BuiltinFont, Mm, PdfDocument};

    /// Generates a PDF with one page per entry of `pages`, each holding one line
    /// of Helvetica text.
    pub fn generate_test_pdf_pages(pages: &[&str]) -> Result<Vec<u8>> {
        let (doc, first_page, first_layer) =
            PdfDocument::new("Test Prescription", Mm(210.0), Mm(297.0), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| anyhow!("Failed to add built-in font: {e:?}"))?;

        for (i, text) in pages.iter().enumerate() {
            let (page, layer) = if i == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(Mm(210.0), Mm(297.0), format!("Layer {}", i + 1))
            };
            doc.get_page(page)
                .get_layer(layer)
                .use_text(*text, 12.0, Mm(10.0), Mm(280.0), &font);
        }

        doc.save_to_bytes()
            .map_err(|e| anyhow!("Failed to save PDF: {e:?}"))
    }

    /// Generates a single-page PDF containing `text`.
    pub fn generate_test_pdf(text: &str) -> Result<Vec<u8>> {
        generate_test_pdf_pages(&[text])
    }
}
