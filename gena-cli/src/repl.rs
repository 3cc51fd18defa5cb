//! Interactive read-eval-print loop over the assistant modes.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use base64::prelude::*;
use tracing::{info, warn};

use gena_core::{
    AssistantError, GenerationRequest, Generator, InlineImage, Role, Transcript,
};
use gena_gemini::GeminiGenerator;
use gena_rag::{Document, RagPipeline, VectorIndex};
use gena_tools::{ArxivClient, MedicalDataset};

use crate::mode::TaskMode;

/// Papers fetched per research query.
const RESEARCH_MAX_RESULTS: usize = 5;

/// System instruction for the multimodal chat path.
const MULTIMODAL_INSTRUCTION: &str = "Detect the user's language and sentiment. Respond in the \
     same language, acknowledging the sentiment where it matters. Analyze images if provided.";

pub struct Repl {
    mode: TaskMode,
    transcript: Transcript,
    pipeline: RagPipeline,
    generator: GeminiGenerator,
    arxiv: ArxivClient,
    medical: Option<MedicalDataset>,
    pending_image: Option<InlineImage>,
    kb_path: PathBuf,
}

impl Repl {
    pub fn new(
        pipeline: RagPipeline,
        generator: GeminiGenerator,
        arxiv: ArxivClient,
        medical: Option<MedicalDataset>,
        kb_path: PathBuf,
    ) -> Self {
        Self {
            mode: TaskMode::Knowledge,
            transcript: Transcript::new(),
            pipeline,
            generator,
            arxiv,
            medical,
            pending_image: None,
            kb_path,
        }
    }

    /// Run until `/quit` or end of input.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        println!("gena — multi-mode assistant (model: {})", self.generator.name());
        println!("Type /help for commands, /quit to exit.\n");

        let stdin = io::stdin();
        loop {
            print!("\x1b[1;34m[{}]>\x1b[0m ", self.mode);
            io::stdout().flush()?;

            let mut input = String::new();
            if stdin.lock().read_line(&mut input).is_err() || input.is_empty() {
                break;
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            if input.starts_with('/') {
                if !self.handle_command(input).await {
                    break;
                }
                continue;
            }

            self.handle_query(input).await;
        }

        Ok(())
    }

    /// Dispatch a slash command. Returns false to exit the loop.
    async fn handle_command(&mut self, input: &str) -> bool {
        let (cmd, arg) = match input.split_once(' ') {
            Some((cmd, arg)) => (cmd, arg.trim()),
            None => (input, ""),
        };

        match cmd {
            "/quit" | "/exit" | "/q" => {
                println!("Goodbye!");
                return false;
            }
            "/help" | "/?" => self.print_help(),
            "/mode" => self.handle_mode(arg),
            "/index" => self.handle_index(arg).await,
            "/image" => self.handle_image(arg),
            "/status" => self.handle_status().await,
            "/clear" => {
                self.transcript.clear();
                self.pending_image = None;
                print!("\x1b[2J\x1b[H");
                println!("Conversation cleared.");
            }
            _ => {
                println!("Unknown command: {cmd}. Type /help for available commands.");
            }
        }
        true
    }

    fn print_help(&self) {
        println!("Commands:");
        println!("  /mode <name>    switch mode (knowledge, multimodal, medical, research)");
        println!("  /index <file>   chunk, embed and index a UTF-8 document");
        println!("  /image <file>   attach an image to the next multimodal query");
        println!("  /status         show mode, model and knowledge base state");
        println!("  /clear          clear conversation history and the screen");
        println!("  /quit           exit");
    }

    fn handle_mode(&mut self, arg: &str) {
        if arg.is_empty() {
            let names: Vec<String> = TaskMode::ALL.iter().map(|m| m.to_string()).collect();
            println!("Current mode: {}. Available: {}", self.mode, names.join(", "));
            return;
        }
        match TaskMode::parse(arg) {
            Some(mode) => {
                self.mode = mode;
                info!(%mode, "switched mode");
                println!("Switched to {mode} mode.");
            }
            None => println!("Unknown mode '{arg}'. Available: knowledge, multimodal, medical, research."),
        }
    }

    async fn handle_index(&mut self, arg: &str) {
        if arg.is_empty() {
            println!("Usage: /index <file>");
            return;
        }

        let document = match read_document(Path::new(arg)) {
            Ok(document) => document,
            Err(e) => return render_error(&e),
        };

        match self.pipeline.index_document(&document).await {
            Ok(chunks) => {
                println!(
                    "Indexed '{}': {} chunks added ({} total in the knowledge base).",
                    document.id,
                    chunks.len(),
                    self.pipeline.index().len().await,
                );
            }
            Err(e) => render_error(&e.into()),
        }
    }

    fn handle_image(&mut self, arg: &str) {
        if arg.is_empty() {
            println!("Usage: /image <file>");
            return;
        }

        let path = Path::new(arg);
        let mime_type = match mime_for_extension(path) {
            Some(mime) => mime,
            None => {
                println!("Unsupported image type '{arg}'. Use png, jpeg, webp or gif.");
                return;
            }
        };

        match std::fs::read(path) {
            Ok(bytes) => {
                self.pending_image = Some(InlineImage {
                    mime_type: mime_type.to_string(),
                    data: BASE64_STANDARD.encode(&bytes),
                });
                println!("Image attached; it will be sent with the next multimodal query.");
            }
            Err(e) => render_error(&AssistantError::Io(e)),
        }
    }

    async fn handle_status(&self) {
        println!("Mode: {}", self.mode);
        println!("Model: {}", self.generator.name());
        if VectorIndex::exists(&self.kb_path) {
            let index = self.pipeline.index();
            let dims = index
                .dimensions()
                .await
                .map(|d| d.to_string())
                .unwrap_or_else(|| "unset".to_string());
            println!(
                "Knowledge base: {} ({} chunks, {} dimensions)",
                self.kb_path.display(),
                index.len().await,
                dims,
            );
        } else {
            println!(
                "Knowledge base: {} (not created yet; use /index)",
                self.kb_path.display()
            );
        }
        match &self.medical {
            Some(dataset) => println!("Medical dataset: {} rows loaded.", dataset.len()),
            None => println!("Medical dataset: not loaded (pass --medical-data)."),
        }
        println!("Conversation: {} turns.", self.transcript.len());
    }

    /// Route a plain query to the current mode's handler.
    async fn handle_query(&mut self, input: &str) {
        let result = match self.mode {
            TaskMode::Knowledge => self.answer_knowledge(input).await,
            TaskMode::Multimodal => self.answer_multimodal(input).await,
            TaskMode::Medical => self.answer_medical(input).await,
            TaskMode::Research => self.answer_research(input).await,
        };

        self.transcript.push_user(input);
        match result {
            Ok(answer) => {
                println!("\n\x1b[32mgena:\x1b[0m {answer}\n");
                self.transcript.push_assistant(answer);
            }
            Err(e) => {
                render_error(&e);
                // Keep the history coherent after a failed turn.
                self.transcript.push_assistant(format!("(error: {e})"));
            }
        }
    }

    async fn answer_knowledge(&self, question: &str) -> gena_core::Result<String> {
        self.pipeline.answer(question, &self.generator).await
    }

    async fn answer_multimodal(&mut self, input: &str) -> gena_core::Result<String> {
        let mut request =
            GenerationRequest::text(render_conversation(&self.transcript, input))
                .with_instruction(MULTIMODAL_INSTRUCTION);
        if let Some(image) = self.pending_image.take() {
            request = request.with_image(image);
        }
        self.generator.generate(request).await
    }

    async fn answer_medical(&self, query: &str) -> gena_core::Result<String> {
        let dataset = self.medical.as_ref().ok_or_else(|| {
            AssistantError::Config(
                "no medical dataset loaded; start with --medical-data <csv>".to_string(),
            )
        })?;
        let answers = dataset.lookup(query, 3);
        if answers.is_empty() {
            warn!(%query, "no medical dataset rows matched");
        }
        let request = MedicalDataset::build_prompt(query, &answers);
        self.generator.generate(request).await
    }

    async fn answer_research(&self, query: &str) -> gena_core::Result<String> {
        let papers = self.arxiv.search(query, RESEARCH_MAX_RESULTS).await?;
        info!(count = papers.len(), "arxiv papers retrieved");
        let request = ArxivClient::build_prompt(query, &papers);
        self.generator.generate(request).await
    }
}

/// Read a file into a [`Document`], rejecting non-UTF-8 content.
fn read_document(path: &Path) -> Result<Document, AssistantError> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8(bytes).map_err(|_| {
        AssistantError::InvalidEncoding(format!(
            "'{}' is not valid UTF-8; only plain-text documents can be indexed",
            path.display()
        ))
    })?;

    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string();
    Ok(Document::new(id, text))
}

/// Render the history plus the new user turn as a single prompt.
fn render_conversation(transcript: &Transcript, input: &str) -> String {
    let mut prompt = String::new();
    if !transcript.is_empty() {
        prompt.push_str("Conversation so far:\n");
        for message in transcript.iter() {
            let speaker = match message.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            prompt.push_str(&format!("{speaker}: {}\n", message.content));
        }
        prompt.push('\n');
    }
    prompt.push_str(&format!("User: {input}"));
    prompt
}

fn mime_for_extension(path: &Path) -> Option<&'static str> {
    match path.extension()?.to_str()?.to_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

fn render_error(e: &AssistantError) {
    println!("\x1b[31merror:\x1b[0m {e}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn read_document_rejects_invalid_utf8() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00, 0x41]).unwrap();
        let err = read_document(file.path()).unwrap_err();
        assert!(matches!(err, AssistantError::InvalidEncoding(_)));
    }

    #[test]
    fn read_document_uses_file_stem_as_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "some text").unwrap();
        let document = read_document(&path).unwrap();
        assert_eq!(document.id, "notes");
        assert_eq!(document.text, "some text");
    }

    #[test]
    fn conversation_rendering_includes_history() {
        let mut transcript = Transcript::new();
        transcript.push_user("bonjour");
        transcript.push_assistant("Bonjour !");

        let prompt = render_conversation(&transcript, "comment ça va ?");
        assert!(prompt.starts_with("Conversation so far:\nUser: bonjour\nAssistant: Bonjour !\n"));
        assert!(prompt.ends_with("User: comment ça va ?"));

        let fresh = render_conversation(&Transcript::new(), "hello");
        assert_eq!(fresh, "User: hello");
    }

    #[test]
    fn mime_detection_by_extension() {
        assert_eq!(mime_for_extension(Path::new("a.PNG")), Some("image/png"));
        assert_eq!(mime_for_extension(Path::new("a.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_for_extension(Path::new("a.bmp")), None);
        assert_eq!(mime_for_extension(Path::new("noext")), None);
    }
}
