use std::{borrow::Cow, io::Write as _, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use chrono::Utc;
use chrono_tz::Tz;
use reqwest::Client;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::{
    ai::{CompletionService, GeminiClient},
    config::AppConfig,
    console::{self, render, Command},
    history::{export_file_name, HistoryStore},
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
    pipeline::{ClassificationPipeline, ClassifyError},
};

const RECENT_LIMIT: usize = 5;

pub struct SpamClassifierApp {
    pipeline: ClassificationPipeline,
    store: HistoryStore,
    export_dir: PathBuf,
    tz: Tz,
    api_key_configured: bool,
    draft: String,
    awaiting_clear: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue(Option<String>),
    Quit,
}

impl SpamClassifierApp {
    pub fn initialize(config: AppConfig, paths: ResolvedPaths) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(format!("mail-verdict/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        let gemini = GeminiClient::new(http_client, config.gemini.clone());
        let api_key_configured = gemini.has_api_key();
        if !api_key_configured {
            tracing::warn!(
                target: "console",
                "GEMINI_API_KEY is not set; classification requests will fail"
            );
        }

        let tz = config.tz();
        let mut store = HistoryStore::new(paths.history_path.clone(), tz);
        if let Err(err) = store.load() {
            eprintln!("Error loading classification history: {err}");
        }

        Ok(Self::from_parts(
            Arc::new(gemini),
            store,
            paths.export_dir,
            tz,
            api_key_configured,
        ))
    }

    fn from_parts(
        model: Arc<dyn CompletionService>,
        store: HistoryStore,
        export_dir: PathBuf,
        tz: Tz,
        api_key_configured: bool,
    ) -> Self {
        Self {
            pipeline: ClassificationPipeline::new(model),
            store,
            export_dir,
            tz,
            api_key_configured,
            draft: String::new(),
            awaiting_clear: false,
        }
    }

    pub async fn run(mut self, shutdown: Shutdown) -> Result<()> {
        tracing::info!(
            target: "console",
            history = %self.store.path().display(),
            entries = self.store.entries().len(),
            "email spam classifier started"
        );
        println!("AI Email Spam Classifier");
        if !self.api_key_configured {
            println!("Warning: GEMINI_API_KEY not found; set it in your environment or .env file.");
        }
        println!("{}", render::help());

        let mut stdin = BufReader::new(tokio::io::stdin());
        let mut buf = Vec::new();
        let mut listener = shutdown.subscribe();

        loop {
            prompt(self.draft.is_empty());
            let line = tokio::select! {
                _ = listener.notified() => break,
                line = read_line(&mut stdin, &mut buf) => line.context("failed to read from stdin")?,
            };
            let Some(line) = line else {
                if !self.draft.is_empty() {
                    let email = std::mem::take(&mut self.draft);
                    let output = tokio::select! {
                        out = self.submit(&email) => out,
                        _ = listener.notified() => break,
                    };
                    println!("{output}");
                }
                break;
            };

            let flow = tokio::select! {
                flow = self.handle_line(&line) => flow,
                _ = listener.notified() => {
                    tracing::info!(
                        target: "console",
                        "shutdown requested during classification; abandoning request"
                    );
                    break;
                }
            };
            match flow {
                Flow::Continue(Some(output)) => println!("{output}"),
                Flow::Continue(None) => {}
                Flow::Quit => break,
            }
        }

        tracing::info!(target: "console", "email spam classifier stopped");
        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> Flow {
        if self.awaiting_clear {
            self.awaiting_clear = false;
            if console::is_confirmation(line) {
                return Flow::Continue(Some(self.clear_history()));
            }
            return Flow::Continue(Some("Clear cancelled.".to_string()));
        }

        if self.draft.is_empty() {
            match console::parse_command(line) {
                Some(Ok(command)) => return self.run_command(command).await,
                Some(Err(message)) => return Flow::Continue(Some(message)),
                None => {}
            }
        }

        if console::is_submit(line) {
            let email = std::mem::take(&mut self.draft);
            return Flow::Continue(Some(self.submit(&email).await));
        }

        self.draft.push_str(line);
        self.draft.push('\n');
        Flow::Continue(None)
    }

    async fn submit(&mut self, raw: &str) -> String {
        let email = raw.strip_suffix('\n').unwrap_or(raw);
        let interpretation = match self.pipeline.classify(email).await {
            Ok(interpretation) => interpretation,
            Err(ClassifyError::InvalidInput) => {
                return "Please enter email content to analyze!".to_string()
            }
            Err(err) => return format!("Error in classification: {err}"),
        };

        let mut output = render::verdict(&interpretation);
        if let Err(err) = self.store.append(email, interpretation.into_result()) {
            output.push_str(&format!("\nWarning: could not save history: {err}\n"));
        }
        output.push('\n');
        output.push_str(&render::statistics(self.store.stats()));
        output
    }

    async fn run_command(&mut self, command: Command) -> Flow {
        let output = match command {
            Command::Stats => render::statistics(self.store.stats()),
            Command::History => {
                let lines: Vec<String> =
                    self.store.recent(RECENT_LIMIT).map(render::history_line).collect();
                if lines.is_empty() {
                    "No classifications yet.".to_string()
                } else {
                    format!("Recent classifications:\n{}", lines.join("\n"))
                }
            }
            Command::Show(id) => match self.store.get(id) {
                Some(entry) => render::history_entry(entry),
                None => format!("No entry #{id}."),
            },
            Command::Export => self.export_history().await,
            Command::Clear => {
                if self.store.entries().is_empty() {
                    "No history to clear.".to_string()
                } else {
                    self.awaiting_clear = true;
                    format!(
                        "Delete all {} entries? Type 'yes' to confirm.",
                        self.store.entries().len()
                    )
                }
            }
            Command::Status => self.status(),
            Command::Help => render::help().to_string(),
            Command::Quit => return Flow::Quit,
        };
        Flow::Continue(Some(output))
    }

    fn clear_history(&mut self) -> String {
        match self.store.clear() {
            Ok(()) => "History cleared!".to_string(),
            Err(err) => format!("History cleared in memory, but saving failed: {err}"),
        }
    }

    async fn export_history(&self) -> String {
        if self.store.entries().is_empty() {
            return "No classification history to export.".to_string();
        }
        let document = match self.store.export() {
            Ok(document) => document,
            Err(err) => return format!("Export failed: {err}"),
        };
        let path = self
            .export_dir
            .join(export_file_name(&Utc::now().with_timezone(&self.tz)));
        match tokio::fs::write(&path, document).await {
            Ok(()) => {
                tracing::info!(target: "console", path = %path.display(), "history exported");
                format!("History exported to {}", path.display())
            }
            Err(err) => {
                tracing::error!(target: "console", error = %err, path = %path.display(), "export failed");
                format!("Export failed: {err}")
            }
        }
    }

    fn status(&self) -> String {
        let key = if self.api_key_configured {
            "API key loaded from environment"
        } else {
            "API key not found (set GEMINI_API_KEY)"
        };
        let file = match self.store.document_size() {
            Some(size) => format!("{} ({size} bytes)", self.store.path().display()),
            None => format!("{} (not written yet)", self.store.path().display()),
        };
        format!(
            "{key}\nHistory file: {file}\nEntries: {}",
            self.store.entries().len()
        )
    }
}

/// Reads one line without its terminator; `None` at end of input.
///
/// Invalid UTF-8 is replaced rather than rejected so a pasted email with a
/// stray byte does not end the session.
async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    if buf.ends_with(b"\n") {
        buf.pop();
        if buf.ends_with(b"\r") {
            buf.pop();
        }
    }
    let line = match String::from_utf8_lossy(buf) {
        Cow::Borrowed(line) => line.to_string(),
        Cow::Owned(line) => {
            tracing::warn!(target: "console", "input line was not valid UTF-8; invalid bytes replaced");
            line
        }
    };
    Ok(Some(line))
}

fn prompt(fresh: bool) {
    if fresh {
        print!("> ");
        let _ = std::io::stdout().flush();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::future::BoxFuture;
    use tempfile::TempDir;

    use super::*;

    struct CannedModel {
        reply: String,
        calls: AtomicUsize,
    }

    impl CompletionService for CannedModel {
        fn complete<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.reply.clone();
            Box::pin(async move { Ok(reply) })
        }
    }

    fn app_in(dir: &TempDir, reply: &str) -> (SpamClassifierApp, Arc<CannedModel>) {
        let model = Arc::new(CannedModel {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        });
        let store = HistoryStore::new(dir.path().join("history.json"), chrono_tz::UTC);
        let app = SpamClassifierApp::from_parts(
            model.clone(),
            store,
            dir.path().to_path_buf(),
            chrono_tz::UTC,
            true,
        );
        (app, model)
    }

    const SPAM_REPLY: &str = r#"{"classification":"spam","confidence_score":93,"reasoning":"Phishing","spam_indicators":["link"],"risk_level":"high"}"#;

    #[tokio::test]
    async fn pasted_email_is_classified_and_recorded() {
        let dir = TempDir::new().unwrap();
        let (mut app, model) = app_in(&dir, SPAM_REPLY);

        assert_eq!(app.handle_line("Subject: prize").await, Flow::Continue(None));
        assert_eq!(app.handle_line(":stats looks like a command").await, Flow::Continue(None));
        let Flow::Continue(Some(output)) = app.handle_line(".").await else {
            panic!("expected output");
        };
        assert!(output.contains("SPAM DETECTED"));
        assert!(output.contains("Total emails analyzed: 1"));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);

        let entry = &app.store.entries()[0];
        assert_eq!(entry.email_content, "Subject: prize\n:stats looks like a command");
    }

    #[tokio::test]
    async fn empty_submission_is_rejected() {
        let dir = TempDir::new().unwrap();
        let (mut app, model) = app_in(&dir, SPAM_REPLY);

        let flow = app.handle_line(".").await;
        assert_eq!(
            flow,
            Flow::Continue(Some("Please enter email content to analyze!".into()))
        );
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert!(app.store.entries().is_empty());
    }

    #[tokio::test]
    async fn clear_requires_confirmation() {
        let dir = TempDir::new().unwrap();
        let (mut app, _) = app_in(&dir, SPAM_REPLY);
        app.handle_line("hello").await;
        app.handle_line(".").await;

        app.handle_line(":clear").await;
        app.handle_line("no").await;
        assert_eq!(app.store.entries().len(), 1);

        app.handle_line(":clear").await;
        let flow = app.handle_line("yes").await;
        assert_eq!(flow, Flow::Continue(Some("History cleared!".into())));
        assert_eq!(app.store.stats().total, 0);
    }

    #[tokio::test]
    async fn export_writes_timestamped_document() {
        let dir = TempDir::new().unwrap();
        let (mut app, _) = app_in(&dir, SPAM_REPLY);

        let flow = app.handle_line(":export").await;
        assert_eq!(
            flow,
            Flow::Continue(Some("No classification history to export.".into()))
        );

        app.handle_line("win money").await;
        app.handle_line(".").await;
        app.handle_line(":export").await;

        let exported: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| name.starts_with("email_classifications_"))
            .collect();
        assert_eq!(exported.len(), 1);
        assert!(exported[0].ends_with(".json"));
    }

    #[tokio::test]
    async fn invalid_utf8_input_keeps_the_session() {
        let dir = TempDir::new().unwrap();
        let (mut app, model) = app_in(&dir, SPAM_REPLY);
        let mut input: &[u8] = b"Subject: offer\r\nprice \xff\xfe only today\n.\n:stats";
        let mut buf = Vec::new();

        let mut outputs = Vec::new();
        while let Some(line) = read_line(&mut input, &mut buf).await.unwrap() {
            if let Flow::Continue(Some(output)) = app.handle_line(&line).await {
                outputs.push(output);
            }
        }

        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            app.store.entries()[0].email_content,
            "Subject: offer\nprice \u{FFFD}\u{FFFD} only today"
        );
        assert!(outputs[0].contains("SPAM DETECTED"));
        assert!(outputs[1].contains("Total emails analyzed: 1"));
    }

    #[tokio::test]
    async fn verdict_is_shown_when_history_cannot_be_saved() {
        let dir = TempDir::new().unwrap();
        let model = Arc::new(CannedModel {
            reply: SPAM_REPLY.to_string(),
            calls: AtomicUsize::new(0),
        });
        let store = HistoryStore::new(
            dir.path().join("missing").join("history.json"),
            chrono_tz::UTC,
        );
        let mut app = SpamClassifierApp::from_parts(
            model,
            store,
            dir.path().to_path_buf(),
            chrono_tz::UTC,
            true,
        );

        app.handle_line("Win a free cruise").await;
        let Flow::Continue(Some(output)) = app.handle_line(".").await else {
            panic!("expected output");
        };
        assert!(output.contains("SPAM DETECTED"));
        assert!(output.contains("could not save history"));
        assert_eq!(app.store.stats().total, 1);
    }

    #[tokio::test]
    async fn quit_and_unknown_commands() {
        let dir = TempDir::new().unwrap();
        let (mut app, _) = app_in(&dir, SPAM_REPLY);
        assert!(matches!(
            app.handle_line(":nope").await,
            Flow::Continue(Some(msg)) if msg.contains("unknown command")
        ));
        assert_eq!(app.handle_line(":quit").await, Flow::Quit);
    }
}
