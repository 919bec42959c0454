//! Application entry point — robot voice console.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Build the HTTP backends the enabled pipelines need.  Blocking
//!    `reqwest` clients must be created outside the async runtime.
//! 4. Register the pipelines with the [`PipelineOrchestrator`].
//! 5. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 6. Serve requests:
//!    * `robot-voice [--stream] file.wav …` runs every file through the
//!      audio flows of each pipeline;
//!    * without arguments, every stdin line goes through the text flows
//!      (`/reset`, `/status` and `/quit` are commands).

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use robot_voice::{
    config::AppConfig,
    llm::ApiEngine,
    pipeline::{Engines, PipelineKind, PipelineOrchestrator},
    stt::ApiRecognizer,
    tts::{frame_payload, ApiSynthesizer, SpeechSynthesizer},
};

// ---------------------------------------------------------------------------
// Audio files
// ---------------------------------------------------------------------------

/// Run one WAV file through the audio flow of every loaded pipeline.
async fn process_file(orc: &PipelineOrchestrator, path: &Path, stream: bool) -> anyhow::Result<()> {
    let wav = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;

    for &kind in orc.loaded() {
        match kind {
            PipelineKind::Robot => {
                let response = orc.robot()?.command(wav.clone()).await?;
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
            PipelineKind::Assistant if stream => {
                let mut reply = orc.assistant()?.chat_stream(wav.clone()).await?;
                println!("> {}", reply.transcription);

                let mut index = 0;
                while let Some(frame) = reply.chunks.recv().await {
                    let Some(payload) = frame_payload(&frame) else {
                        break;
                    };
                    index += 1;
                    let out = reply_path(path, Some(index));
                    std::fs::write(&out, payload)?;
                    println!("  chunk {index}: {}", out.display());
                }
            }
            PipelineKind::Assistant => {
                let reply = orc.assistant()?.chat(wav.clone()).await?;
                let out = reply_path(path, None);
                std::fs::write(&out, &reply.wav)?;
                println!("> {}", reply.transcription);
                println!("< {}", reply.response_text);
                println!("  audio: {} ({:?})", out.display(), reply.timing);
            }
        }
    }
    Ok(())
}

/// `orden.wav` → `orden.reply.wav` / `orden.reply.3.wav`.
fn reply_path(input: &Path, index: Option<usize>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".into());
    let name = match index {
        Some(i) => format!("{stem}.reply.{i}.wav"),
        None => format!("{stem}.reply.wav"),
    };
    input.with_file_name(name)
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

/// Handle one console line.  Returns `false` to quit.
async fn handle_line(orc: &PipelineOrchestrator, line: &str) -> anyhow::Result<bool> {
    match line {
        "" => {}
        "/quit" | "/exit" => return Ok(false),
        "/status" => println!("{}", serde_json::to_string_pretty(&orc.status())?),
        "/reset" => {
            for &kind in orc.loaded() {
                orc.reset(kind)?;
            }
            println!("history cleared");
        }
        text => {
            for &kind in orc.loaded() {
                match kind {
                    PipelineKind::Robot => {
                        let response = orc.robot()?.command_text(text).await?;
                        println!("{}", serde_json::to_string(&response)?);
                    }
                    PipelineKind::Assistant => {
                        println!("< {}", orc.assistant()?.reply(text).await?);
                    }
                }
            }
        }
    }
    Ok(true)
}

async fn run_console(orc: &PipelineOrchestrator) -> anyhow::Result<()> {
    if orc.loaded().is_empty() {
        println!("{}", serde_json::to_string_pretty(&orc.status())?);
        return Ok(());
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("robot-voice> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        match handle_line(orc, line?.trim()).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => log::error!("{e:#}"),
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("robot-voice starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3 + 4. Backends and pipelines (before the runtime exists)
    let kinds = PipelineKind::parse_list(&config.pipelines);
    let orchestrator = if kinds.is_empty() {
        PipelineOrchestrator::status_only(&config)
    } else {
        let tts = kinds.iter().any(|k| k.requires_tts()).then(|| {
            Arc::new(ApiSynthesizer::from_config(&config.tts)) as Arc<dyn SpeechSynthesizer>
        });
        let engines = Engines {
            stt: Arc::new(ApiRecognizer::from_config(&config.stt)),
            llm: Arc::new(ApiEngine::from_config(&config.llm)),
            tts,
        };
        PipelineOrchestrator::with_pipelines(&kinds, &config, engines)?
    };
    log::info!(
        "ready, pipelines: {:?}",
        orchestrator.status().pipelines
    );

    // 5. Tokio runtime (declared after the orchestrator so it is dropped
    //    first; the blocking clients must not be dropped inside it)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 6. Serve
    let mut stream = false;
    let mut files = Vec::new();
    for arg in std::env::args().skip(1) {
        if arg == "--stream" {
            stream = true;
        } else {
            files.push(PathBuf::from(arg));
        }
    }

    rt.block_on(async {
        if files.is_empty() {
            return run_console(&orchestrator).await;
        }
        for file in &files {
            if let Err(e) = process_file(&orchestrator, file, stream).await {
                log::error!("{}: {e:#}", file.display());
            }
        }
        Ok(())
    })
}
