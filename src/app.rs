//! Application composition root.
//!
//! Builds the shared read-only services from configuration:
//! labels + model → classifier, refiner + synthesizer → finalizer, asset map,
//! then serves the router.

use crate::assets::SignAssetMap;
use crate::config::{Config, ModelConfig, ModelKind, RefineConfig, RefineProvider, TtsConfig};
use crate::error::{Result, SignStreamError};
use crate::landmarks::JsonLandmarkDetector;
use crate::recognition::{LabelTable, LinearSignModel, SignClassifier, SignModel};
use crate::refine::{CommandSynthesizer, PassthroughRefiner, Refiner, SentenceFinalizer, Synthesizer};
use crate::server::{AppState, build_router};
use crate::session::{SessionConfig, SessionServices, SystemClock};
use std::sync::Arc;

/// Load the label table and model named by `config`.
pub fn load_classifier(config: &ModelConfig) -> Result<SignClassifier> {
    let labels = Arc::new(LabelTable::load(&config.labels)?);
    tracing::info!(path = %config.labels.display(), count = labels.len(), "Loaded sign labels");

    let model: Arc<dyn SignModel> = match config.kind {
        ModelKind::Linear => {
            let model = LinearSignModel::load(&config.path)?;
            if model.window() != config.window {
                return Err(SignStreamError::ConfigInvalidValue {
                    key: "model.window".to_string(),
                    message: format!(
                        "model expects {} frames but window is {}",
                        model.window(),
                        config.window
                    ),
                });
            }
            if model.num_classes() != labels.len() {
                tracing::warn!(
                    classes = model.num_classes(),
                    labels = labels.len(),
                    "Model class count differs from label table; extra classes decode as unknown"
                );
            }
            Arc::new(model)
        }
        ModelKind::Lstm => load_lstm(config, labels.len())?,
    };
    tracing::info!(model = model.model_name(), path = %config.path.display(), "Loaded sign model");

    Ok(SignClassifier::new(model, labels))
}

#[cfg(feature = "lstm-model")]
fn load_lstm(config: &ModelConfig, num_classes: usize) -> Result<Arc<dyn SignModel>> {
    use crate::recognition::{LstmArchitecture, LstmSignModel};

    let arch = LstmArchitecture {
        num_classes,
        window: config.window,
        ..Default::default()
    };
    Ok(Arc::new(LstmSignModel::load(&config.path, &arch)?))
}

#[cfg(not(feature = "lstm-model"))]
fn load_lstm(_config: &ModelConfig, _num_classes: usize) -> Result<Arc<dyn SignModel>> {
    Err(SignStreamError::ConfigInvalidValue {
        key: "model.kind".to_string(),
        message: "lstm requires building with the lstm-model feature".to_string(),
    })
}

/// Build the configured refiner.
///
/// A provider that cannot be set up (e.g. no API key) degrades to
/// passthrough with a warning; the server still starts.
pub fn build_refiner(config: &RefineConfig) -> Arc<dyn Refiner> {
    match config.provider {
        RefineProvider::None => Arc::new(PassthroughRefiner),
        RefineProvider::Gemini => gemini_refiner(config),
    }
}

#[cfg(feature = "gemini")]
fn gemini_refiner(config: &RefineConfig) -> Arc<dyn Refiner> {
    match crate::refine::GeminiRefiner::from_env(&config.model, config.timeout()) {
        Ok(refiner) => Arc::new(refiner),
        Err(e) => {
            tracing::warn!(error = %e, "Gemini refiner unavailable, sentences will not be refined");
            Arc::new(PassthroughRefiner)
        }
    }
}

#[cfg(not(feature = "gemini"))]
fn gemini_refiner(_config: &RefineConfig) -> Arc<dyn Refiner> {
    tracing::warn!("Built without the gemini feature, sentences will not be refined");
    Arc::new(PassthroughRefiner)
}

/// Build the configured synthesizer, or `None` when speech is disabled.
pub fn build_synthesizer(config: &TtsConfig) -> Option<Arc<dyn Synthesizer>> {
    if !config.enabled {
        return None;
    }
    let synthesizer = CommandSynthesizer::new(&config.program, config.args.clone(), &config.output_dir)
        .with_extension(&config.extension);
    Some(Arc::new(synthesizer))
}

/// Assemble the router state from a loaded configuration.
pub fn build_state(config: &Config) -> Result<AppState> {
    let classifier = load_classifier(&config.model)?;
    let assets = SignAssetMap::load(&config.assets.mapping)?;
    let finalizer = SentenceFinalizer::new(build_refiner(&config.refine), build_synthesizer(&config.tts));

    let tts_dir = (config.tts.enabled && config.server.serve_tts).then(|| config.tts.output_dir.clone());

    Ok(AppState {
        services: SessionServices {
            detector: Arc::new(JsonLandmarkDetector),
            classifier,
            finalizer,
            clock: Arc::new(SystemClock),
        },
        session: SessionConfig {
            window_len: config.model.window,
            pause: config.segmentation.pause(),
            queue_capacity: config.session.queue_capacity,
            min_frame_interval: config.session.min_frame_interval(),
        },
        assets: Arc::new(assets),
        tts_dir,
    })
}

/// Bind `config.server` and serve until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let state = build_state(config)?;
    if let Some(dir) = &state.tts_dir {
        tokio::fs::create_dir_all(dir).await?;
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(addr = %local_addr, version = %crate::version_string(), "signstream server started");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("signstream server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
