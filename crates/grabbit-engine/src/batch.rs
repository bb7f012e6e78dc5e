use std::borrow::Cow;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use grabbit_contracts::catalog::{Catalog, PrizeRecord};
use grabbit_contracts::events::{BatchStarted, Commentary, EventKind, EventWriter, ItemEvent};
use grabbit_contracts::models::GenerationMode;
use grabbit_contracts::naming::{ArtifactKind, ArtifactLayout};
use grabbit_contracts::palettes;
use grabbit_contracts::prompts::{compose_banner_prompt, compose_prize_prompt};
use grabbit_contracts::runs::stats::{BatchStats, ItemStatus};
use grabbit_contracts::ConfigError;
use image::ImageFormat;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    should_generate, BatchError, DispatchOutcome, Dispatcher, ExistingPolicy, GenerationRequest,
    ImageBuffer, ReferenceSet,
};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Everything the runner needs to know about one batch. Built by the caller;
/// the engine never reads CLI state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub layout: ArtifactLayout,
    pub aspect_ratio: String,
    pub resolution: Option<String>,
    pub grounding: bool,
    pub policy: ExistingPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindSelection {
    pub prizes: bool,
    pub banners: bool,
}

impl Default for KindSelection {
    fn default() -> Self {
        Self {
            prizes: true,
            banners: true,
        }
    }
}

impl KindSelection {
    pub fn from_flags(prizes_only: bool, banners_only: bool) -> Self {
        Self {
            prizes: !banners_only,
            banners: !prizes_only,
        }
    }

    pub fn kinds(&self) -> Vec<ArtifactKind> {
        let mut kinds = Vec::new();
        if self.prizes {
            kinds.push(ArtifactKind::Prize);
        }
        if self.banners {
            kinds.push(ArtifactKind::Banner);
        }
        kinds
    }
}

/// What happened to one unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub kind: ArtifactKind,
    pub game: String,
    pub prize: Option<String>,
    /// `None` when the game or prize name normalizes to nothing usable.
    pub path: Option<PathBuf>,
    pub status: ItemStatus,
    /// `invalid_name`, `no_image`, `error` or `write_failed` for failed items.
    pub reason: Option<&'static str>,
    pub detail: Option<String>,
}

impl ItemReport {
    pub fn label(&self) -> String {
        match self.prize.as_deref() {
            Some(prize) => format!("{} / {prize}", self.game),
            None => format!("{} banner", self.game),
        }
    }

    fn fail(&mut self, reason: &'static str, detail: String) {
        self.status = ItemStatus::Failed;
        self.reason = Some(reason);
        self.detail = Some(detail);
    }

    fn event<'a>(&'a self, model: Option<&'a str>) -> ItemEvent<'a> {
        ItemEvent {
            kind: self.kind,
            game: &self.game,
            prize: self.prize.as_deref(),
            path: self
                .path
                .as_ref()
                .map(|path| path.to_string_lossy().into_owned()),
            status: self.status,
            model: model.filter(|value| !value.is_empty()),
            reason: self.reason,
            detail: self.detail.as_deref(),
        }
    }
}

pub struct BatchRunner {
    dispatcher: Dispatcher,
    config: GeneratorConfig,
    references: ReferenceSet,
    events: EventWriter,
}

impl BatchRunner {
    /// Fails if grounding is requested but the provider has no grounded model.
    pub fn new(
        dispatcher: Dispatcher,
        config: GeneratorConfig,
        references: ReferenceSet,
        events: EventWriter,
    ) -> Result<Self, ConfigError> {
        if config.grounding {
            dispatcher.require(GenerationMode::Grounded)?;
        }
        Ok(Self {
            dispatcher,
            config,
            references,
            events,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn events(&self) -> &EventWriter {
        &self.events
    }

    /// Prizes of every game in catalog order, then one banner per game.
    ///
    /// Each item ends as exactly one of generated, skipped or failed; item
    /// failures are counted and never returned as `Err`. `progress` sees
    /// every item as soon as it is resolved.
    ///
    /// Only an unwritable event log at `batch_started` stops the batch. Later
    /// event-log faults are logged and the batch carries on.
    pub fn run(
        &self,
        catalog: &Catalog,
        game_filter: Option<&str>,
        kinds: KindSelection,
        progress: &mut dyn FnMut(&ItemReport),
    ) -> Result<BatchStats, BatchError> {
        let catalog = match game_filter {
            Some(filter) => Cow::Owned(catalog.filtered(filter)?),
            None => Cow::Borrowed(catalog),
        };

        self.events.emit(
            EventKind::BatchStarted,
            &BatchStarted {
                games: catalog.game_count(),
                prizes: catalog.prize_count(),
                kinds: kinds.kinds(),
                filter: game_filter,
                policy: self.config.policy.as_str(),
                mode: GenerationMode::from_grounding(self.config.grounding).as_str(),
                provider: self.dispatcher.provider_name(),
                aspect_ratio: &self.config.aspect_ratio,
                resolution: self.config.resolution.as_deref(),
            },
        )?;

        let mut stats = BatchStats::default();
        if kinds.prizes {
            for (game, prizes) in catalog.games() {
                for prize in prizes {
                    let report = self.generate_prize(game, prize);
                    stats.record(report.kind, report.status);
                    progress(&report);
                }
            }
        }
        if kinds.banners {
            for (game, prizes) in catalog.games() {
                let names: Vec<&str> = prizes.iter().map(|prize| prize.name.as_str()).collect();
                let report = self.generate_banner(game, &names);
                stats.record(report.kind, report.status);
                progress(&report);
            }
        }

        self.record(EventKind::BatchFinished, &stats);
        info!(
            total = stats.total(),
            failed = stats.failed(),
            "batch finished"
        );
        Ok(stats)
    }

    pub fn generate_prize(&self, game: &str, prize: &PrizeRecord) -> ItemReport {
        let path = self.config.layout.prize_path(game, &prize.name);
        let mode = GenerationMode::from_grounding(self.config.grounding);
        self.process(ArtifactKind::Prize, game, Some(&prize.name), path, || {
            GenerationRequest {
                prompt_text: compose_prize_prompt(
                    &prize.name,
                    game,
                    prize.notes.as_deref(),
                    self.config.grounding,
                ),
                reference_assets: self.references.prize.clone(),
                mode,
                aspect_ratio: self.config.aspect_ratio.clone(),
                resolution: self.config.resolution.clone(),
            }
        })
    }

    /// Banners always go out in fast mode; the prompt has no lookup phase.
    pub fn generate_banner<S: AsRef<str>>(&self, game: &str, prize_names: &[S]) -> ItemReport {
        let path = self.config.layout.banner_path(game);
        self.process(ArtifactKind::Banner, game, None, path, || {
            GenerationRequest {
                prompt_text: compose_banner_prompt(game, prize_names, &palettes::resolve(game)),
                reference_assets: self.references.banner.clone(),
                mode: GenerationMode::Fast,
                aspect_ratio: self.config.aspect_ratio.clone(),
                resolution: self.config.resolution.clone(),
            }
        })
    }

    fn process(
        &self,
        kind: ArtifactKind,
        game: &str,
        prize: Option<&str>,
        path: Option<PathBuf>,
        build_request: impl FnOnce() -> GenerationRequest,
    ) -> ItemReport {
        let mut report = ItemReport {
            kind,
            game: game.to_string(),
            prize: prize.map(str::to_string),
            path,
            status: ItemStatus::Skipped,
            reason: None,
            detail: None,
        };

        let Some(path) = report.path.clone() else {
            report.fail(
                "invalid_name",
                "name has no characters usable in a file name".to_string(),
            );
            self.finish(&report, None);
            return report;
        };

        if !should_generate(&path, self.config.policy) {
            self.finish(&report, None);
            return report;
        }

        let request = build_request();
        let dispatched = self.dispatcher.dispatch(&request);
        for text in &dispatched.commentary {
            self.record(
                EventKind::ModelCommentary,
                &Commentary {
                    kind,
                    game,
                    prize,
                    model: &dispatched.model,
                    text,
                },
            );
        }

        match dispatched.outcome {
            DispatchOutcome::Image(image) => match persist_png(&path, &image) {
                Ok(()) => report.status = ItemStatus::Generated,
                Err(err) => report.fail("write_failed", format!("{err:#}")),
            },
            DispatchOutcome::Absent => report.fail("no_image", "no image returned".to_string()),
            DispatchOutcome::Error(detail) => report.fail("error", detail),
        }

        self.finish(&report, Some(&dispatched.model));
        report
    }

    fn finish(&self, report: &ItemReport, model: Option<&str>) {
        match report.status {
            ItemStatus::Generated => {
                let path = report.path.as_deref().unwrap_or(Path::new(""));
                info!(kind = report.kind.as_str(), item = %report.label(), path = %path.display(), "generated");
            }
            ItemStatus::Skipped => {}
            ItemStatus::Failed => warn!(
                kind = report.kind.as_str(),
                item = %report.label(),
                reason = report.reason.unwrap_or_default(),
                detail = report.detail.as_deref().unwrap_or_default(),
                "generation failed"
            ),
        }
        self.record(EventKind::for_status(report.status), &report.event(model));
    }

    /// Appends an event mid-batch. A failed append is logged, never raised:
    /// the artifact it describes is already on disk and counted.
    fn record<T: Serialize>(&self, kind: EventKind, body: &T) {
        if let Err(err) = self.events.emit(kind, body) {
            warn!(
                path = %self.events.path().display(),
                error = %format!("{err:#}"),
                "failed to append event"
            );
        }
    }
}

/// Writes `image` as PNG, creating parent directories. Non-PNG payloads are
/// transcoded so the on-disk format always matches the `.png` name.
fn persist_png(path: &Path, image: &ImageBuffer) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let bytes: Cow<'_, [u8]> = if image.bytes.starts_with(PNG_MAGIC) {
        Cow::Borrowed(&image.bytes)
    } else {
        let decoded = image::load_from_memory(&image.bytes).with_context(|| {
            format!(
                "unsupported image payload ({})",
                image.mime_type.as_deref().unwrap_or("unknown type")
            )
        })?;
        let mut encoded = Vec::new();
        decoded
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
            .context("failed to encode PNG")?;
        Cow::Owned(encoded)
    };
    fs::write(path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
