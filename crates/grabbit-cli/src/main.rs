use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use grabbit_contracts::catalog::{self, Catalog, PrizeRecord};
use grabbit_contracts::events::EventWriter;
use grabbit_contracts::models::{GenerationMode, ModelRegistry};
use grabbit_contracts::naming::{self, ArtifactKind, ArtifactLayout};
use grabbit_contracts::palettes;
use grabbit_contracts::runs::stats::{BatchStats, ItemStatus, KindStats};
use grabbit_contracts::ConfigError;
use grabbit_engine::{
    provider_by_name, should_generate, BatchError, BatchRunner, Dispatcher, ExistingPolicy,
    GeneratorConfig, ItemReport, KindSelection, ReferenceSet, StyleReference,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_CSV: &str = "assets/game-prizes-tracker.csv";
const DEFAULT_OUTPUT_ROOT: &str = "assets/generated";
const DEFAULT_PRIZE_REF: &str = "assets/style-references/prize-style-ref.png";
const DEFAULT_BANNER_REF: &str = "assets/style-references/game-banner-style-ref.png";
const PREVIEW_PRIZES: usize = 3;

const EXIT_ITEM_FAILURES: i32 = 1;
const EXIT_CONFIG: i32 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "grabbit-images",
    version,
    about = "Generate prize and game banner images for the claw machine catalog"
)]
struct Cli {
    /// Raise the default log level to debug (GRABBIT_LOG still wins).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate every prize image and game banner in the catalog.
    Batch(BatchArgs),
    /// Generate a single prize image.
    Prize(PrizeArgs),
    /// Generate a single game banner.
    Banner(BannerArgs),
}

#[derive(Debug, Parser)]
struct BatchArgs {
    #[arg(long, default_value = DEFAULT_CSV)]
    csv: PathBuf,
    /// Only games whose name contains this text (case-insensitive).
    #[arg(long)]
    game: Option<String>,
    #[arg(long, conflicts_with = "banners_only")]
    prizes_only: bool,
    #[arg(long)]
    banners_only: bool,
    /// Preview the catalog without generating anything.
    #[arg(long)]
    dry_run: bool,
    #[command(flatten)]
    generation: GenerationArgs,
}

#[derive(Debug, Parser)]
struct PrizeArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    game: String,
    #[arg(long)]
    notes: Option<String>,
    #[command(flatten)]
    generation: GenerationArgs,
}

#[derive(Debug, Parser)]
struct BannerArgs {
    #[arg(long)]
    game: String,
    /// Comma-separated prize names shown on the banner.
    #[arg(long, value_delimiter = ',')]
    prizes: Vec<String>,
    #[command(flatten)]
    generation: GenerationArgs,
}

#[derive(Debug, Args)]
struct GenerationArgs {
    #[arg(long, default_value = DEFAULT_OUTPUT_ROOT)]
    out: PathBuf,
    /// Event log path; defaults to `<out>/events.jsonl`.
    #[arg(long)]
    events: Option<PathBuf>,
    /// Skip items whose output file already exists (the default).
    #[arg(long, conflicts_with = "regenerate")]
    skip_existing: bool,
    /// Regenerate items even when their output file exists.
    #[arg(long)]
    regenerate: bool,
    /// Look up each prize with search grounding before drawing it.
    #[arg(long)]
    grounding: bool,
    #[arg(long)]
    prize_ref: Option<PathBuf>,
    #[arg(long)]
    banner_ref: Option<PathBuf>,
    /// Additional reference image, sent after the style reference. Repeatable.
    #[arg(long = "extra-ref")]
    extra_refs: Vec<PathBuf>,
    #[arg(long, default_value = "3:4")]
    aspect_ratio: String,
    #[arg(long, value_parser = ["1K", "2K", "4K"])]
    resolution: Option<String>,
    /// Image model for fast-mode requests.
    #[arg(long)]
    model: Option<String>,
    #[arg(long, default_value = "gemini")]
    provider: String,
    #[arg(long, default_value_t = 180)]
    timeout_secs: u64,
}

impl GenerationArgs {
    fn layout(&self) -> ArtifactLayout {
        ArtifactLayout::under(&self.out)
    }

    fn policy(&self) -> ExistingPolicy {
        ExistingPolicy::from_regenerate(self.regenerate && !self.skip_existing)
    }

    fn events_path(&self) -> PathBuf {
        self.events
            .clone()
            .unwrap_or_else(|| self.out.join("events.jsonl"))
    }
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("grabbit-images error: {err:#}");
            std::process::exit(exit_code_for(&err));
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Batch(args) => run_batch(args),
        Command::Prize(args) => run_prize(args),
        Command::Banner(args) => run_banner(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("GRABBIT_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Configuration problems exit with 2, anything else unexpected with 1.
fn exit_code_for(err: &anyhow::Error) -> i32 {
    let config_fault = err.chain().any(|cause| {
        cause.is::<ConfigError>()
            || matches!(cause.downcast_ref::<BatchError>(), Some(BatchError::Config(_)))
    });
    if config_fault {
        EXIT_CONFIG
    } else {
        EXIT_ITEM_FAILURES
    }
}

fn run_batch(args: BatchArgs) -> Result<i32> {
    let rows = catalog::read_rows(&args.csv)?;
    let full = Catalog::build(&rows);
    let kinds = KindSelection::from_flags(args.prizes_only, args.banners_only);

    if args.dry_run {
        let scoped = match args.game.as_deref() {
            Some(filter) => full.filtered(filter)?,
            None => full,
        };
        print_preview(&scoped, kinds, &args.generation);
        return Ok(0);
    }

    let runner = build_runner(&args.generation)?;
    println!("Loaded {} games, {} prizes from {}", full.game_count(), full.prize_count(), args.csv.display());
    execute(&runner, &full, args.game.as_deref(), kinds, &args.generation)
}

/// One-off names are typed by hand, so an unusable one is a usage error
/// rather than a failed item.
fn require_identifier(field: &'static str, value: &str) -> Result<(), ConfigError> {
    match naming::identifier(value) {
        Some(_) => Ok(()),
        None => Err(ConfigError::InvalidName {
            field,
            value: value.to_string(),
        }),
    }
}

fn run_prize(args: PrizeArgs) -> Result<i32> {
    require_identifier("game", &args.game)?;
    require_identifier("prize", &args.name)?;
    let mut single = Catalog::new();
    single.insert_game(
        args.game.trim(),
        vec![PrizeRecord {
            name: args.name.trim().to_string(),
            cost: None,
            weight: None,
            notes: args.notes.filter(|value| !value.trim().is_empty()),
        }],
    );
    let runner = build_runner(&args.generation)?;
    execute(
        &runner,
        &single,
        None,
        KindSelection::from_flags(true, false),
        &args.generation,
    )
}

fn run_banner(args: BannerArgs) -> Result<i32> {
    require_identifier("game", &args.game)?;
    let prizes = args
        .prizes
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| PrizeRecord {
            name: name.to_string(),
            cost: None,
            weight: None,
            notes: None,
        })
        .collect();
    let mut single = Catalog::new();
    single.insert_game(args.game.trim(), prizes);
    let runner = build_runner(&args.generation)?;
    execute(
        &runner,
        &single,
        None,
        KindSelection::from_flags(false, true),
        &args.generation,
    )
}

/// Everything that can fail before the first request: provider and
/// credential, model selection, reference images.
fn build_runner(args: &GenerationArgs) -> Result<BatchRunner> {
    let provider = provider_by_name(&args.provider, Duration::from_secs(args.timeout_secs))?;
    let registry = ModelRegistry::default();
    let dispatcher = Dispatcher::new(provider, &registry, args.model.as_deref())?;

    let references = ReferenceSet::load(
        &style_reference(args.prize_ref.as_ref(), DEFAULT_PRIZE_REF),
        &style_reference(args.banner_ref.as_ref(), DEFAULT_BANNER_REF),
        &args.extra_refs,
    )?;
    debug!(
        prize_refs = references.prize.len(),
        banner_refs = references.banner.len(),
        "reference images loaded"
    );

    let config = GeneratorConfig {
        layout: args.layout(),
        aspect_ratio: args.aspect_ratio.clone(),
        resolution: args.resolution.clone(),
        grounding: args.grounding,
        policy: args.policy(),
    };
    let events = EventWriter::new(args.events_path(), uuid::Uuid::new_v4().to_string());
    Ok(BatchRunner::new(dispatcher, config, references, events)?)
}

fn style_reference(explicit: Option<&PathBuf>, default_path: &str) -> StyleReference {
    match explicit {
        Some(path) => StyleReference::Explicit(path.clone()),
        None => StyleReference::Default(PathBuf::from(default_path)),
    }
}

fn execute(
    runner: &BatchRunner,
    catalog: &Catalog,
    game_filter: Option<&str>,
    kinds: KindSelection,
    args: &GenerationArgs,
) -> Result<i32> {
    let mode = GenerationMode::from_grounding(args.grounding);
    println!(
        "Provider: {} | prize mode: {} | aspect ratio: {}{}",
        args.provider,
        mode.as_str(),
        args.aspect_ratio,
        args.resolution
            .as_deref()
            .map(|size| format!(" | resolution: {size}"))
            .unwrap_or_default()
    );
    if args.regenerate {
        println!("Regenerating existing images");
    }

    let started = Instant::now();
    let stats = runner.run(catalog, game_filter, kinds, &mut print_item)?;
    print_summary(&stats, kinds, runner, started.elapsed());

    if stats.is_success() {
        Ok(0)
    } else {
        Ok(EXIT_ITEM_FAILURES)
    }
}

fn print_item(report: &ItemReport) {
    match report.status {
        ItemStatus::Generated => match report.path.as_deref() {
            Some(path) => println!("  generated  {} -> {}", report.label(), path.display()),
            None => println!("  generated  {}", report.label()),
        },
        ItemStatus::Skipped => println!("  skipped    {} (exists)", report.label()),
        ItemStatus::Failed => println!(
            "  FAILED     {} [{}] {}",
            report.label(),
            report.reason.unwrap_or("error"),
            report.detail.as_deref().unwrap_or_default()
        ),
    }
}

fn print_summary(stats: &BatchStats, kinds: KindSelection, runner: &BatchRunner, elapsed: Duration) {
    let layout = &runner.config().layout;
    println!();
    println!("Finished in {:.1}s", elapsed.as_secs_f64());
    if kinds.prizes {
        print_kind_line("Prizes", &stats.prizes, &layout.prizes_root);
    }
    if kinds.banners {
        print_kind_line("Banners", &stats.banners, &layout.banners_root);
    }
    println!("Events: {}", runner.events().path().display());
    if !stats.is_success() {
        println!("{} item(s) failed; rerun to retry them", stats.failed());
    }
}

fn print_kind_line(label: &str, counts: &KindStats, root: &Path) {
    println!(
        "{label}: {} generated, {} skipped, {} failed -> {}",
        counts.generated,
        counts.skipped,
        counts.failed,
        root.display()
    );
}

fn print_preview(catalog: &Catalog, kinds: KindSelection, args: &GenerationArgs) {
    let layout = args.layout();
    let policy = args.policy();
    println!(
        "Dry run: {} games, {} prizes",
        catalog.game_count(),
        catalog.prize_count()
    );

    let mut pending_prizes = 0usize;
    let mut pending_banners = 0usize;
    for (game, prizes) in catalog.games() {
        println!();
        println!(
            "{game}: {} prizes, banner colour {}",
            prizes.len(),
            palettes::resolve(game).primary
        );
        for prize in prizes.iter().take(PREVIEW_PRIZES) {
            println!("  - {}", prize.name);
        }
        if prizes.len() > PREVIEW_PRIZES {
            println!("  ... and {} more", prizes.len() - PREVIEW_PRIZES);
        }

        let pending =
            |path: Option<PathBuf>| path.is_some_and(|path| should_generate(&path, policy));
        pending_prizes += prizes
            .iter()
            .filter(|prize| pending(layout.prize_path(game, &prize.name)))
            .count();
        if pending(layout.banner_path(game)) {
            pending_banners += 1;
        }
    }

    println!();
    if kinds.prizes {
        println!(
            "Would generate {pending_prizes} of {} {} images",
            catalog.prize_count(),
            ArtifactKind::Prize.as_str()
        );
    }
    if kinds.banners {
        println!(
            "Would generate {pending_banners} of {} {} images",
            catalog.game_count(),
            ArtifactKind::Banner.as_str()
        );
    }
}
