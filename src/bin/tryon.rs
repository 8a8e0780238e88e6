//! CLI for Tryon - virtual try-on image generation.

use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tryon::{
    compose_prompt, AspectRatio, GalleryView, GeminiModel, GeminiProvider, ImageUpload,
    TryOnOptions, TryOnProvider, TryOnSession, API_KEY_ENV_VARS, MAX_COUNT,
};

#[derive(Parser)]
#[command(name = "tryon")]
#[command(about = "See yourself in a garment: virtual try-on via Gemini image models")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log request details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the person wearing the garment
    Generate(GenerateArgs),

    /// Print the instruction that would be sent, without calling the API
    Prompt(PromptArgs),

    /// List available models
    Models,

    /// Check that the API key and model are usable
    Check(ModelArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Photo of the person (PNG, JPG or WEBP)
    #[arg(long)]
    person: PathBuf,

    /// Photo of the garment (PNG, JPG or WEBP)
    #[arg(long)]
    garment: PathBuf,

    /// Number of images to generate
    #[arg(short = 'n', long, default_value_t = TryOnOptions::DEFAULT_COUNT,
          value_parser = clap::value_parser!(u32).range(1..=MAX_COUNT as i64))]
    count: u32,

    /// Aspect ratio of every image
    #[arg(long, value_enum, default_value = "9:16")]
    aspect_ratio: AspectRatioArg,

    /// Additional instructions, e.g. "change background to a beach"
    #[arg(short, long, default_value = "")]
    prompt: String,

    /// Directory the images are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Also write an HTML gallery to this path
    #[arg(long)]
    html: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args)]
struct PromptArgs {
    /// Aspect ratio of every image
    #[arg(long, value_enum, default_value = "9:16")]
    aspect_ratio: AspectRatioArg,

    /// Additional instructions
    #[arg(short, long, default_value = "")]
    prompt: String,
}

#[derive(Args)]
struct ModelArgs {
    /// Model to use
    #[arg(short, long, value_enum, default_value = "gemini-2.5-flash-image-preview")]
    model: ModelArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AspectRatioArg {
    #[value(name = "9:16")]
    Portrait,
    #[value(name = "1:1")]
    Square,
    #[value(name = "16:9")]
    Landscape,
}

impl From<AspectRatioArg> for AspectRatio {
    fn from(arg: AspectRatioArg) -> Self {
        match arg {
            AspectRatioArg::Portrait => AspectRatio::Portrait,
            AspectRatioArg::Square => AspectRatio::Square,
            AspectRatioArg::Landscape => AspectRatio::Landscape,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    #[value(name = "gemini-2.5-flash-image-preview")]
    FlashImagePreview,
    #[value(name = "gemini-2.5-flash-image")]
    FlashImage,
    #[value(name = "nano-banana-pro-preview")]
    NanoBananaPro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::FlashImagePreview => GeminiModel::FlashImagePreview,
            ModelArg::FlashImage => GeminiModel::FlashImage,
            ModelArg::NanoBananaPro => GeminiModel::NanoBananaPro,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate(args) => generate(args, cli.json).await?,
        Commands::Prompt(args) => print_prompt(args, cli.json)?,
        Commands::Models => list_models(cli.json)?,
        Commands::Check(args) => check(args, cli.json).await?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "tryon=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_provider(model: ModelArg, timeout: Option<u64>) -> anyhow::Result<GeminiProvider> {
    let mut builder = GeminiProvider::builder().model(model.into());
    if let Some(secs) = timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

async fn generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let provider = build_provider(args.model.model, args.timeout)?;

    let mut session = TryOnSession::new().with_download_dir(&args.output_dir);
    session.select_person(ImageUpload::from_path(&args.person).await?);
    session.select_garment(ImageUpload::from_path(&args.garment).await?);
    session.options = TryOnOptions::new()
        .with_count(args.count)
        .with_aspect_ratio(args.aspect_ratio.into())
        .with_instructions(args.prompt)
        .with_auto_download(true);

    let aspect_ratio = session.options.aspect_ratio;
    let bar = if json_output {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(args.count as u64)
    };
    bar.set_style(ProgressStyle::with_template(
        "{spinner} {msg} [{bar:20}] {pos}/{len} ({elapsed})",
    )?);
    bar.set_message(session.options.generate_label().replace("Generate", "Generating"));
    bar.enable_steady_tick(Duration::from_millis(120));

    let outcome = session
        .generate_with_progress(&provider, |progress| {
            bar.set_position(progress.completed as u64);
            tracing::debug!(
                "{}",
                GalleryView::pending(progress, aspect_ratio).render_text()
            );
        })
        .await
        .map(|images| images.len());
    bar.finish_and_clear();

    if let Err(e) = outcome {
        let message = session
            .error()
            .map(str::to_string)
            .unwrap_or_else(|| e.to_string());
        if json_output {
            let result = serde_json::json!({
                "success": false,
                "error": message,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
            std::process::exit(1);
        }
        anyhow::bail!(message);
    }

    let gallery = session.gallery();
    if let Some(ref html_path) = args.html {
        std::fs::write(html_path, gallery.render_html())?;
    }

    let paths: Vec<PathBuf> = session
        .results()
        .iter()
        .enumerate()
        .map(|(index, image)| args.output_dir.join(image.download_name(index)))
        .collect();

    if json_output {
        let images: Vec<_> = session
            .results()
            .iter()
            .zip(&paths)
            .map(|(image, path)| {
                serde_json::json!({
                    "output": path.display().to_string(),
                    "size_bytes": image.size(),
                    "format": image.format.extension(),
                    "model": image.metadata.model,
                    "duration_ms": image.metadata.duration_ms,
                })
            })
            .collect();
        let result = serde_json::json!({
            "success": true,
            "provider": provider.kind().to_string(),
            "aspect_ratio": aspect_ratio.as_str(),
            "requested": args.count,
            "images": images,
            "html": args.html.as_ref().map(|p| p.display().to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", gallery.render_text());
        for path in &paths {
            println!("Saved: {}", path.display());
        }
        if let Some(ref html_path) = args.html {
            println!("Gallery: {}", html_path.display());
        }
    }

    Ok(())
}

fn print_prompt(args: PromptArgs, json_output: bool) -> anyhow::Result<()> {
    let aspect_ratio: AspectRatio = args.aspect_ratio.into();
    let prompt = compose_prompt(aspect_ratio, &args.prompt);
    if json_output {
        let result = serde_json::json!({
            "aspect_ratio": aspect_ratio.as_str(),
            "prompt": prompt,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{prompt}");
    }
    Ok(())
}

fn list_models(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct ModelInfo {
        id: &'static str,
        default: bool,
    }

    let models: Vec<ModelInfo> = GeminiModel::ALL
        .into_iter()
        .map(|m| ModelInfo {
            id: m.as_str(),
            default: m == GeminiModel::default(),
        })
        .collect();

    if json_output {
        let result = serde_json::json!({
            "provider": "gemini",
            "env_vars": API_KEY_ENV_VARS,
            "models": models,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Gemini (Google) models:\n");
        for m in &models {
            let marker = if m.default { " (default)" } else { "" };
            println!("  {}{}", m.id, marker);
        }
        println!("\nAPI key: {}", API_KEY_ENV_VARS.join(" | "));
    }

    Ok(())
}

async fn check(args: ModelArgs, json_output: bool) -> anyhow::Result<()> {
    let provider = build_provider(args.model, None)?;
    let result = provider.health_check().await;

    if json_output {
        let body = serde_json::json!({
            "provider": provider.name(),
            "model": provider.model().as_str(),
            "ok": result.is_ok(),
            "error": result.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        match &result {
            Ok(()) => println!("✓ {} ({}) is reachable", provider.name(), provider.model().as_str()),
            Err(e) => println!("✗ {} ({}): {e}", provider.name(), provider.model().as_str()),
        }
    }

    result.map_err(Into::into)
}
