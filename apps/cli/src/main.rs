use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use morph_audio::{load_recording, save_recording, Recording};
use morph_core::{Converter, ConversionConfig};
use morph_model::{load_model, save_model, Model};
use morph_signal::{RawVectorizer, SpectralVectorizer};
use morph_train::{build_pairs, error_report, LeastSquaresFitter, NetworkFitter};

#[derive(Parser)]
#[command(
    name = "voicemorph",
    about = "Learn a transform between two speakers' recordings and apply it to new audio"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fit a conversion model from paired source/target recordings.
    Gen {
        source: PathBuf,
        target: PathBuf,
        /// Where to write the fitted model (JSON).
        output: PathBuf,
        /// Fitting strategy.
        #[arg(long, value_enum, default_value_t = Strategy::Spectral)]
        strategy: Strategy,
    },
    /// Apply a fitted model to a recording.
    Translate {
        model: PathBuf,
        input: PathBuf,
        output: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    /// Frequency-domain features, closed-form regularized linear fit.
    Spectral,
    /// Raw-sample features, iterative nonlinear network fit.
    Nonlinear,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Gen {
            source,
            target,
            output,
            strategy,
        } => gen(&source, &target, &output, strategy),
        Command::Translate {
            model,
            input,
            output,
        } => translate(&model, &input, &output),
    }
}

fn gen(source: &Path, target: &Path, output: &Path, strategy: Strategy) -> Result<()> {
    let source_rec = load_recording(source)
        .with_context(|| format!("reading source recording {}", source.display()))?;
    let target_rec = load_recording(target)
        .with_context(|| format!("reading target recording {}", target.display()))?;

    let model = match strategy {
        Strategy::Spectral => {
            let config = ConversionConfig::spectral();
            let vectorizer = SpectralVectorizer::new(config.window_size);
            let pairs = build_pairs(
                &source_rec.samples,
                &target_rec.samples,
                &vectorizer,
                &config,
            )
            .context("building training pairs")?;
            info!(pairs = pairs.len(), "fitting linear model");
            let linear = LeastSquaresFitter::new(&config)
                .fit(&pairs)
                .context("fitting linear model")?;
            error_report(&pairs, &linear);
            Model::Linear(linear)
        }
        Strategy::Nonlinear => {
            let config = ConversionConfig::raw();
            let pairs = build_pairs(
                &source_rec.samples,
                &target_rec.samples,
                &RawVectorizer,
                &config,
            )
            .context("building training pairs")?;
            info!(pairs = pairs.len(), "fitting network model");
            let network = NetworkFitter::new(&config)
                .fit(&pairs)
                .context("fitting network model")?;
            Model::Network(network)
        }
    };

    save_model(output, &model)
        .with_context(|| format!("writing model {}", output.display()))?;
    info!(model = %output.display(), "model saved");
    Ok(())
}

fn translate(model_path: &Path, input: &Path, output: &Path) -> Result<()> {
    let model = load_model(model_path)
        .with_context(|| format!("reading model {}", model_path.display()))?;
    let recording = load_recording(input)
        .with_context(|| format!("reading input recording {}", input.display()))?;

    // The persisted model kind selects the matching vectorizer variant.
    let window_size = model.window_size();
    let samples = match &model {
        Model::Linear(linear) => {
            let vectorizer = SpectralVectorizer::new(window_size);
            Converter::new(&vectorizer, linear, window_size).convert(&recording.samples)
        }
        Model::Network(network) => {
            Converter::new(&RawVectorizer, network, window_size).convert(&recording.samples)
        }
    };
    info!(
        input_samples = recording.len(),
        output_samples = samples.len(),
        "conversion finished"
    );

    save_recording(
        output,
        &Recording {
            samples,
            sample_rate: recording.sample_rate,
        },
    )
    .with_context(|| format!("writing output recording {}", output.display()))?;
    Ok(())
}
