use std::{error::Error, fs, path::{Path, PathBuf}};

use clap::{Parser, Subcommand};
use serde::Serialize;

use piano_transcribe::agreement::{score_pairwise, AgreementResult};
use piano_transcribe::constants::DEFAULT_BPM;
use piano_transcribe::postprocessing::midi::generate_midi_file_data;
use piano_transcribe::transcription::TranscriptionSummary;
use piano_transcribe::{evaluate_onsets, extract, AnalysisInput, Config, Transcription};

#[derive(Parser, Debug)]
#[command(author, version, about = "Piano note extraction and transcription agreement")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON config file; missing keys keep their defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract notes from a spectrogram analysis file
    Transcribe {
        /// JSON with sample_rate, hop_length, spectrogram_db and onset_frames
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,
        /// Provenance written on every note
        #[arg(short, long)]
        source: Option<String>,
        #[arg(long, default_value_t = DEFAULT_BPM)]
        bpm: u32,
    },
    /// Pairwise agreement between transcriptions of one recording
    Agree {
        /// Transcription JSON files, one per source
        #[arg(required = true, num_args = 2..)]
        transcriptions: Vec<PathBuf>,
        #[arg(short, long, default_value = "recording")]
        recording: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        pitch_tolerance: Option<u8>,
        #[arg(long)]
        time_tolerance: Option<f64>,
    },
    /// Onset precision/recall/F1 against a reference transcription
    Evaluate {
        #[arg(short, long)]
        predicted: PathBuf,
        #[arg(short, long)]
        ground_truth: PathBuf,
    },
}

#[derive(Serialize)]
struct AgreementReport {
    recording: String,
    summaries: Vec<TranscriptionSummary>,
    pairs: Vec<AgreementResult>,
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "transcription".to_string())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };

    match cli.command {
        Command::Transcribe { input, output_dir, source, bpm } => {
            if let Some(source) = source {
                config.extraction.source = source;
            }

            let (spectrogram, onset_frames, frame_rate) = AnalysisInput::from_json_file(&input)?.into_parts()?;
            let transcription = extract(&spectrogram, &onset_frames, frame_rate, &config.extraction)?;

            fs::create_dir_all(&output_dir)?;
            let stem = file_stem(&input);

            let json_path = output_dir.join(format!("{}.json", stem));
            transcription.write_json_file(&json_path)?;

            let midi_path = output_dir.join(format!("{}.mid", stem));
            fs::write(&midi_path, generate_midi_file_data(&transcription, bpm)?)?;

            log::info!(
                "wrote {} notes to {} and {}",
                transcription.len(),
                json_path.display(),
                midi_path.display()
            );
        }
        Command::Agree { transcriptions, recording, output, pitch_tolerance, time_tolerance } => {
            if let Some(pitch_tolerance) = pitch_tolerance {
                config.agreement.pitch_tolerance = pitch_tolerance;
            }
            if let Some(time_tolerance) = time_tolerance {
                config.agreement.time_tolerance_s = time_tolerance;
            }

            let transcriptions = transcriptions
                .iter()
                .map(Transcription::read_json_file)
                .collect::<Result<Vec<_>, _>>()?;

            let pairs = score_pairwise(&transcriptions, &config.agreement);
            let report = AgreementReport {
                recording,
                summaries: transcriptions.iter().map(Transcription::summary).collect(),
                pairs,
            };

            let json = serde_json::to_string_pretty(&report)?;
            match output {
                Some(path) => fs::write(path, json)?,
                None => println!("{}", json),
            }
        }
        Command::Evaluate { predicted, ground_truth } => {
            let predicted = Transcription::read_json_file(predicted)?;
            let ground_truth = Transcription::read_json_file(ground_truth)?;
            let evaluation = evaluate_onsets(&predicted, &ground_truth);
            println!("{}", serde_json::to_string_pretty(&evaluation)?);
        }
    }

    Ok(())
}
