//! Command-line front end: analyze a selfie and optionally submit the result.
//!
//! Usage:
//!   selfie-metrics --image me.jpg --landmarks me.json                  # Show measurements
//!   selfie-metrics --image me.jpg --landmarks me.json --json           # JSON output
//!   selfie-metrics --image me.jpg --landmarks me.json -a overlay.png   # Save the overlay
//!   selfie-metrics ... --id 12345 --angle -30 --satisfaction 8.5 \
//!       --reason "good lighting" --submit                              # Append a row

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use image::RgbImage;
use selfie_metrics::{
    Analysis, CsvSink, Error, FeatureResult, JsonLinesSink, LabelFont, LandmarkDetector,
    LandmarksFile, RowSink, Session, SubmissionInput, SEGMENTS,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "selfie-metrics")]
#[command(author, version, about = "Selfie facial geometry analysis", long_about = None)]
struct Args {
    /// Input photo (jpg, jpeg or png)
    #[arg(long, value_parser = parse_photo_path)]
    image: PathBuf,

    /// Landmark detector output for the photo (JSON)
    #[arg(long)]
    landmarks: PathBuf,

    /// Participant identifier (5 digits)
    #[arg(long, default_value = "")]
    id: String,

    /// Capture angle in degrees, up positive (-90.0 to 90.0)
    #[arg(long, allow_hyphen_values = true, value_parser = parse_angle)]
    angle: Option<f64>,

    /// Satisfaction with the photo (1.0 to 10.0)
    #[arg(long, value_parser = parse_satisfaction)]
    satisfaction: Option<f64>,

    /// Why the participant likes this photo
    #[arg(long, default_value = "")]
    reason: String,

    /// Write the annotated overlay to this path
    #[arg(short, long)]
    annotated: Option<PathBuf>,

    /// TrueType font for labels (builtin font if missing)
    #[arg(long, env = "SELFIE_FONT")]
    font: Option<PathBuf>,

    /// File rows are appended to
    #[arg(long, env = "SELFIE_SINK", default_value = "submissions.jsonl")]
    sink: PathBuf,

    /// Row format of the sink file
    #[arg(long, value_enum, default_value_t = SinkFormat::Jsonl)]
    sink_format: SinkFormat,

    /// Append the row to the sink (otherwise only show results)
    #[arg(long)]
    submit: bool,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SinkFormat {
    Jsonl,
    Csv,
}

#[derive(Serialize)]
struct Output<'a> {
    image: String,
    width: u32,
    height: u32,
    features: &'a FeatureResult,
    submitted: bool,
}

fn parse_photo_path(s: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(s);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg" | "png") => Ok(path),
        _ => Err("expected a .jpg, .jpeg or .png file".to_string()),
    }
}

fn parse_in_range(s: &str, min: f64, max: f64) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("{s:?} is not a number"))?;
    if (min..=max).contains(&v) {
        Ok(v)
    } else {
        Err(format!("must be between {min:.1} and {max:.1}"))
    }
}

fn parse_angle(s: &str) -> Result<f64, String> {
    parse_in_range(s, -90.0, 90.0)
}

fn parse_satisfaction(s: &str) -> Result<f64, String> {
    parse_in_range(s, 1.0, 10.0)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", user_message(&e));
        std::process::exit(1);
    }
}

/// Turn library failures into something a participant can act on.
fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<Error>() {
        Some(Error::DetectionUnavailable(detail)) => {
            format!("the face analysis model could not be loaded ({detail})")
        }
        Some(Error::NoFaceDetected) => {
            "no face was found in the photo; please try a different photo".to_string()
        }
        Some(Error::Validation(v)) => format!("please fix the {} field: {}", v.field(), v),
        Some(Error::SinkWrite(detail)) => {
            format!("the submission was not saved ({detail}); please try again")
        }
        _ => format!("{err:#}"),
    }
}

fn open_sink(path: &Path, format: SinkFormat) -> Box<dyn RowSink> {
    match format {
        SinkFormat::Jsonl => Box::new(JsonLinesSink::new(path)),
        SinkFormat::Csv => Box::new(CsvSink::new(path)),
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let photo = image::open(&args.image)
        .with_context(|| format!("failed to open {}", args.image.display()))?
        .to_rgb8();
    let (width, height) = photo.dimensions();
    tracing::info!(image = %args.image.display(), width, height, "loaded photo");

    let font = LabelFont::load_or_builtin(args.font.as_deref());
    let mut session = Session::new(
        LandmarksFile::new(&args.landmarks),
        open_sink(&args.sink, args.sink_format),
        font,
    );

    let outcome = process(&mut session, &photo, args)?;
    let output = Output {
        image: args.image.display().to_string(),
        width,
        height,
        features: &outcome.analysis.features,
        submitted: outcome.submitted(),
    };
    print!("{}", format_report(&output, args.json)?);

    match outcome.submit_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

/// Result of one run. The analysis is kept even when the submission fails,
/// so the measurements are still shown next to the error.
#[derive(Debug)]
struct Outcome {
    analysis: Analysis,
    submit_attempted: bool,
    submit_error: Option<Error>,
}

impl Outcome {
    fn submitted(&self) -> bool {
        self.submit_attempted && self.submit_error.is_none()
    }
}

fn process<D: LandmarkDetector, S: RowSink>(
    session: &mut Session<D, S>,
    photo: &RgbImage,
    args: &Args,
) -> anyhow::Result<Outcome> {
    let analysis = session.analyze(photo, args.satisfaction)?;

    if let Some(ref path) = args.annotated {
        analysis
            .annotated
            .save(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "overlay written");
    }

    let submit_error = if args.submit {
        let input = SubmissionInput {
            id: args.id.clone(),
            angle: args.angle,
            satisfaction: args.satisfaction,
            reason: args.reason.clone(),
        };
        session.submit(&analysis, &input).err()
    } else {
        None
    };

    Ok(Outcome {
        analysis,
        submit_attempted: args.submit,
        submit_error,
    })
}

fn format_report(output: &Output, json: bool) -> serde_json::Result<String> {
    if json {
        let mut s = serde_json::to_string_pretty(output)?;
        s.push('\n');
        Ok(s)
    } else {
        Ok(format_human_readable(output))
    }
}

fn format_human_readable(output: &Output) -> String {
    let f = output.features;
    let mut s = String::new();

    s.push_str(&format!("Image: {} ({}x{})\n", output.image, output.width, output.height));
    if let Some(satisfaction) = f.satisfaction {
        s.push_str(&format!("Satisfaction: {satisfaction:.1}\n"));
    }

    s.push_str("\nOverall:\n");
    s.push_str(&format!("  Symmetry score: {:.2}px\n", f.symmetry_score));
    s.push_str(&format!("  Head roll:      {:.2}°\n", f.roll_diff));

    s.push_str("\nMeasurements (legend no. on overlay):\n");
    for segment in &SEGMENTS {
        let m = segment.measurement;
        s.push_str(&format!("  {:>2}. {:<17} {:>8.2}px\n", segment.label, m.key(), f.get(m)));
    }

    if output.submitted {
        s.push_str("\nSubmitted. Thank you!\n");
    }

    s
}
