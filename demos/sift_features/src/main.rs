use argh::FromArgs;
use log::LevelFilter;
use std::path::{Path, PathBuf};

use siftscan::{Frame, Origin, SiftConfig, SiftExtractor};
use siftscan_image::Image;

/// Extract SIFT frames and descriptors from an image.
#[derive(FromArgs, Debug)]
struct Args {
    /// path to the input image
    #[argh(positional)]
    image_path: PathBuf,

    /// number of octaves, derived from the image size when missing
    #[argh(option)]
    octaves: Option<usize>,

    /// number of levels per octave
    #[argh(option, default = "3")]
    levels: usize,

    /// index of the first octave
    #[argh(option, default = "0")]
    first_octave: i32,

    /// threshold on the DoG response
    #[argh(option)]
    peak_thresh: Option<f32>,

    /// threshold on the curvature ratio
    #[argh(option)]
    edge_thresh: Option<f32>,

    /// minimum norm of the descriptor gradient window
    #[argh(option)]
    norm_thresh: Option<f32>,

    /// file with one `x y sigma angle` frame per line to describe instead of detecting
    #[argh(option)]
    frames: Option<PathBuf>,

    /// estimate orientations of supplied frames
    #[argh(switch)]
    orientations: bool,

    /// only output frames
    #[argh(switch)]
    no_descriptors: bool,

    /// report coordinates with a one-based origin
    #[argh(switch)]
    one_based: bool,

    /// verbosity level: 1 logs the settings, 2 logs every octave
    #[argh(option, default = "0")]
    verbose: u8,
}

fn read_frames(path: &Path) -> Result<Vec<Frame>, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let mut frames = Vec::new();
    for (line_number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let values = line
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<Result<Vec<_>, _>>()?;
        let [x, y, sigma, angle] = values[..] else {
            return Err(format!(
                "{}:{}: expected 4 values, got {}",
                path.display(),
                line_number + 1,
                values.len()
            )
            .into());
        };
        frames.push(Frame::new(x, y, sigma, angle));
    }
    Ok(frames)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = argh::from_env();

    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        })
        .init();

    // read the image as grayscale in [0, 1]
    let gray = image::open(&args.image_path)?.to_luma8();
    let (width, height) = gray.dimensions();
    let image = Image::<u8, 1>::new([width as usize, height as usize].into(), gray.into_raw())?
        .cast_and_scale::<f32>(1.0 / 255.0)?;

    let mut config = SiftConfig::new()
        .with_levels(args.levels)
        .with_first_octave(args.first_octave)
        .with_force_orientations(args.orientations)
        .with_descriptors(!args.no_descriptors)
        .with_verbose(args.verbose);
    if let Some(octaves) = args.octaves {
        config = config.with_octaves(octaves);
    }
    if let Some(t) = args.peak_thresh {
        config = config.with_peak_threshold(t);
    }
    if let Some(t) = args.edge_thresh {
        config = config.with_edge_threshold(t);
    }
    if let Some(t) = args.norm_thresh {
        config = config.with_norm_threshold(t);
    }
    if let Some(path) = &args.frames {
        config = config.with_frames(read_frames(path)?);
    }
    if args.one_based {
        config = config.with_origin(Origin::OneBased);
    }

    let features = SiftExtractor::new(config)?.extract(&image)?;
    log::info!(
        "{}: {} features",
        args.image_path.display(),
        features.len()
    );

    for (i, frame) in features.frames.iter().enumerate() {
        let mut line = format!(
            "{:.3} {:.3} {:.3} {:.3}",
            frame.x, frame.y, frame.sigma, frame.angle
        );
        if let Some(descriptors) = &features.descriptors {
            for v in descriptors[i].iter() {
                line.push_str(&format!(" {v}"));
            }
        }
        println!("{line}");
    }

    Ok(())
}
