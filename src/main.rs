//! CLI binary for DJI Video Sync
//!
//! `video` pairs sampled frames with embedded telemetry; `survey` maps a
//! folder of DJI stills to GeoJSON points.

use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgMatches, Command};
use dji_video_sync::{
    export_survey_geojson, process_video, survey_to_points, ExportOptions, Projection, SyncOptions,
};
use glob::glob;
use std::path::{Path, PathBuf};

const VIDEO_EXTENSIONS: [&str; 2] = ["mp4", "mov"];

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("VERGEN_GIT_SHA"),
        " ",
        env!("VERGEN_GIT_COMMIT_DATE"),
        ")"
    )
}

fn debug_arg() -> Arg {
    Arg::new("debug")
        .long("debug")
        .help("Enable debug output and detailed parsing information")
        .action(clap::ArgAction::SetTrue)
}

fn build_command() -> Command {
    Command::new("DJI Video Sync")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version())
        .about("Sample frames from DJI videos and pair them with the embedded flight telemetry.")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("video")
                .about("Extract 1 Hz frames and a synchronized telemetry table from DJI videos")
                .arg(
                    Arg::new("files")
                        .help("DJI video files (.MP4, .MOV, case-insensitive, supports globbing)")
                        .required(true)
                        .num_args(1..)
                        .index(1),
                )
                .arg(debug_arg())
                .arg(
                    Arg::new("output-dir")
                        .long("output-dir")
                        .help("Directory for frames and tables (default: folder named after each video, next to it)")
                        .value_name("DIR"),
                )
                .arg(
                    Arg::new("interval")
                        .long("interval")
                        .help("Seconds between sampled frames")
                        .value_name("SECONDS")
                        .value_parser(clap::value_parser!(f64))
                        .default_value("1.0"),
                )
                .arg(
                    Arg::new("report")
                        .long("report")
                        .help("Use an existing `exiftool -ee` report instead of running exiftool (single video only)")
                        .value_name("FILE"),
                )
                .arg(
                    Arg::new("image-ext")
                        .long("image-ext")
                        .help("Image format of sampled frames, chosen by extension")
                        .value_name("EXT")
                        .default_value("jpg"),
                )
                .arg(
                    Arg::new("no-frames")
                        .long("no-frames")
                        .help("Skip frame extraction and only write the telemetry table")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("allow-misaligned")
                        .long("allow-misaligned")
                        .help("Warn instead of failing when frame and telemetry counts differ")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Also export synchronized records as JSON (requires the 'json' feature)")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("geojson")
                        .long("geojson")
                        .help("Also export the flight track as GeoJSON points")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("exiftool")
                        .long("exiftool")
                        .value_name("PATH")
                        .default_value("exiftool"),
                )
                .arg(
                    Arg::new("ffmpeg")
                        .long("ffmpeg")
                        .value_name("PATH")
                        .default_value("ffmpeg"),
                )
                .arg(
                    Arg::new("ffprobe")
                        .long("ffprobe")
                        .value_name("PATH")
                        .default_value("ffprobe"),
                ),
        )
        .subcommand(
            Command::new("survey")
                .about("Map a folder of DJI still images to GeoJSON points")
                .arg(
                    Arg::new("dir")
                        .help("Folder containing DJI JPEG images")
                        .required(true)
                        .index(1),
                )
                .arg(debug_arg())
                .arg(
                    Arg::new("epsg")
                        .long("epsg")
                        .help("Output coordinate system: EPSG:4326 or a WGS84 UTM zone such as EPSG:32615")
                        .value_name("CODE")
                        .default_value("EPSG:4326"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .help("GeoJSON output path (default: <dir>.geojson)")
                        .value_name("FILE"),
                ),
        )
}

fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

/// Expand file arguments and glob patterns to video paths
fn expand_video_paths(patterns: &[&String], debug: bool) -> Vec<PathBuf> {
    let mut valid_paths = Vec::new();

    for pattern in patterns {
        let paths: Vec<PathBuf> = if pattern.contains('*') || pattern.contains('?') {
            match glob(pattern) {
                Ok(glob_iter) => match glob_iter.collect::<Result<Vec<_>, _>>() {
                    Ok(paths) => {
                        if debug {
                            println!("Glob pattern '{pattern}' matched {} files", paths.len());
                        }
                        paths
                    }
                    Err(e) => {
                        eprintln!("Error expanding glob pattern '{pattern}': {e}");
                        continue;
                    }
                },
                Err(e) => {
                    eprintln!("Invalid glob pattern '{pattern}': {e}");
                    continue;
                }
            }
        } else {
            vec![PathBuf::from(pattern.as_str())]
        };

        for path in paths {
            if !path.exists() {
                eprintln!("Warning: File does not exist: {path:?}");
                continue;
            }

            let valid_extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);

            if !valid_extension {
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("none");
                eprintln!("Warning: Skipping file with unsupported extension '{ext}': {path:?}");
                continue;
            }

            valid_paths.push(path);
        }
    }

    valid_paths
}

fn run_video(matches: &ArgMatches) -> Result<()> {
    let debug = matches.get_flag("debug");
    let file_patterns: Vec<&String> = matches
        .get_many::<String>("files")
        .map(|files| files.collect())
        .unwrap_or_default();

    let valid_paths = expand_video_paths(&file_patterns, debug);
    if valid_paths.is_empty() {
        eprintln!("Error: No valid video files found to process.");
        eprintln!("Supported extensions: .MP4, .MOV (case-insensitive)");
        eprintln!("Input patterns were: {file_patterns:?}");
        std::process::exit(1);
    }

    let report_path = matches.get_one::<String>("report").map(PathBuf::from);
    if report_path.is_some() && valid_paths.len() > 1 {
        return Err(anyhow!("--report can only be used with a single video"));
    }

    let output_dir = matches.get_one::<String>("output-dir").cloned();
    let base_options = SyncOptions {
        interval_seconds: *matches.get_one::<f64>("interval").unwrap_or(&1.0),
        image_extension: matches
            .get_one::<String>("image-ext")
            .cloned()
            .unwrap_or_else(|| "jpg".to_string()),
        report_path,
        extract_frames: !matches.get_flag("no-frames"),
        strict_alignment: !matches.get_flag("allow-misaligned"),
        export: ExportOptions {
            csv: true,
            json: matches.get_flag("json"),
            geojson: matches.get_flag("geojson"),
            output_dir: None,
        },
        exiftool_path: matches
            .get_one::<String>("exiftool")
            .cloned()
            .unwrap_or_else(|| "exiftool".to_string()),
        ffmpeg_path: matches
            .get_one::<String>("ffmpeg")
            .cloned()
            .unwrap_or_else(|| "ffmpeg".to_string()),
        ffprobe_path: matches
            .get_one::<String>("ffprobe")
            .cloned()
            .unwrap_or_else(|| "ffprobe".to_string()),
    };

    let mut processed_files = 0;
    let total = valid_paths.len();

    for (index, path) in valid_paths.iter().enumerate() {
        if index > 0 {
            println!();
        }

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        println!("Processing: {filename}");

        let mut options = base_options.clone();
        options.export.output_dir = match output_dir {
            // Several videos share one --output-dir: give each its own folder
            Some(ref dir) if total > 1 => {
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("video");
                Some(Path::new(dir).join(stem).to_string_lossy().into_owned())
            }
            ref other => other.clone(),
        };

        match process_video(path, &options) {
            Ok(report) => {
                if let Some(ref frames) = report.frames {
                    println!(
                        "Extracted {} frames (every {} of {}) to: {}",
                        frames.len(),
                        frames.stride,
                        frames.decoded_frames,
                        report.output_dir.display()
                    );
                }
                println!(
                    "Synchronized {} of {} telemetry samples",
                    report.records.len(),
                    report.parsed_samples
                );
                for exported in [
                    &report.exports.csv_path,
                    &report.exports.json_path,
                    &report.exports.geojson_path,
                ]
                .into_iter()
                .flatten()
                {
                    println!("Exported to: {}", exported.display());
                }
                processed_files += 1;
            }
            Err(e) => {
                eprintln!("Error processing {filename}: {e:#}");
                if total > 1 {
                    eprintln!("Continuing with next file...");
                }
            }
        }
    }

    if processed_files == 0 {
        eprintln!(
            "Error: No files were successfully processed out of {} files found.",
            total
        );
        eprintln!("Use --debug flag for more detailed error information.");
        std::process::exit(1);
    }

    Ok(())
}

/// `<parent>/<dir name>.geojson`, resolved so `.` and `..` name a real folder
fn default_survey_output(dir: &Path) -> Result<PathBuf> {
    let resolved = dir
        .canonicalize()
        .with_context(|| format!("Survey directory not found: {:?}", dir))?;
    let output = match (resolved.parent(), resolved.file_name()) {
        (Some(parent), Some(name)) => {
            let mut file_name = name.to_os_string();
            file_name.push(".geojson");
            parent.join(file_name)
        }
        // Filesystem root
        _ => resolved.join("survey.geojson"),
    };
    Ok(output)
}

fn run_survey(matches: &ArgMatches) -> Result<()> {
    let dir = matches
        .get_one::<String>("dir")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("survey directory is required"))?;
    let epsg = matches
        .get_one::<String>("epsg")
        .map(String::as_str)
        .unwrap_or("EPSG:4326");
    let projection = Projection::from_epsg(epsg)?;

    let output = match matches.get_one::<String>("output") {
        Some(path) => PathBuf::from(path),
        None => default_survey_output(&dir)?,
    };

    let points = survey_to_points(&dir, projection)?;
    export_survey_geojson(&points, projection, &output)?;
    println!(
        "Exported {} survey points to: {}",
        points.len(),
        output.display()
    );
    Ok(())
}

fn main() -> Result<()> {
    let matches = build_command().get_matches();

    match matches.subcommand() {
        Some(("video", sub)) => {
            init_logging(sub.get_flag("debug"));
            run_video(sub)
        }
        Some(("survey", sub)) => {
            init_logging(sub.get_flag("debug"));
            run_survey(sub)
        }
        _ => {
            build_command().print_help()?;
            println!();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        build_command().debug_assert();
    }

    #[test]
    fn test_video_defaults() {
        let matches = build_command()
            .try_get_matches_from(["dji_video_sync", "video", "DJI_0001.MP4"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(*sub.get_one::<f64>("interval").unwrap(), 1.0);
        assert_eq!(sub.get_one::<String>("image-ext").unwrap(), "jpg");
        assert!(!sub.get_flag("allow-misaligned"));
    }

    #[test]
    fn test_file_extension_validation() {
        let dir = tempfile::TempDir::new().unwrap();
        let good = dir.path().join("DJI_0001.MP4");
        let bad = dir.path().join("DJI_0001.SRT");
        std::fs::write(&good, b"").unwrap();
        std::fs::write(&bad, b"").unwrap();

        let good_str = good.to_string_lossy().into_owned();
        let bad_str = bad.to_string_lossy().into_owned();
        let paths = expand_video_paths(&[&good_str, &bad_str], false);
        assert_eq!(paths, vec![good]);
    }

    #[test]
    fn test_default_survey_output_for_current_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let survey = dir.path().join("flight_2024");
        std::fs::create_dir_all(&survey).unwrap();

        let expected = dir.path().canonicalize().unwrap().join("flight_2024.geojson");
        assert_eq!(default_survey_output(&survey).unwrap(), expected);
        assert_eq!(default_survey_output(&survey.join(".")).unwrap(), expected);
        assert!(default_survey_output(&dir.path().join("missing")).is_err());
    }
}
