use std::{
    path::Path,
    thread::sleep,
    time::{Duration, Instant},
};

use clap::ArgMatches;
use kanade_lib::constants::TRACK_COUNT;
use kanade_lib::{LoopSpec, Mixer, OutputMode, OutputSettings, StreamReader};
use log::{error, info};

/// Primary entry for CLI execution; probes metadata or drives playback.
pub fn run(args: &ArgMatches) -> i32 {
    info!("Starting Kanade CLI");

    if let Some(sub) = args.subcommand_matches("probe") {
        return probe(sub);
    }

    let files: Vec<&String> = match args.get_many::<String>("FILES") {
        Some(values) => values.collect(),
        None => {
            error!("no input files");
            return -1;
        }
    };

    let mut tracks = Vec::new();
    if let Some(values) = args.get_many::<String>("track") {
        for value in values {
            match value.parse::<usize>() {
                Ok(track) if track < TRACK_COUNT => tracks.push(track),
                _ => {
                    error!("track {} is out of range (0-{})", value, TRACK_COUNT - 1);
                    return -1;
                }
            }
        }
    }

    let repeat = match args.get_one::<String>("repeat") {
        Some(value) => match value.parse::<u32>() {
            Ok(count) => Some(count),
            Err(_) => {
                error!("repeat count {} is not a number", value);
                return -1;
            }
        },
        None => None,
    };

    let spec = LoopSpec {
        looping: args.get_flag("loop") || repeat.is_some(),
        start: args
            .get_one::<String>("loop-start")
            .unwrap()
            .parse::<u64>()
            .unwrap(),
        length: args
            .get_one::<String>("loop-length")
            .unwrap()
            .parse::<u64>()
            .unwrap(),
        repeat,
    };

    let volume = args
        .get_one::<String>("volume")
        .unwrap()
        .parse::<f32>()
        .unwrap();
    let master = args
        .get_one::<String>("master")
        .unwrap()
        .parse::<f32>()
        .unwrap();

    let fade_to = match args.get_one::<String>("fade-to") {
        Some(value) => match value.parse::<f32>() {
            Ok(target) => Some(target),
            Err(_) => {
                error!("fade target {} is not a number", value);
                return -1;
            }
        },
        None => None,
    };
    let fade_span = Duration::from_millis(
        args.get_one::<String>("fade-ms")
            .unwrap()
            .parse::<u64>()
            .unwrap(),
    );

    let deadline = match args.get_one::<String>("max-secs") {
        Some(value) => match value.parse::<f64>() {
            Ok(secs) if secs >= 0.0 => Some(Instant::now() + Duration::from_secs_f64(secs)),
            _ => {
                error!("deadline {} is not a number of seconds", value);
                return -1;
            }
        },
        None => None,
    };

    let mut settings = match args.get_one::<String>("settings") {
        Some(path) => OutputSettings::from_json_file(Path::new(path)),
        None => OutputSettings::default(),
    };
    if args.get_flag("per-voice") {
        settings.mode = OutputMode::PerVoice;
    }

    let mut mixer = if args.get_flag("silent") {
        Mixer::silent()
    } else {
        Mixer::new(&settings)
    };
    mixer.set_master_volume(master);

    // Volumes are set before play so each source starts at the right level.
    let mut started = 0;
    for (index, file) in files.iter().enumerate() {
        let track = match tracks.get(index) {
            Some(track) => *track,
            None => index % TRACK_COUNT,
        };

        mixer.set_volume(track, volume);
        if !mixer.play_file(track, Path::new(file), spec) {
            error!("could not open {}", file);
            continue;
        }

        info!("playing {} on track {}", file, track);
        if let Some(target) = fade_to {
            mixer.fade_volume(track, target, fade_span);
        }
        started += 1;
    }

    if started == 0 {
        error!("nothing to play");
        return -1;
    }

    loop {
        mixer.tick();

        if (0..TRACK_COUNT).all(|track| mixer.is_finished(track)) {
            break;
        }
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                info!("deadline reached, stopping");
                break;
            }
        }

        sleep(Duration::from_millis(16));
    }

    0
}

/// Open a stream, print its loop tags as JSON, and exit.
fn probe(args: &ArgMatches) -> i32 {
    let path = args.get_one::<String>("INPUT").unwrap();

    let reader = match StreamReader::open(Path::new(path)) {
        Some(reader) => reader,
        None => {
            error!("could not open {}", path);
            return -1;
        }
    };

    let tags = reader.loop_tags();
    let report = serde_json::json!({
        "path": path,
        "loop_start": tags.start,
        "loop_length": tags.length,
    });
    println!("{}", report);

    0
}
