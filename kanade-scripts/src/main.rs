use std::env;
use std::f32::consts::TAU;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use kanade_lib::constants::SAMPLE_RATE;

fn main() {
    let mut args = env::args().skip(1);
    let Some(cmd) = args.next() else {
        print_help();
        return;
    };

    match cmd.as_str() {
        "tone" => tone_cmd(args.collect()),
        "ramp" => ramp_cmd(args.collect()),
        "-h" | "--help" => print_help(),
        _ => {
            eprintln!("Unknown command: {}", cmd);
            print_help();
        }
    }
}

fn tone_cmd(args: Vec<String>) {
    let mut out_path: Option<PathBuf> = None;
    let mut seconds = 1.0f32;
    let mut freq = 440.0f32;
    let mut stereo = false;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--out" => {
                if let Some(path) = iter.next() {
                    out_path = Some(PathBuf::from(path));
                } else {
                    eprintln!("--out requires a path");
                    return;
                }
            }
            "--seconds" => {
                if let Some(value) = iter.next() {
                    match value.parse::<f32>() {
                        Ok(val) if val > 0.0 => seconds = val,
                        _ => {
                            eprintln!("Invalid --seconds value: {}", value);
                            return;
                        }
                    }
                } else {
                    eprintln!("--seconds requires a value");
                    return;
                }
            }
            "--freq" => {
                if let Some(value) = iter.next() {
                    match value.parse::<f32>() {
                        Ok(val) if val > 0.0 => freq = val,
                        _ => {
                            eprintln!("Invalid --freq value: {}", value);
                            return;
                        }
                    }
                } else {
                    eprintln!("--freq requires a value");
                    return;
                }
            }
            "--stereo" => {
                stereo = true;
            }
            "-h" | "--help" => {
                print_tone_help();
                return;
            }
            _ => {
                eprintln!("Unknown tone arg: {}", arg);
                print_tone_help();
                return;
            }
        }
    }

    let Some(path) = out_path else {
        eprintln!("tone requires --out");
        return;
    };

    let frames = (seconds * SAMPLE_RATE as f32) as u32;
    let Some(mut writer) = create_writer(&path, stereo) else {
        return;
    };

    for n in 0..frames {
        let t = n as f32 / SAMPLE_RATE as f32;
        let sample = ((TAU * freq * t).sin() * 12_000.0) as i16;
        if write_frame(&mut writer, sample, stereo).is_err() {
            eprintln!("Failed to write {}", path.display());
            return;
        }
    }

    finish(writer, &path);
}

fn ramp_cmd(args: Vec<String>) {
    let mut out_path: Option<PathBuf> = None;
    let mut frames = SAMPLE_RATE;
    let mut stereo = false;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--out" => {
                if let Some(path) = iter.next() {
                    out_path = Some(PathBuf::from(path));
                } else {
                    eprintln!("--out requires a path");
                    return;
                }
            }
            "--frames" => {
                if let Some(value) = iter.next() {
                    match value.parse::<u32>() {
                        Ok(val) => frames = val,
                        Err(_) => {
                            eprintln!("Invalid --frames value: {}", value);
                            return;
                        }
                    }
                } else {
                    eprintln!("--frames requires a value");
                    return;
                }
            }
            "--stereo" => {
                stereo = true;
            }
            "-h" | "--help" => {
                print_ramp_help();
                return;
            }
            _ => {
                eprintln!("Unknown ramp arg: {}", arg);
                print_ramp_help();
                return;
            }
        }
    }

    let Some(path) = out_path else {
        eprintln!("ramp requires --out");
        return;
    };

    let Some(mut writer) = create_writer(&path, stereo) else {
        return;
    };

    for n in 0..frames {
        if write_frame(&mut writer, n as i16, stereo).is_err() {
            eprintln!("Failed to write {}", path.display());
            return;
        }
    }

    finish(writer, &path);
}

type WavWriter = hound::WavWriter<BufWriter<File>>;

fn create_writer(path: &PathBuf, stereo: bool) -> Option<WavWriter> {
    let spec = hound::WavSpec {
        channels: if stereo { 2 } else { 1 },
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    match hound::WavWriter::create(path, spec) {
        Ok(writer) => Some(writer),
        Err(err) => {
            eprintln!("Failed to create {}: {}", path.display(), err);
            None
        }
    }
}

fn write_frame(writer: &mut WavWriter, sample: i16, stereo: bool) -> Result<(), hound::Error> {
    writer.write_sample(sample)?;
    if stereo {
        writer.write_sample(sample)?;
    }
    Ok(())
}

fn finish(writer: WavWriter, path: &PathBuf) {
    match writer.finalize() {
        Ok(()) => println!("Wrote {}", path.display()),
        Err(err) => eprintln!("Failed to finalize {}: {}", path.display(), err),
    }
}

fn print_help() {
    println!(
        "kanade-scripts\n\nCommands:\n  tone    Write a sine test WAV\n  ramp    Write a ramp test WAV\n\nRun 'kanade-scripts <command> --help' for options."
    );
}

fn print_tone_help() {
    println!(
        "Usage: kanade-scripts tone --out <path> [options]\n\nOptions:\n  --out <path>       Output WAV path\n  --seconds <secs>   Length in seconds (default 1.0)\n  --freq <hz>        Tone frequency (default 440)\n  --stereo           Write two channels instead of one\n  -h, --help         Show this help"
    );
}

fn print_ramp_help() {
    println!(
        "Usage: kanade-scripts ramp --out <path> [options]\n\nOptions:\n  --out <path>       Output WAV path\n  --frames <count>   Frame count (default one second)\n  --stereo           Write two channels instead of one\n  -h, --help         Show this help"
    );
}
