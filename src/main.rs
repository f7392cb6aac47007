extern crate sdl2;

use std::fs;
use std::process::ExitCode;

use sdl2::event::Event;
use sdl2::keyboard::{Keycode, Scancode};
use sdl2::pixels::Color;
use sdl2::rect::Rect;

use clap::{Parser, ValueEnum};

pub mod buzzer;
pub mod error;
pub mod instruction;
pub mod interp;
pub mod machine;
pub mod quirks;
pub mod scheduler;

use buzzer::Buzzer;
use interp::Interpreter;
use machine::{Machine, DEFAULT_DISPLAY_HEIGHT, DEFAULT_DISPLAY_WIDTH, KEY_COUNT};
use quirks::QuirkProfile;
use scheduler::FrameScheduler;

// QWERTY rows 1234/qwer/asdf/zxcv mapped onto hex keys 123C/456D/789E/A0BF,
// indexed by hex key value.
const SCANCODE_MAPPING: [Scancode; KEY_COUNT] = [
    Scancode::X,
    Scancode::Num1, Scancode::Num2, Scancode::Num3,
    Scancode::Q, Scancode::W, Scancode::E,
    Scancode::A, Scancode::S, Scancode::D,
    Scancode::Z, Scancode::C,
    Scancode::Num4, Scancode::R, Scancode::F, Scancode::V,
];

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Profile {
    /// COSMAC VIP behavior: shifts read V[Y], FX55/FX65 advance I, logical
    /// ops reset VF
    Classic,
    /// S-CHIP behavior: shifts operate on V[X] in place, I untouched
    Schip,
}

impl Profile {
    fn quirks(self) -> QuirkProfile {
        match self {
            Profile::Classic => QuirkProfile::classic(),
            Profile::Schip => QuirkProfile::super_chip(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg()]
    file: String,

    #[arg(short, long, default_value_t = 700, help = "Clock rate in instructions per second")]
    freq: u32,

    #[arg(long, default_value_t = 800, help = "Window width")]
    width: u32,

    #[arg(long, default_value_t = 400, help = "Window height")]
    height: u32,

    #[arg(long, default_value_t = DEFAULT_DISPLAY_WIDTH, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..), help = "Display columns")]
    cols: usize,

    #[arg(long, default_value_t = DEFAULT_DISPLAY_HEIGHT, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..), help = "Display rows")]
    rows: usize,

    #[arg(short, long, value_enum, default_value_t = Profile::Classic, help = "Quirk profile")]
    quirks: Profile,
}

fn fresh_machine(rom: &[u8], args: &Args) -> Result<Machine, error::Error> {
    let mut machine = Machine::new(args.cols, args.rows);
    machine.load_rom(rom)?;
    Ok(machine)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    if args.width != args.height * 2 {
        println!("Running in an aspect ratio other than 2:1, display may look stretched!");
    }

    // Load rom and create VM; load errors are fatal before anything starts
    let rom = match fs::read(&args.file) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("Could not open file {}: {}", args.file, err);
            return ExitCode::FAILURE;
        }
    };

    let mut machine = match fresh_machine(&rom, &args) {
        Ok(machine) => machine,
        Err(err) => {
            eprintln!("Could not load {}: {}", args.file, err);
            return ExitCode::FAILURE;
        }
    };
    log::info!("loaded {} ({} bytes)", args.file, rom.len());

    let interp = Interpreter::new(args.quirks.quirks(), || rand::random::<u8>());
    let mut scheduler = FrameScheduler::new(args.freq);
    log::info!(
        "clock {} Hz, {} instructions per frame",
        args.freq,
        scheduler.steps_per_frame()
    );

    // Init SDL2, get a window and a buzzer
    let sdl_context = sdl2::init().unwrap();
    let video_subsystem = sdl_context.video().unwrap();

    let window = video_subsystem
        .window("Crisp8", args.width, args.height)
        .position_centered()
        .build()
        .unwrap();

    let mut canvas = window.into_canvas().accelerated().build().unwrap();
    canvas.set_draw_color(Color::RGB(0, 0, 0));
    canvas.clear();
    canvas.present();

    let mut event_pump = sdl_context.event_pump().unwrap();

    let buzzer = Buzzer::from_sdl_context(&sdl_context).unwrap();

    // Main loop
    let mut running = true;
    while running {
        canvas.set_draw_color(Color::RGB(0, 0, 0));
        canvas.clear();
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => running = false,
                Event::KeyDown {
                    keycode: Some(Keycode::F5),
                    ..
                } => {
                    // same ROM, fresh machine
                    match fresh_machine(&rom, &args) {
                        Ok(fresh) => {
                            machine = fresh;
                            log::info!("machine reset");
                        }
                        Err(err) => eprintln!("Reset failed: {}", err),
                    }
                }
                _ => {}
            }
        }

        // Snapshot key state into the keypad before the instruction batch
        let keyboard_state = event_pump.keyboard_state();
        for (key, scancode) in SCANCODE_MAPPING.iter().enumerate() {
            machine.set_key(key, keyboard_state.is_scancode_pressed(*scancode));
        }

        // Space held down uncaps the clock rate
        if !keyboard_state.is_scancode_pressed(Scancode::Space) {
            std::thread::sleep(scheduler.time_to_next_frame());
        }
        scheduler.begin_frame();

        match scheduler.run_frame(&interp, &mut machine) {
            Ok(report) => buzzer.set_gate(report.tone),
            Err(fault) => {
                log::error!("machine fault: {}", fault);
                eprintln!("Machine halted: {}", fault);
                running = false;
            }
        }

        // Render the settled framebuffer
        let cell_width: u32 = args.width / machine.width() as u32;
        let cell_height: u32 = args.height / machine.height() as u32;
        for x in 0..machine.width() {
            for y in 0..machine.height() {
                if machine.pixel(x, y) {
                    canvas.set_draw_color(Color::GREEN);
                } else {
                    canvas.set_draw_color(Color::BLACK);
                }
                let cell = Rect::new(
                    x as i32 * cell_width as i32,
                    y as i32 * cell_height as i32,
                    cell_width,
                    cell_height,
                );
                let _ = canvas.fill_rect(cell);
            }
        }

        canvas.present();
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_display_dimensions() {
        assert!(Args::try_parse_from(["crisp8", "rom.ch8", "--cols", "0"]).is_err());
        assert!(Args::try_parse_from(["crisp8", "rom.ch8", "--rows", "0"]).is_err());
        assert!(Args::try_parse_from(["crisp8", "rom.ch8", "--cols", "64", "--rows", "32"]).is_ok());
    }
}
