//! `plasma_viewer`: shows an animated plasma and its palette strip.
//!
//! Run with:
//!   cargo run --example plasma_viewer -- noise.octaves=4 animation.rotation_speed=30
//!
//! Every argument is a `path=value` pair as accepted by
//! `PlasmaOptions::apply_param`.
//!
//! Keys: `R` reseed, `G` toggle grayscale debug, `Up`/`Down` octave count,
//! `W` toggle domain warp, `Z` step through the third noise axis.

use bevy::prelude::*;
use bevy_symbios_plasma::{PlasmaOptions, PlasmaTexture, SymbiosPlasmaPlugin};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 400;
const STRIP_HEIGHT: f32 = 24.0;

#[derive(Resource)]
struct StartupOptions(PlasmaOptions);

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let params = args.iter().filter_map(|arg| arg.split_once('='));
    let options = match PlasmaOptions::from_params(params) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("plasma_viewer: {e}");
            std::process::exit(2);
        }
    };

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "bevy_symbios_plasma — viewer".into(),
                resolution: (WIDTH + 40, HEIGHT + STRIP_HEIGHT as u32 + 60).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(SymbiosPlasmaPlugin)
        .insert_resource(StartupOptions(options))
        .add_systems(Startup, setup)
        .add_systems(Update, handle_keys)
        .run();
}

fn setup(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    startup: Res<StartupOptions>,
) {
    commands.spawn(Camera2d);

    let plasma = match PlasmaTexture::new(startup.0.clone(), WIDTH, HEIGHT, &mut images) {
        Ok(plasma) => plasma,
        Err(e) => {
            error!("cannot create plasma: {e}");
            return;
        }
    };

    commands.spawn((
        Sprite {
            image: plasma.frame.clone(),
            custom_size: Some(Vec2::new(WIDTH as f32, HEIGHT as f32)),
            ..default()
        },
        Transform::from_translation(Vec3::new(0.0, STRIP_HEIGHT * 0.5 + 6.0, 0.0)),
    ));
    commands.spawn((
        Sprite {
            image: plasma.palette.clone(),
            custom_size: Some(Vec2::new(WIDTH as f32, STRIP_HEIGHT)),
            ..default()
        },
        Transform::from_translation(Vec3::new(0.0, -(HEIGHT as f32 * 0.5) + 6.0, 0.0)),
    ));
    commands.spawn(plasma);
}

fn handle_keys(keys: Res<ButtonInput<KeyCode>>, mut plasmas: Query<&mut PlasmaTexture>) {
    for mut plasma in &mut plasmas {
        let engine = &mut plasma.engine;
        if keys.just_pressed(KeyCode::KeyR) {
            let seed = engine.options().seed.wrapping_add(1);
            engine.reseed(seed);
            info!("seed {seed}");
        }
        if keys.just_pressed(KeyCode::KeyG) {
            let enabled = !engine.options().debug_grayscale;
            engine.set_debug_grayscale(enabled);
        }
        if keys.just_pressed(KeyCode::KeyW) {
            let mut warp = engine.options().warp.clone();
            warp.enabled = !warp.enabled;
            engine.set_warp_params(warp);
        }
        if keys.just_pressed(KeyCode::KeyZ) {
            let mut noise = engine.options().noise.clone();
            noise.slice = Some(noise.slice.unwrap_or(0.0) + 0.05);
            engine.set_fractal_noise_params(noise);
        }
        let step = keys.just_pressed(KeyCode::ArrowUp) as i32
            - keys.just_pressed(KeyCode::ArrowDown) as i32;
        if step != 0 {
            let mut noise = engine.options().noise.clone();
            noise.octaves = noise.octaves.saturating_add_signed(step as isize);
            engine.set_fractal_noise_params(noise);
            info!("octaves {}", engine.options().noise.octaves);
        }
    }
}
