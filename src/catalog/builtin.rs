//! Built-in dragon library, painted entirely in code.
//!
//! Every layer is drawn tile by tile from a shared pose table, so body, eyes,
//! horns, wings and weapon line up on every frame without any files on disk.
//! The library doubles as the default for the CLI and as a test fixture.

use image::{Rgba, RgbaImage};

use super::{AssetIndex, CatalogError, LayerAsset, Overlay, TraitCategory, TraitValue};
use crate::shapes::{ellipse, line, polygon, rect, thick_line, TilePainter};
use crate::spritesheet::SheetGeometry;

/// Tile edge in pixels
pub const TILE: u32 = 64;
/// Frames per animation row
pub const FRAMES: u32 = 8;
/// Animation rows, top to bottom
pub const ROW_NAMES: [&str; 10] = [
    "idle",
    "walk_south",
    "walk_east",
    "walk_north",
    "walk_west",
    "attack",
    "hurt",
    "death",
    "feed",
    "train",
];

const ROW_IDLE: u32 = 0;
const ROW_WALK_SOUTH: u32 = 1;
const ROW_WALK_EAST: u32 = 2;
const ROW_WALK_NORTH: u32 = 3;
const ROW_WALK_WEST: u32 = 4;
const ROW_ATTACK: u32 = 5;
const ROW_HURT: u32 = 6;
const ROW_DEATH: u32 = 7;
const ROW_FEED: u32 = 8;
const ROW_TRAIN: u32 = 9;

/// Weapons are only held in these rows.
const COMBAT_ROWS: [u32; 2] = [ROW_ATTACK, ROW_TRAIN];

const BOB: [i32; 8] = [0, -1, -2, -1, 0, 1, 2, 1];
const FLAP: [i32; 8] = [0, -3, -6, -3, 0, 3, 6, 3];
const LUNGE: [i32; 8] = [0, 1, 2, 4, 4, 2, 1, 0];
/// Swing frames before this one hold the weapon raised behind the body
const WIND_UP_FRAMES: u32 = 3;
/// Weapon part drawn over the wings but under the body
const WEAPON_BEHIND_Z: i32 = -5;
/// Weapon tip direction per frame of a swing
const SWING: [(i32, i32); 8] =
    [(0, -16), (6, -15), (11, -11), (15, -6), (16, 0), (15, 6), (11, 11), (6, 15)];

/// Geometry of every dragon sheet: 8 frames x 10 rows of 64px tiles.
pub fn dragon_geometry() -> SheetGeometry {
    SheetGeometry::new(TILE, TILE, FRAMES, ROW_NAMES.len() as u32).with_row_names(ROW_NAMES)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Facing {
    South,
    East,
    North,
    West,
}

#[derive(Debug, Clone, Copy)]
struct Pose {
    dx: i32,
    dy: i32,
    facing: Facing,
    /// Leg lift, alternating while walking
    step: i32,
    flap: i32,
    lying: bool,
    eyes_closed: bool,
}

fn pose(row: u32, frame: u32) -> Pose {
    let f = (frame % FRAMES) as usize;
    let still = Pose {
        dx: 0,
        dy: BOB[f] / 2,
        facing: Facing::South,
        step: 0,
        flap: FLAP[f] / 2,
        lying: false,
        eyes_closed: false,
    };
    let walking = |facing| Pose {
        dy: BOB[f].abs() / 2,
        facing,
        step: if f % 4 < 2 { 2 } else { -2 },
        flap: FLAP[f],
        ..still
    };

    match row {
        ROW_IDLE => still,
        ROW_WALK_SOUTH => walking(Facing::South),
        ROW_WALK_EAST => walking(Facing::East),
        ROW_WALK_NORTH => walking(Facing::North),
        ROW_WALK_WEST => walking(Facing::West),
        ROW_ATTACK => Pose { dx: LUNGE[f], facing: Facing::East, flap: FLAP[f], ..still },
        ROW_HURT => Pose { dx: -(f as i32 % 2) * 2, eyes_closed: f % 2 == 1, ..still },
        ROW_DEATH => Pose {
            dy: (f as i32).min(5) * 2,
            lying: f >= 4,
            eyes_closed: f >= 2,
            flap: 0,
            ..still
        },
        ROW_FEED => Pose { dy: if (3..=4).contains(&f) { 2 } else { 0 }, ..still },
        ROW_TRAIN => Pose { dy: BOB[f], facing: Facing::East, ..still },
        _ => still,
    }
}

fn body_center(pose: &Pose) -> (i32, i32) {
    (32 + pose.dx, 38 + pose.dy)
}

fn head_center(pose: &Pose) -> (i32, i32) {
    let (cx, cy) = body_center(pose);
    if pose.lying {
        return (cx + 14, cy - 4);
    }
    match pose.facing {
        Facing::East | Facing::West => (cx + 10, cy - 15),
        Facing::South | Facing::North => (cx, cy - 16),
    }
}

fn hand_anchor(pose: &Pose) -> (i32, i32) {
    let (cx, cy) = body_center(pose);
    (cx + 12, cy + 2)
}

/// Painter for one tile, mirrored when the pose faces west.
fn tile_painter<'a>(image: &'a mut RgbaImage, origin: (u32, u32), pose: &Pose) -> TilePainter<'a> {
    TilePainter::new(image, origin, (TILE, TILE)).mirrored(pose.facing == Facing::West)
}

/// Paint the listed sheet rows, one tile per (row, frame), into a new image.
fn paint_rows<F>(rows: &[u32], paint: F) -> RgbaImage
where
    F: Fn(&mut RgbaImage, (u32, u32), &Pose),
{
    let mut image = RgbaImage::new(FRAMES * TILE, rows.len() as u32 * TILE);
    for (i, &row) in rows.iter().enumerate() {
        for frame in 0..FRAMES {
            paint(&mut image, (frame * TILE, i as u32 * TILE), &pose(row, frame));
        }
    }
    image
}

fn all_rows() -> Vec<u32> {
    (0..ROW_NAMES.len() as u32).collect()
}

const fn rgba(r: u8, g: u8, b: u8) -> Rgba<u8> {
    Rgba([r, g, b, 255])
}

struct Hide {
    outline: Rgba<u8>,
    base: Rgba<u8>,
    light: Rgba<u8>,
    belly: Rgba<u8>,
}

const DRAGON_TYPES: [(&str, u32, Hide); 4] = [
    (
        "fire",
        3,
        Hide { outline: rgba(80, 20, 10), base: rgba(200, 60, 30), light: rgba(250, 140, 60), belly: rgba(250, 200, 80) },
    ),
    (
        "ice",
        3,
        Hide { outline: rgba(20, 50, 90), base: rgba(70, 140, 210), light: rgba(170, 220, 250), belly: rgba(230, 245, 255) },
    ),
    (
        "storm",
        2,
        Hide { outline: rgba(30, 25, 60), base: rgba(90, 80, 150), light: rgba(160, 150, 220), belly: rgba(200, 200, 120) },
    ),
    (
        "cyber",
        1,
        Hide { outline: rgba(10, 15, 20), base: rgba(60, 70, 80), light: rgba(0, 230, 200), belly: rgba(120, 130, 140) },
    ),
];

fn paint_body(image: &mut RgbaImage, origin: (u32, u32), pose: &Pose, hide: &Hide) {
    let mut p = tile_painter(image, origin, pose);
    let (cx, cy) = body_center(pose);
    let squash = if pose.lying { 5 } else { 0 };
    let side = matches!(pose.facing, Facing::East | Facing::West);

    let tail = if side {
        vec![(cx - 12, cy - 2), (cx - 26, cy - 8), (cx - 12, cy + 5)]
    } else {
        vec![(cx + 10, cy + 3), (cx + 22, cy + 10), (cx + 10, cy + 8)]
    };
    p.plot(polygon(&tail), hide.outline);

    p.plot(ellipse(cx, cy, 15, 13 - squash), hide.outline);
    p.plot(ellipse(cx, cy, 14, 12 - squash), hide.base);
    p.plot(ellipse(cx - 4, cy - 5 + squash / 2, 5, 3), hide.light);
    if pose.facing != Facing::North {
        let bx = if side { 3 } else { 0 };
        p.plot(ellipse(cx + bx, cy + 3, 8, 6 - squash / 2), hide.belly);
    }

    if !pose.lying {
        for (lx, lift) in [(cx - 10, pose.step), (cx + 4, -pose.step)] {
            p.plot(rect(lx, cy + 9 - lift, 6, 7), hide.outline);
            p.plot(rect(lx + 1, cy + 9 - lift, 4, 6), hide.base);
        }
    }

    let (hx, hy) = head_center(pose);
    p.plot(ellipse(hx, hy, 10, 9), hide.outline);
    p.plot(ellipse(hx, hy, 9, 8), hide.base);
    if side || pose.lying {
        p.plot(ellipse(hx + 8, hy + 2, 5, 4), hide.outline);
        p.plot(ellipse(hx + 8, hy + 2, 4, 3), hide.light);
    }
}

const EYES: [(&str, u32, Rgba<u8>); 3] = [
    ("ember", 2, rgba(255, 120, 0)),
    ("frost", 2, rgba(120, 220, 255)),
    ("void", 1, rgba(140, 0, 200)),
];

fn paint_eyes(image: &mut RgbaImage, origin: (u32, u32), pose: &Pose, iris: Rgba<u8>) {
    if pose.facing == Facing::North {
        return;
    }
    let mut p = tile_painter(image, origin, pose);
    let (hx, hy) = head_center(pose);
    let spots = match pose.facing {
        Facing::South | Facing::North if !pose.lying => vec![(hx - 5, hy - 2), (hx + 3, hy - 2)],
        _ => vec![(hx + 2, hy - 3)],
    };
    for (x, y) in spots {
        if pose.eyes_closed {
            p.plot(line((x, y + 1), (x + 2, y + 1)), rgba(40, 40, 40));
        } else {
            p.plot(rect(x, y, 3, 3), iris);
            p.plot([(x, y)], rgba(255, 255, 255));
        }
    }
}

const WINGS: [(&str, u32); 4] = [("bat", 3), ("feathered", 2), ("membrane", 2), ("none", 1)];

fn wing_shape(style: &str, cx: i32, cy: i32, flap: i32) -> Vec<(Vec<(i32, i32)>, Rgba<u8>)> {
    match style {
        "bat" => vec![(
            polygon(&[(cx - 4, cy - 8), (cx - 24, cy - 22 + flap), (cx - 20, cy - 6 + flap / 2), (cx - 10, cy)]),
            rgba(60, 40, 70),
        )],
        "membrane" => vec![
            (
                polygon(&[(cx - 4, cy - 8), (cx - 26, cy - 18 + flap), (cx - 12, cy + 2)]),
                Rgba([170, 90, 60, 210]),
            ),
            (thick_line((cx - 4, cy - 8), (cx - 26, cy - 18 + flap), 2), rgba(90, 45, 30)),
        ],
        "feathered" => (0..3)
            .map(|i| (ellipse(cx - 10 - 5 * i, cy - 10 - 3 * i + flap, 4, 7), rgba(235, 230, 220)))
            .collect(),
        _ => Vec::new(),
    }
}

fn paint_wings(image: &mut RgbaImage, origin: (u32, u32), pose: &Pose, style: &str) {
    if pose.lying {
        return;
    }
    let (cx, cy) = body_center(pose);
    let shapes = wing_shape(style, cx, cy, pose.flap);
    {
        let mut p = tile_painter(image, origin, pose);
        for (pixels, color) in &shapes {
            p.plot(pixels.iter().copied(), *color);
        }
    }
    // Facing the viewer or away: draw the other wing too
    if matches!(pose.facing, Facing::South | Facing::North) {
        let mut p = TilePainter::new(image, origin, (TILE, TILE)).mirrored(true);
        for (pixels, color) in shapes {
            p.plot(pixels, color);
        }
    }
}

const HORNS: [(&str, u32); 4] = [("none", 3), ("short", 3), ("curved", 2), ("crown", 1)];

fn paint_horns(image: &mut RgbaImage, origin: (u32, u32), pose: &Pose, style: &str) {
    let mut p = tile_painter(image, origin, pose);
    let (hx, hy) = head_center(pose);
    let bone = rgba(230, 220, 190);
    let sides: &[i32] = if matches!(pose.facing, Facing::East | Facing::West) || pose.lying {
        &[-2]
    } else {
        &[-5, 5]
    };
    match style {
        "short" => {
            for &s in sides {
                p.plot(polygon(&[(hx + s - 2, hy - 6), (hx + s + 2, hy - 6), (hx + s - 1, hy - 14)]), bone);
            }
        }
        "curved" => {
            for &s in sides {
                let out = if s < 0 { -1 } else { 1 };
                p.plot(thick_line((hx + s, hy - 7), (hx + s + 4 * out, hy - 13), 2), bone);
                p.plot(thick_line((hx + s + 4 * out, hy - 13), (hx + s + 2 * out, hy - 18), 2), bone);
            }
        }
        "crown" => {
            let gold = rgba(240, 190, 40);
            p.plot(rect(hx - 6, hy - 11, 13, 3), gold);
            for sx in [-6, 0, 6] {
                p.plot(polygon(&[(hx + sx - 1, hy - 11), (hx + sx + 1, hy - 11), (hx + sx, hy - 15)]), gold);
            }
            p.plot([(hx, hy - 10)], rgba(200, 20, 40));
        }
        _ => {}
    }
}

const WEAPONS: [(&str, u32); 4] = [("none", 2), ("sword", 3), ("spear", 2), ("mace", 2)];

fn paint_weapon(image: &mut RgbaImage, origin: (u32, u32), pose: &Pose, frame: u32, style: &str) {
    let mut p = tile_painter(image, origin, pose);
    let (ax, ay) = hand_anchor(pose);
    let (tx, ty) = SWING[(frame % FRAMES) as usize];
    let steel = rgba(200, 210, 220);
    let wood = rgba(140, 100, 60);
    match style {
        "sword" => {
            p.plot(thick_line((ax, ay), (ax + tx, ay + ty), 2), steel);
            p.plot(rect(ax - 2, ay - 1, 5, 3), wood);
        }
        "spear" => {
            let tip = (ax + tx * 3 / 2, ay + ty * 3 / 2);
            p.plot(line((ax - tx / 2, ay - ty / 2), tip), wood);
            p.plot(ellipse(tip.0, tip.1, 2, 2), steel);
        }
        "mace" => {
            let head = (ax + tx * 4 / 5, ay + ty * 4 / 5);
            p.plot(line((ax, ay), head), wood);
            p.plot(ellipse(head.0, head.1, 4, 4), rgba(90, 90, 100));
            for (sx, sy) in [(-5, 0), (5, 0), (0, -5), (0, 5)] {
                p.plot([(head.0 + sx, head.1 + sy)], steel);
            }
        }
        _ => {}
    }
}

fn drumstick() -> RgbaImage {
    let mut image = RgbaImage::new(TILE, TILE);
    let mut p = TilePainter::new(&mut image, (0, 0), (TILE, TILE));
    p.plot(thick_line((38, 26), (43, 21), 2), rgba(230, 210, 180));
    p.plot(ellipse(44, 20, 2, 2), rgba(230, 210, 180));
    p.plot(ellipse(34, 30, 6, 5), rgba(139, 69, 19));
    p.plot(ellipse(32, 28, 3, 2), rgba(160, 82, 45));
    image
}

fn barbell() -> RgbaImage {
    let mut image = RgbaImage::new(TILE, TILE);
    let mut p = TilePainter::new(&mut image, (0, 0), (TILE, TILE));
    p.plot(rect(12, 20, 40, 2), rgba(170, 170, 180));
    for x in [10, 50] {
        p.plot(rect(x, 14, 4, 14), rgba(50, 50, 60));
    }
    image
}

/// Build the complete built-in dragon index.
///
/// Categories resolve in the order `dragonType`, `wings`, `eyes`, `horns`,
/// `weapon`. Wings sit behind the body (z -10); the body is at z 0. Each
/// weapon has a `behind` part at z -5 holding the wind-up frames of the
/// swing, and its main layer at z 30 holds the rest.
pub fn dragon_index() -> Result<AssetIndex, CatalogError> {
    let geometry = dragon_geometry();
    let rows = all_rows();

    let mut body = TraitCategory::new("dragonType", 0);
    let mut wings = TraitCategory::new("wings", -10);
    let mut eyes = TraitCategory::new("eyes", 10);
    let mut horns = TraitCategory::new("horns", 20);
    let mut weapon = TraitCategory::new("weapon", 30);
    for (name, weight, _) in &DRAGON_TYPES {
        body.values.push(TraitValue::new(*name, *weight));
    }
    for (name, weight) in WINGS {
        wings.values.push(TraitValue::new(name, weight));
    }
    for (name, weight, _) in &EYES {
        eyes.values.push(TraitValue::new(*name, *weight));
    }
    for (name, weight) in HORNS {
        horns.values.push(TraitValue::new(name, weight));
    }
    for (name, weight) in WEAPONS {
        weapon.values.push(TraitValue::new(name, weight));
    }

    let mut builder = AssetIndex::builder("dragons", geometry.clone());

    for (name, _, hide) in &DRAGON_TYPES {
        let sheet = paint_rows(&rows, |img, origin, pose| paint_body(img, origin, pose, hide));
        builder = builder.asset(
            LayerAsset::new(&body, name, &geometry)
                .with_image(sheet, format!("builtin:dragonType/{}", name)),
        );
    }
    for (name, _) in WINGS {
        let mut asset = LayerAsset::new(&wings, name, &geometry);
        if name != "none" {
            let sheet = paint_rows(&rows, |img, origin, pose| paint_wings(img, origin, pose, name));
            asset = asset.with_image(sheet, format!("builtin:wings/{}", name));
        }
        builder = builder.asset(asset);
    }
    for (name, _, iris) in &EYES {
        let sheet = paint_rows(&rows, |img, origin, pose| paint_eyes(img, origin, pose, *iris));
        builder = builder.asset(
            LayerAsset::new(&eyes, name, &geometry)
                .with_image(sheet, format!("builtin:eyes/{}", name)),
        );
    }
    for (name, _) in HORNS {
        let mut asset = LayerAsset::new(&horns, name, &geometry);
        if name != "none" {
            let sheet = paint_rows(&rows, |img, origin, pose| paint_horns(img, origin, pose, name));
            asset = asset.with_image(sheet, format!("builtin:horns/{}", name));
        }
        builder = builder.asset(asset);
    }
    for (name, _) in WEAPONS {
        let mut asset = LayerAsset::new(&weapon, name, &geometry).with_rows(COMBAT_ROWS.to_vec());
        if name != "none" {
            let swing = |behind: bool| {
                paint_rows(&COMBAT_ROWS, |img, origin, pose| {
                    let frame = origin.0 / TILE;
                    if (frame < WIND_UP_FRAMES) == behind {
                        paint_weapon(img, origin, pose, frame, name)
                    }
                })
            };
            builder = builder.asset(
                LayerAsset::new(&weapon, name, &geometry)
                    .with_rows(COMBAT_ROWS.to_vec())
                    .with_part("behind")
                    .with_z(WEAPON_BEHIND_Z)
                    .with_image(swing(true), format!("builtin:weapon/{}_behind", name)),
            );
            asset = asset.with_image(swing(false), format!("builtin:weapon/{}", name));
        }
        builder = builder.asset(asset);
    }

    builder = builder
        .category(body)
        .category(wings)
        .category(eyes)
        .category(horns)
        .category(weapon)
        .overlay(Overlay {
            name: "drumstick".to_string(),
            source: "builtin:overlay/drumstick".to_string(),
            image: drumstick(),
            row: ROW_FEED,
            frames: (1, 6),
            lift: vec![(3, -4), (4, -4)],
            offset: (0, 0),
        })
        .overlay(Overlay {
            name: "barbell".to_string(),
            source: "builtin:overlay/barbell".to_string(),
            image: barbell(),
            row: ROW_TRAIN,
            frames: (1, 6),
            lift: vec![(3, -6), (4, -6)],
            offset: (0, 0),
        });

    builder.build()
}
