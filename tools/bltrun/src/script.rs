//! Blit scripts.
//!
//! One command per line; `#` starts a comment.
//!
//! ```text
//! fill X Y W H COLOR [ROP]
//! copy SX SY DX DY W H [ROP]
//! ```
//!
//! Numbers are decimal or `0x` hex. ROPs are named like X11's (`copy`,
//! `xor`, `GXinvert`, ...) and default to `copy`.

use anyhow::{Context, Result, anyhow, bail};
use s1d13806::{DisplayMode, Rect, Rop};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Fill {
        rect: Rect,
        color: u32,
        rop: Rop,
    },
    Copy {
        src: (u32, u32),
        dst: (u32, u32),
        width: u32,
        height: u32,
        rop: Rop,
    },
}

/// A command and the line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub line: usize,
    pub command: Command,
}

pub fn parse_number(s: &str) -> Result<u32> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.with_context(|| format!("`{s}` is not a number"))
}

fn parse_rop(s: Option<&str>) -> Result<Rop> {
    match s {
        None => Ok(Rop::Copy),
        Some(name) => Rop::from_name(name).ok_or_else(|| anyhow!("unknown raster operation `{name}`")),
    }
}

fn parse_line(text: &str) -> Result<Option<Command>> {
    let text = text.split('#').next().unwrap_or_default();
    let mut words = text.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let (numbers, rop) = match verb {
        "fill" => (5, args.get(5)),
        "copy" => (6, args.get(6)),
        other => bail!("unknown command `{other}`"),
    };
    if args.len() < numbers || args.len() > numbers + 1 {
        bail!("`{verb}` takes {} numbers and an optional ROP, got {} arguments", numbers, args.len());
    }

    let n = args[..numbers]
        .iter()
        .map(|s| parse_number(s))
        .collect::<Result<Vec<u32>>>()?;
    let rop = parse_rop(rop.copied())?;

    Ok(Some(match verb {
        "fill" => Command::Fill {
            rect: Rect::new(n[0], n[1], n[2], n[3]),
            color: n[4],
            rop,
        },
        _ => Command::Copy {
            src: (n[0], n[1]),
            dst: (n[2], n[3]),
            width: n[4],
            height: n[5],
            rop,
        },
    }))
}

pub fn parse(source: &str) -> Result<Vec<Step>> {
    let mut steps = Vec::new();
    for (i, text) in source.lines().enumerate() {
        let line = i + 1;
        if let Some(command) = parse_line(text).with_context(|| format!("line {line}"))? {
            steps.push(Step { line, command });
        }
    }
    Ok(steps)
}

fn fits(mode: &DisplayMode, x: u32, y: u32, width: u32, height: u32) -> bool {
    x.checked_add(width).is_some_and(|r| r <= mode.width)
        && y.checked_add(height).is_some_and(|b| b <= mode.height)
}

/// Reject commands that reach outside the visible screen.
pub fn check_bounds(steps: &[Step], mode: &DisplayMode) -> Result<()> {
    for step in steps {
        let inside = match step.command {
            Command::Fill { rect, .. } => fits(mode, rect.x, rect.y, rect.width, rect.height),
            Command::Copy { src, dst, width, height, .. } => {
                fits(mode, src.0, src.1, width, height) && fits(mode, dst.0, dst.1, width, height)
            }
        };
        if !inside {
            bail!("line {}: outside the {}x{} screen", step.line, mode.width, mode.height);
        }
    }
    Ok(())
}

/// A scene that exercises fills, ROPs and overlapping copies in both
/// directions, sized to the mode.
pub fn demo(mode: &DisplayMode) -> String {
    let (w, h) = (mode.width, mode.height);
    let (qw, qh) = (w / 4, h / 4);
    let (red, green, blue, white) = if mode.bits_per_pixel == 16 {
        (0xF800, 0x07E0, 0x001F, 0xFFFF)
    } else {
        (0xE0, 0x1C, 0x03, 0xFF)
    };

    let mut s = String::new();
    s.push_str("# background and bars\n");
    s.push_str(&format!("fill 0 0 {w} {h} 0x0000\n"));
    s.push_str(&format!("fill 0 0 {qw} {h} {red:#x}\n"));
    s.push_str(&format!("fill {qw} 0 {qw} {h} {green:#x}\n"));
    s.push_str(&format!("fill {} 0 {qw} {h} {blue:#x}\n", qw * 2));
    s.push_str("# a band across all of them\n");
    s.push_str(&format!("fill 0 {qh} {} {qh} {white:#x}\n", qw * 3));
    s.push_str("# overlapping copies, down-right then up-left with xor\n");
    s.push_str(&format!("copy 0 0 {} {} {qw} {qh}\n", qw / 2, qh / 2));
    s.push_str(&format!(
        "copy {} {} {} {} {qw} {qh} xor\n",
        qw * 2,
        qh * 2,
        qw * 2 - qw / 2,
        qh * 2 - qh / 2
    ));
    s.push_str("# noop leaves the corner alone\n");
    s.push_str(&format!("fill {} {} {qw} {qh} {white:#x} noop\n", qw * 3, qh * 3));
    s
}
