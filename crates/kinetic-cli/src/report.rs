//! Plain-text rendering of replay results.

use kinetic_core::intro::IntroPhase;
use kinetic_core::replay::{ElementSnapshot, ReplayReport};
use kinetic_core::types::{Paint, Tone, VisualProps};
use std::fmt::Write as _;

pub fn render_phases(phases: &[IntroPhase]) -> String {
    phases
        .iter()
        .map(|p| format!("{p:?}"))
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Style fields that differ from the identity pose.
fn style_fields(style: &VisualProps) -> Vec<String> {
    let identity = VisualProps::IDENTITY;
    let mut fields = Vec::new();
    let mut push = |name: &str, value: f32, base: f32| {
        if (value - base).abs() > 1e-4 {
            fields.push(format!("{name}={value:.3}"));
        }
    };
    push("x", style.translate_x, identity.translate_x);
    push("y", style.translate_y, identity.translate_y);
    push("scale", style.scale, identity.scale);
    push("scale_x", style.scale_x, identity.scale_x);
    push("opacity", style.opacity, identity.opacity);
    push("blur", style.blur, identity.blur);
    push("rotate_x", style.rotate_x, identity.rotate_x);
    if style.tone != Tone::Normal {
        fields.push(format!("tone={:?}", style.tone));
    }
    fields
}

fn element_line(name: &str, element: &ElementSnapshot) -> String {
    let mut fields = style_fields(&element.style);
    if fields.is_empty() {
        fields.push("identity".to_string());
    }
    let mut line = format!("  • {name}: {}", fields.join(" "));
    match &element.paint {
        Some(Paint::Gradient { stops }) => {
            let _ = write!(line, " [gradient {} stops]", stops.len());
        }
        Some(Paint::Blob { points, .. }) => {
            let _ = write!(line, " [blob {} points]", points.len());
        }
        None => {}
    }
    if let Some(text) = &element.text {
        let _ = write!(line, " text={text:?}");
    }
    let _ = write!(line, " ({} writes)", element.writes);
    line
}

pub fn render_text(report: &ReplayReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Replay Summary:");
    let _ = writeln!(out, "===============");
    let _ = writeln!(
        out,
        "  frames: {} ({} idle), cycles: {}, writes: {}",
        report.frames, report.idle_frames, report.cycles, report.writes
    );
    let _ = writeln!(
        out,
        "  scroll_y: {:.1}, mounted components: {}",
        report.scroll_y, report.mounted
    );
    if !report.intro.is_empty() {
        let _ = writeln!(out, "  intro: {}", render_phases(&report.intro));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Elements:");
    let _ = writeln!(out, "=========");
    for (name, element) in &report.elements {
        let _ = writeln!(out, "{}", element_line(name, element));
    }
    out
}
