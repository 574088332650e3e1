//! Shared rendering machinery: geometry, style classes, color
//! resolution, text-run extraction and the static poster frame.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::terminal::{
    Buffer, CellStyle, Color, CursorEvent, ScreenSwitch, ScrollEvent, TerminalState,
};

/// Pixel geometry derived from the font settings and terminal size.
#[derive(Debug, Clone, Copy)]
pub struct Metrics {
    pub char_width: f64,
    pub char_height: f64,
    pub width: f64,
    pub height: f64,
}

impl Metrics {
    pub fn new(config: &Config, cols: usize, rows: usize) -> Self {
        let char_height = config.font_size * config.line_height_factor;
        let char_width = config.font_size * config.font_width_factor;
        Self {
            char_width,
            char_height,
            width: char_width * cols as f64,
            // Extra descender room below the last row.
            height: char_height * rows as f64 + config.font_size * 0.2,
        }
    }
}

/// Interns CSS style rules, handing out short class names suffixed with
/// the document id so several inlined SVGs can share a page.
#[derive(Debug)]
pub struct Classes {
    id: String,
    rules: BTreeMap<String, String>,
    counter: usize,
}

impl Classes {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            rules: BTreeMap::new(),
            counter: 0,
        }
    }

    pub fn class_for(&mut self, rule: &str) -> String {
        if rule.is_empty() {
            return String::new();
        }
        if let Some(name) = self.rules.get(rule) {
            return name.clone();
        }
        self.counter += 1;
        let name = format!("c{}_{}", self.counter, self.id);
        self.rules.insert(rule.to_string(), name.clone());
        name
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The collected rules as CSS declarations, rule-sorted.
    pub fn style_rules(&self) -> String {
        let mut css = String::new();
        for (rule, name) in &self.rules {
            css.push_str(&format!("      .{name} {{ {rule} }}\n"));
        }
        css
    }
}

/// A horizontal group of cells sharing one style (and, for animated
/// output, one lifespan), rendered as a single `<text>` element.
#[derive(Debug, Clone)]
pub struct Run {
    pub x: usize,
    /// Absolute row; the scroll transform maps it into the viewport.
    pub y: usize,
    pub text: String,
    pub style: CellStyle,
    pub start: f64,
    pub end: Option<f64>,
}

/// Extract every lifespan of a buffer as maximal runs of identical
/// (start, end, style) triples on a row. Each lifespan lands in exactly
/// one run.
pub fn animation_runs(buffer: &Buffer, cols: usize) -> Vec<Run> {
    let mut runs = Vec::new();
    for (y, row) in buffer.rows() {
        let mut consumed: BTreeMap<usize, Vec<bool>> = row
            .iter()
            .map(|(x, cells)| (*x, vec![false; cells.len()]))
            .collect();

        for x in 0..cols {
            let Some(cells) = row.get(&x) else {
                continue;
            };
            for (i, cell) in cells.iter().enumerate() {
                if consumed.get(&x).is_some_and(|flags| flags[i]) {
                    continue;
                }

                let mut text = String::new();
                let mut current_x = x;
                while current_x < cols {
                    let Some(candidates) = row.get(&current_x) else {
                        break;
                    };
                    let matched = candidates.iter().enumerate().find(|(j, other)| {
                        !consumed.get(&current_x).is_some_and(|flags| flags[*j])
                            && other.start == cell.start
                            && other.end == cell.end
                            && other.style == cell.style
                    });
                    let Some((j, other)) = matched else {
                        break;
                    };
                    text.push(other.char);
                    if let Some(flags) = consumed.get_mut(&current_x) {
                        flags[j] = true;
                    }
                    current_x += 1;
                }

                if !text.is_empty() {
                    runs.push(Run {
                        x,
                        y,
                        text,
                        style: cell.style.clone(),
                        start: cell.start,
                        end: cell.end,
                    });
                }
            }
        }
    }
    runs
}

/// Extract the runs visible at one instant: consecutive active cells
/// with identical styles, regardless of when they were written.
pub fn poster_runs(buffer: &Buffer, cols: usize, time: f64) -> Vec<Run> {
    let mut runs = Vec::new();
    for (y, row) in buffer.rows() {
        let mut x = 0;
        while x < cols {
            let Some(first) = row
                .get(&x)
                .and_then(|cells| cells.iter().rev().find(|c| c.active_at(time)))
            else {
                x += 1;
                continue;
            };

            let mut text = String::new();
            let mut current_x = x;
            while current_x < cols {
                let matched = row
                    .get(&current_x)
                    .and_then(|cells| cells.iter().rev().find(|c| c.active_at(time)))
                    .filter(|c| c.style == first.style);
                let Some(cell) = matched else {
                    break;
                };
                text.push(cell.char);
                current_x += 1;
            }

            runs.push(Run {
                x,
                y,
                text,
                style: first.style.clone(),
                start: first.start,
                end: first.end,
            });
            x = current_x;
        }
    }
    runs
}

/// Resolve a color selector to a hex value for one channel.
pub fn hex_for(color: &Color, config: &Config, is_bg: bool) -> String {
    let fallback = || {
        if is_bg {
            config.default_bg.clone()
        } else {
            config.default_fg.clone()
        }
    };
    match color {
        Color::Hex(hex) => hex.clone(),
        Color::Default => fallback(),
        Color::Ansi(code) => config
            .palette_hex(*code)
            .map(str::to_string)
            .unwrap_or_else(fallback),
    }
}

/// The effective (foreground, background) pair for a style, with the
/// inverse attribute already applied.
pub fn resolved_colors(style: &CellStyle, config: &Config) -> (String, String) {
    let fg = hex_for(&style.fg, config, false);
    let bg = hex_for(&style.bg, config, true);
    if style.inverse {
        (bg, fg)
    } else {
        (fg, bg)
    }
}

/// The CSS declaration list for a text run's non-color attributes.
pub fn text_rule(style: &CellStyle, fg: &str) -> String {
    let mut css = format!("fill:{fg};");
    if style.bold {
        css.push_str("font-weight:bold;");
    }
    if style.italic {
        css.push_str("font-style:italic;");
    }
    if style.underline || style.link.is_some() {
        css.push_str("text-decoration:underline;");
    }
    if style.strikethrough {
        css.push_str("text-decoration:line-through;");
    }
    if style.dim {
        css.push_str("opacity:0.5;");
    }
    if style.invisible {
        css.push_str("opacity:0;");
    }
    css
}

pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Whitespace at the edges or doubled inside a run collapses under
/// default XML handling and needs `xml:space="preserve"`.
pub fn needs_space_preserve(text: &str) -> bool {
    text.starts_with(' ') || text.ends_with(' ') || text.contains("  ")
}

/// Replay the cursor timeline up to an instant.
pub fn cursor_at(events: &[CursorEvent], time: f64) -> (usize, usize, bool) {
    let (mut x, mut y, mut visible) = (0, 0, true);
    for event in events {
        if event.time() > time {
            break;
        }
        match event {
            CursorEvent::Move { x: ex, y: ey, .. } => {
                x = *ex;
                y = *ey;
            }
            CursorEvent::Visibility { visible: v, .. } => visible = *v,
        }
    }
    (x, y, visible)
}

/// Which screen is displayed at an instant.
pub fn alt_active_at(switches: &[ScreenSwitch], time: f64) -> bool {
    let mut alt = false;
    for event in switches {
        if event.time > time {
            break;
        }
        alt = event.to_alt;
    }
    alt
}

/// How many viewport rows have scrolled past by an instant.
pub fn scroll_offset_at(events: &[ScrollEvent], time: f64) -> usize {
    events.iter().take_while(|event| event.time <= time).count()
}

/// A stable element-id prefix derived from the replayed state, used
/// when no explicit id is configured.
pub fn derive_id(state: &TerminalState, duration: f64) -> String {
    use std::hash::{Hash, Hasher};

    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    state.cols.hash(&mut hasher);
    state.rows.hash(&mut hasher);
    duration.to_bits().hash(&mut hasher);
    state.cursor_events.len().hash(&mut hasher);
    state.screen_switch_events.len().hash(&mut hasher);
    for screen in [&state.main, &state.alt] {
        screen.scroll_offset.hash(&mut hasher);
        for (y, row) in screen.buffer.rows() {
            y.hash(&mut hasher);
            for (x, cells) in row {
                x.hash(&mut hasher);
                cells.len().hash(&mut hasher);
                for cell in cells {
                    cell.char.hash(&mut hasher);
                    cell.start.to_bits().hash(&mut hasher);
                }
            }
        }
    }
    format!("svg{:08x}", hasher.finish() as u32)
}

/// Build the inner content of a poster frame: a scroll-translated group
/// of the visible runs plus the cursor rectangle.
pub fn poster_content(
    state: &TerminalState,
    config: &Config,
    metrics: &Metrics,
    classes: &mut Classes,
    id: &str,
    time: f64,
) -> String {
    let alt = alt_active_at(&state.screen_switch_events, time);
    let screen = if alt { &state.alt } else { &state.main };
    let offset = scroll_offset_at(&screen.scroll_events, time);

    let mut rects = String::new();
    let mut texts = String::new();
    for run in poster_runs(&screen.buffer, state.cols, time) {
        let (fg, bg) = resolved_colors(&run.style, config);
        let chunk_width = run.text.chars().count() as f64 * metrics.char_width;

        if bg != config.default_bg {
            let class = classes.class_for(&format!("fill:{bg};"));
            rects.push_str(&format!(
                "<rect class=\"{}\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" />",
                class,
                run.x as f64 * metrics.char_width,
                run.y as f64 * metrics.char_height,
                chunk_width,
                metrics.char_height
            ));
        }

        let trimmed = run.text.trim_end();
        if trimmed.is_empty() {
            continue;
        }
        let class = classes.class_for(&text_rule(&run.style, &fg));
        let space_attr = if needs_space_preserve(&run.text) {
            " xml:space=\"preserve\""
        } else {
            ""
        };
        let element = format!(
            "<text class=\"{}\" x=\"{:.2}\" y=\"{:.2}\"{}>{}</text>",
            class,
            run.x as f64 * metrics.char_width,
            run.y as f64 * metrics.char_height + config.font_size,
            space_attr,
            xml_escape(trimmed)
        );
        match &run.style.link {
            Some(uri) => texts.push_str(&format!(
                "<a href=\"{}\" target=\"_blank\">{}</a>",
                xml_escape(uri),
                element
            )),
            None => texts.push_str(&element),
        }
    }

    let mut content = format!(
        "<g transform=\"translate(0, -{:.2})\">{}{}</g>",
        offset as f64 * metrics.char_height,
        rects,
        texts
    );

    let (cursor_x, cursor_y, visible) = cursor_at(&state.cursor_events, time);
    if visible {
        content.push_str(&format!(
            "<rect id=\"{}_cursor\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" opacity=\"0.7\" x=\"{:.2}\" y=\"{:.2}\" />",
            id,
            config.font_size * 0.6,
            metrics.char_height,
            config.default_fg,
            cursor_x as f64 * metrics.char_width,
            cursor_y as f64 * metrics.char_height
        ));
    }
    content
}
