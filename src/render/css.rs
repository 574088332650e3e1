//! CSS-keyframe SVG generator.
//!
//! Every lifespan run gets a visibility animation class keyed by its
//! (start, end) pair so cells sharing timing share a class; the cursor,
//! screen switches and stream scrolls each become one `@keyframes`
//! block stepped over the loop duration.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::terminal::{CursorEvent, ScrollEvent, TerminalState};

use super::frame::{
    self, animation_runs, needs_space_preserve, resolved_colors, text_rule, xml_escape, Classes,
    Metrics,
};
use super::SvgRenderer;

pub struct CssRenderer<'a> {
    state: &'a TerminalState,
    config: &'a Config,
    duration: f64,
    id: String,
    classes: Classes,
    animations: String,
    anim_classes: BTreeMap<String, String>,
    visibility_counter: usize,
    blink_counter: usize,
}

impl<'a> CssRenderer<'a> {
    pub fn new(state: &'a TerminalState, config: &'a Config, duration: f64) -> Self {
        let id = config
            .id
            .clone()
            .unwrap_or_else(|| frame::derive_id(state, duration));
        Self {
            state,
            config,
            duration,
            classes: Classes::new(&id),
            id,
            animations: String::new(),
            anim_classes: BTreeMap::new(),
            visibility_counter: 0,
            blink_counter: 0,
        }
    }

    /// Recording length plus the trailing hold before the loop restarts.
    fn loop_duration(&self) -> f64 {
        self.duration + self.config.animation_pause_seconds
    }

    fn render_buffer(&mut self, buffer: &crate::terminal::Buffer, metrics: Metrics) -> (String, String) {
        let mut texts = String::new();
        let mut rects = String::new();

        for run in animation_runs(buffer, self.state.cols) {
            let (fg, bg) = resolved_colors(&run.style, self.config);
            let anim_class = self.visibility_anim_class(run.start, run.end);
            let chunk_width = run.text.chars().count() as f64 * metrics.char_width;

            if bg != self.config.default_bg {
                let bg_class = self.classes.class_for(&format!("fill:{bg};"));
                rects.push_str(&format!(
                    "<rect class=\"{} {}\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\"></rect>",
                    bg_class,
                    anim_class,
                    run.x as f64 * metrics.char_width,
                    run.y as f64 * metrics.char_height,
                    chunk_width,
                    metrics.char_height
                ));
            }

            let text_class = self.classes.class_for(&text_rule(&run.style, &fg));
            let blink_class = if run.style.blink {
                self.blink_anim_class(run.start)
            } else {
                String::new()
            };
            let space_attr = if needs_space_preserve(&run.text) {
                " xml:space=\"preserve\""
            } else {
                ""
            };
            let element = format!(
                "<text class=\"{} {} {}\" x=\"{:.2}\" y=\"{:.2}\"{}>{}</text>",
                text_class,
                anim_class,
                blink_class,
                run.x as f64 * metrics.char_width,
                run.y as f64 * metrics.char_height + self.config.font_size,
                space_attr,
                xml_escape(&run.text)
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
        (texts, rects)
    }

    /// Percentage keyframes over the loop for a timed value sequence,
    /// skipping frames that repeat the previous value.
    fn keyframes(
        &self,
        frames: impl IntoIterator<Item = (f64, Option<String>)>,
        initial: Option<&str>,
    ) -> String {
        let total = self.loop_duration();
        if total == 0.0 {
            return String::new();
        }
        let mut out = Vec::new();
        let mut last = initial.map(str::to_string);
        if let Some(init) = initial {
            out.push(format!("0% {{ {init} }}"));
        }
        for (time, css) in frames {
            let Some(css) = css else {
                continue;
            };
            if last.as_deref() == Some(css.as_str()) {
                continue;
            }
            out.push(format!("{:.4}% {{ {} }}", time / total * 100.0, css));
            last = Some(css);
        }
        out.join(" ")
    }

    fn scroll_keyframes(&self, events: &[ScrollEvent], char_height: f64) -> String {
        self.keyframes(
            events.iter().map(|event| {
                (
                    event.time,
                    Some(format!(
                        "transform: translateY(-{:.2}px);",
                        (event.offset + 1) as f64 * char_height
                    )),
                )
            }),
            None,
        )
    }

    fn generate_css_animations(&mut self, metrics: Metrics) {
        let total = self.loop_duration();
        if total == 0.0 {
            return;
        }
        let id = self.id.clone();

        let cursor_pos = self.keyframes(
            self.state.cursor_events.iter().map(|event| match event {
                CursorEvent::Move { time, x, y } => (
                    *time,
                    Some(format!(
                        "transform: translate({:.2}px, {:.2}px);",
                        *x as f64 * metrics.char_width,
                        *y as f64 * metrics.char_height
                    )),
                ),
                CursorEvent::Visibility { time, .. } => (*time, None),
            }),
            None,
        );
        let cursor_vis = self.keyframes(
            self.state.cursor_events.iter().map(|event| match event {
                CursorEvent::Visibility { time, visible } => (
                    *time,
                    Some(format!(
                        "visibility: {};",
                        if *visible { "visible" } else { "hidden" }
                    )),
                ),
                CursorEvent::Move { time, .. } => (*time, None),
            }),
            None,
        );

        let screen_frames = |to_alt_shows: bool| {
            self.keyframes(
                self.state.screen_switch_events.iter().map(|event| {
                    let shown = event.to_alt == to_alt_shows;
                    (
                        event.time,
                        Some(format!(
                            "opacity: {}; pointer-events: {};",
                            if shown { "1" } else { "0" },
                            if shown { "auto" } else { "none" }
                        )),
                    )
                }),
                Some(if to_alt_shows {
                    "opacity: 0; pointer-events: none;"
                } else {
                    "opacity: 1; pointer-events: auto;"
                }),
            )
        };
        let main_screen = screen_frames(false);
        let alt_screen = screen_frames(true);

        let main_scroll = self.scroll_keyframes(&self.state.main.scroll_events, metrics.char_height);
        let alt_scroll = self.scroll_keyframes(&self.state.alt.scroll_events, metrics.char_height);

        let props = format!("{total}s steps(1, end) infinite");
        self.animations.push_str(&format!(
            "      #{id}_cursor {{ animation: {props} {id}-cursor-pos, {props} {id}-cursor-vis; }}\n\
             \x20     #{id}_main-screen {{ animation: {props} {id}-main-screen; opacity: 1; pointer-events: auto; }}\n\
             \x20     #{id}_alt-screen {{ animation: {props} {id}-alt-screen; opacity: 0; pointer-events: none; }}\n\
             \x20     #{id}_main-scroll {{ animation: {props} {id}-main-scroll; }}\n\
             \x20     #{id}_alt-scroll {{ animation: {props} {id}-alt-scroll; }}\n\
             \x20     @keyframes {id}-cursor-pos {{ {cursor_pos} }}\n\
             \x20     @keyframes {id}-cursor-vis {{ {cursor_vis} }}\n\
             \x20     @keyframes {id}-main-screen {{ {main_screen} }}\n\
             \x20     @keyframes {id}-alt-screen {{ {alt_screen} }}\n\
             \x20     @keyframes {id}-main-scroll {{ {main_scroll} }}\n\
             \x20     @keyframes {id}-alt-scroll {{ {alt_scroll} }}\n"
        ));
    }

    /// Class toggling a run visible over its lifespan. Runs sharing a
    /// (start, end) pair share the class and its keyframes.
    fn visibility_anim_class(&mut self, start: f64, end: Option<f64>) -> String {
        let total = self.loop_duration();
        if total == 0.0 {
            return String::new();
        }
        let key = format!("vis_{:.4}_{:.4}", start, end.unwrap_or(-1.0));
        if let Some(name) = self.anim_classes.get(&key) {
            return name.clone();
        }
        self.visibility_counter += 1;
        let name = format!("v{}_{}", self.visibility_counter, self.id);
        self.anim_classes.insert(key, name.clone());

        let frames = self.keyframes(
            [
                (0.0, Some("visibility: hidden;".to_string())),
                (start, Some("visibility: visible;".to_string())),
                (
                    end.unwrap_or(total),
                    Some(format!(
                        "visibility: {};",
                        if end.is_none() { "visible" } else { "hidden" }
                    )),
                ),
            ],
            None,
        );
        let id = &self.id;
        self.animations.push_str(&format!(
            "      .{name} {{\n\
             \x20       animation: {total}s steps(1, end) infinite {id}-{name}-anim;\n\
             \x20       visibility: hidden;\n\
             \x20     }}\n\
             \x20     @keyframes {id}-{name}-anim {{ {frames} }}\n"
        ));
        name
    }

    /// Slow-blink class phase-aligned to the run's start.
    fn blink_anim_class(&mut self, start: f64) -> String {
        let total = self.loop_duration();
        if total == 0.0 {
            return String::new();
        }
        let key = format!("blink_{start}");
        if let Some(name) = self.anim_classes.get(&key) {
            return name.clone();
        }
        self.blink_counter += 1;
        let name = format!("b{}_{}", self.blink_counter, self.id);
        self.anim_classes.insert(key, name.clone());

        let id = &self.id;
        self.animations.push_str(&format!(
            "      .{name} {{\n\
             \x20       animation-name: {id}-blink-anim;\n\
             \x20       animation-duration: 1s;\n\
             \x20       animation-iteration-count: infinite;\n\
             \x20       animation-timing-function: steps(1, end);\n\
             \x20       animation-delay: {start}s;\n\
             \x20     }}\n\
             \x20     @keyframes {id}-blink-anim {{ 50% {{ visibility: hidden; }} }}\n"
        ));
        name
    }

    fn wrap(&self, width: f64, height: f64, content: &str) -> String {
        format!(
            "<svg id=\"{id}\" viewBox=\"0 0 {width} {height}\" xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" font-family='{font}' font-size=\"{size}\" text-rendering=\"geometricPrecision\">\n\
             \x20   <title>Terminal Session Recording</title>\n\
             \x20   <style>\n{rules}{animations}    </style>\n\
             \x20   <rect width=\"100%\" height=\"100%\" fill=\"{bg}\" />\n\
             \x20   {content}\n\
             </svg>\n",
            id = self.id,
            font = self.config.font_family,
            size = self.config.font_size,
            rules = self.classes.style_rules(),
            animations = self.animations,
            bg = self.config.default_bg,
        )
    }
}

impl SvgRenderer for CssRenderer<'_> {
    fn generate(&mut self) -> String {
        let state = self.state;
        let metrics = Metrics::new(self.config, state.cols, state.rows);
        let (main_text, main_rects) = self.render_buffer(&state.main.buffer, metrics);
        let (alt_text, alt_rects) = self.render_buffer(&state.alt.buffer, metrics);
        self.generate_css_animations(metrics);

        let id = &self.id;
        let content = format!(
            "<g id=\"{id}_master\">\n\
             \x20       <g id=\"{id}_main-screen\">\n\
             \x20           <g class=\"terminal-screen\" id=\"{id}_main-scroll\" text-rendering=\"geometricPrecision\">\n\
             \x20               {main_rects}{main_text}\n\
             \x20           </g>\n\
             \x20       </g>\n\
             \x20       <g id=\"{id}_alt-screen\">\n\
             \x20           <g class=\"terminal-screen\" id=\"{id}_alt-scroll\" text-rendering=\"geometricPrecision\">\n\
             \x20               {alt_rects}{alt_text}\n\
             \x20           </g>\n\
             \x20       </g>\n\
             \x20       <rect id=\"{id}_cursor\" width=\"{cursor_width:.2}\" height=\"{cursor_height:.2}\" fill=\"{fg}\" opacity=\"0.7\"></rect>\n\
             \x20   </g>",
            cursor_width = self.config.font_size * 0.6,
            cursor_height = metrics.char_height,
            fg = self.config.default_fg,
        );
        self.wrap(metrics.width, metrics.height, &content)
    }

    fn generate_poster(&mut self, time: f64) -> String {
        let metrics = Metrics::new(self.config, self.state.cols, self.state.rows);
        let content = frame::poster_content(
            self.state,
            self.config,
            &metrics,
            &mut self.classes,
            &self.id,
            time,
        );
        self.wrap(metrics.width, metrics.height, &content)
    }
}
