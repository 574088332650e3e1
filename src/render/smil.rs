//! SMIL SVG generator.
//!
//! Animation state is carried by `<set>` and `<animateTransform>`
//! children timed against a master loop `<animate>` element, so the
//! output needs no CSS animation support. Style classes are still
//! interned into a `<style>` block to keep repeated runs small.

use crate::config::Config;
use crate::terminal::{Buffer, CursorEvent, ScrollEvent, TerminalState};

use super::frame::{
    self, animation_runs, needs_space_preserve, resolved_colors, text_rule, xml_escape, Classes,
    Metrics,
};
use super::SvgRenderer;

pub struct SmilRenderer<'a> {
    state: &'a TerminalState,
    config: &'a Config,
    duration: f64,
    id: String,
    classes: Classes,
}

impl<'a> SmilRenderer<'a> {
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
        }
    }

    fn render_buffer(
        &mut self,
        buffer: &Buffer,
        scroll_events: &[ScrollEvent],
        metrics: Metrics,
    ) -> (String, String, String) {
        let id = self.id.clone();
        let mut texts = String::new();
        let mut rects = String::new();

        for run in animation_runs(buffer, self.state.cols) {
            let (fg, bg) = resolved_colors(&run.style, self.config);
            let chunk_width = run.text.chars().count() as f64 * metrics.char_width;

            // Hidden outside the lifespan; the loop-begin reset rehides
            // everything on each iteration.
            let mut visibility = format!(
                "<set attributeName=\"visibility\" to=\"visible\" begin=\"{id}_loop.begin+{:.4}s\" />",
                run.start
            );
            if let Some(end) = run.end {
                visibility.push_str(&format!(
                    "<set attributeName=\"visibility\" to=\"hidden\" begin=\"{id}_loop.begin+{end:.4}s\" />"
                ));
            }
            visibility.push_str(&format!(
                "<set attributeName=\"visibility\" to=\"hidden\" begin=\"{id}_loop.begin\" />"
            ));

            if bg != self.config.default_bg {
                let bg_class = self.classes.class_for(&format!("fill:{bg};"));
                rects.push_str(&format!(
                    "<rect class=\"{}\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\">{}</rect>",
                    bg_class,
                    run.x as f64 * metrics.char_width,
                    run.y as f64 * metrics.char_height,
                    chunk_width,
                    metrics.char_height,
                    visibility
                ));
            }

            let text_class = self.classes.class_for(&text_rule(&run.style, &fg));
            let blink = if run.style.blink {
                format!(
                    "<animate attributeName=\"visibility\" from=\"visible\" to=\"hidden\" dur=\"1s\" repeatCount=\"indefinite\" begin=\"{id}_loop.begin+{:.4}s\" />",
                    run.start
                )
            } else {
                String::new()
            };
            let space_attr = if needs_space_preserve(&run.text) {
                " xml:space=\"preserve\""
            } else {
                ""
            };
            let element = format!(
                "<text class=\"{}\" x=\"{:.2}\" y=\"{:.2}\"{}>{}{}{}</text>",
                text_class,
                run.x as f64 * metrics.char_width,
                run.y as f64 * metrics.char_height + self.config.font_size,
                space_attr,
                xml_escape(&run.text),
                visibility,
                blink
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

        let mut scrolls = String::new();
        for event in scroll_events {
            let from_y = -(event.offset as f64 * metrics.char_height);
            let to_y = -((event.offset + 1) as f64 * metrics.char_height);
            scrolls.push_str(&format!(
                "        <animateTransform attributeName=\"transform\" type=\"translate\" from=\"0 {from_y:.2}\" to=\"0 {to_y:.2}\" begin=\"{id}_loop.begin+{:.4}s\" dur=\"0.001s\" fill=\"freeze\" />\n",
                event.time
            ));
        }

        (texts, rects, scrolls)
    }

    /// `<set>` streams for the cursor rect: x, y and visibility, each
    /// emitted only on change, plus loop-begin resets to the initial
    /// values.
    fn cursor_animations(&self, metrics: Metrics) -> String {
        let id = &self.id;
        let mut anims = String::new();
        let mut last_x = None;
        let mut last_y = None;
        let mut last_visibility = None;

        for event in &self.state.cursor_events {
            match event {
                CursorEvent::Visibility { time, visible } => {
                    let to = if *visible { "visible" } else { "hidden" };
                    if last_visibility != Some(to) {
                        anims.push_str(&format!(
                            "        <set attributeName=\"visibility\" to=\"{to}\" begin=\"{id}_loop.begin+{time:.4}s\" />\n"
                        ));
                        last_visibility = Some(to);
                    }
                }
                CursorEvent::Move { time, x, y } => {
                    let to_x = *x as f64 * metrics.char_width;
                    let to_y = *y as f64 * metrics.char_height;
                    if last_x != Some(to_x.to_bits()) {
                        anims.push_str(&format!(
                            "        <set attributeName=\"x\" to=\"{to_x:.2}\" begin=\"{id}_loop.begin+{time:.4}s\" />\n"
                        ));
                        last_x = Some(to_x.to_bits());
                    }
                    if last_y != Some(to_y.to_bits()) {
                        anims.push_str(&format!(
                            "        <set attributeName=\"y\" to=\"{to_y:.2}\" begin=\"{id}_loop.begin+{time:.4}s\" />\n"
                        ));
                        last_y = Some(to_y.to_bits());
                    }
                }
            }
        }

        let initial = self.state.cursor_events.iter().find_map(|event| match event {
            CursorEvent::Move { x, y, .. } => {
                Some((*x as f64 * metrics.char_width, *y as f64 * metrics.char_height))
            }
            _ => None,
        });
        let (initial_x, initial_y) = initial.unwrap_or((0.0, 0.0));
        let initial_visibility = self
            .state
            .cursor_events
            .iter()
            .find_map(|event| match event {
                CursorEvent::Visibility { visible, .. } => {
                    Some(if *visible { "visible" } else { "hidden" })
                }
                _ => None,
            })
            .unwrap_or("visible");

        anims.push_str(&format!(
            "        <set attributeName=\"x\" to=\"{initial_x:.2}\" begin=\"{id}_loop.begin\"/>\n\
             \x20       <set attributeName=\"y\" to=\"{initial_y:.2}\" begin=\"{id}_loop.begin\"/>\n\
             \x20       <set attributeName=\"visibility\" to=\"{initial_visibility}\" begin=\"{id}_loop.begin\"/>\n"
        ));
        anims
    }

    /// `display` toggles for the two screen groups.
    fn screen_animations(&self) -> (String, String) {
        let id = &self.id;
        let mut main = String::new();
        let mut alt = String::new();
        for event in &self.state.screen_switch_events {
            let (main_to, alt_to) = if event.to_alt {
                ("none", "inline")
            } else {
                ("inline", "none")
            };
            main.push_str(&format!(
                "        <set attributeName=\"display\" to=\"{main_to}\" begin=\"{id}_loop.begin+{:.4}s\" />\n",
                event.time
            ));
            alt.push_str(&format!(
                "        <set attributeName=\"display\" to=\"{alt_to}\" begin=\"{id}_loop.begin+{:.4}s\" />\n",
                event.time
            ));
        }
        main.push_str(&format!(
            "        <set attributeName=\"display\" to=\"inline\" begin=\"{id}_loop.begin\" />\n"
        ));
        alt.push_str(&format!(
            "        <set attributeName=\"display\" to=\"none\" begin=\"{id}_loop.begin\" />\n"
        ));
        (main, alt)
    }

    fn wrap(&self, width: f64, height: f64, content: &str) -> String {
        let style_block = if self.classes.is_empty() {
            String::new()
        } else {
            format!("    <style>\n{}    </style>\n", self.classes.style_rules())
        };
        format!(
            "<svg id=\"{id}\" viewBox=\"0 0 {width} {height}\" xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" font-family='{font}' font-size=\"{size}\" text-rendering=\"geometricPrecision\">\n\
             \x20   <title>Terminal Session Recording</title>\n\
             {style_block}\
             \x20   <rect width=\"100%\" height=\"100%\" fill=\"{bg}\" />\n\
             \x20   {content}\n\
             </svg>\n",
            id = self.id,
            font = self.config.font_family,
            size = self.config.font_size,
            bg = self.config.default_bg,
        )
    }
}

impl SvgRenderer for SmilRenderer<'_> {
    fn generate(&mut self) -> String {
        let state = self.state;
        let metrics = Metrics::new(self.config, state.cols, state.rows);
        let (main_text, main_rects, main_scroll) =
            self.render_buffer(&state.main.buffer, &state.main.scroll_events, metrics);
        let (alt_text, alt_rects, alt_scroll) =
            self.render_buffer(&state.alt.buffer, &state.alt.scroll_events, metrics);
        let cursor_anims = self.cursor_animations(metrics);
        let (main_anims, alt_anims) = self.screen_animations();

        let id = &self.id;
        let loop_duration = self.duration + self.config.animation_pause_seconds;
        let reset_scroll = format!(
            "        <animateTransform attributeName=\"transform\" type=\"translate\" to=\"0,0\" dur=\"0.001s\" begin=\"{id}_loop.begin\" fill=\"freeze\" />\n"
        );

        let content = format!(
            "<g id=\"{id}_master\">\n\
             \x20       <animate id=\"{id}_loop\" attributeName=\"visibility\" from=\"hidden\" to=\"visible\" begin=\"0;{id}_loop.end\" dur=\"{loop_duration}s\" />\n\
             \x20       <g id=\"{id}_main-screen\" display=\"inline\">\n\
             {main_anims}\
             \x20           <g class=\"terminal-screen\" transform=\"translate(0, 0)\" visibility=\"hidden\" text-rendering=\"geometricPrecision\">\n\
             \x20               <set attributeName=\"visibility\" to=\"visible\" begin=\"{id}_loop.begin\" />\n\
             {reset_scroll}{main_scroll}{main_rects}{main_text}\n\
             \x20           </g>\n\
             \x20       </g>\n\
             \x20       <g id=\"{id}_alt-screen\" display=\"none\">\n\
             {alt_anims}\
             \x20           <g class=\"terminal-screen\" transform=\"translate(0, 0)\" visibility=\"hidden\" text-rendering=\"geometricPrecision\">\n\
             \x20               <set attributeName=\"visibility\" to=\"visible\" begin=\"{id}_loop.begin\" />\n\
             {reset_scroll}{alt_scroll}{alt_rects}{alt_text}\n\
             \x20           </g>\n\
             \x20       </g>\n\
             \x20       <rect id=\"{id}_cursor\" width=\"{cursor_width:.2}\" height=\"{cursor_height:.2}\" fill=\"{fg}\" opacity=\"0.7\" visibility=\"visible\">\n\
             {cursor_anims}\
             \x20       </rect>\n\
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
