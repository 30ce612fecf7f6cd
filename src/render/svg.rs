//! A small math-mode typesetter producing SVG.
//!
//! Understands the subset of LaTeX the formatter emits: `\frac`, `\sqrt`,
//! `\left(`/`\right)`, `^`, `_`, `\cdot` and braces. Glyph metrics are fixed
//! fractions of the font size; the output relies on the viewer's serif font.

use super::{Canvas, RenderError, Typesetter};

const GLYPH_WIDTH: f64 = 0.55;
const ASCENT: f64 = 0.75;
const DESCENT: f64 = 0.25;
const SCRIPT_SCALE: f64 = 0.7;
const FRACTION_SCALE: f64 = 0.85;
/// Height of the fraction bar above the baseline.
const AXIS: f64 = 0.3;
const MARGIN: f64 = 16.0;

#[derive(Clone, Copy, Debug, Default)]
pub struct SvgTypesetter;

impl Typesetter for SvgTypesetter {
    fn typeset(&self, latex: &str, canvas: &Canvas) -> Result<String, RenderError> {
        let row = Parser::new(latex).parse()?;

        let natural = layout_row(&row, canvas.font_size);
        let avail_width = f64::from(canvas.width) - 2.0 * MARGIN;
        let avail_height = f64::from(canvas.height) - 2.0 * MARGIN;
        let scale = (avail_width / natural.width)
            .min(avail_height / (natural.ascent + natural.descent))
            .min(1.0);
        let laid = if scale < 1.0 {
            layout_row(&row, canvas.font_size * scale)
        } else {
            natural
        };

        let x = (f64::from(canvas.width) - laid.width) / 2.0;
        let baseline =
            (f64::from(canvas.height) - (laid.ascent + laid.descent)) / 2.0 + laid.ascent;
        Ok(write_svg(&laid, x, baseline, canvas))
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Node {
    Glyph(char),
    Operator(char),
    Group(Vec<Node>),
    Frac(Vec<Node>, Vec<Node>),
    Sqrt(Vec<Node>),
    Fenced {
        open: char,
        close: char,
        inner: Vec<Node>,
    },
    Scripted {
        base: Box<Node>,
        sup: Option<Vec<Node>>,
        sub: Option<Vec<Node>>,
    },
}

#[derive(Clone, Copy)]
enum Stop {
    End,
    Brace(usize),
    Right,
}

struct Parser {
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl Parser {
    fn new(src: &str) -> Self {
        Parser {
            chars: src.char_indices().collect(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<Vec<Node>, RenderError> {
        self.row(Stop::End)
    }

    fn peek(&self) -> Option<(usize, char)> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some((_, c)) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn row(&mut self, stop: Stop) -> Result<Vec<Node>, RenderError> {
        let mut nodes = Vec::new();
        loop {
            let Some((offset, c)) = self.peek() else {
                return match stop {
                    Stop::End => Ok(nodes),
                    Stop::Brace(open) => Err(RenderError::UnbalancedBraces(open)),
                    Stop::Right => Err(RenderError::MissingArgument("\\left".to_string())),
                };
            };
            self.pos += 1;
            match c {
                '{' => nodes.push(Node::Group(self.row(Stop::Brace(offset))?)),
                '}' => {
                    return match stop {
                        Stop::Brace(_) => Ok(nodes),
                        _ => Err(RenderError::UnbalancedBraces(offset)),
                    };
                }
                '^' | '_' => {
                    let base = nodes.pop().ok_or(RenderError::Unexpected(c, offset))?;
                    let script = self.argument(c.to_string())?;
                    nodes.push(attach(base, c, script));
                }
                '\\' => {
                    let name = self.command_name();
                    match name.as_str() {
                        "frac" => {
                            let num = self.argument("\\frac".to_string())?;
                            let den = self.argument("\\frac".to_string())?;
                            nodes.push(Node::Frac(num, den));
                        }
                        "sqrt" => nodes.push(Node::Sqrt(self.argument("\\sqrt".to_string())?)),
                        "cdot" => nodes.push(Node::Operator('·')),
                        "left" => {
                            let open = self.delimiter("\\left", "([|")?;
                            let inner = self.row(Stop::Right)?;
                            let close = self.delimiter("\\right", ")]|")?;
                            nodes.push(Node::Fenced { open, close, inner });
                        }
                        "right" if matches!(stop, Stop::Right) => return Ok(nodes),
                        "right" => return Err(RenderError::Unexpected('\\', offset)),
                        _ => return Err(RenderError::UnknownCommand(name.to_string())),
                    }
                }
                '+' | '-' | '=' => nodes.push(Node::Operator(c)),
                c if c.is_whitespace() => {}
                c => nodes.push(Node::Glyph(c)),
            }
        }
    }

    fn command_name(&mut self) -> String {
        let mut name = String::new();
        while let Some((_, c)) = self.peek() {
            if !c.is_ascii_alphabetic() {
                break;
            }
            name.push(c);
            self.pos += 1;
        }
        name
    }

    /// A braced group or a single character.
    fn argument(&mut self, owner: String) -> Result<Vec<Node>, RenderError> {
        self.skip_whitespace();
        match self.peek() {
            Some((offset, '{')) => {
                self.pos += 1;
                self.row(Stop::Brace(offset))
            }
            Some((_, c)) if c.is_alphanumeric() => {
                self.pos += 1;
                Ok(vec![Node::Glyph(c)])
            }
            _ => Err(RenderError::MissingArgument(owner)),
        }
    }

    fn delimiter(&mut self, owner: &str, allowed: &str) -> Result<char, RenderError> {
        self.skip_whitespace();
        match self.peek() {
            Some((_, c)) if allowed.contains(c) => {
                self.pos += 1;
                Ok(c)
            }
            _ => Err(RenderError::MissingArgument(owner.to_string())),
        }
    }
}

fn attach(base: Node, marker: char, script: Vec<Node>) -> Node {
    let (base, mut sup, mut sub) = match base {
        Node::Scripted { base, sup, sub } => (base, sup, sub),
        other => (Box::new(other), None, None),
    };
    let occupied = if marker == '^' { sup.is_some() } else { sub.is_some() };
    if occupied {
        // x^a^b: the second script applies to the whole scripted node
        return attach_fresh(Node::Scripted { base, sup, sub }, marker, script);
    }
    if marker == '^' {
        sup = Some(script);
    } else {
        sub = Some(script);
    }
    Node::Scripted { base, sup, sub }
}

fn attach_fresh(base: Node, marker: char, script: Vec<Node>) -> Node {
    let (sup, sub) = if marker == '^' {
        (Some(script), None)
    } else {
        (None, Some(script))
    };
    Node::Scripted {
        base: Box::new(base),
        sup,
        sub,
    }
}

#[derive(Clone, Debug)]
enum Item {
    Text {
        x: f64,
        y: f64,
        size: f64,
        glyph: char,
        italic: bool,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        weight: f64,
    },
    Polyline {
        points: Vec<(f64, f64)>,
        weight: f64,
    },
}

impl Item {
    fn translate(&mut self, dx: f64, dy: f64) {
        match self {
            Item::Text { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
            Item::Line { x1, y1, x2, y2, .. } => {
                *x1 += dx;
                *x2 += dx;
                *y1 += dy;
                *y2 += dy;
            }
            Item::Polyline { points, .. } => {
                for (x, y) in points {
                    *x += dx;
                    *y += dy;
                }
            }
        }
    }
}

/// A laid-out box. Item coordinates are relative to the left end of the
/// baseline, with `y` growing downwards.
#[derive(Clone, Debug, Default)]
struct Laid {
    width: f64,
    ascent: f64,
    descent: f64,
    items: Vec<Item>,
}

impl Laid {
    fn glyph(glyph: char, size: f64, italic: bool, padding: f64) -> Self {
        Laid {
            width: GLYPH_WIDTH * size + 2.0 * padding,
            ascent: ASCENT * size,
            descent: DESCENT * size,
            items: vec![Item::Text {
                x: padding,
                y: 0.0,
                size,
                glyph,
                italic,
            }],
        }
    }

    /// Copies `other`'s items in at an offset without touching the metrics.
    fn place(&mut self, other: Laid, dx: f64, dy: f64) {
        for mut item in other.items {
            item.translate(dx, dy);
            self.items.push(item);
        }
    }

    fn append(&mut self, other: Laid) {
        self.ascent = self.ascent.max(other.ascent);
        self.descent = self.descent.max(other.descent);
        let dx = self.width;
        self.width += other.width;
        self.place(other, dx, 0.0);
    }
}

fn layout_row(nodes: &[Node], size: f64) -> Laid {
    let mut row = Laid::default();
    for node in nodes {
        row.append(layout_node(node, size));
    }
    row
}

fn layout_node(node: &Node, size: f64) -> Laid {
    match node {
        Node::Glyph(c) => Laid::glyph(*c, size, c.is_ascii_alphabetic(), 0.0),
        Node::Operator(c) => Laid::glyph(*c, size, false, 0.25 * size),
        Node::Group(row) => layout_row(row, size),
        Node::Frac(num, den) => layout_frac(num, den, size),
        Node::Sqrt(row) => layout_sqrt(row, size),
        Node::Fenced { open, close, inner } => layout_fenced(*open, *close, inner, size),
        Node::Scripted { base, sup, sub } => {
            layout_scripted(base, sup.as_deref(), sub.as_deref(), size)
        }
    }
}

fn layout_frac(num: &[Node], den: &[Node], size: f64) -> Laid {
    let inner_size = size * FRACTION_SCALE;
    let num = layout_row(num, inner_size);
    let den = layout_row(den, inner_size);
    let pad = 0.1 * size;
    let gap = 0.12 * size;
    let axis = -AXIS * size;
    let width = num.width.max(den.width) + 2.0 * pad;

    let num_baseline = axis - gap - num.descent;
    let den_baseline = axis + gap + den.ascent;
    let mut laid = Laid {
        width,
        ascent: num.ascent - num_baseline,
        descent: den_baseline + den.descent,
        items: vec![Item::Line {
            x1: pad / 2.0,
            y1: axis,
            x2: width - pad / 2.0,
            y2: axis,
            weight: 0.05 * size,
        }],
    };
    let num_x = (width - num.width) / 2.0;
    let den_x = (width - den.width) / 2.0;
    laid.place(num, num_x, num_baseline);
    laid.place(den, den_x, den_baseline);
    laid
}

fn layout_sqrt(row: &[Node], size: f64) -> Laid {
    let inner = layout_row(row, size);
    let sign = 0.6 * size;
    let weight = 0.05 * size;
    let top = -(inner.ascent + 0.12 * size);
    let bottom = inner.descent.max(DESCENT * size);
    let end = sign + inner.width + 0.05 * size;

    let mut laid = Laid {
        width: end + 0.05 * size,
        ascent: -top + weight,
        descent: bottom,
        items: vec![Item::Polyline {
            points: vec![
                (0.05 * size, -0.3 * size),
                (0.18 * size, -0.38 * size),
                (0.32 * size, bottom),
                (0.52 * size, top),
                (end, top),
            ],
            weight,
        }],
    };
    laid.place(inner, sign, 0.0);
    laid
}

fn layout_fenced(open: char, close: char, row: &[Node], size: f64) -> Laid {
    let inner = layout_row(row, size);
    let bottom = inner.descent.max(DESCENT * size);
    let height = inner.ascent.max(ASCENT * size) + bottom;
    // the delimiter glyph is scaled so that its full height spans the contents
    let glyph_baseline = bottom - DESCENT * height;
    let open = Laid::glyph(open, height, false, 0.0);
    let close = Laid::glyph(close, height, false, 0.0);
    let delimiter_width = 0.33 * height;

    let mut laid = Laid {
        width: 2.0 * delimiter_width + inner.width,
        ascent: height - bottom,
        descent: bottom,
        items: Vec::new(),
    };
    laid.place(open, 0.0, glyph_baseline);
    laid.place(inner, delimiter_width, 0.0);
    laid.place(close, laid.width - delimiter_width, glyph_baseline);
    laid
}

fn layout_scripted(base: &Node, sup: Option<&[Node]>, sub: Option<&[Node]>, size: f64) -> Laid {
    let mut laid = layout_node(base, size);
    let script_size = size * SCRIPT_SCALE;
    let x = laid.width;
    let mut script_width: f64 = 0.0;

    if let Some(sup) = sup {
        let script = layout_row(sup, script_size);
        let rise = (laid.ascent - 0.35 * size).max(0.4 * size);
        laid.ascent = laid.ascent.max(rise + script.ascent);
        laid.descent = laid.descent.max(script.descent - rise);
        script_width = script_width.max(script.width);
        laid.place(script, x, -rise);
    }
    if let Some(sub) = sub {
        let script = layout_row(sub, script_size);
        let drop = 0.2 * size;
        laid.ascent = laid.ascent.max(script.ascent - drop);
        laid.descent = laid.descent.max(drop + script.descent);
        script_width = script_width.max(script.width);
        laid.place(script, x, drop);
    }
    laid.width += script_width;
    laid
}

fn write_svg(laid: &Laid, x: f64, baseline: f64, canvas: &Canvas) -> String {
    let mut out = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
        w = canvas.width,
        h = canvas.height
    );
    out.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    out.push_str("<g font-family=\"serif\" fill=\"black\" stroke-linecap=\"round\">\n");
    for item in &laid.items {
        let mut item = item.clone();
        item.translate(x, baseline);
        out.push_str(&write_item(&item));
        out.push('\n');
    }
    out.push_str("</g>\n</svg>\n");
    out
}

fn write_item(item: &Item) -> String {
    match item {
        Item::Text {
            x,
            y,
            size,
            glyph,
            italic,
        } => {
            let style = if *italic { " font-style=\"italic\"" } else { "" };
            format!(
                "<text x=\"{x:.2}\" y=\"{y:.2}\" font-size=\"{size:.2}\"{style}>{}</text>",
                escape(*glyph)
            )
        }
        Item::Line {
            x1,
            y1,
            x2,
            y2,
            weight,
        } => format!(
            "<line x1=\"{x1:.2}\" y1=\"{y1:.2}\" x2=\"{x2:.2}\" y2=\"{y2:.2}\" stroke=\"black\" stroke-width=\"{weight:.2}\"/>"
        ),
        Item::Polyline { points, weight } => {
            let points: Vec<String> = points
                .iter()
                .map(|(x, y)| format!("{x:.2},{y:.2}"))
                .collect();
            format!(
                "<polyline points=\"{}\" fill=\"none\" stroke=\"black\" stroke-width=\"{weight:.2}\"/>",
                points.join(" ")
            )
        }
    }
}

fn escape(glyph: char) -> String {
    match glyph {
        '&' => "&amp;".to_string(),
        '<' => "&lt;".to_string(),
        '>' => "&gt;".to_string(),
        '"' => "&quot;".to_string(),
        other => other.to_string(),
    }
}
