//! Line breaking against a width budget.
//!
//! Measurement is supplied by the caller so the same routine serves
//! builtin and TrueType fonts, and can be driven by fake metrics in
//! tests.

/// Where a line may be broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Break between words. A word wider than the line is split at
    /// character boundaries.
    #[default]
    Word,
    /// Fill each line character by character and break wherever the
    /// width runs out, regardless of word boundaries.
    Char,
}

/// Wrap `text` into lines no wider than `avail_width`.
///
/// `\n` forces a break. Every paragraph yields at least one line, so an
/// empty string wraps to a single empty line. A single glyph wider than
/// the budget still gets a line of its own instead of looping.
pub fn wrap_text<F>(text: &str, avail_width: f64, mode: WrapMode, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f64,
{
    let mut lines = Vec::new();
    for para in text.split('\n') {
        let para = para.trim_end_matches('\r').trim();
        if para.is_empty() {
            lines.push(String::new());
            continue;
        }
        match mode {
            WrapMode::Word => wrap_words(para, avail_width, &measure, &mut lines),
            WrapMode::Char => wrap_chars(para, avail_width, &measure, &mut lines),
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn wrap_chars<F: Fn(&str) -> f64>(para: &str, avail_width: f64, measure: &F, out: &mut Vec<String>) {
    let mut line = String::new();
    for ch in para.chars() {
        if line.is_empty() && ch.is_whitespace() {
            // A break swallows the space it happened on.
            continue;
        }
        line.push(ch);
        if measure(&line) > avail_width && line.chars().count() > 1 {
            line.pop();
            out.push(line.trim_end().to_string());
            line.clear();
            if !ch.is_whitespace() {
                line.push(ch);
            }
        }
    }
    if !line.is_empty() {
        out.push(line.trim_end().to_string());
    }
}

fn wrap_words<F: Fn(&str) -> f64>(para: &str, avail_width: f64, measure: &F, out: &mut Vec<String>) {
    let space_w = measure(" ");
    let mut current = String::new();
    let mut line_width = 0.0_f64;

    for word in para.split_whitespace() {
        let word_w = measure(word);
        let needed = if current.is_empty() {
            word_w
        } else {
            line_width + space_w + word_w
        };

        if needed <= avail_width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            line_width = needed;
            continue;
        }

        if !current.is_empty() {
            out.push(std::mem::take(&mut current));
            line_width = 0.0;
        }
        if word_w <= avail_width {
            current.push_str(word);
            line_width = word_w;
        } else {
            // Oversized word: full pieces become lines, the tail stays
            // open so the next word can join it.
            let mut pieces = break_word(word, avail_width, measure);
            let tail = pieces.pop().unwrap_or_default();
            out.extend(pieces);
            line_width = measure(&tail);
            current = tail;
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
}

/// Split one word into pieces that each fit `avail_width`.
fn break_word<F: Fn(&str) -> f64>(word: &str, avail_width: f64, measure: &F) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for ch in word.chars() {
        piece.push(ch);
        if measure(&piece) > avail_width && piece.chars().count() > 1 {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(ch);
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}
