//! Word cloud generation from the records' word lists.
//!
//! Produces a static SVG once at startup; the page embeds it as an image.

use dashboard_core::config::{AssetsConfig, WordCloudConfig};
use dashboard_core::error::Result;
use dashboard_core::Dataset;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::PathBuf;

pub const WORDCLOUD_FILE: &str = "wordcloud.svg";

/// Approximate glyph advance as a fraction of the font size.
const GLYPH_WIDTH: f64 = 0.6;
const PADDING: f64 = 8.0;
const PALETTE: [&str; 5] = ["#08306b", "#08519c", "#2171b5", "#4292c6", "#6baed6"];

/// Case-folded word counts, most frequent first, ties alphabetical.
pub fn word_frequencies<'a, I>(words: I, max_words: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in words {
        let word = word.trim().to_lowercase();
        if word.is_empty() {
            continue;
        }
        *counts.entry(word).or_insert(0) += 1;
    }

    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted.truncate(max_words);
    sorted
}

/// Lay the words out in wrapped rows, largest first, and render an SVG document.
pub fn render_svg(frequencies: &[(String, usize)], config: &WordCloudConfig) -> String {
    let width = config.width as f64;
    let height = config.height as f64;

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = config.width,
        h = config.height
    );
    let _ = writeln!(
        svg,
        r#"<rect width="100%" height="100%" fill="{}"/>"#,
        escape(&config.background)
    );

    let max_count = frequencies.iter().map(|(_, c)| *c).max().unwrap_or(0);
    let min_count = frequencies.iter().map(|(_, c)| *c).min().unwrap_or(0);

    let mut x = PADDING;
    let mut row_top = PADDING;
    let mut row_height: f64 = 0.0;

    for (i, (word, count)) in frequencies.iter().enumerate() {
        let size = font_size(*count, min_count, max_count, config);
        let word_width = word.chars().count() as f64 * size * GLYPH_WIDTH;

        if x + word_width > width - PADDING && x > PADDING {
            x = PADDING;
            row_top += row_height + PADDING;
            row_height = 0.0;
        }
        if row_top + size > height - PADDING {
            break;
        }

        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="{:.1}" fill="{}">{}</text>"#,
            x,
            row_top + size,
            size,
            PALETTE[i % PALETTE.len()],
            escape(word)
        );

        x += word_width + PADDING;
        row_height = row_height.max(size);
    }

    svg.push_str("</svg>\n");
    svg
}

/// Build the word cloud for the whole dataset and write it into the assets dir.
pub fn write_wordcloud(dataset: &Dataset, assets: &AssetsConfig) -> Result<PathBuf> {
    let frequencies = word_frequencies(dataset.all_words(), assets.wordcloud.max_words);
    let svg = render_svg(&frequencies, &assets.wordcloud);

    std::fs::create_dir_all(&assets.dir)?;
    let path = assets.dir.join(WORDCLOUD_FILE);
    std::fs::write(&path, svg)?;

    tracing::info!(
        path = %path.display(),
        words = frequencies.len(),
        "Generated word cloud"
    );
    Ok(path)
}

fn font_size(count: usize, min: usize, max: usize, config: &WordCloudConfig) -> f64 {
    if max == min {
        return config.max_font_size;
    }
    let t = (count - min) as f64 / (max - min) as f64;
    config.min_font_size + t * (config.max_font_size - config.min_font_size)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
