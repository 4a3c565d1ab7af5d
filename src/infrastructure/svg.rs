use crate::domain::ports::SummaryRenderer;
use crate::domain::summary::Summary;
use crate::error::{Result, WorldstatError};
use rust_decimal::Decimal;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

const WIDTH: u32 = 700;
const HEIGHT: u32 = 500;

/// Renders the summary card as an SVG image.
///
/// The file is written next to its target and renamed into place, so the
/// artifact on disk is always a complete image.
#[derive(Debug, Default, Clone, Copy)]
pub struct SvgSummaryRenderer;

impl SummaryRenderer for SvgSummaryRenderer {
    fn render(&self, summary: &Summary, target: &Path) -> Result<()> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(render_svg(summary).as_bytes())?;
        file.flush()?;
        file.persist(target)
            .map_err(|e| WorldstatError::IoError(e.error))?;
        Ok(())
    }

    fn file_name(&self) -> &'static str {
        "summary.svg"
    }
}

pub fn render_svg(summary: &Summary) -> String {
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">"#
    );
    svg.push('\n');
    svg.push_str(r##"  <rect width="100%" height="100%" fill="#1e1e1e"/>"##);
    svg.push('\n');
    svg.push_str(
        r##"  <text x="30" y="60" fill="#ffffff" font-family="sans-serif" font-size="32" font-weight="bold">Country Summary</text>"##,
    );
    svg.push('\n');
    svg.push_str(&text(
        30,
        120,
        "#ffffff",
        20,
        &format!("Total Countries: {}", summary.total_countries),
    ));
    svg.push_str(&text(
        30,
        170,
        "#ffffff",
        20,
        &format!("Top {} Countries by Estimated GDP:", summary.top_by_gdp.len()),
    ));

    for (index, country) in summary.top_by_gdp.iter().enumerate() {
        let line = format!(
            "{}. {} - {}",
            index + 1,
            escape(&country.name),
            format_amount(country.estimated_gdp)
        );
        svg.push_str(&text(50, 200 + 30 * index as u32, "#ffffff", 18, &line));
    }

    let refreshed = summary
        .last_refreshed_at
        .map(|at| at.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
        .unwrap_or_else(|| "never".to_string());
    svg.push_str(&text(
        30,
        HEIGHT - 40,
        "#aaaaaa",
        16,
        &format!("Last Refreshed: {refreshed}"),
    ));
    svg.push_str("</svg>\n");
    svg
}

/// One `<text>` line. `content` must already be escaped.
fn text(x: u32, y: u32, fill: &str, font_size: u32, content: &str) -> String {
    format!(
        r#"  <text x="{x}" y="{y}" fill="{fill}" font-family="sans-serif" font-size="{font_size}">{content}</text>"#
    ) + "\n"
}

/// Two decimal places with comma-grouped thousands, e.g. `1,234,567.89`.
fn format_amount(amount: Decimal) -> String {
    let rounded = format!("{:.2}", amount.round_dp(2));
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}.{fraction}")
}

fn escape(text: &str) -> String {
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
