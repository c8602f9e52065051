//! HTMLページの組み立て
//!
//! 埋め込みテンプレートの `{{name}}` を置き換える。値はエスケープ済みのHTMLとして扱う。

use super::embedded_assets::WebAssets;
use crate::domain::qr::{BORDER_SIZE_RANGE, BOX_SIZE_RANGE};
use tracing::error;

/// 生成フォームの表示内容
#[derive(Debug, Default)]
pub struct HomeView<'a> {
    pub box_size: &'a str,
    pub border_size: &'a str,
    pub qr_data: &'a str,
    pub image_uri: Option<&'a str>,
    pub error: Option<String>,
}

/// 画像読み取りページの表示内容
#[derive(Debug, Default)]
pub struct ReadImageView<'a> {
    pub decoded_text: Option<&'a str>,
    pub preview_uri: Option<&'a str>,
    pub error: Option<String>,
}

pub fn home(view: &HomeView<'_>) -> String {
    let box_size = non_empty_or(view.box_size, "10");
    let border_size = non_empty_or(view.border_size, "4");
    let result = view
        .image_uri
        .map(|uri| {
            format!(
                "        <section class=\"result\">\n            <img src=\"{}\" alt=\"Generated QR code\">\n            <p><a class=\"button\" href=\"/download\">Download</a></p>\n        </section>",
                escape_html(uri)
            )
        })
        .unwrap_or_default();

    let content = render(
        "home.html",
        &[
            ("box_min", BOX_SIZE_RANGE.start().to_string()),
            ("box_max", BOX_SIZE_RANGE.end().to_string()),
            ("border_min", BORDER_SIZE_RANGE.start().to_string()),
            ("border_max", BORDER_SIZE_RANGE.end().to_string()),
            ("box_size", escape_html(box_size)),
            ("border_size", escape_html(border_size)),
            ("qr_data", escape_html(view.qr_data)),
            ("error", error_block(view.error.as_deref())),
            ("result", result),
        ],
    );
    layout("Home", &content)
}

pub fn read_image(view: &ReadImageView<'_>) -> String {
    let result = match (view.decoded_text, view.preview_uri) {
        (Some(text), Some(uri)) => {
            let message = if text.is_empty() {
                "<p>No QR code found.</p>".to_string()
            } else {
                format!("<p>Decoded: <code>{}</code></p>", escape_html(text))
            };
            format!(
                "        <section class=\"result\">\n            {message}\n            <img src=\"{}\" alt=\"Uploaded image\">\n        </section>",
                escape_html(uri)
            )
        }
        _ => String::new(),
    };

    let content = render(
        "read_image.html",
        &[
            ("error", error_block(view.error.as_deref())),
            ("result", result),
        ],
    );
    layout("Read QR Image", &content)
}

pub fn read_webcam() -> String {
    layout("Read QR Webcam", &render("read_webcam.html", &[]))
}

pub fn webcam_results(codes: &[String]) -> String {
    let list = if codes.is_empty() {
        "        <p>No QR codes were read.</p>".to_string()
    } else {
        let items: String = codes
            .iter()
            .map(|code| format!("            <li><code>{}</code></li>\n", escape_html(code)))
            .collect();
        format!("        <ul>\n{items}        </ul>")
    };
    layout("Webcam Results", &render("video_results.html", &[("codes", list)]))
}

fn layout(title: &str, content: &str) -> String {
    render(
        "layout.html",
        &[
            ("title", escape_html(title)),
            ("content", content.to_string()),
        ],
    )
}

fn error_block(error: Option<&str>) -> String {
    error
        .map(|message| format!("        <p class=\"error\">{}</p>", escape_html(message)))
        .unwrap_or_default()
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

/// テンプレートを読み込んで置き換える
fn render(name: &str, values: &[(&str, String)]) -> String {
    let path = format!("templates/{name}");
    match WebAssets::get(&path) {
        Some(file) => fill(&String::from_utf8_lossy(&file.data), values),
        None => {
            error!("Template not embedded: {}", path);
            String::new()
        }
    }
}

/// `{{name}}` を1回の走査で置き換える（挿入した値は再走査しない）
fn fill(template: &str, values: &[(&str, String)]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match values.iter().find(|(name, _)| *name == key) {
                    Some((_, value)) => output.push_str(value),
                    None => output.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                output.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    output.push_str(rest);
    output
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_does_not_rescan_values() {
        let filled = fill(
            "<p>{{a}}</p><p>{{ b }}</p>{{missing}}",
            &[("a", "{{b}}".to_string()), ("b", "two".to_string())],
        );
        assert_eq!(filled, "<p>{{b}}</p><p>two</p>{{missing}}");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_home_page_embeds_image_and_escapes_data() {
        let page = home(&HomeView {
            box_size: "5",
            border_size: "2",
            qr_data: "<b>hi</b>",
            image_uri: Some("data:image/png;base64,AAAA"),
            error: None,
        });
        assert!(page.contains("<title>Home - QR Web App</title>"));
        assert!(page.contains("value=\"5\""));
        assert!(page.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(page.contains("src=\"data:image/png;base64,AAAA\""));
        assert!(page.contains("href=\"/download\""));
        assert!(!page.contains("{{"));
    }

    #[test]
    fn test_home_page_defaults_and_error() {
        let page = home(&HomeView {
            error: Some("Data is too long".to_string()),
            ..HomeView::default()
        });
        assert!(page.contains("value=\"10\""));
        assert!(page.contains("value=\"4\""));
        assert!(page.contains("class=\"error\">Data is too long"));
        assert!(!page.contains("/download"));
    }

    #[test]
    fn test_read_image_page_states() {
        let empty = read_image(&ReadImageView::default());
        assert!(empty.contains("name=\"qrImage\""));
        assert!(!empty.contains("Decoded:"));

        let found = read_image(&ReadImageView {
            decoded_text: Some("hello"),
            preview_uri: Some("data:image/png;base64,AAAA"),
            error: None,
        });
        assert!(found.contains("Decoded: <code>hello</code>"));

        let missing = read_image(&ReadImageView {
            decoded_text: Some(""),
            preview_uri: Some("data:image/png;base64,AAAA"),
            error: None,
        });
        assert!(missing.contains("No QR code found."));
    }

    #[test]
    fn test_results_page_lists_codes() {
        let page = webcam_results(&["A".to_string(), "<B>".to_string()]);
        assert!(page.contains("<li><code>A</code></li>"));
        assert!(page.contains("<li><code>&lt;B&gt;</code></li>"));

        let empty = webcam_results(&[]);
        assert!(empty.contains("No QR codes were read."));
    }

    #[test]
    fn test_webcam_page_embeds_stream() {
        assert!(read_webcam().contains("src=\"/webcam/stream/\""));
    }
}
