use rust_embed::Embed;

/// HTMLテンプレートとスタイルシートを埋め込む
#[derive(Embed)]
#[folder = "web/"]
#[include = "templates/*.html"]
#[include = "static/**/*"]
pub struct WebAssets;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_assets_available() {
        for template in [
            "layout.html",
            "home.html",
            "read_image.html",
            "read_webcam.html",
            "video_results.html",
        ] {
            assert!(
                WebAssets::get(&format!("templates/{template}")).is_some(),
                "missing template {template}"
            );
        }

        // CSSファイルが埋め込まれていることを確認
        assert!(WebAssets::get("static/style.css").is_some());
    }
}
