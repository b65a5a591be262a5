//! Integration tests for mapping-driven extraction
//!
//! These tests load mappings from JSON the way the binary does and run the
//! extraction passes over complete documents, without any network access.

use content_audit::config::AssetsConfig;
use content_audit::extract::{collect_link_targets, AssetCollector, BlockExtractor};
use content_audit::{FileSize, MappingLoader};
use scraper::Html;
use url::Url;

const HERO_MAPPING: &str = r#"[
    {"name": "hero", "selector": ".hero", "components": {"Title": "h1", "CTA Link": "a.cta"}}
]"#;

fn page_url() -> Url {
    Url::parse("https://shop.example.com/chairs/index.html").unwrap()
}

#[test]
fn test_hero_scenario() {
    let mapping = MappingLoader::from_json_str(HERO_MAPPING).unwrap();
    let document = Html::parse_document(
        r#"<html><body>
            <div class="hero"><h1>Welcome</h1><a class="cta" href="/shop">Shop</a></div>
        </body></html>"#,
    );

    let extraction = BlockExtractor::new(&mapping).extract(&document, &page_url());

    assert!(extraction.errors.is_empty());
    assert_eq!(extraction.instances.len(), 1);
    assert_eq!(extraction.rows.len(), 2);

    let title = &extraction.rows[0];
    assert_eq!(title.instance_id, "hero-1");
    assert_eq!(title.component_name, "Title");
    assert_eq!(title.value, "Welcome");
    assert_eq!(title.source_element_tag, "h1");

    let cta = &extraction.rows[1];
    assert_eq!(cta.instance_id, "hero-1");
    assert_eq!(cta.component_name, "CTA Link");
    assert_eq!(cta.value, "https://shop.example.com/shop");
    assert_eq!(cta.source_element_tag, "a");
    assert_eq!(cta.css_classes, "cta");
}

#[test]
fn test_nested_matches_yield_outer_instance_only() {
    let mapping = MappingLoader::from_json_str(
        r#"[{"name": "card", "selector": ".card", "components": {"Heading": "h3"}}]"#,
    )
    .unwrap();
    let document = Html::parse_document(
        r#"<div class="card"><h3>Outer</h3>
              <div class="card"><h3>Inner</h3></div>
           </div>
           <div class="card"><h3>Second</h3></div>"#,
    );

    let extraction = BlockExtractor::new(&mapping).extract(&document, &page_url());

    let ids: Vec<_> = extraction
        .instances
        .iter()
        .map(|i| i.instance_id.as_str())
        .collect();
    assert_eq!(ids, vec!["card-1", "card-2"]);

    let values: Vec<_> = extraction.rows.iter().map(|r| r.value.as_str()).collect();
    assert_eq!(values, vec!["Outer", "Second"]);
}

#[test]
fn test_variants_share_family_numbering() {
    let mapping = MappingLoader::from_json_str(
        r#"[
            {"name": "promo:wide", "selector": ".promo-wide", "components": {"Text": "p"}},
            {"name": "promo:narrow", "selector": ".promo-narrow", "components": {"Text": "p"}}
        ]"#,
    )
    .unwrap();
    let document = Html::parse_document(
        r#"<div class="promo-narrow"><p>Narrow</p></div>
           <div class="promo-wide"><p>Wide</p></div>"#,
    );

    let extraction = BlockExtractor::new(&mapping).extract(&document, &page_url());

    let ids: Vec<_> = extraction
        .rows
        .iter()
        .map(|r| (r.block_name.as_str(), r.instance_id.as_str()))
        .collect();
    assert_eq!(
        ids,
        vec![("promo:wide", "promo-1"), ("promo:narrow", "promo-2")]
    );
}

#[test]
fn test_instance_ids_stable_across_runs() {
    let mapping = MappingLoader::from_json_str(HERO_MAPPING).unwrap();
    let html = r#"<div class="hero"><h1>One</h1></div><div class="hero"><h1>Two</h1></div>"#;

    let first = BlockExtractor::new(&mapping).extract(&Html::parse_document(html), &page_url());
    let second = BlockExtractor::new(&mapping).extract(&Html::parse_document(html), &page_url());

    assert_eq!(first.rows, second.rows);
    assert_eq!(first.instances, second.instances);
}

#[test]
fn test_readability_gating_on_text_components() {
    let mapping = MappingLoader::from_json_str(
        r#"[{"name": "article", "selector": "article", "components": {"Lead": "p.lead", "Body": "p.body"}}]"#,
    )
    .unwrap();
    let body = "The cat sat on the mat. ".repeat(10);
    let document = Html::parse_document(&format!(
        r#"<article><p class="lead">Five words are right here</p><p class="body">{}</p></article>"#,
        body
    ));

    let extraction = BlockExtractor::new(&mapping).extract(&document, &page_url());

    let lead = &extraction.rows[0];
    assert_eq!(lead.readability_score, None);
    assert_eq!(lead.grade_level, None);

    let body = &extraction.rows[1];
    assert!(body.readability_score.is_some());
    assert!(body.grade_level.is_some());
}

#[test]
fn test_duplicate_image_yields_one_asset() {
    let collector = AssetCollector::from_config(&AssetsConfig::default());
    let document = Html::parse_document(
        r#"<img src="/a.png" alt="First"><p>text</p><img src="/a.png" alt="Again">"#,
    );

    let assets = collector.collect(&document, &page_url());

    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].asset_url, "https://shop.example.com/a.png");
    assert_eq!(assets[0].asset_type, "Image (png)");
    assert_eq!(assets[0].link_text, "First");
    assert_eq!(assets[0].file_size, FileSize::NotRequested);
}

#[test]
fn test_document_links_are_assets() {
    let collector = AssetCollector::from_config(&AssetsConfig::default());
    let document = Html::parse_document(
        r#"<a href="files/Brochure.PDF?v=2">Brochure</a>
           <a href="/about">About</a>
           <img data-src="/lazy.webp" src="/placeholder.gif">"#,
    );

    let assets = collector.collect(&document, &page_url());
    let urls: Vec<_> = assets.iter().map(|a| a.asset_url.as_str()).collect();

    assert_eq!(
        urls,
        vec![
            "https://shop.example.com/chairs/files/Brochure.PDF?v=2",
            "https://shop.example.com/lazy.webp",
        ]
    );
    assert_eq!(assets[0].asset_type, "Document (pdf)");
    assert_eq!(assets[0].link_text, "Brochure");
}

#[test]
fn test_link_targets_cover_all_reference_kinds() {
    let document = Html::parse_document(
        r#"<html><head>
             <link rel="stylesheet" href="/site.css">
             <script src="/app.js"></script>
           </head><body>
             <a href="/shop#top">Shop</a>
             <a href="/shop">Shop again</a>
             <a href="mailto:team@example.com">Mail</a>
             <img src="https://cdn.example.com/hero.jpg">
             <iframe src="https://video.example.com/embed/1"></iframe>
           </body></html>"#,
    );

    let targets: Vec<String> = collect_link_targets(&document, &page_url())
        .into_iter()
        .map(String::from)
        .collect();

    assert_eq!(
        targets,
        vec![
            "https://shop.example.com/shop",
            "https://shop.example.com/site.css",
            "https://cdn.example.com/hero.jpg",
            "https://shop.example.com/app.js",
            "https://video.example.com/embed/1",
        ]
    );
}

#[test]
fn test_invalid_mapping_selector_is_config_error() {
    let result = MappingLoader::from_json_str(
        r#"[{"name": "broken", "selector": "div[", "components": {"Title": "h1"}}]"#,
    );
    assert!(result.is_err());
}
