//! Integration tests for Markdown output written to disk.

mod common;

use common::*;
use scanmark::render::{self, RenderOptions};
use scanmark::{assemble_json, CleanupPreset, JsonFormat, ParseOptions, Scanmark};
use tempfile::TempDir;

const ROUND_TRIP_DUMP: &str = r#"{
    "pages": [{
        "page_number": 0, "width": 1000, "height": 1000,
        "elements": [
            {"bbox": {"x_min": 100, "y_min": 500, "x_max": 900, "y_max": 700}, "label": "Table",
             "rows": [["A", "B"], ["1", "2"]]},
            {"bbox": {"x_min": 100, "y_min": 200, "x_max": 900, "y_max": 400}, "label": "Text", "text": "Body."},
            {"bbox": {"x_min": 100, "y_min": 50, "x_max": 900, "y_max": 100}, "label": "Title", "text": "Intro"}
        ]
    }]
}"#;

#[test]
fn test_round_trip_intro_body_table() {
    let doc = assemble_json(ROUND_TRIP_DUMP, &ParseOptions::default()).unwrap();
    let md = render::to_markdown(&doc, &RenderOptions::default()).unwrap();

    let heading = md.find("## Intro\n").unwrap();
    let body = md.find("Body.\n\n").unwrap();
    let header = md.find("| A | B |").unwrap();
    let row = md.find("| 1 | 2 |").unwrap();
    assert!(heading < body && body < header && header < row);
}

#[test]
fn test_to_markdown_is_idempotent() {
    let doc = scripted_parser()
        .parse(&[synthetic_page(0), synthetic_page(1)])
        .unwrap();
    let options = RenderOptions::default().with_cleanup_preset(CleanupPreset::Standard);

    let first = render::to_markdown(&doc, &options).unwrap();
    let second = render::to_markdown(&doc, &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_write_markdown_writes_file_and_images() {
    let dir = TempDir::new().unwrap();
    let doc = scripted_parser().parse(&[synthetic_page(0)]).unwrap();

    let result = render::write_markdown(&doc, dir.path(), &RenderOptions::default()).unwrap();

    let written = std::fs::read_to_string(dir.path().join("output.md")).unwrap();
    assert_eq!(written, EXPECTED_MARKDOWN);
    assert_eq!(written, result.content);

    let image_path = dir.path().join("img_0_0.png");
    assert!(image_path.exists());
    assert_eq!(result.images, vec![image_path.clone()]);
    let decoded = image::open(&image_path).unwrap();
    assert_eq!(decoded.width(), 800);

    assert_eq!(result.stats.page_count, 1);
    assert_eq!(result.stats.images_written, 1);
    assert_eq!(result.stats.swallowed_equations, 1);
    assert_eq!(result.stats.element_count(), 5);
    assert_eq!(result.stats.empty_count, 0);
}

#[test]
fn test_write_markdown_separate_image_dir() {
    let dir = TempDir::new().unwrap();
    let images = dir.path().join("assets");
    let doc = scripted_parser().parse(&[synthetic_page(0)]).unwrap();

    let options = RenderOptions::default()
        .with_image_dir(&images)
        .with_image_prefix("assets/")
        .with_file_name("paper.md");
    let result = render::write_markdown(&doc, dir.path(), &options).unwrap();

    assert!(images.join("img_0_0.png").exists());
    assert!(!dir.path().join("img_0_0.png").exists());
    assert!(result.content.contains("![image](assets/img_0_0.png)"));
    assert!(dir.path().join("paper.md").exists());
}

#[test]
fn test_to_markdown_without_image_dir_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let doc = scripted_parser().parse(&[synthetic_page(0)]).unwrap();

    let result = render::to_markdown_with_stats(&doc, &RenderOptions::default()).unwrap();
    assert_eq!(result.stats.images_written, 0);
    assert!(result.images.is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_builder_assembles_dump_file() {
    let dir = TempDir::new().unwrap();
    let dump_path = dir.path().join("detections.json");
    std::fs::write(&dump_path, ROUND_TRIP_DUMP).unwrap();

    let out = dir.path().join("out");
    let result = Scanmark::new()
        .with_title_heading(1)
        .assemble(&dump_path)
        .unwrap();

    let written = result.write_markdown(&out).unwrap();
    assert!(written.content.starts_with("# Intro\n\nBody.\n\n"));
    assert!(out.join("output.md").exists());

    let json = result.to_json(JsonFormat::Compact).unwrap();
    assert!(json.contains("\"Intro\""));
    assert_eq!(result.to_text().unwrap(), "Intro\n\nBody.\n\nA\tB\n1\t2");
}

#[test]
fn test_dump_image_paths_resolve_against_dump_dir() {
    let dir = TempDir::new().unwrap();
    let png = scanmark::parser::encode_png(&image::RgbImage::new(4, 3)).unwrap();
    std::fs::write(dir.path().join("fig.png"), &png).unwrap();

    let dump = r#"{"pages": [{"page_number": 2, "width": 100, "height": 100,
        "elements": [{"bbox": {"x_min": 10, "y_min": 10, "x_max": 90, "y_max": 60},
                      "label": "Figure", "image": "fig.png", "key": "cover"}]}]}"#;
    let dump_path = dir.path().join("dump.json");
    std::fs::write(&dump_path, dump).unwrap();

    let doc = scanmark::assemble_file(&dump_path).unwrap();
    let out = dir.path().join("out");
    let result = render::write_markdown(&doc, &out, &RenderOptions::default()).unwrap();

    assert_eq!(result.content, "\n![image](cover.png)\n\n");
    assert_eq!(std::fs::read(out.join("cover.png")).unwrap(), png);
}
