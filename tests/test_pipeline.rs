//! End-to-end conversion: report JSON + template + component images.

mod common;

use std::fs;

use dhd_builder::{Error, PipelineConfig, StackOptions, convert_report_file};

use common::{REPORT_JSON, part_names, read_part, write_component_images, write_template};

struct Fixture {
    _dir: tempfile::TempDir,
    report: std::path::PathBuf,
    config: PipelineConfig,
}

fn fixture(images: &[(&str, u32, u32)]) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    let template = root.join("DHD Template.xlsx");
    write_template(&template);

    let image_dir = root.join("images");
    fs::create_dir(&image_dir).unwrap();
    write_component_images(&image_dir, images);

    let report = root.join("page_1.json");
    fs::write(&report, REPORT_JSON).unwrap();

    let out = root.join("out");
    fs::create_dir(&out).unwrap();

    let config = PipelineConfig::new(&template, &image_dir, &out);
    Fixture {
        _dir: dir,
        report,
        config,
    }
}

#[test]
fn test_full_conversion() {
    let fx = fixture(&[("Tubing Hanger", 30, 20), ("Packer", 50, 40), ("Mule Shoe", 20, 10)]);

    let output = convert_report_file(&fx.report, &fx.config).unwrap();
    assert_eq!(output.workbook_path, fx.config.output_dir.join("DHD_acracia_1.xlsx"));
    assert_eq!(output.stack_image_path, fx.config.output_dir.join("stack.png"));

    // 20 + 8 (spacer for the unmapped pup joint) + 40 + 10
    let stack = image::open(&output.stack_image_path).unwrap();
    assert_eq!((stack.width(), stack.height()), (50, 78));

    let sheet = read_part(&output.workbook_path, "xl/worksheets/sheet1.xml").unwrap();
    assert!(sheet.contains(r#"<c r="D2" s="1" t="inlineStr"><is><t>Acracia # 1</t></is></c>"#));
    assert!(sheet.contains(r#"<c r="E5" s="1" t="inlineStr"><is><t>m</t></is></c>"#));
    assert!(sheet.contains(r#"<c r="H5" s="1" t="inlineStr"><is><t></t></is></c>"#));
    assert!(sheet.contains(r#"<c r="C6" s="1"><v>1</v></c>"#));
    assert!(sheet.contains(r#"<c r="G8" t="inlineStr"><is><t>2 3/8</t></is></c>"#));
    assert!(sheet.contains(r#"<c r="G9"/>"#));
    assert!(sheet.contains(r#"<c r="D10" t="inlineStr"><is><t>END OF TAILPIPE</t></is></c>"#));
    assert!(sheet.contains(r#"<c r="F10"><v>2450.5</v></c>"#));
    assert!(sheet.contains(r#"<drawing xmlns:r="#));
    assert!(sheet.find("<drawing").unwrap() > sheet.find("<pageMargins").unwrap());

    let drawing = read_part(&output.workbook_path, "xl/drawings/drawing1.xml").unwrap();
    assert!(drawing.contains("<xdr:col>0</xdr:col>"));
    assert!(drawing.contains("<xdr:row>5</xdr:row>"));
    // 50x78 px at one third, in EMU
    let cx = (50.0_f64 / 3.0 * 9525.0).round() as u64;
    let cy = (78.0_f64 / 3.0 * 9525.0).round() as u64;
    assert!(drawing.contains(&format!(r#"<xdr:ext cx="{cx}" cy="{cy}"/>"#)));

    assert!(part_names(&output.workbook_path).contains(&"xl/media/image1.png".to_string()));
    let types = read_part(&output.workbook_path, "[Content_Types].xml").unwrap();
    assert!(types.contains(r#"Extension="png""#));
    assert!(types.contains(r#"PartName="/xl/drawings/drawing1.xml""#));

    // The second sheet is untouched.
    let notes = read_part(&output.workbook_path, "xl/worksheets/sheet2.xml").unwrap();
    assert!(notes.contains("<sheetData/>"));
}

#[test]
fn test_missing_image_is_skipped_by_default() {
    let fx = fixture(&[("Tubing Hanger", 30, 20), ("Packer", 50, 40)]);

    let output = convert_report_file(&fx.report, &fx.config).unwrap();
    let stack = image::open(&output.stack_image_path).unwrap();
    assert_eq!(stack.height(), 20 + 8 + 40);
}

#[test]
fn test_missing_image_fails_when_strict() {
    let fx = fixture(&[("Tubing Hanger", 30, 20), ("Packer", 50, 40)]);
    let config = fx
        .config
        .clone()
        .with_stack_options(StackOptions::default().with_skip_missing(false));

    let err = convert_report_file(&fx.report, &config).unwrap_err();
    assert!(matches!(err, Error::UnresolvedComponent(ref name) if name == "Mule Shoe"));
    assert!(!config.stack_image_path.exists());
}

#[test]
fn test_missing_image_dir_is_reported() {
    let fx = fixture(&[]);
    let config = PipelineConfig::new(
        &fx.config.template_path,
        fx.config.output_dir.join("no-images-here"),
        &fx.config.output_dir,
    );

    let err = convert_report_file(&fx.report, &config).unwrap_err();
    assert!(matches!(err, Error::MissingDirectory(_)));
}

#[test]
fn test_report_without_well_name_writes_nothing() {
    let fx = fixture(&[("Packer", 5, 5)]);
    fs::write(
        &fx.report,
        r#"{"components": [], "end_of_tailpipe_depth": 10}"#,
    )
    .unwrap();

    let err = convert_report_file(&fx.report, &fx.config).unwrap_err();
    assert!(matches!(err, Error::MissingField("well_name")));
    assert_eq!(fs::read_dir(&fx.config.output_dir).unwrap().count(), 0);
}

#[test]
fn test_custom_stack_image_path() {
    let fx = fixture(&[("Tubing Hanger", 30, 20), ("Packer", 50, 40), ("Mule Shoe", 20, 10)]);
    let custom = fx.config.output_dir.join("diagram.png");
    let config = fx.config.clone().with_stack_image_path(&custom);

    let output = convert_report_file(&fx.report, &config).unwrap();
    assert_eq!(output.stack_image_path, custom);
    assert!(custom.exists());
}
