#![allow(dead_code)]

use anyhow::{anyhow, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use pdf_text_batch::engine::{Engine, PageText};
use std::path::Path;

const FAKE_HEADER: &str = "%FAKE\n";

/// Test engine reading `%FAKE\n` followed by page texts separated by form
/// feeds. Anything else is rejected like a corrupt PDF.
pub struct FakeEngine;

impl Engine for FakeEngine {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn extract_pages(&self, pdf: &[u8]) -> Result<Vec<PageText>> {
        let raw = std::str::from_utf8(pdf).map_err(|e| anyhow!("invalid pdf: {e}"))?;
        let body = raw
            .strip_prefix(FAKE_HEADER)
            .ok_or_else(|| anyhow!("invalid pdf: missing header"))?;
        if body.is_empty() {
            return Ok(Vec::new());
        }
        Ok(body
            .split('\u{000C}')
            .enumerate()
            .map(|(i, text)| PageText {
                number: i as u32 + 1,
                text: text.to_string(),
            })
            .collect())
    }
}

pub fn write_fake_pdf(path: &Path, pages: &[&str]) {
    let raw = format!("{FAKE_HEADER}{}", pages.join("\u{000C}"));
    std::fs::write(path, raw).unwrap();
}

/// A real single-font PDF with one text run per page.
pub fn build_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

pub fn txt_files(dir: &Path) -> Vec<String> {
    let mut out: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".txt"))
        .collect();
    out.sort();
    out
}
